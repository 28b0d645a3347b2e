//! "with" dispatch: resolve a selector to a set of instances and run an
//! action against each of them.

use thiserror::Error;
use tracing::debug;

use crate::numeric::Real;
use crate::object::ObjectIndex;
use crate::registry::{InstanceId, InstanceRegistry, INSTANCE_ID_THRESHOLD};

pub const ALL_SELECTOR: Real = -3.0;
pub const NOBODY_SELECTOR: Real = -4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    All,
    Nobody,
    Object(ObjectIndex),
    Instance(InstanceId),
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SelectorError {
    #[error("value {value} is neither a sentinel, an object index nor an instance id")]
    InvalidSelector { value: Real },
}

impl Selector {
    /// Decodes a script-level selector value. Values below
    /// [`INSTANCE_ID_THRESHOLD`] name declared types, values at or above it
    /// name instances.
    pub fn from_raw(value: Real) -> Result<Self, SelectorError> {
        if !value.is_finite() || value.fract() != 0.0 {
            return Err(SelectorError::InvalidSelector { value });
        }
        if value == ALL_SELECTOR {
            return Ok(Self::All);
        }
        if value == NOBODY_SELECTOR {
            return Ok(Self::Nobody);
        }
        if value < 0.0 || value > u64::MAX as Real {
            return Err(SelectorError::InvalidSelector { value });
        }
        let raw = value as u64;
        if raw < INSTANCE_ID_THRESHOLD {
            Ok(Self::Object(ObjectIndex(raw as u32)))
        } else {
            Ok(Self::Instance(InstanceId(raw)))
        }
    }
}

impl From<ObjectIndex> for Selector {
    fn from(index: ObjectIndex) -> Self {
        Self::Object(index)
    }
}

impl From<InstanceId> for Selector {
    fn from(id: InstanceId) -> Self {
        Self::Instance(id)
    }
}

/// Ids the selector names right now, in ascending id order. A missing
/// explicit id resolves to nothing.
pub fn resolve(registry: &InstanceRegistry, selector: Selector) -> Vec<InstanceId> {
    match selector {
        Selector::All => registry.instance_ids(),
        Selector::Nobody => Vec::new(),
        Selector::Object(index) => registry.ids_of_type(index),
        Selector::Instance(id) => match registry.find(id) {
            Ok(instance) => vec![instance.id()],
            Err(error) => {
                debug!(%error, "with_target_missing");
                Vec::new()
            }
        },
    }
}

/// Runs `action` once for each instance the selector resolves to and
/// returns how many times it ran.
///
/// The target set is snapshotted before the first call. Instances created
/// by the action are not visited; snapshot members destroyed by an earlier
/// call are skipped.
pub fn with<F>(registry: &mut InstanceRegistry, selector: Selector, mut action: F) -> usize
where
    F: FnMut(&mut InstanceRegistry, InstanceId),
{
    let targets = resolve(registry, selector);
    let mut invoked = 0usize;
    for id in targets {
        if !registry.exists(id) {
            debug!(instance = %id, "with_target_vanished");
            continue;
        }
        action(registry, id);
        invoked += 1;
    }
    invoked
}
