use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;
use tracing::{debug, error, trace};

use crate::numeric::Real;
use crate::object::{DeclarationTable, EventCategory, Instance, ObjectDeclaration, ObjectIndex};
use crate::scheduler::{DepthScheduler, EventHandle, SchedulerError};

/// Boundary between the declared-type namespace and the instance-id
/// namespace. Object indices stay below it; instance ids start at it.
pub const INSTANCE_ID_THRESHOLD: u64 = 1_000_001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceId(pub u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug)]
pub struct InstanceIdAllocator {
    next: u64,
}

impl Default for InstanceIdAllocator {
    fn default() -> Self {
        Self {
            next: INSTANCE_ID_THRESHOLD,
        }
    }
}

impl InstanceIdAllocator {
    pub fn allocate(&mut self) -> InstanceId {
        let id = InstanceId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

/// What the scheduler holds for one linked event: the owning instance and
/// the position of the binding in its declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventRef {
    pub instance: InstanceId,
    pub category: EventCategory,
    pub slot: usize,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("instance {id} does not exist")]
    NotFound { id: InstanceId },
    #[error("no declaration registered for {object_index}")]
    UnknownObject { object_index: ObjectIndex },
    #[error("declaration table is full ({limit} entries)")]
    TooManyDeclarations { limit: u64 },
    #[error("declaration name already registered: {name}")]
    DuplicateDeclaration { name: String },
    #[error("instance {id} is at depth {actual}, not {expected}")]
    DepthMismatch {
        id: InstanceId,
        expected: Real,
        actual: Real,
    },
}

/// Owns every live instance and the depth queues their events sit in.
#[derive(Debug, Default)]
pub struct InstanceRegistry {
    declarations: DeclarationTable,
    instances: BTreeMap<InstanceId, Instance>,
    scheduler: DepthScheduler<EventRef>,
    allocator: InstanceIdAllocator,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(
        &mut self,
        declaration: ObjectDeclaration,
    ) -> Result<ObjectIndex, RegistryError> {
        if self.declarations.len() as u64 >= INSTANCE_ID_THRESHOLD {
            return Err(RegistryError::TooManyDeclarations {
                limit: INSTANCE_ID_THRESHOLD,
            });
        }
        if self.declarations.index_by_name(&declaration.name).is_some() {
            return Err(RegistryError::DuplicateDeclaration {
                name: declaration.name,
            });
        }
        let name = declaration.name.clone();
        let event_count = declaration.events.len();
        let index = self.declarations.push(declaration);
        debug!(object = %index, name = %name, event_count, "declaration_registered");
        Ok(index)
    }

    pub fn declarations(&self) -> &DeclarationTable {
        &self.declarations
    }

    pub fn create(
        &mut self,
        object_index: ObjectIndex,
        x: Real,
        y: Real,
    ) -> Result<InstanceId, RegistryError> {
        let declaration = self
            .declarations
            .get(object_index)
            .ok_or(RegistryError::UnknownObject { object_index })?;
        let id = self.allocator.allocate();
        let mut instance = Instance::new(id, object_index, declaration, x, y);

        let depth = instance.depth();
        let handles = declaration
            .events
            .iter()
            .enumerate()
            .map(|(slot, binding)| {
                self.scheduler.link(
                    binding.category,
                    depth,
                    EventRef {
                        instance: id,
                        category: binding.category,
                        slot,
                    },
                )
            })
            .collect();
        instance.set_linked(handles);
        self.instances.insert(id, instance);

        debug!(instance = %id, object = %object_index, x, y, depth, "instance_created");
        Ok(id)
    }

    /// Unlinks every event of the instance, then drops it.
    pub fn destroy(&mut self, id: InstanceId) -> Result<(), RegistryError> {
        let instance = self
            .instances
            .get_mut(&id)
            .ok_or(RegistryError::NotFound { id })?;
        let handles = instance.take_linked();
        self.unlink_all(id, handles);
        self.instances.remove(&id);
        debug!(instance = %id, "instance_destroyed");
        Ok(())
    }

    /// Destroys every instance. Used when tearing a world down.
    pub fn clear(&mut self) {
        let ids = self.instance_ids();
        for id in ids {
            let handles = self
                .instances
                .get_mut(&id)
                .map(Instance::take_linked)
                .unwrap_or_default();
            self.unlink_all(id, handles);
        }
        let count = self.instances.len();
        self.instances.clear();
        debug!(count, "registry_cleared");
    }

    pub fn find(&self, id: InstanceId) -> Result<&Instance, RegistryError> {
        self.instances
            .get(&id)
            .ok_or(RegistryError::NotFound { id })
    }

    pub fn find_mut(&mut self, id: InstanceId) -> Result<&mut Instance, RegistryError> {
        self.instances
            .get_mut(&id)
            .ok_or(RegistryError::NotFound { id })
    }

    pub fn exists(&self, id: InstanceId) -> bool {
        self.instances.contains_key(&id)
    }

    /// Stores the new depth and requeues all of the instance's events behind
    /// any peers at that depth. Writing the current depth again leaves the
    /// queues alone.
    pub fn set_depth(&mut self, id: InstanceId, depth: Real) -> Result<(), RegistryError> {
        let old_depth = self.find(id)?.depth();
        self.relink_for_depth_change(id, old_depth, depth)
    }

    /// Moves the instance's events from `old_depth` to `new_depth`.
    /// `old_depth` must be the depth the instance currently holds.
    pub fn relink_for_depth_change(
        &mut self,
        id: InstanceId,
        old_depth: Real,
        new_depth: Real,
    ) -> Result<(), RegistryError> {
        let instance = self
            .instances
            .get_mut(&id)
            .ok_or(RegistryError::NotFound { id })?;
        let actual = instance.depth();
        if actual.total_cmp(&old_depth) != Ordering::Equal {
            return Err(RegistryError::DepthMismatch {
                id,
                expected: old_depth,
                actual,
            });
        }
        instance.store_depth(new_depth);
        if new_depth.total_cmp(&old_depth) == Ordering::Equal {
            return Ok(());
        }
        for handle in instance.linked() {
            if let Err(fault) = self.scheduler.relink(*handle, new_depth) {
                report_scheduler_fault(id, fault);
            }
        }
        debug!(instance = %id, old_depth, new_depth, "instance_relinked");
        Ok(())
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    pub fn instances(&self) -> impl Iterator<Item = &Instance> + '_ {
        self.instances.values()
    }

    pub fn instances_mut(&mut self) -> impl Iterator<Item = &mut Instance> + '_ {
        self.instances.values_mut()
    }

    /// Live ids in ascending order.
    pub fn instance_ids(&self) -> Vec<InstanceId> {
        self.instances.keys().copied().collect()
    }

    pub fn ids_of_type(&self, object_index: ObjectIndex) -> Vec<InstanceId> {
        self.instances
            .values()
            .filter(|instance| instance.object_index() == object_index)
            .map(Instance::id)
            .collect()
    }

    pub fn count_of_type(&self, object_index: ObjectIndex) -> usize {
        self.instances
            .values()
            .filter(|instance| instance.object_index() == object_index)
            .count()
    }

    pub fn scheduler(&self) -> &DepthScheduler<EventRef> {
        &self.scheduler
    }

    /// Snapshot of one category's queue in run order.
    pub fn scheduled(&self, category: EventCategory) -> Vec<EventRef> {
        self.scheduler.iter(category).copied().collect()
    }

    /// Runs the handlers queued under `category` in depth order and returns
    /// how many ran.
    ///
    /// Handlers get the registry mutably. An instance whose depth changes
    /// mid-pass may run again (moved ahead of the current position) or not
    /// at all (moved behind it). Draw handlers of invisible instances are
    /// skipped; their events stay queued.
    pub fn run_category(&mut self, category: EventCategory) -> usize {
        let mut cursor = self.scheduler.cursor(category);
        let mut invoked = 0usize;
        loop {
            let Some(event) = self
                .scheduler
                .advance(&mut cursor)
                .map(|(_, event)| *event)
            else {
                break;
            };
            let Ok(instance) = self.find(event.instance) else {
                continue;
            };
            if category == EventCategory::Draw && !instance.visible {
                continue;
            }
            let Some(handler) = self
                .declarations
                .handler(instance.object_index(), event.slot)
            else {
                continue;
            };
            handler(self, event.instance);
            invoked += 1;
        }
        trace!(?category, invoked, "category_ran");
        invoked
    }

    fn unlink_all(&mut self, id: InstanceId, handles: Vec<EventHandle>) {
        for handle in handles {
            if let Err(fault) = self.scheduler.unlink(handle) {
                report_scheduler_fault(id, fault);
            }
        }
    }
}

fn report_scheduler_fault(id: InstanceId, fault: SchedulerError) {
    error!(instance = %id, error = %fault, "scheduler_fault");
    debug_assert!(false, "scheduler fault for instance {id}: {fault}");
}
