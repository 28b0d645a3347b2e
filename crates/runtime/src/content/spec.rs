use std::collections::HashSet;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

use crate::numeric::Real;
use crate::object::{EventBinding, EventCategory, EventHandler, ObjectDeclaration};
use crate::registry::RegistryError;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeclarationFile {
    pub objects: Vec<DeclarationSpec>,
}

/// Data-only form of an [`ObjectDeclaration`]; behaviors are named and
/// resolved to handlers by the host.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeclarationSpec {
    pub name: String,
    #[serde(default)]
    pub solid: bool,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub persistent: bool,
    #[serde(default)]
    pub depth: Real,
    #[serde(default = "no_resource")]
    pub sprite_index: Real,
    #[serde(default = "no_resource")]
    pub mask_index: Real,
    #[serde(default)]
    pub events: Vec<EventSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventSpec {
    pub category: EventCategory,
    pub behavior: String,
}

fn default_visible() -> bool {
    true
}

fn no_resource() -> Real {
    -1.0
}

#[derive(Debug, Error)]
pub enum DeclarationError {
    #[error("failed to read declaration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse declarations at {location}: {source}")]
    Parse {
        location: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("object at position {position} has an empty name")]
    EmptyName { position: usize },
    #[error("object name declared twice: {name}")]
    DuplicateName { name: String },
    #[error("object {object} refers to unknown behavior '{behavior}'")]
    UnknownBehavior { object: String, behavior: String },
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl DeclarationFile {
    pub fn validate(&self) -> Result<(), DeclarationError> {
        let mut seen = HashSet::<&str>::new();
        for (position, object) in self.objects.iter().enumerate() {
            let name = object.name.trim();
            if name.is_empty() {
                return Err(DeclarationError::EmptyName { position });
            }
            if !seen.insert(name) {
                return Err(DeclarationError::DuplicateName {
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl DeclarationSpec {
    pub fn into_declaration<R>(self, resolve: R) -> Result<ObjectDeclaration, DeclarationError>
    where
        R: Fn(&str) -> Option<EventHandler>,
    {
        let name = self.name.trim().to_string();
        let mut events = Vec::with_capacity(self.events.len());
        for event in self.events {
            let handler =
                resolve(&event.behavior).ok_or_else(|| DeclarationError::UnknownBehavior {
                    object: name.clone(),
                    behavior: event.behavior.clone(),
                })?;
            events.push(EventBinding {
                category: event.category,
                handler,
            });
        }
        Ok(ObjectDeclaration {
            name,
            solid: self.solid,
            visible: self.visible,
            persistent: self.persistent,
            depth: self.depth,
            sprite_index: self.sprite_index,
            mask_index: self.mask_index,
            events,
        })
    }
}
