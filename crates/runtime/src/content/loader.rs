use std::fs;
use std::path::Path;

use tracing::info;

use crate::object::{EventHandler, ObjectIndex};
use crate::registry::InstanceRegistry;

use super::spec::{DeclarationError, DeclarationFile};

pub fn load_declaration_file(path: &Path) -> Result<DeclarationFile, DeclarationError> {
    let raw = fs::read_to_string(path).map_err(|source| DeclarationError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let file = parse_declaration_file(&raw)?;
    info!(
        path = %path.display(),
        object_count = file.objects.len(),
        "declarations_loaded"
    );
    Ok(file)
}

pub fn parse_declaration_file(raw: &str) -> Result<DeclarationFile, DeclarationError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let file: DeclarationFile = serde_path_to_error::deserialize(&mut deserializer).map_err(
        |error| {
            let path = error.path().to_string();
            let location = if path.is_empty() || path == "." {
                "document root".to_string()
            } else {
                path
            };
            DeclarationError::Parse {
                location,
                source: error.into_inner(),
            }
        },
    )?;
    file.validate()?;
    Ok(file)
}

/// Resolves every declaration before registering any, so a bad behavior name
/// leaves the registry untouched.
pub fn register_declarations<R>(
    registry: &mut InstanceRegistry,
    file: DeclarationFile,
    resolve: R,
) -> Result<Vec<ObjectIndex>, DeclarationError>
where
    R: Fn(&str) -> Option<EventHandler>,
{
    let declarations = file
        .objects
        .into_iter()
        .map(|spec| spec.into_declaration(&resolve))
        .collect::<Result<Vec<_>, _>>()?;
    let mut indices = Vec::with_capacity(declarations.len());
    for declaration in declarations {
        indices.push(registry.declare(declaration)?);
    }
    Ok(indices)
}
