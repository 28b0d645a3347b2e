mod loader;
mod spec;

pub use loader::{load_declaration_file, parse_declaration_file, register_declarations};
pub use spec::{DeclarationError, DeclarationFile, DeclarationSpec, EventSpec};
