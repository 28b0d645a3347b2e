//! Instance registry, depth-ordered event scheduling and kinematic
//! properties for 2D game objects.

pub mod content;
pub mod dispatch;
pub mod numeric;
pub mod object;
pub mod registry;
pub mod scheduler;

pub use content::{
    load_declaration_file, parse_declaration_file, register_declarations, DeclarationError,
    DeclarationFile, DeclarationSpec, EventSpec,
};
pub use dispatch::{resolve, with, Selector, SelectorError, ALL_SELECTOR, NOBODY_SELECTOR};
pub use numeric::Real;
pub use object::{
    BoundingBox, DeclarationTable, EventBinding, EventCategory, EventHandler, ImageTransform,
    Instance, Kinematics, MaskBounds, NoSprites, ObjectDeclaration, ObjectIndex, SpriteCatalog,
    SpriteMetrics,
};
pub use registry::{
    EventRef, InstanceId, InstanceIdAllocator, InstanceRegistry, RegistryError,
    INSTANCE_ID_THRESHOLD,
};
pub use scheduler::{DepthScheduler, EventHandle, ScheduleCursor, SchedulerError};
