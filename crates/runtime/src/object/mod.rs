mod collaborators;
mod declaration;
mod instance;
mod kinematics;

pub use collaborators::{BoundingBox, MaskBounds, NoSprites, SpriteCatalog, SpriteMetrics};
pub use declaration::{
    DeclarationTable, EventBinding, EventCategory, EventHandler, ObjectDeclaration, ObjectIndex,
};
pub use instance::{ImageTransform, Instance};
pub use kinematics::Kinematics;
