use crate::numeric::Real;

use super::instance::Instance;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpriteMetrics {
    pub width: Real,
    pub height: Real,
    pub xoffset: Real,
    pub yoffset: Real,
    pub image_number: Real,
}

/// Sprite metadata lookup supplied by the asset side of the host.
pub trait SpriteCatalog {
    fn sprite_metrics(&self, sprite_index: Real) -> Option<SpriteMetrics>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoundingBox {
    pub left: Real,
    pub top: Real,
    pub right: Real,
    pub bottom: Real,
}

/// Collision-mask bounds supplied by the host's collision layer.
pub trait MaskBounds {
    fn bounding_box(&self, instance: &Instance) -> Option<BoundingBox>;
}

/// Catalog that knows no sprites; every query falls back to zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSprites;

impl SpriteCatalog for NoSprites {
    fn sprite_metrics(&self, _sprite_index: Real) -> Option<SpriteMetrics> {
        None
    }
}

impl MaskBounds for NoSprites {
    fn bounding_box(&self, _instance: &Instance) -> Option<BoundingBox> {
        None
    }
}
