use crate::numeric::Real;
use crate::registry::InstanceId;
use crate::scheduler::EventHandle;

use super::collaborators::{BoundingBox, MaskBounds, SpriteCatalog, SpriteMetrics};
use super::declaration::{ObjectDeclaration, ObjectIndex};
use super::kinematics::Kinematics;

/// Image transform attributes. Independent scalars with no cross-field rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageTransform {
    pub alpha: Real,
    pub angle: Real,
    pub blend: Real,
    pub index: Real,
    pub speed: Real,
    pub xscale: Real,
    pub yscale: Real,
}

impl Default for ImageTransform {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            angle: 0.0,
            blend: 0.0,
            index: 0.0,
            speed: 1.0,
            xscale: 1.0,
            yscale: 1.0,
        }
    }
}

/// One live game object.
///
/// Plain attributes are public fields. Depth is read-only here because a
/// write has to relink the instance's events; use
/// [`InstanceRegistry::set_depth`](crate::InstanceRegistry::set_depth).
/// Motion goes through [`Kinematics`] so dependent fields stay derived.
#[derive(Debug, Clone)]
pub struct Instance {
    id: InstanceId,
    object_index: ObjectIndex,
    xstart: Real,
    ystart: Real,
    pub x: Real,
    pub y: Real,
    pub xprevious: Real,
    pub yprevious: Real,
    pub solid: bool,
    pub visible: bool,
    pub persistent: bool,
    depth: Real,
    pub sprite_index: Real,
    pub mask_index: Real,
    pub image: ImageTransform,
    motion: Kinematics,
    linked: Vec<EventHandle>,
}

impl Instance {
    pub(crate) fn new(
        id: InstanceId,
        object_index: ObjectIndex,
        declaration: &ObjectDeclaration,
        x: Real,
        y: Real,
    ) -> Self {
        Self {
            id,
            object_index,
            xstart: x,
            ystart: y,
            x,
            y,
            xprevious: x,
            yprevious: y,
            solid: declaration.solid,
            visible: declaration.visible,
            persistent: declaration.persistent,
            depth: declaration.depth,
            sprite_index: declaration.sprite_index,
            mask_index: declaration.mask_index,
            image: ImageTransform::default(),
            motion: Kinematics::default(),
            linked: Vec::with_capacity(declaration.events.len()),
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn object_index(&self) -> ObjectIndex {
        self.object_index
    }

    pub fn xstart(&self) -> Real {
        self.xstart
    }

    pub fn ystart(&self) -> Real {
        self.ystart
    }

    pub fn depth(&self) -> Real {
        self.depth
    }

    pub(crate) fn store_depth(&mut self, depth: Real) -> Real {
        std::mem::replace(&mut self.depth, depth)
    }

    pub fn motion(&self) -> &Kinematics {
        &self.motion
    }

    pub fn motion_mut(&mut self) -> &mut Kinematics {
        &mut self.motion
    }

    pub fn linked_event_count(&self) -> usize {
        self.linked.len()
    }

    pub(crate) fn linked(&self) -> &[EventHandle] {
        &self.linked
    }

    pub(crate) fn set_linked(&mut self, handles: Vec<EventHandle>) {
        self.linked = handles;
    }

    pub(crate) fn take_linked(&mut self) -> Vec<EventHandle> {
        std::mem::take(&mut self.linked)
    }

    fn sprite(&self, sprites: &dyn SpriteCatalog) -> SpriteMetrics {
        sprites
            .sprite_metrics(self.sprite_index)
            .unwrap_or_default()
    }

    pub fn sprite_width(&self, sprites: &dyn SpriteCatalog) -> Real {
        self.sprite(sprites).width
    }

    pub fn sprite_height(&self, sprites: &dyn SpriteCatalog) -> Real {
        self.sprite(sprites).height
    }

    pub fn sprite_xoffset(&self, sprites: &dyn SpriteCatalog) -> Real {
        self.sprite(sprites).xoffset
    }

    pub fn sprite_yoffset(&self, sprites: &dyn SpriteCatalog) -> Real {
        self.sprite(sprites).yoffset
    }

    pub fn image_number(&self, sprites: &dyn SpriteCatalog) -> Real {
        self.sprite(sprites).image_number
    }

    pub fn bbox(&self, masks: &dyn MaskBounds) -> BoundingBox {
        masks.bounding_box(self).unwrap_or_default()
    }
}
