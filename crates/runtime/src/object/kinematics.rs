use crate::numeric::{degtorad, direction_from, magnitude, normalize_radians, radtodeg, Real};

/// Polar and Cartesian motion state of one instance.
///
/// Angles are stored in radians in `[0, 2π)` and exposed in degrees. Every
/// setter stores its value and then rederives the fields that depend on it,
/// never the field that was just written:
///
/// - `speed` rederives `hspeed`/`vspeed` from the current direction.
/// - `direction` rederives `hspeed`/`vspeed` and the friction components.
/// - `hspeed`/`vspeed` rederive `speed` and, unless the velocity is zero,
///   `direction` and the friction components. A zero velocity keeps the
///   previous direction.
/// - `friction` rederives `hfriction`/`vfriction` from `direction`.
/// - `gravity`/`gravity_direction` rederive `hgravity`/`vgravity`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Kinematics {
    speed: Real,
    direction: Real,
    hspeed: Real,
    vspeed: Real,
    friction: Real,
    hfriction: Real,
    vfriction: Real,
    gravity: Real,
    gravity_direction: Real,
    hgravity: Real,
    vgravity: Real,
}

impl Kinematics {
    pub fn speed(&self) -> Real {
        self.speed
    }

    pub fn direction(&self) -> Real {
        radtodeg(self.direction)
    }

    pub fn direction_radians(&self) -> Real {
        self.direction
    }

    pub fn hspeed(&self) -> Real {
        self.hspeed
    }

    pub fn vspeed(&self) -> Real {
        self.vspeed
    }

    pub fn friction(&self) -> Real {
        self.friction
    }

    pub fn hfriction(&self) -> Real {
        self.hfriction
    }

    pub fn vfriction(&self) -> Real {
        self.vfriction
    }

    pub fn gravity(&self) -> Real {
        self.gravity
    }

    pub fn gravity_direction(&self) -> Real {
        radtodeg(self.gravity_direction)
    }

    pub fn hgravity(&self) -> Real {
        self.hgravity
    }

    pub fn vgravity(&self) -> Real {
        self.vgravity
    }

    /// Negative speeds are kept as written and point the velocity backwards.
    pub fn set_speed(&mut self, speed: Real) {
        self.speed = speed;
        self.update_components();
    }

    pub fn set_direction(&mut self, degrees: Real) {
        self.direction = normalize_radians(degtorad(degrees));
        self.update_components();
        self.update_friction();
    }

    pub fn set_hspeed(&mut self, hspeed: Real) {
        self.hspeed = hspeed;
        self.update_polar();
    }

    pub fn set_vspeed(&mut self, vspeed: Real) {
        self.vspeed = vspeed;
        self.update_polar();
    }

    /// Writes both Cartesian components and derives the polar form once.
    pub fn set_velocity(&mut self, hspeed: Real, vspeed: Real) {
        self.hspeed = hspeed;
        self.vspeed = vspeed;
        self.update_polar();
    }

    pub fn set_friction(&mut self, friction: Real) {
        self.friction = friction;
        self.update_friction();
    }

    pub fn set_gravity(&mut self, gravity: Real) {
        self.gravity = gravity;
        self.update_gravity();
    }

    pub fn set_gravity_direction(&mut self, degrees: Real) {
        self.gravity_direction = normalize_radians(degtorad(degrees));
        self.update_gravity();
    }

    fn update_components(&mut self) {
        self.hspeed = self.speed * self.direction.cos();
        self.vspeed = -self.speed * self.direction.sin();
    }

    fn update_polar(&mut self) {
        self.speed = magnitude(self.hspeed, self.vspeed);
        if let Some(direction) = direction_from(self.hspeed, self.vspeed) {
            self.direction = direction;
            self.update_friction();
        }
    }

    fn update_friction(&mut self) {
        self.hfriction = self.friction * self.direction.cos();
        self.vfriction = -self.friction * self.direction.sin();
    }

    fn update_gravity(&mut self) {
        self.hgravity = self.gravity * self.gravity_direction.cos();
        self.vgravity = -self.gravity * self.gravity_direction.sin();
    }
}
