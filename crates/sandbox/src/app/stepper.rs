use runtime::{EventCategory, InstanceRegistry, Kinematics};

pub(crate) const STEP_PHASES: [EventCategory; 3] = [
    EventCategory::BeginStep,
    EventCategory::Step,
    EventCategory::EndStep,
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct FrameStats {
    pub step_handlers: usize,
    pub draw_handlers: usize,
    pub instances: usize,
}

/// One frame: previous-position snapshot, step phases, motion, draw.
pub(crate) fn run_frame(registry: &mut InstanceRegistry) -> FrameStats {
    snapshot_previous_positions(registry);
    let mut step_handlers = 0usize;
    for phase in STEP_PHASES {
        step_handlers += registry.run_category(phase);
    }
    integrate_motion(registry);
    let draw_handlers = registry.run_category(EventCategory::Draw);
    FrameStats {
        step_handlers,
        draw_handlers,
        instances: registry.instance_count(),
    }
}

pub(crate) fn snapshot_previous_positions(registry: &mut InstanceRegistry) {
    for instance in registry.instances_mut() {
        instance.xprevious = instance.x;
        instance.yprevious = instance.y;
    }
}

pub(crate) fn integrate_motion(registry: &mut InstanceRegistry) {
    for instance in registry.instances_mut() {
        let motion = instance.motion_mut();
        apply_friction(motion);
        apply_gravity(motion);
        instance.x += instance.motion().hspeed();
        instance.y += instance.motion().vspeed();
    }
}

/// Pulls speed toward zero without crossing it.
fn apply_friction(motion: &mut Kinematics) {
    let friction = motion.friction();
    let speed = motion.speed();
    if friction == 0.0 || speed == 0.0 {
        return;
    }
    let slowed = if speed > 0.0 {
        (speed - friction).max(0.0)
    } else {
        (speed + friction).min(0.0)
    };
    motion.set_speed(slowed);
}

fn apply_gravity(motion: &mut Kinematics) {
    if motion.gravity() == 0.0 {
        return;
    }
    let hspeed = motion.hspeed() + motion.hgravity();
    let vspeed = motion.vspeed() + motion.vgravity();
    motion.set_velocity(hspeed, vspeed);
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use runtime::{InstanceId, ObjectDeclaration};

    use super::*;

    const TOLERANCE: f64 = 1e-9;

    #[test]
    fn previous_position_is_taken_before_handlers_run() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut registry = InstanceRegistry::new();
        let walker = registry
            .declare(ObjectDeclaration::new("walker").with_event(
                EventCategory::Step,
                move |registry: &mut InstanceRegistry, id: InstanceId| {
                    let instance = registry.find_mut(id).expect("walker");
                    sink.borrow_mut().push((instance.xprevious, instance.x));
                    instance.x += 5.0;
                },
            ))
            .expect("declare");
        let id = registry.create(walker, 1.0, 0.0).expect("create");
        run_frame(&mut registry);
        run_frame(&mut registry);
        assert_eq!(*seen.borrow(), vec![(1.0, 1.0), (6.0, 6.0)]);
        assert_eq!(registry.find(id).expect("walker").x, 11.0);
    }

    #[test]
    fn motion_advances_position_by_velocity() {
        let mut registry = InstanceRegistry::new();
        let rock = registry
            .declare(ObjectDeclaration::new("rock"))
            .expect("declare");
        let id = registry.create(rock, 0.0, 0.0).expect("create");
        registry
            .find_mut(id)
            .expect("rock")
            .motion_mut()
            .set_velocity(2.0, -1.0);
        integrate_motion(&mut registry);
        let rock = registry.find(id).expect("rock");
        assert_eq!((rock.x, rock.y), (2.0, -1.0));
    }

    #[test]
    fn friction_stops_without_reversing() {
        let mut motion = Kinematics::default();
        motion.set_speed(1.0);
        motion.set_friction(0.4);
        apply_friction(&mut motion);
        assert!((motion.speed() - 0.6).abs() < TOLERANCE);
        apply_friction(&mut motion);
        apply_friction(&mut motion);
        assert_eq!(motion.speed(), 0.0);
        assert_eq!(motion.hspeed(), 0.0);
    }

    #[test]
    fn gravity_accumulates_into_velocity() {
        let mut motion = Kinematics::default();
        motion.set_gravity_direction(270.0);
        motion.set_gravity(0.5);
        apply_gravity(&mut motion);
        apply_gravity(&mut motion);
        assert!((motion.vspeed() - 1.0).abs() < TOLERANCE);
        assert!((motion.speed() - 1.0).abs() < TOLERANCE);
        assert!((motion.direction() - 270.0).abs() < TOLERANCE);
    }

    #[test]
    fn frame_stats_count_handlers_and_instances() {
        let mut registry = InstanceRegistry::new();
        let full = registry
            .declare(
                ObjectDeclaration::new("full")
                    .with_event(EventCategory::BeginStep, |_, _| {})
                    .with_event(EventCategory::EndStep, |_, _| {})
                    .with_event(EventCategory::Draw, |_, _| {}),
            )
            .expect("declare");
        registry.create(full, 0.0, 0.0).expect("a");
        let hidden = registry.create(full, 0.0, 0.0).expect("b");
        registry.find_mut(hidden).expect("b").visible = false;
        let stats = run_frame(&mut registry);
        assert_eq!(
            stats,
            FrameStats {
                step_handlers: 4,
                draw_handlers: 1,
                instances: 2,
            }
        );
    }
}
