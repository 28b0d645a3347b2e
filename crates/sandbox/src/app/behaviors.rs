use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use runtime::{with, EventHandler, InstanceId, InstanceRegistry, Real, Selector};
use tracing::{trace, warn};

pub(crate) const ARENA_WIDTH: Real = 320.0;
pub(crate) const ARENA_HEIGHT: Real = 240.0;
const LAUNCH_SPEED: Real = 3.0;
const SPARK_PERIOD_FRAMES: u32 = 20;
const SPARK_SPEED: Real = 2.5;
const SPARK_GRAVITY: Real = 0.1;
const SPARK_FRICTION: Real = 0.02;
const SPARK_FADE_PER_FRAME: Real = 0.04;
const REPEL_RADIUS: Real = 24.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct DrawRecord {
    pub instance: InstanceId,
    pub x: Real,
    pub y: Real,
    pub depth: Real,
    pub alpha: Real,
}

/// Shared sink draw handlers write into instead of rendering.
#[derive(Debug, Clone, Default)]
pub(crate) struct FrameLog {
    records: Rc<RefCell<Vec<DrawRecord>>>,
}

impl FrameLog {
    fn push(&self, record: DrawRecord) {
        self.records.borrow_mut().push(record);
    }

    pub(crate) fn take(&self) -> Vec<DrawRecord> {
        std::mem::take(&mut *self.records.borrow_mut())
    }
}

/// Named behaviors the sandbox can bind to declared events.
#[derive(Debug, Clone, Default)]
pub(crate) struct Behaviors {
    log: FrameLog,
    cooldowns: Rc<RefCell<HashMap<InstanceId, u32>>>,
}

impl Behaviors {
    pub(crate) fn new(log: FrameLog) -> Self {
        Self {
            log,
            cooldowns: Rc::default(),
        }
    }

    pub(crate) fn resolve(&self, name: &str) -> Option<EventHandler> {
        let handler: EventHandler = match name {
            "launch" => Rc::new(launch),
            "bounce" => Rc::new(bounce),
            "sort_by_y" => Rc::new(sort_by_y),
            "repel_sparks" => Rc::new(repel_sparks),
            "fade" => Rc::new(fade),
            "emit_sparks" => {
                let cooldowns = Rc::clone(&self.cooldowns);
                Rc::new(move |registry: &mut InstanceRegistry, id: InstanceId| {
                    emit_sparks(registry, id, &cooldowns)
                })
            }
            "draw_self" => {
                let log = self.log.clone();
                Rc::new(move |registry: &mut InstanceRegistry, id: InstanceId| {
                    draw_self(registry, id, &log)
                })
            }
            _ => return None,
        };
        Some(handler)
    }
}

fn launch(registry: &mut InstanceRegistry, id: InstanceId) {
    let Ok(instance) = registry.find_mut(id) else {
        return;
    };
    if instance.motion().speed() != 0.0 {
        return;
    }
    let heading = (instance.xstart() * 7.0 + instance.ystart() * 13.0) % 360.0;
    let motion = instance.motion_mut();
    motion.set_direction(heading);
    motion.set_speed(LAUNCH_SPEED);
}

fn bounce(registry: &mut InstanceRegistry, id: InstanceId) {
    let Ok(instance) = registry.find_mut(id) else {
        return;
    };
    let (x, y) = (instance.x, instance.y);
    let motion = instance.motion_mut();
    if (x <= 0.0 && motion.hspeed() < 0.0) || (x >= ARENA_WIDTH && motion.hspeed() > 0.0) {
        motion.set_hspeed(-motion.hspeed());
    }
    if (y <= 0.0 && motion.vspeed() < 0.0) || (y >= ARENA_HEIGHT && motion.vspeed() > 0.0) {
        motion.set_vspeed(-motion.vspeed());
    }
}

/// Lower on screen draws later.
fn sort_by_y(registry: &mut InstanceRegistry, id: InstanceId) {
    let Ok(instance) = registry.find(id) else {
        return;
    };
    let target = instance.y.round();
    if let Err(error) = registry.set_depth(id, target) {
        warn!(instance = %id, %error, "sort_by_y_failed");
    }
}

fn repel_sparks(registry: &mut InstanceRegistry, id: InstanceId) {
    let Some(spark) = registry.declarations().index_by_name("spark") else {
        return;
    };
    let Ok(source) = registry.find(id) else {
        return;
    };
    let (sx, sy) = (source.x, source.y);
    with(registry, Selector::Object(spark), |registry, target| {
        let Ok(instance) = registry.find_mut(target) else {
            return;
        };
        let (dx, dy) = (instance.x - sx, instance.y - sy);
        if dx * dx + dy * dy > REPEL_RADIUS * REPEL_RADIUS {
            return;
        }
        let away = (-dy).atan2(dx).to_degrees();
        instance.motion_mut().set_direction(away);
    });
}

fn fade(registry: &mut InstanceRegistry, id: InstanceId) {
    let Ok(instance) = registry.find_mut(id) else {
        return;
    };
    instance.image.alpha -= SPARK_FADE_PER_FRAME;
    if instance.image.alpha > 0.0 {
        return;
    }
    if let Err(error) = registry.destroy(id) {
        warn!(instance = %id, %error, "fade_destroy_failed");
    }
}

fn emit_sparks(
    registry: &mut InstanceRegistry,
    id: InstanceId,
    cooldowns: &RefCell<HashMap<InstanceId, u32>>,
) {
    {
        let mut cooldowns = cooldowns.borrow_mut();
        let remaining = cooldowns.entry(id).or_insert(0);
        if *remaining > 0 {
            *remaining -= 1;
            return;
        }
        *remaining = SPARK_PERIOD_FRAMES - 1;
    }

    let Some(spark) = registry.declarations().index_by_name("spark") else {
        warn!(instance = %id, "spark_not_declared");
        return;
    };
    let Ok(emitter) = registry.find(id) else {
        return;
    };
    let (x, y, heading) = (emitter.x, emitter.y, emitter.image.angle);
    let spark_id = match registry.create(spark, x, y) {
        Ok(spark_id) => spark_id,
        Err(error) => {
            warn!(instance = %id, %error, "spark_create_failed");
            return;
        }
    };
    with(registry, spark_id.into(), |registry, target| {
        if let Ok(spark) = registry.find_mut(target) {
            let motion = spark.motion_mut();
            motion.set_direction(heading);
            motion.set_speed(SPARK_SPEED);
            motion.set_friction(SPARK_FRICTION);
            motion.set_gravity_direction(270.0);
            motion.set_gravity(SPARK_GRAVITY);
        }
    });
    if let Ok(emitter) = registry.find_mut(id) {
        emitter.image.angle = (heading + 45.0) % 360.0;
    }
    trace!(emitter = %id, spark = %spark_id, "spark_emitted");
}

fn draw_self(registry: &mut InstanceRegistry, id: InstanceId, log: &FrameLog) {
    let Ok(instance) = registry.find(id) else {
        return;
    };
    log.push(DrawRecord {
        instance: id,
        x: instance.x,
        y: instance.y,
        depth: instance.depth(),
        alpha: instance.image.alpha,
    });
}

#[cfg(test)]
mod tests {
    use runtime::{EventCategory, ObjectDeclaration, ObjectIndex};

    use super::*;

    fn declare(
        registry: &mut InstanceRegistry,
        behaviors: &Behaviors,
        name: &str,
        events: &[(EventCategory, &str)],
    ) -> ObjectIndex {
        let mut declaration = ObjectDeclaration::new(name);
        for (category, behavior) in events {
            declaration.events.push(runtime::EventBinding {
                category: *category,
                handler: behaviors.resolve(behavior).expect("known behavior"),
            });
        }
        registry.declare(declaration).expect("declare")
    }

    #[test]
    fn unknown_behavior_does_not_resolve() {
        let behaviors = Behaviors::default();
        assert!(behaviors.resolve("draw_self").is_some());
        assert!(behaviors.resolve("teleport").is_none());
    }

    #[test]
    fn launch_only_kicks_resting_instances() {
        let behaviors = Behaviors::default();
        let mut registry = InstanceRegistry::new();
        let ball = declare(
            &mut registry,
            &behaviors,
            "ball",
            &[(EventCategory::BeginStep, "launch")],
        );
        let id = registry.create(ball, 10.0, 20.0).expect("create");
        registry.run_category(EventCategory::BeginStep);
        let first = *registry.find(id).expect("ball").motion();
        assert!((first.speed() - LAUNCH_SPEED).abs() < 1e-9);

        registry.run_category(EventCategory::BeginStep);
        assert_eq!(*registry.find(id).expect("ball").motion(), first);
    }

    #[test]
    fn bounce_reflects_at_the_arena_edge() {
        let behaviors = Behaviors::default();
        let mut registry = InstanceRegistry::new();
        let ball = declare(&mut registry, &behaviors, "ball", &[(EventCategory::Step, "bounce")]);
        let id = registry.create(ball, ARENA_WIDTH + 1.0, 50.0).expect("create");
        registry.find_mut(id).expect("ball").motion_mut().set_hspeed(2.0);
        registry.run_category(EventCategory::Step);
        let motion = *registry.find(id).expect("ball").motion();
        assert_eq!(motion.hspeed(), -2.0);
        assert!((motion.direction() - 180.0).abs() < 1e-9);
    }

    #[test]
    fn sort_by_y_relinks_draw_order() {
        let log = FrameLog::default();
        let behaviors = Behaviors::new(log.clone());
        let mut registry = InstanceRegistry::new();
        let ball = declare(
            &mut registry,
            &behaviors,
            "ball",
            &[
                (EventCategory::EndStep, "sort_by_y"),
                (EventCategory::Draw, "draw_self"),
            ],
        );
        let low = registry.create(ball, 0.0, 200.0).expect("low");
        let high = registry.create(ball, 0.0, 10.0).expect("high");
        // Each moves ahead of the cursor once, then rewrites the same depth.
        assert_eq!(registry.run_category(EventCategory::EndStep), 4);
        assert_eq!(registry.run_category(EventCategory::EndStep), 2);
        registry.run_category(EventCategory::Draw);
        let order: Vec<InstanceId> = log.take().into_iter().map(|record| record.instance).collect();
        assert_eq!(order, vec![high, low]);
        assert_eq!(registry.find(low).expect("low").depth(), 200.0);
    }

    #[test]
    fn fade_destroys_spent_instances_mid_pass() {
        let behaviors = Behaviors::default();
        let mut registry = InstanceRegistry::new();
        let spark = declare(&mut registry, &behaviors, "spark", &[(EventCategory::Step, "fade")]);
        let id = registry.create(spark, 0.0, 0.0).expect("create");
        registry.find_mut(id).expect("spark").image.alpha = SPARK_FADE_PER_FRAME / 2.0;
        registry.run_category(EventCategory::Step);
        assert!(!registry.exists(id));
        assert!(registry.scheduled(EventCategory::Step).is_empty());
    }

    #[test]
    fn emitter_spawns_configured_sparks_on_a_cooldown() {
        let behaviors = Behaviors::default();
        let mut registry = InstanceRegistry::new();
        let emitter = declare(
            &mut registry,
            &behaviors,
            "emitter",
            &[(EventCategory::Step, "emit_sparks")],
        );
        let spark = declare(&mut registry, &behaviors, "spark", &[]);
        registry.create(emitter, 100.0, 100.0).expect("emitter");

        for _ in 0..SPARK_PERIOD_FRAMES {
            registry.run_category(EventCategory::Step);
        }
        let sparks = registry.ids_of_type(spark);
        assert_eq!(sparks.len(), 1);
        let motion = *registry.find(sparks[0]).expect("spark").motion();
        assert!((motion.speed() - SPARK_SPEED).abs() < 1e-9);
        assert!((motion.vgravity() - SPARK_GRAVITY).abs() < 1e-9);

        registry.run_category(EventCategory::Step);
        assert_eq!(registry.count_of_type(spark), 2);
    }

    #[test]
    fn repel_turns_nearby_sparks_away() {
        let behaviors = Behaviors::default();
        let mut registry = InstanceRegistry::new();
        let ball = declare(
            &mut registry,
            &behaviors,
            "ball",
            &[(EventCategory::Step, "repel_sparks")],
        );
        let spark = declare(&mut registry, &behaviors, "spark", &[]);
        registry.create(ball, 50.0, 50.0).expect("ball");
        let near = registry.create(spark, 60.0, 50.0).expect("near");
        let far = registry.create(spark, 200.0, 50.0).expect("far");
        registry.find_mut(near).expect("near").motion_mut().set_direction(180.0);
        registry.find_mut(far).expect("far").motion_mut().set_direction(180.0);

        registry.run_category(EventCategory::Step);
        assert!(registry.find(near).expect("near").motion().direction().abs() < 1e-9);
        assert!((registry.find(far).expect("far").motion().direction() - 180.0).abs() < 1e-9);
    }
}
