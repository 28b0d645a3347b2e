use std::process::ExitCode;

use runtime::{with, Selector};
use tracing::{debug, info};

use super::bootstrap::AppWiring;
use super::stepper::{run_frame, FrameStats};

pub(crate) fn run(mut app: AppWiring) -> ExitCode {
    let totals = simulate(&mut app);
    info!(
        frames = app.config.frames,
        instances = totals.instances,
        step_handlers = totals.step_handlers,
        draw_handlers = totals.draw_handlers,
        "sandbox_finished"
    );
    app.registry.clear();
    info!("shutdown");
    ExitCode::SUCCESS
}

fn simulate(app: &mut AppWiring) -> FrameStats {
    let log_every = app.config.log_every.max(1);
    let mut totals = FrameStats::default();

    for frame in 1..=app.config.frames {
        let stats = run_frame(&mut app.registry);
        let drawn = app.frame_log.take();
        debug_assert_eq!(drawn.len(), stats.draw_handlers);
        if let (Some(back), Some(front)) = (drawn.first(), drawn.last()) {
            debug!(
                frame,
                drawn = drawn.len(),
                back_depth = back.depth,
                front_depth = front.depth,
                front_x = front.x,
                front_y = front.y,
                front_alpha = front.alpha,
                "frame_drawn"
            );
        }

        totals.step_handlers += stats.step_handlers;
        totals.draw_handlers += stats.draw_handlers;
        totals.instances = stats.instances;
        if frame % log_every == 0 {
            info!(
                frame,
                instances = stats.instances,
                step_handlers = stats.step_handlers,
                draw_handlers = stats.draw_handlers,
                "frame_summary"
            );
        }
    }

    let mut solid = 0usize;
    with(&mut app.registry, Selector::All, |registry, id| {
        if registry.find(id).map(|instance| instance.solid).unwrap_or(false) {
            solid += 1;
        }
    });
    info!(solid, "solid_census");
    totals
}
