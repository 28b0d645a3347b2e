use std::path::PathBuf;

use runtime::{
    load_declaration_file, parse_declaration_file, register_declarations, DeclarationError,
    InstanceRegistry,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::behaviors::{Behaviors, FrameLog, ARENA_HEIGHT, ARENA_WIDTH};

const FRAMES_ENV_VAR: &str = "OBJRT_FRAMES";
const DECLARATIONS_ENV_VAR: &str = "OBJRT_DECLARATIONS";
const LOG_EVERY_ENV_VAR: &str = "OBJRT_LOG_EVERY";

const BUILTIN_DECLARATIONS: &str = r#"{
    "objects": [
        {
            "name": "ball",
            "solid": true,
            "sprite_index": 0,
            "events": [
                { "category": "begin_step", "behavior": "launch" },
                { "category": "step", "behavior": "bounce" },
                { "category": "step", "behavior": "repel_sparks" },
                { "category": "end_step", "behavior": "sort_by_y" },
                { "category": "draw", "behavior": "draw_self" }
            ]
        },
        {
            "name": "emitter",
            "depth": 1000,
            "persistent": true,
            "sprite_index": 1,
            "events": [
                { "category": "step", "behavior": "emit_sparks" },
                { "category": "draw", "behavior": "draw_self" }
            ]
        },
        {
            "name": "spark",
            "depth": -1000,
            "sprite_index": 2,
            "events": [
                { "category": "step", "behavior": "fade" },
                { "category": "draw", "behavior": "draw_self" }
            ]
        }
    ]
}"#;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SandboxConfig {
    pub frames: u32,
    pub log_every: u32,
    pub declarations_path: Option<PathBuf>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            frames: 120,
            log_every: 30,
            declarations_path: None,
        }
    }
}

impl SandboxConfig {
    pub(crate) fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            frames: parse_count(&lookup, FRAMES_ENV_VAR, defaults.frames),
            log_every: parse_count(&lookup, LOG_EVERY_ENV_VAR, defaults.log_every).max(1),
            declarations_path: lookup(DECLARATIONS_ENV_VAR)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
                .map(PathBuf::from),
        }
    }
}

fn parse_count(lookup: &impl Fn(&str) -> Option<String>, key: &'static str, default: u32) -> u32 {
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse::<u32>() {
        Ok(value) => value,
        Err(error) => {
            warn!(var = key, value = %raw, %error, default, "invalid_env_value");
            default
        }
    }
}

pub(crate) struct AppWiring {
    pub(crate) config: SandboxConfig,
    pub(crate) registry: InstanceRegistry,
    pub(crate) frame_log: FrameLog,
}

pub(crate) fn build_app() -> Result<AppWiring, DeclarationError> {
    init_tracing();
    info!("=== Object Runtime Sandbox ===");
    build_app_with_config(SandboxConfig::from_env())
}

pub(crate) fn build_app_with_config(config: SandboxConfig) -> Result<AppWiring, DeclarationError> {
    let frame_log = FrameLog::default();
    let behaviors = Behaviors::new(frame_log.clone());
    let mut registry = InstanceRegistry::new();

    let file = match &config.declarations_path {
        Some(path) => load_declaration_file(path)?,
        None => parse_declaration_file(BUILTIN_DECLARATIONS)?,
    };
    register_declarations(&mut registry, file, |name| behaviors.resolve(name))?;
    populate(&mut registry)?;

    info!(
        frames = config.frames,
        declarations = registry.declarations().len(),
        instances = registry.instance_count(),
        "sandbox_ready"
    );
    Ok(AppWiring {
        config,
        registry,
        frame_log,
    })
}

/// Seeds the starting population from whichever declarations are known.
fn populate(registry: &mut InstanceRegistry) -> Result<(), DeclarationError> {
    if let Some(ball) = registry.declarations().index_by_name("ball") {
        for step in 0..6 {
            let x = ARENA_WIDTH * (step as f64 + 1.0) / 7.0;
            let y = ARENA_HEIGHT * ((step % 3) as f64 + 1.0) / 4.0;
            registry.create(ball, x, y)?;
        }
    }
    if let Some(emitter) = registry.declarations().index_by_name("emitter") {
        registry.create(emitter, ARENA_WIDTH / 2.0, ARENA_HEIGHT / 2.0)?;
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
