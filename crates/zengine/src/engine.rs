//! Core engine implementation
//!
//! The engine owns the world, the scheduler and the window, and runs the
//! main loop: one scheduler tick per frame, then present, poll events and
//! refresh input, until the window asks to close.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    application::Application,
    assets::AssetManager,
    config::{Config, ConfigError},
    ecs::{Scheduler, World},
    foundation::time::{Timer, DEFAULT_FIXED_DELTA},
    platform::Window,
};

/// Main engine struct
///
/// The engine coordinates all subsystems and manages the main loop.
pub struct Engine {
    /// Entities, components and engine services
    world: World,

    /// Per-tick lifecycle driver
    scheduler: Scheduler,

    /// Event source and presentation target
    window: Box<dyn Window>,

    /// Frame timing
    timer: Timer,

    /// Engine configuration
    config: EngineConfig,

    /// Whether the engine should continue running
    running: bool,
}

impl Engine {
    /// Create a new engine instance
    pub fn new(config: EngineConfig, window: impl Window + 'static) -> Result<Self, EngineError> {
        log::info!("Initializing {}...", config.app_name);

        if config.fixed_delta <= 0.0 || !config.fixed_delta.is_finite() {
            return Err(EngineError::InitializationFailed(format!(
                "fixed_delta must be positive, got {}",
                config.fixed_delta
            )));
        }

        if config.time_scale < 0.0 || !config.time_scale.is_finite() {
            return Err(EngineError::InitializationFailed(format!(
                "time_scale must be finite and non-negative, got {}",
                config.time_scale
            )));
        }

        let mut world = World::new();
        world.time_mut().set_fixed_delta(config.fixed_delta);
        world.time_mut().set_scale(config.time_scale);
        world.set_paused(config.start_paused);
        *world.assets_mut() = AssetManager::new(&config.assets);

        Ok(Self {
            world,
            scheduler: Scheduler::new(),
            window: Box::new(window),
            timer: Timer::new(),
            config,
            running: true,
        })
    }

    /// Create an engine from a TOML or RON configuration file
    pub fn from_config_file(path: impl AsRef<Path>, window: impl Window + 'static) -> Result<Self, EngineError> {
        let config = EngineConfig::load_from_file(path)?;
        Self::new(config, window)
    }

    /// Run one tick for a frame that took `frame_dt` seconds
    pub fn tick(&mut self, frame_dt: f64) {
        self.scheduler.tick(&mut self.world, frame_dt);
        self.window.present();
        self.window.poll_events(self.world.input_mut());
        self.world.input_mut().update();
    }

    /// Run the engine main loop with the given application
    ///
    /// The application is cleaned up and the world torn down even when a
    /// frame fails; the first error is returned afterwards.
    pub fn run<A: Application>(&mut self, app: &mut A) -> Result<(), EngineError> {
        app.initialize(&mut self.world)
            .map_err(|e| EngineError::ApplicationError(format!("App initialization: {e}")))?;

        log::info!("Starting main loop...");
        let result = self.main_loop(app);

        app.cleanup(&mut self.world);
        self.shutdown();
        log::info!("Engine shutdown complete");
        result
    }

    fn main_loop<A: Application>(&mut self, app: &mut A) -> Result<(), EngineError> {
        self.timer = Timer::new();
        self.running = true;

        while self.running && !self.window.should_close() {
            let delta_time = self.timer.update();

            app.frame(&mut self.world, delta_time)
                .map_err(|e| EngineError::ApplicationError(format!("App frame: {e}")))?;

            self.tick(delta_time);
        }
        Ok(())
    }

    /// Run the destruction hooks of every live entity and release the world
    pub fn shutdown(&mut self) {
        self.running = false;
        self.scheduler.shutdown(&mut self.world);
    }

    /// Request engine shutdown at the end of the current frame
    pub fn quit(&mut self) {
        log::info!("Engine shutdown requested");
        self.running = false;
        self.window.request_close();
    }

    /// Get the ECS world
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Get mutable access to the ECS world
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Get the scheduler
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Get the window
    pub fn window(&self) -> &dyn Window {
        self.window.as_ref()
    }

    /// Get the engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Get the average frame rate since the main loop started
    pub fn average_fps(&self) -> f64 {
        self.timer.average_fps()
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Application name, used in logs
    pub app_name: String,

    /// Fixed simulation step in seconds
    pub fixed_delta: f64,

    /// Scale applied to frame deltas (1.0 = real time)
    pub time_scale: f64,

    /// Start with the simulation paused
    pub start_paused: bool,

    /// `env_logger` filter used by [`crate::foundation::logging::init_with_filter`]
    pub log_filter: String,

    /// Asset system configuration
    pub assets: AssetConfig,
}

/// Asset system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Asset search paths
    pub search_paths: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            app_name: "ZEngine Application".to_string(),
            fixed_delta: DEFAULT_FIXED_DELTA,
            time_scale: 1.0,
            start_paused: false,
            log_filter: "info".to_string(),
            assets: AssetConfig::default(),
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self { search_paths: vec!["resources".to_string()] }
    }
}

impl Config for EngineConfig {}

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Initialization error
    #[error("Engine initialization failed: {0}")]
    InitializationFailed(String),

    /// Application error
    #[error("Application error: {0}")]
    ApplicationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::AppError;
    use crate::ecs::{Entity, EntityId, EntityRef, Node};
    use crate::platform::{HeadlessWindow, KeyCode};
    use approx::assert_relative_eq;

    #[derive(Default)]
    struct Probe {
        destroyed: bool,
    }

    impl Entity for Probe {
        fn on_destroy(&mut self, _world: &mut World, _this: EntityId) {
            self.destroyed = true;
        }
    }

    #[derive(Default)]
    struct CountingApp {
        frames: u32,
        probe: EntityRef<Probe>,
        cleaned_up: bool,
        fail_on: Option<u32>,
    }

    impl Application for CountingApp {
        fn initialize(&mut self, world: &mut World) -> Result<(), AppError> {
            self.probe = world.spawn::<Probe>();
            Ok(())
        }

        fn frame(&mut self, _world: &mut World, _delta_time: f64) -> Result<(), AppError> {
            self.frames += 1;
            if self.fail_on == Some(self.frames) {
                return Err(AppError::GameLogic("boom".into()));
            }
            Ok(())
        }

        fn cleanup(&mut self, world: &mut World) {
            self.cleaned_up = self.probe.get(world).is_some_and(|probe| !probe.destroyed);
        }
    }

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_relative_eq!(config.fixed_delta, 1.0 / 120.0);
        assert_relative_eq!(config.time_scale, 1.0);
        assert!(!config.start_paused);
    }

    #[test]
    fn test_config_round_trip_toml_and_ron() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig { app_name: "probe".into(), start_paused: true, ..EngineConfig::default() };

        for name in ["engine.toml", "engine.ron"] {
            let path = dir.path().join(name);
            config.save_to_file(&path).unwrap();
            assert_eq!(EngineConfig::load_from_file(&path).unwrap(), config);
        }
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.toml");
        std::fs::write(&path, "time_scale = 0.5\n").unwrap();

        let config = EngineConfig::load_from_file(&path).unwrap();
        assert_relative_eq!(config.time_scale, 0.5);
        assert_eq!(config.assets.search_paths, vec!["resources".to_string()]);
    }

    #[test]
    fn test_unsupported_config_format() {
        let result = EngineConfig::load_from_file("engine.json");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_invalid_fixed_delta_rejected() {
        let config = EngineConfig { fixed_delta: 0.0, ..EngineConfig::default() };
        let result = Engine::new(config, HeadlessWindow::new());
        assert!(matches!(result, Err(EngineError::InitializationFailed(_))));
    }

    #[test]
    fn test_invalid_time_scale_rejected() {
        for time_scale in [f64::INFINITY, f64::NAN, -1.0] {
            let config = EngineConfig { time_scale, ..EngineConfig::default() };
            let result = Engine::new(config, HeadlessWindow::new());
            assert!(matches!(result, Err(EngineError::InitializationFailed(_))));
        }
    }

    #[test]
    fn test_non_finite_frame_delta_does_not_stall() {
        let mut engine = Engine::new(EngineConfig::default(), HeadlessWindow::new()).unwrap();
        engine.tick(f64::INFINITY);
        engine.tick(f64::NAN);
        assert_eq!(engine.scheduler().fixed_steps(), 0);
        assert_eq!(engine.world().time().frame_count(), 2);
    }

    #[test]
    fn test_run_until_window_closes() {
        let mut engine = Engine::new(EngineConfig::default(), HeadlessWindow::with_frame_limit(5)).unwrap();
        let mut app = CountingApp::default();

        engine.run(&mut app).unwrap();

        assert_eq!(app.frames, 5);
        assert!(app.cleaned_up);
        assert!(app.probe.is_expired(engine.world()));
        assert_eq!(engine.world().entity_count(), 0);
    }

    #[test]
    fn test_frame_error_still_shuts_down() {
        let mut engine = Engine::new(EngineConfig::default(), HeadlessWindow::with_frame_limit(10)).unwrap();
        let mut app = CountingApp { fail_on: Some(3), ..CountingApp::default() };

        let result = engine.run(&mut app);

        assert!(matches!(result, Err(EngineError::ApplicationError(_))));
        assert_eq!(app.frames, 3);
        assert_eq!(engine.world().entity_count(), 0);
    }

    #[test]
    fn test_tick_refreshes_input() {
        let window = HeadlessWindow::new().press_at(1, KeyCode::Space);
        let mut engine = Engine::new(EngineConfig::default(), window).unwrap();
        engine.world_mut().input_mut().bind("jump", &[KeyCode::Space]);

        engine.tick(DEFAULT_FIXED_DELTA);
        assert!(engine.world().input().is_key_pressed("jump"));

        engine.tick(DEFAULT_FIXED_DELTA);
        assert!(engine.world().input().is_key_down("jump"));
        assert!(!engine.world().input().is_key_pressed("jump"));
    }

    #[test]
    fn test_config_applied_to_world() {
        let config = EngineConfig { time_scale: 2.0, start_paused: true, ..EngineConfig::default() };
        let mut engine = Engine::new(config, HeadlessWindow::new()).unwrap();
        let node = engine.world_mut().spawn::<Node>();

        engine.tick(0.1);
        assert!(engine.world().is_paused());
        assert!(engine.world().is_pending_awake(node));
        assert_relative_eq!(engine.world().time().delta(), 0.2);
    }
}
