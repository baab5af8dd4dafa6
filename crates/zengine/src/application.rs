//! Application trait and lifecycle management

use crate::ecs::World;
use crate::engine::EngineError;
use thiserror::Error;

/// Application lifecycle trait
///
/// Implement this trait to create your game or application using the engine.
pub trait Application {
    /// Initialize the application
    ///
    /// Called once before the main loop. Use this to spawn the initial
    /// entities, bind input actions and register default assets.
    fn initialize(&mut self, world: &mut World) -> Result<(), AppError>;

    /// Called every frame before the scheduler tick
    ///
    /// # Arguments
    /// * `world` - The world about to be ticked
    /// * `delta_time` - Wall-clock time since last frame in seconds
    fn frame(&mut self, _world: &mut World, _delta_time: f64) -> Result<(), AppError> {
        Ok(())
    }

    /// Cleanup the application
    ///
    /// Called once after the main loop, before the world is torn down.
    fn cleanup(&mut self, _world: &mut World) {}
}

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Engine error propagated to application level
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Custom application error
    #[error("Application error: {0}")]
    Custom(String),

    /// Asset loading error
    #[error("Asset error: {0}")]
    Asset(String),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Game logic error
    #[error("Game logic error: {0}")]
    GameLogic(String),
}
