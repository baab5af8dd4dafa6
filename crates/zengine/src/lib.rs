//! # ZEngine
//!
//! A lightweight 2D game engine core built around an entity pool, a
//! per-tick lifecycle scheduler and pluggable render, physics and window
//! backends.
//!
//! ## Features
//!
//! - **Entity pool**: slot-reusing storage with generation-tagged weak handles
//! - **Lifecycle scheduler**: fixed-step catch-up, awake/start staging, update, render, cleanup
//! - **Hierarchy**: parent/child links with position propagation
//! - **Events**: synchronous broadcast to an entity and its components
//! - **Asset Management**: path-cached loading with per-type defaults
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use zengine::prelude::*;
//!
//! struct MyApp;
//!
//! impl Application for MyApp {
//!     fn initialize(&mut self, world: &mut World) -> Result<(), AppError> {
//!         let player = world.spawn::<Node>();
//!         world.set_name(player, "player");
//!         world.add_component(player, Camera::default());
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut engine = Engine::new(EngineConfig::default(), HeadlessWindow::with_frame_limit(60))?;
//!     engine.run(&mut MyApp)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod ecs;
pub mod assets;
pub mod render;
pub mod physics;
pub mod platform;

mod application;
mod engine;

pub use application::{Application, AppError};
pub use engine::{AssetConfig, Engine, EngineConfig, EngineError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        Application, AppError,
        Engine, EngineConfig, EngineError,
        config::Config,
        foundation::{
            math::{Transform2D, Vec2, Vec3, Vec4},
            time::{Time, Timer},
        },
        ecs::{
            Component, ComponentId, ComponentRef, Entity, EntityId, EntityRef, Event, Flags,
            Lifetime, Node, Scheduler, World,
        },
        assets::{Asset, AssetError, AssetHandle, AssetManager, Texture},
        render::{Camera, HeadlessRenderPipeline, RenderPipeline},
        physics::{NullPhysicsPipeline, PhysicsPipeline},
        platform::{HeadlessWindow, InputManager, KeyCode, MouseButton, Window},
    };
}
