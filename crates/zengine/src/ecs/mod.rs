//! Entity/component core
//!
//! The [`World`] owns every entity and component; everything else holds weak
//! handles ([`EntityRef`], [`ComponentRef`]) that report expired once their
//! target has been swept. The [`Scheduler`] drives the per-tick lifecycle.

pub mod component;
pub mod components;
pub mod entity;
pub mod event;
pub mod flags;
pub mod handle;
pub mod scheduler;
pub mod world;

mod hierarchy;
mod pool;

pub use component::Component;
pub use components::Lifetime;
pub use entity::{Entity, Node};
pub use event::Event;
pub use flags::Flags;
pub use handle::{AsAny, ComponentId, ComponentKey, ComponentRef, EntityId, EntityKey, EntityRef};
pub use scheduler::Scheduler;
pub use world::World;
