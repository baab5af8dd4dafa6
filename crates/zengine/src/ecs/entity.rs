//! Entity trait and per-entity bookkeeping
//!
//! An entity is a user type implementing [`Entity`] plus the engine-owned
//! record kept in its pool slot: name, flags, hierarchy links, transform and
//! the ordered list of attached components.

use super::{AsAny, ComponentId, EntityId, Event, Flags, World};
use crate::foundation::math::Transform2D;

/// Entity lifecycle hooks
///
/// Every hook has an empty default. Hooks receive the world and the entity's
/// own id; they may freely spawn, destroy, reparent or broadcast.
pub trait Entity: AsAny {
    /// Called right after the entity is placed in the pool, before `spawn` returns
    fn on_create(&mut self, _world: &mut World, _this: EntityId) {}

    /// Called once before the `awake` hooks of the attached components
    fn pre_awake(&mut self, _world: &mut World, _this: EntityId) {}

    /// Called once after component `awake` hooks and before their `start` hooks
    fn pre_start(&mut self, _world: &mut World, _this: EntityId) {}

    /// Called at the fixed simulation rate
    fn fixed_update(&mut self, _world: &mut World, _this: EntityId) {}

    /// Called once per frame
    fn update(&mut self, _world: &mut World, _this: EntityId) {}

    /// Called once per frame after `update`
    fn late_update(&mut self, _world: &mut World, _this: EntityId) {}

    /// Called when destroyed, or when the engine shuts down
    fn on_destroy(&mut self, _world: &mut World, _this: EntityId) {}

    /// Called for every event broadcast on this entity
    fn receive_event(&mut self, _world: &mut World, _this: EntityId, _event: &dyn Event) {}
}

/// Entity with no behaviour of its own; a plain container for components
#[derive(Debug, Default, Clone, Copy)]
pub struct Node;

impl Entity for Node {}

/// Engine-side record stored in a pool slot
pub(crate) struct EntityEntry {
    pub(crate) name: String,
    pub(crate) flags: Flags,
    pub(crate) marked_for_delete: bool,
    pub(crate) parent: Option<EntityId>,
    pub(crate) children: Vec<EntityId>,
    pub(crate) components: Vec<ComponentId>,
    pub(crate) transform: Transform2D,
    /// Checked out (`None`) while one of the entity's hooks runs
    pub(crate) behaviour: Option<Box<dyn Entity>>,
    /// Destroyed while a hook in its subtree was running; the destroy hooks
    /// run once the last of those hooks returns
    pub(crate) destroy_pending: bool,
    /// Broadcasts that arrived while one of its hooks was running
    pub(crate) pending_events: Vec<Box<dyn Event>>,
}

impl EntityEntry {
    pub(crate) fn new(behaviour: Box<dyn Entity>) -> Self {
        Self {
            name: String::from("entity"),
            flags: Flags::ENTITY_DEFAULT,
            marked_for_delete: false,
            parent: None,
            children: Vec::new(),
            components: Vec::new(),
            transform: Transform2D::default(),
            behaviour: Some(behaviour),
            destroy_pending: false,
            pending_events: Vec::new(),
        }
    }
}
