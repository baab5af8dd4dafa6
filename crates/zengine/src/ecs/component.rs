//! Component trait and per-component bookkeeping

use std::any::TypeId;

use super::{AsAny, ComponentId, EntityId, Event, Flags, World};

/// Component lifecycle hooks
///
/// A component is owned by exactly one entity, fixed when it is attached.
/// Every hook has an empty default; the owner is available through
/// [`World::owner`].
pub trait Component: AsAny {
    /// At most one component of this type per entity
    fn unique() -> bool
    where
        Self: Sized,
    {
        false
    }

    /// Called when the component is attached, before `add_component` returns
    fn on_attach(&mut self, _world: &mut World, _this: ComponentId) {}

    /// Called once when the owner leaves the pending-awake queue
    fn awake(&mut self, _world: &mut World, _this: ComponentId) {}

    /// Called once after every component of the owner has run `awake`
    fn start(&mut self, _world: &mut World, _this: ComponentId) {}

    /// Called at the fixed simulation rate
    fn fixed_update(&mut self, _world: &mut World, _this: ComponentId) {}

    /// Called once per frame
    fn update(&mut self, _world: &mut World, _this: ComponentId) {}

    /// Called once per frame after `update`
    fn late_update(&mut self, _world: &mut World, _this: ComponentId) {}

    /// Called after the owner's `on_destroy`, or when removed
    fn on_destroy(&mut self, _world: &mut World, _this: ComponentId) {}

    /// Called for every event broadcast on the owner
    fn receive_event(&mut self, _world: &mut World, _this: ComponentId, _event: &dyn Event) {}
}

/// Engine-side record stored in the component slot map
pub(crate) struct ComponentEntry {
    pub(crate) owner: EntityId,
    pub(crate) type_id: TypeId,
    pub(crate) flags: Flags,
    pub(crate) marked_for_delete: bool,
    /// Checked out (`None`) while one of the component's hooks runs
    pub(crate) behaviour: Option<Box<dyn Component>>,
    pub(crate) destroy_hook_pending: bool,
    /// Removed while checked out; released on check-in
    pub(crate) removal_pending: bool,
}

impl ComponentEntry {
    pub(crate) fn new<T: Component>(owner: EntityId, component: T) -> Self {
        Self {
            owner,
            type_id: TypeId::of::<T>(),
            flags: Flags::COMPONENT_DEFAULT,
            marked_for_delete: false,
            behaviour: Some(Box::new(component)),
            destroy_hook_pending: false,
            removal_pending: false,
        }
    }
}
