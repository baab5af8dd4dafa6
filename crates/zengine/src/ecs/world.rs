//! ECS World implementation
//!
//! The world is the explicit engine context handed to every hook. It owns the
//! entity pool (the only owner of entity and component lifetime), the
//! pending-awake queue, timing, input, assets and the render and physics
//! pipelines.
//!
//! Hooks run with the hook's own behaviour checked out of its slot, so they
//! can take `&mut World` freely. Destroys and broadcasts aimed at an entity
//! whose hooks are checked out are queued on its slot and replayed, in
//! order, as soon as the running hook returns.

use std::any::TypeId;

use slotmap::SlotMap;

use super::component::ComponentEntry;
use super::entity::EntityEntry;
use super::pool::EntityPool;
use super::{
    Component, ComponentId, ComponentKey, ComponentRef, Entity, EntityId, EntityKey,
    EntityRef, Event, Flags,
};
use crate::assets::AssetManager;
use crate::foundation::time::Time;
use crate::physics::{NullPhysicsPipeline, PhysicsPipeline};
use crate::platform::InputManager;
use crate::render::{HeadlessRenderPipeline, RenderPipeline};

/// ECS World containing all entities, components and engine services
pub struct World {
    pub(super) pool: EntityPool,
    pub(super) components: SlotMap<ComponentId, ComponentEntry>,
    pub(super) pending_awake: Vec<EntityId>,
    pub(super) paused: bool,
    pub(super) time: Time,
    pub(super) input: InputManager,
    pub(super) assets: AssetManager,
    /// Taken out for the duration of a render pass
    pub(super) render_pipeline: Option<Box<dyn RenderPipeline>>,
    pub(super) physics_pipeline: Box<dyn PhysicsPipeline>,
}

impl World {
    /// Create an empty, unpaused world with headless pipelines
    pub fn new() -> Self {
        Self {
            pool: EntityPool::default(),
            components: SlotMap::with_key(),
            pending_awake: Vec::new(),
            paused: false,
            time: Time::default(),
            input: InputManager::new(),
            assets: AssetManager::default(),
            render_pipeline: Some(Box::new(HeadlessRenderPipeline::default())),
            physics_pipeline: Box::new(NullPhysicsPipeline::default()),
        }
    }

    // ------------------------------------------------------------------
    // Spawning and destruction
    // ------------------------------------------------------------------

    /// Spawn a default-constructed entity of type `T`
    pub fn spawn<T: Entity + Default>(&mut self) -> EntityRef<T> {
        self.spawn_with(T::default())
    }

    /// Spawn the given entity value
    ///
    /// The entity takes the lowest free pool slot, joins the pending-awake
    /// queue and runs `on_create` before the handle is returned.
    pub fn spawn_with<T: Entity>(&mut self, entity: T) -> EntityRef<T> {
        let id = self.pool.insert(EntityEntry::new(Box::new(entity)));
        self.pending_awake.push(id);
        log::debug!("Spawned {} as entity {id}", std::any::type_name::<T>());

        self.run_entity_hook(id, |entity, world, id| entity.on_create(world, id));
        EntityRef::from(id)
    }

    /// Mark an entity and all of its descendants for delete
    ///
    /// Hooks fire immediately: the entity's `on_destroy`, then each
    /// component's in attach order, then the children depth-first. The slot
    /// itself is released by [`cleanup`](Self::cleanup). Expired handles and
    /// entities already marked are ignored.
    ///
    /// When a hook of the entity, one of its components or a descendant is
    /// running (an entity destroying itself from `update`, a [`Lifetime`]
    /// destroying its owner), the entity is marked at once and the hooks
    /// fire, in the same order, as soon as that hook returns.
    ///
    /// [`Lifetime`]: super::Lifetime
    pub fn destroy(&mut self, entity: impl EntityKey) {
        let Some(id) = entity.entity_id() else {
            return;
        };
        if !self.pool.mark_for_kill(id) {
            return;
        }
        log::debug!("Entity {id} marked for delete");

        if self.subtree_running(id) {
            if let Some(entry) = self.pool.get_mut(id) {
                entry.destroy_pending = true;
            }
            return;
        }
        self.destroy_cascade(id);
    }

    fn destroy_cascade(&mut self, id: EntityId) {
        self.run_entity_hook(id, |entity, world, id| entity.on_destroy(world, id));

        for component in self.component_ids(id) {
            if let Some(entry) = self.components.get_mut(component) {
                entry.marked_for_delete = true;
            }
            self.invoke_component_destroy(component);
        }

        let children = self.pool.get(id).map(|entry| entry.children.clone()).unwrap_or_default();
        for child in children {
            self.destroy(child);
        }

        let parent = self.pool.get_mut(id).and_then(|entry| entry.parent.take());
        if let Some(parent) = parent.and_then(|parent| self.pool.get_mut(parent)) {
            parent.children.retain(|child| *child != id);
        }
    }

    /// Release every slot marked for delete since the last cleanup
    ///
    /// The scheduler calls this once per tick, after rendering. Components of
    /// released entities are dropped with them.
    pub fn cleanup(&mut self) {
        for (id, entry) in self.pool.sweep() {
            for component in entry.components {
                self.components.remove(component);
            }
            log::debug!("Entity {id} released");
        }
    }

    /// Drop every entity and component without running any hook
    pub(crate) fn release_all(&mut self) {
        let released = self.pool.clear();
        log::debug!("Released {} entities", released.len());
        self.components.clear();
        self.pending_awake.clear();
    }

    // ------------------------------------------------------------------
    // Entity access
    // ------------------------------------------------------------------

    /// True if the id names an entity still in the pool (marked or not)
    pub fn contains(&self, id: EntityId) -> bool {
        self.pool.contains(id)
    }

    /// Borrow an entity as its concrete type
    pub fn entity<T: Entity>(&self, id: EntityId) -> Option<&T> {
        self.pool.get(id)?.behaviour.as_deref()?.as_any().downcast_ref::<T>()
    }

    /// Mutably borrow an entity as its concrete type
    pub fn entity_mut<T: Entity>(&mut self, id: EntityId) -> Option<&mut T> {
        self.pool.get_mut(id)?.behaviour.as_deref_mut()?.as_any_mut().downcast_mut::<T>()
    }

    /// Borrow an entity as a trait object
    pub fn entity_dyn(&self, id: EntityId) -> Option<&dyn Entity> {
        self.pool.get(id)?.behaviour.as_deref()
    }

    /// Live entity ids in slot order, including those marked for delete
    pub fn entities(&self) -> Vec<EntityId> {
        self.pool.ids().collect()
    }

    /// Number of entities in the pool, including those marked for delete
    pub fn entity_count(&self) -> usize {
        self.pool.len()
    }

    /// Number of pool slots ever allocated
    pub fn pool_len(&self) -> usize {
        self.pool.capacity()
    }

    /// Slot indices available for reuse, lowest first
    pub fn free_slots(&self) -> Vec<usize> {
        self.pool.free_positions().collect()
    }

    /// Slot indices waiting for the next cleanup
    pub fn pending_kills(&self) -> &[usize] {
        self.pool.kill_positions()
    }

    /// Number of entities still waiting for their awake/start hooks
    pub fn pending_awake_len(&self) -> usize {
        self.pending_awake.len()
    }

    /// True if the entity is waiting for its awake/start hooks
    pub fn is_pending_awake(&self, entity: impl EntityKey) -> bool {
        entity.entity_id().is_some_and(|id| self.pending_awake.contains(&id))
    }

    /// First entity with the given name, in slot order
    pub fn find_by_name(&self, name: &str) -> Option<EntityId> {
        self.pool.ids().find(|id| self.pool.get(*id).is_some_and(|entry| entry.name == name))
    }

    /// Entity name
    pub fn name(&self, entity: impl EntityKey) -> Option<&str> {
        self.pool.get(entity.entity_id()?).map(|entry| entry.name.as_str())
    }

    /// Rename an entity
    pub fn set_name(&mut self, entity: impl EntityKey, name: impl Into<String>) {
        if let Some(entry) = entity.entity_id().and_then(|id| self.pool.get_mut(id)) {
            entry.name = name.into();
        }
    }

    /// True if the entity is in the pool but waiting to be swept
    pub fn is_marked_for_delete(&self, entity: impl EntityKey) -> bool {
        self.entry(entity).is_some_and(|entry| entry.marked_for_delete)
    }

    /// Entity flags
    pub fn flags(&self, entity: impl EntityKey) -> Option<Flags> {
        self.entry(entity).map(|entry| entry.flags)
    }

    /// True if the entity participates in the frame
    pub fn is_enabled(&self, entity: impl EntityKey) -> bool {
        self.entry(entity).is_some_and(|entry| entry.flags.contains(Flags::ENABLED))
    }

    /// Enable or disable an entity
    pub fn set_enabled(&mut self, entity: impl EntityKey, enabled: bool) {
        self.set_entity_flag(entity, Flags::ENABLED, enabled);
    }

    /// Toggle the entity's own fixed/update/late-update hooks
    pub fn set_update_enabled(&mut self, entity: impl EntityKey, enabled: bool) {
        self.set_entity_flag(entity, Flags::UPDATE, enabled);
    }

    /// Keep the entity updating while the simulation is paused
    pub fn set_pause_enabled(&mut self, entity: impl EntityKey, enabled: bool) {
        self.set_entity_flag(entity, Flags::PAUSE, enabled);
    }

    /// Toggle update hooks of every component attached to the entity
    pub fn set_component_update_enabled(&mut self, entity: impl EntityKey, enabled: bool) {
        self.set_entity_flag(entity, Flags::COMPONENT_UPDATE, enabled);
    }

    fn set_entity_flag(&mut self, entity: impl EntityKey, flag: Flags, value: bool) {
        if let Some(entry) = entity.entity_id().and_then(|id| self.pool.get_mut(id)) {
            entry.flags.set(flag, value);
        }
    }

    pub(super) fn entry(&self, entity: impl EntityKey) -> Option<&EntityEntry> {
        self.pool.get(entity.entity_id()?)
    }

    pub(super) fn entry_mut(&mut self, entity: impl EntityKey) -> Option<&mut EntityEntry> {
        self.pool.get_mut(entity.entity_id()?)
    }

    // ------------------------------------------------------------------
    // Components
    // ------------------------------------------------------------------

    /// Attach a component to an entity
    ///
    /// The component is appended to the owner's list and its `on_attach` runs
    /// before this returns. An empty handle comes back if the owner is gone
    /// or marked for delete. For [`Component::unique`] types the existing
    /// component is returned instead of attaching a second one.
    pub fn add_component<T: Component>(&mut self, owner: impl EntityKey, component: T) -> ComponentRef<T> {
        let Some(owner) = owner.entity_id() else {
            return ComponentRef::empty();
        };
        match self.pool.get(owner) {
            Some(entry) if !entry.marked_for_delete => {}
            _ => {
                log::debug!("Ignoring {} for unavailable entity {owner}", std::any::type_name::<T>());
                return ComponentRef::empty();
            }
        }

        if T::unique() {
            let existing = self.get_component::<T>(owner);
            if !existing.is_empty() {
                log::debug!("Entity {owner} already has a {}", std::any::type_name::<T>());
                return existing;
            }
        }

        let id = self.components.insert(ComponentEntry::new(owner, component));
        if let Some(entry) = self.pool.get_mut(owner) {
            entry.components.push(id);
        }

        self.run_component_hook(id, |component, world, id| component.on_attach(world, id));
        ComponentRef::from(id)
    }

    /// First component of type `T` on the entity, in attach order
    pub fn get_component<T: Component>(&self, owner: impl EntityKey) -> ComponentRef<T> {
        let wanted = TypeId::of::<T>();
        self.entry(owner)
            .and_then(|entry| {
                entry.components.iter().copied().find(|id| {
                    self.components.get(*id).is_some_and(|component| component.type_id == wanted)
                })
            })
            .map_or_else(ComponentRef::empty, ComponentRef::from)
    }

    /// All components of the entity, in attach order
    pub fn components(&self, owner: impl EntityKey) -> &[ComponentId] {
        self.entry(owner).map_or(&[][..], |entry| entry.components.as_slice())
    }

    fn component_ids(&self, owner: EntityId) -> Vec<ComponentId> {
        self.pool.get(owner).map(|entry| entry.components.clone()).unwrap_or_default()
    }

    /// Detach and drop the first component of type `T`, running its `on_destroy`
    pub fn remove_component<T: Component>(&mut self, owner: impl EntityKey) {
        let Some(owner) = owner.entity_id() else {
            return;
        };
        if let Some(id) = self.get_component::<T>(owner).id() {
            self.detach_component(owner, id);
        }
    }

    /// Detach and drop a specific component
    ///
    /// Ignored unless `component` is attached to `owner`.
    pub fn remove_component_by_id(&mut self, owner: impl EntityKey, component: impl ComponentKey) {
        let (Some(owner), Some(id)) = (owner.entity_id(), component.component_id()) else {
            return;
        };
        if self.owner(id) == Some(owner) {
            self.detach_component(owner, id);
        }
    }

    fn detach_component(&mut self, owner: EntityId, id: ComponentId) {
        if let Some(entry) = self.pool.get_mut(owner) {
            entry.components.retain(|component| *component != id);
        }

        let checked_out = match self.components.get_mut(id) {
            Some(entry) => {
                entry.marked_for_delete = true;
                entry.behaviour.is_none()
            }
            None => return,
        };

        if checked_out {
            // Released when the running hook hands the component back
            if let Some(entry) = self.components.get_mut(id) {
                entry.destroy_hook_pending = true;
                entry.removal_pending = true;
            }
        } else {
            self.run_component_hook(id, |component, world, id| component.on_destroy(world, id));
            self.components.remove(id);
        }
    }

    /// True if the component is still attached
    pub fn contains_component(&self, id: ComponentId) -> bool {
        self.components.contains_key(id)
    }

    /// Borrow a component as its concrete type
    pub fn component<T: Component>(&self, id: ComponentId) -> Option<&T> {
        self.components.get(id)?.behaviour.as_deref()?.as_any().downcast_ref::<T>()
    }

    /// Mutably borrow a component as its concrete type
    pub fn component_mut<T: Component>(&mut self, id: ComponentId) -> Option<&mut T> {
        self.components.get_mut(id)?.behaviour.as_deref_mut()?.as_any_mut().downcast_mut::<T>()
    }

    /// Entity a component is attached to
    pub fn owner(&self, component: impl ComponentKey) -> Option<EntityId> {
        self.components.get(component.component_id()?).map(|entry| entry.owner)
    }

    /// True if the component is enabled
    pub fn is_component_enabled(&self, component: impl ComponentKey) -> bool {
        self.component_entry(component).is_some_and(|entry| entry.flags.contains(Flags::ENABLED))
    }

    /// True if the component's owner was destroyed or it was removed this tick
    pub fn is_component_marked_for_delete(&self, component: impl ComponentKey) -> bool {
        self.component_entry(component).is_some_and(|entry| entry.marked_for_delete)
    }

    /// Component flags
    pub fn component_flags(&self, component: impl ComponentKey) -> Option<Flags> {
        self.component_entry(component).map(|entry| entry.flags)
    }

    /// Enable or disable a component
    pub fn set_component_enabled(&mut self, component: impl ComponentKey, enabled: bool) {
        self.set_component_flag(component, Flags::ENABLED, enabled);
    }

    /// Toggle the component's update hooks
    pub fn set_component_updates(&mut self, component: impl ComponentKey, enabled: bool) {
        self.set_component_flag(component, Flags::UPDATE, enabled);
    }

    /// Keep the component updating while the simulation is paused
    pub fn set_component_pause_enabled(&mut self, component: impl ComponentKey, enabled: bool) {
        self.set_component_flag(component, Flags::PAUSE, enabled);
    }

    fn set_component_flag(&mut self, component: impl ComponentKey, flag: Flags, value: bool) {
        if let Some(entry) = component.component_id().and_then(|id| self.components.get_mut(id)) {
            entry.flags.set(flag, value);
        }
    }

    pub(super) fn component_entry(&self, component: impl ComponentKey) -> Option<&ComponentEntry> {
        self.components.get(component.component_id()?)
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Deliver an event to the entity, then to each of its components in attach order
    ///
    /// Delivery is synchronous, except while a hook of the target entity or
    /// of one of its components is running (an entity broadcasting to
    /// itself, a component to its owner). The event is then queued and
    /// delivered, in the same order, as soon as that hook returns.
    pub fn broadcast(&mut self, target: impl EntityKey, event: impl Event) {
        let Some(id) = target.entity_id() else {
            return;
        };
        if !self.pool.contains(id) {
            return;
        }

        if self.hooks_running(id) {
            log::trace!("Event for entity {id} queued behind its running hook");
            if let Some(entry) = self.pool.get_mut(id) {
                entry.pending_events.push(Box::new(event));
            }
            return;
        }
        self.deliver_event(id, &event);
    }

    fn deliver_event(&mut self, id: EntityId, event: &dyn Event) {
        self.run_entity_hook(id, |entity, world, id| entity.receive_event(world, id, event));
        for component in self.component_ids(id) {
            self.run_component_hook(component, |component, world, cid| {
                component.receive_event(world, cid, event);
            });
        }
    }

    // ------------------------------------------------------------------
    // Services
    // ------------------------------------------------------------------

    /// True if the simulation is paused
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Pause or resume the simulation
    ///
    /// While paused the fixed-step and awake phases are skipped and only
    /// pause-enabled entities and components update.
    pub fn set_paused(&mut self, paused: bool) {
        if self.paused != paused {
            log::info!("Simulation {}", if paused { "paused" } else { "resumed" });
        }
        self.paused = paused;
    }

    /// Frame timing
    pub fn time(&self) -> &Time {
        &self.time
    }

    /// Mutable frame timing (time scale, fixed step)
    pub fn time_mut(&mut self) -> &mut Time {
        &mut self.time
    }

    /// Input state
    pub fn input(&self) -> &InputManager {
        &self.input
    }

    /// Mutable input state (bindings)
    pub fn input_mut(&mut self) -> &mut InputManager {
        &mut self.input
    }

    /// Asset cache
    pub fn assets(&self) -> &AssetManager {
        &self.assets
    }

    /// Mutable asset cache
    pub fn assets_mut(&mut self) -> &mut AssetManager {
        &mut self.assets
    }

    /// Replace the render pipeline
    ///
    /// Cameras registered with the previous pipeline move to the new one.
    pub fn set_render_pipeline(&mut self, pipeline: impl RenderPipeline) {
        log::info!("Render pipeline set to {}", std::any::type_name_of_val(&pipeline));
        let mut pipeline: Box<dyn RenderPipeline> = Box::new(pipeline);
        if let Some(previous) = self.render_pipeline.take() {
            for camera in previous.cameras().iter() {
                pipeline.add_camera(camera);
            }
        }
        self.render_pipeline = Some(pipeline);
    }

    /// The render pipeline (absent only while it is rendering)
    pub fn render_pipeline_mut(&mut self) -> Option<&mut (dyn RenderPipeline + 'static)> {
        self.render_pipeline.as_deref_mut()
    }

    /// The render pipeline as its concrete type
    pub fn render_pipeline<T: RenderPipeline>(&self) -> Option<&T> {
        self.render_pipeline.as_deref()?.as_any().downcast_ref::<T>()
    }

    /// Replace the physics pipeline
    pub fn set_physics_pipeline(&mut self, pipeline: impl PhysicsPipeline) {
        log::info!("Physics pipeline set to {}", std::any::type_name_of_val(&pipeline));
        self.physics_pipeline = Box::new(pipeline);
    }

    /// The physics pipeline
    pub fn physics_pipeline_mut(&mut self) -> &mut dyn PhysicsPipeline {
        self.physics_pipeline.as_mut()
    }

    /// The physics pipeline as its concrete type
    pub fn physics_pipeline<T: PhysicsPipeline>(&self) -> Option<&T> {
        let pipeline: &dyn PhysicsPipeline = self.physics_pipeline.as_ref();
        pipeline.as_any().downcast_ref::<T>()
    }

    // ------------------------------------------------------------------
    // Hook dispatch
    // ------------------------------------------------------------------

    /// Run `hook` with the entity's behaviour checked out
    ///
    /// Returns false if the entity is gone or its behaviour is already
    /// checked out by an outer hook.
    pub(super) fn run_entity_hook<F>(&mut self, id: EntityId, hook: F) -> bool
    where
        F: FnOnce(&mut dyn Entity, &mut World, EntityId),
    {
        let Some(mut behaviour) = self.pool.get_mut(id).and_then(|entry| entry.behaviour.take()) else {
            return false;
        };
        hook(&mut *behaviour, self, id);
        self.check_in_entity(id, behaviour);
        true
    }

    fn check_in_entity(&mut self, id: EntityId, behaviour: Box<dyn Entity>) {
        let Some(entry) = self.pool.get_mut(id) else {
            return;
        };
        entry.behaviour = Some(behaviour);
        self.resume_deferred(id);
    }

    /// Run the work queued behind hooks of `id` that have now returned:
    /// pending broadcasts to `id` first, then deferred destroys of `id` and
    /// of its ancestors, nearest first.
    fn resume_deferred(&mut self, id: EntityId) {
        while !self.hooks_running(id) {
            let Some(event) = self
                .pool
                .get_mut(id)
                .and_then(|entry| (!entry.pending_events.is_empty()).then(|| entry.pending_events.remove(0)))
            else {
                break;
            };
            self.deliver_event(id, &*event);
        }

        let mut lineage = Vec::new();
        let mut current = Some(id);
        while let Some(entity) = current {
            lineage.push(entity);
            current = self.pool.get(entity).and_then(|entry| entry.parent);
        }
        for entity in lineage {
            let pending = self.pool.get(entity).is_some_and(|entry| entry.destroy_pending);
            if pending && !self.subtree_running(entity) {
                if let Some(entry) = self.pool.get_mut(entity) {
                    entry.destroy_pending = false;
                }
                self.destroy_cascade(entity);
            }
        }
    }

    /// True while a hook of the entity or of one of its components runs
    fn hooks_running(&self, id: EntityId) -> bool {
        self.pool.get(id).is_some_and(|entry| {
            entry.behaviour.is_none()
                || entry
                    .components
                    .iter()
                    .any(|component| self.components.get(*component).is_some_and(|c| c.behaviour.is_none()))
        })
    }

    /// [`hooks_running`](Self::hooks_running) for the entity or any descendant
    fn subtree_running(&self, id: EntityId) -> bool {
        self.hooks_running(id)
            || self
                .pool
                .get(id)
                .is_some_and(|entry| entry.children.iter().any(|child| self.subtree_running(*child)))
    }

    /// Run `hook` with the component's behaviour checked out
    pub(super) fn run_component_hook<F>(&mut self, id: ComponentId, hook: F) -> bool
    where
        F: FnOnce(&mut dyn Component, &mut World, ComponentId),
    {
        let Some(mut behaviour) = self.components.get_mut(id).and_then(|entry| entry.behaviour.take()) else {
            return false;
        };
        hook(&mut *behaviour, self, id);
        self.check_in_component(id, behaviour);
        true
    }

    fn check_in_component(&mut self, id: ComponentId, mut behaviour: Box<dyn Component>) {
        let Some(owner) = self.owner(id) else {
            return;
        };
        loop {
            let Some(entry) = self.components.get_mut(id) else {
                break;
            };
            if entry.destroy_hook_pending {
                entry.destroy_hook_pending = false;
                behaviour.on_destroy(self, id);
                continue;
            }
            if entry.removal_pending {
                self.components.remove(id);
            } else {
                entry.behaviour = Some(behaviour);
            }
            break;
        }
        self.resume_deferred(owner);
    }

    fn invoke_component_destroy(&mut self, id: ComponentId) {
        let ran = self.run_component_hook(id, |component, world, id| component.on_destroy(world, id));
        if !ran {
            if let Some(entry) = self.components.get_mut(id) {
                entry.destroy_hook_pending = true;
            }
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
