//! Weak handles to entities and components
//!
//! Entities are addressed by a generation-tagged slot index ([`EntityId`]);
//! components by a slotmap key ([`ComponentId`]). Neither keeps its target
//! alive. Once the target is swept from the world every handle to it reports
//! expired, even if the slot is later reused.
//!
//! [`EntityRef`] and [`ComponentRef`] add a concrete type on top of the raw
//! id and an explicit "never assigned" state.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use super::{Component, Entity, World};

slotmap::new_key_type! {
    /// Stable identifier of an attached component
    pub struct ComponentId;
}

/// Generation-tagged identifier of an entity slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    index: u32,
    generation: u32,
}

impl EntityId {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Pool slot currently holding the entity
    pub fn index(&self) -> usize {
        self.index as usize
    }

    /// Generation of the slot when the entity was spawned
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Type-erased access to `Any` for trait objects
///
/// Blanket-implemented for every `'static` type so entity, component, event
/// and pipeline trait objects can be downcast to their concrete types.
pub trait AsAny: Any {
    /// Borrow as `&dyn Any`
    fn as_any(&self) -> &dyn Any;

    /// Borrow as `&mut dyn Any`
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Name of the concrete type, for diagnostics
    fn type_name(&self) -> &'static str;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Anything that can name an entity: raw ids, typed refs, or nothing
pub trait EntityKey {
    /// The referenced entity id, `None` for an empty handle
    fn entity_id(&self) -> Option<EntityId>;
}

impl EntityKey for EntityId {
    fn entity_id(&self) -> Option<EntityId> {
        Some(*self)
    }
}

impl EntityKey for Option<EntityId> {
    fn entity_id(&self) -> Option<EntityId> {
        *self
    }
}

impl<T: Entity> EntityKey for EntityRef<T> {
    fn entity_id(&self) -> Option<EntityId> {
        self.id
    }
}

/// Anything that can name a component: raw ids or typed refs
pub trait ComponentKey {
    /// The referenced component id, `None` for an empty handle
    fn component_id(&self) -> Option<ComponentId>;
}

impl ComponentKey for ComponentId {
    fn component_id(&self) -> Option<ComponentId> {
        Some(*self)
    }
}

impl ComponentKey for Option<ComponentId> {
    fn component_id(&self) -> Option<ComponentId> {
        *self
    }
}

impl<T: Component> ComponentKey for ComponentRef<T> {
    fn component_id(&self) -> Option<ComponentId> {
        self.id
    }
}

/// Typed weak handle to an entity
pub struct EntityRef<T: Entity> {
    id: Option<EntityId>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Entity> EntityRef<T> {
    /// A handle that was never assigned
    pub fn empty() -> Self {
        Self { id: None, _marker: PhantomData }
    }

    /// The referenced id, if assigned
    pub fn id(&self) -> Option<EntityId> {
        self.id
    }

    /// True if the handle was never assigned (or was reset)
    pub fn is_empty(&self) -> bool {
        self.id.is_none()
    }

    /// True if the entity is still in the world
    ///
    /// An entity marked for delete stays valid until the end-of-tick sweep.
    pub fn is_valid(&self, world: &World) -> bool {
        self.id.is_some_and(|id| world.contains(id))
    }

    /// True if the handle was assigned and its entity has been swept
    pub fn is_expired(&self, world: &World) -> bool {
        self.id.is_some_and(|id| !world.contains(id))
    }

    /// Borrow the entity as `T`
    ///
    /// `None` when the handle is empty or expired, when the entity is not a
    /// `T`, or while one of the entity's own hooks is running.
    pub fn get<'w>(&self, world: &'w World) -> Option<&'w T> {
        world.entity::<T>(self.id?)
    }

    /// Mutably borrow the entity as `T`
    pub fn get_mut<'w>(&self, world: &'w mut World) -> Option<&'w mut T> {
        world.entity_mut::<T>(self.id?)
    }

    /// Forget the referenced entity
    pub fn reset(&mut self) {
        self.id = None;
    }

    /// Reinterpret the referenced entity as another type
    ///
    /// Ownership is unaffected; `get` on the result succeeds only if the
    /// entity really is a `U`.
    pub fn cast<U: Entity>(self) -> EntityRef<U> {
        EntityRef { id: self.id, _marker: PhantomData }
    }
}

impl<T: Entity> From<EntityId> for EntityRef<T> {
    fn from(id: EntityId) -> Self {
        Self { id: Some(id), _marker: PhantomData }
    }
}

impl<T: Entity> Default for EntityRef<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Entity> Clone for EntityRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Entity> Copy for EntityRef<T> {}

impl<T: Entity, U: Entity> PartialEq<EntityRef<U>> for EntityRef<T> {
    fn eq(&self, other: &EntityRef<U>) -> bool {
        self.id == other.id
    }
}

impl<T: Entity> Eq for EntityRef<T> {}

impl<T: Entity> Hash for EntityRef<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T: Entity> fmt::Debug for EntityRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "EntityRef<{}>({id})", std::any::type_name::<T>()),
            None => write!(f, "EntityRef<{}>(empty)", std::any::type_name::<T>()),
        }
    }
}

/// Typed weak handle to a component
pub struct ComponentRef<T: Component> {
    id: Option<ComponentId>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Component> ComponentRef<T> {
    /// A handle that was never assigned
    pub fn empty() -> Self {
        Self { id: None, _marker: PhantomData }
    }

    /// The referenced id, if assigned
    pub fn id(&self) -> Option<ComponentId> {
        self.id
    }

    /// True if the handle was never assigned (or was reset)
    pub fn is_empty(&self) -> bool {
        self.id.is_none()
    }

    /// True if the component is still attached
    pub fn is_valid(&self, world: &World) -> bool {
        self.id.is_some_and(|id| world.contains_component(id))
    }

    /// True if the handle was assigned and its component is gone
    pub fn is_expired(&self, world: &World) -> bool {
        self.id.is_some_and(|id| !world.contains_component(id))
    }

    /// Borrow the component as `T`
    ///
    /// `None` when the handle is empty or expired, on a type mismatch, or
    /// while one of the component's own hooks is running.
    pub fn get<'w>(&self, world: &'w World) -> Option<&'w T> {
        world.component::<T>(self.id?)
    }

    /// Mutably borrow the component as `T`
    pub fn get_mut<'w>(&self, world: &'w mut World) -> Option<&'w mut T> {
        world.component_mut::<T>(self.id?)
    }

    /// The entity this component is attached to
    pub fn owner(&self, world: &World) -> Option<EntityId> {
        world.owner(self.id?)
    }

    /// Forget the referenced component
    pub fn reset(&mut self) {
        self.id = None;
    }

    /// Reinterpret the referenced component as another type
    pub fn cast<U: Component>(self) -> ComponentRef<U> {
        ComponentRef { id: self.id, _marker: PhantomData }
    }
}

impl<T: Component> From<ComponentId> for ComponentRef<T> {
    fn from(id: ComponentId) -> Self {
        Self { id: Some(id), _marker: PhantomData }
    }
}

impl<T: Component> Default for ComponentRef<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Component> Clone for ComponentRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Component> Copy for ComponentRef<T> {}

impl<T: Component, U: Component> PartialEq<ComponentRef<U>> for ComponentRef<T> {
    fn eq(&self, other: &ComponentRef<U>) -> bool {
        self.id == other.id
    }
}

impl<T: Component> Eq for ComponentRef<T> {}

impl<T: Component> Hash for ComponentRef<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T: Component> fmt::Debug for ComponentRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "ComponentRef<{}>({id:?})", std::any::type_name::<T>()),
            None => write!(f, "ComponentRef<{}>(empty)", std::any::type_name::<T>()),
        }
    }
}
