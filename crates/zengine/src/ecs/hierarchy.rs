//! Parent/child links and local transforms
//!
//! Moving an entity shifts every descendant by the same delta. Scaling does
//! not; use [`World::scale_children`] to push a scale delta down explicitly.

use super::{EntityId, EntityKey, World};
use crate::foundation::math::{Transform2D, Vec2};

impl World {
    /// The entity's parent, if any
    pub fn parent(&self, entity: impl EntityKey) -> Option<EntityId> {
        self.entry(entity)?.parent
    }

    /// The entity's children in the order they were attached
    pub fn children(&self, entity: impl EntityKey) -> &[EntityId] {
        self.entry(entity).map_or(&[][..], |entry| entry.children.as_slice())
    }

    /// True if `entity` sits somewhere below `ancestor`
    pub fn is_descendant_of(&self, entity: impl EntityKey, ancestor: impl EntityKey) -> bool {
        let (Some(entity), Some(ancestor)) = (entity.entity_id(), ancestor.entity_id()) else {
            return false;
        };
        let mut current = self.parent(entity);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Attach `child` to `parent`, or detach it when `parent` is empty or expired
    ///
    /// Ignored when the parent is unchanged, when either entity is marked for
    /// delete, or when the new parent is the child itself or one of its
    /// descendants.
    pub fn set_parent(&mut self, child: impl EntityKey, parent: impl EntityKey) {
        let Some(child) = child.entity_id() else {
            return;
        };
        let Some(entry) = self.pool.get(child) else {
            return;
        };
        let current = entry.parent;
        let parent = parent.entity_id().filter(|id| self.pool.contains(*id));

        if current == parent || entry.marked_for_delete {
            return;
        }
        if let Some(parent) = parent {
            if self.is_marked_for_delete(parent) {
                return;
            }
            if parent == child || self.is_descendant_of(parent, child) {
                log::warn!("Refusing to parent entity {child} under its own subtree ({parent})");
                return;
            }
        }

        if let Some(old) = current.and_then(|old| self.pool.get_mut(old)) {
            old.children.retain(|id| *id != child);
        }
        if let Some(entry) = self.pool.get_mut(child) {
            entry.parent = None;
        }

        let Some(parent) = parent else {
            return;
        };
        if let Some(entry) = self.pool.get_mut(parent) {
            entry.children.push(child);
        }
        if let Some(entry) = self.pool.get_mut(child) {
            entry.parent = Some(parent);
        }
    }

    /// Local transform
    pub fn transform(&self, entity: impl EntityKey) -> Option<Transform2D> {
        self.entry(entity).map(|entry| entry.transform)
    }

    /// Local position
    pub fn position(&self, entity: impl EntityKey) -> Option<Vec2> {
        self.entry(entity).map(|entry| entry.transform.position)
    }

    /// Move the entity to `position`, shifting descendants by the same delta
    pub fn set_position(&mut self, entity: impl EntityKey, position: Vec2) {
        if let Some(current) = self.position(entity.entity_id()) {
            self.move_by(entity, position - current);
        }
    }

    /// Shift the entity and every descendant by `delta`
    pub fn move_by(&mut self, entity: impl EntityKey, delta: Vec2) {
        let Some(id) = entity.entity_id() else {
            return;
        };
        let children = match self.pool.get_mut(id) {
            Some(entry) => {
                entry.transform.position += delta;
                entry.children.clone()
            }
            None => return,
        };
        for child in children {
            self.move_by(child, delta);
        }
    }

    /// Local rotation in radians
    pub fn rotation(&self, entity: impl EntityKey) -> Option<f32> {
        self.entry(entity).map(|entry| entry.transform.rotation)
    }

    /// Set the local rotation in radians
    pub fn set_rotation(&mut self, entity: impl EntityKey, rotation: f32) {
        if let Some(entry) = self.entry_mut(entity) {
            entry.transform.rotation = rotation;
        }
    }

    /// Add `angle` radians to the local rotation
    pub fn rotate(&mut self, entity: impl EntityKey, angle: f32) {
        if let Some(entry) = self.entry_mut(entity) {
            entry.transform.rotation += angle;
        }
    }

    /// Local scale
    pub fn scale(&self, entity: impl EntityKey) -> Option<Vec2> {
        self.entry(entity).map(|entry| entry.transform.scale)
    }

    /// Set the local scale; children are left untouched
    pub fn set_scale(&mut self, entity: impl EntityKey, scale: Vec2) {
        if let Some(entry) = self.entry_mut(entity) {
            entry.transform.scale = scale;
        }
    }

    /// Add `delta` to the scale of every descendant (not the entity itself)
    pub fn scale_children(&mut self, entity: impl EntityKey, delta: Vec2) {
        let children = self.children(entity).to_vec();
        for child in children {
            if let Some(entry) = self.pool.get_mut(child) {
                entry.transform.scale += delta;
            }
            self.scale_children(child, delta);
        }
    }
}
