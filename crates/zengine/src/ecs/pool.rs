//! Slot-indexed entity storage
//!
//! Every slot is in exactly one of three states: occupied, pending kill
//! (occupied but marked for delete this tick) or free. Freed slots are reused
//! lowest index first. A slot's generation is bumped when its occupant is
//! swept, which is what invalidates outstanding [`EntityId`]s.

use std::collections::BTreeSet;

use super::entity::EntityEntry;
use super::EntityId;

struct Slot {
    generation: u32,
    entry: Option<EntityEntry>,
}

/// Entity slots plus the kill/free ledgers
#[derive(Default)]
pub(crate) struct EntityPool {
    slots: Vec<Slot>,
    free_positions: BTreeSet<usize>,
    kill_positions: Vec<usize>,
    live: usize,
}

impl EntityPool {
    /// Place an entry in the lowest free slot, or append a new one
    pub(crate) fn insert(&mut self, entry: EntityEntry) -> EntityId {
        let index = match self.free_positions.pop_first() {
            Some(index) => {
                self.slots[index].entry = Some(entry);
                index
            }
            None => {
                self.slots.push(Slot { generation: 0, entry: Some(entry) });
                self.slots.len() - 1
            }
        };
        self.live += 1;
        EntityId::new(slot_index(index), self.slots[index].generation)
    }

    pub(crate) fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    pub(crate) fn get(&self, id: EntityId) -> Option<&EntityEntry> {
        let slot = self.slots.get(id.index())?;
        if slot.generation == id.generation() {
            slot.entry.as_ref()
        } else {
            None
        }
    }

    pub(crate) fn get_mut(&mut self, id: EntityId) -> Option<&mut EntityEntry> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation == id.generation() {
            slot.entry.as_mut()
        } else {
            None
        }
    }

    /// Mark an entity for delete and record its slot for the next sweep
    ///
    /// Returns false if the id is stale or the entity was already marked.
    pub(crate) fn mark_for_kill(&mut self, id: EntityId) -> bool {
        let Some(entry) = self.get_mut(id) else {
            return false;
        };
        if entry.marked_for_delete {
            return false;
        }
        entry.marked_for_delete = true;
        self.kill_positions.push(id.index());
        true
    }

    /// Release every slot recorded by [`mark_for_kill`](Self::mark_for_kill)
    ///
    /// Returns the released entries so their components can be dropped too.
    pub(crate) fn sweep(&mut self) -> Vec<(EntityId, EntityEntry)> {
        let mut released = Vec::with_capacity(self.kill_positions.len());
        for index in std::mem::take(&mut self.kill_positions) {
            let slot = &mut self.slots[index];
            let id = EntityId::new(slot_index(index), slot.generation);
            if let Some(entry) = slot.entry.take() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free_positions.insert(index);
                self.live -= 1;
                released.push((id, entry));
            }
        }
        released
    }

    /// Drop every entry and reset the ledgers, keeping generations bumped
    pub(crate) fn clear(&mut self) -> Vec<(EntityId, EntityEntry)> {
        let mut released = Vec::with_capacity(self.live);
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some(entry) = slot.entry.take() {
                released.push((EntityId::new(slot_index(index), slot.generation), entry));
                slot.generation = slot.generation.wrapping_add(1);
            }
            self.free_positions.insert(index);
        }
        self.kill_positions.clear();
        self.live = 0;
        released
    }

    /// Write the ids of all occupied slots into `out`, in slot order
    pub(crate) fn collect_ids(&self, out: &mut Vec<EntityId>) {
        out.clear();
        out.extend(self.ids());
    }

    /// Ids of all occupied slots, in slot order
    pub(crate) fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.entry
                .as_ref()
                .map(|_| EntityId::new(slot_index(index), slot.generation))
        })
    }

    /// Occupied slots, including those pending kill
    pub(crate) fn len(&self) -> usize {
        self.live
    }

    /// Total number of slots ever allocated
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn free_positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.free_positions.iter().copied()
    }

    pub(crate) fn kill_positions(&self) -> &[usize] {
        &self.kill_positions
    }
}

#[allow(clippy::cast_possible_truncation)]
fn slot_index(index: usize) -> u32 {
    debug_assert!(u32::try_from(index).is_ok(), "entity pool exceeded u32 slots");
    index as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::Node;

    fn entry() -> EntityEntry {
        EntityEntry::new(Box::new(Node))
    }

    #[test]
    fn test_insert_appends_when_no_free_slot() {
        let mut pool = EntityPool::default();
        let a = pool.insert(entry());
        let b = pool.insert(entry());
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_kill_is_deferred_until_sweep() {
        let mut pool = EntityPool::default();
        let a = pool.insert(entry());

        assert!(pool.mark_for_kill(a));
        assert!(pool.contains(a));
        assert_eq!(pool.kill_positions(), &[0]);
        assert_eq!(pool.free_positions().count(), 0);

        let released = pool.sweep();
        assert_eq!(released.len(), 1);
        assert!(!pool.contains(a));
        assert!(pool.kill_positions().is_empty());
        assert_eq!(pool.free_positions().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn test_double_mark_is_ignored() {
        let mut pool = EntityPool::default();
        let a = pool.insert(entry());
        assert!(pool.mark_for_kill(a));
        assert!(!pool.mark_for_kill(a));
        assert_eq!(pool.kill_positions().len(), 1);
    }

    #[test]
    fn test_reuse_lowest_free_slot_with_new_generation() {
        let mut pool = EntityPool::default();
        let ids: Vec<_> = (0..4).map(|_| pool.insert(entry())).collect();

        pool.mark_for_kill(ids[3]);
        pool.mark_for_kill(ids[1]);
        pool.sweep();

        let reused = pool.insert(entry());
        assert_eq!(reused.index(), 1);
        assert_eq!(reused.generation(), 1);
        assert!(!pool.contains(ids[1]));
        assert!(pool.contains(reused));

        let next = pool.insert(entry());
        assert_eq!(next.index(), 3);
        assert_eq!(pool.capacity(), 4);
    }

    #[test]
    fn test_ids_in_slot_order() {
        let mut pool = EntityPool::default();
        let ids: Vec<_> = (0..3).map(|_| pool.insert(entry())).collect();
        pool.mark_for_kill(ids[0]);
        pool.sweep();
        let replacement = pool.insert(entry());

        let mut out = Vec::new();
        pool.collect_ids(&mut out);
        assert_eq!(out, vec![replacement, ids[1], ids[2]]);
    }

    #[test]
    fn test_clear_invalidates_everything() {
        let mut pool = EntityPool::default();
        let a = pool.insert(entry());
        let b = pool.insert(entry());
        pool.mark_for_kill(a);

        assert_eq!(pool.clear().len(), 2);
        assert!(!pool.contains(a));
        assert!(!pool.contains(b));
        assert_eq!(pool.len(), 0);
        assert!(pool.kill_positions().is_empty());
        assert_eq!(pool.insert(entry()).index(), 0);
    }
}
