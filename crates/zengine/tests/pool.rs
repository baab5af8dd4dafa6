//! Slot ledger and handle validity across spawn/destroy/cleanup sequences

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use zengine::prelude::*;

fn check_ledger(world: &World) {
    let live = world.entities();
    let free = world.free_slots();
    let kills = world.pending_kills();

    let mut seen = std::collections::HashSet::new();
    for id in &live {
        assert!(seen.insert(id.index()), "two live entities share slot {}", id.index());
        assert!(!free.contains(&id.index()), "slot {} is both live and free", id.index());
    }
    for index in kills {
        assert!(seen.contains(index), "pending kill {index} is not occupied");
    }
    assert_eq!(live.len() + free.len(), world.pool_len());
}

#[test]
fn test_random_sequences_keep_slots_exclusive() {
    for seed in 0..8 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut world = World::new();
        let mut handles: Vec<EntityRef<Node>> = Vec::new();

        for _ in 0..400 {
            match rng.gen_range(0..10) {
                0..=4 => handles.push(world.spawn::<Node>()),
                5..=7 if !handles.is_empty() => {
                    let pick = handles[rng.gen_range(0..handles.len())];
                    world.destroy(pick);
                }
                8 if handles.len() >= 2 => {
                    let child = handles[rng.gen_range(0..handles.len())];
                    let parent = handles[rng.gen_range(0..handles.len())];
                    world.set_parent(child, parent);
                }
                _ => world.cleanup(),
            }
            check_ledger(&world);
        }

        world.cleanup();
        check_ledger(&world);
        assert!(world.pending_kills().is_empty());
        for handle in &handles {
            assert_eq!(handle.is_valid(&world), world.contains(handle.id().unwrap()));
        }
    }
}

#[test]
fn test_freed_slot_reused_lowest_first() {
    let mut world = World::new();
    let nodes: Vec<_> = (0..5).map(|_| world.spawn::<Node>()).collect();

    world.destroy(nodes[4]);
    world.destroy(nodes[1]);
    world.destroy(nodes[3]);
    world.cleanup();
    assert_eq!(world.free_slots(), vec![1, 3, 4]);

    let reused = world.spawn::<Node>();
    assert_eq!(reused.id().unwrap().index(), 1);
    assert_eq!(world.free_slots(), vec![3, 4]);
    assert_eq!(world.pool_len(), 5);
}

#[test]
fn test_expired_handle_never_aliases_new_occupant() {
    let mut world = World::new();
    let old = world.spawn::<Node>();
    world.destroy(old);
    world.cleanup();

    let new = world.spawn::<Node>();
    assert_eq!(old.id().unwrap().index(), new.id().unwrap().index());
    assert_ne!(old, new);

    assert!(old.is_expired(&world));
    assert!(old.get(&world).is_none());
    assert!(new.get(&world).is_some());

    // Operations through the stale handle must not touch the new occupant
    world.destroy(old);
    world.set_name(old, "ghost");
    assert!(!world.is_marked_for_delete(new));
    assert_eq!(world.name(new), Some("entity"));
}

#[test]
fn test_empty_handle_is_not_expired() {
    let world = World::new();
    let handle = EntityRef::<Node>::default();
    assert!(handle.is_empty());
    assert!(!handle.is_valid(&world));
    assert!(!handle.is_expired(&world));
    assert!(handle.get(&world).is_none());
}

#[test]
fn test_marked_entity_stays_valid_until_cleanup() {
    let mut world = World::new();
    let node = world.spawn::<Node>();
    world.destroy(node);

    assert!(node.is_valid(&world));
    assert!(world.is_marked_for_delete(node));
    assert_eq!(world.entity_count(), 1);

    world.cleanup();
    assert!(node.is_expired(&world));
    assert_eq!(world.entity_count(), 0);
}

#[test]
fn test_cast_keeps_identity() {
    #[derive(Default)]
    struct Ship;
    impl Entity for Ship {}

    let mut world = World::new();
    let ship = world.spawn::<Ship>();
    let as_node: EntityRef<Node> = ship.cast();

    assert_eq!(as_node, ship);
    assert!(as_node.is_valid(&world));
    assert!(as_node.get(&world).is_none());
    assert!(as_node.cast::<Ship>().get(&world).is_some());
}
