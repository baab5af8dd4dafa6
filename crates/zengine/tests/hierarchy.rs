//! Parent/child links, transform propagation and event broadcast

use std::cell::RefCell;
use std::rc::Rc;

use approx::assert_relative_eq;
use zengine::prelude::*;

#[test]
fn test_move_parent_then_destroy_scenario() {
    let mut world = World::new();
    let mut scheduler = Scheduler::new();
    let a = world.spawn::<Node>();
    let b = world.spawn::<Node>();
    world.set_parent(b, a);

    world.move_by(a, Vec2::new(5.0, 0.0));
    assert_relative_eq!(world.position(b).unwrap(), Vec2::new(5.0, 0.0));

    world.destroy(a);
    scheduler.cleanup(&mut world);
    assert!(b.is_expired(&world));
    assert!(b.get(&world).is_none());
}

#[test]
fn test_reparent_to_current_parent_is_idempotent() {
    let mut world = World::new();
    let parent = world.spawn::<Node>();
    let child = world.spawn::<Node>();
    world.set_parent(child, parent);
    let before = world.children(parent).to_vec();

    for _ in 0..3 {
        world.set_parent(child, parent);
    }
    assert_eq!(world.children(parent), before.as_slice());
}

#[test]
fn test_expired_parent_detaches() {
    let mut world = World::new();
    let old_parent = world.spawn::<Node>();
    let stale = world.spawn::<Node>();
    let child = world.spawn::<Node>();
    world.set_parent(child, old_parent);
    world.destroy(stale);
    world.cleanup();

    world.set_parent(child, stale);
    assert!(world.parent(child).is_none());
    assert!(world.children(old_parent).is_empty());
}

#[test]
fn test_set_position_moves_whole_subtree() {
    let mut world = World::new();
    let root = world.spawn::<Node>();
    let left = world.spawn::<Node>();
    let right = world.spawn::<Node>();
    let leaf = world.spawn::<Node>();
    world.set_parent(left, root);
    world.set_parent(right, root);
    world.set_parent(leaf, left);
    world.set_position(leaf, Vec2::new(0.0, 2.0));

    world.set_position(root, Vec2::new(-1.0, 3.0));

    assert_relative_eq!(world.position(left).unwrap(), Vec2::new(-1.0, 3.0));
    assert_relative_eq!(world.position(right).unwrap(), Vec2::new(-1.0, 3.0));
    assert_relative_eq!(world.position(leaf).unwrap(), Vec2::new(-1.0, 5.0));
}

#[test]
fn test_transform_matrix_follows_position() {
    let mut world = World::new();
    let node = world.spawn::<Node>();
    world.set_position(node, Vec2::new(2.0, 1.0));
    world.set_rotation(node, std::f32::consts::FRAC_PI_2);

    let transform = world.transform(node).unwrap();
    let moved = transform.transform_point(zengine::foundation::math::Point2::new(1.0, 0.0));
    assert_relative_eq!(moved.x, 2.0, epsilon = 1e-6);
    assert_relative_eq!(moved.y, 2.0, epsilon = 1e-6);
}

struct Hit(u32);

impl Event for Hit {}

struct Shield {
    order: Rc<RefCell<Vec<String>>>,
    name: &'static str,
}

impl Component for Shield {
    fn receive_event(&mut self, _world: &mut World, _this: ComponentId, event: &dyn Event) {
        if let Some(hit) = event.downcast_ref::<Hit>() {
            self.order.borrow_mut().push(format!("{}:{}", self.name, hit.0));
        }
    }
}

struct Ship {
    order: Rc<RefCell<Vec<String>>>,
}

impl Entity for Ship {
    fn receive_event(&mut self, _world: &mut World, _this: EntityId, event: &dyn Event) {
        if let Some(hit) = event.downcast_ref::<Hit>() {
            self.order.borrow_mut().push(format!("ship:{}", hit.0));
        }
    }
}

#[test]
fn test_broadcast_order_entity_then_components() {
    let order = Rc::new(RefCell::new(Vec::new()));
    let mut world = World::new();
    let ship = world.spawn_with(Ship { order: Rc::clone(&order) });
    world.add_component(ship, Shield { order: Rc::clone(&order), name: "c1" });
    let c2 = world.add_component(ship, Shield { order: Rc::clone(&order), name: "c2" });
    world.set_component_enabled(c2, false);

    world.broadcast(ship, Hit(3));

    assert_eq!(*order.borrow(), vec!["ship:3", "c1:3", "c2:3"]);
}

#[test]
fn test_broadcast_to_expired_entity_is_ignored() {
    let order = Rc::new(RefCell::new(Vec::new()));
    let mut world = World::new();
    let ship = world.spawn_with(Ship { order: Rc::clone(&order) });
    world.destroy(ship);
    world.cleanup();

    world.broadcast(ship, Hit(1));
    assert!(order.borrow().is_empty());
}
