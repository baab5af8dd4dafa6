//! Per-tick lifecycle scheduler
//!
//! One tick runs, strictly in order: fixed-step catch-up, awake/start staging,
//! update/late-update, render and cleanup. Each phase walks a snapshot of the
//! live entity ids taken when the phase starts, in slot order.

use super::{ComponentId, EntityId, Flags, World};
use crate::foundation::time::FixedTimestep;

/// Drives the lifecycle phases of a [`World`]
#[derive(Debug, Default)]
pub struct Scheduler {
    fixed: FixedTimestep,
    ids: Vec<EntityId>,
    fixed_steps: u64,
}

impl Scheduler {
    /// Create a scheduler with an empty lag accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one full tick for a frame that took `frame_dt` wall-clock seconds
    pub fn tick(&mut self, world: &mut World, frame_dt: f64) {
        let dt = world.time.advance(frame_dt);
        log::trace!("Tick {} (dt = {dt:.6}s)", world.time.frame_count());

        self.fixed_phase(world, dt);
        self.awake_phase(world);
        self.update_phase(world);
        self.render_phase(world);
        self.cleanup(world);
    }

    /// Fixed-step catch-up loop
    ///
    /// Adds `dt` (already scaled) to the lag, then runs fixed updates and one
    /// physics step per whole fixed step available. Skipped while paused.
    /// Returns the number of steps taken.
    pub fn fixed_phase(&mut self, world: &mut World, dt: f64) -> u32 {
        if world.paused {
            return 0;
        }

        self.fixed.accumulate(dt);
        let step = world.time.fixed_delta();
        let mut steps = 0;

        while self.fixed.consume_step(step) {
            world.pool.collect_ids(&mut self.ids);
            for &id in &self.ids {
                let Some(flags) = active_flags(world, id) else {
                    continue;
                };
                if flags.contains(Flags::UPDATE) {
                    world.run_entity_hook(id, |entity, world, id| entity.fixed_update(world, id));
                }
                if flags.contains(Flags::COMPONENT_UPDATE) {
                    for component in updatable_components(world, id, false) {
                        if !is_live(world, id) {
                            break;
                        }
                        world.run_component_hook(component, |component, world, cid| {
                            component.fixed_update(world, cid);
                        });
                    }
                }
            }

            #[allow(clippy::cast_possible_truncation)]
            world.physics_pipeline.step(step as f32);
            steps += 1;
        }

        self.fixed_steps += u64::from(steps);
        if steps > 0 {
            log::trace!("Ran {steps} fixed step(s), lag {:.6}s", self.fixed.lag());
        }
        steps
    }

    /// Run awake/start for every pending entity that is enabled
    ///
    /// Entities spawned by these hooks join the queue and are handled in the
    /// same pass. Disabled entities stay queued; expired or marked ones are
    /// dropped. Skipped while paused.
    pub fn awake_phase(&mut self, world: &mut World) {
        if world.paused {
            return;
        }

        let mut index = 0;
        while index < world.pending_awake.len() {
            let id = world.pending_awake[index];
            match world.pool.get(id) {
                Some(entry) if entry.marked_for_delete => {
                    world.pending_awake.remove(index);
                }
                Some(entry) if !entry.flags.contains(Flags::ENABLED) => index += 1,
                Some(_) => {
                    world.pending_awake.remove(index);
                    awake_entity(world, id);
                }
                None => {
                    world.pending_awake.remove(index);
                }
            }
        }
    }

    /// Run update then late-update on every active entity and its components
    ///
    /// While paused only pause-enabled entities and components take part.
    pub fn update_phase(&mut self, world: &mut World) {
        let paused = world.paused;
        world.pool.collect_ids(&mut self.ids);

        for &id in &self.ids {
            let Some(flags) = active_flags(world, id) else {
                continue;
            };
            if paused && !flags.contains(Flags::PAUSE) {
                continue;
            }
            if flags.contains(Flags::UPDATE) {
                world.run_entity_hook(id, |entity, world, id| entity.update(world, id));
            }
            if flags.contains(Flags::COMPONENT_UPDATE) {
                for component in updatable_components(world, id, paused) {
                    if !is_live(world, id) {
                        break;
                    }
                    world.run_component_hook(component, |component, world, cid| component.update(world, cid));
                }
            }

            // An update hook may have destroyed or disabled the entity
            let Some(flags) = active_flags(world, id) else {
                continue;
            };
            if flags.contains(Flags::UPDATE) {
                world.run_entity_hook(id, |entity, world, id| entity.late_update(world, id));
            }
            if flags.contains(Flags::COMPONENT_UPDATE) {
                for component in updatable_components(world, id, paused) {
                    if !is_live(world, id) {
                        break;
                    }
                    world.run_component_hook(component, |component, world, cid| {
                        component.late_update(world, cid);
                    });
                }
            }
        }
    }

    /// Hand the world to the render pipeline once
    pub fn render_phase(&mut self, world: &mut World) {
        let Some(mut pipeline) = world.render_pipeline.take() else {
            return;
        };
        pipeline.render(world);
        // A pipeline installed during rendering wins over the one that ran
        if world.render_pipeline.is_none() {
            world.render_pipeline = Some(pipeline);
        }
    }

    /// Release every slot marked for delete this tick
    pub fn cleanup(&mut self, world: &mut World) {
        world.cleanup();
    }

    /// Tear the world down at the end of the main loop
    ///
    /// Every entity not already marked for delete gets `on_destroy`, then its
    /// components' `on_destroy`, in slot order. All entities, components and
    /// cached assets are then released.
    pub fn shutdown(&mut self, world: &mut World) {
        world.pool.collect_ids(&mut self.ids);
        log::info!("Shutting down world with {} entities", self.ids.len());

        for &id in &self.ids {
            if !is_live(world, id) {
                continue;
            }
            world.run_entity_hook(id, |entity, world, id| entity.on_destroy(world, id));
            for component in world.components(id).to_vec() {
                world.run_component_hook(component, |component, world, cid| component.on_destroy(world, cid));
            }
        }

        world.release_all();
        world.assets.clear();
        self.fixed.reset();
        self.ids.clear();
    }

    /// Lag not yet consumed by a fixed step
    pub fn lag(&self) -> f64 {
        self.fixed.lag()
    }

    /// Total fixed steps run since the scheduler was created
    pub fn fixed_steps(&self) -> u64 {
        self.fixed_steps
    }
}

/// Flags of an entity that may take part in this phase at all
fn active_flags(world: &World, id: EntityId) -> Option<Flags> {
    let entry = world.pool.get(id)?;
    (!entry.marked_for_delete && entry.flags.contains(Flags::ENABLED)).then_some(entry.flags)
}

fn updatable_components(world: &World, owner: EntityId, paused: bool) -> Vec<ComponentId> {
    world
        .components(owner)
        .iter()
        .copied()
        .filter(|id| {
            world
                .component_entry(*id)
                .is_some_and(|entry| !entry.marked_for_delete && entry.flags.runs_updates(paused))
        })
        .collect()
}

fn is_live(world: &World, id: EntityId) -> bool {
    world.pool.get(id).is_some_and(|entry| !entry.marked_for_delete)
}

fn awake_entity(world: &mut World, id: EntityId) {
    world.run_entity_hook(id, |entity, world, id| entity.pre_awake(world, id));
    let components = world.components(id).to_vec();
    for &component in &components {
        if !is_live(world, id) {
            return;
        }
        world.run_component_hook(component, |component, world, cid| component.awake(world, cid));
    }

    if !is_live(world, id) {
        return;
    }
    world.run_entity_hook(id, |entity, world, id| entity.pre_start(world, id));
    for &component in &components {
        if !is_live(world, id) {
            return;
        }
        world.run_component_hook(component, |component, world, cid| component.start(world, cid));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{Component, Entity, Node};
    use crate::physics::NullPhysicsPipeline;
    use crate::render::HeadlessRenderPipeline;

    #[derive(Default)]
    struct Counter {
        fixed: u32,
        updates: u32,
        late: u32,
    }

    impl Entity for Counter {
        fn fixed_update(&mut self, _world: &mut World, _this: EntityId) {
            self.fixed += 1;
        }

        fn update(&mut self, _world: &mut World, _this: EntityId) {
            self.updates += 1;
        }

        fn late_update(&mut self, _world: &mut World, _this: EntityId) {
            self.late += 1;
        }
    }

    #[derive(Default)]
    struct Ticks(u32);

    impl Component for Ticks {
        fn update(&mut self, _world: &mut World, _this: ComponentId) {
            self.0 += 1;
        }
    }

    const STEP: f64 = 1.0 / 120.0;

    #[test]
    fn test_fixed_phase_catches_up() {
        let mut world = World::new();
        let mut scheduler = Scheduler::new();
        let counter = world.spawn::<Counter>();

        assert_eq!(scheduler.fixed_phase(&mut world, STEP * 3.0), 3);
        assert_eq!(counter.get(&world).unwrap().fixed, 3);

        let physics = world.physics_pipeline::<NullPhysicsPipeline>().unwrap();
        assert_eq!(physics.steps(), 3);
    }

    #[test]
    fn test_fixed_phase_accumulates_small_frames() {
        let mut world = World::new();
        let mut scheduler = Scheduler::new();

        let mut steps = 0;
        for _ in 0..3 {
            steps += scheduler.fixed_phase(&mut world, 1.0 / 360.0);
        }
        assert_eq!(steps, 1);
        assert_eq!(scheduler.fixed_steps(), 1);
    }

    #[test]
    fn test_non_finite_frame_runs_no_fixed_step() {
        let mut world = World::new();
        let mut scheduler = Scheduler::new();
        let counter = world.spawn::<Counter>();

        scheduler.tick(&mut world, f64::INFINITY);
        scheduler.tick(&mut world, f64::NAN);
        assert_eq!(scheduler.fixed_steps(), 0);
        assert_eq!(scheduler.fixed_phase(&mut world, f64::INFINITY), 0);

        scheduler.tick(&mut world, STEP);
        assert_eq!(scheduler.fixed_steps(), 1);
        assert_eq!(counter.get(&world).unwrap().updates, 3);
    }

    #[test]
    fn test_fixed_phase_skipped_while_paused() {
        let mut world = World::new();
        let mut scheduler = Scheduler::new();
        world.set_paused(true);

        assert_eq!(scheduler.fixed_phase(&mut world, 1.0), 0);
        assert_eq!(scheduler.lag(), 0.0);
    }

    #[test]
    fn test_update_runs_update_then_late_update() {
        let mut world = World::new();
        let mut scheduler = Scheduler::new();
        let counter = world.spawn::<Counter>();

        scheduler.update_phase(&mut world);
        let counter = counter.get(&world).unwrap();
        assert_eq!((counter.updates, counter.late), (1, 1));
    }

    #[test]
    fn test_disabled_component_is_skipped() {
        let mut world = World::new();
        let mut scheduler = Scheduler::new();
        let node = world.spawn::<Node>();
        let on = world.add_component(node, Ticks::default());
        let off = world.add_component(node, Ticks::default());
        world.set_component_enabled(off, false);

        scheduler.update_phase(&mut world);
        assert_eq!(on.get(&world).unwrap().0, 1);
        assert_eq!(off.get(&world).unwrap().0, 0);
    }

    #[test]
    fn test_component_update_flag_gates_all_components() {
        let mut world = World::new();
        let mut scheduler = Scheduler::new();
        let node = world.spawn::<Node>();
        let ticks = world.add_component(node, Ticks::default());
        world.set_component_update_enabled(node, false);

        scheduler.update_phase(&mut world);
        assert_eq!(ticks.get(&world).unwrap().0, 0);
    }

    #[test]
    fn test_paused_update_requires_pause_flag() {
        let mut world = World::new();
        let mut scheduler = Scheduler::new();
        let frozen = world.spawn::<Counter>();
        let live = world.spawn::<Counter>();
        world.set_pause_enabled(live, true);
        world.set_paused(true);

        scheduler.update_phase(&mut world);
        assert_eq!(frozen.get(&world).unwrap().updates, 0);
        assert_eq!(live.get(&world).unwrap().updates, 1);
    }

    #[test]
    fn test_render_phase_restores_pipeline() {
        let mut world = World::new();
        let mut scheduler = Scheduler::new();

        scheduler.render_phase(&mut world);
        scheduler.render_phase(&mut world);

        let pipeline = world.render_pipeline::<HeadlessRenderPipeline>().unwrap();
        assert_eq!(pipeline.frames(), 2);
    }

    #[test]
    fn test_tick_sweeps_destroyed_entities() {
        let mut world = World::new();
        let mut scheduler = Scheduler::new();
        let node = world.spawn::<Node>();

        world.destroy(node);
        assert!(node.is_valid(&world));

        scheduler.tick(&mut world, STEP);
        assert!(node.is_expired(&world));
        assert_eq!(world.free_slots(), vec![0]);
    }

    #[test]
    fn test_shutdown_releases_everything() {
        let mut world = World::new();
        let mut scheduler = Scheduler::new();
        let node = world.spawn::<Node>();
        world.add_component(node, Ticks::default());

        scheduler.shutdown(&mut world);
        assert_eq!(world.entity_count(), 0);
        assert!(node.is_expired(&world));
    }
}
