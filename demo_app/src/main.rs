//! Orbit demo: a drifting planet with orbiting moons, short-lived debris and
//! a pause toggle, run headless for a fixed number of frames.

use rand::Rng;
use thiserror::Error;
use zengine::prelude::*;

const FRAMES: u64 = 600;
const MOON_COUNT: usize = 3;
const PLANET_DRIFT: f32 = 0.5;
const DEBRIS_EVERY: u64 = 45;
const DEBRIS_LIFETIME: f64 = 1.5;

/// Demo-level errors
#[derive(Error, Debug)]
enum DemoError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Config(#[from] zengine::config::ConfigError),
}

/// Sent to the planet whenever debris is spawned next to it
struct DebrisSpawned {
    count: u64,
}

impl Event for DebrisSpawned {}

/// Moves the owner in a circle around its parent's position
struct Orbit {
    radius: f32,
    speed: f32,
    angle: f32,
}

impl Component for Orbit {
    fn fixed_update(&mut self, world: &mut World, this: ComponentId) {
        let Some(owner) = world.owner(this) else {
            return;
        };
        let Some(center) = world.parent(owner).and_then(|parent| world.position(parent)) else {
            return;
        };

        #[allow(clippy::cast_possible_truncation)]
        let step = world.time().fixed_delta() as f32;
        self.angle += self.speed * step;
        let target = center + Vec2::new(self.angle.cos(), self.angle.sin()) * self.radius;
        world.set_position(owner, target);
    }
}

/// Counts debris events reaching the planet
#[derive(Default)]
struct DebrisCounter {
    seen: u64,
}

impl Component for DebrisCounter {
    fn receive_event(&mut self, _world: &mut World, _this: ComponentId, event: &dyn Event) {
        if let Some(spawned) = event.downcast_ref::<DebrisSpawned>() {
            self.seen = spawned.count;
        }
    }

    fn on_destroy(&mut self, _world: &mut World, _this: ComponentId) {
        log::info!("Planet saw {} debris spawns", self.seen);
    }
}

/// The root body; drifts to the right and carries its moons along
#[derive(Default)]
struct Planet;

impl Entity for Planet {
    fn update(&mut self, world: &mut World, this: EntityId) {
        let delta = Vec2::new(PLANET_DRIFT * world.time().delta_f32(), 0.0);
        world.move_by(this, delta);
    }
}

/// Watches input and spawns debris on a timer
struct Director {
    planet: EntityRef<Planet>,
    spawned: u64,
}

impl Entity for Director {
    fn pre_start(&mut self, _world: &mut World, this: EntityId) {
        log::info!("Director {this} ready");
    }

    fn update(&mut self, world: &mut World, _this: EntityId) {
        if world.input().is_key_pressed("pause") {
            let paused = !world.is_paused();
            world.set_paused(paused);
        }
        if world.is_paused() || world.time().frame_count() % DEBRIS_EVERY != 0 {
            return;
        }
        let Some(origin) = world.position(self.planet) else {
            return;
        };

        let mut rng = rand::thread_rng();
        let offset = Vec2::new(rng.gen_range(-2.0..2.0), rng.gen_range(-2.0..2.0));
        let debris = world.spawn::<Node>();
        world.set_name(debris, format!("debris-{}", self.spawned));
        world.set_position(debris, origin + offset);
        world.add_component(debris, Lifetime::new(DEBRIS_LIFETIME));

        self.spawned += 1;
        world.broadcast(self.planet, DebrisSpawned { count: self.spawned });
    }

    fn on_destroy(&mut self, world: &mut World, _this: EntityId) {
        log::info!("Director spawned {} debris over {} frames", self.spawned, world.time().frame_count());
    }
}

struct OrbitDemo;

impl Application for OrbitDemo {
    fn initialize(&mut self, world: &mut World) -> Result<(), AppError> {
        world.input_mut().bind("pause", &[KeyCode::P, KeyCode::Escape]);

        let planet = world.spawn::<Planet>();
        world.set_name(planet, "planet");
        world.add_component(planet, DebrisCounter::default());

        for i in 0..MOON_COUNT {
            #[allow(clippy::cast_precision_loss)]
            let radius = 2.0 + i as f32 * 1.5;
            let moon = world.spawn::<Node>();
            world.set_name(moon, format!("moon-{i}"));
            world.set_parent(moon, planet);
            world.set_position(moon, Vec2::new(radius, 0.0));
            world.add_component(moon, Orbit { radius, speed: 1.0 / radius, angle: 0.0 });
        }

        let camera = world.spawn::<Node>();
        world.set_name(camera, "camera");
        world.set_parent(camera, planet);
        world.set_pause_enabled(camera, true);
        world.add_component(camera, Camera { size: 8.0, ..Camera::default() });

        let director = world.spawn_with(Director { planet, spawned: 0 });
        world.set_pause_enabled(director, true);
        world.set_name(director, "director");

        log::info!("Scene ready with {} entities", world.entity_count());
        Ok(())
    }

    fn cleanup(&mut self, world: &mut World) {
        if let Some(planet) = world.find_by_name("planet") {
            log::info!("Planet finished at {:?}", world.position(planet));
        }
        if let Some(pipeline) = world.render_pipeline::<HeadlessRenderPipeline>() {
            log::info!("Rendered {} frames", pipeline.frames());
        }
    }
}

fn main() -> Result<(), DemoError> {
    let config = EngineConfig::load_or_default("orbit_demo.toml")?;
    zengine::foundation::logging::init_with_filter(&config.log_filter);

    // Pause for a second of frames, then resume
    let window = HeadlessWindow::with_frame_limit(FRAMES)
        .press_at(200, KeyCode::P)
        .release_at(201, KeyCode::P)
        .press_at(320, KeyCode::P)
        .release_at(321, KeyCode::P);

    let mut engine = Engine::new(config, window)?;
    engine.run(&mut OrbitDemo)?;
    Ok(())
}
