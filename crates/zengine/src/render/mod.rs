//! Render pipeline interface
//!
//! The scheduler hands the world to the render pipeline once per tick, after
//! every logic phase. Cameras register themselves with whatever pipeline is
//! installed when they are attached.

pub mod camera;

pub use camera::{Camera, CameraClearFlag, CameraProjection, CullingMask};

use crate::ecs::{AsAny, ComponentRef, World};

/// Renders the world once per tick
pub trait RenderPipeline: AsAny {
    /// Draw the current state of the world
    fn render(&mut self, world: &World);

    /// Cameras registered with this pipeline
    fn cameras(&self) -> &CameraSet;

    /// Mutable access to the registered cameras
    fn cameras_mut(&mut self) -> &mut CameraSet;

    /// Register a camera; already registered cameras are ignored
    fn add_camera(&mut self, camera: ComponentRef<Camera>) {
        self.cameras_mut().add(camera);
    }

    /// Unregister a camera
    fn remove_camera(&mut self, camera: ComponentRef<Camera>) {
        self.cameras_mut().remove(camera);
    }
}

/// Deduplicating list of camera handles, in registration order
#[derive(Debug, Default, Clone)]
pub struct CameraSet {
    cameras: Vec<ComponentRef<Camera>>,
}

impl CameraSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a camera unless it is already present
    pub fn add(&mut self, camera: ComponentRef<Camera>) {
        if camera.is_empty() || self.cameras.contains(&camera) {
            return;
        }
        self.cameras.push(camera);
    }

    /// Remove every entry for `camera`
    pub fn remove(&mut self, camera: ComponentRef<Camera>) {
        self.cameras.retain(|registered| *registered != camera);
    }

    /// True if `camera` is registered
    pub fn contains(&self, camera: ComponentRef<Camera>) -> bool {
        self.cameras.contains(&camera)
    }

    /// Number of registered cameras
    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    /// True if no camera is registered
    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }

    /// Registered cameras in registration order
    pub fn iter(&self) -> impl Iterator<Item = ComponentRef<Camera>> + '_ {
        self.cameras.iter().copied()
    }

    /// Cameras that should draw this frame, lowest priority first
    ///
    /// A camera takes part if it is still attached, enabled, and its owner is
    /// enabled and not marked for delete. Equal priorities keep registration
    /// order.
    pub fn active(&self, world: &World) -> Vec<ComponentRef<Camera>> {
        let mut active: Vec<(u8, ComponentRef<Camera>)> = self
            .iter()
            .filter(|camera| world.is_component_enabled(*camera))
            .filter(|camera| {
                camera.owner(world).is_some_and(|owner| {
                    world.is_enabled(owner) && !world.is_marked_for_delete(owner)
                })
            })
            .filter_map(|camera| camera.get(world).map(|settings| (settings.priority, camera)))
            .collect();
        active.sort_by_key(|(priority, _)| *priority);
        active.into_iter().map(|(_, camera)| camera).collect()
    }
}

/// Render pipeline with no output, recording what it would have drawn
#[derive(Debug, Default)]
pub struct HeadlessRenderPipeline {
    cameras: CameraSet,
    frames: u64,
    last_drawn: Vec<ComponentRef<Camera>>,
    last_visible_entities: usize,
}

impl HeadlessRenderPipeline {
    /// Create a pipeline with no cameras
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames rendered
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Cameras drawn in the last frame, in draw order
    pub fn last_drawn(&self) -> &[ComponentRef<Camera>] {
        &self.last_drawn
    }

    /// Enabled entities seen in the last frame
    pub fn last_visible_entities(&self) -> usize {
        self.last_visible_entities
    }
}

impl RenderPipeline for HeadlessRenderPipeline {
    fn render(&mut self, world: &World) {
        self.frames += 1;
        self.last_drawn = self.cameras.active(world);
        self.last_visible_entities = world
            .entities()
            .into_iter()
            .filter(|id| world.is_enabled(*id) && !world.is_marked_for_delete(*id))
            .count();
        log::trace!(
            "Frame {}: {} camera(s), {} entities",
            self.frames,
            self.last_drawn.len(),
            self.last_visible_entities
        );
    }

    fn cameras(&self) -> &CameraSet {
        &self.cameras
    }

    fn cameras_mut(&mut self) -> &mut CameraSet {
        &mut self.cameras
    }
}
