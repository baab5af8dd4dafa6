//! Camera component
//!
//! Describes how a render pipeline should draw the world from the owning
//! entity's point of view. The camera registers itself with the world's
//! render pipeline when attached and unregisters when destroyed.

use crate::ecs::{Component, ComponentId, ComponentRef, World};
use crate::foundation::math::Vec4;

/// Projection used by a camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraProjection {
    /// Whatever the pipeline prefers
    #[default]
    SystemDefault,
    /// Perspective projection
    Perspective,
    /// Orthographic projection
    Orthographic,
}

/// What the camera clears its viewport to before drawing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraClearFlag {
    /// Leave the previous contents
    None,
    /// Fill with the background colour
    #[default]
    SolidColor,
}

/// How `sorting_layers` is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CullingMask {
    /// Draw only the listed layers
    #[default]
    Include,
    /// Draw everything but the listed layers
    Exclude,
}

/// Camera settings
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Projection
    pub projection: CameraProjection,
    /// Clear behaviour
    pub clear_flag: CameraClearFlag,
    /// Layer filter mode
    pub culling_mask: CullingMask,
    /// Clear colour (RGB)
    pub background: [u8; 3],
    /// Normalized viewport rectangle (x, y, width, height)
    pub view_rect: Vec4,
    /// Depth testing on/off
    pub depth_test: bool,
    /// Draw order among cameras; lower draws first
    pub priority: u8,
    /// Aspect ratio (width / height)
    pub ratio: f32,
    /// Half-height of the view in world units
    pub size: f32,
    /// Ambient light colour and intensity
    pub ambient_light: Vec4,
    /// Layers filtered by `culling_mask`
    pub sorting_layers: Vec<String>,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            projection: CameraProjection::default(),
            clear_flag: CameraClearFlag::default(),
            culling_mask: CullingMask::default(),
            background: [255, 255, 255],
            view_rect: Vec4::new(0.0, 0.0, 1.0, 1.0),
            depth_test: true,
            priority: 0,
            ratio: 16.0 / 10.0,
            size: 5.0,
            ambient_light: Vec4::zeros(),
            sorting_layers: Vec::new(),
        }
    }
}

impl Camera {
    /// Camera with the given draw priority
    pub fn with_priority(priority: u8) -> Self {
        Self { priority, ..Self::default() }
    }

    /// True if a sprite on `layer` should be drawn by this camera
    pub fn draws_layer(&self, layer: &str) -> bool {
        let listed = self.sorting_layers.iter().any(|l| l == layer);
        match self.culling_mask {
            CullingMask::Include => listed,
            CullingMask::Exclude => !listed,
        }
    }

    /// Visible world extent (width, height) for an orthographic view
    pub fn extent(&self) -> (f32, f32) {
        let height = self.size * 2.0;
        (height * self.ratio, height)
    }
}

impl Component for Camera {
    fn unique() -> bool {
        true
    }

    fn on_attach(&mut self, world: &mut World, this: ComponentId) {
        match world.render_pipeline_mut() {
            Some(pipeline) => pipeline.add_camera(ComponentRef::from(this)),
            None => log::warn!("Camera attached while no render pipeline is installed"),
        }
    }

    fn on_destroy(&mut self, world: &mut World, this: ComponentId) {
        if let Some(pipeline) = world.render_pipeline_mut() {
            pipeline.remove_camera(ComponentRef::from(this));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{Node, Scheduler};
    use crate::render::{HeadlessRenderPipeline, RenderPipeline};
    use approx::assert_relative_eq;

    fn registered(world: &mut World) -> usize {
        world.render_pipeline_mut().map_or(0, |pipeline| pipeline.cameras().len())
    }

    #[test]
    fn test_defaults() {
        let camera = Camera::default();
        assert_eq!(camera.background, [255, 255, 255]);
        assert_relative_eq!(camera.ratio, 1.6);
        assert_relative_eq!(camera.size, 5.0);
        let (width, height) = camera.extent();
        assert_relative_eq!(width, 16.0);
        assert_relative_eq!(height, 10.0);
    }

    #[test]
    fn test_layer_filter() {
        let mut camera = Camera { sorting_layers: vec!["ui".into()], ..Camera::default() };
        assert!(camera.draws_layer("ui"));
        assert!(!camera.draws_layer("world"));
        camera.culling_mask = CullingMask::Exclude;
        assert!(!camera.draws_layer("ui"));
    }

    #[test]
    fn test_camera_registers_with_pipeline() {
        let mut world = World::new();
        let node = world.spawn::<Node>();
        let camera = world.add_component(node, Camera::default());
        assert_eq!(registered(&mut world), 1);

        let again = world.add_component(node, Camera::default());
        assert_eq!(camera, again);
        assert_eq!(registered(&mut world), 1);

        world.destroy(node);
        assert_eq!(registered(&mut world), 0);
    }

    #[test]
    fn test_remove_component_unregisters() {
        let mut world = World::new();
        let node = world.spawn::<Node>();
        world.add_component(node, Camera::default());

        world.remove_component::<Camera>(node);
        assert_eq!(registered(&mut world), 0);
        assert!(world.get_component::<Camera>(node).is_empty());
    }

    #[test]
    fn test_cameras_follow_pipeline_replacement() {
        let mut world = World::new();
        let node = world.spawn::<Node>();
        let camera = world.add_component(node, Camera::default());

        world.set_render_pipeline(HeadlessRenderPipeline::new());

        let pipeline = world.render_pipeline::<HeadlessRenderPipeline>().unwrap();
        assert!(pipeline.cameras().contains(camera));
    }

    #[test]
    fn test_headless_draws_by_priority() {
        let mut world = World::new();
        let mut scheduler = Scheduler::new();
        let front = world.spawn::<Node>();
        let back = world.spawn::<Node>();
        let hidden = world.spawn::<Node>();
        let front_cam = world.add_component(front, Camera::with_priority(5));
        let back_cam = world.add_component(back, Camera::with_priority(1));
        world.add_component(hidden, Camera::default());
        world.set_enabled(hidden, false);

        scheduler.render_phase(&mut world);

        let pipeline = world.render_pipeline::<HeadlessRenderPipeline>().unwrap();
        assert_eq!(pipeline.last_drawn(), &[back_cam, front_cam]);
        assert_eq!(pipeline.last_visible_entities(), 2);
    }
}
