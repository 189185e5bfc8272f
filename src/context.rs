//! Engine context
//!
//! [`EngineContext`] owns everything a running engine needs: the GPU device, the
//! scene graph, the lights and the render pipeline. There is no global instance;
//! hosts construct one, drive [`EngineContext::frame`] and end with
//! [`EngineContext::shutdown`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{error, info};

use crate::config::EngineConfig;
use crate::errors::EngineError;
use crate::gfx::lighting::{LightHandle, LightManager};
use crate::gfx::rendering::{program_from_source, FrameStats, RenderPipeline};
use crate::gfx::scene::{CameraHandle, MeshHandle, SceneGraph, ShaderHandle};
use crate::gfx::transform::Transform;
use crate::gpu::{AttributeMask, GpuDevice};

/// Keep-running flag shared between the frame loop and whoever may stop it.
///
/// Stores use `Release` and loads use `Acquire`, so everything written before
/// [`RunFlag::request_stop`] is visible to the loop once it observes the stop.
#[derive(Debug, Clone)]
pub struct RunFlag(Arc<AtomicBool>);

impl RunFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn request_stop(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for RunFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Anything in the engine that has a pose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Camera(CameraHandle),
    Light(LightHandle),
    Mesh(MeshHandle),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Camera,
    Light,
    Mesh,
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Camera(_) => EntityKind::Camera,
            Entity::Light(_) => EntityKind::Light,
            Entity::Mesh(_) => EntityKind::Mesh,
        }
    }
}

impl From<CameraHandle> for Entity {
    fn from(handle: CameraHandle) -> Self {
        Entity::Camera(handle)
    }
}

impl From<LightHandle> for Entity {
    fn from(handle: LightHandle) -> Self {
        Entity::Light(handle)
    }
}

impl From<MeshHandle> for Entity {
    fn from(handle: MeshHandle) -> Self {
        Entity::Mesh(handle)
    }
}

pub struct EngineContext<D: GpuDevice> {
    config: EngineConfig,
    device: D,
    scene: SceneGraph,
    lights: LightManager,
    pipeline: RenderPipeline,
    run_flag: RunFlag,
    lit_shader: Option<ShaderHandle>,
    unlit_shader: Option<ShaderHandle>,
    last_stats: FrameStats,
}

impl<D: GpuDevice> EngineContext<D> {
    /// Creates the pipeline's core resources on `device`. Fails only when one of
    /// those cannot be created.
    pub fn new(mut device: D, config: EngineConfig) -> Result<Self, EngineError> {
        let pipeline = RenderPipeline::new(&mut device, &config)?;
        let lights = LightManager::new(config.scene_ambient);
        let (width, height) = device.surface_size();
        info!("engine ready, surface {width}x{height}");

        Ok(Self {
            config,
            device,
            scene: SceneGraph::new(),
            lights,
            pipeline,
            run_flag: RunFlag::new(),
            lit_shader: None,
            unlit_shader: None,
            last_stats: FrameStats::default(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene
    }

    pub fn lights(&self) -> &LightManager {
        &self.lights
    }

    pub fn lights_mut(&mut self) -> &mut LightManager {
        &mut self.lights
    }

    pub fn pipeline(&self) -> &RenderPipeline {
        &self.pipeline
    }

    /// A handle to the keep-running flag, for stopping the loop from elsewhere.
    pub fn run_flag(&self) -> RunFlag {
        self.run_flag.clone()
    }

    pub fn is_running(&self) -> bool {
        self.run_flag.is_running()
    }

    /// Statistics of the most recent rendered frame.
    pub fn last_stats(&self) -> FrameStats {
        self.last_stats
    }

    /// Renders and presents one frame. Returns `None` once a stop was requested.
    pub fn frame(&mut self) -> Option<FrameStats> {
        if !self.run_flag.is_running() {
            return None;
        }

        let stats = self
            .pipeline
            .render_frame(&mut self.device, &mut self.scene, &mut self.lights);
        if let Err(err) = self.device.present(self.config.sync_interval) {
            error!("present: {err}");
        }

        self.last_stats = stats;
        Some(stats)
    }

    pub fn transform(&self, entity: Entity) -> Option<&Transform> {
        match entity {
            Entity::Camera(handle) => self.scene.camera(handle).map(|c| &c.transform),
            Entity::Light(handle) => self.lights.light(handle).map(|l| &l.transform),
            Entity::Mesh(handle) => self.scene.mesh(handle).map(|m| &m.transform),
        }
    }

    pub fn transform_mut(&mut self, entity: Entity) -> Option<&mut Transform> {
        match entity {
            Entity::Camera(handle) => self.scene.camera_mut(handle).map(|c| &mut c.transform),
            Entity::Light(handle) => self.lights.light_mut(handle).map(|l| &mut l.transform),
            Entity::Mesh(handle) => self.scene.mesh_mut(handle).map(|m| &mut m.transform),
        }
    }

    /// Shader running the configured lit program, created on first use.
    pub fn lit_shader(&mut self) -> ShaderHandle {
        if let Some(handle) = self.lit_shader.filter(|h| self.scene.shader(*h).is_some()) {
            return handle;
        }
        let desc = program_from_source(
            "Lit",
            self.config.lit_shader_source.clone(),
            AttributeMask::LIT,
        );
        let handle = self.scene.create_shader(desc);
        self.lit_shader = Some(handle);
        handle
    }

    /// Shader running the configured unlit program, created on first use.
    pub fn unlit_shader(&mut self) -> ShaderHandle {
        if let Some(handle) = self.unlit_shader.filter(|h| self.scene.shader(*h).is_some()) {
            return handle;
        }
        let desc = program_from_source(
            "Unlit",
            self.config.unlit_shader_source.clone(),
            AttributeMask::UNLIT,
        );
        let handle = self.scene.create_shader(desc);
        self.unlit_shader = Some(handle);
        handle
    }

    /// Matches the bound camera's viewport and aspect ratio to a new surface size.
    /// The depth target follows the device surface on the next frame.
    pub fn resize_viewport(&mut self, width: u32, height: u32) {
        if let Some(camera) = self.scene.bound_camera() {
            if let Some(camera) = self.scene.camera_mut(camera) {
                camera.resize_projection(width, height);
            }
        }
    }

    /// Stops the loop, releases every GPU resource the engine created and hands
    /// the device back.
    pub fn shutdown(mut self) -> D {
        self.run_flag.request_stop();

        self.scene.clear();
        for resource in self
            .scene
            .drain_released()
            .into_iter()
            .chain(self.lights.take_gpu_resources())
        {
            resource.release(&mut self.device);
        }
        self.pipeline.release(&mut self.device);

        info!("engine shut down");
        self.device
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::camera::Camera;
    use crate::gfx::lighting::Light;
    use crate::gpu::{RecordingDevice, Viewport};
    use cgmath::Vector3;

    #[test]
    fn test_run_flag_stops_frames() {
        let mut context =
            EngineContext::new(RecordingDevice::default(), EngineConfig::default()).unwrap();
        let flag = context.run_flag();

        assert!(context.frame().is_some());
        flag.request_stop();
        assert!(context.frame().is_none());
        assert!(!context.is_running());
    }

    #[test]
    fn test_transform_mut_dispatches_on_kind() {
        let mut context =
            EngineContext::new(RecordingDevice::default(), EngineConfig::default()).unwrap();
        let camera = context
            .scene_mut()
            .create_camera(Camera::new(Viewport::new(640.0, 480.0)));
        let light = context.lights_mut().create_light(Light::directional([1.0; 3]));
        let mesh = context.scene_mut().create_mesh("box");

        for (index, entity) in [Entity::from(camera), light.into(), mesh.into()]
            .into_iter()
            .enumerate()
        {
            let position = Vector3::new(index as f32, 0.0, 0.0);
            context.transform_mut(entity).unwrap().set_position(position);
            assert_eq!(context.transform(entity).unwrap().position(), position);
        }

        assert_eq!(Entity::from(light).kind(), EntityKind::Light);
    }

    #[test]
    fn test_builtin_shaders_are_created_once() {
        let mut context =
            EngineContext::new(RecordingDevice::default(), EngineConfig::default()).unwrap();
        let lit = context.lit_shader();
        assert_eq!(context.lit_shader(), lit);
        assert_ne!(context.unlit_shader(), lit);
        assert_eq!(context.scene().shader_count(), 2);

        context.scene_mut().delete_shader(lit).unwrap();
        assert_ne!(context.lit_shader(), lit);
    }

    #[test]
    fn test_shutdown_releases_everything() {
        let mut context =
            EngineContext::new(RecordingDevice::default(), EngineConfig::default()).unwrap();
        let camera = context
            .scene_mut()
            .create_camera(Camera::new(Viewport::new(640.0, 480.0)));
        context.scene_mut().bind_camera(camera).unwrap();
        let shader = context.lit_shader();
        let material = context.scene_mut().create_material("m");
        let mesh = context.scene_mut().create_mesh("cube");
        let surface = context
            .scene_mut()
            .create_surface(crate::gfx::geometry::generate_cube());
        let scene = context.scene_mut();
        scene.assign_shader_to_material(shader, material).unwrap();
        scene.add_mesh_to_material(material, mesh).unwrap();
        scene.add_surface_to_mesh(mesh, surface).unwrap();
        context.lights_mut().create_light(Light::directional([1.0; 3]));

        context.frame();
        assert!(context.device().live_buffers() > 0);

        let device = context.shutdown();
        assert_eq!(device.live_buffers(), 0);
        assert_eq!(device.live_textures(), 0);
    }
}
