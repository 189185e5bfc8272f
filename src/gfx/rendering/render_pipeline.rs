//! Two-pass frame orchestration
//!
//! Each frame renders the shadow map from the shadow-casting light, then the color
//! pass from the bound camera, then repacks the light array for the next frame.
//! Both passes walk the scene graph in the same order:
//!
//! ```text
//! for shader   -> bind program
//!   for material -> (color) bind texture, push constants
//!     for mesh     -> write transform uniform
//!       for surface  -> bind streams, draw
//! ```
//!
//! Nothing here aborts a frame. Failed uploads and missing bindings are logged,
//! counted in [`FrameStats`], and the affected draws are skipped.

use bytemuck::Zeroable;
use cgmath::{Matrix4, Vector3};
use log::{debug, error, warn};

use crate::config::EngineConfig;
use crate::errors::GpuError;
use crate::gfx::lighting::LightManager;
use crate::gfx::resources::{DecodedImage, ShadowUniform, TransformUniform};
use crate::gfx::scene::{
    DrawMode, MaterialHandle, MeshHandle, ProgramState, SceneGraph, Surface, SurfaceBuffers,
};
use crate::gpu::{
    AttributeMask, BufferHandle, BufferKind, ColorTarget, GpuDevice, PassDesc, ProgramHandle,
    ProgramStages, RasterizerState, SamplerDesc, SamplerHandle, TextureHandle, TextureSlot,
    Topology, UniformSlot, VertexAttribute, Viewport,
};

/// Label of the depth-only pass rendered from the shadow caster.
pub const SHADOW_PASS: &str = "shadow";
/// Label of the camera pass.
pub const COLOR_PASS: &str = "color";

/// What one frame did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    /// False when no light was assigned as shadow caster.
    pub shadow_pass_ran: bool,
    pub shadow_draws: u32,
    pub color_draws: u32,
    /// Surfaces not drawn because they had no GPU buffers or no usable program.
    pub skipped_surfaces: u32,
    /// Uploads or bindings that failed this frame.
    pub failed_binds: u32,
    /// GPU resources of destroyed entities released at frame start.
    pub released: u32,
}

#[derive(Debug, Clone, Copy)]
struct ShadowSettings {
    map_size: u32,
    depth_bias: i32,
    slope_scale: f32,
    compare_bias: f32,
    near: f32,
    far: f32,
    debug: bool,
}

/// Renders [`SceneGraph`] contents through a [`GpuDevice`].
#[derive(Debug)]
pub struct RenderPipeline {
    clear_color: [f64; 4],
    shadow: ShadowSettings,
    shadow_map: TextureHandle,
    shadow_sampler: SamplerHandle,
    shadow_buffer: BufferHandle,
    depth_target: TextureHandle,
    depth_size: (u32, u32),
    fallback_texture: TextureHandle,
    fallback_sampler: SamplerHandle,
    camera_warned: bool,
    device_lost_logged: bool,
}

impl RenderPipeline {
    /// Creates the resources every frame needs: shadow map, main depth target,
    /// shadow uniform and the 1x1 white texture used by untextured materials.
    pub fn new<D: GpuDevice + ?Sized>(
        device: &mut D,
        config: &EngineConfig,
    ) -> Result<Self, GpuError> {
        let map_size = config.shadow_map_size.max(1);
        let shadow_map = device.create_depth_target("Shadow Map", map_size, map_size)?;
        let shadow_sampler = device.create_sampler("Shadow Sampler", SamplerDesc::ShadowComparison)?;
        let shadow_buffer = device.create_buffer(
            "Shadow Uniform",
            BufferKind::Uniform,
            bytemuck::bytes_of(&ShadowUniform::disabled()),
        )?;

        let depth_size = device.surface_size();
        let depth_target = device.create_depth_target("Depth Texture", depth_size.0, depth_size.1)?;

        let white = DecodedImage::solid([255; 4]);
        let fallback_texture =
            device.create_texture_rgba8("White Texture", white.width, white.height, &white.pixels)?;
        let fallback_sampler = device.create_sampler("Default Sampler", SamplerDesc::LinearWrap)?;

        debug!("render pipeline ready, shadow map {map_size}x{map_size}");

        Ok(Self {
            clear_color: config.clear_color,
            shadow: ShadowSettings {
                map_size,
                depth_bias: config.shadow_depth_bias,
                slope_scale: config.shadow_slope_scale,
                compare_bias: config.shadow_compare_bias,
                near: config.shadow_near,
                far: config.shadow_far,
                debug: config.shadow_debug,
            },
            shadow_map,
            shadow_sampler,
            shadow_buffer,
            depth_target,
            depth_size,
            fallback_texture,
            fallback_sampler,
            camera_warned: false,
            device_lost_logged: false,
        })
    }

    pub fn shadow_map(&self) -> TextureHandle {
        self.shadow_map
    }

    pub fn shadow_buffer(&self) -> BufferHandle {
        self.shadow_buffer
    }

    pub fn depth_target(&self) -> TextureHandle {
        self.depth_target
    }

    /// Renders one frame. Never fails; see [`FrameStats`] for what was skipped.
    pub fn render_frame<D: GpuDevice + ?Sized>(
        &mut self,
        device: &mut D,
        scene: &mut SceneGraph,
        lights: &mut LightManager,
    ) -> FrameStats {
        let mut stats = FrameStats::default();

        for resource in scene.drain_released() {
            resource.release(device);
            stats.released += 1;
        }

        let Some(camera) = scene.bound_camera().and_then(|c| scene.camera(c)).cloned() else {
            if !self.camera_warned {
                warn!("no camera bound, skipping frame");
                self.camera_warned = true;
            }
            return stats;
        };
        self.camera_warned = false;

        self.fit_depth_target(device, &mut stats);
        self.prepare(device, scene, lights, &mut stats);

        if let Err(err) = device.begin_frame() {
            error!("begin_frame: {err}");
            return stats;
        }

        let caster = lights
            .shadow_caster()
            .and_then(|handle| lights.light(handle))
            .map(|light| {
                (
                    light.view_projection(self.shadow.near, self.shadow.far),
                    light.transform.position(),
                )
            });

        match caster {
            Some((light_view_proj, light_position)) => {
                let uniform = ShadowUniform::enabled(
                    light_view_proj,
                    self.shadow.compare_bias,
                    self.shadow.map_size,
                    self.shadow.debug,
                );
                self.write_shadow_uniform(device, &uniform, &mut stats);
                self.shadow_pass(device, scene, light_view_proj, light_position, &mut stats);
            }
            None => {
                self.write_shadow_uniform(device, &ShadowUniform::disabled(), &mut stats);
            }
        }

        let view_proj = camera.view_projection_matrix();
        self.color_pass(
            device,
            scene,
            lights.buffer(),
            camera.viewport,
            view_proj,
            camera.transform.position(),
            &mut stats,
        );

        lights.repack();
        if let Err(err) = lights.upload(device) {
            error!("light array upload: {err}");
            stats.failed_binds += 1;
        }

        stats
    }

    fn write_shadow_uniform<D: GpuDevice + ?Sized>(
        &self,
        device: &mut D,
        uniform: &ShadowUniform,
        stats: &mut FrameStats,
    ) {
        if let Err(err) = device.write_buffer(self.shadow_buffer, bytemuck::bytes_of(uniform)) {
            error!("shadow uniform upload: {err}");
            stats.failed_binds += 1;
        }
    }

    /// Depth-only render of shadow-casting materials from the light.
    fn shadow_pass<D: GpuDevice + ?Sized>(
        &mut self,
        device: &mut D,
        scene: &mut SceneGraph,
        light_view_proj: Matrix4<f32>,
        light_position: Vector3<f32>,
        stats: &mut FrameStats,
    ) {
        self.poll_device_lost(device);
        device.begin_pass(&PassDesc {
            label: SHADOW_PASS,
            color: None,
            depth: self.shadow_map,
            depth_clear: Some(1.0),
        });
        let size = self.shadow.map_size as f32;
        device.set_viewport(Viewport::new(size, size));
        device.set_rasterizer(RasterizerState::shadow(
            self.shadow.depth_bias,
            self.shadow.slope_scale,
        ));
        device.bind_uniform(UniformSlot::Shadow, self.shadow_buffer);

        for (program, attributes, materials) in draw_buckets(scene) {
            let Some(program) = program else {
                continue;
            };
            device.bind_program(program, ProgramStages::DepthOnly);

            for material in materials {
                let Some(material) = scene.material(material) else {
                    continue;
                };
                if !material.casts_shadows {
                    continue;
                }
                for mesh in material.meshes().to_vec() {
                    stats.shadow_draws += draw_mesh(
                        device,
                        scene,
                        mesh,
                        light_view_proj,
                        light_position,
                        attributes,
                        stats,
                    );
                }
            }
        }

        device.end_pass();
        stats.shadow_pass_ran = true;
    }

    /// Lit render of every material from the camera.
    #[allow(clippy::too_many_arguments)]
    fn color_pass<D: GpuDevice + ?Sized>(
        &mut self,
        device: &mut D,
        scene: &mut SceneGraph,
        light_buffer: Option<BufferHandle>,
        viewport: Viewport,
        view_proj: Matrix4<f32>,
        eye: Vector3<f32>,
        stats: &mut FrameStats,
    ) {
        self.poll_device_lost(device);
        device.begin_pass(&PassDesc {
            label: COLOR_PASS,
            color: Some(ColorTarget::Backbuffer {
                clear: self.clear_color,
            }),
            depth: self.depth_target,
            depth_clear: Some(1.0),
        });
        device.set_viewport(viewport);
        device.set_rasterizer(RasterizerState::DEFAULT);
        device.bind_texture(TextureSlot::ShadowMap, self.shadow_map, self.shadow_sampler);
        device.bind_uniform(UniformSlot::Shadow, self.shadow_buffer);
        match light_buffer {
            Some(buffer) => device.bind_uniform(UniformSlot::Lights, buffer),
            None => stats.failed_binds += 1,
        }

        for (program, attributes, materials) in draw_buckets(scene) {
            let Some(program) = program else {
                stats.skipped_surfaces += count_surfaces(scene, &materials);
                continue;
            };
            device.bind_program(program, ProgramStages::Full);

            for material_handle in materials {
                let Some(material) = scene.material(material_handle) else {
                    continue;
                };

                match material.uniform_buffer() {
                    Some(buffer) => {
                        let constants = material.constants.to_uniform();
                        if let Err(err) = device.write_buffer(buffer, bytemuck::bytes_of(&constants)) {
                            error!("material '{}' constants: {err}", material.label);
                            stats.failed_binds += 1;
                        }
                        device.bind_uniform(UniformSlot::Material, buffer);
                    }
                    None => stats.failed_binds += 1,
                }

                let binding = material.texture();
                device.bind_texture(
                    TextureSlot::Material,
                    binding.texture().unwrap_or(self.fallback_texture),
                    binding.sampler().unwrap_or(self.fallback_sampler),
                );

                for mesh in material.meshes().to_vec() {
                    stats.color_draws +=
                        draw_mesh(device, scene, mesh, view_proj, eye, attributes, stats);
                }
            }
        }

        device.end_pass();
    }

    /// Creates GPU resources for anything new or changed since the last frame.
    fn prepare<D: GpuDevice + ?Sized>(
        &mut self,
        device: &mut D,
        scene: &mut SceneGraph,
        lights: &mut LightManager,
        stats: &mut FrameStats,
    ) {
        for shader in scene.shaders_mut() {
            if shader.state() != ProgramState::Pending {
                continue;
            }
            match device.create_program(shader.desc()) {
                Ok(program) => {
                    debug!("compiled program '{}'", shader.label());
                    shader.set_state(ProgramState::Ready(program));
                }
                Err(err) => {
                    error!("{err}");
                    shader.set_state(ProgramState::Failed);
                    stats.failed_binds += 1;
                }
            }
        }

        for material in scene.materials_mut() {
            if material.uniform_buffer().is_none() {
                let constants = material.constants.to_uniform();
                match device.create_buffer(
                    &format!("{} Material", material.label),
                    BufferKind::Uniform,
                    bytemuck::bytes_of(&constants),
                ) {
                    Ok(buffer) => material.set_uniform_buffer(buffer),
                    Err(err) => {
                        error!("{err}");
                        stats.failed_binds += 1;
                    }
                }
            }

            let label = material.label.clone();
            let binding = material.texture_mut();
            if let Some(image) = binding.take_pending() {
                match device.create_texture_rgba8(&label, image.width, image.height, &image.pixels) {
                    Ok(texture) => {
                        if let Some(old) = binding.set_texture(texture) {
                            device.release_texture(old);
                        }
                    }
                    Err(err) => {
                        error!("{err}");
                        stats.failed_binds += 1;
                    }
                }
            }
            if binding.sampler().is_none() {
                match device.create_sampler(&label, SamplerDesc::LinearWrap) {
                    Ok(sampler) => binding.set_sampler(sampler),
                    Err(err) => {
                        error!("{err}");
                        stats.failed_binds += 1;
                    }
                }
            }
        }

        for mesh in scene.meshes_mut() {
            if mesh.transform_buffer().is_none() {
                match device.create_buffer(
                    &format!("{} Transform", mesh.name),
                    BufferKind::Uniform,
                    bytemuck::bytes_of(&TransformUniform::zeroed()),
                ) {
                    Ok(buffer) => mesh.set_transform_buffer(buffer),
                    Err(err) => {
                        error!("{err}");
                        stats.failed_binds += 1;
                    }
                }
            }
        }

        for surface in scene.surfaces_mut() {
            if !surface.needs_upload() {
                continue;
            }
            let buffers = match upload_surface(device, surface) {
                Ok(buffers) => buffers,
                Err(err) => {
                    error!("surface '{}': {err}", surface.label);
                    stats.failed_binds += 1;
                    SurfaceBuffers::default()
                }
            };
            for old in surface.replace_buffers(buffers) {
                old.release(device);
            }
        }

        if lights.buffer().is_none() {
            lights.repack();
            if let Err(err) = lights.upload(device) {
                error!("light array: {err}");
                stats.failed_binds += 1;
            }
        }
    }

    /// Recreates the main depth target when the surface size changed.
    fn fit_depth_target<D: GpuDevice + ?Sized>(&mut self, device: &mut D, stats: &mut FrameStats) {
        let size = device.surface_size();
        if size == self.depth_size {
            return;
        }
        match device.create_depth_target("Depth Texture", size.0, size.1) {
            Ok(depth) => {
                device.release_texture(self.depth_target);
                self.depth_target = depth;
                self.depth_size = size;
                debug!("depth target resized to {}x{}", size.0, size.1);
            }
            Err(err) => {
                error!("depth target resize: {err}");
                stats.failed_binds += 1;
            }
        }
    }

    fn poll_device_lost<D: GpuDevice + ?Sized>(&mut self, device: &D) {
        if let Some(reason) = device.device_lost() {
            if !self.device_lost_logged {
                error!("{}", GpuError::DeviceLost(reason));
                self.device_lost_logged = true;
            }
        }
    }

    /// Hands every pipeline-owned resource back to the device.
    pub fn release<D: GpuDevice + ?Sized>(self, device: &mut D) {
        device.release_texture(self.shadow_map);
        device.release_texture(self.depth_target);
        device.release_texture(self.fallback_texture);
        device.release_sampler(self.shadow_sampler);
        device.release_sampler(self.fallback_sampler);
        device.release_buffer(self.shadow_buffer);
    }
}

type DrawBucket = (Option<ProgramHandle>, AttributeMask, Vec<MaterialHandle>);

/// Shaders in draw order with their program, attribute mask and materials.
fn draw_buckets(scene: &SceneGraph) -> Vec<DrawBucket> {
    scene
        .shaders()
        .map(|(_, shader)| {
            (
                shader.program(),
                shader.attributes(),
                shader.materials().to_vec(),
            )
        })
        .collect()
}

fn count_surfaces(scene: &SceneGraph, materials: &[MaterialHandle]) -> u32 {
    materials
        .iter()
        .filter_map(|m| scene.material(*m))
        .flat_map(|m| m.meshes())
        .filter_map(|mesh| scene.mesh(*mesh))
        .map(|mesh| mesh.surfaces().len() as u32)
        .sum()
}

/// Uploads the mesh transform and draws each of its surfaces. Returns the number
/// of draw calls issued.
fn draw_mesh<D: GpuDevice + ?Sized>(
    device: &mut D,
    scene: &mut SceneGraph,
    mesh: MeshHandle,
    view_proj: Matrix4<f32>,
    eye: Vector3<f32>,
    attributes: AttributeMask,
    stats: &mut FrameStats,
) -> u32 {
    let Some(mesh) = scene.mesh_mut(mesh) else {
        return 0;
    };
    let world = mesh.transform.world_matrix();
    let surfaces = mesh.surfaces().to_vec();

    let Some(buffer) = mesh.transform_buffer() else {
        stats.failed_binds += 1;
        stats.skipped_surfaces += surfaces.len() as u32;
        return 0;
    };
    let uniform = TransformUniform::new(world, view_proj, eye);
    if let Err(err) = device.write_buffer(buffer, bytemuck::bytes_of(&uniform)) {
        error!("mesh '{}' transform: {err}", mesh.name);
        stats.failed_binds += 1;
    }
    device.bind_uniform(UniformSlot::Transform, buffer);

    let mut draws = 0;
    for surface in surfaces {
        let Some(surface) = scene.surface(surface) else {
            continue;
        };
        if draw_surface(device, surface, attributes) {
            draws += 1;
        } else {
            stats.skipped_surfaces += 1;
        }
    }
    draws
}

/// Binds the streams `attributes` asks for and issues the draw. False when the
/// surface has nothing uploaded to draw.
fn draw_surface<D: GpuDevice + ?Sized>(
    device: &mut D,
    surface: &Surface,
    attributes: AttributeMask,
) -> bool {
    let buffers = surface.buffers();
    if buffers.vertex_count == 0 {
        return false;
    }

    for attribute in VertexAttribute::ALL {
        if !attributes.contains(attribute.mask()) {
            continue;
        }
        match buffers.stream(attribute) {
            Some(stream) => device.bind_vertex_stream(attribute, stream),
            None => return false,
        }
    }

    match (surface.draw_mode(), buffers.index) {
        (DrawMode::TriangleList, Some(index)) if buffers.index_count > 0 => {
            device.bind_index_buffer(index);
            device.draw_indexed(Topology::TriangleList, buffers.index_count);
        }
        (mode, _) => device.draw(mode.topology(), buffers.vertex_count),
    }
    true
}

/// Creates one buffer per attribute stream plus the index buffer.
fn upload_surface<D: GpuDevice + ?Sized>(
    device: &mut D,
    surface: &Surface,
) -> Result<SurfaceBuffers, GpuError> {
    let mut buffers = SurfaceBuffers::default();
    if surface.vertex_count() == 0 {
        return Ok(buffers);
    }

    let label = &surface.label;
    let streams: [(VertexAttribute, &[u8]); 4] = [
        (VertexAttribute::Position, bytemuck::cast_slice(surface.positions())),
        (VertexAttribute::Normal, bytemuck::cast_slice(surface.normals())),
        (VertexAttribute::Color, bytemuck::cast_slice(surface.colors())),
        (VertexAttribute::Uv, bytemuck::cast_slice(surface.uvs())),
    ];

    let result = (|| -> Result<(), GpuError> {
        for (attribute, bytes) in streams {
            let buffer =
                device.create_buffer(&format!("{label} {attribute:?}"), BufferKind::Vertex, bytes)?;
            buffers.streams[attribute.shader_location() as usize] = Some(buffer);
        }
        if surface.draw_mode() == DrawMode::TriangleList && surface.index_count() > 0 {
            let bytes = bytemuck::cast_slice(surface.indices());
            buffers.index = Some(device.create_buffer(&format!("{label} Index"), BufferKind::Index, bytes)?);
            buffers.index_count = surface.index_count() as u32;
        }
        Ok(())
    })();

    match result {
        Ok(()) => {
            buffers.vertex_count = surface.vertex_count() as u32;
            Ok(buffers)
        }
        Err(err) => {
            for buffer in buffers.streams.iter().flatten().chain(buffers.index.iter()) {
                device.release_buffer(*buffer);
            }
            Err(err)
        }
    }
}
