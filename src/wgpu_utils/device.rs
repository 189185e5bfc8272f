// src/wgpu_utils/device.rs
//! wgpu implementation of [`GpuDevice`]
//!
//! The device contract is immediate mode while wgpu wants whole render passes
//! described up front. [`WgpuDevice`] bridges the two by recording the commands of
//! each pass and replaying them into a `wgpu::RenderPass` at `end_pass`:
//!
//! - pipelines are looked up per draw from the bound program, rasterizer state and
//!   topology (see [`PipelineCache`])
//! - bind groups are rebuilt only when the handles feeding them change
//! - buffer writes made during a frame go through a staging buffer and a
//!   buffer-to-buffer copy, so a write is seen by the draws recorded after it and
//!   not by earlier passes
//!
//! A buffer written more than once inside the same pass holds its last value for
//! every draw of that pass.

use std::iter;
use std::sync::{Arc, OnceLock};

use log::{debug, error, info, warn};
use slotmap::SlotMap;
use wgpu::util::DeviceExt;

use super::pipeline_cache::{CompiledProgram, PipelineCache, PipelineKey};
use super::texture_resource::{create_sampler, TextureResource};
use crate::errors::{EngineError, GpuError};
use crate::gpu::{
    BufferHandle, BufferKind, ColorTarget, GpuDevice, PassDesc, ProgramDesc, ProgramHandle,
    ProgramStages, RasterizerState, SamplerDesc, SamplerHandle, TextureHandle, TextureSlot,
    Topology, UniformSlot, VertexAttribute, Viewport,
};

struct GpuBuffer {
    buffer: wgpu::Buffer,
    size: u64,
}

/// Live GPU objects addressed by handle.
#[derive(Default)]
struct Resources {
    buffers: SlotMap<BufferHandle, GpuBuffer>,
    programs: SlotMap<ProgramHandle, CompiledProgram>,
    textures: SlotMap<TextureHandle, TextureResource>,
    samplers: SlotMap<SamplerHandle, wgpu::Sampler>,
}

enum PassCommand {
    Rasterizer(RasterizerState),
    Viewport(Viewport),
    Program(ProgramHandle, ProgramStages),
    Uniform(UniformSlot, BufferHandle),
    Texture(TextureSlot, TextureHandle, SamplerHandle),
    Stream(VertexAttribute, BufferHandle),
    Index(BufferHandle),
    Draw {
        topology: Topology,
        count: u32,
        indexed: bool,
    },
}

struct StagedWrite {
    staging: wgpu::Buffer,
    target: BufferHandle,
    size: u64,
}

struct RecordedPass {
    desc: PassDesc,
    writes: Vec<StagedWrite>,
    commands: Vec<PassCommand>,
}

struct Frame {
    surface_texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
    pass: Option<RecordedPass>,
}

/// [`GpuDevice`] backed by a wgpu surface, device and queue.
pub struct WgpuDevice {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    resources: Resources,
    pipelines: PipelineCache,
    frame: Option<Frame>,
    lost: Arc<OnceLock<String>>,
    skip_warned: bool,
}

impl WgpuDevice {
    /// Opens an adapter and device for `window` and configures its surface.
    pub fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> Result<Self, EngineError> {
        pollster::block_on(Self::new_async(window, width, height))
    }

    async fn new_async(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> Result<Self, EngineError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|err| EngineError::AdapterRequestFailed(err.to_string()))?;
        info!("using adapter {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Umbra Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: 4096,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let lost = Arc::new(OnceLock::new());
        let lost_slot = Arc::clone(&lost);
        device.set_device_lost_callback(move |reason, message| {
            let _ = lost_slot.set(format!("{reason:?}: {message}"));
        });
        device.on_uncaptured_error(Box::new(|err: wgpu::Error| {
            error!("uncaptured wgpu error: {err}");
        }));

        let capabilities = surface.get_capabilities(&adapter);
        let format = capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .unwrap_or(capabilities.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: capabilities.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let pipelines = PipelineCache::new(&device, format);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            resources: Resources::default(),
            pipelines,
            frame: None,
            lost,
            skip_warned: false,
        })
    }

    /// Reconfigures the surface. Zero-sized requests (minimised windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    fn set_present_mode(&mut self, sync_interval: u32) {
        let mode = if sync_interval == 0 {
            wgpu::PresentMode::AutoNoVsync
        } else {
            wgpu::PresentMode::AutoVsync
        };
        if self.config.present_mode != mode {
            self.config.present_mode = mode;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Runs `create` inside validation and out-of-memory error scopes.
    fn scoped<T>(&self, create: impl FnOnce(&wgpu::Device) -> T) -> Result<T, String> {
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = create(&self.device);
        let validation = pollster::block_on(self.device.pop_error_scope());
        let memory = pollster::block_on(self.device.pop_error_scope());
        match validation.or(memory) {
            None => Ok(value),
            Some(err) => Err(err.to_string()),
        }
    }
}

impl GpuDevice for WgpuDevice {
    fn create_buffer(
        &mut self,
        label: &str,
        kind: BufferKind,
        contents: &[u8],
    ) -> Result<BufferHandle, GpuError> {
        let usage = match kind {
            BufferKind::Vertex => wgpu::BufferUsages::VERTEX,
            BufferKind::Index => wgpu::BufferUsages::INDEX,
            BufferKind::Uniform => wgpu::BufferUsages::UNIFORM,
        } | wgpu::BufferUsages::COPY_DST;

        let buffer = self
            .scoped(|device| {
                device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(label),
                    contents,
                    usage,
                })
            })
            .map_err(|reason| GpuError::BufferCreation {
                label: label.to_string(),
                reason,
            })?;

        debug!("created {kind:?} buffer '{label}' ({} bytes)", contents.len());
        Ok(self.resources.buffers.insert(GpuBuffer {
            buffer,
            size: contents.len() as u64,
        }))
    }

    fn write_buffer(&mut self, buffer: BufferHandle, contents: &[u8]) -> Result<(), GpuError> {
        let target = self
            .resources
            .buffers
            .get(buffer)
            .ok_or(GpuError::InvalidHandle("buffer"))?;

        let size = contents.len() as u64;
        if size != target.size || size % wgpu::COPY_BUFFER_ALIGNMENT != 0 {
            return Err(GpuError::BufferWrite {
                buffer,
                size: contents.len(),
                reason: format!("buffer holds {} bytes", target.size),
            });
        }

        let Some(frame) = self.frame.as_mut() else {
            self.queue.write_buffer(&target.buffer, 0, contents);
            return Ok(());
        };

        let staging = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Staging Write"),
                contents,
                usage: wgpu::BufferUsages::COPY_SRC,
            });
        match frame.pass.as_mut() {
            Some(pass) => pass.writes.push(StagedWrite {
                staging,
                target: buffer,
                size,
            }),
            None => frame
                .encoder
                .copy_buffer_to_buffer(&staging, 0, &target.buffer, 0, size),
        }
        Ok(())
    }

    fn create_program(&mut self, desc: &ProgramDesc) -> Result<ProgramHandle, GpuError> {
        let module = self
            .scoped(|device| {
                device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(desc.label.as_str()),
                    source: wgpu::ShaderSource::Wgsl(desc.source.clone()),
                })
            })
            .map_err(|reason| GpuError::ProgramCompilation {
                label: desc.label.clone(),
                reason,
            })?;

        Ok(self.resources.programs.insert(CompiledProgram {
            module,
            desc: desc.clone(),
        }))
    }

    fn create_texture_rgba8(
        &mut self,
        label: &str,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<TextureHandle, GpuError> {
        if width == 0 || height == 0 || pixels.len() != (width as usize) * (height as usize) * 4 {
            return Err(GpuError::TextureCreation {
                label: label.to_string(),
                reason: format!("{} bytes for {width}x{height} RGBA8", pixels.len()),
            });
        }

        let queue = &self.queue;
        let texture = self
            .scoped(|device| {
                TextureResource::create_from_rgba_data(device, queue, pixels, width, height, label)
            })
            .map_err(|reason| GpuError::TextureCreation {
                label: label.to_string(),
                reason,
            })?;

        Ok(self.resources.textures.insert(texture))
    }

    fn create_depth_target(
        &mut self,
        label: &str,
        width: u32,
        height: u32,
    ) -> Result<TextureHandle, GpuError> {
        let texture = self
            .scoped(|device| TextureResource::create_depth_target(device, width, height, label))
            .map_err(|reason| GpuError::TextureCreation {
                label: label.to_string(),
                reason,
            })?;

        Ok(self.resources.textures.insert(texture))
    }

    fn create_sampler(
        &mut self,
        label: &str,
        desc: SamplerDesc,
    ) -> Result<SamplerHandle, GpuError> {
        let sampler = self
            .scoped(|device| create_sampler(device, label, desc))
            .map_err(|reason| GpuError::SamplerCreation {
                label: label.to_string(),
                reason,
            })?;

        Ok(self.resources.samplers.insert(sampler))
    }

    fn surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    fn begin_frame(&mut self) -> Result<(), GpuError> {
        if self.frame.is_some() {
            warn!("begin_frame while a frame is open, discarding it");
            self.frame = None;
        }

        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return Err(GpuError::Surface("surface lost, reconfigured".to_string()));
            }
            Err(err) => return Err(GpuError::Surface(err.to_string())),
        };

        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        self.frame = Some(Frame {
            surface_texture,
            view,
            encoder,
            pass: None,
        });
        Ok(())
    }

    fn begin_pass(&mut self, pass: &PassDesc) {
        let Some(frame) = self.frame.as_mut() else {
            warn!("begin_pass('{}') outside a frame", pass.label);
            return;
        };
        if frame.pass.is_some() {
            warn!("begin_pass('{}') while a pass is open", pass.label);
        }
        frame.pass = Some(RecordedPass {
            desc: pass.clone(),
            writes: Vec::new(),
            commands: Vec::new(),
        });
    }

    fn end_pass(&mut self) {
        let Some(frame) = self.frame.as_mut() else {
            return;
        };
        let Some(pass) = frame.pass.take() else {
            warn!("end_pass without an open pass");
            return;
        };

        for write in &pass.writes {
            if let Some(target) = self.resources.buffers.get(write.target) {
                frame
                    .encoder
                    .copy_buffer_to_buffer(&write.staging, 0, &target.buffer, 0, write.size);
            }
        }

        let Some(depth) = self.resources.textures.get(pass.desc.depth) else {
            error!("pass '{}' has no depth target", pass.desc.label);
            return;
        };

        let color_attachments: Vec<Option<wgpu::RenderPassColorAttachment>> = pass
            .desc
            .color
            .iter()
            .map(|target| match target {
                ColorTarget::Backbuffer { clear } => Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: clear[0],
                            g: clear[1],
                            b: clear[2],
                            a: clear[3],
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                }),
            })
            .collect();

        let mut render_pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(pass.desc.label),
            color_attachments: &color_attachments,
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: match pass.desc.depth_clear {
                        Some(value) => wgpu::LoadOp::Clear(value),
                        None => wgpu::LoadOp::Load,
                    },
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let mut replay = PassReplay::new(pass.desc.color.is_some());
        for command in pass.commands {
            replay.apply(
                &mut render_pass,
                &self.device,
                &self.resources,
                &mut self.pipelines,
                command,
            );
        }
        drop(render_pass);

        if replay.skipped > 0 && !self.skip_warned {
            warn!(
                "pass '{}' skipped {} draw(s) with missing bindings",
                pass.desc.label, replay.skipped
            );
            self.skip_warned = true;
        }
    }

    fn set_rasterizer(&mut self, state: RasterizerState) {
        self.record(PassCommand::Rasterizer(state));
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.record(PassCommand::Viewport(viewport));
    }

    fn bind_program(&mut self, program: ProgramHandle, stages: ProgramStages) {
        self.record(PassCommand::Program(program, stages));
    }

    fn bind_uniform(&mut self, slot: UniformSlot, buffer: BufferHandle) {
        self.record(PassCommand::Uniform(slot, buffer));
    }

    fn bind_texture(&mut self, slot: TextureSlot, texture: TextureHandle, sampler: SamplerHandle) {
        self.record(PassCommand::Texture(slot, texture, sampler));
    }

    fn bind_vertex_stream(&mut self, attribute: VertexAttribute, buffer: BufferHandle) {
        self.record(PassCommand::Stream(attribute, buffer));
    }

    fn bind_index_buffer(&mut self, buffer: BufferHandle) {
        self.record(PassCommand::Index(buffer));
    }

    fn draw_indexed(&mut self, topology: Topology, index_count: u32) {
        self.record(PassCommand::Draw {
            topology,
            count: index_count,
            indexed: true,
        });
    }

    fn draw(&mut self, topology: Topology, vertex_count: u32) {
        self.record(PassCommand::Draw {
            topology,
            count: vertex_count,
            indexed: false,
        });
    }

    fn present(&mut self, sync_interval: u32) -> Result<(), GpuError> {
        let Some(mut frame) = self.frame.take() else {
            return Ok(());
        };
        if frame.pass.is_some() {
            warn!("present with an open pass, dropping its commands");
            frame.pass = None;
        }

        self.queue.submit(iter::once(frame.encoder.finish()));
        frame.surface_texture.present();

        self.set_present_mode(sync_interval);
        Ok(())
    }

    fn device_lost(&self) -> Option<String> {
        self.lost.get().cloned()
    }

    fn release_buffer(&mut self, buffer: BufferHandle) {
        self.resources.buffers.remove(buffer);
    }

    fn release_texture(&mut self, texture: TextureHandle) {
        self.resources.textures.remove(texture);
    }

    fn release_sampler(&mut self, sampler: SamplerHandle) {
        self.resources.samplers.remove(sampler);
    }

    fn release_program(&mut self, program: ProgramHandle) {
        self.resources.programs.remove(program);
        self.pipelines.evict_program(program);
    }
}

impl WgpuDevice {
    fn record(&mut self, command: PassCommand) {
        match self.frame.as_mut().and_then(|frame| frame.pass.as_mut()) {
            Some(pass) => pass.commands.push(command),
            None => warn!("pass command issued outside a pass"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum GroupKey {
    Uniform(BufferHandle),
    Material(BufferHandle, TextureHandle, SamplerHandle),
    Lighting(TextureHandle, SamplerHandle, BufferHandle),
}

/// Binding state tracked while replaying one pass.
struct PassReplay {
    has_color: bool,
    rasterizer: RasterizerState,
    program: Option<(ProgramHandle, ProgramStages)>,
    uniforms: [Option<BufferHandle>; 4],
    textures: [Option<(TextureHandle, SamplerHandle)>; 2],
    streams: [Option<BufferHandle>; 4],
    index: Option<BufferHandle>,
    bound_pipeline: Option<PipelineKey>,
    bound_groups: [Option<GroupKey>; 4],
    skipped: u32,
}

impl PassReplay {
    fn new(has_color: bool) -> Self {
        Self {
            has_color,
            rasterizer: RasterizerState::DEFAULT,
            program: None,
            uniforms: [None; 4],
            textures: [None; 2],
            streams: [None; 4],
            index: None,
            bound_pipeline: None,
            bound_groups: [None; 4],
            skipped: 0,
        }
    }

    fn apply(
        &mut self,
        pass: &mut wgpu::RenderPass<'_>,
        device: &wgpu::Device,
        resources: &Resources,
        pipelines: &mut PipelineCache,
        command: PassCommand,
    ) {
        match command {
            PassCommand::Rasterizer(state) => self.rasterizer = state,
            PassCommand::Viewport(v) => {
                pass.set_viewport(v.x, v.y, v.width, v.height, v.min_depth, v.max_depth)
            }
            PassCommand::Program(program, stages) => self.program = Some((program, stages)),
            PassCommand::Uniform(slot, buffer) => self.uniforms[uniform_index(slot)] = Some(buffer),
            PassCommand::Texture(slot, texture, sampler) => {
                self.textures[texture_index(slot)] = Some((texture, sampler))
            }
            PassCommand::Stream(attribute, buffer) => {
                self.streams[attribute.shader_location() as usize] = Some(buffer)
            }
            PassCommand::Index(buffer) => self.index = Some(buffer),
            PassCommand::Draw {
                topology,
                count,
                indexed,
            } => {
                if !self.draw(pass, device, resources, pipelines, topology, count, indexed) {
                    self.skipped += 1;
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn draw(
        &mut self,
        pass: &mut wgpu::RenderPass<'_>,
        device: &wgpu::Device,
        resources: &Resources,
        pipelines: &mut PipelineCache,
        topology: Topology,
        count: u32,
        indexed: bool,
    ) -> bool {
        let Some((program_handle, stages)) = self.program else {
            return false;
        };
        let Some(program) = resources.programs.get(program_handle) else {
            return false;
        };

        let key = PipelineKey::new(program_handle, stages, self.rasterizer, topology, self.has_color);
        let Some(pipeline) = pipelines.get_or_create(device, program, key) else {
            return false;
        };
        if self.bound_pipeline != Some(key) {
            pass.set_pipeline(pipeline);
            self.bound_pipeline = Some(key);
            self.bound_groups = [None; 4];
        }

        for group in 0..key.group_count() {
            let Some(group_key) = self.group_key(group) else {
                return false;
            };
            if self.bound_groups[group] == Some(group_key) {
                continue;
            }
            let Some(layout) = pipelines.layouts().group(group) else {
                return false;
            };
            let Some(bind_group) = create_bind_group(device, layout, resources, group_key) else {
                return false;
            };
            pass.set_bind_group(group as u32, &bind_group, &[]);
            self.bound_groups[group] = Some(group_key);
        }

        let mut slot = 0;
        for attribute in VertexAttribute::ALL {
            if !program.desc.attributes.contains(attribute.mask()) {
                continue;
            }
            let Some(buffer) = self.streams[attribute.shader_location() as usize]
                .and_then(|handle| resources.buffers.get(handle))
            else {
                return false;
            };
            pass.set_vertex_buffer(slot, buffer.buffer.slice(..));
            slot += 1;
        }

        if indexed {
            let Some(index) = self.index.and_then(|handle| resources.buffers.get(handle)) else {
                return false;
            };
            pass.set_index_buffer(index.buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..count, 0, 0..1);
        } else {
            pass.draw(0..count, 0..1);
        }
        true
    }

    fn group_key(&self, group: usize) -> Option<GroupKey> {
        match group {
            0 => self.uniforms[0].map(GroupKey::Uniform),
            1 => self.uniforms[1].map(GroupKey::Uniform),
            2 => {
                let buffer = self.uniforms[2]?;
                let (texture, sampler) = self.textures[0]?;
                Some(GroupKey::Material(buffer, texture, sampler))
            }
            3 => {
                let (texture, sampler) = self.textures[1]?;
                let buffer = self.uniforms[3]?;
                Some(GroupKey::Lighting(texture, sampler, buffer))
            }
            _ => None,
        }
    }
}

fn uniform_index(slot: UniformSlot) -> usize {
    match slot {
        UniformSlot::Transform => 0,
        UniformSlot::Shadow => 1,
        UniformSlot::Material => 2,
        UniformSlot::Lights => 3,
    }
}

fn texture_index(slot: TextureSlot) -> usize {
    match slot {
        TextureSlot::Material => 0,
        TextureSlot::ShadowMap => 1,
    }
}

fn create_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    resources: &Resources,
    key: GroupKey,
) -> Option<wgpu::BindGroup> {
    let entries = match key {
        GroupKey::Uniform(buffer) => {
            vec![wgpu::BindGroupEntry {
                binding: 0,
                resource: resources.buffers.get(buffer)?.buffer.as_entire_binding(),
            }]
        }
        GroupKey::Material(buffer, texture, sampler) => vec![
            wgpu::BindGroupEntry {
                binding: 0,
                resource: resources.buffers.get(buffer)?.buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&resources.textures.get(texture)?.view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(resources.samplers.get(sampler)?),
            },
        ],
        GroupKey::Lighting(texture, sampler, buffer) => vec![
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&resources.textures.get(texture)?.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(resources.samplers.get(sampler)?),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: resources.buffers.get(buffer)?.buffer.as_entire_binding(),
            },
        ],
    };

    Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: None,
        layout,
        entries: &entries,
    }))
}
