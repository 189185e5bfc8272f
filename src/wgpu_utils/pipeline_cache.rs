// src/wgpu_utils/pipeline_cache.rs
//! Render pipeline cache
//!
//! wgpu bakes rasterizer state, topology and attachment formats into the render
//! pipeline object, while the device contract binds them separately. Pipelines are
//! therefore built lazily at draw time, one per distinct [`PipelineKey`].

use std::collections::{HashMap, HashSet};

use log::{debug, error};

use super::binding_types::BindGroupLayouts;
use super::texture_resource::TextureResource;
use crate::errors::GpuError;
use crate::gpu::{
    AttributeMask, CullMode, ProgramDesc, ProgramHandle, ProgramStages, RasterizerState,
    Topology, VertexAttribute,
};

/// Compiled shader module plus the description it came from.
pub struct CompiledProgram {
    pub module: wgpu::ShaderModule,
    pub desc: ProgramDesc,
}

/// Everything that distinguishes one baked pipeline from another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub program: ProgramHandle,
    pub stages: ProgramStages,
    pub cull: CullMode,
    pub depth_bias: i32,
    pub slope_scale_bits: u32,
    pub topology: Topology,
    pub has_color: bool,
}

impl PipelineKey {
    pub fn new(
        program: ProgramHandle,
        stages: ProgramStages,
        rasterizer: RasterizerState,
        topology: Topology,
        has_color: bool,
    ) -> Self {
        Self {
            program,
            stages,
            cull: rasterizer.cull,
            depth_bias: rasterizer.depth_bias,
            slope_scale_bits: rasterizer.slope_scale_bias.to_bits(),
            topology,
            has_color,
        }
    }

    /// Bind groups the pipeline layout declares.
    pub fn group_count(&self) -> usize {
        match self.stages {
            ProgramStages::Full => 4,
            ProgramStages::DepthOnly => 2,
        }
    }
}

pub struct PipelineCache {
    layouts: BindGroupLayouts,
    full_layout: wgpu::PipelineLayout,
    depth_layout: wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    failed: HashSet<PipelineKey>,
}

impl PipelineCache {
    pub fn new(device: &wgpu::Device, color_format: wgpu::TextureFormat) -> Self {
        let layouts = BindGroupLayouts::new(device);

        let full_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Full Pipeline Layout"),
            bind_group_layouts: &[
                &layouts.transform,
                &layouts.shadow,
                &layouts.material,
                &layouts.lighting,
            ],
            push_constant_ranges: &[],
        });
        let depth_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Depth Pipeline Layout"),
            bind_group_layouts: &[&layouts.transform, &layouts.shadow],
            push_constant_ranges: &[],
        });

        Self {
            layouts,
            full_layout,
            depth_layout,
            color_format,
            pipelines: HashMap::new(),
            failed: HashSet::new(),
        }
    }

    pub fn layouts(&self) -> &BindGroupLayouts {
        &self.layouts
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    /// Drops every pipeline built from `program`.
    pub fn evict_program(&mut self, program: ProgramHandle) {
        self.pipelines.retain(|key, _| key.program != program);
        self.failed.retain(|key| key.program != program);
    }

    /// Returns the pipeline for `key`, building it on first use. A key that failed
    /// once is not retried.
    pub fn get_or_create(
        &mut self,
        device: &wgpu::Device,
        program: &CompiledProgram,
        key: PipelineKey,
    ) -> Option<&wgpu::RenderPipeline> {
        if self.failed.contains(&key) {
            return None;
        }
        if !self.pipelines.contains_key(&key) {
            match self.build(device, program, &key) {
                Ok(pipeline) => {
                    debug!("built pipeline for '{}' ({:?})", program.desc.label, key.stages);
                    self.pipelines.insert(key, pipeline);
                }
                Err(err) => {
                    error!("{err}");
                    self.failed.insert(key);
                    return None;
                }
            }
        }
        self.pipelines.get(&key)
    }

    fn build(
        &self,
        device: &wgpu::Device,
        program: &CompiledProgram,
        key: &PipelineKey,
    ) -> Result<wgpu::RenderPipeline, GpuError> {
        let desc = &program.desc;
        let attributes = vertex_attributes(desc.attributes);
        let vertex_buffers: Vec<wgpu::VertexBufferLayout> = attributes
            .iter()
            .map(|(stride, attribute)| wgpu::VertexBufferLayout {
                array_stride: *stride,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: std::slice::from_ref(attribute),
            })
            .collect();

        let color_targets = [Some(wgpu::ColorTargetState {
            format: self.color_format,
            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
            write_mask: wgpu::ColorWrites::ALL,
        })];
        let targets: &[Option<wgpu::ColorTargetState>] = if key.has_color {
            &color_targets
        } else {
            &[]
        };
        let fragment = match key.stages {
            ProgramStages::Full => Some(wgpu::FragmentState {
                module: &program.module,
                entry_point: Some(desc.pixel_entry.as_str()),
                targets,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            ProgramStages::DepthOnly => None,
        };
        let layout = match key.stages {
            ProgramStages::Full => &self.full_layout,
            ProgramStages::DepthOnly => &self.depth_layout,
        };

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(desc.label.as_str()),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: &program.module,
                entry_point: Some(desc.vertex_entry.as_str()),
                buffers: &vertex_buffers,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment,
            primitive: wgpu::PrimitiveState {
                topology: match key.topology {
                    Topology::TriangleList => wgpu::PrimitiveTopology::TriangleList,
                    Topology::LineList => wgpu::PrimitiveTopology::LineList,
                },
                strip_index_format: None,
                // Left-handed frame: front faces wind clockwise on screen
                front_face: wgpu::FrontFace::Cw,
                cull_mode: match key.cull {
                    CullMode::None => None,
                    CullMode::Front => Some(wgpu::Face::Front),
                    CullMode::Back => Some(wgpu::Face::Back),
                },
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: TextureResource::DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState {
                    constant: key.depth_bias,
                    slope_scale: f32::from_bits(key.slope_scale_bits),
                    clamp: 0.0,
                },
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        match pollster::block_on(device.pop_error_scope()) {
            None => Ok(pipeline),
            Some(err) => Err(GpuError::ProgramCompilation {
                label: desc.label.clone(),
                reason: err.to_string(),
            }),
        }
    }
}

/// One single-attribute buffer layout per stream in `mask`, in shader location
/// order. Buffer slots are assigned sequentially over the result.
pub fn vertex_attributes(mask: AttributeMask) -> Vec<(u64, wgpu::VertexAttribute)> {
    VertexAttribute::ALL
        .into_iter()
        .filter(|attribute| mask.contains(attribute.mask()))
        .map(|attribute| {
            let format = match attribute {
                VertexAttribute::Position | VertexAttribute::Normal => {
                    wgpu::VertexFormat::Float32x3
                }
                VertexAttribute::Color => wgpu::VertexFormat::Float32x4,
                VertexAttribute::Uv => wgpu::VertexFormat::Float32x2,
            };
            (
                format.size(),
                wgpu::VertexAttribute {
                    format,
                    offset: 0,
                    shader_location: attribute.shader_location(),
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlit_mask_uses_two_streams() {
        let layouts = vertex_attributes(AttributeMask::UNLIT);
        let locations: Vec<u32> = layouts.iter().map(|(_, a)| a.shader_location).collect();
        assert_eq!(locations, vec![0, 2]);
        assert_eq!(layouts[1].0, 16);
    }

    #[test]
    fn test_lit_strides() {
        let strides: Vec<u64> = vertex_attributes(AttributeMask::LIT)
            .iter()
            .map(|(stride, _)| *stride)
            .collect();
        assert_eq!(strides, vec![12, 12, 16, 8]);
    }
}
