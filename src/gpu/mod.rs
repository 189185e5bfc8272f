//! GPU device contract
//!
//! The render core never talks to a graphics API directly. Everything it needs from
//! the GPU goes through [`GpuDevice`], an immediate-mode interface shaped after the
//! narrow set of operations the two-pass frame uses: buffer creation and
//! write-discard updates, program creation, textures/samplers/depth targets, pass
//! begin/end with clears, state binding, and draw submission.
//!
//! Two implementations ship with the crate:
//!
//! - [`WgpuDevice`](crate::wgpu_utils::WgpuDevice) - the real backend
//! - [`RecordingDevice`] - a headless recorder used by tests and tooling

pub mod recording;

pub use recording::{GpuCommand, RecordingDevice};

use std::borrow::Cow;

use bitflags::bitflags;
use slotmap::new_key_type;

use crate::errors::GpuError;

new_key_type! {
    /// Vertex, index or uniform buffer.
    pub struct BufferHandle;
    /// Linked vertex + pixel program.
    pub struct ProgramHandle;
    /// Sampled 2D texture or depth target.
    pub struct TextureHandle;
    /// Texture sampler.
    pub struct SamplerHandle;
}

bitflags! {
    /// Vertex attribute streams a program consumes.
    ///
    /// Each attribute lives in its own vertex buffer; the shader location is fixed
    /// per attribute (position 0, normal 1, color 2, uv 3).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AttributeMask: u32 {
        const POSITION = 1 << 0;
        const NORMAL = 1 << 1;
        const COLOR = 1 << 2;
        const UV = 1 << 3;
    }
}

impl AttributeMask {
    /// Everything a lit, textured program reads.
    pub const LIT: Self = Self::POSITION
        .union(Self::NORMAL)
        .union(Self::COLOR)
        .union(Self::UV);

    /// Position and color only, used for debug wireframes.
    pub const UNLIT: Self = Self::POSITION.union(Self::COLOR);
}

/// One per-vertex attribute stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexAttribute {
    Position,
    Normal,
    Color,
    Uv,
}

impl VertexAttribute {
    /// All attributes in shader location order.
    pub const ALL: [VertexAttribute; 4] = [
        VertexAttribute::Position,
        VertexAttribute::Normal,
        VertexAttribute::Color,
        VertexAttribute::Uv,
    ];

    pub fn mask(self) -> AttributeMask {
        match self {
            VertexAttribute::Position => AttributeMask::POSITION,
            VertexAttribute::Normal => AttributeMask::NORMAL,
            VertexAttribute::Color => AttributeMask::COLOR,
            VertexAttribute::Uv => AttributeMask::UV,
        }
    }

    pub fn shader_location(self) -> u32 {
        match self {
            VertexAttribute::Position => 0,
            VertexAttribute::Normal => 1,
            VertexAttribute::Color => 2,
            VertexAttribute::Uv => 3,
        }
    }
}

/// Primitive topology of a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topology {
    TriangleList,
    LineList,
}

/// Which faces the rasterizer discards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CullMode {
    None,
    Front,
    Back,
}

/// Rasterizer state bound for a pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterizerState {
    pub cull: CullMode,
    /// Constant depth bias in depth-buffer units.
    pub depth_bias: i32,
    /// Bias scaled by the polygon's depth slope.
    pub slope_scale_bias: f32,
}

impl RasterizerState {
    /// Back-face culled, no bias. Used for the color pass.
    pub const DEFAULT: Self = Self {
        cull: CullMode::Back,
        depth_bias: 0,
        slope_scale_bias: 0.0,
    };

    /// Front-face culled with slope-scaled bias. Rendering the back faces of
    /// casters into the shadow map keeps lit faces from shadowing themselves.
    pub fn shadow(depth_bias: i32, slope_scale_bias: f32) -> Self {
        Self {
            cull: CullMode::Front,
            depth_bias,
            slope_scale_bias,
        }
    }
}

impl Default for RasterizerState {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Viewport rectangle in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }

    pub fn aspect_ratio(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }
}

/// Which program stages run for a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramStages {
    /// Vertex and pixel stages.
    Full,
    /// Vertex stage only, writing depth. Used by the shadow pass.
    DepthOnly,
}

/// Uniform buffer binding points.
///
/// The slot layout is fixed across every program the engine creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformSlot {
    /// Per-mesh world + view/projection. Vertex stage.
    Transform,
    /// Shadow light view/projection. Vertex stage.
    Shadow,
    /// Material shading constants. Pixel stage.
    Material,
    /// Packed light records. Pixel stage.
    Lights,
}

/// Texture + sampler binding points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    /// Material diffuse texture.
    Material,
    /// Shadow map with a comparison sampler.
    ShadowMap,
}

/// Kind of buffer being created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    Vertex,
    Index,
    Uniform,
}

/// Sampler filtering/addressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplerDesc {
    /// Linear filtering, repeating addressing. Used for material textures.
    LinearWrap,
    /// Linear filtering, clamped addressing, `LessEqual` depth comparison.
    /// Used for percentage-closer shadow lookups.
    ShadowComparison,
}

/// Source and entry points of a program pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramDesc {
    pub label: String,
    pub source: Cow<'static, str>,
    pub vertex_entry: String,
    pub pixel_entry: String,
    pub attributes: AttributeMask,
}

/// Where a pass renders its color output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorTarget {
    /// The presentation surface, cleared to the given RGBA color.
    Backbuffer { clear: [f64; 4] },
}

/// Render pass description.
#[derive(Debug, Clone, PartialEq)]
pub struct PassDesc {
    pub label: &'static str,
    pub color: Option<ColorTarget>,
    pub depth: TextureHandle,
    /// Depth clear value; `None` loads existing contents.
    pub depth_clear: Option<f32>,
}

/// Narrow GPU contract consumed by the render core.
///
/// Creation calls return `Err` on failure; callers log and carry on without the
/// resource. Binding and draw calls never fail loudly: an implementation that cannot
/// honour one logs and skips it, so a frame always completes.
pub trait GpuDevice {
    /// Creates a buffer initialised with `contents`.
    fn create_buffer(
        &mut self,
        label: &str,
        kind: BufferKind,
        contents: &[u8],
    ) -> Result<BufferHandle, GpuError>;

    /// Replaces a buffer's contents (write-discard). Writes issued inside a pass are
    /// visible to draws in that pass that follow them.
    fn write_buffer(&mut self, buffer: BufferHandle, contents: &[u8]) -> Result<(), GpuError>;

    /// Compiles and links a program pair from pre-supplied source.
    fn create_program(&mut self, desc: &ProgramDesc) -> Result<ProgramHandle, GpuError>;

    /// Creates a sampled RGBA8 texture.
    fn create_texture_rgba8(
        &mut self,
        label: &str,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<TextureHandle, GpuError>;

    /// Creates a depth target that can later be sampled with a comparison sampler.
    fn create_depth_target(
        &mut self,
        label: &str,
        width: u32,
        height: u32,
    ) -> Result<TextureHandle, GpuError>;

    fn create_sampler(&mut self, label: &str, desc: SamplerDesc)
        -> Result<SamplerHandle, GpuError>;

    /// Size in pixels of the presentation surface.
    fn surface_size(&self) -> (u32, u32);

    /// Starts recording a frame.
    fn begin_frame(&mut self) -> Result<(), GpuError>;

    fn begin_pass(&mut self, pass: &PassDesc);
    fn end_pass(&mut self);

    fn set_rasterizer(&mut self, state: RasterizerState);
    fn set_viewport(&mut self, viewport: Viewport);
    fn bind_program(&mut self, program: ProgramHandle, stages: ProgramStages);
    fn bind_uniform(&mut self, slot: UniformSlot, buffer: BufferHandle);
    fn bind_texture(&mut self, slot: TextureSlot, texture: TextureHandle, sampler: SamplerHandle);
    fn bind_vertex_stream(&mut self, attribute: VertexAttribute, buffer: BufferHandle);
    fn bind_index_buffer(&mut self, buffer: BufferHandle);

    fn draw_indexed(&mut self, topology: Topology, index_count: u32);
    fn draw(&mut self, topology: Topology, vertex_count: u32);

    /// Submits the frame. `0` presents immediately, `N > 0` waits for vertical sync.
    fn present(&mut self, sync_interval: u32) -> Result<(), GpuError>;

    /// Polled once per clearing pass; `Some` once the device is gone for good.
    fn device_lost(&self) -> Option<String>;

    fn release_buffer(&mut self, buffer: BufferHandle);
    fn release_texture(&mut self, texture: TextureHandle);
    fn release_sampler(&mut self, sampler: SamplerHandle);
    fn release_program(&mut self, program: ProgramHandle);
}

/// A GPU resource whose owner was destroyed, waiting to be released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpuResource {
    Buffer(BufferHandle),
    Texture(TextureHandle),
    Sampler(SamplerHandle),
    Program(ProgramHandle),
}

impl GpuResource {
    pub fn release<D: GpuDevice + ?Sized>(self, device: &mut D) {
        match self {
            GpuResource::Buffer(handle) => device.release_buffer(handle),
            GpuResource::Texture(handle) => device.release_texture(handle),
            GpuResource::Sampler(handle) => device.release_sampler(handle),
            GpuResource::Program(handle) => device.release_program(handle),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_locations_follow_mask_order() {
        let locations: Vec<u32> = VertexAttribute::ALL
            .iter()
            .map(|attribute| attribute.shader_location())
            .collect();
        assert_eq!(locations, vec![0, 1, 2, 3]);

        let combined = VertexAttribute::ALL
            .iter()
            .fold(AttributeMask::empty(), |mask, attribute| mask | attribute.mask());
        assert_eq!(combined, AttributeMask::LIT);
    }

    #[test]
    fn test_shadow_rasterizer_culls_front_faces() {
        let state = RasterizerState::shadow(100, 1.5);
        assert_eq!(state.cull, CullMode::Front);
        assert_eq!(RasterizerState::default().cull, CullMode::Back);
    }
}
