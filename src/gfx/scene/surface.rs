use cgmath::Vector3;

use super::{ownership::Owned, MeshHandle};
use crate::gpu::{BufferHandle, GpuResource, Topology, VertexAttribute};

/// How a surface's vertices are assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawMode {
    /// Indexed triangles.
    TriangleList,
    /// Non-indexed line pairs, used for debug wireframes.
    LineList,
}

impl DrawMode {
    pub fn topology(self) -> Topology {
        match self {
            DrawMode::TriangleList => Topology::TriangleList,
            DrawMode::LineList => Topology::LineList,
        }
    }
}

/// One vertex across all attribute streams.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
    pub uv: [f32; 2],
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            normal: [0.0; 3],
            color: [1.0; 4],
            uv: [0.0; 2],
        }
    }
}

impl Vertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
            ..Default::default()
        }
    }

    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }
}

/// GPU buffers holding an uploaded surface.
#[derive(Debug, Clone, Default)]
pub struct SurfaceBuffers {
    pub streams: [Option<BufferHandle>; 4],
    pub index: Option<BufferHandle>,
    pub vertex_count: u32,
    pub index_count: u32,
}

impl SurfaceBuffers {
    pub fn stream(&self, attribute: VertexAttribute) -> Option<BufferHandle> {
        self.streams[attribute.shader_location() as usize]
    }

    fn handles(&self) -> impl Iterator<Item = BufferHandle> + '_ {
        self.streams.iter().flatten().chain(self.index.iter()).copied()
    }
}

/// Smallest drawable unit: parallel vertex attribute arrays plus an index list.
///
/// The attribute arrays always have the same length. Writing vertex `i` past the end
/// grows every array to `i + 1`, filling the gap with default attributes. GPU
/// buffers are created by the render pipeline once the surface is finalized, and
/// recreated whenever it is written to afterwards.
#[derive(Debug, Clone)]
pub struct Surface {
    pub label: String,
    draw_mode: DrawMode,
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    colors: Vec<[f32; 4]>,
    uvs: Vec<[f32; 2]>,
    indices: Vec<u32>,
    mesh: Option<MeshHandle>,
    finalized: bool,
    dirty: bool,
    buffers: SurfaceBuffers,
}

impl Surface {
    pub fn new(label: &str, draw_mode: DrawMode) -> Self {
        Self {
            label: label.to_string(),
            draw_mode,
            positions: Vec::new(),
            normals: Vec::new(),
            colors: Vec::new(),
            uvs: Vec::new(),
            indices: Vec::new(),
            mesh: None,
            finalized: false,
            dirty: false,
            buffers: SurfaceBuffers::default(),
        }
    }

    pub fn draw_mode(&self) -> DrawMode {
        self.draw_mode
    }

    pub fn mesh(&self) -> Option<MeshHandle> {
        self.mesh
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn normals(&self) -> &[[f32; 3]] {
        &self.normals
    }

    pub fn colors(&self) -> &[[f32; 4]] {
        &self.colors
    }

    pub fn uvs(&self) -> &[[f32; 2]] {
        &self.uvs
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn position(&self, index: usize) -> Option<[f32; 3]> {
        self.positions.get(index).copied()
    }

    pub fn normal(&self, index: usize) -> Option<[f32; 3]> {
        self.normals.get(index).copied()
    }

    pub fn color(&self, index: usize) -> Option<[f32; 4]> {
        self.colors.get(index).copied()
    }

    pub fn uv(&self, index: usize) -> Option<[f32; 2]> {
        self.uvs.get(index).copied()
    }

    pub fn vertex(&self, index: usize) -> Option<Vertex> {
        Some(Vertex {
            position: self.position(index)?,
            normal: self.normal(index)?,
            color: self.color(index)?,
            uv: self.uv(index)?,
        })
    }

    pub fn set_position(&mut self, index: usize, position: [f32; 3]) {
        self.grow_to(index);
        self.positions[index] = position;
    }

    pub fn set_normal(&mut self, index: usize, normal: [f32; 3]) {
        self.grow_to(index);
        self.normals[index] = normal;
    }

    pub fn set_color(&mut self, index: usize, color: [f32; 4]) {
        self.grow_to(index);
        self.colors[index] = color;
    }

    pub fn set_uv(&mut self, index: usize, uv: [f32; 2]) {
        self.grow_to(index);
        self.uvs[index] = uv;
    }

    pub fn set_vertex(&mut self, index: usize, vertex: Vertex) {
        self.grow_to(index);
        self.positions[index] = vertex.position;
        self.normals[index] = vertex.normal;
        self.colors[index] = vertex.color;
        self.uvs[index] = vertex.uv;
    }

    /// Appends a vertex and returns its index.
    pub fn push_vertex(&mut self, vertex: Vertex) -> u32 {
        let index = self.positions.len();
        self.set_vertex(index, vertex);
        index as u32
    }

    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
        self.mark_dirty();
    }

    pub fn set_indices(&mut self, indices: Vec<u32>) {
        self.indices = indices;
        self.mark_dirty();
    }

    /// Paints every vertex with one color.
    pub fn fill_color(&mut self, color: [f32; 4]) {
        self.colors.iter_mut().for_each(|c| *c = color);
        self.mark_dirty();
    }

    /// Marks the attribute arrays complete so the pipeline may upload them.
    pub fn finalize(&mut self) {
        self.finalized = true;
        self.dirty = true;
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// True when a finalized surface has contents the GPU has not seen yet.
    pub fn needs_upload(&self) -> bool {
        self.finalized && self.dirty
    }

    /// Axis-aligned local extents as (min, max); `None` for an empty surface.
    pub fn extents(&self) -> Option<(Vector3<f32>, Vector3<f32>)> {
        let mut points = self.positions.iter().map(|p| Vector3::from(*p));
        let first = points.next()?;
        Some(points.fold((first, first), |(min, max), p| {
            (
                Vector3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z)),
                Vector3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z)),
            )
        }))
    }

    pub fn buffers(&self) -> &SurfaceBuffers {
        &self.buffers
    }

    /// Installs freshly uploaded buffers and returns the ones they replace.
    pub(crate) fn replace_buffers(&mut self, buffers: SurfaceBuffers) -> Vec<GpuResource> {
        let old = std::mem::replace(&mut self.buffers, buffers);
        self.dirty = false;
        old.handles().map(GpuResource::Buffer).collect()
    }

    pub(crate) fn take_gpu_resources(&mut self) -> Vec<GpuResource> {
        std::mem::take(&mut self.buffers)
            .handles()
            .map(GpuResource::Buffer)
            .collect::<Vec<_>>()
    }

    fn grow_to(&mut self, index: usize) {
        if index >= self.positions.len() {
            let len = index + 1;
            let fill = Vertex::default();
            self.positions.resize(len, fill.position);
            self.normals.resize(len, fill.normal);
            self.colors.resize(len, fill.color);
            self.uvs.resize(len, fill.uv);
        }
        self.mark_dirty();
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}

impl Owned<MeshHandle> for Surface {
    fn owner(&self) -> Option<MeshHandle> {
        self.mesh
    }

    fn set_owner(&mut self, owner: Option<MeshHandle>) {
        self.mesh = owner;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read_vertex_position() {
        let mut surface = Surface::new("quad", DrawMode::TriangleList);
        surface.set_position(3, [1.0, 2.0, 3.0]);

        assert_eq!(surface.position(3), Some([1.0, 2.0, 3.0]));
        assert_eq!(surface.vertex_count(), 4);
        assert_eq!(surface.normals().len(), 4);
        assert_eq!(surface.colors().len(), 4);
        assert_eq!(surface.uvs().len(), 4);
    }

    #[test]
    fn test_latest_write_wins() {
        let mut surface = Surface::new("quad", DrawMode::TriangleList);
        surface.set_position(0, [1.0, 0.0, 0.0]);
        surface.set_position(0, [0.0, 5.0, 0.0]);

        assert_eq!(surface.position(0), Some([0.0, 5.0, 0.0]));
        assert_eq!(surface.vertex_count(), 1);
    }

    #[test]
    fn test_writes_after_finalize_request_upload() {
        let mut surface = Surface::new("tri", DrawMode::TriangleList);
        surface.push_vertex(Vertex::default());
        assert!(!surface.needs_upload());

        surface.finalize();
        assert!(surface.needs_upload());

        surface.replace_buffers(SurfaceBuffers::default());
        assert!(!surface.needs_upload());

        surface.set_uv(0, [0.5, 0.5]);
        assert!(surface.needs_upload());
    }

    #[test]
    fn test_extents() {
        let mut surface = Surface::new("line", DrawMode::LineList);
        assert!(surface.extents().is_none());

        surface.set_position(0, [-1.0, 2.0, 0.0]);
        surface.set_position(1, [3.0, -2.0, 1.0]);
        let (min, max) = surface.extents().unwrap();
        assert_eq!(min, Vector3::new(-1.0, -2.0, 0.0));
        assert_eq!(max, Vector3::new(3.0, 2.0, 1.0));
    }
}
