use super::{
    ownership::{ChildList, Owned},
    MaterialHandle, SurfaceHandle,
};
use crate::gfx::transform::Transform;
use crate::gpu::{BufferHandle, GpuResource};

/// A posed entity made of surfaces that share one material.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub name: String,
    pub transform: Transform,
    /// Whether this mesh takes part in [`SceneGraph::meshes_collide`](super::SceneGraph::meshes_collide).
    pub collision_enabled: bool,
    surfaces: Vec<SurfaceHandle>,
    material: Option<MaterialHandle>,
    transform_buffer: Option<BufferHandle>,
}

impl Mesh {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            transform: Transform::new(),
            collision_enabled: true,
            surfaces: Vec::new(),
            material: None,
            transform_buffer: None,
        }
    }

    pub fn surfaces(&self) -> &[SurfaceHandle] {
        &self.surfaces
    }

    pub fn material(&self) -> Option<MaterialHandle> {
        self.material
    }

    /// Uniform buffer the pipeline writes this mesh's transforms into.
    pub fn transform_buffer(&self) -> Option<BufferHandle> {
        self.transform_buffer
    }

    pub(crate) fn set_transform_buffer(&mut self, buffer: BufferHandle) {
        self.transform_buffer = Some(buffer);
    }

    pub(crate) fn take_gpu_resources(&mut self) -> Vec<GpuResource> {
        self.transform_buffer
            .take()
            .map(GpuResource::Buffer)
            .into_iter()
            .collect()
    }
}

impl ChildList<SurfaceHandle> for Mesh {
    fn children(&self) -> &[SurfaceHandle] {
        &self.surfaces
    }

    fn children_mut(&mut self) -> &mut Vec<SurfaceHandle> {
        &mut self.surfaces
    }
}

impl Owned<MaterialHandle> for Mesh {
    fn owner(&self) -> Option<MaterialHandle> {
        self.material
    }

    fn set_owner(&mut self, owner: Option<MaterialHandle>) {
        self.material = owner;
    }
}
