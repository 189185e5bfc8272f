use super::{
    ownership::{ChildList, Owned},
    MeshHandle, ShaderHandle,
};
use crate::gfx::resources::{DecodedImage, MaterialUniform};
use crate::gpu::{BufferHandle, GpuResource, SamplerHandle, TextureHandle};

/// Shading constants pushed once per material per color pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialConstants {
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub shininess: f32,
    /// 0 is opaque.
    pub transparency: f32,
}

impl Default for MaterialConstants {
    fn default() -> Self {
        Self {
            diffuse: [1.0, 1.0, 1.0, 1.0],
            specular: [0.5, 0.5, 0.5, 1.0],
            shininess: 32.0,
            transparency: 0.0,
        }
    }
}

impl MaterialConstants {
    pub fn to_uniform(&self) -> MaterialUniform {
        MaterialUniform {
            diffuse: self.diffuse,
            specular: self.specular,
            shininess: self.shininess,
            transparency: self.transparency,
            _padding: [0.0; 2],
        }
    }
}

/// Texture and sampler a material samples from.
///
/// A newly assigned image stays pending until the pipeline uploads it.
#[derive(Debug, Clone, Default)]
pub struct TextureBinding {
    pending: Option<DecodedImage>,
    texture: Option<TextureHandle>,
    sampler: Option<SamplerHandle>,
}

impl TextureBinding {
    pub fn texture(&self) -> Option<TextureHandle> {
        self.texture
    }

    pub fn sampler(&self) -> Option<SamplerHandle> {
        self.sampler
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub(crate) fn take_pending(&mut self) -> Option<DecodedImage> {
        self.pending.take()
    }

    /// Installs an uploaded texture and returns the one it replaces.
    pub(crate) fn set_texture(&mut self, texture: TextureHandle) -> Option<TextureHandle> {
        self.texture.replace(texture)
    }

    pub(crate) fn set_sampler(&mut self, sampler: SamplerHandle) {
        self.sampler = Some(sampler);
    }
}

/// Reusable shading parameters plus a texture, drawn by one shader.
#[derive(Debug, Clone)]
pub struct Material {
    pub label: String,
    pub constants: MaterialConstants,
    pub casts_shadows: bool,
    texture: TextureBinding,
    shader: Option<ShaderHandle>,
    meshes: Vec<MeshHandle>,
    uniform_buffer: Option<BufferHandle>,
}

impl Material {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            constants: MaterialConstants::default(),
            casts_shadows: true,
            texture: TextureBinding::default(),
            shader: None,
            meshes: Vec::new(),
            uniform_buffer: None,
        }
    }

    pub fn shader(&self) -> Option<ShaderHandle> {
        self.shader
    }

    pub fn meshes(&self) -> &[MeshHandle] {
        &self.meshes
    }

    /// Queues `image` for upload, replacing the current texture on the next frame.
    pub fn set_texture_image(&mut self, image: DecodedImage) {
        self.texture.pending = Some(image);
    }

    pub fn texture(&self) -> &TextureBinding {
        &self.texture
    }

    pub(crate) fn texture_mut(&mut self) -> &mut TextureBinding {
        &mut self.texture
    }

    pub fn uniform_buffer(&self) -> Option<BufferHandle> {
        self.uniform_buffer
    }

    pub(crate) fn set_uniform_buffer(&mut self, buffer: BufferHandle) {
        self.uniform_buffer = Some(buffer);
    }

    pub(crate) fn take_gpu_resources(&mut self) -> Vec<GpuResource> {
        let mut resources = Vec::new();
        if let Some(buffer) = self.uniform_buffer.take() {
            resources.push(GpuResource::Buffer(buffer));
        }
        if let Some(texture) = self.texture.texture.take() {
            resources.push(GpuResource::Texture(texture));
        }
        if let Some(sampler) = self.texture.sampler.take() {
            resources.push(GpuResource::Sampler(sampler));
        }
        resources
    }
}

impl ChildList<MeshHandle> for Material {
    fn children(&self) -> &[MeshHandle] {
        &self.meshes
    }

    fn children_mut(&mut self) -> &mut Vec<MeshHandle> {
        &mut self.meshes
    }
}

impl Owned<ShaderHandle> for Material {
    fn owner(&self) -> Option<ShaderHandle> {
        self.shader
    }

    fn set_owner(&mut self, owner: Option<ShaderHandle>) {
        self.shader = owner;
    }
}
