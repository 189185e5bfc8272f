// src/wgpu_utils/binding_types.rs
//! WGPU binding type utilities

pub fn uniform() -> wgpu::BindingType {
    wgpu::BindingType::Buffer {
        ty: wgpu::BufferBindingType::Uniform,
        has_dynamic_offset: false,
        min_binding_size: None,
    }
}

pub fn sampler(filtering: wgpu::SamplerBindingType) -> wgpu::BindingType {
    wgpu::BindingType::Sampler(filtering)
}

pub fn texture_2d() -> wgpu::BindingType {
    wgpu::BindingType::Texture {
        sample_type: wgpu::TextureSampleType::Float { filterable: true },
        view_dimension: wgpu::TextureViewDimension::D2,
        multisampled: false,
    }
}

pub fn depth_texture_2d() -> wgpu::BindingType {
    wgpu::BindingType::Texture {
        sample_type: wgpu::TextureSampleType::Depth,
        view_dimension: wgpu::TextureViewDimension::D2,
        multisampled: false,
    }
}

pub fn entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    ty: wgpu::BindingType,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty,
        count: None,
    }
}

/// The four bind group layouts shared by every program.
///
/// | group | contents                                         | stage    |
/// |-------|--------------------------------------------------|----------|
/// | 0     | transform uniform                                | vertex   |
/// | 1     | shadow uniform                                   | vertex   |
/// | 2     | material uniform, texture, sampler               | fragment |
/// | 3     | shadow map, comparison sampler, light array      | fragment |
pub struct BindGroupLayouts {
    pub transform: wgpu::BindGroupLayout,
    pub shadow: wgpu::BindGroupLayout,
    pub material: wgpu::BindGroupLayout,
    pub lighting: wgpu::BindGroupLayout,
}

impl BindGroupLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let vertex = wgpu::ShaderStages::VERTEX;
        let fragment = wgpu::ShaderStages::FRAGMENT;

        let transform = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Transform Layout"),
            entries: &[entry(0, vertex, uniform())],
        });
        let shadow = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Shadow Layout"),
            entries: &[entry(0, vertex, uniform())],
        });
        let material = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Material Layout"),
            entries: &[
                entry(0, fragment, uniform()),
                entry(1, fragment, texture_2d()),
                entry(2, fragment, sampler(wgpu::SamplerBindingType::Filtering)),
            ],
        });
        let lighting = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Lighting Layout"),
            entries: &[
                entry(0, fragment, depth_texture_2d()),
                entry(1, fragment, sampler(wgpu::SamplerBindingType::Comparison)),
                entry(2, fragment, uniform()),
            ],
        });

        Self {
            transform,
            shadow,
            material,
            lighting,
        }
    }

    /// Layout of bind group `index`, in group order.
    pub fn group(&self, index: usize) -> Option<&wgpu::BindGroupLayout> {
        match index {
            0 => Some(&self.transform),
            1 => Some(&self.shadow),
            2 => Some(&self.material),
            3 => Some(&self.lighting),
            _ => None,
        }
    }
}
