//! GPU uniform block layouts
//!
//! Every block is `#[repr(C)]` and `Pod` so it can be uploaded with
//! `bytemuck::bytes_of`. Field order and padding match the WGSL structs in the
//! built-in shaders.

use bytemuck::{Pod, Zeroable};
use cgmath::{Matrix4, Vector3};

use crate::gfx::camera::convert_matrix4_to_array;

/// Maximum number of light records packed per frame.
pub const MAX_LIGHTS: usize = 8;

/// Per-mesh transform block, bound to the vertex stage.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct TransformUniform {
    pub world: [[f32; 4]; 4],
    pub view_proj: [[f32; 4]; 4],
    /// World-space position of the viewer, for specular highlights.
    pub eye: [f32; 4],
}

impl TransformUniform {
    pub fn new(world: Matrix4<f32>, view_proj: Matrix4<f32>, eye: Vector3<f32>) -> Self {
        Self {
            world: convert_matrix4_to_array(world),
            view_proj: convert_matrix4_to_array(view_proj),
            eye: [eye.x, eye.y, eye.z, 1.0],
        }
    }

    /// Translation column of the world matrix.
    pub fn world_translation(&self) -> [f32; 3] {
        let [x, y, z, _] = self.world[3];
        [x, y, z]
    }
}

/// Shadow light view/projection and lookup parameters.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ShadowUniform {
    pub light_view_proj: [[f32; 4]; 4],
    /// x: enabled (0/1), y: depth bias, z: texel size, w: debug view (0/1).
    pub params: [f32; 4],
}

impl ShadowUniform {
    pub fn enabled(light_view_proj: Matrix4<f32>, bias: f32, map_size: u32, debug: bool) -> Self {
        Self {
            light_view_proj: convert_matrix4_to_array(light_view_proj),
            params: [
                1.0,
                bias,
                1.0 / map_size.max(1) as f32,
                if debug { 1.0 } else { 0.0 },
            ],
        }
    }

    pub fn disabled() -> Self {
        Self::zeroed()
    }

    pub fn is_enabled(&self) -> bool {
        self.params[0] > 0.5
    }
}

/// Material shading constants, bound to the pixel stage.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct MaterialUniform {
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub shininess: f32,
    pub transparency: f32,
    pub _padding: [f32; 2],
}

/// One packed light.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct LightRecord {
    /// xyz position; w is 0 for directional, 1 for point lights.
    pub position: [f32; 4],
    /// Normalized forward axis of the light's rotation.
    pub direction: [f32; 4],
    /// RGB diffuse color; w is the falloff radius of a point light.
    pub diffuse: [f32; 4],
    /// RGB ambient; only the first light carries a non-zero value.
    pub ambient: [f32; 4],
}

impl LightRecord {
    pub fn is_directional(&self) -> bool {
        self.position[3] == 0.0
    }

    pub fn ambient_rgb(&self) -> [f32; 3] {
        [self.ambient[0], self.ambient[1], self.ambient[2]]
    }
}

/// Marks a light array without a shadow-casting record.
pub const NO_SHADOW_CASTER: u32 = u32::MAX;

/// Every light packed for the pixel stage.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct LightArrayUniform {
    /// x: number of valid records, y: index of the shadow caster or
    /// [`NO_SHADOW_CASTER`].
    pub count: [u32; 4],
    pub records: [LightRecord; MAX_LIGHTS],
}

impl LightArrayUniform {
    pub fn len(&self) -> usize {
        self.count[0] as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn active(&self) -> &[LightRecord] {
        &self.records[..self.len().min(MAX_LIGHTS)]
    }

    pub fn shadow_caster_index(&self) -> Option<usize> {
        (self.count[1] != NO_SHADOW_CASTER).then_some(self.count[1] as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{SquareMatrix, Zero};

    #[test]
    fn test_block_sizes_are_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<TransformUniform>(), 144);
        assert_eq!(std::mem::size_of::<ShadowUniform>(), 80);
        assert_eq!(std::mem::size_of::<MaterialUniform>(), 48);
        assert_eq!(std::mem::size_of::<LightRecord>(), 64);
        assert_eq!(std::mem::size_of::<LightArrayUniform>(), 16 + 64 * MAX_LIGHTS);
    }

    #[test]
    fn test_world_translation_reads_last_column() {
        let world = Matrix4::from_translation(Vector3::new(0.0, 0.0, 10.0));
        let uniform = TransformUniform::new(world, Matrix4::identity(), Vector3::zero());
        assert_eq!(uniform.world_translation(), [0.0, 0.0, 10.0]);
    }
}
