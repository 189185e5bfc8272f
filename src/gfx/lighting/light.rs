use cgmath::{Deg, Matrix4, Rad};

use crate::gfx::camera::perspective_lh;
use crate::gfx::resources::LightRecord;
use crate::gfx::transform::Transform;

/// Directional or point emitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    /// Parallel rays along the light's forward axis.
    Directional,
    /// Omnidirectional from the light's position, fading out at `radius`.
    /// A radius of zero disables falloff.
    Point { radius: f32 },
}

/// A posed light source.
///
/// The direction of the light is always its transform's forward axis. When a light
/// casts shadows it is treated as a secondary camera with field of view `fov`.
#[derive(Debug, Clone)]
pub struct Light {
    pub transform: Transform,
    pub kind: LightKind,
    pub diffuse: [f32; 3],
    pub fov: Rad<f32>,
    record: LightRecord,
}

impl Light {
    pub fn new(kind: LightKind, diffuse: [f32; 3]) -> Self {
        let mut light = Self {
            transform: Transform::new(),
            kind,
            diffuse,
            fov: Deg(90.0).into(),
            record: LightRecord {
                position: [0.0; 4],
                direction: [0.0; 4],
                diffuse: [0.0; 4],
                ambient: [0.0; 4],
            },
        };
        light.pack([0.0; 3]);
        light
    }

    pub fn directional(diffuse: [f32; 3]) -> Self {
        Self::new(LightKind::Directional, diffuse)
    }

    pub fn point(diffuse: [f32; 3], radius: f32) -> Self {
        Self::new(LightKind::Point { radius }, diffuse)
    }

    pub fn with_fov(mut self, fov: impl Into<Rad<f32>>) -> Self {
        self.fov = fov.into();
        self
    }

    pub fn is_directional(&self) -> bool {
        matches!(self.kind, LightKind::Directional)
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        self.transform.view_matrix()
    }

    pub fn projection_matrix(&self, near: f32, far: f32) -> Matrix4<f32> {
        perspective_lh(self.fov, 1.0, near, far)
    }

    /// View/projection used to render and sample the shadow map.
    pub fn view_projection(&self, near: f32, far: f32) -> Matrix4<f32> {
        self.projection_matrix(near, far) * self.view_matrix()
    }

    /// Record from the last repack.
    pub fn record(&self) -> &LightRecord {
        &self.record
    }

    /// Refreshes the record from the live transform.
    pub(crate) fn pack(&mut self, ambient: [f32; 3]) -> LightRecord {
        let position = self.transform.position();
        let direction = self.transform.forward();
        let (w, radius) = match self.kind {
            LightKind::Directional => (0.0, 0.0),
            LightKind::Point { radius } => (1.0, radius),
        };
        let [r, g, b] = self.diffuse;

        self.record = LightRecord {
            position: [position.x, position.y, position.z, w],
            direction: [direction.x, direction.y, direction.z, 0.0],
            diffuse: [r, g, b, radius],
            ambient: [ambient[0], ambient[1], ambient[2], 0.0],
        };
        self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::transform::Space;
    use cgmath::{Vector3, Vector4};
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_record_follows_transform() {
        let mut light = Light::point([1.0, 0.5, 0.25], 20.0);
        light.transform.set_position(Vector3::new(1.0, 2.0, 3.0));
        light.transform.rotate(0.0, FRAC_PI_2, 0.0, Space::World);

        let record = light.pack([0.1, 0.1, 0.1]);

        assert_eq!(record.position, [1.0, 2.0, 3.0, 1.0]);
        assert!((record.direction[0] - 1.0).abs() < 1e-5);
        assert!(record.direction[2].abs() < 1e-5);
        assert_eq!(record.diffuse, [1.0, 0.5, 0.25, 20.0]);
        assert_eq!(light.record().ambient_rgb(), [0.1, 0.1, 0.1]);
    }

    #[test]
    fn test_directional_record_has_zero_w() {
        let mut light = Light::directional([1.0; 3]);
        assert!(light.pack([0.0; 3]).is_directional());
    }

    #[test]
    fn test_light_sees_along_forward() {
        let mut light = Light::directional([1.0; 3]);
        light.transform.set_position(Vector3::new(0.0, 10.0, 0.0));
        light.transform.look_at(Vector3::new(0.0, 0.0, 0.0));

        let clip = light.view_projection(0.5, 50.0) * Vector4::new(0.0, 0.0, 0.0, 1.0);
        let ndc_z = clip.z / clip.w;
        assert!(clip.w > 0.0);
        assert!(ndc_z > 0.0 && ndc_z < 1.0);
    }
}
