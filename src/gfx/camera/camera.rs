use cgmath::{Deg, Matrix4, Rad, Vector3};

use super::camera_utils::{calculate_cartesian_eye_position, perspective_lh};
use crate::gfx::transform::Transform;
use crate::gpu::Viewport;

/// A viewpoint the color pass renders from.
///
/// Cameras are created and owned by the [`SceneGraph`](crate::gfx::scene::SceneGraph)
/// and selected for rendering with `bind_camera`.
#[derive(Debug, Clone)]
pub struct Camera {
    pub transform: Transform,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
    pub viewport: Viewport,
}

impl Camera {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            transform: Transform::new(),
            fovy: Deg(60.0).into(),
            znear: 0.1,
            zfar: 1000.0,
            viewport,
        }
    }

    pub fn with_fov(mut self, fovy: impl Into<Rad<f32>>) -> Self {
        self.fovy = fovy.into();
        self
    }

    pub fn with_clip_planes(mut self, znear: f32, zfar: f32) -> Self {
        self.znear = znear;
        self.zfar = zfar;
        self
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Matches the viewport to a resized surface.
    pub fn resize_projection(&mut self, width: u32, height: u32) {
        self.viewport.width = width.max(1) as f32;
        self.viewport.height = height.max(1) as f32;
    }

    /// Places the camera on a sphere around `target` and aims it there.
    pub fn set_orbit(&mut self, target: Vector3<f32>, pitch: f32, yaw: f32, distance: f32) {
        let eye = calculate_cartesian_eye_position(pitch, yaw, distance, target);
        self.transform.set_position(eye);
        self.transform.look_at(target);
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        self.transform.view_matrix()
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        perspective_lh(
            self.fovy,
            self.viewport.aspect_ratio(),
            self.znear,
            self.zfar,
        )
    }

    pub fn view_projection_matrix(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Vector4, Zero};

    #[test]
    fn test_point_in_front_projects_inside_clip_volume() {
        let camera = Camera::new(Viewport::new(800.0, 600.0));
        let clip = camera.view_projection_matrix() * Vector4::new(0.0, 0.0, 10.0, 1.0);
        let ndc = clip.truncate() / clip.w;

        assert!(clip.w > 0.0);
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn test_orbit_looks_at_target() {
        let mut camera = Camera::new(Viewport::new(800.0, 600.0));
        let target = Vector3::new(0.0, 1.0, 0.0);
        camera.set_orbit(target, 0.3, 1.0, 8.0);

        let to_target = (target - camera.transform.position()).normalize();
        assert!((camera.transform.forward() - to_target).magnitude() < 1e-4);
        assert!(((camera.transform.position() - target).magnitude() - 8.0).abs() < 1e-4);
    }

    #[test]
    fn test_resize_updates_aspect() {
        let mut camera = Camera::new(Viewport::new(800.0, 600.0));
        camera.resize_projection(1000, 500);
        assert_eq!(camera.viewport.aspect_ratio(), 2.0);

        camera.resize_projection(0, 0);
        assert_eq!(camera.viewport.width, 1.0);
        assert!(camera.transform.position() == Vector3::zero());
    }
}
