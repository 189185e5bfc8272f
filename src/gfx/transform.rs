//! Pose math shared by cameras, lights and meshes
//!
//! The engine uses a left-handed frame: +X right, +Y up, +Z forward. A
//! [`Transform`] holds position, rotation and non-uniform scale and derives its world
//! matrix (`T * R * S`) lazily; every mutator marks it dirty.

use cgmath::{
    Euler, InnerSpace, Matrix3, Matrix4, Quaternion, Rad, SquareMatrix, Vector3, Zero,
};

/// Frame a rotation or translation is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Space {
    /// About the entity's own, already rotated axes.
    Local,
    /// About the fixed world axes.
    World,
}

#[derive(Debug, Clone)]
pub struct Transform {
    position: Vector3<f32>,
    rotation: Quaternion<f32>,
    scale: Vector3<f32>,
    world: Matrix4<f32>,
    changed: bool,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform {
    pub fn new() -> Self {
        Self {
            position: Vector3::zero(),
            rotation: Quaternion::new(1.0, 0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
            world: Matrix4::identity(),
            changed: false,
        }
    }

    pub fn from_position(position: Vector3<f32>) -> Self {
        let mut transform = Self::new();
        transform.set_position(position);
        transform
    }

    pub fn position(&self) -> Vector3<f32> {
        self.position
    }

    pub fn rotation(&self) -> Quaternion<f32> {
        self.rotation
    }

    pub fn scale(&self) -> Vector3<f32> {
        self.scale
    }

    /// True when the cached world matrix is out of date.
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub fn set_position(&mut self, position: Vector3<f32>) {
        self.position = position;
        self.changed = true;
    }

    /// Moves by `delta`, expressed either along the entity's own axes or the world's.
    pub fn translate(&mut self, delta: Vector3<f32>, space: Space) {
        let offset = match space {
            Space::Local => self.rotation * delta,
            Space::World => delta,
        };
        self.set_position(self.position + offset);
    }

    pub fn set_rotation(&mut self, rotation: Quaternion<f32>) {
        self.rotation = rotation.normalize();
        self.changed = true;
    }

    /// Replaces the rotation with Euler angles in radians.
    pub fn set_rotation_euler(&mut self, x: f32, y: f32, z: f32) {
        self.set_rotation(Quaternion::from(Euler::new(Rad(x), Rad(y), Rad(z))));
    }

    /// Composes a rotation given as Euler angles in radians.
    ///
    /// `Local` applies the new rotation inside the current one, so it turns about the
    /// entity's own axes. `World` applies it outside, about the fixed world axes.
    pub fn rotate(&mut self, x: f32, y: f32, z: f32, space: Space) {
        let delta = Quaternion::from(Euler::new(Rad(x), Rad(y), Rad(z)));
        self.rotate_by(delta, space);
    }

    pub fn rotate_by(&mut self, delta: Quaternion<f32>, space: Space) {
        let rotation = match space {
            Space::Local => self.rotation * delta,
            Space::World => delta * self.rotation,
        };
        self.set_rotation(rotation);
    }

    pub fn set_scale(&mut self, scale: Vector3<f32>) {
        self.scale = scale;
        self.changed = true;
    }

    pub fn set_uniform_scale(&mut self, scale: f32) {
        self.set_scale(Vector3::new(scale, scale, scale));
    }

    /// Turns the entity so its forward axis points at `target`. Position and scale
    /// are untouched. Does nothing when `target` coincides with the position.
    pub fn look_at(&mut self, target: Vector3<f32>) {
        let to_target = target - self.position;
        if to_target.magnitude2() <= f32::EPSILON {
            return;
        }
        let forward = to_target.normalize();

        let mut up = Vector3::unit_y();
        if forward.cross(up).magnitude2() <= 1e-6 {
            up = Vector3::unit_z();
        }

        let right = up.cross(forward).normalize();
        let up = forward.cross(right);
        self.set_rotation(Quaternion::from(Matrix3::from_cols(right, up, forward)));
    }

    pub fn forward(&self) -> Vector3<f32> {
        self.rotation * Vector3::unit_z()
    }

    pub fn right(&self) -> Vector3<f32> {
        self.rotation * Vector3::unit_x()
    }

    pub fn up(&self) -> Vector3<f32> {
        self.rotation * Vector3::unit_y()
    }

    /// World matrix, recomputed only if a mutator ran since the last call.
    pub fn world_matrix(&mut self) -> Matrix4<f32> {
        if self.changed {
            self.world = self.compose();
            self.changed = false;
        }
        self.world
    }

    /// World matrix computed from the current pose without touching the cache.
    pub fn compose(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from(self.rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    /// Inverse of the rigid part of the pose. Scale is ignored so cameras and lights
    /// can share the transform type with meshes.
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::from(self.rotation.conjugate()) * Matrix4::from_translation(-self.position)
    }
}
