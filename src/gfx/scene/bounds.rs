use cgmath::{InnerSpace, Vector3};

use crate::gfx::transform::Transform;

/// Oriented bounding box in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obb {
    pub center: Vector3<f32>,
    /// Unit axes of the box, in world space.
    pub axes: [Vector3<f32>; 3],
    /// Half size along each of `axes`.
    pub half_extents: Vector3<f32>,
}

impl Obb {
    /// Box around local extents `min..max`, placed by `transform`.
    pub fn from_extents(min: Vector3<f32>, max: Vector3<f32>, transform: &Transform) -> Self {
        let local_center = (min + max) * 0.5;
        let local_half = (max - min) * 0.5;
        let scale = transform.scale();
        let rotation = transform.rotation();

        let center = transform.compose() * local_center.extend(1.0);

        Self {
            center: center.truncate(),
            axes: [
                rotation * Vector3::unit_x(),
                rotation * Vector3::unit_y(),
                rotation * Vector3::unit_z(),
            ],
            half_extents: Vector3::new(
                (local_half.x * scale.x).abs(),
                (local_half.y * scale.y).abs(),
                (local_half.z * scale.z).abs(),
            ),
        }
    }

    /// The eight corners; bit 0/1/2 of the index picks the +/- side of each axis.
    pub fn corners(&self) -> [Vector3<f32>; 8] {
        let mut corners = [self.center; 8];
        for (i, corner) in corners.iter_mut().enumerate() {
            for axis in 0..3 {
                let sign = if i & (1 << axis) != 0 { 1.0 } else { -1.0 };
                *corner += self.axes[axis] * (self.half_extents[axis] * sign);
            }
        }
        corners
    }

    /// Separating-axis overlap test against another box.
    ///
    /// Tests the 3 face axes of each box and the 9 edge-edge cross products.
    /// Touching boxes count as overlapping.
    pub fn intersects(&self, other: &Obb) -> bool {
        const EPSILON: f32 = 1e-6;

        let offset = other.center - self.center;

        let separated_on = |axis: Vector3<f32>| -> bool {
            let length_sq = axis.magnitude2();
            if length_sq < EPSILON {
                // parallel edges; covered by the face axes
                return false;
            }
            let axis = axis / length_sq.sqrt();
            let distance = offset.dot(axis).abs();
            distance > self.radius_along(axis) + other.radius_along(axis)
        };

        for axis in self.axes.iter().chain(other.axes.iter()) {
            if separated_on(*axis) {
                return false;
            }
        }

        for a in &self.axes {
            for b in &other.axes {
                if separated_on(a.cross(*b)) {
                    return false;
                }
            }
        }

        true
    }

    fn radius_along(&self, axis: Vector3<f32>) -> f32 {
        (0..3)
            .map(|i| self.half_extents[i] * self.axes[i].dot(axis).abs())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::transform::Space;
    use std::f32::consts::FRAC_PI_4;

    fn unit_box_at(position: Vector3<f32>) -> Obb {
        let transform = Transform::from_position(position);
        Obb::from_extents(
            Vector3::new(-0.5, -0.5, -0.5),
            Vector3::new(0.5, 0.5, 0.5),
            &transform,
        )
    }

    #[test]
    fn test_overlapping_and_separated_boxes() {
        let a = unit_box_at(Vector3::new(0.0, 0.0, 0.0));
        let b = unit_box_at(Vector3::new(0.9, 0.0, 0.0));
        let c = unit_box_at(Vector3::new(1.1, 0.0, 0.0));

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_rotation_reaches_further_along_diagonal() {
        let a = unit_box_at(Vector3::new(0.0, 0.0, 0.0));

        let mut transform = Transform::from_position(Vector3::new(1.15, 0.0, 0.0));
        let b_axis_aligned = Obb::from_extents(
            Vector3::new(-0.5, -0.5, -0.5),
            Vector3::new(0.5, 0.5, 0.5),
            &transform,
        );
        assert!(!a.intersects(&b_axis_aligned));

        // a 45 degree yaw pushes a corner out to ~0.707 from the center
        transform.rotate(0.0, FRAC_PI_4, 0.0, Space::World);
        let b_rotated = Obb::from_extents(
            Vector3::new(-0.5, -0.5, -0.5),
            Vector3::new(0.5, 0.5, 0.5),
            &transform,
        );
        assert!(a.intersects(&b_rotated));
    }

    #[test]
    fn test_scale_and_offset_extents() {
        let mut transform = Transform::from_position(Vector3::new(1.0, 0.0, 0.0));
        transform.set_scale(Vector3::new(2.0, 1.0, 1.0));
        let obb = Obb::from_extents(
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 1.0),
            &transform,
        );

        assert!((obb.center - Vector3::new(2.0, 0.5, 0.5)).magnitude() < 1e-5);
        assert_eq!(obb.half_extents, Vector3::new(1.0, 0.5, 0.5));
        assert_eq!(obb.corners()[0], Vector3::new(1.0, 0.0, 0.0));
    }
}
