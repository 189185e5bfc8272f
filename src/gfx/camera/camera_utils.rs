use cgmath::{Matrix4, Rad, Vector3};

/// Left-handed perspective projection mapping view depth `near..far` to `0..1`.
pub fn perspective_lh(fovy: Rad<f32>, aspect: f32, near: f32, far: f32) -> Matrix4<f32> {
    let y_scale = 1.0 / (fovy.0 * 0.5).tan();
    let x_scale = y_scale / aspect.max(f32::EPSILON);
    let depth = far / (far - near);

    #[rustfmt::skip]
    let projection = Matrix4::new(
        x_scale, 0.0,     0.0,           0.0,
        0.0,     y_scale, 0.0,           0.0,
        0.0,     0.0,     depth,         1.0,
        0.0,     0.0,     -near * depth, 0.0,
    );
    projection
}

pub fn convert_matrix4_to_array(matrix4: Matrix4<f32>) -> [[f32; 4]; 4] {
    matrix4.into()
}

/// Eye position on a sphere of radius `distance` around `target`.
pub fn calculate_cartesian_eye_position(
    pitch: f32,
    yaw: f32,
    distance: f32,
    target: Vector3<f32>,
) -> Vector3<f32> {
    Vector3::new(
        distance * yaw.sin() * pitch.cos(),
        distance * pitch.sin(),
        distance * yaw.cos() * pitch.cos(),
    ) + target
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Deg, Vector4};

    #[test]
    fn test_perspective_maps_near_and_far_to_unit_depth() {
        let projection = perspective_lh(Deg(60.0).into(), 1.5, 0.5, 100.0);

        let near = projection * Vector4::new(0.0, 0.0, 0.5, 1.0);
        let far = projection * Vector4::new(0.0, 0.0, 100.0, 1.0);

        assert!((near.z / near.w).abs() < 1e-5);
        assert!((far.z / far.w - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_points_behind_eye_have_negative_w() {
        let projection = perspective_lh(Deg(60.0).into(), 1.0, 0.1, 10.0);
        let behind = projection * Vector4::new(0.0, 0.0, -1.0, 1.0);
        assert!(behind.w < 0.0);
    }
}
