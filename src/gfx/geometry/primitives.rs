//! # Primitive Shape Generation
//!
//! Builds finalized surfaces for common shapes. Triangles are wound clockwise when
//! seen from outside, the front-face convention of the left-handed engine frame.

use std::f32::consts::PI;

use cgmath::{InnerSpace, Vector3};

use crate::gfx::scene::{DrawMode, Obb, Surface, Vertex};

/// Unit cube centered at the origin, 4 vertices per face.
pub fn generate_cube() -> Surface {
    let mut surface = Surface::new("cube", DrawMode::TriangleList);

    let faces = [
        (Vector3::unit_x(), Vector3::unit_y()),
        (-Vector3::unit_x(), Vector3::unit_y()),
        (Vector3::unit_y(), Vector3::unit_z()),
        (-Vector3::unit_y(), -Vector3::unit_z()),
        (Vector3::unit_z(), Vector3::unit_y()),
        (-Vector3::unit_z(), Vector3::unit_y()),
    ];

    for (normal, up) in faces {
        // screen-right when looking at the face from outside
        let right = normal.cross(up);
        let center = normal * 0.5;
        let corner = |r: f32, u: f32| center + right * (0.5 * r) + up * (0.5 * u);

        let base = surface.vertex_count() as u32;
        let quad = [
            (corner(-1.0, 1.0), [0.0, 0.0]),
            (corner(1.0, 1.0), [1.0, 0.0]),
            (corner(1.0, -1.0), [1.0, 1.0]),
            (corner(-1.0, -1.0), [0.0, 1.0]),
        ];
        for (position, uv) in quad {
            surface.push_vertex(Vertex::new(position.into(), normal.into(), uv));
        }
        surface.push_triangle(base, base + 1, base + 2);
        surface.push_triangle(base + 2, base + 3, base);
    }

    surface.finalize();
    surface
}

/// UV sphere of radius 1 centered at the origin.
///
/// # Arguments
/// * `longitude_segments` - Number of vertical segments (at least 3)
/// * `latitude_segments` - Number of horizontal rings (at least 2)
pub fn generate_sphere(longitude_segments: u32, latitude_segments: u32) -> Surface {
    let mut surface = Surface::new("sphere", DrawMode::TriangleList);

    let long_segs = longitude_segments.max(3);
    let lat_segs = latitude_segments.max(2);

    for lat in 0..=lat_segs {
        let theta = lat as f32 * PI / lat_segs as f32;
        let (sin_theta, cos_theta) = theta.sin_cos();

        for long in 0..=long_segs {
            let phi = long as f32 * 2.0 * PI / long_segs as f32;
            let (sin_phi, cos_phi) = phi.sin_cos();

            let point = [sin_theta * cos_phi, cos_theta, sin_theta * sin_phi];
            let uv = [
                long as f32 / long_segs as f32,
                lat as f32 / lat_segs as f32,
            ];
            surface.push_vertex(Vertex::new(point, point, uv));
        }
    }

    for lat in 0..lat_segs {
        for long in 0..long_segs {
            let first = lat * (long_segs + 1) + long;
            let second = first + long_segs + 1;

            push_outward(&mut surface, first, second, first + 1);
            push_outward(&mut surface, second, second + 1, first + 1);
        }
    }

    surface.finalize();
    surface
}

/// Horizontal plane on XZ facing +Y, centered at the origin.
pub fn generate_plane(width: f32, depth: f32, width_segments: u32, depth_segments: u32) -> Surface {
    let mut surface = Surface::new("plane", DrawMode::TriangleList);

    let w_segs = width_segments.max(1);
    let d_segs = depth_segments.max(1);

    for z in 0..=d_segs {
        let v = z as f32 / d_segs as f32;
        for x in 0..=w_segs {
            let u = x as f32 / w_segs as f32;
            surface.push_vertex(Vertex::new(
                [(u - 0.5) * width, 0.0, (0.5 - v) * depth],
                [0.0, 1.0, 0.0],
                [u, v],
            ));
        }
    }

    for z in 0..d_segs {
        for x in 0..w_segs {
            let i = z * (w_segs + 1) + x;
            let next_row = i + w_segs + 1;

            push_outward(&mut surface, i, i + 1, next_row);
            push_outward(&mut surface, next_row, i + 1, next_row + 1);
        }
    }

    surface.finalize();
    surface
}

/// Line-list outline of a box: 12 edges, 24 vertices.
pub fn wire_box(obb: &Obb, color: [f32; 4]) -> Surface {
    let mut surface = Surface::new("wire box", DrawMode::LineList);
    let corners = obb.corners();

    // corners differing in exactly one axis bit share an edge
    for a in 0..8usize {
        for axis in 0..3 {
            let b = a | (1 << axis);
            if b != a {
                for corner in [corners[a], corners[b]] {
                    surface.push_vertex(
                        Vertex::new(corner.into(), [0.0; 3], [0.0; 2]).with_color(color),
                    );
                }
            }
        }
    }

    surface.finalize();
    surface
}

/// Wire box around local `min..max` extents with an identity pose.
pub fn wire_box_from_extents(min: Vector3<f32>, max: Vector3<f32>, color: [f32; 4]) -> Surface {
    let obb = Obb::from_extents(min, max, &Default::default());
    wire_box(&obb, color)
}

/// Pushes triangle `a b c`, flipping it if needed so its winding faces along the
/// averaged vertex normal.
fn push_outward(surface: &mut Surface, a: u32, b: u32, c: u32) {
    let pos = |i: u32| Vector3::from(surface.positions()[i as usize]);
    let nrm = |i: u32| Vector3::from(surface.normals()[i as usize]);

    let face = (pos(b) - pos(a)).cross(pos(c) - pos(a));
    if face.dot(nrm(a) + nrm(b) + nrm(c)) < 0.0 {
        surface.push_triangle(a, c, b);
    } else {
        surface.push_triangle(a, b, c);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every non-degenerate triangle winds towards its vertex normals.
    fn assert_outward(surface: &Surface) {
        for tri in surface.indices().chunks(3) {
            let p: Vec<Vector3<f32>> = tri
                .iter()
                .map(|i| Vector3::from(surface.positions()[*i as usize]))
                .collect();
            let n = Vector3::from(surface.normals()[tri[0] as usize]);
            let face = (p[1] - p[0]).cross(p[2] - p[0]);
            if face.magnitude2() > 1e-10 {
                assert!(face.dot(n) > 0.0, "triangle {tri:?} faces inward");
            }
        }
    }

    #[test]
    fn test_cube_generation() {
        let cube = generate_cube();
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.index_count(), 36);
        assert!(cube.is_finalized());
        assert_outward(&cube);

        let (min, max) = cube.extents().unwrap();
        assert!((min - Vector3::new(-0.5, -0.5, -0.5)).magnitude() < 1e-6);
        assert!((max - Vector3::new(0.5, 0.5, 0.5)).magnitude() < 1e-6);
    }

    #[test]
    fn test_sphere_generation() {
        let sphere = generate_sphere(8, 6);
        assert_eq!(sphere.vertex_count(), 9 * 7);
        assert_eq!(sphere.index_count(), 8 * 6 * 6);
        assert_outward(&sphere);
    }

    #[test]
    fn test_plane_generation() {
        let plane = generate_plane(2.0, 2.0, 2, 2);
        assert_eq!(plane.vertex_count(), 9);
        assert_eq!(plane.index_count(), 24);
        assert_outward(&plane);
    }

    #[test]
    fn test_wire_box_has_twelve_edges() {
        let wire = wire_box_from_extents(
            Vector3::new(-1.0, -1.0, -1.0),
            Vector3::new(1.0, 1.0, 1.0),
            [1.0, 0.0, 0.0, 1.0],
        );
        assert_eq!(wire.draw_mode(), DrawMode::LineList);
        assert_eq!(wire.vertex_count(), 24);
        assert!(wire.indices().is_empty());
        assert_eq!(wire.color(0), Some([1.0, 0.0, 0.0, 1.0]));

        for edge in wire.positions().chunks(2) {
            let a = Vector3::from(edge[0]);
            let b = Vector3::from(edge[1]);
            assert!(((a - b).magnitude() - 2.0).abs() < 1e-5);
        }
    }
}
