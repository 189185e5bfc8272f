use std::path::Path;

use cgmath::{InnerSpace, Vector3, Zero};
use log::{debug, warn};

use crate::errors::GeometryError;
use crate::gfx::scene::{DrawMode, MaterialConstants, Surface, Vertex};

/// One OBJ model: its geometry and, if the MTL file provided one, its material.
#[derive(Debug, Clone)]
pub struct ObjModel {
    pub name: String,
    pub surface: Surface,
    pub material: Option<MaterialConstants>,
    /// Diffuse texture path as written in the MTL file.
    pub diffuse_texture: Option<String>,
}

/// Loads every model of an OBJ file as a finalized triangle surface.
///
/// Missing normals are replaced by smooth, area-weighted vertex normals. A missing
/// or broken MTL file is not an error; the models come back without materials.
pub fn load_obj_surfaces(path: impl AsRef<Path>) -> Result<Vec<ObjModel>, GeometryError> {
    let path = path.as_ref();
    let (models, materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|source| GeometryError::Obj {
        path: path.display().to_string(),
        source,
    })?;

    let materials = materials.unwrap_or_else(|err| {
        warn!("no usable MTL for {}: {err}", path.display());
        Vec::new()
    });

    let loaded: Vec<ObjModel> = models
        .iter()
        .filter(|model| !model.mesh.positions.is_empty())
        .map(|model| {
            let mtl = model.mesh.material_id.and_then(|id| materials.get(id));
            ObjModel {
                name: model.name.clone(),
                surface: build_surface(&model.name, &model.mesh),
                material: mtl.map(material_constants),
                diffuse_texture: mtl.and_then(|m| m.diffuse_texture.clone()),
            }
        })
        .collect();

    if loaded.is_empty() {
        return Err(GeometryError::Empty {
            path: path.display().to_string(),
        });
    }

    debug!("loaded {} model(s) from {}", loaded.len(), path.display());
    Ok(loaded)
}

fn build_surface(name: &str, mesh: &tobj::Mesh) -> Surface {
    let mut surface = Surface::new(name, DrawMode::TriangleList);
    let vertex_count = mesh.positions.len() / 3;

    let normals = if mesh.normals.len() == mesh.positions.len() {
        mesh.normals.clone()
    } else {
        smooth_normals(&mesh.positions, &mesh.indices)
    };
    let has_uvs = mesh.texcoords.len() / 2 == vertex_count;
    let has_colors = mesh.vertex_color.len() == mesh.positions.len();

    for i in 0..vertex_count {
        let mut vertex = Vertex::new(
            [
                mesh.positions[i * 3],
                mesh.positions[i * 3 + 1],
                mesh.positions[i * 3 + 2],
            ],
            [normals[i * 3], normals[i * 3 + 1], normals[i * 3 + 2]],
            if has_uvs {
                // OBJ puts v = 0 at the bottom of the image
                [mesh.texcoords[i * 2], 1.0 - mesh.texcoords[i * 2 + 1]]
            } else {
                [0.0, 0.0]
            },
        );
        if has_colors {
            vertex.color = [
                mesh.vertex_color[i * 3],
                mesh.vertex_color[i * 3 + 1],
                mesh.vertex_color[i * 3 + 2],
                1.0,
            ];
        }
        surface.push_vertex(vertex);
    }

    surface.set_indices(mesh.indices.clone());
    surface.finalize();
    surface
}

/// Area-weighted vertex normals from flat triangle data.
pub fn smooth_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
    let vertex_count = positions.len() / 3;
    let mut accumulated = vec![Vector3::zero(); vertex_count];
    let at = |i: u32| {
        let i = i as usize * 3;
        Vector3::new(positions[i], positions[i + 1], positions[i + 2])
    };

    for tri in indices.chunks_exact(3) {
        if tri.iter().any(|i| *i as usize >= vertex_count) {
            continue;
        }
        let face = (at(tri[1]) - at(tri[0])).cross(at(tri[2]) - at(tri[0]));
        for i in tri {
            accumulated[*i as usize] += face;
        }
    }

    accumulated
        .into_iter()
        .flat_map(|n: Vector3<f32>| {
            let n = if n.magnitude2() > 0.0 {
                n.normalize()
            } else {
                Vector3::unit_y()
            };
            [n.x, n.y, n.z]
        })
        .collect()
}

fn material_constants(mtl: &tobj::Material) -> MaterialConstants {
    let defaults = MaterialConstants::default();
    let [dr, dg, db] = mtl.diffuse.unwrap_or([0.8, 0.8, 0.8]);
    let specular = mtl
        .specular
        .map(|[r, g, b]| [r, g, b, 1.0])
        .unwrap_or(defaults.specular);

    MaterialConstants {
        diffuse: [dr, dg, db, 1.0],
        specular,
        shininess: mtl.shininess.unwrap_or(defaults.shininess),
        transparency: 1.0 - mtl.dissolve.unwrap_or(1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smooth_normals_of_flat_quad() {
        let positions = [
            0.0, 0.0, 0.0, //
            1.0, 0.0, 0.0, //
            1.0, 1.0, 0.0, //
            0.0, 1.0, 0.0,
        ];
        let indices = [0, 1, 2, 2, 3, 0];

        let normals = smooth_normals(&positions, &indices);
        for n in normals.chunks(3) {
            assert_eq!(n, &[0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn test_unreferenced_vertex_gets_fallback_normal() {
        let positions = [0.0; 12];
        let normals = smooth_normals(&positions, &[0, 1, 2, 0, 1, 99]);
        assert_eq!(&normals[9..12], &[0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(matches!(
            load_obj_surfaces("no/such/model.obj"),
            Err(GeometryError::Obj { .. })
        ));
    }
}
