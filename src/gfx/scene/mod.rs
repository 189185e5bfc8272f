//! # Scene Graph
//!
//! Ownership registry for everything the render pipeline draws. The graph is a
//! strict tree of four levels, each parent holding an ordered child list and each
//! child a back-reference:
//!
//! ```text
//! Shader ─┬─ Material ─┬─ Mesh ─┬─ Surface
//!         │            │        └─ Surface
//!         │            └─ Mesh ── Surface
//!         └─ Material ── ...
//! ```
//!
//! - [`SceneGraph`] - factory and sole owner; all edge changes go through it
//! - [`Shader`], [`Material`], [`Mesh`], [`Surface`] - the four levels
//! - [`Obb`] - oriented bounding boxes for mesh collision
//!
//! Entities are addressed by generational handles, so a handle to a deleted entity
//! is detected as stale rather than aliasing a newer one.
//!
//! ## Usage
//!
//! ```no_run
//! use umbra::gfx::scene::{SceneGraph, Surface, DrawMode};
//! use umbra::gfx::rendering::lit_program;
//!
//! let mut scene = SceneGraph::new();
//! let shader = scene.create_shader(lit_program());
//! let material = scene.create_material("stone");
//! let mesh = scene.create_mesh("wall");
//! let surface = scene.create_surface(Surface::new("wall", DrawMode::TriangleList));
//!
//! scene.assign_shader_to_material(shader, material).unwrap();
//! scene.add_mesh_to_material(material, mesh).unwrap();
//! scene.add_surface_to_mesh(mesh, surface).unwrap();
//! ```

pub mod bounds;
pub mod material;
pub mod mesh;
pub mod ownership;
pub mod registry;
pub mod scene_graph;
pub mod shader;
pub mod surface;

use slotmap::new_key_type;

new_key_type! {
    pub struct ShaderHandle;
    pub struct MaterialHandle;
    pub struct MeshHandle;
    pub struct SurfaceHandle;
    pub struct CameraHandle;
}

// Re-export main types
pub use bounds::Obb;
pub use material::{Material, MaterialConstants, TextureBinding};
pub use mesh::Mesh;
pub use registry::Registry;
pub use scene_graph::SceneGraph;
pub use shader::{ProgramState, Shader};
pub use surface::{DrawMode, Surface, SurfaceBuffers, Vertex};
