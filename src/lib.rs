// src/lib.rs
//! Umbra 3D Engine
//!
//! A real-time 3D rendering engine built on wgpu. It keeps shaders, materials,
//! meshes and surfaces in an ownership-tracked scene graph and renders them
//! through a two-pass frame: a depth-only pass from the shadow-casting light, then
//! a lit color pass from the bound camera.
//!
//! ```no_run
//! use umbra::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     App::new(EngineConfig::from_env())
//!         .with_setup(|ctx| {
//!             let shader = ctx.lit_shader();
//!             let scene = ctx.scene_mut();
//!
//!             let camera = scene.create_camera(Camera::new(Viewport::new(1280.0, 720.0)));
//!             scene.bind_camera(camera)?;
//!
//!             let material = scene.create_material("Crate");
//!             let mesh = scene.create_mesh("Cube");
//!             let surface = scene.create_surface(generate_cube());
//!             scene.assign_shader_to_material(shader, material)?;
//!             scene.add_mesh_to_material(material, mesh)?;
//!             scene.add_surface_to_mesh(mesh, surface)?;
//!             if let Some(mesh) = scene.mesh_mut(mesh) {
//!                 mesh.transform.set_position(Vector3::new(0.0, 0.0, 5.0));
//!             }
//!
//!             let sun = ctx.lights_mut().create_light(Light::directional([1.0, 1.0, 1.0]));
//!             ctx.lights_mut().set_shadow_caster(Some(sun))?;
//!             Ok(())
//!         })
//!         .run()
//! }
//! ```

pub mod app;
pub mod config;
pub mod context;
pub mod errors;
pub mod gfx;
pub mod gpu;
pub mod prelude;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::App;
pub use config::EngineConfig;
pub use context::{EngineContext, Entity, EntityKind, RunFlag};
pub use errors::{EngineError, GeometryError, GpuError, SceneError, SceneResult, TextureError};
