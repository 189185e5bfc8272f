//! # Procedural and Imported Geometry
//!
//! Builds ready-to-register [`Surface`](crate::gfx::scene::Surface)s without
//! hand-writing vertex data.
//!
//! ## Supported Sources
//!
//! - **Cube**: unit cube, one quad per face
//! - **Sphere**: UV sphere with configurable resolution
//! - **Plane**: flat XZ plane with configurable size and subdivisions
//! - **Wire box**: line-list outline of an oriented bounding box
//! - **OBJ**: models from Wavefront OBJ files, with MTL material constants
//!
//! ## Usage
//!
//! ```no_run
//! use umbra::gfx::geometry::{generate_cube, generate_sphere, generate_plane};
//!
//! let cube = generate_cube();
//! let sphere = generate_sphere(32, 16);
//! let floor = generate_plane(10.0, 10.0, 4, 4);
//! ```

pub mod obj;
pub mod primitives;

pub use obj::{load_obj_surfaces, ObjModel};
pub use primitives::*;
