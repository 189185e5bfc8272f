//! # Graphics Module
//!
//! Everything between the caller's scene description and the GPU device.
//!
//! ## Architecture Overview
//!
//! - **Scene Graph** ([`scene`]) - shaders, materials, meshes, surfaces and cameras
//!   with consistent ownership edges
//! - **Lighting** ([`lighting`]) - lights, the shadow caster and the packed light array
//! - **Rendering** ([`rendering`]) - the two-pass shadow + color frame
//! - **Resources** ([`resources`]) - uniform block layouts and texture decoding
//! - **Geometry** ([`geometry`]) - primitive and OBJ surfaces
//! - **Camera** ([`camera`]) and **Transform** ([`transform`]) - pose and projection math
//!
//! The engine frame is left-handed: +X right, +Y up, +Z forward, depth 0..1.

pub mod camera;
pub mod geometry;
pub mod lighting;
pub mod rendering;
pub mod resources;
pub mod scene;
pub mod transform;

// Re-export commonly used types
pub use rendering::{FrameStats, RenderPipeline};
pub use scene::SceneGraph;
pub use transform::{Space, Transform};
