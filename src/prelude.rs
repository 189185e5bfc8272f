//! # Umbra Prelude
//!
//! Commonly used types in one import:
//!
//! ```rust
//! use umbra::prelude::*;
//! ```

// Engine and host
pub use crate::app::App;
pub use crate::config::EngineConfig;
pub use crate::context::{EngineContext, Entity, EntityKind, RunFlag};
pub use crate::errors::{EngineError, GpuError, SceneError, SceneResult};

// Scene types
pub use crate::gfx::camera::Camera;
pub use crate::gfx::geometry::{
    generate_cube, generate_plane, generate_sphere, load_obj_surfaces, wire_box,
};
pub use crate::gfx::lighting::{Light, LightHandle, LightKind, LightManager};
pub use crate::gfx::rendering::{lit_program, unlit_program, FrameStats, RenderPipeline};
pub use crate::gfx::resources::{DecodedImage, ImageFileDecoder, TextureDecoder};
pub use crate::gfx::scene::{
    CameraHandle, DrawMode, MaterialConstants, MaterialHandle, MeshHandle, SceneGraph,
    ShaderHandle, Surface, SurfaceHandle, Vertex,
};
pub use crate::gfx::transform::{Space, Transform};

// Device contract
pub use crate::gpu::{GpuDevice, RecordingDevice, Viewport};
pub use crate::wgpu_utils::WgpuDevice;

// Re-export common external dependencies
pub use cgmath::{Deg, InnerSpace, Rad, Vector3, Zero};
