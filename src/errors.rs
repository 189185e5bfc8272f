//! Error types
//!
//! The engine separates failures by how far they are allowed to travel:
//!
//! - [`EngineError`] - fatal startup failures (no adapter, no device, no window).
//!   These abort construction of the [`EngineContext`](crate::EngineContext).
//! - [`GpuError`] - a single GPU resource could not be created or updated. The
//!   pipeline logs these and keeps rendering with whatever it has.
//! - [`SceneError`] - a stale or unknown handle was passed to the scene graph. The
//!   operation is a logged no-op.
//! - [`TextureError`] - the texture decoder could not produce pixels.
//! - [`GeometryError`] - a model file could not be imported.

use thiserror::Error;

use crate::gpu::BufferHandle;

/// Fatal errors raised while bringing the engine up.
#[derive(Error, Debug)]
pub enum EngineError {
    /// No compatible GPU adapter was found.
    #[error("Failed to request WGPU adapter: {0}")]
    AdapterRequestFailed(String),

    /// The adapter refused to create a device.
    #[error("Failed to create WGPU device: {0}")]
    DeviceCreateFailed(#[from] wgpu::RequestDeviceError),

    /// The window surface could not be created.
    #[error("Failed to create presentation surface: {0}")]
    SurfaceCreateFailed(#[from] wgpu::CreateSurfaceError),

    /// The window could not be created.
    #[error("Failed to create window: {0}")]
    WindowCreateFailed(#[from] winit::error::OsError),

    /// The platform event loop failed.
    #[error("Event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    /// A resource the pipeline cannot run without failed to create.
    #[error("Failed to create core pipeline resource: {0}")]
    CoreResource(#[from] GpuError),
}

/// A single GPU resource operation failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GpuError {
    #[error("buffer creation failed for '{label}': {reason}")]
    BufferCreation { label: String, reason: String },

    #[error("program compilation failed for '{label}': {reason}")]
    ProgramCompilation { label: String, reason: String },

    #[error("texture creation failed for '{label}': {reason}")]
    TextureCreation { label: String, reason: String },

    #[error("sampler creation failed for '{label}': {reason}")]
    SamplerCreation { label: String, reason: String },

    #[error("write of {size} bytes to buffer {buffer:?} rejected: {reason}")]
    BufferWrite {
        buffer: BufferHandle,
        size: usize,
        reason: String,
    },

    #[error("unknown {0} handle")]
    InvalidHandle(&'static str),

    #[error("presentation surface unavailable: {0}")]
    Surface(String),

    #[error("device lost: {0}")]
    DeviceLost(String),
}

/// A scene graph operation was given a handle it does not know.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneError {
    #[error("shader handle is stale or unknown")]
    UnknownShader,

    #[error("material handle is stale or unknown")]
    UnknownMaterial,

    #[error("mesh handle is stale or unknown")]
    UnknownMesh,

    #[error("surface handle is stale or unknown")]
    UnknownSurface,

    #[error("camera handle is stale or unknown")]
    UnknownCamera,

    #[error("light handle is stale or unknown")]
    UnknownLight,
}

/// The texture decoder could not produce RGBA8 pixels.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("failed to decode texture '{path}': {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("pixel buffer of {len} bytes does not match {width}x{height} RGBA8")]
    SizeMismatch { width: u32, height: u32, len: usize },
}

/// A geometry file could not be turned into surfaces.
#[derive(Error, Debug)]
pub enum GeometryError {
    #[error("failed to load OBJ '{path}': {source}")]
    Obj {
        path: String,
        #[source]
        source: tobj::LoadError,
    },

    #[error("OBJ '{path}' contains no geometry")]
    Empty { path: String },
}

/// Convenience alias for fallible scene graph operations.
pub type SceneResult<T> = std::result::Result<T, SceneError>;
