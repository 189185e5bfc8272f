// src/wgpu_utils/mod.rs
//! wgpu backend
//!
//! [`WgpuDevice`] implements the engine's [`GpuDevice`](crate::gpu::GpuDevice)
//! contract on top of wgpu, plus the layout, texture and pipeline helpers it uses.

pub mod binding_types;
pub mod device;
pub mod pipeline_cache;
pub mod texture_resource;

// Re-export main types
pub use binding_types::BindGroupLayouts;
pub use device::WgpuDevice;
pub use pipeline_cache::{PipelineCache, PipelineKey};
pub use texture_resource::TextureResource;
