// src/gfx/resources/mod.rs
//! CPU-side GPU resource data
//!
//! Uniform block layouts shared by the pipeline and the shaders, and texture decoding.

pub mod texture_decoder;
pub mod uniforms;

// Re-export main types
pub use texture_decoder::{DecodedImage, ImageFileDecoder, TextureDecoder};
pub use uniforms::{
    LightArrayUniform, LightRecord, MaterialUniform, ShadowUniform, TransformUniform, MAX_LIGHTS,
    NO_SHADOW_CASTER,
};
