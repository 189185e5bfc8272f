// src/gfx/rendering/mod.rs
//! Frame rendering
//!
//! The two-pass shadow + color pipeline and the built-in programs it is usually
//! driven with.

pub mod render_pipeline;

// Re-export main types
pub use render_pipeline::{FrameStats, RenderPipeline, COLOR_PASS, SHADOW_PASS};

use std::borrow::Cow;

use crate::gpu::{AttributeMask, ProgramDesc};

/// Source of the lit, textured, shadow-receiving program.
pub const LIT_SHADER: &str = include_str!("lit.wgsl");
/// Source of the position + color program used for wireframes.
pub const UNLIT_SHADER: &str = include_str!("unlit.wgsl");

/// Describes a program whose entry points are `vs_main` and `fs_main`.
pub fn program_from_source(
    label: &str,
    source: impl Into<Cow<'static, str>>,
    attributes: AttributeMask,
) -> ProgramDesc {
    ProgramDesc {
        label: label.to_string(),
        source: source.into(),
        vertex_entry: "vs_main".to_string(),
        pixel_entry: "fs_main".to_string(),
        attributes,
    }
}

/// Built-in lit program: every vertex stream, Blinn-Phong with PCF shadows.
pub fn lit_program() -> ProgramDesc {
    program_from_source("Lit", LIT_SHADER, AttributeMask::LIT)
}

/// Built-in unlit program: position and vertex color times material diffuse.
pub fn unlit_program() -> ProgramDesc {
    program_from_source("Unlit", UNLIT_SHADER, AttributeMask::UNLIT)
}
