//! Engine configuration
//!
//! Everything tunable at startup lives in [`EngineConfig`]. Values come from
//! `Default`, the `with_*` builders, and a few environment overrides read by
//! [`EngineConfig::from_env`].

use std::borrow::Cow;
use std::env;
use std::str::FromStr;

use log::warn;

use crate::gfx::rendering::{LIT_SHADER, UNLIT_SHADER};

/// Overrides the present interval (`0` immediate, `1` vsync).
pub const ENV_SYNC_INTERVAL: &str = "UMBRA_SYNC_INTERVAL";
/// Overrides the shadow map edge length in texels.
pub const ENV_SHADOW_MAP_SIZE: &str = "UMBRA_SHADOW_MAP_SIZE";
/// `1`/`true` renders shadow visibility instead of shaded color.
pub const ENV_SHADOW_DEBUG: &str = "UMBRA_SHADOW_DEBUG";

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub window_title: String,
    pub window_size: (u32, u32),
    pub clear_color: [f64; 4],

    pub shadow_map_size: u32,
    /// Constant rasterizer depth bias of the shadow pass.
    pub shadow_depth_bias: i32,
    /// Slope-scaled rasterizer depth bias of the shadow pass.
    pub shadow_slope_scale: f32,
    /// Bias subtracted from the receiver depth before the comparison lookup.
    pub shadow_compare_bias: f32,
    pub shadow_near: f32,
    pub shadow_far: f32,
    pub shadow_debug: bool,

    pub scene_ambient: [f32; 3],
    pub sync_interval: u32,

    pub lit_shader_source: Cow<'static, str>,
    pub unlit_shader_source: Cow<'static, str>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_title: "Umbra".to_string(),
            window_size: (1280, 720),
            clear_color: [0.1, 0.2, 0.3, 1.0],
            shadow_map_size: 2048,
            shadow_depth_bias: 2,
            shadow_slope_scale: 2.0,
            shadow_compare_bias: 0.002,
            shadow_near: 0.1,
            shadow_far: 100.0,
            shadow_debug: false,
            scene_ambient: [0.1, 0.1, 0.1],
            sync_interval: 1,
            lit_shader_source: Cow::Borrowed(LIT_SHADER),
            unlit_shader_source: Cow::Borrowed(UNLIT_SHADER),
        }
    }
}

impl EngineConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| env::var(key).ok())
    }

    /// Applies overrides from any key lookup. Unparseable values are warned about
    /// and ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(value) = parse_override(&lookup, ENV_SYNC_INTERVAL) {
            self.sync_interval = value;
        }
        if let Some(value) = parse_override::<u32>(&lookup, ENV_SHADOW_MAP_SIZE) {
            self.shadow_map_size = value.max(1);
        }
        if let Some(raw) = lookup(ENV_SHADOW_DEBUG) {
            self.shadow_debug = matches!(raw.trim(), "1" | "true" | "on" | "yes");
        }
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.window_title = title.into();
        self
    }

    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = (width.max(1), height.max(1));
        self
    }

    pub fn with_clear_color(mut self, color: [f64; 4]) -> Self {
        self.clear_color = color;
        self
    }

    pub fn with_shadow_map_size(mut self, size: u32) -> Self {
        self.shadow_map_size = size.max(1);
        self
    }

    pub fn with_shadow_bias(mut self, depth_bias: i32, slope_scale: f32) -> Self {
        self.shadow_depth_bias = depth_bias;
        self.shadow_slope_scale = slope_scale;
        self
    }

    pub fn with_shadow_compare_bias(mut self, bias: f32) -> Self {
        self.shadow_compare_bias = bias;
        self
    }

    pub fn with_shadow_planes(mut self, near: f32, far: f32) -> Self {
        self.shadow_near = near;
        self.shadow_far = far;
        self
    }

    pub fn with_shadow_debug(mut self, debug: bool) -> Self {
        self.shadow_debug = debug;
        self
    }

    pub fn with_scene_ambient(mut self, ambient: [f32; 3]) -> Self {
        self.scene_ambient = ambient;
        self
    }

    pub fn with_sync_interval(mut self, interval: u32) -> Self {
        self.sync_interval = interval;
        self
    }

    pub fn with_lit_shader(mut self, source: impl Into<Cow<'static, str>>) -> Self {
        self.lit_shader_source = source.into();
        self
    }

    pub fn with_unlit_shader(mut self, source: impl Into<Cow<'static, str>>) -> Self {
        self.unlit_shader_source = source.into();
        self
    }
}

fn parse_override<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("ignoring {key}={raw:?}: not a valid value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_overrides_apply() {
        let config = EngineConfig::default().with_overrides(lookup(&[
            (ENV_SYNC_INTERVAL, "0"),
            (ENV_SHADOW_MAP_SIZE, "512"),
            (ENV_SHADOW_DEBUG, "true"),
        ]));

        assert_eq!(config.sync_interval, 0);
        assert_eq!(config.shadow_map_size, 512);
        assert!(config.shadow_debug);
    }

    #[test]
    fn test_bad_override_keeps_default() {
        let config =
            EngineConfig::default().with_overrides(lookup(&[(ENV_SHADOW_MAP_SIZE, "huge")]));
        assert_eq!(config.shadow_map_size, EngineConfig::default().shadow_map_size);
    }

    #[test]
    fn test_builders_clamp_sizes() {
        let config = EngineConfig::default()
            .with_window_size(0, 0)
            .with_shadow_map_size(0);
        assert_eq!(config.window_size, (1, 1));
        assert_eq!(config.shadow_map_size, 1);
    }
}
