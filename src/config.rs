//! Engine configuration.
//!
//! `EngineConfig` controls the fallbacks and limits the [`RenderEngine`](crate::engine::RenderEngine)
//! applies while parsing and rendering. Defaults come from [`Default`], customization goes
//! through the fluent [`EngineConfig::builder()`] which validates on `build()`, and a config
//! can also be loaded from JSON with [`EngineConfig::from_json`].
//!
//! # Examples
//!
//! ```rust
//! use gosub_svg::config::EngineConfig;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = EngineConfig::builder()
//!     .default_viewport(640, 480)
//!     .max_depth(64)
//!     .build()?;
//! assert_eq!(cfg.default_viewport.width, 640);
//! # Ok(()) }
//! ```
//!
//! # Fields (summary)
//! - `default_viewport`: size used when the root element has no usable width/height (default: 300x150,
//!   at most [`MAX_DIMENSION`] per side).
//! - `clear_color`: color the canvas is reset to before each render pass (default: transparent).
//! - `max_depth`: elements nested deeper than this are skipped with a diagnostic (default: 256).
//! - `max_nodes`: upper bound on markup nodes; larger inputs are rejected as malformed (default: 1_000_000).
//! - `anti_alias`: whether raster devices smooth edges (default: true).

use std::fmt;
use serde::{Deserialize, Serialize};
use crate::render::backend::SurfaceSize;
use crate::style::Color;

/// Largest viewport width or height in pixels, for configured and document sizes alike.
pub const MAX_DIMENSION: u32 = 16384;

const DEFAULT_VIEWPORT: SurfaceSize = SurfaceSize { width: 300, height: 150 };

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub default_viewport: SurfaceSize,
    pub clear_color: Color,
    pub max_depth: usize,
    pub max_nodes: u32,
    pub anti_alias: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_viewport: DEFAULT_VIEWPORT,
            clear_color: Color::TRANSPARENT,
            max_depth: 256,
            max_nodes: 1_000_000,
            anti_alias: true,
        }
    }
}

impl EngineConfig {
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Checks a config that was built by hand instead of through the builder.
    pub fn validate(&self) -> Result<(), EngineConfigError> {
        validate(self)
    }

    /// Reads a config from JSON. Missing fields take their default value.
    pub fn from_json(json: &str) -> Result<Self, EngineConfigError> {
        let cfg: EngineConfig = serde_json::from_str(json).map_err(|e| EngineConfigError::Json(e.to_string()))?;
        validate(&cfg)?;
        Ok(cfg)
    }
}

#[derive(Debug, Clone, Default)]
pub struct EngineConfigBuilder {
    inner: EngineConfig,
}

impl EngineConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut EngineConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn default_viewport(self, width: u32, height: u32) -> Self { self.map(|c| c.default_viewport = SurfaceSize { width, height }) }
    pub fn clear_color(self, color: Color) -> Self { self.map(|c| c.clear_color = color) }
    pub fn max_depth(self, depth: usize) -> Self { self.map(|c| c.max_depth = depth) }
    pub fn max_nodes(self, nodes: u32) -> Self { self.map(|c| c.max_nodes = nodes) }
    pub fn anti_alias(self, on: bool) -> Self { self.map(|c| c.anti_alias = on) }

    /// Apply multiple changes in one go.
    pub fn with(self, f: impl FnOnce(&mut EngineConfig)) -> Self { self.map(f) }

    /// Validate and build the final config.
    pub fn build(self) -> Result<EngineConfig, EngineConfigError> {
        validate(&self.inner)?;
        Ok(self.inner)
    }
}

// ---------- Validation ----------

#[derive(Debug, Clone, PartialEq)]
pub enum EngineConfigError {
    ZeroViewport { width: u32, height: u32 },
    ViewportTooLarge { width: u32, height: u32 },
    ZeroDepth,
    ZeroNodes,
    Json(String),
}

impl fmt::Display for EngineConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineConfigError::ZeroViewport { width, height } =>
                write!(f, "default_viewport {width}x{height} must be non-empty"),
            EngineConfigError::ViewportTooLarge { width, height } =>
                write!(f, "default_viewport {width}x{height} exceeds {MAX_DIMENSION} pixels per side"),
            EngineConfigError::ZeroDepth =>
                write!(f, "max_depth must be at least 1"),
            EngineConfigError::ZeroNodes =>
                write!(f, "max_nodes must be at least 1"),
            EngineConfigError::Json(msg) =>
                write!(f, "cannot read config: {msg}"),
        }
    }
}
impl std::error::Error for EngineConfigError {}

fn validate(c: &EngineConfig) -> Result<(), EngineConfigError> {
    if c.default_viewport.width == 0 || c.default_viewport.height == 0 {
        return Err(EngineConfigError::ZeroViewport {
            width: c.default_viewport.width,
            height: c.default_viewport.height,
        });
    }
    if c.default_viewport.width > MAX_DIMENSION || c.default_viewport.height > MAX_DIMENSION {
        return Err(EngineConfigError::ViewportTooLarge {
            width: c.default_viewport.width,
            height: c.default_viewport.height,
        });
    }
    if c.max_depth == 0 {
        return Err(EngineConfigError::ZeroDepth);
    }
    if c.max_nodes == 0 {
        return Err(EngineConfigError::ZeroNodes);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = EngineConfig::builder().build().unwrap();
        assert_eq!(cfg, EngineConfig::default());
        assert_eq!(cfg.default_viewport, SurfaceSize { width: 300, height: 150 });
    }

    #[test]
    fn builder_rejects_empty_viewport_and_zero_limits() {
        let err = EngineConfig::builder().default_viewport(0, 10).build().unwrap_err();
        assert_eq!(err, EngineConfigError::ZeroViewport { width: 0, height: 10 });

        let err = EngineConfig::builder().default_viewport(70_000, 70_000).build().unwrap_err();
        assert_eq!(err, EngineConfigError::ViewportTooLarge { width: 70_000, height: 70_000 });
        assert!(EngineConfig::builder().default_viewport(MAX_DIMENSION, 1).build().is_ok());

        assert_eq!(EngineConfig::builder().max_depth(0).build().unwrap_err(), EngineConfigError::ZeroDepth);
        assert_eq!(EngineConfig::builder().max_nodes(0).build().unwrap_err(), EngineConfigError::ZeroNodes);
    }

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let cfg = EngineConfig::from_json(r#"{ "max_depth": 8, "clear_color": { "r": 255, "g": 255, "b": 255, "a": 255 } }"#).unwrap();
        assert_eq!(cfg.max_depth, 8);
        assert_eq!(cfg.clear_color, Color::WHITE);
        assert_eq!(cfg.max_nodes, 1_000_000);
    }

    #[test]
    fn json_is_validated() {
        let err = EngineConfig::from_json(r#"{ "max_nodes": 0 }"#).unwrap_err();
        assert_eq!(err, EngineConfigError::ZeroNodes);

        let err = EngineConfig::from_json(r#"{ "default_viewport": { "width": 20000, "height": 10 } }"#).unwrap_err();
        assert!(matches!(err, EngineConfigError::ViewportTooLarge { width: 20000, .. }));

        let err = EngineConfig::from_json("not json").unwrap_err();
        assert!(matches!(err, EngineConfigError::Json(_)));
    }
}
