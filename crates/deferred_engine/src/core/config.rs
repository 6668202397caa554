//! # Unified Configuration System
//!
//! Configuration for the renderer and the process hosting it. Everything
//! here serializes to TOML or RON through the [`Config`] trait, and every
//! field has a default so configuration files stay short.
//!
//! ## Configuration Categories
//!
//! - **Engine Config**: logging and debug behavior
//! - **Renderer Config**: output size, shadow resolutions, shader location
//!   and the initial [`RenderSettings`]

use serde::{Deserialize, Serialize};

pub use crate::config::{Config, ConfigError};
use crate::render::pipeline::RenderSettings;

/// Edge length of the directional shadow map
pub const DIR_SHADOW_SIZE: u32 = 1024;

/// Edge length of each point-light shadow cube face
pub const POINT_SHADOW_SIZE: u32 = 512;

/// # Renderer Configuration
///
/// Everything [`DeferredRenderer::new`](crate::render::DeferredRenderer::new)
/// needs to allocate its targets and build its programs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Directional shadow map edge length
    pub directional_shadow_resolution: u32,
    /// Point shadow cube face edge length
    pub point_shadow_resolution: u32,
    /// Directory holding one subdirectory of stage files per program
    pub shader_dir: String,
    /// Initial tunable parameters
    pub settings: RenderSettings,
}

impl RendererConfig {
    /// Configuration for a `width` x `height` output with default settings
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Set shadow map resolutions
    pub fn with_shadow_resolutions(mut self, directional: u32, point: u32) -> Self {
        self.directional_shadow_resolution = directional;
        self.point_shadow_resolution = point;
        self
    }

    /// Set the shader directory
    pub fn with_shader_dir(mut self, dir: impl Into<String>) -> Self {
        self.shader_dir = dir.into();
        self
    }

    /// Set the initial render settings
    pub fn with_settings(mut self, settings: RenderSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!("Output size must be non-zero, got {}x{}", self.width, self.height));
        }
        if self.directional_shadow_resolution == 0 || self.point_shadow_resolution == 0 {
            return Err("Shadow map resolutions must be non-zero".to_string());
        }
        if self.shader_dir.is_empty() {
            return Err("Shader directory cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            directional_shadow_resolution: DIR_SHADOW_SIZE,
            point_shadow_resolution: POINT_SHADOW_SIZE,
            shader_dir: "resources/shaders".to_string(),
            settings: RenderSettings::default(),
        }
    }
}

/// # Engine Configuration
///
/// Process-wide behavior: logging and debug features.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Log level for the engine
    pub log_level: String,
    /// Whether to enable debug features
    pub debug_mode: bool,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            debug_mode: cfg!(debug_assertions),
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Enable debug mode
    pub fn with_debug(mut self, enabled: bool) -> Self {
        self.debug_mode = enabled;
        self
    }

    /// Parsed log level, falling back to `Info` for unknown names
    pub fn level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Complete Application Configuration
///
/// Top-level configuration that applications load from disk.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Engine core configuration
    pub engine: EngineConfig,
    /// Renderer configuration
    pub renderer: RendererConfig,
}

impl ApplicationConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), String> {
        self.renderer.validate()
    }
}

impl Config for ApplicationConfig {}
