//! # Core Module
//!
//! Shared configuration types used by the renderer and the tools around it.

pub mod config;

// Re-export commonly used config types
pub use config::{
    ApplicationConfig,
    Config,
    ConfigError,
    EngineConfig,
    RendererConfig,
};
