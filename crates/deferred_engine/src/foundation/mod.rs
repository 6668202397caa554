//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the renderer:
//! - Math types and OpenGL-convention matrix builders
//! - Handle tables backing device resources
//! - Logging utilities

pub mod math;
pub mod collections;
pub mod logging;
