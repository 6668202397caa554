//! Core primitive types for rendering
//!
//! Meshes, vertices and the scene camera.

pub mod camera;
pub mod mesh;

// Re-export commonly used types
pub use camera::Camera;
pub use mesh::{Mesh, Vertex};
