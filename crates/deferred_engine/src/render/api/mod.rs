//! Public rendering API
//!
//! This module contains the device abstraction the renderer is written
//! against, the typed handles it hands out, and the descriptor types used to
//! create resources.

pub mod graphics_device;
pub mod handles;
pub mod model;
pub mod resources;

// Re-export commonly used types
pub use graphics_device::GraphicsDevice;
pub use handles::{FramebufferHandle, MeshHandle, ObjectRef, ProgramHandle, RenderbufferHandle, TextureHandle};
pub use model::Model;
pub use resources::{
    Attachment, BlendMode, BlitRegion, ClearFlags, CullMode, DepthFunc, DepthState, FilterMode, FramebufferStatus,
    FramebufferTarget, PolygonMode, RenderbufferDesc, ShaderSources, ShaderStage, TextureDesc, TextureFormat,
    TextureKind, UniformValue, Viewport, WrapMode,
};
