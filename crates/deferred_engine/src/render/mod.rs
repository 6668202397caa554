//! Deferred rendering
//!
//! The renderer is split into layers:
//! - [`api`]: the [`GraphicsDevice`](api::GraphicsDevice) abstraction, handles and descriptors
//! - [`backends`]: device implementations (an in-process headless device)
//! - [`gbuffer`]: off-screen targets for the geometry, blur and shadow passes
//! - [`lights`], [`shadow`], [`program`]: the data each pass consumes
//! - [`pipeline`]: the [`DeferredRenderer`](pipeline::DeferredRenderer) driving a frame

pub mod api;
pub mod backends;
pub mod gbuffer;
pub mod lights;
pub mod pipeline;
pub mod primitives;
pub mod program;
pub mod shadow;

pub use api::GraphicsDevice;
pub use gbuffer::{BlurTarget, GBufferTarget, GeometryBuffer};
pub use lights::{Attenuation, DirectionalLight, PointLight};
pub use pipeline::{DeferredRenderer, FrameInput, FrameReport, RenderMode, RenderSettings, Scene};
pub use primitives::{Camera, Mesh, Vertex};
pub use program::ShaderProgram;

/// Errors raised by the renderer and its devices
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Renderer initialization failed during setup
    ///
    /// Raised when a program or target required before the first frame
    /// cannot be created.
    #[error("Renderer initialization failed: {0}")]
    InitializationFailed(String),

    /// A rendering operation failed during execution
    #[error("Rendering failed: {0}")]
    RenderingFailed(String),

    /// Resource creation or management failed
    ///
    /// Occurs when the device cannot allocate a texture, renderbuffer,
    /// framebuffer or mesh.
    #[error("Resource creation failed: {0}")]
    ResourceCreationFailed(String),

    /// A handle does not name a live object of the expected kind
    #[error("Invalid {kind} handle {id}")]
    InvalidHandle {
        /// Object kind, e.g. `"texture"`
        kind: &'static str,
        /// Raw handle value
        id: u32,
    },

    /// A shader program failed to compile or link
    #[error("Shader program '{label}' failed to build: {log}")]
    ShaderCompilation {
        /// Program label
        label: String,
        /// Compiler or linker output
        log: String,
    },

    /// A point-light shadow map index past the allocated range
    #[error("Point light shadow index {index} out of range ({count} allocated)")]
    PointShadowOutOfRange {
        /// Requested index
        index: usize,
        /// Number of allocated shadow maps
        count: usize,
    },
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;
