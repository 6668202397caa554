//! Device abstraction the renderer drives
//!
//! The renderer never talks to a graphics API directly. Everything it needs
//! (object creation, framebuffer binding, fixed-function state, uniforms and
//! draws) goes through [`GraphicsDevice`], which keeps the pass logic testable
//! against the in-process [`HeadlessDevice`] and lets a windowed backend live
//! outside this crate.
//!
//! [`HeadlessDevice`]: crate::render::backends::HeadlessDevice

use super::handles::{FramebufferHandle, MeshHandle, ObjectRef, ProgramHandle, RenderbufferHandle, TextureHandle};
use super::resources::{
    Attachment, BlendMode, BlitRegion, ClearFlags, CullMode, DepthState, FilterMode, FramebufferStatus,
    FramebufferTarget, PolygonMode, RenderbufferDesc, ShaderSources, TextureDesc, TextureKind, UniformValue, Viewport,
};
use crate::render::primitives::Mesh;
use crate::render::RenderResult;

/// Stateful graphics device
///
/// Semantics follow a core-profile OpenGL context: framebuffers start with
/// color attachment 0 as their draw and read buffer, draw-buffer selection is
/// stored per framebuffer, and `None` as a framebuffer means the output
/// surface owned by the windowing layer.
pub trait GraphicsDevice {
    // === Textures and renderbuffers ===

    /// Allocate a texture
    fn create_texture(&mut self, desc: &TextureDesc) -> RenderResult<TextureHandle>;

    /// Release a texture; unknown handles are ignored
    fn delete_texture(&mut self, texture: TextureHandle);

    /// Allocate a renderbuffer
    fn create_renderbuffer(&mut self, desc: &RenderbufferDesc) -> RenderResult<RenderbufferHandle>;

    /// Release a renderbuffer; unknown handles are ignored
    fn delete_renderbuffer(&mut self, renderbuffer: RenderbufferHandle);

    // === Framebuffers ===

    /// Create an empty framebuffer
    fn create_framebuffer(&mut self) -> RenderResult<FramebufferHandle>;

    /// Release a framebuffer; unknown handles are ignored
    fn delete_framebuffer(&mut self, framebuffer: FramebufferHandle);

    /// Attach a texture (every face, for cube maps) at an attachment point
    fn attach_texture(
        &mut self,
        framebuffer: FramebufferHandle,
        attachment: Attachment,
        texture: TextureHandle,
    ) -> RenderResult<()>;

    /// Attach a renderbuffer at an attachment point
    fn attach_renderbuffer(
        &mut self,
        framebuffer: FramebufferHandle,
        attachment: Attachment,
        renderbuffer: RenderbufferHandle,
    ) -> RenderResult<()>;

    /// Completeness of a framebuffer given its attachments and buffer selection
    fn check_framebuffer_status(&self, framebuffer: FramebufferHandle) -> FramebufferStatus;

    /// Bind a framebuffer, or the output surface for `None`
    fn bind_framebuffer(&mut self, target: FramebufferTarget, framebuffer: Option<FramebufferHandle>);

    /// Framebuffer currently bound at `target` (`Both` reports the draw binding)
    fn bound_framebuffer(&self, target: FramebufferTarget) -> Option<FramebufferHandle>;

    /// Select the color attachments the bound draw framebuffer writes; empty selects none
    fn set_draw_buffers(&mut self, color_attachments: &[u32]);

    /// Select the color attachment the bound read framebuffer reads; `None` selects none
    fn set_read_buffer(&mut self, color_attachment: Option<u32>);

    /// Copy a rectangle from the read framebuffer's read buffer to the draw framebuffer
    fn blit(&mut self, source: BlitRegion, destination: BlitRegion, filter: FilterMode);

    // === Fixed-function state ===

    /// Clear color used by [`GraphicsDevice::clear`]
    fn set_clear_color(&mut self, color: [f32; 4]);

    /// Clear buffers of the bound draw framebuffer
    fn clear(&mut self, flags: ClearFlags);

    /// Set the viewport rectangle
    fn set_viewport(&mut self, viewport: Viewport);

    /// Current viewport rectangle
    fn viewport(&self) -> Viewport;

    /// Configure depth testing
    fn set_depth_state(&mut self, state: DepthState);

    /// Configure blending
    fn set_blend_mode(&mut self, mode: BlendMode);

    /// Configure face culling
    fn set_cull_mode(&mut self, mode: CullMode);

    /// Current face culling
    fn cull_mode(&self) -> CullMode;

    /// Configure polygon rasterization
    fn set_polygon_mode(&mut self, mode: PolygonMode);

    /// Bind a texture to a sampler unit
    fn bind_texture(&mut self, unit: u32, kind: TextureKind, texture: TextureHandle);

    // === Programs ===

    /// Compile and link a program from source files
    fn compile_program(&mut self, sources: &ShaderSources) -> RenderResult<ProgramHandle>;

    /// Release a program; unknown handles are ignored
    fn delete_program(&mut self, program: ProgramHandle);

    /// Make a program current for draws
    fn use_program(&mut self, program: ProgramHandle);

    /// Assign a named uniform of a program
    fn set_uniform(&mut self, program: ProgramHandle, name: &str, value: UniformValue);

    // === Geometry ===

    /// Upload vertex and index data
    fn create_mesh(&mut self, mesh: &Mesh) -> RenderResult<MeshHandle>;

    /// Release uploaded geometry; unknown handles are ignored
    fn delete_mesh(&mut self, mesh: MeshHandle);

    /// Draw uploaded geometry with the current program and state
    fn draw_mesh(&mut self, mesh: MeshHandle);

    // === Debugging ===

    /// Attach a human-readable name to an object for graphics debuggers
    fn label_object(&mut self, object: ObjectRef, label: &str);

    /// Open a named debug group; groups nest
    fn push_debug_group(&mut self, name: &str);

    /// Close the innermost debug group
    fn pop_debug_group(&mut self);
}
