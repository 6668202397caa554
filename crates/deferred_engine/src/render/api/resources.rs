//! Resource descriptors and fixed-function state passed to a [`GraphicsDevice`]
//!
//! [`GraphicsDevice`]: super::GraphicsDevice

use std::path::PathBuf;

use bitflags::bitflags;

use crate::foundation::math::{Mat4, Vec2, Vec3, Vec4};

/// Texture dimensionality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    /// Single 2D image
    Texture2D,
    /// Six square faces addressed by direction
    CubeMap,
}

/// Storage formats used by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// 8-bit normalized RGBA (skybox images)
    Rgba8,
    /// Half-float RGB
    Rgb16F,
    /// Half-float RGBA
    Rgba16F,
    /// 32-bit float depth
    Depth32F,
    /// 32-bit float depth with 8-bit stencil
    Depth32FStencil8,
}

impl TextureFormat {
    /// Whether this format can back a depth attachment
    pub const fn is_depth(self) -> bool {
        matches!(self, Self::Depth32F | Self::Depth32FStencil8)
    }

    /// Whether this format carries stencil bits
    pub const fn has_stencil(self) -> bool {
        matches!(self, Self::Depth32FStencil8)
    }
}

/// Minification and magnification filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterMode {
    /// Nearest texel
    Nearest,
    /// Bilinear
    Linear,
}

/// Texture coordinate wrapping on every axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WrapMode {
    /// Clamp to the edge texel
    ClampToEdge,
    /// Clamp to the texture's border color
    ClampToBorder,
    /// Tile
    Repeat,
}

/// Description of a texture to allocate
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDesc {
    /// 2D or cube map
    pub kind: TextureKind,
    /// Storage format
    pub format: TextureFormat,
    /// Width in texels (per face for cube maps)
    pub width: u32,
    /// Height in texels (per face for cube maps)
    pub height: u32,
    /// Sampling filter
    pub filter: FilterMode,
    /// Coordinate wrapping
    pub wrap: WrapMode,
    /// Border color, only meaningful with [`WrapMode::ClampToBorder`]
    pub border_color: Option<[f32; 4]>,
}

impl TextureDesc {
    /// A 2D color target with nearest filtering, clamped at the edges
    pub fn color_2d(width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            kind: TextureKind::Texture2D,
            format,
            width,
            height,
            filter: FilterMode::Nearest,
            wrap: WrapMode::ClampToEdge,
            border_color: None,
        }
    }

    /// A square 2D depth map
    pub fn depth_2d(size: u32) -> Self {
        Self::color_2d(size, size, TextureFormat::Depth32F)
    }

    /// A depth cube map with `size` x `size` faces
    pub fn depth_cube(size: u32) -> Self {
        Self {
            kind: TextureKind::CubeMap,
            ..Self::depth_2d(size)
        }
    }

    /// Override the filter
    pub fn with_filter(mut self, filter: FilterMode) -> Self {
        self.filter = filter;
        self
    }

    /// Override the wrap mode
    pub fn with_wrap(mut self, wrap: WrapMode) -> Self {
        self.wrap = wrap;
        self
    }

    /// Clamp to a border of the given color
    pub fn with_border(mut self, color: [f32; 4]) -> Self {
        self.wrap = WrapMode::ClampToBorder;
        self.border_color = Some(color);
        self
    }
}

/// Description of a renderbuffer to allocate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderbufferDesc {
    /// Storage format
    pub format: TextureFormat,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// Framebuffer attachment point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Attachment {
    /// Color attachment by index
    Color(u32),
    /// Depth only
    Depth,
    /// Combined depth and stencil
    DepthStencil,
}

/// Which framebuffer binding point(s) an operation addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramebufferTarget {
    /// Destination of draws, clears and blits
    Draw,
    /// Source of blits and reads
    Read,
    /// Both binding points
    Both,
}

/// Result of a framebuffer completeness check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramebufferStatus {
    /// Ready to render into
    Complete,
    /// An attachment has a format that cannot be used at its attachment point
    IncompleteAttachment,
    /// Nothing is attached
    MissingAttachment,
    /// Attachments disagree on size
    IncompleteDimensions,
    /// A selected draw buffer has no attachment
    IncompleteDrawBuffer,
    /// The read buffer has no attachment
    IncompleteReadBuffer,
    /// The framebuffer name is unknown
    Undefined,
}

impl FramebufferStatus {
    /// Whether the framebuffer can be rendered into
    pub const fn is_complete(self) -> bool {
        matches!(self, Self::Complete)
    }

    /// Human-readable reason
    pub const fn reason(self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::IncompleteAttachment => "incomplete attachment",
            Self::MissingAttachment => "missing attachment",
            Self::IncompleteDimensions => "attachment dimensions differ",
            Self::IncompleteDrawBuffer => "draw buffer without attachment",
            Self::IncompleteReadBuffer => "read buffer without attachment",
            Self::Undefined => "undefined framebuffer",
        }
    }
}

impl std::fmt::Display for FramebufferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.reason())
    }
}

bitflags! {
    /// Buffers affected by a clear
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u32 {
        /// Selected color draw buffers
        const COLOR = 1 << 0;
        /// Depth buffer
        const DEPTH = 1 << 1;
        /// Stencil buffer
        const STENCIL = 1 << 2;
    }
}

/// Pixel rectangle of the current draw target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Viewport {
    /// Left edge
    pub x: i32,
    /// Bottom edge
    pub y: i32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Viewport {
    /// Viewport anchored at the origin
    pub const fn new(width: u32, height: u32) -> Self {
        Self { x: 0, y: 0, width, height }
    }
}

/// Source or destination rectangle of a blit, as corner coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlitRegion {
    /// Left
    pub x0: i32,
    /// Bottom
    pub y0: i32,
    /// Right (exclusive)
    pub x1: i32,
    /// Top (exclusive)
    pub y1: i32,
}

impl BlitRegion {
    /// Region spanning a whole `width` x `height` surface
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x0: 0,
            y0: 0,
            x1: i32::try_from(width).unwrap_or(i32::MAX),
            y1: i32::try_from(height).unwrap_or(i32::MAX),
        }
    }
}

/// Depth comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepthFunc {
    /// Pass when closer
    Less,
    /// Pass when closer or equal (skybox at the far plane)
    LessEqual,
}

/// Depth test configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepthState {
    /// No depth testing or writing
    Disabled,
    /// Test and write with the given comparison
    Enabled(DepthFunc),
}

/// Color blending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Overwrite
    Disabled,
    /// `ONE, ONE`: accumulate light contributions
    Additive,
    /// `SRC_ALPHA, ONE_MINUS_SRC_ALPHA`
    Alpha,
}

/// Face culling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CullMode {
    /// Draw both faces
    Disabled,
    /// Cull back faces
    Back,
    /// Cull front faces
    Front,
}

/// Polygon rasterization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolygonMode {
    /// Filled triangles
    Fill,
    /// Wireframe
    Line,
}

/// A value assigned to a named program uniform
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    /// `bool`
    Bool(bool),
    /// `int` or sampler unit
    Int(i32),
    /// `float`
    Float(f32),
    /// `vec2`
    Vec2(Vec2),
    /// `vec3`
    Vec3(Vec3),
    /// `vec4`
    Vec4(Vec4),
    /// `mat4`
    Mat4(Mat4),
    /// `mat4[]`
    Mat4Array(Vec<Mat4>),
}

/// Programmable pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShaderStage {
    /// Vertex shader
    Vertex,
    /// Tessellation control shader
    TessControl,
    /// Tessellation evaluation shader
    TessEvaluation,
    /// Geometry shader
    Geometry,
    /// Fragment shader
    Fragment,
}

/// Source files making up one program, in pipeline order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSources {
    /// Diagnostic label, e.g. `"Model"` or `"PointLightShadow"`
    pub label: String,
    /// Stage source paths
    pub stages: Vec<(ShaderStage, PathBuf)>,
}

impl ShaderSources {
    /// Vertex and fragment stages
    pub fn vertex_fragment(label: impl Into<String>, vertex: impl Into<PathBuf>, fragment: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            stages: vec![
                (ShaderStage::Vertex, vertex.into()),
                (ShaderStage::Fragment, fragment.into()),
            ],
        }
    }

    /// Insert an extra stage, keeping the stages in pipeline order
    pub fn with_stage(mut self, stage: ShaderStage, path: impl Into<PathBuf>) -> Self {
        self.stages.push((stage, path.into()));
        self.stages.sort_by_key(|(stage, _)| *stage);
        self
    }

    /// Whether the program includes the given stage
    pub fn has_stage(&self, stage: ShaderStage) -> bool {
        self.stages.iter().any(|(s, _)| *s == stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_stage_keeps_pipeline_order() {
        let sources = ShaderSources::vertex_fragment("Model", "model.vert", "model.frag")
            .with_stage(ShaderStage::TessEvaluation, "model.tese")
            .with_stage(ShaderStage::TessControl, "model.tesc");
        let order: Vec<ShaderStage> = sources.stages.iter().map(|(stage, _)| *stage).collect();
        assert_eq!(
            order,
            vec![
                ShaderStage::Vertex,
                ShaderStage::TessControl,
                ShaderStage::TessEvaluation,
                ShaderStage::Fragment,
            ]
        );
        assert!(!sources.has_stage(ShaderStage::Geometry));
    }

    #[test]
    fn test_depth_cube_descriptor() {
        let desc = TextureDesc::depth_cube(512);
        assert_eq!(desc.kind, TextureKind::CubeMap);
        assert!(desc.format.is_depth());
        assert!(!desc.format.has_stencil());
        assert_eq!((desc.width, desc.height), (512, 512));
    }

    #[test]
    fn test_border_switches_wrap_mode() {
        let desc = TextureDesc::depth_2d(1024).with_border([1.0; 4]);
        assert_eq!(desc.wrap, WrapMode::ClampToBorder);
        assert_eq!(desc.border_color, Some([1.0; 4]));
    }
}
