//! Off-screen render targets
//!
//! The [`GeometryBuffer`] owns every target the passes render into:
//!
//! - the default framebuffer with six color targets ([`GBufferTarget`]) and
//!   a depth/stencil renderbuffer
//! - the blur framebuffer with two ping-pong targets ([`BlurTarget`])
//! - a directional shadow framebuffer with a depth texture
//! - one framebuffer with a depth cube map per point light
//!
//! The `bind_for_*` operations put the device in the framebuffer, draw
//! buffer and clear state a pass expects. None of them clear color outputs
//! except the geometry pass, which starts each frame from scratch.

use crate::render::api::{
    Attachment, BlitRegion, ClearFlags, FilterMode, FramebufferHandle, FramebufferStatus, FramebufferTarget,
    GraphicsDevice, ObjectRef, RenderbufferDesc, RenderbufferHandle, TextureDesc, TextureFormat, TextureHandle,
};
use crate::render::{RenderError, RenderResult};

/// Color targets of the default framebuffer
///
/// The discriminant is both the color attachment index and the texture unit
/// the target is sampled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GBufferTarget {
    /// World-space position
    Position = 0,
    /// World-space normal
    Normal = 1,
    /// Albedo in RGB, specular strength in A
    AlbedoSpecular = 2,
    /// Emissive color
    Emission = 3,
    /// Ambient color in RGB, shininess in A
    AmbientShininess = 4,
    /// Lit and composited color
    Final = 5,
}

impl GBufferTarget {
    /// Number of color targets
    pub const COUNT: usize = 6;

    /// Every target in attachment order
    pub const ALL: [Self; Self::COUNT] = [
        Self::Position,
        Self::Normal,
        Self::AlbedoSpecular,
        Self::Emission,
        Self::AmbientShininess,
        Self::Final,
    ];

    /// Color attachment index
    pub const fn attachment(self) -> u32 {
        self as u32
    }

    /// Texture unit the target is bound to when sampled
    pub const fn texture_unit(self) -> u32 {
        self as u32
    }

    /// Storage format
    pub const fn format(self) -> TextureFormat {
        match self {
            Self::Position | Self::Normal | Self::Emission => TextureFormat::Rgb16F,
            Self::AlbedoSpecular | Self::AmbientShininess | Self::Final => TextureFormat::Rgba16F,
        }
    }

    /// Debug label
    pub const fn label(self) -> &'static str {
        match self {
            Self::Position => "GBuffer Position",
            Self::Normal => "GBuffer Normal",
            Self::AlbedoSpecular => "GBuffer AlbedoSpecular",
            Self::Emission => "GBuffer Emission",
            Self::AmbientShininess => "GBuffer AmbientShininess",
            Self::Final => "GBuffer Final",
        }
    }
}

/// Targets the geometry pass writes, in fragment output order
pub const GEOMETRY_OUTPUTS: [GBufferTarget; 5] = [
    GBufferTarget::Position,
    GBufferTarget::Normal,
    GBufferTarget::AlbedoSpecular,
    GBufferTarget::AmbientShininess,
    GBufferTarget::Emission,
];

/// Ping-pong targets of the blur framebuffer
///
/// Each is named after the blur direction that reads it: the horizontal
/// pass samples `Horizontal` and writes `Vertical`, the vertical pass
/// samples `Vertical` and writes `Horizontal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlurTarget {
    /// Input of the vertical pass
    Vertical = 0,
    /// Input of the horizontal pass
    Horizontal = 1,
}

impl BlurTarget {
    /// Number of blur targets
    pub const COUNT: usize = 2;

    /// Every target in attachment order
    pub const ALL: [Self; Self::COUNT] = [Self::Vertical, Self::Horizontal];

    /// Color attachment index in the blur framebuffer
    pub const fn attachment(self) -> u32 {
        self as u32
    }

    /// Texture unit the target is bound to when sampled
    pub const fn texture_unit(self) -> u32 {
        SHADOW_TEXTURE_UNIT + self as u32
    }

    /// The other target
    pub const fn other(self) -> Self {
        match self {
            Self::Vertical => Self::Horizontal,
            Self::Horizontal => Self::Vertical,
        }
    }

    /// Target a blur pass in the given direction writes
    pub const fn written_by(horizontal: bool) -> Self {
        if horizontal {
            Self::Vertical
        } else {
            Self::Horizontal
        }
    }

    /// Debug label
    pub const fn label(self) -> &'static str {
        match self {
            Self::Vertical => "Blur Vertical",
            Self::Horizontal => "Blur Horizontal",
        }
    }
}

/// Texture unit for shadow maps and the skybox, just past the G-buffer targets
pub const SHADOW_TEXTURE_UNIT: u32 = GBufferTarget::COUNT as u32;

/// Framebuffer and depth cube map of one point light
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointShadowMap {
    /// Framebuffer rendering into the cube map
    pub framebuffer: FramebufferHandle,
    /// Depth cube map
    pub depth_map: TextureHandle,
}

/// Every off-screen target of the renderer
#[derive(Debug)]
pub struct GeometryBuffer {
    width: u32,
    height: u32,
    shadow_resolution: u32,
    point_shadow_resolution: u32,

    default_framebuffer: FramebufferHandle,
    blur_framebuffer: FramebufferHandle,
    directional_shadow_framebuffer: FramebufferHandle,

    targets: [TextureHandle; GBufferTarget::COUNT],
    blur_targets: [TextureHandle; BlurTarget::COUNT],
    depth_stencil: RenderbufferHandle,
    directional_shadow_map: TextureHandle,
    point_shadows: Vec<PointShadowMap>,

    incomplete: Vec<(&'static str, FramebufferStatus)>,
}

impl GeometryBuffer {
    /// Allocate every target for a `width` x `height` output
    ///
    /// `shadow_resolution` sizes the directional shadow map. Point-light
    /// shadow maps start empty; see
    /// [`initialize_point_light_shadows`](Self::initialize_point_light_shadows).
    ///
    /// Allocation failures release whatever was created and return the
    /// error. An incomplete framebuffer is logged and reported through
    /// [`is_complete`](Self::is_complete) instead.
    pub fn create(
        device: &mut dyn GraphicsDevice,
        width: u32,
        height: u32,
        shadow_resolution: u32,
    ) -> RenderResult<Self> {
        let mut gbuffer = Self {
            width,
            height,
            shadow_resolution,
            point_shadow_resolution: 0,
            default_framebuffer: FramebufferHandle::INVALID,
            blur_framebuffer: FramebufferHandle::INVALID,
            directional_shadow_framebuffer: FramebufferHandle::INVALID,
            targets: [TextureHandle::INVALID; GBufferTarget::COUNT],
            blur_targets: [TextureHandle::INVALID; BlurTarget::COUNT],
            depth_stencil: RenderbufferHandle::INVALID,
            directional_shadow_map: TextureHandle::INVALID,
            point_shadows: Vec::new(),
            incomplete: Vec::new(),
        };

        if let Err(e) = gbuffer.allocate(device) {
            log::error!("[GBUFFER] Allocation failed for {width}x{height}: {e}");
            gbuffer.destroy(device);
            return Err(e);
        }
        device.bind_framebuffer(FramebufferTarget::Both, None);

        log::info!(
            "[GBUFFER] Created {width}x{height} targets, {shadow_resolution}px directional shadow map"
        );
        Ok(gbuffer)
    }

    fn allocate(&mut self, device: &mut dyn GraphicsDevice) -> RenderResult<()> {
        self.allocate_default_framebuffer(device)?;
        self.allocate_blur_framebuffer(device)?;
        self.allocate_directional_shadow(device)?;
        Ok(())
    }

    fn allocate_default_framebuffer(&mut self, device: &mut dyn GraphicsDevice) -> RenderResult<()> {
        self.default_framebuffer = device.create_framebuffer()?;
        device.label_object(ObjectRef::Framebuffer(self.default_framebuffer), "Default FBO");
        device.bind_framebuffer(FramebufferTarget::Both, Some(self.default_framebuffer));

        for target in GBufferTarget::ALL {
            let texture = device.create_texture(&TextureDesc::color_2d(self.width, self.height, target.format()))?;
            self.targets[target as usize] = texture;
            device.label_object(ObjectRef::Texture(texture), target.label());
            device.attach_texture(self.default_framebuffer, Attachment::Color(target.attachment()), texture)?;
        }

        self.depth_stencil = device.create_renderbuffer(&RenderbufferDesc {
            format: TextureFormat::Depth32FStencil8,
            width: self.width,
            height: self.height,
        })?;
        device.label_object(ObjectRef::Renderbuffer(self.depth_stencil), "GBuffer DepthStencil");
        device.attach_renderbuffer(self.default_framebuffer, Attachment::DepthStencil, self.depth_stencil)?;

        let all: Vec<u32> = GBufferTarget::ALL.iter().map(|target| target.attachment()).collect();
        device.set_draw_buffers(&all);
        self.check_status(device, "Default FBO", self.default_framebuffer);
        Ok(())
    }

    fn allocate_blur_framebuffer(&mut self, device: &mut dyn GraphicsDevice) -> RenderResult<()> {
        self.blur_framebuffer = device.create_framebuffer()?;
        device.label_object(ObjectRef::Framebuffer(self.blur_framebuffer), "Blur FBO");
        device.bind_framebuffer(FramebufferTarget::Both, Some(self.blur_framebuffer));

        for target in BlurTarget::ALL {
            let desc = TextureDesc::color_2d(self.width, self.height, TextureFormat::Rgba16F);
            let texture = device.create_texture(&desc)?;
            self.blur_targets[target as usize] = texture;
            device.label_object(ObjectRef::Texture(texture), target.label());
            device.attach_texture(self.blur_framebuffer, Attachment::Color(target.attachment()), texture)?;
        }

        let all: Vec<u32> = BlurTarget::ALL.iter().map(|target| target.attachment()).collect();
        device.set_draw_buffers(&all);
        self.check_status(device, "Blur FBO", self.blur_framebuffer);
        Ok(())
    }

    fn allocate_directional_shadow(&mut self, device: &mut dyn GraphicsDevice) -> RenderResult<()> {
        self.directional_shadow_framebuffer = device.create_framebuffer()?;
        device.label_object(
            ObjectRef::Framebuffer(self.directional_shadow_framebuffer),
            "Directional Light FBO",
        );

        // Samples outside the map read as fully lit
        let desc = TextureDesc::depth_2d(self.shadow_resolution).with_border([1.0, 1.0, 1.0, 1.0]);
        self.directional_shadow_map = device.create_texture(&desc)?;
        device.label_object(ObjectRef::Texture(self.directional_shadow_map), "Directional Shadow Map");

        attach_depth_only(device, self.directional_shadow_framebuffer, self.directional_shadow_map)?;
        self.check_status(device, "Directional Light FBO", self.directional_shadow_framebuffer);
        Ok(())
    }

    fn check_status(&mut self, device: &dyn GraphicsDevice, name: &'static str, framebuffer: FramebufferHandle) {
        let status = device.check_framebuffer_status(framebuffer);
        if status.is_complete() {
            log::debug!("[GBUFFER] {name} complete");
        } else {
            log::error!("[GBUFFER] {name} incomplete: {status}");
            self.incomplete.push((name, status));
        }
    }

    /// Release every framebuffer and target
    ///
    /// Framebuffers go first, then color targets, depth storage and shadow
    /// maps. Calling it again is a no-op.
    pub fn destroy(&mut self, device: &mut dyn GraphicsDevice) {
        device.delete_framebuffer(std::mem::take(&mut self.default_framebuffer));
        device.delete_framebuffer(std::mem::take(&mut self.blur_framebuffer));
        device.delete_framebuffer(std::mem::take(&mut self.directional_shadow_framebuffer));
        for shadow in &self.point_shadows {
            device.delete_framebuffer(shadow.framebuffer);
        }

        for texture in self.targets.iter_mut().chain(self.blur_targets.iter_mut()) {
            device.delete_texture(std::mem::take(texture));
        }
        device.delete_renderbuffer(std::mem::take(&mut self.depth_stencil));
        device.delete_texture(std::mem::take(&mut self.directional_shadow_map));
        for shadow in self.point_shadows.drain(..) {
            device.delete_texture(shadow.depth_map);
        }
        self.incomplete.clear();
    }

    /// Replace the point-light shadow maps with exactly `count` new ones
    ///
    /// Existing maps are released first, so repeated calls never leak. On
    /// allocation failure the maps created so far are kept and the error is
    /// returned.
    pub fn initialize_point_light_shadows(
        &mut self,
        device: &mut dyn GraphicsDevice,
        count: usize,
        resolution: u32,
    ) -> RenderResult<()> {
        self.release_point_light_shadows(device);
        self.point_shadow_resolution = resolution;

        for index in 0..count {
            let framebuffer = device.create_framebuffer()?;
            device.label_object(ObjectRef::Framebuffer(framebuffer), &format!("Point Light FBO {index}"));

            let desc = TextureDesc::depth_cube(resolution);
            let depth_map = match device.create_texture(&desc) {
                Ok(texture) => texture,
                Err(e) => {
                    device.delete_framebuffer(framebuffer);
                    return Err(e);
                }
            };
            device.label_object(ObjectRef::Texture(depth_map), &format!("Point Shadow Map {index}"));
            self.point_shadows.push(PointShadowMap { framebuffer, depth_map });

            attach_depth_only(device, framebuffer, depth_map)?;
            let status = device.check_framebuffer_status(framebuffer);
            if !status.is_complete() {
                log::error!("[GBUFFER] Point Light FBO {index} incomplete: {status}");
            }
        }
        device.bind_framebuffer(FramebufferTarget::Both, None);

        log::debug!("[GBUFFER] Allocated {count} point light shadow maps at {resolution}px");
        Ok(())
    }

    fn release_point_light_shadows(&mut self, device: &mut dyn GraphicsDevice) {
        for shadow in self.point_shadows.drain(..) {
            device.delete_framebuffer(shadow.framebuffer);
            device.delete_texture(shadow.depth_map);
        }
    }

    // === Pass bindings ===

    /// Write every geometry output and clear color and depth
    pub fn bind_for_geometry_pass(&self, device: &mut dyn GraphicsDevice) {
        device.bind_framebuffer(FramebufferTarget::Draw, Some(self.default_framebuffer));
        let outputs: Vec<u32> = GEOMETRY_OUTPUTS.iter().map(|target| target.attachment()).collect();
        device.set_draw_buffers(&outputs);
        device.clear(ClearFlags::COLOR | ClearFlags::DEPTH);
    }

    /// Accumulate light into the final target
    pub fn bind_for_light_pass(&self, device: &mut dyn GraphicsDevice) {
        self.bind_final_output(device);
    }

    /// Blend fog onto the final target
    pub fn bind_for_fog_pass(&self, device: &mut dyn GraphicsDevice) {
        self.bind_final_output(device);
    }

    /// Extract bright areas into the horizontal blur target
    pub fn bind_for_threshold_pass(&self, device: &mut dyn GraphicsDevice) {
        self.bind_blur_output(device, BlurTarget::Horizontal);
    }

    /// Write the target the next blur pass in the given direction produces
    pub fn bind_for_blur_pass(&self, device: &mut dyn GraphicsDevice, horizontal: bool) {
        self.bind_blur_output(device, BlurTarget::written_by(horizontal));
    }

    /// Tone-mapped composite into the vertical blur target
    pub fn bind_for_postprocess_pass(&self, device: &mut dyn GraphicsDevice) {
        self.bind_blur_output(device, BlurTarget::Vertical);
    }

    /// Skybox over the tone-mapped composite
    pub fn bind_for_skybox_pass(&self, device: &mut dyn GraphicsDevice) {
        self.bind_blur_output(device, BlurTarget::Vertical);
    }

    /// Depth-of-field blend into the vertical blur target
    pub fn bind_for_depth_of_field_pass(&self, device: &mut dyn GraphicsDevice) {
        self.bind_blur_output(device, BlurTarget::Vertical);
    }

    /// Render into the directional shadow map, clearing its depth
    pub fn bind_for_directional_shadow_pass(&self, device: &mut dyn GraphicsDevice) {
        device.bind_framebuffer(FramebufferTarget::Both, Some(self.directional_shadow_framebuffer));
        device.clear(ClearFlags::DEPTH);
    }

    /// Render into the cube map of point light `index`, clearing its depth
    pub fn bind_for_point_shadow_pass(&self, device: &mut dyn GraphicsDevice, index: usize) -> RenderResult<()> {
        let Some(shadow) = self.point_shadows.get(index) else {
            log::error!(
                "[GBUFFER] Point shadow pass index {index} out of range ({} allocated)",
                self.point_shadows.len()
            );
            return Err(RenderError::PointShadowOutOfRange {
                index,
                count: self.point_shadows.len(),
            });
        };
        device.bind_framebuffer(FramebufferTarget::Both, Some(shadow.framebuffer));
        device.clear(ClearFlags::DEPTH);
        Ok(())
    }

    /// Make the default framebuffer the read source
    pub fn bind_for_read(&self, device: &mut dyn GraphicsDevice) {
        device.bind_framebuffer(FramebufferTarget::Read, Some(self.default_framebuffer));
    }

    /// Select a color target of the default framebuffer for reading
    pub fn read_target(&self, device: &mut dyn GraphicsDevice, target: GBufferTarget) {
        device.set_read_buffer(Some(target.attachment()));
    }

    /// Copy a whole G-buffer target into a rectangle of the output surface
    pub fn blit_to_output(
        &self,
        device: &mut dyn GraphicsDevice,
        target: GBufferTarget,
        destination: BlitRegion,
    ) {
        self.bind_for_read(device);
        self.read_target(device, target);
        device.bind_framebuffer(FramebufferTarget::Draw, None);
        device.blit(self.full_region(), destination, FilterMode::Linear);
    }

    /// Copy a whole blur target into a rectangle of the output surface
    pub fn blit_blur_to_output(&self, device: &mut dyn GraphicsDevice, target: BlurTarget, destination: BlitRegion) {
        device.bind_framebuffer(FramebufferTarget::Read, Some(self.blur_framebuffer));
        device.set_read_buffer(Some(target.attachment()));
        device.bind_framebuffer(FramebufferTarget::Draw, None);
        device.blit(self.full_region(), destination, FilterMode::Linear);
    }

    /// Copy a blur target over the final target
    pub fn copy_blur_to_final(&self, device: &mut dyn GraphicsDevice, source: BlurTarget) {
        device.bind_framebuffer(FramebufferTarget::Read, Some(self.blur_framebuffer));
        device.set_read_buffer(Some(source.attachment()));
        self.bind_final_output(device);
        device.blit(self.full_region(), self.full_region(), FilterMode::Nearest);
    }

    /// Clear one color target of the default framebuffer
    pub fn clear_target(&self, device: &mut dyn GraphicsDevice, target: GBufferTarget) {
        device.bind_framebuffer(FramebufferTarget::Both, Some(self.default_framebuffer));
        device.set_draw_buffers(&[target.attachment()]);
        device.clear(ClearFlags::COLOR);
        device.bind_framebuffer(FramebufferTarget::Both, None);
    }

    /// Clear one blur target
    pub fn clear_blur_target(&self, device: &mut dyn GraphicsDevice, target: BlurTarget) {
        device.bind_framebuffer(FramebufferTarget::Both, Some(self.blur_framebuffer));
        device.set_draw_buffers(&[target.attachment()]);
        device.clear(ClearFlags::COLOR);
        device.bind_framebuffer(FramebufferTarget::Both, None);
    }

    fn bind_final_output(&self, device: &mut dyn GraphicsDevice) {
        device.bind_framebuffer(FramebufferTarget::Draw, Some(self.default_framebuffer));
        device.set_draw_buffers(&[GBufferTarget::Final.attachment()]);
    }

    fn bind_blur_output(&self, device: &mut dyn GraphicsDevice, target: BlurTarget) {
        device.bind_framebuffer(FramebufferTarget::Draw, Some(self.blur_framebuffer));
        device.set_draw_buffers(&[target.attachment()]);
    }

    fn full_region(&self) -> BlitRegion {
        BlitRegion::full(self.width, self.height)
    }

    // === Accessors ===

    /// Texture backing a G-buffer target
    pub fn texture(&self, target: GBufferTarget) -> TextureHandle {
        self.targets[target as usize]
    }

    /// Texture backing a blur target
    pub fn blur_texture(&self, target: BlurTarget) -> TextureHandle {
        self.blur_targets[target as usize]
    }

    /// Directional shadow depth map
    pub const fn directional_shadow_map(&self) -> TextureHandle {
        self.directional_shadow_map
    }

    /// Depth cube map of point light `index`, or [`TextureHandle::INVALID`] when out of range
    pub fn point_light_shadow_map(&self, index: usize) -> TextureHandle {
        match self.point_shadows.get(index) {
            Some(shadow) => shadow.depth_map,
            None => {
                log::error!(
                    "[GBUFFER] Point shadow map index {index} out of range ({} allocated)",
                    self.point_shadows.len()
                );
                TextureHandle::INVALID
            }
        }
    }

    /// Number of allocated point-light shadow maps
    pub fn point_light_count(&self) -> usize {
        self.point_shadows.len()
    }

    /// Allocated point-light shadow maps
    pub fn point_shadow_maps(&self) -> &[PointShadowMap] {
        &self.point_shadows
    }

    /// Default framebuffer holding the G-buffer targets
    pub const fn default_framebuffer(&self) -> FramebufferHandle {
        self.default_framebuffer
    }

    /// Blur framebuffer
    pub const fn blur_framebuffer(&self) -> FramebufferHandle {
        self.blur_framebuffer
    }

    /// Directional shadow framebuffer
    pub const fn directional_shadow_framebuffer(&self) -> FramebufferHandle {
        self.directional_shadow_framebuffer
    }

    /// Output width in pixels
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Output height in pixels
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Directional shadow map edge length
    pub const fn shadow_resolution(&self) -> u32 {
        self.shadow_resolution
    }

    /// Point shadow cube face edge length
    pub const fn point_shadow_resolution(&self) -> u32 {
        self.point_shadow_resolution
    }

    /// Whether every framebuffer checked at creation was complete
    pub fn is_complete(&self) -> bool {
        self.incomplete.is_empty()
    }

    /// Framebuffers found incomplete at creation, with the reason
    pub fn incomplete_framebuffers(&self) -> &[(&'static str, FramebufferStatus)] {
        &self.incomplete
    }

    /// Whether the targets have been released
    pub const fn is_destroyed(&self) -> bool {
        !self.default_framebuffer.is_valid()
    }
}

/// Attach a depth texture to a framebuffer that has no color output
fn attach_depth_only(
    device: &mut dyn GraphicsDevice,
    framebuffer: FramebufferHandle,
    depth: TextureHandle,
) -> RenderResult<()> {
    device.attach_texture(framebuffer, Attachment::Depth, depth)?;
    device.bind_framebuffer(FramebufferTarget::Both, Some(framebuffer));
    device.set_draw_buffers(&[]);
    device.set_read_buffer(None);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::api::{TextureKind, WrapMode};
    use crate::render::backends::HeadlessDevice;

    #[test]
    fn test_create_allocates_complete_targets() {
        let mut device = HeadlessDevice::new(800, 600);
        let gbuffer = GeometryBuffer::create(&mut device, 800, 600, 1024).unwrap();

        assert!(gbuffer.is_complete());
        for target in GBufferTarget::ALL {
            let desc = device.texture_desc(gbuffer.texture(target)).unwrap();
            assert_eq!((desc.width, desc.height), (800, 600));
            assert_eq!(desc.format, target.format());
        }
        let shadow = device.texture_desc(gbuffer.directional_shadow_map()).unwrap();
        assert_eq!((shadow.width, shadow.height), (1024, 1024));
        assert_eq!(shadow.wrap, WrapMode::ClampToBorder);
        assert_eq!(shadow.border_color, Some([1.0; 4]));
    }

    #[test]
    fn test_blur_targets_are_nearest_clamped() {
        let mut device = HeadlessDevice::new(800, 600);
        let gbuffer = GeometryBuffer::create(&mut device, 800, 600, 1024).unwrap();

        for target in BlurTarget::ALL {
            let desc = device.texture_desc(gbuffer.blur_texture(target)).unwrap();
            assert_eq!((desc.width, desc.height), (800, 600));
            assert_eq!(desc.filter, FilterMode::Nearest);
            assert_eq!(desc.wrap, WrapMode::ClampToEdge);
        }
    }

    #[test]
    fn test_point_shadow_maps_are_nearest_clamped_cubes() {
        let mut device = HeadlessDevice::new(800, 600);
        let mut gbuffer = GeometryBuffer::create(&mut device, 800, 600, 1024).unwrap();
        gbuffer.initialize_point_light_shadows(&mut device, 2, 512).unwrap();

        for shadow in gbuffer.point_shadow_maps() {
            let desc = device.texture_desc(shadow.depth_map).unwrap();
            assert_eq!(desc.kind, TextureKind::CubeMap);
            assert_eq!(desc.filter, FilterMode::Nearest);
            assert_eq!(desc.wrap, WrapMode::ClampToEdge);
            assert_eq!(device.check_framebuffer_status(shadow.framebuffer), FramebufferStatus::Complete);
            assert_eq!(device.draw_buffers(shadow.framebuffer), Some(&[][..]));
            assert_eq!(device.read_buffer(shadow.framebuffer), Some(None));
        }
    }

    #[test]
    fn test_out_of_range_point_shadow_queries() {
        let mut device = HeadlessDevice::new(64, 64);
        let mut gbuffer = GeometryBuffer::create(&mut device, 64, 64, 128).unwrap();
        gbuffer.initialize_point_light_shadows(&mut device, 1, 64).unwrap();

        assert!(gbuffer.point_light_shadow_map(0).is_valid());
        assert_eq!(gbuffer.point_light_shadow_map(1), TextureHandle::INVALID);
        assert!(matches!(
            gbuffer.bind_for_point_shadow_pass(&mut device, 1),
            Err(RenderError::PointShadowOutOfRange { index: 1, count: 1 })
        ));
    }

    #[test]
    fn test_blur_pass_writes_the_other_target() {
        let mut device = HeadlessDevice::new(64, 64);
        let gbuffer = GeometryBuffer::create(&mut device, 64, 64, 128).unwrap();

        gbuffer.bind_for_blur_pass(&mut device, true);
        assert_eq!(device.draw_buffers(gbuffer.blur_framebuffer()), Some(&[BlurTarget::Vertical.attachment()][..]));
        gbuffer.bind_for_blur_pass(&mut device, false);
        assert_eq!(device.draw_buffers(gbuffer.blur_framebuffer()), Some(&[BlurTarget::Horizontal.attachment()][..]));
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let mut device = HeadlessDevice::new(64, 64);
        let mut gbuffer = GeometryBuffer::create(&mut device, 64, 64, 128).unwrap();
        gbuffer.initialize_point_light_shadows(&mut device, 3, 32).unwrap();
        gbuffer.destroy(&mut device);
        gbuffer.destroy(&mut device);
        assert!(gbuffer.is_destroyed());
        assert_eq!(device.stats().live_objects(), 0);
    }

    #[test]
    fn test_failed_allocation_releases_partial_targets() {
        let mut device = HeadlessDevice::new(64, 64);
        device.set_texture_limit(Some(4));
        let result = GeometryBuffer::create(&mut device, 64, 64, 128);
        assert!(matches!(result, Err(RenderError::ResourceCreationFailed(_))));
        assert_eq!(device.stats().live_objects(), 0);
    }

    #[test]
    fn test_texture_units_follow_policy() {
        assert_eq!(GBufferTarget::Final.texture_unit(), 5);
        assert_eq!(SHADOW_TEXTURE_UNIT, 6);
        assert_eq!(BlurTarget::Vertical.texture_unit(), 6);
        assert_eq!(BlurTarget::Horizontal.texture_unit(), 7);
    }
}
