//! Present and end-of-frame cleanup

use crate::render::api::{BlitRegion, FramebufferTarget, GraphicsDevice};
use crate::render::gbuffer::{BlurTarget, GBufferTarget};
use crate::render::pipeline::settings::RenderMode;
use crate::render::pipeline::DeferredRenderer;

/// Output rectangles of the debug view: albedo, normal, position, emission
fn debug_quadrants(width: u32, height: u32) -> [(GBufferTarget, BlitRegion); 4] {
    let w = i32::try_from(width).unwrap_or(i32::MAX);
    let h = i32::try_from(height).unwrap_or(i32::MAX);
    let (hw, hh) = (w / 2, h / 2);
    [
        (GBufferTarget::AlbedoSpecular, BlitRegion { x0: 0, y0: hh, x1: hw, y1: h }),
        (GBufferTarget::Normal, BlitRegion { x0: hw, y0: hh, x1: w, y1: h }),
        (GBufferTarget::Position, BlitRegion { x0: 0, y0: 0, x1: hw, y1: hh }),
        (GBufferTarget::Emission, BlitRegion { x0: hw, y0: 0, x1: w, y1: hh }),
    ]
}

impl DeferredRenderer {
    /// Copy the finished image, or the debug quadrants, to the output surface
    pub(crate) fn present(&self, device: &mut dyn GraphicsDevice) {
        let (width, height) = (self.gbuffer.width(), self.gbuffer.height());
        match self.settings.render_mode {
            RenderMode::PhongComposite => {
                self.gbuffer
                    .blit_blur_to_output(device, Self::output_target(), BlitRegion::full(width, height));
            }
            RenderMode::DebugQuadrants => {
                for (target, region) in debug_quadrants(width, height) {
                    self.gbuffer.blit_to_output(device, target, region);
                }
            }
        }
        device.bind_framebuffer(FramebufferTarget::Both, None);
    }

    /// Clear the targets whose contents must not leak into the next frame
    pub(crate) fn clear_frame_targets(&self, device: &mut dyn GraphicsDevice) {
        self.gbuffer.clear_blur_target(device, BlurTarget::Horizontal);
        self.gbuffer.clear_blur_target(device, BlurTarget::Vertical);
        self.gbuffer.clear_target(device, GBufferTarget::Final);
    }
}
