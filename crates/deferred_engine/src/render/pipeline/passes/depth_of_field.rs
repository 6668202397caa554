//! Depth of field: blend the sharp image with a blurred copy by distance from focus

use crate::render::api::{BlendMode, DepthState, GraphicsDevice, TextureKind};
use crate::render::gbuffer::{BlurTarget, GBufferTarget};
use crate::render::pipeline::frame::FrameMatrices;
use crate::render::pipeline::DeferredRenderer;

use super::bind_target;

impl DeferredRenderer {
    /// Blur the composited image and blend it back into the vertical blur target
    ///
    /// Returns the number of blur draws.
    pub(crate) fn depth_of_field_pass(&self, device: &mut dyn GraphicsDevice, matrices: &FrameMatrices) -> u32 {
        // The composite moves to the final target so both blur targets are free
        self.gbuffer.copy_blur_to_final(device, BlurTarget::Vertical);
        let draws = self.blur(device, Some(GBufferTarget::Final), self.settings.bloom.blur_iterations.max(1));

        self.gbuffer.bind_for_depth_of_field_pass(device);
        device.set_depth_state(DepthState::Disabled);
        device.set_blend_mode(BlendMode::Disabled);

        let dof = &self.settings.postprocess.depth_of_field;
        let program = &self.programs.depth_of_field;
        program.activate(device);
        bind_target(device, &self.gbuffer, program, "u_position", GBufferTarget::Position);
        bind_target(device, &self.gbuffer, program, "u_final", GBufferTarget::Final);

        let blurred = BlurTarget::Horizontal;
        device.bind_texture(blurred.texture_unit(), TextureKind::Texture2D, self.gbuffer.blur_texture(blurred));
        program.set_sampler(device, "u_finalBlur", blurred.texture_unit());
        program.set_float(device, "u_focusDistance", dof.focus_distance);
        program.set_float(device, "u_depthOfField", dof.range);
        program.set_bool(device, "u_useDoF", dof.enabled);
        program.set_vec3(device, "u_cameraPos", matrices.camera_position);
        device.draw_mesh(self.meshes.fullscreen_quad);
        draws
    }
}
