//! Exponential distance fog over the lit image

use crate::render::api::{BlendMode, DepthState, GraphicsDevice};
use crate::render::gbuffer::GBufferTarget;
use crate::render::pipeline::frame::FrameMatrices;
use crate::render::pipeline::DeferredRenderer;

use super::bind_target;

impl DeferredRenderer {
    pub(crate) fn fog_pass(&self, device: &mut dyn GraphicsDevice, matrices: &FrameMatrices) {
        self.gbuffer.bind_for_fog_pass(device);
        device.set_depth_state(DepthState::Disabled);
        device.set_blend_mode(BlendMode::Alpha);

        let fog = &self.settings.fog;
        let program = &self.programs.fog;
        program.activate(device);
        bind_target(device, &self.gbuffer, program, "u_position", GBufferTarget::Position);
        bind_target(device, &self.gbuffer, program, "u_normal", GBufferTarget::Normal);
        program.set_vec3(device, "u_cameraPos", matrices.camera_position);
        program.set_vec3(device, "u_fogColor", fog.color);
        program.set_float(device, "u_fogDensity", fog.density);
        device.draw_mesh(self.meshes.fullscreen_quad);

        device.set_blend_mode(BlendMode::Disabled);
    }
}
