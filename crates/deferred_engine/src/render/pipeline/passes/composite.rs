//! Tone mapping with bloom, and the skybox behind it

use crate::render::api::{BlendMode, CullMode, DepthFunc, DepthState, GraphicsDevice, TextureKind};
use crate::render::gbuffer::{BlurTarget, GBufferTarget, SHADOW_TEXTURE_UNIT};
use crate::render::pipeline::frame::FrameMatrices;
use crate::render::pipeline::DeferredRenderer;

use super::bind_target;

impl DeferredRenderer {
    /// Combine the lit image with the blurred bloom, then expose and gamma-correct
    /// into the vertical blur target
    pub(crate) fn postprocess_pass(&self, device: &mut dyn GraphicsDevice) {
        self.gbuffer.bind_for_postprocess_pass(device);
        device.set_depth_state(DepthState::Disabled);
        device.set_blend_mode(BlendMode::Disabled);

        let postprocess = &self.settings.postprocess;
        let program = &self.programs.postprocess;
        program.activate(device);
        bind_target(device, &self.gbuffer, program, "u_final", GBufferTarget::Final);

        let bloom = BlurTarget::Horizontal;
        device.bind_texture(bloom.texture_unit(), TextureKind::Texture2D, self.gbuffer.blur_texture(bloom));
        program.set_sampler(device, "u_bloom", bloom.texture_unit());
        program.set_float(device, "u_exposure", postprocess.exposure);
        program.set_float(device, "u_gamma", postprocess.gamma);
        device.draw_mesh(self.meshes.fullscreen_quad);
    }

    /// Draw the skybox where no geometry was written; `false` without a cube map
    pub(crate) fn skybox_pass(&self, device: &mut dyn GraphicsDevice, matrices: &FrameMatrices) -> bool {
        if !self.skybox_texture.is_valid() {
            log::trace!("[PIPELINE] Skybox pass skipped, no cube map");
            return false;
        }

        self.gbuffer.bind_for_skybox_pass(device);
        device.set_depth_state(DepthState::Enabled(DepthFunc::LessEqual));
        device.set_blend_mode(BlendMode::Disabled);
        device.set_cull_mode(CullMode::Disabled);

        let program = &self.programs.skybox;
        program.activate(device);
        bind_target(device, &self.gbuffer, program, "u_normal", GBufferTarget::Normal);
        device.bind_texture(SHADOW_TEXTURE_UNIT, TextureKind::CubeMap, self.skybox_texture);
        program.set_sampler(device, "u_skybox", SHADOW_TEXTURE_UNIT);
        program.set_mat4(device, "u_view", &matrices.rotation_only_view());
        program.set_mat4(device, "u_projection", &matrices.projection);
        device.draw_mesh(self.meshes.skybox_cube);

        device.set_depth_state(DepthState::Disabled);
        true
    }
}
