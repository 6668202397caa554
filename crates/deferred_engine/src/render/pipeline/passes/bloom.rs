//! Bright-pass extraction and separable blur

use crate::render::api::{BlendMode, DepthState, GraphicsDevice, TextureKind};
use crate::render::gbuffer::{BlurTarget, GBufferTarget};
use crate::render::pipeline::DeferredRenderer;

use super::bind_target;

impl DeferredRenderer {
    /// Write the parts of the lit image and emission above the threshold
    /// into the horizontal blur target
    pub(crate) fn threshold_pass(&self, device: &mut dyn GraphicsDevice) {
        self.gbuffer.bind_for_threshold_pass(device);
        device.set_depth_state(DepthState::Disabled);
        device.set_blend_mode(BlendMode::Disabled);

        let bloom = &self.settings.bloom;
        let program = &self.programs.threshold;
        program.activate(device);
        bind_target(device, &self.gbuffer, program, "u_final", GBufferTarget::Final);
        bind_target(device, &self.gbuffer, program, "u_emission", GBufferTarget::Emission);
        program.set_float(device, "u_colorWeight", bloom.color_weight);
        program.set_float(device, "u_emissionWeight", bloom.emission_weight);
        program.set_float(device, "u_threshold", bloom.threshold);
        device.draw_mesh(self.meshes.fullscreen_quad);
    }

    /// Ping-pong Gaussian blur between the two blur targets
    ///
    /// Each round is a horizontal draw followed by a vertical one, so the
    /// result always ends in [`BlurTarget::Horizontal`]. The first draw reads
    /// `source` when given, otherwise the horizontal blur target. Returns the
    /// number of draws.
    pub(crate) fn blur(&self, device: &mut dyn GraphicsDevice, source: Option<GBufferTarget>, rounds: u32) -> u32 {
        device.set_depth_state(DepthState::Disabled);
        device.set_blend_mode(BlendMode::Disabled);
        let program = &self.programs.blur;
        program.activate(device);

        let mut draws = 0;
        for _ in 0..rounds {
            for horizontal in [true, false] {
                let (unit, texture) = match source.filter(|_| draws == 0) {
                    Some(target) => (target.texture_unit(), self.gbuffer.texture(target)),
                    None => {
                        let input = BlurTarget::written_by(horizontal).other();
                        (input.texture_unit(), self.gbuffer.blur_texture(input))
                    }
                };
                self.gbuffer.bind_for_blur_pass(device, horizontal);
                device.bind_texture(unit, TextureKind::Texture2D, texture);
                program.set_sampler(device, "u_image", unit);
                program.set_bool(device, "u_horizontal", horizontal);
                device.draw_mesh(self.meshes.fullscreen_quad);
                draws += 1;
            }
        }
        draws
    }
}
