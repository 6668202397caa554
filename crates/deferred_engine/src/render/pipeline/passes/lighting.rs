//! Lighting: point-light volumes and directional quads, summed into the final target

use crate::foundation::math::{Mat4, Vec2};
use crate::render::api::{BlendMode, CullMode, DepthState, GraphicsDevice, TextureKind};
use crate::render::gbuffer::SHADOW_TEXTURE_UNIT;
use crate::render::pipeline::frame::{FrameMatrices, FrameReport};
use crate::render::pipeline::DeferredRenderer;
use crate::render::program::ShaderProgram;
use crate::render::shadow::POINT_SHADOW_FAR;

use super::{bind_geometry_inputs, debug_group};

/// Largest light-volume radius drawn, matching the camera far plane
const MAX_LIGHT_VOLUME_RADIUS: f32 = 200.0;

impl DeferredRenderer {
    /// Accumulate every light into the final target
    pub(crate) fn lighting_pass(
        &self,
        device: &mut dyn GraphicsDevice,
        matrices: &FrameMatrices,
        report: &mut FrameReport,
    ) {
        self.gbuffer.bind_for_light_pass(device);
        device.set_depth_state(DepthState::Disabled);
        device.set_blend_mode(BlendMode::Additive);

        report.point_lights_drawn =
            debug_group(device, "Pointlight-Pass", |device| self.point_light_pass(device, matrices));
        report.directional_lights_drawn =
            debug_group(device, "DirLight-Pass", |device| self.directional_light_pass(device, matrices));

        device.set_blend_mode(BlendMode::Disabled);
        device.set_cull_mode(CullMode::Disabled);
    }

    fn set_shadow_flags(&self, device: &mut dyn GraphicsDevice, program: &ShaderProgram, active: bool) {
        let shadows = &self.settings.shadows;
        program.set_bool(device, "u_isActive", active);
        program.set_bool(device, "u_showShadows", shadows.show_shadows);
        program.set_bool(device, "u_usePCF", shadows.use_pcf);
        program.set_sampler(device, "u_shadowMap", SHADOW_TEXTURE_UNIT);
    }

    fn point_light_pass(&self, device: &mut dyn GraphicsDevice, matrices: &FrameMatrices) -> usize {
        let program = &self.programs.point_light;
        let active = self.settings.lights.point_active;
        program.activate(device);
        bind_geometry_inputs(device, &self.gbuffer, program);
        program.set_mat4(device, "u_view", &matrices.view);
        program.set_mat4(device, "u_projection", &matrices.projection);
        program.set_vec3(device, "u_cameraPos", matrices.camera_position);
        #[allow(clippy::cast_precision_loss)]
        let screen = Vec2::new(self.gbuffer.width() as f32, self.gbuffer.height() as f32);
        program.set_vec2(device, "u_screenSize", screen);
        program.set_float(device, "u_zFar", POINT_SHADOW_FAR);
        self.set_shadow_flags(device, program, active);

        // Back faces still rasterize when the camera is inside a volume
        device.set_cull_mode(CullMode::Front);

        let mut drawn = 0;
        for (index, light) in self.active_point_lights().iter().enumerate() {
            device.bind_texture(
                SHADOW_TEXTURE_UNIT,
                TextureKind::CubeMap,
                self.gbuffer.point_light_shadow_map(index),
            );
            light.upload(device, program);

            let radius = light.falloff_radius().min(MAX_LIGHT_VOLUME_RADIUS);
            let model = matrices.model * Mat4::new_translation(&light.position()) * Mat4::new_scaling(radius);
            program.set_mat4(device, "u_model", &model);

            if active {
                device.draw_mesh(self.meshes.light_volume);
                drawn += 1;
            }
        }
        drawn
    }

    fn directional_light_pass(&self, device: &mut dyn GraphicsDevice, matrices: &FrameMatrices) -> usize {
        let program = &self.programs.directional_light;
        let active = self.settings.lights.directional_active;
        program.activate(device);
        bind_geometry_inputs(device, &self.gbuffer, program);
        program.set_vec3(device, "u_cameraPos", matrices.camera_position);
        program.set_mat4(device, "u_lightSpace", &self.directional_light_space);
        self.set_shadow_flags(device, program, active);
        device.bind_texture(
            SHADOW_TEXTURE_UNIT,
            TextureKind::Texture2D,
            self.gbuffer.directional_shadow_map(),
        );
        device.set_cull_mode(CullMode::Disabled);

        let mut drawn = 0;
        for light in self.active_directional_lights() {
            light.upload(device, program);
            if active {
                device.draw_mesh(self.meshes.fullscreen_quad);
                drawn += 1;
            }
        }
        drawn
    }
}
