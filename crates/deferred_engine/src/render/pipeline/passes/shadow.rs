//! Shadow sub-passes: depth from the lights' point of view

use crate::foundation::math::Mat4;
use crate::render::api::{
    BlendMode, CullMode, DepthFunc, DepthState, FramebufferHandle, FramebufferTarget, GraphicsDevice, Viewport,
};
use crate::render::pipeline::frame::FrameMatrices;
use crate::render::pipeline::DeferredRenderer;
use crate::render::shadow::{point_light_cube_matrices, POINT_SHADOW_FAR};

/// Device state a shadow sub-pass changes and puts back
struct SavedTargets {
    draw: Option<FramebufferHandle>,
    read: Option<FramebufferHandle>,
    viewport: Viewport,
    cull: CullMode,
}

impl SavedTargets {
    fn capture(device: &dyn GraphicsDevice) -> Self {
        Self {
            draw: device.bound_framebuffer(FramebufferTarget::Draw),
            read: device.bound_framebuffer(FramebufferTarget::Read),
            viewport: device.viewport(),
            cull: device.cull_mode(),
        }
    }

    fn restore(self, device: &mut dyn GraphicsDevice) {
        device.bind_framebuffer(FramebufferTarget::Draw, self.draw);
        device.bind_framebuffer(FramebufferTarget::Read, self.read);
        device.set_viewport(self.viewport);
        device.set_cull_mode(self.cull);
    }
}

fn depth_only_state(device: &mut dyn GraphicsDevice, resolution: u32) {
    device.set_viewport(Viewport::new(resolution, resolution));
    device.set_depth_state(DepthState::Enabled(DepthFunc::Less));
    device.set_blend_mode(BlendMode::Disabled);
    // Front faces are culled so lit surfaces do not shadow themselves
    device.set_cull_mode(CullMode::Front);
}

impl DeferredRenderer {
    /// Render the directional shadow map; returns the light-space matrix it used
    pub(crate) fn directional_shadow_pass(&self, device: &mut dyn GraphicsDevice, matrices: &FrameMatrices) -> Mat4 {
        let light_space = self.primary_directional_light_space();
        let Some(scene) = &self.scene else {
            return light_space;
        };

        let saved = SavedTargets::capture(device);
        self.gbuffer.bind_for_directional_shadow_pass(device);
        depth_only_state(device, self.gbuffer.shadow_resolution());

        let program = &self.programs.directional_shadow;
        program.activate(device);
        program.set_mat4(device, "u_lightSpace", &light_space);
        program.set_mat4(device, "u_model", &matrices.model);
        scene.model().draw(device);

        saved.restore(device);
        log::debug!("[SHADOW] Directional shadow map rendered");
        light_space
    }

    /// Render one cube map per active point light; returns how many were rendered
    pub(crate) fn point_shadow_pass(&self, device: &mut dyn GraphicsDevice, matrices: &FrameMatrices) -> usize {
        let Some(scene) = &self.scene else {
            return 0;
        };

        let saved = SavedTargets::capture(device);
        depth_only_state(device, self.gbuffer.point_shadow_resolution());

        let program = &self.programs.point_shadow;
        program.activate(device);
        program.set_mat4(device, "u_model", &matrices.model);
        program.set_float(device, "u_zFar", POINT_SHADOW_FAR);

        let mut faces = [Mat4::identity(); 6];
        let mut rendered = 0;
        for (index, light) in self.active_point_lights().iter().enumerate() {
            if self.gbuffer.bind_for_point_shadow_pass(device, index).is_err() {
                continue;
            }
            point_light_cube_matrices(light.position(), POINT_SHADOW_FAR, &mut faces);
            program.set_mat4_array(device, "u_shadowMatrices", &faces);
            program.set_vec3(device, "u_position", light.position());
            scene.model().draw(device);
            rendered += 1;
        }

        saved.restore(device);
        log::debug!("[SHADOW] Rendered {rendered} point light shadow maps");
        rendered
    }
}
