//! Geometry pass: scene attributes into the G-buffer

use crate::render::api::{BlendMode, CullMode, DepthFunc, DepthState, GraphicsDevice, PolygonMode};
use crate::render::pipeline::frame::FrameMatrices;
use crate::render::pipeline::DeferredRenderer;

impl DeferredRenderer {
    /// Clear the geometry targets and draw the scene model into them
    ///
    /// Without a scene the targets are only cleared.
    pub(crate) fn geometry_pass(&self, device: &mut dyn GraphicsDevice, matrices: &FrameMatrices, wireframe: bool) {
        self.gbuffer.bind_for_geometry_pass(device);
        device.set_depth_state(DepthState::Enabled(DepthFunc::Less));
        device.set_blend_mode(BlendMode::Disabled);
        // Alpha-clipped foliage and thin shells are two-sided
        device.set_cull_mode(CullMode::Disabled);

        let Some(scene) = &self.scene else {
            return;
        };

        let program = &self.programs.model;
        program.activate(device);
        program.set_mat4(device, "u_projection", &matrices.projection);
        program.set_mat4(device, "u_view", &matrices.view);
        program.set_vec3(device, "u_cameraPos", matrices.camera_position);

        if wireframe {
            device.set_polygon_mode(PolygonMode::Line);
        }
        scene.model().draw(device);
        if wireframe {
            device.set_polygon_mode(PolygonMode::Fill);
        }
    }
}
