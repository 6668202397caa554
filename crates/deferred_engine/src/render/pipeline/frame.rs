//! Per-frame input and output of the renderer

use crate::foundation::math::{Mat4, Mat4Ext, Transform, Vec3};
use crate::render::primitives::Camera;
use crate::render::shadow::ShadowPlan;

/// What the caller supplies for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameInput {
    /// Viewpoint
    pub camera: Camera,
    /// Clear color of the geometry targets
    pub clear_color: [f32; 4],
    /// Rasterize the scene model as lines
    pub wireframe: bool,
}

impl FrameInput {
    /// Frame seen through `camera`, black background, filled polygons
    pub fn new(camera: Camera) -> Self {
        Self {
            camera,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            wireframe: false,
        }
    }

    /// Same frame with another clear color
    pub fn with_clear_color(mut self, color: [f32; 4]) -> Self {
        self.clear_color = color;
        self
    }

    /// Same frame rendered in wireframe or not
    pub fn with_wireframe(mut self, wireframe: bool) -> Self {
        self.wireframe = wireframe;
        self
    }
}

/// What a frame did, for diagnostics and tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Shadow sub-passes planned this frame
    pub shadow_plan: ShadowPlan,
    /// Point-light cube maps rendered
    pub point_shadow_maps_rendered: usize,
    /// Point-light volumes drawn
    pub point_lights_drawn: usize,
    /// Directional light quads drawn
    pub directional_lights_drawn: usize,
    /// Bloom blur draws
    pub bloom_blur_passes: u32,
    /// Depth-of-field blur draws
    pub depth_of_field_blur_passes: u32,
    /// Whether the fog pass ran
    pub fog: bool,
    /// Whether the skybox pass ran
    pub skybox: bool,
    /// Whether the depth-of-field blend ran
    pub depth_of_field: bool,
}

/// Matrices shared by every pass of a frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct FrameMatrices {
    pub(crate) model: Mat4,
    pub(crate) view: Mat4,
    pub(crate) projection: Mat4,
    pub(crate) camera_position: Vec3,
}

impl FrameMatrices {
    pub(crate) fn new(camera: &Camera, transform: &Transform) -> Self {
        Self {
            model: transform.to_matrix(),
            view: camera.view_matrix(),
            projection: camera.projection_matrix(),
            camera_position: camera.position,
        }
    }

    /// View with the camera translation removed, for the skybox
    pub(crate) fn rotation_only_view(&self) -> Mat4 {
        self.view.without_translation()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rotation_only_view_drops_camera_position() {
        let camera = Camera::for_output(Vec3::new(3.0, 2.0, 8.0), 45.0, 800, 600);
        let matrices = FrameMatrices::new(&camera, &Transform::default());
        let view = matrices.rotation_only_view();
        assert_relative_eq!(view[(0, 3)], 0.0);
        assert_relative_eq!(view[(1, 3)], 0.0);
        assert_relative_eq!(view[(2, 3)], 0.0);
        assert_relative_eq!(matrices.camera_position, camera.position);
    }

    #[test]
    fn test_frame_input_builders() {
        let camera = Camera::for_output(Vec3::new(0.0, 0.0, 5.0), 45.0, 800, 600);
        let input = FrameInput::new(camera).with_clear_color([0.1, 0.2, 0.3, 1.0]).with_wireframe(true);
        assert!(input.wireframe);
        assert_eq!(input.clear_color, [0.1, 0.2, 0.3, 1.0]);
    }
}
