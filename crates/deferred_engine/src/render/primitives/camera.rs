//! # 3D Camera
//!
//! Perspective camera producing OpenGL-convention view and projection
//! matrices for the geometry and lighting passes.

use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};

/// Near plane used by the default scene camera
pub const DEFAULT_NEAR: f32 = 0.1;

/// Far plane used by the default scene camera
pub const DEFAULT_FAR: f32 = 200.0;

/// Perspective camera
///
/// Uses a right-handed Y-up world; the camera looks from `position` towards
/// `target`.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,

    /// Point the camera is looking at in world space
    pub target: Vec3,

    /// Up vector for camera orientation (typically [0, 1, 0])
    pub up: Vec3,

    /// Vertical field of view in radians
    pub fov: f32,

    /// Aspect ratio (width / height)
    pub aspect: f32,

    /// Distance to near clipping plane
    pub near: f32,

    /// Distance to far clipping plane
    pub far: f32,
}

impl Camera {
    /// Create a perspective camera looking at the origin
    ///
    /// # Arguments
    /// * `position` - Camera position in world space
    /// * `fov_degrees` - Vertical field of view in degrees
    /// * `aspect` - Aspect ratio (width / height) of the viewport
    /// * `near` - Distance to near clipping plane (must be > 0)
    /// * `far` - Distance to far clipping plane (must be > near)
    pub fn perspective(position: Vec3, fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position,
            target: Vec3::zeros(),
            up: Vec3::new(0.0, 1.0, 0.0),
            fov: utils::deg_to_rad(fov_degrees),
            aspect,
            near,
            far,
        }
    }

    /// Camera with the renderer's default clip planes for a `width` x `height` output
    pub fn for_output(position: Vec3, fov_degrees: f32, width: u32, height: u32) -> Self {
        Self::perspective(position, fov_degrees, aspect_ratio(width, height), DEFAULT_NEAR, DEFAULT_FAR)
    }

    /// Point the camera at `target`
    pub fn look_at(mut self, target: Vec3) -> Self {
        self.target = target;
        self
    }

    /// Update the aspect ratio after an output resize
    pub fn set_aspect_ratio(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    /// World-to-view matrix
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.position, self.target, self.up)
    }

    /// View-to-clip matrix
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective(self.fov, self.aspect, self.near, self.far)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(Vec3::new(0.0, 2.0, 6.0), 45.0, 4.0 / 3.0, DEFAULT_NEAR, DEFAULT_FAR)
    }
}

/// Width over height, treating a zero height as square
pub fn aspect_ratio(width: u32, height: u32) -> f32 {
    if height == 0 {
        1.0
    } else {
        width as f32 / height as f32
    }
}
