//! Shadow map scheduling and light-space matrices
//!
//! Shadow maps are not re-rendered every frame. [`ShadowScheduler`] tracks
//! which maps are stale; the pipeline asks it for a [`ShadowPlan`] each
//! frame and reports back once the plan ran.

use serde::{Deserialize, Serialize};

use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};

/// Near plane of point-light cube projections
pub const POINT_SHADOW_NEAR: f32 = 0.1;

/// Far plane of point-light cube projections
pub const POINT_SHADOW_FAR: f32 = 200.0;

/// Update state of one kind of shadow map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ShadowUpdate {
    /// Up to date
    #[default]
    Clean,
    /// Re-render once, then become clean
    Dirty,
    /// Re-render every frame
    AlwaysDirty,
}

impl ShadowUpdate {
    /// Whether the map must be rendered this frame
    pub const fn is_pending(self) -> bool {
        !matches!(self, Self::Clean)
    }

    /// Ask for one re-render
    pub fn request(&mut self) {
        if *self == Self::Clean {
            *self = Self::Dirty;
        }
    }

    /// Record that the map was rendered
    pub fn complete(&mut self) {
        if *self == Self::Dirty {
            *self = Self::Clean;
        }
    }

    /// Switch continuous updating on or off
    pub fn set_always(&mut self, always: bool) {
        *self = match (always, *self) {
            (true, _) => Self::AlwaysDirty,
            (false, Self::AlwaysDirty) => Self::Clean,
            (false, state) => state,
        };
    }
}

/// Which shadow sub-passes run in a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShadowPlan {
    /// Render the directional shadow map
    pub directional: bool,
    /// Render every point-light cube map
    pub point: bool,
}

impl ShadowPlan {
    /// Whether anything runs
    pub const fn any(self) -> bool {
        self.directional || self.point
    }
}

/// Tracks stale shadow maps across frames
///
/// A full refresh (after creation, resize or scene change) re-renders every
/// map once. It is cleared only after both light kinds had their turn, in
/// [`finish`](Self::finish).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadowScheduler {
    refresh_all: bool,
    directional: ShadowUpdate,
    point: ShadowUpdate,
}

impl ShadowScheduler {
    /// Scheduler with a pending full refresh
    pub const fn new(always_update_directional: bool) -> Self {
        Self {
            refresh_all: true,
            directional: if always_update_directional {
                ShadowUpdate::AlwaysDirty
            } else {
                ShadowUpdate::Clean
            },
            point: ShadowUpdate::Clean,
        }
    }

    /// Plan the shadow sub-passes of the coming frame
    pub const fn plan(&self) -> ShadowPlan {
        ShadowPlan {
            directional: self.refresh_all || self.directional.is_pending(),
            point: self.refresh_all || self.point.is_pending(),
        }
    }

    /// Record that `plan` ran
    pub fn finish(&mut self, plan: ShadowPlan) {
        if plan.directional {
            self.directional.complete();
        }
        if plan.point {
            self.point.complete();
        }
        self.refresh_all = false;
    }

    /// Re-render every map once
    pub fn request_full_refresh(&mut self) {
        self.refresh_all = true;
    }

    /// Re-render the directional map once
    pub fn request_directional(&mut self) {
        self.directional.request();
    }

    /// Re-render the point maps once
    pub fn request_point(&mut self) {
        self.point.request();
    }

    /// Re-render the directional map every frame, or stop doing so
    pub fn set_always_directional(&mut self, always: bool) {
        self.directional.set_always(always);
    }

    /// Whether the directional map re-renders every frame
    pub fn always_directional(&self) -> bool {
        self.directional == ShadowUpdate::AlwaysDirty
    }

    /// Whether a full refresh is pending
    pub const fn full_refresh_pending(&self) -> bool {
        self.refresh_all
    }

    /// Directional map state
    pub const fn directional(&self) -> ShadowUpdate {
        self.directional
    }

    /// Point map state
    pub const fn point(&self) -> ShadowUpdate {
        self.point
    }
}

impl Default for ShadowScheduler {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Orthographic frustum around the directional light
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionalShadowFrustum {
    /// Half extent of the square projection
    pub quad_size: f32,
    /// Near plane
    pub z_near: f32,
    /// Far plane
    pub z_far: f32,
    /// Distance of the virtual light position from the origin, in multiples of its direction
    pub distance_multiplier: f32,
}

impl Default for DirectionalShadowFrustum {
    fn default() -> Self {
        Self {
            quad_size: 10.0,
            z_near: 0.1,
            z_far: 150.0,
            distance_multiplier: 20.0,
        }
    }
}

/// World-to-light-clip matrix for a directional light
///
/// The light is placed at `normalize(direction) * distance_multiplier` and
/// looks at the origin. Pure function of its inputs.
pub fn directional_light_space(direction: Vec3, frustum: &DirectionalShadowFrustum) -> Mat4 {
    let toward_light = direction.try_normalize(f32::EPSILON).unwrap_or_else(|| {
        log::warn!("[SHADOW] Zero directional light direction, shadowing from straight above");
        Vec3::y()
    });
    let eye = toward_light * frustum.distance_multiplier;

    // Y up degenerates when the light is directly above or below
    let up = if toward_light.cross(&Vec3::y()).norm() < 1e-4 {
        Vec3::z()
    } else {
        Vec3::y()
    };

    let q = frustum.quad_size;
    let projection = Mat4::orthographic(-q, q, -q, q, frustum.z_near, frustum.z_far);
    let view = Mat4::look_at(eye, Vec3::zeros(), up);
    projection * view
}

/// Look direction and up vector of one cube-map face
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubeFace {
    /// Direction from the cube center through the face
    pub look: Vec3,
    /// Up vector of the face image
    pub up: Vec3,
}

/// Faces in +X, -X, +Y, -Y, +Z, -Z order
///
/// Cube-map texel addressing puts the face's `t` axis along -Y for the four
/// side faces and along +Z/-Z for the top/bottom faces, so rendering with
/// these up vectors stores each face the way it is later sampled.
pub fn cube_faces() -> [CubeFace; 6] {
    [
        CubeFace { look: Vec3::x(), up: -Vec3::y() },
        CubeFace { look: -Vec3::x(), up: -Vec3::y() },
        CubeFace { look: Vec3::y(), up: Vec3::z() },
        CubeFace { look: -Vec3::y(), up: -Vec3::z() },
        CubeFace { look: Vec3::z(), up: -Vec3::y() },
        CubeFace { look: -Vec3::z(), up: -Vec3::y() },
    ]
}

/// Fill `out` with the six view-projection matrices of a point light's cube map
///
/// Uses a 90 degree, square perspective between [`POINT_SHADOW_NEAR`] and
/// `far`. Writes into the caller's buffer so a frame allocates nothing.
pub fn point_light_cube_matrices(position: Vec3, far: f32, out: &mut [Mat4; 6]) {
    let projection = Mat4::perspective(utils::deg_to_rad(90.0), 1.0, POINT_SHADOW_NEAR, far);
    for (matrix, face) in out.iter_mut().zip(cube_faces()) {
        *matrix = projection * Mat4::look_at(position, position + face.look, face.up);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Point3, Vec4};
    use approx::assert_relative_eq;

    #[test]
    fn test_update_transitions() {
        let mut state = ShadowUpdate::Clean;
        state.request();
        assert_eq!(state, ShadowUpdate::Dirty);
        state.complete();
        assert_eq!(state, ShadowUpdate::Clean);

        state.set_always(true);
        state.complete();
        assert_eq!(state, ShadowUpdate::AlwaysDirty);
        state.request();
        assert_eq!(state, ShadowUpdate::AlwaysDirty);
        state.set_always(false);
        assert_eq!(state, ShadowUpdate::Clean);
    }

    #[test]
    fn test_full_refresh_runs_once_for_both_kinds() {
        let mut scheduler = ShadowScheduler::new(false);
        let plan = scheduler.plan();
        assert_eq!(plan, ShadowPlan { directional: true, point: true });
        scheduler.finish(plan);
        assert!(!scheduler.plan().any());
    }

    #[test]
    fn test_directional_request_leaves_point_maps_alone() {
        let mut scheduler = ShadowScheduler::new(false);
        scheduler.finish(scheduler.plan());

        scheduler.request_directional();
        let plan = scheduler.plan();
        assert_eq!(plan, ShadowPlan { directional: true, point: false });
        scheduler.finish(plan);
        assert_eq!(scheduler.directional(), ShadowUpdate::Clean);
    }

    #[test]
    fn test_always_directional_persists() {
        let mut scheduler = ShadowScheduler::new(true);
        for _ in 0..3 {
            let plan = scheduler.plan();
            assert!(plan.directional);
            scheduler.finish(plan);
        }
        assert!(!scheduler.plan().point);
        assert!(scheduler.always_directional());
    }

    #[test]
    fn test_directional_light_space_is_idempotent() {
        let frustum = DirectionalShadowFrustum::default();
        let direction = Vec3::new(0.0, 5.0, 5.0);
        let a = directional_light_space(direction, &frustum);
        let b = directional_light_space(direction, &frustum);
        assert_eq!(a, b);
    }

    #[test]
    fn test_directional_light_space_centers_origin() {
        let frustum = DirectionalShadowFrustum {
            distance_multiplier: 4.0,
            ..DirectionalShadowFrustum::default()
        };
        let matrix = directional_light_space(Vec3::new(0.0, 5.0, 5.0), &frustum);
        let clip = matrix * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(clip.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(clip.y, 0.0, epsilon = 1e-5);
        // Origin sits 4 units in front of the light, between the clip planes
        assert!(clip.z > -1.0 && clip.z < 1.0);
    }

    #[test]
    fn test_vertical_direction_does_not_degenerate() {
        let matrix = directional_light_space(Vec3::new(0.0, 1.0, 0.0), &DirectionalShadowFrustum::default());
        assert!(matrix.iter().all(|value| value.is_finite()));
    }

    #[test]
    fn test_cube_faces_are_orthonormal_and_cover_all_axes() {
        let faces = cube_faces();
        for face in &faces {
            assert_relative_eq!(face.look.dot(&face.up), 0.0);
            assert_relative_eq!(face.look.norm(), 1.0);
            assert_relative_eq!(face.up.norm(), 1.0);
        }
        for axis in [Vec3::x(), -Vec3::x(), Vec3::y(), -Vec3::y(), Vec3::z(), -Vec3::z()] {
            assert_eq!(faces.iter().filter(|face| face.look == axis).count(), 1);
        }
    }

    #[test]
    fn test_cube_matrices_center_each_face_axis() {
        let position = Vec3::new(1.0, 2.0, 3.0);
        let mut matrices = [Mat4::identity(); 6];
        point_light_cube_matrices(position, POINT_SHADOW_FAR, &mut matrices);

        for (matrix, face) in matrices.iter().zip(cube_faces()) {
            let point = Point3::from(position + face.look * 10.0);
            let clip = matrix * point.to_homogeneous();
            assert_relative_eq!(clip.x / clip.w, 0.0, epsilon = 1e-5);
            assert_relative_eq!(clip.y / clip.w, 0.0, epsilon = 1e-5);

            let up = Point3::from(position + face.look * 10.0 + face.up);
            let clip_up = matrix * up.to_homogeneous();
            assert!(clip_up.y / clip_up.w > 0.0);
        }
    }
}
