//! Tunable renderer parameters
//!
//! Every struct deserializes with `#[serde(default)]`, so a settings file
//! only lists the values it changes.

use serde::{Deserialize, Serialize};

use crate::foundation::math::{Transform, Vec3};
use crate::render::shadow::DirectionalShadowFrustum;

/// What the present step shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Lit, post-processed image
    #[default]
    PhongComposite,
    /// Albedo, normal, position and emission in four quadrants
    DebugQuadrants,
}

impl RenderMode {
    /// Value of the `u_renderMode` uniform
    pub const fn shader_value(self) -> i32 {
        match self {
            Self::PhongComposite => 0,
            Self::DebugQuadrants => 1,
        }
    }
}

/// Exponential distance fog
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FogSettings {
    /// Whether the fog pass runs
    pub enabled: bool,
    /// Density of the exponential falloff
    pub density: f32,
    /// Fog color
    pub color: Vec3,
}

impl Default for FogSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            density: 0.01,
            color: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

/// Bright-pass extraction and blur
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloomSettings {
    /// Weight of the lit color in the bright pass
    pub color_weight: f32,
    /// Weight of the emission target in the bright pass
    pub emission_weight: f32,
    /// Brightness above which a pixel blooms
    pub threshold: f32,
    /// Horizontal plus vertical blur rounds
    pub blur_iterations: u32,
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            color_weight: 1.0,
            emission_weight: 1.0,
            threshold: 1.0,
            blur_iterations: 2,
        }
    }
}

/// Depth of field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthOfFieldSettings {
    /// Whether the blur blend runs; off presents the sharp image
    pub enabled: bool,
    /// Distance from the camera that stays sharp
    pub focus_distance: f32,
    /// Distance over which the image fades to fully blurred
    pub range: f32,
}

impl Default for DepthOfFieldSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            focus_distance: 10.0,
            range: 8.0,
        }
    }
}

/// Tone mapping and depth of field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostprocessSettings {
    /// Exposure of the tone-mapping curve
    pub exposure: f32,
    /// Display gamma
    pub gamma: f32,
    /// Depth of field
    pub depth_of_field: DepthOfFieldSettings,
}

impl Default for PostprocessSettings {
    fn default() -> Self {
        Self {
            exposure: 1.0,
            gamma: 2.2,
            depth_of_field: DepthOfFieldSettings::default(),
        }
    }
}

/// Hardware tessellation of the scene model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TessellationSettings {
    /// Whether tessellation is applied
    pub enabled: bool,
    /// Minimum tessellation level
    pub min_level: i32,
    /// Maximum tessellation level
    pub max_level: i32,
}

impl Default for TessellationSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            min_level: 1,
            max_level: 20,
        }
    }
}

/// Height-map displacement of tessellated geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplacementSettings {
    /// Whether displacement is applied
    pub enabled: bool,
    /// Displacement scale
    pub factor: f32,
}

impl Default for DisplacementSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            factor: 0.1,
        }
    }
}

/// Normal map sampling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalMappingSettings {
    /// Whether normal maps perturb surface normals
    pub enabled: bool,
    /// Reconstruct Z from two-channel (RG) normal maps
    pub two_channel: bool,
}

impl Default for NormalMappingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            two_channel: true,
        }
    }
}

/// Shadow sampling and the directional shadow frustum
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowSettings {
    /// Whether lighting passes apply shadows
    pub show_shadows: bool,
    /// Percentage-closer filtering
    pub use_pcf: bool,
    /// Re-render the directional map every frame
    pub always_update_directional: bool,
    /// Directional light frustum
    pub directional: DirectionalShadowFrustum,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            show_shadows: true,
            use_pcf: true,
            always_update_directional: false,
            directional: DirectionalShadowFrustum::default(),
        }
    }
}

/// Per-kind light switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightSettings {
    /// Point lights contribute
    pub point_active: bool,
    /// Directional lights contribute
    pub directional_active: bool,
}

impl Default for LightSettings {
    fn default() -> Self {
        Self {
            point_active: true,
            directional_active: true,
        }
    }
}

/// Every tunable renderer parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Placement of the scene model
    pub transform: Transform,
    /// Distance fog
    pub fog: FogSettings,
    /// Bloom
    pub bloom: BloomSettings,
    /// Tone mapping and depth of field
    pub postprocess: PostprocessSettings,
    /// Tessellation
    pub tessellation: TessellationSettings,
    /// Displacement
    pub displacement: DisplacementSettings,
    /// Normal mapping
    pub normal_mapping: NormalMappingSettings,
    /// Shadows
    pub shadows: ShadowSettings,
    /// Light switches
    pub lights: LightSettings,
    /// Whether the skybox is drawn behind the scene
    pub skybox_enabled: bool,
    /// Alpha below which fragments are discarded
    pub alpha_clipping: f32,
    /// What the present step shows
    pub render_mode: RenderMode,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            transform: Transform::default(),
            fog: FogSettings::default(),
            bloom: BloomSettings::default(),
            postprocess: PostprocessSettings::default(),
            tessellation: TessellationSettings::default(),
            displacement: DisplacementSettings::default(),
            normal_mapping: NormalMappingSettings::default(),
            shadows: ShadowSettings::default(),
            lights: LightSettings::default(),
            skybox_enabled: true,
            alpha_clipping: 0.1,
            render_mode: RenderMode::default(),
        }
    }
}

impl RenderSettings {
    /// Resolve fog and skybox both being on, keeping the skybox
    ///
    /// The two full-screen passes would overwrite each other's result.
    pub fn with_exclusive_background(mut self) -> Self {
        if self.fog.enabled && self.skybox_enabled {
            log::warn!("[PIPELINE] Fog and skybox both enabled in settings, disabling fog");
            self.fog.enabled = false;
        }
        self
    }
}
