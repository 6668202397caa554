//! Getter/setter surface for GUIs and tools
//!
//! Setters store values exactly as given. Values the geometry pass uploads
//! once (model transform, fog, tessellation, ...) mark the model uniforms
//! stale; the other passes read the settings every frame. Light and shadow
//! edits schedule the affected shadow maps for re-rendering.

use crate::foundation::math::{Transform, Vec3};
use crate::render::lights::{DirectionalLight, PointLight};
use crate::render::pipeline::settings::{RenderMode, RenderSettings};
use crate::render::pipeline::DeferredRenderer;

/// Store `value` in `slot`, reporting whether it differed
fn replace_if_changed<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

impl DeferredRenderer {
    /// Replace every setting at once
    ///
    /// Fog is dropped if both fog and skybox are enabled.
    pub fn set_settings(&mut self, settings: RenderSettings) {
        let settings = settings.with_exclusive_background();
        if settings.shadows.directional != self.settings.shadows.directional
            || settings.transform != self.settings.transform
        {
            self.shadows.request_full_refresh();
        }
        self.shadows
            .set_always_directional(settings.shadows.always_update_directional);
        self.settings = settings;
        self.uniforms_dirty = true;
    }

    // === Model ===

    /// Placement of the scene model
    pub const fn transform(&self) -> &Transform {
        &self.settings.transform
    }

    /// Move, rotate or scale the scene model
    ///
    /// Every shadow map depends on the model placement, so all are redrawn.
    pub fn set_transform(&mut self, transform: Transform) {
        if replace_if_changed(&mut self.settings.transform, transform) {
            self.uniforms_dirty = true;
            self.shadows.request_full_refresh();
        }
    }

    /// What the present step shows
    pub const fn render_mode(&self) -> RenderMode {
        self.settings.render_mode
    }

    /// Switch between the composite and the debug quadrants
    pub fn set_render_mode(&mut self, mode: RenderMode) {
        self.uniforms_dirty |= replace_if_changed(&mut self.settings.render_mode, mode);
    }

    /// Alpha below which fragments are discarded
    pub const fn alpha_clipping(&self) -> f32 {
        self.settings.alpha_clipping
    }

    /// Set the alpha clipping threshold
    pub fn set_alpha_clipping(&mut self, clipping: f32) {
        self.uniforms_dirty |= replace_if_changed(&mut self.settings.alpha_clipping, clipping);
    }

    // === Background ===

    /// Whether fog is applied
    pub const fn fog_enabled(&self) -> bool {
        self.settings.fog.enabled
    }

    /// Enable or disable fog; enabling it disables the skybox
    pub fn set_fog_enabled(&mut self, enabled: bool) {
        if enabled && self.settings.skybox_enabled {
            log::debug!("[PIPELINE] Fog enabled, disabling skybox");
            self.settings.skybox_enabled = false;
        }
        self.uniforms_dirty |= replace_if_changed(&mut self.settings.fog.enabled, enabled);
    }

    /// Fog density
    pub const fn fog_density(&self) -> f32 {
        self.settings.fog.density
    }

    /// Set the fog density
    pub fn set_fog_density(&mut self, density: f32) {
        self.uniforms_dirty |= replace_if_changed(&mut self.settings.fog.density, density);
    }

    /// Fog color
    pub const fn fog_color(&self) -> Vec3 {
        self.settings.fog.color
    }

    /// Set the fog color
    pub fn set_fog_color(&mut self, color: Vec3) {
        self.uniforms_dirty |= replace_if_changed(&mut self.settings.fog.color, color);
    }

    /// Whether the skybox is drawn
    pub const fn skybox_enabled(&self) -> bool {
        self.settings.skybox_enabled
    }

    /// Enable or disable the skybox; enabling it disables fog
    pub fn set_skybox_enabled(&mut self, enabled: bool) {
        if enabled && self.settings.fog.enabled {
            log::debug!("[PIPELINE] Skybox enabled, disabling fog");
            self.settings.fog.enabled = false;
            self.uniforms_dirty = true;
        }
        self.settings.skybox_enabled = enabled;
    }

    // === Bloom ===

    /// Brightness above which pixels bloom
    pub const fn bloom_threshold(&self) -> f32 {
        self.settings.bloom.threshold
    }

    /// Set the bloom threshold
    pub fn set_bloom_threshold(&mut self, threshold: f32) {
        self.settings.bloom.threshold = threshold;
    }

    /// Weight of the lit color in the bright pass
    pub const fn bloom_color_weight(&self) -> f32 {
        self.settings.bloom.color_weight
    }

    /// Set the weight of the lit color in the bright pass
    pub fn set_bloom_color_weight(&mut self, weight: f32) {
        self.settings.bloom.color_weight = weight;
    }

    /// Weight of the emission target in the bright pass
    pub const fn bloom_emission_weight(&self) -> f32 {
        self.settings.bloom.emission_weight
    }

    /// Set the weight of the emission target in the bright pass
    pub fn set_bloom_emission_weight(&mut self, weight: f32) {
        self.settings.bloom.emission_weight = weight;
    }

    /// Blur rounds applied to the bright pass
    pub const fn blur_iterations(&self) -> u32 {
        self.settings.bloom.blur_iterations
    }

    /// Set the number of blur rounds
    pub fn set_blur_iterations(&mut self, iterations: u32) {
        self.settings.bloom.blur_iterations = iterations;
    }

    // === Post-processing ===

    /// Tone-mapping exposure
    pub const fn exposure(&self) -> f32 {
        self.settings.postprocess.exposure
    }

    /// Set the tone-mapping exposure
    pub fn set_exposure(&mut self, exposure: f32) {
        self.settings.postprocess.exposure = exposure;
    }

    /// Display gamma
    pub const fn gamma(&self) -> f32 {
        self.settings.postprocess.gamma
    }

    /// Set the display gamma
    pub fn set_gamma(&mut self, gamma: f32) {
        self.settings.postprocess.gamma = gamma;
    }

    /// Whether depth of field is applied
    pub const fn depth_of_field_enabled(&self) -> bool {
        self.settings.postprocess.depth_of_field.enabled
    }

    /// Enable or disable depth of field
    pub fn set_depth_of_field_enabled(&mut self, enabled: bool) {
        self.settings.postprocess.depth_of_field.enabled = enabled;
    }

    /// Distance that stays sharp
    pub const fn focus_distance(&self) -> f32 {
        self.settings.postprocess.depth_of_field.focus_distance
    }

    /// Set the focus distance
    pub fn set_focus_distance(&mut self, distance: f32) {
        self.settings.postprocess.depth_of_field.focus_distance = distance;
    }

    /// Distance over which the image fades to fully blurred
    pub const fn depth_of_field_range(&self) -> f32 {
        self.settings.postprocess.depth_of_field.range
    }

    /// Set the depth-of-field range
    pub fn set_depth_of_field_range(&mut self, range: f32) {
        self.settings.postprocess.depth_of_field.range = range;
    }

    // === Surface detail ===

    /// Whether tessellation is applied
    pub const fn tessellation_enabled(&self) -> bool {
        self.settings.tessellation.enabled
    }

    /// Enable or disable tessellation
    pub fn set_tessellation_enabled(&mut self, enabled: bool) {
        self.uniforms_dirty |= replace_if_changed(&mut self.settings.tessellation.enabled, enabled);
    }

    /// Minimum tessellation level
    pub const fn min_tessellation(&self) -> i32 {
        self.settings.tessellation.min_level
    }

    /// Set the minimum tessellation level
    pub fn set_min_tessellation(&mut self, level: i32) {
        self.uniforms_dirty |= replace_if_changed(&mut self.settings.tessellation.min_level, level);
    }

    /// Maximum tessellation level
    pub const fn max_tessellation(&self) -> i32 {
        self.settings.tessellation.max_level
    }

    /// Set the maximum tessellation level
    pub fn set_max_tessellation(&mut self, level: i32) {
        self.uniforms_dirty |= replace_if_changed(&mut self.settings.tessellation.max_level, level);
    }

    /// Whether height-map displacement is applied
    pub const fn displacement_enabled(&self) -> bool {
        self.settings.displacement.enabled
    }

    /// Enable or disable displacement
    pub fn set_displacement_enabled(&mut self, enabled: bool) {
        self.uniforms_dirty |= replace_if_changed(&mut self.settings.displacement.enabled, enabled);
    }

    /// Displacement scale
    pub const fn displacement_factor(&self) -> f32 {
        self.settings.displacement.factor
    }

    /// Set the displacement scale
    pub fn set_displacement_factor(&mut self, factor: f32) {
        self.uniforms_dirty |= replace_if_changed(&mut self.settings.displacement.factor, factor);
    }

    /// Whether normal maps are sampled
    pub const fn normal_mapping_enabled(&self) -> bool {
        self.settings.normal_mapping.enabled
    }

    /// Enable or disable normal mapping
    pub fn set_normal_mapping_enabled(&mut self, enabled: bool) {
        self.uniforms_dirty |= replace_if_changed(&mut self.settings.normal_mapping.enabled, enabled);
    }

    /// Whether normal maps store only X and Y
    pub const fn two_channel_normal_maps(&self) -> bool {
        self.settings.normal_mapping.two_channel
    }

    /// Treat normal maps as two-channel or not
    pub fn set_two_channel_normal_maps(&mut self, two_channel: bool) {
        self.uniforms_dirty |= replace_if_changed(&mut self.settings.normal_mapping.two_channel, two_channel);
    }

    // === Shadows ===

    /// Whether lighting applies shadows
    pub const fn show_shadows(&self) -> bool {
        self.settings.shadows.show_shadows
    }

    /// Show or hide shadows
    pub fn set_show_shadows(&mut self, show: bool) {
        self.settings.shadows.show_shadows = show;
    }

    /// Whether shadows use percentage-closer filtering
    pub const fn use_pcf(&self) -> bool {
        self.settings.shadows.use_pcf
    }

    /// Switch percentage-closer filtering
    pub fn set_use_pcf(&mut self, use_pcf: bool) {
        self.settings.shadows.use_pcf = use_pcf;
    }

    /// Whether the directional shadow map is redrawn every frame
    pub const fn always_update_directional_shadows(&self) -> bool {
        self.settings.shadows.always_update_directional
    }

    /// Redraw the directional shadow map every frame, or only on change
    pub fn set_always_update_directional_shadows(&mut self, always: bool) {
        self.settings.shadows.always_update_directional = always;
        self.shadows.set_always_directional(always);
    }

    /// Half extent of the directional shadow projection
    pub const fn shadow_quad_size(&self) -> f32 {
        self.settings.shadows.directional.quad_size
    }

    /// Set the half extent of the directional shadow projection
    pub fn set_shadow_quad_size(&mut self, size: f32) {
        if replace_if_changed(&mut self.settings.shadows.directional.quad_size, size) {
            self.shadows.request_directional();
        }
    }

    /// Near plane of the directional shadow projection
    pub const fn shadow_near(&self) -> f32 {
        self.settings.shadows.directional.z_near
    }

    /// Set the near plane of the directional shadow projection
    pub fn set_shadow_near(&mut self, near: f32) {
        if replace_if_changed(&mut self.settings.shadows.directional.z_near, near) {
            self.shadows.request_directional();
        }
    }

    /// Far plane of the directional shadow projection
    pub const fn shadow_far(&self) -> f32 {
        self.settings.shadows.directional.z_far
    }

    /// Set the far plane of the directional shadow projection
    pub fn set_shadow_far(&mut self, far: f32) {
        if replace_if_changed(&mut self.settings.shadows.directional.z_far, far) {
            self.shadows.request_directional();
        }
    }

    /// Distance of the virtual directional light from the origin
    pub const fn directional_distance_multiplier(&self) -> f32 {
        self.settings.shadows.directional.distance_multiplier
    }

    /// Set the distance of the virtual directional light from the origin
    pub fn set_directional_distance_multiplier(&mut self, multiplier: f32) {
        if replace_if_changed(&mut self.settings.shadows.directional.distance_multiplier, multiplier) {
            self.shadows.request_directional();
        }
    }

    /// Re-render every shadow map on the next frame
    pub fn request_shadow_refresh(&mut self) {
        self.shadows.request_full_refresh();
    }

    /// Re-render only the directional shadow map on the next frame
    pub fn request_directional_shadow_update(&mut self) {
        self.shadows.request_directional();
    }

    /// Re-render only the point-light shadow maps on the next frame
    pub fn request_point_shadow_update(&mut self) {
        self.shadows.request_point();
    }

    // === Lights ===

    /// Whether point lights contribute
    pub const fn point_lights_active(&self) -> bool {
        self.settings.lights.point_active
    }

    /// Switch point lights on or off
    pub fn set_point_lights_active(&mut self, active: bool) {
        self.settings.lights.point_active = active;
    }

    /// Flip the point-light switch
    pub fn toggle_point_lights(&mut self) {
        self.settings.lights.point_active = !self.settings.lights.point_active;
    }

    /// Whether directional lights contribute
    pub const fn directional_lights_active(&self) -> bool {
        self.settings.lights.directional_active
    }

    /// Switch directional lights on or off
    pub fn set_directional_lights_active(&mut self, active: bool) {
        self.settings.lights.directional_active = active;
    }

    /// Flip the directional-light switch
    pub fn toggle_directional_lights(&mut self) {
        self.settings.lights.directional_active = !self.settings.lights.directional_active;
    }

    /// Base color of the first point light
    pub fn point_light_color(&self) -> Vec3 {
        self.active_point_lights().first().map_or_else(Vec3::zeros, PointLight::color)
    }

    /// Rebuild the first point light with a new base color
    pub fn set_point_light_color(&mut self, color: Vec3) {
        if let Some(light) = self.primary_point_light_mut() {
            *light = light.with_color(color);
        }
    }

    /// Position of the first point light
    pub fn point_light_position(&self) -> Vec3 {
        self.active_point_lights().first().map_or_else(Vec3::zeros, PointLight::position)
    }

    /// Move the first point light
    pub fn set_point_light_position(&mut self, position: Vec3) {
        let moved = self
            .primary_point_light_mut()
            .is_some_and(|light| {
                let updated = light.with_position(position);
                replace_if_changed(light, updated)
            });
        if moved {
            self.shadows.request_point();
        }
    }

    /// Base color of the first directional light
    pub fn directional_light_color(&self) -> Vec3 {
        self.active_directional_lights()
            .first()
            .map_or_else(Vec3::zeros, DirectionalLight::color)
    }

    /// Rebuild the first directional light with a new base color
    pub fn set_directional_light_color(&mut self, color: Vec3) {
        if let Some(light) = self.primary_directional_light_mut() {
            *light = light.with_color(color);
        }
    }

    /// Direction of the first directional light
    pub fn directional_light_direction(&self) -> Vec3 {
        self.active_directional_lights()
            .first()
            .map_or_else(Vec3::zeros, DirectionalLight::direction)
    }

    /// Point the first directional light along `direction`
    pub fn set_directional_light_direction(&mut self, direction: Vec3) {
        let turned = self
            .primary_directional_light_mut()
            .is_some_and(|light| {
                let updated = light.with_direction(direction);
                replace_if_changed(light, updated)
            });
        if turned {
            self.shadows.request_directional();
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::core::config::RendererConfig;
    use crate::foundation::math::Vec3;
    use crate::render::backends::HeadlessDevice;
    use crate::render::lights::PointLight;
    use crate::render::pipeline::{DeferredRenderer, MeshModel, Scene};
    use crate::render::shadow::ShadowUpdate;
    use approx::assert_relative_eq;

    fn renderer(device: &mut HeadlessDevice) -> DeferredRenderer {
        DeferredRenderer::new(device, &RendererConfig::new(64, 64)).unwrap()
    }

    #[test]
    fn test_setters_round_trip_without_clamping() {
        let mut device = HeadlessDevice::new(64, 64);
        let mut renderer = renderer(&mut device);

        renderer.set_bloom_threshold(3.75);
        renderer.set_exposure(-0.5);
        renderer.set_gamma(1.8);
        renderer.set_blur_iterations(9);
        renderer.set_focus_distance(42.0);
        renderer.set_depth_of_field_range(0.25);
        renderer.set_min_tessellation(3);
        renderer.set_max_tessellation(64);
        renderer.set_displacement_factor(0.33);
        renderer.set_fog_density(0.07);

        assert_relative_eq!(renderer.bloom_threshold(), 3.75);
        assert_relative_eq!(renderer.exposure(), -0.5);
        assert_relative_eq!(renderer.gamma(), 1.8);
        assert_eq!(renderer.blur_iterations(), 9);
        assert_relative_eq!(renderer.focus_distance(), 42.0);
        assert_relative_eq!(renderer.depth_of_field_range(), 0.25);
        assert_eq!(renderer.min_tessellation(), 3);
        assert_eq!(renderer.max_tessellation(), 64);
        assert_relative_eq!(renderer.displacement_factor(), 0.33);
        assert_relative_eq!(renderer.fog_density(), 0.07);
        renderer.destroy(&mut device);
    }

    #[test]
    fn test_fog_and_skybox_exclude_each_other_in_either_order() {
        let mut device = HeadlessDevice::new(64, 64);
        let mut renderer = renderer(&mut device);

        renderer.set_fog_density(0.01);
        renderer.set_fog_enabled(true);
        assert!(renderer.fog_enabled());
        assert!(!renderer.skybox_enabled());

        renderer.set_skybox_enabled(true);
        assert!(renderer.skybox_enabled());
        assert!(!renderer.fog_enabled());

        renderer.set_fog_enabled(true);
        assert!(!renderer.skybox_enabled());
        renderer.destroy(&mut device);
    }

    #[test]
    fn test_light_color_edits_rebuild_terms() {
        let mut device = HeadlessDevice::new(64, 64);
        let mut renderer = renderer(&mut device);

        renderer.set_point_light_color(Vec3::new(0.2, 0.4, 0.6));
        assert_relative_eq!(renderer.point_light_color(), Vec3::new(0.2, 0.4, 0.6), epsilon = 1e-6);
        let terms = renderer.active_point_lights()[0].terms();
        assert_relative_eq!(terms.ambient, Vec3::new(0.04, 0.08, 0.12), epsilon = 1e-6);

        renderer.set_directional_light_color(Vec3::new(0.5, 0.5, 0.5));
        assert_relative_eq!(renderer.directional_light_color(), Vec3::new(0.5, 0.5, 0.5), epsilon = 1e-6);
        renderer.destroy(&mut device);
    }

    #[test]
    fn test_scene_light_is_edited_in_place() {
        let mut device = HeadlessDevice::new(64, 64);
        let mut renderer = renderer(&mut device);
        let scene = Scene::new(Box::new(MeshModel::new(Vec::new())))
            .with_point_light(PointLight::new(Vec3::new(0.0, 3.0, 0.0), Vec3::new(1.0, 1.0, 1.0)));
        renderer.set_scene(&mut device, Some(scene)).unwrap();

        renderer.set_point_light_color(Vec3::new(1.0, 0.0, 0.0));
        let lights = renderer.scene().unwrap().point_lights();
        assert_eq!(lights.len(), 1);
        assert_relative_eq!(lights[0].color(), Vec3::new(1.0, 0.0, 0.0), epsilon = 1e-6);
        assert_relative_eq!(lights[0].position(), Vec3::new(0.0, 3.0, 0.0));
        renderer.destroy(&mut device);
    }

    #[test]
    fn test_direction_change_schedules_directional_shadow() {
        let mut device = HeadlessDevice::new(64, 64);
        let mut renderer = renderer(&mut device);

        renderer.set_directional_light_direction(Vec3::new(1.0, 4.0, 0.0));
        assert_eq!(renderer.shadows().directional(), ShadowUpdate::Dirty);
        assert_eq!(renderer.shadows().point(), ShadowUpdate::Clean);

        renderer.set_always_update_directional_shadows(true);
        assert_eq!(renderer.shadows().directional(), ShadowUpdate::AlwaysDirty);
        renderer.destroy(&mut device);
    }

    #[test]
    fn test_toggles_flip_light_switches() {
        let mut device = HeadlessDevice::new(64, 64);
        let mut renderer = renderer(&mut device);
        renderer.toggle_point_lights();
        renderer.toggle_directional_lights();
        assert!(!renderer.point_lights_active());
        assert!(!renderer.directional_lights_active());
        renderer.toggle_point_lights();
        assert!(renderer.point_lights_active());
        renderer.destroy(&mut device);
    }
}
