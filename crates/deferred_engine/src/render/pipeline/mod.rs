//! Render pass orchestration
//!
//! [`DeferredRenderer`] owns the geometry buffer, the programs, the shadow
//! scheduler and the lights, and drives one frame through a fixed sequence
//! of passes:
//!
//! 1. geometry, then shadow sub-passes when the scheduler asks for them
//! 2. point and directional lighting, additively blended into the final target
//! 3. bright-pass threshold and ping-pong blur
//! 4. fog (optional)
//! 5. tone mapping with bloom, then the skybox (optional)
//! 6. depth of field (optional)
//! 7. present, then the GUI hook and end-of-frame clears
//!
//! The device is passed into every call; the renderer never stores it.

mod controls;
mod frame;
mod passes;
pub mod programs;
pub mod scene;
pub mod settings;

pub use frame::{FrameInput, FrameReport};
pub use programs::ProgramSet;
pub use scene::{MeshModel, Scene};
pub use settings::{
    BloomSettings, DepthOfFieldSettings, DisplacementSettings, FogSettings, LightSettings, NormalMappingSettings,
    PostprocessSettings, RenderMode, RenderSettings, ShadowSettings, TessellationSettings,
};

use std::path::Path;

use crate::core::config::RendererConfig;
use crate::foundation::math::Mat4;
use crate::render::api::{GraphicsDevice, MeshHandle, ObjectRef, TextureHandle, Viewport};
use crate::render::gbuffer::{BlurTarget, GeometryBuffer};
use crate::render::lights::{DirectionalLight, PointLight};
use crate::render::primitives::Mesh;
use crate::render::shadow::{directional_light_space, ShadowScheduler};
use crate::render::RenderResult;

use frame::FrameMatrices;
use passes::debug_group;

/// Stacks and sectors of the light-volume sphere
const LIGHT_VOLUME_STACKS: u32 = 12;
const LIGHT_VOLUME_SECTORS: u32 = 24;

/// Meshes the passes draw on their own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimitiveMeshes {
    /// Full-screen quad for screen-space passes
    pub fullscreen_quad: MeshHandle,
    /// Unit cube for the skybox
    pub skybox_cube: MeshHandle,
    /// Unit sphere scaled to each point light's falloff radius
    pub light_volume: MeshHandle,
}

impl PrimitiveMeshes {
    /// Upload the three meshes
    pub fn create(device: &mut dyn GraphicsDevice) -> RenderResult<Self> {
        let fullscreen_quad = device.create_mesh(&Mesh::fullscreen_quad())?;
        let skybox_cube = match device.create_mesh(&Mesh::cube()) {
            Ok(mesh) => mesh,
            Err(e) => {
                device.delete_mesh(fullscreen_quad);
                return Err(e);
            }
        };
        let light_volume = match device.create_mesh(&Mesh::uv_sphere(LIGHT_VOLUME_STACKS, LIGHT_VOLUME_SECTORS)) {
            Ok(mesh) => mesh,
            Err(e) => {
                device.delete_mesh(fullscreen_quad);
                device.delete_mesh(skybox_cube);
                return Err(e);
            }
        };

        device.label_object(ObjectRef::Mesh(fullscreen_quad), "Fullscreen Quad");
        device.label_object(ObjectRef::Mesh(skybox_cube), "Skybox Cube");
        device.label_object(ObjectRef::Mesh(light_volume), "Light Volume");
        Ok(Self {
            fullscreen_quad,
            skybox_cube,
            light_volume,
        })
    }

    /// Release the three meshes
    pub fn destroy(self, device: &mut dyn GraphicsDevice) {
        device.delete_mesh(self.fullscreen_quad);
        device.delete_mesh(self.skybox_cube);
        device.delete_mesh(self.light_volume);
    }
}

/// Deferred-shading renderer
///
/// Owns every GPU object it creates. GPU objects cannot be released without
/// the device, so callers must hand it to [`destroy`](Self::destroy) before
/// dropping the renderer.
#[derive(Debug)]
pub struct DeferredRenderer {
    gbuffer: GeometryBuffer,
    programs: ProgramSet,
    meshes: PrimitiveMeshes,
    settings: RenderSettings,
    shadows: ShadowScheduler,

    scene: Option<Scene>,
    default_directional: Option<DirectionalLight>,
    default_point: Option<PointLight>,
    directional_light_space: Mat4,

    skybox_texture: TextureHandle,
    point_shadow_resolution: u32,
    uniforms_dirty: bool,
}

impl DeferredRenderer {
    /// Build programs, meshes and targets for `config`
    ///
    /// Fails if any program does not compile or any allocation fails; what
    /// was created before the failure is released.
    pub fn new(device: &mut dyn GraphicsDevice, config: &RendererConfig) -> RenderResult<Self> {
        let programs = ProgramSet::load(device, Path::new(&config.shader_dir))?;
        let meshes = match PrimitiveMeshes::create(device) {
            Ok(meshes) => meshes,
            Err(e) => {
                programs.destroy(device);
                return Err(e);
            }
        };
        let gbuffer = match GeometryBuffer::create(
            device,
            config.width,
            config.height,
            config.directional_shadow_resolution,
        ) {
            Ok(gbuffer) => gbuffer,
            Err(e) => {
                programs.destroy(device);
                meshes.destroy(device);
                return Err(e);
            }
        };

        let settings = config.settings.with_exclusive_background();
        let mut renderer = Self {
            gbuffer,
            programs,
            meshes,
            settings,
            shadows: ShadowScheduler::new(settings.shadows.always_update_directional),
            scene: None,
            default_directional: None,
            default_point: None,
            directional_light_space: Mat4::identity(),
            skybox_texture: TextureHandle::INVALID,
            point_shadow_resolution: config.point_shadow_resolution,
            uniforms_dirty: true,
        };
        if let Err(e) = renderer.setup_scene_lights(device) {
            renderer.destroy(device);
            return Err(e);
        }

        log::info!(
            "[PIPELINE] Deferred renderer ready at {}x{}",
            config.width,
            config.height
        );
        Ok(renderer)
    }

    /// Render one frame
    ///
    /// `gui` runs after the image reaches the output surface and before the
    /// end-of-frame clears.
    pub fn render_frame(
        &mut self,
        device: &mut dyn GraphicsDevice,
        input: &FrameInput,
        gui: Option<&mut dyn FnMut(&mut dyn GraphicsDevice)>,
    ) -> FrameReport {
        let mut report = FrameReport::default();
        if self.gbuffer.is_destroyed() {
            log::warn!("[PIPELINE] Frame skipped, render targets are not allocated");
            return report;
        }

        self.sync_model_uniforms(device);
        let matrices = FrameMatrices::new(&input.camera, &self.settings.transform);
        device.set_viewport(Viewport::new(self.gbuffer.width(), self.gbuffer.height()));
        device.set_clear_color(input.clear_color);

        debug_group(device, "Geometry-Pass", |device| {
            self.geometry_pass(device, &matrices, input.wireframe);
        });

        if self.scene.is_some() {
            let plan = self.shadows.plan();
            report.shadow_plan = plan;
            if plan.directional {
                debug_group(device, "DirLight-Shadow-Pass", |device| {
                    self.directional_light_space = self.directional_shadow_pass(device, &matrices);
                });
            }
            if plan.point {
                report.point_shadow_maps_rendered = debug_group(device, "Pointlight-Shadow-Pass", |device| {
                    self.point_shadow_pass(device, &matrices)
                });
            }
            self.shadows.finish(plan);
        }

        debug_group(device, "Light-Pass", |device| {
            self.lighting_pass(device, &matrices, &mut report);
        });

        debug_group(device, "Threshold-Pass", |device| self.threshold_pass(device));
        report.bloom_blur_passes = debug_group(device, "Blur-Pass", |device| {
            self.blur(device, None, self.settings.bloom.blur_iterations)
        });

        if self.settings.fog.enabled {
            debug_group(device, "Fog-Pass", |device| self.fog_pass(device, &matrices));
            report.fog = true;
        }

        debug_group(device, "PostProcess-Pass", |device| self.postprocess_pass(device));

        if self.settings.skybox_enabled {
            report.skybox = debug_group(device, "Skybox-Pass", |device| self.skybox_pass(device, &matrices));
        }

        if self.settings.postprocess.depth_of_field.enabled {
            report.depth_of_field_blur_passes = debug_group(device, "DepthOfField-Pass", |device| {
                self.depth_of_field_pass(device, &matrices)
            });
            report.depth_of_field = true;
        }

        debug_group(device, "Present", |device| self.present(device));

        if let Some(draw_gui) = gui {
            draw_gui(device);
        }
        self.clear_frame_targets(device);
        report
    }

    /// Rebuild every target for a new output size
    ///
    /// A resize to the current size does nothing. On allocation failure the
    /// renderer is left without targets and skips frames until a later
    /// resize succeeds.
    pub fn resize(&mut self, device: &mut dyn GraphicsDevice, width: u32, height: u32) -> RenderResult<()> {
        if !self.gbuffer.is_destroyed() && self.gbuffer.width() == width && self.gbuffer.height() == height {
            return Ok(());
        }
        let shadow_resolution = self.gbuffer.shadow_resolution();
        self.gbuffer.destroy(device);
        self.gbuffer = GeometryBuffer::create(device, width, height, shadow_resolution)?;
        self.setup_scene_lights(device)?;
        self.uniforms_dirty = true;
        log::info!("[PIPELINE] Resized to {width}x{height}");
        Ok(())
    }

    /// Replace the scene, or remove it with `None`
    pub fn set_scene(&mut self, device: &mut dyn GraphicsDevice, scene: Option<Scene>) -> RenderResult<()> {
        self.scene = scene;
        self.setup_scene_lights(device)
    }

    /// Cube map sampled by the skybox pass; [`TextureHandle::INVALID`] disables it
    pub fn set_skybox_texture(&mut self, texture: TextureHandle) {
        if !texture.is_valid() {
            log::warn!("[PIPELINE] No skybox texture, skybox pass will not draw");
        }
        self.skybox_texture = texture;
    }

    /// Rebuild every program from its sources
    ///
    /// Returns `false` if any program failed; failed programs keep their
    /// previous build.
    pub fn recompile_programs(&mut self, device: &mut dyn GraphicsDevice) -> bool {
        let all_ok = self.programs.recompile_all(device);
        // New program objects start without uniforms
        self.uniforms_dirty = true;
        if all_ok {
            log::info!("[PIPELINE] Rebuilt all programs");
        } else {
            log::error!("[PIPELINE] Some programs failed to rebuild, keeping their previous versions");
        }
        all_ok
    }

    /// Release every GPU object owned by the renderer
    pub fn destroy(mut self, device: &mut dyn GraphicsDevice) {
        self.gbuffer.destroy(device);
        self.meshes.destroy(device);
        self.programs.destroy(device);
        log::info!("[PIPELINE] Deferred renderer destroyed");
    }

    // === Accessors ===

    /// Off-screen targets
    pub const fn gbuffer(&self) -> &GeometryBuffer {
        &self.gbuffer
    }

    /// Renderer programs
    pub const fn programs(&self) -> &ProgramSet {
        &self.programs
    }

    /// Meshes drawn by the screen-space and light passes
    pub const fn meshes(&self) -> &PrimitiveMeshes {
        &self.meshes
    }

    /// Current settings
    pub const fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Shadow update state
    pub const fn shadows(&self) -> &ShadowScheduler {
        &self.shadows
    }

    /// Current scene, if any
    pub const fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    /// Skybox cube map
    pub const fn skybox_texture(&self) -> TextureHandle {
        self.skybox_texture
    }

    /// Light-space matrix of the last directional shadow pass
    pub const fn directional_light_space(&self) -> &Mat4 {
        &self.directional_light_space
    }

    /// Blur target that holds the finished image after a frame's passes
    pub const fn output_target() -> BlurTarget {
        BlurTarget::Vertical
    }

    /// Point lights that shade the frame: the scene's, or the synthesized default
    pub fn active_point_lights(&self) -> &[PointLight] {
        match &self.scene {
            Some(scene) if !scene.point_lights().is_empty() => scene.point_lights(),
            _ => self.default_point.as_ref().map_or(&[][..], std::slice::from_ref),
        }
    }

    /// Directional lights that shade the frame: the scene's, or the synthesized default
    pub fn active_directional_lights(&self) -> &[DirectionalLight] {
        match &self.scene {
            Some(scene) if !scene.directional_lights().is_empty() => scene.directional_lights(),
            _ => self.default_directional.as_ref().map_or(&[][..], std::slice::from_ref),
        }
    }

    fn primary_point_light_mut(&mut self) -> Option<&mut PointLight> {
        match &mut self.scene {
            Some(scene) if !scene.point_lights().is_empty() => scene.point_lights_mut().first_mut(),
            _ => self.default_point.as_mut(),
        }
    }

    fn primary_directional_light_mut(&mut self) -> Option<&mut DirectionalLight> {
        match &mut self.scene {
            Some(scene) if !scene.directional_lights().is_empty() => scene.directional_lights_mut().first_mut(),
            _ => self.default_directional.as_mut(),
        }
    }

    // === Setup ===

    /// Synthesize defaults for missing light kinds and size the point shadow maps
    fn setup_scene_lights(&mut self, device: &mut dyn GraphicsDevice) -> RenderResult<()> {
        let (has_directional, has_point) = self.scene.as_ref().map_or((false, false), |scene| {
            (!scene.directional_lights().is_empty(), !scene.point_lights().is_empty())
        });
        self.default_directional = (!has_directional).then(DirectionalLight::default);
        self.default_point = (!has_point).then(PointLight::default);

        let count = self.active_point_lights().len().max(1);
        self.gbuffer
            .initialize_point_light_shadows(device, count, self.point_shadow_resolution)?;

        self.directional_light_space = self.primary_directional_light_space();
        self.shadows.request_full_refresh();
        log::debug!(
            "[PIPELINE] Scene lights: {} directional, {} point",
            self.active_directional_lights().len(),
            self.active_point_lights().len()
        );
        Ok(())
    }

    fn primary_directional_light_space(&self) -> Mat4 {
        self.active_directional_lights().first().map_or_else(Mat4::identity, |light| {
            directional_light_space(light.direction(), &self.settings.shadows.directional)
        })
    }

    /// Upload model-program uniforms that only change through the setters
    fn sync_model_uniforms(&mut self, device: &mut dyn GraphicsDevice) {
        if !self.uniforms_dirty {
            return;
        }
        let program = &self.programs.model;
        let settings = &self.settings;
        program.activate(device);
        program.set_mat4(device, "u_model", &settings.transform.to_matrix());
        program.set_int(device, "u_renderMode", settings.render_mode.shader_value());
        program.set_float(device, "u_clipping", settings.alpha_clipping);
        program.set_bool(device, "u_fogEnabled", settings.fog.enabled);
        program.set_float(device, "u_fogDensity", settings.fog.density);
        program.set_vec4(device, "u_fogColor", settings.fog.color.push(1.0));
        program.set_bool(device, "u_useNormalMapping", settings.normal_mapping.enabled);
        program.set_bool(device, "u_useTwoChannelNormalMaps", settings.normal_mapping.two_channel);
        program.set_bool(device, "u_doTessellation", settings.tessellation.enabled);
        program.set_int(device, "u_minTessellation", settings.tessellation.min_level);
        program.set_int(device, "u_maxTessellation", settings.tessellation.max_level);
        program.set_bool(device, "u_displacementData.use", settings.displacement.enabled);
        program.set_float(device, "u_displacementData.factor", settings.displacement.factor);
        self.uniforms_dirty = false;
        log::trace!("[PIPELINE] Model uniforms synchronized");
    }
}
