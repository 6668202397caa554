//! The renderer's shader programs

use std::path::Path;

use crate::render::api::{GraphicsDevice, ShaderSources, ShaderStage};
use crate::render::program::ShaderProgram;
use crate::render::{RenderError, RenderResult};

/// One program per pass family
#[derive(Debug)]
pub struct ProgramSet {
    /// Geometry pass; vertex, tessellation and fragment stages
    pub model: ShaderProgram,
    /// Skybox cube
    pub skybox: ShaderProgram,
    /// Point light volumes
    pub point_light: ShaderProgram,
    /// Directional light full-screen pass
    pub directional_light: ShaderProgram,
    /// Separable Gaussian blur
    pub blur: ShaderProgram,
    /// Bright-pass extraction
    pub threshold: ShaderProgram,
    /// Distance fog
    pub fog: ShaderProgram,
    /// Bloom combine, tone mapping and gamma
    pub postprocess: ShaderProgram,
    /// Directional shadow depth
    pub directional_shadow: ShaderProgram,
    /// Point shadow depth; the geometry stage fans out to the six cube faces
    pub point_shadow: ShaderProgram,
    /// Depth-of-field blend
    pub depth_of_field: ShaderProgram,
}

/// Sources of every program, relative to `shader_dir`
pub fn program_sources(shader_dir: &Path) -> [ShaderSources; 11] {
    let simple = |label: &str, name: &str| {
        ShaderSources::vertex_fragment(
            label,
            shader_dir.join(name).join(format!("{name}.vert")),
            shader_dir.join(name).join(format!("{name}.frag")),
        )
    };

    [
        simple("Model", "model")
            .with_stage(ShaderStage::TessControl, shader_dir.join("model/model.tesc"))
            .with_stage(ShaderStage::TessEvaluation, shader_dir.join("model/model.tese")),
        simple("Skybox", "skybox"),
        simple("Pointlight", "pointlight"),
        simple("Dirlight", "dirlight"),
        simple("Blur", "blur"),
        simple("Threshold", "threshold"),
        simple("Fog", "fog"),
        simple("Postprocess", "postprocess"),
        simple("DirLightShadow", "dirshadow"),
        simple("PointLightShadow", "pointlightshadow")
            .with_stage(ShaderStage::Geometry, shader_dir.join("pointlightshadow/pointlightshadow.geom")),
        simple("DepthOfField", "dof"),
    ]
}

impl ProgramSet {
    /// Build every program, releasing the ones already built if any fails
    pub fn load(device: &mut dyn GraphicsDevice, shader_dir: &Path) -> RenderResult<Self> {
        let mut built = Vec::with_capacity(11);
        for sources in program_sources(shader_dir) {
            match ShaderProgram::compile(device, sources) {
                Ok(program) => built.push(program),
                Err(e) => {
                    for program in built {
                        program.destroy(device);
                    }
                    return Err(e);
                }
            }
        }

        let programs: [ShaderProgram; 11] = built.try_into().map_err(|built: Vec<ShaderProgram>| {
            RenderError::InitializationFailed(format!("expected 11 programs, built {}", built.len()))
        })?;
        let [model, skybox, point_light, directional_light, blur, threshold, fog, postprocess, directional_shadow, point_shadow, depth_of_field] =
            programs;
        log::info!("[PROGRAM] Built all renderer programs from {}", shader_dir.display());

        Ok(Self {
            model,
            skybox,
            point_light,
            directional_light,
            blur,
            threshold,
            fog,
            postprocess,
            directional_shadow,
            point_shadow,
            depth_of_field,
        })
    }

    fn all_mut(&mut self) -> [&mut ShaderProgram; 11] {
        [
            &mut self.model,
            &mut self.skybox,
            &mut self.point_light,
            &mut self.directional_light,
            &mut self.blur,
            &mut self.threshold,
            &mut self.fog,
            &mut self.postprocess,
            &mut self.directional_shadow,
            &mut self.point_shadow,
            &mut self.depth_of_field,
        ]
    }

    /// Rebuild every program; `true` only if all succeeded
    ///
    /// A failure does not stop the remaining programs from being rebuilt.
    pub fn recompile_all(&mut self, device: &mut dyn GraphicsDevice) -> bool {
        let mut all_ok = true;
        for program in self.all_mut() {
            all_ok &= program.recompile(device);
        }
        all_ok
    }

    /// Release every program
    pub fn destroy(self, device: &mut dyn GraphicsDevice) {
        let Self {
            model,
            skybox,
            point_light,
            directional_light,
            blur,
            threshold,
            fog,
            postprocess,
            directional_shadow,
            point_shadow,
            depth_of_field,
        } = self;
        for program in [
            model,
            skybox,
            point_light,
            directional_light,
            blur,
            threshold,
            fog,
            postprocess,
            directional_shadow,
            point_shadow,
            depth_of_field,
        ] {
            program.destroy(device);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backends::HeadlessDevice;

    #[test]
    fn test_load_builds_every_program_with_its_stages() {
        let mut device = HeadlessDevice::new(32, 32);
        let programs = ProgramSet::load(&mut device, Path::new("resources/shaders")).unwrap();
        assert_eq!(device.stats().programs.live(), 11);

        let model_stages = device.program_stages(programs.model.handle()).unwrap();
        assert!(model_stages.contains(&ShaderStage::TessControl));
        assert!(model_stages.contains(&ShaderStage::TessEvaluation));
        let shadow_stages = device.program_stages(programs.point_shadow.handle()).unwrap();
        assert!(shadow_stages.contains(&ShaderStage::Geometry));
    }

    #[test]
    fn test_failed_load_releases_built_programs() {
        let mut device = HeadlessDevice::new(32, 32);
        device.fail_program("Fog");
        assert!(ProgramSet::load(&mut device, Path::new("shaders")).is_err());
        assert_eq!(device.stats().programs.live(), 0);
    }

    #[test]
    fn test_recompile_attempts_every_program() {
        let mut device = HeadlessDevice::new(32, 32);
        let mut programs = ProgramSet::load(&mut device, Path::new("shaders")).unwrap();
        let blur_before = programs.blur.handle();
        let model_before = programs.model.handle();
        let dof_before = programs.depth_of_field.handle();

        device.fail_program("Blur");
        assert!(!programs.recompile_all(&mut device));
        assert_eq!(programs.blur.handle(), blur_before);
        // Programs before and after the failure were still rebuilt
        assert_ne!(programs.model.handle(), model_before);
        assert_ne!(programs.depth_of_field.handle(), dof_before);
        assert_eq!(device.stats().programs.live(), 11);
    }
}
