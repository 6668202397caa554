//! Light sources
//!
//! Lights are defined by a single base color that is split into ambient,
//! diffuse and specular terms with fixed factors. Point lights carry
//! constant/linear/quadratic attenuation, from which a falloff radius is
//! derived to size their light volume.

use serde::{Deserialize, Serialize};

use crate::foundation::math::Vec3;
use crate::render::api::GraphicsDevice;
use crate::render::program::ShaderProgram;

/// Share of the base color used as ambient term
pub const AMBIENT_FACTOR: f32 = 0.2;

/// Share of the base color used as diffuse term
pub const DIFFUSE_FACTOR: f32 = 0.5;

/// Share of the base color used as specular term
pub const SPECULAR_FACTOR: f32 = 1.0;

/// Fraction of peak intensity below which a point light is considered dark
///
/// 5/256 is a little over one step of an 8-bit channel.
pub const FALLOFF_CUTOFF: f32 = 5.0 / 256.0;

/// Ambient, diffuse and specular terms of a light
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightTerms {
    /// Ambient term
    pub ambient: Vec3,
    /// Diffuse term
    pub diffuse: Vec3,
    /// Specular term
    pub specular: Vec3,
}

impl LightTerms {
    /// Split a base color into the three terms
    pub fn from_color(color: Vec3) -> Self {
        Self {
            ambient: color * AMBIENT_FACTOR,
            diffuse: color * DIFFUSE_FACTOR,
            specular: color * SPECULAR_FACTOR,
        }
    }

    /// Recover the base color from the diffuse term
    pub fn color(&self) -> Vec3 {
        self.diffuse / DIFFUSE_FACTOR
    }
}

/// Light infinitely far away, shining along a direction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    direction: Vec3,
    terms: LightTerms,
}

impl DirectionalLight {
    /// Light with the given direction and base color
    pub fn new(direction: Vec3, color: Vec3) -> Self {
        Self {
            direction,
            terms: LightTerms::from_color(color),
        }
    }

    /// Direction towards the light, not necessarily normalized
    pub const fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Ambient, diffuse and specular terms
    pub const fn terms(&self) -> &LightTerms {
        &self.terms
    }

    /// Base color
    pub fn color(&self) -> Vec3 {
        self.terms.color()
    }

    /// Same light with a new base color
    pub fn with_color(self, color: Vec3) -> Self {
        Self::new(self.direction, color)
    }

    /// Same light with a new direction
    pub fn with_direction(self, direction: Vec3) -> Self {
        Self { direction, ..self }
    }

    /// Write the light into the `u_dirLight` uniform block
    pub fn upload(&self, device: &mut dyn GraphicsDevice, program: &ShaderProgram) {
        program.set_vec3(device, "u_dirLight.direction", self.direction);
        program.set_vec3(device, "u_dirLight.ambient", self.terms.ambient);
        program.set_vec3(device, "u_dirLight.diffuse", self.terms.diffuse);
        program.set_vec3(device, "u_dirLight.specular", self.terms.specular);
    }
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 5.0, 5.0), Vec3::new(1.0, 1.0, 1.0))
    }
}

/// Distance attenuation `1 / (constant + linear * d + quadratic * d^2)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Attenuation {
    /// Constant term
    pub constant: f32,
    /// Linear term
    pub linear: f32,
    /// Quadratic term
    pub quadratic: f32,
}

impl Default for Attenuation {
    fn default() -> Self {
        Self {
            constant: 1.0,
            linear: 0.14,
            quadratic: 0.07,
        }
    }
}

impl Attenuation {
    /// Distance at which a light of `peak` intensity fades to [`FALLOFF_CUTOFF`] of it
    ///
    /// Solves `peak / (c + l*d + q*d^2) = peak * cutoff` for `d`, i.e.
    /// `q*d^2 + l*d + (c - 1/cutoff) = 0`. Never negative; unbounded when
    /// neither linear nor quadratic terms attenuate.
    pub fn falloff_radius(&self, peak: f32) -> f32 {
        if peak <= 0.0 {
            return 0.0;
        }
        let offset = self.constant - peak / FALLOFF_CUTOFF;

        if self.quadratic <= f32::EPSILON && self.linear <= f32::EPSILON {
            return f32::INFINITY;
        }
        let quadratic = self.quadratic.max(0.0);
        let discriminant = self.linear * self.linear - 4.0 * quadratic * offset;
        if discriminant < 0.0 {
            return 0.0;
        }
        // Rationalized root; reduces to -offset / linear when quadratic is zero
        let denominator = self.linear + discriminant.sqrt();
        if denominator <= 0.0 {
            return 0.0;
        }
        let radius = -2.0 * offset / denominator;

        radius.max(0.0)
    }
}

/// Omnidirectional light at a position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    position: Vec3,
    terms: LightTerms,
    attenuation: Attenuation,
}

impl PointLight {
    /// Light with default attenuation
    pub fn new(position: Vec3, color: Vec3) -> Self {
        Self::with_attenuation(position, color, Attenuation::default())
    }

    /// Light with explicit attenuation terms
    pub fn with_attenuation(position: Vec3, color: Vec3, attenuation: Attenuation) -> Self {
        Self {
            position,
            terms: LightTerms::from_color(color),
            attenuation,
        }
    }

    /// Position in scene space
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Ambient, diffuse and specular terms
    pub const fn terms(&self) -> &LightTerms {
        &self.terms
    }

    /// Attenuation terms
    pub const fn attenuation(&self) -> &Attenuation {
        &self.attenuation
    }

    /// Base color
    pub fn color(&self) -> Vec3 {
        self.terms.color()
    }

    /// Same light with a new base color
    pub fn with_color(self, color: Vec3) -> Self {
        Self::with_attenuation(self.position, color, self.attenuation)
    }

    /// Same light at a new position
    pub fn with_position(self, position: Vec3) -> Self {
        Self { position, ..self }
    }

    /// Radius of the sphere outside which this light contributes nothing visible
    ///
    /// Uses the strongest diffuse channel as peak intensity.
    pub fn falloff_radius(&self) -> f32 {
        self.attenuation.falloff_radius(self.terms.diffuse.max())
    }

    /// Write the light into the `u_pointLight` uniform block
    pub fn upload(&self, device: &mut dyn GraphicsDevice, program: &ShaderProgram) {
        program.set_vec3(device, "u_pointLight.position", self.position);
        program.set_vec3(device, "u_pointLight.ambient", self.terms.ambient);
        program.set_vec3(device, "u_pointLight.diffuse", self.terms.diffuse);
        program.set_vec3(device, "u_pointLight.specular", self.terms.specular);
        program.set_float(device, "u_pointLight.constant", self.attenuation.constant);
        program.set_float(device, "u_pointLight.linear", self.attenuation.linear);
        program.set_float(device, "u_pointLight.quadratic", self.attenuation.quadratic);
    }
}

impl Default for PointLight {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, 1.0, 0.0))
    }
}
