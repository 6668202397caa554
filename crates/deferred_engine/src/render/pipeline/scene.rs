//! Scene content handed to the renderer

use crate::render::api::{GraphicsDevice, MeshHandle, Model};
use crate::render::lights::{DirectionalLight, PointLight};

/// A drawable model plus the lights that illuminate it
///
/// When a light list is empty the renderer synthesizes one default light of
/// that kind.
pub struct Scene {
    model: Box<dyn Model>,
    directional_lights: Vec<DirectionalLight>,
    point_lights: Vec<PointLight>,
}

impl Scene {
    /// Scene with a model and no lights
    pub fn new(model: Box<dyn Model>) -> Self {
        Self {
            model,
            directional_lights: Vec::new(),
            point_lights: Vec::new(),
        }
    }

    /// Add a directional light
    pub fn with_directional_light(mut self, light: DirectionalLight) -> Self {
        self.directional_lights.push(light);
        self
    }

    /// Add a point light
    pub fn with_point_light(mut self, light: PointLight) -> Self {
        self.point_lights.push(light);
        self
    }

    /// Add several point lights
    pub fn with_point_lights(mut self, lights: impl IntoIterator<Item = PointLight>) -> Self {
        self.point_lights.extend(lights);
        self
    }

    /// The scene model
    pub fn model(&self) -> &dyn Model {
        self.model.as_ref()
    }

    /// Directional lights in declaration order
    pub fn directional_lights(&self) -> &[DirectionalLight] {
        &self.directional_lights
    }

    /// Point lights in declaration order
    pub fn point_lights(&self) -> &[PointLight] {
        &self.point_lights
    }

    pub(crate) fn directional_lights_mut(&mut self) -> &mut [DirectionalLight] {
        &mut self.directional_lights
    }

    pub(crate) fn point_lights_mut(&mut self) -> &mut [PointLight] {
        &mut self.point_lights
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("directional_lights", &self.directional_lights)
            .field("point_lights", &self.point_lights)
            .finish_non_exhaustive()
    }
}

/// Model that draws a list of uploaded meshes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshModel {
    meshes: Vec<MeshHandle>,
}

impl MeshModel {
    /// Model made of the given meshes
    pub fn new(meshes: Vec<MeshHandle>) -> Self {
        Self { meshes }
    }

    /// Meshes drawn by this model
    pub fn meshes(&self) -> &[MeshHandle] {
        &self.meshes
    }
}

impl Model for MeshModel {
    fn draw(&self, device: &mut dyn GraphicsDevice) {
        for mesh in &self.meshes {
            device.draw_mesh(*mesh);
        }
    }
}
