//! Shared fixtures for the integration tests

#![allow(dead_code)]

use deferred_engine::prelude::*;

pub const WIDTH: u32 = 320;
pub const HEIGHT: u32 = 240;

/// Headless device plus a renderer sized to it
pub fn setup() -> (HeadlessDevice, DeferredRenderer) {
    deferred_engine::foundation::logging::init_for_tests();
    let mut device = HeadlessDevice::new(WIDTH, HEIGHT);
    let renderer = DeferredRenderer::new(&mut device, &RendererConfig::new(WIDTH, HEIGHT)).unwrap();
    (device, renderer)
}

/// Scene made of one uploaded cube and the given point lights
pub fn cube_scene(device: &mut HeadlessDevice, point_lights: usize) -> (Scene, MeshHandle) {
    let cube = device.create_mesh(&Mesh::cube()).unwrap();
    #[allow(clippy::cast_precision_loss)]
    let lights = (0..point_lights).map(|i| PointLight::new(Vec3::new(i as f32 * 2.0, 2.0, 0.0), Vec3::new(1.0, 1.0, 1.0)));
    let scene = Scene::new(Box::new(MeshModel::new(vec![cube]))).with_point_lights(lights);
    (scene, cube)
}

pub fn frame() -> FrameInput {
    FrameInput::new(Camera::for_output(Vec3::new(0.0, 2.0, 6.0), 45.0, WIDTH, HEIGHT))
}
