//! Renderer creation, resize, scene changes, program rebuilds and config files

mod common;

use common::{cube_scene, frame, setup, HEIGHT, WIDTH};
use deferred_engine::config::ConfigFormat;
use deferred_engine::prelude::*;

#[test]
fn new_then_destroy_leaks_nothing() {
    let (mut device, renderer) = setup();
    assert!(renderer.gbuffer().is_complete());
    renderer.destroy(&mut device);
    assert_eq!(device.stats().live_objects(), 0);
}

#[test]
fn failing_program_aborts_creation_cleanly() {
    let mut device = HeadlessDevice::new(WIDTH, HEIGHT);
    device.fail_program("Fog");
    let result = DeferredRenderer::new(&mut device, &RendererConfig::new(WIDTH, HEIGHT));
    assert!(matches!(result, Err(RenderError::ShaderCompilation { ref label, .. }) if label == "Fog"));
    assert_eq!(device.stats().live_objects(), 0);
}

#[test]
fn resize_rebuilds_every_target() {
    let (mut device, mut renderer) = setup();
    let (scene, cube) = cube_scene(&mut device, 2);
    renderer.set_scene(&mut device, Some(scene)).unwrap();
    renderer.render_frame(&mut device, &frame(), None);
    let old_final = renderer.gbuffer().texture(deferred_engine::render::GBufferTarget::Final);
    let live_before = device.stats().live_objects();

    renderer.resize(&mut device, 640, 480).unwrap();

    assert!(!device.texture_exists(old_final));
    let gbuffer = renderer.gbuffer();
    assert_eq!((gbuffer.width(), gbuffer.height()), (640, 480));
    let desc = device
        .texture_desc(gbuffer.texture(deferred_engine::render::GBufferTarget::Final))
        .unwrap();
    assert_eq!((desc.width, desc.height), (640, 480));
    assert_eq!(gbuffer.point_light_count(), 2);
    assert_eq!(gbuffer.shadow_resolution(), 1024);
    assert_eq!(device.stats().live_objects(), live_before);
    assert!(renderer.shadows().full_refresh_pending());

    let report = renderer.render_frame(&mut device, &frame(), None);
    assert_eq!(report.point_shadow_maps_rendered, 2);

    renderer.destroy(&mut device);
    device.delete_mesh(cube);
    assert_eq!(device.stats().live_objects(), 0);
}

#[test]
fn resize_to_same_size_is_a_no_op() {
    let (mut device, mut renderer) = setup();
    let before = device.stats();
    renderer.resize(&mut device, WIDTH, HEIGHT).unwrap();
    assert_eq!(device.stats(), before);
    renderer.destroy(&mut device);
}

#[test]
fn failed_resize_skips_frames_until_a_later_resize() {
    let (mut device, mut renderer) = setup();
    let live = device.stats().textures.live();
    device.set_texture_limit(Some(live - 2));
    assert!(renderer.resize(&mut device, 100, 100).is_err());
    assert!(renderer.gbuffer().is_destroyed());

    device.clear_commands();
    let report = renderer.render_frame(&mut device, &frame(), None);
    assert_eq!(report, FrameReport::default());
    assert!(device.commands().is_empty());

    device.set_texture_limit(None);
    renderer.resize(&mut device, 100, 100).unwrap();
    assert!(!renderer.gbuffer().is_destroyed());
    renderer.destroy(&mut device);
    assert_eq!(device.stats().live_objects(), 0);
}

#[test]
fn scene_changes_resize_point_shadows() {
    let (mut device, mut renderer) = setup();
    assert_eq!(renderer.gbuffer().point_light_count(), 1);

    let (scene, cube) = cube_scene(&mut device, 4);
    renderer.set_scene(&mut device, Some(scene)).unwrap();
    assert_eq!(renderer.gbuffer().point_light_count(), 4);
    assert_eq!(renderer.active_point_lights().len(), 4);

    // Removing the scene falls back to the synthesized default light
    renderer.set_scene(&mut device, None).unwrap();
    assert_eq!(renderer.gbuffer().point_light_count(), 1);
    assert_eq!(renderer.active_point_lights(), &[PointLight::default()]);

    renderer.destroy(&mut device);
    device.delete_mesh(cube);
    assert_eq!(device.stats().live_objects(), 0);
}

#[test]
fn failed_rebuild_keeps_the_last_good_program() {
    let (mut device, mut renderer) = setup();
    let blur = renderer.programs().blur.handle();
    let fog = renderer.programs().fog.handle();

    device.fail_program("Blur");
    assert!(!renderer.recompile_programs(&mut device));

    assert_eq!(renderer.programs().blur.handle(), blur);
    assert_ne!(renderer.programs().fog.handle(), fog);
    assert!(device.program_label(blur).is_some());
    assert!(device.program_label(fog).is_none());

    // Rendering continues on the old blur program
    let report = renderer.render_frame(&mut device, &frame(), None);
    assert!(report.bloom_blur_passes > 0);
    assert!(device.draw_calls().any(|draw| draw.program == blur));

    device.clear_program_failures();
    assert!(renderer.recompile_programs(&mut device));
    assert!(device.program_label(blur).is_none());
    renderer.destroy(&mut device);
    assert_eq!(device.stats().live_objects(), 0);
}

#[test]
fn rebuilt_model_program_gets_its_uniforms_again() {
    let (mut device, mut renderer) = setup();
    renderer.render_frame(&mut device, &frame(), None);
    assert!(renderer.recompile_programs(&mut device));

    renderer.render_frame(&mut device, &frame(), None);
    let model = renderer.programs().model.handle();
    assert!(device.uniform(model, "u_model").is_some());
    assert!(device.uniform(model, "u_displacementData.factor").is_some());
    renderer.destroy(&mut device);
}

#[test]
fn config_round_trips_through_toml_files() {
    let mut config = ApplicationConfig::default();
    config.engine = EngineConfig::new().with_log_level("debug");
    config.renderer = RendererConfig::new(1280, 720)
        .with_shadow_resolutions(2048, 256)
        .with_shader_dir("assets/shaders");
    config.renderer.settings.bloom.threshold = 0.8;
    config.renderer.settings.postprocess.exposure = 1.5;
    config.renderer.settings.render_mode = RenderMode::DebugQuadrants;

    let path = std::env::temp_dir().join(format!("deferred_engine_config_{}.toml", std::process::id()));
    config.save_to_file(&path).unwrap();
    let loaded = ApplicationConfig::load_from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(loaded, config);
    assert!(loaded.validate().is_ok());
}

#[test]
fn partial_config_file_uses_defaults() {
    let text = r#"
        [renderer]
        width = 1024

        [renderer.settings.fog]
        enabled = true
        density = 0.05
    "#;
    let config = ApplicationConfig::from_str_with_format(text, ConfigFormat::Toml).unwrap();
    assert_eq!(config.renderer.width, 1024);
    assert_eq!(config.renderer.height, 600);
    assert!(config.renderer.settings.fog.enabled);

    // Both backgrounds are on in this file; the renderer keeps the skybox
    let mut device = HeadlessDevice::new(1024, 600);
    let renderer = DeferredRenderer::new(&mut device, &config.renderer).unwrap();
    assert!(renderer.skybox_enabled());
    assert!(!renderer.fog_enabled());
    renderer.destroy(&mut device);
}
