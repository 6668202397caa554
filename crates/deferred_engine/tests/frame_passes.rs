//! A full frame on the headless device

mod common;

use common::{cube_scene, frame, setup, HEIGHT, WIDTH};
use deferred_engine::prelude::*;
use std::collections::HashMap;

use deferred_engine::render::api::{BlendMode, BlitRegion, CullMode, DepthState, ProgramHandle, UniformValue};
use deferred_engine::render::backends::DeviceCommand;
use deferred_engine::render::gbuffer::{BlurTarget, GBufferTarget};
use deferred_engine::render::shadow::ShadowPlan;

#[test]
fn passes_run_in_order() {
    let (mut device, mut renderer) = setup();
    let (scene, cube) = cube_scene(&mut device, 2);
    renderer.set_scene(&mut device, Some(scene)).unwrap();
    renderer.set_skybox_texture(
        device
            .create_texture(&deferred_engine::render::api::TextureDesc::depth_cube(16))
            .unwrap(),
    );
    device.clear_commands();

    let report = renderer.render_frame(&mut device, &frame(), None);

    assert_eq!(
        device.debug_group_sequence(),
        vec![
            "Geometry-Pass",
            "DirLight-Shadow-Pass",
            "Pointlight-Shadow-Pass",
            "Light-Pass",
            "Pointlight-Pass",
            "DirLight-Pass",
            "Threshold-Pass",
            "Blur-Pass",
            "PostProcess-Pass",
            "Skybox-Pass",
            "DepthOfField-Pass",
            "Present",
        ]
    );
    assert_eq!(device.debug_group_depth(), 0);
    assert_eq!(report.shadow_plan, ShadowPlan { directional: true, point: true });
    assert_eq!(report.point_shadow_maps_rendered, 2);
    assert_eq!(report.point_lights_drawn, 2);
    assert_eq!(report.directional_lights_drawn, 1);
    assert_eq!(report.bloom_blur_passes, 4);
    assert!(report.skybox);
    assert!(report.depth_of_field);
    assert!(!report.fog);

    let texture = renderer.skybox_texture();
    renderer.destroy(&mut device);
    device.delete_texture(texture);
    device.delete_mesh(cube);
    assert_eq!(device.stats().live_objects(), 0);
}

#[test]
fn shadows_are_rendered_only_when_stale() {
    let (mut device, mut renderer) = setup();
    let (scene, cube) = cube_scene(&mut device, 1);
    renderer.set_scene(&mut device, Some(scene)).unwrap();

    let first = renderer.render_frame(&mut device, &frame(), None);
    assert!(first.shadow_plan.directional && first.shadow_plan.point);

    let second = renderer.render_frame(&mut device, &frame(), None);
    assert!(!second.shadow_plan.any());
    assert_eq!(second.point_shadow_maps_rendered, 0);

    renderer.destroy(&mut device);
    device.delete_mesh(cube);
}

#[test]
fn frames_without_a_scene_skip_shadow_work() {
    let (mut device, mut renderer) = setup();
    device.clear_commands();

    let empty = renderer.render_frame(&mut device, &frame(), None);
    assert!(!empty.shadow_plan.any());
    assert_eq!(empty.point_shadow_maps_rendered, 0);
    let groups = device.debug_group_sequence();
    assert!(!groups.contains(&"DirLight-Shadow-Pass"));
    assert!(!groups.contains(&"Pointlight-Shadow-Pass"));

    let (scene, cube) = cube_scene(&mut device, 1);
    renderer.set_scene(&mut device, Some(scene)).unwrap();
    let first = renderer.render_frame(&mut device, &frame(), None);
    assert_eq!(first.shadow_plan, ShadowPlan { directional: true, point: true });
    assert_eq!(first.point_shadow_maps_rendered, 1);

    renderer.destroy(&mut device);
    device.delete_mesh(cube);
}

#[test]
fn directional_only_update_leaves_point_shadows_alone() {
    let (mut device, mut renderer) = setup();
    let (scene, cube) = cube_scene(&mut device, 2);
    renderer.set_scene(&mut device, Some(scene)).unwrap();
    renderer.render_frame(&mut device, &frame(), None);

    renderer.request_directional_shadow_update();
    device.clear_commands();
    let report = renderer.render_frame(&mut device, &frame(), None);

    assert_eq!(report.shadow_plan, ShadowPlan { directional: true, point: false });
    let groups = device.debug_group_sequence();
    assert!(groups.contains(&"DirLight-Shadow-Pass"));
    assert!(!groups.contains(&"Pointlight-Shadow-Pass"));
    assert_eq!(renderer.shadows().directional(), deferred_engine::render::shadow::ShadowUpdate::Clean);

    let report = renderer.render_frame(&mut device, &frame(), None);
    assert!(!report.shadow_plan.any());

    renderer.destroy(&mut device);
    device.delete_mesh(cube);
}

#[test]
fn shadow_passes_restore_targets_and_use_front_face_culling() {
    let (mut device, mut renderer) = setup();
    let (scene, cube) = cube_scene(&mut device, 1);
    renderer.set_scene(&mut device, Some(scene)).unwrap();
    renderer.render_frame(&mut device, &frame(), None);

    let shadow_draws: Vec<_> = device
        .draw_calls()
        .filter(|draw| {
            matches!(
                draw.debug_group.as_deref(),
                Some("DirLight-Shadow-Pass" | "Pointlight-Shadow-Pass")
            )
        })
        .collect();
    assert_eq!(shadow_draws.len(), 2);
    assert!(shadow_draws.iter().all(|draw| draw.cull == CullMode::Front));
    assert_eq!(shadow_draws[0].viewport.width, 1024);
    assert_eq!(shadow_draws[1].viewport.width, 512);

    // The lighting pass runs at output size again
    let light = device
        .draw_calls()
        .find(|draw| draw.debug_group.as_deref() == Some("Pointlight-Pass"))
        .unwrap();
    assert_eq!((light.viewport.width, light.viewport.height), (WIDTH, HEIGHT));
    assert_eq!(light.blend, BlendMode::Additive);
    assert_eq!(light.depth, DepthState::Disabled);
    assert_eq!(light.cull, CullMode::Front);

    renderer.destroy(&mut device);
    device.delete_mesh(cube);
}

/// Sampler uniforms used by the renderer's programs
const SAMPLERS: [&str; 11] = [
    "u_position",
    "u_normal",
    "u_albedoSpec",
    "u_ambientShi",
    "u_emission",
    "u_final",
    "u_bloom",
    "u_image",
    "u_finalBlur",
    "u_shadowMap",
    "u_skybox",
];

#[test]
fn no_pass_samples_the_target_it_writes() {
    let (mut device, mut renderer) = setup();
    let (scene, cube) = cube_scene(&mut device, 1);
    renderer.set_scene(&mut device, Some(scene)).unwrap();
    renderer.render_frame(&mut device, &frame(), None);

    let gbuffer = renderer.gbuffer();
    let written_by = |draw: &deferred_engine::render::backends::DrawCall| -> Vec<TextureHandle> {
        draw.draw_buffers
            .iter()
            .filter_map(|attachment| {
                if draw.framebuffer == Some(gbuffer.default_framebuffer()) {
                    GBufferTarget::ALL
                        .into_iter()
                        .find(|target| target.attachment() == *attachment)
                        .map(|target| gbuffer.texture(target))
                } else if draw.framebuffer == Some(gbuffer.blur_framebuffer()) {
                    BlurTarget::ALL
                        .into_iter()
                        .find(|target| target.attachment() == *attachment)
                        .map(|target| gbuffer.blur_texture(target))
                } else {
                    None
                }
            })
            .collect()
    };

    let mut samplers: HashMap<ProgramHandle, HashMap<String, u32>> = HashMap::new();
    let mut checked = 0;
    for command in device.commands() {
        match command {
            DeviceCommand::SetUniform { program, name, value: UniformValue::Int(unit) }
                if SAMPLERS.contains(&name.as_str()) =>
            {
                samplers.entry(*program).or_default().insert(name.clone(), u32::try_from(*unit).unwrap());
            }
            DeviceCommand::Draw(draw) => {
                let written = written_by(draw);
                let Some(units) = samplers.get(&draw.program) else { continue };
                for (name, unit) in units {
                    let sampled = draw.textures.iter().find(|(bound, _)| bound == unit).map(|(_, texture)| *texture);
                    if let Some(sampled) = sampled {
                        assert!(
                            !written.contains(&sampled),
                            "{name} samples a target written by {:?}",
                            draw.debug_group
                        );
                    }
                }
                checked += 1;
            }
            _ => {}
        }
    }
    assert!(checked > 10);

    renderer.destroy(&mut device);
    device.delete_mesh(cube);
}

#[test]
fn frame_ends_by_clearing_blur_and_final_targets() {
    let (mut device, mut renderer) = setup();
    renderer.render_frame(&mut device, &frame(), None);

    let gbuffer = renderer.gbuffer();
    let clears: Vec<_> = device
        .commands()
        .iter()
        .rev()
        .filter_map(|command| match command {
            DeviceCommand::Clear { framebuffer, draw_buffers, .. } => Some((*framebuffer, draw_buffers.clone())),
            _ => None,
        })
        .take(3)
        .collect();

    assert!(clears.contains(&(Some(gbuffer.default_framebuffer()), vec![GBufferTarget::Final.attachment()])));
    assert!(clears.contains(&(Some(gbuffer.blur_framebuffer()), vec![BlurTarget::Horizontal.attachment()])));
    assert!(clears.contains(&(Some(gbuffer.blur_framebuffer()), vec![BlurTarget::Vertical.attachment()])));
    renderer.destroy(&mut device);
}

#[test]
fn gui_hook_runs_after_present() {
    let (mut device, mut renderer) = setup();
    let mut calls = 0;
    let mut gui = |device: &mut dyn GraphicsDevice| {
        calls += 1;
        device.push_debug_group("Gui");
        device.pop_debug_group();
    };
    renderer.render_frame(&mut device, &frame(), Some(&mut gui));

    assert_eq!(calls, 1);
    let groups = device.debug_group_sequence();
    assert_eq!(&groups[groups.len() - 2..], &["Present", "Gui"]);
    renderer.destroy(&mut device);
}

#[test]
fn composite_mode_presents_the_vertical_blur_target() {
    let (mut device, mut renderer) = setup();
    renderer.render_frame(&mut device, &frame(), None);

    let blits: Vec<_> = device
        .commands()
        .iter()
        .filter_map(|command| match command {
            DeviceCommand::Blit { source_framebuffer, read_buffer, destination_framebuffer: None, destination, .. } => {
                Some((*source_framebuffer, *read_buffer, *destination))
            }
            _ => None,
        })
        .collect();
    assert_eq!(
        blits,
        vec![(
            Some(renderer.gbuffer().blur_framebuffer()),
            Some(BlurTarget::Vertical.attachment()),
            BlitRegion::full(WIDTH, HEIGHT)
        )]
    );
    renderer.destroy(&mut device);
}

#[test]
fn debug_mode_tiles_four_geometry_targets() {
    let (mut device, mut renderer) = setup();
    renderer.set_render_mode(RenderMode::DebugQuadrants);
    renderer.render_frame(&mut device, &frame(), None);

    let reads: Vec<_> = device
        .commands()
        .iter()
        .filter_map(|command| match command {
            DeviceCommand::Blit { read_buffer, destination_framebuffer: None, .. } => *read_buffer,
            _ => None,
        })
        .collect();
    assert_eq!(
        reads,
        vec![
            GBufferTarget::AlbedoSpecular.attachment(),
            GBufferTarget::Normal.attachment(),
            GBufferTarget::Position.attachment(),
            GBufferTarget::Emission.attachment(),
        ]
    );
    renderer.destroy(&mut device);
}

#[test]
fn fog_replaces_skybox_and_depth_of_field_can_be_skipped() {
    let (mut device, mut renderer) = setup();
    renderer.set_fog_enabled(true);
    renderer.set_depth_of_field_enabled(false);
    device.clear_commands();

    let report = renderer.render_frame(&mut device, &frame(), None);
    assert!(report.fog);
    assert!(!report.skybox);
    assert!(!report.depth_of_field);

    let groups = device.debug_group_sequence();
    assert!(groups.contains(&"Fog-Pass"));
    assert!(!groups.contains(&"Skybox-Pass"));
    assert!(!groups.contains(&"DepthOfField-Pass"));
    renderer.destroy(&mut device);
}

#[test]
fn inactive_lights_skip_their_draws() {
    let (mut device, mut renderer) = setup();
    renderer.toggle_point_lights();
    renderer.toggle_directional_lights();

    let report = renderer.render_frame(&mut device, &frame(), None);
    assert_eq!(report.point_lights_drawn, 0);
    assert_eq!(report.directional_lights_drawn, 0);
    // Pass setup still ran
    let groups = device.debug_group_sequence();
    assert!(groups.contains(&"Pointlight-Pass"));
    assert!(groups.contains(&"DirLight-Pass"));
    renderer.destroy(&mut device);
}

#[test]
fn wireframe_frames_restore_fill_mode() {
    use deferred_engine::render::api::PolygonMode;

    let (mut device, mut renderer) = setup();
    let (scene, cube) = cube_scene(&mut device, 1);
    renderer.set_scene(&mut device, Some(scene)).unwrap();
    renderer.render_frame(&mut device, &frame().with_wireframe(true), None);

    let geometry = device
        .draw_calls()
        .find(|draw| draw.debug_group.as_deref() == Some("Geometry-Pass"))
        .unwrap();
    assert_eq!(geometry.polygon, PolygonMode::Line);
    let light = device
        .draw_calls()
        .find(|draw| draw.debug_group.as_deref() == Some("Pointlight-Pass"))
        .unwrap();
    assert_eq!(light.polygon, PolygonMode::Fill);

    renderer.destroy(&mut device);
    device.delete_mesh(cube);
}
