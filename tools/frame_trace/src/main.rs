//! Frame trace tool
//!
//! Builds a renderer on the headless device, renders a few frames of a
//! generated scene, and prints the pass sequence and resource statistics of
//! each frame.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, Command};
use deferred_engine::prelude::*;
use deferred_engine::render::backends::DeviceStats;

const DEFAULT_FRAMES: u32 = 2;
const DEFAULT_POINT_LIGHTS: usize = 2;

#[derive(Debug)]
struct TraceConfig {
    config_file: Option<PathBuf>,
    frames: u32,
    point_lights: usize,
    debug_view: bool,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            config_file: None,
            frames: DEFAULT_FRAMES,
            point_lights: DEFAULT_POINT_LIGHTS,
            debug_view: false,
        }
    }
}

fn parse_args() -> TraceConfig {
    let matches = Command::new("frame_trace")
        .about("Renders headless frames and prints the pass trace of each")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Application config file (.toml or .ron)")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("frames")
                .short('f')
                .long("frames")
                .value_name("N")
                .help("Number of frames to render")
                .value_parser(value_parser!(u32))
                .default_value("2"),
        )
        .arg(
            Arg::new("point-lights")
                .short('p')
                .long("point-lights")
                .value_name("N")
                .help("Point lights in the generated scene; 0 uses the default light")
                .value_parser(value_parser!(usize))
                .default_value("2"),
        )
        .arg(
            Arg::new("debug-view")
                .long("debug-view")
                .help("Show the G-buffer quadrants instead of the composite")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let defaults = TraceConfig::default();
    TraceConfig {
        config_file: matches.get_one::<PathBuf>("config").cloned(),
        frames: matches.get_one::<u32>("frames").copied().unwrap_or(defaults.frames),
        point_lights: matches
            .get_one::<usize>("point-lights")
            .copied()
            .unwrap_or(defaults.point_lights),
        debug_view: matches.get_flag("debug-view"),
    }
}

fn load_config(path: Option<&Path>) -> Result<ApplicationConfig> {
    let Some(path) = path else {
        return Ok(ApplicationConfig::default());
    };
    let config = ApplicationConfig::load_from_file(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    config
        .validate()
        .map_err(|reason| anyhow::anyhow!("Invalid config {}: {reason}", path.display()))?;
    Ok(config)
}

/// A quad and a cube, lit by a ring of point lights
fn build_scene(device: &mut HeadlessDevice, point_lights: usize) -> Result<(Scene, Vec<MeshHandle>)> {
    let quad = device.create_mesh(&Mesh::fullscreen_quad())?;
    let cube = device.create_mesh(&Mesh::cube())?;

    #[allow(clippy::cast_precision_loss)]
    let lights = (0..point_lights).map(|i| {
        let angle = i as f32 / point_lights as f32 * std::f32::consts::TAU;
        PointLight::new(
            Vec3::new(angle.cos() * 3.0, 2.0, angle.sin() * 3.0),
            Vec3::new(1.0, 0.9, 0.7),
        )
    });

    let scene = Scene::new(Box::new(MeshModel::new(vec![quad, cube])))
        .with_directional_light(DirectionalLight::default())
        .with_point_lights(lights);
    Ok((scene, vec![quad, cube]))
}

fn print_stats(stats: &DeviceStats) {
    println!(
        "  live: {} textures, {} renderbuffers, {} framebuffers, {} programs, {} meshes; {} draws total",
        stats.textures.live(),
        stats.renderbuffers.live(),
        stats.framebuffers.live(),
        stats.programs.live(),
        stats.meshes.live(),
        stats.draw_calls,
    );
}

fn main() -> Result<()> {
    let args = parse_args();
    let config = load_config(args.config_file.as_deref())?;
    deferred_engine::foundation::logging::init_with_level(config.engine.level_filter());

    let renderer_config = &config.renderer;
    let mut device = HeadlessDevice::new(renderer_config.width, renderer_config.height);
    let mut renderer = DeferredRenderer::new(&mut device, renderer_config).context("Failed to create renderer")?;
    if args.debug_view {
        renderer.set_render_mode(RenderMode::DebugQuadrants);
    }

    let (scene, meshes) = build_scene(&mut device, args.point_lights)?;
    renderer.set_scene(&mut device, Some(scene))?;

    let camera = Camera::for_output(
        Vec3::new(0.0, 3.0, 8.0),
        45.0,
        renderer_config.width,
        renderer_config.height,
    );
    let input = FrameInput::new(camera).with_clear_color([0.05, 0.05, 0.08, 1.0]);

    for frame in 0..args.frames {
        device.clear_commands();
        let report = renderer.render_frame(&mut device, &input, None);

        println!("frame {frame}:");
        println!("  passes: {}", device.debug_group_sequence().join(" > "));
        println!(
            "  shadows: directional={} point={} ({} cube maps)",
            report.shadow_plan.directional, report.shadow_plan.point, report.point_shadow_maps_rendered
        );
        println!(
            "  lights: {} point volumes, {} directional quads; blur draws: {} bloom, {} depth of field",
            report.point_lights_drawn,
            report.directional_lights_drawn,
            report.bloom_blur_passes,
            report.depth_of_field_blur_passes
        );
        println!("  draw calls this frame: {}", device.draw_calls().count());
        print_stats(&device.stats());
    }

    renderer.destroy(&mut device);
    for mesh in meshes {
        device.delete_mesh(mesh);
    }
    let leaked = device.stats().live_objects();
    if leaked > 0 {
        log::warn!("{leaked} device objects still live after shutdown");
    }
    log::info!("Traced {} frames", args.frames);
    Ok(())
}
