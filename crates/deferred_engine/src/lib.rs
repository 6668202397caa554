//! # Deferred Engine
//!
//! The core of a deferred-shading renderer: an off-screen geometry buffer,
//! directional and point-light shadow maps, and an orchestrator that runs
//! geometry, lighting, bloom, fog, skybox, depth-of-field and present passes
//! in a fixed order every frame.
//!
//! ## Features
//!
//! - **Device abstraction**: everything renders through the object-safe
//!   [`GraphicsDevice`](render::GraphicsDevice) trait
//! - **Headless device**: a validating in-memory device for tests and tools
//! - **Shadow scheduling**: shadow maps are redrawn only when stale
//! - **Configuration**: every tunable parameter loads from TOML or RON
//!
//! ## Quick Start
//!
//! ```rust
//! use deferred_engine::prelude::*;
//!
//! fn main() -> Result<(), RenderError> {
//!     let mut device = HeadlessDevice::new(800, 600);
//!     let mut renderer = DeferredRenderer::new(&mut device, &RendererConfig::new(800, 600))?;
//!
//!     let cube = device.create_mesh(&Mesh::cube())?;
//!     let scene = Scene::new(Box::new(MeshModel::new(vec![cube])))
//!         .with_point_light(PointLight::new(Vec3::new(0.0, 2.0, 0.0), Vec3::new(1.0, 0.9, 0.8)));
//!     renderer.set_scene(&mut device, Some(scene))?;
//!
//!     let camera = Camera::for_output(Vec3::new(0.0, 2.0, 6.0), 45.0, 800, 600);
//!     let report = renderer.render_frame(&mut device, &FrameInput::new(camera), None);
//!     assert_eq!(report.point_lights_drawn, 1);
//!
//!     renderer.destroy(&mut device);
//!     device.delete_mesh(cube);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod core;
pub mod foundation;
pub mod render;

/// Common imports for renderer users
pub mod prelude {
    pub use crate::{
        core::config::{ApplicationConfig, Config, EngineConfig, RendererConfig},
        foundation::math::{Mat4, Transform, Vec3},
        render::{
            api::{GraphicsDevice, MeshHandle, TextureHandle},
            backends::HeadlessDevice,
            pipeline::{MeshModel, RenderSettings},
            Camera, DeferredRenderer, DirectionalLight, FrameInput, FrameReport, Mesh, PointLight, RenderError,
            RenderMode, RenderResult, Scene,
        },
    };
}
