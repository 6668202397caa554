//! One file per pass family
//!
//! Passes are methods on [`DeferredRenderer`](super::DeferredRenderer); each
//! binds its targets, programs and textures, draws, and leaves blending and
//! culling off for the next pass.

mod bloom;
mod composite;
mod depth_of_field;
mod fog;
mod geometry;
mod lighting;
mod present;
mod shadow;

use crate::render::api::{GraphicsDevice, TextureKind};
use crate::render::gbuffer::{GBufferTarget, GeometryBuffer};
use crate::render::program::ShaderProgram;

/// Run `pass` inside a named device debug group
pub(crate) fn debug_group<R>(
    device: &mut dyn GraphicsDevice,
    name: &str,
    pass: impl FnOnce(&mut dyn GraphicsDevice) -> R,
) -> R {
    device.push_debug_group(name);
    let result = pass(device);
    device.pop_debug_group();
    result
}

/// Bind a G-buffer target at its own texture unit and point `sampler` at it
fn bind_target(
    device: &mut dyn GraphicsDevice,
    gbuffer: &GeometryBuffer,
    program: &ShaderProgram,
    sampler: &str,
    target: GBufferTarget,
) {
    device.bind_texture(target.texture_unit(), TextureKind::Texture2D, gbuffer.texture(target));
    program.set_sampler(device, sampler, target.texture_unit());
}

/// Bind every geometry output read by the lighting programs
fn bind_geometry_inputs(device: &mut dyn GraphicsDevice, gbuffer: &GeometryBuffer, program: &ShaderProgram) {
    bind_target(device, gbuffer, program, "u_position", GBufferTarget::Position);
    bind_target(device, gbuffer, program, "u_normal", GBufferTarget::Normal);
    bind_target(device, gbuffer, program, "u_albedoSpec", GBufferTarget::AlbedoSpecular);
    bind_target(device, gbuffer, program, "u_ambientShi", GBufferTarget::AmbientShininess);
    bind_target(device, gbuffer, program, "u_emission", GBufferTarget::Emission);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backends::{DeviceCommand, HeadlessDevice};

    #[test]
    fn test_debug_group_wraps_the_pass() {
        let mut device = HeadlessDevice::new(16, 16);
        let value = debug_group(&mut device, "Outer", |device| {
            debug_group(device, "Inner", |device| device.clear(crate::render::api::ClearFlags::COLOR));
            7
        });

        assert_eq!(value, 7);
        assert_eq!(device.debug_group_sequence(), vec!["Outer", "Inner"]);
        assert_eq!(device.debug_group_depth(), 0);
        assert!(matches!(device.commands().last(), Some(DeviceCommand::PopDebugGroup)));
    }
}
