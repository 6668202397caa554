//! Shader programs
//!
//! A [`ShaderProgram`] remembers the sources it was built from so it can be
//! rebuilt in place. A failed rebuild leaves the previous program bound and
//! usable.

use crate::foundation::math::{Mat4, Vec2, Vec3, Vec4};
use crate::render::api::{GraphicsDevice, ObjectRef, ProgramHandle, ShaderSources, UniformValue};
use crate::render::RenderResult;

/// Compiled program plus the sources needed to rebuild it
#[derive(Debug)]
pub struct ShaderProgram {
    sources: ShaderSources,
    handle: ProgramHandle,
}

impl ShaderProgram {
    /// Compile a program from its sources
    pub fn compile(device: &mut dyn GraphicsDevice, sources: ShaderSources) -> RenderResult<Self> {
        let handle = device.compile_program(&sources)?;
        device.label_object(ObjectRef::Program(handle), &sources.label);
        log::debug!("[PROGRAM] Built '{}' as {handle}", sources.label);
        Ok(Self { sources, handle })
    }

    /// Diagnostic label
    pub fn label(&self) -> &str {
        &self.sources.label
    }

    /// Current device handle
    pub const fn handle(&self) -> ProgramHandle {
        self.handle
    }

    /// Sources this program is built from
    pub const fn sources(&self) -> &ShaderSources {
        &self.sources
    }

    /// Rebuild from the same sources
    ///
    /// On success the old program is released and replaced. On failure the
    /// error is logged, the old program stays, and `false` is returned.
    pub fn recompile(&mut self, device: &mut dyn GraphicsDevice) -> bool {
        match device.compile_program(&self.sources) {
            Ok(handle) => {
                device.delete_program(self.handle);
                device.label_object(ObjectRef::Program(handle), &self.sources.label);
                log::info!("[PROGRAM] Rebuilt '{}' ({} -> {handle})", self.sources.label, self.handle);
                self.handle = handle;
                true
            }
            Err(e) => {
                log::error!("[PROGRAM] Rebuild of '{}' failed, keeping previous program: {e}", self.sources.label);
                false
            }
        }
    }

    /// Make this program current
    pub fn activate(&self, device: &mut dyn GraphicsDevice) {
        device.use_program(self.handle);
    }

    /// Release the device program
    pub fn destroy(self, device: &mut dyn GraphicsDevice) {
        device.delete_program(self.handle);
    }

    /// Set a `bool` uniform
    pub fn set_bool(&self, device: &mut dyn GraphicsDevice, name: &str, value: bool) {
        device.set_uniform(self.handle, name, UniformValue::Bool(value));
    }

    /// Set an `int` uniform
    pub fn set_int(&self, device: &mut dyn GraphicsDevice, name: &str, value: i32) {
        device.set_uniform(self.handle, name, UniformValue::Int(value));
    }

    /// Point a sampler uniform at a texture unit
    pub fn set_sampler(&self, device: &mut dyn GraphicsDevice, name: &str, unit: u32) {
        self.set_int(device, name, i32::try_from(unit).unwrap_or(i32::MAX));
    }

    /// Set a `float` uniform
    pub fn set_float(&self, device: &mut dyn GraphicsDevice, name: &str, value: f32) {
        device.set_uniform(self.handle, name, UniformValue::Float(value));
    }

    /// Set a `vec2` uniform
    pub fn set_vec2(&self, device: &mut dyn GraphicsDevice, name: &str, value: Vec2) {
        device.set_uniform(self.handle, name, UniformValue::Vec2(value));
    }

    /// Set a `vec3` uniform
    pub fn set_vec3(&self, device: &mut dyn GraphicsDevice, name: &str, value: Vec3) {
        device.set_uniform(self.handle, name, UniformValue::Vec3(value));
    }

    /// Set a `vec4` uniform
    pub fn set_vec4(&self, device: &mut dyn GraphicsDevice, name: &str, value: Vec4) {
        device.set_uniform(self.handle, name, UniformValue::Vec4(value));
    }

    /// Set a `mat4` uniform
    pub fn set_mat4(&self, device: &mut dyn GraphicsDevice, name: &str, value: &Mat4) {
        device.set_uniform(self.handle, name, UniformValue::Mat4(*value));
    }

    /// Set a `mat4[]` uniform
    pub fn set_mat4_array(&self, device: &mut dyn GraphicsDevice, name: &str, values: &[Mat4]) {
        device.set_uniform(self.handle, name, UniformValue::Mat4Array(values.to_vec()));
    }
}
