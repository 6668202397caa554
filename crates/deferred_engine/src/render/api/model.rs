//! Drawable scene content

use super::GraphicsDevice;

/// Something that can issue its own draw calls
///
/// The renderer binds the program, target and uniforms for a pass and then
/// asks the model to draw; materials and textures are the model's business.
pub trait Model {
    /// Issue draw calls against the current device state
    fn draw(&self, device: &mut dyn GraphicsDevice);
}
