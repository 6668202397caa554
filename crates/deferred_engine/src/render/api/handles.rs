//! Typed names for device-owned objects
//!
//! Every handle wraps the integer name the device issued. Zero is never
//! issued and stands for "no object"; it is what accessors return when asked
//! for something that does not exist.

macro_rules! device_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(pub u32);

        impl $name {
            /// The "no object" handle
            pub const INVALID: Self = Self(0);

            /// Whether this handle names an object at all
            pub const fn is_valid(self) -> bool {
                self.0 != 0
            }

            /// Raw integer name
            pub const fn id(self) -> u32 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

device_handle!(
    /// Handle to a 2D or cube-map texture
    TextureHandle
);

device_handle!(
    /// Handle to a renderbuffer (write-only attachment storage)
    RenderbufferHandle
);

device_handle!(
    /// Handle to a framebuffer object
    FramebufferHandle
);

device_handle!(
    /// Handle to a linked shader program
    ProgramHandle
);

device_handle!(
    /// Handle to uploaded vertex/index data
    MeshHandle
);

/// Reference to any labelable device object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectRef {
    /// A texture
    Texture(TextureHandle),
    /// A renderbuffer
    Renderbuffer(RenderbufferHandle),
    /// A framebuffer
    Framebuffer(FramebufferHandle),
    /// A program
    Program(ProgramHandle),
    /// Uploaded geometry
    Mesh(MeshHandle),
}
