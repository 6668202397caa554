//! Device implementations
//!
//! Windowed backends live with the application that owns the context; this
//! crate ships the headless device used by tests and offline tooling.

pub mod headless;

pub use headless::{AttachedImage, DeviceCommand, DeviceStats, DrawCall, HeadlessDevice, ObjectCounts};
