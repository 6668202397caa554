//! Logging utilities and structured logging support
//!
//! Log lines are tagged by subsystem, e.g. `[GBUFFER]`, `[SHADOW]`,
//! `[PIPELINE]` and `[PROGRAM]`, so `RUST_LOG` filtering plus a grep on the
//! tag isolates one area of the renderer.

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system from the `RUST_LOG` environment variable
pub fn init() {
    env_logger::init();
}

/// Initialize logging with an explicit default level
///
/// `RUST_LOG` still wins when it is set. Calling this more than once is
/// harmless; only the first call installs the logger.
pub fn init_with_level(level: log::LevelFilter) {
    let _ = env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(level)
        .parse_default_env()
        .try_init();
}

/// Initialize logging for tests, capturing output per test
pub fn init_for_tests() {
    let _ = env_logger::builder().is_test(true).try_init();
}
