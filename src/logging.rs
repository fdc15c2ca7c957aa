//! Logging setup
//!
//! Everything logs through the `log` facade; this installs `env_logger` as
//! the backend. `RUST_LOG` overrides the default level.

use log::LevelFilter;

/// Install the logger with `default_level` unless `RUST_LOG` is set
///
/// Repeated calls are ignored, so tests can call it freely.
pub fn init(default_level: LevelFilter) {
    let _ = env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .format_timestamp_millis()
        .try_init();
}

/// Install the logger for tests (output captured by the harness)
pub fn init_for_tests() {
    let _ = env_logger::builder().is_test(true).try_init();
}
