#![forbid(unsafe_code)]

//! Log targets and optional JSON subscriber setup.
//!
//! Engines log through `tracing` under [`GESTURE_TARGET`]: `debug` for lock
//! grants and state transitions, `trace` per frame, `warn` for action and
//! geometry failures. Hosts that want structured output can enable the
//! `tracing-json` feature and call [`init_json_logging`].

/// Target used by every engine event.
pub const GESTURE_TARGET: &str = "listgrip.gesture";

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "listgrip=info";

/// Install a global JSON subscriber filtered by `RUST_LOG`.
///
/// Fails if a global subscriber is already installed.
#[cfg(feature = "tracing-json")]
pub fn init_json_logging() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
}
