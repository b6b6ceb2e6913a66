//! Logging initialization and configuration.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Default filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info,orrery=debug,orrery_scene=debug";

/// Initialize the logging system with tracing.
///
/// This sets up tracing-subscriber with:
/// - Environment-based filtering (RUST_LOG)
/// - Target names on every line
///
/// Library crates only emit events; this is called once by the binary.
///
/// # Example
/// ```
/// orrery_core::init_logging();
/// tracing::info!("Simulation started");
/// ```
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // A second call (e.g. from doctests) must not panic.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init();
}
