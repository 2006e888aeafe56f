// Logging setup

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the tracing subscriber.
/// The level is controlled through `RUST_LOG` and defaults to `info`.
/// Calling this more than once is harmless.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // An already-installed subscriber wins.
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}
