//! Structured logging configuration.
//!
//! The library crate logs through the `log` facade; the bridge installed by
//! `tracing-subscriber` routes those records into the same output.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging.
///
/// Log levels are configurable via `RUST_LOG`; sqlx query logging is kept at
/// warn by default because settlement sweeps are chatty.
///
/// # Example
///
/// ```no_run
/// # use parlor_server::logging;
/// logging::init();
/// tracing::info!("Server starting");
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,hyper=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}
