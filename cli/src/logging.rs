use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

const DEFAULT_LEVEL: &str = "info";

/// Install the global subscriber. Diagnostics go to stderr so that stdout
/// carries nothing but the job's own output.
///
/// The filter comes from `VIDEOGEN_LOG`, then `RUST_LOG`, then defaults to `info`.
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_env("VIDEOGEN_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .init();
}
