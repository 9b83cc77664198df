use tracing_subscriber::{EnvFilter, fmt};

/// Install the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG` wins over `default_level` when set. If a subscriber is already
/// installed this leaves it in place.
pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}
