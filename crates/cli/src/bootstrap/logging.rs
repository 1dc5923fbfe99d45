use tracing_subscriber::EnvFilter;

/// Initializes process-wide logging. `RUST_LOG` (standard `tracing_subscriber`
/// syntax) overrides the `info` default; `json` selects structured output for
/// log-aggregator consumption instead of the human-readable pretty format.
pub fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .init();
    }
}
