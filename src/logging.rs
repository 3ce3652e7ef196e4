use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

/// Directives appended to the fallback filter so HTTP and SQL internals stay
/// quiet unless `RUST_LOG` asks for them.
const QUIET_DEPENDENCIES: &[&str] = &["hyper=warn", "reqwest=warn", "sqlx=warn", "rustls=warn"];

/// Install the global fmt subscriber. `RUST_LOG` wins over `default_filter`.
pub fn init_tracing(default_filter: &str) -> Result<(), anyhow::Error> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback_filter(default_filter)))
        .map_err(|e| anyhow::anyhow!("invalid log filter {default_filter:?}: {e}"))?;

    SubscriberBuilder::default()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {}", e))
}

fn fallback_filter(default_filter: &str) -> String {
    std::iter::once(default_filter)
        .chain(QUIET_DEPENDENCIES.iter().copied())
        .collect::<Vec<_>>()
        .join(",")
}
