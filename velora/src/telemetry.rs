//! Tracing initialization.
//!
//! Logs go to stdout through a `tracing-subscriber` fmt layer. Verbosity is controlled by the
//! standard `RUST_LOG` environment variable and defaults to `info`, e.g.
//!
//! ```bash
//! RUST_LOG=velora=debug,sqlx=warn velora -f config.yaml
//! ```

use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install the global subscriber. Fails if one is already installed.
pub fn init_telemetry() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    info!("Telemetry initialized");
    Ok(())
}
