//! Log subscriber setup for the runner.

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info,flap_world=debug,flap_runner=debug";

pub fn init_telemetry() -> Result<()> {
    // One JSON object per event instead of human-readable lines
    let json = std::env::var("FLAP_LOG_JSON")
        .map(|v| v == "1")
        .unwrap_or(false);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with((!json).then(|| fmt::layer().with_target(true)))
        .with(json.then(|| fmt::layer().json().with_target(true)))
        .try_init()?;

    info!(json, "Telemetry initialized");
    Ok(())
}
