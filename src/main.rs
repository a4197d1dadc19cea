use anyhow::Context;
use aqi_slotcast::{ForecastConfig, Forecaster};
use log::info;
use std::process::ExitCode;

const DEFAULT_CONFIG_PATH: &str = "config/forecast.toml";

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // RUST_LOG overrides the default level.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = ForecastConfig::load(&config_path)
        .with_context(|| format!("Could not load configuration from {}", config_path))?;
    info!(
        "Forecasting {} locations into {}",
        config.locations.len(),
        config.output_dir.display()
    );

    let forecaster = Forecaster::from_config(&config).context("Could not set up forecaster")?;
    let summary = forecaster.run().call().await;
    summary.log();

    if summary.written() == 0 && summary.failed() > 0 {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
