use anyhow::{anyhow, Context, Result};
use heatwatch::config::{load_config, HeatwatchConfig};
use heatwatch::metrics::HEATER_SCHEMA;
use heatwatch::PhaseDetector;
use heatwatch_collector::{
    Collector, CollectorState, DeviceClient, DiagnosticDump, InfluxWriter, ReplaySource,
    StatusSource,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "heatwatch=info,heatwatch_collector=info".into()),
        )
        .init();

    info!("Heatwatch collector starting...");

    // Read configuration: file (optional), then environment overrides
    let config_path =
        std::env::var("HEATWATCH_CONFIG").unwrap_or_else(|_| "heatwatch.toml".to_string());
    let mut config = if Path::new(&config_path).exists() {
        load_config(&config_path)
            .map_err(|e| anyhow!("Failed to load config '{}': {}", config_path, e))?
    } else {
        warn!(path = %config_path, "Config file not found, using defaults");
        HeatwatchConfig::default()
    };
    config.apply_env();

    info!(
        status_url = %config.device.status_url,
        replay_file = ?config.device.replay_file,
        storage_url = %config.storage.url,
        bucket = %config.storage.bucket,
        dump_dir = %config.collector.dump_dir.display(),
        "Configuration loaded"
    );

    let source: Arc<dyn StatusSource> = match &config.device.replay_file {
        Some(path) => {
            warn!(path = %path.display(), "Replaying captured response instead of polling device");
            Arc::new(ReplaySource::new(path.clone()))
        }
        None => Arc::new(
            DeviceClient::new(&config.device).context("Failed to initialize device client")?,
        ),
    };
    let writer = Arc::new(
        InfluxWriter::new(&config.storage).context("Failed to initialize storage writer")?,
    );

    let collector = Collector::new(
        source,
        writer,
        DiagnosticDump::new(config.collector.dump_dir.clone()),
        config.storage.measurement.clone(),
        HEATER_SCHEMA,
        &config.collector,
    )
    .context("Failed to create collector")?;

    let mut state = CollectorState::new(PhaseDetector::new(config.phase.clone()));

    // Poll until shutdown signal
    tokio::select! {
        _ = collector.run(&mut state) => {}
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for ctrl_c signal")?;
            info!("Shutdown signal received");
        }
    }

    info!(
        cycles = state.cycles,
        points = state.status.poll_count,
        errors = state.status.error_count,
        "Collector stopped"
    );

    Ok(())
}
