mod env;

use serde::Deserialize;
use std::path::PathBuf;

pub use crate::phase::PhaseConfig;

/// Complete heatwatch configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HeatwatchConfig {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub phase: PhaseConfig,
    #[serde(default)]
    pub collector: CollectorConfig,
}

/// Device status API
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    /// URL returning the full status tree
    #[serde(default = "default_status_url")]
    pub status_url: String,
    /// Static bearer token (env: HEATWATCH_DEVICE_TOKEN)
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Serve a captured response from this file instead of polling the API
    #[serde(default)]
    pub replay_file: Option<PathBuf>,
}

fn default_status_url() -> String {
    "http://localhost:8080/features".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            status_url: default_status_url(),
            access_token: None,
            timeout_secs: default_timeout_secs(),
            replay_file: None,
        }
    }
}

/// InfluxDB v2 storage
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_url")]
    pub url: String,
    #[serde(default)]
    pub org: String,
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// API token (env: HEATWATCH_INFLUX_TOKEN)
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_measurement")]
    pub measurement: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_storage_url() -> String {
    "http://localhost:8086".to_string()
}

fn default_bucket() -> String {
    "heating".to_string()
}

fn default_measurement() -> String {
    crate::metrics::HEATER_MEASUREMENT.to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            url: default_storage_url(),
            org: String::new(),
            bucket: default_bucket(),
            token: None,
            measurement: default_measurement(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Collector loop
#[derive(Debug, Clone, Deserialize)]
pub struct CollectorConfig {
    /// Emit a liveness line every this many cycles
    #[serde(default = "default_liveness_every")]
    pub liveness_every: u32,
    /// Where malformed responses are dumped
    #[serde(default = "default_dump_dir")]
    pub dump_dir: PathBuf,
    /// Metric fed to the phase detector
    #[serde(default = "default_flow_metric")]
    pub flow_metric: String,
}

fn default_liveness_every() -> u32 {
    30
}

fn default_dump_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_flow_metric() -> String {
    "volumetric_flow".to_string()
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            liveness_every: default_liveness_every(),
            dump_dir: default_dump_dir(),
            flow_metric: default_flow_metric(),
        }
    }
}

/// Load configuration from TOML file
pub fn load_config(path: &str) -> Result<HeatwatchConfig, Box<dyn std::error::Error + Send + Sync>> {
    let contents = std::fs::read_to_string(path)?;
    let config: HeatwatchConfig = toml::from_str(&contents)?;
    Ok(config)
}
