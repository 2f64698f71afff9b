use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Thresholds and poll intervals of the phase detector
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PhaseConfig {
    /// Return flow at or above which the appliance counts as heating
    #[serde(default = "default_flow_threshold")]
    pub flow_threshold: f64,

    /// How long to stay in cooldown after flow drops (seconds)
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,

    /// Poll interval while heating or cooling down (seconds)
    #[serde(default = "default_fast_interval_secs")]
    pub fast_interval_secs: u64,

    /// Poll interval in normal operation (seconds)
    #[serde(default = "default_slow_interval_secs")]
    pub slow_interval_secs: u64,
}

fn default_flow_threshold() -> f64 {
    600.0
}

fn default_cooldown_secs() -> u64 {
    600
}

fn default_fast_interval_secs() -> u64 {
    60
}

fn default_slow_interval_secs() -> u64 {
    120
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            flow_threshold: default_flow_threshold(),
            cooldown_secs: default_cooldown_secs(),
            fast_interval_secs: default_fast_interval_secs(),
            slow_interval_secs: default_slow_interval_secs(),
        }
    }
}

impl PhaseConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    pub fn fast_interval(&self) -> Duration {
        Duration::from_secs(self.fast_interval_secs)
    }

    pub fn slow_interval(&self) -> Duration {
        Duration::from_secs(self.slow_interval_secs)
    }
}
