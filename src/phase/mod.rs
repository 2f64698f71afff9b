//! Operating phase detection from return flow.
//!
//! ```text
//!            flow >= threshold          flow < threshold
//!   NORMAL ───────────────────▶ HEATING ─────────────────▶ COOLDOWN
//!     ▲                                                       │
//!     └─────────────────── now >= wake-up ────────────────────┘
//! ```
//!
//! Only the transition leaving the current phase is evaluated, so the
//! detector advances at most one step per observation.

use std::fmt;
use std::time::{Duration, Instant};

pub mod config;

pub use config::PhaseConfig;

/// Inferred operating phase of the appliance
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Normal,
    Heating,
    Cooldown,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Normal => write!(f, "normal"),
            Phase::Heating => write!(f, "heating"),
            Phase::Cooldown => write!(f, "cooldown"),
        }
    }
}

/// A phase change produced by one observation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    pub from: Phase,
    pub to: Phase,
}

/// Debounced phase state machine; also selects the poll interval.
#[derive(Clone, Debug)]
pub struct PhaseDetector {
    config: PhaseConfig,
    phase: Phase,
    /// Set on entering cooldown; meaningless in other phases
    wake_at: Option<Instant>,
    interval: Duration,
}

impl PhaseDetector {
    /// Start in `Normal` with the slow interval.
    pub fn new(config: PhaseConfig) -> Self {
        let interval = config.slow_interval();
        Self {
            config,
            phase: Phase::Normal,
            wake_at: None,
            interval,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Poll interval selected by the last transition
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Instant at which cooldown ends, while in cooldown
    pub fn wake_at(&self) -> Option<Instant> {
        match self.phase {
            Phase::Cooldown => self.wake_at,
            _ => None,
        }
    }

    pub fn config(&self) -> &PhaseConfig {
        &self.config
    }

    /// Feed one flow reading taken at `now`.
    ///
    /// Returns the transition taken, if any.
    pub fn observe(&mut self, flow: f64, now: Instant) -> Option<Transition> {
        let from = self.phase;

        match self.phase {
            Phase::Normal if flow >= self.config.flow_threshold => {
                self.phase = Phase::Heating;
                self.interval = self.config.fast_interval();
            }
            Phase::Heating if flow < self.config.flow_threshold => {
                self.phase = Phase::Cooldown;
                self.wake_at = Some(now + self.config.cooldown());
                self.interval = self.config.fast_interval();
            }
            Phase::Cooldown if self.wake_at.map_or(true, |wake| now >= wake) => {
                self.phase = Phase::Normal;
                self.wake_at = None;
                self.interval = self.config.slow_interval();
            }
            _ => return None,
        }

        Some(Transition {
            from,
            to: self.phase,
        })
    }
}
