//! Poll cycle orchestration.
//!
//! Each cycle fetches the status tree, flattens it, maps it onto the metric
//! schema, writes one point and feeds the flow metric to the phase detector,
//! whose interval decides how long to sleep before the next cycle.

use crate::dump::DiagnosticDump;
use crate::influx::PointWriter;
use crate::source::StatusSource;
use anyhow::{bail, Result};
use chrono::{DateTime, Local, Utc};
use heatwatch::config::CollectorConfig;
use heatwatch::metrics::{map_to_metrics, MetricError, MetricKind, MetricSpec};
use heatwatch::{flatten_response, FieldValue, FlattenError, PhaseDetector, Point, Transition};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Mutable loop state, owned by the caller and threaded through each cycle.
#[derive(Debug)]
pub struct CollectorState {
    pub detector: PhaseDetector,
    /// Cycles started since process start
    pub cycles: u64,
    pub status: CollectorStatus,
}

impl CollectorState {
    pub fn new(detector: PhaseDetector) -> Self {
        Self {
            detector,
            cycles: 0,
            status: CollectorStatus::default(),
        }
    }
}

/// Status information for the collector.
#[derive(Clone, Debug, Default)]
pub struct CollectorStatus {
    /// Last successful cycle timestamp
    pub last_poll: Option<DateTime<Utc>>,
    /// Last error message (if any)
    pub last_error: Option<String>,
    /// Total number of points written
    pub poll_count: u64,
    /// Total number of aborted cycles
    pub error_count: u64,
}

/// Outcome of a successful cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct CycleReport {
    pub point: Point,
    pub flow: f64,
    pub transition: Option<Transition>,
}

/// Why a cycle was aborted.
#[derive(Debug)]
pub enum CycleError {
    /// Device API unreachable or returned garbage
    Fetch(anyhow::Error),
    /// Response lacks the entity collection; `dump` is where it was saved
    Malformed {
        error: FlattenError,
        dump: Option<PathBuf>,
    },
    /// A schema metric is missing or has the wrong kind
    Metrics(MetricError),
    /// Storage rejected or never received the point
    Store(anyhow::Error),
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleError::Fetch(e) => write!(f, "fetch failed: {:#}", e),
            CycleError::Malformed {
                error,
                dump: Some(path),
            } => write!(f, "{} (dumped to {})", error, path.display()),
            CycleError::Malformed { error, dump: None } => write!(f, "{} (not dumped)", error),
            CycleError::Metrics(e) => write!(f, "metric mapping failed: {}", e),
            CycleError::Store(e) => write!(f, "storage write failed: {:#}", e),
        }
    }
}

impl std::error::Error for CycleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CycleError::Fetch(e) | CycleError::Store(e) => Some(&**e),
            CycleError::Malformed { error, .. } => Some(error),
            CycleError::Metrics(e) => Some(e),
        }
    }
}

/// Polls the device and stores one point per cycle.
pub struct Collector {
    source: Arc<dyn StatusSource>,
    writer: Arc<dyn PointWriter>,
    dump: DiagnosticDump,
    measurement: String,
    schema: &'static [MetricSpec],
    flow_metric: String,
    flow_path: &'static str,
    liveness_every: u32,
}

impl Collector {
    /// Creates a collector.
    ///
    /// Fails if the configured flow metric is not a float metric of `schema`.
    pub fn new(
        source: Arc<dyn StatusSource>,
        writer: Arc<dyn PointWriter>,
        dump: DiagnosticDump,
        measurement: impl Into<String>,
        schema: &'static [MetricSpec],
        config: &CollectorConfig,
    ) -> Result<Self> {
        let flow_path = match schema.iter().find(|s| s.name == config.flow_metric) {
            Some(spec) if matches!(spec.kind, MetricKind::Float(_)) => spec.path,
            Some(spec) => bail!(
                "Flow metric '{}' must be a float metric, schema has {:?}",
                config.flow_metric,
                spec.kind
            ),
            None => bail!("Flow metric '{}' is not in the schema", config.flow_metric),
        };

        Ok(Self {
            source,
            writer,
            dump,
            measurement: measurement.into(),
            schema,
            flow_metric: config.flow_metric.clone(),
            flow_path,
            liveness_every: config.liveness_every,
        })
    }

    /// Runs one poll cycle at monotonic time `now`.
    ///
    /// The phase detector only observes cycles whose point was written.
    pub async fn run_cycle(
        &self,
        state: &mut CollectorState,
        now: Instant,
    ) -> Result<CycleReport, CycleError> {
        // 1. Fetch raw status tree
        let response = self
            .source
            .fetch_status()
            .await
            .map_err(CycleError::Fetch)?;

        // 2. Flatten; keep malformed payloads for diagnosis
        let tree = match flatten_response(&response) {
            Ok(tree) => tree,
            Err(error) => {
                let dump = match self.dump.write(&response).await {
                    Ok(path) => Some(path),
                    Err(e) => {
                        error!(
                            error = %e,
                            directory = %self.dump.directory().display(),
                            "Failed to dump malformed response"
                        );
                        None
                    }
                };
                return Err(CycleError::Malformed { error, dump });
            }
        };

        // 3. Map onto the metric schema (all or nothing)
        let fields = map_to_metrics(&tree, self.schema).map_err(CycleError::Metrics)?;
        let Some(&FieldValue::Float(flow)) = fields.get(&self.flow_metric) else {
            return Err(CycleError::Metrics(MetricError::Missing {
                metric: self.flow_metric.clone(),
                path: self.flow_path.to_string(),
            }));
        };

        // 4. Write point
        let point = Point::new(self.measurement.clone(), fields);
        self.writer
            .write(&point)
            .await
            .map_err(CycleError::Store)?;

        // 5. Phase detection
        let transition = state.detector.observe(flow, now);
        if let Some(t) = transition {
            info!(
                from = %t.from,
                to = %t.to,
                flow = flow,
                interval_secs = state.detector.interval().as_secs(),
                at = %Local::now(),
                "Phase changed"
            );
        }

        Ok(CycleReport {
            point,
            flow,
            transition,
        })
    }

    /// Runs one cycle, records its outcome, and returns how long to sleep.
    ///
    /// Never fails: every cycle error is logged and the next poll is the retry.
    pub async fn tick(&self, state: &mut CollectorState, now: Instant) -> Duration {
        state.cycles += 1;

        match self.run_cycle(state, now).await {
            Ok(report) => {
                debug!(
                    cycle = state.cycles,
                    fields = report.point.fields.len(),
                    flow = report.flow,
                    phase = %state.detector.phase(),
                    "Cycle complete"
                );
                state.status.last_poll = Some(Utc::now());
                state.status.last_error = None;
                state.status.poll_count += 1;
            }
            Err(e) => {
                warn!(cycle = state.cycles, error = %e, "Poll cycle aborted");
                state.status.last_error = Some(e.to_string());
                state.status.error_count += 1;
            }
        }

        if self.liveness_due(state.cycles) {
            info!(
                at = %Local::now(),
                cycles = state.cycles,
                points = state.status.poll_count,
                errors = state.status.error_count,
                phase = %state.detector.phase(),
                "Collector alive"
            );
        }

        state.detector.interval()
    }

    /// True when cycle number `cycle` (1-based, failed cycles included) should
    /// emit the liveness line. `liveness_every = 0` disables it.
    pub fn liveness_due(&self, cycle: u64) -> bool {
        self.liveness_every > 0 && cycle % u64::from(self.liveness_every) == 0
    }

    /// Polls forever, sleeping the detector's interval between cycles.
    ///
    /// Cycles never overlap. Cancel the future to stop.
    pub async fn run(&self, state: &mut CollectorState) {
        info!(
            measurement = %self.measurement,
            metrics = self.schema.len(),
            flow_metric = %self.flow_metric,
            interval_secs = state.detector.interval().as_secs(),
            "Starting collector loop"
        );

        loop {
            let sleep_for = self.tick(state, Instant::now()).await;
            debug!(sleep_secs = sleep_for.as_secs(), "Sleeping until next poll");
            tokio::time::sleep(sleep_for).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use heatwatch::metrics::HEATER_SCHEMA;
    use heatwatch::PhaseConfig;
    use serde_json::{json, Value};

    fn fixture() -> Value {
        serde_json::from_str(include_str!("../../tests/fixtures/status.json")).unwrap()
    }

    struct StaticSource(Value);

    #[async_trait]
    impl StatusSource for StaticSource {
        async fn fetch_status(&self) -> Result<Value> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl StatusSource for FailingSource {
        async fn fetch_status(&self) -> Result<Value> {
            bail!("connection refused")
        }
    }

    struct NullWriter;

    #[async_trait]
    impl PointWriter for NullWriter {
        async fn write(&self, _: &Point) -> Result<()> {
            Ok(())
        }
    }

    fn make_collector(source: Arc<dyn StatusSource>, config: &CollectorConfig) -> Result<Collector> {
        Collector::new(
            source,
            Arc::new(NullWriter),
            DiagnosticDump::new(std::env::temp_dir()),
            "heater",
            HEATER_SCHEMA,
            config,
        )
    }

    #[test]
    fn test_new_rejects_unknown_flow_metric() {
        let config = CollectorConfig {
            flow_metric: "flow_rate".to_string(),
            ..CollectorConfig::default()
        };
        let result = make_collector(Arc::new(FailingSource), &config);
        assert!(result.is_err());
    }

    #[test]
    fn test_new_rejects_non_float_flow_metric() {
        let config = CollectorConfig {
            flow_metric: "burner_starts".to_string(),
            ..CollectorConfig::default()
        };
        let result = make_collector(Arc::new(FailingSource), &config);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_fetch_failure_is_contained() {
        let collector = make_collector(Arc::new(FailingSource), &CollectorConfig::default()).unwrap();
        let mut state = CollectorState::new(PhaseDetector::new(PhaseConfig::default()));

        let err = collector.run_cycle(&mut state, Instant::now()).await.unwrap_err();
        assert!(matches!(err, CycleError::Fetch(_)));
        assert!(err.to_string().contains("connection refused"));

        let sleep_for = collector.tick(&mut state, Instant::now()).await;
        assert_eq!(sleep_for, Duration::from_secs(120));
        assert_eq!(state.cycles, 1);
        assert_eq!(state.status.error_count, 1);
        assert_eq!(state.status.poll_count, 0);
        assert!(state.status.last_error.is_some());
    }

    #[tokio::test]
    async fn test_metric_failure_is_contained() {
        let source = StaticSource(json!({"entities": []}));
        let collector = make_collector(Arc::new(source), &CollectorConfig::default()).unwrap();
        let mut state = CollectorState::new(PhaseDetector::new(PhaseConfig::default()));

        let err = collector.run_cycle(&mut state, Instant::now()).await.unwrap_err();
        assert!(matches!(err, CycleError::Metrics(MetricError::Missing { .. })));
    }

    /// Ticks `n` times and returns the cycle numbers that were due a liveness line.
    async fn liveness_cycles(collector: &Collector, n: usize) -> Vec<u64> {
        let mut state = CollectorState::new(PhaseDetector::new(PhaseConfig::default()));
        let mut due = Vec::new();
        for _ in 0..n {
            collector.tick(&mut state, Instant::now()).await;
            if collector.liveness_due(state.cycles) {
                due.push(state.cycles);
            }
        }
        due
    }

    #[tokio::test]
    async fn test_liveness_counts_failed_cycles() {
        let config = CollectorConfig {
            liveness_every: 3,
            ..CollectorConfig::default()
        };
        let collector = make_collector(Arc::new(FailingSource), &config).unwrap();

        assert_eq!(liveness_cycles(&collector, 7).await, vec![3, 6]);
    }

    #[tokio::test]
    async fn test_liveness_counts_successful_cycles() {
        let config = CollectorConfig {
            liveness_every: 3,
            ..CollectorConfig::default()
        };
        let collector = make_collector(Arc::new(StaticSource(fixture())), &config).unwrap();

        assert_eq!(liveness_cycles(&collector, 6).await, vec![3, 6]);
    }

    #[tokio::test]
    async fn test_liveness_every_zero_is_disabled() {
        let config = CollectorConfig {
            liveness_every: 0,
            ..CollectorConfig::default()
        };
        let collector = make_collector(Arc::new(FailingSource), &config).unwrap();

        assert!(liveness_cycles(&collector, 3).await.is_empty());
        assert!(!collector.liveness_due(0));
    }

    #[test]
    fn test_default_liveness_is_every_thirty_cycles() {
        let collector = make_collector(Arc::new(FailingSource), &CollectorConfig::default()).unwrap();

        assert!(!collector.liveness_due(29));
        assert!(collector.liveness_due(30));
        assert!(collector.liveness_due(60));
    }

    #[tokio::test]
    async fn test_cycle_uses_configured_flow_metric() {
        let config = CollectorConfig {
            flow_metric: "boiler_temperature".to_string(),
            ..CollectorConfig::default()
        };
        let collector = make_collector(Arc::new(StaticSource(fixture())), &config).unwrap();
        let mut state = CollectorState::new(PhaseDetector::new(PhaseConfig::default()));

        let report = collector.run_cycle(&mut state, Instant::now()).await.unwrap();
        assert_eq!(
            report.point.fields.get("boiler_temperature"),
            Some(&FieldValue::Float(report.flow))
        );
        assert_ne!(
            report.point.fields.get("volumetric_flow"),
            Some(&FieldValue::Float(report.flow))
        );
    }
}
