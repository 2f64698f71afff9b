// Attribute tree built from entity properties
pub mod attribute;

// Entity flattening (device status tree -> attribute tree)
pub mod entity;

// Metric schema and mapping
pub mod metrics;

// Time-series point and line protocol encoding
pub mod point;

// Operating phase detection
pub mod phase;

// Configuration
pub mod config;

pub use attribute::{Attribute, AttributeTree};
pub use entity::{flatten, flatten_response, Entity, FlattenError};
pub use metrics::{map_to_metrics, MetricError, MetricKind, MetricSpec};
pub use phase::{Phase, PhaseConfig, PhaseDetector, Transition};
pub use point::{FieldSet, FieldValue, Point};
