//! Heatwatch collector - polls the heating appliance and stores telemetry.
//!
//! # Architecture
//!
//! ```text
//! Device status API (entity tree)
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │       StatusSource (implements trait)    │
//! │  - DeviceClient: HTTP GET, bearer token  │
//! │  - ReplaySource: captured response file  │
//! └─────────────────────────────────────────┘
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │       Collector                          │
//! │  - Flatten entities (dump if malformed)  │
//! │  - Map to the heater metric schema       │
//! │  - Write point                           │
//! │  - Detect phase, pick next interval      │
//! └─────────────────────────────────────────┘
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │       PointWriter (implements trait)     │
//! │  - InfluxWriter: line protocol over HTTP │
//! └─────────────────────────────────────────┘
//! ```
//!
//! Cycles run strictly one after another; a failed cycle is logged and the
//! next poll is the retry.

pub mod dump;
pub mod influx;
pub mod runner;
pub mod source;

pub use dump::DiagnosticDump;
pub use influx::{InfluxWriter, PointWriter};
pub use runner::{Collector, CollectorState, CollectorStatus, CycleError, CycleReport};
pub use source::{DeviceClient, ReplaySource, StatusSource};
