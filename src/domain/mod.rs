//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - series identity (`SeriesKey`, `RiskFreeSeries`, `SpreadKey`)
//! - raw and reconciled observations (`RawSeriesPoint`, `ReconciledPoint`)
//! - collaborator payloads (`TrackedPool`, `PoolHistoryPoint`, `RateObservation`)
//! - run outputs (`SpreadMetrics`, `CurrentRates`, `SpreadReport`)

pub mod types;

pub use types::*;
