//! Data collaborators and the adapters that turn their payloads into
//! `RawSeriesPoint`s.
//!
//! - `defillama`: DeFi pool list + pool history (HTTP)
//! - `fred`: risk-free observations (HTTP)
//! - `sample`: deterministic offline stand-ins for both
//!
//! Validation happens here, at the adapter boundary: samples with an
//! unparseable date or value are dropped before reconciliation.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{
    PoolHistoryPoint, PoolSelector, RateObservation, RawSeriesPoint, RiskFreeSeries, TrackedPool,
};
use crate::error::AppError;

pub mod defillama;
pub mod fred;
pub mod sample;

pub use defillama::DefiLlamaClient;
pub use fred::FredClient;
pub use sample::SampleSource;

/// Supplies DeFi pool listings and per-pool yield history.
#[async_trait]
pub trait PoolYieldSource: Send + Sync {
    /// Resolve each selector to one listed pool. Selectors with no match are skipped.
    async fn list_tracked_pools(&self, selectors: &[PoolSelector]) -> Result<Vec<TrackedPool>, AppError>;

    /// Full history for one pool, in provider order.
    async fn fetch_history(&self, pool_id: &str) -> Result<Vec<PoolHistoryPoint>, AppError>;
}

/// Supplies daily risk-free rate observations.
#[async_trait]
pub trait RiskFreeRateSource: Send + Sync {
    async fn fetch_observations(
        &self,
        series: RiskFreeSeries,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RateObservation>, AppError>;
}

/// Date component of an ISO-8601 timestamp (`2024-01-01T00:00:00.000Z` -> 2024-01-01).
pub fn timestamp_date(ts: &str) -> Option<NaiveDate> {
    let day = ts.split('T').next()?.trim();
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Parse a string-encoded rate; FRED uses `"."` for "no observation".
pub fn parse_value(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed == "." || trimmed.is_empty() {
        return None;
    }
    let v = trimmed.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

/// Pool APY samples as raw points.
pub fn apy_points(history: &[PoolHistoryPoint]) -> Vec<RawSeriesPoint> {
    pool_points(history, |p| p.apy)
}

/// Pool TVL samples as raw points.
pub fn tvl_points(history: &[PoolHistoryPoint]) -> Vec<RawSeriesPoint> {
    pool_points(history, |p| p.tvl_usd)
}

fn pool_points(history: &[PoolHistoryPoint], field: impl Fn(&PoolHistoryPoint) -> f64) -> Vec<RawSeriesPoint> {
    history
        .iter()
        .filter_map(|p| {
            let Some(date) = timestamp_date(&p.timestamp) else {
                tracing::debug!(timestamp = %p.timestamp, "dropping pool sample with unparseable timestamp");
                return None;
            };
            let value = field(p);
            value.is_finite().then(|| RawSeriesPoint::new(date, value))
        })
        .collect()
}

/// Rate observations as raw points, skipping placeholders and bad rows.
pub fn observation_points(observations: &[RateObservation]) -> Vec<RawSeriesPoint> {
    observations
        .iter()
        .filter_map(|obs| {
            let date = NaiveDate::parse_from_str(obs.date.trim(), "%Y-%m-%d").ok();
            let value = parse_value(&obs.value);
            match (date, value) {
                (Some(date), Some(value)) => Some(RawSeriesPoint::new(date, value)),
                _ => {
                    tracing::debug!(date = %obs.date, value = %obs.value, "dropping rate observation");
                    None
                }
            }
        })
        .collect()
}
