//! Reporting utilities: spread metrics, current-rate snapshots, and
//! formatted terminal output.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::domain::{
    CurrentRates, Extremum, PoolRate, ReconciledPoint, RiskFreeSeries, SeriesKey, SpreadKey,
    SpreadMetrics, TrackedPool,
};

pub mod format;

pub use format::*;

/// Summarize one spread over a date-ascending reconciled sequence.
///
/// Empty input returns the zero sentinel. Extremes keep the earliest date
/// on ties (strict comparison while scanning forward).
pub fn compute_metrics(points: &[ReconciledPoint], spread_key: SpreadKey) -> SpreadMetrics {
    let spread_of = |p: &ReconciledPoint| p.spread(spread_key).unwrap_or(0.0);

    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return SpreadMetrics::default();
    };

    let mut max = Extremum {
        value: spread_of(first),
        date: Some(first.date),
    };
    let mut min = max;
    let mut sum = 0.0;

    for p in points {
        let value = spread_of(p);
        sum += value;
        if value > max.value {
            max = Extremum { value, date: Some(p.date) };
        }
        if value < min.value {
            min = Extremum { value, date: Some(p.date) };
        }
    }

    SpreadMetrics {
        current: spread_of(last),
        average: sum / points.len() as f64,
        max,
        min,
    }
}

/// Metrics for every spread definition.
pub fn compute_all_metrics(points: &[ReconciledPoint]) -> BTreeMap<SpreadKey, SpreadMetrics> {
    SpreadKey::ALL
        .into_iter()
        .map(|key| (key, compute_metrics(points, key)))
        .collect()
}

/// Current DeFi APYs from the pool listing, TradFi rates from the latest
/// reconciled row (0 when there is no row yet).
pub fn current_rates(
    pools: &[TrackedPool],
    points: &[ReconciledPoint],
    now: DateTime<Utc>,
) -> CurrentRates {
    let latest = |series: RiskFreeSeries| {
        points
            .last()
            .and_then(|p| p.value(&SeriesKey::RiskFree(series)))
            .unwrap_or(0.0)
    };

    CurrentRates {
        defi: pools
            .iter()
            .map(|pool| PoolRate {
                key: pool.series_key(),
                project: pool.project.clone(),
                symbol: pool.symbol.clone(),
                apy: pool.current_apy,
            })
            .collect(),
        fed_funds: latest(RiskFreeSeries::FedFunds),
        tbill: latest(RiskFreeSeries::TBill3M),
        last_updated: now,
    }
}
