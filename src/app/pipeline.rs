//! Shared spread pipeline used by the CLI and the HTTP endpoint.
//!
//! fetch (pools + histories, risk-free series; concurrently) -> window ->
//! adapt to raw points -> reconcile -> metrics -> report
//!
//! Fetching is all-or-nothing: the first collaborator failure aborts the
//! whole run and no partial report is produced.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use futures::future::try_join_all;

use crate::data::{self, PoolYieldSource, RiskFreeRateSource};
use crate::domain::{
    CurrentRates, DateRange, PoolHistory, PoolSelector, RiskFreeHistory, RiskFreeSeries, SeriesInputs,
    SeriesKey, SpreadConfig, SpreadReport, TrackedPool,
};
use crate::error::AppError;
use crate::window::{self, Clock};

/// Resolve selectors to tracked pools, one per series key.
///
/// Each pool becomes its own series, so a second pool landing on an
/// already-tracked `project/SYMBOL@chain` key is dropped.
pub async fn resolve_pools(
    source: &dyn PoolYieldSource,
    selectors: &[PoolSelector],
) -> Result<Vec<TrackedPool>, AppError> {
    let listed = source.list_tracked_pools(selectors).await?;

    let mut seen = HashSet::new();
    let pools: Vec<TrackedPool> = listed
        .into_iter()
        .filter(|pool| {
            let fresh = seen.insert(pool.series_key());
            if !fresh {
                tracing::warn!(pool_id = %pool.id, key = %pool.series_key(), "pool key already tracked; skipping");
            }
            fresh
        })
        .collect();

    tracing::info!(tracked = pools.len(), "resolved pool selectors");
    Ok(pools)
}

/// Resolve selectors, then fetch every tracked pool's history in parallel.
///
/// Histories are trimmed to the window.
pub async fn fetch_pool_histories(
    source: &dyn PoolYieldSource,
    selectors: &[PoolSelector],
    range: &DateRange,
) -> Result<Vec<PoolHistory>, AppError> {
    let pools = resolve_pools(source, selectors).await?;

    let histories = try_join_all(pools.into_iter().map(|pool| async move {
        let history = source.fetch_history(&pool.id).await?;
        let mut out = PoolHistory { pool, history };
        window::retain_pool_window(&mut out, range);
        Ok::<_, AppError>(out)
    }))
    .await?;

    Ok(histories)
}

/// Fetch every risk-free series for the window, in parallel.
pub async fn fetch_risk_free(
    source: &dyn RiskFreeRateSource,
    range: &DateRange,
) -> Result<Vec<RiskFreeHistory>, AppError> {
    try_join_all(RiskFreeSeries::ALL.into_iter().map(|series| async move {
        let observations = source.fetch_observations(series, range.start, range.end).await?;
        Ok::<_, AppError>(RiskFreeHistory { series, observations })
    }))
    .await
}

/// Fetch pools and rates concurrently.
pub async fn collect(
    pool_source: &dyn PoolYieldSource,
    rate_source: &dyn RiskFreeRateSource,
    selectors: &[PoolSelector],
    range: &DateRange,
) -> Result<(Vec<PoolHistory>, Vec<RiskFreeHistory>), AppError> {
    futures::try_join!(
        fetch_pool_histories(pool_source, selectors, range),
        fetch_risk_free(rate_source, range),
    )
}

/// Current pool APYs and the latest benchmarks, without pool histories.
///
/// Pool listing and risk-free fetches run concurrently; either failing
/// fails the call.
pub async fn fetch_current_rates(
    pool_source: &dyn PoolYieldSource,
    rate_source: &dyn RiskFreeRateSource,
    clock: &dyn Clock,
    config: &SpreadConfig,
) -> Result<CurrentRates, AppError> {
    let range = window::date_range(config.months_back, clock);
    let (pools, rates) = futures::try_join!(
        resolve_pools(pool_source, &config.pools),
        fetch_risk_free(rate_source, &range),
    )?;

    let inputs = build_inputs(&[], &rates, &range);
    let points = crate::reconcile::reconcile(&inputs.rates);
    Ok(crate::report::current_rates(&pools, &points, clock.now()))
}

/// Reconciliation inputs built from fetched payloads.
#[derive(Debug, Clone, Default)]
pub struct Inputs {
    /// Pool APYs and risk-free rates.
    pub rates: SeriesInputs,
    /// Pool TVL (USD).
    pub tvl: SeriesInputs,
}

/// Adapt payloads into keyed raw series, windowed to `range`.
///
/// Every tracked pool and every fetched risk-free series gets a key even if
/// it ends up with no points, so it still appears (as 0.0) on every row.
/// Pools are expected to carry distinct keys (see `resolve_pools`).
pub fn build_inputs(pools: &[PoolHistory], rates: &[RiskFreeHistory], range: &DateRange) -> Inputs {
    let mut inputs = Inputs::default();

    for p in pools {
        let key = p.pool.series_key();
        inputs
            .rates
            .entry(key.clone())
            .or_default()
            .extend(data::apy_points(&p.history));
        inputs.tvl.entry(key).or_default().extend(data::tvl_points(&p.history));
    }
    for r in rates {
        inputs
            .rates
            .entry(SeriesKey::RiskFree(r.series))
            .or_default()
            .extend(data::observation_points(&r.observations));
    }

    window::retain_window(&mut inputs.rates, range);
    window::retain_window(&mut inputs.tvl, range);
    inputs
}

/// Pure assembly of a report from already-fetched payloads.
pub fn build_report(
    pools: &[PoolHistory],
    rates: &[RiskFreeHistory],
    range: DateRange,
    now: DateTime<Utc>,
) -> SpreadReport {
    let inputs = build_inputs(pools, rates, &range);
    let points = crate::reconcile::reconcile(&inputs.rates);
    let tvl = crate::reconcile::align_tvl(&inputs.tvl);
    let metrics: BTreeMap<_, _> = crate::report::compute_all_metrics(&points);

    let tracked: Vec<_> = pools.iter().map(|p| p.pool.clone()).collect();
    let current = crate::report::current_rates(&tracked, &points, now);

    SpreadReport {
        range,
        generated_at: now,
        points,
        metrics,
        tvl,
        current,
    }
}

/// Execute the full spread pipeline.
pub async fn run_spread(
    pool_source: &dyn PoolYieldSource,
    rate_source: &dyn RiskFreeRateSource,
    clock: &dyn Clock,
    config: &SpreadConfig,
) -> Result<SpreadReport, AppError> {
    let range = window::date_range(config.months_back, clock);
    tracing::info!(start = %range.start, end = %range.end, "fetching spread inputs");

    let (pools, rates) = collect(pool_source, rate_source, &config.pools, &range).await?;
    let report = build_report(&pools, &rates, range, clock.now());

    tracing::info!(rows = report.points.len(), "reconciled spread series");
    Ok(report)
}
