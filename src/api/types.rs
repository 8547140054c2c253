//! Response bodies (camelCase on the wire).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{
    CurrentRates, DateRange, PoolHistory, PoolHistoryPoint, RawSeriesPoint, ReconciledPoint, SpreadKey,
    SpreadMetrics, TvlRow,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySample {
    pub timestamp: String,
    pub apy: f64,
    pub tvl_usd: f64,
}

impl From<PoolHistoryPoint> for HistorySample {
    fn from(p: PoolHistoryPoint) -> Self {
        Self {
            timestamp: p.timestamp,
            apy: p.apy,
            tvl_usd: p.tvl_usd,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolWithHistory {
    pub pool_id: String,
    pub chain: String,
    pub project: String,
    pub symbol: String,
    pub current_apy: f64,
    pub current_apy_base: Option<f64>,
    pub tvl_usd: f64,
    pub history: Vec<HistorySample>,
}

impl From<PoolHistory> for PoolWithHistory {
    fn from(p: PoolHistory) -> Self {
        Self {
            pool_id: p.pool.id,
            chain: p.pool.chain,
            project: p.pool.project,
            symbol: p.pool.symbol,
            current_apy: p.pool.current_apy,
            current_apy_base: p.pool.apy_base,
            tvl_usd: p.pool.tvl_usd,
            history: p.history.into_iter().map(HistorySample::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DefiYieldsResponse {
    pub success: bool,
    pub data: Vec<PoolWithHistory>,
    pub timestamp: DateTime<Utc>,
}

/// Benchmark series as dated numeric points; FRED's `"."` rows are omitted.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradfiRatesResponse {
    pub success: bool,
    pub fed_funds: Vec<RawSeriesPoint>,
    pub tbill: Vec<RawSeriesPoint>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct SpreadResponse {
    pub success: bool,
    pub range: DateRange,
    pub data: Vec<ReconciledPoint>,
    pub metrics: BTreeMap<SpreadKey, SpreadMetrics>,
    pub current: CurrentRates,
    pub tvl: Vec<TvlRow>,
    pub timestamp: DateTime<Utc>,
}
