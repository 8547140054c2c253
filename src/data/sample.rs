//! Deterministic synthetic collaborators for offline runs and tests.
//!
//! Pool APYs follow a mean-reverting random walk around a per-pool base
//! level, with roughly one day in ten missing. Fed Funds is published every
//! calendar day; the T-Bill only on weekdays, with occasional `"."`
//! placeholders the way FRED reports holidays.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::StandardNormal;

use crate::data::{PoolYieldSource, RiskFreeRateSource};
use crate::domain::{PoolHistoryPoint, PoolSelector, RateObservation, RiskFreeSeries, TrackedPool};
use crate::error::AppError;

/// Probability that a pool skips a day.
const POOL_GAP_PROB: f64 = 0.1;
/// Probability that a T-Bill business day is a holiday placeholder.
const HOLIDAY_PROB: f64 = 0.03;
/// Daily pull of a pool APY back toward its base level.
const MEAN_REVERSION: f64 = 0.1;
const APY_DAILY_VOL: f64 = 0.15;

#[derive(Debug, Clone)]
pub struct SampleSource {
    seed: u64,
    end: NaiveDate,
    days: u32,
}

impl SampleSource {
    /// Generate `days` of history ending at `end`.
    pub fn new(seed: u64, end: NaiveDate, days: u32) -> Self {
        Self { seed, end, days }
    }

    fn first_day(&self) -> NaiveDate {
        self.end - Duration::days(i64::from(self.days))
    }

    fn rng_for(&self, label: &str) -> StdRng {
        StdRng::seed_from_u64(sample_seed(self.seed, label))
    }

    fn pool_history(&self, pool_id: &str) -> Vec<PoolHistoryPoint> {
        let mut rng = self.rng_for(pool_id);
        let base_apy = 3.0 + rng.gen_range(0.0..4.0);
        let base_tvl = rng.gen_range(5.0e8..3.0e9);

        let mut apy = base_apy;
        let mut tvl = base_tvl;
        let mut out = Vec::with_capacity(self.days as usize + 1);

        for date in self.first_day().iter_days().take_while(|d| *d <= self.end) {
            let z: f64 = rng.sample(StandardNormal);
            apy = (apy + MEAN_REVERSION * (base_apy - apy) + APY_DAILY_VOL * z).max(0.0);
            let z_tvl: f64 = rng.sample(StandardNormal);
            tvl = (tvl * (0.01 * z_tvl).exp()).max(0.0);

            if rng.gen_bool(POOL_GAP_PROB) {
                continue;
            }
            out.push(PoolHistoryPoint {
                timestamp: format!("{}T00:00:00.000Z", date.format("%Y-%m-%d")),
                apy,
                tvl_usd: tvl,
            });
        }
        out
    }

    fn rate_observations(&self, series: RiskFreeSeries) -> Vec<RateObservation> {
        let mut rng = self.rng_for(series.series_id());
        let (mut level, weekdays_only): (f64, bool) = match series {
            RiskFreeSeries::FedFunds => (5.33, false),
            RiskFreeSeries::TBill3M => (5.25, true),
        };

        let mut out = Vec::new();
        for date in self.first_day().iter_days().take_while(|d| *d <= self.end) {
            // Occasional 25bp policy cut.
            if date.day() == 1 && rng.gen_bool(0.2) {
                level = (level - 0.25).max(0.0);
            }
            let is_weekend = matches!(date.weekday(), Weekday::Sat | Weekday::Sun);
            if weekdays_only && is_weekend {
                continue;
            }

            let value = if weekdays_only && rng.gen_bool(HOLIDAY_PROB) {
                ".".to_string()
            } else {
                let z: f64 = rng.sample(StandardNormal);
                format!("{:.2}", (level + 0.01 * z).max(0.0))
            };
            out.push(RateObservation {
                date: date.format("%Y-%m-%d").to_string(),
                value,
            });
        }
        out
    }
}

#[async_trait]
impl PoolYieldSource for SampleSource {
    async fn list_tracked_pools(&self, selectors: &[PoolSelector]) -> Result<Vec<TrackedPool>, AppError> {
        Ok(selectors
            .iter()
            .map(|selector| {
                let id = sample_pool_id(selector);
                let last = self.pool_history(&id).pop();
                TrackedPool {
                    chain: selector.chain.clone().unwrap_or_else(|| "Ethereum".to_string()),
                    project: selector.project.clone(),
                    symbol: selector.symbol.clone(),
                    current_apy: last.as_ref().map(|p| p.apy).unwrap_or(0.0),
                    // Synthetic pools pay no reward tokens.
                    apy_base: last.as_ref().map(|p| p.apy),
                    tvl_usd: last.as_ref().map(|p| p.tvl_usd).unwrap_or(0.0),
                    id,
                }
            })
            .collect())
    }

    async fn fetch_history(&self, pool_id: &str) -> Result<Vec<PoolHistoryPoint>, AppError> {
        Ok(self.pool_history(pool_id))
    }
}

#[async_trait]
impl RiskFreeRateSource for SampleSource {
    async fn fetch_observations(
        &self,
        series: RiskFreeSeries,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RateObservation>, AppError> {
        // Generate the full path, then window it, so results do not depend on the request range.
        Ok(self
            .rate_observations(series)
            .into_iter()
            .filter(|obs| {
                NaiveDate::parse_from_str(&obs.date, "%Y-%m-%d")
                    .map(|d| d >= start && d <= end)
                    .unwrap_or(false)
            })
            .collect())
    }
}

fn sample_pool_id(selector: &PoolSelector) -> String {
    format!(
        "sample-{}-{}-{}",
        selector.project,
        selector.symbol,
        selector.chain.as_deref().unwrap_or("any")
    )
    .to_lowercase()
}

fn sample_seed(seed: u64, label: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    label.hash(&mut hasher);
    hasher.finish()
}
