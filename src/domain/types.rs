//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed between collaborators and the reconciliation engine
//! - exported to JSON/CSV or served over HTTP
//! - reloaded later for printing a saved report

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Default history window, in calendar months.
pub const DEFAULT_MONTHS_BACK: u32 = 18;

/// One observation from a single named series, already adapted to a date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawSeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl RawSeriesPoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// TradFi risk-free benchmarks tracked from FRED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskFreeSeries {
    #[serde(rename = "fed_funds")]
    FedFunds,
    #[serde(rename = "tbill_3m")]
    TBill3M,
}

impl RiskFreeSeries {
    pub const ALL: [RiskFreeSeries; 2] = [RiskFreeSeries::FedFunds, RiskFreeSeries::TBill3M];

    /// FRED series identifier.
    pub fn series_id(self) -> &'static str {
        match self {
            RiskFreeSeries::FedFunds => "DFF",
            RiskFreeSeries::TBill3M => "DTB3",
        }
    }

    /// Stable machine name (also the `SeriesKey` string form).
    pub fn slug(self) -> &'static str {
        match self {
            RiskFreeSeries::FedFunds => "fed_funds",
            RiskFreeSeries::TBill3M => "tbill_3m",
        }
    }

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            RiskFreeSeries::FedFunds => "Fed Funds Rate",
            RiskFreeSeries::TBill3M => "3-Month T-Bill",
        }
    }
}

/// Identifies one tracked quantity in the reconciled output.
///
/// Pools form an open set (any number may be tracked, keyed by
/// `project/SYMBOL@chain`); risk-free series are fixed. Serialized as a
/// plain string so it can key JSON objects: `pool:aave-v3/USDC@ethereum`,
/// `fed_funds`, `tbill_3m`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SeriesKey {
    Pool(String),
    RiskFree(RiskFreeSeries),
}

impl SeriesKey {
    /// Key for one pool. The chain keeps same-asset markets on different
    /// chains apart; an empty chain is left out of the label.
    pub fn pool(project: &str, symbol: &str, chain: &str) -> Self {
        let mut label = format!("{}/{}", project.to_lowercase(), symbol.to_uppercase());
        let chain = chain.trim();
        if !chain.is_empty() {
            label.push('@');
            label.push_str(&chain.to_lowercase());
        }
        SeriesKey::Pool(label)
    }

    /// Whether this key is a candidate for the representative DeFi rate.
    pub fn is_defi(&self) -> bool {
        matches!(self, SeriesKey::Pool(_))
    }

    /// Short label for table headers.
    pub fn label(&self) -> &str {
        match self {
            SeriesKey::Pool(label) => label,
            SeriesKey::RiskFree(series) => series.slug(),
        }
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesKey::Pool(label) => write!(f, "pool:{label}"),
            SeriesKey::RiskFree(series) => f.write_str(series.slug()),
        }
    }
}

impl FromStr for SeriesKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(label) = s.strip_prefix("pool:") {
            if label.is_empty() {
                return Err("empty pool label".to_string());
            }
            return Ok(SeriesKey::Pool(label.to_string()));
        }
        RiskFreeSeries::ALL
            .into_iter()
            .find(|series| series.slug() == s)
            .map(SeriesKey::RiskFree)
            .ok_or_else(|| format!("unknown series key '{s}'"))
    }
}

impl Serialize for SeriesKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SeriesKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A derived spread: representative DeFi rate minus one risk-free benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SpreadKey {
    #[serde(rename = "vs_fed_funds")]
    VsFedFunds,
    #[serde(rename = "vs_tbill")]
    VsTBill,
}

impl SpreadKey {
    pub const ALL: [SpreadKey; 2] = [SpreadKey::VsFedFunds, SpreadKey::VsTBill];

    /// The risk-free series this spread is measured against.
    pub fn benchmark(self) -> RiskFreeSeries {
        match self {
            SpreadKey::VsFedFunds => RiskFreeSeries::FedFunds,
            SpreadKey::VsTBill => RiskFreeSeries::TBill3M,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            SpreadKey::VsFedFunds => "Spread vs Fed Funds",
            SpreadKey::VsTBill => "Spread vs T-Bill",
        }
    }
}

/// Raw inputs to reconciliation, one sequence per tracked series.
pub type SeriesInputs = BTreeMap<SeriesKey, Vec<RawSeriesPoint>>;

/// One row of the unified output.
///
/// Every input series has a value on every row; rows are strictly
/// increasing by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledPoint {
    pub date: NaiveDate,
    pub values: BTreeMap<SeriesKey, f64>,
    pub derived_spreads: BTreeMap<SpreadKey, f64>,
}

impl ReconciledPoint {
    pub fn value(&self, key: &SeriesKey) -> Option<f64> {
        self.values.get(key).copied()
    }

    pub fn spread(&self, key: SpreadKey) -> Option<f64> {
        self.derived_spreads.get(&key).copied()
    }
}

/// A spread extreme and the date it was first observed.
///
/// `date` is `None` only for the empty-input sentinel and serializes as `""`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Extremum {
    pub value: f64,
    #[serde(with = "optional_date")]
    pub date: Option<NaiveDate>,
}

/// Summary of one spread over a reconciled sequence.
///
/// `Default` is the zero-value sentinel returned for empty input.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SpreadMetrics {
    pub current: f64,
    pub average: f64,
    pub max: Extremum,
    pub min: Extremum,
}

mod optional_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => serializer.collect_str(d),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw.is_empty() {
            return Ok(None);
        }
        NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom)
    }
}

/// Inclusive calendar window of requested history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// `YYYY-MM-DD` form of `start`, as sent to collaborators.
    pub fn start_date(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    /// `YYYY-MM-DD` form of `end`.
    pub fn end_date(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}

/// Which DeFi pool to track: project slug, asset symbol and optional chain.
///
/// Parsed from `project:SYMBOL[:chain]` on the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSelector {
    pub project: String,
    pub symbol: String,
    pub chain: Option<String>,
}

impl PoolSelector {
    pub fn new(project: &str, symbol: &str, chain: Option<&str>) -> Self {
        Self {
            project: project.to_string(),
            symbol: symbol.to_string(),
            chain: chain.map(str::to_string),
        }
    }

    /// Aave V3 USDC/USDT and Compound V3 USDC on Ethereum.
    pub fn defaults() -> Vec<PoolSelector> {
        vec![
            PoolSelector::new("aave-v3", "USDC", Some("Ethereum")),
            PoolSelector::new("aave-v3", "USDT", Some("Ethereum")),
            PoolSelector::new("compound-v3", "USDC", Some("Ethereum")),
        ]
    }
}

impl FromStr for PoolSelector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').map(str::trim).collect();
        match parts.as_slice() {
            [project, symbol] if !project.is_empty() && !symbol.is_empty() => {
                Ok(PoolSelector::new(project, symbol, None))
            }
            [project, symbol, chain] if !project.is_empty() && !symbol.is_empty() && !chain.is_empty() => {
                Ok(PoolSelector::new(project, symbol, Some(chain)))
            }
            _ => Err(format!("expected project:SYMBOL[:chain], got '{s}'")),
        }
    }
}

/// A pool as listed by the yield source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedPool {
    pub id: String,
    pub chain: String,
    pub project: String,
    pub symbol: String,
    pub current_apy: f64,
    /// Base (non-reward) APY, when the source reports it.
    #[serde(default)]
    pub apy_base: Option<f64>,
    pub tvl_usd: f64,
}

impl TrackedPool {
    pub fn series_key(&self) -> SeriesKey {
        SeriesKey::pool(&self.project, &self.symbol, &self.chain)
    }
}

/// One sample of a pool's history, as delivered by the yield source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolHistoryPoint {
    /// ISO-8601 timestamp, e.g. `2024-01-01T00:00:00.000Z`.
    pub timestamp: String,
    pub apy: f64,
    pub tvl_usd: f64,
}

/// One observation as delivered by the rate source (value is string-encoded).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateObservation {
    pub date: String,
    pub value: String,
}

/// A tracked pool together with its (windowed) history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolHistory {
    pub pool: TrackedPool,
    pub history: Vec<PoolHistoryPoint>,
}

/// A risk-free series together with its observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFreeHistory {
    pub series: RiskFreeSeries,
    pub observations: Vec<RateObservation>,
}

/// One aligned row of per-pool TVL (USD).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TvlRow {
    pub date: NaiveDate,
    pub values: BTreeMap<SeriesKey, f64>,
}

/// Latest APY for one tracked pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolRate {
    pub key: SeriesKey,
    pub project: String,
    pub symbol: String,
    pub apy: f64,
}

/// Point-in-time snapshot of every tracked rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentRates {
    pub defi: Vec<PoolRate>,
    pub fed_funds: f64,
    pub tbill: f64,
    pub last_updated: DateTime<Utc>,
}

/// Everything a single spread run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadReport {
    pub range: DateRange,
    pub generated_at: DateTime<Utc>,
    pub points: Vec<ReconciledPoint>,
    pub metrics: BTreeMap<SpreadKey, SpreadMetrics>,
    pub tvl: Vec<TvlRow>,
    pub current: CurrentRates,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct SpreadConfig {
    pub months_back: u32,
    pub pools: Vec<PoolSelector>,
    /// Use deterministic offline sources seeded with this value.
    pub sample_seed: Option<u64>,
    /// Number of most recent reconciled rows to print.
    pub tail: usize,
    pub export_series: Option<PathBuf>,
    pub export_report: Option<PathBuf>,
}

impl Default for SpreadConfig {
    fn default() -> Self {
        Self {
            months_back: DEFAULT_MONTHS_BACK,
            pools: PoolSelector::defaults(),
            sample_seed: None,
            tail: 10,
            export_series: None,
            export_report: None,
        }
    }
}
