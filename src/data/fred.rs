//! FRED API integration for the risk-free benchmarks (Fed Funds, 3M T-Bill).

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::data::RiskFreeRateSource;
use crate::domain::{RateObservation, RiskFreeSeries};
use crate::error::AppError;

const BASE_URL: &str = "https://api.stlouisfed.org/fred";
const PROVIDER: &str = "FRED";

pub struct FredClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl FredClient {
    /// Reads `FRED_API_KEY` (and optional `FRED_BASE_URL`) from the environment / `.env`.
    ///
    /// A missing key is not an error here; it surfaces as
    /// `AppError::Configuration` on the first fetch so that sample runs and
    /// the HTTP server can start without one.
    pub fn from_env(client: reqwest::Client) -> Self {
        dotenvy::dotenv().ok();
        let api_key = std::env::var("FRED_API_KEY").ok().filter(|k| !k.trim().is_empty());
        let base_url = std::env::var("FRED_BASE_URL")
            .ok()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| BASE_URL.to_string());
        Self::new(client, &base_url, api_key)
    }

    pub fn new(client: reqwest::Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl RiskFreeRateSource for FredClient {
    #[tracing::instrument(skip(self), fields(series_id = series.series_id()))]
    async fn fetch_observations(
        &self,
        series: RiskFreeSeries,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RateObservation>, AppError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Configuration("Missing FRED_API_KEY in environment (.env).".into()))?;

        let url = format!("{}/series/observations", self.base_url);
        let start = start.format("%Y-%m-%d").to_string();
        let end = end.format("%Y-%m-%d").to_string();

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("series_id", series.series_id()),
                ("api_key", api_key),
                ("file_type", "json"),
                ("sort_order", "asc"),
                ("observation_start", start.as_str()),
                ("observation_end", end.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::upstream(PROVIDER, format!("request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::upstream(
                PROVIDER,
                format!("request for {} failed with status {}", series.series_id(), resp.status()),
            ));
        }

        let body: ObservationsResponse = resp
            .json()
            .await
            .map_err(|e| AppError::upstream(PROVIDER, format!("failed to parse response: {e}")))?;

        tracing::info!(observations = body.observations.len(), "fetched rate observations");
        Ok(body
            .observations
            .into_iter()
            .map(|obs| RateObservation {
                date: obs.date,
                value: obs.value,
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    observations: Vec<Observation>,
}

#[derive(Debug, Deserialize)]
struct Observation {
    date: String,
    value: String,
}
