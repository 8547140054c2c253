//! DefiLlama yields API integration (pool listing + pool history).

use std::collections::HashSet;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::data::PoolYieldSource;
use crate::domain::{PoolHistoryPoint, PoolSelector, TrackedPool};
use crate::error::AppError;

const BASE_URL: &str = "https://yields.llama.fi";
const PROVIDER: &str = "DefiLlama";

#[derive(Debug, Deserialize)]
struct PoolsResponse {
    data: Vec<Pool>,
}

#[derive(Debug, Deserialize)]
struct Pool {
    pool: String,
    chain: Option<String>,
    project: String,
    symbol: String,
    #[serde(rename = "tvlUsd")]
    tvl_usd: Option<f64>,
    apy: Option<f64>,
    #[serde(rename = "apyBase")]
    apy_base: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    data: Vec<ChartPoint>,
}

#[derive(Debug, Deserialize)]
struct ChartPoint {
    timestamp: String, // ISO date string like "2024-01-01T00:00:00.000Z"
    apy: Option<f64>,
    #[serde(rename = "tvlUsd")]
    tvl_usd: Option<f64>,
}

pub struct DefiLlamaClient {
    client: reqwest::Client,
    base_url: String,
}

impl DefiLlamaClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, BASE_URL)
    }

    /// Honors `DEFILLAMA_BASE_URL` when set.
    pub fn from_env(client: reqwest::Client) -> Self {
        match std::env::var("DEFILLAMA_BASE_URL") {
            Ok(url) if !url.trim().is_empty() => Self::with_base_url(client, url.trim()),
            _ => Self::new(client),
        }
    }

    pub fn with_base_url(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, AppError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::upstream(PROVIDER, format!("request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::upstream(
                PROVIDER,
                format!("request failed with status {}", resp.status()),
            ));
        }

        resp.json::<T>()
            .await
            .map_err(|e| AppError::upstream(PROVIDER, format!("failed to parse response: {e}")))
    }
}

#[async_trait]
impl PoolYieldSource for DefiLlamaClient {
    #[tracing::instrument(skip_all, fields(selectors = selectors.len()))]
    async fn list_tracked_pools(&self, selectors: &[PoolSelector]) -> Result<Vec<TrackedPool>, AppError> {
        let url = format!("{}/pools", self.base_url);
        let resp: PoolsResponse = self.get_json(&url).await?;
        tracing::debug!(listed = resp.data.len(), "fetched pool list");

        let mut seen = HashSet::new();
        let mut tracked = Vec::with_capacity(selectors.len());
        for selector in selectors {
            match best_match(&resp.data, selector) {
                Some(pool) if seen.insert(pool.pool.clone()) => tracked.push(TrackedPool {
                    id: pool.pool.clone(),
                    chain: pool.chain.clone().unwrap_or_default(),
                    project: pool.project.clone(),
                    symbol: pool.symbol.clone(),
                    current_apy: pool.apy.unwrap_or(0.0),
                    apy_base: pool.apy_base,
                    tvl_usd: pool.tvl_usd.unwrap_or(0.0),
                }),
                Some(_) => {}
                None => tracing::warn!(
                    project = %selector.project,
                    symbol = %selector.symbol,
                    chain = selector.chain.as_deref().unwrap_or("any"),
                    "no DefiLlama pool matches selector; skipping"
                ),
            }
        }
        Ok(tracked)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_history(&self, pool_id: &str) -> Result<Vec<PoolHistoryPoint>, AppError> {
        let url = format!("{}/chart/{pool_id}", self.base_url);
        let resp: ChartResponse = self.get_json(&url).await?;

        let history: Vec<PoolHistoryPoint> = resp
            .data
            .into_iter()
            .filter_map(|p| {
                let apy = p.apy?;
                Some(PoolHistoryPoint {
                    timestamp: p.timestamp,
                    apy,
                    tvl_usd: p.tvl_usd.unwrap_or(0.0),
                })
            })
            .collect();
        tracing::info!(samples = history.len(), "fetched pool history");
        Ok(history)
    }
}

/// Largest-TVL pool matching the selector (project exact or prefix, symbol exact).
fn best_match<'a>(pools: &'a [Pool], selector: &PoolSelector) -> Option<&'a Pool> {
    let project = selector.project.to_lowercase();
    let symbol = selector.symbol.to_uppercase();

    pools
        .iter()
        .filter(|p| {
            let proj = p.project.to_lowercase();
            let project_match = proj == project || proj.starts_with(&project);
            let symbol_match = p.symbol.to_uppercase() == symbol;
            let chain_match = selector
                .chain
                .as_ref()
                .map(|c| p.chain.as_ref().is_some_and(|pc| pc.eq_ignore_ascii_case(c)))
                .unwrap_or(true);
            project_match && symbol_match && chain_match
        })
        .max_by(|a, b| {
            a.tvl_usd
                .unwrap_or(0.0)
                .partial_cmp(&b.tvl_usd.unwrap_or(0.0))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn pools_body() -> serde_json::Value {
        json!({
            "status": "success",
            "data": [
                { "pool": "aave-eth-usdc", "chain": "Ethereum", "project": "aave-v3", "symbol": "USDC", "tvlUsd": 2.0e9, "apy": 4.1, "apyBase": 4.1 },
                { "pool": "aave-arb-usdc", "chain": "Arbitrum", "project": "aave-v3", "symbol": "USDC", "tvlUsd": 9.0e9, "apy": 5.0 },
                { "pool": "aave-eth-usdc-small", "chain": "Ethereum", "project": "aave-v3", "symbol": "USDC", "tvlUsd": 1.0e6, "apy": 9.0 },
                { "pool": "aave-eth-usdc-weth", "chain": "Ethereum", "project": "aave-v3", "symbol": "USDC-WETH", "tvlUsd": 5.0e9, "apy": 7.0 },
                { "pool": "comp-eth-usdc", "chain": "Ethereum", "project": "compound-v3", "symbol": "USDC", "tvlUsd": 8.0e8, "apy": null }
            ]
        })
    }

    #[tokio::test]
    async fn selectors_resolve_to_largest_matching_pool() {
        let server = MockServer::start_async().await;
        let pools = server
            .mock_async(|when, then| {
                when.method(GET).path("/pools");
                then.status(200).json_body(pools_body());
            })
            .await;

        let client = DefiLlamaClient::with_base_url(reqwest::Client::new(), &server.base_url());
        let selectors = vec![
            PoolSelector::new("aave-v3", "USDC", Some("ethereum")),
            PoolSelector::new("compound-v3", "USDC", Some("Ethereum")),
            PoolSelector::new("morpho-blue", "USDC", None),
        ];
        let tracked = client.list_tracked_pools(&selectors).await.unwrap();

        pools.assert_async().await;
        assert_eq!(tracked.len(), 2);
        assert_eq!(tracked[0].id, "aave-eth-usdc");
        assert_eq!(tracked[0].current_apy, 4.1);
        assert_eq!(tracked[0].apy_base, Some(4.1));
        assert_eq!(tracked[1].apy_base, None);
        assert_eq!(tracked[1].id, "comp-eth-usdc");
        assert_eq!(tracked[1].current_apy, 0.0);
    }

    #[tokio::test]
    async fn history_drops_samples_without_apy() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/chart/aave-eth-usdc");
                then.status(200).json_body(json!({
                    "status": "success",
                    "data": [
                        { "timestamp": "2024-01-01T00:00:00.000Z", "apy": 4.0, "tvlUsd": 1.0e9 },
                        { "timestamp": "2024-01-02T00:00:00.000Z", "apy": null, "tvlUsd": 1.0e9 },
                        { "timestamp": "2024-01-03T00:00:00.000Z", "apy": 4.2 }
                    ]
                }));
            })
            .await;

        let client = DefiLlamaClient::with_base_url(reqwest::Client::new(), &server.base_url());
        let history = client.fetch_history("aave-eth-usdc").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].apy, 4.2);
        assert_eq!(history[1].tvl_usd, 0.0);
    }

    #[tokio::test]
    async fn non_success_status_is_upstream_unavailable() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/chart/missing");
                then.status(502);
            })
            .await;

        let client = DefiLlamaClient::with_base_url(reqwest::Client::new(), &server.base_url());
        let err = client.fetch_history("missing").await.unwrap_err();
        assert!(matches!(err, AppError::UpstreamUnavailable { ref provider, .. } if provider == "DefiLlama"));
    }
}
