use axum::Json;
use axum::extract::State;

use crate::api::error::ApiError;
use crate::api::state::ApiState;
use crate::api::types::{DefiYieldsResponse, PoolWithHistory, SpreadResponse, TradfiRatesResponse};
use crate::app::pipeline;
use crate::data;
use crate::domain::RiskFreeSeries;
use crate::window;

/// Tracked pools with their windowed history.
pub async fn defi_yields(State(state): State<ApiState>) -> Result<Json<DefiYieldsResponse>, ApiError> {
    let range = window::date_range(state.config.months_back, state.clock.as_ref());
    let pools = pipeline::fetch_pool_histories(state.pools.as_ref(), &state.config.pools, &range).await?;

    Ok(Json(DefiYieldsResponse {
        success: true,
        data: pools.into_iter().map(PoolWithHistory::from).collect(),
        timestamp: state.clock.now(),
    }))
}

/// Risk-free observations for the window, parsed to numbers.
pub async fn tradfi_rates(State(state): State<ApiState>) -> Result<Json<TradfiRatesResponse>, ApiError> {
    let range = window::date_range(state.config.months_back, state.clock.as_ref());
    let histories = pipeline::fetch_risk_free(state.rates.as_ref(), &range).await?;

    let mut fed_funds = Vec::new();
    let mut tbill = Vec::new();
    for h in histories {
        match h.series {
            RiskFreeSeries::FedFunds => fed_funds = data::observation_points(&h.observations),
            RiskFreeSeries::TBill3M => tbill = data::observation_points(&h.observations),
        }
    }

    Ok(Json(TradfiRatesResponse {
        success: true,
        fed_funds,
        tbill,
        timestamp: state.clock.now(),
    }))
}

/// The reconciled spread series with metrics.
pub async fn spread(State(state): State<ApiState>) -> Result<Json<SpreadResponse>, ApiError> {
    let report = pipeline::run_spread(
        state.pools.as_ref(),
        state.rates.as_ref(),
        state.clock.as_ref(),
        &state.config,
    )
    .await?;

    Ok(Json(SpreadResponse {
        success: true,
        range: report.range,
        data: report.points,
        metrics: report.metrics,
        current: report.current,
        tvl: report.tvl,
        timestamp: report.generated_at,
    }))
}
