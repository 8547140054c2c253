//! HTTP JSON endpoint (`spread serve`).

pub mod error;
pub mod handlers;
pub mod state;
pub mod types;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};

use crate::error::AppError;

pub use state::ApiState;

/// All routes, CORS open.
pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/defi-yields", get(handlers::defi_yields))
        .route("/api/tradfi-rates", get(handlers::tradfi_rates))
        .route("/api/spread", get(handlers::spread))
        .layer(cors)
        .with_state(state)
}

pub async fn serve(host: &str, port: u16, state: ApiState) -> Result<(), AppError> {
    let listener = tokio::net::TcpListener::bind((host, port))
        .await
        .map_err(|e| AppError::Io(format!("Failed to bind {host}:{port}: {e}")))?;

    tracing::info!(%host, port, "serving spread API");
    println!("Listening on http://{host}:{port}");

    axum::serve(listener, router(state))
        .await
        .map_err(|e| AppError::Io(format!("Server error: {e}")))
}
