use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the database is reachable.
    pub db_healthy: bool,
    /// Whether the session token store is reachable.
    pub store_healthy: bool,
}

/// GET /health -- returns service, database and token-store health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let (db, store_healthy) = tokio::join!(
        tokio::time::timeout(
            state.config.call_timeout(),
            mercuria_db::health_check(&state.pool),
        ),
        state.sessions.store_healthy(),
    );
    let db_healthy = matches!(db, Ok(Ok(())));

    let status = if db_healthy && store_healthy {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        store_healthy,
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
