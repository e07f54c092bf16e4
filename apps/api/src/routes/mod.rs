//! HTTP routes.
//!
//! Each submodule owns one resource and exposes a `router()` that is merged
//! here. Handlers stay thin: extract, call one `shopfloor-db` operation,
//! serialize.

pub mod cart;
pub mod receipts;
pub mod sales;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::AppState;

/// All routes, without layers or state.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .merge(cart::router())
        .merge(sales::router())
        .merge(receipts::router())
}

/// GET /health - Liveness plus a `SELECT 1` against the store
async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    if state.db.health_check().await {
        (StatusCode::OK, Json(json!({ "status": "ok" })))
    } else {
        tracing::error!("Health check failed: database unreachable");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unavailable" })),
        )
    }
}
