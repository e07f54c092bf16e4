//! Receipt and stock history lookups.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use shopfloor_core::{ReceiptDetail, StockMovement};

use crate::error::ApiResult;
use crate::AppState;

/// Default number of movements returned.
const DEFAULT_HISTORY: u32 = 100;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/receipts/{id}", get(get_receipt))
        .route("/api/products/{id}/movements", get(movements))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    limit: Option<u32>,
}

/// GET /api/receipts/{id} - Receipt with the sales still attached to it
async fn get_receipt(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ReceiptDetail>> {
    let detail = state.db.receipts().detail(&id).await?;
    Ok(Json(detail))
}

/// GET /api/products/{id}/movements - Stock history, newest first
async fn movements(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<StockMovement>>> {
    let Query(query) = query?;
    // Unknown products get a 404 rather than an empty history
    state.db.catalog().get_product(&id).await?;
    let history = state
        .db
        .movements()
        .list_for_product(&id, query.limit.unwrap_or(DEFAULT_HISTORY))
        .await?;
    Ok(Json(history))
}
