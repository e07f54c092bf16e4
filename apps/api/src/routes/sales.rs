//! Sales API Handlers
//!
//! ## Endpoints
//! ```text
//! GET    /api/sales            list (shop_id, product_id, receipt_id, limit, offset)
//! POST   /api/sales            record one standalone sale        → 201
//! GET    /api/sales/{id}       one sale
//! PUT    /api/sales/{id}       correct quantity / price / shop
//! DELETE /api/sales/{id}       reverse: restores stock, returns the removed sale
//! POST   /api/sales/checkout   receipt + N sales in one unit      → 201
//! ```
//!
//! Totals, discount and rest in a checkout are always recomputed server
//! side; anything the client sends besides `customer_paid` and
//! `discount_amount` is ignored.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use shopfloor_core::{CheckoutOutcome, CheckoutRequest, NewSale, Sale, SaleFilter, SaleUpdate};

use crate::auth::MaybeUserId;
use crate::error::ApiResult;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/sales", get(list).post(create))
        .route("/api/sales/checkout", post(checkout))
        .route("/api/sales/{id}", get(get_by_id).put(update).delete(delete))
}

/// GET /api/sales - Filtered, paged listing
async fn list(
    State(state): State<AppState>,
    query: Result<Query<SaleFilter>, QueryRejection>,
) -> ApiResult<Json<Vec<Sale>>> {
    let Query(filter) = query?;
    let sales = state.db.sales().list(&filter).await?;
    Ok(Json(sales))
}

/// POST /api/sales - Record a single sale outside of checkout
async fn create(
    State(state): State<AppState>,
    payload: Result<Json<NewSale>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Sale>)> {
    let Json(new_sale) = payload?;
    let sale = state.db.sales().record_sale(&new_sale).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

/// GET /api/sales/{id}
async fn get_by_id(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Sale>> {
    let sale = state.db.sales().get(&id).await?;
    Ok(Json(sale))
}

/// PUT /api/sales/{id} - Correct a sale, re-deltas stock
async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<SaleUpdate>, JsonRejection>,
) -> ApiResult<Json<Sale>> {
    let Json(changes) = payload?;
    let sale = state.db.sales().correct_sale(&id, &changes).await?;
    Ok(Json(sale))
}

/// DELETE /api/sales/{id} - Reverse a sale, restores its full quantity
async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Sale>> {
    let sale = state.db.sales().reverse_sale(&id).await?;
    Ok(Json(sale))
}

/// POST /api/sales/checkout - Multi-line checkout
///
/// When the caller sends `x-user-id`, their cart is cleared after the
/// checkout commits.
async fn checkout(
    State(state): State<AppState>,
    MaybeUserId(user): MaybeUserId,
    payload: Result<Json<CheckoutRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CheckoutOutcome>)> {
    let Json(request) = payload?;
    let outcome = state.db.checkout().checkout(&request, user.as_deref()).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}
