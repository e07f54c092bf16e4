//! Cart API Handlers
//!
//! The cart is advisory: adding checks live stock but reserves nothing.
//! Checkout re-validates every line.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use shopfloor_core::{CartEntry, CartView};

use crate::auth::UserId;
use crate::error::ApiResult;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/cart", get(list).post(add).delete(clear))
        .route("/api/cart/{id}", put(set_quantity).delete(remove))
}

/// Body of `POST /api/cart`.
#[derive(Debug, Deserialize)]
pub struct AddToCart {
    pub product_id: String,
    /// Defaults to 1
    #[serde(default = "one")]
    pub quantity: i64,
}

fn one() -> i64 {
    1
}

/// Body of `PUT /api/cart/{id}`.
#[derive(Debug, Deserialize)]
pub struct SetQuantity {
    pub quantity: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Cleared {
    pub deleted: u64,
}

/// GET /api/cart - The caller's cart with live stock
async fn list(State(state): State<AppState>, UserId(user): UserId) -> ApiResult<Json<CartView>> {
    let view = state.db.carts().list(&user).await?;
    Ok(Json(view))
}

/// POST /api/cart - Add a product (or more of it)
async fn add(
    State(state): State<AppState>,
    UserId(user): UserId,
    payload: Result<Json<AddToCart>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CartEntry>)> {
    let Json(body) = payload?;
    let entry = state
        .db
        .carts()
        .add_item(&user, &body.product_id, body.quantity)
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// PUT /api/cart/{id} - Overwrite an entry's quantity
async fn set_quantity(
    State(state): State<AppState>,
    UserId(user): UserId,
    Path(id): Path<String>,
    payload: Result<Json<SetQuantity>, JsonRejection>,
) -> ApiResult<Json<CartEntry>> {
    let Json(body) = payload?;
    let entry = state.db.carts().set_quantity(&user, &id, body.quantity).await?;
    Ok(Json(entry))
}

/// DELETE /api/cart/{id} - Remove one entry
async fn remove(
    State(state): State<AppState>,
    UserId(user): UserId,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.carts().remove_item(&user, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/cart - Empty the caller's cart
async fn clear(State(state): State<AppState>, UserId(user): UserId) -> ApiResult<Json<Cleared>> {
    let deleted = state.db.carts().clear(&user).await?;
    Ok(Json(Cleared { deleted }))
}
