//! # Stock Movement Log
//!
//! Append-only record of every change to `products.quantity`.
//!
//! ## Outbox-Style Writes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UnitOfWork                                                             │
//! │  ┌───────────────────────────────────────────────────────────────────┐ │
//! │  │ UPDATE products SET quantity = quantity - 3 ...                   │ │
//! │  │ INSERT INTO stock_movements (delta = -3, reason = sale_created)   │ │
//! │  └───────────────────────────────────────────────────────────────────┘ │
//! │  COMMIT → both rows exist      ROLLBACK → neither does                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rows are never updated or deleted.

use chrono::Utc;
use shopfloor_core::{MovementReason, StockMovement};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;

/// Maximum rows returned by one history query.
pub const MAX_HISTORY: u32 = 500;

/// Repository for reading the movement log.
#[derive(Debug, Clone)]
pub struct MovementRepository {
    pool: SqlitePool,
}

impl MovementRepository {
    /// Creates a new MovementRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MovementRepository { pool }
    }

    /// Returns a product's movements, newest first.
    pub async fn list_for_product(&self, product_id: &str, limit: u32) -> DbResult<Vec<StockMovement>> {
        let limit = limit.clamp(1, MAX_HISTORY);
        debug!(product_id = %product_id, limit, "Listing stock movements");

        let movements = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT id, product_id, sale_id, delta, reason, quantity_after, created_at
            FROM stock_movements
            WHERE product_id = ?1
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?2
            "#,
        )
        .bind(product_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }
}

/// Appends one movement on the unit's connection.
pub(crate) async fn append(
    conn: &mut SqliteConnection,
    product_id: &str,
    sale_id: Option<&str>,
    delta: i64,
    reason: MovementReason,
    quantity_after: i64,
) -> DbResult<()> {
    debug!(
        product_id = %product_id,
        sale_id = ?sale_id,
        delta,
        reason = ?reason,
        quantity_after,
        "Appending stock movement"
    );

    sqlx::query(
        r#"
        INSERT INTO stock_movements (id, product_id, sale_id, delta, reason, quantity_after, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(product_id)
    .bind(sale_id)
    .bind(delta)
    .bind(reason)
    .bind(quantity_after)
    .bind(Utc::now())
    .execute(conn)
    .await?;

    Ok(())
}
