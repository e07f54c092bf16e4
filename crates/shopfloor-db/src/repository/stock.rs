//! # Stock Ledger
//!
//! The only writer of `products.quantity`.
//!
//! ## Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Stock Ledger                                   │
//! │                                                                         │
//! │  reserve_and_decrement(p, 3)   quantity 5 → 2                          │
//! │       └── quantity < 3? ───────────────────► InsufficientStock         │
//! │                                                                         │
//! │  restore(p, 3)                 quantity 2 → 5   (no upper bound)       │
//! │                                                                         │
//! │  delta(p, +2)   sold more  ─► reserve_and_decrement(p, 2)              │
//! │  delta(p, -2)   sold less  ─► restore(p, 2)                            │
//! │  delta(p,  0)   no-op                                                  │
//! │                                                                         │
//! │  Every mutation appends a stock_movements row in the same unit.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All mutations take the caller's [`UnitOfWork`]; the ledger never opens
//! or commits one itself. A failed check leaves nothing behind once the
//! caller's unit is rolled back.

use chrono::Utc;
use shopfloor_core::{CoreError, MovementReason};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use crate::repository::movement;
use crate::unit_of_work::UnitOfWork;

/// What caused a stock change, for the movement log.
#[derive(Debug, Clone, Copy)]
pub struct StockCause<'a> {
    pub sale_id: Option<&'a str>,
    pub reason: MovementReason,
}

impl<'a> StockCause<'a> {
    pub fn sale(sale_id: &'a str, reason: MovementReason) -> Self {
        StockCause {
            sale_id: Some(sale_id),
            reason,
        }
    }
}

/// Owner of product stock levels.
#[derive(Debug, Clone)]
pub struct StockLedger {
    pool: SqlitePool,
}

impl StockLedger {
    /// Creates a new StockLedger.
    pub fn new(pool: SqlitePool) -> Self {
        StockLedger { pool }
    }

    /// Current stock of a product, read outside any unit.
    pub async fn quantity(&self, product_id: &str) -> DbResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT quantity FROM products WHERE id = ?1")
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()).into())
    }

    /// Takes `qty` units out of stock.
    ///
    /// The quantity is re-read inside the unit, which already holds the
    /// write lock, so the check and the update see the same value.
    ///
    /// ## Returns
    /// The quantity left after the decrement.
    ///
    /// ## Errors
    /// - `ProductNotFound` if the product doesn't exist
    /// - `InsufficientStock` if `quantity < qty`
    pub async fn reserve_and_decrement(
        &self,
        uow: &mut UnitOfWork,
        product_id: &str,
        qty: i64,
        cause: StockCause<'_>,
    ) -> DbResult<i64> {
        debug!(product_id = %product_id, qty, "Reserving stock");

        let available: i64 = sqlx::query_scalar("SELECT quantity FROM products WHERE id = ?1")
            .bind(product_id)
            .fetch_optional(uow.conn())
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        if available < qty {
            debug!(product_id = %product_id, available, requested = qty, "Insufficient stock");
            return Err(CoreError::insufficient_stock(product_id, available, qty).into());
        }

        sqlx::query("UPDATE products SET quantity = quantity - ?1, updated_at = ?2 WHERE id = ?3")
            .bind(qty)
            .bind(Utc::now())
            .bind(product_id)
            .execute(uow.conn())
            .await?;

        let remaining = available - qty;
        movement::append(uow.conn(), product_id, cause.sale_id, -qty, cause.reason, remaining).await?;

        Ok(remaining)
    }

    /// Puts `qty` units back into stock. No upper bound.
    ///
    /// ## Returns
    /// The quantity after the restore.
    ///
    /// ## Errors
    /// - `ProductNotFound` if the product doesn't exist
    pub async fn restore(
        &self,
        uow: &mut UnitOfWork,
        product_id: &str,
        qty: i64,
        cause: StockCause<'_>,
    ) -> DbResult<i64> {
        debug!(product_id = %product_id, qty, "Restoring stock");

        let quantity: i64 = sqlx::query_scalar(
            "UPDATE products SET quantity = quantity + ?1, updated_at = ?2 WHERE id = ?3 RETURNING quantity",
        )
        .bind(qty)
        .bind(Utc::now())
        .bind(product_id)
        .fetch_optional(uow.conn())
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        movement::append(uow.conn(), product_id, cause.sale_id, qty, cause.reason, quantity).await?;

        Ok(quantity)
    }

    /// Applies a signed change in *sold* amount.
    ///
    /// Positive `sold_delta` takes stock (with the stock check), negative
    /// gives it back, zero does nothing and returns `None`.
    pub async fn delta(
        &self,
        uow: &mut UnitOfWork,
        product_id: &str,
        sold_delta: i64,
        cause: StockCause<'_>,
    ) -> DbResult<Option<i64>> {
        match sold_delta {
            0 => Ok(None),
            d if d > 0 => self.reserve_and_decrement(uow, product_id, d, cause).await.map(Some),
            d => self.restore(uow, product_id, -d, cause).await.map(Some),
        }
    }
}
