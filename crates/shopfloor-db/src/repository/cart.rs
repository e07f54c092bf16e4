//! # Cart Repository
//!
//! Per-user carts, persisted so they survive restarts and follow the user
//! across devices.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Lifecycle                                       │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐     ┌──────────┐       │
//! │  │  Empty   │────►│ In Cart  │────►│ Checkout │────►│  Empty   │       │
//! │  │  Cart    │     │          │     │ (commit) │     │  Cart    │       │
//! │  └──────────┘     └──────────┘     └──────────┘     └──────────┘       │
//! │                        │                                                │
//! │                   add_item        (stock checked, NOT reserved)        │
//! │                   set_quantity                                          │
//! │                   remove_item                                           │
//! │                        │                                                │
//! │                        ▼                                                │
//! │                   clear ───────────────────────────► (back to empty)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock checks here are advisory: two users may both hold the last unit in
//! their carts. Checkout is where stock is actually taken.

use chrono::Utc;
use shopfloor_core::validation::{validate_id, validate_quantity};
use shopfloor_core::{CartEntry, CartLine, CartView, CoreError, ValidationError};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use crate::unit_of_work::UnitOfWork;

/// Repository for cart entries.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    /// Creates a new CartRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Adds `qty` of a product to the user's cart.
    ///
    /// ## Behavior
    /// - Product already in cart: quantity increases, same entry
    /// - Product not in cart: new entry
    ///
    /// ## User Workflow
    /// ```text
    /// POST /api/cart { product_id, quantity: 3 }
    ///      │
    ///      ▼
    /// ┌────────────────────────────────────────────────────────────────┐
    /// │  1. Product exists?               no → ProductNotFound        │
    /// │  2. existing + 3 overflows?       yes → Validation            │
    /// │     stock < existing + 3?         yes → InsufficientStock     │
    /// │  3. INSERT ... ON CONFLICT(user_id, product_id)               │
    /// │        DO UPDATE SET quantity = quantity + 3                   │
    /// └────────────────────────────────────────────────────────────────┘
    /// ```
    pub async fn add_item(&self, user_id: &str, product_id: &str, qty: i64) -> DbResult<CartEntry> {
        validate_id("user_id", user_id)?;
        validate_id("product_id", product_id)?;
        validate_quantity("quantity", qty)?;

        debug!(user_id = %user_id, product_id = %product_id, qty, "Adding to cart");

        let mut uow = UnitOfWork::begin(&self.pool).await?;

        let stock = product_stock(uow.conn(), product_id).await?;

        let existing: i64 = sqlx::query_scalar(
            "SELECT quantity FROM cart_entries WHERE user_id = ?1 AND product_id = ?2",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(uow.conn())
        .await?
        .unwrap_or(0);

        let wanted = existing.checked_add(qty).ok_or_else(|| ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: i64::MAX - existing,
        })?;
        if stock < wanted {
            return Err(CoreError::insufficient_stock(product_id, stock, wanted).into());
        }

        let now = Utc::now();
        let entry = sqlx::query_as::<_, CartEntry>(
            r#"
            INSERT INTO cart_entries (id, user_id, product_id, quantity, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            ON CONFLICT (user_id, product_id) DO UPDATE SET
                quantity = cart_entries.quantity + excluded.quantity,
                updated_at = excluded.updated_at
            RETURNING id, user_id, product_id, quantity, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(product_id)
        .bind(qty)
        .bind(now)
        .fetch_one(uow.conn())
        .await?;

        uow.commit().await?;

        debug!(entry_id = %entry.id, quantity = entry.quantity, "Cart entry saved");
        Ok(entry)
    }

    /// Overwrites the quantity of one of the user's entries.
    ///
    /// ## Errors
    /// - `Validation` if `qty < 1`
    /// - `CartEntryNotFound` if the entry isn't this user's
    /// - `InsufficientStock` if `qty` exceeds live stock
    pub async fn set_quantity(&self, user_id: &str, entry_id: &str, qty: i64) -> DbResult<CartEntry> {
        validate_id("user_id", user_id)?;
        validate_id("entry_id", entry_id)?;
        validate_quantity("quantity", qty)?;

        debug!(user_id = %user_id, entry_id = %entry_id, qty, "Setting cart quantity");

        let mut uow = UnitOfWork::begin(&self.pool).await?;

        let product_id: String =
            sqlx::query_scalar("SELECT product_id FROM cart_entries WHERE id = ?1 AND user_id = ?2")
                .bind(entry_id)
                .bind(user_id)
                .fetch_optional(uow.conn())
                .await?
                .ok_or_else(|| CoreError::CartEntryNotFound(entry_id.to_string()))?;

        let stock = product_stock(uow.conn(), &product_id).await?;
        if qty > stock {
            return Err(CoreError::insufficient_stock(product_id, stock, qty).into());
        }

        let entry = sqlx::query_as::<_, CartEntry>(
            r#"
            UPDATE cart_entries SET quantity = ?1, updated_at = ?2
            WHERE id = ?3 AND user_id = ?4
            RETURNING id, user_id, product_id, quantity, created_at, updated_at
            "#,
        )
        .bind(qty)
        .bind(Utc::now())
        .bind(entry_id)
        .bind(user_id)
        .fetch_one(uow.conn())
        .await?;

        uow.commit().await?;
        Ok(entry)
    }

    /// Removes one of the user's entries.
    pub async fn remove_item(&self, user_id: &str, entry_id: &str) -> DbResult<()> {
        debug!(user_id = %user_id, entry_id = %entry_id, "Removing cart entry");

        let result = sqlx::query("DELETE FROM cart_entries WHERE id = ?1 AND user_id = ?2")
            .bind(entry_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::CartEntryNotFound(entry_id.to_string()).into());
        }

        Ok(())
    }

    /// Empties the user's cart and returns how many entries were deleted.
    pub async fn clear(&self, user_id: &str) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM cart_entries WHERE user_id = ?1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        debug!(user_id = %user_id, deleted = result.rows_affected(), "Cart cleared");
        Ok(result.rows_affected())
    }

    /// Returns the user's cart joined with live product data.
    pub async fn list(&self, user_id: &str) -> DbResult<CartView> {
        debug!(user_id = %user_id, "Listing cart");

        let lines = sqlx::query_as::<_, CartLine>(
            r#"
            SELECT
                c.id,
                c.product_id,
                c.quantity,
                p.name AS product_name,
                p.length,
                p.width,
                p.thickness,
                p.weight,
                b.name AS brand_name,
                p.shop_id,
                s.name AS shop_name,
                cat.name AS category_name,
                p.quantity AS max_stock,
                c.created_at,
                c.updated_at
            FROM cart_entries c
            INNER JOIN products p ON p.id = c.product_id
            INNER JOIN brands b ON b.id = p.brand_id
            INNER JOIN shops s ON s.id = p.shop_id
            INNER JOIN categories cat ON cat.id = p.category_id
            WHERE c.user_id = ?1
            ORDER BY c.created_at ASC, c.rowid ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(CartView::from_lines(lines))
    }
}

async fn product_stock(conn: &mut SqliteConnection, product_id: &str) -> DbResult<i64> {
    sqlx::query_scalar::<_, i64>("SELECT quantity FROM products WHERE id = ?1")
        .bind(product_id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()).into())
}
