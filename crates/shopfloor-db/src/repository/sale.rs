//! # Sale Repository (Sale Recorder)
//!
//! Creates, corrects and deletes sale lines, moving stock in the same
//! atomic unit.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. CREATE                                                             │
//! │     └── create_sale()  → shop exists? → stock -= qty → INSERT          │
//! │                                                                         │
//! │  2. (OPTIONAL, REPEATABLE) CORRECT                                     │
//! │     └── update_sale()  → diff = new_qty - old_qty                      │
//! │                          diff > 0: stock -= diff (stock checked)       │
//! │                          diff < 0: stock += -diff                      │
//! │                          receipt line? → receipt repriced              │
//! │                                                                         │
//! │  3. DELETE                                                             │
//! │     └── delete_sale()  → stock += quantity_sold → DELETE               │
//! │                          receipt line? → receipt repriced              │
//! │         (a second delete finds nothing and restores nothing)           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Two Calling Styles
//! - `create_sale` / `update_sale` / `delete_sale` take the caller's
//!   [`UnitOfWork`] so several of them can commit together (checkout).
//! - `record_sale` / `correct_sale` / `reverse_sale` open, run and commit
//!   their own unit.
//!
//! Either way input is validated exactly once, before the unit is opened
//! or any statement runs in it.
//!
//! ## Receipt Lines
//! Correcting or deleting a line that belongs to a receipt reprices the
//! receipt in the same unit ([`ReceiptRepository::reprice`]). Repricing never
//! fails, so a correction is only ever refused for stock.

use chrono::Utc;
use shopfloor_core::validation::{validate_id, validate_new_sale, validate_sale_update};
use shopfloor_core::{CoreError, MovementReason, NewSale, Sale, SaleFilter, SaleUpdate};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DbResult;
use crate::repository::catalog::ensure_shop;
use crate::repository::receipt::ReceiptRepository;
use crate::repository::stock::{StockCause, StockLedger};
use crate::unit_of_work::UnitOfWork;

pub(crate) const SALE_COLUMNS: &str =
    "id, product_id, shop_id, quantity_sold, unit_price_cents, receipt_id, created_at, updated_at";

/// Repository for sale lines.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    fn ledger(&self) -> StockLedger {
        StockLedger::new(self.pool.clone())
    }

    // =========================================================================
    // Unit-of-work operations
    // =========================================================================

    /// Records a sale line inside the caller's unit.
    ///
    /// Input is validated before any statement runs.
    ///
    /// ## Errors
    /// - `Validation` for quantity < 1 or a negative price
    /// - `ShopNotFound`, `ProductNotFound`, `InsufficientStock`
    pub async fn create_sale(
        &self,
        uow: &mut UnitOfWork,
        new: &NewSale,
        receipt_id: Option<&str>,
    ) -> DbResult<Sale> {
        validate_new_sale(new)?;
        self.insert_checked(uow, new, receipt_id).await
    }

    async fn insert_checked(
        &self,
        uow: &mut UnitOfWork,
        new: &NewSale,
        receipt_id: Option<&str>,
    ) -> DbResult<Sale> {
        debug!(
            product_id = %new.product_id,
            shop_id = %new.shop_id,
            quantity = new.quantity_sold,
            receipt_id = ?receipt_id,
            "Creating sale"
        );

        ensure_shop(uow.conn(), &new.shop_id).await?;

        let id = Uuid::new_v4().to_string();
        self.ledger()
            .reserve_and_decrement(
                uow,
                &new.product_id,
                new.quantity_sold,
                StockCause::sale(&id, MovementReason::SaleCreated),
            )
            .await?;

        let now = Utc::now();
        let sale = Sale {
            id,
            product_id: new.product_id.clone(),
            shop_id: new.shop_id.clone(),
            quantity_sold: new.quantity_sold,
            unit_price_cents: new.unit_price_cents,
            receipt_id: receipt_id.map(str::to_string),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, product_id, shop_id, quantity_sold, unit_price_cents,
                receipt_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.product_id)
        .bind(&sale.shop_id)
        .bind(sale.quantity_sold)
        .bind(sale.unit_price_cents)
        .bind(&sale.receipt_id)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .execute(uow.conn())
        .await?;

        Ok(sale)
    }

    /// Corrects a sale line inside the caller's unit.
    ///
    /// ## What This Does
    /// 1. Loads the sale (`SaleNotFound`)
    /// 2. Checks a new shop exists (`ShopNotFound`)
    /// 3. Moves stock by the quantity difference (`InsufficientStock`)
    /// 4. Writes the new fields
    /// 5. If the line belongs to a receipt and its amount changed, reprices
    ///    the receipt
    pub async fn update_sale(&self, uow: &mut UnitOfWork, sale_id: &str, update: &SaleUpdate) -> DbResult<Sale> {
        validate_id("sale_id", sale_id)?;
        validate_sale_update(update)?;
        self.update_checked(uow, sale_id, update).await
    }

    async fn update_checked(&self, uow: &mut UnitOfWork, sale_id: &str, update: &SaleUpdate) -> DbResult<Sale> {
        let current = fetch_in_unit(uow, sale_id).await?;

        let new_qty = update.quantity_sold.unwrap_or(current.quantity_sold);
        let new_price = update.unit_price_cents.or(current.unit_price_cents);
        let new_shop = update.shop_id.clone().unwrap_or_else(|| current.shop_id.clone());

        debug!(
            sale_id = %sale_id,
            old_quantity = current.quantity_sold,
            new_quantity = new_qty,
            "Updating sale"
        );

        if new_shop != current.shop_id {
            ensure_shop(uow.conn(), &new_shop).await?;
        }

        self.ledger()
            .delta(
                uow,
                &current.product_id,
                new_qty - current.quantity_sold,
                StockCause::sale(sale_id, MovementReason::SaleUpdated),
            )
            .await?;

        let updated = sqlx::query_as::<_, Sale>(&format!(
            r#"
            UPDATE sales SET
                quantity_sold = ?1,
                unit_price_cents = ?2,
                shop_id = ?3,
                updated_at = ?4
            WHERE id = ?5
            RETURNING {}
            "#,
            SALE_COLUMNS
        ))
        .bind(new_qty)
        .bind(new_price)
        .bind(&new_shop)
        .bind(Utc::now())
        .bind(sale_id)
        .fetch_one(uow.conn())
        .await?;

        let amount_changed =
            new_qty != current.quantity_sold || new_price != current.unit_price_cents;
        if let (Some(receipt_id), true) = (&updated.receipt_id, amount_changed) {
            ReceiptRepository::new(self.pool.clone())
                .reprice(uow, receipt_id)
                .await?;
        }

        Ok(updated)
    }

    /// Deletes a sale line inside the caller's unit, restoring its stock.
    ///
    /// Returns the deleted row. A receipt it belonged to is repriced over
    /// its remaining lines.
    pub async fn delete_sale(&self, uow: &mut UnitOfWork, sale_id: &str) -> DbResult<Sale> {
        validate_id("sale_id", sale_id)?;
        self.delete_checked(uow, sale_id).await
    }

    async fn delete_checked(&self, uow: &mut UnitOfWork, sale_id: &str) -> DbResult<Sale> {
        let sale = fetch_in_unit(uow, sale_id).await?;
        debug!(sale_id = %sale_id, quantity = sale.quantity_sold, "Deleting sale");

        self.ledger()
            .restore(
                uow,
                &sale.product_id,
                sale.quantity_sold,
                StockCause::sale(sale_id, MovementReason::SaleDeleted),
            )
            .await?;

        sqlx::query("DELETE FROM sales WHERE id = ?1")
            .bind(sale_id)
            .execute(uow.conn())
            .await?;

        if let Some(receipt_id) = &sale.receipt_id {
            ReceiptRepository::new(self.pool.clone())
                .reprice(uow, receipt_id)
                .await?;
        }

        Ok(sale)
    }

    // =========================================================================
    // Self-committing forms
    // =========================================================================

    /// Records a standalone sale in its own unit.
    pub async fn record_sale(&self, new: &NewSale) -> DbResult<Sale> {
        validate_new_sale(new)?;

        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let sale = self.insert_checked(&mut uow, new, None).await?;
        uow.commit().await?;

        info!(
            sale_id = %sale.id,
            product_id = %sale.product_id,
            quantity = sale.quantity_sold,
            "Sale recorded"
        );
        Ok(sale)
    }

    /// Corrects a sale in its own unit.
    pub async fn correct_sale(&self, sale_id: &str, update: &SaleUpdate) -> DbResult<Sale> {
        validate_id("sale_id", sale_id)?;
        validate_sale_update(update)?;

        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let sale = self.update_checked(&mut uow, sale_id, update).await?;
        uow.commit().await?;

        info!(sale_id = %sale.id, quantity = sale.quantity_sold, "Sale corrected");
        Ok(sale)
    }

    /// Deletes a sale in its own unit.
    pub async fn reverse_sale(&self, sale_id: &str) -> DbResult<Sale> {
        validate_id("sale_id", sale_id)?;

        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let sale = self.delete_checked(&mut uow, sale_id).await?;
        uow.commit().await?;

        info!(
            sale_id = %sale.id,
            product_id = %sale.product_id,
            restored = sale.quantity_sold,
            "Sale deleted"
        );
        Ok(sale)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets a sale by ID, or `SaleNotFound`.
    pub async fn get(&self, sale_id: &str) -> DbResult<Sale> {
        sqlx::query_as::<_, Sale>(&format!("SELECT {} FROM sales WHERE id = ?1", SALE_COLUMNS))
            .bind(sale_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()).into())
    }

    /// Lists sales, newest first, narrowed by any filter fields given.
    pub async fn list(&self, filter: &SaleFilter) -> DbResult<Vec<Sale>> {
        debug!(?filter, "Listing sales");

        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM sales WHERE 1 = 1", SALE_COLUMNS));

        if let Some(shop_id) = &filter.shop_id {
            qb.push(" AND shop_id = ").push_bind(shop_id.clone());
        }
        if let Some(product_id) = &filter.product_id {
            qb.push(" AND product_id = ").push_bind(product_id.clone());
        }
        if let Some(receipt_id) = &filter.receipt_id {
            qb.push(" AND receipt_id = ").push_bind(receipt_id.clone());
        }

        qb.push(" ORDER BY created_at DESC, rowid DESC LIMIT ")
            .push_bind(filter.limit())
            .push(" OFFSET ")
            .push_bind(filter.offset());

        let sales = qb.build_query_as::<Sale>().fetch_all(&self.pool).await?;
        Ok(sales)
    }
}

async fn fetch_in_unit(uow: &mut UnitOfWork, sale_id: &str) -> DbResult<Sale> {
    sqlx::query_as::<_, Sale>(&format!("SELECT {} FROM sales WHERE id = ?1", SALE_COLUMNS))
        .bind(sale_id)
        .fetch_optional(uow.conn())
        .await?
        .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{product_in_shop, seeded_product, test_db};
    use crate::DbError;
    use shopfloor_core::{CheckoutLine, CheckoutOutcome, CheckoutPayment, CheckoutRequest, Money, PaymentMethod};

    fn new_sale(product_id: &str, shop_id: &str, qty: i64, price: Option<i64>) -> NewSale {
        NewSale {
            product_id: product_id.to_string(),
            shop_id: shop_id.to_string(),
            quantity_sold: qty,
            unit_price_cents: price,
        }
    }

    #[tokio::test]
    async fn test_record_sale_decrements_stock() {
        let db = test_db().await;
        let (shop, product) = seeded_product(&db, 10).await;

        let sale = db
            .sales()
            .record_sale(&new_sale(&product.id, &shop.id, 3, Some(1_000)))
            .await
            .unwrap();

        assert_eq!(sale.quantity_sold, 3);
        assert_eq!(sale.receipt_id, None);
        assert_eq!(db.stock().quantity(&product.id).await.unwrap(), 7);

        let loaded = db.sales().get(&sale.id).await.unwrap();
        assert_eq!(loaded.unit_price_cents, Some(1_000));
    }

    #[tokio::test]
    async fn test_create_then_delete_restores_quantity() {
        let db = test_db().await;
        let (shop, product) = seeded_product(&db, 10).await;

        let sale = db
            .sales()
            .record_sale(&new_sale(&product.id, &shop.id, 4, None))
            .await
            .unwrap();
        db.sales().reverse_sale(&sale.id).await.unwrap();

        assert_eq!(db.stock().quantity(&product.id).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_delete_is_single_shot() {
        let db = test_db().await;
        let (shop, product) = seeded_product(&db, 10).await;

        let sale = db
            .sales()
            .record_sale(&new_sale(&product.id, &shop.id, 4, None))
            .await
            .unwrap();
        db.sales().reverse_sale(&sale.id).await.unwrap();

        let err = db.sales().reverse_sale(&sale.id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::SaleNotFound(_))));
        assert_eq!(db.stock().quantity(&product.id).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_create_rejections_leave_no_trace() {
        let db = test_db().await;
        let (shop, product) = seeded_product(&db, 2).await;
        let sales = db.sales();

        let err = sales
            .record_sale(&new_sale(&product.id, &shop.id, 3, None))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InsufficientStock { .. })));

        let err = sales
            .record_sale(&new_sale(&product.id, "no-shop", 1, None))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::ShopNotFound(_))));

        let err = sales
            .record_sale(&new_sale("no-product", &shop.id, 1, None))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::ProductNotFound(_))));

        let err = sales
            .record_sale(&new_sale(&product.id, &shop.id, 0, None))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

        let err = sales
            .record_sale(&new_sale(&product.id, &shop.id, 1, Some(-1)))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

        assert_eq!(db.stock().quantity(&product.id).await.unwrap(), 2);
        assert!(sales.list(&SaleFilter::default()).await.unwrap().is_empty());
        assert!(db.movements().list_for_product(&product.id, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_moves_stock_both_ways() {
        let db = test_db().await;
        let (shop, product) = seeded_product(&db, 10).await;
        let sales = db.sales();
        let sale = sales
            .record_sale(&new_sale(&product.id, &shop.id, 3, Some(500)))
            .await
            .unwrap();

        let up = sales.correct_sale(&sale.id, &SaleUpdate::quantity(5)).await.unwrap();
        assert_eq!(up.quantity_sold, 5);
        assert_eq!(db.stock().quantity(&product.id).await.unwrap(), 5);

        let down = sales.correct_sale(&sale.id, &SaleUpdate::quantity(1)).await.unwrap();
        assert_eq!(down.quantity_sold, 1);
        assert_eq!(down.unit_price_cents, Some(500));
        assert_eq!(db.stock().quantity(&product.id).await.unwrap(), 9);
    }

    #[tokio::test]
    async fn test_update_beyond_stock_changes_nothing() {
        let db = test_db().await;
        let (shop, product) = seeded_product(&db, 5).await;
        let sales = db.sales();
        let sale = sales
            .record_sale(&new_sale(&product.id, &shop.id, 3, Some(500)))
            .await
            .unwrap();

        // 2 left in stock; raising the sale by 3 needs 3.
        let err = sales.correct_sale(&sale.id, &SaleUpdate::quantity(6)).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InsufficientStock { .. })));

        assert_eq!(sales.get(&sale.id).await.unwrap().quantity_sold, 3);
        assert_eq!(db.stock().quantity(&product.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_update_price_and_shop() {
        let db = test_db().await;
        let (shop, product) = seeded_product(&db, 5).await;
        let other_shop = db.catalog().insert_shop("Annex").await.unwrap();
        let sales = db.sales();
        let sale = sales
            .record_sale(&new_sale(&product.id, &shop.id, 1, None))
            .await
            .unwrap();

        let updated = sales
            .correct_sale(
                &sale.id,
                &SaleUpdate {
                    unit_price_cents: Some(750),
                    shop_id: Some(other_shop.id.clone()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.unit_price_cents, Some(750));
        assert_eq!(updated.shop_id, other_shop.id);
        assert_eq!(db.stock().quantity(&product.id).await.unwrap(), 4);

        let err = sales
            .correct_sale(
                &sale.id,
                &SaleUpdate {
                    shop_id: Some("no-shop".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::ShopNotFound(_))));
    }

    #[tokio::test]
    async fn test_update_missing_sale() {
        let db = test_db().await;
        let err = db
            .sales()
            .correct_sale("missing", &SaleUpdate::quantity(1))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::SaleNotFound(_))));
    }

    #[tokio::test]
    async fn test_malformed_ids_rejected_before_any_unit() {
        let db = test_db().await;
        let sales = db.sales();

        let err = sales.correct_sale("", &SaleUpdate::quantity(1)).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

        let err = sales.reverse_sale("").await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

        let err = sales.correct_sale("missing", &SaleUpdate::quantity(0)).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_raising_receipt_line_raises_rest() {
        let db = test_db().await;
        let (shop, product) = seeded_product(&db, 10).await;
        let outcome = checked_out(&db, vec![CheckoutLine::new(&product.id, &shop.id, 5, 100)], 400, Some(50)).await;

        db.sales()
            .correct_sale(&outcome.sales[0].id, &SaleUpdate::quantity(6))
            .await
            .unwrap();

        let receipt = db.receipts().get(&outcome.receipt.id).await.unwrap();
        assert_eq!(receipt.total_amount_cents, 600);
        assert_eq!(receipt.customer_paid_cents, 400);
        assert_eq!(receipt.discount_amount_cents, Some(50));
        assert_eq!(receipt.rest_amount_cents, Some(150));
        assert_eq!(db.stock().quantity(&product.id).await.unwrap(), 4);
        assert_receipt_matches_lines(&db, &outcome.receipt.id).await;
    }

    #[tokio::test]
    async fn test_lowering_fully_paid_receipt_line_succeeds() {
        let db = test_db().await;
        let (shop, product) = seeded_product(&db, 5).await;
        let outcome = checked_out(&db, vec![CheckoutLine::new(&product.id, &shop.id, 5, 100)], 500, None).await;
        assert_eq!(db.stock().quantity(&product.id).await.unwrap(), 0);

        let sale = db
            .sales()
            .correct_sale(&outcome.sales[0].id, &SaleUpdate::quantity(3))
            .await
            .unwrap();
        assert_eq!(sale.quantity_sold, 3);
        assert_eq!(db.stock().quantity(&product.id).await.unwrap(), 2);

        let receipt = db.receipts().get(&outcome.receipt.id).await.unwrap();
        assert_eq!(receipt.total_amount_cents, 300);
        assert_eq!(receipt.customer_paid_cents, 300);
        assert_eq!(receipt.discount_amount_cents, None);
        assert_eq!(receipt.rest_amount_cents, None);
        assert_receipt_matches_lines(&db, &outcome.receipt.id).await;
    }

    #[tokio::test]
    async fn test_repricing_price_change_keeps_other_lines() {
        let db = test_db().await;
        let (shop, a) = seeded_product(&db, 10).await;
        let b = product_in_shop(&db, &shop, 10).await;
        let outcome = checked_out(
            &db,
            vec![
                CheckoutLine::new(&a.id, &shop.id, 2, 100),
                CheckoutLine::new(&b.id, &shop.id, 1, 300),
            ],
            250,
            Some(50),
        )
        .await;

        db.sales()
            .correct_sale(
                &outcome.sales[1].id,
                &SaleUpdate {
                    unit_price_cents: Some(200),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let receipt = db.receipts().get(&outcome.receipt.id).await.unwrap();
        assert_eq!(receipt.total_amount_cents, 400);
        assert_eq!(receipt.customer_paid_cents, 250);
        assert_eq!(receipt.discount_amount_cents, Some(50));
        assert_eq!(receipt.rest_amount_cents, Some(100));
        assert_receipt_matches_lines(&db, &outcome.receipt.id).await;
    }

    #[tokio::test]
    async fn test_deleting_receipt_lines_reprices_down_to_zero() {
        let db = test_db().await;
        let (shop, a) = seeded_product(&db, 10).await;
        let b = product_in_shop(&db, &shop, 10).await;
        let outcome = checked_out(
            &db,
            vec![
                CheckoutLine::new(&a.id, &shop.id, 5, 100),
                CheckoutLine::new(&b.id, &shop.id, 1, 200),
            ],
            700,
            None,
        )
        .await;

        db.sales().reverse_sale(&outcome.sales[0].id).await.unwrap();
        let receipt = db.receipts().get(&outcome.receipt.id).await.unwrap();
        assert_eq!(receipt.total_amount_cents, 200);
        assert_eq!(receipt.customer_paid_cents, 200);
        assert_receipt_matches_lines(&db, &outcome.receipt.id).await;
        assert_eq!(db.stock().quantity(&a.id).await.unwrap(), 10);

        db.sales().reverse_sale(&outcome.sales[1].id).await.unwrap();
        let detail = db.receipts().detail(&outcome.receipt.id).await.unwrap();
        assert!(detail.sales.is_empty());
        assert_eq!(detail.receipt.total_amount_cents, 0);
        assert_eq!(detail.receipt.customer_paid_cents, 0);
        assert_eq!(detail.receipt.discount_amount_cents, None);
        assert_eq!(detail.receipt.rest_amount_cents, None);
        assert_eq!(db.stock().quantity(&b.id).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_failed_receipt_line_correction_leaves_receipt_alone() {
        let db = test_db().await;
        let (shop, product) = seeded_product(&db, 6).await;
        let outcome = checked_out(&db, vec![CheckoutLine::new(&product.id, &shop.id, 5, 100)], 400, None).await;

        // 1 left in stock; raising the line by 2 needs 2.
        let err = db
            .sales()
            .correct_sale(&outcome.sales[0].id, &SaleUpdate::quantity(7))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InsufficientStock { .. })));

        let receipt = db.receipts().get(&outcome.receipt.id).await.unwrap();
        assert_eq!(receipt.total_amount_cents, 500);
        assert_eq!(receipt.rest_amount_cents, Some(100));
        assert_eq!(db.stock().quantity(&product.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_movements_follow_sale_lifecycle() {
        let db = test_db().await;
        let (shop, product) = seeded_product(&db, 10).await;
        let sales = db.sales();

        let sale = sales
            .record_sale(&new_sale(&product.id, &shop.id, 3, None))
            .await
            .unwrap();
        sales.correct_sale(&sale.id, &SaleUpdate::quantity(4)).await.unwrap();
        sales.reverse_sale(&sale.id).await.unwrap();

        let log = db.movements().list_for_product(&product.id, 10).await.unwrap();
        let reasons: Vec<_> = log.iter().map(|m| (m.reason, m.delta, m.quantity_after)).collect();
        assert_eq!(
            reasons,
            vec![
                (MovementReason::SaleDeleted, 4, 10),
                (MovementReason::SaleUpdated, -1, 6),
                (MovementReason::SaleCreated, -3, 7),
            ]
        );
        assert!(log.iter().all(|m| m.sale_id.as_deref() == Some(sale.id.as_str())));
    }

    #[tokio::test]
    async fn test_list_filters_and_pages() {
        let db = test_db().await;
        let (shop, a) = seeded_product(&db, 20).await;
        let b = product_in_shop(&db, &shop, 20).await;
        let sales = db.sales();

        for _ in 0..3 {
            sales.record_sale(&new_sale(&a.id, &shop.id, 1, None)).await.unwrap();
        }
        sales.record_sale(&new_sale(&b.id, &shop.id, 1, None)).await.unwrap();

        let all = sales.list(&SaleFilter::default()).await.unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].product_id, b.id);

        let only_a = sales
            .list(&SaleFilter {
                product_id: Some(a.id.clone()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(only_a.len(), 3);

        let page = sales
            .list(&SaleFilter {
                limit: Some(2),
                offset: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.len(), 2);

        let by_shop = sales
            .list(&SaleFilter {
                shop_id: Some("elsewhere".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(by_shop.is_empty());
    }

    #[tokio::test]
    async fn test_several_sales_in_one_unit_commit_together() {
        let db = test_db().await;
        let (shop, product) = seeded_product(&db, 10).await;
        let sales = db.sales();

        let mut uow = db.begin().await.unwrap();
        sales
            .create_sale(&mut uow, &new_sale(&product.id, &shop.id, 2, None), None)
            .await
            .unwrap();
        sales
            .create_sale(&mut uow, &new_sale(&product.id, &shop.id, 2, None), None)
            .await
            .unwrap();
        uow.rollback().await.unwrap();

        assert_eq!(db.stock().quantity(&product.id).await.unwrap(), 10);
        assert!(sales.list(&SaleFilter::default()).await.unwrap().is_empty());
    }
}
