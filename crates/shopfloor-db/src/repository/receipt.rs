//! # Receipt Repository
//!
//! Receipts (customer sale mappings): the payment record of one checkout.
//!
//! A receipt is written once by the checkout coordinator. Afterwards its
//! financial fields only change when one of its sale lines is corrected or
//! deleted ([`ReceiptRepository::reprice`]), so its total always equals the
//! sum of its remaining lines. A receipt whose lines are all gone stays as
//! a zero-total payment record.

use chrono::Utc;
use shopfloor_core::{CheckoutPayment, CoreError, Money, PaymentSplit, Receipt, ReceiptDetail, Sale};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DbResult;
use crate::repository::sale::SALE_COLUMNS;
use crate::unit_of_work::UnitOfWork;

const RECEIPT_COLUMNS: &str = "id, total_amount_cents, customer_name, customer_phone, payment_method, \
     sale_date, customer_paid_cents, discount_amount_cents, rest_amount_cents, created_at";

/// Repository for receipts.
#[derive(Debug, Clone)]
pub struct ReceiptRepository {
    pool: SqlitePool,
}

impl ReceiptRepository {
    /// Creates a new ReceiptRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReceiptRepository { pool }
    }

    /// Inserts a receipt for an already validated split.
    pub async fn insert(
        &self,
        uow: &mut UnitOfWork,
        split: &PaymentSplit,
        payment: &CheckoutPayment,
    ) -> DbResult<Receipt> {
        let now = Utc::now();
        let receipt = Receipt {
            id: Uuid::new_v4().to_string(),
            total_amount_cents: split.total().cents(),
            customer_name: payment.customer_name.clone(),
            customer_phone: payment.customer_phone.clone(),
            payment_method: payment.payment_method,
            sale_date: payment.sale_date.unwrap_or(now),
            customer_paid_cents: split.customer_paid().cents(),
            discount_amount_cents: split.discount_amount().map(|m| m.cents()),
            rest_amount_cents: split.rest_amount().map(|m| m.cents()),
            created_at: now,
        };

        debug!(
            id = %receipt.id,
            total = receipt.total_amount_cents,
            paid = receipt.customer_paid_cents,
            "Inserting receipt"
        );

        sqlx::query(
            r#"
            INSERT INTO receipts (
                id, total_amount_cents, customer_name, customer_phone, payment_method,
                sale_date, customer_paid_cents, discount_amount_cents, rest_amount_cents, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&receipt.id)
        .bind(receipt.total_amount_cents)
        .bind(&receipt.customer_name)
        .bind(&receipt.customer_phone)
        .bind(receipt.payment_method)
        .bind(receipt.sale_date)
        .bind(receipt.customer_paid_cents)
        .bind(receipt.discount_amount_cents)
        .bind(receipt.rest_amount_cents)
        .bind(receipt.created_at)
        .execute(uow.conn())
        .await?;

        Ok(receipt)
    }

    /// Gets a receipt by ID, or `ReceiptNotFound`.
    pub async fn get(&self, id: &str) -> DbResult<Receipt> {
        debug!(id = %id, "Getting receipt");

        sqlx::query_as::<_, Receipt>(&format!("SELECT {} FROM receipts WHERE id = ?1", RECEIPT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| CoreError::ReceiptNotFound(id.to_string()).into())
    }

    /// Gets a receipt with its remaining sale lines, in checkout order.
    pub async fn detail(&self, id: &str) -> DbResult<ReceiptDetail> {
        let receipt = self.get(id).await?;

        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {} FROM sales WHERE receipt_id = ?1 ORDER BY rowid ASC",
            SALE_COLUMNS
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ReceiptDetail { receipt, sales })
    }

    /// Recomputes a receipt's total from its remaining lines and re-splits
    /// the payment over it.
    ///
    /// Runs after any change to a receipt's lines (correction or delete) so
    /// the receipt always sums to its lines. The split is rebalanced rather
    /// than revalidated, so this never rejects a correction: payment beyond
    /// the new total is capped and logged as owed back.
    ///
    /// ## Example
    /// ```text
    /// before: total 500  paid 400  discount 50  rest 50
    /// line +1 × 100 ──► total 600  paid 400  discount 50  rest 150
    /// line -3 × 100 ──► total 200  paid 200  discount -   rest -   (200 owed back)
    /// ```
    ///
    /// ## Errors
    /// - `ReceiptNotFound` if the receipt doesn't exist
    pub async fn reprice(&self, uow: &mut UnitOfWork, receipt_id: &str) -> DbResult<Receipt> {
        let receipt = sqlx::query_as::<_, Receipt>(&format!(
            "SELECT {} FROM receipts WHERE id = ?1",
            RECEIPT_COLUMNS
        ))
        .bind(receipt_id)
        .fetch_optional(uow.conn())
        .await?
        .ok_or_else(|| CoreError::ReceiptNotFound(receipt_id.to_string()))?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity_sold * COALESCE(unit_price_cents, 0)), 0) FROM sales WHERE receipt_id = ?1",
        )
        .bind(receipt_id)
        .fetch_one(uow.conn())
        .await?;
        let total = Money::from_cents(total);

        let split = PaymentSplit::rebalance(total, receipt.customer_paid(), receipt.discount());

        debug!(
            receipt_id = %receipt_id,
            old_total = receipt.total_amount_cents,
            new_total = total.cents(),
            "Repricing receipt"
        );

        if let Some(excess) = PaymentSplit::overpaid(total, receipt.customer_paid()) {
            info!(
                receipt_id = %receipt_id,
                owed_back = excess.cents(),
                "Receipt total dropped below amount paid"
            );
        }

        let updated = sqlx::query_as::<_, Receipt>(&format!(
            r#"
            UPDATE receipts SET
                total_amount_cents = ?1,
                customer_paid_cents = ?2,
                discount_amount_cents = ?3,
                rest_amount_cents = ?4
            WHERE id = ?5
            RETURNING {}
            "#,
            RECEIPT_COLUMNS
        ))
        .bind(split.total().cents())
        .bind(split.customer_paid().cents())
        .bind(split.discount_amount().map(|m| m.cents()))
        .bind(split.rest_amount().map(|m| m.cents()))
        .bind(receipt_id)
        .fetch_one(uow.conn())
        .await?;

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_db;
    use crate::DbError;
    use shopfloor_core::PaymentMethod;

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let split = PaymentSplit::compute(Money::from_cents(500), Money::from_cents(400), Some(Money::from_cents(50)))
            .unwrap();
        let payment = CheckoutPayment {
            customer_name: Some("Ada".to_string()),
            payment_method: PaymentMethod::MobileMoney,
            customer_paid_cents: 400,
            discount_amount_cents: Some(50),
            ..Default::default()
        };

        let mut uow = db.begin().await.unwrap();
        let receipt = db.receipts().insert(&mut uow, &split, &payment).await.unwrap();
        uow.commit().await.unwrap();

        let loaded = db.receipts().get(&receipt.id).await.unwrap();
        assert_eq!(loaded.total_amount_cents, 500);
        assert_eq!(loaded.discount_amount_cents, Some(50));
        assert_eq!(loaded.rest_amount_cents, Some(50));
        assert_eq!(loaded.payment_method, PaymentMethod::MobileMoney);
        assert_eq!(loaded.customer_name.as_deref(), Some("Ada"));
        assert!(loaded.is_balanced());

        let detail = db.receipts().detail(&receipt.id).await.unwrap();
        assert!(detail.sales.is_empty());
    }

    #[tokio::test]
    async fn test_missing_receipt() {
        let db = test_db().await;
        let err = db.receipts().get("nope").await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::ReceiptNotFound(_))));
    }
}
