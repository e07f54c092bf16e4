//! # Checkout Coordinator
//!
//! Turns an ordered list of lines plus a payment into one receipt and N
//! sale lines, all or nothing.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Checkout Flow                                    │
//! │                                                                         │
//! │  validate lines + discount          (no store access yet)              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  grand_total = Σ qty × unit_price   (server-side, never from client)   │
//! │  PaymentSplit::compute(...)         InvalidPayment? → stop             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌───────────────────── UnitOfWork ──────────────────────┐             │
//! │  │  INSERT receipt                                        │             │
//! │  │  line 0: create_sale(receipt_id) ─┐                    │             │
//! │  │  line 1: create_sale(receipt_id)  ├─ any failure ──────┼─► ROLLBACK  │
//! │  │  ...                              ┘  (line rejected)   │   nothing   │
//! │  │  COMMIT                                                │   changed   │
//! │  └────────────────────────────────────────────────────────┘             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  clear user's cart   (outside the unit; failure → cart_cleared=false)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use shopfloor_core::payment::grand_total;
use shopfloor_core::validation::{validate_checkout_lines, validate_discount_cents, validate_id};
use shopfloor_core::{CheckoutOutcome, CheckoutRequest, CoreError, Money, NewSale, PaymentSplit};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::cart::CartRepository;
use crate::repository::receipt::ReceiptRepository;
use crate::repository::sale::SaleRepository;
use crate::unit_of_work::UnitOfWork;

/// Coordinates multi-line checkouts.
#[derive(Debug, Clone)]
pub struct CheckoutCoordinator {
    pool: SqlitePool,
}

impl CheckoutCoordinator {
    /// Creates a new CheckoutCoordinator.
    pub fn new(pool: SqlitePool) -> Self {
        CheckoutCoordinator { pool }
    }

    /// Runs a checkout.
    ///
    /// ## Arguments
    /// * `request` - Lines (in order) and payment
    /// * `user_id` - Whose cart to clear after commit, if any
    ///
    /// ## Errors
    /// - `Validation` for malformed lines or a negative discount
    /// - `InvalidPayment` if the payment doesn't fit the computed total
    /// - `CheckoutLineRejected` naming the first line that failed, with the
    ///   underlying reason (`ProductNotFound`, `ShopNotFound`,
    ///   `InsufficientStock`)
    ///
    /// On any error nothing is written and the cart is untouched.
    pub async fn checkout(&self, request: &CheckoutRequest, user_id: Option<&str>) -> DbResult<CheckoutOutcome> {
        validate_checkout_lines(&request.items)?;
        validate_discount_cents(request.customer.discount_amount_cents)?;
        if let Some(user_id) = user_id {
            validate_id("user_id", user_id)?;
        }

        let total = grand_total(&request.items)?;
        let split = PaymentSplit::compute(
            total,
            Money::from_cents(request.customer.customer_paid_cents),
            request.customer.discount_amount_cents.map(Money::from_cents),
        )?;

        debug!(
            lines = request.items.len(),
            total = total.cents(),
            paid = split.customer_paid().cents(),
            "Starting checkout"
        );

        let sales_repo = SaleRepository::new(self.pool.clone());
        let receipts = ReceiptRepository::new(self.pool.clone());

        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let receipt = receipts.insert(&mut uow, &split, &request.customer).await?;

        let mut sales = Vec::with_capacity(request.items.len());
        for (index, line) in request.items.iter().enumerate() {
            let new = NewSale {
                product_id: line.product_id.clone(),
                shop_id: line.shop_id.clone(),
                quantity_sold: line.quantity,
                unit_price_cents: Some(line.unit_price_cents),
            };

            match sales_repo.create_sale(&mut uow, &new, Some(&receipt.id)).await {
                Ok(sale) => sales.push(sale),
                Err(DbError::Domain(reason)) => {
                    debug!(line = index, product_id = %line.product_id, %reason, "Checkout line rejected");
                    return Err(CoreError::CheckoutLineRejected {
                        line: index,
                        product_id: line.product_id.clone(),
                        shop_id: line.shop_id.clone(),
                        reason: Box::new(reason),
                    }
                    .into());
                }
                Err(other) => return Err(other),
            }
        }

        uow.commit().await?;

        info!(
            receipt_id = %receipt.id,
            lines = sales.len(),
            total = receipt.total_amount_cents,
            "Checkout committed"
        );

        let cart_cleared = match user_id {
            Some(user_id) => match CartRepository::new(self.pool.clone()).clear(user_id).await {
                Ok(_) => true,
                Err(e) => {
                    warn!(user_id = %user_id, receipt_id = %receipt.id, error = %e, "Cart clear after checkout failed");
                    false
                }
            },
            None => false,
        };

        Ok(CheckoutOutcome {
            receipt,
            sales,
            cart_cleared,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{product_in_shop, seeded_product, test_db};
    use shopfloor_core::{CheckoutLine, CheckoutPayment, PaymentMethod, SaleFilter, ValidationError};

    fn payment(paid: i64, discount: Option<i64>) -> CheckoutPayment {
        CheckoutPayment {
            customer_name: Some("Walk-in".to_string()),
            payment_method: PaymentMethod::Cash,
            customer_paid_cents: paid,
            discount_amount_cents: discount,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_full_payment_checkout() {
        let db = test_db().await;
        let (shop, product) = seeded_product(&db, 5).await;
        db.carts().add_item("u1", &product.id, 5).await.unwrap();

        let request = CheckoutRequest {
            items: vec![CheckoutLine::new(&product.id, &shop.id, 5, 10_000)],
            customer: payment(50_000, None),
        };
        let outcome = db.checkout().checkout(&request, Some("u1")).await.unwrap();

        assert_eq!(outcome.receipt.total_amount_cents, 50_000);
        assert_eq!(outcome.receipt.discount_amount_cents, None);
        assert_eq!(outcome.receipt.rest_amount_cents, None);
        assert_eq!(outcome.sales.len(), 1);
        assert_eq!(outcome.sales[0].receipt_id.as_deref(), Some(outcome.receipt.id.as_str()));
        assert!(outcome.cart_cleared);

        assert_eq!(db.stock().quantity(&product.id).await.unwrap(), 0);
        assert!(db.carts().list("u1").await.unwrap().items.is_empty());
    }

    #[tokio::test]
    async fn test_partial_payment_with_discount() {
        let db = test_db().await;
        let (shop, product) = seeded_product(&db, 5).await;

        let request = CheckoutRequest {
            items: vec![CheckoutLine::new(&product.id, &shop.id, 5, 10_000)],
            customer: payment(40_000, Some(5_000)),
        };
        let outcome = db.checkout().checkout(&request, None).await.unwrap();

        assert_eq!(outcome.receipt.customer_paid_cents, 40_000);
        assert_eq!(outcome.receipt.discount_amount_cents, Some(5_000));
        assert_eq!(outcome.receipt.rest_amount_cents, Some(5_000));
        assert!(outcome.receipt.is_balanced());
        assert!(!outcome.cart_cleared);
    }

    #[tokio::test]
    async fn test_second_line_short_fails_everything() {
        let db = test_db().await;
        let (shop, a) = seeded_product(&db, 10).await;
        let b = product_in_shop(&db, &shop, 1).await;
        db.carts().add_item("u1", &a.id, 2).await.unwrap();

        let request = CheckoutRequest {
            items: vec![
                CheckoutLine::new(&a.id, &shop.id, 2, 1_000),
                CheckoutLine::new(&b.id, &shop.id, 3, 1_000),
            ],
            customer: payment(5_000, None),
        };
        let err = db.checkout().checkout(&request, Some("u1")).await.unwrap_err();

        match &err {
            DbError::Domain(CoreError::CheckoutLineRejected {
                line,
                product_id,
                reason,
                ..
            }) => {
                assert_eq!(*line, 1);
                assert_eq!(product_id, &b.id);
                assert!(matches!(**reason, CoreError::InsufficientStock { .. }));
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(err.as_domain().and_then(|e| e.shortfall()), Some(2));

        assert_eq!(db.stock().quantity(&a.id).await.unwrap(), 10);
        assert_eq!(db.stock().quantity(&b.id).await.unwrap(), 1);
        assert!(db.sales().list(&SaleFilter::default()).await.unwrap().is_empty());
        assert_eq!(db.carts().list("u1").await.unwrap().total_items, 2);

        let receipts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM receipts")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(receipts, 0);
    }

    #[tokio::test]
    async fn test_receipt_total_matches_lines() {
        let db = test_db().await;
        let (shop, a) = seeded_product(&db, 10).await;
        let b = product_in_shop(&db, &shop, 10).await;

        let request = CheckoutRequest {
            items: vec![
                CheckoutLine::new(&a.id, &shop.id, 3, 1_250),
                CheckoutLine::new(&b.id, &shop.id, 2, 999),
            ],
            customer: payment(5_748, None),
        };
        let outcome = db.checkout().checkout(&request, None).await.unwrap();

        let detail = db.receipts().detail(&outcome.receipt.id).await.unwrap();
        let sum: i64 = detail.sales.iter().map(|s| s.line_total().cents()).sum();
        assert_eq!(sum, detail.receipt.total_amount_cents);
        assert_eq!(detail.sales[0].product_id, a.id);
        assert_eq!(detail.sales[1].product_id, b.id);
    }

    #[tokio::test]
    async fn test_payment_rejected_before_any_write() {
        let db = test_db().await;
        let (shop, product) = seeded_product(&db, 5).await;
        let line = vec![CheckoutLine::new(&product.id, &shop.id, 1, 1_000)];

        for customer in [payment(0, None), payment(1_001, None), payment(500, Some(600))] {
            let request = CheckoutRequest {
                items: line.clone(),
                customer,
            };
            let err = db.checkout().checkout(&request, None).await.unwrap_err();
            assert!(matches!(err, DbError::Domain(CoreError::InvalidPayment { .. })));
        }

        assert_eq!(db.stock().quantity(&product.id).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_malformed_requests() {
        let db = test_db().await;

        let empty = CheckoutRequest {
            items: Vec::new(),
            customer: payment(100, None),
        };
        let err = db.checkout().checkout(&empty, None).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::Required { .. }))
        ));

        let negative_discount = CheckoutRequest {
            items: vec![CheckoutLine::new("p", "s", 1, 100)],
            customer: payment(50, Some(-1)),
        };
        let err = db.checkout().checkout(&negative_discount, None).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_unknown_shop_is_a_line_rejection() {
        let db = test_db().await;
        let (_, product) = seeded_product(&db, 5).await;

        let request = CheckoutRequest {
            items: vec![CheckoutLine::new(&product.id, "nowhere", 1, 100)],
            customer: payment(100, None),
        };
        let err = db.checkout().checkout(&request, None).await.unwrap_err();
        match err {
            DbError::Domain(ref e @ CoreError::CheckoutLineRejected { .. }) => {
                assert!(matches!(e.root(), CoreError::ShopNotFound(_)));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_same_product_on_two_lines_draws_cumulatively() {
        let db = test_db().await;
        let (shop, product) = seeded_product(&db, 5).await;

        let request = CheckoutRequest {
            items: vec![
                CheckoutLine::new(&product.id, &shop.id, 3, 100),
                CheckoutLine::new(&product.id, &shop.id, 3, 100),
            ],
            customer: payment(600, None),
        };
        let err = db.checkout().checkout(&request, None).await.unwrap_err();
        assert_eq!(err.as_domain().and_then(|e| e.shortfall()), Some(1));
        assert_eq!(db.stock().quantity(&product.id).await.unwrap(), 5);
    }
}
