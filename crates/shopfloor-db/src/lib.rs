//! # shopfloor-db: Database Layer for Shopfloor
//!
//! This crate owns every read and write against the SQLite store, and
//! every atomic unit that keeps stock and sales in lockstep.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shopfloor Data Flow                              │
//! │                                                                         │
//! │  HTTP handler (POST /api/sales/checkout)                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   shopfloor-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   CheckoutCoordinator                                          │   │
//! │  │        │  one UnitOfWork (BEGIN IMMEDIATE)                     │   │
//! │  │        ▼                                                        │   │
//! │  │   ReceiptRepository ─► SaleRepository ─► StockLedger          │   │
//! │  │                                              │                  │   │
//! │  │                                              ▼                  │   │
//! │  │                                      stock_movements           │   │
//! │  │        │ after commit                                           │   │
//! │  │        ▼                                                        │   │
//! │  │   CartRepository::clear                                        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`unit_of_work`] - The atomic boundary
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Catalog, stock ledger, cart, sales, receipts, movements
//! - [`checkout`] - Multi-line checkout coordination
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shopfloor_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./shopfloor.db")).await?;
//!
//! let sale = db.sales().record_sale(&new_sale).await?;
//! let cart = db.carts().list("user-1").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod unit_of_work;

// =============================================================================
// Re-exports
// =============================================================================

pub use checkout::CheckoutCoordinator;
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use unit_of_work::UnitOfWork;

// Repository re-exports for convenience
pub use repository::cart::CartRepository;
pub use repository::catalog::CatalogRepository;
pub use repository::movement::MovementRepository;
pub use repository::receipt::ReceiptRepository;
pub use repository::sale::SaleRepository;
pub use repository::stock::{StockCause, StockLedger};

// =============================================================================
// Test Support
// =============================================================================

#[cfg(test)]
pub(crate) mod test_support {
    use shopfloor_core::{NewProduct, Product, Shop};

    use crate::{Database, DbConfig};

    pub async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// A fresh shop holding one product with `quantity` in stock.
    pub async fn seeded_product(db: &Database, quantity: i64) -> (Shop, Product) {
        let shop = db.catalog().insert_shop("Main Street").await.unwrap();
        let product = product_in_shop(db, &shop, quantity).await;
        (shop, product)
    }

    pub async fn product_in_shop(db: &Database, shop: &Shop, quantity: i64) -> Product {
        let brand = db.catalog().insert_brand("Acme Timber").await.unwrap();
        let category = db.catalog().insert_category("Boards").await.unwrap();
        db.catalog()
            .insert_product(&NewProduct {
                name: "Oak plank".to_string(),
                length: 240.0,
                width: 20.0,
                thickness: Some(2.5),
                weight: Some(4.2),
                quantity,
                brand_id: brand.id,
                shop_id: shop.id.clone(),
                category_id: category.id,
            })
            .await
            .unwrap()
    }
}

// =============================================================================
// Integration Tests
// =============================================================================

#[cfg(test)]
mod concurrency_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use shopfloor_core::{CoreError, NewSale};
    use tokio::sync::Barrier;

    use crate::{Database, DbConfig, DbError};

    /// Two concurrent sales of 3 against a stock of 5: exactly one wins.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sales_serialize_on_stock() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(
            DbConfig::new(dir.path().join("race.db"))
                .max_connections(4)
                .busy_timeout(Duration::from_secs(10)),
        )
        .await
        .unwrap();

        let shop = db.catalog().insert_shop("Main").await.unwrap();
        let product = crate::test_support::product_in_shop(&db, &shop, 5).await;

        let barrier = Arc::new(Barrier::new(2));
        let mut handles = Vec::new();
        for _ in 0..2 {
            let db = db.clone();
            let barrier = barrier.clone();
            let sale = NewSale {
                product_id: product.id.clone(),
                shop_id: shop.id.clone(),
                quantity_sold: 3,
                unit_price_cents: Some(100),
            };
            handles.push(tokio::spawn(async move {
                barrier.wait().await;
                db.sales().record_sale(&sale).await
            }));
        }

        let mut ok = 0;
        let mut short = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(DbError::Domain(CoreError::InsufficientStock { available, .. })) => {
                    assert_eq!(available, 2);
                    short += 1;
                }
                Err(other) => panic!("unexpected: {:?}", other),
            }
        }

        assert_eq!((ok, short), (1, 1));
        assert_eq!(db.stock().quantity(&product.id).await.unwrap(), 2);
        db.close().await;
    }
}
