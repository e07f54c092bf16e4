//! # Repository Module
//!
//! Database repository implementations for Shopfloor.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.sales().record_sale(&new_sale)                             │
//! │       ▼                                                                 │
//! │  SaleRepository ──────► StockLedger ──────► movement::append           │
//! │  ├── create_sale(uow, ..)        ├── reserve_and_decrement(uow, ..)    │
//! │  ├── update_sale(uow, ..)        ├── restore(uow, ..)                  │
//! │  └── delete_sale(uow, ..)        └── delta(uow, ..)                    │
//! │       │                                                                 │
//! │       │  SQL on the unit's connection                                  │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Repositories hold a pool handle; anything that must be atomic with    │
//! │  other writes takes a `&mut UnitOfWork` instead of using the pool.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CatalogRepository`](catalog::CatalogRepository) - Shops, brands, categories, products
//! - [`StockLedger`](stock::StockLedger) - The only writer of product stock
//! - [`CartRepository`](cart::CartRepository) - Per-user carts
//! - [`SaleRepository`](sale::SaleRepository) - Sale lines (the sale recorder)
//! - [`ReceiptRepository`](receipt::ReceiptRepository) - Checkout receipts
//! - [`MovementRepository`](movement::MovementRepository) - Stock movement history

pub mod cart;
pub mod catalog;
pub mod movement;
pub mod receipt;
pub mod sale;
pub mod stock;
