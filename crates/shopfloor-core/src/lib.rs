//! # shopfloor-core: Pure Business Logic for Shopfloor
//!
//! This crate holds the rules of the sale-transaction subsystem as pure
//! functions and plain data types. It never touches the database.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shopfloor Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    HTTP API (apps/api)                          │   │
//! │  │    GET/POST/PUT/DELETE cart, sales, sales/checkout              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ shopfloor-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  payment  │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │  Split    │  │   rules   │  │   │
//! │  │   │  Sale     │  │           │  │  Totals   │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  shopfloor-db (Database Layer)                  │   │
//! │  │     Stock ledger, cart store, sale recorder, checkout           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, CartEntry, Sale, Receipt, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`payment`] - Checkout totals and the paid/discount/rest split
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation run before any store access
//!
//! ## Example Usage
//!
//! ```rust
//! use shopfloor_core::money::Money;
//! use shopfloor_core::payment::PaymentSplit;
//!
//! let total = Money::from_cents(50_000);
//! let split = PaymentSplit::compute(total, Money::from_cents(40_000), Some(Money::from_cents(5_000)))
//!     .unwrap();
//!
//! assert_eq!(split.rest_amount(), Some(Money::from_cents(5_000)));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod payment;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use payment::{CheckoutLine, PaymentSplit};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of lines accepted in a single checkout.
///
/// ## Business Reason
/// One receipt is one customer at the counter; a runaway payload with
/// thousands of lines is a client bug, not a sale.
pub const MAX_CHECKOUT_LINES: usize = 100;

/// Default page size for sale listings.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: u32 = 500;
