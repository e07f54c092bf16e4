//! # Domain Types
//!
//! Core domain types used throughout Shopfloor.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │   CartEntry     │   │    Receipt      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  user_id        │   │  total_amount   │       │
//! │  │  dimensions     │   │  product_id     │   │  customer_paid  │       │
//! │  │  quantity ≥ 0   │   │  quantity ≥ 1   │   │  discount/rest  │       │
//! │  │  shop/brand/cat │   │  (not reserved) │   │  owns 1..N Sale │       │
//! │  └────────┬────────┘   └─────────────────┘   └────────┬────────┘       │
//! │           │                                           │                 │
//! │           │            ┌─────────────────┐            │                 │
//! │           └───────────►│      Sale       │◄───────────┘                 │
//! │                        │  ─────────────  │                              │
//! │                        │  quantity_sold  │                              │
//! │                        │  unit_price     │                              │
//! │                        │  receipt_id?    │                              │
//! │                        └────────┬────────┘                              │
//! │                                 │                                       │
//! │                        ┌────────▼────────┐                              │
//! │                        │ StockMovement   │  append-only audit           │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Money columns carry a `_cents` suffix and are exposed as [`Money`]
//! through accessor methods.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::payment::CheckoutLine;
use crate::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

// =============================================================================
// Directories
// =============================================================================

/// A physical shop. Products are stocked per shop and sales are booked
/// against one.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Shop {
    pub id: String,
    pub name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Brand {
    pub id: String,
    pub name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A stocked product.
///
/// `quantity` is the authoritative stock level. Only the stock ledger
/// writes it, and it never goes below zero.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown in the cart and on receipts.
    pub name: String,

    pub length: f64,
    pub width: f64,
    pub thickness: Option<f64>,
    pub weight: Option<f64>,

    /// Units on hand.
    pub quantity: i64,

    pub brand_id: String,
    pub shop_id: String,
    pub category_id: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Checks whether `requested` units can be taken from stock right now.
    #[inline]
    pub fn can_supply(&self, requested: i64) -> bool {
        self.quantity >= requested
    }
}

/// Fields for inserting a catalog product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    pub length: f64,
    pub width: f64,
    #[serde(default)]
    pub thickness: Option<f64>,
    #[serde(default)]
    pub weight: Option<f64>,
    pub quantity: i64,
    pub brand_id: String,
    pub shop_id: String,
    pub category_id: String,
}

// =============================================================================
// Cart
// =============================================================================

/// One product in a user's cart.
///
/// A cart entry is a wish, not a reservation: stock is checked when the
/// entry is written, and again (authoritatively) at checkout.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CartEntry {
    pub id: String,
    pub user_id: String,
    pub product_id: String,
    pub quantity: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A cart entry joined with a live snapshot of its product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CartLine {
    pub id: String,
    pub product_id: String,
    pub quantity: i64,
    pub product_name: String,
    pub length: f64,
    pub width: f64,
    pub thickness: Option<f64>,
    pub weight: Option<f64>,
    pub brand_name: String,
    pub shop_id: String,
    pub shop_name: String,
    pub category_name: String,
    /// Live stock of the product at read time.
    pub max_stock: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A user's whole cart with summary counts.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartView {
    pub items: Vec<CartLine>,
    /// Sum of all entry quantities.
    pub total_items: i64,
    /// Number of distinct products.
    pub unique_products: i64,
}

impl CartView {
    /// Builds the view and its summary from the joined lines.
    pub fn from_lines(items: Vec<CartLine>) -> Self {
        let total_items = items.iter().map(|l| l.quantity).sum();
        let unique_products = items.len() as i64;
        CartView {
            items,
            total_items,
            unique_products,
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    BankTransfer,
    MobileMoney,
    Other,
}

impl PaymentMethod {
    /// All accepted values, in their wire spelling.
    pub const ALL: [PaymentMethod; 5] = [
        PaymentMethod::Cash,
        PaymentMethod::Card,
        PaymentMethod::BankTransfer,
        PaymentMethod::MobileMoney,
        PaymentMethod::Other,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::MobileMoney => "mobile_money",
            PaymentMethod::Other => "other",
        }
    }
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "payment_method".to_string(),
                allowed: PaymentMethod::ALL.iter().map(|m| m.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// Sale
// =============================================================================

/// One sold line: a product, the shop it was sold from, how many and at
/// what unit price.
///
/// ## Lifecycle
/// ```text
/// nonexistent ──create──► active ──update──► active ──delete──► gone
///                 │                  │                   │
///            stock -= qty      stock -= diff        stock += qty
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub product_id: String,
    pub shop_id: String,
    pub quantity_sold: i64,
    /// Unit price in cents; a sale may be recorded without one.
    pub unit_price_cents: Option<i64>,
    /// Receipt this line belongs to, if it came from a checkout.
    pub receipt_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the unit price as Money, if one was recorded.
    #[inline]
    pub fn unit_price(&self) -> Option<Money> {
        self.unit_price_cents.map(Money::from_cents)
    }

    /// `quantity_sold × unit_price`, treating a missing price as zero.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price().unwrap_or_default() * self.quantity_sold
    }
}

/// Fields for recording a standalone sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSale {
    pub product_id: String,
    pub shop_id: String,
    pub quantity_sold: i64,
    #[serde(default, alias = "unit_price")]
    pub unit_price_cents: Option<i64>,
}

/// Changes to an existing sale. `None` leaves a field as it is.
///
/// The product of a sale is fixed once recorded.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleUpdate {
    #[serde(default)]
    pub quantity_sold: Option<i64>,
    #[serde(default, alias = "unit_price")]
    pub unit_price_cents: Option<i64>,
    #[serde(default)]
    pub shop_id: Option<String>,
}

impl SaleUpdate {
    /// Update that only changes the quantity.
    pub fn quantity(quantity_sold: i64) -> Self {
        SaleUpdate {
            quantity_sold: Some(quantity_sold),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.quantity_sold.is_none() && self.unit_price_cents.is_none() && self.shop_id.is_none()
    }
}

/// Filter and paging for sale listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleFilter {
    #[serde(default)]
    pub shop_id: Option<String>,
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub receipt_id: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
}

impl SaleFilter {
    /// Effective page size, clamped to `1..=MAX_PAGE_SIZE`.
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> u32 {
        self.offset.unwrap_or(0)
    }
}

// =============================================================================
// Receipt
// =============================================================================

/// The payment record of one checkout (one customer, 1..N sale lines).
///
/// ## Balance Rule
/// ```text
/// customer_paid + (discount ?? 0) + (rest ?? 0) == total_amount
/// ```
/// Discount and rest are NULL when they would be zero.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Receipt {
    pub id: String,
    pub total_amount_cents: i64,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub payment_method: PaymentMethod,
    #[ts(as = "String")]
    pub sale_date: DateTime<Utc>,
    pub customer_paid_cents: i64,
    pub discount_amount_cents: Option<i64>,
    pub rest_amount_cents: Option<i64>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Receipt {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }

    #[inline]
    pub fn customer_paid(&self) -> Money {
        Money::from_cents(self.customer_paid_cents)
    }

    #[inline]
    pub fn discount(&self) -> Option<Money> {
        self.discount_amount_cents.map(Money::from_cents)
    }

    #[inline]
    pub fn rest(&self) -> Option<Money> {
        self.rest_amount_cents.map(Money::from_cents)
    }

    /// Checks the balance rule.
    pub fn is_balanced(&self) -> bool {
        self.customer_paid() + self.discount().unwrap_or_default() + self.rest().unwrap_or_default()
            == self.total()
    }
}

/// A receipt together with the sale lines that still reference it.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReceiptDetail {
    pub receipt: Receipt,
    pub sales: Vec<Sale>,
}

// =============================================================================
// Checkout
// =============================================================================

/// Customer and payment part of a checkout request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutPayment {
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    /// Defaults to the commit time.
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub sale_date: Option<DateTime<Utc>>,
    #[serde(alias = "customer_paid")]
    pub customer_paid_cents: i64,
    #[serde(default, alias = "discount_amount")]
    pub discount_amount_cents: Option<i64>,
}

/// A whole checkout: ordered lines plus payment.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutRequest {
    pub items: Vec<CheckoutLine>,
    pub customer: CheckoutPayment,
}

/// What a committed checkout produced.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutOutcome {
    pub receipt: Receipt,
    /// Created lines, in request order.
    pub sales: Vec<Sale>,
    /// False when the post-commit cart clear failed or no user was given.
    pub cart_cleared: bool,
}

// =============================================================================
// Stock Movements
// =============================================================================

/// Why stock moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MovementReason {
    SaleCreated,
    SaleUpdated,
    SaleDeleted,
}

/// One append-only record of a stock change.
///
/// `delta` is signed from the product's point of view: a sale of 3 is
/// recorded as `-3`, its deletion as `+3`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockMovement {
    pub id: String,
    pub product_id: String,
    pub sale_id: Option<String>,
    pub delta: i64,
    pub reason: MovementReason,
    /// Product quantity right after this movement.
    pub quantity_after: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
