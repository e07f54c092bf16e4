//! # Payment Split
//!
//! Server-side checkout totals and the paid / discount / rest split.
//!
//! ## Split Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     PaymentSplit::compute                               │
//! │                                                                         │
//! │  total = Σ(quantity × unit_price)      ← never taken from the client   │
//! │                                                                         │
//! │  paid ≤ 0 or paid > total ──────────────────────► InvalidPayment       │
//! │                                                                         │
//! │  paid == total ─────► discount = 0, rest = 0   (provided discount is   │
//! │                                                 ignored)               │
//! │                                                                         │
//! │  paid <  total ─────► discount > total - paid ──► InvalidPayment       │
//! │                       discount = provided ?? 0                         │
//! │                       rest     = total - paid - discount               │
//! │                                                                         │
//! │  Always: paid + discount + rest == total                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust
//! use shopfloor_core::money::Money;
//! use shopfloor_core::payment::PaymentSplit;
//!
//! // Full payment: nothing left over.
//! let split = PaymentSplit::compute(Money::from_cents(500), Money::from_cents(500), None).unwrap();
//! assert_eq!(split.discount_amount(), None);
//! assert_eq!(split.rest_amount(), None);
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;

// =============================================================================
// Checkout Line
// =============================================================================

/// One requested line of a checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutLine {
    pub product_id: String,
    pub shop_id: String,
    pub quantity: i64,
    #[serde(alias = "unit_price")]
    pub unit_price_cents: i64,
}

impl CheckoutLine {
    pub fn new(
        product_id: impl Into<String>,
        shop_id: impl Into<String>,
        quantity: i64,
        unit_price_cents: i64,
    ) -> Self {
        CheckoutLine {
            product_id: product_id.into(),
            shop_id: shop_id.into(),
            quantity,
            unit_price_cents,
        }
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// `quantity × unit_price`, `None` on overflow.
    #[inline]
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price().checked_line_total(self.quantity)
    }
}

/// Sums `quantity × unit_price` over all lines.
///
/// Overflow is reported as a validation error rather than wrapping.
pub fn grand_total(lines: &[CheckoutLine]) -> CoreResult<Money> {
    lines.iter().try_fold(Money::zero(), |acc, line| {
        line.line_total()
            .and_then(|lt| acc.checked_add(lt))
            .ok_or_else(|| {
                ValidationError::OutOfRange {
                    field: "total_amount".to_string(),
                    min: 0,
                    max: i64::MAX,
                }
                .into()
            })
    })
}

// =============================================================================
// Payment Split
// =============================================================================

/// A validated division of a total into paid, discount and rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentSplit {
    total: Money,
    customer_paid: Money,
    discount: Money,
    rest: Money,
}

impl PaymentSplit {
    /// Validates a payment against `total` and derives discount and rest.
    ///
    /// ## User Workflow
    /// ```text
    /// Cashier enters: paid 400.00, discount 50.00 (total 500.00)
    ///      │
    ///      ▼
    /// compute() ← THIS FUNCTION
    ///      │
    ///      ▼
    /// Receipt: paid 400.00 · discount 50.00 · rest 50.00
    /// ```
    pub fn compute(total: Money, customer_paid: Money, discount: Option<Money>) -> CoreResult<Self> {
        if let Some(d) = discount {
            if d.is_negative() {
                return Err(ValidationError::MustNotBeNegative {
                    field: "discount_amount".to_string(),
                }
                .into());
            }
        }

        if !customer_paid.is_positive() {
            return Err(CoreError::invalid_payment("customer_paid must be greater than zero"));
        }

        if customer_paid > total {
            return Err(CoreError::invalid_payment(format!(
                "customer_paid {} exceeds total {}",
                customer_paid, total
            )));
        }

        if customer_paid == total {
            return Ok(PaymentSplit {
                total,
                customer_paid,
                discount: Money::zero(),
                rest: Money::zero(),
            });
        }

        let outstanding = total - customer_paid;
        let discount = discount.unwrap_or_default();
        if discount > outstanding {
            return Err(CoreError::invalid_payment(format!(
                "discount {} exceeds outstanding amount {}",
                discount, outstanding
            )));
        }

        Ok(PaymentSplit {
            total,
            customer_paid,
            discount,
            rest: outstanding - discount,
        })
    }

    /// Re-splits an existing payment over a corrected total. Never fails.
    ///
    /// The payment already happened, so instead of rejecting a total that no
    /// longer fits, the split is brought back into balance:
    /// - `customer_paid` is capped at the new total (the excess is owed back)
    /// - the discount is capped at what is still outstanding
    /// - the rest absorbs the remainder
    ///
    /// ```text
    /// total 500  paid 400  discount 50  rest 50
    ///   line +1 × 100 ──► total 600  paid 400  discount 50  rest 150
    ///   line -2 × 100 ──► total 300  paid 300  discount -   rest -
    /// ```
    pub fn rebalance(total: Money, customer_paid: Money, discount: Option<Money>) -> Self {
        let total = total.max(Money::zero());
        let customer_paid = customer_paid.max(Money::zero()).min(total);
        let outstanding = total - customer_paid;
        let discount = discount.unwrap_or_default().max(Money::zero()).min(outstanding);

        PaymentSplit {
            total,
            customer_paid,
            discount,
            rest: outstanding - discount,
        }
    }

    /// What the customer paid beyond `total`, if anything.
    pub fn overpaid(total: Money, customer_paid: Money) -> Option<Money> {
        (customer_paid > total).then(|| customer_paid - total.max(Money::zero()))
    }

    #[inline]
    pub fn total(&self) -> Money {
        self.total
    }

    #[inline]
    pub fn customer_paid(&self) -> Money {
        self.customer_paid
    }

    /// Discount as stored on the receipt (`None` when zero).
    #[inline]
    pub fn discount_amount(&self) -> Option<Money> {
        self.discount.non_zero()
    }

    /// Unpaid remainder as stored on the receipt (`None` when zero).
    #[inline]
    pub fn rest_amount(&self) -> Option<Money> {
        self.rest.non_zero()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
