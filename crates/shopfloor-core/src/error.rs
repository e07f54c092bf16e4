//! # Error Types
//!
//! Domain-specific error types for shopfloor-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  shopfloor-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule violations (404/400 family)      │
//! │  └── ValidationError  - Malformed input, caught before store access    │
//! │                                                                         │
//! │  shopfloor-db errors (separate crate)                                  │
//! │  └── DbError          - Store failures, wraps CoreError                │
//! │                                                                         │
//! │  HTTP errors (apps/api)                                                │
//! │  └── ApiError         - What clients see (status + code + message)     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No variant here ever implies a side effect: whenever one of these is
//! returned from inside an atomic unit, that unit is rolled back.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product id doesn't exist in the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Shop id doesn't exist in the shop directory.
    #[error("Shop not found: {0}")]
    ShopNotFound(String),

    /// No cart entry with this id belongs to the requesting user.
    #[error("Cart entry not found: {0}")]
    CartEntryNotFound(String),

    /// Sale id doesn't exist (or was already deleted).
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Receipt id doesn't exist.
    #[error("Receipt not found: {0}")]
    ReceiptNotFound(String),

    /// Not enough stock to satisfy the request.
    ///
    /// ## User Workflow
    /// ```text
    /// Add to Cart (qty: 5)
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { product_id, available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// UI shows: "Only 3 in stock (short by 2)"
    /// ```
    #[error("Insufficient stock for {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// Payment fields don't form a valid split of the receipt total.
    #[error("Invalid payment: {reason}")]
    InvalidPayment { reason: String },

    /// One checkout line failed; the whole checkout was rolled back.
    ///
    /// `line` is zero-based, in request order.
    #[error("Checkout line {line} (product {product_id}, shop {shop_id}) rejected: {reason}")]
    CheckoutLineRejected {
        line: usize,
        product_id: String,
        shop_id: String,
        reason: Box<CoreError>,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an InsufficientStock error.
    pub fn insufficient_stock(product_id: impl Into<String>, available: i64, requested: i64) -> Self {
        CoreError::InsufficientStock {
            product_id: product_id.into(),
            available,
            requested,
        }
    }

    /// Creates an InvalidPayment error.
    pub fn invalid_payment(reason: impl Into<String>) -> Self {
        CoreError::InvalidPayment {
            reason: reason.into(),
        }
    }

    /// Returns the innermost error, looking through checkout line wrappers.
    ///
    /// The HTTP layer uses this to pick a status code: a rejected line is
    /// reported with the status of whatever rejected it.
    pub fn root(&self) -> &CoreError {
        match self {
            CoreError::CheckoutLineRejected { reason, .. } => reason.root(),
            other => other,
        }
    }

    /// How many units short the request was, for stock failures.
    pub fn shortfall(&self) -> Option<i64> {
        match self.root() {
            CoreError::InsufficientStock {
                available,
                requested,
                ..
            } => Some(requested - available),
            _ => None,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when input doesn't have the right shape. They are raised
/// before any store access.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::insufficient_stock("p-1", 3, 5);
        assert_eq!(
            err.to_string(),
            "Insufficient stock for p-1: available 3, requested 5"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "product_id".to_string(),
        };
        assert_eq!(err.to_string(), "product_id is required");

        let err = ValidationError::MustNotBeNegative {
            field: "unit_price".to_string(),
        };
        assert_eq!(err.to_string(), "unit_price must not be negative");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "shop_id".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }

    #[test]
    fn test_line_rejection_exposes_root_and_shortfall() {
        let err = CoreError::CheckoutLineRejected {
            line: 1,
            product_id: "p-2".to_string(),
            shop_id: "s-1".to_string(),
            reason: Box::new(CoreError::insufficient_stock("p-2", 1, 4)),
        };

        assert!(matches!(err.root(), CoreError::InsufficientStock { .. }));
        assert_eq!(err.shortfall(), Some(3));
        assert!(err.to_string().starts_with("Checkout line 1 (product p-2, shop s-1) rejected"));
    }

    #[test]
    fn test_shortfall_is_none_for_other_errors() {
        let err = CoreError::ShopNotFound("s-9".to_string());
        assert_eq!(err.shortfall(), None);
    }
}
