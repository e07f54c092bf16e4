//! # Validation Module
//!
//! Input validation utilities for Shopfloor.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP extractors (apps/api)                                   │
//! │  ├── JSON shape, types (deserialization)                               │
//! │  └── x-user-id header present                                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Quantities ≥ 1, prices ≥ 0, ids present                           │
//! │  └── Checkout line count and per-line rules                            │
//! │           │        (runs BEFORE any store access)                      │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (quantity >= 0)                                             │
//! │  ├── UNIQUE (user_id, product_id)                                      │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shopfloor_core::validation::{validate_id, validate_quantity};
//!
//! validate_id("product_id", "550e8400-e29b-41d4-a716-446655440000").unwrap();
//! validate_quantity("quantity", 5).unwrap();
//! assert!(validate_quantity("quantity", 0).is_err());
//! ```

use crate::error::ValidationError;
use crate::payment::CheckoutLine;
use crate::types::{NewProduct, NewSale, SaleUpdate};
use crate::MAX_CHECKOUT_LINES;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest identifier accepted (a hyphenated UUID is 36).
pub const MAX_ID_LEN: usize = 64;

/// Longest display name accepted for products, shops, brands and categories.
pub const MAX_NAME_LEN: usize = 200;

// =============================================================================
// String Validators
// =============================================================================

/// Validates an entity identifier.
///
/// Ids are opaque strings here; an id that is well-formed but unknown is
/// a not-found error from the store, not a validation error.
///
/// ```rust
/// use shopfloor_core::validation::validate_id;
///
/// assert!(validate_id("sale_id", "abc").is_ok());
/// assert!(validate_id("sale_id", "   ").is_err());
/// ```
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if id.len() > MAX_ID_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_ID_LEN,
        });
    }

    Ok(())
}

/// Validates a display name.
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - No upper bound: stock decides how much can actually be sold
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Cart: Add Item                                                         │
/// │                                                                         │
/// │  User enters quantity: 5                                               │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity("quantity", 5) ← THIS FUNCTION                      │
/// │       │                                                                 │
/// │       ├── qty <= 0? → Error: "quantity must be positive"               │
/// │       │                                                                 │
/// │       └── OK → Proceed to the stock check                              │
/// │                                                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(field: &str, qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a price in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free items)
///
/// ## Example
/// ```rust
/// use shopfloor_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents("unit_price", 1099).is_ok());
/// assert!(validate_price_cents("unit_price", 0).is_ok());
/// assert!(validate_price_cents("unit_price", -100).is_err());
/// ```
pub fn validate_price_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates an optional discount in cents.
pub fn validate_discount_cents(cents: Option<i64>) -> ValidationResult<()> {
    match cents {
        Some(c) => validate_price_cents("discount_amount", c),
        None => Ok(()),
    }
}

/// Validates a physical dimension (length, width, thickness, weight).
fn validate_dimension(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a finite number".to_string(),
        });
    }

    if value < 0.0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Request Validators
// =============================================================================

/// Validates a standalone sale before it touches the store.
pub fn validate_new_sale(sale: &NewSale) -> ValidationResult<()> {
    validate_id("product_id", &sale.product_id)?;
    validate_id("shop_id", &sale.shop_id)?;
    validate_quantity("quantity_sold", sale.quantity_sold)?;
    if let Some(price) = sale.unit_price_cents {
        validate_price_cents("unit_price", price)?;
    }
    Ok(())
}

/// Validates the fields present in a sale update.
pub fn validate_sale_update(update: &SaleUpdate) -> ValidationResult<()> {
    if let Some(qty) = update.quantity_sold {
        validate_quantity("quantity_sold", qty)?;
    }
    if let Some(price) = update.unit_price_cents {
        validate_price_cents("unit_price", price)?;
    }
    if let Some(shop_id) = &update.shop_id {
        validate_id("shop_id", shop_id)?;
    }
    Ok(())
}

/// Validates a catalog product before insert.
pub fn validate_new_product(product: &NewProduct) -> ValidationResult<()> {
    validate_name("name", &product.name)?;
    validate_dimension("length", product.length)?;
    validate_dimension("width", product.width)?;
    if let Some(t) = product.thickness {
        validate_dimension("thickness", t)?;
    }
    if let Some(w) = product.weight {
        validate_dimension("weight", w)?;
    }
    if product.quantity < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "quantity".to_string(),
        });
    }
    validate_id("brand_id", &product.brand_id)?;
    validate_id("shop_id", &product.shop_id)?;
    validate_id("category_id", &product.category_id)?;
    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the line list of a checkout.
///
/// ## Rules
/// - At least one line, at most `MAX_CHECKOUT_LINES`
/// - Every line: ids present, quantity ≥ 1, unit price ≥ 0
///
/// Per-line failures name the offending line, e.g. `items[2].quantity`.
pub fn validate_checkout_lines(lines: &[CheckoutLine]) -> ValidationResult<()> {
    if lines.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    if lines.len() > MAX_CHECKOUT_LINES {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_CHECKOUT_LINES as i64,
        });
    }

    for (i, line) in lines.iter().enumerate() {
        validate_id(&format!("items[{}].product_id", i), &line.product_id)?;
        validate_id(&format!("items[{}].shop_id", i), &line.shop_id)?;
        validate_quantity(&format!("items[{}].quantity", i), line.quantity)?;
        validate_price_cents(&format!("items[{}].unit_price", i), line.unit_price_cents)?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id() {
        assert!(validate_id("id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_id("id", "").is_err());
        assert!(validate_id("id", &"x".repeat(MAX_ID_LEN + 1)).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Oak plank 2m").is_ok());
        assert!(validate_name("name", "  ").is_err());
        assert!(validate_name("name", &"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity("quantity", 1).is_ok());
        assert!(validate_quantity("quantity", 100_000).is_ok());

        assert!(validate_quantity("quantity", 0).is_err());
        assert!(validate_quantity("quantity", -1).is_err());
    }

    #[test]
    fn test_validate_discount() {
        assert!(validate_discount_cents(None).is_ok());
        assert!(validate_discount_cents(Some(0)).is_ok());
        assert!(validate_discount_cents(Some(-5)).is_err());
    }

    #[test]
    fn test_validate_new_sale() {
        let mut sale = NewSale {
            product_id: "p".to_string(),
            shop_id: "s".to_string(),
            quantity_sold: 2,
            unit_price_cents: None,
        };
        assert!(validate_new_sale(&sale).is_ok());

        sale.unit_price_cents = Some(-1);
        assert!(validate_new_sale(&sale).is_err());

        sale.unit_price_cents = Some(0);
        sale.quantity_sold = 0;
        assert!(validate_new_sale(&sale).is_err());
    }

    #[test]
    fn test_validate_sale_update_checks_only_present_fields() {
        assert!(validate_sale_update(&SaleUpdate::default()).is_ok());
        assert!(validate_sale_update(&SaleUpdate::quantity(0)).is_err());
        assert!(validate_sale_update(&SaleUpdate {
            shop_id: Some(String::new()),
            ..Default::default()
        })
        .is_err());
    }

    #[test]
    fn test_validate_checkout_lines() {
        assert!(matches!(
            validate_checkout_lines(&[]),
            Err(ValidationError::Required { .. })
        ));

        let ok = vec![CheckoutLine::new("p", "s", 1, 0)];
        assert!(validate_checkout_lines(&ok).is_ok());

        let too_many = vec![CheckoutLine::new("p", "s", 1, 100); MAX_CHECKOUT_LINES + 1];
        assert!(matches!(
            validate_checkout_lines(&too_many),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_checkout_line_errors_name_the_line() {
        let lines = vec![
            CheckoutLine::new("p1", "s", 1, 100),
            CheckoutLine::new("p2", "s", 0, 100),
        ];
        match validate_checkout_lines(&lines) {
            Err(ValidationError::MustBePositive { field }) => assert_eq!(field, "items[1].quantity"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_validate_new_product() {
        let mut product = NewProduct {
            name: "Oak plank".to_string(),
            length: 200.0,
            width: 20.0,
            thickness: Some(2.5),
            weight: None,
            quantity: 10,
            brand_id: "b".to_string(),
            shop_id: "s".to_string(),
            category_id: "c".to_string(),
        };
        assert!(validate_new_product(&product).is_ok());

        product.quantity = -1;
        assert!(validate_new_product(&product).is_err());

        product.quantity = 0;
        product.width = f64::NAN;
        assert!(validate_new_product(&product).is_err());
    }
}
