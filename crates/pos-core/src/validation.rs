//! # Validation Module
//!
//! Fail-fast input validation for the sale workflows.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP layer (out of scope)                                    │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── Auth and permission checks                                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - before any transaction opens                   │
//! │  ├── Required fields, positive quantities, rate ranges                 │
//! │  └── Failure here leaves zero partial state                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / UNIQUE / foreign key constraints                       │
//! │  └── CHECK (stock >= 0) as the last line of defense                    │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Business-rule checks (item exists, stock suffices, sale status allows
//! cancellation) are NOT here - those need the database and live inside
//! the transaction.

use crate::error::ValidationError;
use crate::money::MAX_RATE_BPS;
use crate::types::CreateSaleRequest;
use crate::{MAX_LINE_QUANTITY, MAX_SALE_LINES};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates that an identifier field is present and non-empty.
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price or amount in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free items, unpaid sales)
pub fn validate_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a tax or discount rate in basis points (0% to 100%).
pub fn validate_rate_bps(field: &str, bps: u32) -> ValidationResult<()> {
    if bps > MAX_RATE_BPS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_RATE_BPS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Request Validators
// =============================================================================

/// Validates a complete create-sale request.
///
/// Runs before the transaction opens; any failure here is reported
/// immediately with zero partial state. Lines are checked in caller order
/// so the first offending line determines the error.
pub fn validate_create_sale(req: &CreateSaleRequest) -> ValidationResult<()> {
    validate_id("store_id", &req.store_id)?;

    if req.items.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    if req.items.len() > MAX_SALE_LINES {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_SALE_LINES as i64,
        });
    }

    for item in &req.items {
        validate_id("inventory_id", &item.inventory_id)?;
        validate_quantity(item.quantity)?;

        if let Some(price) = item.unit_price_cents {
            validate_cents("unit_price", price)?;
        }
        if let Some(bps) = item.tax_rate_bps {
            validate_rate_bps("tax_percentage", bps)?;
        }
        if let Some(bps) = item.discount_bps {
            validate_rate_bps("discount_percentage", bps)?;
        }
    }

    validate_cents("amount_paid", req.amount_paid_cents)?;

    if let Some(discount) = req.discount_cents {
        validate_cents("discount_amount", discount)?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SaleLineRequest;

    fn request_with_one_line() -> CreateSaleRequest {
        CreateSaleRequest {
            store_id: "store-1".to_string(),
            customer_id: None,
            items: vec![SaleLineRequest {
                inventory_id: "item-1".to_string(),
                quantity: 2,
                unit_price_cents: None,
                tax_rate_bps: None,
                discount_bps: None,
            }],
            payment_method: None,
            payment_status: None,
            amount_paid_cents: 0,
            discount_cents: None,
            notes: None,
        }
    }

    #[test]
    fn test_valid_request_passes() {
        assert!(validate_create_sale(&request_with_one_line()).is_ok());
    }

    #[test]
    fn test_missing_store_rejected() {
        let mut req = request_with_one_line();
        req.store_id = "  ".to_string();
        assert!(validate_create_sale(&req).is_err());
    }

    #[test]
    fn test_empty_items_rejected() {
        let mut req = request_with_one_line();
        req.items.clear();
        assert!(validate_create_sale(&req).is_err());
    }

    #[test]
    fn test_non_positive_quantity_rejected() {
        let mut req = request_with_one_line();
        req.items[0].quantity = 0;
        assert!(validate_create_sale(&req).is_err());

        req.items[0].quantity = -3;
        assert!(validate_create_sale(&req).is_err());
    }

    #[test]
    fn test_negative_price_rejected() {
        let mut req = request_with_one_line();
        req.items[0].unit_price_cents = Some(-1);
        assert!(validate_create_sale(&req).is_err());
    }

    #[test]
    fn test_negative_amount_paid_rejected() {
        let mut req = request_with_one_line();
        req.amount_paid_cents = -100;
        assert!(validate_create_sale(&req).is_err());
    }

    #[test]
    fn test_rate_above_hundred_percent_rejected() {
        let mut req = request_with_one_line();
        req.items[0].tax_rate_bps = Some(10_001);
        assert!(validate_create_sale(&req).is_err());

        let mut req = request_with_one_line();
        req.items[0].discount_bps = Some(20_000);
        assert!(validate_create_sale(&req).is_err());
    }

    #[test]
    fn test_quantity_bounds() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_LINE_QUANTITY).is_ok());
        assert!(validate_quantity(MAX_LINE_QUANTITY + 1).is_err());
    }
}
