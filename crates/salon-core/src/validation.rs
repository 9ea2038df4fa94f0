//! # Validation Module
//!
//! Input validation utilities for Salon Stock.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler (axum)                                          │
//! │  ├── Type validation (JSON deserialization)                            │
//! │  └── Shape conversion (major units → Money, strings → Channel)         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Business rules (name length, quantity range, thresholds)          │
//! │  └── Runs before any storage access                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints (product_quantity > 0)                          │
//! │  ├── UNIQUE(name, channel) on categories                               │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use salon_core::validation::{validate_quantity, validate_user_id};
//!
//! validate_user_id("u1").unwrap();
//! validate_quantity(5).unwrap();
//! assert!(validate_quantity(0).is_err());
//! ```

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{Channel, NewProduct, NewSale};
use crate::{MAX_ITEM_QUANTITY, MAX_NAME_LENGTH, MAX_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

fn validate_name(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(())
}

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 191 characters
///
/// ## Example
/// ```rust
/// use salon_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Argan Oil Shampoo").is_ok());
/// assert!(validate_product_name("   ").is_err());
/// assert!(validate_product_name(&"x".repeat(192)).is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_name("name", name)
}

/// Validates a category name. Same rules as product names.
pub fn validate_category_name(name: &str) -> ValidationResult<()> {
    validate_name("categories", name)
}

/// Validates the id of the user recording a sale.
pub fn validate_user_id(user_id: &str) -> ValidationResult<()> {
    if user_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "user_id".to_string(),
        });
    }
    Ok(())
}

/// Validates that an entity id is present.
///
/// Ids are opaque strings; no UUID format is enforced so that externally
/// supplied ids keep working.
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line-item quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (9999)
///
/// ## Sale Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  POST /sales  { products: [{ id: "p1", quantity: 3 }] }                 │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(3) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty <= 0?    → 400 "quantity must be positive"                │
/// │       ├── qty > 9999?  → 400 "quantity must be between 1 and 9999"      │
/// │       └── OK → sale transaction                                        │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a unit price.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_PRICE_CENTS (1,000,000.00)
///
/// ## Example
/// ```rust
/// use salon_core::{money::Money, validation::validate_price};
///
/// assert!(validate_price(Money::from_cents(1099)).is_ok());
/// assert!(validate_price(Money::zero()).is_err());
/// assert!(validate_price(Money::from_major(1e16).unwrap()).is_err());
/// ```
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if !price.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "price".to_string(),
        });
    }

    if price.cents() > MAX_PRICE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 1,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates stock and its thresholds.
///
/// ## Rules
/// - `stock`, `min_stock`, `max_stock` are non-negative
/// - `min_stock <= max_stock`
pub fn validate_stock_levels(stock: i64, min_stock: i64, max_stock: i64) -> ValidationResult<()> {
    for (field, value) in [("stock", stock), ("min_stock", min_stock), ("max_stock", max_stock)] {
        if value < 0 {
            return Err(ValidationError::OutOfRange {
                field: field.to_string(),
                min: 0,
                max: i64::MAX,
            });
        }
    }

    if min_stock > max_stock {
        return Err(ValidationError::Exceeds {
            field: "min_stock".to_string(),
            other: "max_stock".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Aggregate Validators
// =============================================================================

/// Validates a product create/update payload.
pub fn validate_product(input: &NewProduct) -> ValidationResult<()> {
    validate_product_name(&input.name)?;
    validate_price(input.price)?;
    validate_stock_levels(input.stock, input.min_stock, input.max_stock)?;
    for name in &input.categories {
        validate_category_name(name)?;
    }
    Ok(())
}

/// Validates a sale before any storage access.
///
/// ## Rules
/// - `user_id` non-empty
/// - at least one line item
/// - every line has a product id and a quantity in `1..=9999`
pub fn validate_new_sale(sale: &NewSale) -> ValidationResult<()> {
    validate_user_id(&sale.user_id)?;

    if sale.products.is_empty() {
        return Err(ValidationError::Required {
            field: "products".to_string(),
        });
    }

    for line in &sale.products {
        validate_id("products.id", &line.product_id)?;
        validate_quantity(line.quantity)?;
    }

    Ok(())
}

// =============================================================================
// Parsers
// =============================================================================

/// Parses a required channel parameter.
pub fn parse_channel(value: Option<&str>) -> ValidationResult<Channel> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => v.parse(),
        None => Err(ValidationError::Required {
            field: "channel".to_string(),
        }),
    }
}

/// Parses a month selector and returns a date inside that month.
///
/// Accepts `YYYY-MM`, `YYYY-MM-DD` or an RFC 3339 timestamp. Any day
/// selects its whole month.
///
/// ## Example
/// ```rust
/// use chrono::{Datelike, NaiveDate};
/// use salon_core::validation::parse_month;
///
/// let d = parse_month("2024-02").unwrap();
/// assert_eq!((d.year(), d.month()), (2024, 2));
/// assert_eq!(parse_month("2024-02-17").unwrap(), NaiveDate::from_ymd_opt(2024, 2, 17).unwrap());
/// assert!(parse_month("February").is_err());
/// ```
pub fn parse_month(value: &str) -> ValidationResult<NaiveDate> {
    let value = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(&format!("{value}-01"), "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc).date_naive());
    }

    Err(ValidationError::InvalidFormat {
        field: "month".to_string(),
        reason: "expected YYYY-MM, YYYY-MM-DD or an RFC 3339 timestamp".to_string(),
    })
}

/// Parses a sale timestamp: RFC 3339, or a bare `YYYY-MM-DD` date taken as
/// midnight UTC.
pub fn parse_created_at(value: &str) -> ValidationResult<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Some(midnight) = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight.and_utc());
    }

    Err(ValidationError::InvalidFormat {
        field: "created_at".to_string(),
        reason: "expected an RFC 3339 timestamp or YYYY-MM-DD".to_string(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
