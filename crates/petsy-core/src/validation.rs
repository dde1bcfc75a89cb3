//! # Validation Module
//!
//! Input checks applied before the store mutates anything.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Screen (TypeScript)                                          │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Store command (Rust)                                         │
//! │  └── THIS MODULE: shape of ids, prices, tokens                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Backend (REST API)                                           │
//! │  └── Authoritative checks at checkout                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Quantity *updates* are deliberately not validated here: the cart clamps
//! them (see [`crate::cart::Cart::update_quantity`]).

use crate::error::ValidationError;
use crate::{MAX_ITEM_QUANTITY, MAX_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_PRODUCT_ID_LEN: usize = 64;
const MAX_ITEM_NAME_LEN: usize = 200;
const MAX_TOKEN_LEN: usize = 4096;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product identifier used as the cart line key.
///
/// ## Example
/// ```rust
/// use petsy_core::validation::validate_product_id;
///
/// assert!(validate_product_id("p1").is_ok());
/// assert!(validate_product_id("  ").is_err());
/// assert!(validate_product_id(" p1").is_err());
/// ```
///
/// Ids are compared verbatim, so surrounding whitespace is rejected rather
/// than trimmed.
pub fn validate_product_id(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "product_id".to_string(),
        });
    }

    if id.trim() != id {
        return Err(ValidationError::InvalidFormat {
            field: "product_id".to_string(),
            reason: "must not start or end with whitespace".to_string(),
        });
    }

    if id.len() > MAX_PRODUCT_ID_LEN {
        return Err(ValidationError::TooLong {
            field: "product_id".to_string(),
            max: MAX_PRODUCT_ID_LEN,
        });
    }

    Ok(())
}

/// Validates the display name carried on a cart line.
pub fn validate_item_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > MAX_ITEM_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_ITEM_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a bearer token before it is persisted.
///
/// ## Rules
/// - Must not be empty
/// - Must not contain whitespace (it goes verbatim into a header)
pub fn validate_token(token: &str) -> ValidationResult<()> {
    if token.is_empty() {
        return Err(ValidationError::Required {
            field: "token".to_string(),
        });
    }

    if token.len() > MAX_TOKEN_LEN {
        return Err(ValidationError::TooLong {
            field: "token".to_string(),
            max: MAX_TOKEN_LEN,
        });
    }

    if token.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: "token".to_string(),
            reason: "must not contain whitespace".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a unit price in cents.
///
/// ## Example
/// ```rust
/// use petsy_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(999).is_ok());
/// assert!(validate_price_cents(0).is_ok());     // Free sample
/// assert!(validate_price_cents(-100).is_err());
/// assert!(validate_price_cents(i64::MAX).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates a stored line quantity (1..=999).
///
/// Used when rehydrating a persisted cart; live updates clamp instead.
pub fn validate_line_quantity(qty: i64) -> ValidationResult<()> {
    if !(1..=MAX_ITEM_QUANTITY).contains(&qty) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
