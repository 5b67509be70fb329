//! # Validation Module
//!
//! Business rule validation for Cellstock.
//!
//! ## Validation Strategy
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Validation Layers                         │
//! │                                                              │
//! │  Layer 1: Caller (API / web form layer)                      │
//! │  ├── Deserializes into typed request structs                 │
//! │  └── Basic format feedback                                   │
//! │           │                                                  │
//! │           ▼                                                  │
//! │  Layer 2: THIS MODULE (pure rules, run once at the boundary) │
//! │  ├── IMEI / field shape checks                               │
//! │  └── Sale-terms and payment rules                            │
//! │           │                                                  │
//! │           ▼                                                  │
//! │  Layer 3: Database (SQLite)                                  │
//! │  ├── UNIQUE constraints (imei, sales.device_id)              │
//! │  ├── CHECK (0 <= amount_paid <= sale_price)                  │
//! │  └── Foreign key constraints                                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use cellstock_core::validation::{validate_imei, validate_sale_terms};
//! use cellstock_core::{Money, PaymentType};
//!
//! validate_imei("123456789012345").unwrap();
//!
//! // Credit sale with a down payment is fine
//! validate_sale_terms(
//!     Money::from_cents(65000),
//!     PaymentType::Credit,
//!     Money::from_cents(20000),
//! )
//! .unwrap();
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::PaymentType;
use crate::IMEI_LEN;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Device Field Validators
// =============================================================================

/// Validates an IMEI.
///
/// ## Rules
/// - Must not be empty
/// - Must be exactly 15 characters
/// - Must contain only ASCII digits
///
/// Beyond its shape the IMEI is treated as an opaque unique key; no
/// checksum is verified.
///
/// ## Example
/// ```rust
/// use cellstock_core::validation::validate_imei;
///
/// assert!(validate_imei("123456789012345").is_ok());
/// assert!(validate_imei("12345").is_err());
/// assert!(validate_imei("12345678901234X").is_err());
/// ```
pub fn validate_imei(imei: &str) -> ValidationResult<()> {
    let imei = imei.trim();

    if imei.is_empty() {
        return Err(ValidationError::Required {
            field: "imei".to_string(),
        });
    }

    if imei.len() != IMEI_LEN {
        return Err(ValidationError::InvalidFormat {
            field: "imei".to_string(),
            reason: format!("must be exactly {} digits", IMEI_LEN),
        });
    }

    if !imei.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "imei".to_string(),
            reason: "must contain only digits".to_string(),
        });
    }

    Ok(())
}

/// Validates a device brand name.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 50 characters
pub fn validate_brand(brand: &str) -> ValidationResult<()> {
    let brand = brand.trim();

    if brand.is_empty() {
        return Err(ValidationError::Required {
            field: "brand".to_string(),
        });
    }

    if brand.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "brand".to_string(),
            max: 50,
        });
    }

    Ok(())
}

/// Validates a device model name.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 100 characters
pub fn validate_model(model: &str) -> ValidationResult<()> {
    let model = model.trim();

    if model.is_empty() {
        return Err(ValidationError::Required {
            field: "model".to_string(),
        });
    }

    if model.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "model".to_string(),
            max: 100,
        });
    }

    Ok(())
}

/// Validates a price in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Sale Rules
// =============================================================================

/// Validates the terms of a new sale.
///
/// ## Rules
/// - `sale_price >= 0`
/// - `0 <= amount_paid <= sale_price`
/// - For cash sales, `amount_paid == sale_price` (cash settles at creation)
///
/// ## User Workflow
/// ```text
/// ┌──────────────────────────────────────────────────────────────┐
/// │  Create Sale                                                 │
/// │                                                              │
/// │  sale_price=$650.00, credit, amount_paid=$200.00             │
/// │       │                                                      │
/// │       ▼                                                      │
/// │  validate_sale_terms(...) ← THIS FUNCTION                    │
/// │       │                                                      │
/// │       ├── amount_paid > sale_price? → ExceedsSalePrice       │
/// │       │                                                      │
/// │       ├── cash && amount_paid != sale_price?                 │
/// │       │       → CashNotPaidInFull                            │
/// │       │                                                      │
/// │       └── OK → proceed to atomic sale creation               │
/// └──────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_sale_terms(
    sale_price: Money,
    payment_type: PaymentType,
    amount_paid: Money,
) -> ValidationResult<()> {
    if sale_price.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "sale_price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    if amount_paid.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "amount_paid".to_string(),
            min: 0,
            max: sale_price.cents(),
        });
    }

    if amount_paid > sale_price {
        return Err(ValidationError::ExceedsSalePrice {
            amount_paid,
            sale_price,
        });
    }

    if payment_type == PaymentType::Cash && amount_paid != sale_price {
        return Err(ValidationError::CashNotPaidInFull {
            amount_paid,
            sale_price,
        });
    }

    Ok(())
}

/// Validates a payment against the current balance due.
///
/// ## Rules
/// - `amount > 0`
/// - `amount <= balance_due`
///
/// A fully paid sale has `balance_due` of zero, so every further payment
/// fails here. That is the terminal state of the payment lifecycle.
pub fn validate_payment(amount: Money, balance_due: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }

    if amount > balance_due {
        return Err(ValidationError::ExceedsBalanceDue {
            amount,
            balance_due,
        });
    }

    Ok(())
}

// =============================================================================
// User Field Validators
// =============================================================================

/// Validates a username.
///
/// ## Rules
/// - Must be between 3 and 64 characters
pub fn validate_username(username: &str) -> ValidationResult<()> {
    let username = username.trim();

    if username.is_empty() {
        return Err(ValidationError::Required {
            field: "username".to_string(),
        });
    }

    if username.len() < 3 {
        return Err(ValidationError::TooShort {
            field: "username".to_string(),
            min: 3,
        });
    }

    if username.len() > 64 {
        return Err(ValidationError::TooLong {
            field: "username".to_string(),
            max: 64,
        });
    }

    Ok(())
}

/// Validates an email address.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 120 characters
/// - Must contain an `@` with text on both sides
///
/// This is a shape check, not RFC 5322 parsing; delivery problems surface
/// at the mail layer.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    if email.len() > 120 {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: 120,
        });
    }

    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must be a valid email address".to_string(),
        }),
    }
}

/// Validates a password.
///
/// ## Rules
/// - Must be at least 8 characters
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }

    if password.len() < 8 {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: 8,
        });
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
    fn test_validate_imei() {
        // Valid
        assert!(validate_imei("123456789012345").is_ok());
        assert!(validate_imei(" 123456789012345 ").is_ok());

        // Invalid
        assert!(validate_imei("").is_err());
        assert!(validate_imei("   ").is_err());
        assert!(validate_imei("1234567890").is_err());
        assert!(validate_imei("1234567890123456").is_err());
        assert!(validate_imei("12345678901234X").is_err());
    }

    #[test]
    fn test_validate_brand_and_model() {
        assert!(validate_brand("Samsung").is_ok());
        assert!(validate_brand("").is_err());
        assert!(validate_brand(&"A".repeat(60)).is_err());

        assert!(validate_model("Galaxy S23").is_ok());
        assert!(validate_model("").is_err());
        assert!(validate_model(&"A".repeat(150)).is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(50000).is_ok());
        assert!(validate_price_cents(-1).is_err());
    }

    #[test]
    fn test_sale_terms_credit() {
        let price = Money::from_cents(65000);

        // Down payment below the price is allowed on credit
        assert!(validate_sale_terms(price, PaymentType::Credit, Money::from_cents(20000)).is_ok());
        // Zero down is allowed on credit
        assert!(validate_sale_terms(price, PaymentType::Credit, Money::zero()).is_ok());
        // Paying in full at creation is allowed on credit
        assert!(validate_sale_terms(price, PaymentType::Credit, price).is_ok());

        // Overpaying is never allowed
        assert!(matches!(
            validate_sale_terms(price, PaymentType::Credit, Money::from_cents(65001)),
            Err(ValidationError::ExceedsSalePrice { .. })
        ));
        // Negative amounts are never allowed
        assert!(validate_sale_terms(price, PaymentType::Credit, Money::from_cents(-1)).is_err());
    }

    #[test]
    fn test_sale_terms_cash_must_settle() {
        let price = Money::from_cents(50000);

        assert!(validate_sale_terms(price, PaymentType::Cash, price).is_ok());

        // $500.00 cash with only $400.00 paid is rejected
        assert!(matches!(
            validate_sale_terms(price, PaymentType::Cash, Money::from_cents(40000)),
            Err(ValidationError::CashNotPaidInFull { .. })
        ));
    }

    #[test]
    fn test_validate_payment() {
        let balance = Money::from_cents(45000);

        assert!(validate_payment(Money::from_cents(45000), balance).is_ok());
        assert!(validate_payment(Money::from_cents(1), balance).is_ok());

        assert!(matches!(
            validate_payment(Money::zero(), balance),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(matches!(
            validate_payment(Money::from_cents(-500), balance),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(matches!(
            validate_payment(Money::from_cents(45001), balance),
            Err(ValidationError::ExceedsBalanceDue { .. })
        ));

        // Fully paid: any further payment exceeds the zero balance
        assert!(matches!(
            validate_payment(Money::from_cents(1), Money::zero()),
            Err(ValidationError::ExceedsBalanceDue { .. })
        ));
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("amira").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("").is_err());
        assert!(validate_username(&"a".repeat(70)).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("amira@example.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("amira@").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("correct horse").is_ok());
        assert!(validate_password("").is_err());
        assert!(validate_password("short").is_err());
    }
}
