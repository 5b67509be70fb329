//! # Error Types
//!
//! Domain-specific error types for cellstock-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       Error Types                            │
//! │                                                              │
//! │  cellstock-core errors (this file)                           │
//! │  ├── CoreError        - Business rule violations             │
//! │  └── ValidationError  - Input validation failures            │
//! │                                                              │
//! │  cellstock-db errors (separate crate)                        │
//! │  └── DbError          - Storage failures + operation errors  │
//! │                                                              │
//! │  Flow: ValidationError → CoreError → DbError → caller        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (IMEI, amounts, etc.)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations. They are raised by the
/// coordinator's precondition checks and translated into its operation-level
/// error type.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The device is not in the `available` state.
    ///
    /// ## When This Occurs
    /// - A sale is attempted against a device that is already sold
    /// - Two terminals race to sell the same device and this caller lost
    #[error("Device {imei} is {status}, not available for sale")]
    DeviceNotAvailable { imei: String, status: String },

    /// The seller account exists but is deactivated.
    ///
    /// Sales must be owned by an active user.
    #[error("Seller {user_id} is not active")]
    SellerInactive { user_id: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when input doesn't meet requirements. Used for early
/// validation before any row is touched.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., non-numeric IMEI).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Amount paid at sale creation exceeds the sale price.
    #[error("amount paid ({amount_paid}) cannot exceed sale price ({sale_price})")]
    ExceedsSalePrice {
        amount_paid: Money,
        sale_price: Money,
    },

    /// A cash sale must be settled in full at creation.
    #[error("cash sale must be paid in full: paid {amount_paid} of {sale_price}")]
    CashNotPaidInFull {
        amount_paid: Money,
        sale_price: Money,
    },

    /// A payment would push the amount paid above the sale price.
    ///
    /// A fully paid sale has `balance_due` of zero, so any further payment
    /// lands here.
    #[error("payment of {amount} exceeds balance due ({balance_due})")]
    ExceedsBalanceDue { amount: Money, balance_due: Money },
}

// =============================================================================
// Result Type Aliases
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
        let err = CoreError::DeviceNotAvailable {
            imei: "123456789012345".to_string(),
            status: "sold".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Device 123456789012345 is sold, not available for sale"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "imei".to_string(),
        };
        assert_eq!(err.to_string(), "imei is required");

        let err = ValidationError::CashNotPaidInFull {
            amount_paid: Money::from_cents(40000),
            sale_price: Money::from_cents(50000),
        };
        assert_eq!(
            err.to_string(),
            "cash sale must be paid in full: paid $400.00 of $500.00"
        );

        let err = ValidationError::ExceedsBalanceDue {
            amount: Money::from_cents(1),
            balance_due: Money::zero(),
        };
        assert_eq!(err.to_string(), "payment of $0.01 exceeds balance due ($0.00)");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "imei".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
