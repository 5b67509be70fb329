//! # cellstock-core: Pure Business Logic for Cellstock
//!
//! This crate is the heart of Cellstock, a phone reseller inventory and
//! sales backend. It contains the business rules as pure functions and
//! types with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                   Cellstock Architecture                     │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │          Callers (HTTP API / web forms / reports)      │  │
//! │  └───────────────────────────┬────────────────────────────┘  │
//! │                              │                               │
//! │  ┌───────────────────────────▼────────────────────────────┐  │
//! │  │            ★ cellstock-core (THIS CRATE) ★             │  │
//! │  │                                                        │  │
//! │  │  ┌─────────┐ ┌─────────┐ ┌────────────┐ ┌───────────┐  │  │
//! │  │  │  types  │ │  money  │ │ validation │ │   error   │  │  │
//! │  │  │ Device  │ │  Money  │ │ sale terms │ │ CoreError │  │  │
//! │  │  │  Sale   │ │  cents  │ │  payments  │ │ Validation│  │  │
//! │  │  │  User   │ │         │ │  IMEI      │ │           │  │  │
//! │  │  └─────────┘ └─────────┘ └────────────┘ └───────────┘  │  │
//! │  │                                                        │  │
//! │  │  NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS    │  │
//! │  └───────────────────────────┬────────────────────────────┘  │
//! │                              │                               │
//! │  ┌───────────────────────────▼────────────────────────────┐  │
//! │  │             cellstock-db (Database Layer)              │  │
//! │  │   SQLite repositories, migrations, the Coordinator     │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Device, Sale, User, status enums)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: every function is deterministic
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: all monetary values are cents (i64)
//! 4. **Explicit Errors**: all errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use cellstock_core::money::Money;
//! use cellstock_core::validation::validate_sale_terms;
//! use cellstock_core::PaymentType;
//!
//! // A credit sale may start with a partial payment
//! let sale_price = Money::from_cents(65000); // $650.00
//! let down = Money::from_cents(20000); // $200.00
//! validate_sale_terms(sale_price, PaymentType::Credit, down).unwrap();
//!
//! // The outstanding balance is exact, cent for cent
//! assert_eq!((sale_price - down).cents(), 45000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use cellstock_core::Money` instead of
// `use cellstock_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Length of an IMEI in digits.
///
/// IMEIs are treated as opaque 15-digit strings; the check digit is not
/// verified.
pub const IMEI_LEN: usize = 15;
