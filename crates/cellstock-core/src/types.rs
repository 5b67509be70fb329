//! # Domain Types
//!
//! Core domain types used throughout Cellstock.
//!
//! ## Type Hierarchy
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       Domain Types                           │
//! │                                                              │
//! │  ┌───────────────┐   ┌────────────────┐   ┌───────────────┐  │
//! │  │    Device     │   │      Sale      │   │     User      │  │
//! │  │  ───────────  │   │  ────────────  │   │  ───────────  │  │
//! │  │  id (UUID)    │   │  id (UUID)     │   │  id (UUID)    │  │
//! │  │  imei (key)   │◄──┤  device_id     │   │  username     │  │
//! │  │  status       │   │  seller_id     ├──►│  role         │  │
//! │  │  purchase     │   │  amount_paid   │   │  is_active    │  │
//! │  └───────────────┘   └────────────────┘   └───────────────┘  │
//! │                                                              │
//! │  ┌───────────────┐   ┌────────────────┐   ┌───────────────┐  │
//! │  │ DeviceStatus  │   │  PaymentType   │   │     Role      │  │
//! │  │  Available    │   │   Cash         │   │   Staff       │  │
//! │  │  Sold         │   │   Credit       │   │   Admin       │  │
//! │  └───────────────┘   └────────────────┘   └───────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! A device has two keys:
//! - `id`: UUID v4, immutable, used for database relations
//! - `imei`: the natural key operators look devices up by
//!
//! Relationships are unidirectional foreign-key references. A sale holds
//! `device_id` and `seller_id`; there are no back-references, and the two
//! lookup directions the system needs (does this device have a sale, which
//! device backs this sale) go through explicit queries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Device Status
// =============================================================================

/// The availability state of a device.
///
/// A device flips `Available` → `Sold` exactly once, as part of sale
/// creation, and never flips back. There is no return/refund path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    /// In inventory, can be sold or deleted.
    Available,
    /// Consumed by exactly one sale.
    Sold,
}

impl DeviceStatus {
    /// The canonical lowercase name, as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Available => "available",
            DeviceStatus::Sold => "sold",
        }
    }
}

impl Default for DeviceStatus {
    fn default() -> Self {
        DeviceStatus::Available
    }
}

// =============================================================================
// Payment Type
// =============================================================================

/// How a sale is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    /// Paid in full at creation.
    Cash,
    /// May start below the sale price and is completed by later payments.
    Credit,
}

// =============================================================================
// User Role
// =============================================================================

/// Access role of a user account.
///
/// Role-based access control lives in the calling layer; the core only
/// carries the role so callers can apply it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Staff,
    Admin,
}

impl Default for Role {
    fn default() -> Self {
        Role::Staff
    }
}

// =============================================================================
// Device
// =============================================================================

/// A handset in inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Device {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// IMEI - the natural key. Unique, 15 digits, otherwise opaque.
    pub imei: String,

    /// Manufacturer name.
    pub brand: String,

    /// Model name.
    pub model: String,

    /// What the shop paid for the device, in cents.
    pub purchase_price_cents: i64,

    /// Availability state.
    pub status: DeviceStatus,

    /// When the device arrived in inventory.
    pub arrival_date: DateTime<Utc>,

    /// When the device was last modified.
    pub modified_at: DateTime<Utc>,

    /// Free-text notes.
    pub notes: Option<String>,
}

impl Device {
    /// Returns the purchase price as a Money type.
    #[inline]
    pub fn purchase_price(&self) -> Money {
        Money::from_cents(self.purchase_price_cents)
    }

    /// Checks whether the device can still be sold.
    #[inline]
    pub fn is_available(&self) -> bool {
        self.status == DeviceStatus::Available
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A sale transaction consuming exactly one device.
///
/// `amount_paid_cents` is the only mutable field after creation; it only
/// ever grows, and never past `sale_price_cents`. Balance, profit, and the
/// fully-paid flag are derived on every call, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// The device this sale consumed (1:1).
    pub device_id: String,

    /// The user who made the sale.
    pub seller_id: String,

    /// Agreed sale price in cents.
    pub sale_price_cents: i64,

    /// Cash (settled at creation) or credit (settled over time).
    pub payment_type: PaymentType,

    /// Total received so far, in cents. Monotonically non-decreasing.
    pub amount_paid_cents: i64,

    /// When the sale was made.
    pub sale_date: DateTime<Utc>,

    /// When the sale was last modified (creation or latest payment).
    pub modified_at: DateTime<Utc>,

    /// Free-text notes.
    pub notes: Option<String>,
}

impl Sale {
    /// Returns the sale price as Money.
    #[inline]
    pub fn sale_price(&self) -> Money {
        Money::from_cents(self.sale_price_cents)
    }

    /// Returns the amount paid so far as Money.
    #[inline]
    pub fn amount_paid(&self) -> Money {
        Money::from_cents(self.amount_paid_cents)
    }

    /// Outstanding amount owed: `sale_price - amount_paid`.
    ///
    /// Recomputed from the stored fields on every call.
    #[inline]
    pub fn balance_due(&self) -> Money {
        self.sale_price() - self.amount_paid()
    }

    /// Profit relative to what the shop paid for the device.
    ///
    /// The purchase price lives on the device row, so callers pass it in;
    /// the sale does not hold a back-reference.
    #[inline]
    pub fn profit(&self, purchase_price: Money) -> Money {
        self.sale_price() - purchase_price
    }

    /// Whether the sale is settled: `balance_due <= 0`.
    #[inline]
    pub fn is_fully_paid(&self) -> bool {
        !self.balance_due().is_positive()
    }
}

// =============================================================================
// User
// =============================================================================

/// A staff or admin account.
///
/// The transaction core only consumes `id` and `is_active` (sales must be
/// owned by an active user); everything else is collaborator surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Login name. Unique.
    pub username: String,

    /// Contact email. Unique.
    pub email: String,

    /// Argon2 PHC-format password hash. Never serialized to callers.
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Access role.
    pub role: Role,

    /// Deactivated users cannot own new sales.
    pub is_active: bool,

    /// When the account was created.
    pub created_at: DateTime<Utc>,

    /// Last activity timestamp.
    pub last_seen: DateTime<Utc>,
}

impl User {
    /// Checks if the user has the admin role.
    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_sale(sale_price_cents: i64, amount_paid_cents: i64) -> Sale {
        let now = Utc::now();
        Sale {
            id: "sale-1".to_string(),
            device_id: "device-1".to_string(),
            seller_id: "user-1".to_string(),
            sale_price_cents,
            payment_type: PaymentType::Credit,
            amount_paid_cents,
            sale_date: now,
            modified_at: now,
            notes: None,
        }
    }

    #[test]
    fn test_device_status_default() {
        assert_eq!(DeviceStatus::default(), DeviceStatus::Available);
        assert_eq!(DeviceStatus::Sold.as_str(), "sold");
    }

    #[test]
    fn test_balance_due_and_fully_paid() {
        let sale = sample_sale(65000, 20000);
        assert_eq!(sale.balance_due().cents(), 45000);
        assert!(!sale.is_fully_paid());

        let settled = sample_sale(65000, 65000);
        assert_eq!(settled.balance_due().cents(), 0);
        assert!(settled.is_fully_paid());
    }

    #[test]
    fn test_profit() {
        // Bought at $500.00, sold at $650.00: profit $150.00
        let sale = sample_sale(65000, 20000);
        assert_eq!(sale.profit(Money::from_cents(50000)).cents(), 15000);

        // Selling below cost yields a negative profit
        let bad_deal = sample_sale(40000, 40000);
        assert_eq!(bad_deal.profit(Money::from_cents(50000)).cents(), -10000);
    }

    #[test]
    fn test_enum_wire_names() {
        // Callers exchange these as snake_case strings; the storage layer
        // uses the same spellings.
        assert_eq!(
            serde_json::to_string(&DeviceStatus::Available).unwrap(),
            "\"available\""
        );
        assert_eq!(serde_json::to_string(&PaymentType::Credit).unwrap(), "\"credit\"");
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let now = Utc::now();
        let user = User {
            id: "user-1".to_string(),
            username: "amira".to_string(),
            email: "amira@example.com".to_string(),
            password_hash: "secret-hash".to_string(),
            role: Role::Staff,
            is_active: true,
            created_at: now,
            last_seen: now,
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
    }

    #[test]
    fn test_user_role() {
        assert_eq!(Role::default(), Role::Staff);

        let now = Utc::now();
        let user = User {
            id: "user-1".to_string(),
            username: "amira".to_string(),
            email: "amira@example.com".to_string(),
            password_hash: "hash".to_string(),
            role: Role::Admin,
            is_active: true,
            created_at: now,
            last_seen: now,
        };
        assert!(user.is_admin());
    }
}
