//! # Transaction Coordinator
//!
//! The only entry points allowed to mutate the device/sale pair. Each
//! operation is one explicit transaction: a short read-validate-write
//! sequence that commits whole or not at all.
//!
//! ## Device + Sale State Machine
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                                                              │
//! │              create_sale                                     │
//! │  Available ─────────────────► Sold/Unpaid ── add_payment ─┐  │
//! │      │                        Sold/PartiallyPaid ◄────────┘  │
//! │      │ delete_device              │                          │
//! │      ▼                            │ add_payment (last)       │
//! │   Deleted                         ▼                          │
//! │                               Sold/FullyPaid (terminal:      │
//! │                               further payments fail          │
//! │                               validation, balance is zero)   │
//! │                                                              │
//! │  No transition ever leads back to Available. The Sold/*      │
//! │  states differ only in the derived is_fully_paid flag.       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//! Serialization comes from the storage layer, not in-process locks. Two
//! guards close the read-to-write window inside each transaction:
//!
//! - `create_sale` flips the device with `... WHERE status = 'available'`
//!   and treats zero affected rows as a lost race
//! - `add_payment` adds with `... WHERE amount_paid + ? <= sale_price` so
//!   concurrent payments can never push a sale past its price
//!
//! A transaction dropped before commit rolls back, so no failure path
//! leaves partial state behind.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::device::DeviceRepository;
use crate::repository::sale::SaleRepository;
use crate::repository::user::UserRepository;
use cellstock_core::validation::{validate_payment, validate_sale_terms};
use cellstock_core::{CoreError, Money, PaymentType, Sale};

// =============================================================================
// Request Types
// =============================================================================

/// Typed request for creating a sale.
///
/// Callers deserialize their payloads into this once at the boundary;
/// nothing downstream re-reads raw input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSaleRequest {
    /// IMEI of the device being sold.
    pub device_imei: String,
    /// The authenticated user making the sale.
    pub seller_id: String,
    /// Agreed price in cents.
    pub sale_price_cents: i64,
    /// Cash settles at creation; credit may start partial.
    pub payment_type: PaymentType,
    /// Amount received at creation, in cents.
    pub amount_paid_cents: i64,
    /// Free-text notes.
    pub notes: Option<String>,
}

// =============================================================================
// Coordinator
// =============================================================================

/// Coordinates atomic mutations across devices and sales.
#[derive(Debug, Clone)]
pub struct Coordinator {
    pool: SqlitePool,
}

impl Coordinator {
    /// Creates a new Coordinator.
    pub fn new(pool: SqlitePool) -> Self {
        Coordinator { pool }
    }

    /// Creates a sale and flips its device to `sold` in one atomic unit.
    ///
    /// ## Steps
    /// 1. Look up the device by IMEI (`NotFound` if absent)
    /// 2. Look up the seller (`NotFound` if absent, `InvalidState` if
    ///    inactive)
    /// 3. Validate availability and sale terms (`InvalidState` /
    ///    `Validation`)
    /// 4. Insert the sale row
    /// 5. Flip the device, guarded on `status = 'available'`; zero rows
    ///    affected means a concurrent sale won and everything rolls back
    /// 6. Commit
    ///
    /// Retries are the caller's call: a retry after a commit failure is
    /// not idempotent, but the one-sale-per-device constraint rejects any
    /// double-sell a blind retry could attempt.
    pub async fn create_sale(&self, req: CreateSaleRequest) -> DbResult<Sale> {
        debug!(imei = %req.device_imei, seller_id = %req.seller_id, "create_sale");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let device = DeviceRepository::fetch_by_imei(&mut tx, &req.device_imei)
            .await?
            .ok_or_else(|| DbError::not_found("Device", &req.device_imei))?;

        let seller = UserRepository::fetch_by_id(&mut tx, &req.seller_id)
            .await?
            .ok_or_else(|| DbError::not_found("User", &req.seller_id))?;

        if !seller.is_active {
            return Err(CoreError::SellerInactive {
                user_id: seller.id,
            }
            .into());
        }

        if !device.is_available() {
            return Err(CoreError::DeviceNotAvailable {
                imei: device.imei,
                status: device.status.as_str().to_string(),
            }
            .into());
        }

        validate_sale_terms(
            Money::from_cents(req.sale_price_cents),
            req.payment_type,
            Money::from_cents(req.amount_paid_cents),
        )?;

        let now = Utc::now();
        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            device_id: device.id.clone(),
            seller_id: seller.id,
            sale_price_cents: req.sale_price_cents,
            payment_type: req.payment_type,
            amount_paid_cents: req.amount_paid_cents,
            sale_date: now,
            modified_at: now,
            notes: req.notes,
        };

        SaleRepository::insert(&mut tx, &sale).await?;

        let marked = DeviceRepository::mark_sold(&mut tx, &device.id, now).await?;
        if !marked {
            // Lost the race: someone sold this device between our read and
            // the guarded flip. Dropping tx rolls the sale row back.
            return Err(DbError::invalid_state(format!(
                "Device {} is no longer available",
                req.device_imei
            )));
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            sale_id = %sale.id,
            imei = %req.device_imei,
            sale_price_cents = sale.sale_price_cents,
            amount_paid_cents = sale.amount_paid_cents,
            "Sale created"
        );

        Ok(sale)
    }

    /// Adds a payment to a sale.
    ///
    /// The amount must be positive and no larger than the current balance
    /// due; a fully paid sale therefore rejects everything. Refreshes
    /// `modified_at` and returns the updated sale.
    pub async fn add_payment(&self, sale_id: &str, amount_cents: i64) -> DbResult<Sale> {
        debug!(sale_id = %sale_id, amount_cents, "add_payment");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let sale = SaleRepository::fetch_by_id(&mut tx, sale_id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", sale_id))?;

        let amount = Money::from_cents(amount_cents);
        validate_payment(amount, sale.balance_due())?;

        let now = Utc::now();
        let applied = SaleRepository::apply_payment(&mut tx, sale_id, amount_cents, now).await?;
        if !applied {
            // The SQL guard re-checks the balance at write time; failing
            // here means a concurrent payment landed after our read.
            return Err(cellstock_core::ValidationError::ExceedsBalanceDue {
                amount,
                balance_due: sale.balance_due(),
            }
            .into());
        }

        let updated = SaleRepository::fetch_by_id(&mut tx, sale_id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", sale_id))?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            sale_id = %sale_id,
            amount_cents,
            amount_paid_cents = updated.amount_paid_cents,
            balance_due_cents = updated.balance_due().cents(),
            "Payment added"
        );

        Ok(updated)
    }

    /// Deletes a device from inventory.
    ///
    /// Only devices without a sale can go; a sold device's sale keeps it
    /// alive forever.
    ///
    /// ## Errors
    /// - `NotFound` if no device has the given IMEI
    /// - `Conflict` if a sale references the device
    pub async fn delete_device(&self, imei: &str) -> DbResult<()> {
        debug!(imei = %imei, "delete_device");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let device = DeviceRepository::fetch_by_imei(&mut tx, imei)
            .await?
            .ok_or_else(|| DbError::not_found("Device", imei))?;

        if SaleRepository::exists_for_device(&mut tx, &device.id).await? {
            return Err(DbError::conflict(format!(
                "Device {imei} has an associated sale"
            )));
        }

        DeviceRepository::remove(&mut tx, &device.id).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(imei = %imei, "Device deleted");

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::device::NewDevice;
    use crate::repository::user::NewUser;
    use cellstock_core::{DeviceStatus, Role, User};

    const IMEI: &str = "123456789012345";

    async fn setup() -> (Database, User) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let seller = db
            .users()
            .create(NewUser {
                username: "amira".to_string(),
                email: "amira@example.com".to_string(),
                password: "correct horse".to_string(),
                role: Role::Staff,
            })
            .await
            .unwrap();
        (db, seller)
    }

    async fn register_device(db: &Database, imei: &str, purchase_price_cents: i64) {
        db.devices()
            .register(NewDevice {
                imei: imei.to_string(),
                brand: "Samsung".to_string(),
                model: "Galaxy S23".to_string(),
                purchase_price_cents,
                notes: None,
            })
            .await
            .unwrap();
    }

    fn credit_request(seller_id: &str) -> CreateSaleRequest {
        CreateSaleRequest {
            device_imei: IMEI.to_string(),
            seller_id: seller_id.to_string(),
            sale_price_cents: 65000,
            payment_type: PaymentType::Credit,
            amount_paid_cents: 20000,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_credit_sale_scenario() {
        // Device bought at $500.00, sold on credit at $650.00 with a
        // $200.00 down payment.
        let (db, seller) = setup().await;
        register_device(&db, IMEI, 50000).await;

        let sale = db
            .coordinator()
            .create_sale(credit_request(&seller.id))
            .await
            .unwrap();

        assert_eq!(sale.balance_due().cents(), 45000);
        assert!(!sale.is_fully_paid());

        let device = db.devices().get_by_imei(IMEI).await.unwrap().unwrap();
        assert_eq!(device.status, DeviceStatus::Sold);
        assert_eq!(sale.profit(device.purchase_price()).cents(), 15000);
    }

    #[tokio::test]
    async fn test_sold_iff_sale_exists() {
        let (db, seller) = setup().await;
        register_device(&db, IMEI, 50000).await;

        // Available device has no sale
        let device = db.devices().get_by_imei(IMEI).await.unwrap().unwrap();
        assert!(db.sales().get_by_device(&device.id).await.unwrap().is_none());

        db.coordinator()
            .create_sale(credit_request(&seller.id))
            .await
            .unwrap();

        // Sold device has exactly one sale
        let device = db.devices().get_by_imei(IMEI).await.unwrap().unwrap();
        assert_eq!(device.status, DeviceStatus::Sold);
        assert!(db.sales().get_by_device(&device.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_create_sale_unknown_device() {
        let (db, seller) = setup().await;

        let err = db
            .coordinator()
            .create_sale(credit_request(&seller.id))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_create_sale_unknown_seller() {
        let (db, _seller) = setup().await;
        register_device(&db, IMEI, 50000).await;

        let err = db
            .coordinator()
            .create_sale(credit_request("missing-user"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_create_sale_inactive_seller() {
        let (db, seller) = setup().await;
        register_device(&db, IMEI, 50000).await;
        db.users().set_active(&seller.id, false).await.unwrap();

        let err = db
            .coordinator()
            .create_sale(credit_request(&seller.id))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidState { .. }));

        // Nothing was committed: the device is still available
        let device = db.devices().get_by_imei(IMEI).await.unwrap().unwrap();
        assert_eq!(device.status, DeviceStatus::Available);
    }

    #[tokio::test]
    async fn test_cash_sale_must_be_paid_in_full() {
        let (db, seller) = setup().await;
        register_device(&db, IMEI, 40000).await;

        // $500.00 cash with only $400.00 paid
        let err = db
            .coordinator()
            .create_sale(CreateSaleRequest {
                device_imei: IMEI.to_string(),
                seller_id: seller.id.clone(),
                sale_price_cents: 50000,
                payment_type: PaymentType::Cash,
                amount_paid_cents: 40000,
                notes: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));

        // A settled cash sale is fine and immediately fully paid
        let sale = db
            .coordinator()
            .create_sale(CreateSaleRequest {
                device_imei: IMEI.to_string(),
                seller_id: seller.id,
                sale_price_cents: 50000,
                payment_type: PaymentType::Cash,
                amount_paid_cents: 50000,
                notes: None,
            })
            .await
            .unwrap();
        assert!(sale.is_fully_paid());
    }

    #[tokio::test]
    async fn test_overpayment_at_creation_rejected() {
        let (db, seller) = setup().await;
        register_device(&db, IMEI, 50000).await;

        let err = db
            .coordinator()
            .create_sale(CreateSaleRequest {
                device_imei: IMEI.to_string(),
                seller_id: seller.id,
                sale_price_cents: 65000,
                payment_type: PaymentType::Credit,
                amount_paid_cents: 65001,
                notes: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));

        // Rolled back: device still available
        let device = db.devices().get_by_imei(IMEI).await.unwrap().unwrap();
        assert_eq!(device.status, DeviceStatus::Available);
    }

    #[tokio::test]
    async fn test_device_sells_only_once() {
        let (db, seller) = setup().await;
        register_device(&db, IMEI, 50000).await;

        db.coordinator()
            .create_sale(credit_request(&seller.id))
            .await
            .unwrap();

        let err = db
            .coordinator()
            .create_sale(credit_request(&seller.id))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn test_racing_sales_have_one_winner() {
        let (db, seller) = setup().await;
        register_device(&db, IMEI, 50000).await;

        let coordinator = db.coordinator();
        let (a, b) = tokio::join!(
            coordinator.create_sale(credit_request(&seller.id)),
            coordinator.create_sale(credit_request(&seller.id)),
        );

        let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1, "exactly one of two racing sales may win");

        let loser = if a.is_err() { a } else { b };
        assert!(matches!(
            loser.unwrap_err(),
            DbError::InvalidState { .. } | DbError::UniqueViolation { .. }
        ));
    }

    #[tokio::test]
    async fn test_payments_complete_a_credit_sale() {
        let (db, seller) = setup().await;
        register_device(&db, IMEI, 50000).await;

        let sale = db
            .coordinator()
            .create_sale(credit_request(&seller.id))
            .await
            .unwrap();

        // Pay off the $450.00 balance
        let updated = db.coordinator().add_payment(&sale.id, 45000).await.unwrap();
        assert_eq!(updated.amount_paid_cents, 65000);
        assert_eq!(updated.balance_due().cents(), 0);
        assert!(updated.is_fully_paid());
        assert!(updated.modified_at >= sale.modified_at);

        // Fully paid is terminal: even one more cent is rejected
        let err = db.coordinator().add_payment(&sale.id, 1).await.unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));

        let reloaded = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(reloaded.amount_paid_cents, 65000);
    }

    #[tokio::test]
    async fn test_payment_bounds() {
        let (db, seller) = setup().await;
        register_device(&db, IMEI, 50000).await;

        let sale = db
            .coordinator()
            .create_sale(credit_request(&seller.id))
            .await
            .unwrap();

        // Non-positive amounts never pass, and leave amount_paid unchanged
        for bad_amount in [0, -500] {
            let err = db
                .coordinator()
                .add_payment(&sale.id, bad_amount)
                .await
                .unwrap_err();
            assert!(matches!(err, DbError::Validation(_)));
        }

        // Exceeding the balance fails too
        let err = db
            .coordinator()
            .add_payment(&sale.id, 45001)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));

        let reloaded = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(reloaded.amount_paid_cents, 20000);

        // The invariant 0 <= amount_paid <= sale_price held throughout
        assert!(reloaded.amount_paid_cents >= 0);
        assert!(reloaded.amount_paid_cents <= reloaded.sale_price_cents);
    }

    #[tokio::test]
    async fn test_add_payment_unknown_sale() {
        let (db, _seller) = setup().await;

        let err = db
            .coordinator()
            .add_payment("missing-sale", 100)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_device_rules() {
        let (db, seller) = setup().await;
        register_device(&db, IMEI, 50000).await;

        // A second device that stays available
        let free_imei = "543210987654321";
        register_device(&db, free_imei, 30000).await;

        db.coordinator()
            .create_sale(credit_request(&seller.id))
            .await
            .unwrap();

        // Sold device: delete is blocked by the sale
        let err = db.coordinator().delete_device(IMEI).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { .. }));
        assert!(db.devices().get_by_imei(IMEI).await.unwrap().is_some());

        // Available device: delete succeeds and lookups stop finding it
        db.coordinator().delete_device(free_imei).await.unwrap();
        assert!(db.devices().get_by_imei(free_imei).await.unwrap().is_none());

        // Unknown device
        let err = db
            .coordinator()
            .delete_device("000000000000000")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_imei_rejected() {
        let (db, _seller) = setup().await;
        register_device(&db, IMEI, 50000).await;

        let err = db
            .devices()
            .register(NewDevice {
                imei: IMEI.to_string(),
                brand: "Apple".to_string(),
                model: "iPhone 14".to_string(),
                purchase_price_cents: 70000,
                notes: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }
}
