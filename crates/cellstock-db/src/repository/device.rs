//! # Device Repository
//!
//! Database operations for the device inventory.
//!
//! ## Device Lifecycle
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Device Lifecycle                         │
//! │                                                              │
//! │  1. REGISTER                                                 │
//! │     └── register() → Device { status: Available }            │
//! │                                                              │
//! │  2. EDIT (while in inventory)                                │
//! │     └── update() → brand/model/purchase price/notes only     │
//! │                                                              │
//! │  3a. SELL (exactly once, never reversed)                     │
//! │     └── mark_sold() → Device { status: Sold }                │
//! │         (coordinator-only, same transaction as the sale row) │
//! │                                                              │
//! │  3b. DELETE (only while Available)                           │
//! │     └── remove() (coordinator-only, checks for a sale first) │
//! │                                                              │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! `status` is not reachable through the public repository surface; the
//! only writer is the coordinator inside its atomic unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use cellstock_core::validation::{
    validate_brand, validate_imei, validate_model, validate_price_cents,
};
use cellstock_core::{Device, DeviceStatus};

/// Column list shared by every device SELECT.
const SELECT_DEVICE: &str = "SELECT id, imei, brand, model, purchase_price_cents, status, \
     arrival_date, modified_at, notes FROM devices";

// =============================================================================
// Request Types
// =============================================================================

/// Input for registering a device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDevice {
    pub imei: String,
    pub brand: String,
    pub model: String,
    pub purchase_price_cents: i64,
    pub notes: Option<String>,
}

/// Partial update of an existing device.
///
/// `None` fields are left untouched. Status and IMEI cannot be changed
/// through this path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceUpdate {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub purchase_price_cents: Option<i64>,
    pub notes: Option<String>,
}

/// Filters for device listings.
#[derive(Debug, Clone, Default)]
pub struct DeviceFilter {
    pub status: Option<DeviceStatus>,
    pub brand: Option<String>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for device database operations.
#[derive(Debug, Clone)]
pub struct DeviceRepository {
    pool: SqlitePool,
}

impl DeviceRepository {
    /// Creates a new DeviceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DeviceRepository { pool }
    }

    /// Registers a new device in inventory.
    ///
    /// ## Errors
    /// - `Validation` if the IMEI, brand, model, or price is malformed
    /// - `UniqueViolation` if the IMEI is already registered
    pub async fn register(&self, new: NewDevice) -> DbResult<Device> {
        validate_imei(&new.imei)?;
        validate_brand(&new.brand)?;
        validate_model(&new.model)?;
        validate_price_cents(new.purchase_price_cents)?;

        let imei = new.imei.trim().to_string();

        // Friendly duplicate check; the UNIQUE index is the backstop for
        // races between the check and the insert.
        if self.get_by_imei(&imei).await?.is_some() {
            return Err(DbError::duplicate("imei", &imei));
        }

        let now = Utc::now();
        let device = Device {
            id: Uuid::new_v4().to_string(),
            imei,
            brand: new.brand.trim().to_string(),
            model: new.model.trim().to_string(),
            purchase_price_cents: new.purchase_price_cents,
            status: DeviceStatus::Available,
            arrival_date: now,
            modified_at: now,
            notes: new.notes,
        };

        debug!(id = %device.id, imei = %device.imei, "Registering device");

        sqlx::query(
            r#"
            INSERT INTO devices (
                id, imei, brand, model, purchase_price_cents,
                status, arrival_date, modified_at, notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&device.id)
        .bind(&device.imei)
        .bind(&device.brand)
        .bind(&device.model)
        .bind(device.purchase_price_cents)
        .bind(device.status)
        .bind(device.arrival_date)
        .bind(device.modified_at)
        .bind(&device.notes)
        .execute(&self.pool)
        .await?;

        Ok(device)
    }

    /// Gets a device by IMEI.
    pub async fn get_by_imei(&self, imei: &str) -> DbResult<Option<Device>> {
        let device = sqlx::query_as::<_, Device>(&format!("{SELECT_DEVICE} WHERE imei = ?1"))
            .bind(imei)
            .fetch_optional(&self.pool)
            .await?;

        Ok(device)
    }

    /// Gets a device by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Device>> {
        let device = sqlx::query_as::<_, Device>(&format!("{SELECT_DEVICE} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(device)
    }

    /// Lists devices, optionally filtered by status and/or brand.
    ///
    /// Newest arrivals first.
    pub async fn list(&self, filter: &DeviceFilter) -> DbResult<Vec<Device>> {
        let mut sql = format!("{SELECT_DEVICE} WHERE 1=1");
        if filter.status.is_some() {
            sql.push_str(" AND status = ?");
        }
        if filter.brand.is_some() {
            sql.push_str(" AND brand = ?");
        }
        sql.push_str(" ORDER BY arrival_date DESC");

        let mut query = sqlx::query_as::<_, Device>(&sql);
        if let Some(status) = filter.status {
            query = query.bind(status);
        }
        if let Some(brand) = &filter.brand {
            query = query.bind(brand.clone());
        }

        let devices = query.fetch_all(&self.pool).await?;

        debug!(count = devices.len(), "Listed devices");
        Ok(devices)
    }

    /// Updates a device's editable fields.
    ///
    /// Only brand, model, purchase price, and notes can change here.
    /// Refreshes `modified_at`.
    ///
    /// ## Errors
    /// - `NotFound` if no device has the given IMEI
    /// - `Validation` if a provided field is malformed
    pub async fn update(&self, imei: &str, update: DeviceUpdate) -> DbResult<Device> {
        let mut device = self
            .get_by_imei(imei)
            .await?
            .ok_or_else(|| DbError::not_found("Device", imei))?;

        if let Some(brand) = update.brand {
            validate_brand(&brand)?;
            device.brand = brand.trim().to_string();
        }
        if let Some(model) = update.model {
            validate_model(&model)?;
            device.model = model.trim().to_string();
        }
        if let Some(price) = update.purchase_price_cents {
            validate_price_cents(price)?;
            device.purchase_price_cents = price;
        }
        if let Some(notes) = update.notes {
            device.notes = Some(notes);
        }
        device.modified_at = Utc::now();

        debug!(id = %device.id, imei = %device.imei, "Updating device");

        let result = sqlx::query(
            r#"
            UPDATE devices SET
                brand = ?2,
                model = ?3,
                purchase_price_cents = ?4,
                notes = ?5,
                modified_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(&device.id)
        .bind(&device.brand)
        .bind(&device.model)
        .bind(device.purchase_price_cents)
        .bind(&device.notes)
        .bind(device.modified_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Device", imei));
        }

        Ok(device)
    }

    /// Counts all devices.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM devices")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Coordinator-only operations
    // =========================================================================
    // These run on a transaction connection supplied by the coordinator so
    // the device flip and the sale row commit or roll back together.

    /// Fetches a device by IMEI on an existing connection.
    pub(crate) async fn fetch_by_imei(
        conn: &mut SqliteConnection,
        imei: &str,
    ) -> DbResult<Option<Device>> {
        let device = sqlx::query_as::<_, Device>(&format!("{SELECT_DEVICE} WHERE imei = ?1"))
            .bind(imei)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(device)
    }

    /// Flips a device to `sold`, guarded on it still being available.
    ///
    /// Returns `false` when the guard did not match, meaning a concurrent
    /// sale claimed the device after the caller read it. The caller must
    /// treat that as a lost race and roll back.
    pub(crate) async fn mark_sold(
        conn: &mut SqliteConnection,
        device_id: &str,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE devices SET
                status = ?2,
                modified_at = ?3
            WHERE id = ?1 AND status = ?4
            "#,
        )
        .bind(device_id)
        .bind(DeviceStatus::Sold)
        .bind(now)
        .bind(DeviceStatus::Available)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Deletes a device row.
    ///
    /// The coordinator has already verified no sale references the device;
    /// the RESTRICT foreign key on `sales.device_id` is the backstop.
    pub(crate) async fn remove(conn: &mut SqliteConnection, device_id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM devices WHERE id = ?1")
            .bind(device_id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Device", device_id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
