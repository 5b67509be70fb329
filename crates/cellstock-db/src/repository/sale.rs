//! # Sale Repository
//!
//! Database operations for sale records.
//!
//! Reads go through the pool; the write operations (`insert`,
//! `apply_payment`) run on a transaction connection supplied by the
//! coordinator, which owns the atomic unit they belong to.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use cellstock_core::{PaymentType, Sale};

/// Column list shared by every sale SELECT.
const SELECT_SALE: &str = "SELECT id, device_id, seller_id, sale_price_cents, payment_type, \
     amount_paid_cents, sale_date, modified_at, notes FROM sales";

/// Filters for sale listings.
#[derive(Debug, Clone, Default)]
pub struct SaleFilter {
    pub payment_type: Option<PaymentType>,
    pub seller_id: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!("{SELECT_SALE} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Gets the sale consuming a device, if any.
    pub async fn get_by_device(&self, device_id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!("{SELECT_SALE} WHERE device_id = ?1"))
            .bind(device_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Lists sales matching the filter, newest first.
    ///
    /// Date filters key off `sale_date`.
    pub async fn list(&self, filter: &SaleFilter) -> DbResult<Vec<Sale>> {
        let mut sql = format!("{SELECT_SALE} WHERE 1=1");
        if filter.payment_type.is_some() {
            sql.push_str(" AND payment_type = ?");
        }
        if filter.seller_id.is_some() {
            sql.push_str(" AND seller_id = ?");
        }
        if filter.date_from.is_some() {
            sql.push_str(" AND sale_date >= ?");
        }
        if filter.date_to.is_some() {
            sql.push_str(" AND sale_date <= ?");
        }
        sql.push_str(" ORDER BY sale_date DESC");

        let mut query = sqlx::query_as::<_, Sale>(&sql);
        if let Some(payment_type) = filter.payment_type {
            query = query.bind(payment_type);
        }
        if let Some(seller_id) = &filter.seller_id {
            query = query.bind(seller_id.clone());
        }
        if let Some(date_from) = filter.date_from {
            query = query.bind(date_from);
        }
        if let Some(date_to) = filter.date_to {
            query = query.bind(date_to);
        }

        let sales = query.fetch_all(&self.pool).await?;

        debug!(count = sales.len(), "Listed sales");
        Ok(sales)
    }

    /// Lists all sales made by one seller, newest first.
    pub async fn list_by_seller(&self, seller_id: &str) -> DbResult<Vec<Sale>> {
        self.list(&SaleFilter {
            seller_id: Some(seller_id.to_string()),
            ..SaleFilter::default()
        })
        .await
    }

    // =========================================================================
    // Coordinator-only operations
    // =========================================================================

    /// Fetches a sale by ID on an existing connection.
    pub(crate) async fn fetch_by_id(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!("{SELECT_SALE} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(sale)
    }

    /// Checks whether any sale references a device.
    pub(crate) async fn exists_for_device(
        conn: &mut SqliteConnection,
        device_id: &str,
    ) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE device_id = ?1")
            .bind(device_id)
            .fetch_one(&mut *conn)
            .await?;

        Ok(count > 0)
    }

    /// Inserts a sale row.
    pub(crate) async fn insert(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
        debug!(id = %sale.id, device_id = %sale.device_id, "Inserting sale");

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, device_id, seller_id, sale_price_cents, payment_type,
                amount_paid_cents, sale_date, modified_at, notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.device_id)
        .bind(&sale.seller_id)
        .bind(sale.sale_price_cents)
        .bind(sale.payment_type)
        .bind(sale.amount_paid_cents)
        .bind(sale.sale_date)
        .bind(sale.modified_at)
        .bind(&sale.notes)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Adds a payment to a sale, guarded so the total can never pass the
    /// sale price.
    ///
    /// Returns `false` when the guard did not match: the payment would
    /// overshoot the balance (possibly because a concurrent payment landed
    /// first). The caller decides how to surface that.
    pub(crate) async fn apply_payment(
        conn: &mut SqliteConnection,
        sale_id: &str,
        amount_cents: i64,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE sales SET
                amount_paid_cents = amount_paid_cents + ?2,
                modified_at = ?3
            WHERE id = ?1 AND amount_paid_cents + ?2 <= sale_price_cents
            "#,
        )
        .bind(sale_id)
        .bind(amount_cents)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
