//! # Report Repository
//!
//! Read-only aggregations over sales and inventory. Nothing in this module
//! mutates state.
//!
//! All date-windowed queries key off `sale_date`.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use cellstock_core::PaymentType;

/// Summary of sales and inventory over a trailing window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryReport {
    pub period_days: i64,
    pub total_sales: i64,
    pub total_revenue_cents: i64,
    pub total_profit_cents: i64,
    pub total_devices: i64,
    pub available_devices: i64,
    pub sold_devices: i64,
    /// Unpaid remainder across all credit sales (not windowed: an old debt
    /// is still a debt).
    pub outstanding_credit_cents: i64,
}

/// Per-seller performance over a trailing window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffPerformance {
    pub user_id: String,
    pub period_days: i64,
    pub total_sales: i64,
    pub total_revenue_cents: i64,
    pub total_profit_cents: i64,
    pub payment_breakdown: Vec<PaymentBreakdown>,
}

/// Sales grouped by payment type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentBreakdown {
    pub payment_type: PaymentType,
    pub count: i64,
    pub total_cents: i64,
}

/// Repository for reporting queries.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Builds the sales/inventory summary for the last `days` days.
    ///
    /// Profit joins each sale to its device for the purchase price.
    pub async fn summary(&self, days: i64) -> DbResult<SummaryReport> {
        let date_from = Utc::now() - Duration::days(days);

        debug!(days, "Building summary report");

        let (total_sales, total_revenue_cents, total_profit_cents) =
            sqlx::query_as::<_, (i64, i64, i64)>(
                r#"
                SELECT
                    COUNT(s.id),
                    COALESCE(SUM(s.sale_price_cents), 0),
                    COALESCE(SUM(s.sale_price_cents - d.purchase_price_cents), 0)
                FROM sales s
                INNER JOIN devices d ON d.id = s.device_id
                WHERE s.sale_date >= ?1
                "#,
            )
            .bind(date_from)
            .fetch_one(&self.pool)
            .await?;

        let (total_devices, sold_devices) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN status = 'sold' THEN 1 ELSE 0 END), 0)
            FROM devices
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let outstanding_credit_cents: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(sale_price_cents - amount_paid_cents), 0)
            FROM sales
            WHERE payment_type = 'credit'
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(SummaryReport {
            period_days: days,
            total_sales,
            total_revenue_cents,
            total_profit_cents,
            total_devices,
            available_devices: total_devices - sold_devices,
            sold_devices,
            outstanding_credit_cents,
        })
    }

    /// Builds the performance report for one seller over the last `days`
    /// days.
    ///
    /// ## Errors
    /// - `NotFound` if the user does not exist
    pub async fn staff_performance(&self, user_id: &str, days: i64) -> DbResult<StaffPerformance> {
        let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = ?1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        if exists == 0 {
            return Err(DbError::not_found("User", user_id));
        }

        let date_from = Utc::now() - Duration::days(days);

        let (total_sales, total_revenue_cents, total_profit_cents) =
            sqlx::query_as::<_, (i64, i64, i64)>(
                r#"
                SELECT
                    COUNT(s.id),
                    COALESCE(SUM(s.sale_price_cents), 0),
                    COALESCE(SUM(s.sale_price_cents - d.purchase_price_cents), 0)
                FROM sales s
                INNER JOIN devices d ON d.id = s.device_id
                WHERE s.seller_id = ?1 AND s.sale_date >= ?2
                "#,
            )
            .bind(user_id)
            .bind(date_from)
            .fetch_one(&self.pool)
            .await?;

        let breakdown_rows = sqlx::query_as::<_, (PaymentType, i64, i64)>(
            r#"
            SELECT payment_type, COUNT(id), COALESCE(SUM(sale_price_cents), 0)
            FROM sales
            WHERE seller_id = ?1 AND sale_date >= ?2
            GROUP BY payment_type
            "#,
        )
        .bind(user_id)
        .bind(date_from)
        .fetch_all(&self.pool)
        .await?;

        let payment_breakdown = breakdown_rows
            .into_iter()
            .map(|(payment_type, count, total_cents)| PaymentBreakdown {
                payment_type,
                count,
                total_cents,
            })
            .collect();

        Ok(StaffPerformance {
            user_id: user_id.to_string(),
            period_days: days,
            total_sales,
            total_revenue_cents,
            total_profit_cents,
            payment_breakdown,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
