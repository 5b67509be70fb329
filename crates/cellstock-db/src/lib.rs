//! # cellstock-db: Database Layer for Cellstock
//!
//! This crate provides database access for the Cellstock backend.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Cellstock Data Flow                       │
//! │                                                              │
//! │  Caller (API / web form layer)                               │
//! │       │                                                      │
//! │       ▼                                                      │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │                cellstock-db (THIS CRATE)               │  │
//! │  │                                                        │  │
//! │  │  ┌───────────┐  ┌──────────────┐  ┌────────────────┐   │  │
//! │  │  │ Database  │  │ Repositories │  │  Coordinator   │   │  │
//! │  │  │ (pool.rs) │  │ device, sale │  │ create_sale    │   │  │
//! │  │  │           │◄─┤ user, report │◄─┤ add_payment    │   │  │
//! │  │  │ SqlitePool│  │  (reads,     │  │ delete_device  │   │  │
//! │  │  │ Migrations│  │   CRUD)      │  │ (atomic units) │   │  │
//! │  │  └───────────┘  └──────────────┘  └────────────────┘   │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! │       │                                                      │
//! │       ▼                                                      │
//! │  SQLite database (WAL mode, foreign keys ON)                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Error types
//! - [`repository`] - Repository implementations (device, sale, user, report)
//! - [`coordinator`] - Atomic device/sale mutations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cellstock_db::{Coordinator, CreateSaleRequest, Database, DbConfig};
//! use cellstock_core::PaymentType;
//!
//! let db = Database::new(DbConfig::new("path/to/cellstock.db")).await?;
//!
//! // Register inventory, then sell through the coordinator
//! let sale = db.coordinator().create_sale(CreateSaleRequest {
//!     device_imei: "123456789012345".into(),
//!     seller_id: seller.id,
//!     sale_price_cents: 65000,
//!     payment_type: PaymentType::Credit,
//!     amount_paid_cents: 20000,
//!     notes: None,
//! }).await?;
//!
//! // Later installments
//! db.coordinator().add_payment(&sale.id, 45000).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod coordinator;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use coordinator::{Coordinator, CreateSaleRequest};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::device::{DeviceFilter, DeviceRepository, DeviceUpdate, NewDevice};
pub use repository::report::{PaymentBreakdown, ReportRepository, StaffPerformance, SummaryReport};
pub use repository::sale::{SaleFilter, SaleRepository};
pub use repository::user::{NewUser, UserRepository};
