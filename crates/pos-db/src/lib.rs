//! # pos-db: Database Layer for the Retail POS Core
//!
//! This crate provides database access for the POS transaction core.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        POS Data Flow                                    │
//! │                                                                         │
//! │  Request handler (create_sale)                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                      pos-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ InventoryRepo │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ SaleRepo      │    │ 001_init.sql │  │   │
//! │  │   │ Connection    │    │  • create     │    │              │  │   │
//! │  │   │ Management    │    │  • cancel     │    │              │  │   │
//! │  │   └───────────────┘    │  • query      │    └──────────────┘  │   │
//! │  │                        └───────────────┘                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Storage faults plus the caller-facing error taxonomy
//! - [`repository`] - The inventory ledger and the sale workflows
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pos_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/pos.db")).await?;
//!
//! let sale = db.sales().create_sale(request, "user-1").await?;
//! let fetched = db.sales().get_by_id(&sale.sale.id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult, SaleError, SaleResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::inventory::InventoryRepository;
pub use repository::sale::{SaleFilter, SaleRepository, SaleStatistics};
