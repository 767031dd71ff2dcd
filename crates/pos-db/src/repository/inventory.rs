//! # Inventory Repository
//!
//! Inventory lookup and the stock ledger.
//!
//! ## The Stock Ledger
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Mutation Discipline                            │
//! │                                                                         │
//! │  The stock column is a shared counter hit by concurrent sales.         │
//! │  It is NEVER written through read-modify-write:                        │
//! │                                                                         │
//! │  ❌ FORBIDDEN                          ✅ THE ONLY WRITE PATH           │
//! │  ────────────────────────              ─────────────────────────────    │
//! │  let item = get(id);                   UPDATE inventory                 │
//! │  if item.stock >= qty {                SET stock = stock - ?            │
//! │      set(id, item.stock - qty)         WHERE id = ? AND stock >= ?      │
//! │  }                                     RETURNING stock                  │
//! │  (races between check & write)         (check and write are one         │
//! │                                         atomic statement; zero rows     │
//! │                                         means insufficient stock)       │
//! │                                                                         │
//! │  The CHECK (stock >= 0) schema constraint is the last line of          │
//! │  defense; this module is the first.                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The stock-mutating operations are free functions over
//! `&mut SqliteConnection` so the sale workflows can run them inside their
//! own transaction (`&mut *tx`). [`InventoryRepository`] wraps the pool for
//! standalone use.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use pos_core::InventoryItem;

// =============================================================================
// In-Transaction Operations
// =============================================================================

/// Fetches an item that is allowed to be sold, scoped to a store.
///
/// ## Sellable Means
/// - Belongs to `store_id` (a sale never draws stock across stores)
/// - Status is `active` (inactive and deleted items are invisible here)
///
/// ## Returns
/// * `Ok(Some(item))` - Sellable item
/// * `Ok(None)` - No such item, wrong store, or not active
pub async fn get_sellable(
    conn: &mut SqliteConnection,
    store_id: &str,
    inventory_id: &str,
) -> DbResult<Option<InventoryItem>> {
    let item = sqlx::query_as::<_, InventoryItem>(
        r#"
        SELECT
            id, store_id, name, code, unit,
            price_cents, tax_rate_bps, stock, min_stock, status,
            created_at, updated_at
        FROM inventory
        WHERE id = ?1 AND store_id = ?2 AND status = 'active'
        "#,
    )
    .bind(inventory_id)
    .bind(store_id)
    .fetch_optional(conn)
    .await?;

    Ok(item)
}

/// Decrements stock if and only if enough is available.
///
/// This is the conditional atomic update: the availability check and the
/// write are one statement, so two concurrent sales can never both draw
/// the last unit.
///
/// ## Returns
/// * `Ok(Some(new_stock))` - Stock was decremented
/// * `Ok(None)` - Insufficient stock (or item gone); nothing was written.
///   The caller diagnoses and rolls back.
pub async fn decrement_stock(
    conn: &mut SqliteConnection,
    inventory_id: &str,
    quantity: i64,
) -> DbResult<Option<i64>> {
    let new_stock: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE inventory
        SET stock = stock - ?2, updated_at = datetime('now')
        WHERE id = ?1 AND stock >= ?2
        RETURNING stock
        "#,
    )
    .bind(inventory_id)
    .bind(quantity)
    .fetch_optional(conn)
    .await?;

    debug!(inventory_id = %inventory_id, quantity, new_stock = ?new_stock, "Stock decrement");

    Ok(new_stock)
}

/// Increments stock (cancellation restore path).
///
/// Unconditional: restoring stock cannot fail an availability check.
pub async fn increment_stock(
    conn: &mut SqliteConnection,
    inventory_id: &str,
    quantity: i64,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE inventory
        SET stock = stock + ?2, updated_at = datetime('now')
        WHERE id = ?1
        "#,
    )
    .bind(inventory_id)
    .bind(quantity)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Inventory item", inventory_id));
    }

    debug!(inventory_id = %inventory_id, quantity, "Stock restored");

    Ok(())
}

// =============================================================================
// InventoryRepository
// =============================================================================

/// Repository for inventory database operations.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Gets an item by ID, regardless of status.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<InventoryItem>> {
        let item = sqlx::query_as::<_, InventoryItem>(
            r#"
            SELECT
                id, store_id, name, code, unit,
                price_cents, tax_rate_bps, stock, min_stock, status,
                created_at, updated_at
            FROM inventory
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Inserts an inventory item (seed and test setup).
    pub async fn insert(&self, item: &InventoryItem) -> DbResult<()> {
        debug!(id = %item.id, code = %item.code, "Inserting inventory item");

        sqlx::query(
            r#"
            INSERT INTO inventory (
                id, store_id, name, code, unit,
                price_cents, tax_rate_bps, stock, min_stock, status,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&item.id)
        .bind(&item.store_id)
        .bind(&item.name)
        .bind(&item.code)
        .bind(&item.unit)
        .bind(item.price_cents)
        .bind(item.tax_rate_bps)
        .bind(item.stock)
        .bind(item.min_stock)
        .bind(item.status)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Active items at or below their minimum stock level.
    ///
    /// ## Arguments
    /// * `store_id` - Restrict to one store, or `None` for all stores
    pub async fn low_stock(&self, store_id: Option<&str>) -> DbResult<Vec<InventoryItem>> {
        let items = sqlx::query_as::<_, InventoryItem>(
            r#"
            SELECT
                id, store_id, name, code, unit,
                price_cents, tax_rate_bps, stock, min_stock, status,
                created_at, updated_at
            FROM inventory
            WHERE status = 'active'
              AND stock <= min_stock
              AND (?1 IS NULL OR store_id = ?1)
            ORDER BY stock ASC, name ASC
            "#,
        )
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
