//! # Sale Repository
//!
//! The sale transaction coordinator, the cancellation workflow, and the
//! sale read side.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. CREATE (one transaction)                                           │
//! │     └── create_sale(request, user_id)                                  │
//! │         ├── validate (before the tx opens)                             │
//! │         ├── draw sale number from the day counter                      │
//! │         ├── per line, in caller order:                                 │
//! │         │     fetch sellable item → price → conditional stock draw     │
//! │         ├── insert header + lines                                      │
//! │         └── COMMIT → Sale { status: Completed }                        │
//! │         Any failure → full rollback, nothing persisted                 │
//! │                                                                         │
//! │  2. (OPTIONAL) CANCEL (one transaction)                                │
//! │     └── cancel_sale(id, user_id)                                       │
//! │         ├── guarded status flip completed → cancelled                  │
//! │         ├── restore stock per line                                     │
//! │         └── COMMIT → Sale { status: Cancelled }                        │
//! │                                                                         │
//! │  Refunded is terminal and set externally; cancellation refuses it.     │
//! │  Monetary fields are never recomputed after commit.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult, SaleError, SaleResult};
use crate::repository::inventory;
use pos_core::pricing::{price_line, SaleTotals};
use pos_core::validation::validate_create_sale;
use pos_core::{
    CoreError, CreateSaleRequest, Money, PaymentStatus, Rate, Sale, SaleLine, SaleStatus,
    SaleWithLines,
};

// =============================================================================
// Read-Side Shapes
// =============================================================================

/// Filter for the sale listing. All fields optional; `None` means "any".
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct SaleFilter {
    pub store_id: Option<String>,
    pub customer_id: Option<String>,
    pub payment_status: Option<PaymentStatus>,
    pub status: Option<SaleStatus>,
    /// Page size; defaults to 50.
    pub limit: Option<i64>,
    /// Rows to skip; defaults to 0.
    pub offset: Option<i64>,
}

/// Aggregates over completed, non-deleted sales.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct SaleStatistics {
    /// Number of completed sales.
    pub total_sales: i64,
    /// Sum of sale totals, in cents.
    pub total_revenue_cents: i64,
    /// Sum of amounts actually paid, in cents.
    pub total_collected_cents: i64,
    /// Sum of outstanding amounts, in cents.
    pub total_outstanding_cents: i64,
    /// Average sale total, in cents (0 when there are no sales).
    pub average_sale_cents: i64,
}

/// Sale header joined with display names. Internal row shape for the
/// assembled read side.
#[derive(Debug, sqlx::FromRow)]
struct SaleHeaderRow {
    #[sqlx(flatten)]
    sale: Sale,
    customer_name: Option<String>,
    store_name: Option<String>,
    user_name: Option<String>,
}

// =============================================================================
// SaleRepository
// =============================================================================

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

    // =========================================================================
    // Create
    // =========================================================================

    /// Creates a sale atomically: pricing, stock draws, number generation,
    /// header and line inserts all commit together or not at all.
    ///
    /// ## Sequence
    /// 1. Validate the request (no transaction open yet)
    /// 2. Open the transaction
    /// 3. Draw the next sale number from the day counter
    /// 4. Per line, in caller order: fetch the sellable item, resolve price
    ///    and rates (request overrides fall back to the item's values),
    ///    price the line, draw stock via the conditional atomic update
    /// 5. Finish sale totals, derive the payment status
    /// 6. Insert the header and the lines
    /// 7. Commit
    /// 8. Re-fetch the assembled sale through the read side
    ///
    /// The first failing line determines the reported error; any failure
    /// after step 2 rolls the whole transaction back.
    pub async fn create_sale(
        &self,
        request: CreateSaleRequest,
        user_id: &str,
    ) -> SaleResult<SaleWithLines> {
        validate_create_sale(&request)?;

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let sale_id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let sale_number = next_sale_number(&mut tx).await?;

        debug!(sale_id = %sale_id, sale_number = %sale_number, store_id = %request.store_id, "Creating sale");

        // Price and draw stock line by line, in caller order. A failure
        // anywhere drops the transaction, rolling back every prior draw.
        let mut totals = SaleTotals::new();
        let mut lines: Vec<SaleLine> = Vec::with_capacity(request.items.len());

        for (index, line_req) in request.items.iter().enumerate() {
            let item = inventory::get_sellable(&mut tx, &request.store_id, &line_req.inventory_id)
                .await?
                .ok_or_else(|| CoreError::ItemNotFound(line_req.inventory_id.clone()))?;

            let unit_price = line_req
                .unit_price_cents
                .map(Money::from_cents)
                .unwrap_or_else(|| item.price());
            let tax_rate = line_req
                .tax_rate_bps
                .map(Rate::from_bps)
                .unwrap_or_else(|| item.tax_rate());
            let discount_rate = line_req.discount_bps.map(Rate::from_bps).unwrap_or_default();

            let pricing = price_line(line_req.quantity, unit_price, tax_rate, discount_rate);
            totals.add_line(&pricing);

            let drawn = inventory::decrement_stock(&mut tx, &item.id, line_req.quantity).await?;
            if drawn.is_none() {
                return Err(CoreError::InsufficientStock {
                    name: item.name,
                    available: item.stock,
                    requested: line_req.quantity,
                }
                .into());
            }

            lines.push(SaleLine {
                id: Uuid::new_v4().to_string(),
                sale_id: sale_id.clone(),
                inventory_id: item.id,
                line_no: (index + 1) as i64,
                name_snapshot: item.name,
                code_snapshot: item.code,
                unit_snapshot: item.unit,
                unit_price_cents: unit_price.cents(),
                quantity: line_req.quantity,
                tax_rate_bps: tax_rate.bps(),
                discount_bps: discount_rate.bps(),
                subtotal_cents: pricing.subtotal.cents(),
                discount_cents: pricing.discount.cents(),
                tax_cents: pricing.tax.cents(),
                total_cents: pricing.total.cents(),
                created_at: now,
            });
        }

        let amounts = totals.finish(
            Money::from_cents(request.discount_cents.unwrap_or(0)),
            Money::from_cents(request.amount_paid_cents),
        );
        let payment_status = amounts.payment_status(request.payment_status);
        let payment_method = request.payment_method.unwrap_or_default();

        let sale = Sale {
            id: sale_id.clone(),
            sale_number,
            store_id: request.store_id,
            customer_id: request.customer_id,
            user_id: user_id.to_string(),
            subtotal_cents: amounts.subtotal.cents(),
            tax_cents: amounts.tax.cents(),
            discount_cents: amounts.discount.cents(),
            total_cents: amounts.total.cents(),
            payment_method,
            payment_status,
            amount_paid_cents: amounts.amount_paid.cents(),
            amount_due_cents: amounts.amount_due.cents(),
            notes: request.notes,
            status: SaleStatus::Completed,
            deleted: false,
            created_at: now,
            updated_at: now,
            updated_by: None,
        };

        insert_sale(&mut tx, &sale).await?;
        for line in &lines {
            insert_line(&mut tx, line).await?;
        }

        tx.commit().await.map_err(DbError::from)?;

        info!(
            sale_id = %sale.id,
            sale_number = %sale.sale_number,
            total_cents = sale.total_cents,
            lines = lines.len(),
            "Sale committed"
        );

        // Committed state is authoritative; serve the same shape the read
        // side serves.
        self.get_by_id(&sale.id)
            .await?
            .ok_or_else(|| SaleError::Storage(DbError::not_found("Sale", &sale.id)))
    }

    // =========================================================================
    // Cancel
    // =========================================================================

    /// Cancels a completed sale and restores its stock, atomically.
    ///
    /// The status flip runs first as a guarded update: the guard re-checks
    /// the current status inside the transaction, so a concurrent cancel of
    /// the same sale loses the race and reports "already cancelled". The
    /// monetary fields are left untouched.
    pub async fn cancel_sale(&self, sale_id: &str, user_id: &str) -> SaleResult<SaleWithLines> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let now = Utc::now();

        debug!(sale_id = %sale_id, user_id = %user_id, "Cancelling sale");

        let result = sqlx::query(
            r#"
            UPDATE sales SET
                status = 'cancelled',
                updated_at = ?2,
                updated_by = ?3
            WHERE id = ?1 AND status = 'completed' AND deleted = 0
            "#,
        )
        .bind(sale_id)
        .bind(now)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            // The guard refused; look at the row to say why.
            let status: Option<SaleStatus> = sqlx::query_scalar(
                "SELECT status FROM sales WHERE id = ?1 AND deleted = 0",
            )
            .bind(sale_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(DbError::from)?;

            return Err(match status {
                None => CoreError::SaleNotFound(sale_id.to_string()),
                Some(SaleStatus::Cancelled) => CoreError::AlreadyCancelled(sale_id.to_string()),
                Some(SaleStatus::Refunded) => CoreError::CannotCancelRefunded(sale_id.to_string()),
                // Guard and diagnosis disagree: the row changed under us.
                Some(SaleStatus::Completed) => CoreError::SaleNotFound(sale_id.to_string()),
            }
            .into());
        }

        // Restore stock for every line of the sale.
        let lines: Vec<(String, i64)> = sqlx::query_as(
            "SELECT inventory_id, quantity FROM sale_lines WHERE sale_id = ?1 ORDER BY line_no",
        )
        .bind(sale_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(DbError::from)?;

        for (inventory_id, quantity) in &lines {
            inventory::increment_stock(&mut tx, inventory_id, *quantity).await?;
        }

        tx.commit().await.map_err(DbError::from)?;

        info!(sale_id = %sale_id, restored_lines = lines.len(), "Sale cancelled");

        self.get_by_id(sale_id)
            .await?
            .ok_or_else(|| SaleError::Storage(DbError::not_found("Sale", sale_id)))
    }

    // =========================================================================
    // Read Side
    // =========================================================================

    /// Gets a sale assembled for the caller: header, joined display names,
    /// and lines in their original order. Soft-deleted sales are invisible.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<SaleWithLines>> {
        let header = sqlx::query_as::<_, SaleHeaderRow>(
            r#"
            SELECT
                s.id, s.sale_number, s.store_id, s.customer_id, s.user_id,
                s.subtotal_cents, s.tax_cents, s.discount_cents, s.total_cents,
                s.payment_method, s.payment_status,
                s.amount_paid_cents, s.amount_due_cents,
                s.notes, s.status, s.deleted,
                s.created_at, s.updated_at, s.updated_by,
                c.name AS customer_name,
                st.name AS store_name,
                u.full_name AS user_name
            FROM sales s
            LEFT JOIN customers c ON c.id = s.customer_id
            LEFT JOIN stores st ON st.id = s.store_id
            LEFT JOIN users u ON u.id = s.user_id
            WHERE s.id = ?1 AND s.deleted = 0
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(header) = header else {
            return Ok(None);
        };

        let lines = sqlx::query_as::<_, SaleLine>(
            r#"
            SELECT
                id, sale_id, inventory_id, line_no,
                name_snapshot, code_snapshot, unit_snapshot,
                unit_price_cents, quantity, tax_rate_bps, discount_bps,
                subtotal_cents, discount_cents, tax_cents, total_cents,
                created_at
            FROM sale_lines
            WHERE sale_id = ?1
            ORDER BY line_no
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(SaleWithLines {
            sale: header.sale,
            customer_name: header.customer_name,
            store_name: header.store_name,
            user_name: header.user_name,
            lines,
        }))
    }

    /// Lists sale headers, newest first.
    ///
    /// One static statement with optional binds; a `NULL` bind means the
    /// clause passes for every row.
    pub async fn list(&self, filter: &SaleFilter) -> DbResult<Vec<Sale>> {
        let limit = filter.limit.unwrap_or(50);
        let offset = filter.offset.unwrap_or(0);

        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT
                id, sale_number, store_id, customer_id, user_id,
                subtotal_cents, tax_cents, discount_cents, total_cents,
                payment_method, payment_status,
                amount_paid_cents, amount_due_cents,
                notes, status, deleted,
                created_at, updated_at, updated_by
            FROM sales
            WHERE deleted = 0
              AND (?1 IS NULL OR store_id = ?1)
              AND (?2 IS NULL OR customer_id = ?2)
              AND (?3 IS NULL OR payment_status = ?3)
              AND (?4 IS NULL OR status = ?4)
            ORDER BY created_at DESC
            LIMIT ?5 OFFSET ?6
            "#,
        )
        .bind(filter.store_id.as_deref())
        .bind(filter.customer_id.as_deref())
        .bind(filter.payment_status)
        .bind(filter.status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Aggregates over completed, non-deleted sales, optionally restricted
    /// to one store and a created-at range.
    pub async fn statistics(
        &self,
        store_id: Option<&str>,
        from: Option<chrono::DateTime<Utc>>,
        to: Option<chrono::DateTime<Utc>>,
    ) -> DbResult<SaleStatistics> {
        let stats = sqlx::query_as::<_, SaleStatistics>(
            r#"
            SELECT
                COUNT(*)                                      AS total_sales,
                COALESCE(SUM(total_cents), 0)                 AS total_revenue_cents,
                COALESCE(SUM(amount_paid_cents), 0)           AS total_collected_cents,
                COALESCE(SUM(amount_due_cents), 0)            AS total_outstanding_cents,
                CAST(COALESCE(AVG(total_cents), 0) AS INTEGER) AS average_sale_cents
            FROM sales
            WHERE status = 'completed'
              AND deleted = 0
              AND (?1 IS NULL OR store_id = ?1)
              AND (?2 IS NULL OR created_at >= ?2)
              AND (?3 IS NULL OR created_at <= ?3)
            "#,
        )
        .bind(store_id)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }
}

// =============================================================================
// In-Transaction Helpers
// =============================================================================

/// Draws the next sale number from the per-day counter.
///
/// The counter bump is one atomic upsert inside the sale's transaction, so
/// two concurrent sales can never draw the same number, and the sequence
/// resets each UTC day.
///
/// ## Format
/// `POS-YYYYMMDD-NNNN`, e.g. `POS-20260825-0042`
async fn next_sale_number(conn: &mut SqliteConnection) -> DbResult<String> {
    let day = Utc::now().format("%Y%m%d").to_string();

    let value: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO sale_counters (day, value) VALUES (?1, 1)
        ON CONFLICT(day) DO UPDATE SET value = value + 1
        RETURNING value
        "#,
    )
    .bind(&day)
    .fetch_one(conn)
    .await?;

    Ok(format!("POS-{}-{:04}", day, value))
}

async fn insert_sale(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sales (
            id, sale_number, store_id, customer_id, user_id,
            subtotal_cents, tax_cents, discount_cents, total_cents,
            payment_method, payment_status,
            amount_paid_cents, amount_due_cents,
            notes, status, deleted,
            created_at, updated_at, updated_by
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5,
            ?6, ?7, ?8, ?9,
            ?10, ?11,
            ?12, ?13,
            ?14, ?15, ?16,
            ?17, ?18, ?19
        )
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.sale_number)
    .bind(&sale.store_id)
    .bind(&sale.customer_id)
    .bind(&sale.user_id)
    .bind(sale.subtotal_cents)
    .bind(sale.tax_cents)
    .bind(sale.discount_cents)
    .bind(sale.total_cents)
    .bind(sale.payment_method)
    .bind(sale.payment_status)
    .bind(sale.amount_paid_cents)
    .bind(sale.amount_due_cents)
    .bind(&sale.notes)
    .bind(sale.status)
    .bind(sale.deleted)
    .bind(sale.created_at)
    .bind(sale.updated_at)
    .bind(&sale.updated_by)
    .execute(conn)
    .await?;

    Ok(())
}

async fn insert_line(conn: &mut SqliteConnection, line: &SaleLine) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sale_lines (
            id, sale_id, inventory_id, line_no,
            name_snapshot, code_snapshot, unit_snapshot,
            unit_price_cents, quantity, tax_rate_bps, discount_bps,
            subtotal_cents, discount_cents, tax_cents, total_cents,
            created_at
        ) VALUES (
            ?1, ?2, ?3, ?4,
            ?5, ?6, ?7,
            ?8, ?9, ?10, ?11,
            ?12, ?13, ?14, ?15,
            ?16
        )
        "#,
    )
    .bind(&line.id)
    .bind(&line.sale_id)
    .bind(&line.inventory_id)
    .bind(line.line_no)
    .bind(&line.name_snapshot)
    .bind(&line.code_snapshot)
    .bind(&line.unit_snapshot)
    .bind(line.unit_price_cents)
    .bind(line.quantity)
    .bind(line.tax_rate_bps)
    .bind(line.discount_bps)
    .bind(line.subtotal_cents)
    .bind(line.discount_cents)
    .bind(line.tax_cents)
    .bind(line.total_cents)
    .bind(line.created_at)
    .execute(conn)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use pos_core::{InventoryItem, ItemStatus, PaymentMethod, SaleLineRequest};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// Seeds one store, one user, one customer, and the given items.
    async fn seed(db: &Database, items: &[(&str, i64, i64, u32)]) {
        sqlx::query(
            "INSERT INTO stores (id, name, status, created_at, updated_at)
             VALUES ('s1', 'Main Street', 'active', datetime('now'), datetime('now'))",
        )
        .execute(db.pool())
        .await
        .unwrap();

        sqlx::query(
            "INSERT INTO users (id, email, full_name, status, created_at, updated_at)
             VALUES ('u1', 'cashier@example.com', 'Pat Cashier', 'active', datetime('now'), datetime('now'))",
        )
        .execute(db.pool())
        .await
        .unwrap();

        sqlx::query(
            "INSERT INTO customers (id, name, status, created_at, updated_at)
             VALUES ('c1', 'Walk-in Customer', 'active', datetime('now'), datetime('now'))",
        )
        .execute(db.pool())
        .await
        .unwrap();

        for (id, stock, price_cents, tax_rate_bps) in items {
            let now = Utc::now();
            db.inventory()
                .insert(&InventoryItem {
                    id: id.to_string(),
                    store_id: "s1".to_string(),
                    name: format!("Item {}", id),
                    code: format!("SKU-{}", id),
                    unit: "pcs".to_string(),
                    price_cents: *price_cents,
                    tax_rate_bps: *tax_rate_bps,
                    stock: *stock,
                    min_stock: 0,
                    status: ItemStatus::Active,
                    created_at: now,
                    updated_at: now,
                })
                .await
                .unwrap();
        }
    }

    fn line(inventory_id: &str, quantity: i64) -> SaleLineRequest {
        SaleLineRequest {
            inventory_id: inventory_id.to_string(),
            quantity,
            unit_price_cents: None,
            tax_rate_bps: None,
            discount_bps: None,
        }
    }

    fn request(items: Vec<SaleLineRequest>, amount_paid_cents: i64) -> CreateSaleRequest {
        CreateSaleRequest {
            store_id: "s1".to_string(),
            customer_id: Some("c1".to_string()),
            items,
            payment_method: None,
            payment_status: None,
            amount_paid_cents,
            discount_cents: None,
            notes: None,
        }
    }

    async fn stock_of(db: &Database, id: &str) -> i64 {
        db.inventory().get_by_id(id).await.unwrap().unwrap().stock
    }

    #[tokio::test]
    async fn test_create_sale_happy_path() {
        let db = test_db().await;
        seed(&db, &[("i1", 10, 1000, 1000)]).await;

        let mut req = request(vec![line("i1", 3)], 3135);
        req.items[0].discount_bps = Some(500);

        let sale = db.sales().create_sale(req, "u1").await.unwrap();

        // Reference pricing vector: 3 × 10.00, 10% tax, 5% line discount
        assert_eq!(sale.sale.subtotal_cents, 3000);
        assert_eq!(sale.sale.tax_cents, 285);
        assert_eq!(sale.sale.total_cents, 3285); // no sale-level discount
        assert_eq!(sale.lines.len(), 1);
        assert_eq!(sale.lines[0].subtotal_cents, 3000);
        assert_eq!(sale.lines[0].discount_cents, 150);
        assert_eq!(sale.lines[0].tax_cents, 285);
        assert_eq!(sale.lines[0].total_cents, 3135);

        assert_eq!(sale.sale.status, SaleStatus::Completed);
        assert_eq!(sale.sale.payment_method, PaymentMethod::Cash);
        assert!(sale.sale.sale_number.starts_with("POS-"));
        assert_eq!(sale.customer_name.as_deref(), Some("Walk-in Customer"));
        assert_eq!(sale.store_name.as_deref(), Some("Main Street"));
        assert_eq!(sale.user_name.as_deref(), Some("Pat Cashier"));

        assert_eq!(stock_of(&db, "i1").await, 7);
    }

    #[tokio::test]
    async fn test_line_order_is_preserved() {
        let db = test_db().await;
        seed(&db, &[("a", 10, 100, 0), ("b", 10, 200, 0), ("c", 10, 300, 0)]).await;

        let sale = db
            .sales()
            .create_sale(request(vec![line("c", 1), line("a", 1), line("b", 1)], 600), "u1")
            .await
            .unwrap();

        let ids: Vec<&str> = sale.lines.iter().map(|l| l.inventory_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
        assert_eq!(
            sale.lines.iter().map(|l| l.line_no).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back_everything() {
        let db = test_db().await;
        seed(&db, &[("i1", 10, 500, 0), ("i2", 1, 500, 0)]).await;

        // First line would succeed; second line must fail and undo it.
        let err = db
            .sales()
            .create_sale(request(vec![line("i1", 4), line("i2", 2)], 0), "u1")
            .await
            .unwrap_err();

        match err {
            SaleError::Rule(CoreError::InsufficientStock {
                available,
                requested,
                ..
            }) => {
                assert_eq!(available, 1);
                assert_eq!(requested, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // Nothing persisted, nothing drawn.
        assert_eq!(stock_of(&db, "i1").await, 10);
        assert_eq!(stock_of(&db, "i2").await, 1);
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_unknown_and_inactive_items_are_rejected() {
        let db = test_db().await;
        seed(&db, &[("i1", 10, 500, 0)]).await;
        sqlx::query("UPDATE inventory SET status = 'inactive' WHERE id = 'i1'")
            .execute(db.pool())
            .await
            .unwrap();

        let err = db
            .sales()
            .create_sale(request(vec![line("ghost", 1)], 0), "u1")
            .await
            .unwrap_err();
        assert!(matches!(err, SaleError::Rule(CoreError::ItemNotFound(_))));

        // Inactive items look exactly like missing ones to a sale.
        let err = db
            .sales()
            .create_sale(request(vec![line("i1", 1)], 0), "u1")
            .await
            .unwrap_err();
        assert!(matches!(err, SaleError::Rule(CoreError::ItemNotFound(_))));
    }

    #[tokio::test]
    async fn test_validation_failure_touches_nothing() {
        let db = test_db().await;
        seed(&db, &[("i1", 10, 500, 0)]).await;

        let mut req = request(vec![line("i1", 1)], 0);
        req.items[0].quantity = 0;

        let err = db.sales().create_sale(req, "u1").await.unwrap_err();
        assert!(matches!(err, SaleError::Validation(_)));
        assert_eq!(stock_of(&db, "i1").await, 10);
    }

    #[tokio::test]
    async fn test_concurrent_sales_never_oversell() {
        let db = test_db().await;
        seed(&db, &[("i1", 5, 500, 0)]).await;

        let repo = db.sales();
        let (a, b) = tokio::join!(
            repo.create_sale(request(vec![line("i1", 3)], 1500), "u1"),
            repo.create_sale(request(vec![line("i1", 3)], 1500), "u1"),
        );

        // Exactly one of the two draws can win the last units.
        let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
        assert_eq!(successes, 1);
        assert_eq!(stock_of(&db, "i1").await, 2);
    }

    #[tokio::test]
    async fn test_sale_numbers_are_sequential_and_unique() {
        let db = test_db().await;
        seed(&db, &[("i1", 10, 500, 0)]).await;

        let first = db
            .sales()
            .create_sale(request(vec![line("i1", 1)], 500), "u1")
            .await
            .unwrap();
        let second = db
            .sales()
            .create_sale(request(vec![line("i1", 1)], 500), "u1")
            .await
            .unwrap();

        let day = Utc::now().format("%Y%m%d").to_string();
        assert_eq!(first.sale.sale_number, format!("POS-{}-0001", day));
        assert_eq!(second.sale.sale_number, format!("POS-{}-0002", day));
    }

    #[tokio::test]
    async fn test_totals_reconcile_with_lines() {
        let db = test_db().await;
        seed(&db, &[("i1", 20, 333, 825), ("i2", 20, 1099, 500)]).await;

        let mut req = request(vec![line("i1", 7), line("i2", 2)], 0);
        req.items[0].discount_bps = Some(250);
        req.discount_cents = Some(100);

        let sale = db.sales().create_sale(req, "u1").await.unwrap();

        let line_subtotal: i64 = sale.lines.iter().map(|l| l.subtotal_cents).sum();
        let line_tax: i64 = sale.lines.iter().map(|l| l.tax_cents).sum();
        let line_discount: i64 = sale.lines.iter().map(|l| l.discount_cents).sum();
        let line_total: i64 = sale.lines.iter().map(|l| l.total_cents).sum();

        assert_eq!(sale.sale.subtotal_cents, line_subtotal);
        assert_eq!(sale.sale.tax_cents, line_tax);
        assert_eq!(
            sale.sale.total_cents,
            line_subtotal - sale.sale.discount_cents + line_tax
        );
        // Per-line discounts already shaped each line total; the header
        // total differs from the line sum by exactly (line discounts -
        // sale-level discount).
        assert_eq!(
            line_total,
            sale.sale.total_cents + line_discount - sale.sale.discount_cents
        );
    }

    #[tokio::test]
    async fn test_payment_status_derivation_and_override() {
        let db = test_db().await;
        seed(&db, &[("i1", 30, 1000, 0)]).await;

        let paid = db
            .sales()
            .create_sale(request(vec![line("i1", 1)], 1000), "u1")
            .await
            .unwrap();
        assert_eq!(paid.sale.payment_status, PaymentStatus::Paid);
        assert_eq!(paid.sale.amount_due_cents, 0);

        let partial = db
            .sales()
            .create_sale(request(vec![line("i1", 1)], 400), "u1")
            .await
            .unwrap();
        assert_eq!(partial.sale.payment_status, PaymentStatus::Partial);
        assert_eq!(partial.sale.amount_due_cents, 600);

        let mut req = request(vec![line("i1", 1)], 0);
        req.payment_status = Some(PaymentStatus::Pending);
        let pending = db.sales().create_sale(req, "u1").await.unwrap();
        assert_eq!(pending.sale.payment_status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_cancel_restores_stock_and_flips_status() {
        let db = test_db().await;
        seed(&db, &[("i1", 10, 500, 0), ("i2", 10, 700, 0)]).await;

        let sale = db
            .sales()
            .create_sale(request(vec![line("i1", 3), line("i2", 2)], 0), "u1")
            .await
            .unwrap();
        assert_eq!(stock_of(&db, "i1").await, 7);
        assert_eq!(stock_of(&db, "i2").await, 8);

        let cancelled = db.sales().cancel_sale(&sale.sale.id, "u2").await.unwrap();

        assert_eq!(cancelled.sale.status, SaleStatus::Cancelled);
        assert_eq!(cancelled.sale.updated_by.as_deref(), Some("u2"));
        // Monetary fields untouched
        assert_eq!(cancelled.sale.total_cents, sale.sale.total_cents);
        assert_eq!(stock_of(&db, "i1").await, 10);
        assert_eq!(stock_of(&db, "i2").await, 10);
    }

    #[tokio::test]
    async fn test_cancel_rejections() {
        let db = test_db().await;
        seed(&db, &[("i1", 10, 500, 0)]).await;

        let err = db.sales().cancel_sale("ghost", "u1").await.unwrap_err();
        assert!(matches!(err, SaleError::Rule(CoreError::SaleNotFound(_))));

        let sale = db
            .sales()
            .create_sale(request(vec![line("i1", 2)], 0), "u1")
            .await
            .unwrap();

        // Second cancel of the same sale is refused, and stock is restored
        // exactly once.
        db.sales().cancel_sale(&sale.sale.id, "u1").await.unwrap();
        let err = db.sales().cancel_sale(&sale.sale.id, "u1").await.unwrap_err();
        assert!(matches!(
            err,
            SaleError::Rule(CoreError::AlreadyCancelled(_))
        ));
        assert_eq!(stock_of(&db, "i1").await, 10);

        // Refunded sales cannot be cancelled.
        let sale = db
            .sales()
            .create_sale(request(vec![line("i1", 1)], 0), "u1")
            .await
            .unwrap();
        sqlx::query("UPDATE sales SET status = 'refunded' WHERE id = ?1")
            .bind(&sale.sale.id)
            .execute(db.pool())
            .await
            .unwrap();
        let err = db.sales().cancel_sale(&sale.sale.id, "u1").await.unwrap_err();
        assert!(matches!(
            err,
            SaleError::Rule(CoreError::CannotCancelRefunded(_))
        ));
    }

    #[tokio::test]
    async fn test_list_filters() {
        let db = test_db().await;
        seed(&db, &[("i1", 50, 1000, 0)]).await;

        let paid = db
            .sales()
            .create_sale(request(vec![line("i1", 1)], 1000), "u1")
            .await
            .unwrap();
        let partial = db
            .sales()
            .create_sale(request(vec![line("i1", 1)], 200), "u1")
            .await
            .unwrap();

        let all = db.sales().list(&SaleFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let only_partial = db
            .sales()
            .list(&SaleFilter {
                payment_status: Some(PaymentStatus::Partial),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(only_partial.len(), 1);
        assert_eq!(only_partial[0].id, partial.sale.id);

        let cancelled = db
            .sales()
            .list(&SaleFilter {
                status: Some(SaleStatus::Cancelled),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(cancelled.is_empty());

        let other_store = db
            .sales()
            .list(&SaleFilter {
                store_id: Some("s2".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(other_store.is_empty());

        let _ = paid;
    }

    #[tokio::test]
    async fn test_statistics_cover_completed_sales_only() {
        let db = test_db().await;
        seed(&db, &[("i1", 50, 1000, 0)]).await;

        db.sales()
            .create_sale(request(vec![line("i1", 2)], 2000), "u1")
            .await
            .unwrap();
        let second = db
            .sales()
            .create_sale(request(vec![line("i1", 1)], 400), "u1")
            .await
            .unwrap();
        let cancelled = db
            .sales()
            .create_sale(request(vec![line("i1", 1)], 1000), "u1")
            .await
            .unwrap();
        db.sales().cancel_sale(&cancelled.sale.id, "u1").await.unwrap();

        let stats = db.sales().statistics(Some("s1"), None, None).await.unwrap();

        assert_eq!(stats.total_sales, 2);
        assert_eq!(stats.total_revenue_cents, 3000);
        assert_eq!(stats.total_collected_cents, 2400);
        assert_eq!(stats.total_outstanding_cents, 600);
        assert_eq!(stats.average_sale_cents, 1500);

        let _ = second;
    }
}
