//! # Domain Types
//!
//! Core domain types for the retail POS transaction core.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ InventoryItem   │   │      Sale       │   │    SaleLine     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  sale_id (FK)   │       │
//! │  │  code (business)│   │  sale_number    │   │  *_snapshot     │       │
//! │  │  price_cents    │   │  status         │   │  quantity       │       │
//! │  │  stock          │   │  total_cents    │   │  total_cents    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  Wire enums (serialized snake_case, stored lowercase TEXT):             │
//! │    ItemStatus, SaleStatus, PaymentMethod, PaymentStatus                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (item code, sale number) - human-readable
//!
//! ## Fixed Schema Contract
//! These structs ARE the persisted column set. `pos-db` derives `FromRow`
//! on them (behind the `sqlx` feature), so the pricing engine's output and
//! the storage schema are verified against one definition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::{Money, Rate};

// =============================================================================
// Item Status
// =============================================================================

/// Lifecycle status of an inventory item.
///
/// Replaces the nullable deleted-at timestamp pattern with an explicit
/// state checked by every read path. `Deleted` is a pure state transition,
/// never physical removal, so historical sale lines stay intact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Sellable.
    Active,
    /// Hidden from sale but not deleted.
    Inactive,
    /// Soft-deleted; invisible to every read path.
    Deleted,
}

impl Default for ItemStatus {
    fn default() -> Self {
        ItemStatus::Active
    }
}

// =============================================================================
// Inventory Item
// =============================================================================

/// A stock-keeping unit owned by a store.
///
/// The `stock` column is the single shared mutable resource in the system.
/// It must never go negative; the only writer is the conditional atomic
/// update in the inventory ledger (`pos-db`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InventoryItem {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Store this item belongs to.
    pub store_id: String,

    /// Display name shown on receipts and error messages.
    pub name: String,

    /// Item code - business identifier, unique per store.
    pub code: String,

    /// Unit of measure (pcs, kg, box, ...).
    pub unit: String,

    /// Unit selling price in cents.
    pub price_cents: i64,

    /// Tax rate in basis points (825 = 8.25%).
    pub tax_rate_bps: u32,

    /// Current stock on hand. Invariant: never negative.
    pub stock: i64,

    /// Minimum stock threshold for the low-stock report.
    pub min_stock: i64,

    /// Lifecycle status (active / inactive / deleted).
    pub status: ItemStatus,

    /// When the item was created.
    pub created_at: DateTime<Utc>,

    /// When the item was last updated.
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    /// Returns the current price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Returns the tax rate.
    #[inline]
    pub fn tax_rate(&self) -> Rate {
        Rate::from_bps(self.tax_rate_bps)
    }

    /// Checks if the item can appear in a sale at all.
    #[inline]
    pub fn is_sellable(&self) -> bool {
        self.status == ItemStatus::Active
    }

    /// Checks if stock has fallen to or below the reorder threshold.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.min_stock
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a sale transaction.
///
/// ## State machine
/// ```text
/// (create) ──► Completed ──► Cancelled        (cancellation workflow)
///                  │
///                  └───────► Refunded         (external, terminal;
///                                              blocks cancellation)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Sale has been committed; stock was decremented.
    Completed,
    /// Sale was cancelled; stock was restored.
    Cancelled,
    /// Sale was refunded externally. Terminal; cannot be cancelled.
    Refunded,
}

// =============================================================================
// Payment Method / Payment Status
// =============================================================================

/// How the customer paid. A status label only - no settlement here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Credit,
    Mixed,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

/// Whether the sale is fully paid.
///
/// Derived from amount paid vs total at creation time (`paid` when the
/// amount due is zero or less, otherwise `partial`). `Pending` is only
/// ever a caller-supplied override, never auto-derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    Partial,
    Pending,
}

// =============================================================================
// Sale
// =============================================================================

/// One completed (or cancelled/refunded) transaction at a store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    /// Generated human-readable number (POS-YYYYMMDD-NNNN).
    pub sale_number: String,
    pub store_id: String,
    pub customer_id: Option<String>,
    /// Operator (cashier) who created the sale.
    pub user_id: String,
    /// Sum of line subtotals, before any discount.
    pub subtotal_cents: i64,
    /// Sum of line tax amounts.
    pub tax_cents: i64,
    /// Sale-level discount, distinct from per-line discounts.
    pub discount_cents: i64,
    /// (subtotal - sale-level discount) + tax.
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub amount_paid_cents: i64,
    /// total - paid. Negative means change was due.
    pub amount_due_cents: i64,
    pub notes: Option<String>,
    pub status: SaleStatus,
    /// Soft-delete flag; read paths exclude deleted sales.
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set by the cancellation workflow to the cancelling actor.
    pub updated_by: Option<String>,
}

impl Sale {
    /// Returns the grand total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Returns the outstanding amount as Money.
    #[inline]
    pub fn amount_due(&self) -> Money {
        Money::from_cents(self.amount_due_cents)
    }
}

// =============================================================================
// Sale Line
// =============================================================================

/// A line item in a sale. Immutable once committed.
///
/// Uses the snapshot pattern to freeze item data at time of sale: later
/// catalog edits (or soft-deleting the item) never touch historical lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleLine {
    pub id: String,
    pub sale_id: String,
    /// Reference (not ownership) to the inventory item sold.
    pub inventory_id: String,
    /// Position within the sale, preserving caller-supplied order.
    pub line_no: i64,
    /// Item name at time of sale (frozen).
    pub name_snapshot: String,
    /// Item code at time of sale (frozen).
    pub code_snapshot: String,
    /// Unit of measure at time of sale (frozen).
    pub unit_snapshot: String,
    /// Unit price actually charged, in cents.
    pub unit_price_cents: i64,
    /// Quantity sold.
    pub quantity: i64,
    /// Tax rate applied, in basis points.
    pub tax_rate_bps: u32,
    /// Per-line discount applied, in basis points.
    pub discount_bps: u32,
    /// quantity × unit price.
    pub subtotal_cents: i64,
    /// subtotal × discount rate.
    pub discount_cents: i64,
    /// (subtotal - discount) × tax rate.
    pub tax_cents: i64,
    /// (subtotal - discount) + tax.
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl SaleLine {
    /// Returns the line total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Requests
// =============================================================================

/// One requested line within a create-sale request.
///
/// Optional fields fall back to the inventory item's current values
/// (`unit_price_cents`, `tax_rate_bps`) or to zero (`discount_bps`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleLineRequest {
    pub inventory_id: String,
    pub quantity: i64,
    pub unit_price_cents: Option<i64>,
    pub tax_rate_bps: Option<u32>,
    pub discount_bps: Option<u32>,
}

/// A create-sale request as handed over by the HTTP layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSaleRequest {
    pub store_id: String,
    pub customer_id: Option<String>,
    /// Processed in the order supplied; the first failing line determines
    /// the reported error.
    pub items: Vec<SaleLineRequest>,
    pub payment_method: Option<PaymentMethod>,
    /// Overrides the derived payment status when supplied.
    pub payment_status: Option<PaymentStatus>,
    pub amount_paid_cents: i64,
    /// Optional sale-level discount in cents.
    pub discount_cents: Option<i64>,
    pub notes: Option<String>,
}

// =============================================================================
// Assembled Read Shape
// =============================================================================

/// A sale assembled for the caller: header, joined display names, and the
/// ordered line items. This is the shape both CreateSale and CancelSale
/// return, and what the read side serves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleWithLines {
    #[serde(flatten)]
    pub sale: Sale,
    /// Customer display name, if a customer was attached.
    pub customer_name: Option<String>,
    /// Store display name.
    pub store_name: Option<String>,
    /// Operator display name.
    pub user_name: Option<String>,
    /// Lines in caller-supplied order.
    pub lines: Vec<SaleLine>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_labels() {
        // The HTTP layer round-trips these exact labels.
        assert_eq!(
            serde_json::to_value(PaymentMethod::Cash).unwrap(),
            serde_json::json!("cash")
        );
        assert_eq!(
            serde_json::to_value(PaymentStatus::Partial).unwrap(),
            serde_json::json!("partial")
        );
        assert_eq!(
            serde_json::to_value(SaleStatus::Completed).unwrap(),
            serde_json::json!("completed")
        );
        assert_eq!(
            serde_json::to_value(ItemStatus::Inactive).unwrap(),
            serde_json::json!("inactive")
        );

        let status: SaleStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(status, SaleStatus::Cancelled);
    }

    #[test]
    fn test_item_helpers() {
        let item = InventoryItem {
            id: "i1".to_string(),
            store_id: "s1".to_string(),
            name: "Basmati Rice 5kg".to_string(),
            code: "RICE-5KG".to_string(),
            unit: "bag".to_string(),
            price_cents: 1299,
            tax_rate_bps: 500,
            stock: 3,
            min_stock: 5,
            status: ItemStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(item.is_sellable());
        assert!(item.is_low_stock());
        assert_eq!(item.price().cents(), 1299);
        assert_eq!(item.tax_rate().bps(), 500);

        let inactive = InventoryItem {
            status: ItemStatus::Inactive,
            ..item
        };
        assert!(!inactive.is_sellable());
    }

    #[test]
    fn test_default_payment_method_is_cash() {
        assert_eq!(PaymentMethod::default(), PaymentMethod::Cash);
    }
}
