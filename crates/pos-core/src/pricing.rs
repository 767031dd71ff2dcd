//! # Sale Pricing Engine
//!
//! Pure, side-effect-free pricing computation.
//!
//! ## Per-Line Calculation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  subtotal        = quantity × unit_price                               │
//! │  discount_amount = subtotal × discount_rate                            │
//! │  taxable_base    = subtotal - discount_amount                          │
//! │  tax_amount      = taxable_base × tax_rate                             │
//! │  line_total      = taxable_base + tax_amount                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Sale-Level Aggregation
//! ```text
//! sale.subtotal = Σ line.subtotal
//! sale.tax      = Σ line.tax
//! sale.total    = (sale.subtotal - sale_discount) + sale.tax
//! amount_due    = sale.total - amount_paid
//! ```
//! The sale-level discount is separate from per-line discounts and is
//! subtracted exactly once from the summed subtotal.
//!
//! All amounts are integer cents, all rates basis points; every derived
//! amount is rounded half-up at the point it is computed, so the stored
//! line fields always re-add exactly.

use serde::{Deserialize, Serialize};

use crate::money::{Money, Rate};
use crate::types::PaymentStatus;

// =============================================================================
// Line Pricing
// =============================================================================

/// The four derived monetary fields of one sale line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinePricing {
    /// quantity × unit price.
    pub subtotal: Money,
    /// subtotal × discount rate.
    pub discount: Money,
    /// (subtotal - discount) × tax rate.
    pub tax: Money,
    /// (subtotal - discount) + tax.
    pub total: Money,
}

/// Prices one line.
///
/// The caller is responsible for fail-fast validation (positive quantity,
/// non-negative price, rates within 0–100%) before any pricing runs; this
/// function assumes validated input.
///
/// ## Example
/// ```rust
/// use pos_core::money::{Money, Rate};
/// use pos_core::pricing::price_line;
///
/// // 3 × $10.00, 10% tax, 5% discount
/// let line = price_line(3, Money::from_cents(1000), Rate::from_bps(1000), Rate::from_bps(500));
/// assert_eq!(line.subtotal.cents(), 3000);
/// assert_eq!(line.discount.cents(), 150);
/// assert_eq!(line.tax.cents(), 285);
/// assert_eq!(line.total.cents(), 3135);
/// ```
pub fn price_line(quantity: i64, unit_price: Money, tax_rate: Rate, discount_rate: Rate) -> LinePricing {
    let subtotal = unit_price.multiply_quantity(quantity);
    let discount = subtotal.portion(discount_rate);
    let taxable = subtotal - discount;
    let tax = taxable.portion(tax_rate);

    LinePricing {
        subtotal,
        discount,
        tax,
        total: taxable + tax,
    }
}

// =============================================================================
// Sale Totals
// =============================================================================

/// Running sale-level totals, accumulated line by line in caller order.
#[derive(Debug, Clone, Copy, Default)]
pub struct SaleTotals {
    subtotal: Money,
    tax: Money,
    line_discount: Money,
}

impl SaleTotals {
    /// Starts with zero totals.
    pub fn new() -> Self {
        SaleTotals::default()
    }

    /// Accumulates one priced line.
    pub fn add_line(&mut self, line: &LinePricing) {
        self.subtotal += line.subtotal;
        self.tax += line.tax;
        self.line_discount += line.discount;
    }

    /// Sum of line subtotals so far.
    #[inline]
    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    /// Sum of line tax amounts so far.
    #[inline]
    pub fn tax(&self) -> Money {
        self.tax
    }

    /// Sum of per-line discounts so far. Informational: per-line discounts
    /// already shaped each line's tax and total, so they are NOT subtracted
    /// again at sale level.
    #[inline]
    pub fn line_discount(&self) -> Money {
        self.line_discount
    }

    /// Applies the sale-level discount and payment to produce the final
    /// header amounts.
    pub fn finish(self, sale_discount: Money, amount_paid: Money) -> SaleAmounts {
        let total = (self.subtotal - sale_discount) + self.tax;
        let amount_due = total - amount_paid;

        SaleAmounts {
            subtotal: self.subtotal,
            tax: self.tax,
            discount: sale_discount,
            total,
            amount_paid,
            amount_due,
        }
    }
}

/// Final sale-header amounts produced by [`SaleTotals::finish`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleAmounts {
    pub subtotal: Money,
    pub tax: Money,
    /// Sale-level discount only.
    pub discount: Money,
    pub total: Money,
    pub amount_paid: Money,
    pub amount_due: Money,
}

impl SaleAmounts {
    /// Derives the payment status, honoring an explicit caller override.
    ///
    /// ## Rules
    /// - Override supplied → use it verbatim (this is the only way a sale
    ///   is created as `pending`)
    /// - amount_due <= 0 → `paid`
    /// - otherwise → `partial`
    pub fn payment_status(&self, override_status: Option<PaymentStatus>) -> PaymentStatus {
        if let Some(status) = override_status {
            return status;
        }

        if self.amount_due.cents() <= 0 {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Partial
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_line_reference_vector() {
        // quantity=3, unit_price=10.00, tax=10%, discount=5%
        let line = price_line(
            3,
            Money::from_cents(1000),
            Rate::from_bps(1000),
            Rate::from_bps(500),
        );

        assert_eq!(line.subtotal.cents(), 3000); // 30.00
        assert_eq!(line.discount.cents(), 150); // 1.50
        assert_eq!(line.tax.cents(), 285); // 2.85
        assert_eq!(line.total.cents(), 3135); // 31.35
    }

    #[test]
    fn test_price_line_no_discount_no_tax() {
        let line = price_line(2, Money::from_cents(450), Rate::zero(), Rate::zero());

        assert_eq!(line.subtotal.cents(), 900);
        assert_eq!(line.discount.cents(), 0);
        assert_eq!(line.tax.cents(), 0);
        assert_eq!(line.total.cents(), 900);
    }

    #[test]
    fn test_price_line_full_discount() {
        // 100% discount leaves nothing to tax.
        let line = price_line(
            1,
            Money::from_cents(999),
            Rate::from_bps(1000),
            Rate::from_bps(10_000),
        );

        assert_eq!(line.discount.cents(), 999);
        assert_eq!(line.tax.cents(), 0);
        assert_eq!(line.total.cents(), 0);
    }

    #[test]
    fn test_line_components_re_add() {
        // subtotal - discount + tax must equal total for any line, since
        // rounding happens once per derived amount.
        let line = price_line(
            7,
            Money::from_cents(333),
            Rate::from_bps(825),
            Rate::from_bps(250),
        );

        assert_eq!(
            (line.subtotal - line.discount + line.tax).cents(),
            line.total.cents()
        );
    }

    #[test]
    fn test_sale_totals_aggregation() {
        let a = price_line(3, Money::from_cents(1000), Rate::from_bps(1000), Rate::from_bps(500));
        let b = price_line(1, Money::from_cents(500), Rate::zero(), Rate::zero());

        let mut totals = SaleTotals::new();
        totals.add_line(&a);
        totals.add_line(&b);

        assert_eq!(totals.subtotal().cents(), 3500);
        assert_eq!(totals.tax().cents(), 285);
        assert_eq!(totals.line_discount().cents(), 150);

        // 2.00 sale-level discount, 30.00 paid
        let amounts = totals.finish(Money::from_cents(200), Money::from_cents(3000));
        assert_eq!(amounts.total.cents(), 3500 - 200 + 285);
        assert_eq!(amounts.amount_due.cents(), 3585 - 3000);
    }

    #[test]
    fn test_payment_status_derivation() {
        let mut totals = SaleTotals::new();
        totals.add_line(&price_line(
            1,
            Money::from_cents(1000),
            Rate::zero(),
            Rate::zero(),
        ));

        // Paid in full
        let paid = totals.finish(Money::zero(), Money::from_cents(1000));
        assert_eq!(paid.payment_status(None), PaymentStatus::Paid);

        // Overpaid still derives paid
        let overpaid = totals.finish(Money::zero(), Money::from_cents(1500));
        assert_eq!(overpaid.payment_status(None), PaymentStatus::Paid);

        // Underpaid derives partial
        let partial = totals.finish(Money::zero(), Money::from_cents(400));
        assert_eq!(partial.payment_status(None), PaymentStatus::Partial);

        // Pending is never derived, only supplied
        assert_eq!(
            partial.payment_status(Some(PaymentStatus::Pending)),
            PaymentStatus::Pending
        );
    }
}
