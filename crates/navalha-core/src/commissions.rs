//! # Commission Ledger
//!
//! Recomputes, per barber and date range, what the shop owes: percentage
//! commission on service sales, fixed per-product commissions, tips, minus
//! advances already paid out.
//!
//! ## Per-Sale Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  fixed product_commission != 0  ──► use it verbatim (overrides %)       │
//! │  tip record ("Caixinha / Gorjeta") ─► tip total, never % commission     │
//! │  otherwise ──► price × rate                                             │
//! │                                                                         │
//! │  rate = the snapshot frozen on the sale at finalize time;               │
//! │         legacy rows without one fall back to the barber's live rate     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The snapshot-first rule means editing a barber's percentage changes
//! future statements only; already-finalized periods keep the rate they
//! were sold under.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Barber, Rate, SaleRecord};

// =============================================================================
// Professional Resolution
// =============================================================================

/// Whether a sale is attributed to a barber.
///
/// Prefers the id foreign key; rows imported before ids were written fall
/// back to a case-insensitive display-name match. This is the only place in
/// the engine that branches on the legacy name reference.
pub fn attributed_to(sale: &SaleRecord, barber: &Barber) -> bool {
    match sale.barber_id.as_deref() {
        Some(id) => id == barber.id,
        None => sale
            .barber_name
            .as_deref()
            .map(|name| name.eq_ignore_ascii_case(&barber.name))
            .unwrap_or(false),
    }
}

/// Resolves the barber a sale belongs to, id first, legacy name second.
pub fn resolve_professional<'a>(sale: &SaleRecord, barbers: &'a [Barber]) -> Option<&'a Barber> {
    if let Some(id) = sale.barber_id.as_deref() {
        return barbers.iter().find(|b| b.id == id);
    }
    let name = sale.barber_name.as_deref()?;
    barbers.iter().find(|b| b.name.eq_ignore_ascii_case(name))
}

// =============================================================================
// Per-Sale Commission
// =============================================================================

/// The commission one sale generates.
///
/// Tip records generate none here - their value flows into the tip total
/// inside [`statement`].
pub fn sale_commission(sale: &SaleRecord, fallback_rate: Rate) -> Money {
    if sale.product_commission_cents != 0 {
        return Money::from_cents(sale.product_commission_cents);
    }
    if sale.is_tip_record() {
        return Money::zero();
    }
    let rate = sale
        .commission_rate_bps
        .map(Rate::from_bps)
        .unwrap_or(fallback_rate);
    sale.price().apply_rate(rate)
}

// =============================================================================
// Statement
// =============================================================================

/// One barber's payable summary for a queried date range.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CommissionStatement {
    pub barber_id: String,
    pub barber_name: String,
    /// Number of attributed sales in range (tip records included).
    pub sale_count: usize,
    /// Gross value of attributed non-tip sales, in cents.
    pub gross_cents: i64,
    pub commission_cents: i64,
    pub tip_cents: i64,
    /// Operator-entered advances/expenses already paid to the barber.
    pub advances_cents: i64,
    /// commissions + tips − advances.
    pub net_payable_cents: i64,
}

/// Builds the statement for one barber over a pre-filtered date range of
/// finalized sales. Sales not attributed to the barber are skipped, so the
/// caller may pass the whole range unfiltered.
pub fn statement(barber: &Barber, sales: &[SaleRecord], advances_cents: i64) -> CommissionStatement {
    let mut gross = Money::zero();
    let mut commission = Money::zero();
    let mut tips = Money::zero();
    let mut count = 0usize;

    for sale in sales.iter().filter(|s| attributed_to(s, barber)) {
        count += 1;
        tips += Money::from_cents(sale.tip_cents);

        if sale.is_tip_record() {
            // Standalone caixinha rows carry their value in price.
            tips += sale.price();
            continue;
        }

        gross += sale.price();
        commission += sale_commission(sale, barber.commission_rate());
    }

    let net = commission + tips - Money::from_cents(advances_cents);

    CommissionStatement {
        barber_id: barber.id.clone(),
        barber_name: barber.name.clone(),
        sale_count: count,
        gross_cents: gross.cents(),
        commission_cents: commission.cents(),
        tip_cents: tips.cents(),
        advances_cents,
        net_payable_cents: net.cents(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WeekSchedule;
    use chrono::Utc;

    fn barber(id: &str, name: &str, rate_bps: u32) -> Barber {
        Barber {
            id: id.to_string(),
            shop_id: "s1".to_string(),
            name: name.to_string(),
            commission_rate_bps: rate_bps,
            schedule: WeekSchedule::default(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn sale(barber_id: Option<&str>, barber_name: Option<&str>, price_cents: i64) -> SaleRecord {
        SaleRecord {
            id: "sale".to_string(),
            shop_id: "s1".to_string(),
            barber_id: barber_id.map(str::to_string),
            barber_name: barber_name.map(str::to_string),
            service_name: "Corte".to_string(),
            date: "2026-03-02".to_string(),
            price_cents,
            tip_cents: 0,
            product_commission_cents: 0,
            commission_rate_bps: None,
            payment_label: None,
            batch_sale_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_percentage_commission() {
        // 20% over two 50.00 sales = 20.00
        let b = barber("b1", "Rafael", 2000);
        let sales = vec![sale(Some("b1"), None, 5000), sale(Some("b1"), None, 5000)];

        let stmt = statement(&b, &sales, 0);
        assert_eq!(stmt.commission_cents, 2000);
        assert_eq!(stmt.gross_cents, 10000);
        assert_eq!(stmt.tip_cents, 0);
        assert_eq!(stmt.net_payable_cents, 2000);
    }

    #[test]
    fn test_tip_record_feeds_tip_total_only() {
        let b = barber("b1", "Rafael", 2000);
        let mut tip_row = sale(Some("b1"), None, 0);
        tip_row.service_name = crate::TIP_SERVICE_NAME.to_string();
        tip_row.tip_cents = 1000;

        let sales = vec![sale(Some("b1"), None, 5000), sale(Some("b1"), None, 5000), tip_row];
        let stmt = statement(&b, &sales, 0);
        assert_eq!(stmt.commission_cents, 2000); // unchanged
        assert_eq!(stmt.tip_cents, 1000);
        assert_eq!(stmt.net_payable_cents, 3000);
    }

    #[test]
    fn test_tip_record_price_counts_as_tip() {
        let b = barber("b1", "Rafael", 2000);
        let mut tip_row = sale(Some("b1"), None, 1500);
        tip_row.service_name = crate::TIP_SERVICE_NAME.to_string();

        let stmt = statement(&b, &[tip_row], 0);
        assert_eq!(stmt.commission_cents, 0);
        assert_eq!(stmt.gross_cents, 0);
        assert_eq!(stmt.tip_cents, 1500);
    }

    #[test]
    fn test_fixed_product_commission_overrides_percentage() {
        let b = barber("b1", "Rafael", 2000);
        let mut product = sale(Some("b1"), None, 2500);
        product.product_commission_cents = 300;

        let stmt = statement(&b, &[product], 0);
        assert_eq!(stmt.commission_cents, 300);
    }

    #[test]
    fn test_rate_snapshot_preferred_over_live_rate() {
        // Sale finalized under 10%; barber later moved to 20%.
        let b = barber("b1", "Rafael", 2000);
        let mut old_sale = sale(Some("b1"), None, 10000);
        old_sale.commission_rate_bps = Some(1000);

        let stmt = statement(&b, &[old_sale, sale(Some("b1"), None, 10000)], 0);
        // 10% of 100.00 + live 20% of 100.00
        assert_eq!(stmt.commission_cents, 1000 + 2000);
    }

    #[test]
    fn test_advances_deducted() {
        let b = barber("b1", "Rafael", 2000);
        let sales = vec![sale(Some("b1"), None, 10000)];
        let stmt = statement(&b, &sales, 500);
        assert_eq!(stmt.net_payable_cents, 2000 - 500);
    }

    #[test]
    fn test_attribution_by_id_then_legacy_name() {
        let b = barber("b1", "Rafael", 2000);

        assert!(attributed_to(&sale(Some("b1"), None, 100), &b));
        assert!(!attributed_to(&sale(Some("b2"), Some("Rafael"), 100), &b));
        assert!(attributed_to(&sale(None, Some("RAFAEL"), 100), &b));
        assert!(!attributed_to(&sale(None, None, 100), &b));
    }

    #[test]
    fn test_resolve_professional() {
        let barbers = vec![barber("b1", "Rafael", 2000), barber("b2", "Igor", 1500)];

        let by_id = resolve_professional(&sale(Some("b2"), None, 100), &barbers);
        assert_eq!(by_id.map(|b| b.name.as_str()), Some("Igor"));

        let by_name = resolve_professional(&sale(None, Some("rafael"), 100), &barbers);
        assert_eq!(by_name.map(|b| b.id.as_str()), Some("b1"));

        assert!(resolve_professional(&sale(None, Some("Bruno"), 100), &barbers).is_none());
    }
}
