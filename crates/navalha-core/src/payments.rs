//! # Payment Split Ledger
//!
//! Settles one checkout's tender: gross received per method, fee deduction,
//! net receivable, and the nominal discount when the operator accepts less
//! than the total due.
//!
//! ## Settlement Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  cart_total + tip ──► total_due                                         │
//! │                                                                         │
//! │  tenders {pix: 60.00, credito: 40.00}                                   │
//! │       │                                                                 │
//! │       ├── per method: fee = amount × fee_bps, net = amount − fee       │
//! │       │                                                                 │
//! │       ├── nominal_discount = max(0, due − tendered)                    │
//! │       │   (shortfall is an approved price cut, not an error - but      │
//! │       │    beyond 1 cent it needs explicit operator confirmation)      │
//! │       │                                                                 │
//! │       └── GUARANTEE: net_total == tendered − fees, exactly             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The reconciliation guarantee holds by construction: each method's net is
//! literally `amount - fee`, so the sums cannot drift apart no matter how
//! the per-method rounding falls.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{PaymentMethod, Rate};
use crate::DISCOUNT_EPSILON_CENTS;

// =============================================================================
// Fee Schedule
// =============================================================================

/// Per-method percentage fees, in basis points.
///
/// Methods without an entry are fee-free (dinheiro, pix and pacote usually
/// are; cards usually are not).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeeSchedule {
    rates: BTreeMap<PaymentMethod, u32>,
}

impl FeeSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style rate registration.
    pub fn with_rate(mut self, method: PaymentMethod, rate: Rate) -> Self {
        self.rates.insert(method, rate.bps());
        self
    }

    /// The fee rate for a method (zero when unset).
    pub fn rate(&self, method: PaymentMethod) -> Rate {
        Rate::from_bps(self.rates.get(&method).copied().unwrap_or(0))
    }
}

// =============================================================================
// Tender & Settlement Types
// =============================================================================

/// One method's tendered amount, as entered by the operator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Tender {
    pub method: PaymentMethod,
    pub amount_cents: i64,
}

/// One method's settled slice of the checkout.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MethodSettlement {
    pub method: PaymentMethod,
    pub amount_cents: i64,
    pub fee_cents: i64,
    pub net_cents: i64,
}

/// The settled checkout.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SplitLedger {
    pub total_due_cents: i64,
    pub total_tendered_cents: i64,
    /// Shortfall between due and tendered, floored at zero.
    pub nominal_discount_cents: i64,
    pub total_fees_cents: i64,
    pub net_total_cents: i64,
    /// Per-method breakdown, in the order tendered.
    pub methods: Vec<MethodSettlement>,
    /// More than one method carries a positive amount.
    pub is_mixed: bool,
    /// The shortfall exceeds the rounding epsilon and the cart holds no
    /// package redemption - finalize must not proceed until the operator
    /// confirms the discount.
    pub requires_discount_confirmation: bool,
}

// =============================================================================
// Settlement
// =============================================================================

/// Settles a checkout's tender against its total due.
///
/// ## Errors
/// - [`CoreError::InvalidPaymentAmount`] for a negative tender amount.
/// - [`CoreError::MixedPackagePayment`] when the cart redeems package
///   credits but the tender is anything other than `pacote` alone.
pub fn settle(
    cart_total_cents: i64,
    tip_cents: i64,
    tenders: &[Tender],
    fees: &FeeSchedule,
    has_package_in_cart: bool,
) -> CoreResult<SplitLedger> {
    for tender in tenders {
        if tender.amount_cents < 0 {
            return Err(CoreError::InvalidPaymentAmount {
                reason: format!(
                    "negative amount for {}: {}",
                    tender.method.as_str(),
                    tender.amount_cents
                ),
            });
        }
    }

    let active: Vec<&Tender> = tenders.iter().filter(|t| t.amount_cents > 0).collect();

    if has_package_in_cart
        && active
            .iter()
            .any(|t| t.method != PaymentMethod::Pacote)
    {
        return Err(CoreError::MixedPackagePayment);
    }

    let total_due = cart_total_cents + tip_cents;
    let total_tendered: i64 = active.iter().map(|t| t.amount_cents).sum();
    let nominal_discount = (total_due - total_tendered).max(0);

    let mut methods = Vec::with_capacity(active.len());
    let mut total_fees: i64 = 0;
    let mut net_total: i64 = 0;

    for tender in &active {
        let amount = Money::from_cents(tender.amount_cents);
        let fee = amount.apply_rate(fees.rate(tender.method));
        let net = amount - fee;
        total_fees += fee.cents();
        net_total += net.cents();
        methods.push(MethodSettlement {
            method: tender.method,
            amount_cents: amount.cents(),
            fee_cents: fee.cents(),
            net_cents: net.cents(),
        });
    }

    Ok(SplitLedger {
        total_due_cents: total_due,
        total_tendered_cents: total_tendered,
        nominal_discount_cents: nominal_discount,
        total_fees_cents: total_fees,
        net_total_cents: net_total,
        is_mixed: methods.len() > 1,
        requires_discount_confirmation: !has_package_in_cart
            && nominal_discount > DISCOUNT_EPSILON_CENTS,
        methods,
    })
}

/// Attributes a single cart line's net value for commission purposes.
///
/// - Package-covered lines (price 0) net to 0 regardless of method.
/// - Single-method tender: `price − fee(price)` for the active method.
/// - Mixed tender: the line's gross is apportioned across methods in
///   proportion to `amount / total_due`, each slice takes its method's fee,
///   and the net slices are summed.
pub fn line_net_cents(line_price_cents: i64, ledger: &SplitLedger, fees: &FeeSchedule) -> i64 {
    if line_price_cents == 0 {
        return 0;
    }
    let price = Money::from_cents(line_price_cents);

    if !ledger.is_mixed {
        let method = match ledger.methods.first() {
            Some(settlement) => settlement.method,
            None => return line_price_cents,
        };
        return (price - price.apply_rate(fees.rate(method))).cents();
    }

    ledger
        .methods
        .iter()
        .map(|settlement| {
            let slice = price.proportion(settlement.amount_cents, ledger.total_due_cents);
            (slice - slice.apply_rate(fees.rate(settlement.method))).cents()
        })
        .sum()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn card_fees() -> FeeSchedule {
        FeeSchedule::new()
            .with_rate(PaymentMethod::Credito, Rate::from_bps(500))
            .with_rate(PaymentMethod::Debito, Rate::from_bps(200))
    }

    #[test]
    fn test_split_pix_credito() {
        // Cart 100.00, no tip, pix 60 + credito 40, credito fee 5%:
        // fees = 2.00, net = 98.00, no discount.
        let tenders = [
            Tender { method: PaymentMethod::Pix, amount_cents: 6000 },
            Tender { method: PaymentMethod::Credito, amount_cents: 4000 },
        ];
        let ledger = settle(10000, 0, &tenders, &card_fees(), false).unwrap();

        assert_eq!(ledger.total_due_cents, 10000);
        assert_eq!(ledger.total_tendered_cents, 10000);
        assert_eq!(ledger.total_fees_cents, 200);
        assert_eq!(ledger.net_total_cents, 9800);
        assert_eq!(ledger.nominal_discount_cents, 0);
        assert!(ledger.is_mixed);
        assert!(!ledger.requires_discount_confirmation);
    }

    #[test]
    fn test_shortfall_becomes_nominal_discount() {
        let tenders = [Tender { method: PaymentMethod::Dinheiro, amount_cents: 9000 }];
        let ledger = settle(10000, 0, &tenders, &FeeSchedule::new(), false).unwrap();

        assert_eq!(ledger.nominal_discount_cents, 1000);
        assert!(ledger.requires_discount_confirmation);
    }

    #[test]
    fn test_one_cent_shortfall_needs_no_confirmation() {
        let tenders = [Tender { method: PaymentMethod::Pix, amount_cents: 9999 }];
        let ledger = settle(10000, 0, &tenders, &FeeSchedule::new(), false).unwrap();

        assert_eq!(ledger.nominal_discount_cents, 1);
        assert!(!ledger.requires_discount_confirmation);
    }

    #[test]
    fn test_overpayment_is_not_a_discount() {
        let tenders = [Tender { method: PaymentMethod::Dinheiro, amount_cents: 12000 }];
        let ledger = settle(10000, 0, &tenders, &FeeSchedule::new(), false).unwrap();
        assert_eq!(ledger.nominal_discount_cents, 0);
    }

    #[test]
    fn test_tip_enters_total_due() {
        let tenders = [Tender { method: PaymentMethod::Pix, amount_cents: 11000 }];
        let ledger = settle(10000, 1000, &tenders, &FeeSchedule::new(), false).unwrap();
        assert_eq!(ledger.total_due_cents, 11000);
        assert_eq!(ledger.nominal_discount_cents, 0);
    }

    #[test]
    fn test_package_cart_rejects_other_tenders() {
        let tenders = [
            Tender { method: PaymentMethod::Pacote, amount_cents: 0 },
            Tender { method: PaymentMethod::Pix, amount_cents: 4500 },
        ];
        let err = settle(4500, 0, &tenders, &FeeSchedule::new(), true).unwrap_err();
        assert!(matches!(err, CoreError::MixedPackagePayment));
    }

    #[test]
    fn test_negative_tender_rejected() {
        let tenders = [Tender { method: PaymentMethod::Pix, amount_cents: -100 }];
        let err = settle(10000, 0, &tenders, &FeeSchedule::new(), false).unwrap_err();
        assert!(matches!(err, CoreError::InvalidPaymentAmount { .. }));
    }

    #[test]
    fn test_line_net_single_method() {
        let tenders = [Tender { method: PaymentMethod::Credito, amount_cents: 10000 }];
        let ledger = settle(10000, 0, &tenders, &card_fees(), false).unwrap();

        // 45.00 line at 5% credito fee nets 42.75
        assert_eq!(line_net_cents(4500, &ledger, &card_fees()), 4275);
        // Package-covered lines always net to zero
        assert_eq!(line_net_cents(0, &ledger, &card_fees()), 0);
    }

    #[test]
    fn test_line_net_mixed_apportionment() {
        // Due 100.00, pix 60 / credito 40 (5%):
        // a 50.00 line splits 30.00 pix (no fee) + 20.00 credito (fee 1.00).
        let tenders = [
            Tender { method: PaymentMethod::Pix, amount_cents: 6000 },
            Tender { method: PaymentMethod::Credito, amount_cents: 4000 },
        ];
        let fees = card_fees();
        let ledger = settle(10000, 0, &tenders, &fees, false).unwrap();

        assert_eq!(line_net_cents(5000, &ledger, &fees), 3000 + 2000 - 100);
    }

    /// Reconciliation invariant: net_total == tendered − fees for any
    /// combination of methods and amounts. Exercised over pseudo-random
    /// splits from a fixed-seed generator so the case set is stable.
    #[test]
    fn test_reconciliation_invariant_random_splits() {
        let fees = FeeSchedule::new()
            .with_rate(PaymentMethod::Credito, Rate::from_bps(499))
            .with_rate(PaymentMethod::Debito, Rate::from_bps(173))
            .with_rate(PaymentMethod::Pix, Rate::from_bps(99));

        let mut seed: u64 = 0x5DEECE66D;
        let mut next = move || {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (seed >> 33) as i64
        };

        for _ in 0..500 {
            let tenders: Vec<Tender> = PaymentMethod::ALL
                .iter()
                .filter(|m| **m != PaymentMethod::Pacote)
                .map(|m| Tender { method: *m, amount_cents: next() % 20_000 })
                .map(|t| Tender { method: t.method, amount_cents: t.amount_cents.abs() })
                .collect();
            let cart_total = (next() % 50_000).abs();
            let tip = (next() % 3_000).abs();

            let ledger = settle(cart_total, tip, &tenders, &fees, false).unwrap();
            assert_eq!(
                ledger.net_total_cents,
                ledger.total_tendered_cents - ledger.total_fees_cents,
                "reconciliation failed for {ledger:?}"
            );
        }
    }
}
