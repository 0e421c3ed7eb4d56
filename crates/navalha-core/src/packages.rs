//! # Package/Credit Resolver
//!
//! Decides which cart lines are covered by a customer's prepaid package and
//! how many credits the checkout consumes.
//!
//! ## Redemption Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  A cart line is package-eligible iff                                    │
//! │    • it is a SERVICE line (products never redeem credits), AND          │
//! │    • the package name contains the service name (case-insensitive),    │
//! │      OR the package name equals "combo" (case-insensitive).            │
//! │                                                                         │
//! │  Pricing of an eligible unit:                                           │
//! │    • very first redemption of the package (used_credits == 0):         │
//! │        unit priced at the package's price_paid                          │
//! │    • every later redemption: unit priced at 0                           │
//! │                                                                         │
//! │  Units beyond the remaining credits pay catalog price.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The first-redemption rule attributes the full package value to the first
//! visit, so that visit's revenue report carries the bundle price even
//! though the bundle was also charged when sold. That double counting is a
//! long-standing property of the reports this feeds and is preserved
//! deliberately.
//!
//! When any credit is consumed, the checkout must be tendered with the
//! single `pacote` method - redemptions cannot be split against cash or
//! cards. [`PackagePricing::has_package_in_cart`] is that gate.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::CustomerPackage;
use crate::COMBO_PACKAGE_NAME;

// =============================================================================
// Cart Types
// =============================================================================

/// What kind of catalog entry a cart line refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
    Service,
    Product,
}

/// One line of a checkout cart, as assembled by the POS screen.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    /// Catalog id of the service or inventory item.
    pub item_id: String,
    pub name: String,
    pub kind: CatalogKind,
    pub quantity: i64,
    /// Catalog unit price in cents, frozen when the line was added.
    pub unit_price_cents: i64,
}

impl CartLine {
    /// Catalog total for the line, before any package coverage.
    #[inline]
    pub fn catalog_total_cents(&self) -> i64 {
        self.unit_price_cents * self.quantity
    }
}

// =============================================================================
// Pricing Output
// =============================================================================

/// A cart line with its package-resolved effective price.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PricedLine {
    /// Index into the input cart.
    pub line_index: usize,
    /// Effective total for the line after package coverage, in cents.
    pub effective_total_cents: i64,
    /// How many of this line's units consumed a credit.
    pub credits_applied: i64,
}

/// The resolver's full answer for one cart + package combination.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PackagePricing {
    pub lines: Vec<PricedLine>,
    /// Sum of effective line totals, in cents.
    pub cart_total_cents: i64,
    /// Total credits this checkout will redeem.
    pub credits_consumed: i64,
    /// True when any credit is consumed; forces the single `pacote` tender.
    pub has_package_in_cart: bool,
    /// The package the credits come from, if any were consumed.
    pub package_id: Option<String>,
}

// =============================================================================
// Resolution
// =============================================================================

/// Eligibility predicate for one line against one package name.
pub fn line_is_eligible(line: &CartLine, package_name: &str) -> bool {
    if line.kind != CatalogKind::Service {
        return false;
    }
    let package_lower = package_name.to_lowercase();
    package_lower == COMBO_PACKAGE_NAME || package_lower.contains(&line.name.to_lowercase())
}

/// Picks the package a checkout redeems from: the first active one in
/// creation order.
///
/// When two active packages could both match a cart, creation order decides.
/// The callers pass packages ordered by `created_at`, making the choice
/// deterministic instead of dependent on query plan.
pub fn select_package(packages: &[CustomerPackage]) -> Option<&CustomerPackage> {
    packages.iter().find(|p| p.is_active())
}

/// Resolves per-line effective prices and the credits consumed.
///
/// Pure and idempotent: the package's `used_credits` is an input, never
/// mutated here - the checkout saga writes the increment to the store.
pub fn price_cart(lines: &[CartLine], package: Option<&CustomerPackage>) -> PackagePricing {
    let mut priced = Vec::with_capacity(lines.len());
    let mut cart_total: i64 = 0;
    let mut consumed: i64 = 0;

    for (index, line) in lines.iter().enumerate() {
        let mut line_total: i64 = 0;
        let mut credits_applied: i64 = 0;

        match package {
            Some(pkg) if line_is_eligible(line, &pkg.name) => {
                for _ in 0..line.quantity {
                    if consumed < pkg.remaining_credits() {
                        // First redemption of the package carries its full
                        // price; every later one is free.
                        let already_used = pkg.used_credits + consumed;
                        if already_used == 0 {
                            line_total += pkg.price_paid_cents;
                        }
                        consumed += 1;
                        credits_applied += 1;
                    } else {
                        line_total += line.unit_price_cents;
                    }
                }
            }
            _ => {
                line_total = line.catalog_total_cents();
            }
        }

        cart_total += line_total;
        priced.push(PricedLine {
            line_index: index,
            effective_total_cents: line_total,
            credits_applied,
        });
    }

    PackagePricing {
        lines: priced,
        cart_total_cents: cart_total,
        credits_consumed: consumed,
        has_package_in_cart: consumed > 0,
        package_id: package.filter(|_| consumed > 0).map(|p| p.id.clone()),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
