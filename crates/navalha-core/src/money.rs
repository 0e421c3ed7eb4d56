//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A split tender of R$ 100.00 across pix and credito must reconcile     │
//! │  to the cent: net_total == tendered - fees, exactly.                   │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    All amounts are i64 cents; fee/commission rates are basis points.   │
//! │    The old 0.01 "rounding epsilon" becomes exactly 1 cent.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use navalha_core::money::Money;
//! use navalha_core::types::Rate;
//!
//! let price = Money::from_cents(4500); // R$ 45.00
//! let fee = price.apply_rate(Rate::from_bps(500)); // 5% card fee
//! assert_eq!(fee.cents(), 225);
//! assert_eq!((price - fee).cents(), 4275);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::Rate;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (centavos).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for refunds and deductions
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
///
/// Every monetary value in the system flows through this type: catalog
/// prices, cart lines, tendered amounts, fees, commissions, and tips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use navalha_core::money::Money;
    ///
    /// let price = Money::from_cents(4500); // Represents R$ 45.00
    /// assert_eq!(price.cents(), 4500);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (reais) portion.
    #[inline]
    pub const fn units(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (centavos) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Returns the larger of two values.
    #[inline]
    pub fn max(self, other: Self) -> Self {
        Money(self.0.max(other.0))
    }

    /// Applies a basis-point rate to this amount, with half-up rounding.
    ///
    /// Used for payment-method fees and percentage commissions.
    ///
    /// ## Implementation
    /// Integer math in i128 to prevent overflow: `(cents * bps + 5000) / 10000`.
    /// The +5000 rounds the half-cent up.
    ///
    /// ## Example
    /// ```rust
    /// use navalha_core::money::Money;
    /// use navalha_core::types::Rate;
    ///
    /// let amount = Money::from_cents(10000); // R$ 100.00
    /// let fee = amount.apply_rate(Rate::from_bps(500)); // 5%
    /// assert_eq!(fee.cents(), 500); // R$ 5.00
    /// ```
    pub fn apply_rate(&self, rate: Rate) -> Money {
        let cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(cents as i64)
    }

    /// Takes a proportional slice of this amount: `self * numerator / denominator`,
    /// with half-up rounding.
    ///
    /// Used by the split ledger to apportion a cart line's gross price across
    /// tendered payment methods in proportion to each method's share of the
    /// total due.
    ///
    /// Returns zero when the denominator is zero.
    pub fn proportion(&self, numerator: i64, denominator: i64) -> Money {
        if denominator == 0 {
            return Money::zero();
        }
        let cents =
            (self.0 as i128 * numerator as i128 + denominator as i128 / 2) / denominator as i128;
        Money::from_cents(cents as i64)
    }

    /// Multiplies money by a quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for logs and debugging. The frontend handles locale formatting.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}R${}.{:02}", sign, self.units().abs(), self.cents_part())
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by integer (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(4599);
        assert_eq!(money.cents(), 4599);
        assert_eq!(money.units(), 45);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(4599)), "R$45.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "R$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-R$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "R$0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);

        let total: Money = [a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_apply_rate_basic() {
        // R$ 40.00 at 5% = R$ 2.00
        let amount = Money::from_cents(4000);
        let fee = amount.apply_rate(Rate::from_bps(500));
        assert_eq!(fee.cents(), 200);
    }

    #[test]
    fn test_apply_rate_rounding() {
        // R$ 10.01 at 5% = 50.05 cents → 50 cents (half-up on the half cent)
        let amount = Money::from_cents(1001);
        let fee = amount.apply_rate(Rate::from_bps(500));
        assert_eq!(fee.cents(), 50);

        // R$ 10.10 at 2.5% = 25.25 cents → 25 cents
        let amount = Money::from_cents(1010);
        let fee = amount.apply_rate(Rate::from_bps(250));
        assert_eq!(fee.cents(), 25);
    }

    #[test]
    fn test_proportion() {
        // R$ 50.00 apportioned 60/100 = R$ 30.00
        let line = Money::from_cents(5000);
        assert_eq!(line.proportion(6000, 10000).cents(), 3000);

        // Denominator of zero yields zero, not a panic
        assert_eq!(line.proportion(1, 0).cents(), 0);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let negative = Money::from_cents(-100);
        assert!(negative.is_negative());
        assert_eq!(negative.abs().cents(), 100);
    }
}
