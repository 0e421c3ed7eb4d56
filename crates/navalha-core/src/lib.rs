//! # navalha-core: Pure Business Logic for Navalha
//!
//! This crate is the **heart** of Navalha. It contains the pricing and
//! availability engine as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Navalha Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Frontend (booking site + admin SPA)             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON over HTTP / SSE                   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    apps/server (actix-web)                      │   │
//! │  │    availability, booking, checkout, reports, events             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ navalha-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐ ┌────────────┐ ┌──────────┐ ┌─────────────┐   │   │
//! │  │   │   slots   │ │availability│ │ packages │ │  payments   │   │   │
//! │  │   └───────────┘ └────────────┘ └──────────┘ └─────────────┘   │   │
//! │  │   ┌───────────┐ ┌────────────┐ ┌──────────┐ ┌─────────────┐   │   │
//! │  │   │   money   │ │commissions │ │  types   │ │ validation  │   │   │
//! │  │   └───────────┘ └────────────┘ └──────────┘ └─────────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • NO CLOCK • PURE          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  navalha-db (Database Layer)                    │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Appointment, Barber, CustomerPackage, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`slots`] - Time-of-day arithmetic and the interval overlap predicate
//! - [`availability`] - Offerable slot resolution for a barber and date
//! - [`packages`] - Prepaid package/credit cart pricing
//! - [`payments`] - Split-tender fee/net/discount ledger
//! - [`commissions`] - Per-barber commission and tip statements
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every resolver is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system, and clock access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use navalha_core::money::Money;
//! use navalha_core::types::Rate;
//!
//! // Create money from cents (never from floats!)
//! let price = Money::from_cents(4500); // R$ 45.00
//!
//! // A 5% card fee, expressed in basis points
//! let fee = price.apply_rate(Rate::from_bps(500));
//! assert_eq!(fee.cents(), 225);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod availability;
pub mod commissions;
pub mod error;
pub mod money;
pub mod packages;
pub mod payments;
pub mod slots;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use navalha_core::Money` instead of
// `use navalha_core::money::Money`

pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Slot granularity for the availability resolver, in minutes.
///
/// Every offerable appointment start time falls on a 15-minute boundary.
pub const SLOT_STEP_MINUTES: u32 = 15;

/// Service name under which tip ("caixinha") records are stored.
///
/// Tip rows ride the sales table but are excluded from percentage commission
/// and accumulated into a separate tip total instead.
pub const TIP_SERVICE_NAME: &str = "Caixinha / Gorjeta";

/// Package name that makes every service line eligible for redemption,
/// regardless of the service's own name.
pub const COMBO_PACKAGE_NAME: &str = "combo";

/// Shortfall below which a tender gap is treated as rounding noise rather
/// than an operator discount needing confirmation. One cent.
pub const DISCOUNT_EPSILON_CENTS: i64 = 1;
