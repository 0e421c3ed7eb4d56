//! # Error Types
//!
//! Domain-specific error types for navalha-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  navalha-core errors (this file)                                        │
//! │  ├── CoreError        - General domain errors                           │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  navalha-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                     │
//! │                                                                         │
//! │  API errors (in apps/server)                                            │
//! │  └── ApiError         - What the frontend sees (serialized)             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Frontend      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (barber, slot, package id, etc.)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
/// They should be caught and translated to user-friendly messages.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The requested slot overlaps an existing non-cancelled appointment.
    ///
    /// ## When This Occurs
    /// - Two clients race for the same slot and one loses
    /// - The admin drags an appointment onto an occupied interval
    ///
    /// The caller should refetch availability and let the user pick again.
    #[error("Slot {date} {time} is already taken for this professional")]
    SlotConflict { date: String, time: String },

    /// An appointment status transition outside the lifecycle machine.
    ///
    /// Allowed: pendente → confirmado → finalizado; pendente/confirmado →
    /// cancelado. Terminal states admit no further transition.
    #[error("Cannot move appointment from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    /// Hard delete requested for an appointment that is not cancelled.
    #[error("Only cancelled appointments can be deleted (status is {status})")]
    DeleteNotAllowed { status: String },

    /// Package has no remaining credits to redeem.
    #[error("Package {package_id} has no remaining credits")]
    PackageExhausted { package_id: String },

    /// Insufficient stock to complete a checkout line.
    #[error("Insufficient stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// Tendered amounts fall short of the total due and the operator has not
    /// confirmed the shortfall as a discount.
    #[error("Tendered amount is {shortfall_cents} cents short; discount requires confirmation")]
    DiscountNotConfirmed { shortfall_cents: i64 },

    /// Package redemptions cannot be split against other tenders.
    #[error("A cart containing a package redemption must be paid with 'pacote' only")]
    MixedPackagePayment,

    /// Checkout attempted without an open cash session.
    #[error("No open cash session for shop {shop_id}")]
    NoOpenCashSession { shop_id: String },

    /// Payment amount is invalid.
    #[error("Invalid payment amount: {reason}")]
    InvalidPaymentAmount { reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date or time).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::SlotConflict {
            date: "2026-03-02".to_string(),
            time: "10:00".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Slot 2026-03-02 10:00 is already taken for this professional"
        );

        let err = CoreError::InsufficientStock {
            name: "Pomada Modeladora".to_string(),
            available: 1,
            requested: 3,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Pomada Modeladora: available 1, requested 3"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "customer_name".to_string(),
        };
        assert_eq!(err.to_string(), "customer_name is required");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "customer_name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
