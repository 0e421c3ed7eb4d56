//! # Validation Module
//!
//! Input validation utilities for Navalha.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Frontend (SPA)                                               │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: API handler (Rust)                                           │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── Partial unique index on the booked slot                           │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a customer (or barber) display name.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 120 characters
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.len() > 120 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 120,
        });
    }

    Ok(())
}

/// Validates an `HH:MM` time-of-day string.
pub fn validate_time(field: &str, time: &str) -> ValidationResult<()> {
    let valid = matches!(
        time.split_once(':'),
        Some((h, m))
            if h.len() == 2
                && m.len() == 2
                && h.parse::<u32>().map(|h| h < 24).unwrap_or(false)
                && m.parse::<u32>().map(|m| m < 60).unwrap_or(false)
    );
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be HH:MM".to_string(),
        })
    }
}

/// Validates a `YYYY-MM-DD` calendar date string.
pub fn validate_date(field: &str, date: &str) -> ValidationResult<()> {
    chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be YYYY-MM-DD".to_string(),
        }
    })?;
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an appointment/service duration in minutes.
///
/// ## Rules
/// - Must be positive
/// - Must not exceed a full day
pub fn validate_duration(minutes: i64) -> ValidationResult<()> {
    if minutes <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "duration_minutes".to_string(),
        });
    }
    if minutes > 24 * 60 {
        return Err(ValidationError::OutOfRange {
            field: "duration_minutes".to_string(),
            min: 1,
            max: 24 * 60,
        });
    }
    Ok(())
}

/// Validates a price or tendered amount in cents.
///
/// Zero is allowed (package-covered lines are free).
pub fn validate_amount_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Validates a quantity value.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Validates a fee or commission rate in basis points (0% to 100%).
pub fn validate_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "rate_bps".to_string(),
            min: 0,
            max: 10000,
        });
    }
    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("customer_name", "João da Silva").is_ok());
        assert!(validate_name("customer_name", "").is_err());
        assert!(validate_name("customer_name", "   ").is_err());
        assert!(validate_name("customer_name", &"a".repeat(200)).is_err());
    }

    #[test]
    fn test_validate_time() {
        assert!(validate_time("start_time", "09:30").is_ok());
        assert!(validate_time("start_time", "23:59").is_ok());
        assert!(validate_time("start_time", "9:30").is_err());
        assert!(validate_time("start_time", "24:00").is_err());
        assert!(validate_time("start_time", "09:60").is_err());
        assert!(validate_time("start_time", "garbage").is_err());
    }

    #[test]
    fn test_validate_date() {
        assert!(validate_date("date", "2026-03-02").is_ok());
        assert!(validate_date("date", "2026-13-02").is_err());
        assert!(validate_date("date", "02/03/2026").is_err());
    }

    #[test]
    fn test_validate_duration() {
        assert!(validate_duration(30).is_ok());
        assert!(validate_duration(0).is_err());
        assert!(validate_duration(-15).is_err());
        assert!(validate_duration(2000).is_err());
    }

    #[test]
    fn test_validate_amount_cents() {
        assert!(validate_amount_cents("price", 0).is_ok());
        assert!(validate_amount_cents("price", 4500).is_ok());
        assert!(validate_amount_cents("price", -1).is_err());
    }

    #[test]
    fn test_validate_rate_bps() {
        assert!(validate_rate_bps(0).is_ok());
        assert!(validate_rate_bps(2000).is_ok());
        assert!(validate_rate_bps(10001).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("id", "").is_err());
        assert!(validate_uuid("id", "not-a-uuid").is_err());
    }
}
