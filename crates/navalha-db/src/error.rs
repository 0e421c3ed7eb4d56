//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (in the server) ← Mapped to HTTP status codes                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SPA displays user-friendly message                                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The two partial unique indexes get their own variants ([`DbError::SlotTaken`]
//! and [`DbError::SessionAlreadyOpen`]) because the server maps them to 409
//! responses the booking site and the admin SPA handle specially.

use thiserror::Error;

/// Database operation errors.
///
/// These errors wrap sqlx errors and provide additional context
/// for debugging and user feedback.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - `fetch_one` returns no rows
    /// - ID doesn't exist
    /// - Status guard in a WHERE clause filtered the row out
    #[error("{entity} not found: {id}")]
    NotFound {
        entity: String,
        id: String,
    },

    /// The requested slot is already held by a non-cancelled appointment.
    ///
    /// ## When This Occurs
    /// - `create_checked` found an overlapping interval inside its transaction
    /// - The `uniq_appointments_active_slot` index rejected a concurrent insert
    #[error("Slot {date} {start_time} is already booked")]
    SlotTaken {
        date: String,
        start_time: String,
    },

    /// A cash session is already open for the shop.
    ///
    /// Raised by the `uniq_cash_session_open` partial index.
    #[error("Shop {shop_id} already has an open cash session")]
    SessionAlreadyOpen {
        shop_id: String,
    },

    /// The appointment lifecycle does not allow this status change.
    #[error("Cannot move appointment from '{from}' to '{to}'")]
    InvalidTransition {
        from: String,
        to: String,
    },

    /// Hard delete attempted on a non-cancelled appointment.
    #[error("Only cancelled appointments may be deleted (status is '{status}')")]
    DeleteNotAllowed {
        status: String,
    },

    /// Package credit redemption would exceed the purchased total.
    #[error("Package {id} has no remaining credits")]
    PackageExhausted {
        id: String,
    },

    /// Stock decrement would drive inventory negative.
    #[error("Insufficient stock for '{name}': {available} available, {requested} requested")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// Unique constraint violation (other than the two indexed above).
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation {
        field: String,
        value: String,
    },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation {
        message: String,
    },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Stored JSON column (barber schedule) failed to round-trip.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a SlotTaken error for a date/time pair.
    pub fn slot_taken(date: impl Into<String>, start_time: impl Into<String>) -> Self {
        DbError::SlotTaken {
            date: date.into(),
            start_time: start_time.into(),
        }
    }

    /// Whether this error should surface as an HTTP 409 conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            DbError::SlotTaken { .. }
                | DbError::SessionAlreadyOpen { .. }
                | DbError::UniqueViolation { .. }
        )
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite reports both named partial indexes through the same
                // generic message: "UNIQUE constraint failed: <table>.<col>, ..."
                if msg.contains("UNIQUE constraint failed") {
                    if msg.contains("appointments.") {
                        // Callers that know the slot re-wrap this with the
                        // real date/time via slot_taken().
                        DbError::SlotTaken {
                            date: "unknown".to_string(),
                            start_time: "unknown".to_string(),
                        }
                    } else if msg.contains("cash_sessions.") {
                        DbError::SessionAlreadyOpen {
                            shop_id: "unknown".to_string(),
                        }
                    } else {
                        let field = msg
                            .split("UNIQUE constraint failed: ")
                            .nth(1)
                            .unwrap_or("unknown")
                            .to_string();
                        DbError::UniqueViolation {
                            field,
                            value: "unknown".to_string(),
                        }
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Serialization(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
