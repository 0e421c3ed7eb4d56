//! # Cash Repository
//!
//! Database operations for cash sessions, drawer movements and expenses.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Cash Session Lifecycle                              │
//! │                                                                         │
//! │  open_session(float) ──► CashSession { status: Open }                  │
//! │       │   (uniq_cash_session_open rejects a second open per shop)      │
//! │       ▼                                                                 │
//! │  add_transaction() × N  (entrada: checkout cash; saida: expenses)      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  close_session(counted) ──► expected = float + Σentrada − Σsaida       │
//! │                             variance = counted − expected              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use navalha_core::{CashSession, CashSessionStatus};

// =============================================================================
// Row Mapping & Local Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    id: String,
    shop_id: String,
    opening_float_cents: i64,
    expected_cents: i64,
    counted_cents: i64,
    status: CashSessionStatus,
    opened_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
}

impl From<SessionRow> for CashSession {
    fn from(row: SessionRow) -> Self {
        CashSession {
            id: row.id,
            shop_id: row.shop_id,
            opening_float_cents: row.opening_float_cents,
            expected_cents: row.expected_cents,
            counted_cents: row.counted_cents,
            status: row.status,
            opened_at: row.opened_at,
            closed_at: row.closed_at,
        }
    }
}

/// Direction of a drawer movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CashFlow {
    /// Money into the drawer.
    Entrada,
    /// Money out of the drawer.
    Saida,
}

impl CashFlow {
    pub fn as_str(&self) -> &'static str {
        match self {
            CashFlow::Entrada => "entrada",
            CashFlow::Saida => "saida",
        }
    }
}

/// One movement through the drawer during a session.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct CashTransaction {
    pub id: String,
    pub shop_id: String,
    pub session_id: String,
    pub kind: CashFlow,
    pub description: String,
    pub amount_cents: i64,
    /// Tender method when the movement came from a checkout.
    pub method: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An operator-entered expense (rent, supplies, barber advances).
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct Expense {
    pub id: String,
    pub shop_id: String,
    pub description: String,
    pub amount_cents: i64,
    pub date: String,
    /// Set when the expense is an advance paid to a barber.
    pub barber_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

const SESSION_COLUMNS: &str = r#"
    SELECT id, shop_id, opening_float_cents, expected_cents, counted_cents,
           status, opened_at, closed_at
    FROM cash_sessions
"#;

// =============================================================================
// Repository
// =============================================================================

/// Repository for cash session operations.
#[derive(Debug, Clone)]
pub struct CashRepository {
    pool: SqlitePool,
}

impl CashRepository {
    /// Creates a new CashRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CashRepository { pool }
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Gets a session by ID.
    pub async fn get_session(&self, id: &str) -> DbResult<Option<CashSession>> {
        let row: Option<SessionRow> = sqlx::query_as(&format!("{SESSION_COLUMNS} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(CashSession::from))
    }

    /// The shop's currently open session, if any.
    pub async fn current_open(&self, shop_id: &str) -> DbResult<Option<CashSession>> {
        let row: Option<SessionRow> = sqlx::query_as(&format!(
            "{SESSION_COLUMNS} WHERE shop_id = ?1 AND status = 'open'"
        ))
        .bind(shop_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CashSession::from))
    }

    /// Opens a new cash session.
    ///
    /// ## Errors
    /// [`DbError::SessionAlreadyOpen`] when the shop already has one open -
    /// enforced by the `uniq_cash_session_open` partial index.
    pub async fn open_session(
        &self,
        shop_id: &str,
        opening_float_cents: i64,
    ) -> DbResult<CashSession> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(shop_id = %shop_id, float = opening_float_cents, "Opening cash session");

        sqlx::query(
            r#"
            INSERT INTO cash_sessions (id, shop_id, opening_float_cents, expected_cents,
                                       counted_cents, status, opened_at, closed_at)
            VALUES (?1, ?2, ?3, 0, 0, 'open', ?4, NULL)
            "#,
        )
        .bind(&id)
        .bind(shop_id)
        .bind(opening_float_cents)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::SessionAlreadyOpen { .. } => DbError::SessionAlreadyOpen {
                shop_id: shop_id.to_string(),
            },
            other => other,
        })?;

        Ok(CashSession {
            id,
            shop_id: shop_id.to_string(),
            opening_float_cents,
            expected_cents: 0,
            counted_cents: 0,
            status: CashSessionStatus::Open,
            opened_at: now,
            closed_at: None,
        })
    }

    /// Closes a session against a physical count.
    ///
    /// Expected value is recomputed from the float and the session's
    /// movements at close time, so intermediate drift cannot accumulate.
    pub async fn close_session(&self, id: &str, counted_cents: i64) -> DbResult<CashSession> {
        let session = self
            .get_session(id)
            .await?
            .ok_or_else(|| DbError::not_found("CashSession", id))?;

        let net: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(CASE kind WHEN 'entrada' THEN amount_cents
                                          ELSE -amount_cents END), 0)
            FROM cash_transactions
            WHERE session_id = ?1
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        let expected = session.opening_float_cents + net;
        let now = Utc::now();

        debug!(id = %id, expected = expected, counted = counted_cents, "Closing cash session");

        let result = sqlx::query(
            r#"
            UPDATE cash_sessions SET
                status = 'closed',
                expected_cents = ?2,
                counted_cents = ?3,
                closed_at = ?4
            WHERE id = ?1 AND status = 'open'
            "#,
        )
        .bind(id)
        .bind(expected)
        .bind(counted_cents)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("CashSession (open)", id));
        }

        Ok(CashSession {
            expected_cents: expected,
            counted_cents,
            status: CashSessionStatus::Closed,
            closed_at: Some(now),
            ..session
        })
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Records a drawer movement.
    pub async fn add_transaction(
        &self,
        shop_id: &str,
        session_id: &str,
        kind: CashFlow,
        description: &str,
        amount_cents: i64,
        method: Option<&str>,
    ) -> DbResult<CashTransaction> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(session_id = %session_id, kind = kind.as_str(), amount = amount_cents,
               "Recording cash transaction");

        sqlx::query(
            r#"
            INSERT INTO cash_transactions (id, shop_id, session_id, kind, description,
                                           amount_cents, method, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&id)
        .bind(shop_id)
        .bind(session_id)
        .bind(kind.as_str())
        .bind(description)
        .bind(amount_cents)
        .bind(method)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(CashTransaction {
            id,
            shop_id: shop_id.to_string(),
            session_id: session_id.to_string(),
            kind,
            description: description.to_string(),
            amount_cents,
            method: method.map(str::to_string),
            created_at: now,
        })
    }

    /// Removes a transaction (checkout compensation path).
    pub async fn delete_transaction(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM cash_transactions WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("CashTransaction", id));
        }

        Ok(())
    }

    /// All movements for a session, oldest first.
    pub async fn transactions_for_session(
        &self,
        session_id: &str,
    ) -> DbResult<Vec<CashTransaction>> {
        let rows: Vec<CashTransaction> = sqlx::query_as(
            "SELECT id, shop_id, session_id, kind, description, amount_cents, method, created_at \
             FROM cash_transactions WHERE session_id = ?1 ORDER BY created_at",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // =========================================================================
    // Expenses
    // =========================================================================

    /// Records an expense.
    pub async fn add_expense(
        &self,
        shop_id: &str,
        description: &str,
        amount_cents: i64,
        date: &str,
        barber_id: Option<&str>,
    ) -> DbResult<Expense> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO expenses (id, shop_id, description, amount_cents, date, barber_id,
                                  created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&id)
        .bind(shop_id)
        .bind(description)
        .bind(amount_cents)
        .bind(date)
        .bind(barber_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Expense {
            id,
            shop_id: shop_id.to_string(),
            description: description.to_string(),
            amount_cents,
            date: date.to_string(),
            barber_id: barber_id.map(str::to_string),
            created_at: now,
        })
    }

    /// Expenses for a shop between two dates (inclusive).
    pub async fn expenses_for_range(
        &self,
        shop_id: &str,
        from_date: &str,
        to_date: &str,
    ) -> DbResult<Vec<Expense>> {
        let rows: Vec<Expense> = sqlx::query_as(
            "SELECT id, shop_id, description, amount_cents, date, barber_id, created_at \
             FROM expenses WHERE shop_id = ?1 AND date >= ?2 AND date <= ?3 ORDER BY date",
        )
        .bind(shop_id)
        .bind(from_date)
        .bind(to_date)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Total advances paid to one barber in a date range.
    ///
    /// Deducted from the barber's commission statement.
    pub async fn advances_for_barber(
        &self,
        barber_id: &str,
        from_date: &str,
        to_date: &str,
    ) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount_cents), 0) FROM expenses \
             WHERE barber_id = ?1 AND date >= ?2 AND date <= ?3",
        )
        .bind(barber_id)
        .bind(from_date)
        .bind(to_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }
}
