//! # Appointment Repository
//!
//! Database operations for appointments.
//!
//! ## Appointment Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Appointment Lifecycle                                │
//! │                                                                         │
//! │  1. CREATE (public booking site or admin SPA)                          │
//! │     └── create_checked() → Appointment { status: Pendente }            │
//! │         re-validates the slot inside a transaction, then inserts       │
//! │                                                                         │
//! │  2. CONFIRM / CANCEL (admin)                                           │
//! │     └── set_status() → enforces the status machine                     │
//! │                                                                         │
//! │  3. FINALIZE (checkout saga)                                           │
//! │     └── finalize() → stamps price, payment label, tip, batch id        │
//! │     └── revert_finalize() → compensation path back to Confirmado       │
//! │                                                                         │
//! │  4. (OPTIONAL) DELETE                                                  │
//! │     └── delete() → hard delete, cancelled rows only                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Double-Booking Defense
//! Two layers guard the same invariant:
//! 1. `create_checked` re-reads the barber's day inside its transaction and
//!    rejects any interval overlap (cancelled rows excluded).
//! 2. The `uniq_appointments_active_slot` partial index catches the
//!    exact-slot race that slips between check and insert under WAL.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use navalha_core::slots;
use navalha_core::{Appointment, AppointmentStatus};

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct AppointmentRow {
    id: String,
    shop_id: String,
    customer_name: String,
    customer_phone: Option<String>,
    barber_id: Option<String>,
    barber_name: Option<String>,
    service_name: String,
    date: String,
    start_time: String,
    duration_minutes: i64,
    price_cents: i64,
    original_price_cents: i64,
    payment_label: Option<String>,
    status: AppointmentStatus,
    tip_cents: i64,
    package_id: Option<String>,
    batch_sale_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AppointmentRow> for Appointment {
    fn from(row: AppointmentRow) -> Self {
        Appointment {
            id: row.id,
            shop_id: row.shop_id,
            customer_name: row.customer_name,
            customer_phone: row.customer_phone,
            barber_id: row.barber_id,
            barber_name: row.barber_name,
            service_name: row.service_name,
            date: row.date,
            start_time: row.start_time,
            duration_minutes: row.duration_minutes,
            price_cents: row.price_cents,
            original_price_cents: row.original_price_cents,
            payment_label: row.payment_label,
            status: row.status,
            tip_cents: row.tip_cents,
            package_id: row.package_id,
            batch_sale_id: row.batch_sale_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, shop_id, customer_name, customer_phone, barber_id, barber_name,
           service_name, date, start_time, duration_minutes, price_cents,
           original_price_cents, payment_label, status, tip_cents, package_id,
           batch_sale_id, created_at, updated_at
    FROM appointments
"#;

// =============================================================================
// Input Types
// =============================================================================

/// Fields required to book a new appointment.
///
/// Status always starts at `pendente`; `original_price_cents` is stamped
/// from the price so later discounts keep the list price visible.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub shop_id: String,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub barber_id: String,
    pub barber_name: Option<String>,
    pub service_name: String,
    pub date: String,
    pub start_time: String,
    pub duration_minutes: i64,
    pub price_cents: i64,
}

/// Checkout result stamped onto the appointment when it is finalized.
#[derive(Debug, Clone)]
pub struct CheckoutStamp {
    /// Net price actually charged (post-discount / package-covered).
    pub price_cents: i64,
    /// "pix" or a composite like "pix(30.00) + credito(15.00)".
    pub payment_label: String,
    pub tip_cents: i64,
    pub package_id: Option<String>,
    pub batch_sale_id: String,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for appointment database operations.
#[derive(Debug, Clone)]
pub struct AppointmentRepository {
    pool: SqlitePool,
}

impl AppointmentRepository {
    /// Creates a new AppointmentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AppointmentRepository { pool }
    }

    /// Gets an appointment by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Appointment>> {
        let row: Option<AppointmentRow> =
            sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Appointment::from))
    }

    /// All appointments for a shop on one calendar date.
    pub async fn for_shop_day(&self, shop_id: &str, date: &str) -> DbResult<Vec<Appointment>> {
        let rows: Vec<AppointmentRow> = sqlx::query_as(&format!(
            "{SELECT_COLUMNS} WHERE shop_id = ?1 AND date = ?2 ORDER BY start_time"
        ))
        .bind(shop_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Appointment::from).collect())
    }

    /// All appointments for one barber on one calendar date.
    ///
    /// Feeds the availability resolver, so cancelled rows are included -
    /// the resolver filters on `blocks_slot` itself.
    pub async fn for_barber_day(&self, barber_id: &str, date: &str) -> DbResult<Vec<Appointment>> {
        let rows: Vec<AppointmentRow> = sqlx::query_as(&format!(
            "{SELECT_COLUMNS} WHERE barber_id = ?1 AND date = ?2 ORDER BY start_time"
        ))
        .bind(barber_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Appointment::from).collect())
    }

    /// Appointments for a shop between two dates (inclusive).
    pub async fn for_range(
        &self,
        shop_id: &str,
        from_date: &str,
        to_date: &str,
    ) -> DbResult<Vec<Appointment>> {
        let rows: Vec<AppointmentRow> = sqlx::query_as(&format!(
            "{SELECT_COLUMNS} WHERE shop_id = ?1 AND date >= ?2 AND date <= ?3 \
             ORDER BY date, start_time"
        ))
        .bind(shop_id)
        .bind(from_date)
        .bind(to_date)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Appointment::from).collect())
    }

    /// Books an appointment after re-validating the slot inside a transaction.
    ///
    /// ## Why the Re-Check
    /// The slot the customer saw may have been taken between the
    /// availability query and submit. The unique index only covers identical
    /// start times, so partial overlaps (10:00×60 vs 10:30×30) must be caught
    /// here by interval arithmetic over the barber's day.
    ///
    /// ## Errors
    /// [`DbError::SlotTaken`] when any non-cancelled appointment overlaps the
    /// requested `[start, start+duration)` interval.
    pub async fn create_checked(&self, new: NewAppointment) -> DbResult<Appointment> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(
            barber_id = %new.barber_id,
            date = %new.date,
            start_time = %new.start_time,
            "Booking appointment"
        );

        let mut tx = self.pool.begin().await?;

        // Re-read the barber's day under the transaction.
        let held: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT start_time, duration_minutes
            FROM appointments
            WHERE barber_id = ?1 AND date = ?2 AND status != 'cancelado'
            "#,
        )
        .bind(&new.barber_id)
        .bind(&new.date)
        .fetch_all(&mut *tx)
        .await?;

        let start = slots::time_to_minutes(&new.start_time);
        let conflict = held.iter().any(|(time, duration)| {
            slots::intervals_overlap(
                start,
                new.duration_minutes as u32,
                slots::time_to_minutes(time),
                *duration as u32,
            )
        });
        if conflict {
            return Err(DbError::slot_taken(new.date, new.start_time));
        }

        sqlx::query(
            r#"
            INSERT INTO appointments (
                id, shop_id, customer_name, customer_phone, barber_id, barber_name,
                service_name, date, start_time, duration_minutes,
                price_cents, original_price_cents, payment_label, status,
                tip_cents, package_id, batch_sale_id, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10,
                ?11, ?12, NULL, 'pendente',
                0, NULL, NULL, ?13, ?13
            )
            "#,
        )
        .bind(&id)
        .bind(&new.shop_id)
        .bind(&new.customer_name)
        .bind(&new.customer_phone)
        .bind(&new.barber_id)
        .bind(&new.barber_name)
        .bind(&new.service_name)
        .bind(&new.date)
        .bind(&new.start_time)
        .bind(new.duration_minutes)
        .bind(new.price_cents)
        .bind(new.price_cents)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            // The index race loses the date/time context; restore it.
            DbError::SlotTaken { .. } => DbError::slot_taken(&new.date, &new.start_time),
            other => other,
        })?;

        tx.commit().await?;

        Ok(Appointment {
            id,
            shop_id: new.shop_id,
            customer_name: new.customer_name,
            customer_phone: new.customer_phone,
            barber_id: Some(new.barber_id),
            barber_name: new.barber_name,
            service_name: new.service_name,
            date: new.date,
            start_time: new.start_time,
            duration_minutes: new.duration_minutes,
            price_cents: new.price_cents,
            original_price_cents: new.price_cents,
            payment_label: None,
            status: AppointmentStatus::Pendente,
            tip_cents: 0,
            package_id: None,
            batch_sale_id: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Moves an appointment to a new slot (and optionally a new barber),
    /// re-validating overlaps inside a transaction the same way
    /// [`Self::create_checked`] does. The appointment itself is excluded
    /// from the conflict scan.
    ///
    /// Terminal appointments cannot move.
    pub async fn reschedule(
        &self,
        id: &str,
        date: &str,
        start_time: &str,
        new_barber_id: Option<&str>,
    ) -> DbResult<()> {
        let current = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Appointment", id))?;
        if current.status.is_terminal() {
            return Err(DbError::InvalidTransition {
                from: current.status.as_str().to_string(),
                to: current.status.as_str().to_string(),
            });
        }
        let barber_id = new_barber_id
            .map(str::to_string)
            .or(current.barber_id)
            .ok_or_else(|| DbError::not_found("Barber", "(unassigned)"))?;

        debug!(id = %id, date = %date, start_time = %start_time, "Rescheduling appointment");

        let mut tx = self.pool.begin().await?;

        let held: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT start_time, duration_minutes
            FROM appointments
            WHERE barber_id = ?1 AND date = ?2 AND status != 'cancelado' AND id != ?3
            "#,
        )
        .bind(&barber_id)
        .bind(date)
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        let start = slots::time_to_minutes(start_time);
        let conflict = held.iter().any(|(time, duration)| {
            slots::intervals_overlap(
                start,
                current.duration_minutes as u32,
                slots::time_to_minutes(time),
                *duration as u32,
            )
        });
        if conflict {
            return Err(DbError::slot_taken(date, start_time));
        }

        sqlx::query(
            "UPDATE appointments SET barber_id = ?2, date = ?3, start_time = ?4, updated_at = ?5 \
             WHERE id = ?1",
        )
        .bind(id)
        .bind(&barber_id)
        .bind(date)
        .bind(start_time)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::SlotTaken { .. } => DbError::slot_taken(date, start_time),
            other => other,
        })?;

        tx.commit().await?;
        Ok(())
    }

    /// Moves an appointment through the status machine.
    ///
    /// ## Errors
    /// - [`DbError::NotFound`] when the id doesn't exist
    /// - [`DbError::InvalidTransition`] for any edge the machine forbids
    pub async fn set_status(&self, id: &str, next: AppointmentStatus) -> DbResult<()> {
        let current = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Appointment", id))?;

        if !current.status.can_transition_to(next) {
            return Err(DbError::InvalidTransition {
                from: current.status.as_str().to_string(),
                to: next.as_str().to_string(),
            });
        }

        debug!(id = %id, from = current.status.as_str(), to = next.as_str(), "Status change");

        let now = Utc::now();
        // Status guard in WHERE: a concurrent transition loses the race cleanly.
        let result = sqlx::query(
            "UPDATE appointments SET status = ?2, updated_at = ?3 WHERE id = ?1 AND status = ?4",
        )
        .bind(id)
        .bind(next.as_str())
        .bind(now)
        .bind(current.status.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::InvalidTransition {
                from: "changed".to_string(),
                to: next.as_str().to_string(),
            });
        }

        Ok(())
    }

    /// Finalizes a confirmed appointment with its checkout result.
    ///
    /// Only `confirmado` rows may be finalized; the WHERE guard makes this
    /// atomic with the stamp.
    pub async fn finalize(&self, id: &str, stamp: &CheckoutStamp) -> DbResult<()> {
        debug!(id = %id, batch = %stamp.batch_sale_id, "Finalizing appointment");

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE appointments SET
                status = 'finalizado',
                price_cents = ?2,
                payment_label = ?3,
                tip_cents = ?4,
                package_id = ?5,
                batch_sale_id = ?6,
                updated_at = ?7
            WHERE id = ?1 AND status = 'confirmado'
            "#,
        )
        .bind(id)
        .bind(stamp.price_cents)
        .bind(&stamp.payment_label)
        .bind(stamp.tip_cents)
        .bind(&stamp.package_id)
        .bind(&stamp.batch_sale_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let status = self
                .get_by_id(id)
                .await?
                .map(|a| a.status.as_str().to_string())
                .ok_or_else(|| DbError::not_found("Appointment", id))?;
            return Err(DbError::InvalidTransition {
                from: status,
                to: "finalizado".to_string(),
            });
        }

        Ok(())
    }

    /// Compensation for [`finalize`](Self::finalize): restores the row to
    /// `confirmado` and clears the checkout stamp.
    pub async fn revert_finalize(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Reverting finalize");

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE appointments SET
                status = 'confirmado',
                price_cents = original_price_cents,
                payment_label = NULL,
                tip_cents = 0,
                package_id = NULL,
                batch_sale_id = NULL,
                updated_at = ?2
            WHERE id = ?1 AND status = 'finalizado'
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Appointment (finalizado)", id));
        }

        Ok(())
    }

    /// Hard-deletes an appointment.
    ///
    /// Only cancelled rows may go; everything else is history the reports
    /// and the slot guard still read.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let current = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Appointment", id))?;

        if current.status != AppointmentStatus::Cancelado {
            return Err(DbError::DeleteNotAllowed {
                status: current.status.as_str().to_string(),
            });
        }

        sqlx::query("DELETE FROM appointments WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
