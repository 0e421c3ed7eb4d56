//! # Barber Repository
//!
//! Database operations for barbers and their weekly schedules.
//!
//! The per-weekday schedule is stored as a JSON column (`schedule_json`)
//! rather than a child table: it is always read and written whole, and the
//! availability resolver needs the full week anyway. Legacy rows with
//! unparseable JSON fall back to the all-inactive default schedule.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use navalha_core::{Barber, WeekSchedule};

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct BarberRow {
    id: String,
    shop_id: String,
    name: String,
    commission_rate_bps: i64,
    schedule_json: String,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl From<BarberRow> for Barber {
    fn from(row: BarberRow) -> Self {
        // Legacy rows carry '{"days":[]}' which doesn't deserialize into
        // seven DayHours; treat them as not-yet-configured.
        let schedule: WeekSchedule =
            serde_json::from_str(&row.schedule_json).unwrap_or_default();

        Barber {
            id: row.id,
            shop_id: row.shop_id,
            name: row.name,
            commission_rate_bps: row.commission_rate_bps.max(0) as u32,
            schedule,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, shop_id, name, commission_rate_bps, schedule_json, is_active, created_at
    FROM barbers
"#;

// =============================================================================
// Repository
// =============================================================================

/// Repository for barber database operations.
#[derive(Debug, Clone)]
pub struct BarberRepository {
    pool: SqlitePool,
}

impl BarberRepository {
    /// Creates a new BarberRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BarberRepository { pool }
    }

    /// Gets a barber by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Barber>> {
        let row: Option<BarberRow> = sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Barber::from))
    }

    /// Lists active barbers for a shop, in creation order.
    pub async fn list_active(&self, shop_id: &str) -> DbResult<Vec<Barber>> {
        let rows: Vec<BarberRow> = sqlx::query_as(&format!(
            "{SELECT_COLUMNS} WHERE shop_id = ?1 AND is_active = 1 ORDER BY created_at"
        ))
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Barber::from).collect())
    }

    /// Lists all barbers for a shop, deactivated ones included.
    pub async fn list_all(&self, shop_id: &str) -> DbResult<Vec<Barber>> {
        let rows: Vec<BarberRow> = sqlx::query_as(&format!(
            "{SELECT_COLUMNS} WHERE shop_id = ?1 ORDER BY created_at"
        ))
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Barber::from).collect())
    }

    /// Creates a new barber.
    pub async fn create(
        &self,
        shop_id: &str,
        name: &str,
        commission_rate_bps: u32,
        schedule: &WeekSchedule,
    ) -> DbResult<Barber> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let schedule_json = serde_json::to_string(schedule)?;

        debug!(id = %id, name = %name, "Creating barber");

        sqlx::query(
            r#"
            INSERT INTO barbers (id, shop_id, name, commission_rate_bps, schedule_json,
                                 is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)
            "#,
        )
        .bind(&id)
        .bind(shop_id)
        .bind(name)
        .bind(commission_rate_bps as i64)
        .bind(&schedule_json)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Barber {
            id,
            shop_id: shop_id.to_string(),
            name: name.to_string(),
            commission_rate_bps,
            schedule: schedule.clone(),
            is_active: true,
            created_at: now,
        })
    }

    /// Updates a barber's display name and commission percentage.
    ///
    /// Already-finalized sales keep their rate snapshot, so this only
    /// affects future checkouts (and legacy rows without a snapshot).
    pub async fn update(&self, id: &str, name: &str, commission_rate_bps: u32) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE barbers SET name = ?2, commission_rate_bps = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(name)
        .bind(commission_rate_bps as i64)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Barber", id));
        }

        Ok(())
    }

    /// Replaces a barber's weekly schedule.
    pub async fn update_schedule(&self, id: &str, schedule: &WeekSchedule) -> DbResult<()> {
        let schedule_json = serde_json::to_string(schedule)?;

        let result = sqlx::query("UPDATE barbers SET schedule_json = ?2 WHERE id = ?1")
            .bind(id)
            .bind(&schedule_json)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Barber", id));
        }

        Ok(())
    }

    /// Soft-deletes (deactivates) a barber.
    ///
    /// Rows stay so historical sales and commission statements keep their
    /// attribution.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE barbers SET is_active = 0 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Barber", id));
        }

        Ok(())
    }
}
