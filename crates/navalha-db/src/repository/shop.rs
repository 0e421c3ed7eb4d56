//! # Shop Repository
//!
//! Database operations for barbershops, their settings, and the
//! subscription fields owned by the billing webhook.
//!
//! Settings live in a separate 1:1 table so the webhook (which only ever
//! touches `barbershops`) and the admin SPA (which only ever touches
//! `barbershop_settings`) cannot step on each other's writes.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use navalha_core::payments::FeeSchedule;
use navalha_core::{PaymentMethod, Rate, ShopHours, SubscriptionInfo};

// =============================================================================
// Row Mapping & Local Types
// =============================================================================

/// A tenant barbershop.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct Shop {
    pub id: String,
    pub name: String,
    /// IANA timezone name used to compute shop-local "now".
    pub timezone: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct SettingsRow {
    opening_time: String,
    closing_time: String,
    is_closed: bool,
    fee_dinheiro_bps: i64,
    fee_pix_bps: i64,
    fee_debito_bps: i64,
    fee_credito_bps: i64,
    fee_pacote_bps: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    subscription_status: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    trial_ends_at: Option<DateTime<Utc>>,
    current_plan: Option<String>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for shop settings operations.
#[derive(Debug, Clone)]
pub struct ShopRepository {
    pool: SqlitePool,
}

impl ShopRepository {
    /// Creates a new ShopRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ShopRepository { pool }
    }

    /// Gets a shop by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Shop>> {
        let shop: Option<Shop> = sqlx::query_as(
            "SELECT id, name, timezone, created_at FROM barbershops WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(shop)
    }

    /// Creates a shop along with its default settings row.
    pub async fn create(&self, name: &str, timezone: &str) -> DbResult<Shop> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(id = %id, name = %name, "Creating shop");

        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO barbershops (id, name, timezone, created_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(&id)
            .bind(name)
            .bind(timezone)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO barbershop_settings (shop_id) VALUES (?1)")
            .bind(&id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Shop {
            id,
            name: name.to_string(),
            timezone: timezone.to_string(),
            created_at: now,
        })
    }

    /// The shop's IANA timezone name.
    pub async fn timezone(&self, shop_id: &str) -> DbResult<String> {
        let tz: Option<String> =
            sqlx::query_scalar("SELECT timezone FROM barbershops WHERE id = ?1")
                .bind(shop_id)
                .fetch_optional(&self.pool)
                .await?;

        tz.ok_or_else(|| DbError::not_found("Shop", shop_id))
    }

    // =========================================================================
    // Opening Hours
    // =========================================================================

    /// The shop's global opening window.
    ///
    /// Missing settings rows (pre-settings shops) fall back to the default.
    pub async fn hours(&self, shop_id: &str) -> DbResult<ShopHours> {
        let row: Option<SettingsRow> = sqlx::query_as(
            "SELECT opening_time, closing_time, is_closed, fee_dinheiro_bps, fee_pix_bps, \
                    fee_debito_bps, fee_credito_bps, fee_pacote_bps \
             FROM barbershop_settings WHERE shop_id = ?1",
        )
        .bind(shop_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row
            .map(|r| ShopHours {
                opening_time: r.opening_time,
                closing_time: r.closing_time,
                is_closed: r.is_closed,
            })
            .unwrap_or_default())
    }

    /// Replaces the shop's opening window.
    pub async fn update_hours(&self, shop_id: &str, hours: &ShopHours) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO barbershop_settings (shop_id, opening_time, closing_time, is_closed)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(shop_id) DO UPDATE SET
                opening_time = excluded.opening_time,
                closing_time = excluded.closing_time,
                is_closed = excluded.is_closed
            "#,
        )
        .bind(shop_id)
        .bind(&hours.opening_time)
        .bind(&hours.closing_time)
        .bind(hours.is_closed)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Shop settings", shop_id));
        }

        Ok(())
    }

    // =========================================================================
    // Fee Schedule
    // =========================================================================

    /// Per-method fee rates, as a [`FeeSchedule`] ready for settlement.
    pub async fn fees(&self, shop_id: &str) -> DbResult<FeeSchedule> {
        let row: Option<SettingsRow> = sqlx::query_as(
            "SELECT opening_time, closing_time, is_closed, fee_dinheiro_bps, fee_pix_bps, \
                    fee_debito_bps, fee_credito_bps, fee_pacote_bps \
             FROM barbershop_settings WHERE shop_id = ?1",
        )
        .bind(shop_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(FeeSchedule::new());
        };

        let bps = |v: i64| Rate::from_bps(v.max(0) as u32);
        Ok(FeeSchedule::new()
            .with_rate(PaymentMethod::Dinheiro, bps(row.fee_dinheiro_bps))
            .with_rate(PaymentMethod::Pix, bps(row.fee_pix_bps))
            .with_rate(PaymentMethod::Debito, bps(row.fee_debito_bps))
            .with_rate(PaymentMethod::Credito, bps(row.fee_credito_bps))
            .with_rate(PaymentMethod::Pacote, bps(row.fee_pacote_bps)))
    }

    /// Replaces the per-method fee rates.
    pub async fn update_fees(&self, shop_id: &str, fees: &FeeSchedule) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO barbershop_settings (shop_id, fee_dinheiro_bps, fee_pix_bps,
                                             fee_debito_bps, fee_credito_bps, fee_pacote_bps)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(shop_id) DO UPDATE SET
                fee_dinheiro_bps = excluded.fee_dinheiro_bps,
                fee_pix_bps = excluded.fee_pix_bps,
                fee_debito_bps = excluded.fee_debito_bps,
                fee_credito_bps = excluded.fee_credito_bps,
                fee_pacote_bps = excluded.fee_pacote_bps
            "#,
        )
        .bind(shop_id)
        .bind(fees.rate(PaymentMethod::Dinheiro).bps() as i64)
        .bind(fees.rate(PaymentMethod::Pix).bps() as i64)
        .bind(fees.rate(PaymentMethod::Debito).bps() as i64)
        .bind(fees.rate(PaymentMethod::Credito).bps() as i64)
        .bind(fees.rate(PaymentMethod::Pacote).bps() as i64)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Shop settings", shop_id));
        }

        Ok(())
    }

    // =========================================================================
    // Subscription (webhook-owned)
    // =========================================================================

    /// Reads the subscription fields the billing webhook maintains.
    pub async fn subscription(&self, shop_id: &str) -> DbResult<SubscriptionInfo> {
        let row: Option<SubscriptionRow> = sqlx::query_as(
            "SELECT subscription_status, expires_at, trial_ends_at, current_plan \
             FROM barbershops WHERE id = ?1",
        )
        .bind(shop_id)
        .fetch_optional(&self.pool)
        .await?;

        let row = row.ok_or_else(|| DbError::not_found("Shop", shop_id))?;

        Ok(SubscriptionInfo {
            subscription_status: row.subscription_status,
            expires_at: row.expires_at,
            trial_ends_at: row.trial_ends_at,
            current_plan: row.current_plan,
        })
    }

    /// Writes the subscription fields. Only the billing webhook handler
    /// calls this.
    pub async fn set_subscription(
        &self,
        shop_id: &str,
        info: &SubscriptionInfo,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE barbershops SET
                subscription_status = ?2,
                expires_at = ?3,
                trial_ends_at = ?4,
                current_plan = ?5
            WHERE id = ?1
            "#,
        )
        .bind(shop_id)
        .bind(&info.subscription_status)
        .bind(info.expires_at)
        .bind(info.trial_ends_at)
        .bind(&info.current_plan)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Shop", shop_id));
        }

        Ok(())
    }
}
