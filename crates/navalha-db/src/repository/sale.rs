//! # Sale Repository
//!
//! Database operations for finalized sale rows.
//!
//! ## Snapshot Pattern
//! Each row freezes what it needs from the moment of sale: the service name,
//! the price actually charged, and the barber's commission rate in basis
//! points. Reports recompute from these rows alone, so later edits to the
//! catalog or a barber's rate never rewrite history.
//!
//! ## Batch Grouping
//! One checkout writes N rows sharing a `batch_sale_id`. The compensation
//! path deletes by batch, so a failed saga removes exactly what it wrote.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use navalha_core::SaleRecord;

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    id: String,
    shop_id: String,
    barber_id: Option<String>,
    barber_name: Option<String>,
    service_name: String,
    date: String,
    price_cents: i64,
    tip_cents: i64,
    product_commission_cents: i64,
    commission_rate_bps: Option<i64>,
    payment_label: Option<String>,
    batch_sale_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<SaleRow> for SaleRecord {
    fn from(row: SaleRow) -> Self {
        SaleRecord {
            id: row.id,
            shop_id: row.shop_id,
            barber_id: row.barber_id,
            barber_name: row.barber_name,
            service_name: row.service_name,
            date: row.date,
            price_cents: row.price_cents,
            tip_cents: row.tip_cents,
            product_commission_cents: row.product_commission_cents,
            commission_rate_bps: row.commission_rate_bps.map(|bps| bps.max(0) as u32),
            payment_label: row.payment_label,
            batch_sale_id: row.batch_sale_id,
            created_at: row.created_at,
        }
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, shop_id, barber_id, barber_name, service_name, date, price_cents,
           tip_cents, product_commission_cents, commission_rate_bps, payment_label,
           batch_sale_id, created_at
    FROM sales
"#;

// =============================================================================
// Input Type
// =============================================================================

/// Fields for one sale row written at checkout.
#[derive(Debug, Clone)]
pub struct NewSale {
    pub shop_id: String,
    pub barber_id: Option<String>,
    pub barber_name: Option<String>,
    pub service_name: String,
    pub date: String,
    pub price_cents: i64,
    pub tip_cents: i64,
    pub product_commission_cents: i64,
    /// The barber's rate at finalize time. None only for legacy imports.
    pub commission_rate_bps: Option<u32>,
    pub payment_label: Option<String>,
    pub batch_sale_id: Option<String>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Inserts one sale row.
    pub async fn insert(&self, sale: NewSale) -> DbResult<SaleRecord> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(
            id = %id,
            service = %sale.service_name,
            price = sale.price_cents,
            "Inserting sale"
        );

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, shop_id, barber_id, barber_name, service_name, date,
                price_cents, tip_cents, product_commission_cents, commission_rate_bps,
                payment_label, batch_sale_id, created_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10,
                ?11, ?12, ?13
            )
            "#,
        )
        .bind(&id)
        .bind(&sale.shop_id)
        .bind(&sale.barber_id)
        .bind(&sale.barber_name)
        .bind(&sale.service_name)
        .bind(&sale.date)
        .bind(sale.price_cents)
        .bind(sale.tip_cents)
        .bind(sale.product_commission_cents)
        .bind(sale.commission_rate_bps.map(|bps| bps as i64))
        .bind(&sale.payment_label)
        .bind(&sale.batch_sale_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(SaleRecord {
            id,
            shop_id: sale.shop_id,
            barber_id: sale.barber_id,
            barber_name: sale.barber_name,
            service_name: sale.service_name,
            date: sale.date,
            price_cents: sale.price_cents,
            tip_cents: sale.tip_cents,
            product_commission_cents: sale.product_commission_cents,
            commission_rate_bps: sale.commission_rate_bps,
            payment_label: sale.payment_label,
            batch_sale_id: sale.batch_sale_id,
            created_at: now,
        })
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<SaleRecord>> {
        let row: Option<SaleRow> = sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(SaleRecord::from))
    }

    /// Sales for a shop between two dates (inclusive).
    ///
    /// The commission ledger and the revenue report both start here.
    pub async fn for_range(
        &self,
        shop_id: &str,
        from_date: &str,
        to_date: &str,
    ) -> DbResult<Vec<SaleRecord>> {
        let rows: Vec<SaleRow> = sqlx::query_as(&format!(
            "{SELECT_COLUMNS} WHERE shop_id = ?1 AND date >= ?2 AND date <= ?3 \
             ORDER BY date, created_at"
        ))
        .bind(shop_id)
        .bind(from_date)
        .bind(to_date)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SaleRecord::from).collect())
    }

    /// All rows written by one checkout.
    pub async fn for_batch(&self, batch_sale_id: &str) -> DbResult<Vec<SaleRecord>> {
        let rows: Vec<SaleRow> = sqlx::query_as(&format!(
            "{SELECT_COLUMNS} WHERE batch_sale_id = ?1 ORDER BY created_at"
        ))
        .bind(batch_sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SaleRecord::from).collect())
    }

    /// Deletes every row written by one checkout (compensation path).
    ///
    /// Returns the number of rows removed; zero is not an error, the saga
    /// may fail before its first insert.
    pub async fn delete_batch(&self, batch_sale_id: &str) -> DbResult<u64> {
        debug!(batch = %batch_sale_id, "Deleting sale batch");

        let result = sqlx::query("DELETE FROM sales WHERE batch_sale_id = ?1")
            .bind(batch_sale_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
