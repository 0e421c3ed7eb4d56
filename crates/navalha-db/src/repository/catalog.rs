//! # Catalog Repository
//!
//! Database operations for the two halves of the catalog: bookable services
//! and retail inventory items.
//!
//! ## Stock Guard
//! `decrement_stock` embeds its precondition in the UPDATE's WHERE clause
//! (`stock >= requested`), so a concurrent sale of the last unit loses the
//! race at the database instead of driving the count negative.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use navalha_core::{InventoryItem, Service};

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ServiceRow {
    id: String,
    shop_id: String,
    name: String,
    price_cents: i64,
    duration_minutes: i64,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl From<ServiceRow> for Service {
    fn from(row: ServiceRow) -> Self {
        Service {
            id: row.id,
            shop_id: row.shop_id,
            name: row.name,
            price_cents: row.price_cents,
            duration_minutes: row.duration_minutes,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct InventoryRow {
    id: String,
    shop_id: String,
    name: String,
    stock: i64,
    cost_cents: i64,
    sell_price_cents: i64,
    commission_cents: i64,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl From<InventoryRow> for InventoryItem {
    fn from(row: InventoryRow) -> Self {
        InventoryItem {
            id: row.id,
            shop_id: row.shop_id,
            name: row.name,
            stock: row.stock,
            cost_cents: row.cost_cents,
            sell_price_cents: row.sell_price_cents,
            commission_cents: row.commission_cents,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for service and inventory operations.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    // =========================================================================
    // Services
    // =========================================================================

    /// Gets a service by ID.
    pub async fn get_service(&self, id: &str) -> DbResult<Option<Service>> {
        let row: Option<ServiceRow> = sqlx::query_as(
            "SELECT id, shop_id, name, price_cents, duration_minutes, is_active, created_at \
             FROM services WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Service::from))
    }

    /// Lists active services for a shop, in creation order.
    pub async fn list_services(&self, shop_id: &str) -> DbResult<Vec<Service>> {
        let rows: Vec<ServiceRow> = sqlx::query_as(
            "SELECT id, shop_id, name, price_cents, duration_minutes, is_active, created_at \
             FROM services WHERE shop_id = ?1 AND is_active = 1 ORDER BY created_at",
        )
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Service::from).collect())
    }

    /// Creates a new service.
    pub async fn create_service(
        &self,
        shop_id: &str,
        name: &str,
        price_cents: i64,
        duration_minutes: i64,
    ) -> DbResult<Service> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(id = %id, name = %name, "Creating service");

        sqlx::query(
            r#"
            INSERT INTO services (id, shop_id, name, price_cents, duration_minutes,
                                  is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)
            "#,
        )
        .bind(&id)
        .bind(shop_id)
        .bind(name)
        .bind(price_cents)
        .bind(duration_minutes)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Service {
            id,
            shop_id: shop_id.to_string(),
            name: name.to_string(),
            price_cents,
            duration_minutes,
            is_active: true,
            created_at: now,
        })
    }

    /// Updates a service's name, price and duration.
    pub async fn update_service(
        &self,
        id: &str,
        name: &str,
        price_cents: i64,
        duration_minutes: i64,
    ) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE services SET name = ?2, price_cents = ?3, duration_minutes = ?4 \
             WHERE id = ?1",
        )
        .bind(id)
        .bind(name)
        .bind(price_cents)
        .bind(duration_minutes)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Service", id));
        }

        Ok(())
    }

    /// Soft-deletes a service.
    pub async fn deactivate_service(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE services SET is_active = 0 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Service", id));
        }

        Ok(())
    }

    // =========================================================================
    // Inventory
    // =========================================================================

    /// Gets an inventory item by ID.
    pub async fn get_item(&self, id: &str) -> DbResult<Option<InventoryItem>> {
        let row: Option<InventoryRow> = sqlx::query_as(
            "SELECT id, shop_id, name, stock, cost_cents, sell_price_cents, commission_cents, \
                    is_active, created_at \
             FROM inventory WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(InventoryItem::from))
    }

    /// Lists active inventory items for a shop.
    pub async fn list_items(&self, shop_id: &str) -> DbResult<Vec<InventoryItem>> {
        let rows: Vec<InventoryRow> = sqlx::query_as(
            "SELECT id, shop_id, name, stock, cost_cents, sell_price_cents, commission_cents, \
                    is_active, created_at \
             FROM inventory WHERE shop_id = ?1 AND is_active = 1 ORDER BY created_at",
        )
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(InventoryItem::from).collect())
    }

    /// Creates a new inventory item.
    pub async fn create_item(
        &self,
        shop_id: &str,
        name: &str,
        stock: i64,
        cost_cents: i64,
        sell_price_cents: i64,
        commission_cents: i64,
    ) -> DbResult<InventoryItem> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(id = %id, name = %name, stock = stock, "Creating inventory item");

        sqlx::query(
            r#"
            INSERT INTO inventory (id, shop_id, name, stock, cost_cents, sell_price_cents,
                                   commission_cents, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8)
            "#,
        )
        .bind(&id)
        .bind(shop_id)
        .bind(name)
        .bind(stock)
        .bind(cost_cents)
        .bind(sell_price_cents)
        .bind(commission_cents)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(InventoryItem {
            id,
            shop_id: shop_id.to_string(),
            name: name.to_string(),
            stock,
            cost_cents,
            sell_price_cents,
            commission_cents,
            is_active: true,
            created_at: now,
        })
    }

    /// Decrements stock for a sale.
    ///
    /// ## Errors
    /// [`DbError::InsufficientStock`] when fewer than `quantity` units remain.
    pub async fn decrement_stock(&self, id: &str, quantity: i64) -> DbResult<()> {
        debug!(id = %id, quantity = quantity, "Decrementing stock");

        let result = sqlx::query(
            "UPDATE inventory SET stock = stock - ?2 WHERE id = ?1 AND stock >= ?2",
        )
        .bind(id)
        .bind(quantity)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let item = self
                .get_item(id)
                .await?
                .ok_or_else(|| DbError::not_found("InventoryItem", id))?;
            return Err(DbError::InsufficientStock {
                name: item.name,
                available: item.stock,
                requested: quantity,
            });
        }

        Ok(())
    }

    /// Returns units to stock (restock, or a checkout compensation).
    pub async fn increment_stock(&self, id: &str, quantity: i64) -> DbResult<()> {
        let result = sqlx::query("UPDATE inventory SET stock = stock + ?2 WHERE id = ?1")
            .bind(id)
            .bind(quantity)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("InventoryItem", id));
        }

        Ok(())
    }

    /// Soft-deletes an inventory item.
    pub async fn deactivate_item(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE inventory SET is_active = 0 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("InventoryItem", id));
        }

        Ok(())
    }
}
