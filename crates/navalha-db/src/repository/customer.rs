//! # Customer Repository
//!
//! Database operations for customers and their prepaid packages.
//!
//! ## Credit Guard
//! Like the stock guard, `redeem_credits` puts its precondition in the
//! UPDATE's WHERE clause (`used + n <= total`), so a package can never be
//! redeemed past the credits the customer paid for, even under concurrent
//! checkouts. The table's CHECK constraint is the last line of defense.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use navalha_core::CustomerPackage;

// =============================================================================
// Row Mapping
// =============================================================================

/// A shop customer.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct Customer {
    pub id: String,
    pub shop_id: String,
    pub name: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct PackageRow {
    id: String,
    shop_id: String,
    customer_id: String,
    name: String,
    total_credits: i64,
    used_credits: i64,
    price_paid_cents: i64,
    created_at: DateTime<Utc>,
}

impl From<PackageRow> for CustomerPackage {
    fn from(row: PackageRow) -> Self {
        CustomerPackage {
            id: row.id,
            shop_id: row.shop_id,
            customer_id: row.customer_id,
            name: row.name,
            total_credits: row.total_credits,
            used_credits: row.used_credits,
            price_paid_cents: row.price_paid_cents,
            created_at: row.created_at,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for customer and package operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    // =========================================================================
    // Customers
    // =========================================================================

    /// Gets a customer by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let customer: Option<Customer> = sqlx::query_as(
            "SELECT id, shop_id, name, phone, created_at FROM customers WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Lists a shop's customers alphabetically.
    pub async fn list(&self, shop_id: &str) -> DbResult<Vec<Customer>> {
        let customers: Vec<Customer> = sqlx::query_as(
            "SELECT id, shop_id, name, phone, created_at FROM customers \
             WHERE shop_id = ?1 ORDER BY name",
        )
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Creates a customer.
    pub async fn create(
        &self,
        shop_id: &str,
        name: &str,
        phone: Option<&str>,
    ) -> DbResult<Customer> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(id = %id, name = %name, "Creating customer");

        sqlx::query(
            "INSERT INTO customers (id, shop_id, name, phone, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&id)
        .bind(shop_id)
        .bind(name)
        .bind(phone)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Customer {
            id,
            shop_id: shop_id.to_string(),
            name: name.to_string(),
            phone: phone.map(str::to_string),
            created_at: now,
        })
    }

    // =========================================================================
    // Packages
    // =========================================================================

    /// Gets a package by ID.
    pub async fn get_package(&self, id: &str) -> DbResult<Option<CustomerPackage>> {
        let row: Option<PackageRow> = sqlx::query_as(
            "SELECT id, shop_id, customer_id, name, total_credits, used_credits, \
                    price_paid_cents, created_at \
             FROM customer_packages WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CustomerPackage::from))
    }

    /// A customer's packages in creation order.
    ///
    /// Creation order matters: the package resolver redeems against the
    /// oldest active package first.
    pub async fn packages_for_customer(
        &self,
        customer_id: &str,
    ) -> DbResult<Vec<CustomerPackage>> {
        let rows: Vec<PackageRow> = sqlx::query_as(
            "SELECT id, shop_id, customer_id, name, total_credits, used_credits, \
                    price_paid_cents, created_at \
             FROM customer_packages WHERE customer_id = ?1 ORDER BY created_at",
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CustomerPackage::from).collect())
    }

    /// Sells a new package to a customer.
    pub async fn create_package(
        &self,
        shop_id: &str,
        customer_id: &str,
        name: &str,
        total_credits: i64,
        price_paid_cents: i64,
    ) -> DbResult<CustomerPackage> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(id = %id, customer_id = %customer_id, credits = total_credits, "Selling package");

        sqlx::query(
            r#"
            INSERT INTO customer_packages (id, shop_id, customer_id, name, total_credits,
                                           used_credits, price_paid_cents, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?7)
            "#,
        )
        .bind(&id)
        .bind(shop_id)
        .bind(customer_id)
        .bind(name)
        .bind(total_credits)
        .bind(price_paid_cents)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(CustomerPackage {
            id,
            shop_id: shop_id.to_string(),
            customer_id: customer_id.to_string(),
            name: name.to_string(),
            total_credits,
            used_credits: 0,
            price_paid_cents,
            created_at: now,
        })
    }

    /// Consumes `count` credits from a package.
    ///
    /// ## Errors
    /// [`DbError::PackageExhausted`] when fewer than `count` credits remain.
    pub async fn redeem_credits(&self, package_id: &str, count: i64) -> DbResult<()> {
        debug!(package_id = %package_id, count = count, "Redeeming package credits");

        let result = sqlx::query(
            "UPDATE customer_packages SET used_credits = used_credits + ?2 \
             WHERE id = ?1 AND used_credits + ?2 <= total_credits",
        )
        .bind(package_id)
        .bind(count)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            if self.get_package(package_id).await?.is_none() {
                return Err(DbError::not_found("CustomerPackage", package_id));
            }
            return Err(DbError::PackageExhausted {
                id: package_id.to_string(),
            });
        }

        Ok(())
    }

    /// Returns credits to a package (checkout compensation path).
    pub async fn refund_credits(&self, package_id: &str, count: i64) -> DbResult<()> {
        debug!(package_id = %package_id, count = count, "Refunding package credits");

        let result = sqlx::query(
            "UPDATE customer_packages SET used_credits = used_credits - ?2 \
             WHERE id = ?1 AND used_credits >= ?2",
        )
        .bind(package_id)
        .bind(count)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("CustomerPackage", package_id));
        }

        Ok(())
    }
}
