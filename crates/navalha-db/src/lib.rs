//! # navalha-db: Database Layer for Navalha
//!
//! This crate provides database access for the Navalha backend.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Navalha Data Flow                                │
//! │                                                                         │
//! │  API handler (availability, booking, checkout, reports)                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     navalha-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │◄───│  appointment,  │   │  (embedded)  │  │   │
//! │  │   │   SqlitePool  │    │  barber, cash, │   │ 001_init.sql │  │   │
//! │  │   │               │    │  catalog, ...  │   │              │  │   │
//! │  │   └───────────────┘    └────────────────┘   └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL mode, partial unique indexes guarding slots & drawers)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (appointment, barber, etc.)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use navalha_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./navalha.db")).await?;
//! let slots = db.appointments().for_barber_day("b1", "2026-03-02").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::appointment::{AppointmentRepository, CheckoutStamp, NewAppointment};
pub use repository::barber::BarberRepository;
pub use repository::cash::{CashFlow, CashRepository, CashTransaction, Expense};
pub use repository::catalog::CatalogRepository;
pub use repository::customer::{Customer, CustomerRepository};
pub use repository::sale::{NewSale, SaleRepository};
pub use repository::shop::{Shop, ShopRepository};
