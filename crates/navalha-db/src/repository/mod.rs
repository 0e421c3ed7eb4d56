//! # Repository Layer
//!
//! Repository implementations for database access.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Repository Pattern                                 │
//! │                                                                         │
//! │  Handler / checkout saga                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Repository (this module) ← SQL lives here, nowhere else               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SqlitePool → SQLite                                                   │
//! │                                                                         │
//! │  Row structs (#[derive(FromRow)]) stay private to each repository      │
//! │  and convert into navalha-core domain types at the boundary.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod appointment;
pub mod barber;
pub mod cash;
pub mod catalog;
pub mod customer;
pub mod sale;
pub mod shop;
