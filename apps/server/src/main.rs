//! # Navalha Server
//!
//! HTTP API for the booking site and the admin dashboard.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Navalha Server                                  │
//! │                                                                         │
//! │  Booking site ──► HTTP (8080) ──► routes ──► navalha-db ──► SQLite    │
//! │  Admin SPA    ──► HTTP + SSE          │                                 │
//! │                                       ▼                                 │
//! │                              broadcast channel                          │
//! │                               (realtime feed)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod checkout;
mod config;
mod error;
mod notify;
mod routes;
mod state;

use actix_web::{middleware, web, App, HttpServer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;
use crate::state::AppState;
use navalha_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("Starting Navalha server...");

    let config = ServerConfig::load()?;
    info!(port = config.http_port, db = %config.database_path, "Configuration loaded");

    if let Some(parent) = std::path::Path::new(&config.database_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db = Database::new(DbConfig::new(&config.database_path)).await?;
    info!("Database ready, migrations applied");

    let port = config.http_port;
    let state = AppState::new(db, config);
    let data = web::Data::new(state);

    info!(port = port, "Listening");
    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .wrap(middleware::Logger::default())
            .configure(routes::configure)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await?;

    info!("Server stopped");
    Ok(())
}
