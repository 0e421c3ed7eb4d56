//! Server configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use serde::{Deserialize, Serialize};
use std::env;

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server port
    pub http_port: u16,

    /// Path to the SQLite database file
    pub database_path: String,

    /// Endpoint of the WhatsApp notification function (optional).
    /// When unset, notifications are skipped entirely.
    pub notify_url: Option<String>,

    /// Shared secret the billing webhook must present (optional).
    /// When unset, the webhook endpoint rejects all requests.
    pub billing_webhook_token: Option<String>,

    /// Base URL of the external payment function (optional).
    /// Checkout and portal sessions are proxied to `{url}/checkout` and
    /// `{url}/portal`; when unset those endpoints return 502.
    pub billing_function_url: Option<String>,

    /// IANA timezone used for shops without an explicit one
    pub default_timezone: String,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ServerConfig {
            http_port: env::var("HTTP_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("HTTP_PORT".to_string()))?,

            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "./data/navalha.db".to_string()),

            notify_url: env::var("NOTIFY_URL").ok(),

            billing_webhook_token: env::var("BILLING_WEBHOOK_TOKEN").ok(),

            billing_function_url: env::var("BILLING_FUNCTION_URL").ok(),

            default_timezone: env::var("DEFAULT_TIMEZONE")
                .unwrap_or_else(|_| "America/Sao_Paulo".to_string()),
        };

        Ok(config)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
