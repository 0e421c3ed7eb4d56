//! Shared application state and the realtime event channel.
//!
//! One `broadcast` channel fans appointment changes out to every connected
//! SSE client. Senders never block: when no admin dashboard is connected the
//! send simply reports zero receivers and the event is dropped.

use chrono::{NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use crate::config::ServerConfig;
use navalha_core::Appointment;
use navalha_db::Database;

/// Capacity of the realtime event buffer. Slow SSE consumers that lag more
/// than this many events behind start missing updates and should refetch.
const EVENT_BUFFER: usize = 64;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub events: broadcast::Sender<ServerEvent>,
    pub config: ServerConfig,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(db: Database, config: ServerConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        AppState {
            db,
            events,
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Publishes an appointment change to the SSE feed.
    pub fn publish(&self, kind: &str, appointment: &Appointment) {
        let event = ServerEvent {
            kind: kind.to_string(),
            shop_id: appointment.shop_id.clone(),
            appointment: appointment.clone(),
        };
        // receiver_count == 0 is normal; nobody is watching.
        if let Err(err) = self.events.send(event) {
            debug!(kind = kind, "No SSE subscribers for event: {err}");
        }
    }

    /// "Now" on the shop's wall clock.
    ///
    /// The availability resolver takes local time as an input; this is the
    /// only place the server reads the clock for it.
    pub fn local_now(&self, shop_timezone: &str) -> NaiveDateTime {
        let tz: Tz = shop_timezone
            .parse()
            .or_else(|_| self.config.default_timezone.parse())
            .unwrap_or(chrono_tz::America::Sao_Paulo);
        Utc::now().with_timezone(&tz).naive_local()
    }
}

/// One realtime update pushed to connected dashboards.
#[derive(Clone, Debug, Serialize)]
pub struct ServerEvent {
    /// "created", "status", "updated", "finalized" or "deleted".
    pub kind: String,
    pub shop_id: String,
    pub appointment: Appointment,
}
