//! Outbound WhatsApp notifications.
//!
//! Messages go through an external serverless function; the server only
//! posts a small JSON payload to it. Delivery is strictly best-effort:
//! booking and confirmation must never fail because the notification
//! channel is down, so every error here is logged and swallowed.

use serde::Serialize;
use tracing::{debug, warn};

use crate::state::AppState;
use navalha_core::Appointment;

#[derive(Debug, Serialize)]
struct NotifyPayload<'a> {
    phone: &'a str,
    message: String,
}

/// Fire-and-forget notification about an appointment change.
///
/// Spawned onto the runtime so the HTTP response never waits on it.
pub fn notify_customer(state: &AppState, appointment: &Appointment, kind: &str) {
    let Some(url) = state.config.notify_url.clone() else {
        debug!("NOTIFY_URL unset, skipping notification");
        return;
    };
    let Some(phone) = appointment.customer_phone.clone() else {
        return;
    };

    let message = match kind {
        "created" => format!(
            "Olá {}! Recebemos seu agendamento de {} para {} às {}. Aguarde a confirmação.",
            appointment.customer_name,
            appointment.service_name,
            appointment.date,
            appointment.start_time
        ),
        "confirmado" => format!(
            "Olá {}! Seu agendamento de {} em {} às {} foi confirmado.",
            appointment.customer_name,
            appointment.service_name,
            appointment.date,
            appointment.start_time
        ),
        "cancelado" => format!(
            "Olá {}, seu agendamento de {} em {} às {} foi cancelado.",
            appointment.customer_name,
            appointment.service_name,
            appointment.date,
            appointment.start_time
        ),
        _ => return,
    };

    let client = state.http.clone();
    tokio::spawn(async move {
        let payload = NotifyPayload {
            phone: &phone,
            message,
        };
        match client.post(&url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                debug!(phone = %phone, "Notification dispatched");
            }
            Ok(response) => {
                warn!(status = %response.status(), "Notification function rejected payload");
            }
            Err(err) => {
                warn!(error = %err, "Notification function unreachable");
            }
        }
    });
}
