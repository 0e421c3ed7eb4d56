//! Server-Sent Events feed for the admin dashboard.
//!
//! One long-lived GET per connected dashboard. Each subscriber gets its own
//! receiver on the broadcast channel; events for other shops are filtered
//! out here rather than at the sender, so publishing stays a single send.
//!
//! A subscriber that lags behind the channel buffer gets a `Lagged` error
//! from the stream; we drop those silently and the dashboard resyncs on its
//! next full fetch.

use actix_web::web::Bytes;
use actix_web::{web, HttpResponse};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::debug;

use crate::state::AppState;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/shops/{shop_id}/events", web::get().to(stream));
}

async fn stream(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let shop_id = path.into_inner();
    debug!(shop_id = %shop_id, "SSE subscriber connected");

    let receiver = state.events.subscribe();
    let body = BroadcastStream::new(receiver).filter_map(move |event| {
        let event = event.ok()?;
        if event.shop_id != shop_id {
            return None;
        }
        let json = serde_json::to_string(&event).ok()?;
        Some(Ok::<Bytes, actix_web::Error>(Bytes::from(format!(
            "event: update\ndata: {json}\n\n"
        ))))
    });

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .insert_header(("Connection", "keep-alive"))
        .streaming(body)
}
