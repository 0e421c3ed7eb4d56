//! Billing integration endpoints.
//!
//! Subscription state is owned by the external billing provider; this
//! server never computes it. The provider's webhook writes the fields, the
//! dashboard reads them back, nothing else touches them.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use navalha_core::SubscriptionInfo;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/billing/webhook", web::post().to(webhook));
    cfg.route("/api/shops/{shop_id}/subscription", web::get().to(subscription));
    cfg.route(
        "/api/shops/{shop_id}/billing/checkout",
        web::post().to(checkout_session),
    );
    cfg.route(
        "/api/shops/{shop_id}/billing/portal",
        web::post().to(portal_session),
    );
}

#[derive(Debug, Deserialize)]
struct WebhookPayload {
    shop_id: String,
    subscription_status: Option<String>,
    expires_at: Option<chrono::DateTime<chrono::Utc>>,
    trial_ends_at: Option<chrono::DateTime<chrono::Utc>>,
    current_plan: Option<String>,
}

async fn webhook(
    state: web::Data<AppState>,
    request: HttpRequest,
    body: web::Json<WebhookPayload>,
) -> ApiResult<HttpResponse> {
    // No configured token means the endpoint is closed, not open.
    let expected = state
        .config
        .billing_webhook_token
        .as_deref()
        .ok_or(ApiError::Unauthorized)?;
    let presented = request
        .headers()
        .get("X-Webhook-Token")
        .and_then(|value| value.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;
    if presented != expected {
        return Err(ApiError::Unauthorized);
    }

    let payload = body.into_inner();
    state
        .db
        .shops()
        .get_by_id(&payload.shop_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Shop", &payload.shop_id))?;

    let info = SubscriptionInfo {
        subscription_status: payload.subscription_status,
        expires_at: payload.expires_at,
        trial_ends_at: payload.trial_ends_at,
        current_plan: payload.current_plan,
    };
    state.db.shops().set_subscription(&payload.shop_id, &info).await?;

    info!(
        shop_id = %payload.shop_id,
        status = info.subscription_status.as_deref().unwrap_or("-"),
        "Subscription updated by billing webhook"
    );
    Ok(HttpResponse::Ok().finish())
}

async fn subscription(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let shop_id = path.into_inner();
    let info = state.db.shops().subscription(&shop_id).await?;
    Ok(HttpResponse::Ok().json(info))
}

#[derive(Debug, Deserialize)]
struct CheckoutSessionRequest {
    plan: Option<String>,
}

async fn checkout_session(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<CheckoutSessionRequest>,
) -> ApiResult<HttpResponse> {
    let shop_id = path.into_inner();
    let payload = serde_json::json!({
        "shop_id": shop_id,
        "plan": body.plan,
    });
    proxy_billing(&state, "checkout", payload).await
}

async fn portal_session(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let shop_id = path.into_inner();
    let payload = serde_json::json!({ "shop_id": shop_id });
    proxy_billing(&state, "portal", payload).await
}

/// Relays a session request to the external payment function and passes its
/// JSON answer (typically a redirect URL) straight back to the SPA.
async fn proxy_billing(
    state: &AppState,
    endpoint: &str,
    payload: serde_json::Value,
) -> ApiResult<HttpResponse> {
    let base = state
        .config
        .billing_function_url
        .as_deref()
        .ok_or_else(|| ApiError::Upstream("BILLING_FUNCTION_URL is not configured".to_string()))?;

    let response = state
        .http
        .post(format!("{}/{}", base.trim_end_matches('/'), endpoint))
        .json(&payload)
        .send()
        .await
        .map_err(|err| ApiError::Upstream(err.to_string()))?;

    if !response.status().is_success() {
        return Err(ApiError::Upstream(format!(
            "payment function returned {}",
            response.status()
        )));
    }

    let answer: serde_json::Value = response
        .json()
        .await
        .map_err(|err| ApiError::Upstream(err.to_string()))?;
    Ok(HttpResponse::Ok().json(answer))
}
