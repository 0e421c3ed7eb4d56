//! Checkout endpoint: runs the saga and announces the result.

use actix_web::{web, HttpResponse};

use crate::checkout::{self, CheckoutRequest};
use crate::error::ApiResult;
use crate::state::AppState;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/shops/{shop_id}/checkout", web::post().to(finalize));
}

async fn finalize(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<CheckoutRequest>,
) -> ApiResult<HttpResponse> {
    let shop_id = path.into_inner();

    // Walk-in sales are stamped with the shop's local calendar date.
    let timezone = state.db.shops().timezone(&shop_id).await?;
    let sale_date = state.local_now(&timezone).date().format("%Y-%m-%d").to_string();

    let outcome = checkout::run(&state.db, &shop_id, &sale_date, body.into_inner()).await?;

    if let Some(appointment) = &outcome.appointment {
        state.publish("finalized", appointment);
    }

    Ok(HttpResponse::Ok().json(outcome))
}
