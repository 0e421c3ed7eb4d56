//! Public booking endpoints.
//!
//! These are the routes the customer-facing booking site calls without
//! authentication: browse the catalog, resolve availability, book a slot.
//!
//! The availability list is advisory. Two customers can both see the same
//! slot; the second `POST /appointments` loses at the store's overlap check
//! and gets a 409, at which point the site refetches availability.

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::notify::notify_customer;
use crate::state::AppState;
use navalha_core::availability::{available_slots, AvailabilityQuery, BookedInterval};
use navalha_core::{validation, CoreError};
use navalha_db::NewAppointment;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/shops/{shop_id}")
            .route("/services", web::get().to(list_services))
            .route("/barbers", web::get().to(list_barbers))
            .route("/availability", web::get().to(availability))
            .route("/appointments", web::post().to(book)),
    );
}

async fn list_services(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let shop_id = path.into_inner();
    let services = state.db.catalog().list_services(&shop_id).await?;
    Ok(HttpResponse::Ok().json(services))
}

async fn list_barbers(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let shop_id = path.into_inner();
    let barbers = state.db.barbers().list_active(&shop_id).await?;
    Ok(HttpResponse::Ok().json(barbers))
}

#[derive(Debug, Deserialize)]
struct AvailabilityParams {
    barber_id: String,
    service_id: String,
    /// `YYYY-MM-DD`.
    date: String,
}

async fn availability(
    state: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<AvailabilityParams>,
) -> ApiResult<HttpResponse> {
    let shop_id = path.into_inner();
    let slots = resolve_slots(&state, &shop_id, &params).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "date": params.date,
        "barber_id": params.barber_id,
        "slots": slots,
    })))
}

/// Gathers the resolver's inputs and runs it.
async fn resolve_slots(
    state: &AppState,
    shop_id: &str,
    params: &AvailabilityParams,
) -> ApiResult<Vec<String>> {
    validation::validate_date("date", &params.date)?;
    let date = params
        .date
        .parse::<chrono::NaiveDate>()
        .map_err(|_| ApiError::BadRequest(format!("invalid date: {}", params.date)))?;

    let barber = state
        .db
        .barbers()
        .get_by_id(&params.barber_id)
        .await?
        .filter(|b| b.is_active && b.shop_id == shop_id)
        .ok_or_else(|| ApiError::not_found("Barber", &params.barber_id))?;
    let service = state
        .db
        .catalog()
        .get_service(&params.service_id)
        .await?
        .filter(|s| s.is_active && s.shop_id == shop_id)
        .ok_or_else(|| ApiError::not_found("Service", &params.service_id))?;

    let shop_hours = state.db.shops().hours(shop_id).await?;
    let timezone = state.db.shops().timezone(shop_id).await?;
    let day_appointments = state
        .db
        .appointments()
        .for_barber_day(&barber.id, &params.date)
        .await?;
    let booked = BookedInterval::collect(&day_appointments, &barber.id, &params.date);

    let query = AvailabilityQuery {
        date,
        day_hours: barber.schedule.for_date(date),
        shop_hours: &shop_hours,
        duration_minutes: service.duration_minutes.max(0) as u32,
        booked: &booked,
        local_now: state.local_now(&timezone),
    };
    Ok(available_slots(&query))
}

#[derive(Debug, Deserialize)]
struct BookRequest {
    customer_name: String,
    customer_phone: Option<String>,
    barber_id: String,
    service_id: String,
    date: String,
    start_time: String,
}

async fn book(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<BookRequest>,
) -> ApiResult<HttpResponse> {
    let shop_id = path.into_inner();
    let req = body.into_inner();

    validation::validate_name("customer_name", &req.customer_name)?;
    validation::validate_date("date", &req.date)?;
    validation::validate_time("start_time", &req.start_time)?;

    let barber = state
        .db
        .barbers()
        .get_by_id(&req.barber_id)
        .await?
        .filter(|b| b.is_active && b.shop_id == shop_id)
        .ok_or_else(|| ApiError::not_found("Barber", &req.barber_id))?;
    let service = state
        .db
        .catalog()
        .get_service(&req.service_id)
        .await?
        .filter(|s| s.is_active && s.shop_id == shop_id)
        .ok_or_else(|| ApiError::not_found("Service", &req.service_id))?;

    // Reject slots the resolver would not offer (closed day, outside hours,
    // already in the past). Overlaps are re-checked transactionally below.
    let params = AvailabilityParams {
        barber_id: req.barber_id.clone(),
        service_id: req.service_id.clone(),
        date: req.date.clone(),
    };
    let offerable = resolve_slots(&state, &shop_id, &params).await?;
    if !offerable.contains(&req.start_time) {
        return Err(ApiError::Core(CoreError::SlotConflict {
            date: req.date,
            time: req.start_time,
        }));
    }

    let appointment = state
        .db
        .appointments()
        .create_checked(NewAppointment {
            shop_id,
            customer_name: req.customer_name,
            customer_phone: req.customer_phone,
            barber_id: barber.id,
            barber_name: Some(barber.name),
            service_name: service.name,
            date: req.date,
            start_time: req.start_time,
            duration_minutes: service.duration_minutes,
            price_cents: service.price_cents,
        })
        .await?;

    state.publish("created", &appointment);
    notify_customer(&state, &appointment, "created");

    Ok(HttpResponse::Created().json(appointment))
}
