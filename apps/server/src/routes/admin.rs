//! Admin dashboard endpoints.
//!
//! Everything the shop operator touches: the appointment agenda and its
//! status machine, staff, catalog, customers and their packages, the cash
//! drawer, expenses, and shop settings.

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::notify::notify_customer;
use crate::state::AppState;
use navalha_core::payments::FeeSchedule;
use navalha_core::types::WeekSchedule;
use navalha_core::{validation, AppointmentStatus, PaymentMethod, Rate, ShopHours};
use navalha_db::CashFlow;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/shops", web::post().to(create_shop));
    cfg.service(
        web::scope("/api/shops/{shop_id}/admin")
            .route("", web::get().to(get_shop))
            .route("/appointments", web::get().to(agenda))
            .route("/appointments/{id}/status", web::put().to(set_status))
            .route("/appointments/{id}/reschedule", web::put().to(reschedule))
            .route("/appointments/{id}", web::delete().to(delete_appointment))
            .route("/barbers", web::get().to(list_barbers))
            .route("/barbers", web::post().to(create_barber))
            .route("/barbers/{id}", web::put().to(update_barber))
            .route("/barbers/{id}/schedule", web::put().to(update_schedule))
            .route("/barbers/{id}", web::delete().to(deactivate_barber))
            .route("/services", web::post().to(create_service))
            .route("/services/{id}", web::put().to(update_service))
            .route("/services/{id}", web::delete().to(deactivate_service))
            .route("/inventory", web::get().to(list_inventory))
            .route("/inventory", web::post().to(create_item))
            .route("/inventory/{id}/restock", web::post().to(restock_item))
            .route("/inventory/{id}", web::delete().to(deactivate_item))
            .route("/customers", web::get().to(list_customers))
            .route("/customers", web::post().to(create_customer))
            .route("/customers/{id}/packages", web::get().to(list_packages))
            .route("/customers/{id}/packages", web::post().to(sell_package))
            .route("/cash/session", web::get().to(current_session))
            .route("/cash/open", web::post().to(open_session))
            .route("/cash/close", web::post().to(close_session))
            .route("/cash/transactions", web::get().to(list_transactions))
            .route("/cash/transactions", web::post().to(add_transaction))
            .route("/expenses", web::get().to(list_expenses))
            .route("/expenses", web::post().to(add_expense))
            .route("/settings/hours", web::get().to(get_hours))
            .route("/settings/hours", web::put().to(put_hours))
            .route("/settings/fees", web::get().to(get_fees))
            .route("/settings/fees", web::put().to(put_fees)),
    );
}

// =============================================================================
// Shop
// =============================================================================

#[derive(Debug, Deserialize)]
struct CreateShopRequest {
    name: String,
    timezone: Option<String>,
}

async fn create_shop(
    state: web::Data<AppState>,
    body: web::Json<CreateShopRequest>,
) -> ApiResult<HttpResponse> {
    validation::validate_name("name", &body.name)?;
    let timezone = body
        .timezone
        .clone()
        .unwrap_or_else(|| state.config.default_timezone.clone());
    let shop = state.db.shops().create(&body.name, &timezone).await?;
    Ok(HttpResponse::Created().json(shop))
}

async fn get_shop(state: web::Data<AppState>, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let shop_id = path.into_inner();
    let shop = state
        .db
        .shops()
        .get_by_id(&shop_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Shop", &shop_id))?;
    Ok(HttpResponse::Ok().json(shop))
}

// =============================================================================
// Appointments
// =============================================================================

#[derive(Debug, Deserialize)]
struct AgendaParams {
    date: String,
}

async fn agenda(
    state: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<AgendaParams>,
) -> ApiResult<HttpResponse> {
    let shop_id = path.into_inner();
    validation::validate_date("date", &params.date)?;
    let appointments = state.db.appointments().for_shop_day(&shop_id, &params.date).await?;
    Ok(HttpResponse::Ok().json(appointments))
}

#[derive(Debug, Deserialize)]
struct StatusRequest {
    status: AppointmentStatus,
}

async fn set_status(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    body: web::Json<StatusRequest>,
) -> ApiResult<HttpResponse> {
    let (_, id) = path.into_inner();
    state.db.appointments().set_status(&id, body.status).await?;

    let appointment = state
        .db
        .appointments()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Appointment", &id))?;

    state.publish("status", &appointment);
    match body.status {
        AppointmentStatus::Confirmado => notify_customer(&state, &appointment, "confirmado"),
        AppointmentStatus::Cancelado => notify_customer(&state, &appointment, "cancelado"),
        _ => {}
    }

    Ok(HttpResponse::Ok().json(appointment))
}

#[derive(Debug, Deserialize)]
struct RescheduleRequest {
    date: String,
    start_time: String,
    /// Move to another barber; omitted keeps the current one.
    barber_id: Option<String>,
}

async fn reschedule(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    body: web::Json<RescheduleRequest>,
) -> ApiResult<HttpResponse> {
    let (_, id) = path.into_inner();
    validation::validate_date("date", &body.date)?;
    validation::validate_time("start_time", &body.start_time)?;
    state
        .db
        .appointments()
        .reschedule(&id, &body.date, &body.start_time, body.barber_id.as_deref())
        .await?;

    let appointment = state
        .db
        .appointments()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Appointment", &id))?;
    state.publish("updated", &appointment);
    Ok(HttpResponse::Ok().json(appointment))
}

async fn delete_appointment(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let (_, id) = path.into_inner();
    let appointment = state
        .db
        .appointments()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Appointment", &id))?;
    state.db.appointments().delete(&id).await?;
    state.publish("deleted", &appointment);
    Ok(HttpResponse::NoContent().finish())
}

// =============================================================================
// Barbers
// =============================================================================

async fn list_barbers(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let shop_id = path.into_inner();
    let barbers = state.db.barbers().list_all(&shop_id).await?;
    Ok(HttpResponse::Ok().json(barbers))
}

#[derive(Debug, Deserialize)]
struct BarberRequest {
    name: String,
    commission_rate_bps: u32,
    schedule: Option<WeekSchedule>,
}

async fn create_barber(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<BarberRequest>,
) -> ApiResult<HttpResponse> {
    let shop_id = path.into_inner();
    let req = body.into_inner();
    validation::validate_name("name", &req.name)?;
    validation::validate_rate_bps(req.commission_rate_bps)?;

    let schedule = req.schedule.unwrap_or_default();
    let barber = state
        .db
        .barbers()
        .create(&shop_id, &req.name, req.commission_rate_bps, &schedule)
        .await?;
    Ok(HttpResponse::Created().json(barber))
}

async fn update_barber(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    body: web::Json<BarberRequest>,
) -> ApiResult<HttpResponse> {
    let (_, id) = path.into_inner();
    validation::validate_name("name", &body.name)?;
    validation::validate_rate_bps(body.commission_rate_bps)?;
    state
        .db
        .barbers()
        .update(&id, &body.name, body.commission_rate_bps)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn update_schedule(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    body: web::Json<WeekSchedule>,
) -> ApiResult<HttpResponse> {
    let (_, id) = path.into_inner();
    state.db.barbers().update_schedule(&id, &body).await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn deactivate_barber(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let (_, id) = path.into_inner();
    state.db.barbers().deactivate(&id).await?;
    Ok(HttpResponse::NoContent().finish())
}

// =============================================================================
// Services
// =============================================================================

#[derive(Debug, Deserialize)]
struct ServiceRequest {
    name: String,
    price_cents: i64,
    duration_minutes: i64,
}

async fn create_service(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<ServiceRequest>,
) -> ApiResult<HttpResponse> {
    let shop_id = path.into_inner();
    validation::validate_name("name", &body.name)?;
    validation::validate_amount_cents("price_cents", body.price_cents)?;
    validation::validate_duration(body.duration_minutes)?;

    let service = state
        .db
        .catalog()
        .create_service(&shop_id, &body.name, body.price_cents, body.duration_minutes)
        .await?;
    Ok(HttpResponse::Created().json(service))
}

async fn update_service(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    body: web::Json<ServiceRequest>,
) -> ApiResult<HttpResponse> {
    let (_, id) = path.into_inner();
    validation::validate_name("name", &body.name)?;
    validation::validate_amount_cents("price_cents", body.price_cents)?;
    validation::validate_duration(body.duration_minutes)?;
    state
        .db
        .catalog()
        .update_service(&id, &body.name, body.price_cents, body.duration_minutes)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn deactivate_service(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let (_, id) = path.into_inner();
    state.db.catalog().deactivate_service(&id).await?;
    Ok(HttpResponse::NoContent().finish())
}

// =============================================================================
// Inventory
// =============================================================================

async fn list_inventory(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let shop_id = path.into_inner();
    let items = state.db.catalog().list_items(&shop_id).await?;
    Ok(HttpResponse::Ok().json(items))
}

#[derive(Debug, Deserialize)]
struct ItemRequest {
    name: String,
    stock: i64,
    cost_cents: i64,
    sell_price_cents: i64,
    #[serde(default)]
    commission_cents: i64,
}

async fn create_item(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<ItemRequest>,
) -> ApiResult<HttpResponse> {
    let shop_id = path.into_inner();
    validation::validate_name("name", &body.name)?;
    validation::validate_amount_cents("cost_cents", body.cost_cents)?;
    validation::validate_amount_cents("sell_price_cents", body.sell_price_cents)?;

    let item = state
        .db
        .catalog()
        .create_item(
            &shop_id,
            &body.name,
            body.stock,
            body.cost_cents,
            body.sell_price_cents,
            body.commission_cents,
        )
        .await?;
    Ok(HttpResponse::Created().json(item))
}

#[derive(Debug, Deserialize)]
struct RestockRequest {
    quantity: i64,
}

async fn restock_item(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    body: web::Json<RestockRequest>,
) -> ApiResult<HttpResponse> {
    let (_, id) = path.into_inner();
    validation::validate_quantity(body.quantity)?;
    state.db.catalog().increment_stock(&id, body.quantity).await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn deactivate_item(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let (_, id) = path.into_inner();
    state.db.catalog().deactivate_item(&id).await?;
    Ok(HttpResponse::NoContent().finish())
}

// =============================================================================
// Customers & Packages
// =============================================================================

async fn list_customers(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let shop_id = path.into_inner();
    let customers = state.db.customers().list(&shop_id).await?;
    Ok(HttpResponse::Ok().json(customers))
}

#[derive(Debug, Deserialize)]
struct CustomerRequest {
    name: String,
    phone: Option<String>,
}

async fn create_customer(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<CustomerRequest>,
) -> ApiResult<HttpResponse> {
    let shop_id = path.into_inner();
    validation::validate_name("name", &body.name)?;
    let customer = state
        .db
        .customers()
        .create(&shop_id, &body.name, body.phone.as_deref())
        .await?;
    Ok(HttpResponse::Created().json(customer))
}

async fn list_packages(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let (_, customer_id) = path.into_inner();
    let packages = state.db.customers().packages_for_customer(&customer_id).await?;
    Ok(HttpResponse::Ok().json(packages))
}

#[derive(Debug, Deserialize)]
struct PackageRequest {
    name: String,
    total_credits: i64,
    price_paid_cents: i64,
}

async fn sell_package(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    body: web::Json<PackageRequest>,
) -> ApiResult<HttpResponse> {
    let (shop_id, customer_id) = path.into_inner();
    validation::validate_name("name", &body.name)?;
    validation::validate_quantity(body.total_credits)?;
    validation::validate_amount_cents("price_paid_cents", body.price_paid_cents)?;

    let package = state
        .db
        .customers()
        .create_package(
            &shop_id,
            &customer_id,
            &body.name,
            body.total_credits,
            body.price_paid_cents,
        )
        .await?;
    Ok(HttpResponse::Created().json(package))
}

// =============================================================================
// Cash Drawer
// =============================================================================

async fn current_session(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let shop_id = path.into_inner();
    let session = state.db.cash().current_open(&shop_id).await?;
    Ok(HttpResponse::Ok().json(session))
}

#[derive(Debug, Deserialize)]
struct OpenSessionRequest {
    opening_float_cents: i64,
}

async fn open_session(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<OpenSessionRequest>,
) -> ApiResult<HttpResponse> {
    let shop_id = path.into_inner();
    validation::validate_amount_cents("opening_float_cents", body.opening_float_cents)?;
    let session = state
        .db
        .cash()
        .open_session(&shop_id, body.opening_float_cents)
        .await?;
    Ok(HttpResponse::Created().json(session))
}

#[derive(Debug, Deserialize)]
struct CloseSessionRequest {
    counted_cents: i64,
}

async fn close_session(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<CloseSessionRequest>,
) -> ApiResult<HttpResponse> {
    let shop_id = path.into_inner();
    validation::validate_amount_cents("counted_cents", body.counted_cents)?;
    let open = state
        .db
        .cash()
        .current_open(&shop_id)
        .await?
        .ok_or_else(|| ApiError::not_found("CashSession", &shop_id))?;
    let closed = state.db.cash().close_session(&open.id, body.counted_cents).await?;
    Ok(HttpResponse::Ok().json(closed))
}

async fn list_transactions(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let shop_id = path.into_inner();
    let open = state
        .db
        .cash()
        .current_open(&shop_id)
        .await?
        .ok_or_else(|| ApiError::not_found("CashSession", &shop_id))?;
    let transactions = state.db.cash().transactions_for_session(&open.id).await?;
    Ok(HttpResponse::Ok().json(transactions))
}

#[derive(Debug, Deserialize)]
struct TransactionRequest {
    kind: CashFlow,
    description: String,
    amount_cents: i64,
    method: Option<String>,
}

async fn add_transaction(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<TransactionRequest>,
) -> ApiResult<HttpResponse> {
    let shop_id = path.into_inner();
    validation::validate_name("description", &body.description)?;
    validation::validate_amount_cents("amount_cents", body.amount_cents)?;
    let open = state
        .db
        .cash()
        .current_open(&shop_id)
        .await?
        .ok_or_else(|| ApiError::not_found("CashSession", &shop_id))?;
    let tx = state
        .db
        .cash()
        .add_transaction(
            &shop_id,
            &open.id,
            body.kind,
            &body.description,
            body.amount_cents,
            body.method.as_deref(),
        )
        .await?;
    Ok(HttpResponse::Created().json(tx))
}

// =============================================================================
// Expenses
// =============================================================================

#[derive(Debug, Deserialize)]
struct RangeParams {
    from: String,
    to: String,
}

async fn list_expenses(
    state: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<RangeParams>,
) -> ApiResult<HttpResponse> {
    let shop_id = path.into_inner();
    validation::validate_date("from", &params.from)?;
    validation::validate_date("to", &params.to)?;
    let expenses = state
        .db
        .cash()
        .expenses_for_range(&shop_id, &params.from, &params.to)
        .await?;
    Ok(HttpResponse::Ok().json(expenses))
}

#[derive(Debug, Deserialize)]
struct ExpenseRequest {
    description: String,
    amount_cents: i64,
    date: String,
    /// Set for advances paid out to a barber; they are deducted from the
    /// barber's commission statement.
    barber_id: Option<String>,
}

async fn add_expense(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<ExpenseRequest>,
) -> ApiResult<HttpResponse> {
    let shop_id = path.into_inner();
    validation::validate_name("description", &body.description)?;
    validation::validate_amount_cents("amount_cents", body.amount_cents)?;
    validation::validate_date("date", &body.date)?;
    let expense = state
        .db
        .cash()
        .add_expense(
            &shop_id,
            &body.description,
            body.amount_cents,
            &body.date,
            body.barber_id.as_deref(),
        )
        .await?;
    Ok(HttpResponse::Created().json(expense))
}

// =============================================================================
// Settings
// =============================================================================

async fn get_hours(state: web::Data<AppState>, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let shop_id = path.into_inner();
    let hours = state.db.shops().hours(&shop_id).await?;
    Ok(HttpResponse::Ok().json(hours))
}

async fn put_hours(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<ShopHours>,
) -> ApiResult<HttpResponse> {
    let shop_id = path.into_inner();
    validation::validate_time("opening_time", &body.opening_time)?;
    validation::validate_time("closing_time", &body.closing_time)?;
    state.db.shops().update_hours(&shop_id, &body).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[derive(Debug, Deserialize)]
struct FeeEntry {
    method: PaymentMethod,
    rate_bps: u32,
}

async fn get_fees(state: web::Data<AppState>, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let shop_id = path.into_inner();
    let fees = state.db.shops().fees(&shop_id).await?;
    let entries: Vec<serde_json::Value> = PaymentMethod::ALL
        .iter()
        .map(|m| {
            serde_json::json!({
                "method": m.as_str(),
                "rate_bps": fees.rate(*m).bps(),
            })
        })
        .collect();
    Ok(HttpResponse::Ok().json(entries))
}

async fn put_fees(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<Vec<FeeEntry>>,
) -> ApiResult<HttpResponse> {
    let shop_id = path.into_inner();
    let mut fees = FeeSchedule::new();
    for entry in body.iter() {
        validation::validate_rate_bps(entry.rate_bps)?;
        fees = fees.with_rate(entry.method, Rate::from_bps(entry.rate_bps));
    }
    state.db.shops().update_fees(&shop_id, &fees).await?;
    Ok(HttpResponse::NoContent().finish())
}
