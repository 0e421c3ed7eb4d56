//! Reporting endpoints.
//!
//! Reports recompute from the frozen sale rows on every request; nothing is
//! aggregated ahead of time. Tip rows (caixinha) are excluded from gross
//! revenue and surfaced separately.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use navalha_core::commissions::{statement, CommissionStatement};
use navalha_core::validation;
use navalha_db::CashFlow;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/shops/{shop_id}/reports")
            .route("/summary", web::get().to(summary))
            .route("/commissions", web::get().to(commissions))
            .route("/cash", web::get().to(cash_summary)),
    );
}

#[derive(Debug, Deserialize)]
struct RangeParams {
    from: String,
    to: String,
}

#[derive(Debug, Serialize)]
struct SummaryReport {
    from: String,
    to: String,
    sale_count: usize,
    /// Gross value of non-tip sale rows, in cents.
    gross_cents: i64,
    tip_cents: i64,
    expense_cents: i64,
    /// gross − expenses.
    net_cents: i64,
}

async fn summary(
    state: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<RangeParams>,
) -> ApiResult<HttpResponse> {
    let shop_id = path.into_inner();
    validation::validate_date("from", &params.from)?;
    validation::validate_date("to", &params.to)?;

    let sales = state
        .db
        .sales()
        .for_range(&shop_id, &params.from, &params.to)
        .await?;
    let expenses = state
        .db
        .cash()
        .expenses_for_range(&shop_id, &params.from, &params.to)
        .await?;

    let mut gross: i64 = 0;
    let mut tips: i64 = 0;
    let mut count = 0usize;
    for sale in &sales {
        if sale.is_tip_record() {
            tips += sale.price_cents + sale.tip_cents;
            continue;
        }
        gross += sale.price_cents;
        tips += sale.tip_cents;
        count += 1;
    }
    let expense_total: i64 = expenses.iter().map(|e| e.amount_cents).sum();

    Ok(HttpResponse::Ok().json(SummaryReport {
        from: params.from.clone(),
        to: params.to.clone(),
        sale_count: count,
        gross_cents: gross,
        tip_cents: tips,
        expense_cents: expense_total,
        net_cents: gross - expense_total,
    }))
}

async fn commissions(
    state: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<RangeParams>,
) -> ApiResult<HttpResponse> {
    let shop_id = path.into_inner();
    validation::validate_date("from", &params.from)?;
    validation::validate_date("to", &params.to)?;

    let sales = state
        .db
        .sales()
        .for_range(&shop_id, &params.from, &params.to)
        .await?;
    let barbers = state.db.barbers().list_all(&shop_id).await?;

    let mut statements: Vec<CommissionStatement> = Vec::with_capacity(barbers.len());
    for barber in &barbers {
        let advances = state
            .db
            .cash()
            .advances_for_barber(&barber.id, &params.from, &params.to)
            .await?;
        statements.push(statement(barber, &sales, advances));
    }

    Ok(HttpResponse::Ok().json(statements))
}

#[derive(Debug, Serialize)]
struct CashSummary {
    session_id: String,
    opening_float_cents: i64,
    entrada_cents: i64,
    saida_cents: i64,
    /// What the drawer should hold right now: float + entradas − saídas.
    expected_cents: i64,
    transaction_count: usize,
}

/// Live view of the open drawer, same arithmetic the close step freezes.
async fn cash_summary(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let shop_id = path.into_inner();
    let session = state
        .db
        .cash()
        .current_open(&shop_id)
        .await?
        .ok_or_else(|| ApiError::not_found("CashSession", &shop_id))?;
    let transactions = state.db.cash().transactions_for_session(&session.id).await?;

    let mut entradas: i64 = 0;
    let mut saidas: i64 = 0;
    for tx in &transactions {
        match tx.kind {
            CashFlow::Entrada => entradas += tx.amount_cents,
            CashFlow::Saida => saidas += tx.amount_cents,
        }
    }

    Ok(HttpResponse::Ok().json(CashSummary {
        session_id: session.id,
        opening_float_cents: session.opening_float_cents,
        entrada_cents: entradas,
        saida_cents: saidas,
        expected_cents: session.opening_float_cents + entradas - saidas,
        transaction_count: transactions.len(),
    }))
}
