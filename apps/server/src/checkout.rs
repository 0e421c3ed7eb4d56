//! # Checkout Saga
//!
//! Finalizing a visit touches five stores that SQLite cannot cover with one
//! statement from this layer: sale rows, inventory, package credits, the
//! cash drawer and the appointment itself. The saga executes them as ordered
//! steps and, when a step fails, runs the compensations of every completed
//! step in reverse order before surfacing the original error.
//!
//! ## Step Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   step                          compensation                            │
//! │   ─────────────────────────     ────────────────────────────            │
//! │   1. insert sale rows           delete the batch                        │
//! │   2. decrement stock            restore the decrements                  │
//! │   3. redeem package credits     refund the credits                      │
//! │   4. record cash entrada        delete the transaction                  │
//! │   5. finalize appointment       revert to confirmado                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A compensation that itself fails is logged at error level and skipped;
//! the original failure is still the one returned to the caller. Operators
//! reconcile the (rare) leftover rows by batch id.
//!
//! All pricing decisions happen before the first write: package resolution,
//! fee settlement and the discount-confirmation gate are pure reads, so a
//! rejected checkout leaves no trace at all.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use navalha_core::packages::{price_cart, select_package, CartLine, CatalogKind, PackagePricing};
use navalha_core::payments::{settle, SplitLedger, Tender};
use navalha_core::{validation, Appointment, CoreError, PaymentMethod, TIP_SERVICE_NAME};
use navalha_db::{CheckoutStamp, Database, NewSale};

// =============================================================================
// Request / Outcome
// =============================================================================

/// One cart entry as submitted by the POS screen.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutItem {
    pub kind: CatalogKind,
    pub item_id: String,
    pub quantity: i64,
}

/// A checkout submission.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    /// Appointment being finalized, when the visit was booked ahead.
    pub appointment_id: Option<String>,
    /// Customer whose packages may cover service lines.
    pub customer_id: Option<String>,
    /// Attribution override; defaults to the appointment's barber.
    pub barber_id: Option<String>,
    pub items: Vec<CheckoutItem>,
    pub tenders: Vec<Tender>,
    #[serde(default)]
    pub tip_cents: i64,
    /// Operator acknowledged the shortfall between due and tendered.
    #[serde(default)]
    pub discount_confirmed: bool,
}

/// What a successful checkout produced.
#[derive(Debug, Serialize)]
pub struct CheckoutOutcome {
    pub batch_sale_id: String,
    pub pricing: PackagePricing,
    pub ledger: SplitLedger,
    pub payment_label: String,
    pub appointment: Option<Appointment>,
}

// =============================================================================
// Compensation Log
// =============================================================================

#[derive(Debug)]
enum StepUndo {
    DeleteSales { batch_sale_id: String },
    RestoreStock { item_id: String, quantity: i64 },
    RefundCredits { package_id: String, count: i64 },
    DeleteCashTx { tx_id: String },
    RevertFinalize { appointment_id: String },
}

async fn compensate(db: &Database, undos: Vec<StepUndo>) {
    for undo in undos.into_iter().rev() {
        let outcome = match &undo {
            StepUndo::DeleteSales { batch_sale_id } => {
                db.sales().delete_batch(batch_sale_id).await.map(|_| ())
            }
            StepUndo::RestoreStock { item_id, quantity } => {
                db.catalog().increment_stock(item_id, *quantity).await
            }
            StepUndo::RefundCredits { package_id, count } => {
                db.customers().refund_credits(package_id, *count).await
            }
            StepUndo::DeleteCashTx { tx_id } => db.cash().delete_transaction(tx_id).await,
            StepUndo::RevertFinalize { appointment_id } => {
                db.appointments().revert_finalize(appointment_id).await
            }
        };
        if let Err(err) = outcome {
            error!(?undo, error = %err, "Checkout compensation failed");
        }
    }
}

// =============================================================================
// Saga
// =============================================================================

struct ProductCharge {
    item_id: String,
    quantity: i64,
    unit_commission_cents: i64,
}

/// Runs the full checkout saga for one shop.
///
/// `sale_date` is the shop-local calendar date to stamp on walk-in sales;
/// an appointment's own date wins when one is attached.
pub async fn run(
    db: &Database,
    shop_id: &str,
    sale_date: &str,
    req: CheckoutRequest,
) -> ApiResult<CheckoutOutcome> {
    validation::validate_amount_cents("tip_cents", req.tip_cents)?;
    validation::validate_date("sale_date", sale_date)?;
    if req.items.is_empty() && req.appointment_id.is_none() {
        return Err(ApiError::BadRequest("checkout has nothing to sell".to_string()));
    }
    for item in &req.items {
        validation::validate_quantity(item.quantity)?;
    }

    // ------------------------------------------------------------------
    // Read phase: preconditions, cart assembly, pure pricing
    // ------------------------------------------------------------------

    db.cash()
        .current_open(shop_id)
        .await?
        .ok_or_else(|| CoreError::NoOpenCashSession {
            shop_id: shop_id.to_string(),
        })?;

    let appointment = match &req.appointment_id {
        Some(id) => Some(
            db.appointments()
                .get_by_id(id)
                .await?
                .ok_or_else(|| ApiError::not_found("Appointment", id))?,
        ),
        None => None,
    };

    let barber_id = req
        .barber_id
        .clone()
        .or_else(|| appointment.as_ref().and_then(|a| a.barber_id.clone()));
    let barber = match &barber_id {
        Some(id) => db.barbers().get_by_id(id).await?,
        None => None,
    };

    let mut lines: Vec<CartLine> = Vec::with_capacity(req.items.len() + 1);
    let mut product_charges: Vec<ProductCharge> = Vec::new();

    for item in &req.items {
        match item.kind {
            CatalogKind::Service => {
                let service = db
                    .catalog()
                    .get_service(&item.item_id)
                    .await?
                    .ok_or_else(|| ApiError::not_found("Service", &item.item_id))?;
                lines.push(CartLine {
                    item_id: service.id,
                    name: service.name,
                    kind: CatalogKind::Service,
                    quantity: item.quantity,
                    unit_price_cents: service.price_cents,
                });
            }
            CatalogKind::Product => {
                let product = db
                    .catalog()
                    .get_item(&item.item_id)
                    .await?
                    .ok_or_else(|| ApiError::not_found("InventoryItem", &item.item_id))?;
                product_charges.push(ProductCharge {
                    item_id: product.id.clone(),
                    quantity: item.quantity,
                    unit_commission_cents: product.commission_cents,
                });
                lines.push(CartLine {
                    item_id: product.id,
                    name: product.name,
                    kind: CatalogKind::Product,
                    quantity: item.quantity,
                    unit_price_cents: product.sell_price_cents,
                });
            }
        }
    }

    // The booked service rides along when the POS didn't re-add it.
    let mut appointment_line_index: Option<usize> = None;
    if let Some(appt) = &appointment {
        let existing = lines
            .iter()
            .position(|l| l.kind == CatalogKind::Service && l.name == appt.service_name);
        appointment_line_index = Some(match existing {
            Some(index) => index,
            None => {
                lines.insert(
                    0,
                    CartLine {
                        item_id: appt.id.clone(),
                        name: appt.service_name.clone(),
                        kind: CatalogKind::Service,
                        quantity: 1,
                        unit_price_cents: appt.original_price_cents,
                    },
                );
                0
            }
        });
    }

    let customer_packages = match &req.customer_id {
        Some(id) => db.customers().packages_for_customer(id).await?,
        None => Vec::new(),
    };
    let package = select_package(&customer_packages);
    let pricing = price_cart(&lines, package);

    let fees = db.shops().fees(shop_id).await?;
    let ledger = settle(
        pricing.cart_total_cents,
        req.tip_cents,
        &req.tenders,
        &fees,
        pricing.has_package_in_cart,
    )
    .map_err(ApiError::Core)?;

    if ledger.requires_discount_confirmation && !req.discount_confirmed {
        return Err(ApiError::Core(CoreError::DiscountNotConfirmed {
            shortfall_cents: ledger.nominal_discount_cents,
        }));
    }

    let payment_label = build_payment_label(&ledger);
    let date = appointment
        .as_ref()
        .map(|a| a.date.clone())
        .unwrap_or_else(|| sale_date.to_string());

    // ------------------------------------------------------------------
    // Write phase: ordered steps, reverse compensation on failure
    // ------------------------------------------------------------------

    let batch_sale_id = Uuid::new_v4().to_string();
    let mut undos: Vec<StepUndo> = Vec::new();

    debug!(batch = %batch_sale_id, lines = lines.len(), "Starting checkout saga");

    // Step 1: sale rows
    let sale_rows = build_sale_rows(
        shop_id,
        &date,
        &batch_sale_id,
        &lines,
        &pricing,
        &product_charges,
        &payment_label,
        req.tip_cents,
        barber.as_ref().map(|b| (b.id.as_str(), b.name.as_str(), b.commission_rate_bps)),
    );
    for (i, row) in sale_rows.into_iter().enumerate() {
        if let Err(err) = db.sales().insert(row).await {
            if i > 0 {
                compensate(db, undos).await;
            }
            return Err(err.into());
        }
        if i == 0 {
            undos.push(StepUndo::DeleteSales {
                batch_sale_id: batch_sale_id.clone(),
            });
        }
    }

    // Step 2: stock
    for charge in &product_charges {
        if let Err(err) = db.catalog().decrement_stock(&charge.item_id, charge.quantity).await {
            compensate(db, undos).await;
            return Err(err.into());
        }
        undos.push(StepUndo::RestoreStock {
            item_id: charge.item_id.clone(),
            quantity: charge.quantity,
        });
    }

    // Step 3: package credits
    if let Some(package_id) = &pricing.package_id {
        if let Err(err) = db
            .customers()
            .redeem_credits(package_id, pricing.credits_consumed)
            .await
        {
            compensate(db, undos).await;
            return Err(err.into());
        }
        undos.push(StepUndo::RefundCredits {
            package_id: package_id.clone(),
            count: pricing.credits_consumed,
        });
    }

    // Step 4: cash drawer (physical cash only)
    let cash_received = ledger
        .methods
        .iter()
        .find(|m| m.method == PaymentMethod::Dinheiro)
        .map(|m| m.amount_cents)
        .unwrap_or(0);
    if cash_received > 0 {
        // Session re-read: it was open at the precondition check above.
        let session = match db.cash().current_open(shop_id).await {
            Ok(Some(session)) => session,
            Ok(None) => {
                compensate(db, undos).await;
                return Err(ApiError::Core(CoreError::NoOpenCashSession {
                    shop_id: shop_id.to_string(),
                }));
            }
            Err(err) => {
                compensate(db, undos).await;
                return Err(err.into());
            }
        };
        match db
            .cash()
            .add_transaction(
                shop_id,
                &session.id,
                navalha_db::CashFlow::Entrada,
                &format!("Venda {batch_sale_id}"),
                cash_received,
                Some("dinheiro"),
            )
            .await
        {
            Ok(tx) => undos.push(StepUndo::DeleteCashTx { tx_id: tx.id }),
            Err(err) => {
                compensate(db, undos).await;
                return Err(err.into());
            }
        }
    }

    // Step 5: appointment
    if let Some(appt) = &appointment {
        let appointment_price = appointment_line_index
            .and_then(|index| pricing.lines.get(index))
            .map(|line| line.effective_total_cents)
            .unwrap_or(pricing.cart_total_cents);

        let stamp = CheckoutStamp {
            price_cents: appointment_price,
            payment_label: payment_label.clone(),
            tip_cents: req.tip_cents,
            package_id: pricing.package_id.clone(),
            batch_sale_id: batch_sale_id.clone(),
        };
        if let Err(err) = db.appointments().finalize(&appt.id, &stamp).await {
            compensate(db, undos).await;
            return Err(err.into());
        }
    }

    info!(
        batch = %batch_sale_id,
        total = ledger.total_tendered_cents,
        fees = ledger.total_fees_cents,
        "Checkout complete"
    );

    let appointment = match &req.appointment_id {
        Some(id) => db.appointments().get_by_id(id).await?,
        None => None,
    };

    Ok(CheckoutOutcome {
        batch_sale_id,
        pricing,
        ledger,
        payment_label,
        appointment,
    })
}

// =============================================================================
// Helpers
// =============================================================================

/// "pix" for a single method, "pix(60.00) + credito(40.00)" for a split.
fn build_payment_label(ledger: &SplitLedger) -> String {
    if ledger.methods.len() == 1 {
        return ledger.methods[0].method.as_str().to_string();
    }
    ledger
        .methods
        .iter()
        .map(|m| {
            format!(
                "{}({}.{:02})",
                m.method.as_str(),
                m.amount_cents / 100,
                m.amount_cents % 100
            )
        })
        .collect::<Vec<_>>()
        .join(" + ")
}

#[allow(clippy::too_many_arguments)]
fn build_sale_rows(
    shop_id: &str,
    date: &str,
    batch_sale_id: &str,
    lines: &[CartLine],
    pricing: &PackagePricing,
    product_charges: &[ProductCharge],
    payment_label: &str,
    tip_cents: i64,
    barber: Option<(&str, &str, u32)>,
) -> Vec<NewSale> {
    let (barber_id, barber_name, rate_bps) = match barber {
        Some((id, name, bps)) => (Some(id.to_string()), Some(name.to_string()), Some(bps)),
        None => (None, None, None),
    };

    let mut rows = Vec::with_capacity(lines.len() + 1);
    let mut tip_assigned = false;

    for (index, line) in lines.iter().enumerate() {
        let effective = pricing
            .lines
            .get(index)
            .map(|p| p.effective_total_cents)
            .unwrap_or_else(|| line.catalog_total_cents());

        let (tip, product_commission, rate) = match line.kind {
            CatalogKind::Service => {
                // The tip rides with the first service row.
                let tip = if tip_assigned { 0 } else { tip_cents };
                tip_assigned = true;
                (tip, 0, rate_bps)
            }
            CatalogKind::Product => {
                let commission = product_charges
                    .iter()
                    .find(|c| c.item_id == line.item_id)
                    .map(|c| c.unit_commission_cents * line.quantity)
                    .unwrap_or(0);
                (0, commission, None)
            }
        };

        rows.push(NewSale {
            shop_id: shop_id.to_string(),
            barber_id: barber_id.clone(),
            barber_name: barber_name.clone(),
            service_name: line.name.clone(),
            date: date.to_string(),
            price_cents: effective,
            tip_cents: tip,
            product_commission_cents: product_commission,
            commission_rate_bps: rate,
            payment_label: Some(payment_label.to_string()),
            batch_sale_id: Some(batch_sale_id.to_string()),
        });
    }

    // A tip with no service in the cart becomes a standalone caixinha row.
    if !tip_assigned && tip_cents > 0 {
        rows.push(NewSale {
            shop_id: shop_id.to_string(),
            barber_id,
            barber_name,
            service_name: TIP_SERVICE_NAME.to_string(),
            date: date.to_string(),
            price_cents: 0,
            tip_cents,
            product_commission_cents: 0,
            commission_rate_bps: None,
            payment_label: Some(payment_label.to_string()),
            batch_sale_id: Some(batch_sale_id.to_string()),
        });
    }

    rows
}

// =============================================================================
// Saga Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use navalha_core::types::WeekSchedule;
    use navalha_core::AppointmentStatus;
    use navalha_db::{DbConfig, NewAppointment};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_shop(db: &Database) -> String {
        db.shops()
            .create("Navalha de Ouro", "America/Sao_Paulo")
            .await
            .unwrap()
            .id
    }

    async fn seed_barber(db: &Database, shop_id: &str) -> navalha_core::Barber {
        db.barbers()
            .create(shop_id, "Rafael", 2000, &WeekSchedule::default())
            .await
            .unwrap()
    }

    async fn seed_appointment(
        db: &Database,
        shop_id: &str,
        barber_id: &str,
        status: AppointmentStatus,
    ) -> Appointment {
        let appt = db
            .appointments()
            .create_checked(NewAppointment {
                shop_id: shop_id.to_string(),
                customer_name: "João".to_string(),
                customer_phone: None,
                barber_id: barber_id.to_string(),
                barber_name: None,
                service_name: "Corte".to_string(),
                date: "2026-03-02".to_string(),
                start_time: "10:00".to_string(),
                duration_minutes: 30,
                price_cents: 4500,
            })
            .await
            .unwrap();
        if status == AppointmentStatus::Confirmado {
            db.appointments()
                .set_status(&appt.id, AppointmentStatus::Confirmado)
                .await
                .unwrap();
        }
        db.appointments().get_by_id(&appt.id).await.unwrap().unwrap()
    }

    fn tender(method: PaymentMethod, amount_cents: i64) -> Tender {
        Tender { method, amount_cents }
    }

    fn request_for(appointment_id: &str, tenders: Vec<Tender>) -> CheckoutRequest {
        CheckoutRequest {
            appointment_id: Some(appointment_id.to_string()),
            customer_id: None,
            barber_id: None,
            items: Vec::new(),
            tenders,
            tip_cents: 0,
            discount_confirmed: false,
        }
    }

    #[tokio::test]
    async fn test_appointment_checkout_finalizes_and_records_sale() {
        let db = test_db().await;
        let shop = seed_shop(&db).await;
        let barber = seed_barber(&db, &shop).await;
        let appt = seed_appointment(&db, &shop, &barber.id, AppointmentStatus::Confirmado).await;
        db.cash().open_session(&shop, 5000).await.unwrap();

        let outcome = run(
            &db,
            &shop,
            "2026-03-02",
            request_for(&appt.id, vec![tender(PaymentMethod::Pix, 4500)]),
        )
        .await
        .unwrap();

        assert_eq!(outcome.payment_label, "pix");
        let finalized = outcome.appointment.unwrap();
        assert_eq!(finalized.status, AppointmentStatus::Finalizado);
        assert_eq!(finalized.payment_label.as_deref(), Some("pix"));
        assert_eq!(finalized.batch_sale_id.as_deref(), Some(outcome.batch_sale_id.as_str()));

        let rows = db.sales().for_batch(&outcome.batch_sale_id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].service_name, "Corte");
        assert_eq!(rows[0].price_cents, 4500);
        // Rate frozen at finalize time.
        assert_eq!(rows[0].commission_rate_bps, Some(2000));

        // Pix never touches the drawer.
        let session = db.cash().current_open(&shop).await.unwrap().unwrap();
        let txs = db.cash().transactions_for_session(&session.id).await.unwrap();
        assert!(txs.is_empty());
    }

    #[tokio::test]
    async fn test_walk_in_cash_sale_hits_the_drawer_and_stock() {
        let db = test_db().await;
        let shop = seed_shop(&db).await;
        let barber = seed_barber(&db, &shop).await;
        db.cash().open_session(&shop, 0).await.unwrap();
        let pomada = db
            .catalog()
            .create_item(&shop, "Pomada", 10, 1200, 2500, 300)
            .await
            .unwrap();

        let outcome = run(
            &db,
            &shop,
            "2026-03-02",
            CheckoutRequest {
                appointment_id: None,
                customer_id: None,
                barber_id: Some(barber.id.clone()),
                items: vec![CheckoutItem {
                    kind: CatalogKind::Product,
                    item_id: pomada.id.clone(),
                    quantity: 2,
                }],
                tenders: vec![tender(PaymentMethod::Dinheiro, 5000)],
                tip_cents: 0,
                discount_confirmed: false,
            },
        )
        .await
        .unwrap();

        let item = db.catalog().get_item(&pomada.id).await.unwrap().unwrap();
        assert_eq!(item.stock, 8);

        let rows = db.sales().for_batch(&outcome.batch_sale_id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].price_cents, 5000);
        assert_eq!(rows[0].product_commission_cents, 600);
        assert_eq!(rows[0].commission_rate_bps, None);

        let session = db.cash().current_open(&shop).await.unwrap().unwrap();
        let txs = db.cash().transactions_for_session(&session.id).await.unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].amount_cents, 5000);
    }

    #[tokio::test]
    async fn test_package_redemption_consumes_a_credit() {
        let db = test_db().await;
        let shop = seed_shop(&db).await;
        let barber = seed_barber(&db, &shop).await;
        let appt = seed_appointment(&db, &shop, &barber.id, AppointmentStatus::Confirmado).await;
        db.cash().open_session(&shop, 0).await.unwrap();

        let customer = db.customers().create(&shop, "João", None).await.unwrap();
        let pkg = db
            .customers()
            .create_package(&shop, &customer.id, "Combo", 4, 10000)
            .await
            .unwrap();

        let mut req = request_for(&appt.id, vec![tender(PaymentMethod::Pacote, 10000)]);
        req.customer_id = Some(customer.id.clone());
        let outcome = run(&db, &shop, "2026-03-02", req).await.unwrap();

        // First redemption carries the package price.
        assert_eq!(outcome.pricing.cart_total_cents, 10000);
        assert_eq!(outcome.pricing.credits_consumed, 1);

        let pkg = db.customers().get_package(&pkg.id).await.unwrap().unwrap();
        assert_eq!(pkg.used_credits, 1);

        let finalized = outcome.appointment.unwrap();
        assert_eq!(finalized.package_id.as_deref(), Some(pkg.id.as_str()));
    }

    #[tokio::test]
    async fn test_mixed_tender_with_package_writes_nothing() {
        let db = test_db().await;
        let shop = seed_shop(&db).await;
        let barber = seed_barber(&db, &shop).await;
        let appt = seed_appointment(&db, &shop, &barber.id, AppointmentStatus::Confirmado).await;
        db.cash().open_session(&shop, 0).await.unwrap();

        let customer = db.customers().create(&shop, "João", None).await.unwrap();
        let pkg = db
            .customers()
            .create_package(&shop, &customer.id, "Combo", 4, 10000)
            .await
            .unwrap();

        let mut req = request_for(
            &appt.id,
            vec![
                tender(PaymentMethod::Pacote, 5000),
                tender(PaymentMethod::Pix, 5000),
            ],
        );
        req.customer_id = Some(customer.id.clone());
        let err = run(&db, &shop, "2026-03-02", req).await.unwrap_err();
        assert!(matches!(err, ApiError::Core(CoreError::MixedPackagePayment)));

        // Rejected before the write phase: no rows, no credit movement.
        let sales = db.sales().for_range(&shop, "2026-03-02", "2026-03-02").await.unwrap();
        assert!(sales.is_empty());
        let pkg = db.customers().get_package(&pkg.id).await.unwrap().unwrap();
        assert_eq!(pkg.used_credits, 0);
        let appt = db.appointments().get_by_id(&appt.id).await.unwrap().unwrap();
        assert_eq!(appt.status, AppointmentStatus::Confirmado);
    }

    #[tokio::test]
    async fn test_discount_needs_confirmation() {
        let db = test_db().await;
        let shop = seed_shop(&db).await;
        let barber = seed_barber(&db, &shop).await;
        let appt = seed_appointment(&db, &shop, &barber.id, AppointmentStatus::Confirmado).await;
        db.cash().open_session(&shop, 0).await.unwrap();

        // 45.00 due, 40.00 tendered.
        let err = run(
            &db,
            &shop,
            "2026-03-02",
            request_for(&appt.id, vec![tender(PaymentMethod::Pix, 4000)]),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Core(CoreError::DiscountNotConfirmed { shortfall_cents: 500 })
        ));

        let mut req = request_for(&appt.id, vec![tender(PaymentMethod::Pix, 4000)]);
        req.discount_confirmed = true;
        let outcome = run(&db, &shop, "2026-03-02", req).await.unwrap();
        assert_eq!(outcome.ledger.nominal_discount_cents, 500);
        let finalized = outcome.appointment.unwrap();
        assert_eq!(finalized.status, AppointmentStatus::Finalizado);
    }

    #[tokio::test]
    async fn test_no_open_session_blocks_checkout() {
        let db = test_db().await;
        let shop = seed_shop(&db).await;
        let barber = seed_barber(&db, &shop).await;
        let appt = seed_appointment(&db, &shop, &barber.id, AppointmentStatus::Confirmado).await;

        let err = run(
            &db,
            &shop,
            "2026-03-02",
            request_for(&appt.id, vec![tender(PaymentMethod::Pix, 4500)]),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Core(CoreError::NoOpenCashSession { .. })));
    }

    #[tokio::test]
    async fn test_failed_finalize_unwinds_every_step() {
        let db = test_db().await;
        let shop = seed_shop(&db).await;
        let barber = seed_barber(&db, &shop).await;
        // Still pendente: finalize will be rejected by the status machine,
        // after sales, stock and the drawer were already written.
        let appt = seed_appointment(&db, &shop, &barber.id, AppointmentStatus::Pendente).await;
        db.cash().open_session(&shop, 0).await.unwrap();
        let pomada = db
            .catalog()
            .create_item(&shop, "Pomada", 10, 1200, 2500, 300)
            .await
            .unwrap();

        let err = run(
            &db,
            &shop,
            "2026-03-02",
            CheckoutRequest {
                appointment_id: Some(appt.id.clone()),
                customer_id: None,
                barber_id: None,
                items: vec![CheckoutItem {
                    kind: CatalogKind::Product,
                    item_id: pomada.id.clone(),
                    quantity: 1,
                }],
                tenders: vec![tender(PaymentMethod::Dinheiro, 7000)],
                tip_cents: 0,
                discount_confirmed: false,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Db(_)));

        // Every step compensated in reverse.
        let sales = db.sales().for_range(&shop, "2026-03-02", "2026-03-02").await.unwrap();
        assert!(sales.is_empty());
        let item = db.catalog().get_item(&pomada.id).await.unwrap().unwrap();
        assert_eq!(item.stock, 10);
        let session = db.cash().current_open(&shop).await.unwrap().unwrap();
        let txs = db.cash().transactions_for_session(&session.id).await.unwrap();
        assert!(txs.is_empty());
        let appt = db.appointments().get_by_id(&appt.id).await.unwrap().unwrap();
        assert_eq!(appt.status, AppointmentStatus::Pendente);
    }

    #[tokio::test]
    async fn test_tip_rides_the_service_row() {
        let db = test_db().await;
        let shop = seed_shop(&db).await;
        let barber = seed_barber(&db, &shop).await;
        let appt = seed_appointment(&db, &shop, &barber.id, AppointmentStatus::Confirmado).await;
        db.cash().open_session(&shop, 0).await.unwrap();

        let mut req = request_for(&appt.id, vec![tender(PaymentMethod::Pix, 5500)]);
        req.tip_cents = 1000;
        let outcome = run(&db, &shop, "2026-03-02", req).await.unwrap();

        let rows = db.sales().for_batch(&outcome.batch_sale_id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].tip_cents, 1000);
        assert_eq!(outcome.appointment.unwrap().tip_cents, 1000);
    }
}
