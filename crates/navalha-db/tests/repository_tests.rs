//! Integration tests for the repository layer.
//!
//! Each test runs against a fresh in-memory SQLite database with the full
//! migration set applied, so the partial unique indexes and CHECK
//! constraints are exercised for real.

use navalha_core::payments::FeeSchedule;
use navalha_core::{AppointmentStatus, PaymentMethod, Rate, ShopHours, WeekSchedule};
use navalha_db::{CashFlow, Database, DbConfig, DbError, NewAppointment, NewSale};

async fn test_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

async fn seed_shop(db: &Database) -> String {
    db.shops()
        .create("Barbearia Navalha", "America/Sao_Paulo")
        .await
        .unwrap()
        .id
}

async fn seed_barber(db: &Database, shop_id: &str) -> String {
    db.barbers()
        .create(shop_id, "Rafael", 2000, &WeekSchedule::default())
        .await
        .unwrap()
        .id
}

fn booking(shop_id: &str, barber_id: &str, time: &str, duration: i64) -> NewAppointment {
    NewAppointment {
        shop_id: shop_id.to_string(),
        customer_name: "João".to_string(),
        customer_phone: Some("+5511999990000".to_string()),
        barber_id: barber_id.to_string(),
        barber_name: None,
        service_name: "Corte".to_string(),
        date: "2026-03-02".to_string(),
        start_time: time.to_string(),
        duration_minutes: duration,
        price_cents: 5000,
    }
}

// =============================================================================
// Appointments
// =============================================================================

#[tokio::test]
async fn double_booking_same_slot_is_rejected() {
    let db = test_db().await;
    let shop = seed_shop(&db).await;
    let barber = seed_barber(&db, &shop).await;

    db.appointments()
        .create_checked(booking(&shop, &barber, "10:00", 30))
        .await
        .unwrap();

    let err = db
        .appointments()
        .create_checked(booking(&shop, &barber, "10:00", 30))
        .await
        .unwrap_err();

    assert!(matches!(err, DbError::SlotTaken { .. }));
    assert!(err.is_conflict());

    // Exactly one row survived.
    let day = db.appointments().for_barber_day(&barber, "2026-03-02").await.unwrap();
    assert_eq!(day.len(), 1);
}

#[tokio::test]
async fn partial_overlap_is_rejected() {
    let db = test_db().await;
    let shop = seed_shop(&db).await;
    let barber = seed_barber(&db, &shop).await;

    // 10:00-11:00, then try 10:30-11:00: different start, same interval space.
    db.appointments()
        .create_checked(booking(&shop, &barber, "10:00", 60))
        .await
        .unwrap();

    let err = db
        .appointments()
        .create_checked(booking(&shop, &barber, "10:30", 30))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::SlotTaken { .. }));

    // Adjacent is fine.
    db.appointments()
        .create_checked(booking(&shop, &barber, "11:00", 30))
        .await
        .unwrap();
}

#[tokio::test]
async fn cancelled_appointment_releases_its_slot() {
    let db = test_db().await;
    let shop = seed_shop(&db).await;
    let barber = seed_barber(&db, &shop).await;

    let appt = db
        .appointments()
        .create_checked(booking(&shop, &barber, "10:00", 30))
        .await
        .unwrap();

    db.appointments()
        .set_status(&appt.id, AppointmentStatus::Cancelado)
        .await
        .unwrap();

    // The same slot can now be rebooked.
    db.appointments()
        .create_checked(booking(&shop, &barber, "10:00", 30))
        .await
        .unwrap();
}

#[tokio::test]
async fn status_machine_is_enforced() {
    let db = test_db().await;
    let shop = seed_shop(&db).await;
    let barber = seed_barber(&db, &shop).await;

    let appt = db
        .appointments()
        .create_checked(booking(&shop, &barber, "09:00", 30))
        .await
        .unwrap();

    // pendente → finalizado skips confirmation
    let err = db
        .appointments()
        .set_status(&appt.id, AppointmentStatus::Finalizado)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::InvalidTransition { .. }));

    db.appointments()
        .set_status(&appt.id, AppointmentStatus::Confirmado)
        .await
        .unwrap();
    db.appointments()
        .set_status(&appt.id, AppointmentStatus::Finalizado)
        .await
        .unwrap();

    // Terminal
    let err = db
        .appointments()
        .set_status(&appt.id, AppointmentStatus::Cancelado)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::InvalidTransition { .. }));
}

#[tokio::test]
async fn delete_requires_cancelled_status() {
    let db = test_db().await;
    let shop = seed_shop(&db).await;
    let barber = seed_barber(&db, &shop).await;

    let appt = db
        .appointments()
        .create_checked(booking(&shop, &barber, "09:00", 30))
        .await
        .unwrap();

    let err = db.appointments().delete(&appt.id).await.unwrap_err();
    assert!(matches!(err, DbError::DeleteNotAllowed { .. }));

    db.appointments()
        .set_status(&appt.id, AppointmentStatus::Cancelado)
        .await
        .unwrap();
    db.appointments().delete(&appt.id).await.unwrap();

    assert!(db.appointments().get_by_id(&appt.id).await.unwrap().is_none());
}

#[tokio::test]
async fn finalize_stamps_and_reverts() {
    let db = test_db().await;
    let shop = seed_shop(&db).await;
    let barber = seed_barber(&db, &shop).await;

    let appt = db
        .appointments()
        .create_checked(booking(&shop, &barber, "14:00", 30))
        .await
        .unwrap();
    db.appointments()
        .set_status(&appt.id, AppointmentStatus::Confirmado)
        .await
        .unwrap();

    let stamp = navalha_db::CheckoutStamp {
        price_cents: 4500,
        payment_label: "pix".to_string(),
        tip_cents: 500,
        package_id: None,
        batch_sale_id: "batch-1".to_string(),
    };
    db.appointments().finalize(&appt.id, &stamp).await.unwrap();

    let loaded = db.appointments().get_by_id(&appt.id).await.unwrap().unwrap();
    assert_eq!(loaded.status, AppointmentStatus::Finalizado);
    assert_eq!(loaded.price_cents, 4500);
    assert_eq!(loaded.original_price_cents, 5000);
    assert_eq!(loaded.tip_cents, 500);
    assert_eq!(loaded.batch_sale_id.as_deref(), Some("batch-1"));

    db.appointments().revert_finalize(&appt.id).await.unwrap();

    let reverted = db.appointments().get_by_id(&appt.id).await.unwrap().unwrap();
    assert_eq!(reverted.status, AppointmentStatus::Confirmado);
    assert_eq!(reverted.price_cents, 5000);
    assert!(reverted.payment_label.is_none());
    assert!(reverted.batch_sale_id.is_none());
}

// =============================================================================
// Packages
// =============================================================================

#[tokio::test]
async fn package_credits_cannot_be_overdrawn() {
    let db = test_db().await;
    let shop = seed_shop(&db).await;
    let customer = db.customers().create(&shop, "Maria", None).await.unwrap();

    let package = db
        .customers()
        .create_package(&shop, &customer.id, "Combo 4 cortes", 4, 10000)
        .await
        .unwrap();

    db.customers().redeem_credits(&package.id, 3).await.unwrap();

    let err = db.customers().redeem_credits(&package.id, 2).await.unwrap_err();
    assert!(matches!(err, DbError::PackageExhausted { .. }));

    // Compensation path restores what a failed checkout consumed.
    db.customers().refund_credits(&package.id, 1).await.unwrap();
    db.customers().redeem_credits(&package.id, 2).await.unwrap();

    let loaded = db.customers().get_package(&package.id).await.unwrap().unwrap();
    assert_eq!(loaded.used_credits, 4);
    assert!(!loaded.is_active());
}

// =============================================================================
// Inventory
// =============================================================================

#[tokio::test]
async fn stock_cannot_go_negative() {
    let db = test_db().await;
    let shop = seed_shop(&db).await;

    let item = db
        .catalog()
        .create_item(&shop, "Pomada", 2, 1000, 2500, 300)
        .await
        .unwrap();

    db.catalog().decrement_stock(&item.id, 2).await.unwrap();

    let err = db.catalog().decrement_stock(&item.id, 1).await.unwrap_err();
    assert!(matches!(
        err,
        DbError::InsufficientStock { available: 0, requested: 1, .. }
    ));

    db.catalog().increment_stock(&item.id, 5).await.unwrap();
    let loaded = db.catalog().get_item(&item.id).await.unwrap().unwrap();
    assert_eq!(loaded.stock, 5);
}

// =============================================================================
// Cash Sessions
// =============================================================================

#[tokio::test]
async fn one_open_session_per_shop() {
    let db = test_db().await;
    let shop = seed_shop(&db).await;

    db.cash().open_session(&shop, 10000).await.unwrap();

    let err = db.cash().open_session(&shop, 5000).await.unwrap_err();
    assert!(matches!(err, DbError::SessionAlreadyOpen { .. }));
    assert!(err.is_conflict());
}

#[tokio::test]
async fn close_computes_expected_and_variance() {
    let db = test_db().await;
    let shop = seed_shop(&db).await;

    let session = db.cash().open_session(&shop, 10000).await.unwrap();

    db.cash()
        .add_transaction(&shop, &session.id, CashFlow::Entrada, "Corte", 5000, Some("dinheiro"))
        .await
        .unwrap();
    db.cash()
        .add_transaction(&shop, &session.id, CashFlow::Saida, "Troco", 1000, None)
        .await
        .unwrap();

    // expected = 100.00 + 50.00 − 10.00 = 140.00; counted 1.00 short
    let closed = db.cash().close_session(&session.id, 13900).await.unwrap();
    assert_eq!(closed.expected_cents, 14000);
    assert_eq!(closed.variance_cents(), -100);

    // A new session may open now.
    db.cash().open_session(&shop, 5000).await.unwrap();
}

// =============================================================================
// Sales
// =============================================================================

#[tokio::test]
async fn sale_batch_round_trip() {
    let db = test_db().await;
    let shop = seed_shop(&db).await;
    let barber = seed_barber(&db, &shop).await;

    let row = |service: &str, price: i64| NewSale {
        shop_id: shop.clone(),
        barber_id: Some(barber.clone()),
        barber_name: None,
        service_name: service.to_string(),
        date: "2026-03-02".to_string(),
        price_cents: price,
        tip_cents: 0,
        product_commission_cents: 0,
        commission_rate_bps: Some(2000),
        payment_label: Some("pix".to_string()),
        batch_sale_id: Some("batch-9".to_string()),
    };

    db.sales().insert(row("Corte", 5000)).await.unwrap();
    db.sales().insert(row("Barba", 3000)).await.unwrap();

    let batch = db.sales().for_batch("batch-9").await.unwrap();
    assert_eq!(batch.len(), 2);
    assert_eq!(batch[0].commission_rate_bps, Some(2000));

    let in_range = db.sales().for_range(&shop, "2026-03-01", "2026-03-31").await.unwrap();
    assert_eq!(in_range.len(), 2);

    let removed = db.sales().delete_batch("batch-9").await.unwrap();
    assert_eq!(removed, 2);
    assert!(db.sales().for_batch("batch-9").await.unwrap().is_empty());
}

// =============================================================================
// Shop Settings
// =============================================================================

#[tokio::test]
async fn hours_and_fees_round_trip() {
    let db = test_db().await;
    let shop = seed_shop(&db).await;

    // Defaults first
    let hours = db.shops().hours(&shop).await.unwrap();
    assert_eq!(hours.opening_time, "08:00");
    assert!(!hours.is_closed);

    db.shops()
        .update_hours(
            &shop,
            &ShopHours {
                opening_time: "09:00".to_string(),
                closing_time: "19:00".to_string(),
                is_closed: true,
            },
        )
        .await
        .unwrap();

    let hours = db.shops().hours(&shop).await.unwrap();
    assert_eq!(hours.closing_time, "19:00");
    assert!(hours.is_closed);

    let fees = FeeSchedule::new()
        .with_rate(PaymentMethod::Credito, Rate::from_bps(500))
        .with_rate(PaymentMethod::Debito, Rate::from_bps(200));
    db.shops().update_fees(&shop, &fees).await.unwrap();

    let loaded = db.shops().fees(&shop).await.unwrap();
    assert_eq!(loaded.rate(PaymentMethod::Credito).bps(), 500);
    assert_eq!(loaded.rate(PaymentMethod::Pix).bps(), 0);
}

#[tokio::test]
async fn subscription_fields_round_trip() {
    let db = test_db().await;
    let shop = seed_shop(&db).await;

    let info = db.shops().subscription(&shop).await.unwrap();
    assert!(info.subscription_status.is_none());

    let update = navalha_core::SubscriptionInfo {
        subscription_status: Some("active".to_string()),
        expires_at: None,
        trial_ends_at: None,
        current_plan: Some("pro".to_string()),
    };
    db.shops().set_subscription(&shop, &update).await.unwrap();

    let info = db.shops().subscription(&shop).await.unwrap();
    assert_eq!(info.subscription_status.as_deref(), Some("active"));
    assert_eq!(info.current_plan.as_deref(), Some("pro"));
}

#[tokio::test]
async fn barber_schedule_round_trip() {
    let db = test_db().await;
    let shop = seed_shop(&db).await;

    let mut schedule = WeekSchedule::default();
    schedule.days[0].active = true;
    schedule.days[0].start = "10:00".to_string();

    let barber = db
        .barbers()
        .create(&shop, "Igor", 1500, &schedule)
        .await
        .unwrap();

    db.barbers().update(&barber.id, "Igor Santos", 1800).await.unwrap();

    let loaded = db.barbers().get_by_id(&barber.id).await.unwrap().unwrap();
    assert_eq!(loaded.name, "Igor Santos");
    assert_eq!(loaded.commission_rate_bps, 1800);
    assert!(loaded.schedule.days[0].active);
    assert_eq!(loaded.schedule.days[0].start, "10:00");

    db.barbers().deactivate(&barber.id).await.unwrap();
    assert!(db.barbers().list_active(&shop).await.unwrap().is_empty());
    assert_eq!(db.barbers().list_all(&shop).await.unwrap().len(), 1);
}

#[tokio::test]
async fn reschedule_moves_the_slot_and_respects_overlaps() {
    let db = test_db().await;
    let shop = seed_shop(&db).await;
    let barber = seed_barber(&db, &shop).await;

    let first = db
        .appointments()
        .create_checked(booking(&shop, &barber, "10:00", 30))
        .await
        .unwrap();
    db.appointments()
        .create_checked(booking(&shop, &barber, "14:00", 30))
        .await
        .unwrap();

    // Free slot: moves.
    db.appointments()
        .reschedule(&first.id, "2026-03-02", "11:00", None)
        .await
        .unwrap();
    let moved = db.appointments().get_by_id(&first.id).await.unwrap().unwrap();
    assert_eq!(moved.start_time, "11:00");

    // Onto the other booking: rejected, slot unchanged.
    let err = db
        .appointments()
        .reschedule(&first.id, "2026-03-02", "14:15", None)
        .await
        .unwrap_err();
    assert!(err.is_conflict());
    let unchanged = db.appointments().get_by_id(&first.id).await.unwrap().unwrap();
    assert_eq!(unchanged.start_time, "11:00");

    // An appointment may land back on its own old interval.
    db.appointments()
        .reschedule(&first.id, "2026-03-02", "11:15", None)
        .await
        .unwrap();
}

#[tokio::test]
async fn terminal_appointments_cannot_be_rescheduled() {
    let db = test_db().await;
    let shop = seed_shop(&db).await;
    let barber = seed_barber(&db, &shop).await;

    let appt = db
        .appointments()
        .create_checked(booking(&shop, &barber, "10:00", 30))
        .await
        .unwrap();
    db.appointments()
        .set_status(&appt.id, AppointmentStatus::Cancelado)
        .await
        .unwrap();

    let err = db
        .appointments()
        .reschedule(&appt.id, "2026-03-03", "10:00", None)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::InvalidTransition { .. }));
}
