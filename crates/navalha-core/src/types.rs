//! # Domain Types
//!
//! Core domain types used throughout Navalha.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   Appointment   │   │     Barber      │   │  SaleRecord     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  date / time    │   │  week schedule  │   │  barber ref     │       │
//! │  │  status FSM     │   │  commission bps │   │  rate snapshot  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Rate       │   │ AppointmentStatus│  │ PaymentMethod   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bps (u32)      │   │  Pendente       │   │  Dinheiro, Pix  │       │
//! │  │  500 = 5.00%    │   │  Confirmado …   │   │  Debito, …      │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Appointments and sales reference their barber by `id` (UUID, written at
//! creation) and may carry a legacy `barber_name`. Only
//! [`crate::commissions::resolve_professional`] is allowed to branch on the
//! name fallback; everything else uses the id.

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::slots;

// =============================================================================
// Rate
// =============================================================================

/// A percentage rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 500 bps = 5.00% (a typical credit card fee)
/// 2000 bps = 20.00% (a typical commission percentage)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Rate(u32);

impl Rate {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    /// Creates a rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        Rate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        Rate(0)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for Rate {
    fn default() -> Self {
        Rate::zero()
    }
}

// =============================================================================
// Appointment Status
// =============================================================================

/// The lifecycle status of an appointment.
///
/// ## State Machine
/// ```text
/// pendente ──► confirmado ──► finalizado (terminal)
///    │              │
///    └──────────────┴──────► cancelado  (terminal, slot released)
/// ```
///
/// Wire tokens stay in Portuguese - the booking site, the admin SPA, and the
/// stored rows all speak `pendente`/`confirmado`/`finalizado`/`cancelado`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    /// Awaiting shop confirmation. Occupies the slot.
    Pendente,
    /// Accepted by the shop. Occupies the slot.
    Confirmado,
    /// Service delivered and paid. Terminal.
    Finalizado,
    /// Rejected or withdrawn. Terminal; the slot is released.
    Cancelado,
}

impl AppointmentStatus {
    /// Whether a transition from `self` to `next` is allowed.
    ///
    /// No transition leaves `finalizado` or `cancelado`; the only way out of
    /// `cancelado` is an operator-initiated hard delete of the record.
    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        matches!(
            (self, next),
            (Pendente, Confirmado)
                | (Pendente, Cancelado)
                | (Confirmado, Finalizado)
                | (Confirmado, Cancelado)
        )
    }

    /// Whether this status still holds its slot against other bookings.
    #[inline]
    pub fn blocks_slot(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelado)
    }

    /// Whether the status admits no further transitions.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Finalizado | AppointmentStatus::Cancelado
        )
    }

    /// Stable wire token, matching the stored value.
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pendente => "pendente",
            AppointmentStatus::Confirmado => "confirmado",
            AppointmentStatus::Finalizado => "finalizado",
            AppointmentStatus::Cancelado => "cancelado",
        }
    }
}

impl Default for AppointmentStatus {
    fn default() -> Self {
        AppointmentStatus::Pendente
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// The tender types a checkout can receive.
///
/// `Pacote` is special: a cart containing a package redemption must be paid
/// with `pacote` alone - package credits cannot be split against other
/// tenders.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Physical cash.
    Dinheiro,
    /// Instant bank transfer.
    Pix,
    /// Debit card.
    Debito,
    /// Credit card.
    Credito,
    /// Prepaid package credit redemption.
    Pacote,
}

impl PaymentMethod {
    /// All methods, in display order.
    pub const ALL: [PaymentMethod; 5] = [
        PaymentMethod::Dinheiro,
        PaymentMethod::Pix,
        PaymentMethod::Debito,
        PaymentMethod::Credito,
        PaymentMethod::Pacote,
    ];

    /// Stable wire token, matching the stored value.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Dinheiro => "dinheiro",
            PaymentMethod::Pix => "pix",
            PaymentMethod::Debito => "debito",
            PaymentMethod::Credito => "credito",
            PaymentMethod::Pacote => "pacote",
        }
    }

    /// Parses a wire token back into a method.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "dinheiro" => Some(PaymentMethod::Dinheiro),
            "pix" => Some(PaymentMethod::Pix),
            "debito" => Some(PaymentMethod::Debito),
            "credito" => Some(PaymentMethod::Credito),
            "pacote" => Some(PaymentMethod::Pacote),
            _ => None,
        }
    }
}

// =============================================================================
// Appointment
// =============================================================================

/// A scheduled or completed unit of service.
///
/// ## Invariant
/// For a given (barber, date) pair, no two non-cancelled appointments may
/// have overlapping `[time, time+duration)` intervals. The database enforces
/// the exact-slot case with a partial unique index; the availability resolver
/// and `create_checked` guard the overlap case before insert.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Appointment {
    pub id: String,
    pub shop_id: String,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    /// Barber id (UUID). Always written at creation; may be absent only on
    /// legacy rows imported without a foreign key.
    pub barber_id: Option<String>,
    /// Legacy display-name reference. Read only through
    /// [`crate::commissions::resolve_professional`].
    pub barber_name: Option<String>,
    pub service_name: String,
    /// Calendar date, `YYYY-MM-DD`.
    pub date: String,
    /// Time of day, `HH:MM`.
    pub start_time: String,
    pub duration_minutes: i64,
    /// Current (net) price in cents.
    pub price_cents: i64,
    /// Pre-discount list price in cents.
    pub original_price_cents: i64,
    /// Single token ("pix") or composite label ("pix(30.00) + credito(15.00)").
    pub payment_label: Option<String>,
    pub status: AppointmentStatus,
    pub tip_cents: i64,
    /// Set when this appointment consumed a package credit at checkout.
    pub package_id: Option<String>,
    /// Groups the appointment with the sale rows written by the same checkout.
    pub batch_sale_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Start of the appointment in minutes since midnight.
    #[inline]
    pub fn start_minutes(&self) -> u32 {
        slots::time_to_minutes(&self.start_time)
    }

    /// Whether this appointment occupies its slot (i.e. is not cancelled).
    #[inline]
    pub fn blocks_slot(&self) -> bool {
        self.status.blocks_slot()
    }
}

// =============================================================================
// Catalog: Service & Inventory
// =============================================================================

/// A bookable service in the shop's catalog.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Service {
    pub id: String,
    pub shop_id: String,
    pub name: String,
    pub price_cents: i64,
    pub duration_minutes: i64,
    /// Soft delete flag.
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Service {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

/// A retail product tracked in inventory.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InventoryItem {
    pub id: String,
    pub shop_id: String,
    pub name: String,
    /// Current stock level.
    pub stock: i64,
    /// Acquisition cost in cents.
    pub cost_cents: i64,
    /// Sell price in cents.
    pub sell_price_cents: i64,
    /// Fixed commission paid to the barber per unit sold, in cents.
    /// Non-zero overrides the barber's percentage commission for this item.
    pub commission_cents: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl InventoryItem {
    /// Checks if the requested quantity can be sold from stock.
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }
}

// =============================================================================
// Customer Package
// =============================================================================

/// A prepaid bundle of service credits redeemable over multiple visits.
///
/// ## Invariant
/// `used_credits <= total_credits`. A package is "active" while
/// `used_credits < total_credits`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerPackage {
    pub id: String,
    pub shop_id: String,
    pub customer_id: String,
    /// Package display name. Drives redemption eligibility by
    /// case-insensitive containment of the service name (or the literal
    /// "combo", which matches every service).
    pub name: String,
    pub total_credits: i64,
    pub used_credits: i64,
    /// Amount the customer paid for the bundle, in cents.
    pub price_paid_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl CustomerPackage {
    /// A package is active while it has unredeemed credits.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.used_credits < self.total_credits
    }

    /// Credits still available for redemption.
    #[inline]
    pub fn remaining_credits(&self) -> i64 {
        (self.total_credits - self.used_credits).max(0)
    }
}

// =============================================================================
// Cash Session
// =============================================================================

/// Status of a cash session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum CashSessionStatus {
    Open,
    Closed,
}

/// A day's opening-to-closing cash-drawer reconciliation period.
///
/// ## Invariant
/// Exactly one `open` session may exist per shop at a time, enforced by a
/// partial unique index. Checkout requires an open session as a precondition.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CashSession {
    pub id: String,
    pub shop_id: String,
    /// Initial float placed in the drawer at open.
    pub opening_float_cents: i64,
    /// Computed expected value at close (float + net cash movements).
    pub expected_cents: i64,
    /// Actual counted value at close. Zero until closed.
    pub counted_cents: i64,
    pub status: CashSessionStatus,
    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl CashSession {
    /// Difference between counted and expected at close (negative = short).
    #[inline]
    pub fn variance_cents(&self) -> i64 {
        self.counted_cents - self.expected_cents
    }
}

// =============================================================================
// Barber & Working Hours
// =============================================================================

/// A barber's configured window for one weekday.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DayHours {
    /// Whether the barber works this weekday at all.
    pub active: bool,
    /// Window start, `HH:MM`.
    pub start: String,
    /// Window end, `HH:MM`.
    pub end: String,
}

impl Default for DayHours {
    fn default() -> Self {
        DayHours {
            active: false,
            start: "09:00".to_string(),
            end: "18:00".to_string(),
        }
    }
}

/// Per-weekday working hours, Monday-first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WeekSchedule {
    /// Index 0 = Monday … index 6 = Sunday.
    pub days: [DayHours; 7],
}

impl WeekSchedule {
    /// Returns the configured hours for a weekday.
    pub fn for_weekday(&self, weekday: Weekday) -> &DayHours {
        &self.days[weekday.num_days_from_monday() as usize]
    }

    /// Returns the configured hours for a calendar date.
    pub fn for_date(&self, date: NaiveDate) -> &DayHours {
        use chrono::Datelike;
        self.for_weekday(date.weekday())
    }
}

/// A professional working at the shop.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Barber {
    pub id: String,
    pub shop_id: String,
    pub name: String,
    /// Percentage commission on service sales, in basis points.
    pub commission_rate_bps: u32,
    pub schedule: WeekSchedule,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Barber {
    #[inline]
    pub fn commission_rate(&self) -> Rate {
        Rate::from_bps(self.commission_rate_bps)
    }
}

// =============================================================================
// Shop Hours & Subscription
// =============================================================================

/// The shop's global opening window, applied on top of each barber's hours.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ShopHours {
    /// Global open, `HH:MM`.
    pub opening_time: String,
    /// Global close, `HH:MM`.
    pub closing_time: String,
    /// Hard switch: when true no slot is offerable regardless of other config.
    pub is_closed: bool,
}

impl Default for ShopHours {
    fn default() -> Self {
        ShopHours {
            opening_time: "08:00".to_string(),
            closing_time: "20:00".to_string(),
            is_closed: false,
        }
    }
}

/// Subscription fields owned by the external billing webhook.
///
/// The engine only ever reads these; the webhook state machine that writes
/// them lives with the payment provider integration.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SubscriptionInfo {
    /// `active` or `canceled`, as written by the webhook.
    pub subscription_status: Option<String>,
    #[ts(as = "Option<String>")]
    pub expires_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub current_plan: Option<String>,
}

// =============================================================================
// Sale Record
// =============================================================================

/// A finalized sale row, as consumed by the commission ledger.
///
/// Uses the snapshot pattern: `commission_rate_bps` freezes the barber's
/// percentage at finalize time so editing the live rate later does not
/// rewrite history. Legacy rows without a snapshot fall back to the live
/// rate when the ledger runs.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleRecord {
    pub id: String,
    pub shop_id: String,
    pub barber_id: Option<String>,
    /// Legacy display-name reference, see the dual-key identity note.
    pub barber_name: Option<String>,
    pub service_name: String,
    /// Calendar date, `YYYY-MM-DD`.
    pub date: String,
    pub price_cents: i64,
    pub tip_cents: i64,
    /// Fixed per-product commission. Non-zero overrides the percentage.
    pub product_commission_cents: i64,
    /// Commission rate snapshot taken at finalize time.
    pub commission_rate_bps: Option<u32>,
    pub payment_label: Option<String>,
    /// Groups rows written by the same checkout.
    pub batch_sale_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl SaleRecord {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Whether this row is a tip ("caixinha") record.
    #[inline]
    pub fn is_tip_record(&self) -> bool {
        self.service_name == crate::TIP_SERVICE_NAME
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_from_bps() {
        let rate = Rate::from_bps(500);
        assert_eq!(rate.bps(), 500);
        assert!((rate.percentage() - 5.0).abs() < 0.001);
    }

    #[test]
    fn test_rate_from_percentage() {
        let rate = Rate::from_percentage(20.0);
        assert_eq!(rate.bps(), 2000);
    }

    #[test]
    fn test_status_lifecycle() {
        use AppointmentStatus::*;

        assert!(Pendente.can_transition_to(Confirmado));
        assert!(Pendente.can_transition_to(Cancelado));
        assert!(Confirmado.can_transition_to(Finalizado));
        assert!(Confirmado.can_transition_to(Cancelado));

        // Terminal states admit nothing
        assert!(!Finalizado.can_transition_to(Cancelado));
        assert!(!Cancelado.can_transition_to(Pendente));
        assert!(!Finalizado.can_transition_to(Confirmado));

        // No skipping confirmation
        assert!(!Pendente.can_transition_to(Finalizado));
    }

    #[test]
    fn test_status_blocks_slot() {
        assert!(AppointmentStatus::Pendente.blocks_slot());
        assert!(AppointmentStatus::Confirmado.blocks_slot());
        assert!(AppointmentStatus::Finalizado.blocks_slot());
        assert!(!AppointmentStatus::Cancelado.blocks_slot());
    }

    #[test]
    fn test_payment_method_tokens_round_trip() {
        for method in PaymentMethod::ALL {
            assert_eq!(PaymentMethod::parse(method.as_str()), Some(method));
        }
        assert_eq!(PaymentMethod::parse("cheque"), None);
    }

    #[test]
    fn test_package_activity() {
        let mut package = CustomerPackage {
            id: "p1".to_string(),
            shop_id: "s1".to_string(),
            customer_id: "c1".to_string(),
            name: "Combo".to_string(),
            total_credits: 4,
            used_credits: 0,
            price_paid_cents: 10000,
            created_at: Utc::now(),
        };
        assert!(package.is_active());
        assert_eq!(package.remaining_credits(), 4);

        package.used_credits = 4;
        assert!(!package.is_active());
        assert_eq!(package.remaining_credits(), 0);
    }

    #[test]
    fn test_week_schedule_indexing() {
        let mut schedule = WeekSchedule::default();
        schedule.days[0].active = true; // Monday

        // 2026-03-02 is a Monday
        let monday = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert!(schedule.for_date(monday).active);

        let tuesday = NaiveDate::from_ymd_opt(2026, 3, 3).unwrap();
        assert!(!schedule.for_date(tuesday).active);
    }

    #[test]
    fn test_tip_record_detection() {
        let sale = SaleRecord {
            id: "1".to_string(),
            shop_id: "s1".to_string(),
            barber_id: None,
            barber_name: None,
            service_name: crate::TIP_SERVICE_NAME.to_string(),
            date: "2026-03-02".to_string(),
            price_cents: 1000,
            tip_cents: 0,
            product_commission_cents: 0,
            commission_rate_bps: None,
            payment_label: None,
            batch_sale_id: None,
            created_at: Utc::now(),
        };
        assert!(sale.is_tip_record());
    }
}
