//! # Availability Resolver
//!
//! Computes the set of offerable appointment start times for one barber and
//! one date.
//!
//! ## Resolution Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  enumerate 15-min slots across the day                                  │
//! │       │                                                                 │
//! │       ├── shop closed today? ───────────────► no slots at all          │
//! │       ├── weekday inactive for barber? ─────► no slots at all          │
//! │       ├── slot outside shop hours? ─────────► drop slot                │
//! │       ├── slot outside barber's hours? ─────► drop slot                │
//! │       ├── overlaps an existing booking? ────► drop slot                │
//! │       └── already in the past (today)? ─────► drop slot                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ordered Vec<"HH:MM">                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The resolver is pure and idempotent: it is recomputed from scratch on
//! every input change, holds no state, and takes the shop-local clock as an
//! argument instead of reading it. It is an optimization, not the line of
//! defense - double-booking is ultimately rejected by the store's uniqueness
//! constraint at write time, and the client re-validates right before submit.

use chrono::{NaiveDate, NaiveDateTime, Timelike};

use crate::slots::{intervals_overlap, minutes_to_time, time_to_minutes};
use crate::types::{Appointment, DayHours, ShopHours};
use crate::SLOT_STEP_MINUTES;

const MINUTES_PER_DAY: u32 = 24 * 60;

// =============================================================================
// Booked Intervals
// =============================================================================

/// A time interval already taken on the barber's day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookedInterval {
    pub start_minutes: u32,
    pub duration_minutes: u32,
}

impl BookedInterval {
    /// Extracts the blocking intervals for one barber and date from a list
    /// of appointments. Cancelled appointments release their slot and are
    /// skipped.
    pub fn collect(appointments: &[Appointment], barber_id: &str, date: &str) -> Vec<Self> {
        appointments
            .iter()
            .filter(|a| a.date == date)
            .filter(|a| a.barber_id.as_deref() == Some(barber_id))
            .filter(|a| a.blocks_slot())
            .map(|a| BookedInterval {
                start_minutes: a.start_minutes(),
                duration_minutes: a.duration_minutes.max(0) as u32,
            })
            .collect()
    }
}

// =============================================================================
// Query & Resolver
// =============================================================================

/// Everything the resolver needs, gathered by the caller.
#[derive(Debug, Clone)]
pub struct AvailabilityQuery<'a> {
    /// Target calendar date.
    pub date: NaiveDate,
    /// The barber's configured window for the target weekday.
    pub day_hours: &'a DayHours,
    /// The shop's global window.
    pub shop_hours: &'a ShopHours,
    /// Duration of the candidate service, minutes.
    pub duration_minutes: u32,
    /// Non-cancelled bookings already on the barber's day.
    pub booked: &'a [BookedInterval],
    /// "Now" in the shop's local timezone. The resolver never reads a clock;
    /// the caller converts with the shop's configured timezone.
    pub local_now: NaiveDateTime,
}

/// Produces the ordered list of offerable `HH:MM` start times.
///
/// ## Edge policy
/// - `shop_hours.is_closed` short-circuits to an empty list.
/// - Both the slot start and the slot end (`start + duration`) must sit
///   inside the shop window and inside the barber's window.
/// - A slot conflicts when its `[start, start+duration)` interval overlaps
///   any booked interval (strict inequalities, see [`intervals_overlap`]).
/// - When the target date is today, slots at or before the current minute
///   are gone.
pub fn available_slots(query: &AvailabilityQuery<'_>) -> Vec<String> {
    if query.shop_hours.is_closed || !query.day_hours.active || query.duration_minutes == 0 {
        return Vec::new();
    }

    let shop_open = time_to_minutes(&query.shop_hours.opening_time);
    let shop_close = time_to_minutes(&query.shop_hours.closing_time);
    let barber_start = time_to_minutes(&query.day_hours.start);
    let barber_end = time_to_minutes(&query.day_hours.end);

    let is_today = query.local_now.date() == query.date;
    let now_minutes = query.local_now.time().hour() * 60 + query.local_now.time().minute();

    let mut offerable = Vec::new();
    let mut start = 0u32;
    while start + query.duration_minutes <= MINUTES_PER_DAY {
        let end = start + query.duration_minutes;

        let in_shop_window = start >= shop_open && end <= shop_close;
        let in_barber_window = start >= barber_start && end <= barber_end;
        let conflicts = query.booked.iter().any(|b| {
            intervals_overlap(start, query.duration_minutes, b.start_minutes, b.duration_minutes)
        });
        let in_past = is_today && start <= now_minutes;

        if in_shop_window && in_barber_window && !conflicts && !in_past {
            offerable.push(minutes_to_time(start));
        }

        start += SLOT_STEP_MINUTES;
    }

    offerable
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn hours(active: bool, start: &str, end: &str) -> DayHours {
        DayHours {
            active,
            start: start.to_string(),
            end: end.to_string(),
        }
    }

    fn shop(open: &str, close: &str, closed: bool) -> ShopHours {
        ShopHours {
            opening_time: open.to_string(),
            closing_time: close.to_string(),
            is_closed: closed,
        }
    }

    /// A date far enough out that "past time" filtering never triggers.
    fn future_query<'a>(
        day_hours: &'a DayHours,
        shop_hours: &'a ShopHours,
        duration: u32,
        booked: &'a [BookedInterval],
    ) -> AvailabilityQuery<'a> {
        AvailabilityQuery {
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            day_hours,
            shop_hours,
            duration_minutes: duration,
            booked,
            local_now: NaiveDate::from_ymd_opt(2026, 1, 1)
                .unwrap()
                .and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap()),
        }
    }

    #[test]
    fn test_open_morning_no_bookings() {
        // Barber 09:00-12:00, shop 08:00-20:00, 30-minute service:
        // every quarter hour from 09:00 through 11:30 (last end <= 12:00).
        let day = hours(true, "09:00", "12:00");
        let shop = shop("08:00", "20:00", false);
        let slots = available_slots(&future_query(&day, &shop, 30, &[]));

        let expected: Vec<String> = (0..12)
            .map(|i| minutes_to_time(540 + i * 15))
            .collect();
        assert_eq!(slots, expected);
        assert_eq!(slots.first().map(String::as_str), Some("09:00"));
        assert_eq!(slots.last().map(String::as_str), Some("11:30"));
    }

    #[test]
    fn test_existing_booking_excludes_exact_neighborhood() {
        // A confirmed 10:00 x 30min booking must knock out exactly
        // 09:45, 10:00 and 10:15 for another 30-minute service.
        let day = hours(true, "09:00", "12:00");
        let shop = shop("08:00", "20:00", false);
        let booked = [BookedInterval {
            start_minutes: 600,
            duration_minutes: 30,
        }];
        let slots = available_slots(&future_query(&day, &shop, 30, &booked));

        for gone in ["09:45", "10:00", "10:15"] {
            assert!(!slots.contains(&gone.to_string()), "{gone} should be excluded");
        }
        for kept in ["09:00", "09:15", "09:30", "10:30", "11:30"] {
            assert!(slots.contains(&kept.to_string()), "{kept} should remain");
        }
    }

    #[test]
    fn test_shop_closed_overrides_everything() {
        let day = hours(true, "09:00", "12:00");
        let shop = shop("08:00", "20:00", true);
        assert!(available_slots(&future_query(&day, &shop, 30, &[])).is_empty());
    }

    #[test]
    fn test_inactive_weekday() {
        let day = hours(false, "09:00", "12:00");
        let shop = shop("08:00", "20:00", false);
        assert!(available_slots(&future_query(&day, &shop, 30, &[])).is_empty());
    }

    #[test]
    fn test_shop_window_trims_barber_window() {
        // Barber configured 07:00-12:00 but the shop opens at 09:00.
        let day = hours(true, "07:00", "12:00");
        let shop = shop("09:00", "20:00", false);
        let slots = available_slots(&future_query(&day, &shop, 30, &[]));
        assert_eq!(slots.first().map(String::as_str), Some("09:00"));
    }

    #[test]
    fn test_past_slots_excluded_today() {
        let day = hours(true, "09:00", "12:00");
        let shop = shop("08:00", "20:00", false);
        let booked = [];
        let query = AvailabilityQuery {
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            day_hours: &day,
            shop_hours: &shop,
            duration_minutes: 30,
            booked: &booked,
            // Shop-local clock says 10:05 on the target date itself.
            local_now: NaiveDate::from_ymd_opt(2026, 3, 2)
                .unwrap()
                .and_time(NaiveTime::from_hms_opt(10, 5, 0).unwrap()),
        };
        let slots = available_slots(&query);
        assert_eq!(slots.first().map(String::as_str), Some("10:15"));
        assert!(!slots.contains(&"10:00".to_string()));
    }

    #[test]
    fn test_slot_at_the_current_minute_is_gone() {
        // 10:00 sharp on the clock: the 10:00 slot itself is no longer
        // offerable, only strictly later starts are.
        let day = hours(true, "09:00", "12:00");
        let shop = shop("08:00", "20:00", false);
        let booked = [];
        let query = AvailabilityQuery {
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            day_hours: &day,
            shop_hours: &shop,
            duration_minutes: 30,
            booked: &booked,
            local_now: NaiveDate::from_ymd_opt(2026, 3, 2)
                .unwrap()
                .and_time(NaiveTime::from_hms_opt(10, 0, 0).unwrap()),
        };
        let slots = available_slots(&query);
        assert!(!slots.contains(&"10:00".to_string()));
        assert_eq!(slots.first().map(String::as_str), Some("10:15"));
    }

    #[test]
    fn test_idempotent() {
        let day = hours(true, "09:00", "18:00");
        let shop = shop("08:00", "20:00", false);
        let booked = [BookedInterval {
            start_minutes: 600,
            duration_minutes: 45,
        }];
        let query = future_query(&day, &shop, 30, &booked);
        let first = available_slots(&query);
        let second = available_slots(&query);
        assert_eq!(first, second);
    }

    #[test]
    fn test_collect_skips_cancelled_and_other_barbers() {
        use crate::types::{Appointment, AppointmentStatus};
        use chrono::Utc;

        let appointment = |barber: &str, time: &str, status: AppointmentStatus| Appointment {
            id: "a".to_string(),
            shop_id: "s".to_string(),
            customer_name: "Cliente".to_string(),
            customer_phone: None,
            barber_id: Some(barber.to_string()),
            barber_name: None,
            service_name: "Corte".to_string(),
            date: "2026-03-02".to_string(),
            start_time: time.to_string(),
            duration_minutes: 30,
            price_cents: 4500,
            original_price_cents: 4500,
            payment_label: None,
            status,
            tip_cents: 0,
            package_id: None,
            batch_sale_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let all = vec![
            appointment("b1", "10:00", AppointmentStatus::Confirmado),
            appointment("b1", "11:00", AppointmentStatus::Cancelado),
            appointment("b2", "10:00", AppointmentStatus::Confirmado),
        ];

        let booked = BookedInterval::collect(&all, "b1", "2026-03-02");
        assert_eq!(booked.len(), 1);
        assert_eq!(booked[0].start_minutes, 600);
    }
}
