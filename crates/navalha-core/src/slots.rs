//! # Slot Arithmetic
//!
//! Time-of-day conversion and the single interval-overlap predicate every
//! conflict check in the system goes through.
//!
//! Times are `HH:MM` strings at the edges (that is what the store and the
//! frontend speak) and minutes-since-midnight integers internally.

/// Converts an `HH:MM` string to minutes since midnight.
///
/// Malformed input yields 0, mirroring the forgiving behavior the booking
/// flow has always had - a bad time never aborts slot enumeration, it just
/// collapses to midnight and gets filtered by the hour windows.
///
/// ## Example
/// ```rust
/// use navalha_core::slots::time_to_minutes;
///
/// assert_eq!(time_to_minutes("09:30"), 570);
/// assert_eq!(time_to_minutes("00:00"), 0);
/// assert_eq!(time_to_minutes("garbage"), 0);
/// ```
pub fn time_to_minutes(time: &str) -> u32 {
    let mut parts = time.splitn(2, ':');
    let hours = parts.next().and_then(|p| p.trim().parse::<u32>().ok());
    let minutes = parts.next().and_then(|p| p.trim().parse::<u32>().ok());
    match (hours, minutes) {
        (Some(h), Some(m)) if h < 24 && m < 60 => h * 60 + m,
        _ => 0,
    }
}

/// Converts minutes since midnight back to an `HH:MM` string.
pub fn minutes_to_time(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// The sole conflict predicate: do `[start_a, start_a+dur_a)` and
/// `[start_b, start_b+dur_b)` intersect?
///
/// Strict inequalities: adjacent intervals (one ending exactly where the
/// other starts) do not overlap, and a zero-duration interval overlaps
/// nothing.
pub fn intervals_overlap(start_a: u32, dur_a: u32, start_b: u32, dur_b: u32) -> bool {
    start_a < start_b + dur_b && start_b < start_a + dur_a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_to_minutes() {
        assert_eq!(time_to_minutes("00:00"), 0);
        assert_eq!(time_to_minutes("09:15"), 555);
        assert_eq!(time_to_minutes("23:59"), 1439);
    }

    #[test]
    fn test_time_to_minutes_malformed() {
        assert_eq!(time_to_minutes(""), 0);
        assert_eq!(time_to_minutes("9h30"), 0);
        assert_eq!(time_to_minutes("25:00"), 0);
        assert_eq!(time_to_minutes("10:99"), 0);
    }

    #[test]
    fn test_minutes_to_time_round_trip() {
        for t in ["00:00", "09:15", "12:00", "23:45"] {
            assert_eq!(minutes_to_time(time_to_minutes(t)), t);
        }
    }

    #[test]
    fn test_overlap_basic() {
        // [600,630) vs [615,645) overlap
        assert!(intervals_overlap(600, 30, 615, 30));
        // identical intervals overlap
        assert!(intervals_overlap(600, 30, 600, 30));
        // disjoint intervals do not
        assert!(!intervals_overlap(600, 30, 700, 30));
    }

    #[test]
    fn test_adjacent_intervals_do_not_overlap() {
        // [600,630) then [630,660): back-to-back bookings are fine
        assert!(!intervals_overlap(600, 30, 630, 30));
        assert!(!intervals_overlap(630, 30, 600, 30));
    }

    #[test]
    fn test_zero_duration_overlaps_nothing() {
        assert!(!intervals_overlap(600, 0, 600, 30));
        assert!(!intervals_overlap(600, 30, 615, 0));
        assert!(!intervals_overlap(600, 0, 600, 0));
    }
}
