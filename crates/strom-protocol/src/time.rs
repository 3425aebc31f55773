//! Tick conversions.
//!
//! Event timestamps are measured in ticks: 100-nanosecond units since the
//! Unix epoch.

use std::time::{SystemTime, UNIX_EPOCH};

pub const TICKS_PER_SECOND: i64 = 10_000_000;
pub const TICKS_PER_MILLISECOND: i64 = 10_000;

/// Convert whole Unix seconds to ticks.
pub fn unix_time_to_ticks(seconds: i64) -> i64 {
    seconds * TICKS_PER_SECOND
}

/// Convert ticks to whole Unix seconds (truncating).
pub fn ticks_to_unix_time(ticks: i64) -> i64 {
    ticks / TICKS_PER_SECOND
}

/// Convert Unix milliseconds to ticks.
pub fn millis_to_ticks(millis: i64) -> i64 {
    millis * TICKS_PER_MILLISECOND
}

/// Convert ticks to Unix milliseconds (truncating).
pub fn ticks_to_millis(ticks: i64) -> i64 {
    ticks / TICKS_PER_MILLISECOND
}

/// Current wall-clock time in ticks.
pub fn now_ticks() -> i64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_nanos() as i64 / 100,
        // Clock before the epoch; clamp rather than panic.
        Err(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds_roundtrip() {
        assert_eq!(unix_time_to_ticks(123_456_789), 1_234_567_890_000_000);
        assert_eq!(ticks_to_unix_time(unix_time_to_ticks(123_456_789)), 123_456_789);
    }

    #[test]
    fn millis_roundtrip() {
        assert_eq!(millis_to_ticks(1_500), 15_000_000);
        assert_eq!(ticks_to_millis(millis_to_ticks(1_500)), 1_500);
    }

    #[test]
    fn now_is_positive() {
        assert!(now_ticks() > 0);
    }
}
