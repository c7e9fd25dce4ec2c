//! Current-time source and day-boundary helpers.

use chrono::{DateTime, FixedOffset, NaiveTime, Offset, TimeZone, Utc};

/// Source of the current instant.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Largest accepted UTC offset magnitude, in minutes.
pub const MAX_UTC_OFFSET_MINUTES: i32 = 24 * 60 - 1;

/// Converts minutes east of UTC into a chrono offset.
///
/// Out-of-range values fall back to UTC; account validation rejects them
/// before they are persisted.
pub fn fixed_offset(utc_offset_minutes: i32) -> FixedOffset {
    utc_offset_minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix())
}

/// Returns local midnight of the day containing `now`, as epoch milliseconds.
pub fn start_of_day_millis(now: DateTime<Utc>, utc_offset_minutes: i32) -> i64 {
    let offset = fixed_offset(utc_offset_minutes);
    let local_midnight = now
        .with_timezone(&offset)
        .date_naive()
        .and_time(NaiveTime::default());
    Utc.from_utc_datetime(&local_midnight).timestamp_millis()
        - i64::from(offset.local_minus_utc()) * 1000
}
