//! Simulated real-time clock.
//!
//! Starts at the host's wall-clock time and advances only when the
//! simulator says so, so headless runs are reproducible tick by tick.

use jiff::Timestamp;
use jiff::tz::TimeZone;
use watch_sdk::rtc::DateTime;

/// Broken-down UTC time for a Unix timestamp. Timestamps outside the range
/// jiff supports are clamped to its ends.
pub fn civil(timestamp: i64) -> DateTime {
    let ts = Timestamp::from_second(timestamp).unwrap_or(if timestamp < 0 {
        Timestamp::MIN
    } else {
        Timestamp::MAX
    });
    let utc = ts.to_zoned(TimeZone::UTC);

    DateTime {
        year: utc.year().into(),
        month: utc.month().into(),
        day: utc.day().into(),
        hour: utc.hour().into(),
        minute: utc.minute().into(),
        second: utc.second().into(),
        weekday: utc.weekday().to_sunday_zero_offset().into(),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SimClock {
    start: i64,
    elapsed_ms: u64,
}

impl SimClock {
    /// Clock starting at the host's current time.
    pub fn from_system() -> Self {
        Self::starting_at(Timestamp::now().as_second())
    }

    pub fn starting_at(timestamp: i64) -> Self {
        Self {
            start: timestamp,
            elapsed_ms: 0,
        }
    }

    pub fn advance_ms(&mut self, ms: u64) {
        self.elapsed_ms = self.elapsed_ms.saturating_add(ms);
    }

    pub fn timestamp(&self) -> i64 {
        self.start + (self.elapsed_ms / 1000) as i64
    }

    pub fn now(&self) -> DateTime {
        civil(self.timestamp())
    }
}
