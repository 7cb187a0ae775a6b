//! Real-time clock.
//!
//! The firmware exposes one getter per field, each its own table slot.

use core::ffi::c_int;

host_fns! {
    pub fn year() -> c_int => RtcGetYear;
    /// Month, 1-12.
    pub fn month() -> c_int => RtcGetMon;
    /// Day of month, 1-31.
    pub fn day() -> c_int => RtcGetDay;
    pub fn hour() -> c_int => RtcGetHour;
    pub fn minute() -> c_int => RtcGetMin;
    pub fn second() -> c_int => RtcGetSec;
    /// Day of week as counted by the firmware.
    pub fn weekday() -> c_int => RtcGetWeek;
    /// Seconds since the Unix epoch.
    pub fn timestamp() -> c_int => RtcGetTimeStamp;
}

/// All clock fields read one after another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateTime {
    pub year: c_int,
    pub month: c_int,
    pub day: c_int,
    pub hour: c_int,
    pub minute: c_int,
    pub second: c_int,
    pub weekday: c_int,
}

impl DateTime {
    /// Minutes since midnight, handy for deciding when to redraw.
    pub const fn minute_of_day(&self) -> c_int {
        self.hour * 60 + self.minute
    }
}

/// Read every field through its own getter.
///
/// The fields are not sampled atomically: a rollover between two calls can
/// produce a mixed reading, as with the firmware's own C API.
pub fn now() -> DateTime {
    DateTime {
        year: year(),
        month: month(),
        day: day(),
        hour: hour(),
        minute: minute(),
        second: second(),
        weekday: weekday(),
    }
}
