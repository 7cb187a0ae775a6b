//! Text formatting for the watch face.
//!
//! Everything renders into fixed `heapless` strings so the face never needs
//! the host heap.

use core::fmt::Write;

use heapless::String;
use watch_sdk::{BlueState, Weather, WeatherDay};

/// Short label that fits one line of the face.
pub type Label = String<24>;

/// Weekday names, index 0 is Sunday as reported by the RTC.
pub const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// `HH:MM`
pub fn clock(hour: i32, minute: i32) -> Label {
    let mut s = Label::new();
    let _ = write!(s, "{:02}:{:02}", hour, minute);
    s
}

/// `:SS`, drawn next to the clock when the face ticks every second.
pub fn seconds(second: i32) -> Label {
    let mut s = Label::new();
    let _ = write!(s, ":{:02}", second);
    s
}

/// `Sat 2026-10-17`
pub fn date(year: i32, month: i32, day: i32, weekday: i32) -> Label {
    let name = usize::try_from(weekday)
        .ok()
        .and_then(|idx| WEEKDAYS.get(idx))
        .copied()
        .unwrap_or("---");
    let mut s = Label::new();
    let _ = write!(s, "{} {:04}-{:02}-{:02}", name, year, month, day);
    s
}

/// `87%`
pub fn percent(value: u8) -> Label {
    let mut s = Label::new();
    let _ = write!(s, "{}%", value.min(100));
    s
}

/// `BT on` / `BT off` / `BT ...`
pub fn bluetooth(state: BlueState) -> Label {
    let mut s = Label::new();
    let _ = write!(s, "BT {}", state.label());
    s
}

/// `Tmrw 21/-3C`
pub fn forecast(day: WeatherDay, weather: &Weather) -> Label {
    let mut s = Label::new();
    let _ = write!(
        s,
        "{} {}/{}C",
        day.label(),
        weather.day_temp,
        weather.night_temp
    );
    s
}

/// `1013hPa 47%`
pub fn air(pressure: u16, humidity: u16) -> Label {
    let mut s = Label::new();
    let _ = write!(s, "{}hPa {}%", pressure, humidity);
    s
}

/// `every 30s`, `every 2m`
pub fn interval(secs: u8) -> Label {
    let mut s = Label::new();
    if secs >= 60 && secs % 60 == 0 {
        let _ = write!(s, "every {}m", secs / 60);
    } else {
        let _ = write!(s, "every {}s", secs);
    }
    s
}

/// `512 bytes`
pub fn byte_count(len: usize) -> Label {
    let mut s = Label::new();
    let _ = write!(s, "{} bytes", len);
    s
}

/// Width in pixels of the battery gauge fill for `percent`.
pub fn gauge_fill(percent: u8, width: u16) -> u16 {
    (u32::from(percent.min(100)) * u32::from(width) / 100) as u16
}

/// Left edge that centers a run of `width` pixels on the canvas.
pub fn centered(width: u16) -> u16 {
    watch_sdk::SCREEN_WIDTH.saturating_sub(width) / 2
}
