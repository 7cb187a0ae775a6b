//! Watch state, weather, networking and app lifecycle services.

use core::ffi::c_char;

use crate::types::{BlueState, TodayData, Weather, WeatherDay};

host_fns! {
    /// Battery charge in percent.
    pub fn battery_percent() -> u8 => WatchAppBattpercent;

    /// Fetch `url` over the phone link. `req_callback` receives the response
    /// body (NUL-terminated) later, from the host's event loop.
    ///
    /// # Safety
    ///
    /// `url` must be NUL-terminated and stay valid until the callback runs.
    pub unsafe fn http_request(url: *const c_char, req_callback: extern "C" fn(*mut c_char)) => WatchAppHttpReq;

    /// Append a line to the firmware log.
    ///
    /// # Safety
    ///
    /// `log` must be NUL-terminated.
    pub unsafe fn log(log: *mut c_char) => WatchAppLog;

    /// Ask the firmware to close the application after the current callback.
    pub fn exit() => WatchAppExit;

    pub fn bluetooth_state() -> BlueState => WatchAppBluestate;

    /// Forecast for `day`. Zeroed when no forecast is cached.
    pub fn weather(day: WeatherDay) -> Weather => WatchAppGetweather;

    pub fn today() -> TodayData => WatchAppGetToday;

    /// Non-zero once the firmware holds a current forecast.
    pub fn is_weather_ok() -> u8 => WatchAppIsweatherOk;

    /// Copy the bitmap of weather icon `iconidx` into `buffer`.
    ///
    /// # Safety
    ///
    /// `buffer` must be writable for the icon's size.
    pub unsafe fn weather_icon(iconidx: u16, buffer: *mut u8) => GetWeatherIcon;

    /// Period between `update` callbacks, in milliseconds.
    pub fn set_update_interval(interval: u32) => SetInterval;

    pub fn update_interval() -> u32 => GetInterval;
}

/// Weather icons are 32x32 pixels at one bit per pixel.
pub const WEATHER_ICON_SIZE: u16 = 32;
/// Byte size of one weather icon bitmap.
pub const WEATHER_ICON_BYTES: usize = (WEATHER_ICON_SIZE as usize * WEATHER_ICON_SIZE as usize) / 8;

/// Fetch weather icon `index` into a fresh buffer.
///
/// # Safety
///
/// The firmware does not take a buffer length. The installed host must
/// write at most [`WEATHER_ICON_BYTES`], i.e. one 32x32 icon at 1 bpp.
pub unsafe fn weather_icon_bitmap(index: u16) -> [u8; WEATHER_ICON_BYTES] {
    let mut buf = [0u8; WEATHER_ICON_BYTES];
    // SAFETY: `buf` holds one icon; the caller vouches for the host.
    unsafe { weather_icon(index, buf.as_mut_ptr()) };
    buf
}

/// Whether the firmware has a usable forecast.
pub fn weather_ready() -> bool {
    is_weather_ok() != 0
}
