//! Type catalog shared with the watch firmware.
//!
//! Everything in here crosses the application/host boundary by value, so
//! every struct and enum is `#[repr(C)]` and must stay layout-compatible with
//! the firmware's own definitions.

use bitflags::bitflags;
use core::ffi::c_int;
use serde::{Deserialize, Serialize};

/// Logical canvas width in pixels.
pub const SCREEN_WIDTH: u16 = 200;
/// Logical canvas height in pixels.
pub const SCREEN_HEIGHT: u16 = 200;

/// Raw color values understood by the display services.
///
/// The panel has a reduced palette; anything other than these three values
/// is forwarded to the host untouched.
pub mod color {
    pub const BLACK: u16 = 0;
    pub const WHITE: u16 = 0xFF;
    pub const GREY: u16 = 0x80;
}

pub use color::{BLACK, GREY, WHITE};

/// Panel technology of the watch.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenType {
    EInk = 0,
    Mono = 1,
}

impl TryFrom<u8> for ScreenType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::EInk),
            1 => Ok(Self::Mono),
            other => Err(other),
        }
    }
}

/// Panel this SDK build targets.
pub const SCREEN_TYPE: ScreenType = ScreenType::EInk;

/// Outline or filled shape for `draw_rect` / `draw_circle`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FillMode {
    #[default]
    Empty = 0,
    Fill = 1,
}

impl TryFrom<u8> for FillMode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Empty),
            1 => Ok(Self::Fill),
            other => Err(other),
        }
    }
}

bitflags! {
    /// Access and disposition flags for `write_file`.
    ///
    /// The values follow the FatFs `FA_*` constants the firmware uses.
    /// `OPEN_EXISTING` is zero, so it is contained in every value.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FileMode: u8 {
        const READ = 0x01;
        const WRITE = 0x02;
        const OPEN_EXISTING = 0x00;
        const CREATE_NEW = 0x04;
        const CREATE_ALWAYS = 0x08;
        const OPEN_ALWAYS = 0x10;
        const OPEN_APPEND = 0x30;
    }
}

/// What the host should do with the screen after a callback returns.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateType {
    /// Full e-ink refresh (slow, clears ghosting).
    Full = 0,
    /// Partial refresh of the changed area.
    Part = 1,
    /// Nothing changed.
    None = 2,
}

impl TryFrom<u8> for UpdateType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Full),
            1 => Ok(Self::Part),
            2 => Ok(Self::None),
            other => Err(other),
        }
    }
}

/// Physical button event delivered to `on_key`.
///
/// Two-name variants are chords: the first button is held while the
/// second is pressed.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ButtonType {
    Null = 0,
    Center = 1,
    Up = 2,
    Down = 3,
    CenterUp = 4,
    UpCenter = 5,
    CenterDown = 6,
    DownCenter = 7,
    UpDown = 8,
    DownUp = 9,
    Back = 10,
}

impl ButtonType {
    pub const ALL: [Self; 11] = [
        Self::Null,
        Self::Center,
        Self::Up,
        Self::Down,
        Self::CenterUp,
        Self::UpCenter,
        Self::CenterDown,
        Self::DownCenter,
        Self::UpDown,
        Self::DownUp,
        Self::Back,
    ];

    /// Map the raw integer the host passes to `onKey`.
    ///
    /// Unknown values become [`ButtonType::Null`] so a newer firmware with
    /// extra buttons cannot hand the application an invalid enum.
    pub fn from_raw(raw: c_int) -> Self {
        usize::try_from(raw)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
            .unwrap_or(Self::Null)
    }
}

/// Display rotation passed to `set_rotate`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rotate {
    #[default]
    Deg0 = 0,
    Deg90 = 1,
    Deg180 = 2,
    Deg270 = 3,
}

impl Rotate {
    /// Next rotation clockwise.
    pub const fn next(self) -> Self {
        match self {
            Self::Deg0 => Self::Deg90,
            Self::Deg90 => Self::Deg180,
            Self::Deg180 => Self::Deg270,
            Self::Deg270 => Self::Deg0,
        }
    }
}

impl TryFrom<u8> for Rotate {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Deg0),
            1 => Ok(Self::Deg90),
            2 => Ok(Self::Deg180),
            3 => Ok(Self::Deg270),
            other => Err(other),
        }
    }
}

/// Phone link state.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlueState {
    Disconnected = 0,
    Connecting = 1,
    Connected = 2,
}

impl BlueState {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Disconnected => "off",
            Self::Connecting => "...",
            Self::Connected => "on",
        }
    }
}

impl TryFrom<u8> for BlueState {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Disconnected),
            1 => Ok(Self::Connecting),
            2 => Ok(Self::Connected),
            other => Err(other),
        }
    }
}

/// Forecast day selector for `weather`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeatherDay {
    Today = 0,
    Tomorrow = 1,
    AfterTomorrow = 2,
}

impl WeatherDay {
    /// Number of forecast days the firmware keeps.
    pub const COUNT: usize = 3;

    pub const ALL: [Self; Self::COUNT] = [Self::Today, Self::Tomorrow, Self::AfterTomorrow];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Today => "Today",
            Self::Tomorrow => "Tmrw",
            Self::AfterTomorrow => "+2d",
        }
    }
}

impl TryFrom<u8> for WeatherDay {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL.get(value as usize).copied().ok_or(value)
    }
}

/// Snapshot of today's almanac data.
///
/// The byte arrays hold NUL-padded text as formatted by the firmware
/// (for example `b"06:12\0"`).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TodayData {
    pub moon_icon: u16,
    /// Barometric pressure in hPa.
    pub pressure: u16,
    /// Relative humidity in percent.
    pub humidity: u16,
    pub sunrise: [u8; 6],
    pub sunset: [u8; 6],
    /// Lunar calendar date, UTF-8, NUL padded.
    pub lunar: [u8; 16],
}

impl TodayData {
    pub fn sunrise_str(&self) -> &str {
        text_field(&self.sunrise)
    }

    pub fn sunset_str(&self) -> &str {
        text_field(&self.sunset)
    }

    /// Lunar date bytes up to the first NUL, left undecoded.
    pub fn lunar_bytes(&self) -> &[u8] {
        until_nul(&self.lunar)
    }
}

/// Forecast entry for one day.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Weather {
    /// Day of month.
    pub date: u8,
    /// Daytime temperature in °C.
    pub day_temp: i8,
    /// Night temperature in °C.
    pub night_temp: i8,
    pub day_icon: u16,
    pub night_icon: u16,
}

fn until_nul(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    &bytes[..end]
}

/// Decode a NUL-padded field, yielding the longest valid UTF-8 prefix.
fn text_field(bytes: &[u8]) -> &str {
    let bytes = until_nul(bytes);
    match core::str::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => core::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or_default(),
    }
}
