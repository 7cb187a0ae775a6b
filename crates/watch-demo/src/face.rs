//! The watch face: state, refresh policy and rendering.

use embedded_graphics::pixelcolor::Gray8;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use heapless::Vec;
use log::{LevelFilter, debug, info, warn};
use watch_sdk::display::{self, HostDisplay};
use watch_sdk::rtc::{self, DateTime};
use watch_sdk::system::{self, WEATHER_ICON_SIZE};
use watch_sdk::{
    BLACK, BlueState, ButtonType, FillMode, GREY, SCREEN_HEIGHT, SCREEN_WIDTH, UpdateType,
    WHITE, WatchApp, WeatherDay, logger, mem,
};

use crate::format;
use crate::menu;
use crate::prefs::{Page, Prefs};

/// Height of the status bar across the top.
const STATUS_BAR_H: u16 = 20;
/// Partial refreshes between two full refreshes, to clear e-ink ghosting.
const FULL_REFRESH_EVERY: u16 = 30;
/// Glyph width of the CJK font.
const CH_GLYPH_W: u16 = 16;
/// Battery gauge outline.
const GAUGE: Rectangle = Rectangle::new(Point::new(160, 4), Size::new(28, 12));

/// Progress of the last weather sync request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Pending,
    /// Response received with this many body bytes.
    Done(usize),
}

pub struct WatchFace {
    pub(crate) prefs: Prefs,
    pub(crate) sync: SyncState,
    now: DateTime,
    battery: u8,
    bluetooth: BlueState,
    partials: u16,
    /// Set by dialog and network callbacks; picked up by the next `update`.
    dirty: bool,
}

impl WatchFace {
    /// Push rotation and update period to the host.
    pub(crate) fn apply_prefs(&self) {
        display::set_rotate(self.prefs.rotate);
        system::set_update_interval(self.prefs.interval_ms());
        debug!("applied {:?}", self.prefs);
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    fn sample(&mut self) {
        self.now = rtc::now();
        self.battery = system::battery_percent();
        self.bluetooth = system::bluetooth_state();
    }

    /// Refresh kind for a partial change, promoted to a full refresh every
    /// so often.
    fn refresh(&mut self) -> UpdateType {
        self.partials += 1;
        if self.partials >= FULL_REFRESH_EVERY {
            self.partials = 0;
            UpdateType::Full
        } else {
            UpdateType::Part
        }
    }

    fn show_page(&mut self, page: Page) -> UpdateType {
        // Persisted on exit with the rest of the preferences.
        self.prefs.page = page;
        UpdateType::Full
    }

    // -----------------------------------------------------------------------
    // Rendering
    // -----------------------------------------------------------------------

    fn draw_status_bar(&self) {
        label(4, 2, &format::bluetooth(self.bluetooth), 16);
        label(118, 2, &format::percent(self.battery), 16);

        let mut target = HostDisplay::new();
        let _ = GAUGE
            .into_styled(PrimitiveStyle::with_stroke(Gray8::BLACK, 1))
            .draw(&mut target);
        let inner = GAUGE.offset(-2);
        let fill = format::gauge_fill(self.battery, inner.size.width as u16);
        if fill > 0 {
            display::rect(
                Rectangle::new(inner.top_left, Size::new(u32::from(fill), inner.size.height)),
                BLACK,
                FillMode::Fill,
            );
        }
        // Battery terminal.
        display::draw_rect(188, 7, 190, 12, BLACK, FillMode::Fill as u8);

        display::draw_dashed_line(0, STATUS_BAR_H + 2, SCREEN_WIDTH - 1, STATUS_BAR_H + 2, BLACK);
    }

    fn draw_time_page(&self) {
        let now = &self.now;
        let end = label(20, 40, &format::clock(now.hour, now.minute), 48);
        if self.prefs.ticks_seconds() {
            label(end, 60, &format::seconds(now.second), 24);
        }
        label(
            30,
            100,
            &format::date(now.year, now.month, now.day, now.weekday),
            16,
        );

        let today = system::today();
        draw_lunar(today.lunar_bytes(), 124);

        display::draw_line(20, 150, SCREEN_WIDTH - 21, 150, GREY);
        label(20, 160, today.sunrise_str(), 16);
        label(130, 160, today.sunset_str(), 16);
    }

    fn draw_weather_page(&self) {
        if !system::weather_ready() {
            let area = Rectangle::new(Point::new(10, 40), Size::new(180, 100));
            if let Err(e) = display::text_in(area, "No forecast yet. Press center and pick Sync.", BLACK) {
                warn!("weather hint not drawn: {}", e);
            }
            return;
        }

        for (row, day) in WeatherDay::ALL.into_iter().enumerate() {
            let y = 32 + row as u16 * 56;
            let weather = system::weather(day);
            // SAFETY: the firmware writes one 32x32 1 bpp icon.
            let icon = unsafe { system::weather_icon_bitmap(weather.day_icon) };
            // SAFETY: `icon` holds a full WEATHER_ICON_SIZE square bitmap.
            unsafe {
                display::draw_bmp(
                    8,
                    y,
                    WEATHER_ICON_SIZE,
                    WEATHER_ICON_SIZE,
                    icon.as_ptr(),
                    BLACK,
                    1,
                )
            };
            label(48, y + 8, &format::forecast(day, &weather), 16);
            if row + 1 < WeatherDay::COUNT {
                display::draw_dashed_line(8, y + 46, SCREEN_WIDTH - 9, y + 46, GREY);
            }
        }
    }

    fn draw_status_page(&self) {
        let today = system::today();

        // Moon phase: outline, filled once past half.
        let filled = if today.moon_icon >= 4 {
            FillMode::Fill
        } else {
            FillMode::Empty
        };
        display::draw_circle(40, 70, 24, i32::from(BLACK), filled as i32);

        label(80, 50, &format::air(today.pressure, today.humidity), 16);
        label(80, 74, &format::interval(self.prefs.interval_secs), 16);

        let sync = match self.sync {
            SyncState::Idle => "sync: idle",
            SyncState::Pending => "sync: waiting",
            SyncState::Done(_) => "sync: done",
        };
        label(20, 120, sync, 16);
        if let SyncState::Done(len) = self.sync {
            label(20, 144, &format::byte_count(len), 16);
        }

        let mut target = HostDisplay::new();
        let frame = Rectangle::new(
            Point::new(0, i32::from(STATUS_BAR_H) + 4),
            Size::new(
                u32::from(SCREEN_WIDTH),
                u32::from(SCREEN_HEIGHT - STATUS_BAR_H - 4),
            ),
        );
        let _ = frame
            .into_styled(PrimitiveStyle::with_stroke(Gray8::new(GREY as u8), 1))
            .draw(&mut target);
    }
}

/// Draw `text` in black, logging instead of failing. Returns the x past it.
fn label(x: u16, y: u16, text: &str, size: u16) -> u16 {
    display::text(x, y, text, size, BLACK).unwrap_or_else(|e| {
        warn!("label {:?} not drawn: {}", text, e);
        x
    })
}

/// Draw the lunar date centered with the CJK font.
fn draw_lunar(bytes: &[u8], y: u16) {
    let Ok(text) = core::str::from_utf8(bytes) else {
        warn!("lunar date is not UTF-8");
        return;
    };
    if text.is_empty() {
        return;
    }

    let mut c_text: Vec<u8, 17> = Vec::new();
    if c_text.extend_from_slice(bytes).is_err() || c_text.push(0).is_err() {
        return;
    }
    // SAFETY: `c_text` is NUL-terminated.
    let chars = unsafe { mem::utf_len(c_text.as_ptr()) };
    let x = format::centered(chars.saturating_mul(CH_GLYPH_W));
    if let Err(e) = display::text_ch(x, y, text, BLACK) {
        warn!("lunar date not drawn: {}", e);
    }
}

impl WatchApp for WatchFace {
    fn init() -> Self {
        logger::init(LevelFilter::Info);

        let prefs = Prefs::load();
        info!("watch face starting on {:?}", prefs.page);

        let mut face = Self {
            prefs,
            sync: SyncState::Idle,
            now: DateTime::default(),
            battery: 0,
            bluetooth: BlueState::Disconnected,
            partials: 0,
            dirty: false,
        };
        face.sample();
        face.apply_prefs();
        face
    }

    fn draw(&mut self) {
        display::clear(WHITE);
        self.draw_status_bar();
        match self.prefs.page {
            Page::Time => self.draw_time_page(),
            Page::Weather => self.draw_weather_page(),
            Page::Status => self.draw_status_page(),
        }
    }

    fn update(&mut self, _delta: i32) -> UpdateType {
        let before = self.now;
        let battery = self.battery;
        let bluetooth = self.bluetooth;
        self.sample();

        if self.now.day != before.day {
            self.partials = 0;
            return UpdateType::Full;
        }

        let ticked = self.now.minute_of_day() != before.minute_of_day()
            || (self.prefs.ticks_seconds() && self.now.second != before.second);
        let status = battery != self.battery || bluetooth != self.bluetooth;

        if core::mem::take(&mut self.dirty) || ticked || status {
            self.refresh()
        } else {
            UpdateType::None
        }
    }

    fn on_key(&mut self, key: ButtonType) -> UpdateType {
        match key {
            ButtonType::Up => self.show_page(self.prefs.page.prev()),
            ButtonType::Down => self.show_page(self.prefs.page.next()),
            ButtonType::Center => {
                menu::open();
                UpdateType::None
            }
            ButtonType::CenterUp => {
                menu::rotate(self);
                UpdateType::Full
            }
            ButtonType::Back => {
                menu::confirm_exit();
                UpdateType::None
            }
            _ => UpdateType::None,
        }
    }
}
