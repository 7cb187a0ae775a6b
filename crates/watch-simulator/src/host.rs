//! Firmware services implemented on the desktop.
//!
//! Every slot of the function table points at one of the `extern "C"`
//! functions below. They share one [`HostState`] behind a mutex; the lock is
//! only held for the duration of a single service call and never while
//! application code runs.
//!
//! Services taking pointers are `unsafe extern "C"`: strings must be null or
//! NUL-terminated, buffers must be valid for the length passed with them,
//! and `os_free` only accepts blocks from `os_malloc`. The SDK wrappers
//! uphold this for well-behaved applications.

use std::alloc::{self, Layout};
use std::cell::Cell;
use std::collections::VecDeque;
use std::ffi::{CStr, CString, c_char, c_int, c_void};
use std::slice;
use std::sync::{Mutex, MutexGuard};

use log::{debug, info, warn};
use watch_sdk::system::WEATHER_ICON_BYTES;
use watch_sdk::{
    BlueState, FileMode, FuncTable, Rotate, Tag, TodayData, Weather, WeatherDay,
};

use crate::clock::SimClock;
use crate::dialog::{Dialog, Submit};
use crate::files::FileStore;
use crate::framebuffer::FrameBuffer;

/// Default update period before the application sets one.
pub const DEFAULT_INTERVAL_MS: u32 = 60_000;

/// Alignment of blocks handed out by `os_malloc`; matches the watch heap.
const HEAP_ALIGN: usize = 8;
/// Bytes in front of every block recording its size.
const HEAP_HEADER: usize = 8;

pub type HttpCallback = extern "C" fn(*mut c_char);

/// A response waiting to be delivered to the application.
#[derive(Debug)]
pub struct HttpReply {
    pub callback: HttpCallback,
    pub body: CString,
}

pub struct HostState {
    pub fb: FrameBuffer,
    pub files: FileStore,
    pub clock: SimClock,
    pub battery: u8,
    pub bluetooth: BlueState,
    pub weather_ok: bool,
    pub interval_ms: u32,
    pub dialog: Option<Dialog>,
    pub http: VecDeque<HttpReply>,
    pub exit_requested: bool,
}

impl HostState {
    pub fn new(files: FileStore, clock: SimClock) -> Self {
        Self {
            fb: FrameBuffer::new(),
            files,
            clock,
            battery: 87,
            bluetooth: BlueState::Connected,
            weather_ok: false,
            interval_ms: DEFAULT_INTERVAL_MS,
            dialog: None,
            http: VecDeque::new(),
            exit_requested: false,
        }
    }

    /// Synthetic forecast derived from the current date.
    pub fn forecast(&self, day: WeatherDay) -> Weather {
        if !self.weather_ok {
            return Weather::default();
        }
        let now = self.clock.now();
        let offset = day as i32;
        let seed = now.day + offset;
        Weather {
            date: ((now.day - 1 + offset) % 28 + 1) as u8,
            day_temp: (18 + seed % 7) as i8,
            night_temp: (seed % 9 - 3) as i8,
            day_icon: (seed % 8) as u16,
            night_icon: (seed % 8 + 8) as u16,
        }
    }

    pub fn today(&self) -> TodayData {
        let now = self.clock.now();
        TodayData {
            moon_icon: (now.day % 8) as u16,
            pressure: 1013,
            humidity: 40 + (now.hour % 20) as u16,
            sunrise: *b"06:12\0",
            sunset: *b"18:45\0",
            lunar: *b"lunar 9-7\0\0\0\0\0\0\0",
        }
    }
}

static STATE: Mutex<Option<HostState>> = Mutex::new(None);

/// Make `state` the firmware state the services operate on.
pub fn install(state: HostState) {
    *lock() = Some(state);
}

fn lock() -> MutexGuard<'static, Option<HostState>> {
    STATE.lock().unwrap_or_else(|e| e.into_inner())
}

/// Run `f` on the installed state. `None` before [`install`].
pub fn with<R>(f: impl FnOnce(&mut HostState) -> R) -> Option<R> {
    let mut guard = lock();
    match guard.as_mut() {
        Some(state) => Some(f(state)),
        None => {
            warn!("host service called before the simulator was set up");
            None
        }
    }
}

/// Borrow a NUL-terminated string from the application.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string.
unsafe fn app_str(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    // SAFETY: per the caller contract.
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

/// Procedural stand-in for the firmware's weather icons.
pub fn weather_icon_bitmap(index: u16) -> [u8; WEATHER_ICON_BYTES] {
    const SIZE: i32 = 32;
    let mut icon = [0u8; WEATHER_ICON_BYTES];
    let radius = 6 + i32::from(index % 8);
    let solid = index % 2 == 1;
    for y in 0..SIZE {
        for x in 0..SIZE {
            let d2 = (x - 15).pow(2) + (y - 15).pow(2);
            let inside = d2 <= radius * radius;
            let ring = inside && d2 >= (radius - 2).pow(2);
            if ring || (solid && inside) {
                let bit = (y * SIZE + x) as usize;
                icon[bit / 8] |= 0x80 >> (bit % 8);
            }
        }
    }
    icon
}

// ---------------------------------------------------------------------------
// Services
// ---------------------------------------------------------------------------

extern "C" fn battery_percent() -> u8 {
    with(|s| s.battery).unwrap_or(0)
}

unsafe extern "C" fn http_request(url: *const c_char, callback: HttpCallback) {
    // SAFETY: the SDK contract makes `url` NUL-terminated.
    let url = unsafe { app_str(url) };
    warn!("no network in the simulator, answering {} with a stub", url);
    let body = CString::new(r#"{"status":"ok","source":"simulator"}"#).unwrap_or_default();
    with(|s| {
        s.weather_ok = true;
        s.http.push_back(HttpReply { callback, body });
    });
}

thread_local! {
    /// Set while an application line is being re-emitted.
    static IN_APP_LOG: Cell<bool> = const { Cell::new(false) };
}

unsafe extern "C" fn app_log(line: *mut c_char) {
    // Without a desktop logger the application's own logger is the process
    // logger, and re-emitting would land right back here.
    if IN_APP_LOG.with(|busy| busy.replace(true)) {
        return;
    }
    // SAFETY: the logger always NUL-terminates.
    let line = unsafe { app_str(line) };
    info!(target: "app", "{}", line);
    IN_APP_LOG.with(|busy| busy.set(false));
}

extern "C" fn app_exit() {
    info!("application requested exit");
    with(|s| s.exit_requested = true);
}

unsafe extern "C" fn mkdir(dir: *const u8) -> u8 {
    // SAFETY: NUL-terminated per contract.
    let dir = unsafe { app_str(dir.cast()) };
    with(|s| s.files.mkdir(&dir)).unwrap_or(crate::files::status::DISK_ERR)
}

unsafe extern "C" fn write_file(name: *const u8, buf: *mut u8, len: u32, ofs: u32, mode: u8) -> u32 {
    if buf.is_null() {
        return 0;
    }
    // SAFETY: NUL-terminated name, `buf` readable for `len` bytes per contract.
    let (name, data) = unsafe { (app_str(name.cast()), slice::from_raw_parts(buf, len as usize)) };
    let mode = FileMode::from_bits_retain(mode);
    with(|s| s.files.write(&name, data, ofs, mode)).unwrap_or(0)
}

unsafe extern "C" fn read_file(name: *const u8, buf: *mut u8, len: u32, ofs: u32) -> u32 {
    if buf.is_null() {
        return 0;
    }
    // SAFETY: NUL-terminated name, `buf` writable for `len` bytes per contract.
    let (name, out) = unsafe { (app_str(name.cast()), slice::from_raw_parts_mut(buf, len as usize)) };
    with(|s| s.files.read(&name, out, ofs)).unwrap_or(0)
}

unsafe extern "C" fn delete_file(name: *const u8) -> u8 {
    // SAFETY: NUL-terminated per contract.
    let name = unsafe { app_str(name.cast()) };
    with(|s| s.files.delete(&name)).unwrap_or(crate::files::status::DISK_ERR)
}

extern "C" fn bluetooth_state() -> BlueState {
    with(|s| s.bluetooth).unwrap_or(BlueState::Disconnected)
}

extern "C" fn weather(day: WeatherDay) -> Weather {
    with(|s| s.forecast(day)).unwrap_or_default()
}

extern "C" fn today() -> TodayData {
    with(|s| s.today()).unwrap_or_default()
}

extern "C" fn is_weather_ok() -> u8 {
    with(|s| u8::from(s.weather_ok)).unwrap_or(0)
}

extern "C" fn clear(color: u16) {
    with(|s| s.fb.clear_to(color));
}

extern "C" fn draw_pixel(x: u16, y: u16, color: u16) {
    with(|s| s.fb.draw_pixel(x, y, color));
}

extern "C" fn draw_line(sx: u16, sy: u16, ex: u16, ey: u16, color: u16) {
    with(|s| s.fb.draw_line((sx, sy), (ex, ey), color));
}

extern "C" fn draw_dashed_line(sx: u16, sy: u16, ex: u16, ey: u16, color: u16) {
    with(|s| s.fb.draw_dashed_line((sx, sy), (ex, ey), color));
}

extern "C" fn draw_rect(sx: u16, sy: u16, ex: u16, ey: u16, color: u16, fill: u8) {
    with(|s| s.fb.draw_rect((sx, sy), (ex, ey), color, fill));
}

extern "C" fn draw_circle(x: c_int, y: c_int, r: c_int, color: c_int, fill: c_int) {
    with(|s| s.fb.draw_circle((x, y), r, color, fill));
}

unsafe extern "C" fn draw_bmp(x: u16, y: u16, w: u16, h: u16, data: *const u8, color: u16, transparent: u8) {
    if data.is_null() {
        return;
    }
    let len = usize::from(w).div_ceil(8) * usize::from(h);
    // SAFETY: the bitmap covers `w`x`h` pixels at one bit each per contract.
    let data = unsafe { slice::from_raw_parts(data, len) };
    with(|s| s.fb.draw_bmp((x, y), (w, h), data, color, transparent != 0));
}

unsafe extern "C" fn draw_str(x: u16, y: u16, text: *const u8, size: u16, color: u16) -> u16 {
    // SAFETY: NUL-terminated per contract.
    let text = unsafe { app_str(text.cast()) };
    with(|s| s.fb.draw_str((x, y), &text, size, color)).unwrap_or(x)
}

unsafe extern "C" fn draw_ch_str(x: u16, y: u16, text: *const u8, color: u16) -> u16 {
    // SAFETY: NUL-terminated per contract.
    let text = unsafe { app_str(text.cast()) };
    with(|s| s.fb.draw_ch_str((x, y), &text, color)).unwrap_or(x)
}

unsafe extern "C" fn draw_rect_str(text: *const u8, sx: u16, sy: u16, ex: u16, ey: u16, color: u16) -> u16 {
    // SAFETY: NUL-terminated per contract.
    let text = unsafe { app_str(text.cast()) };
    with(|s| s.fb.draw_rect_str(&text, (sx, sy), (ex, ey), color)).unwrap_or(sy)
}

macro_rules! rtc_getter {
    ($name:ident, $field:ident) => {
        extern "C" fn $name() -> c_int {
            with(|s| s.clock.now().$field).unwrap_or(0)
        }
    };
}

rtc_getter!(rtc_year, year);
rtc_getter!(rtc_month, month);
rtc_getter!(rtc_day, day);
rtc_getter!(rtc_hour, hour);
rtc_getter!(rtc_minute, minute);
rtc_getter!(rtc_second, second);
rtc_getter!(rtc_weekday, weekday);

extern "C" fn rtc_timestamp() -> c_int {
    with(|s| s.clock.timestamp() as c_int).unwrap_or(0)
}

fn open_dialog(dialog: Dialog) {
    debug!("dialog opened: {:?}", dialog.kind);
    with(|s| {
        if s.dialog.is_some() {
            warn!("dialog replaced before it was answered");
        }
        s.dialog = Some(dialog);
    });
}

unsafe extern "C" fn msg_dialog(title: *const u8, msg: *const u8, submit: Submit) {
    // SAFETY: NUL-terminated per contract.
    let (title, msg) = unsafe { (app_str(title.cast()), app_str(msg.cast())) };
    open_dialog(Dialog::message(title, msg, submit));
}

unsafe extern "C" fn menu_dialog(
    title: *const c_char,
    names: *const *const c_char,
    count: u8,
    submit: Submit,
) {
    // SAFETY: NUL-terminated per contract.
    let title = unsafe { app_str(title) };
    let items = if names.is_null() {
        Vec::new()
    } else {
        (0..usize::from(count))
            // SAFETY: `names` holds `count` NUL-terminated entries.
            .map(|i| unsafe { app_str(*names.add(i)) })
            .collect()
    };
    open_dialog(Dialog::menu(title, items, submit));
}

unsafe extern "C" fn picker_dialog(num: u8, nums: *const u8, count: u8, submit: Submit) {
    let values = if nums.is_null() {
        Vec::new()
    } else {
        // SAFETY: `nums` is readable for `count` bytes.
        unsafe { slice::from_raw_parts(nums, usize::from(count)) }.to_vec()
    };
    open_dialog(Dialog::picker(num, values, submit));
}

extern "C" fn os_malloc(size: u32) -> *mut c_void {
    let Ok(layout) = Layout::from_size_align(size as usize + HEAP_HEADER, HEAP_ALIGN) else {
        return std::ptr::null_mut();
    };
    // SAFETY: the layout is never zero-sized thanks to the header.
    let base = unsafe { alloc::alloc(layout) };
    if base.is_null() {
        return std::ptr::null_mut();
    }
    // SAFETY: the block starts with room for the header.
    unsafe {
        base.cast::<usize>().write(layout.size());
        base.add(HEAP_HEADER).cast()
    }
}

unsafe extern "C" fn os_free(ptr: *mut c_void) {
    if ptr.is_null() {
        return;
    }
    // SAFETY: `ptr` came from `os_malloc`, which put the size in front.
    unsafe {
        let base = ptr.cast::<u8>().sub(HEAP_HEADER);
        let size = base.cast::<usize>().read();
        alloc::dealloc(base, Layout::from_size_align_unchecked(size, HEAP_ALIGN));
    }
}

unsafe extern "C" fn utf_len(text: *const u8) -> u16 {
    // SAFETY: NUL-terminated per contract.
    let text = unsafe { app_str(text.cast()) };
    text.chars().count().min(usize::from(u16::MAX)) as u16
}

extern "C" fn set_rotate(rotate: u8) {
    match Rotate::try_from(rotate) {
        Ok(rotate) => {
            with(|s| s.fb.set_rotate(rotate));
        }
        Err(raw) => warn!("ignoring unknown rotation {}", raw),
    }
}

extern "C" fn set_interval(ms: u32) {
    debug!("update interval {} ms", ms);
    with(|s| s.interval_ms = ms);
}

extern "C" fn get_interval() -> u32 {
    with(|s| s.interval_ms).unwrap_or(DEFAULT_INTERVAL_MS)
}

unsafe extern "C" fn get_weather_icon(index: u16, buffer: *mut u8) {
    if buffer.is_null() {
        return;
    }
    let icon = weather_icon_bitmap(index);
    // SAFETY: the SDK passes a buffer of one full icon.
    unsafe { std::ptr::copy_nonoverlapping(icon.as_ptr(), buffer, icon.len()) };
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// Function table with every service at the ordinal the SDK expects.
/// Reserved slots stay null.
pub fn build_table() -> FuncTable {
    let mut table = FuncTable::new();
    table
        .set(Tag::WatchAppBattpercent, battery_percent as usize as isize)
        .set(Tag::WatchAppHttpReq, http_request as usize as isize)
        .set(Tag::WatchAppLog, app_log as usize as isize)
        .set(Tag::WatchAppExit, app_exit as usize as isize)
        .set(Tag::WatchAppMkdir, mkdir as usize as isize)
        .set(Tag::WatchAppWriteFile, write_file as usize as isize)
        .set(Tag::WatchAppReadFile, read_file as usize as isize)
        .set(Tag::WatchAppDeleteFile, delete_file as usize as isize)
        .set(Tag::WatchAppBluestate, bluetooth_state as usize as isize)
        .set(Tag::WatchAppGetweather, weather as usize as isize)
        .set(Tag::WatchAppGetToday, today as usize as isize)
        .set(Tag::WatchAppIsweatherOk, is_weather_ok as usize as isize)
        .set(Tag::EinkClear, clear as usize as isize)
        .set(Tag::EinkDrawpixel, draw_pixel as usize as isize)
        .set(Tag::EinkDrawline, draw_line as usize as isize)
        .set(Tag::EinkDrawdashedline, draw_dashed_line as usize as isize)
        .set(Tag::EinkDrawrect, draw_rect as usize as isize)
        .set(Tag::EinkDrawcircle, draw_circle as usize as isize)
        .set(Tag::EinkDrawBmp, draw_bmp as usize as isize)
        .set(Tag::EinkDrawstr, draw_str as usize as isize)
        .set(Tag::EinkDrawchstr, draw_ch_str as usize as isize)
        .set(Tag::EinkDrawRectstr, draw_rect_str as usize as isize)
        .set(Tag::RtcGetYear, rtc_year as usize as isize)
        .set(Tag::RtcGetMon, rtc_month as usize as isize)
        .set(Tag::RtcGetDay, rtc_day as usize as isize)
        .set(Tag::RtcGetHour, rtc_hour as usize as isize)
        .set(Tag::RtcGetMin, rtc_minute as usize as isize)
        .set(Tag::RtcGetSec, rtc_second as usize as isize)
        .set(Tag::RtcGetWeek, rtc_weekday as usize as isize)
        .set(Tag::RtcGetTimeStamp, rtc_timestamp as usize as isize)
        .set(Tag::CreateMsgDialog, msg_dialog as usize as isize)
        .set(Tag::CreateMenuDialog, menu_dialog as usize as isize)
        .set(Tag::OsMalloc, os_malloc as usize as isize)
        .set(Tag::OsFree, os_free as usize as isize)
        .set(Tag::UtfLen, utf_len as usize as isize)
        .set(Tag::CreatePickerDialog, picker_dialog as usize as isize)
        .set(Tag::EinkSetRotate, set_rotate as usize as isize)
        .set(Tag::SetInterval, set_interval as usize as isize)
        .set(Tag::GetInterval, get_interval as usize as isize)
        .set(Tag::GetWeatherIcon, get_weather_icon as usize as isize);
    table
}
