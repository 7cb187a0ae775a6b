//! Dispatch tests against a fake firmware.
//!
//! Every host slot is filled with an instrumented `extern "C"` stub that
//! records the ordinal it was reached through and the arguments it got, and
//! returns a recognisable value. The tests then call the SDK wrappers and
//! check that each one lands on its own slot with its arguments untouched.

use std::collections::HashMap;
use std::ffi::{CStr, c_char, c_int, c_void};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock};

use embedded_graphics::pixelcolor::Gray8;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};

use watch_sdk::dialog::{self, MenuItem};
use watch_sdk::heap::HostAllocator;
use watch_sdk::{
    BlueState, ButtonType, FileMode, FsError, FuncTable, Rotate, Tag, TextError, TodayData,
    UpdateType, WatchApp, Weather, WeatherDay, display, fs, mem, rtc, settings, startup, system,
};

// ---------------------------------------------------------------------------
// Call log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
struct Call {
    tag: Tag,
    args: Vec<i64>,
    text: Option<String>,
}

static CALLS: Mutex<Vec<Call>> = Mutex::new(Vec::new());

fn record(tag: Tag, args: &[i64]) {
    record_text(tag, args, None);
}

fn record_text(tag: Tag, args: &[i64], text: Option<String>) {
    CALLS.lock().unwrap_or_else(|e| e.into_inner()).push(Call {
        tag,
        args: args.to_vec(),
        text,
    });
}

fn take_calls() -> Vec<Call> {
    core::mem::take(&mut *CALLS.lock().unwrap_or_else(|e| e.into_inner()))
}

fn call(tag: Tag, args: &[i64]) -> Call {
    Call {
        tag,
        args: args.to_vec(),
        text: None,
    }
}

fn addr<T>(ptr: *const T) -> i64 {
    ptr as usize as i64
}

unsafe fn c_text(ptr: *const c_char) -> String {
    // SAFETY: stubs are only called with NUL-terminated strings.
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

// ---------------------------------------------------------------------------
// Fake firmware state
// ---------------------------------------------------------------------------

static BLUE_STATE: AtomicU8 = AtomicU8::new(0);
static BATTERY: AtomicU8 = AtomicU8::new(87);
static FILES: Mutex<Option<HashMap<String, Vec<u8>>>> = Mutex::new(None);
static MKDIR_STATUS: AtomicU8 = AtomicU8::new(0);

fn files() -> MutexGuard<'static, Option<HashMap<String, Vec<u8>>>> {
    FILES.lock().unwrap_or_else(|e| e.into_inner())
}

// ---------------------------------------------------------------------------
// Stubs
// ---------------------------------------------------------------------------

extern "C" fn battpercent() -> u8 {
    record(Tag::WatchAppBattpercent, &[]);
    BATTERY.load(Ordering::Relaxed)
}

extern "C" fn battpercent_alt() -> u8 {
    record(Tag::WatchAppBattpercent, &[1]);
    13
}

extern "C" fn http_req(url: *const c_char, cb: extern "C" fn(*mut c_char)) {
    // SAFETY: NUL-terminated per contract.
    record_text(Tag::WatchAppHttpReq, &[], Some(unsafe { c_text(url) }));
    let mut body = *b"{\"ok\":1}\0";
    cb(body.as_mut_ptr().cast());
}

extern "C" fn app_log(msg: *mut c_char) {
    // SAFETY: NUL-terminated per contract.
    record_text(Tag::WatchAppLog, &[], Some(unsafe { c_text(msg) }));
}

extern "C" fn app_exit() {
    record(Tag::WatchAppExit, &[]);
}

extern "C" fn app_mkdir(dir: *const u8) -> u8 {
    // SAFETY: NUL-terminated per contract.
    record_text(Tag::WatchAppMkdir, &[], Some(unsafe { c_text(dir.cast()) }));
    MKDIR_STATUS.load(Ordering::Relaxed)
}

extern "C" fn write_file(name: *const u8, buf: *mut u8, len: u32, ofs: u32, mode: u8) -> u32 {
    // SAFETY: NUL-terminated per contract.
    let name = unsafe { c_text(name.cast()) };
    record_text(
        Tag::WatchAppWriteFile,
        &[len as i64, ofs as i64, mode as i64],
        Some(name.clone()),
    );
    // SAFETY: readable for `len` bytes per contract.
    let data = unsafe { std::slice::from_raw_parts(buf, len as usize) };
    let mut files = files();
    let file = files.get_or_insert_with(HashMap::new).entry(name).or_default();
    if mode & FileMode::CREATE_ALWAYS.bits() != 0 {
        file.clear();
    }
    let end = ofs as usize + data.len();
    if file.len() < end {
        file.resize(end, 0);
    }
    file[ofs as usize..end].copy_from_slice(data);
    // Pretend the flash is full past 1000 bytes.
    len.min(1000)
}

extern "C" fn read_file(name: *const u8, buf: *mut u8, len: u32, ofs: u32) -> u32 {
    // SAFETY: NUL-terminated per contract.
    let name = unsafe { c_text(name.cast()) };
    record_text(Tag::WatchAppReadFile, &[len as i64, ofs as i64], Some(name.clone()));
    let files = files();
    let Some(file) = files.as_ref().and_then(|f| f.get(&name)) else {
        return 0;
    };
    let start = (ofs as usize).min(file.len());
    let n = (file.len() - start).min(len as usize);
    // SAFETY: writable for `len` bytes per contract.
    unsafe { std::ptr::copy_nonoverlapping(file[start..].as_ptr(), buf, n) };
    n as u32
}

extern "C" fn delete_file(name: *const u8) -> u8 {
    // SAFETY: NUL-terminated per contract.
    let name = unsafe { c_text(name.cast()) };
    record_text(Tag::WatchAppDeleteFile, &[], Some(name.clone()));
    match files().get_or_insert_with(HashMap::new).remove(&name) {
        Some(_) => 0,
        None => 4,
    }
}

extern "C" fn bluestate() -> BlueState {
    record(Tag::WatchAppBluestate, &[]);
    BlueState::try_from(BLUE_STATE.load(Ordering::Relaxed)).unwrap_or(BlueState::Disconnected)
}

extern "C" fn getweather(day: WeatherDay) -> Weather {
    record(Tag::WatchAppGetweather, &[day as i64]);
    Weather {
        date: 17 + day as u8,
        day_temp: 21,
        night_temp: -3,
        day_icon: 100 + day as u16,
        night_icon: 200 + day as u16,
    }
}

extern "C" fn get_today() -> TodayData {
    record(Tag::WatchAppGetToday, &[]);
    TodayData {
        moon_icon: 5,
        pressure: 1013,
        humidity: 47,
        sunrise: *b"06:12\0",
        sunset: *b"18:45\0",
        lunar: [0; 16],
    }
}

extern "C" fn isweather_ok() -> u8 {
    record(Tag::WatchAppIsweatherOk, &[]);
    1
}

extern "C" fn eink_clear(color: u16) {
    record(Tag::EinkClear, &[color as i64]);
}

extern "C" fn drawpixel(x: u16, y: u16, color: u16) {
    record(Tag::EinkDrawpixel, &[x as i64, y as i64, color as i64]);
}

extern "C" fn drawline(sx: u16, sy: u16, ex: u16, ey: u16, color: u16) {
    record(Tag::EinkDrawline, &[sx as i64, sy as i64, ex as i64, ey as i64, color as i64]);
}

extern "C" fn drawdashedline(sx: u16, sy: u16, ex: u16, ey: u16, color: u16) {
    record(
        Tag::EinkDrawdashedline,
        &[sx as i64, sy as i64, ex as i64, ey as i64, color as i64],
    );
}

extern "C" fn drawrect(sx: u16, sy: u16, ex: u16, ey: u16, color: u16, fill: u8) {
    record(
        Tag::EinkDrawrect,
        &[sx as i64, sy as i64, ex as i64, ey as i64, color as i64, fill as i64],
    );
}

extern "C" fn drawcircle(x: c_int, y: c_int, r: c_int, color: c_int, fill: c_int) {
    record(
        Tag::EinkDrawcircle,
        &[x as i64, y as i64, r as i64, color as i64, fill as i64],
    );
}

extern "C" fn draw_bmp(x: u16, y: u16, w: u16, h: u16, data: *const u8, color: u16, tr: u8) {
    record(
        Tag::EinkDrawBmp,
        &[x as i64, y as i64, w as i64, h as i64, addr(data), color as i64, tr as i64],
    );
}

extern "C" fn drawstr(x: u16, y: u16, chr: *const u8, size: u16, color: u16) -> u16 {
    // SAFETY: NUL-terminated per contract.
    let text = unsafe { c_text(chr.cast()) };
    let width = text.len() as u16 * size / 2;
    record_text(
        Tag::EinkDrawstr,
        &[x as i64, y as i64, size as i64, color as i64],
        Some(text),
    );
    x + width
}

extern "C" fn drawchstr(x: u16, y: u16, chr: *const u8, color: u16) -> u16 {
    // SAFETY: NUL-terminated per contract.
    let text = unsafe { c_text(chr.cast()) };
    record_text(Tag::EinkDrawchstr, &[x as i64, y as i64, color as i64], Some(text));
    x + 16
}

extern "C" fn draw_rectstr(chr: *const u8, sx: u16, sy: u16, ex: u16, ey: u16, color: u16) -> u16 {
    // SAFETY: NUL-terminated per contract.
    let text = unsafe { c_text(chr.cast()) };
    record_text(
        Tag::EinkDrawRectstr,
        &[sx as i64, sy as i64, ex as i64, ey as i64, color as i64],
        Some(text),
    );
    ey
}

macro_rules! rtc_stub {
    ($name:ident, $tag:ident, $value:expr) => {
        extern "C" fn $name() -> c_int {
            record(Tag::$tag, &[]);
            $value
        }
    };
}

rtc_stub!(rtc_year, RtcGetYear, 2026);
rtc_stub!(rtc_mon, RtcGetMon, 10);
rtc_stub!(rtc_day, RtcGetDay, 17);
rtc_stub!(rtc_hour, RtcGetHour, 9);
rtc_stub!(rtc_min, RtcGetMin, 41);
rtc_stub!(rtc_sec, RtcGetSec, 5);
rtc_stub!(rtc_week, RtcGetWeek, 6);
rtc_stub!(rtc_stamp, RtcGetTimeStamp, 1_792_230_065);

extern "C" fn msg_dialog(title: *const u8, msg: *const u8, submit: extern "C" fn(u8)) {
    // SAFETY: NUL-terminated per contract.
    let text = unsafe { format!("{}|{}", c_text(title.cast()), c_text(msg.cast())) };
    record_text(Tag::CreateMsgDialog, &[], Some(text));
    submit(1);
}

extern "C" fn menu_dialog(
    title: *const c_char,
    names: *const *const c_char,
    count: u8,
    submit: extern "C" fn(u8),
) {
    // SAFETY: NUL-terminated per contract.
    let mut text = unsafe { c_text(title) };
    for i in 0..count as usize {
        text.push('|');
        // SAFETY: `names` holds `count` NUL-terminated entries.
        text.push_str(&unsafe { c_text(*names.add(i)) });
    }
    record_text(Tag::CreateMenuDialog, &[count as i64], Some(text));
    submit(count - 1);
}

extern "C" fn picker_dialog(num: u8, nums: *const u8, count: u8, submit: extern "C" fn(u8)) {
    // SAFETY: readable for `count` bytes per contract.
    let values = unsafe { std::slice::from_raw_parts(nums, count as usize) };
    let mut args = vec![num as i64, count as i64];
    args.extend(values.iter().map(|&v| v as i64));
    record(Tag::CreatePickerDialog, &args);
    submit(values[values.len() - 1]);
}

const HOST_ALIGN: usize = 8;
static BLOCKS: Mutex<Vec<(usize, usize)>> = Mutex::new(Vec::new());

extern "C" fn os_malloc(size: u32) -> *mut c_void {
    record(Tag::OsMalloc, &[size as i64]);
    let layout = std::alloc::Layout::from_size_align(size as usize, HOST_ALIGN).unwrap();
    // SAFETY: non-zero size (the SDK never requests zero bytes).
    let ptr = unsafe { std::alloc::alloc(layout) };
    BLOCKS.lock().unwrap().push((ptr as usize, size as usize));
    ptr.cast()
}

extern "C" fn os_free(ptr: *mut c_void) {
    record(Tag::OsFree, &[addr(ptr)]);
    let mut blocks = BLOCKS.lock().unwrap();
    if let Some(idx) = blocks.iter().position(|&(p, _)| p == ptr as usize) {
        let (_, size) = blocks.swap_remove(idx);
        let layout = std::alloc::Layout::from_size_align(size, HOST_ALIGN).unwrap();
        // SAFETY: allocated above with this layout.
        unsafe { std::alloc::dealloc(ptr.cast(), layout) };
    }
}

extern "C" fn utf_len(chr: *const u8) -> u16 {
    // SAFETY: NUL-terminated per contract.
    let text = unsafe { c_text(chr.cast()) };
    let n = text.chars().count() as u16;
    record_text(Tag::UtfLen, &[], Some(text));
    n
}

extern "C" fn set_rotate(rotate: u8) {
    record(Tag::EinkSetRotate, &[rotate as i64]);
}

extern "C" fn set_interval(ms: u32) {
    record(Tag::SetInterval, &[ms as i64]);
}

extern "C" fn get_interval() -> u32 {
    record(Tag::GetInterval, &[]);
    60_000
}

extern "C" fn get_weather_icon(idx: u16, buffer: *mut u8) {
    record(Tag::GetWeatherIcon, &[idx as i64]);
    // SAFETY: the SDK passes a full icon buffer.
    unsafe { buffer.write(idx as u8) };
}

// ---------------------------------------------------------------------------
// Table setup
// ---------------------------------------------------------------------------

fn fake_table() -> FuncTable {
    let mut t = FuncTable::new();
    t.set(Tag::WatchAppBattpercent, battpercent as usize as isize)
        .set(Tag::WatchAppHttpReq, http_req as usize as isize)
        .set(Tag::WatchAppLog, app_log as usize as isize)
        .set(Tag::WatchAppExit, app_exit as usize as isize)
        .set(Tag::WatchAppMkdir, app_mkdir as usize as isize)
        .set(Tag::WatchAppWriteFile, write_file as usize as isize)
        .set(Tag::WatchAppReadFile, read_file as usize as isize)
        .set(Tag::WatchAppDeleteFile, delete_file as usize as isize)
        .set(Tag::WatchAppBluestate, bluestate as usize as isize)
        .set(Tag::WatchAppGetweather, getweather as usize as isize)
        .set(Tag::WatchAppGetToday, get_today as usize as isize)
        .set(Tag::WatchAppIsweatherOk, isweather_ok as usize as isize)
        .set(Tag::EinkClear, eink_clear as usize as isize)
        .set(Tag::EinkDrawpixel, drawpixel as usize as isize)
        .set(Tag::EinkDrawline, drawline as usize as isize)
        .set(Tag::EinkDrawdashedline, drawdashedline as usize as isize)
        .set(Tag::EinkDrawrect, drawrect as usize as isize)
        .set(Tag::EinkDrawcircle, drawcircle as usize as isize)
        .set(Tag::EinkDrawBmp, draw_bmp as usize as isize)
        .set(Tag::EinkDrawstr, drawstr as usize as isize)
        .set(Tag::EinkDrawchstr, drawchstr as usize as isize)
        .set(Tag::EinkDrawRectstr, draw_rectstr as usize as isize)
        .set(Tag::RtcGetYear, rtc_year as usize as isize)
        .set(Tag::RtcGetMon, rtc_mon as usize as isize)
        .set(Tag::RtcGetDay, rtc_day as usize as isize)
        .set(Tag::RtcGetHour, rtc_hour as usize as isize)
        .set(Tag::RtcGetMin, rtc_min as usize as isize)
        .set(Tag::RtcGetSec, rtc_sec as usize as isize)
        .set(Tag::RtcGetWeek, rtc_week as usize as isize)
        .set(Tag::RtcGetTimeStamp, rtc_stamp as usize as isize)
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
    t
}

static TABLE: OnceLock<FuncTable> = OnceLock::new();
static HOST: Mutex<()> = Mutex::new(());

/// Serialize access to the global table and install the fake firmware.
fn host() -> MutexGuard<'static, ()> {
    let guard = HOST.lock().unwrap_or_else(|e| e.into_inner());
    let table = TABLE.get_or_init(fake_table);
    assert_eq!(table.missing().count(), 0, "fake table must fill every slot");
    // SAFETY: `table` is a static with every non-reserved slot filled.
    unsafe { startup::initialize_datas(table.as_ptr()) };
    take_calls();
    guard
}

// ---------------------------------------------------------------------------
// Wrapper forwarding
// ---------------------------------------------------------------------------

#[test]
fn test_display_wrappers_forward_arguments() {
    let _host = host();

    display::clear(0xFF);
    display::draw_pixel(1, 2, 0x80);
    display::draw_line(3, 4, 5, 6, 0);
    display::draw_dashed_line(7, 8, 9, 10, 0xFF);
    display::draw_rect(11, 12, 13, 14, 0x80, 1);
    display::draw_circle(-5, 100, 20, 0, 0);
    let bitmap = [0xAAu8; 8];
    // SAFETY: 8x8 at one bit per pixel.
    unsafe { display::draw_bmp(15, 16, 8, 8, bitmap.as_ptr(), 0, 1) };
    display::set_rotate(Rotate::Deg270);

    assert_eq!(
        take_calls(),
        vec![
            call(Tag::EinkClear, &[0xFF]),
            call(Tag::EinkDrawpixel, &[1, 2, 0x80]),
            call(Tag::EinkDrawline, &[3, 4, 5, 6, 0]),
            call(Tag::EinkDrawdashedline, &[7, 8, 9, 10, 0xFF]),
            call(Tag::EinkDrawrect, &[11, 12, 13, 14, 0x80, 1]),
            call(Tag::EinkDrawcircle, &[-5, 100, 20, 0, 0]),
            call(Tag::EinkDrawBmp, &[15, 16, 8, 8, addr(bitmap.as_ptr()), 0, 1]),
            call(Tag::EinkSetRotate, &[3]),
        ]
    );
}

#[test]
fn test_text_wrappers_return_host_values() {
    let _host = host();

    // SAFETY: literals are NUL-terminated.
    let end = unsafe { display::draw_str(10, 20, c"12:30".as_ptr().cast(), 24, 0) };
    assert_eq!(end, 10 + 5 * 12);
    // SAFETY: as above.
    assert_eq!(unsafe { display::draw_ch_str(4, 5, c"abc".as_ptr().cast(), 0) }, 20);
    // SAFETY: as above.
    assert_eq!(unsafe { display::draw_rect_str(c"wrap".as_ptr().cast(), 0, 0, 99, 49, 0) }, 49);
    assert_eq!(display::text(0, 0, "Mon", 16, 0xFF), Ok(24));

    let calls = take_calls();
    assert_eq!(calls.len(), 4);
    assert_eq!(calls[0].tag, Tag::EinkDrawstr);
    assert_eq!(calls[0].text.as_deref(), Some("12:30"));
    assert_eq!(calls[1].args, vec![4, 5, 0]);
    assert_eq!(calls[2].args, vec![0, 0, 99, 49, 0]);
    assert_eq!(calls[3].text.as_deref(), Some("Mon"));
}

#[test]
fn test_overlong_text_never_reaches_host() {
    let _host = host();
    let long = "x".repeat(display::MAX_TEXT_LEN + 1);
    let area = Rectangle::new(Point::new(0, 0), Size::new(100, 50));
    let too_long = Err(TextError::TooLong { max: 63 });

    assert_eq!(display::text_in(area, &long, 0), too_long);
    assert_eq!(display::text_ch(0, 0, &long, 0), too_long);
    assert_eq!(display::text(0, 0, &long, 16, 0), too_long);
    assert!(take_calls().is_empty());

    let fits = &long[..display::MAX_TEXT_LEN];
    assert!(display::text_ch(0, 0, fits, 0).is_ok());
    assert_eq!(take_calls().len(), 1);
}

#[test]
fn test_rtc_wrappers() {
    let _host = host();

    assert_eq!(rtc::year(), 2026);
    assert_eq!(rtc::month(), 10);
    assert_eq!(rtc::day(), 17);
    assert_eq!(rtc::hour(), 9);
    assert_eq!(rtc::minute(), 41);
    assert_eq!(rtc::second(), 5);
    assert_eq!(rtc::weekday(), 6);
    assert_eq!(rtc::timestamp(), 1_792_230_065);

    let tags: Vec<Tag> = take_calls().into_iter().map(|c| c.tag).collect();
    assert_eq!(
        tags,
        vec![
            Tag::RtcGetYear,
            Tag::RtcGetMon,
            Tag::RtcGetDay,
            Tag::RtcGetHour,
            Tag::RtcGetMin,
            Tag::RtcGetSec,
            Tag::RtcGetWeek,
            Tag::RtcGetTimeStamp,
        ]
    );
}

#[test]
fn test_rtc_now_reads_each_getter_once() {
    let _host = host();

    let now = rtc::now();
    assert_eq!((now.year, now.month, now.day), (2026, 10, 17));
    assert_eq!((now.hour, now.minute, now.second, now.weekday), (9, 41, 5, 6));
    assert_eq!(take_calls().len(), 7);
}

#[test]
fn test_system_wrappers() {
    let _host = host();

    assert_eq!(system::battery_percent(), 87);
    assert_eq!(system::is_weather_ok(), 1);
    assert!(system::weather_ready());

    let today = system::today();
    assert_eq!(today.pressure, 1013);
    assert_eq!(today.sunset_str(), "18:45");

    system::set_update_interval(30_000);
    assert_eq!(system::update_interval(), 60_000);

    // SAFETY: the fake host writes a single byte.
    let icon = unsafe { system::weather_icon_bitmap(7) };
    assert_eq!(icon[0], 7);

    system::exit();

    assert_eq!(
        take_calls(),
        vec![
            call(Tag::WatchAppBattpercent, &[]),
            call(Tag::WatchAppIsweatherOk, &[]),
            call(Tag::WatchAppIsweatherOk, &[]),
            call(Tag::WatchAppGetToday, &[]),
            call(Tag::SetInterval, &[30_000]),
            call(Tag::GetInterval, &[]),
            call(Tag::GetWeatherIcon, &[7]),
            call(Tag::WatchAppExit, &[]),
        ]
    );
}

static HTTP_BODY: Mutex<Option<String>> = Mutex::new(None);

extern "C" fn on_http(body: *mut c_char) {
    // SAFETY: the host passes a NUL-terminated body.
    *HTTP_BODY.lock().unwrap() = Some(unsafe { c_text(body) });
}

#[test]
fn test_http_request_passes_url_and_callback() {
    let _host = host();

    // SAFETY: static NUL-terminated URL.
    unsafe { system::http_request(c"https://example.invalid/w".as_ptr(), on_http) };

    let calls = take_calls();
    assert_eq!(calls[0].tag, Tag::WatchAppHttpReq);
    assert_eq!(calls[0].text.as_deref(), Some("https://example.invalid/w"));
    assert_eq!(HTTP_BODY.lock().unwrap().as_deref(), Some("{\"ok\":1}"));
}

#[test]
fn test_mem_wrappers() {
    let _host = host();

    let block = mem::malloc(32);
    assert!(!block.is_null());
    // SAFETY: `block` came from `malloc`.
    unsafe { mem::free(block) };
    // SAFETY: literal is NUL-terminated.
    assert_eq!(unsafe { mem::utf_len("héllo\0".as_ptr()) }, 5);

    let calls = take_calls();
    assert_eq!(calls[0], call(Tag::OsMalloc, &[32]));
    assert_eq!(calls[1], call(Tag::OsFree, &[addr(block)]));
    assert_eq!(calls[2].tag, Tag::UtfLen);
}

#[test]
fn test_host_allocator_goes_through_host_heap() {
    use core::alloc::{GlobalAlloc, Layout};

    let _host = host();
    let heap = HostAllocator::new();
    let layout = Layout::from_size_align(48, 8).unwrap();

    // SAFETY: non-zero layout; freed with the same layout.
    let ptr = unsafe { heap.alloc(layout) };
    assert!(!ptr.is_null());
    assert_eq!(ptr as usize % 8, 0);
    // SAFETY: as above.
    unsafe { heap.dealloc(ptr, layout) };

    let over = Layout::from_size_align(48, 64).unwrap();
    // SAFETY: over-aligned requests never reach the host.
    assert!(unsafe { heap.alloc(over) }.is_null());

    assert_eq!(
        take_calls(),
        vec![call(Tag::OsMalloc, &[48]), call(Tag::OsFree, &[addr(ptr)])]
    );
}

// ---------------------------------------------------------------------------
// Dialogs
// ---------------------------------------------------------------------------

static DIALOG_RESULT: AtomicU8 = AtomicU8::new(0xFF);

extern "C" fn on_submit(value: u8) {
    DIALOG_RESULT.store(value, Ordering::Relaxed);
}

static MENU: [MenuItem; 3] = [
    MenuItem::new(c"Rotate"),
    MenuItem::new(c"Interval"),
    MenuItem::new(c"Exit"),
];

static NUMS: [u8; 4] = [1, 5, 10, 30];

#[test]
fn test_dialog_wrappers() {
    let _host = host();

    dialog::show_message(c"Reset", c"Clear settings?", on_submit);
    assert_eq!(DIALOG_RESULT.load(Ordering::Relaxed), 1);

    dialog::show_menu(c"Menu", &MENU, on_submit);
    assert_eq!(DIALOG_RESULT.load(Ordering::Relaxed), 2);

    dialog::show_picker(5, &NUMS, on_submit);
    assert_eq!(DIALOG_RESULT.load(Ordering::Relaxed), 30);

    let calls = take_calls();
    assert_eq!(calls[0].tag, Tag::CreateMsgDialog);
    assert_eq!(calls[0].text.as_deref(), Some("Reset|Clear settings?"));
    assert_eq!(calls[1].args, vec![3]);
    assert_eq!(calls[1].text.as_deref(), Some("Menu|Rotate|Interval|Exit"));
    assert_eq!(calls[2], call(Tag::CreatePickerDialog, &[5, 4, 1, 5, 10, 30]));
}

// ---------------------------------------------------------------------------
// Files and settings
// ---------------------------------------------------------------------------

#[test]
fn test_file_wrappers_forward_raw_values() {
    let _host = host();

    let mut data = *b"abcdef";
    // SAFETY: NUL-terminated name, 6 readable bytes.
    let written = unsafe {
        fs::write_file(c"/t/raw".as_ptr().cast(), data.as_mut_ptr(), 6, 0, 0x0A)
    };
    assert_eq!(written, 6);

    let mut out = [0u8; 4];
    // SAFETY: NUL-terminated name, 4 writable bytes.
    let read = unsafe { fs::read_file(c"/t/raw".as_ptr().cast(), out.as_mut_ptr(), 4, 2) };
    assert_eq!(read, 4);
    assert_eq!(&out, b"cdef");

    // SAFETY: NUL-terminated names.
    assert_eq!(unsafe { fs::delete_file(c"/t/raw".as_ptr().cast()) }, 0);
    // SAFETY: as above.
    assert_eq!(unsafe { fs::delete_file(c"/t/raw".as_ptr().cast()) }, 4);

    let calls = take_calls();
    assert_eq!(calls[0].args, vec![6, 0, 0x0A]);
    assert_eq!(calls[1].args, vec![4, 2]);
    assert_eq!(calls[2].tag, Tag::WatchAppDeleteFile);
}

#[test]
fn test_fs_helpers_check_results() {
    let _host = host();

    fs::write("/t/a.bin", b"0123456789", 0, FileMode::WRITE | FileMode::CREATE_ALWAYS).unwrap();
    fs::write("/t/a.bin", b"XY", 4, FileMode::WRITE | FileMode::OPEN_EXISTING).unwrap();

    let mut buf = [0u8; 10];
    fs::read_exact("/t/a.bin", &mut buf, 0).unwrap();
    assert_eq!(&buf, b"0123XY6789");

    let mut big = [0u8; 20];
    assert_eq!(
        fs::read_exact("/t/a.bin", &mut big, 0),
        Err(FsError::ShortRead { expected: 20, actual: 10 })
    );

    let huge = vec![0u8; 1200];
    assert_eq!(
        fs::write("/t/b.bin", &huge, 0, FileMode::WRITE | FileMode::CREATE_ALWAYS),
        Err(FsError::ShortWrite { expected: 1200, actual: 1000 })
    );

    MKDIR_STATUS.store(8, Ordering::Relaxed);
    assert_eq!(fs::create_dir("/t"), Err(FsError::Status(8)));
    MKDIR_STATUS.store(0, Ordering::Relaxed);
    assert_eq!(fs::create_dir("/t"), Ok(()));

    assert_eq!(fs::remove("/t/a.bin"), Ok(()));
    assert_eq!(fs::remove("/t/a.bin"), Err(FsError::Status(4)));
}

#[derive(Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
struct Prefs {
    rotate: Rotate,
    interval_ms: u32,
    favourite: Option<WeatherDay>,
}

#[test]
fn test_settings_round_trip_through_host_files() {
    let _host = host();

    let prefs = Prefs {
        rotate: Rotate::Deg90,
        interval_ms: 15_000,
        favourite: Some(WeatherDay::Tomorrow),
    };
    settings::save("/t/prefs.bin", &prefs).unwrap();
    let back: Prefs = settings::load("/t/prefs.bin").unwrap();
    assert_eq!(back, prefs);

    // A shorter record replaces the longer one completely.
    settings::save("/t/prefs.bin", &Prefs::default()).unwrap();
    assert_eq!(settings::load::<Prefs>("/t/prefs.bin").unwrap(), Prefs::default());

    let missing: Prefs = settings::load_or_default("/t/missing.bin");
    assert_eq!(missing, Prefs::default());
}

// ---------------------------------------------------------------------------
// Table lifecycle
// ---------------------------------------------------------------------------

#[test]
fn test_reinitializing_switches_tables() {
    let _host = host();
    assert_eq!(system::battery_percent(), 87);

    let mut alt = fake_table();
    alt.set(Tag::WatchAppBattpercent, battpercent_alt as usize as isize);
    let alt: &'static FuncTable = Box::leak(Box::new(alt));
    // SAFETY: `alt` is complete and leaked.
    unsafe { startup::initialize_datas(alt.as_ptr()) };
    assert_eq!(system::battery_percent(), 13);

    let table = TABLE.get().unwrap();
    // SAFETY: the shared fake table is static.
    unsafe { startup::initialize_datas(table.as_ptr()) };
    assert_eq!(system::battery_percent(), 87);

    assert_eq!(
        take_calls(),
        vec![
            call(Tag::WatchAppBattpercent, &[]),
            call(Tag::WatchAppBattpercent, &[1]),
            call(Tag::WatchAppBattpercent, &[]),
        ]
    );
}

#[test]
fn test_installed_points_at_table() {
    let _host = host();
    let table = TABLE.get().unwrap();
    assert_eq!(watch_sdk::table::installed(), table.as_ptr());
    // SAFETY: table installed by `host()`.
    let slot = unsafe { watch_sdk::table::address(Tag::EinkClear) };
    assert_eq!(slot, eink_clear as usize as isize);
}

// ---------------------------------------------------------------------------
// Enum round-trips
// ---------------------------------------------------------------------------

#[test]
fn test_blue_state_round_trips() {
    let _host = host();
    for state in [BlueState::Disconnected, BlueState::Connecting, BlueState::Connected] {
        BLUE_STATE.store(state as u8, Ordering::Relaxed);
        assert_eq!(system::bluetooth_state(), state);
    }
}

#[test]
fn test_weather_day_round_trips() {
    let _host = host();
    for day in WeatherDay::ALL {
        let w = system::weather(day);
        assert_eq!(w.date, 17 + day as u8);
        assert_eq!(w.night_temp, -3);
        assert_eq!(w.day_icon, 100 + day as u16);
    }
    let days: Vec<i64> = take_calls().iter().map(|c| c.args[0]).collect();
    assert_eq!(days, vec![0, 1, 2]);
}

#[test]
fn test_rotate_round_trips() {
    let _host = host();
    for rotate in [Rotate::Deg0, Rotate::Deg90, Rotate::Deg180, Rotate::Deg270] {
        display::set_rotate(rotate);
    }
    let sent: Vec<u8> = take_calls().iter().map(|c| c.args[0] as u8).collect();
    let back: Vec<Rotate> = sent.into_iter().map(|r| Rotate::try_from(r).unwrap()).collect();
    assert_eq!(back, vec![Rotate::Deg0, Rotate::Deg90, Rotate::Deg180, Rotate::Deg270]);
}

// ---------------------------------------------------------------------------
// Graphics target
// ---------------------------------------------------------------------------

#[test]
fn test_host_display_maps_embedded_graphics() {
    let _host = host();
    let mut display = display::HostDisplay::new();

    display.clear(Gray8::WHITE).unwrap();
    Rectangle::new(Point::new(10, 20), Size::new(30, 5))
        .into_styled(PrimitiveStyle::with_fill(Gray8::BLACK))
        .draw(&mut display)
        .unwrap();
    Pixel(Point::new(5, 6), Gray8::new(0x80)).draw(&mut display).unwrap();
    Pixel(Point::new(-1, 6), Gray8::BLACK).draw(&mut display).unwrap();
    Pixel(Point::new(200, 6), Gray8::BLACK).draw(&mut display).unwrap();

    assert_eq!(
        take_calls(),
        vec![
            call(Tag::EinkClear, &[0xFF]),
            call(Tag::EinkDrawrect, &[10, 20, 39, 24, 0, 1]),
            call(Tag::EinkDrawpixel, &[5, 6, 0x80]),
        ]
    );
}

#[test]
fn test_host_display_clips_rect_at_far_edges() {
    let _host = host();
    let mut display = display::HostDisplay::new();
    let black = PrimitiveStyle::with_fill(Gray8::BLACK);

    Rectangle::new(Point::new(190, 195), Size::new(20, 20))
        .into_styled(black)
        .draw(&mut display)
        .unwrap();
    Rectangle::new(Point::new(250, 10), Size::new(20, 20))
        .into_styled(black)
        .draw(&mut display)
        .unwrap();

    assert_eq!(take_calls(), vec![call(Tag::EinkDrawrect, &[190, 195, 199, 199, 0, 1])]);
}

// ---------------------------------------------------------------------------
// Logger
// ---------------------------------------------------------------------------

#[test]
fn test_logger_forwards_to_host_log() {
    let _host = host();
    watch_sdk::logger::init(log::LevelFilter::Info);

    log::info!(target: "face", "battery {}%", 87);
    log::debug!(target: "face", "filtered");

    let calls = take_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].tag, Tag::WatchAppLog);
    assert_eq!(calls[0].text.as_deref(), Some("INFO face: battery 87%"));
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

struct EchoApp {
    draws: u32,
}

impl WatchApp for EchoApp {
    fn init() -> Self {
        system::set_update_interval(1000);
        Self { draws: 0 }
    }

    fn draw(&mut self) {
        self.draws += 1;
        display::clear(watch_sdk::WHITE);
    }

    fn update(&mut self, delta: i32) -> UpdateType {
        if delta > 0 { UpdateType::Part } else { UpdateType::None }
    }

    fn on_key(&mut self, key: ButtonType) -> UpdateType {
        match key {
            ButtonType::Null => UpdateType::None,
            ButtonType::Back => UpdateType::Full,
            _ => UpdateType::Part,
        }
    }
}

watch_sdk::watch_app!(static ECHO: EchoApp);

#[test]
fn test_app_init_publishes_callbacks() {
    let _host = host();
    let table = TABLE.get().unwrap();
    let (mut draw, mut key, mut update) = (0isize, 0isize, 0isize);

    // SAFETY: out-parameters are writable, table is complete.
    unsafe { app_init(&mut draw, &mut key, &mut update, table.as_ptr()) };
    assert_eq!(draw, onDraw as usize as isize);
    assert_eq!(key, onKey as usize as isize);
    assert_eq!(update, onUpdate as usize as isize);

    // SAFETY: addresses just published by `app_init` with these signatures.
    let (draw_fn, key_fn, update_fn) = unsafe {
        (
            core::mem::transmute::<isize, extern "C" fn()>(draw),
            core::mem::transmute::<isize, extern "C" fn(c_int) -> UpdateType>(key),
            core::mem::transmute::<isize, extern "C" fn(c_int) -> UpdateType>(update),
        )
    };

    draw_fn();
    assert_eq!(update_fn(500), UpdateType::Part);
    assert_eq!(update_fn(0), UpdateType::None);
    for button in ButtonType::ALL {
        let expected = match button {
            ButtonType::Null => UpdateType::None,
            ButtonType::Back => UpdateType::Full,
            _ => UpdateType::Part,
        };
        assert_eq!(key_fn(button as c_int), expected);
    }
    assert_eq!(key_fn(42), UpdateType::None);
    assert_eq!(key_fn(-1), UpdateType::None);
    assert_eq!(key_fn(c_int::MIN), UpdateType::None);

    // SAFETY: single-threaded under the host lock.
    assert_eq!(unsafe { ECHO.with(|app| app.draws) }, Some(1));
    assert_eq!(
        take_calls(),
        vec![call(Tag::SetInterval, &[1000]), call(Tag::EinkClear, &[0xFF])]
    );
}
