//! The host function table.
//!
//! The firmware passes the application a pointer to an array of function
//! addresses. Both sides agree on the slot of every service at compile time:
//! that agreement is [`Tag`]. The pointer is stored once by
//! [`startup::initialize_datas`](crate::startup::initialize_datas) and read
//! by every wrapper on every call, so re-installing a table takes effect
//! immediately.
//!
//! Nothing here checks that the table is long enough or that a slot holds a
//! function of the expected signature. A mismatched table is undefined
//! behaviour, exactly as it is for a C application.

use core::mem::{size_of, transmute_copy};
use core::ptr;
use core::sync::atomic::{AtomicPtr, Ordering};

/// Slot ordinals of the host function table.
///
/// The order is fixed by the firmware. Never reorder or insert variants;
/// new services are appended before [`Tag::COUNT`] is bumped.
#[repr(usize)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    WatchAppBattpercent = 0,
    WatchAppHttpReq,
    WatchAppLog,
    WatchAppExit,
    WatchAppMkdir,
    WatchAppWriteFile,
    WatchAppReadFile,
    WatchAppDeleteFile,
    WatchAppBluestate,
    WatchAppGetweather,
    WatchAppGetToday,
    WatchAppIsweatherOk,
    EinkClear,
    EinkDrawpixel,
    EinkDrawline,
    EinkDrawdashedline,
    EinkDrawrect,
    EinkDrawcircle,
    EinkDrawBmp,
    EinkDrawstr,
    EinkDrawchstr,
    EinkDrawRectstr,
    RtcGetYear,
    RtcGetMon,
    RtcGetDay,
    RtcGetHour,
    RtcGetMin,
    RtcGetSec,
    RtcGetWeek,
    RtcGetTimeStamp,
    CreateMsgDialog,
    CreateMenuDialog,
    OsMalloc,
    OsFree,
    UtfLen,
    CreatePickerDialog,
    EinkSetRotate,
    SetInterval,
    GetInterval,
    GetWeatherIcon,
    /// Reserved: the firmware fills this slot but publishes no signature.
    BeepOn,
    /// Reserved: the firmware fills this slot but publishes no signature.
    BeepOff,
    /// Reserved: the firmware fills this slot but publishes no signature.
    Buzzer,
}

impl Tag {
    /// Number of slots the firmware table provides.
    pub const COUNT: usize = Tag::Buzzer as usize + 1;

    /// Slot index of this service.
    pub const fn ordinal(self) -> usize {
        self as usize
    }

    /// Whether the SDK exposes a wrapper for this slot.
    pub const fn is_reserved(self) -> bool {
        matches!(self, Self::BeepOn | Self::BeepOff | Self::Buzzer)
    }
}

/// Base of the installed table. Null until the startup routine has run.
static FUNC_ARRAY: AtomicPtr<isize> = AtomicPtr::new(ptr::null_mut());

/// Store the host table pointer. Subsequent wrapper calls dispatch through it.
pub(crate) fn install(table: *const isize) {
    FUNC_ARRAY.store(table.cast_mut(), Ordering::Release);
}

/// Currently installed table base, or null before startup.
pub fn installed() -> *const isize {
    FUNC_ARRAY.load(Ordering::Acquire)
}

/// Raw address stored at `tag` in the installed table.
///
/// # Panics
///
/// If no table has been installed yet.
///
/// # Safety
///
/// An installed table must have at least [`Tag::COUNT`] entries.
pub unsafe fn address(tag: Tag) -> isize {
    let base = installed();
    if base.is_null() {
        panic!("host function table used before app_init");
    }
    // SAFETY: the caller guarantees the table covers every ordinal.
    unsafe { base.add(tag.ordinal()).read() }
}

/// Reinterpret the slot for `tag` as the function-pointer type `F`.
///
/// # Panics
///
/// If no table has been installed yet.
///
/// # Safety
///
/// The installed table must have at least [`Tag::COUNT`] entries and the
/// slot must hold a non-null function whose ABI and signature are exactly `F`.
#[inline]
pub unsafe fn resolve<F: Copy>(tag: Tag) -> F {
    const { assert!(size_of::<F>() == size_of::<isize>()) };
    // SAFETY: forwarded to the caller.
    let addr = unsafe { address(tag) };
    // SAFETY: same size checked above; validity of the address is the
    // caller's contract.
    unsafe { transmute_copy::<isize, F>(&addr) }
}

/// Host-side table builder.
///
/// The firmware builds its table in C; desktop hosts and tests build one
/// with this type, filling every slot in [`Tag`] order and handing
/// [`FuncTable::as_ptr`] to `app_init`.
#[derive(Debug, Clone)]
pub struct FuncTable {
    slots: [isize; Tag::COUNT],
}

impl Default for FuncTable {
    fn default() -> Self {
        Self::new()
    }
}

impl FuncTable {
    /// An empty table with every slot zeroed.
    pub const fn new() -> Self {
        Self {
            slots: [0; Tag::COUNT],
        }
    }

    /// Place a function address in the slot for `tag`.
    ///
    /// Callers pass an `extern "C" fn` cast to `usize`/`isize`; the type is
    /// erased here exactly as it is on the firmware side.
    pub fn set(&mut self, tag: Tag, address: isize) -> &mut Self {
        self.slots[tag.ordinal()] = address;
        self
    }

    pub fn get(&self, tag: Tag) -> isize {
        self.slots[tag.ordinal()]
    }

    /// Slots that are still zero, skipping reserved ordinals.
    pub fn missing(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(idx, addr)| **addr == 0 && *idx < Tag::BeepOn.ordinal())
            .map(|(idx, _)| idx)
    }

    /// Pointer to pass to `app_init`. Valid while `self` is alive and not moved.
    pub fn as_ptr(&self) -> *const isize {
        self.slots.as_ptr()
    }
}
