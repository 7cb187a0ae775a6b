//! Host-rendered modal dialogs.
//!
//! Creating a dialog returns immediately. The firmware draws it, handles the
//! buttons, and calls the `submit` callback later from its event loop with
//! the user's answer. The firmware keeps the pointers it was given until
//! then, which is why the safe helpers only accept `'static` data.

use core::ffi::{CStr, c_char};

host_fns! {
    /// Yes/no message box; `submit` receives non-zero for OK.
    ///
    /// # Safety
    ///
    /// `title` and `msg` must be NUL-terminated and live until `submit` runs.
    pub unsafe fn message(title: *const u8, msg: *const u8, submit: extern "C" fn(u8)) => CreateMsgDialog;

    /// List of `count` choices; `submit` receives the chosen index.
    ///
    /// # Safety
    ///
    /// `title` and every entry of `menu_item_names` must be NUL-terminated
    /// and live until `submit` runs.
    pub unsafe fn menu(title: *const c_char, menu_item_names: *const *const c_char, count: u8, submit: extern "C" fn(u8)) => CreateMenuDialog;

    /// Numeric picker over the `count` values in `nums` with `num`
    /// preselected; `submit` receives the chosen value.
    ///
    /// # Safety
    ///
    /// `nums` must be readable for `count` bytes and live until `submit` runs.
    pub unsafe fn picker(num: u8, nums: *const u8, count: u8, submit: extern "C" fn(u8)) => CreatePickerDialog;
}

/// One menu entry, laid out as the `const char*` the firmware expects.
///
/// Lets applications declare menus as plain statics:
///
/// ```ignore
/// static ITEMS: [MenuItem; 2] = [MenuItem::new(c"Rotate"), MenuItem::new(c"Reset")];
/// ```
#[repr(transparent)]
#[derive(Debug, Clone, Copy)]
pub struct MenuItem(*const c_char);

// SAFETY: the pointer always comes from a `&'static CStr` and is never
// written through.
unsafe impl Sync for MenuItem {}

impl MenuItem {
    pub const fn new(label: &'static CStr) -> Self {
        Self(label.as_ptr())
    }
}

/// Show a message box.
pub fn show_message(title: &'static CStr, msg: &'static CStr, submit: extern "C" fn(u8)) {
    // SAFETY: both strings are static and NUL-terminated.
    unsafe { message(title.as_ptr().cast(), msg.as_ptr().cast(), submit) }
}

/// Show a menu. At most 255 entries are passed on.
pub fn show_menu(title: &'static CStr, items: &'static [MenuItem], submit: extern "C" fn(u8)) {
    let count = items.len().min(u8::MAX as usize) as u8;
    // SAFETY: `MenuItem` is a transparent `const char*` from a static CStr.
    unsafe { menu(title.as_ptr(), items.as_ptr().cast(), count, submit) }
}

/// Show a numeric picker over `nums`, preselecting `initial`.
pub fn show_picker(initial: u8, nums: &'static [u8], submit: extern "C" fn(u8)) {
    let count = nums.len().min(u8::MAX as usize) as u8;
    // SAFETY: `nums` is static and readable for `count` bytes.
    unsafe { picker(initial, nums.as_ptr(), count, submit) }
}
