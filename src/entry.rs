//! Application entry glue.
//!
//! The firmware loads an application and calls its `app_init` with three
//! out-parameters and the function table. The application answers by
//! writing the addresses of its `onDraw`, `onKey` and `onUpdate` callbacks
//! into those out-parameters; from then on the firmware drives it by
//! calling them one at a time from its own event loop.
//!
//! Implement [`WatchApp`] and let [`watch_app!`](crate::watch_app) emit
//! the C-ABI surface:
//!
//! ```ignore
//! struct Face { ticks: u32 }
//!
//! impl WatchApp for Face {
//!     fn init() -> Self { Face { ticks: 0 } }
//!     fn draw(&mut self) { watch_sdk::display::clear(watch_sdk::WHITE); }
//!     fn update(&mut self, _delta: i32) -> UpdateType { UpdateType::None }
//!     fn on_key(&mut self, _key: ButtonType) -> UpdateType { UpdateType::Part }
//! }
//!
//! watch_sdk::watch_app!(static APP: Face);
//! ```

use core::cell::UnsafeCell;

use crate::types::{ButtonType, UpdateType};

/// Behaviour of a watch application.
///
/// The firmware never calls these concurrently and never re-enters one
/// from inside another.
pub trait WatchApp: Sized {
    /// Build the application state. Runs inside `app_init`, after the data
    /// segments and the function table are set up, so host services are
    /// already usable.
    fn init() -> Self;

    /// Render the current state.
    fn draw(&mut self);

    /// Periodic tick. `delta` is the time since the previous tick in
    /// milliseconds, as reported by the firmware.
    fn update(&mut self, delta: i32) -> UpdateType;

    /// Button event.
    fn on_key(&mut self, key: ButtonType) -> UpdateType;
}

/// Storage for the one application instance.
///
/// The firmware is single threaded and calls callbacks strictly one at a
/// time, which is the only thing making the `Sync` impl sound.
pub struct AppCell<T> {
    inner: UnsafeCell<Option<T>>,
}

// SAFETY: only accessed from the firmware's single event loop. `T: Send`
// keeps non-thread-safe values such as `Rc` out of the static.
unsafe impl<T: Send> Sync for AppCell<T> {}

impl<T> AppCell<T> {
    pub const fn new() -> Self {
        Self {
            inner: UnsafeCell::new(None),
        }
    }

    /// Store the application instance, dropping any previous one.
    ///
    /// # Safety
    ///
    /// No reference obtained through [`AppCell::with`] may be alive.
    pub unsafe fn set(&self, value: T) {
        // SAFETY: exclusive access per the caller contract.
        unsafe { *self.inner.get() = Some(value) };
    }

    /// Run `f` on the instance. `None` before [`AppCell::set`].
    ///
    /// # Safety
    ///
    /// Must not be called re-entrantly (from inside another `with` on the
    /// same cell) or from more than one thread.
    pub unsafe fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        // SAFETY: exclusive access per the caller contract.
        unsafe { (*self.inner.get()).as_mut().map(f) }
    }

    pub fn is_set(&self) -> bool {
        // SAFETY: shared read of the discriminant on the single event loop.
        unsafe { (*self.inner.get()).is_some() }
    }
}

impl<T> Default for AppCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Dispatch a draw callback.
///
/// # Safety
///
/// Must not be called while another callback on `cell` is running.
#[doc(hidden)]
pub unsafe fn dispatch_draw<A: WatchApp>(cell: &AppCell<A>) {
    // SAFETY: forwarded to the caller.
    unsafe { cell.with(|app| app.draw()) };
}

/// Dispatch an update callback. Reports no change before `app_init`.
///
/// # Safety
///
/// Must not be called while another callback on `cell` is running.
#[doc(hidden)]
pub unsafe fn dispatch_update<A: WatchApp>(cell: &AppCell<A>, delta: i32) -> UpdateType {
    // SAFETY: forwarded to the caller.
    unsafe { cell.with(|app| app.update(delta)) }.unwrap_or(UpdateType::None)
}

/// Dispatch a key callback from the raw button value.
///
/// # Safety
///
/// Must not be called while another callback on `cell` is running.
#[doc(hidden)]
pub unsafe fn dispatch_key<A: WatchApp>(cell: &AppCell<A>, raw: core::ffi::c_int) -> UpdateType {
    let key = ButtonType::from_raw(raw);
    // SAFETY: forwarded to the caller.
    unsafe { cell.with(|app| app.on_key(key)) }.unwrap_or(UpdateType::None)
}

/// Emit `app_init`, `onDraw`, `onUpdate` and `onKey` for one application.
///
/// `watch_app!(static APP: MyApp);` declares the application cell `APP`
/// (usable from dialog and HTTP callbacks through `APP.with`) and the four
/// unmangled entry points. On the watch they are placed in `.keep_section`
/// so the linker keeps them even though nothing in the image calls them.
#[macro_export]
macro_rules! watch_app {
    ($vis:vis static $name:ident: $app:ty) => {
        $vis static $name: $crate::AppCell<$app> = $crate::AppCell::new();

        /// Firmware entry point.
        ///
        /// # Safety
        ///
        /// Called once by the firmware with writable out-parameters and a
        /// complete function table.
        #[unsafe(no_mangle)]
        #[cfg_attr(target_os = "none", unsafe(link_section = ".keep_section"))]
        pub unsafe extern "C" fn app_init(
            draw_ptr: *mut isize,
            onkey_ptr: *mut isize,
            onupdate_ptr: *mut isize,
            func_arr: *const isize,
        ) {
            // SAFETY: the firmware hands over a complete table.
            unsafe { $crate::startup::initialize_datas(func_arr) };
            let app = <$app as $crate::WatchApp>::init();
            // SAFETY: no callback can be running yet.
            unsafe { $name.set(app) };
            // SAFETY: the firmware passes writable slots.
            unsafe {
                draw_ptr.write(onDraw as usize as isize);
                onkey_ptr.write(onKey as usize as isize);
                onupdate_ptr.write(onUpdate as usize as isize);
            }
        }

        #[allow(non_snake_case)]
        #[unsafe(no_mangle)]
        #[cfg_attr(target_os = "none", unsafe(link_section = ".keep_section"))]
        pub extern "C" fn onDraw() {
            // SAFETY: the firmware runs callbacks one at a time.
            unsafe { $crate::entry::dispatch_draw(&$name) };
        }

        #[allow(non_snake_case)]
        #[unsafe(no_mangle)]
        #[cfg_attr(target_os = "none", unsafe(link_section = ".keep_section"))]
        pub extern "C" fn onUpdate(delta: ::core::ffi::c_int) -> $crate::UpdateType {
            // SAFETY: the firmware runs callbacks one at a time.
            unsafe { $crate::entry::dispatch_update(&$name, delta) }
        }

        #[allow(non_snake_case)]
        #[unsafe(no_mangle)]
        #[cfg_attr(target_os = "none", unsafe(link_section = ".keep_section"))]
        pub extern "C" fn onKey(key: ::core::ffi::c_int) -> $crate::UpdateType {
            // SAFETY: the firmware runs callbacks one at a time.
            unsafe { $crate::entry::dispatch_key(&$name, key) }
        }
    };
}
