//! Reference watch face for the watch SDK.
//!
//! Three pages (time, forecast, status) cycled with Up/Down, a menu on
//! Center for rotation, refresh interval, weather sync and reset, and a
//! confirmation on Back before exiting. Preferences persist on the watch's
//! flash between launches.
//!
//! Built as a library so the same code links into the watch image and into
//! the desktop simulator, which calls [`app_init`] directly.

#![no_std]

pub mod face;
pub mod format;
pub mod menu;
pub mod prefs;

pub use face::WatchFace;

watch_sdk::watch_app!(pub static APP: WatchFace);

#[cfg(all(target_os = "none", not(test)))]
#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    watch_sdk::panic::on_panic(info)
}
