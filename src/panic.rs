//! Panic handling helper.
//!
//! The application binary has to provide the `#[panic_handler]`; forward it
//! here:
//!
//! ```ignore
//! #[panic_handler]
//! fn panic(info: &core::panic::PanicInfo) -> ! {
//!     watch_sdk::panic::on_panic(info)
//! }
//! ```

use core::panic::PanicInfo;

use log::error;

use crate::{system, table};

/// Log the panic, ask the firmware to close the app, then park.
///
/// `exit` only takes effect once control returns to the firmware, which a
/// panicking app never does, so the firmware's watchdog reclaims it.
pub fn on_panic(info: &PanicInfo) -> ! {
    error!("PANIC: {}", info);
    if !table::installed().is_null() {
        system::exit();
    }
    loop {
        core::hint::spin_loop();
    }
}
