//! Data-segment initialization.
//!
//! The firmware loads the application image but does not run a C runtime
//! for it, so before any Rust code touches a `static` the application has
//! to copy its `.data` image from flash to RAM and zero `.bss` itself. The
//! boundaries come from the application's linker script
//! (`_sidata`, `_sdata`, `_edata`, `_sbss`, `_ebss`).
//!
//! On hosted targets (the simulator, tests) the OS loader has already done
//! this and only the table pointer is stored.

use core::ptr;

use crate::table;

/// Copy `.data` and zero `.bss`, word by word.
///
/// Copies `sidata` into `sdata..edata` and writes zero over `sbss..ebss`.
/// Nothing outside those two half-open ranges is written. Empty or inverted
/// ranges are left alone.
///
/// # Safety
///
/// `sidata` must be readable for `edata - sdata` words, both ranges must be
/// writable, 4-byte aligned, and must not overlap the caller's stack or the
/// source image.
pub unsafe fn init_sections(
    mut sidata: *const u32,
    mut sdata: *mut u32,
    edata: *mut u32,
    mut sbss: *mut u32,
    ebss: *mut u32,
) {
    // Volatile accesses keep the compiler from lowering these loops into
    // memcpy/memset calls, which may themselves live in `.data`.
    while sdata < edata {
        // SAFETY: in-bounds per the caller contract.
        unsafe {
            ptr::write_volatile(sdata, ptr::read_volatile(sidata));
            sdata = sdata.add(1);
            sidata = sidata.add(1);
        }
    }

    while sbss < ebss {
        // SAFETY: in-bounds per the caller contract.
        unsafe {
            ptr::write_volatile(sbss, 0);
            sbss = sbss.add(1);
        }
    }
}

#[cfg(target_os = "none")]
unsafe extern "C" {
    static _sidata: u32;
    static mut _sdata: u32;
    static mut _edata: u32;
    static mut _sbss: u32;
    static mut _ebss: u32;
}

/// Prepare the data segments and install the host function table.
///
/// Must run once before any other SDK call. `app_init` generated by
/// [`watch_app!`](crate::watch_app) calls it first thing. Running it again
/// with another table redirects every later wrapper call to that table.
///
/// # Safety
///
/// `table` must point to a host function table with at least
/// [`Tag::COUNT`](crate::Tag::COUNT) entries that outlives the application.
/// On the watch, the linker symbols must describe the real segment bounds;
/// re-running it there also resets every `static` to its initial value.
pub unsafe fn initialize_datas(table: *const isize) {
    #[cfg(target_os = "none")]
    // SAFETY: forwarded to the caller.
    unsafe {
        init_linker_sections();
    }

    table::install(table);
}

#[cfg(target_os = "none")]
unsafe fn init_linker_sections() {
    // SAFETY: the linker script defines these symbols around the real
    // segments; only their addresses are taken.
    unsafe {
        init_sections(
            &raw const _sidata,
            &raw mut _sdata,
            &raw mut _edata,
            &raw mut _sbss,
            &raw mut _ebss,
        );
    }
}
