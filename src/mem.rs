//! Host heap and string helpers.

use core::ffi::c_void;

host_fns! {
    /// Allocate `size` bytes from the firmware heap. Null on exhaustion.
    /// The block belongs to the caller until passed to [`free`].
    pub fn malloc(size: u32) -> *mut c_void => OsMalloc;

    /// Return a block obtained from [`malloc`].
    ///
    /// # Safety
    ///
    /// `ptr` must come from [`malloc`] and not have been freed.
    pub unsafe fn free(ptr: *mut c_void) => OsFree;

    /// Number of characters in a NUL-terminated UTF-8 string.
    ///
    /// # Safety
    ///
    /// `chr` must be NUL-terminated.
    pub unsafe fn utf_len(chr: *const u8) -> u16 => UtfLen;
}
