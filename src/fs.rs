//! File services on the watch's flash file system.
//!
//! The raw wrappers take NUL-terminated names and return the host's own
//! results: a byte count for reads and writes, a FatFs style status byte for
//! `mkdir` and `delete_file` (zero on success). The checked helpers below
//! build the names from `&str` and turn counts and statuses into
//! [`FsResult`].

use crate::error::{FsError, FsResult};
use crate::path::{CPath, MAX_PATH};
use crate::types::FileMode;

host_fns! {
    /// Create a directory. Returns the host status.
    ///
    /// # Safety
    ///
    /// `dir` must be NUL-terminated.
    pub unsafe fn mkdir(dir: *const u8) -> u8 => WatchAppMkdir;

    /// Write `len` bytes from `buffer` at byte offset `seekofs`.
    /// `fa_mode` is a [`FileMode`] bit set. Returns bytes written.
    ///
    /// # Safety
    ///
    /// `file_name` must be NUL-terminated and `buffer` readable for `len` bytes.
    pub unsafe fn write_file(file_name: *const u8, buffer: *mut u8, len: u32, seekofs: u32, fa_mode: u8) -> u32 => WatchAppWriteFile;

    /// Read up to `len` bytes at byte offset `seekofs` into `buffer`.
    /// Returns bytes read.
    ///
    /// # Safety
    ///
    /// `file_name` must be NUL-terminated and `buffer` writable for `len` bytes.
    pub unsafe fn read_file(file_name: *const u8, buffer: *mut u8, len: u32, seekofs: u32) -> u32 => WatchAppReadFile;

    /// Delete a file. Returns the host status.
    ///
    /// # Safety
    ///
    /// `file_name` must be NUL-terminated.
    pub unsafe fn delete_file(file_name: *const u8) -> u8 => WatchAppDeleteFile;
}

fn host_len(len: usize) -> FsResult<u32> {
    u32::try_from(len).map_err(|_| FsError::TooLarge { len })
}

fn status(code: u8) -> FsResult<()> {
    match code {
        0 => Ok(()),
        code => Err(FsError::Status(code)),
    }
}

/// Read up to `buf.len()` bytes at `offset`. Returns the number read.
pub fn read(path: &str, buf: &mut [u8], offset: u32) -> FsResult<usize> {
    let name = CPath::<MAX_PATH>::new(path)?;
    let len = host_len(buf.len())?;
    // SAFETY: `name` is NUL-terminated, `buf` is writable for `len` bytes.
    let read = unsafe { read_file(name.as_ptr(), buf.as_mut_ptr(), len, offset) };
    Ok(read as usize)
}

/// Fill `buf` completely from `offset` or fail with [`FsError::ShortRead`].
pub fn read_exact(path: &str, buf: &mut [u8], offset: u32) -> FsResult<()> {
    let actual = read(path, buf, offset)?;
    if actual != buf.len() {
        return Err(FsError::ShortRead {
            expected: buf.len(),
            actual,
        });
    }
    Ok(())
}

/// Write all of `data` at `offset` with `mode`.
pub fn write(path: &str, data: &[u8], offset: u32, mode: FileMode) -> FsResult<()> {
    let name = CPath::<MAX_PATH>::new(path)?;
    let len = host_len(data.len())?;
    // The host never writes through the buffer pointer; its C signature is
    // just not const-correct.
    // SAFETY: `name` is NUL-terminated, `data` is readable for `len` bytes.
    let written = unsafe {
        write_file(name.as_ptr(), data.as_ptr().cast_mut(), len, offset, mode.bits())
    };
    if written as usize != data.len() {
        return Err(FsError::ShortWrite {
            expected: data.len(),
            actual: written as usize,
        });
    }
    Ok(())
}

/// Delete `path`.
pub fn remove(path: &str) -> FsResult<()> {
    let name = CPath::<MAX_PATH>::new(path)?;
    // SAFETY: NUL-terminated.
    status(unsafe { delete_file(name.as_ptr()) })
}

/// Create directory `path`.
pub fn create_dir(path: &str) -> FsResult<()> {
    let name = CPath::<MAX_PATH>::new(path)?;
    // SAFETY: NUL-terminated.
    status(unsafe { mkdir(name.as_ptr()) })
}
