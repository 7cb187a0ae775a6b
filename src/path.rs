//! NUL-terminated names for the host file services.

use core::ffi::CStr;

use heapless::Vec;

use crate::error::PathError;

/// Default capacity for file names, including the terminator.
pub const MAX_PATH: usize = 64;

/// A file or directory name with a trailing NUL, held on the stack.
///
/// `N` is the buffer size including the terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CPath<const N: usize = MAX_PATH> {
    bytes: Vec<u8, N>,
}

impl<const N: usize> CPath<N> {
    /// Copy `path` and append the terminator.
    pub fn new(path: &str) -> Result<Self, PathError> {
        let raw = path.as_bytes();
        if raw.contains(&0) {
            return Err(PathError::InteriorNul);
        }

        let too_long = PathError::TooLong {
            max: N.saturating_sub(1),
        };
        let mut bytes = Vec::new();
        bytes.extend_from_slice(raw).map_err(|_| too_long)?;
        bytes.push(0).map_err(|_| too_long)?;
        Ok(Self { bytes })
    }

    /// Pointer to the first byte, for the raw wrappers.
    pub fn as_ptr(&self) -> *const u8 {
        self.bytes.as_ptr()
    }

    pub fn as_c_str(&self) -> &CStr {
        // The constructor guarantees one NUL, at the end.
        CStr::from_bytes_with_nul(&self.bytes).unwrap_or_default()
    }

    /// Name bytes without the terminator.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.bytes.len() - 1]
    }
}

impl<const N: usize> TryFrom<&str> for CPath<N> {
    type Error = PathError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
