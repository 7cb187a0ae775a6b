//! Error types for the safe convenience layer.
//!
//! The raw wrappers never produce these: they return whatever the host
//! returns. Only the helpers that build C strings, check transfer counts or
//! encode settings report failures through the types below.

use thiserror_no_std::Error;

/// Failure to build a NUL-terminated name for the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PathError {
    /// The name does not fit the fixed buffer
    #[error("Path too long (max: {max} bytes)")]
    TooLong {
        /// Maximum number of bytes, excluding the terminator
        max: usize,
    },

    /// The name contains a NUL byte and would be truncated by the host
    #[error("Path contains an interior NUL byte")]
    InteriorNul,
}

/// Errors reported by the checked file helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FsError {
    #[error("Invalid path: {0}")]
    Path(PathError),

    /// Non-zero status from `mkdir` / `delete_file`
    #[error("Host file service returned status {0}")]
    Status(u8),

    /// Fewer bytes came back than requested
    #[error("Short read: expected {expected} bytes, got {actual}")]
    ShortRead { expected: usize, actual: usize },

    /// Fewer bytes were stored than requested
    #[error("Short write: expected {expected} bytes, wrote {actual}")]
    ShortWrite { expected: usize, actual: usize },

    /// Buffer length does not fit the host's 32-bit length argument
    #[error("Buffer of {len} bytes exceeds the host transfer limit")]
    TooLarge { len: usize },
}

impl From<PathError> for FsError {
    fn from(value: PathError) -> Self {
        Self::Path(value)
    }
}

/// Result type for file helpers
pub type FsResult<T> = Result<T, FsError>;

/// Errors from persisting settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("Settings file error: {0}")]
    Fs(FsError),

    #[error("Settings do not fit the {capacity}-byte buffer")]
    Encode { capacity: usize },

    #[error("Settings file is corrupt or from an incompatible version")]
    Decode,
}

impl From<FsError> for SettingsError {
    fn from(value: FsError) -> Self {
        Self::Fs(value)
    }
}

/// Errors from the text drawing helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TextError {
    #[error("Text too long (max: {max} bytes)")]
    TooLong { max: usize },

    #[error("Text area lies outside the canvas")]
    OffCanvas,
}

/// Result type for text helpers
pub type TextResult<T> = Result<T, TextError>;
