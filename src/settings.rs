//! Persisted application settings.
//!
//! Any `serde` type can be stored with `postcard` in a file on the watch.
//! The encoded form is prefixed with its length so a shorter rewrite never
//! leaves stale bytes behind a valid record.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{FsError, SettingsError};
use crate::fs;
use crate::types::FileMode;

/// Largest encoded settings record, including the length prefix.
pub const MAX_SETTINGS_LEN: usize = 256;

const LEN_PREFIX: usize = 2;

/// Encode `value` into a length-prefixed record. Returns the used prefix of `buf`.
fn encode<'b, T: Serialize>(value: &T, buf: &'b mut [u8]) -> Result<&'b [u8], SettingsError> {
    let capacity = buf.len();
    let (prefix, body) = buf.split_at_mut(LEN_PREFIX);
    let used = postcard::to_slice(value, body)
        .map_err(|_| SettingsError::Encode { capacity })?
        .len();
    prefix.copy_from_slice(&(used as u16).to_le_bytes());
    Ok(&buf[..LEN_PREFIX + used])
}

/// Decode a record produced by [`encode`].
fn decode<T: DeserializeOwned>(record: &[u8]) -> Result<T, SettingsError> {
    let prefix = record.get(..LEN_PREFIX).ok_or(SettingsError::Decode)?;
    let used = u16::from_le_bytes([prefix[0], prefix[1]]) as usize;
    let body = record
        .get(LEN_PREFIX..LEN_PREFIX + used)
        .ok_or(SettingsError::Decode)?;
    postcard::from_bytes(body).map_err(|_| SettingsError::Decode)
}

/// Store `value` in `path`, replacing any previous contents.
pub fn save<T: Serialize>(path: &str, value: &T) -> Result<(), SettingsError> {
    let mut buf = [0u8; MAX_SETTINGS_LEN];
    let record = encode(value, &mut buf)?;
    fs::write(path, record, 0, FileMode::WRITE | FileMode::CREATE_ALWAYS)?;
    Ok(())
}

/// Load a value stored with [`save`].
pub fn load<T: DeserializeOwned>(path: &str) -> Result<T, SettingsError> {
    let mut buf = [0u8; MAX_SETTINGS_LEN];
    let read = fs::read(path, &mut buf, 0)?;
    decode(&buf[..read])
}

/// Load from `path`, or fall back to `T::default()` when the file is
/// missing, short or corrupt.
pub fn load_or_default<T: DeserializeOwned + Default>(path: &str) -> T {
    match load(path) {
        Ok(value) => value,
        Err(SettingsError::Fs(FsError::Path(e))) => {
            log::warn!("settings path {} rejected: {}", path, e);
            T::default()
        }
        Err(e) => {
            log::info!("settings {} not loaded ({}), using defaults", path, e);
            T::default()
        }
    }
}
