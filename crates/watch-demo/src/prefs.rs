//! Persisted watch face preferences.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use watch_sdk::{Rotate, fs, settings};

/// Directory the face keeps its files in.
pub const APP_DIR: &str = "/apps/demo";
/// Settings file.
pub const PREFS_PATH: &str = "/apps/demo/prefs.bin";

/// Bumped whenever `Prefs` changes shape; older files are discarded.
pub const PREFS_VERSION: u8 = 1;

/// Refresh periods offered by the picker, in seconds.
pub static INTERVALS: [u8; 6] = [1, 5, 10, 30, 60, 120];

/// Face page currently shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Page {
    #[default]
    Time,
    Weather,
    Status,
}

impl Page {
    pub const fn next(self) -> Self {
        match self {
            Self::Time => Self::Weather,
            Self::Weather => Self::Status,
            Self::Status => Self::Time,
        }
    }

    pub const fn prev(self) -> Self {
        match self {
            Self::Time => Self::Status,
            Self::Weather => Self::Time,
            Self::Status => Self::Weather,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prefs {
    pub version: u8,
    pub page: Page,
    pub rotate: Rotate,
    /// Seconds between `update` callbacks.
    pub interval_secs: u8,
}

impl Default for Prefs {
    fn default() -> Self {
        Self {
            version: PREFS_VERSION,
            page: Page::Time,
            rotate: Rotate::Deg0,
            interval_secs: 60,
        }
    }
}

impl Prefs {
    /// Whether the face redraws every second rather than every minute.
    pub fn ticks_seconds(&self) -> bool {
        self.interval_secs < 60
    }

    /// Update period in milliseconds as the host expects it.
    pub fn interval_ms(&self) -> u32 {
        u32::from(self.interval_secs.max(1)) * 1000
    }

    /// Keep only values the face can act on.
    fn sanitized(self) -> Self {
        if self.version != PREFS_VERSION || !INTERVALS.contains(&self.interval_secs) {
            warn!("discarding incompatible preferences {:?}", self);
            return Self::default();
        }
        self
    }

    /// Load from flash, falling back to defaults.
    pub fn load() -> Self {
        settings::load_or_default::<Self>(PREFS_PATH).sanitized()
    }

    /// Store on flash. Failures are logged; the face keeps running with the
    /// in-memory values.
    pub fn save(&self) {
        if let Err(e) = fs::create_dir(APP_DIR) {
            // The directory usually exists already.
            log::debug!("create {}: {}", APP_DIR, e);
        }
        match settings::save(PREFS_PATH, self) {
            Ok(()) => info!("preferences saved"),
            Err(e) => warn!("preferences not saved: {}", e),
        }
    }

    /// Delete the stored file and return the defaults.
    pub fn reset() -> Self {
        if let Err(e) = fs::remove(PREFS_PATH) {
            warn!("remove {}: {}", PREFS_PATH, e);
        }
        Self::default()
    }
}
