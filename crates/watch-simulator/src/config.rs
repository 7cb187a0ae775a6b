//! Simulator settings from the environment.
//!
//! | Variable               | Meaning                                         | Default            |
//! |------------------------|-------------------------------------------------|--------------------|
//! | `WATCH_SIM_ROOT`       | Directory standing in for the watch's flash     | `<tmp>/watch-sim`  |
//! | `WATCH_SIM_TICK_MS`    | Fixed tick period; `0` follows the app interval | `0`                |
//! | `WATCH_SIM_TICKS`      | Ticks to run in headless mode                   | `10`               |
//! | `WATCH_SIM_SCREENSHOT` | PNG written after a headless run                | none               |
//! | `WATCH_SIM_KEYS`       | Comma-separated keys pressed one per tick       | none               |

use std::env;
use std::path::PathBuf;

use thiserror_no_std::Error;
use watch_sdk::ButtonType;

pub const ENV_ROOT: &str = "WATCH_SIM_ROOT";
pub const ENV_TICK_MS: &str = "WATCH_SIM_TICK_MS";
pub const ENV_TICKS: &str = "WATCH_SIM_TICKS";
pub const ENV_SCREENSHOT: &str = "WATCH_SIM_SCREENSHOT";
pub const ENV_KEYS: &str = "WATCH_SIM_KEYS";

const DEFAULT_TICKS: u32 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: '{value}' is not a number")]
    NotANumber { var: &'static str, value: String },

    #[error("WATCH_SIM_KEYS: unknown key '{0}'")]
    UnknownKey(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    pub root: PathBuf,
    /// Overrides the app's update interval when set.
    pub tick_ms: Option<u32>,
    pub ticks: u32,
    pub screenshot: Option<PathBuf>,
    pub keys: Vec<ButtonType>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            root: env::temp_dir().join("watch-sim"),
            tick_ms: None,
            ticks: DEFAULT_TICKS,
            screenshot: None,
            keys: Vec::new(),
        }
    }
}

impl SimConfig {
    /// Read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Build from any variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(root) = lookup(ENV_ROOT).filter(|s| !s.is_empty()) {
            config.root = PathBuf::from(root);
        }
        if let Some(value) = lookup(ENV_TICK_MS) {
            let ms = number(ENV_TICK_MS, &value)?;
            config.tick_ms = (ms > 0).then_some(ms);
        }
        if let Some(value) = lookup(ENV_TICKS) {
            config.ticks = number(ENV_TICKS, &value)?;
        }
        config.screenshot = lookup(ENV_SCREENSHOT)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);
        if let Some(keys) = lookup(ENV_KEYS) {
            config.keys = parse_keys(&keys)?;
        }

        Ok(config)
    }
}

fn number(var: &'static str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::NotANumber {
        var,
        value: value.to_owned(),
    })
}

/// Parse `up,down,center,back` style key lists.
pub fn parse_keys(list: &str) -> Result<Vec<ButtonType>, ConfigError> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|name| key_by_name(name).ok_or_else(|| ConfigError::UnknownKey(name.to_owned())))
        .collect()
}

fn key_by_name(name: &str) -> Option<ButtonType> {
    let key = match name.to_ascii_lowercase().as_str() {
        "center" => ButtonType::Center,
        "up" => ButtonType::Up,
        "down" => ButtonType::Down,
        "center-up" => ButtonType::CenterUp,
        "up-center" => ButtonType::UpCenter,
        "center-down" => ButtonType::CenterDown,
        "down-center" => ButtonType::DownCenter,
        "up-down" => ButtonType::UpDown,
        "down-up" => ButtonType::DownUp,
        "back" => ButtonType::Back,
        _ => return None,
    };
    Some(key)
}
