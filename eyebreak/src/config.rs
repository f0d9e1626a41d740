use anyhow::{Context, Result};
use log::{error, warn};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::sound::SoundRef;

pub const DEFAULT_WORK_INTERVAL_SECS: u64 = 20 * 60;
pub const DEFAULT_BREAK_INTERVAL_SECS: u64 = 20;
pub const DEFAULT_REMIND_EARLY_INTERVAL_SECS: u64 = 5 * 60;
/// Relative paths are resolved against the working directory.
pub const DEFAULT_SOUND_FILE_PATH: &str = "sounds/default_notification.wav";

/// Root configuration structure. Deserialized from `config.toml`.
///
/// Section and key names are upper-case to stay compatible with existing
/// `[Intervals]` / `[Sound]` config files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default, rename = "Intervals")]
    pub intervals: IntervalsConfig,
    #[serde(default, rename = "Sound")]
    pub sound: SoundConfig,
}

/// Raw `[Intervals]` section. All values are in seconds.
#[derive(Debug, Deserialize)]
pub struct IntervalsConfig {
    #[serde(rename = "WORK_INTERVAL", default = "default_work_interval")]
    pub work_interval_secs: u64,
    #[serde(rename = "BREAK_INTERVAL", default = "default_break_interval")]
    pub break_interval_secs: u64,
    #[serde(rename = "REMIND_EARLY_INTERVAL", default = "default_remind_early_interval")]
    pub remind_early_interval_secs: u64,
}

impl Default for IntervalsConfig {
    fn default() -> Self {
        Self {
            work_interval_secs: DEFAULT_WORK_INTERVAL_SECS,
            break_interval_secs: DEFAULT_BREAK_INTERVAL_SECS,
            remind_early_interval_secs: DEFAULT_REMIND_EARLY_INTERVAL_SECS,
        }
    }
}

/// Raw `[Sound]` section.
///
/// A tone (`FREQUENCY` + `DURATION`) takes precedence over `SOUND_FILE_PATH`
/// when both halves of the pair are present.
#[derive(Debug, Deserialize)]
pub struct SoundConfig {
    #[serde(rename = "SOUND_FILE_PATH", default = "default_sound_file_path")]
    pub file_path: String,
    /// Tone pitch in hertz.
    #[serde(rename = "FREQUENCY")]
    pub frequency_hz: Option<u32>,
    /// Tone length in milliseconds.
    #[serde(rename = "DURATION")]
    pub duration_ms: Option<u32>,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            file_path: DEFAULT_SOUND_FILE_PATH.to_string(),
            frequency_hz: None,
            duration_ms: None,
        }
    }
}

/// Validated scheduling durations, in whole seconds. Every field is positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Intervals {
    pub work_secs: u64,
    pub break_secs: u64,
    pub remind_early_secs: u64,
}

impl Default for Intervals {
    fn default() -> Self {
        Self {
            work_secs: DEFAULT_WORK_INTERVAL_SECS,
            break_secs: DEFAULT_BREAK_INTERVAL_SECS,
            remind_early_secs: DEFAULT_REMIND_EARLY_INTERVAL_SECS,
        }
    }
}

impl Intervals {
    pub fn work(&self) -> Duration {
        Duration::from_secs(self.work_secs)
    }

    pub fn break_duration(&self) -> Duration {
        Duration::from_secs(self.break_secs)
    }

    pub fn remind_early(&self) -> Duration {
        Duration::from_secs(self.remind_early_secs)
    }

    /// Whole minutes shown on the "remind me later" button (truncating).
    pub fn remind_early_minutes(&self) -> u64 {
        self.remind_early_secs / 60
    }
}

/// Immutable configuration the rest of the application runs with.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleConfig {
    pub intervals: Intervals,
    pub sound: SoundRef,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Config::default().schedule()
    }
}

impl Config {
    /// Converts the raw file sections into a [`ScheduleConfig`].
    ///
    /// Zero durations are not meaningful; each one is logged and replaced by
    /// its default so a single bad key never discards the rest of the file.
    pub fn schedule(&self) -> ScheduleConfig {
        let raw = &self.intervals;
        let intervals = Intervals {
            work_secs: positive_or_default(
                "WORK_INTERVAL",
                raw.work_interval_secs,
                DEFAULT_WORK_INTERVAL_SECS,
            ),
            break_secs: positive_or_default(
                "BREAK_INTERVAL",
                raw.break_interval_secs,
                DEFAULT_BREAK_INTERVAL_SECS,
            ),
            remind_early_secs: positive_or_default(
                "REMIND_EARLY_INTERVAL",
                raw.remind_early_interval_secs,
                DEFAULT_REMIND_EARLY_INTERVAL_SECS,
            ),
        };

        let sound = match (self.sound.frequency_hz, self.sound.duration_ms) {
            (Some(frequency_hz), Some(duration_ms)) => SoundRef::Tone {
                frequency_hz,
                duration_ms,
            },
            (Some(_), None) | (None, Some(_)) => {
                warn!("[config] FREQUENCY and DURATION must be set together; using SOUND_FILE_PATH");
                SoundRef::File(PathBuf::from(&self.sound.file_path))
            }
            (None, None) => SoundRef::File(PathBuf::from(&self.sound.file_path)),
        };

        ScheduleConfig { intervals, sound }
    }
}

/// Loads the config file at `path`, returning `Config::default()` if the file does not exist.
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Loads and validates the config file at `path`.
/// A file that cannot be read or parsed is logged and replaced by the defaults.
pub fn load_schedule(path: &Path) -> ScheduleConfig {
    match load_or_default(path) {
        Ok(config) => config.schedule(),
        Err(e) => {
            error!("[config] Error (using defaults): {e:#}");
            ScheduleConfig::default()
        }
    }
}

fn positive_or_default(key: &str, value: u64, default: u64) -> u64 {
    if value == 0 {
        warn!("[config] {key} must be a positive number of seconds; using {default}");
        default
    } else {
        value
    }
}

fn default_work_interval() -> u64 {
    DEFAULT_WORK_INTERVAL_SECS
}

fn default_break_interval() -> u64 {
    DEFAULT_BREAK_INTERVAL_SECS
}

fn default_remind_early_interval() -> u64 {
    DEFAULT_REMIND_EARLY_INTERVAL_SECS
}

fn default_sound_file_path() -> String {
    DEFAULT_SOUND_FILE_PATH.to_string()
}
