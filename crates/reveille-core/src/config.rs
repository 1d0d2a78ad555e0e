//! TOML-based application configuration.
//!
//! Stored at `<data dir>/config.toml`. Every field has a default so a
//! missing or partial file is fine; a file that does not parse is logged and
//! replaced by the defaults rather than stopping the clock.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;

/// Returns the data directory, `~/.config/reveille[-dev]/`.
///
/// `REVEILLE_DATA_DIR` overrides the location outright (tests use this);
/// otherwise `REVEILLE_ENV=dev` switches to the development directory.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = if let Ok(explicit) = std::env::var("REVEILLE_DATA_DIR") {
        PathBuf::from(explicit)
    } else {
        let base = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config");
        let env = std::env::var("REVEILLE_ENV").unwrap_or_else(|_| "production".to_string());
        if env == "dev" {
            base.join("reveille-dev")
        } else {
            base.join("reveille")
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDirFailed {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Minutes an alarm stays quiet after snooze.
    #[serde(default = "default_snooze_minutes")]
    pub snooze_minutes: u32,
    /// Seconds between trigger-engine polls.
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,
    /// Minutes a ringing alarm is allowed to ring before auto-dismissal.
    #[serde(default = "default_timeout_minutes")]
    pub timeout_minutes: u32,
    /// Sound directory; relative paths live under the data directory.
    #[serde(default = "default_sounds_dir")]
    pub sounds_dir: String,
    /// Sound used when an alarm does not name one.
    #[serde(default = "default_sound")]
    pub default_sound: String,
    /// Playback volume, 0..=100.
    #[serde(default = "default_volume")]
    pub volume: u32,
}

fn default_snooze_minutes() -> u32 {
    9
}
fn default_check_interval_secs() -> u64 {
    30
}
fn default_timeout_minutes() -> u32 {
    5
}
fn default_sounds_dir() -> String {
    "sounds".to_string()
}
fn default_sound() -> String {
    "default.mp3".to_string()
}
fn default_volume() -> u32 {
    80
}

impl Default for Config {
    fn default() -> Self {
        Self {
            snooze_minutes: default_snooze_minutes(),
            check_interval_secs: default_check_interval_secs(),
            timeout_minutes: default_timeout_minutes(),
            sounds_dir: default_sounds_dir(),
            default_sound: default_sound(),
            volume: default_volume(),
        }
    }
}

impl Config {
    /// Load from the data directory; any failure falls back to defaults.
    pub fn load() -> Self {
        match data_dir() {
            Ok(dir) => Self::load_from(&dir.join("config.toml")),
            Err(e) => {
                warn!("no data directory, using default configuration: {e}");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(raw) => match toml::from_str(&raw) {
                Ok(config) => config,
                Err(e) => {
                    warn!("could not parse {}, using defaults: {e}", path.display());
                    Self::default()
                }
            },
            Err(e) => {
                warn!("could not read {}, using defaults: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let dir = data_dir()?;
        self.save_to(&dir.join("config.toml"))
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let raw = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path, raw).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Snooze duration is kept inside 1..=30 minutes.
    pub fn set_snooze_minutes(&mut self, minutes: u32) {
        self.snooze_minutes = minutes.clamp(1, 30);
    }

    /// Volume is kept inside 0..=100.
    pub fn set_volume(&mut self, volume: u32) {
        self.volume = volume.min(100);
    }

    /// Absolute sounds directory, resolved against the data directory when
    /// configured relative.
    pub fn sounds_path(&self, data_dir: &Path) -> PathBuf {
        let p = PathBuf::from(&self.sounds_dir);
        if p.is_absolute() {
            p
        } else {
            data_dir.join(p)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.snooze_minutes, 9);
        assert_eq!(config.check_interval_secs, 30);
        assert_eq!(config.timeout_minutes, 5);
        assert_eq!(config.default_sound, "default.mp3");
        assert_eq!(config.volume, 80);
    }

    #[test]
    fn setters_clamp_to_documented_ranges() {
        let mut config = Config::default();
        config.set_snooze_minutes(0);
        assert_eq!(config.snooze_minutes, 1);
        config.set_snooze_minutes(99);
        assert_eq!(config.snooze_minutes, 30);
        config.set_volume(250);
        assert_eq!(config.volume, 100);
    }

    #[test]
    fn toml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.set_snooze_minutes(12);
        config.default_sound = "gong.mp3".into();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path);
        assert_eq!(loaded.snooze_minutes, 12);
        assert_eq!(loaded.default_sound, "gong.mp3");
        assert_eq!(loaded.check_interval_secs, 30);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "snooze_minutes = 5\n").unwrap();

        let loaded = Config::load_from(&path);
        assert_eq!(loaded.snooze_minutes, 5);
        assert_eq!(loaded.timeout_minutes, 5);
        assert_eq!(loaded.sounds_dir, "sounds");
    }

    #[test]
    fn missing_or_bad_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = Config::load_from(&dir.path().join("nope.toml"));
        assert_eq!(missing.snooze_minutes, 9);

        let path = dir.path().join("config.toml");
        std::fs::write(&path, "not = [valid").unwrap();
        let bad = Config::load_from(&path);
        assert_eq!(bad.snooze_minutes, 9);
    }

    #[test]
    fn sounds_path_resolution() {
        let config = Config::default();
        let data = Path::new("/data");
        assert_eq!(config.sounds_path(data), PathBuf::from("/data/sounds"));

        let mut abs = Config::default();
        abs.sounds_dir = "/srv/sounds".into();
        assert_eq!(abs.sounds_path(data), PathBuf::from("/srv/sounds"));
    }
}
