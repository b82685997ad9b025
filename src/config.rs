//! Persisted daemon settings. The file lives at `<app_dir>/config.json`, keys that are missing
//! take their defaults and unknown keys are ignored, so older and newer files keep working.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use serde_json::error::Category;
use thiserror::Error;
use tracing::{debug, warn};

pub const CONFIG_FILE_NAME: &str = "config.json";

pub const DEFAULT_INTERVAL_SECONDS: u64 = 300;
pub const MIN_INTERVAL_SECONDS: u64 = 10;
pub const DEFAULT_RETENTION_DAYS: u32 = 30;
pub const DEFAULT_OCR_LANGUAGES: &str = "eng";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("capture interval must be at least {min} seconds, got {0}", min = MIN_INTERVAL_SECONDS)]
    IntervalTooShort(u64),
    #[error("retention must keep at least 1 day of records, got {0}")]
    RetentionTooShort(u32),
    #[error("text recognition needs at least one language")]
    NoLanguages,
    #[error("configuration file {path:?} holds an invalid value: {message}")]
    InvalidValue { path: PathBuf, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Seconds between two captures.
    pub interval: u64,
    /// Day files older than this are removed on startup.
    pub retention_days: u32,
    /// Languages passed to the text recognizer, `+` separated (`eng+jpn`).
    pub ocr_languages: String,
    /// Capture only the focused window instead of the whole screen.
    pub capture_window: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL_SECONDS,
            retention_days: DEFAULT_RETENTION_DAYS,
            ocr_languages: DEFAULT_OCR_LANGUAGES.into(),
            capture_window: false,
        }
    }
}

/// Values given on the command line. They win over whatever is stored on disk.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub interval: Option<u64>,
    pub retention_days: Option<u32>,
    pub ocr_languages: Option<String>,
    pub capture_window: Option<bool>,
}

impl SettingsOverrides {
    pub fn is_empty(&self) -> bool {
        self.interval.is_none()
            && self.retention_days.is_none()
            && self.ocr_languages.is_none()
            && self.capture_window.is_none()
    }
}

impl Settings {
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.interval < MIN_INTERVAL_SECONDS {
            return Err(ConfigError::IntervalTooShort(self.interval));
        }
        if self.retention_days < 1 {
            return Err(ConfigError::RetentionTooShort(self.retention_days));
        }
        if self.ocr_languages.trim().is_empty() {
            return Err(ConfigError::NoLanguages);
        }
        Ok(self)
    }

    pub fn with_overrides(self, overrides: SettingsOverrides) -> Self {
        Self {
            interval: overrides.interval.unwrap_or(self.interval),
            retention_days: overrides.retention_days.unwrap_or(self.retention_days),
            ocr_languages: overrides.ocr_languages.unwrap_or(self.ocr_languages),
            capture_window: overrides.capture_window.unwrap_or(self.capture_window),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }
}

pub fn config_path(app_dir: &Path) -> PathBuf {
    app_dir.join(CONFIG_FILE_NAME)
}

/// Reads stored settings. A missing file means defaults; a file that can't be read or isn't JSON
/// at all is reported and also falls back to defaults. Well-formed JSON with a value of the wrong
/// type (a negative interval, a string for retention) is an error, so user choices are never
/// silently replaced.
pub fn load_settings(app_dir: &Path) -> Result<Settings, ConfigError> {
    let path = config_path(app_dir);
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No config at {path:?}, using defaults");
            return Ok(Settings::default());
        }
        Err(e) => {
            warn!("Could not read config file {path:?}: {e}");
            return Ok(Settings::default());
        }
    };

    match serde_json::from_str::<Settings>(&content) {
        Ok(settings) => Ok(settings),
        Err(e) if e.classify() == Category::Data => Err(ConfigError::InvalidValue {
            path,
            message: e.to_string(),
        }),
        Err(e) => {
            warn!("Could not parse config file {path:?}: {e}");
            Ok(Settings::default())
        }
    }
}

/// Loads stored settings, applies command line values on top and validates the result. This is
/// the only place where startup can fail on configuration.
pub fn resolve_settings(
    app_dir: &Path,
    overrides: SettingsOverrides,
) -> Result<Settings, ConfigError> {
    load_settings(app_dir)?.with_overrides(overrides).validate()
}

pub fn save_settings(app_dir: &Path, settings: &Settings) -> anyhow::Result<()> {
    std::fs::create_dir_all(app_dir)?;
    let content = serde_json::to_string_pretty(settings)?;
    std::fs::write(config_path(app_dir), content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use super::{
        config_path, load_settings, resolve_settings, save_settings, ConfigError, Settings,
        SettingsOverrides, DEFAULT_RETENTION_DAYS,
    };

    #[test]
    fn test_missing_file_gives_defaults() -> Result<()> {
        let dir = tempdir()?;
        assert_eq!(load_settings(dir.path())?, Settings::default());
        Ok(())
    }

    #[test]
    fn test_partial_file_is_merged_with_defaults() -> Result<()> {
        let dir = tempdir()?;
        std::fs::write(
            config_path(dir.path()),
            r#"{ "interval": 60, "something_else": true }"#,
        )?;

        let settings = load_settings(dir.path())?;
        assert_eq!(settings.interval, 60);
        assert_eq!(settings.retention_days, DEFAULT_RETENTION_DAYS);
        assert!(!settings.capture_window);
        Ok(())
    }

    #[test]
    fn test_malformed_file_gives_defaults() -> Result<()> {
        let dir = tempdir()?;
        std::fs::write(config_path(dir.path()), "{ interval: ")?;
        assert_eq!(load_settings(dir.path())?, Settings::default());
        Ok(())
    }

    #[test]
    fn test_wrong_value_type_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        std::fs::write(
            config_path(dir.path()),
            r#"{ "interval": -5, "retention_days": 60 }"#,
        )?;

        let error = resolve_settings(dir.path(), SettingsOverrides::default()).unwrap_err();
        assert!(matches!(error, ConfigError::InvalidValue { .. }));
        assert!(load_settings(dir.path()).is_err());

        // A truncated file is not JSON at all and still gives defaults.
        std::fs::write(config_path(dir.path()), r#"{ "retention_days": 6"#)?;
        assert_eq!(
            resolve_settings(dir.path(), SettingsOverrides::default())?,
            Settings::default()
        );
        Ok(())
    }

    #[test]
    fn test_overrides_win_and_are_validated() -> Result<()> {
        let dir = tempdir()?;
        save_settings(
            dir.path(),
            &Settings {
                interval: 120,
                ..Settings::default()
            },
        )?;

        let settings = resolve_settings(
            dir.path(),
            SettingsOverrides {
                retention_days: Some(7),
                ..SettingsOverrides::default()
            },
        )?;
        assert_eq!(settings.interval, 120);
        assert_eq!(settings.retention_days, 7);

        let error = resolve_settings(
            dir.path(),
            SettingsOverrides {
                interval: Some(5),
                ..SettingsOverrides::default()
            },
        )
        .unwrap_err();
        assert_eq!(error, ConfigError::IntervalTooShort(5));
        Ok(())
    }

    #[test]
    fn test_validation() {
        let zero_retention = Settings {
            retention_days: 0,
            ..Settings::default()
        };
        assert_eq!(
            zero_retention.validate(),
            Err(ConfigError::RetentionTooShort(0))
        );

        let no_languages = Settings {
            ocr_languages: "  ".into(),
            ..Settings::default()
        };
        assert_eq!(no_languages.validate(), Err(ConfigError::NoLanguages));

        let floor = Settings {
            interval: 10,
            ..Settings::default()
        };
        assert!(floor.validate().is_ok());
    }
}
