use crate::error::{QuickTextError, Result};
use crate::models::Mode;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const HOME_ENV_VAR: &str = "QUICKTEXT_HOME";
pub const PID_FILENAME: &str = "quicktext-daemon.pid";
pub const DB_FILENAME: &str = "shortcuts.json";
pub const SETTINGS_FILENAME: &str = "settings.json";
pub const DAEMON_LOG_FILENAME: &str = "daemon_log.txt";

/// Gap between two key presses after which the typing buffer starts over.
pub const IDLE_RESET: Duration = Duration::from_secs(2);

/// Get the quicktext configuration directory
pub fn get_config_dir() -> PathBuf {
    if let Ok(dir) = env::var(HOME_ENV_VAR) {
        return PathBuf::from(dir);
    }
    env::var("HOME")
        .map(|home| PathBuf::from(home).join(".quicktext"))
        .unwrap_or_else(|_| PathBuf::from(".quicktext"))
}

/// Ensure the configuration directory exists
pub fn ensure_config_dir() -> Result<PathBuf> {
    let config_dir = get_config_dir();
    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
        log::info!("Created config directory at {}", config_dir.display());
    }
    Ok(config_dir)
}

/// Get the path to the PID file
pub fn get_pid_file_path() -> PathBuf {
    get_config_dir().join(PID_FILENAME)
}

/// Get the path to the shortcut database
pub fn get_db_file_path() -> PathBuf {
    get_config_dir().join(DB_FILENAME)
}

pub fn get_settings_file_path() -> PathBuf {
    get_config_dir().join(SETTINGS_FILENAME)
}

pub fn get_daemon_log_path() -> PathBuf {
    get_config_dir().join(DAEMON_LOG_FILENAME)
}

/// Check if daemon is running
pub fn is_daemon_running() -> Result<Option<u32>> {
    let pid_file = get_pid_file_path();

    if pid_file.exists() {
        match fs::read_to_string(&pid_file) {
            Ok(contents) => {
                match contents.trim().parse::<u32>() {
                    Ok(pid) => Ok(Some(pid)),
                    Err(_) => {
                        // Invalid PID, treat as not running and clean up
                        let _ = fs::remove_file(&pid_file);
                        Ok(None)
                    }
                }
            }
            Err(_) => {
                let _ = fs::remove_file(&pid_file);
                Ok(None)
            }
        }
    } else {
        Ok(None)
    }
}

/// Delays used while replaying an expansion into the focused application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayTiming {
    pub backspace_delay_ms: u64,
    pub clipboard_settle_ms: u64,
    pub paste_hold_ms: u64,
}

impl Default for ReplayTiming {
    fn default() -> Self {
        Self {
            backspace_delay_ms: 10,
            clipboard_settle_ms: 50,
            paste_hold_ms: 50,
        }
    }
}

impl ReplayTiming {
    pub fn backspace_delay(&self) -> Duration {
        Duration::from_millis(self.backspace_delay_ms)
    }

    pub fn clipboard_settle(&self) -> Duration {
        Duration::from_millis(self.clipboard_settle_ms)
    }

    pub fn paste_hold(&self) -> Duration {
        Duration::from_millis(self.paste_hold_ms)
    }
}

/// User settings persisted next to the shortcut database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub mode: Mode,
    pub timing: ReplayTiming,
}

impl Settings {
    /// Load settings from `path`, falling back to defaults when the file is missing or empty.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_json::from_str(&content).map_err(|e| {
            QuickTextError::InvalidConfig(format!("{}: {}", path.display(), e))
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let serialized = serde_json::to_string_pretty(self)?;
        fs::write(path, serialized)?;
        Ok(())
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&get_settings_file_path())
    }

    pub fn save(&self) -> Result<()> {
        ensure_config_dir()?;
        self.save_to(&get_settings_file_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_settings_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("settings.json")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.mode, Mode::Hotkey);
        assert_eq!(settings.timing.backspace_delay(), Duration::from_millis(10));
    }

    #[test]
    fn settings_round_trip_through_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            mode: Mode::AutoExpand,
            timing: ReplayTiming {
                backspace_delay_ms: 5,
                ..ReplayTiming::default()
            },
        };
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn partial_settings_keep_default_timing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"mode":"auto"}"#).unwrap();
        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.mode, Mode::AutoExpand);
        assert_eq!(settings.timing, ReplayTiming::default());
    }

    #[test]
    fn malformed_settings_are_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            Settings::load_from(&path),
            Err(QuickTextError::InvalidConfig(_))
        ));
    }
}
