use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuickTextError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Keyboard controller error: {0}")]
    Enigo(String),

    #[error("Keyboard hook error: {0}")]
    Hook(String),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("Shortcut '{0}' already exists")]
    DuplicateKeyword(String),

    #[error("Shortcut '{0}' not found")]
    ShortcutNotFound(String),

    #[error("Invalid keyword '{0}': keywords must be non-empty and contain no whitespace")]
    InvalidKeyword(String),

    #[error("Monitoring is running; stop it before changing the mode")]
    MonitorRunning,

    #[error("Monitoring is not running")]
    MonitorStopped,

    #[error("Daemon already running with PID {0}")]
    DaemonAlreadyRunning(u32),

    #[error("Daemon is not running")]
    DaemonNotRunning,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, QuickTextError>;
