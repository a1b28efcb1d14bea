pub mod clipboard;
pub mod config;
pub mod engine;
pub mod error;
pub mod keyboard;
pub mod mode;
pub mod models;
pub mod replay;
pub mod snapshot;
pub mod storage;

// Re-export common items for convenience
pub use config::{get_config_dir, is_daemon_running, ReplayTiming, Settings};
pub use engine::{Decision, ExpansionEngine, ExpansionEvent};
pub use error::{QuickTextError, Result};
pub use keyboard::{classify_rdev_event, ControlKey, Key, KeyEvent, KeyPhase};
pub use mode::ModeController;
pub use models::{Mode, ShortcutEntry};
pub use replay::{Replayer, SystemReplayer};
pub use snapshot::{ShortcutSnapshot, SnapshotHandle};
pub use storage::{ShortcutStore, UsageStatistics};
