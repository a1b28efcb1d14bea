use crate::error::{QuickTextError, Result};
use crate::models::Mode;

/// Holds the active mode and refuses to change it while monitoring runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModeController {
    mode: Mode,
    running: bool,
}

impl ModeController {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            running: false,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_mode(&mut self, mode: Mode) -> Result<()> {
        if self.running {
            return Err(QuickTextError::MonitorRunning);
        }
        self.mode = mode;
        Ok(())
    }

    pub fn mark_running(&mut self, running: bool) {
        self.running = running;
    }
}
