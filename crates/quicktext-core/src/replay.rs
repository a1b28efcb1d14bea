use crate::clipboard::{open_clipboard, set_clipboard_text};
use crate::config::ReplayTiming;
use crate::error::Result;
use crate::keyboard::{create_keyboard_controller, send_backspace, send_paste_chord};
use arboard::Clipboard;
use enigo::Enigo;
use std::thread;

/// Synthetic edits performed on the focused application during an expansion.
pub trait Replayer {
    /// Remove `count` characters before the cursor.
    fn erase(&mut self, count: usize) -> Result<()>;

    /// Insert `text` at the cursor.
    fn paste(&mut self, text: &str) -> Result<()>;
}

/// Replays expansions with real keystrokes (enigo) and the system clipboard (arboard).
///
/// The keyboard controller and clipboard handle are opened on first use so the
/// replayer can be built on any thread and used on the listener thread.
pub struct SystemReplayer {
    timing: ReplayTiming,
    keyboard: Option<Enigo>,
    clipboard: Option<Clipboard>,
}

impl SystemReplayer {
    pub fn new(timing: ReplayTiming) -> Self {
        Self {
            timing,
            keyboard: None,
            clipboard: None,
        }
    }

    fn keyboard(&mut self) -> Result<&mut Enigo> {
        let keyboard = match self.keyboard.take() {
            Some(keyboard) => keyboard,
            None => create_keyboard_controller()?,
        };
        Ok(self.keyboard.insert(keyboard))
    }

    fn clipboard(&mut self) -> Result<&mut Clipboard> {
        let clipboard = match self.clipboard.take() {
            Some(clipboard) => clipboard,
            None => open_clipboard()?,
        };
        Ok(self.clipboard.insert(clipboard))
    }
}

impl Replayer for SystemReplayer {
    fn erase(&mut self, count: usize) -> Result<()> {
        let delay = self.timing.backspace_delay();
        let keyboard = self.keyboard()?;
        send_backspace(keyboard, count, delay)
    }

    fn paste(&mut self, text: &str) -> Result<()> {
        set_clipboard_text(self.clipboard()?, text)?;
        thread::sleep(self.timing.clipboard_settle());

        let hold = self.timing.paste_hold();
        let keyboard = self.keyboard()?;
        send_paste_chord(keyboard, hold)
    }
}
