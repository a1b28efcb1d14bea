use crate::error::{QuickTextError, Result};
use arboard::Clipboard;

/// Open a handle to the system clipboard
pub fn open_clipboard() -> Result<Clipboard> {
    Clipboard::new().map_err(|e| QuickTextError::Clipboard(e.to_string()))
}

/// Set the clipboard content as text
pub fn set_clipboard_text(clipboard: &mut Clipboard, text: &str) -> Result<()> {
    clipboard
        .set_text(text)
        .map_err(|e| QuickTextError::Clipboard(e.to_string()))
}
