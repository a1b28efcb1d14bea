use crate::error::{QuickTextError, Result};
use enigo::{Direction, Enigo, Key as EnigoKey, Keyboard, Settings};
use rdev::{EventType, Key as RdevKey};
use std::thread;
use std::time::Duration;

/// Non-character keys the engine distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKey {
    Space,
    Enter,
    Tab,
    Backspace,
    CtrlLeft,
    CtrlRight,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Control(ControlKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyPhase {
    Press,
    Release,
}

/// One physical key transition, classified at the hook boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub key: Key,
    pub phase: KeyPhase,
}

impl KeyEvent {
    pub fn press(key: Key) -> Self {
        Self {
            key,
            phase: KeyPhase::Press,
        }
    }

    pub fn release(key: Key) -> Self {
        Self {
            key,
            phase: KeyPhase::Release,
        }
    }

    /// Space, Enter or Tab.
    pub fn is_delimiter(&self) -> bool {
        matches!(
            self.key,
            Key::Control(ControlKey::Space | ControlKey::Enter | ControlKey::Tab)
        )
    }

    pub fn is_ctrl(&self) -> bool {
        matches!(
            self.key,
            Key::Control(ControlKey::CtrlLeft | ControlKey::CtrlRight)
        )
    }
}

/// Classify a raw hook event. Mouse and wheel events yield `None`.
pub fn classify_rdev_event(event: &rdev::Event) -> Option<KeyEvent> {
    let (raw, phase) = match event.event_type {
        EventType::KeyPress(key) => (key, KeyPhase::Press),
        EventType::KeyRelease(key) => (key, KeyPhase::Release),
        _ => return None,
    };

    let key = match raw {
        RdevKey::Space => Key::Control(ControlKey::Space),
        RdevKey::Return | RdevKey::KpReturn => Key::Control(ControlKey::Enter),
        RdevKey::Tab => Key::Control(ControlKey::Tab),
        RdevKey::Backspace => Key::Control(ControlKey::Backspace),
        RdevKey::ControlLeft => Key::Control(ControlKey::CtrlLeft),
        RdevKey::ControlRight => Key::Control(ControlKey::CtrlRight),
        _ => match char_from_name(event.name.as_deref()) {
            Some(c) => Key::Char(c),
            None => {
                log::trace!("No character for {:?}", raw);
                Key::Control(ControlKey::Other)
            }
        },
    };

    Some(KeyEvent { key, phase })
}

/// The printable character a key event produced, if exactly one.
///
/// Chords such as Ctrl+A report control characters as their name; those are not text.
pub fn char_from_name(name: Option<&str>) -> Option<char> {
    let name = name?;
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if !c.is_control() && !c.is_whitespace() => Some(c),
        _ => None,
    }
}

/// Create a keyboard controller
pub fn create_keyboard_controller() -> Result<Enigo> {
    let settings = Settings::default();
    Enigo::new(&settings).map_err(|err| {
        QuickTextError::Enigo(format!("Failed to create keyboard controller: {}", err))
    })
}

/// Send `count` backspace clicks, pausing `delay` after each one.
pub fn send_backspace(keyboard: &mut impl Keyboard, count: usize, delay: Duration) -> Result<()> {
    for _ in 0..count {
        keyboard
            .key(EnigoKey::Backspace, Direction::Click)
            .map_err(|err| QuickTextError::Enigo(format!("Failed to send backspace: {}", err)))?;
        thread::sleep(delay);
    }
    Ok(())
}

#[cfg(target_os = "macos")]
const PASTE_MODIFIER: EnigoKey = EnigoKey::Meta;
#[cfg(not(target_os = "macos"))]
const PASTE_MODIFIER: EnigoKey = EnigoKey::Control;

/// Send the platform paste chord, holding the paste key for `hold` before releasing.
pub fn send_paste_chord(keyboard: &mut impl Keyboard, hold: Duration) -> Result<()> {
    let chord_err =
        |err: enigo::InputError| QuickTextError::Enigo(format!("Failed to send paste chord: {}", err));

    keyboard
        .key(PASTE_MODIFIER, Direction::Press)
        .map_err(chord_err)?;

    let pressed = keyboard
        .key(EnigoKey::Unicode('v'), Direction::Press)
        .map_err(chord_err);
    if pressed.is_ok() {
        thread::sleep(hold);
    }
    let released = keyboard
        .key(EnigoKey::Unicode('v'), Direction::Release)
        .map_err(chord_err);

    // Always let go of the modifier, even if the key itself failed.
    keyboard
        .key(PASTE_MODIFIER, Direction::Release)
        .map_err(chord_err)?;

    pressed.and(released)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn raw(event_type: EventType, name: Option<&str>) -> rdev::Event {
        rdev::Event {
            time: SystemTime::now(),
            name: name.map(str::to_string),
            event_type,
        }
    }

    #[test]
    fn classifies_delimiters_and_backspace() {
        let space = classify_rdev_event(&raw(EventType::KeyPress(RdevKey::Space), Some(" ")));
        assert_eq!(space, Some(KeyEvent::press(Key::Control(ControlKey::Space))));

        let enter = classify_rdev_event(&raw(EventType::KeyPress(RdevKey::KpReturn), None));
        assert!(enter.unwrap().is_delimiter());

        let back = classify_rdev_event(&raw(EventType::KeyRelease(RdevKey::Backspace), None));
        assert_eq!(
            back,
            Some(KeyEvent::release(Key::Control(ControlKey::Backspace)))
        );
    }

    #[test]
    fn classifies_characters_from_event_name() {
        let event = classify_rdev_event(&raw(EventType::KeyPress(RdevKey::KeyT), Some("T")));
        assert_eq!(event, Some(KeyEvent::press(Key::Char('T'))));

        let accented = classify_rdev_event(&raw(EventType::KeyPress(RdevKey::KeyE), Some("é")));
        assert_eq!(accented, Some(KeyEvent::press(Key::Char('é'))));
    }

    #[test]
    fn unnamed_and_control_character_keys_are_other() {
        let shift = classify_rdev_event(&raw(EventType::KeyPress(RdevKey::ShiftLeft), None));
        assert_eq!(shift, Some(KeyEvent::press(Key::Control(ControlKey::Other))));

        let ctrl_a = classify_rdev_event(&raw(EventType::KeyPress(RdevKey::KeyA), Some("\u{1}")));
        assert_eq!(ctrl_a, Some(KeyEvent::press(Key::Control(ControlKey::Other))));
    }

    #[test]
    fn control_keys_are_tracked_on_both_sides() {
        let left = classify_rdev_event(&raw(EventType::KeyPress(RdevKey::ControlLeft), None));
        let right = classify_rdev_event(&raw(EventType::KeyRelease(RdevKey::ControlRight), None));
        assert!(left.unwrap().is_ctrl());
        assert!(right.unwrap().is_ctrl());
    }

    #[test]
    fn mouse_events_are_not_key_events() {
        let event = raw(EventType::MouseMove { x: 1.0, y: 2.0 }, None);
        assert!(classify_rdev_event(&event).is_none());
    }
}
