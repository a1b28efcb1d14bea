//! The keystroke expansion engine.
//!
//! [`ExpansionEngine::handle`] is called once per key event on the listener
//! thread. It keeps the word currently being typed, decides whether that word is
//! a trigger for the active [`Mode`], replays the substitution through a
//! [`Replayer`] and tells the hook whether the event should reach the focused
//! application.

use crate::config::IDLE_RESET;
use crate::keyboard::{ControlKey, Key, KeyEvent, KeyPhase};
use crate::models::Mode;
use crate::replay::Replayer;
use crate::snapshot::SnapshotHandle;
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

/// Oldest characters are dropped once the buffer grows past this.
pub const MAX_BUFFER_LEN: usize = 256;

/// What the hook should do with the event that was just classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Forward,
    Suppress,
}

/// Sent after a keyword has been replaced by its phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionEvent {
    pub keyword: String,
    pub phrase: String,
}

/// Held state of both Control keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModifierState {
    pub ctrl_left: bool,
    pub ctrl_right: bool,
}

impl ModifierState {
    pub fn ctrl_held(&self) -> bool {
        self.ctrl_left || self.ctrl_right
    }

    fn apply(&mut self, event: &KeyEvent) {
        let held = event.phase == KeyPhase::Press;
        match event.key {
            Key::Control(ControlKey::CtrlLeft) => self.ctrl_left = held,
            Key::Control(ControlKey::CtrlRight) => self.ctrl_right = held,
            _ => {}
        }
    }
}

/// The word in progress.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypingBuffer {
    text: String,
}

impl TypingBuffer {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn push(&mut self, c: char) {
        self.text.push(c);
        if self.text.chars().count() > MAX_BUFFER_LEN {
            self.text.remove(0);
        }
    }

    pub fn pop(&mut self) {
        self.text.pop();
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    /// Last whitespace-delimited token.
    pub fn last_token(&self) -> Option<&str> {
        self.text.split_whitespace().last()
    }
}

/// Transient state owned by the listener thread while monitoring runs.
#[derive(Debug, Clone, Default)]
pub struct EngineState {
    pub buffer: TypingBuffer,
    pub modifiers: ModifierState,
    pub pending_expansion: bool,
    pub last_press: Option<Instant>,
}

struct Match {
    keyword: String,
    typed_len: usize,
    phrase: String,
}

pub struct ExpansionEngine<R: Replayer> {
    mode: Mode,
    state: EngineState,
    snapshots: SnapshotHandle,
    replayer: R,
    notifier: Sender<ExpansionEvent>,
    idle_reset: Duration,
}

impl<R: Replayer> ExpansionEngine<R> {
    pub fn new(
        mode: Mode,
        snapshots: SnapshotHandle,
        replayer: R,
        notifier: Sender<ExpansionEvent>,
    ) -> Self {
        Self {
            mode,
            state: EngineState::default(),
            snapshots,
            replayer,
            notifier,
            idle_reset: IDLE_RESET,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Discard all transient state and continue in `mode`.
    pub fn restart(&mut self, mode: Mode) {
        self.mode = mode;
        self.reset();
    }

    pub fn reset(&mut self) {
        self.state = EngineState::default();
    }

    /// Classify one key event received at `now`.
    pub fn handle(&mut self, event: KeyEvent, now: Instant) -> Decision {
        match event.phase {
            KeyPhase::Release => {
                self.state.modifiers.apply(&event);
                Decision::Forward
            }
            KeyPhase::Press => self.handle_press(event, now),
        }
    }

    fn handle_press(&mut self, event: KeyEvent, now: Instant) -> Decision {
        // The delimiter that follows an auto expansion is swallowed exactly once.
        if self.state.pending_expansion && event.is_delimiter() {
            self.state.pending_expansion = false;
            log::debug!("Suppressed delimiter after expansion: {:?}", event.key);
            return Decision::Suppress;
        }

        if let Some(last) = self.state.last_press {
            if now.saturating_duration_since(last) > self.idle_reset {
                self.state.buffer.clear();
            }
        }
        self.state.last_press = Some(now);

        if event.is_ctrl() {
            self.state.modifiers.apply(&event);
            return Decision::Forward;
        }

        match self.mode {
            Mode::Hotkey => self.handle_hotkey(event),
            Mode::AutoExpand => self.handle_auto(event),
        }
    }

    fn handle_hotkey(&mut self, event: KeyEvent) -> Decision {
        match event.key {
            Key::Control(ControlKey::Space) if self.state.modifiers.ctrl_held() => {
                if let Some(found) = self.find_match() {
                    self.expand(found);
                }
            }
            Key::Char(c) => self.state.buffer.push(c),
            Key::Control(ControlKey::Space) => self.state.buffer.push(' '),
            Key::Control(ControlKey::Backspace) => self.state.buffer.pop(),
            Key::Control(_) => {}
        }
        Decision::Forward
    }

    fn handle_auto(&mut self, event: KeyEvent) -> Decision {
        match event.key {
            Key::Char(c) => self.state.buffer.push(c),
            Key::Control(ControlKey::Space | ControlKey::Enter | ControlKey::Tab) => {
                if let Some(found) = self.find_match() {
                    self.state.pending_expansion = true;
                    if self.expand(found) {
                        return Decision::Suppress;
                    }
                    self.state.pending_expansion = false;
                }
                self.state.buffer.clear();
            }
            Key::Control(ControlKey::Backspace) => self.state.buffer.pop(),
            Key::Control(_) => {}
        }
        Decision::Forward
    }

    /// Look the last typed token up in the current snapshot.
    fn find_match(&self) -> Option<Match> {
        let token = self.state.buffer.last_token()?;
        let keyword = token.to_lowercase();
        let snapshot = self.snapshots.load();
        let phrase = snapshot.lookup(&keyword)?.to_string();

        Some(Match {
            typed_len: token.chars().count(),
            keyword,
            phrase,
        })
    }

    /// Erase the keyword, paste the phrase and announce it. Returns whether the replay succeeded.
    fn expand(&mut self, found: Match) -> bool {
        let replayed = self
            .replayer
            .erase(found.typed_len)
            .and_then(|_| self.replayer.paste(&found.phrase));
        self.state.buffer.clear();

        match replayed {
            Ok(()) => {
                log::info!("Expanded '{}'", found.keyword);
                let event = ExpansionEvent {
                    keyword: found.keyword,
                    phrase: found.phrase,
                };
                if self.notifier.send(event).is_err() {
                    log::debug!("Expansion receiver dropped; usage not recorded");
                }
                true
            }
            Err(e) => {
                log::error!("Failed to expand '{}': {}", found.keyword, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{QuickTextError, Result};
    use crate::snapshot::ShortcutSnapshot;
    use std::sync::mpsc::{channel, Receiver};

    const TADY: &str = "Thank you very much in advance.";

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Action {
        Erase(usize),
        Paste(String),
    }

    #[derive(Default)]
    struct RecordingReplayer {
        actions: Vec<Action>,
        fail_paste: bool,
    }

    impl Replayer for RecordingReplayer {
        fn erase(&mut self, count: usize) -> Result<()> {
            self.actions.push(Action::Erase(count));
            Ok(())
        }

        fn paste(&mut self, text: &str) -> Result<()> {
            if self.fail_paste {
                return Err(QuickTextError::Clipboard("no display".to_string()));
            }
            self.actions.push(Action::Paste(text.to_string()));
            Ok(())
        }
    }

    struct Harness {
        engine: ExpansionEngine<RecordingReplayer>,
        expansions: Receiver<ExpansionEvent>,
        start: Instant,
        clock: Duration,
    }

    impl Harness {
        fn new(mode: Mode) -> Self {
            let snapshots = SnapshotHandle::new(ShortcutSnapshot::new([
                ("tady", TADY),
                ("bye", "Thank you and have a great day!"),
            ]));
            let (tx, rx) = channel();
            Self {
                engine: ExpansionEngine::new(mode, snapshots, RecordingReplayer::default(), tx),
                expansions: rx,
                start: Instant::now(),
                clock: Duration::ZERO,
            }
        }

        fn now(&self) -> Instant {
            self.start + self.clock
        }

        fn advance(&mut self, by: Duration) {
            self.clock += by;
        }

        fn press(&mut self, key: Key) -> Decision {
            self.clock += Duration::from_millis(50);
            let now = self.now();
            self.engine.handle(KeyEvent::press(key), now)
        }

        fn release(&mut self, key: Key) -> Decision {
            let now = self.now();
            self.engine.handle(KeyEvent::release(key), now)
        }

        fn type_text(&mut self, text: &str) {
            for c in text.chars() {
                let decision = if c == ' ' {
                    self.press(SPACE)
                } else {
                    self.press(Key::Char(c))
                };
                assert_eq!(decision, Decision::Forward);
            }
        }

        fn buffer(&self) -> &str {
            self.engine.state().buffer.as_str()
        }

        fn actions(&self) -> &[Action] {
            &self.engine.replayer.actions
        }

        fn drain_expansions(&self) -> Vec<ExpansionEvent> {
            self.expansions.try_iter().collect()
        }
    }

    const SPACE: Key = Key::Control(ControlKey::Space);
    const ENTER: Key = Key::Control(ControlKey::Enter);
    const TAB: Key = Key::Control(ControlKey::Tab);
    const BACKSPACE: Key = Key::Control(ControlKey::Backspace);
    const CTRL_L: Key = Key::Control(ControlKey::CtrlLeft);
    const CTRL_R: Key = Key::Control(ControlKey::CtrlRight);

    #[test]
    fn characters_accumulate_and_backspace_removes_one() {
        let mut h = Harness::new(Mode::AutoExpand);
        h.type_text("hello");
        assert_eq!(h.buffer(), "hello");

        h.press(BACKSPACE);
        assert_eq!(h.buffer(), "hell");

        for _ in 0..10 {
            h.press(BACKSPACE);
        }
        assert_eq!(h.buffer(), "");
        assert!(h.actions().is_empty());
    }

    #[test]
    fn idle_gap_resets_buffer_before_next_character() {
        let mut h = Harness::new(Mode::Hotkey);
        h.type_text("ta");
        h.advance(Duration::from_millis(2100));
        h.press(Key::Char('d'));
        assert_eq!(h.buffer(), "d");
    }

    #[test]
    fn gap_of_exactly_two_seconds_keeps_buffer() {
        let mut h = Harness::new(Mode::Hotkey);
        h.type_text("ta");
        h.advance(Duration::from_millis(1950));
        h.press(Key::Char('d'));
        assert_eq!(h.buffer(), "tad");
    }

    #[test]
    fn auto_mode_expands_matching_keyword_and_suppresses_delimiter() {
        let mut h = Harness::new(Mode::AutoExpand);
        h.type_text("please tady");

        let decision = h.press(SPACE);

        assert_eq!(decision, Decision::Suppress);
        assert_eq!(
            h.actions(),
            &[Action::Erase(4), Action::Paste(TADY.to_string())]
        );
        assert_eq!(h.buffer(), "");
        assert_eq!(
            h.drain_expansions(),
            vec![ExpansionEvent {
                keyword: "tady".to_string(),
                phrase: TADY.to_string(),
            }]
        );
    }

    #[test]
    fn auto_mode_non_match_clears_buffer_and_forwards() {
        let mut h = Harness::new(Mode::AutoExpand);
        h.type_text("hello world");

        assert_eq!(h.press(ENTER), Decision::Forward);
        assert_eq!(h.buffer(), "");
        assert!(h.actions().is_empty());
        assert!(h.drain_expansions().is_empty());
        assert!(!h.engine.state().pending_expansion);
    }

    #[test]
    fn auto_mode_plain_space_starts_a_fresh_word() {
        let mut h = Harness::new(Mode::AutoExpand);
        h.type_text("hello ");
        assert_eq!(h.buffer(), "");
        h.type_text("bye");
        assert_eq!(h.buffer(), "bye");
    }

    #[test]
    fn exactly_one_delimiter_is_suppressed_after_expansion() {
        let mut h = Harness::new(Mode::AutoExpand);
        h.type_text("tady");
        assert_eq!(h.press(TAB), Decision::Suppress);
        assert!(h.engine.state().pending_expansion);

        assert_eq!(h.press(ENTER), Decision::Suppress);
        assert!(!h.engine.state().pending_expansion);

        assert_eq!(h.press(SPACE), Decision::Forward);
        assert_eq!(h.drain_expansions().len(), 1);
    }

    #[test]
    fn pending_suppression_does_not_swallow_characters() {
        let mut h = Harness::new(Mode::AutoExpand);
        h.type_text("tady");
        h.press(SPACE);

        assert_eq!(h.press(Key::Char('x')), Decision::Forward);
        assert_eq!(h.buffer(), "x");
        assert!(h.engine.state().pending_expansion);
    }

    #[test]
    fn keyword_lookup_is_case_insensitive() {
        let mut h = Harness::new(Mode::AutoExpand);
        h.type_text("Tady");
        assert_eq!(h.press(SPACE), Decision::Suppress);

        let expansions = h.drain_expansions();
        assert_eq!(expansions.len(), 1);
        assert_eq!(expansions[0].keyword, "tady");
        assert_eq!(h.actions()[0], Action::Erase(4));
    }

    #[test]
    fn hotkey_mode_builds_buffer_without_expanding_on_delimiters() {
        let mut h = Harness::new(Mode::Hotkey);
        h.type_text("please tady");
        assert_eq!(h.buffer(), "please tady");

        assert_eq!(h.press(TAB), Decision::Forward);
        assert_eq!(h.press(ENTER), Decision::Forward);
        assert!(h.actions().is_empty());
        assert!(h.drain_expansions().is_empty());
    }

    #[test]
    fn hotkey_mode_expands_on_ctrl_space() {
        let mut h = Harness::new(Mode::Hotkey);
        h.type_text("please tady");

        h.press(CTRL_L);
        let decision = h.press(SPACE);
        h.release(CTRL_L);

        assert_eq!(decision, Decision::Forward);
        assert_eq!(
            h.actions(),
            &[Action::Erase(4), Action::Paste(TADY.to_string())]
        );
        assert_eq!(h.buffer(), "");
        assert!(!h.engine.state().pending_expansion);
        assert_eq!(h.drain_expansions().len(), 1);

        // Nothing pending: the next space is ordinary.
        assert_eq!(h.press(SPACE), Decision::Forward);
        assert_eq!(h.buffer(), " ");
    }

    #[test]
    fn hotkey_mode_backspace_and_other_keys_edit_buffer_like_auto_mode() {
        let mut h = Harness::new(Mode::Hotkey);
        assert_eq!(h.press(BACKSPACE), Decision::Forward);
        assert_eq!(h.buffer(), "");

        h.type_text("tadyx");
        assert_eq!(h.press(BACKSPACE), Decision::Forward);
        assert_eq!(h.press(Key::Control(ControlKey::Other)), Decision::Forward);
        assert_eq!(h.buffer(), "tady");

        h.press(CTRL_L);
        assert_eq!(h.press(SPACE), Decision::Forward);
        assert_eq!(
            h.actions(),
            &[Action::Erase(4), Action::Paste(TADY.to_string())]
        );
    }

    #[test]
    fn hotkey_without_match_keeps_buffer() {
        let mut h = Harness::new(Mode::Hotkey);
        h.type_text("nothing");
        h.press(CTRL_R);
        h.press(SPACE);
        assert_eq!(h.buffer(), "nothing");
        assert!(h.actions().is_empty());
    }

    #[test]
    fn released_ctrl_no_longer_triggers() {
        let mut h = Harness::new(Mode::Hotkey);
        h.type_text("tady");
        h.press(CTRL_L);
        h.release(CTRL_L);
        h.press(SPACE);
        assert!(h.actions().is_empty());
        assert_eq!(h.buffer(), "tady ");
    }

    #[test]
    fn releases_never_touch_the_buffer() {
        let mut h = Harness::new(Mode::AutoExpand);
        h.type_text("tady");
        assert_eq!(h.release(Key::Char('y')), Decision::Forward);
        assert_eq!(h.release(SPACE), Decision::Forward);
        assert_eq!(h.buffer(), "tady");
    }

    #[test]
    fn snapshot_replacement_is_seen_on_next_check() {
        let mut h = Harness::new(Mode::AutoExpand);
        h.engine
            .snapshots
            .replace(ShortcutSnapshot::new([("brb", "Be right back")]));

        h.type_text("tady");
        assert_eq!(h.press(SPACE), Decision::Forward);

        h.type_text("brb");
        assert_eq!(h.press(SPACE), Decision::Suppress);
        assert_eq!(h.drain_expansions()[0].phrase, "Be right back");
    }

    #[test]
    fn failed_replay_forwards_delimiter_without_notification() {
        let mut h = Harness::new(Mode::AutoExpand);
        h.engine.replayer.fail_paste = true;
        h.type_text("tady");

        assert_eq!(h.press(SPACE), Decision::Forward);
        assert!(!h.engine.state().pending_expansion);
        assert_eq!(h.buffer(), "");
        assert!(h.drain_expansions().is_empty());
    }

    #[test]
    fn restart_discards_state_and_switches_mode() {
        let mut h = Harness::new(Mode::Hotkey);
        h.type_text("tad");
        h.press(CTRL_L);

        h.engine.restart(Mode::AutoExpand);

        assert_eq!(h.engine.mode(), Mode::AutoExpand);
        assert_eq!(h.buffer(), "");
        assert!(!h.engine.state().modifiers.ctrl_held());
        assert!(h.engine.state().last_press.is_none());
    }

    #[test]
    fn buffer_keeps_only_recent_characters() {
        let mut buffer = TypingBuffer::default();
        for _ in 0..MAX_BUFFER_LEN {
            buffer.push('a');
        }
        buffer.push('b');
        assert_eq!(buffer.as_str().chars().count(), MAX_BUFFER_LEN);
        assert!(buffer.as_str().ends_with('b'));
        assert_eq!(buffer.last_token().map(str::len), Some(MAX_BUFFER_LEN));
    }
}
