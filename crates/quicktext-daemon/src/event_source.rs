use quicktext_core::{classify_rdev_event, Decision, KeyEvent, QuickTextError, Result};
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::thread;
use std::time::Duration;

const MAX_HOOK_RETRIES: u32 = 5;
const HOOK_RETRY_PAUSE: Duration = Duration::from_secs(1);

/// Receives every classified key event and decides whether it reaches the focused application.
pub type KeyHandler = Box<dyn FnMut(KeyEvent) -> Decision>;

/// A global stream of key events that can drop individual events.
pub trait EventSource: Send + 'static {
    /// Deliver events to `handler` until the source ends. Runs on the listener thread.
    fn run(self, handler: KeyHandler) -> Result<()>;
}

/// Low-level OS keyboard hook backed by `rdev::grab`.
#[derive(Debug, Default)]
pub struct RdevEventSource;

impl RdevEventSource {
    pub fn new() -> Self {
        Self
    }
}

impl EventSource for RdevEventSource {
    fn run(self, handler: KeyHandler) -> Result<()> {
        let handler = Rc::new(RefCell::new(handler));
        let mut retry_count = 0;

        loop {
            let handler = Rc::clone(&handler);
            match rdev::grab(move |event| dispatch(&handler, event)) {
                // grab only returns once the hook is torn down
                Ok(()) => return Ok(()),
                Err(e) => {
                    retry_count += 1;
                    log::error!("Error in keyboard hook: {:?}", e);
                    if retry_count >= MAX_HOOK_RETRIES {
                        return Err(QuickTextError::Hook(format!(
                            "failed to install keyboard hook after {} attempts: {:?}",
                            MAX_HOOK_RETRIES, e
                        )));
                    }
                    log::warn!(
                        "Retrying keyboard hook ({}/{})...",
                        retry_count,
                        MAX_HOOK_RETRIES
                    );
                    thread::sleep(HOOK_RETRY_PAUSE);
                }
            }
        }
    }
}

/// Route one raw hook event through the handler. Returning `None` drops the event.
fn dispatch(handler: &RefCell<KeyHandler>, event: rdev::Event) -> Option<rdev::Event> {
    let Some(key_event) = classify_rdev_event(&event) else {
        return Some(event);
    };

    let Ok(mut handler) = handler.try_borrow_mut() else {
        log::warn!("Key event arrived during an expansion; forwarding {:?}", key_event);
        return Some(event);
    };

    // A panic must not unwind into the OS hook: that would leave the keyboard dead.
    match panic::catch_unwind(AssertUnwindSafe(|| (&mut **handler)(key_event))) {
        Ok(Decision::Forward) => Some(event),
        Ok(Decision::Suppress) => None,
        Err(_) => {
            log::error!("Key handler panicked on {:?}; forwarding event", key_event);
            Some(event)
        }
    }
}
