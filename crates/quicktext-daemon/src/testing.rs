//! Test doubles for driving a `Monitor` without an OS hook.

use crate::event_source::{EventSource, KeyHandler};
use quicktext_core::{Decision, KeyEvent, Replayer, Result};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex};

/// Feeds events sent by the test and reports each decision back.
pub struct ScriptedSource {
    pub events: Receiver<KeyEvent>,
    pub decisions: Sender<Decision>,
}

impl EventSource for ScriptedSource {
    fn run(self, mut handler: KeyHandler) -> Result<()> {
        for event in self.events {
            if self.decisions.send(handler(event)).is_err() {
                break;
            }
        }
        Ok(())
    }
}

/// Records replay actions where the test can still see them after the replayer moved threads.
#[derive(Clone, Default)]
pub struct SharedReplayer {
    pub log: Arc<Mutex<Vec<String>>>,
}

impl Replayer for SharedReplayer {
    fn erase(&mut self, count: usize) -> Result<()> {
        self.log.lock().unwrap().push(format!("erase {}", count));
        Ok(())
    }

    fn paste(&mut self, text: &str) -> Result<()> {
        self.log.lock().unwrap().push(format!("paste {}", text));
        Ok(())
    }
}
