//! Orchestration of the expansion engine.
//!
//! The engine and all of its transient state live on one listener thread that
//! is spawned on the first [`Monitor::start`]. The monitor talks to it only
//! through channels: start/stop requests go in, [`ExpansionEvent`]s come out.
//! Shortcut updates are published through the shared [`SnapshotHandle`].

use crate::event_source::{EventSource, RdevEventSource};
use quicktext_core::{
    Decision, ExpansionEngine, ExpansionEvent, KeyEvent, Mode, ModeController, QuickTextError,
    ReplayTiming, Replayer, Result, ShortcutSnapshot, SnapshotHandle, SystemReplayer,
};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Requests from the monitor to its listener thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Start(Mode),
    Stop,
}

type ReplayerFactory<R> = Box<dyn FnOnce() -> R + Send>;

pub type SystemMonitor = Monitor<RdevEventSource, SystemReplayer>;

pub struct Monitor<S: EventSource, R: Replayer + 'static> {
    controller: ModeController,
    snapshots: SnapshotHandle,
    control_tx: Sender<Control>,
    control_rx: Option<Receiver<Control>>,
    expansion_tx: Option<Sender<ExpansionEvent>>,
    expansions: Receiver<ExpansionEvent>,
    launch: Option<(S, ReplayerFactory<R>)>,
    listener: Option<JoinHandle<()>>,
}

impl SystemMonitor {
    /// Monitor driven by the OS keyboard hook, replaying with real keystrokes.
    pub fn system(mode: Mode, snapshot: ShortcutSnapshot, timing: ReplayTiming) -> Self {
        Monitor::new(
            mode,
            snapshot,
            RdevEventSource::new(),
            Box::new(move || SystemReplayer::new(timing)),
        )
    }
}

impl<S: EventSource, R: Replayer + 'static> Monitor<S, R> {
    pub fn new(
        mode: Mode,
        snapshot: ShortcutSnapshot,
        source: S,
        replayer: ReplayerFactory<R>,
    ) -> Self {
        let (control_tx, control_rx) = channel();
        let (expansion_tx, expansions) = channel();
        Self {
            controller: ModeController::new(mode),
            snapshots: SnapshotHandle::new(snapshot),
            control_tx,
            control_rx: Some(control_rx),
            expansion_tx: Some(expansion_tx),
            expansions,
            launch: Some((source, replayer)),
            listener: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.controller.mode()
    }

    /// Change the mode. Rejected while monitoring runs.
    pub fn set_mode(&mut self, mode: Mode) -> Result<()> {
        self.controller.set_mode(mode)
    }

    pub fn is_running(&self) -> bool {
        self.controller.is_running()
    }

    /// Publish a new shortcut snapshot. The engine picks it up on its next lookup.
    pub fn update_snapshot(&self, snapshot: ShortcutSnapshot) {
        log::debug!("Publishing snapshot with {} shortcuts", snapshot.len());
        self.snapshots.replace(snapshot);
    }

    pub fn snapshot(&self) -> std::sync::Arc<ShortcutSnapshot> {
        self.snapshots.load()
    }

    /// Completed expansions, produced on the listener thread.
    pub fn expansions(&self) -> &Receiver<ExpansionEvent> {
        &self.expansions
    }

    pub fn start(&mut self) -> Result<()> {
        if self.controller.is_running() {
            return Err(QuickTextError::MonitorRunning);
        }

        self.spawn_listener();
        let mode = self.controller.mode();
        self.control_tx
            .send(Control::Start(mode))
            .map_err(|_| QuickTextError::Hook("keyboard listener has exited".to_string()))?;
        self.controller.mark_running(true);

        log::info!("Monitoring started in {} mode", mode.describe());
        Ok(())
    }

    /// Stop expanding. Every later event is forwarded untouched and the engine state is discarded.
    ///
    /// The OS hook stays installed and the listener thread keeps running until the process exits.
    pub fn stop(&mut self) -> Result<()> {
        if !self.controller.is_running() {
            return Err(QuickTextError::MonitorStopped);
        }

        // A dead listener has nothing left to stop.
        let _ = self.control_tx.send(Control::Stop);
        self.controller.mark_running(false);

        log::info!("Monitoring stopped");
        Ok(())
    }

    /// Whether the listener thread has exited, e.g. because the hook could not be installed.
    pub fn listener_finished(&self) -> bool {
        self.listener
            .as_ref()
            .map_or(false, |handle| handle.is_finished())
    }

    fn spawn_listener(&mut self) {
        let (Some((source, make_replayer)), Some(control_rx), Some(expansion_tx)) = (
            self.launch.take(),
            self.control_rx.take(),
            self.expansion_tx.take(),
        ) else {
            return;
        };
        let snapshots = self.snapshots.clone();
        let initial_mode = self.controller.mode();

        let handle = thread::spawn(move || {
            let engine = ExpansionEngine::new(initial_mode, snapshots, make_replayer(), expansion_tx);
            let handler = listener_handler(engine, control_rx);

            if let Err(e) = source.run(Box::new(handler)) {
                log::error!("Keyboard listener stopped: {}", e);
            }
        });
        self.listener = Some(handle);
    }
}

impl<S: EventSource, R: Replayer + 'static> Drop for Monitor<S, R> {
    fn drop(&mut self) {
        if self.controller.is_running() {
            let _ = self.control_tx.send(Control::Stop);
        }
    }
}

/// Per-event closure run on the listener thread.
fn listener_handler<R: Replayer>(
    mut engine: ExpansionEngine<R>,
    control_rx: Receiver<Control>,
) -> impl FnMut(KeyEvent) -> Decision {
    let mut active = false;

    move |event| {
        for control in control_rx.try_iter() {
            match control {
                Control::Start(mode) => {
                    engine.restart(mode);
                    active = true;
                }
                Control::Stop => {
                    engine.reset();
                    active = false;
                }
            }
        }

        if !active {
            return Decision::Forward;
        }
        engine.handle(event, Instant::now())
    }
}
