pub mod daemon_manager;
pub mod event_source;
pub mod monitor;
pub mod permissions;
pub mod process;

#[cfg(test)]
mod testing;

pub use daemon_manager::{
    daemon_status, daemon_worker_entry, record_expansions, reload_if_changed, run_daemon_worker,
    run_foreground, start_daemon, stop_daemon,
};
pub use event_source::{EventSource, KeyHandler, RdevEventSource};
pub use monitor::{Monitor, SystemMonitor};
