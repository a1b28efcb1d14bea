use crate::event_source::EventSource;
use crate::monitor::{Monitor, SystemMonitor};
use crate::permissions::check_and_request_permissions;
use crate::process::verify_process_running;
use quicktext_core::config::{ensure_config_dir, get_daemon_log_path, get_pid_file_path};
use quicktext_core::{
    is_daemon_running, Mode, QuickTextError, Replayer, Result, Settings, ShortcutStore,
};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::process;
use std::sync::mpsc::RecvTimeoutError;
use std::thread;
use std::time::{Duration, Instant, SystemTime};

const RELOAD_INTERVAL: Duration = Duration::from_secs(1);
const EXPANSION_POLL: Duration = Duration::from_millis(100);

/// Start the daemon process in the background
pub fn start_daemon(mode: Option<Mode>) -> Result<()> {
    if let Some(pid) = is_daemon_running()? {
        if verify_process_running(pid) {
            return Err(QuickTextError::DaemonAlreadyRunning(pid));
        }
        println!("Found stale PID file. Cleaning up and starting new daemon...");
        let _ = fs::remove_file(get_pid_file_path());
    }

    ensure_config_dir()?;
    // Creates the database with the default shortcuts on first run
    ShortcutStore::open_default()?;

    if let Some(mode) = mode {
        let mut settings = Settings::load()?;
        settings.mode = mode;
        settings.save()?;
    }

    check_and_request_permissions()?;

    println!("Starting quicktext daemon...");
    let current_exe = std::env::current_exe()?;
    let daemon_log_file = get_daemon_log_path();

    #[cfg(unix)]
    {
        use std::process::Command;

        let cmd = format!(
            "nohup \"{}\" daemon-worker > \"{}\" 2>&1 &",
            current_exe.to_string_lossy(),
            daemon_log_file.to_string_lossy()
        );
        Command::new("sh").arg("-c").arg(&cmd).status()?;
    }

    #[cfg(windows)]
    {
        use std::process::Command;

        let cmd = format!(
            "START /B \"quicktext daemon\" \"{}\" daemon-worker > \"{}\" 2>&1",
            current_exe.to_string_lossy(),
            daemon_log_file.to_string_lossy()
        );
        Command::new("cmd").arg("/C").arg(&cmd).status()?;
    }

    #[cfg(not(any(unix, windows)))]
    {
        let _ = (current_exe, daemon_log_file);
        return Err(QuickTextError::Other(
            "Starting the daemon is not supported on this platform".to_string(),
        ));
    }

    // Wait for the worker to write its PID file
    for _ in 0..20 {
        thread::sleep(Duration::from_millis(100));
        if is_daemon_running()?.is_some() {
            break;
        }
    }

    match is_daemon_running()? {
        Some(pid) if verify_process_running(pid) => {
            println!("Daemon started successfully with PID {}.", pid);
            Ok(())
        }
        _ => Err(QuickTextError::Other(format!(
            "Daemon failed to start. Check logs at {}",
            daemon_log_file.display()
        ))),
    }
}

/// Stop the daemon if it's running
pub fn stop_daemon() -> Result<()> {
    let pid_file = get_pid_file_path();
    let pid = match is_daemon_running()? {
        Some(pid) => pid,
        None => return Err(QuickTextError::DaemonNotRunning),
    };

    println!("Attempting to stop daemon with PID {}...", pid);

    if !verify_process_running(pid) {
        println!("Process with PID {} is not running.", pid);
        let _ = fs::remove_file(&pid_file);
        return Ok(());
    }

    if terminate(pid) {
        let _ = fs::remove_file(&pid_file);
        println!("Daemon stopped successfully.");
        return Ok(());
    }

    println!("WARNING: Failed to stop daemon process. PID file will be removed anyway.");
    let _ = fs::remove_file(&pid_file);
    Ok(())
}

#[cfg(unix)]
fn terminate(pid: u32) -> bool {
    use std::process::Command;

    let _ = Command::new("kill").arg(pid.to_string()).status();
    thread::sleep(Duration::from_millis(500));
    if !verify_process_running(pid) {
        return true;
    }

    println!("Daemon didn't terminate gracefully, using force kill...");
    let killed = Command::new("kill")
        .args(["-9", &pid.to_string()])
        .status()
        .map_or(false, |status| status.success());
    killed && !verify_process_running(pid)
}

#[cfg(windows)]
fn terminate(pid: u32) -> bool {
    use std::process::Command;

    let _ = Command::new("taskkill")
        .args(["/PID", &pid.to_string()])
        .status();
    thread::sleep(Duration::from_millis(500));
    if !verify_process_running(pid) {
        return true;
    }

    println!("Daemon didn't terminate gracefully, using force kill...");
    Command::new("taskkill")
        .args(["/F", "/T", "/PID", &pid.to_string()])
        .status()
        .map_or(false, |status| status.success())
}

#[cfg(not(any(unix, windows)))]
fn terminate(_pid: u32) -> bool {
    false
}

/// Check daemon status
pub fn daemon_status() -> Result<()> {
    let settings = Settings::load()?;
    match is_daemon_running()? {
        Some(pid) if verify_process_running(pid) => {
            println!("quicktext daemon is running with PID {}", pid);
            println!("Mode: {}", settings.mode.describe());
        }
        Some(pid) => {
            println!("PID file exists but process {} is not running", pid);
            println!("Recommend running 'quicktext stop' followed by 'quicktext start'");
        }
        None => println!("quicktext daemon is not running"),
    }
    Ok(())
}

/// Entry point of the background worker process
pub fn daemon_worker_entry() -> Result<()> {
    ensure_config_dir()?;
    let pid_file = get_pid_file_path();
    let mut file = File::create(&pid_file)?;
    write!(file, "{}", process::id())?;

    let result = run_daemon_worker();

    let _ = fs::remove_file(&pid_file);
    result
}

/// Monitor the keyboard with the saved settings until the process is killed
pub fn run_daemon_worker() -> Result<()> {
    run_foreground(None)
}

/// Monitor the keyboard in the current process. `mode` overrides the saved setting.
pub fn run_foreground(mode: Option<Mode>) -> Result<()> {
    let settings = Settings::load()?;
    let mode = mode.unwrap_or(settings.mode);
    let mut store = ShortcutStore::open_default()?;
    log::info!(
        "Loaded {} shortcuts from {}",
        store.all().len(),
        store.path().display()
    );

    let mut monitor = SystemMonitor::system(mode, store.snapshot(), settings.timing);
    monitor.start()?;
    println!(
        "quicktext is monitoring in {} mode. Press Ctrl+C to quit.",
        mode.describe()
    );

    let mut last_modified = modified_time(store.path());
    let mut last_check = Instant::now();
    loop {
        if monitor.listener_finished() {
            return Err(QuickTextError::Hook(
                "keyboard listener stopped unexpectedly".to_string(),
            ));
        }

        record_expansions(&monitor, &mut store, &mut last_modified, EXPANSION_POLL)?;

        if last_check.elapsed() >= RELOAD_INTERVAL {
            last_check = Instant::now();
            reload_if_changed(&monitor, &mut store, &mut last_modified)?;
        }
    }
}

/// Wait up to `wait` for completed expansions and count their usage. Returns how many were recorded.
///
/// The database is re-read first so edits made by other processes since the last reload are kept.
pub fn record_expansions<S: EventSource, R: Replayer + 'static>(
    monitor: &Monitor<S, R>,
    store: &mut ShortcutStore,
    last_modified: &mut Option<SystemTime>,
    wait: Duration,
) -> Result<usize> {
    let first = match monitor.expansions().recv_timeout(wait) {
        Ok(event) => event,
        Err(RecvTimeoutError::Timeout) => return Ok(0),
        Err(RecvTimeoutError::Disconnected) => {
            return Err(QuickTextError::Hook(
                "keyboard listener stopped unexpectedly".to_string(),
            ))
        }
    };
    let events: Vec<_> = std::iter::once(first)
        .chain(monitor.expansions().try_iter())
        .collect();

    if let Err(e) = store.reload() {
        // Stale entries must not be saved over the file
        log::warn!("Skipping usage of {} expansions: {}", events.len(), e);
        return Ok(0);
    }
    monitor.update_snapshot(store.snapshot());

    let mut recorded = 0;
    for event in events {
        log::debug!("Recording usage of '{}'", event.keyword);
        if let Err(e) = store.increment_usage(&event.keyword) {
            log::error!("Failed to record usage of '{}': {}", event.keyword, e);
            continue;
        }
        recorded += 1;
    }
    *last_modified = modified_time(store.path());
    Ok(recorded)
}

/// Re-read the database when it was edited by another process and publish a fresh snapshot.
pub fn reload_if_changed<S: EventSource, R: Replayer + 'static>(
    monitor: &Monitor<S, R>,
    store: &mut ShortcutStore,
    last_modified: &mut Option<SystemTime>,
) -> Result<bool> {
    let current = modified_time(store.path());
    if current.is_none() || current == *last_modified {
        return Ok(false);
    }

    match store.reload() {
        Ok(()) => {
            *last_modified = current;
            monitor.update_snapshot(store.snapshot());
            log::info!("Reloaded {} shortcuts", store.all().len());
            Ok(true)
        }
        Err(e) => {
            // Keep serving the previous snapshot
            log::warn!("Failed to reload shortcuts: {}", e);
            Ok(false)
        }
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|meta| meta.modified()).ok()
}
