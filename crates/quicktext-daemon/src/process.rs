/// Verify if a process with the given PID is running
#[cfg(unix)]
pub fn verify_process_running(pid: u32) -> bool {
    use std::process::Command;

    // kill -0 only checks that the process exists
    let output = Command::new("kill")
        .args(["-0", &pid.to_string()])
        .output();

    match output {
        Ok(output) => output.status.success(),
        Err(_) => false,
    }
}

#[cfg(windows)]
pub fn verify_process_running(pid: u32) -> bool {
    use std::process::Command;

    let output = Command::new("tasklist")
        .args(["/FI", &format!("PID eq {}", pid), "/NH"])
        .output();

    match output {
        Ok(output) => String::from_utf8_lossy(&output.stdout).contains(&pid.to_string()),
        Err(_) => false,
    }
}

#[cfg(not(any(unix, windows)))]
pub fn verify_process_running(_pid: u32) -> bool {
    false
}

#[cfg(target_os = "linux")]
pub fn is_running_as_sudo() -> bool {
    std::env::var("SUDO_USER").is_ok()
}

#[cfg(target_os = "linux")]
pub fn detect_desktop_environment() -> String {
    use std::env;

    for var in &["XDG_CURRENT_DESKTOP", "DESKTOP_SESSION", "GDMSESSION"] {
        if let Ok(val) = env::var(var) {
            if val.is_empty() {
                continue;
            }
            let upper = val.to_uppercase();
            for known in ["GNOME", "KDE", "XFCE", "CINNAMON", "MATE"] {
                if upper.contains(known) {
                    return known.to_string();
                }
            }
            return val;
        }
    }

    "Unknown".to_string()
}
