use quicktext_core::Result;

#[cfg(any(target_os = "macos", target_os = "linux"))]
use quicktext_core::QuickTextError;

#[cfg(target_os = "linux")]
use crate::process::{detect_desktop_environment, is_running_as_sudo};

/// Make sure the global keyboard hook can be installed, explaining how to fix it if not.
pub fn check_and_request_permissions() -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        if !has_accessibility_permission() {
            return request_macos_permissions();
        }
    }

    #[cfg(target_os = "linux")]
    {
        if !has_input_permission() {
            return request_linux_permissions();
        }
    }

    Ok(())
}

#[cfg(target_os = "macos")]
fn has_accessibility_permission() -> bool {
    use std::process::Command;

    let apple_script_test = Command::new("osascript")
        .arg("-e")
        .arg("tell application \"System Events\" to return name of first process")
        .output();

    match apple_script_test {
        Ok(output) => output.status.success(),
        Err(_) => false,
    }
}

#[cfg(target_os = "macos")]
fn request_macos_permissions() -> Result<()> {
    println!("⚠️  quicktext needs Accessibility and Input Monitoring permissions");
    println!("-----------------------------------------------------------------");
    println!("1. Open System Settings > Privacy & Security > Accessibility");
    println!("2. Enable your terminal application");
    println!("3. Repeat under Privacy & Security > Input Monitoring");
    println!("4. Restart your terminal and run 'quicktext start' again");

    Err(QuickTextError::PermissionDenied(
        "quicktext needs accessibility permissions to watch the keyboard".to_string(),
    ))
}

#[cfg(target_os = "linux")]
fn has_input_permission() -> bool {
    use std::path::Path;

    let probe = Path::new("/dev/input/event0");
    if probe.exists() {
        return std::fs::File::open(probe).is_ok();
    }

    // No device node to probe, fall back to group membership
    std::process::Command::new("groups")
        .output()
        .ok()
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map_or(false, |groups| groups.split_whitespace().any(|g| g == "input"))
}

#[cfg(target_os = "linux")]
fn request_linux_permissions() -> Result<()> {
    if is_running_as_sudo() {
        return Ok(());
    }

    println!("⚠️  quicktext needs permission to read input devices");
    println!("---------------------------------------------------");
    println!("Desktop environment: {}", detect_desktop_environment());
    println!();
    println!("1. Add your user to the 'input' group (recommended):");
    println!("   sudo usermod -a -G input $USER");
    println!("   (log out and back in for this to take effect)");
    println!();
    println!("2. Or run quicktext with sudo:");
    println!("   sudo quicktext start");

    Err(QuickTextError::PermissionDenied(
        "quicktext needs input device permissions to function".to_string(),
    ))
}
