//! Startup checks: the control utility and the system Bluetooth service

use crate::bluetooth::runner::BLUETOOTHCTL;
use btmenu_shared::StartupError;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{info, warn};

/// systemd unit name of the Bluetooth daemon
pub const BLUETOOTH_SERVICE: &str = "bluetooth";

/// Locate bluetoothctl in PATH
pub fn find_bluetoothctl() -> Result<PathBuf, StartupError> {
    which::which(BLUETOOTHCTL).map_err(|_| StartupError::MissingDependency(BLUETOOTHCTL.into()))
}

/// Start the Bluetooth service if it is not active
///
/// Starting the service needs root, so this goes through `sudo` and may
/// prompt for a password on the terminal. Failures are logged and the
/// program carries on; later bluetoothctl calls will report the problem.
pub async fn ensure_service_running() {
    let active = Command::new("systemctl")
        .args(["is-active", "--quiet", BLUETOOTH_SERVICE])
        .status()
        .await;

    match active {
        Ok(status) if status.success() => {
            info!("[BT] {} service is active", BLUETOOTH_SERVICE);
            return;
        }
        Ok(_) => {}
        Err(e) => {
            warn!("[BT] Could not query service state: {}", e);
            return;
        }
    }

    println!("Bluetooth service is not running, starting it (sudo)...");
    match Command::new("sudo")
        .args(["systemctl", "start", BLUETOOTH_SERVICE])
        .status()
        .await
    {
        Ok(status) if status.success() => info!("[BT] Started {} service", BLUETOOTH_SERVICE),
        Ok(status) => warn!("[BT] Starting {} service failed: {}", BLUETOOTH_SERVICE, status),
        Err(e) => warn!("[BT] Could not run sudo: {}", e),
    }
}
