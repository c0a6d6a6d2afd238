//! Trait seams between the menu, the device controller and bluetoothctl

use async_trait::async_trait;
use btmenu_shared::{BtError, CtlError, DeviceStatus};

/// Captured result of one `bluetoothctl` invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CtlOutput {
    /// Whether the process exited with status 0
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CtlOutput {
    /// Best short explanation for a failed call
    pub fn failure_reason(&self) -> String {
        self.stderr
            .lines()
            .chain(self.stdout.lines())
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .last()
            .map(str::to_string)
            .unwrap_or_else(|| "command reported failure".into())
    }
}

/// Runs the external Bluetooth control utility
#[async_trait]
pub trait CtlRunner: Send + Sync {
    /// Run one invocation with `args` and wait for it to finish
    async fn run(&self, args: &[&str]) -> Result<CtlOutput, CtlError>;
}

/// Device operations offered to the menu
#[async_trait]
pub trait DeviceOps: Send + Sync {
    /// Power on the adapter and connect to `address`
    async fn connect(&self, address: &str) -> Result<(), BtError>;

    /// Drop any existing pairing, pair again and connect
    async fn remove_and_pair(&self, address: &str) -> Result<(), BtError>;

    /// Query pairing, connection and battery state
    async fn status(&self, address: &str) -> DeviceStatus;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_reason_prefers_last_line() {
        let output = CtlOutput {
            success: false,
            stdout: "Attempting to connect to AA:BB:CC:DD:EE:FF\nFailed to connect: org.bluez.Error.Failed\n\n".into(),
            stderr: String::new(),
        };
        assert_eq!(output.failure_reason(), "Failed to connect: org.bluez.Error.Failed");
    }

    #[test]
    fn test_failure_reason_default() {
        assert_eq!(CtlOutput::default().failure_reason(), "command reported failure");
    }
}
