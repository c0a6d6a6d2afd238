//! bluetoothctl subprocess runner

use crate::bluetooth::traits::{CtlOutput, CtlRunner};
use async_trait::async_trait;
use btmenu_shared::CtlError;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Name of the Bluetooth control utility looked up in PATH
pub const BLUETOOTHCTL: &str = "bluetoothctl";

/// Runs bluetoothctl in non-interactive mode, one process per call
pub struct BluetoothctlRunner {
    program: PathBuf,
    /// Upper bound for each invocation; the child is killed on expiry
    timeout: Duration,
}

impl BluetoothctlRunner {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

#[async_trait]
impl CtlRunner for BluetoothctlRunner {
    async fn run(&self, args: &[&str]) -> Result<CtlOutput, CtlError> {
        let command_line = args.join(" ");
        debug!("[BT] {} {}", self.program.display(), command_line);

        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(CtlError::Spawn {
                    program: self.program.display().to_string(),
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                warn!("[BT] '{}' timed out after {:?}", command_line, self.timeout);
                return Err(CtlError::Timeout {
                    command: command_line,
                    after: self.timeout,
                });
            }
        };

        let result = CtlOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        debug!("[BT] '{}' exited with {}", command_line, output.status);
        Ok(result)
    }
}
