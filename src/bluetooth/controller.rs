//! Device controller: one Bluetooth operation per call
//!
//! Every operation maps to a short sequence of bluetoothctl invocations.
//! Nothing is retried here; the menu decides what to do after a failure.

use crate::bluetooth::traits::{CtlOutput, CtlRunner, DeviceOps};
use async_trait::async_trait;
use btmenu_shared::{output, timing, BtError, DeviceStatus};
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

/// Environment override for the per-call timeout, in seconds
pub const COMMAND_TIMEOUT_ENV: &str = "BTMENU_COMMAND_TIMEOUT_SECS";

/// Environment override for the pairing scan window, in seconds
pub const SCAN_WINDOW_ENV: &str = "BTMENU_SCAN_SECS";

/// Timing configuration for the device controller
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Upper bound for a single bluetoothctl invocation
    pub command_timeout: Duration,
    /// How long to wait for the adapter to report powered after `power on`
    pub settle_timeout: Duration,
    /// How long a pairing scan may run while waiting for the device
    pub scan_window: Duration,
    /// Interval between polls while waiting
    pub poll_interval: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            command_timeout: Duration::from_secs(timing::COMMAND_TIMEOUT_SECS),
            settle_timeout: Duration::from_millis(timing::SETTLE_TIMEOUT_MS),
            scan_window: Duration::from_secs(timing::SCAN_WINDOW_SECS),
            poll_interval: Duration::from_millis(timing::POLL_INTERVAL_MS),
        }
    }
}

impl ControllerConfig {
    /// Defaults with overrides from the environment
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(secs) = parse_secs(std::env::var(COMMAND_TIMEOUT_ENV).ok()) {
            config.command_timeout = secs;
        }
        if let Some(secs) = parse_secs(std::env::var(SCAN_WINDOW_ENV).ok()) {
            config.scan_window = secs;
        }

        config
    }
}

fn parse_secs(value: Option<String>) -> Option<Duration> {
    let value = value?;
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
        _ => {
            warn!("Ignoring invalid duration '{}'", value);
            None
        }
    }
}

/// Stateless adapter over a [`CtlRunner`]
pub struct DeviceController<R: CtlRunner> {
    runner: R,
    config: ControllerConfig,
}

impl<R: CtlRunner> DeviceController<R> {
    pub fn new(runner: R, config: ControllerConfig) -> Self {
        Self { runner, config }
    }

    /// Power on the adapter; failures are only logged since it may already be on
    pub async fn power_on(&self) {
        match self.runner.run(&["power", "on"]).await {
            Ok(out) if out.success => debug!("[BT] Adapter powered on"),
            Ok(out) => warn!("[BT] power on failed: {}", out.failure_reason()),
            Err(e) => warn!("[BT] power on failed: {}", e),
        }
    }

    /// Run a command, turning a non-zero exit or runner error into a reason
    async fn run_checked(&self, args: &[&str]) -> Result<CtlOutput, String> {
        match self.runner.run(args).await {
            Ok(out) if out.success => Ok(out),
            Ok(out) => Err(out.failure_reason()),
            Err(e) => Err(e.to_string()),
        }
    }

    /// Poll `show` until the adapter reports powered or the settle timeout passes
    async fn wait_for_adapter(&self) -> bool {
        let powered = async {
            loop {
                if let Ok(out) = self.runner.run(&["show"]).await {
                    if output::is_powered(&out.stdout) {
                        return;
                    }
                }
                sleep(self.config.poll_interval).await;
            }
        };

        let ready = timeout(self.config.settle_timeout, powered).await.is_ok();
        if !ready {
            debug!(
                "[BT] Adapter not reported powered within {:?}",
                self.config.settle_timeout
            );
        }
        ready
    }

    async fn is_listed(&self, address: &str) -> bool {
        match self.runner.run(&["devices"]).await {
            Ok(out) => output::lists_address(&out.stdout, address),
            Err(e) => {
                warn!("[BT] devices query failed: {}", e);
                false
            }
        }
    }

    async fn wait_until_listed(&self, address: &str) {
        while !self.is_listed(address).await {
            sleep(self.config.poll_interval).await;
        }
    }

    /// Scan until `address` shows up or the scan window closes
    async fn scan_for(&self, address: &str) -> bool {
        let window = self.config.scan_window.as_secs().max(1).to_string();
        let scan_args = ["--timeout", window.as_str(), "scan", "on"];

        // The scan call blocks for the whole window, so race it against the poll.
        // Whichever side loses is dropped, which kills its child process.
        tokio::select! {
            found = timeout(self.config.scan_window, self.wait_until_listed(address)) => found.is_ok(),
            scan = self.runner.run(&scan_args) => {
                if let Err(e) = scan {
                    warn!("[BT] Scan failed: {}", e);
                }
                self.is_listed(address).await
            }
        }
    }

    async fn scan_off(&self) {
        if let Err(reason) = self.run_checked(&["scan", "off"]).await {
            warn!("[BT] scan off failed: {}", reason);
        }
    }

    async fn pair_and_connect(&self, address: &str) -> Result<(), BtError> {
        if self.scan_for(address).await {
            info!("[BT] {} visible, pairing", address);
        } else {
            warn!("[BT] {} not seen during scan, trying to pair anyway", address);
        }

        self.run_checked(&["pair", address])
            .await
            .map_err(|reason| BtError::PairFailure {
                address: address.to_string(),
                reason,
            })?;

        info!("[BT] Paired with {}", address);

        self.run_checked(&["connect", address])
            .await
            .map(|_| ())
            .map_err(|reason| BtError::PartialPairFailure {
                address: address.to_string(),
                reason,
            })
    }
}

#[async_trait]
impl<R: CtlRunner> DeviceOps for DeviceController<R> {
    async fn connect(&self, address: &str) -> Result<(), BtError> {
        self.power_on().await;
        self.wait_for_adapter().await;

        info!("[BT] Connecting to {}", address);
        match self.run_checked(&["connect", address]).await {
            Ok(_) => {
                info!("[BT] Connected to {}", address);
                Ok(())
            }
            Err(reason) => {
                warn!("[BT] Connect to {} failed: {}", address, reason);
                Err(BtError::ConnectFailure {
                    address: address.to_string(),
                    reason,
                })
            }
        }
    }

    async fn remove_and_pair(&self, address: &str) -> Result<(), BtError> {
        info!("[BT] Re-pairing {}", address);

        // There may be nothing to remove
        if let Err(reason) = self.run_checked(&["remove", address]).await {
            debug!("[BT] remove {}: {}", address, reason);
        }
        if let Err(reason) = self.run_checked(&["discoverable", "on"]).await {
            warn!("[BT] discoverable on failed: {}", reason);
        }

        let result = self.pair_and_connect(address).await;
        self.scan_off().await;
        result
    }

    async fn status(&self, address: &str) -> DeviceStatus {
        if !self.is_listed(address).await {
            return DeviceStatus::not_paired();
        }

        match self.runner.run(&["info", address]).await {
            Ok(out) => {
                let (connected, battery) = output::parse_info(&out.stdout);
                DeviceStatus {
                    paired: true,
                    connected,
                    battery,
                }
            }
            Err(e) => {
                warn!("[BT] info {} failed: {}", address, e);
                DeviceStatus {
                    paired: true,
                    ..DeviceStatus::default()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use btmenu_shared::CtlError;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    const ADDR: &str = "AA:BB:CC:DD:EE:FF";

    /// Scripted runner: every call succeeds with empty output unless told otherwise
    #[derive(Default)]
    struct FakeRunner {
        calls: Mutex<Vec<String>>,
        stdout: HashMap<String, String>,
        failing: HashSet<String>,
        hanging: HashSet<String>,
    }

    impl FakeRunner {
        fn new() -> Self {
            let mut runner = Self::default();
            runner.stdout.insert("show".into(), "\tPowered: yes\n".into());
            runner
        }

        fn with_stdout(mut self, command: &str, stdout: &str) -> Self {
            self.stdout.insert(command.into(), stdout.into());
            self
        }

        fn failing(mut self, command: &str) -> Self {
            self.failing.insert(command.into());
            self
        }

        fn hanging(mut self, command: &str) -> Self {
            self.hanging.insert(command.into());
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CtlRunner for FakeRunner {
        async fn run(&self, args: &[&str]) -> Result<CtlOutput, CtlError> {
            let command = args.join(" ");
            self.calls.lock().unwrap().push(command.clone());

            if self.hanging.contains(&command) {
                return Err(CtlError::Timeout {
                    command,
                    after: Duration::from_secs(30),
                });
            }

            Ok(CtlOutput {
                success: !self.failing.contains(&command),
                stdout: self.stdout.get(&command).cloned().unwrap_or_default(),
                stderr: if self.failing.contains(&command) {
                    format!("Failed: {}", command)
                } else {
                    String::new()
                },
            })
        }
    }

    fn test_config() -> ControllerConfig {
        ControllerConfig {
            command_timeout: Duration::from_secs(1),
            settle_timeout: Duration::from_millis(50),
            scan_window: Duration::from_millis(200),
            poll_interval: Duration::from_millis(10),
        }
    }

    fn controller(runner: FakeRunner) -> DeviceController<FakeRunner> {
        DeviceController::new(runner, test_config())
    }

    /// Calls with the scan/poll noise removed, which interleave nondeterministically
    fn significant_calls(calls: &[String]) -> Vec<&str> {
        calls
            .iter()
            .map(String::as_str)
            .filter(|c| *c != "devices" && !c.ends_with("scan on") && *c != "show")
            .collect()
    }

    #[test]
    fn test_default_config() {
        let config = ControllerConfig::default();
        assert_eq!(config.command_timeout, Duration::from_secs(30));
        assert_eq!(config.scan_window, Duration::from_secs(10));
        assert_eq!(config.poll_interval, Duration::from_millis(500));
    }

    #[test]
    fn test_parse_secs() {
        assert_eq!(parse_secs(Some("15".into())), Some(Duration::from_secs(15)));
        assert_eq!(parse_secs(Some(" 5 ".into())), Some(Duration::from_secs(5)));
        assert_eq!(parse_secs(Some("0".into())), None);
        assert_eq!(parse_secs(Some("soon".into())), None);
        assert_eq!(parse_secs(None), None);
    }

    #[tokio::test]
    async fn test_connect_success() {
        let ctl = controller(FakeRunner::new());

        assert_eq!(ctl.connect(ADDR).await, Ok(()));

        let calls = ctl.runner.calls();
        assert_eq!(calls.first().map(String::as_str), Some("power on"));
        assert_eq!(calls.last().map(String::as_str), Some("connect AA:BB:CC:DD:EE:FF"));
    }

    #[tokio::test]
    async fn test_connect_failure() {
        let ctl = controller(FakeRunner::new().failing("connect AA:BB:CC:DD:EE:FF"));

        let result = ctl.connect(ADDR).await;
        assert!(matches!(result, Err(BtError::ConnectFailure { .. })));
    }

    #[tokio::test]
    async fn test_connect_timeout_is_failure() {
        let ctl = controller(FakeRunner::new().hanging("connect AA:BB:CC:DD:EE:FF"));

        match ctl.connect(ADDR).await {
            Err(BtError::ConnectFailure { reason, .. }) => assert!(reason.contains("timed out")),
            other => panic!("expected ConnectFailure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_power_on_failure_is_ignored() {
        let ctl = controller(FakeRunner::new().failing("power on"));

        assert_eq!(ctl.connect(ADDR).await, Ok(()));
    }

    #[tokio::test]
    async fn test_unpowered_adapter_still_attempts_connect() {
        let ctl = controller(FakeRunner::new().with_stdout("show", "\tPowered: no\n"));

        assert_eq!(ctl.connect(ADDR).await, Ok(()));

        let calls = ctl.runner.calls();
        assert!(calls.iter().filter(|c| *c == "show").count() > 1);
        assert_eq!(calls.last().map(String::as_str), Some("connect AA:BB:CC:DD:EE:FF"));
    }

    #[tokio::test]
    async fn test_remove_and_pair_success() {
        let runner = FakeRunner::new().with_stdout("devices", "Device AA:BB:CC:DD:EE:FF WH-1000XM4\n");
        let ctl = controller(runner);

        assert_eq!(ctl.remove_and_pair(ADDR).await, Ok(()));

        let calls = ctl.runner.calls();
        assert_eq!(
            significant_calls(&calls),
            vec![
                "remove AA:BB:CC:DD:EE:FF",
                "discoverable on",
                "pair AA:BB:CC:DD:EE:FF",
                "connect AA:BB:CC:DD:EE:FF",
                "scan off",
            ]
        );
    }

    #[tokio::test]
    async fn test_pair_failure_turns_scan_off() {
        let ctl = controller(FakeRunner::new().failing("pair AA:BB:CC:DD:EE:FF"));

        let result = ctl.remove_and_pair(ADDR).await;
        assert!(matches!(result, Err(BtError::PairFailure { .. })));

        let calls = ctl.runner.calls();
        assert_eq!(calls.last().map(String::as_str), Some("scan off"));
        assert!(!calls.iter().any(|c| c.starts_with("connect")));
    }

    #[tokio::test]
    async fn test_paired_but_not_connected() {
        let ctl = controller(FakeRunner::new().failing("connect AA:BB:CC:DD:EE:FF"));

        let result = ctl.remove_and_pair(ADDR).await;
        assert!(matches!(result, Err(BtError::PartialPairFailure { .. })));
        assert_eq!(ctl.runner.calls().last().map(String::as_str), Some("scan off"));
    }

    #[tokio::test]
    async fn test_remove_failure_is_ignored() {
        let ctl = controller(FakeRunner::new().failing("remove AA:BB:CC:DD:EE:FF"));

        assert_eq!(ctl.remove_and_pair(ADDR).await, Ok(()));
    }

    #[tokio::test]
    async fn test_scan_error_turns_scan_off() {
        let ctl = controller(FakeRunner::new().hanging("--timeout 1 scan on"));

        assert_eq!(ctl.remove_and_pair(ADDR).await, Ok(()));
        assert_eq!(ctl.runner.calls().last().map(String::as_str), Some("scan off"));
    }

    #[tokio::test]
    async fn test_status_not_paired() {
        let ctl = controller(FakeRunner::new().with_stdout("devices", "Device 11:22:33:44:55:66 Keyboard\n"));

        let status = ctl.status(ADDR).await;
        assert_eq!(status, DeviceStatus::not_paired());
        assert!(!ctl.runner.calls().iter().any(|c| c.starts_with("info")));
    }

    #[tokio::test]
    async fn test_status_paired() {
        let runner = FakeRunner::new()
            .with_stdout("devices", "Device aa:bb:cc:dd:ee:ff WH-1000XM4\n")
            .with_stdout(
                "info AA:BB:CC:DD:EE:FF",
                "\tPaired: yes\n\tConnected: yes\n\tBattery Percentage: 0x50 (80)\n",
            );
        let ctl = controller(runner);

        let status = ctl.status(ADDR).await;
        assert_eq!(
            status,
            DeviceStatus {
                paired: true,
                connected: true,
                battery: Some("80".into()),
            }
        );
    }

    #[tokio::test]
    async fn test_status_devices_timeout() {
        let ctl = controller(FakeRunner::new().hanging("devices"));

        assert_eq!(ctl.status(ADDR).await, DeviceStatus::not_paired());
    }
}
