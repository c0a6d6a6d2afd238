//! Menu controller - drives the menu state machine against user input

use crate::bluetooth::DeviceOps;
use anyhow::{anyhow, Result};
use btmenu_shared::state_machine::{
    parse_selection, MenuEvent, MenuState, MenuStateMachine, Selection, TransitionResult,
};
use btmenu_shared::{timing, DeviceEntry, DeviceList};
use std::io::Write;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

/// Menu behaviour settings
#[derive(Debug, Clone)]
pub struct MenuConfig {
    /// Pause after an invalid selection so the message can be read
    pub invalid_pause: Duration,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            invalid_pause: Duration::from_millis(timing::INVALID_PAUSE_MS),
        }
    }
}

/// Interactive menu over a device list
pub struct MenuController<D, I, W> {
    pub(super) devices: DeviceList,
    pub(super) ops: D,
    pub(super) output: W,
    input: I,
    config: MenuConfig,
    fsm: MenuStateMachine,
}

impl<D, I, W> MenuController<D, I, W>
where
    D: DeviceOps,
    I: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(devices: DeviceList, ops: D, input: I, output: W, config: MenuConfig) -> Self {
        let fsm = MenuStateMachine::new(devices.len());
        Self {
            devices,
            ops,
            output,
            input,
            config,
            fsm,
        }
    }

    /// Run until the user quits or input ends
    pub async fn run(&mut self) -> Result<()> {
        loop {
            let event = match self.fsm.state() {
                MenuState::Listing => {
                    self.show_list()?;
                    MenuEvent::Shown
                }
                MenuState::Selecting => self.select().await?,
                MenuState::Connecting(number) => self.handle_connect(number).await?,
                MenuState::Recovery(number) => self.handle_recovery(number).await?,
                MenuState::StatusAll => self.handle_status_all().await?,
                MenuState::Quit => {
                    writeln!(self.output, "Goodbye.")?;
                    self.output.flush()?;
                    return Ok(());
                }
            };

            match self.fsm.process_event(event) {
                TransitionResult::Success(state) => debug!("[MENU] -> {:?}", state),
                TransitionResult::Invalid { from, event } => {
                    warn!("[MENU] Ignoring {:?} in {:?}, back to the list", event, from);
                    self.fsm = MenuStateMachine::new(self.devices.len());
                }
            }
        }
    }

    fn show_list(&mut self) -> Result<()> {
        writeln!(self.output)?;
        writeln!(self.output, "Bluetooth devices:")?;
        for (i, device) in self.devices.iter().enumerate() {
            writeln!(self.output, "  {}) {}", i + 1, device)?;
        }
        writeln!(self.output, "  s) Show status of all devices")?;
        writeln!(self.output, "  q) Quit")?;
        Ok(())
    }

    async fn select(&mut self) -> Result<MenuEvent> {
        let line = match self.prompt("Select an option: ").await? {
            Some(line) => line,
            None => return Ok(MenuEvent::InputClosed),
        };

        let selection = parse_selection(&line, self.devices.len());
        if selection == Selection::Invalid {
            writeln!(self.output, "Invalid selection: '{}'", line.trim())?;
            self.pause_after_invalid().await;
        }

        Ok(MenuEvent::Selected(selection))
    }

    /// Print `text` and read one line; `None` once input is closed
    pub(super) async fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        write!(self.output, "{}", text)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line))
    }

    /// Wait for Enter; false if input is closed
    pub(super) async fn wait_for_enter(&mut self) -> Result<bool> {
        Ok(self.prompt("Press Enter to continue...").await?.is_some())
    }

    pub(super) async fn pause_after_invalid(&self) {
        if !self.config.invalid_pause.is_zero() {
            tokio::time::sleep(self.config.invalid_pause).await;
        }
    }

    pub(super) fn device(&self, number: usize) -> Result<DeviceEntry> {
        self.devices
            .by_number(number)
            .cloned()
            .ok_or_else(|| anyhow!("No device numbered {}", number))
    }
}

#[cfg(test)]
pub(super) mod tests {
    use super::*;
    use async_trait::async_trait;
    use btmenu_shared::{BtError, DeviceStatus};
    use std::collections::{HashMap, VecDeque};
    use std::sync::{Arc, Mutex};

    pub(in crate::menu) const HEADPHONES: &str = "AA:BB:CC:DD:EE:FF";
    pub(in crate::menu) const KEYBOARD: &str = "11:22:33:44:55:66";

    #[derive(Default)]
    struct FakeState {
        calls: Vec<String>,
        connect_results: VecDeque<Result<(), BtError>>,
        pair_result: Option<Result<(), BtError>>,
        statuses: HashMap<String, DeviceStatus>,
    }

    /// Records every operation; connect fails unless a result is queued
    #[derive(Clone, Default)]
    pub(in crate::menu) struct FakeOps {
        state: Arc<Mutex<FakeState>>,
    }

    impl FakeOps {
        pub(in crate::menu) fn queue_connect(&self, result: Result<(), BtError>) {
            self.state.lock().unwrap().connect_results.push_back(result);
        }

        pub(in crate::menu) fn set_pair_result(&self, result: Result<(), BtError>) {
            self.state.lock().unwrap().pair_result = Some(result);
        }

        pub(in crate::menu) fn set_status(&self, address: &str, status: DeviceStatus) {
            self.state
                .lock()
                .unwrap()
                .statuses
                .insert(address.into(), status);
        }

        pub(in crate::menu) fn calls(&self) -> Vec<String> {
            self.state.lock().unwrap().calls.clone()
        }
    }

    pub(in crate::menu) fn connect_failure(address: &str) -> BtError {
        BtError::ConnectFailure {
            address: address.into(),
            reason: "Failed to connect: org.bluez.Error.Failed".into(),
        }
    }

    #[async_trait]
    impl DeviceOps for FakeOps {
        async fn connect(&self, address: &str) -> Result<(), BtError> {
            let mut state = self.state.lock().unwrap();
            state.calls.push(format!("connect {}", address));
            state
                .connect_results
                .pop_front()
                .unwrap_or_else(|| Err(connect_failure(address)))
        }

        async fn remove_and_pair(&self, address: &str) -> Result<(), BtError> {
            let mut state = self.state.lock().unwrap();
            state.calls.push(format!("remove_and_pair {}", address));
            state.pair_result.clone().unwrap_or(Ok(()))
        }

        async fn status(&self, address: &str) -> DeviceStatus {
            let mut state = self.state.lock().unwrap();
            state.calls.push(format!("status {}", address));
            state.statuses.get(address).cloned().unwrap_or_default()
        }
    }

    pub(in crate::menu) fn devices(count: usize) -> DeviceList {
        let all = [("Headphones", HEADPHONES), ("Keyboard", KEYBOARD)];
        DeviceList::new(
            all.iter()
                .take(count)
                .map(|(label, addr)| DeviceEntry::new(*label, *addr))
                .collect(),
        )
        .unwrap()
    }

    /// Run a menu over `input` and return the printed text
    pub(in crate::menu) async fn run_menu(list: DeviceList, ops: FakeOps, input: &str) -> String {
        let config = MenuConfig {
            invalid_pause: Duration::ZERO,
        };
        let mut menu = MenuController::new(list, ops, input.as_bytes(), Vec::new(), config);
        menu.run().await.unwrap();
        String::from_utf8(menu.output).unwrap()
    }

    #[tokio::test]
    async fn test_single_device_listing() {
        let output = run_menu(devices(1), FakeOps::default(), "q\n").await;

        assert!(output.contains("  1) Headphones (AA:BB:CC:DD:EE:FF)"));
        assert!(!output.contains("  2) "));
        assert!(output.contains("  s) Show status of all devices"));
        assert!(output.contains("  q) Quit"));
        assert!(output.ends_with("Goodbye.\n"));
    }

    #[tokio::test]
    async fn test_invalid_selections_never_touch_devices() {
        let ops = FakeOps::default();
        let output = run_menu(devices(1), ops.clone(), "0\n2\nabc\n\n-1\nq\n").await;

        assert!(ops.calls().is_empty());
        assert_eq!(output.matches("Invalid selection").count(), 5);
        assert_eq!(output.matches("Bluetooth devices:").count(), 6);
    }

    #[tokio::test]
    async fn test_connect_success_returns_to_listing() {
        let ops = FakeOps::default();
        ops.queue_connect(Ok(()));

        let output = run_menu(devices(2), ops.clone(), "2\n\nq\n").await;

        assert_eq!(ops.calls(), vec!["connect 11:22:33:44:55:66"]);
        assert!(output.contains("Connected to Keyboard."));
        assert!(!output.contains("Retry connection"));
        assert_eq!(output.matches("Bluetooth devices:").count(), 2);
    }

    #[tokio::test]
    async fn test_end_of_input_quits() {
        let ops = FakeOps::default();
        let output = run_menu(devices(1), ops.clone(), "").await;

        assert!(ops.calls().is_empty());
        assert!(output.ends_with("Goodbye.\n"));
    }

    #[tokio::test]
    async fn test_status_all_in_list_order() {
        let ops = FakeOps::default();
        ops.set_status(
            KEYBOARD,
            DeviceStatus {
                paired: true,
                connected: true,
                battery: Some("80".into()),
            },
        );

        let output = run_menu(devices(2), ops.clone(), "s\n\nq\n").await;

        assert_eq!(
            ops.calls(),
            vec!["status AA:BB:CC:DD:EE:FF", "status 11:22:33:44:55:66"]
        );
        assert!(output.contains("Headphones (AA:BB:CC:DD:EE:FF): not paired"));
        assert!(output.contains("Keyboard (11:22:33:44:55:66): paired, connected, battery 80%"));
    }
}
