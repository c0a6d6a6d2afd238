//! Recovery menu shown after a failed connect

use crate::bluetooth::DeviceOps;
use crate::menu::MenuController;
use anyhow::Result;
use btmenu_shared::state_machine::{parse_recovery, MenuEvent, RecoveryChoice};
use std::io::Write;
use tokio::io::AsyncBufRead;
use tracing::info;

impl<D, I, W> MenuController<D, I, W>
where
    D: DeviceOps,
    I: AsyncBufRead + Unpin,
    W: Write,
{
    /// Handle `Recovery`: run at most one recovery action, then back to the list
    pub(in crate::menu) async fn handle_recovery(&mut self, number: usize) -> Result<MenuEvent> {
        let device = self.device(number)?;

        writeln!(self.output, "Could not connect to {}. What next?", device.label)?;
        for (key, text) in RecoveryChoice::MENU {
            writeln!(self.output, "  {}) {}", key, text)?;
        }

        let line = match self.prompt("Choose [1-4]: ").await? {
            Some(line) => line,
            None => return Ok(MenuEvent::InputClosed),
        };

        let choice = match parse_recovery(&line) {
            Some(choice) => choice,
            None => {
                writeln!(self.output, "Invalid choice: '{}'", line.trim())?;
                self.pause_after_invalid().await;
                return Ok(MenuEvent::RecoveryDone);
            }
        };

        info!("[MENU] Recovery for {}: {:?}", device.address, choice);

        match choice {
            RecoveryChoice::Back => return Ok(MenuEvent::RecoveryDone),
            RecoveryChoice::Retry => {
                writeln!(self.output, "Retrying {}...", device)?;
                self.output.flush()?;
                match self.ops.connect(&device.address).await {
                    Ok(()) => writeln!(self.output, "Connected to {}.", device.label)?,
                    Err(e) => writeln!(self.output, "{}", e)?,
                }
            }
            RecoveryChoice::RemoveAndPair => {
                writeln!(
                    self.output,
                    "Re-pairing {}. Put the device in pairing mode now...",
                    device
                )?;
                self.output.flush()?;
                match self.ops.remove_and_pair(&device.address).await {
                    Ok(()) => writeln!(self.output, "Paired and connected to {}.", device.label)?,
                    Err(e) => writeln!(self.output, "{}", e)?,
                }
            }
            RecoveryChoice::ShowStatus => self.print_status(&device).await?,
        }

        if !self.wait_for_enter().await? {
            return Ok(MenuEvent::InputClosed);
        }
        Ok(MenuEvent::RecoveryDone)
    }
}
