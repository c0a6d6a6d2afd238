//! Connect handler

use crate::bluetooth::DeviceOps;
use crate::menu::MenuController;
use anyhow::Result;
use btmenu_shared::state_machine::MenuEvent;
use std::io::Write;
use tokio::io::AsyncBufRead;

impl<D, I, W> MenuController<D, I, W>
where
    D: DeviceOps,
    I: AsyncBufRead + Unpin,
    W: Write,
{
    /// Handle `Connecting`: one attempt, success back to the list, failure to recovery
    pub(in crate::menu) async fn handle_connect(&mut self, number: usize) -> Result<MenuEvent> {
        let device = self.device(number)?;

        writeln!(self.output, "Connecting to {}...", device)?;
        self.output.flush()?;

        match self.ops.connect(&device.address).await {
            Ok(()) => {
                writeln!(self.output, "Connected to {}.", device.label)?;
                if !self.wait_for_enter().await? {
                    return Ok(MenuEvent::InputClosed);
                }
                Ok(MenuEvent::ConnectSucceeded)
            }
            Err(e) => {
                writeln!(self.output, "{}", e)?;
                Ok(MenuEvent::ConnectFailed)
            }
        }
    }
}
