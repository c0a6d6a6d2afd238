//! Status handlers

use crate::bluetooth::DeviceOps;
use crate::menu::MenuController;
use anyhow::Result;
use btmenu_shared::state_machine::MenuEvent;
use btmenu_shared::DeviceEntry;
use std::io::Write;
use tokio::io::AsyncBufRead;

impl<D, I, W> MenuController<D, I, W>
where
    D: DeviceOps,
    I: AsyncBufRead + Unpin,
    W: Write,
{
    /// Handle `StatusAll`: report every device in menu order
    pub(in crate::menu) async fn handle_status_all(&mut self) -> Result<MenuEvent> {
        writeln!(self.output, "Checking device status...")?;
        self.output.flush()?;

        let devices: Vec<DeviceEntry> = self.devices.iter().cloned().collect();
        for device in &devices {
            self.print_status(device).await?;
        }

        if !self.wait_for_enter().await? {
            return Ok(MenuEvent::InputClosed);
        }
        Ok(MenuEvent::StatusShown)
    }

    pub(in crate::menu) async fn print_status(&mut self, device: &DeviceEntry) -> Result<()> {
        let status = self.ops.status(&device.address).await;
        writeln!(self.output, "  {}: {}", device, status)?;
        Ok(())
    }
}
