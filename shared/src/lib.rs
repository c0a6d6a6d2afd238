//! btmenu shared types
//!
//! Everything that does not spawn a process or talk to a terminal: the
//! device list model, the configuration loader, the menu state machine and
//! the parser for `bluetoothctl` output.

pub mod config;
pub mod error;
pub mod output;
pub mod state_machine;

pub use error::{BtError, ConfigError, CtlError, StartupError};
pub use output::DeviceStatus;

use std::fmt;

/// Timing parameters for talking to the Bluetooth stack
pub mod timing {
    /// Upper bound for a single `bluetoothctl` invocation
    pub const COMMAND_TIMEOUT_SECS: u64 = 30;

    /// How long to wait for the adapter to report `Powered: yes`
    pub const SETTLE_TIMEOUT_MS: u64 = 3000;

    /// How long a pairing scan runs before giving up on visibility
    pub const SCAN_WINDOW_SECS: u64 = 10;

    /// Interval between polls of `show` / `devices`
    pub const POLL_INTERVAL_MS: u64 = 500;

    /// Pause after an invalid menu selection
    pub const INVALID_PAUSE_MS: u64 = 1000;
}

/// A configured device: what the user sees and what bluetoothctl needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEntry {
    pub label: String,
    pub address: String,
}

impl DeviceEntry {
    pub fn new(label: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            address: address.into(),
        }
    }
}

impl fmt::Display for DeviceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.address)
    }
}

/// Ordered, non-empty list of devices
///
/// Menu numbering is 1-based and follows the order of the configuration
/// file, so entries are never reordered after loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceList {
    entries: Vec<DeviceEntry>,
}

impl DeviceList {
    /// Build a list, returning `None` if there are no entries
    pub fn new(entries: Vec<DeviceEntry>) -> Option<Self> {
        if entries.is_empty() {
            None
        } else {
            Some(Self { entries })
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Never true for a list built through `new`
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a device by its 1-based menu number
    pub fn by_number(&self, number: usize) -> Option<&DeviceEntry> {
        number.checked_sub(1).and_then(|i| self.entries.get(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeviceEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a DeviceList {
    type Item = &'a DeviceEntry;
    type IntoIter = std::slice::Iter<'a, DeviceEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
