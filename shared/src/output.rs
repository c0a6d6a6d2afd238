//! Parsing of `bluetoothctl` textual output
//!
//! bluetoothctl has no machine-readable mode, so the formats below are the
//! only coupling to its text:
//! ```text
//! devices:  Device AA:BB:CC:DD:EE:FF Headphones
//! info:     \tConnected: yes
//!           \tBattery Percentage: 0x64 (100)
//! show:     \tPowered: yes
//! ```

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// What `status` reports about one device
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceStatus {
    pub paired: bool,
    pub connected: bool,
    /// Battery level in percent, as reported by the device
    pub battery: Option<String>,
}

impl DeviceStatus {
    pub fn not_paired() -> Self {
        Self::default()
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.paired {
            return write!(f, "not paired");
        }

        write!(
            f,
            "paired, {}",
            if self.connected { "connected" } else { "not connected" }
        )?;
        if let Some(ref battery) = self.battery {
            write!(f, ", battery {}%", battery)?;
        }
        Ok(())
    }
}

fn battery_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"Battery Percentage:\s*0x[0-9A-Fa-f]+\s*\((\d+)\)").expect("static regex")
    })
}

/// Check whether `devices` output lists `address`
pub fn lists_address(devices_output: &str, address: &str) -> bool {
    devices_output.lines().any(|line| {
        let mut parts = line.split_whitespace();
        matches!(
            (parts.next(), parts.next()),
            (Some("Device"), Some(addr)) if addr.eq_ignore_ascii_case(address)
        )
    })
}

/// Extract `(connected, battery)` from `info <addr>` output
pub fn parse_info(info_output: &str) -> (bool, Option<String>) {
    let connected = has_flag(info_output, "Connected");
    let battery = battery_pattern()
        .captures(info_output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());

    (connected, battery)
}

/// Check whether `show` output reports the adapter as powered
pub fn is_powered(show_output: &str) -> bool {
    has_flag(show_output, "Powered")
}

/// Look for a `<key>: yes` line
fn has_flag(output: &str, key: &str) -> bool {
    output.lines().any(|line| {
        line.trim()
            .strip_prefix(key)
            .and_then(|rest| rest.strip_prefix(':'))
            .map(|value| value.trim() == "yes")
            .unwrap_or(false)
    })
}
