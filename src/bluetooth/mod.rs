//! Bluetooth control through bluetoothctl
//!
//! This module handles:
//! - Running bluetoothctl with a bounded timeout per call
//! - Connect, re-pair and status operations for configured devices
//! - Startup checks for the utility and the system service

mod controller;
mod runner;
pub mod service;
mod traits;

pub use controller::{ControllerConfig, DeviceController};
pub use runner::BluetoothctlRunner;
pub use traits::DeviceOps;
