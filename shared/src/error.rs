//! Error taxonomy

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading the device configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("No devices configured in {}", .0.display())]
    Empty(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Device '{label}' has an invalid address: '{value}'")]
    InvalidAddress { label: String, value: String },

    #[error("Device entry {index} has an empty label")]
    EmptyLabel { index: usize },
}

/// Fatal errors that stop the program before the menu is shown
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Required tool '{0}' was not found in PATH")]
    MissingDependency(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Recoverable Bluetooth operation failures, reported to the user
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BtError {
    #[error("Failed to connect to {address}: {reason}")]
    ConnectFailure { address: String, reason: String },

    #[error("Failed to pair with {address}: {reason}")]
    PairFailure { address: String, reason: String },

    #[error("Paired with {address} but could not connect: {reason}")]
    PartialPairFailure { address: String, reason: String },
}

/// Failures of a single `bluetoothctl` invocation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CtlError {
    #[error("Failed to run {program}: {reason}")]
    Spawn { program: String, reason: String },

    #[error("'{command}' timed out after {after:?}")]
    Timeout { command: String, after: Duration },
}
