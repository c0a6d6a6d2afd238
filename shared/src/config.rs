//! Device configuration loader
//!
//! The configuration is a YAML sequence of devices:
//! ```text
//! - label: Headphones
//!   value: "AA:BB:CC:DD:EE:FF"
//! ```
//! A mapping with a single key wrapping that sequence (e.g. `devices:`) is
//! accepted too.

use crate::{ConfigError, DeviceEntry, DeviceList};
use regex::Regex;
use serde::Deserialize;
use serde_yaml::Value;
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Deserialize)]
struct RawEntry {
    label: String,
    value: String,
}

fn address_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9A-Fa-f:]+$").expect("static regex"))
}

/// Load the device list from `path`
pub fn load(path: impl AsRef<Path>) -> Result<DeviceList, ConfigError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    parse(&content, path)
}

/// Parse configuration text; `path` is only used in error messages
pub fn parse(content: &str, path: &Path) -> Result<DeviceList, ConfigError> {
    let parse_err = |source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    };

    if content.trim().is_empty() {
        return Err(ConfigError::Empty(path.to_path_buf()));
    }

    let root: Value = serde_yaml::from_str(content).map_err(parse_err)?;

    let items = match root {
        Value::Null => return Err(ConfigError::Empty(path.to_path_buf())),
        // Single wrapping key: take its value as the list
        Value::Mapping(map) if map.len() == 1 => match map.into_iter().next() {
            Some((_, inner)) => inner,
            None => return Err(ConfigError::Empty(path.to_path_buf())),
        },
        other => other,
    };

    let raw: Vec<RawEntry> = match items {
        Value::Null => Vec::new(),
        other => serde_yaml::from_value(other).map_err(parse_err)?,
    };

    let mut entries = Vec::with_capacity(raw.len());
    for (index, item) in raw.into_iter().enumerate() {
        let label = item.label.trim().to_string();
        let value = item.value.trim().to_string();

        if label.is_empty() {
            return Err(ConfigError::EmptyLabel { index: index + 1 });
        }
        if !address_pattern().is_match(&value) {
            return Err(ConfigError::InvalidAddress { label, value });
        }

        entries.push(DeviceEntry::new(label, value));
    }

    DeviceList::new(entries).ok_or_else(|| ConfigError::Empty(path.to_path_buf()))
}
