//! Interactive menu
//!
//! This module handles:
//! - Listing configured devices and reading selections
//! - Dispatching selections to device operations
//! - The one-level recovery menu after a failed connect

mod controller;
mod handlers;

pub use controller::{MenuConfig, MenuController};
