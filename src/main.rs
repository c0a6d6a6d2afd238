mod bluetooth;
mod menu;

use anyhow::Result;
use bluetooth::{service, BluetoothctlRunner, ControllerConfig, DeviceController};
use btmenu_shared::{config, StartupError};
use menu::{MenuConfig, MenuController};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::io::BufReader;

use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable overriding the configuration path
const CONFIG_ENV: &str = "BTMENU_CONFIG";

/// Configuration file name under the user config directory
const CONFIG_FILE: &str = "devices.yaml";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Logs go to stderr so they stay out of the menu
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("btmenu: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let program = service::find_bluetoothctl()?;
    info!("Using {}", program.display());

    service::ensure_service_running().await;

    let config_path = config_path();
    info!("[CONFIG] Loading devices from {}", config_path.display());
    let devices = config::load(&config_path).map_err(StartupError::from)?;
    info!("[CONFIG] {} device(s) configured", devices.len());

    let controller_config = ControllerConfig::from_env();
    let runner = BluetoothctlRunner::new(program, controller_config.command_timeout);
    let controller = DeviceController::new(runner, controller_config);

    let mut menu = MenuController::new(
        devices,
        controller,
        BufReader::new(tokio::io::stdin()),
        std::io::stdout(),
        MenuConfig::default(),
    );
    menu.run().await
}

fn config_path() -> PathBuf {
    resolve_config_path(std::env::var_os(CONFIG_ENV).map(PathBuf::from), dirs::config_dir())
}

fn resolve_config_path(explicit: Option<PathBuf>, config_dir: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| match config_dir {
        Some(dir) => dir.join("btmenu").join(CONFIG_FILE),
        None => PathBuf::from(CONFIG_FILE),
    })
}
