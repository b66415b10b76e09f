// Command handlers module
pub mod completions;
pub mod config;
pub mod monitor;
pub mod ports;
pub mod replay;
pub mod send;
pub mod status;
pub mod version;
pub mod watch;

// Re-exports for cleaner imports
pub use monitor::execute as monitor;
pub use ports::execute as ports;
pub use replay::execute as replay;
pub use send::execute as send;
pub use version::execute as version;
pub use watch::execute as watch;

use anyhow::{bail, Context, Result};
use clap::ArgMatches;
use std::sync::Arc;

use crate::core::config::Settings;
use crate::core::storage::FileBlobStore;
use crate::core::transport::PortProvider;
use crate::ui::prompts;

/// Connection values given on the command line for this run only
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionOverrides {
    pub port: Option<String>,
    pub baud: Option<u32>,
}

impl ConnectionOverrides {
    /// Read the global `--port`/`--baud` arguments
    pub fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            port: matches.get_one::<String>("port").cloned(),
            baud: matches.get_one::<u32>("baud").copied(),
        }
    }
}

/// The blob store under the user data directory
pub fn open_blob_store() -> Result<Arc<FileBlobStore>> {
    let store = FileBlobStore::open_default().context("Failed to locate data directory")?;
    Ok(Arc::new(store))
}

/// Decide which port to use: the override, the configured port, the only
/// available port, or an interactive pick among several.
pub fn choose_port(
    provider: &dyn PortProvider,
    settings: &Settings,
    requested: Option<String>,
) -> Result<String> {
    if let Some(port) = requested.or_else(|| settings.port_path.clone()) {
        return Ok(port);
    }

    let ports = provider
        .available()
        .context("Failed to enumerate serial ports")?;

    match ports.len() {
        0 => bail!("No serial ports found. Is the device plugged in?"),
        1 => Ok(ports[0].name.clone()),
        _ => {
            let items: Vec<String> = ports
                .iter()
                .map(|p| format!("{:<16} {}", p.name, p.description))
                .collect();
            match prompts::select_from_list("Select the SmartBin serial port:", &items)? {
                Some(index) => Ok(ports[index].name.clone()),
                None => bail!("No port selected"),
            }
        }
    }
}
