use anyhow::{Context, Result};
use colored::Colorize;

use super::open_blob_store;
use crate::core::config::Settings;
use crate::core::transport::{PortProvider, SerialPortProvider};
use crate::ui::prompts;

/// List the serial ports visible to the host
pub fn execute() -> Result<()> {
    let ports = SerialPortProvider::new()
        .available()
        .context("Failed to enumerate serial ports")?;

    if ports.is_empty() {
        prompts::warn("No serial ports found.");
        prompts::dimmed("Plug the SmartBin controller in and try again.");
        return Ok(());
    }

    let blobs = open_blob_store()?;
    let settings = Settings::load(blobs.as_ref())?;
    let configured = settings.port_path.as_deref();

    println!("{}", "Available serial ports:".white().bold());
    for port in &ports {
        let marker = if Some(port.name.as_str()) == configured {
            " (configured)".green().to_string()
        } else {
            String::new()
        };
        println!(
            "  {:<20} {}{}",
            port.name.cyan().bold(),
            port.description.dimmed(),
            marker
        );
    }

    if configured.is_none() {
        println!();
        println!(
            "{}",
            "Tip: pin one with 'smartbin config set portPath <PORT>'".dimmed()
        );
    }

    Ok(())
}
