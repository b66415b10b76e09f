//! Dashboard command handler.
//!
//! Runs the monitor runtime and the TUI on top of it.

use anyhow::{Context, Result};
use clap::ArgMatches;
use std::sync::Arc;

use super::{choose_port, open_blob_store, ConnectionOverrides};
use crate::core::bin_monitor::{load_store, MonitorRuntime};
use crate::core::transport::SerialPortProvider;
use crate::ui::dashboard_tui::{run_dashboard_app, DashboardAppConfig};

/// Execute the monitor command
pub fn execute(matches: &ArgMatches) -> Result<()> {
    let overrides = ConnectionOverrides::from_matches(matches);
    let tick_ms = matches.get_one::<u64>("tick").copied().unwrap_or(250);
    let connect_on_start = !matches.get_flag("no-connect");

    let blobs = open_blob_store()?;
    let store = load_store(blobs.as_ref());
    let provider = Arc::new(SerialPortProvider::new());

    // Pick the port before the alternate screen takes over the terminal
    let port = if connect_on_start {
        Some(choose_port(provider.as_ref(), store.settings(), overrides.port)?)
    } else {
        overrides.port
    };

    let runtime = MonitorRuntime::start(store, blobs, provider)
        .context("Failed to start monitor runtime")?;

    let config = DashboardAppConfig {
        tick_ms,
        port,
        baud: overrides.baud,
        connect_on_start,
    };

    let result = run_dashboard_app(&runtime, config).context("Failed to run dashboard");
    runtime.shutdown();
    result
}
