//! One-shot command: connect, send a command, show what the device answers.

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::ArgMatches;
use colored::Colorize;
use std::sync::Arc;
use std::time::Duration;

use super::status::print_log_entry;
use super::{choose_port, open_blob_store, ConnectionOverrides};
use crate::core::bin_monitor::{load_store, LogEntry, LogKind, MonitorRuntime, RuntimeCommand};
use crate::core::protocol::DeviceCommand;
use crate::core::transport::{ConnectionState, SerialPortProvider};

pub fn execute(matches: &ArgMatches) -> Result<()> {
    let overrides = ConnectionOverrides::from_matches(matches);
    let command: DeviceCommand = matches
        .get_one::<String>("command")
        .context("Command argument is required")?
        .parse()
        .map_err(anyhow::Error::msg)?;
    let wait = Duration::from_millis(matches.get_one::<u64>("wait").copied().unwrap_or(2000));

    let blobs = open_blob_store()?;
    let store = load_store(blobs.as_ref());
    let provider = Arc::new(SerialPortProvider::new());
    let port = choose_port(provider.as_ref(), store.settings(), overrides.port)?;

    let runtime = MonitorRuntime::start(store, blobs, provider)
        .context("Failed to start monitor runtime")?;

    let result = send_and_collect(&runtime, port, overrides.baud, command, wait);
    runtime.shutdown();
    result
}

fn send_and_collect(
    runtime: &MonitorRuntime,
    port: String,
    baud: Option<u32>,
    command: DeviceCommand,
    wait: Duration,
) -> Result<()> {
    let first_new = runtime.snapshot().logs.last().map_or(0, |e| e.id + 1);
    let started_at = Local::now();

    runtime.command(RuntimeCommand::Connect {
        port: Some(port.clone()),
        baud,
    })?;
    // Connecting already requests a full report
    if command != DeviceCommand::Status {
        runtime.command(RuntimeCommand::Send(command))?;
    }

    let snapshot = runtime.wait_until(wait, |snapshot| {
        snapshot
            .logs
            .iter()
            .filter(|e| e.id >= first_new)
            .any(|e| e.kind == LogKind::Error || acknowledges(e, command))
            || (command == DeviceCommand::Status
                && snapshot.state.last_update.is_some_and(|t| t >= started_at))
    });
    let entries: Vec<_> = snapshot.logs.iter().filter(|e| e.id >= first_new).collect();
    for entry in &entries {
        print_log_entry(entry);
    }

    if let Some(failure) = entries.iter().find(|e| e.kind == LogKind::Error) {
        bail!("{}", failure.message);
    }
    if snapshot.connection != ConnectionState::Connected {
        bail!("Lost connection to {}", port);
    }

    println!();
    println!(
        "{} capacity {}%, lid {}, {} openings today",
        format!("✓ {} sent.", command.wire()).green().bold(),
        snapshot.state.capacity,
        snapshot.state.status,
        snapshot.state.daily_usage
    );
    Ok(())
}

/// Whether `entry` is the device's `CMD_RECEIVED` answer to `command`
fn acknowledges(entry: &LogEntry, command: DeviceCommand) -> bool {
    entry
        .payload
        .as_ref()
        .and_then(|payload| payload.get("command"))
        .and_then(|value| value.as_str())
        .is_some_and(|received| received.eq_ignore_ascii_case(command.wire()))
}
