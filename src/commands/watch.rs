//! Headless monitoring: streams log entries or JSON snapshots to stdout
//! until interrupted.

use anyhow::{Context, Result};
use clap::ArgMatches;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::status::print_log_entry;
use super::{choose_port, open_blob_store, ConnectionOverrides};
use crate::core::bin_monitor::{load_store, LogEntry, MonitorRuntime, RuntimeCommand};
use crate::core::transport::SerialPortProvider;
use crate::ui::prompts;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub fn execute(matches: &ArgMatches) -> Result<()> {
    let overrides = ConnectionOverrides::from_matches(matches);
    let json_output = matches.get_flag("json");

    let blobs = open_blob_store()?;
    let store = load_store(blobs.as_ref());
    let provider = Arc::new(SerialPortProvider::new());
    let port = choose_port(provider.as_ref(), store.settings(), overrides.port)?;

    let cancel_flag = Arc::new(AtomicBool::new(false));
    let cancel_flag_clone = cancel_flag.clone();

    // Setup Ctrl+C handler
    ctrlc::set_handler(move || {
        cancel_flag_clone.store(true, Ordering::Relaxed);
    })
    .map_err(|e| anyhow::anyhow!("Failed to set Ctrl+C handler: {}", e))?;

    let runtime = MonitorRuntime::start(store, blobs, provider)
        .context("Failed to start monitor runtime")?;

    if !json_output {
        prompts::info(&format!("Watching {} (Ctrl+C to stop)", port));
    }

    let result = stream(&runtime, port, overrides.baud, json_output, &cancel_flag);

    if !json_output {
        println!();
        prompts::dimmed("Stopping monitor...");
    }
    runtime.shutdown();
    result
}

fn stream(
    runtime: &MonitorRuntime,
    port: String,
    baud: Option<u32>,
    json_output: bool,
    cancel_flag: &AtomicBool,
) -> Result<()> {
    let mut snapshot_rx = runtime.snapshot_rx.clone();
    // Only entries logged from now on are printed
    let mut last_seen = snapshot_rx
        .borrow_and_update()
        .logs
        .last()
        .map(|entry| entry.id);

    runtime.command(RuntimeCommand::Connect {
        port: Some(port),
        baud,
    })?;

    while !cancel_flag.load(Ordering::Relaxed) {
        if !snapshot_rx.has_changed().unwrap_or(false) {
            std::thread::sleep(POLL_INTERVAL);
            continue;
        }

        let snapshot = snapshot_rx.borrow_and_update().clone();
        if json_output {
            println!("{}", serde_json::to_string(snapshot.as_ref())?);
            continue;
        }

        for entry in entries_after(&snapshot.logs, last_seen) {
            print_log_entry(entry);
            last_seen = Some(entry.id);
        }
    }

    Ok(())
}

/// Entries logged after the one with id `since`, or all of them
fn entries_after(logs: &[LogEntry], since: Option<u64>) -> impl Iterator<Item = &LogEntry> {
    logs.iter()
        .filter(move |entry| since.map_or(true, |id| entry.id > id))
}
