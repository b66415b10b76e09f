//! Inspection of the persisted monitor state: `status`, `logs`, `history`.

use anyhow::{bail, Result};
use chrono::Local;
use clap::ArgMatches;
use colored::{ColoredString, Colorize};

use super::open_blob_store;
use crate::core::bin_monitor::{
    evaluate_alerts, load_store, AlertSeverity, BucketSummary, LogEntry, LogKind, StateStore,
};
use crate::ui::formatters::{capacity_bar, format_clock, format_optional_time, format_since};

pub fn execute_status(matches: &ArgMatches) -> Result<()> {
    let store = load_persisted()?;

    if matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(store.state())?);
        return Ok(());
    }

    let now = Local::now();
    let state = store.state();
    let settings = store.settings();

    println!("{}", "SmartBin status".white().bold());
    println!(
        "  Capacity:      {}",
        colored_capacity(&capacity_bar(state.capacity, 20), state.capacity, settings.alert_threshold)
    );
    println!("  Lid:           {}", state.status.to_string().bold());
    println!(
        "  Distance:      {} cm (range {}-{} cm)",
        state.distance, settings.min_distance, settings.max_distance
    );
    println!("  Openings:      {} today, {} total", state.daily_usage, state.total_usage);
    println!(
        "  Last update:   {} ({})",
        format_optional_time(state.last_update.as_ref()),
        format_since(state.last_update.as_ref(), now)
    );
    println!(
        "  Last activity: {}",
        format_optional_time(state.last_activity.as_ref())
    );

    let alerts = evaluate_alerts(state, settings, now);
    if !alerts.is_empty() {
        println!();
        for alert in alerts {
            let line = match alert.severity {
                AlertSeverity::Critical => alert.message.red().bold(),
                AlertSeverity::Warning => alert.message.yellow().bold(),
                AlertSeverity::Info => alert.message.cyan(),
            };
            println!("  {}", line);
        }
    }

    Ok(())
}

pub fn execute_logs(matches: &ArgMatches) -> Result<()> {
    let limit = matches.get_one::<usize>("limit").copied().unwrap_or(20);
    let store = load_persisted()?;
    let entries = store.logs().recent(limit);

    if matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("{}", "No log entries recorded yet.".dimmed());
        return Ok(());
    }

    for entry in &entries {
        print_log_entry(entry);
    }
    Ok(())
}

pub fn execute_history(matches: &ArgMatches) -> Result<()> {
    let period = matches
        .get_one::<String>("period")
        .map(String::as_str)
        .unwrap_or("weekly");
    let store = load_persisted()?;
    let history = store.history();

    match period {
        "daily" => {
            let limit = matches.get_one::<usize>("limit").copied().unwrap_or(20);
            let daily = history.daily();
            let start = daily.len().saturating_sub(limit);
            if daily.is_empty() {
                println!("{}", "No samples recorded yet.".dimmed());
            }
            for sample in &daily[start..] {
                println!(
                    "  {}  {}",
                    format_optional_time(Some(&sample.timestamp)).dimmed(),
                    capacity_bar(sample.capacity, 20)
                );
            }
        }
        "weekly" | "monthly" => {
            let buckets = if period == "weekly" {
                history.weekly()
            } else {
                history.monthly()
            };
            if buckets.is_empty() {
                println!("{}", "No history recorded yet.".dimmed());
            }
            for (key, bucket) in buckets {
                print_bucket(&BucketSummary::from_bucket(key, bucket));
            }
        }
        other => bail!("Unknown period '{}'. Use daily, weekly or monthly", other),
    }

    Ok(())
}

fn load_persisted() -> Result<StateStore> {
    let blobs = open_blob_store()?;
    Ok(load_store(blobs.as_ref()))
}

fn print_bucket(summary: &BucketSummary) {
    println!(
        "  {:<12} avg {:>5.1}%  min {:>3}%  max {:>3}%  ({} samples)",
        summary.key.cyan().bold(),
        summary.average,
        summary.min,
        summary.max,
        summary.count
    );
}

fn colored_capacity(text: &str, capacity: u8, threshold: u8) -> ColoredString {
    if capacity >= 100 {
        text.red().bold()
    } else if capacity >= threshold {
        text.yellow().bold()
    } else {
        text.green()
    }
}

/// One log line, colored by kind
pub(crate) fn print_log_entry(entry: &LogEntry) {
    let kind = format!("{:<7}", entry.kind.label());
    let kind = match entry.kind {
        LogKind::Info => kind.cyan(),
        LogKind::Success => kind.green(),
        LogKind::Warning => kind.yellow(),
        LogKind::Error => kind.red().bold(),
        LogKind::Device => kind.white(),
    };
    println!(
        "{} {} {}",
        format_clock(&entry.timestamp).dimmed(),
        kind,
        entry.message
    );
}
