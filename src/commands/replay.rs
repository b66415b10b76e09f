//! Feed a captured serial log through the same line pipeline the live
//! connection uses.

use anyhow::{Context, Result};
use chrono::Local;
use clap::ArgMatches;
use colored::Colorize;
use std::fs;
use std::path::Path;

use super::open_blob_store;
use crate::core::bin_monitor::{load_store, save_store, StateStore, Transition};
use crate::core::config::Settings;
use crate::core::protocol::{DeviceEvent, LineAssembler};
use crate::ui::prompts;

/// Totals of one replay
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplaySummary {
    pub chunks: usize,
    pub events: usize,
    pub applied: usize,
    pub superseded: usize,
    pub openings: usize,
}

pub fn execute(matches: &ArgMatches) -> Result<()> {
    let path = matches
        .get_one::<String>("file")
        .context("File argument is required")?;
    let chunk_size = matches.get_one::<usize>("chunk-size").copied();
    let save = matches.get_flag("save");

    let capture = fs::read_to_string(Path::new(path))
        .with_context(|| format!("Failed to read capture '{}'", path))?;

    let blobs = open_blob_store()?;
    let mut store = if save {
        load_store(blobs.as_ref())
    } else {
        StateStore::new(Settings::load(blobs.as_ref())?)
    };

    let summary = replay_capture(&mut store, &capture, chunk_size);
    log::info!("Replayed {} chunks from {}", summary.chunks, path);

    let state = store.state();
    println!("{}", format!("Replayed {}", path).white().bold());
    println!(
        "  {} chunks, {} events, {} applied, {} superseded",
        summary.chunks, summary.events, summary.applied, summary.superseded
    );
    println!(
        "  Final state: capacity {}%, lid {}, distance {} cm, {} today / {} total ({} openings seen)",
        state.capacity,
        state.status,
        state.distance,
        state.daily_usage,
        state.total_usage,
        summary.openings
    );

    if save {
        if save_store(blobs.as_ref(), &store) {
            prompts::success("✓ State saved");
        } else {
            prompts::error("State could not be saved, see log output");
        }
    }

    Ok(())
}

/// Push `capture` through a line assembler, either line by line or in
/// fixed-size chunks that may cut lines, applying each chunk as one batch.
pub fn replay_capture(
    store: &mut StateStore,
    capture: &str,
    chunk_size: Option<usize>,
) -> ReplaySummary {
    let mut assembler = LineAssembler::new();
    let mut summary = ReplaySummary::default();

    let chunks: Vec<&str> = match chunk_size {
        Some(size) if size > 0 => split_at_char_boundaries(capture, size),
        _ => capture.split_inclusive('\n').collect(),
    };

    for chunk in chunks {
        summary.chunks += 1;
        let events = assembler.push(chunk);
        apply(store, &events, &mut summary);
    }
    let rest = assembler.flush();
    apply(store, &rest, &mut summary);

    summary
}

fn apply(
    store: &mut StateStore,
    events: &[DeviceEvent],
    summary: &mut ReplaySummary,
) {
    if events.is_empty() {
        return;
    }
    let outcome = store.apply_batch(events, Local::now());
    summary.events += events.len();
    summary.applied += outcome.applied;
    summary.superseded += outcome.superseded;
    if outcome.transition == Some(Transition::Opened) {
        summary.openings += 1;
    }
}

fn split_at_char_boundaries(text: &str, size: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < text.len() {
        let mut end = (start + size).min(text.len());
        while !text.is_char_boundary(end) {
            end += 1;
        }
        chunks.push(&text[start..end]);
        start = end;
    }
    chunks
}
