use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;

use super::open_blob_store;
use crate::core::config::{Settings, SETTING_KEYS};
use crate::core::storage::{BlobStore, ALL_KEYS};
use crate::ui::prompts;

pub fn handle_get(matches: &ArgMatches) -> Result<()> {
    let blobs = open_blob_store()?;
    let settings = Settings::load(blobs.as_ref())?;

    match matches.get_one::<String>("key") {
        Some(key) => match settings.get_value(key) {
            Some(value) => println!("{}", value.cyan().bold()),
            None => {
                println!("{}", format!("Unknown setting '{}'.", key).yellow());
                print_known_keys();
            }
        },
        None => {
            println!("{}", "Current settings:".white().bold());
            for key in SETTING_KEYS {
                let value = settings.get_value(key).unwrap_or_default();
                println!("  {:<22} {}", key, value.cyan());
            }
            println!();
            println!(
                "{}",
                format!("Stored in {}", blobs.dir().display()).dimmed()
            );
        }
    }

    Ok(())
}

pub fn handle_set(matches: &ArgMatches) -> Result<()> {
    let key = matches
        .get_one::<String>("key")
        .context("Key argument is required")?;
    let value = matches
        .get_one::<String>("value")
        .context("Value argument is required")?;

    let blobs = open_blob_store()?;
    let mut settings = Settings::load(blobs.as_ref())?;
    settings.set_value(key, value)?;
    settings.save(blobs.as_ref())?;

    let shown = settings.get_value(key).unwrap_or_else(|| value.clone());
    println!("{} {}", format!("✓ {} set to:", key).green(), shown.bold());

    Ok(())
}

pub fn handle_reset(matches: &ArgMatches) -> Result<()> {
    let wipe_all = matches.get_flag("all");
    let question = if wipe_all {
        "Delete all stored state, history, logs and settings? [y/N]"
    } else {
        "Reset all settings to defaults? [y/N]"
    };

    if !matches.get_flag("yes") && !prompts::confirm(question)? {
        prompts::dimmed("Cancelled.");
        return Ok(());
    }

    let blobs = open_blob_store()?;
    if wipe_all {
        for key in ALL_KEYS {
            blobs
                .remove(key)
                .with_context(|| format!("Failed to remove stored '{}'", key))?;
        }
        prompts::success("✓ All stored data removed");
    } else {
        Settings::default().save(blobs.as_ref())?;
        prompts::success("✓ Settings reset to defaults");
    }

    Ok(())
}

fn print_known_keys() {
    println!();
    println!("{}", "Known settings:".white());
    for key in SETTING_KEYS {
        println!("  {}", key.dimmed());
    }
}
