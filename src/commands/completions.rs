use anyhow::{Context, Result};
use clap::{ArgMatches, Command};
use clap_complete::{generate, Shell};
use std::io;

/// Write the completion script for the requested shell to stdout
pub fn execute(matches: &ArgMatches, cli: &mut Command) -> Result<()> {
    let shell = matches
        .get_one::<Shell>("shell")
        .copied()
        .context("Shell argument is required (bash, zsh, fish, powershell, elvish)")?;

    let name = cli.get_name().to_string();
    generate(shell, cli, name, &mut io::stdout());
    Ok(())
}
