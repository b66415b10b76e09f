use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use clap_complete::Shell;

use smartbin::commands;
use smartbin::core::storage::FileBlobStore;

fn build_cli() -> Command {
    Command::new("smartbin")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Monitor and control a SmartBin controller over a serial port")
        .disable_version_flag(true)
        .arg(
            Arg::new("version")
                .short('v')
                .short_alias('V')
                .long("version")
                .help("Print version information")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("Serial port to use, overriding the configured one")
                .global(true),
        )
        .arg(
            Arg::new("baud")
                .short('b')
                .long("baud")
                .value_name("RATE")
                .help("Baud rate for this run, overriding the configured one")
                .value_parser(clap::value_parser!(u32))
                .global(true),
        )
        .subcommand(
            Command::new("monitor")
                .about("Open the live dashboard")
                .arg(
                    Arg::new("tick")
                        .long("tick")
                        .value_name("MS")
                        .help("Screen refresh interval in milliseconds")
                        .value_parser(clap::value_parser!(u64).range(50..))
                        .default_value("250"),
                )
                .arg(
                    Arg::new("no-connect")
                        .long("no-connect")
                        .help("Start disconnected; press 'c' to connect")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("watch")
                .about("Stream device activity to stdout until Ctrl+C")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print every snapshot as a JSON line")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("send")
                .about("Send one command to the device (STATUS, BUKA/OPEN, TUTUP/CLOSE)")
                .arg(
                    Arg::new("command")
                        .help("Command to send")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("wait")
                        .short('w')
                        .long("wait")
                        .value_name("MS")
                        .help("How long to collect the device's answer")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("2000"),
                ),
        )
        .subcommand(
            Command::new("status")
                .about("Show the last known bin state")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print the state as JSON")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("logs")
                .about("Show recent log entries")
                .arg(
                    Arg::new("limit")
                        .short('n')
                        .long("limit")
                        .help("Number of entries to show")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("20"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print entries as JSON")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("history")
                .about("Show recorded fill history")
                .arg(
                    Arg::new("period")
                        .help("Aggregation to show")
                        .value_parser(["daily", "weekly", "monthly"])
                        .default_value("weekly")
                        .index(1),
                )
                .arg(
                    Arg::new("limit")
                        .short('n')
                        .long("limit")
                        .help("Number of raw samples to show with 'daily'")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("20"),
                ),
        )
        .subcommand(
            Command::new("replay")
                .about("Feed a captured serial log through the monitor pipeline")
                .arg(
                    Arg::new("file")
                        .help("Capture file, one device line per line")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("chunk-size")
                        .long("chunk-size")
                        .value_name("BYTES")
                        .help("Split the capture into chunks of this size instead of lines")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("save")
                        .long("save")
                        .help("Apply on top of the stored state and save the result")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("ports").about("List available serial ports"))
        .subcommand(
            Command::new("config")
                .about("Read or change settings (use 'smartbin config --help' for subcommands)")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(
                    Command::new("get")
                        .about("Show one setting, or all of them")
                        .arg(Arg::new("key").help("Setting name, e.g. alertThreshold").index(1)),
                )
                .subcommand(
                    Command::new("set")
                        .about("Change a setting")
                        .arg(Arg::new("key").help("Setting name").required(true).index(1))
                        .arg(Arg::new("value").help("New value").required(true).index(2)),
                )
                .subcommand(
                    Command::new("reset")
                        .about("Restore default settings")
                        .arg(
                            Arg::new("all")
                                .long("all")
                                .help("Also delete stored state, history and logs")
                                .action(ArgAction::SetTrue),
                        )
                        .arg(
                            Arg::new("yes")
                                .short('y')
                                .long("yes")
                                .help("Do not ask for confirmation")
                                .action(ArgAction::SetTrue),
                        ),
                ),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .help("Target shell")
                        .required(true)
                        .value_parser(clap::value_parser!(Shell))
                        .index(1),
                ),
        )
        .subcommand(Command::new("version").about("Shows version information"))
}

fn main() -> Result<()> {
    let matches = build_cli().get_matches();

    if matches.get_flag("version") {
        return commands::version();
    }

    // The dashboard owns the screen, so its logs go to a file
    match matches.subcommand_name() {
        Some("monitor") => {
            let log_path = FileBlobStore::default_dir()?.join("smartbin.log");
            smartbin::init_file_logging(&log_path);
        }
        _ => smartbin::init_logging(),
    }

    match matches.subcommand() {
        Some(("monitor", sub_matches)) => commands::monitor(sub_matches)?,
        Some(("watch", sub_matches)) => commands::watch(sub_matches)?,
        Some(("send", sub_matches)) => commands::send(sub_matches)?,
        Some(("status", sub_matches)) => commands::status::execute_status(sub_matches)?,
        Some(("logs", sub_matches)) => commands::status::execute_logs(sub_matches)?,
        Some(("history", sub_matches)) => commands::status::execute_history(sub_matches)?,
        Some(("replay", sub_matches)) => commands::replay(sub_matches)?,
        Some(("ports", _)) => commands::ports()?,
        Some(("config", sub_matches)) => match sub_matches.subcommand() {
            Some(("get", m)) => commands::config::handle_get(m)?,
            Some(("set", m)) => commands::config::handle_set(m)?,
            Some(("reset", m)) => commands::config::handle_reset(m)?,
            _ => println!("Use 'smartbin config --help' for more information."),
        },
        Some(("completions", sub_matches)) => {
            let mut cli = build_cli();
            commands::completions::execute(sub_matches, &mut cli)?;
        }
        Some(("version", _)) => commands::version()?,
        _ => {
            println!("Welcome to smartbin!");
            println!("Use 'smartbin --help' for more information.");
        }
    }

    Ok(())
}
