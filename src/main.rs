use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use colored::*;

use g14mon::commands;
use g14mon::platform;

fn cli() -> Command {
    Command::new("g14mon")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Hardware monitor and power plan control for the ROG Zephyrus G14")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("run")
                .about("Sample CPU, GPU, RAM, disk and battery until Ctrl-C")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print one JSON line per update instead of the dashboard")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("no-power-plans")
                        .long("no-power-plans")
                        .help("Do not switch to Balanced when running on battery")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("snapshot")
                .about("Take a single sample and print it")
                .arg(
                    Arg::new("drive")
                        .short('d')
                        .long("drive")
                        .value_name("VOLUME")
                        .help("Volume to report (defaults to the Drive setting)"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print the snapshot as JSON")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("raw")
                        .long("raw")
                        .help("Print unformatted sample values")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("json"),
                ),
        )
        .subcommand(
            Command::new("plans")
                .about("List power plans, marking the active one")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print the plans as JSON")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("plan")
                .about("Activate a power plan by name or GUID")
                .arg(
                    Arg::new("plan")
                        .help("Plan display name (case-insensitive) or GUID")
                        .required(true)
                        .index(1),
                ),
        )
        .subcommand(
            Command::new("fan-profile")
                .about("Show or store the fan profile (Silent, Balanced, Automatic, Turbo)")
                .arg(
                    Arg::new("profile")
                        .help("Profile name or index 0-3")
                        .index(1),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Show or change settings (use 'g14mon config --help' for subcommands)")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(
                    Command::new("show")
                        .about("Show effective settings")
                        .arg(
                            Arg::new("json")
                                .long("json")
                                .help("Print the raw settings file")
                                .action(ArgAction::SetTrue),
                        ),
                )
                .subcommand(
                    Command::new("set")
                        .about("Set one of Monitoring, Interval, FanProfile, StartUp, Drive")
                        .arg(Arg::new("key").required(true).index(1))
                        .arg(Arg::new("value").required(true).index(2)),
                )
                .subcommand(Command::new("path").about("Print the settings file location")),
        )
}

/// Hardware commands only run on the supported G14 models.
fn require_supported_machine() -> Result<()> {
    platform::ensure_supported().context("This tool only runs on ROG Zephyrus G14 GA401IH/IV/IU")?;
    Ok(())
}

fn run() -> Result<()> {
    let matches = cli().get_matches();

    match matches.subcommand() {
        Some(("run", sub_matches)) => {
            require_supported_machine()?;
            commands::run::execute(sub_matches)
        }
        Some(("snapshot", sub_matches)) => {
            require_supported_machine()?;
            commands::snapshot::execute(sub_matches)
        }
        Some(("plans", sub_matches)) => {
            require_supported_machine()?;
            commands::plans::list(sub_matches)
        }
        Some(("plan", sub_matches)) => {
            require_supported_machine()?;
            commands::plans::activate(sub_matches)
        }
        Some(("fan-profile", sub_matches)) => commands::fan::execute(sub_matches),
        Some(("config", sub_matches)) => commands::config::handle(sub_matches),
        _ => {
            println!("Use 'g14mon --help' for more information.");
            Ok(())
        }
    }
}

fn main() {
    g14mon::init_logging();

    if let Err(e) = run() {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
