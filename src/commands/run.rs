//! `g14mon run`: the long-running monitor.

use std::sync::mpsc;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;

use crate::core::power::{BatteryAcLine, PowerPlanManager};
use crate::core::{MonitorRuntime, ProviderSet, SettingsStore};
use crate::ui::{self, LabelBoard, Labels};

/// Execute the run command
pub fn execute(matches: &ArgMatches) -> Result<()> {
    let json_output = matches.get_flag("json");
    let manage_plans = !matches.get_flag("no-power-plans");

    let settings = Arc::new(SettingsStore::open_default().context("Failed to open settings")?);
    let effective = settings.effective();

    let board = if json_output {
        LabelBoard::with_renderer(print_json)
    } else {
        LabelBoard::with_renderer(ui::print_labels)
    };

    let runtime = MonitorRuntime::new(ProviderSet::system(&effective.drive), Arc::new(board))?;
    runtime.follow_settings(settings.clone())?;

    if manage_plans {
        runtime.manage_power_plans(Arc::new(PowerPlanManager::system()), Arc::new(BatteryAcLine));
    }

    let (stop_tx, stop_rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        println!();
        println!("{}", "Stopping monitor...".yellow().bold());
        let _ = stop_tx.send(());
    })
    .context("Failed to set Ctrl-C handler")?;

    if !json_output {
        if effective.monitoring {
            ui::info(&format!(
                "Monitoring every {}s ({}). Press Ctrl-C to stop.",
                effective.interval_seconds,
                settings.path().display()
            ));
        } else {
            ui::warn("Monitoring is disabled in settings; waiting for it to be enabled");
        }
    }

    // Sender lives in the handler, so this only returns on Ctrl-C
    let _ = stop_rx.recv();
    runtime.shutdown();
    Ok(())
}

fn print_json(labels: &Labels) {
    match serde_json::to_string(labels) {
        Ok(line) => println!("{}", line),
        Err(e) => log::error!("Failed to serialize labels: {}", e),
    }
}
