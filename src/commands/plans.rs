use anyhow::{Context, Result};
use clap::ArgMatches;

use crate::core::power::{ActivateOutcome, PowerPlanManager};
use crate::error::MonError;
use crate::ui;

/// `g14mon plans`
pub fn list(matches: &ArgMatches) -> Result<()> {
    let manager = PowerPlanManager::system();
    let plans = manager.list_plans().context("Failed to list power plans")?;

    if matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&plans)?);
    } else {
        ui::print_plans(&plans);
        if !plans.iter().any(|p| p.is_active) {
            ui::warn("No power plan is marked active");
        }
    }
    Ok(())
}

/// `g14mon plan <name|guid>`
pub fn activate(matches: &ArgMatches) -> Result<()> {
    let target = matches
        .get_one::<String>("plan")
        .context("Plan argument is required")?;

    let manager = PowerPlanManager::system();
    match manager.activate_by_id_or_name(target) {
        Ok(ActivateOutcome::Switched) => {
            ui::success(&format!("Power plan set to '{}'", target.trim()));
            Ok(())
        }
        Ok(ActivateOutcome::AlreadyActive) => {
            ui::info(&format!("'{}' is already the active power plan", target.trim()));
            Ok(())
        }
        Err(MonError::AmbiguousPlan { name, ids }) => {
            ui::error(&format!("Several power plans are named '{}':", name));
            for id in &ids {
                println!("  {}", id);
            }
            anyhow::bail!("Use the plan GUID instead of its name")
        }
        Err(e) => Err(e).context("Failed to activate power plan"),
    }
}
