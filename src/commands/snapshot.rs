use std::sync::Arc;

use anyhow::{Context, Result};
use clap::ArgMatches;

use crate::core::{MonitorRuntime, ProviderSet, SettingsStore};
use crate::ui::{self, LabelBoard, Labels};

/// Execute the snapshot command: one sampling pass, printed and exited.
pub fn execute(matches: &ArgMatches) -> Result<()> {
    let settings = SettingsStore::open_default().context("Failed to open settings")?;
    let drive = matches
        .get_one::<String>("drive")
        .cloned()
        .unwrap_or_else(|| settings.effective().drive);

    let runtime = MonitorRuntime::new(ProviderSet::system(&drive), Arc::new(LabelBoard::new()))?;
    let snapshot = runtime.sample_once();
    runtime.shutdown();

    if matches.get_flag("json") {
        let json = serde_json::to_string_pretty(&snapshot).context("Failed to serialize snapshot")?;
        println!("{}", json);
    } else if matches.get_flag("raw") {
        ui::print_snapshot(&snapshot);
    } else {
        let mut labels = Labels::default();
        labels.apply(&snapshot);
        ui::print_labels(&labels);
    }

    Ok(())
}
