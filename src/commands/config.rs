use anyhow::{Context, Result};
use clap::ArgMatches;

use crate::core::config::{SettingKey, SettingsStore};
use crate::platform;
use crate::ui;

pub fn handle(matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("show", sub_matches)) => show(sub_matches),
        Some(("set", sub_matches)) => set(sub_matches),
        Some(("path", _)) => {
            let store = SettingsStore::open_default()?;
            println!("{}", store.path().display());
            Ok(())
        }
        _ => {
            println!("Use 'g14mon config --help' for more information.");
            Ok(())
        }
    }
}

fn show(matches: &ArgMatches) -> Result<()> {
    let store = SettingsStore::open_default().context("Failed to open settings")?;
    let settings = store.settings();
    let effective = store.effective();

    if matches.get_flag("json") {
        println!("{}", settings.to_json()?);
    } else {
        ui::print_settings(&settings, &effective);
        ui::info(&format!("\nFile: {}", store.path().display()));
        if cfg!(windows) && platform::is_startup_registered() != effective.start_up {
            ui::warn("StartUp does not match the Run key; re-run 'g14mon config set StartUp <value>'");
        }
    }
    Ok(())
}

fn set(matches: &ArgMatches) -> Result<()> {
    let key: SettingKey = matches
        .get_one::<String>("key")
        .context("Key argument is required")?
        .parse()?;
    let value = matches
        .get_one::<String>("value")
        .context("Value argument is required")?;

    let store = SettingsStore::open_default().context("Failed to open settings")?;
    store.set(key, value)?;

    if key == SettingKey::StartUp {
        let enabled = store.effective().start_up;
        platform::set_startup(enabled).context("Failed to update startup registration")?;
    }

    let stored = store.settings();
    ui::success(&format!(
        "{} = {}",
        key,
        stored.raw(key).unwrap_or(key.default_value())
    ));
    Ok(())
}
