use anyhow::{Context, Result};
use clap::ArgMatches;

use crate::core::config::{FanProfile, SettingKey, SettingsStore};
use crate::ui;

/// `g14mon fan-profile [profile]`: shows or stores the fan profile.
///
/// The selection is persisted for the next session; no firmware call is made.
pub fn execute(matches: &ArgMatches) -> Result<()> {
    let store = SettingsStore::open_default().context("Failed to open settings")?;

    let Some(requested) = matches.get_one::<String>("profile") else {
        let current = store.effective().fan_profile;
        for profile in FanProfile::ALL {
            let marker = if profile == current { "*" } else { " " };
            println!("{} {} {}", marker, profile.index(), profile);
        }
        return Ok(());
    };

    let profile: FanProfile = requested.parse()?;
    store.set(SettingKey::FanProfile, &profile.index().to_string())?;
    ui::success(&format!("Fan profile set to {}", profile));
    Ok(())
}
