use crate::error::{MonError, Result};

#[cfg(windows)]
use serde::Deserialize;

#[cfg(windows)]
use super::core::wmi_connection;

/// `Win32_ComputerSystem.Model` values, lowercased, that the monitor runs on.
///
/// The IV and IU boards report the GA401IH platform prefix; the
/// self-consistent spellings are accepted as well.
pub const SUPPORTED_MODELS: [&str; 5] = [
    "rog zephyrus g14 ga401ih_ga401ih",
    "rog zephyrus g14 ga401ih_ga401iv",
    "rog zephyrus g14 ga401ih_ga401iu",
    "rog zephyrus g14 ga401iv_ga401iv",
    "rog zephyrus g14 ga401iu_ga401iu",
];

#[cfg(windows)]
#[derive(Deserialize, Debug)]
#[serde(rename = "Win32_ComputerSystem")]
#[serde(rename_all = "PascalCase")]
struct Win32ComputerSystem {
    model: Option<String>,
}

pub fn is_supported_model(model: &str) -> bool {
    let model = model.trim().to_lowercase();
    SUPPORTED_MODELS.contains(&model.as_str())
}

#[cfg(windows)]
pub fn machine_model() -> Result<String> {
    let wmi_con = wmi_connection(None)?;

    let systems: Vec<Win32ComputerSystem> = wmi_con
        .query()
        .map_err(|e| MonError::wmi(format!("Failed to query Win32_ComputerSystem: {}", e)))?;

    systems
        .into_iter()
        .find_map(|s| s.model)
        .ok_or_else(|| MonError::wmi("Win32_ComputerSystem reported no model"))
}

#[cfg(not(windows))]
pub fn machine_model() -> Result<String> {
    Err(MonError::wmi("Machine model is only read on Windows"))
}

/// Fails unless this is one of the supported G14 models.
pub fn ensure_supported() -> Result<String> {
    let model = machine_model()?;
    if is_supported_model(&model) {
        log::info!("Detected supported machine: {}", model.trim());
        Ok(model)
    } else {
        Err(MonError::unsupported_machine(model.trim()))
    }
}
