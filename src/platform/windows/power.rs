use std::process::Command;

use crate::error::{MonError, Result};

fn powercfg(args: &[&str]) -> Result<String> {
    let output = Command::new("powercfg")
        .args(args)
        .output()
        .map_err(|e| MonError::power_plan(format!("Failed to run powercfg: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let detail = if stderr.trim().is_empty() { stdout } else { stderr };
        return Err(MonError::power_plan(format!(
            "powercfg {} failed: {}",
            args.join(" "),
            detail.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Raw `powercfg /list` output.
pub fn list_schemes() -> Result<String> {
    powercfg(&["/list"])
}

pub fn set_active_scheme(guid: &str) -> Result<()> {
    powercfg(&["/setactive", guid]).map(|_| ())
}
