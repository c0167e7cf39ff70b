use serde::de::DeserializeOwned;

use crate::error::{MonError, Result};

#[cfg(windows)]
use wmi::{Variant, WMIConnection};

/// Runs a PowerShell snippet that ends in `ConvertTo-Json` and parses stdout.
pub fn run_powershell_json<T: DeserializeOwned>(command: &str) -> Result<T> {
    use std::process::Command;
    let output = Command::new("powershell")
        .args(["-NoProfile", "-NonInteractive", "-Command", command])
        .output()
        .map_err(|e| MonError::other(format!("PowerShell execution failed: {e}")))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    if stdout.trim().is_empty() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(MonError::other(format!(
            "PowerShell returned no output: {}",
            stderr.trim()
        )));
    }

    serde_json::from_str(&stdout)
        .map_err(|e| MonError::other(format!("JSON parsing failed: {e}. Output: {stdout}")))
}

/// Opens a WMI connection, on the default `root\cimv2` namespace when
/// `namespace` is `None`.
#[cfg(windows)]
pub fn wmi_connection(namespace: Option<&str>) -> Result<WMIConnection> {
    let connection = match namespace {
        Some(path) => WMIConnection::with_namespace_path(path),
        None => WMIConnection::new(),
    };
    connection.map_err(|e| MonError::wmi(format!("Failed to connect to WMI: {}", e)))
}

/// Numeric view of a WMI property. Performance classes report `uint64`
/// counters as strings, so those are parsed as well.
#[cfg(windows)]
pub fn variant_as_f64(value: &Variant) -> Option<f64> {
    match value {
        Variant::String(s) => s.trim().parse().ok(),
        Variant::I1(v) => Some(*v as f64),
        Variant::I2(v) => Some(*v as f64),
        Variant::I4(v) => Some(*v as f64),
        Variant::I8(v) => Some(*v as f64),
        Variant::UI1(v) => Some(*v as f64),
        Variant::UI2(v) => Some(*v as f64),
        Variant::UI4(v) => Some(*v as f64),
        Variant::UI8(v) => Some(*v as f64),
        Variant::R4(v) => Some(*v as f64),
        Variant::R8(v) => Some(*v),
        _ => None,
    }
}
