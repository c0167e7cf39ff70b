use crate::error::{MonError, Result};

#[cfg(windows)]
use crate::core::telemetry::thermal::{counter_kelvin_to_celsius, tenths_kelvin_to_celsius};
#[cfg(windows)]
use serde::Deserialize;
#[cfg(windows)]
use std::collections::HashMap;
#[cfg(windows)]
use wmi::Variant;

#[cfg(windows)]
use super::core::{variant_as_f64, wmi_connection};

/// ACPI name of the CPU thermal zone on the G14.
pub const CPU_THERMAL_ZONE: &str = "THRM";

#[cfg(windows)]
#[derive(Deserialize, Debug)]
#[serde(rename = "MSAcpi_ThermalZoneTemperature")]
#[serde(rename_all = "PascalCase")]
struct AcpiThermalZone {
    instance_name: Option<String>,
    current_temperature: Option<u32>,
}

/// Reads the `\_TZ.THRM` zone, first through the thermal zone performance
/// counter (whole Kelvin), then through `MSAcpi_ThermalZoneTemperature`
/// (tenths of Kelvin, needs elevation on most systems).
#[cfg(windows)]
pub fn read_cpu_temperature() -> Result<f64> {
    match read_counter_zone() {
        Ok(celsius) => Ok(celsius),
        Err(e) => {
            log::debug!("Thermal zone counter unavailable, trying ACPI: {}", e);
            read_acpi_zone()
        }
    }
}

#[cfg(windows)]
fn read_counter_zone() -> Result<f64> {
    let wmi_con = wmi_connection(None)?;

    let rows: Vec<HashMap<String, Variant>> = wmi_con
        .raw_query(
            "SELECT Name, Temperature FROM \
             Win32_PerfFormattedData_Counters_ThermalZoneInformation",
        )
        .map_err(|e| MonError::wmi(format!("Thermal zone counter query failed: {}", e)))?;

    for row in &rows {
        let is_cpu_zone = matches!(row.get("Name"), Some(Variant::String(name)) if name.contains(CPU_THERMAL_ZONE));
        if !is_cpu_zone {
            continue;
        }
        if let Some(kelvin) = row.get("Temperature").and_then(variant_as_f64) {
            return Ok(counter_kelvin_to_celsius(kelvin as u32));
        }
    }

    Err(MonError::metric_collection("no THRM thermal zone counter"))
}

#[cfg(windows)]
fn read_acpi_zone() -> Result<f64> {
    let wmi_con = wmi_connection(Some("root\\WMI"))?;

    let zones: Vec<AcpiThermalZone> = wmi_con
        .query()
        .map_err(|e| MonError::wmi(format!("MSAcpi_ThermalZoneTemperature query failed: {}", e)))?;

    zones
        .iter()
        .find(|z| {
            z.instance_name
                .as_deref()
                .is_some_and(|n| n.contains(CPU_THERMAL_ZONE))
        })
        .or_else(|| zones.first())
        .and_then(|z| z.current_temperature)
        .map(tenths_kelvin_to_celsius)
        .ok_or_else(|| MonError::metric_collection("no ACPI thermal zone reported"))
}

#[cfg(not(windows))]
pub fn read_cpu_temperature() -> Result<f64> {
    Err(MonError::metric_collection("ACPI thermal zones are only read on Windows"))
}
