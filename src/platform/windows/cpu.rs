use crate::core::telemetry::provider::RateCounter;
use crate::error::{MonError, Result};

#[cfg(windows)]
use serde::Deserialize;
#[cfg(windows)]
use std::collections::HashMap;
#[cfg(windows)]
use wmi::Variant;

#[cfg(windows)]
use super::core::{variant_as_f64, wmi_connection};

/// Static identity of the installed processor.
#[derive(Debug, Clone)]
pub struct ProcessorIdentity {
    pub name: String,
    pub max_clock_mhz: u32,
}

#[cfg(windows)]
#[derive(Deserialize, Debug)]
#[serde(rename = "Win32_Processor")]
#[serde(rename_all = "PascalCase")]
struct Win32Processor {
    name: Option<String>,
    max_clock_speed: Option<u32>,
}

#[cfg(windows)]
pub fn processor_identity() -> Result<ProcessorIdentity> {
    let wmi_con = wmi_connection(None)?;

    let processors: Vec<Win32Processor> = wmi_con
        .query()
        .map_err(|e| MonError::wmi(format!("Failed to query Win32_Processor: {}", e)))?;

    let cpu = processors
        .into_iter()
        .next()
        .ok_or_else(|| MonError::wmi("Win32_Processor returned no rows"))?;

    Ok(ProcessorIdentity {
        name: cpu.name.map(|n| n.trim().to_string()).unwrap_or_default(),
        max_clock_mhz: cpu.max_clock_speed.unwrap_or(0),
    })
}

#[cfg(not(windows))]
pub fn processor_identity() -> Result<ProcessorIdentity> {
    Err(MonError::wmi("Win32_Processor is only available on Windows"))
}

/// `% Processor Performance` of the `_Total` instance, read through one WMI
/// connection so consecutive reads share the provider's sample cache.
/// Exceeds 100 under boost.
pub struct ProcessorPerformanceCounter {
    #[cfg(windows)]
    connection: wmi::WMIConnection,
}

impl ProcessorPerformanceCounter {
    #[cfg(windows)]
    pub fn open() -> Result<Self> {
        Ok(Self {
            connection: wmi_connection(None)?,
        })
    }

    #[cfg(not(windows))]
    pub fn open() -> Result<Self> {
        Err(MonError::wmi("Processor performance counters are only available on Windows"))
    }
}

impl RateCounter for ProcessorPerformanceCounter {
    #[cfg(windows)]
    fn next_value(&mut self) -> Result<f64> {
        let rows: Vec<HashMap<String, Variant>> = self
            .connection
            .raw_query(
                "SELECT PercentProcessorPerformance FROM \
                 Win32_PerfFormattedData_Counters_ProcessorInformation WHERE Name = '_Total'",
            )
            .map_err(|e| MonError::wmi(format!("Processor performance query failed: {}", e)))?;

        rows.iter()
            .filter_map(|row| row.get("PercentProcessorPerformance"))
            .find_map(variant_as_f64)
            .ok_or_else(|| MonError::metric_collection("PercentProcessorPerformance not reported"))
    }

    #[cfg(not(windows))]
    fn next_value(&mut self) -> Result<f64> {
        Err(MonError::wmi("Processor performance counters are only available on Windows"))
    }
}
