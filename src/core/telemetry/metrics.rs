use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a provider could not deliver a sample this tick.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderError {
    /// Sensor or driver absent on this machine.
    #[error("not supported: {0}")]
    Unavailable(String),

    /// Device reported it is idled / not powered.
    #[error("device is in energy saving state")]
    PowerSaving,

    /// Timeout, contention or overlap-guard skip. Retried next tick.
    #[error("transient failure: {0}")]
    Transient(String),
}

impl ProviderError {
    pub fn unavailable<S: Into<String>>(msg: S) -> Self {
        ProviderError::Unavailable(msg.into())
    }

    pub fn transient<S: Into<String>>(msg: S) -> Self {
        ProviderError::Transient(msg.into())
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::Transient(_))
    }
}

pub type SampleResult<T> = std::result::Result<T, ProviderError>;

/// Consolidated result of one tick.
///
/// Every field is either a sample or the typed reason it is missing; there is
/// no "not yet set" state once a snapshot exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSnapshot {
    pub sequence: u64,
    pub taken_at: DateTime<Local>,
    pub cpu: SampleResult<CpuSample>,
    pub gpu: SampleResult<GpuSample>,
    pub memory: SampleResult<MemorySample>,
    pub disk: SampleResult<DiskSample>,
    pub battery: SampleResult<BatterySample>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuSample {
    pub name: String,
    pub max_clock_mhz: f64,
    pub current_clock_mhz: f64,
    pub utilization_percent: f64,
    /// `None` when no thermal zone could be read
    pub temperature_celsius: Option<f64>,
    pub fan_rpm: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GpuPowerState {
    #[default]
    Normal,
    PowerSaving,
    Unsupported,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GpuSample {
    pub name: String,
    pub utilization_percent: u32,
    /// `None` when the sensor is unsupported
    pub temperature_celsius: Option<f64>,
    pub total_memory_gb: f64,
    pub available_memory_gb: f64,
    pub core_clock_mhz: u32,
    pub memory_clock_mhz: u32,
    pub fan_rpm: u32,
    pub power_state: GpuPowerState,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorySample {
    pub total_bytes: u64,
    pub used_bytes: u64,
}

impl MemorySample {
    /// Builds a sample, clamping `used` so it never exceeds `total`.
    pub fn new(total_bytes: u64, used_bytes: u64) -> Self {
        Self {
            total_bytes,
            used_bytes: used_bytes.min(total_bytes),
        }
    }

    pub fn usage_percent(&self) -> f64 {
        if self.total_bytes == 0 {
            0.0
        } else {
            self.used_bytes as f64 / self.total_bytes as f64 * 100.0
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriveType {
    Fixed,
    Removable,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiskSample {
    pub volume_label: String,
    pub total_bytes: u64,
    pub free_bytes: u64,
    pub format: String,
    pub drive_type: DriveType,
}

impl DiskSample {
    pub fn used_bytes(&self) -> u64 {
        self.total_bytes.saturating_sub(self.free_bytes)
    }

    pub fn usage_percent(&self) -> f64 {
        if self.total_bytes == 0 {
            0.0
        } else {
            100.0 - self.free_bytes as f64 / self.total_bytes as f64 * 100.0
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BatterySample {
    pub percent: f64,
    pub on_ac_power: bool,
    /// `None` when the OS cannot estimate it (charging, calibrating)
    pub remaining_minutes: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sample_clamps_used() {
        let sample = MemorySample::new(1024, 4096);
        assert_eq!(sample.used_bytes, 1024);
        assert_eq!(sample.usage_percent(), 100.0);
    }

    #[test]
    fn test_disk_usage_percent() {
        let disk = DiskSample {
            total_bytes: 200,
            free_bytes: 50,
            ..Default::default()
        };
        assert_eq!(disk.used_bytes(), 150);
        assert_eq!(disk.usage_percent(), 75.0);
    }

    #[test]
    fn test_empty_disk_reports_zero_usage() {
        assert_eq!(DiskSample::default().usage_percent(), 0.0);
    }
}
