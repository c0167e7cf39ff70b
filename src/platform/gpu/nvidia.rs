#[cfg(feature = "nvml")]
use nvml_wrapper::{
    enum_wrappers::device::{Clock, PerformanceState, TemperatureSensor},
    error::NvmlError,
    Nvml,
};
#[cfg(feature = "nvml")]
use once_cell::sync::Lazy;

use crate::core::telemetry::metrics::{GpuPowerState, GpuSample, ProviderError, SampleResult};

/// Performance states at or beyond this index mean the dGPU is idling in
/// its low-power state.
pub const POWER_SAVING_PSTATE: u32 = 8;

/// NVML must be initialised once per process.
#[cfg(feature = "nvml")]
static NVML: Lazy<Option<Nvml>> = Lazy::new(|| match Nvml::init() {
    Ok(nvml) => Some(nvml),
    Err(e) => {
        log::warn!("NVML initialisation failed: {}", e);
        None
    }
});

/// Bytes to decimal gigabytes, two decimals.
pub fn bytes_to_gb(bytes: u64) -> f64 {
    (bytes as f64 / 1_000_000_000.0 * 100.0).round() / 100.0
}

pub fn power_state_for(pstate: Option<u32>) -> GpuPowerState {
    match pstate {
        Some(p) if p >= POWER_SAVING_PSTATE => GpuPowerState::PowerSaving,
        _ => GpuPowerState::Normal,
    }
}

/// Maps an NVML failure onto the provider taxonomy.
#[cfg(feature = "nvml")]
pub fn classify_nvml_error(err: &NvmlError) -> ProviderError {
    match err {
        // Optimus powers the dGPU off when idle; NVML reports it as lost
        NvmlError::GpuLost | NvmlError::InsufficientPower => ProviderError::PowerSaving,
        NvmlError::NotSupported
        | NvmlError::DriverNotLoaded
        | NvmlError::LibraryNotFound
        | NvmlError::FunctionNotFound
        | NvmlError::NotFound
        | NvmlError::NoPermission => ProviderError::unavailable(err.to_string()),
        NvmlError::Timeout | NvmlError::InUse | NvmlError::Unknown => {
            ProviderError::transient(err.to_string())
        }
        other => ProviderError::transient(other.to_string()),
    }
}

#[cfg(feature = "nvml")]
fn pstate_index(state: PerformanceState) -> Option<u32> {
    let index = match state {
        PerformanceState::Zero => 0,
        PerformanceState::One => 1,
        PerformanceState::Two => 2,
        PerformanceState::Three => 3,
        PerformanceState::Four => 4,
        PerformanceState::Five => 5,
        PerformanceState::Six => 6,
        PerformanceState::Seven => 7,
        PerformanceState::Eight => 8,
        PerformanceState::Nine => 9,
        PerformanceState::Ten => 10,
        PerformanceState::Eleven => 11,
        PerformanceState::Twelve => 12,
        PerformanceState::Thirteen => 13,
        PerformanceState::Fourteen => 14,
        PerformanceState::Fifteen => 15,
        PerformanceState::Unknown => return None,
    };
    Some(index)
}

/// Reads one NVIDIA device. The fan is filled in by the caller.
#[cfg(feature = "nvml")]
pub fn read_nvidia(index: u32) -> SampleResult<GpuSample> {
    let nvml = NVML
        .as_ref()
        .ok_or_else(|| ProviderError::unavailable("NVML not available (driver not installed)"))?;

    let device = nvml
        .device_by_index(index)
        .map_err(|e| classify_nvml_error(&e))?;

    let name = device.name().map_err(|e| classify_nvml_error(&e))?;
    let utilization = device
        .utilization_rates()
        .map_err(|e| classify_nvml_error(&e))?;
    let memory = device.memory_info().map_err(|e| classify_nvml_error(&e))?;
    let core_clock = device
        .clock_info(Clock::Graphics)
        .map_err(|e| classify_nvml_error(&e))?;
    let memory_clock = device
        .clock_info(Clock::Memory)
        .map_err(|e| classify_nvml_error(&e))?;

    let mut power_state = power_state_for(
        device
            .performance_state()
            .ok()
            .and_then(pstate_index),
    );

    let temperature = match device.temperature(TemperatureSensor::Gpu) {
        Ok(t) => Some(t as f64),
        Err(NvmlError::NotSupported) => {
            power_state = GpuPowerState::Unsupported;
            None
        }
        Err(e) => return Err(classify_nvml_error(&e)),
    };

    Ok(GpuSample {
        name,
        utilization_percent: utilization.gpu.min(100),
        temperature_celsius: temperature,
        total_memory_gb: bytes_to_gb(memory.total),
        available_memory_gb: bytes_to_gb(memory.free.min(memory.total)),
        core_clock_mhz: core_clock,
        memory_clock_mhz: memory_clock,
        fan_rpm: 0,
        power_state,
    })
}

#[cfg(not(feature = "nvml"))]
pub fn read_nvidia(_index: u32) -> SampleResult<GpuSample> {
    Err(ProviderError::unavailable(
        "NVML feature not enabled. Recompile with --features nvml",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_to_gb_rounds_to_two_decimals() {
        assert_eq!(bytes_to_gb(6_442_450_944), 6.44);
        assert_eq!(bytes_to_gb(0), 0.0);
    }

    #[test]
    fn test_deep_pstates_are_power_saving() {
        assert_eq!(power_state_for(Some(0)), GpuPowerState::Normal);
        assert_eq!(power_state_for(Some(7)), GpuPowerState::Normal);
        assert_eq!(power_state_for(Some(8)), GpuPowerState::PowerSaving);
        assert_eq!(power_state_for(Some(15)), GpuPowerState::PowerSaving);
        assert_eq!(power_state_for(None), GpuPowerState::Normal);
    }

    #[cfg(feature = "nvml")]
    #[test]
    fn test_nvml_error_classification() {
        assert_eq!(classify_nvml_error(&NvmlError::GpuLost), ProviderError::PowerSaving);
        assert!(matches!(
            classify_nvml_error(&NvmlError::NotSupported),
            ProviderError::Unavailable(_)
        ));
        assert!(matches!(
            classify_nvml_error(&NvmlError::DriverNotLoaded),
            ProviderError::Unavailable(_)
        ));
        assert!(classify_nvml_error(&NvmlError::Timeout).is_transient());
    }
}
