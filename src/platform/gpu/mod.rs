//! GPU-specific platform code.
//!
//! The G14 pairs the Ryzen iGPU with an NVIDIA dGPU; only the latter is
//! sampled, through NVML.

mod nvidia;

pub use nvidia::{bytes_to_gb, power_state_for, read_nvidia, POWER_SAVING_PSTATE};

#[cfg(feature = "nvml")]
pub use nvidia::classify_nvml_error;

use crate::core::telemetry::metrics::{GpuSample, SampleResult};

/// Samples the discrete GPU at `index`.
pub fn read_gpu(index: u32) -> SampleResult<GpuSample> {
    read_nvidia(index)
}
