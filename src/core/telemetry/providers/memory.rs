use parking_lot::Mutex;
use sysinfo::{MemoryRefreshKind, RefreshKind, System};

use crate::core::telemetry::metrics::{MemorySample, ProviderError, SampleResult};
use crate::core::telemetry::provider::MetricProvider;

/// Physical memory usage.
pub struct MemoryProvider {
    system: Mutex<System>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        let refresh_kind = RefreshKind::nothing().with_memory(MemoryRefreshKind::nothing().with_ram());

        Self {
            system: Mutex::new(System::new_with_specifics(refresh_kind)),
        }
    }
}

impl Default for MemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricProvider for MemoryProvider {
    type Sample = MemorySample;

    fn name(&self) -> &'static str {
        "memory"
    }

    fn sample(&self) -> SampleResult<MemorySample> {
        let mut system = self.system.lock();
        system.refresh_memory_specifics(MemoryRefreshKind::nothing().with_ram());

        let total = system.total_memory();
        if total == 0 {
            return Err(ProviderError::unavailable("physical memory size not reported"));
        }

        Ok(MemorySample::new(total, system.used_memory()))
    }
}
