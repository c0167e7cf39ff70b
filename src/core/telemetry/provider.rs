use std::sync::Arc;

use super::metrics::{
    BatterySample, CpuSample, DiskSample, GpuSample, MemorySample, SampleResult,
};
use super::providers::{BatteryProvider, CpuProvider, DiskProvider, GpuProvider, MemoryProvider};

/// One hardware subsystem that can be queried "now".
///
/// `sample` may block (sensor queries, settle delays) and is always called
/// from a blocking-pool thread. The orchestrator guarantees it is never
/// entered twice concurrently for the same provider.
pub trait MetricProvider: Send + Sync {
    type Sample: Send + 'static;

    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn sample(&self) -> SampleResult<Self::Sample>;
}

/// A counter reporting a rate between two reads. The first read after it is
/// opened only primes it; values are meaningful from the second read on.
pub trait RateCounter {
    fn next_value(&mut self) -> crate::error::Result<f64>;
}

pub type SharedProvider<S> = Arc<dyn MetricProvider<Sample = S>>;

/// The five providers sampled on every tick.
#[derive(Clone)]
pub struct ProviderSet {
    pub cpu: SharedProvider<CpuSample>,
    pub gpu: SharedProvider<GpuSample>,
    pub memory: SharedProvider<MemorySample>,
    pub disk: SharedProvider<DiskSample>,
    pub battery: SharedProvider<BatterySample>,
}

impl ProviderSet {
    /// Providers backed by the real hardware of this machine.
    pub fn system(drive: &str) -> Self {
        let fans = crate::platform::fan_status_reader();

        Self {
            cpu: Arc::new(CpuProvider::new(fans.clone())),
            gpu: Arc::new(GpuProvider::new(fans)),
            memory: Arc::new(MemoryProvider::new()),
            disk: Arc::new(DiskProvider::new(drive)),
            battery: Arc::new(BatteryProvider::new()),
        }
    }
}
