use std::sync::Arc;

use crate::core::telemetry::fan::{read_fan_rpm, FanChannel, FanStatusReader};
use crate::core::telemetry::metrics::{GpuSample, SampleResult};
use crate::core::telemetry::provider::MetricProvider;
use crate::platform::gpu;

/// Discrete GPU utilization, clocks, memory, temperature and fan speed.
pub struct GpuProvider {
    device_index: u32,
    fans: Arc<dyn FanStatusReader>,
}

impl GpuProvider {
    pub fn new(fans: Arc<dyn FanStatusReader>) -> Self {
        Self::with_device_index(0, fans)
    }

    pub fn with_device_index(device_index: u32, fans: Arc<dyn FanStatusReader>) -> Self {
        Self { device_index, fans }
    }
}

impl MetricProvider for GpuProvider {
    type Sample = GpuSample;

    fn name(&self) -> &'static str {
        "gpu"
    }

    fn sample(&self) -> SampleResult<GpuSample> {
        // The fan is read first: the ATK channel answers even when the
        // dGPU itself is powered down.
        let fan_rpm = read_fan_rpm(&*self.fans, FanChannel::Gpu);

        let mut sample = gpu::read_gpu(self.device_index)?;
        sample.fan_rpm = fan_rpm;
        Ok(sample)
    }
}
