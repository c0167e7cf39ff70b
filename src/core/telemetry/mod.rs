//! Periodic hardware telemetry: providers, fan decoding, the sampling
//! orchestrator and the sink it publishes to.

pub mod fan;
pub mod metrics;
pub mod orchestrator;
pub mod provider;
pub mod providers;
pub mod sink;
pub mod thermal;

pub use fan::{read_fan_rpm, FanChannel, FanStatusReader};
pub use metrics::{
    BatterySample, CpuSample, DiskSample, DriveType, GpuPowerState, GpuSample, MemorySample,
    MetricSnapshot, ProviderError, SampleResult,
};
pub use orchestrator::Orchestrator;
pub use provider::{MetricProvider, ProviderSet, RateCounter, SharedProvider};
pub use sink::SnapshotSink;
