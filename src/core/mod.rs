// Core business logic module

pub mod config;
pub mod power;
pub mod runtime;
pub mod telemetry;

// Re-export commonly used items
pub use config::{ConfigProvider, FanProfile, PollingConfig, SettingKey, SettingsStore};
pub use power::{PowerPlan, PowerPlanManager, PowerSourceEvent};
pub use runtime::MonitorRuntime;
pub use telemetry::{MetricSnapshot, Orchestrator, ProviderSet, SnapshotSink};
