// g14mon Library - Public API

// Re-export error types
pub mod error;
pub use error::{MonError, Result};

// Module declarations
pub mod commands;
pub mod core;
pub mod platform;
pub mod ui;

// Re-export commonly used types
pub use core::config::{PollingConfig, SettingsStore};
pub use core::telemetry::{MetricSnapshot, Orchestrator, ProviderSet, SnapshotSink};

// Initialize logging
pub fn init_logging() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
