// Platform-specific code module

pub mod gpu;
pub mod windows;

use std::sync::Arc;

use crate::core::telemetry::fan::FanStatusReader;

pub use windows::autostart::{is_startup_registered, set_startup};
pub use windows::machine::ensure_supported;

/// Fan status source for this machine.
pub fn fan_status_reader() -> Arc<dyn FanStatusReader> {
    Arc::new(windows::atk::AtkFanReader::new())
}
