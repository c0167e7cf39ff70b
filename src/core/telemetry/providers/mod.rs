//! Hardware-backed metric providers.

mod battery;
mod cpu;
mod disk;
mod gpu;
mod memory;

pub use battery::{on_ac_power, BatteryProvider};
pub use cpu::CpuProvider;
pub use disk::DiskProvider;
pub use gpu::GpuProvider;
pub use memory::MemoryProvider;
