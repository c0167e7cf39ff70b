//! Text-label rendering of snapshots.
//!
//! [`LabelBoard`] is the sink the CLI publishes to. Each provider result
//! updates its own group of labels; a `Transient` failure leaves that group
//! untouched so the previous reading stays on screen.

use parking_lot::Mutex;
use serde::Serialize;

use super::formatters::{format_minutes, size_suffix_u64};
use crate::core::telemetry::metrics::{
    BatterySample, CpuSample, DiskSample, GpuSample, MemorySample, MetricSnapshot, ProviderError,
    SampleResult,
};
use crate::core::telemetry::sink::SnapshotSink;

pub const NOT_SUPPORTED: &str = "Not supported";
pub const ENERGY_SAVING: &str = "Energy saving";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Labels {
    pub cpu_name: String,
    pub cpu_usage: String,
    pub cpu_usage_bar: u8,
    pub cpu_frequency: String,
    pub cpu_temperature: String,
    pub cpu_fan: String,

    pub gpu_name: String,
    pub gpu_memory_info: String,
    pub gpu_usage: String,
    pub gpu_usage_bar: u8,
    pub gpu_frequency: String,
    pub gpu_memory: String,
    pub gpu_temperature: String,
    pub gpu_fan: String,

    pub ram: String,
    pub ram_bar: u8,

    pub disk: String,
    pub disk_info: String,
    pub disk_bar: u8,

    pub battery_bar: f64,
    pub battery_info: Option<String>,

    /// Sequence of the last snapshot applied
    pub sequence: Option<u64>,
}

impl Default for Labels {
    fn default() -> Self {
        let mut labels = Self {
            cpu_name: String::new(),
            cpu_usage: String::new(),
            cpu_usage_bar: 0,
            cpu_frequency: String::new(),
            cpu_temperature: String::new(),
            cpu_fan: String::new(),
            gpu_name: String::new(),
            gpu_memory_info: String::new(),
            gpu_usage: String::new(),
            gpu_usage_bar: 0,
            gpu_frequency: String::new(),
            gpu_memory: String::new(),
            gpu_temperature: String::new(),
            gpu_fan: String::new(),
            ram: String::new(),
            ram_bar: 0,
            disk: String::new(),
            disk_info: String::new(),
            disk_bar: 0,
            battery_bar: 0.0,
            battery_info: None,
            sequence: None,
        };
        labels.zero();
        labels
    }
}

fn usage_label(percent: f64) -> String {
    format!("Total usage: {:.0}%", percent)
}

fn bar(percent: f64) -> u8 {
    percent.round().clamp(0.0, 100.0) as u8
}

fn temperature_label(celsius: Option<f64>) -> String {
    match celsius {
        Some(t) => format!("{}°C", (t * 10.0).round() / 10.0),
        None => NOT_SUPPORTED.to_string(),
    }
}

fn failure_text(err: &ProviderError) -> &'static str {
    match err {
        ProviderError::PowerSaving => ENERGY_SAVING,
        _ => NOT_SUPPORTED,
    }
}

impl Labels {
    /// The idle state shown while monitoring is off. Names and the RAM and
    /// disk captions keep their last text.
    pub fn zero(&mut self) {
        self.cpu_usage = usage_label(0.0);
        self.cpu_usage_bar = 0;
        self.cpu_frequency = "0Mhz".to_string();
        self.cpu_temperature = "0°C".to_string();
        self.cpu_fan = "0rpm".to_string();

        self.gpu_usage = usage_label(0.0);
        self.gpu_usage_bar = 0;
        self.gpu_frequency = "0Mhz".to_string();
        self.gpu_memory = "0Mhz".to_string();
        self.gpu_temperature = "0°C".to_string();
        self.gpu_fan = "0rpm".to_string();

        self.ram_bar = 0;
        self.disk_bar = 0;
        self.battery_bar = 0.0;
        self.battery_info = None;
        self.sequence = None;
    }

    pub fn apply(&mut self, snapshot: &MetricSnapshot) {
        self.apply_cpu(&snapshot.cpu);
        self.apply_gpu(&snapshot.gpu);
        self.apply_memory(&snapshot.memory);
        self.apply_disk(&snapshot.disk);
        self.apply_battery(&snapshot.battery);
        self.sequence = Some(snapshot.sequence);
    }

    fn apply_cpu(&mut self, result: &SampleResult<CpuSample>) {
        match result {
            Ok(cpu) => {
                self.cpu_name = cpu.name.clone();
                self.cpu_usage = usage_label(cpu.utilization_percent);
                self.cpu_usage_bar = bar(cpu.utilization_percent);
                self.cpu_frequency = format!("{:.2}Ghz", cpu.current_clock_mhz / 1000.0);
                self.cpu_temperature = temperature_label(cpu.temperature_celsius);
                self.cpu_fan = format!("{}rpm", cpu.fan_rpm);
            }
            Err(ProviderError::Transient(_)) => {}
            Err(err) => {
                let text = failure_text(err);
                self.cpu_usage = usage_label(0.0);
                self.cpu_usage_bar = 0;
                self.cpu_frequency = text.to_string();
                self.cpu_temperature = text.to_string();
            }
        }
    }

    fn apply_gpu(&mut self, result: &SampleResult<GpuSample>) {
        match result {
            Ok(gpu) => {
                self.gpu_name = gpu.name.clone();
                self.gpu_memory_info = format!(
                    "Total memory: {}GB\nAvailable memory: {}GB",
                    gpu.total_memory_gb, gpu.available_memory_gb
                );
                self.gpu_usage = usage_label(gpu.utilization_percent as f64);
                self.gpu_usage_bar = bar(gpu.utilization_percent as f64);
                self.gpu_frequency = format!("{}Mhz", gpu.core_clock_mhz);
                self.gpu_memory = format!("{}Mhz", gpu.memory_clock_mhz);
                self.gpu_temperature = temperature_label(gpu.temperature_celsius);
                self.gpu_fan = format!("{}rpm", gpu.fan_rpm);
            }
            Err(ProviderError::Transient(_)) => {}
            Err(ProviderError::PowerSaving) => {
                self.gpu_usage = usage_label(0.0);
                self.gpu_usage_bar = 0;
                self.gpu_temperature = "0°C".to_string();
                self.gpu_memory = ENERGY_SAVING.to_string();
                self.gpu_frequency = ENERGY_SAVING.to_string();
            }
            Err(ProviderError::Unavailable(_)) => {
                self.gpu_usage = usage_label(0.0);
                self.gpu_usage_bar = 0;
                self.gpu_temperature = NOT_SUPPORTED.to_string();
                self.gpu_memory = NOT_SUPPORTED.to_string();
                self.gpu_frequency = NOT_SUPPORTED.to_string();
            }
        }
    }

    fn apply_memory(&mut self, result: &SampleResult<MemorySample>) {
        match result {
            Ok(memory) => {
                self.ram = format!(
                    "RAM {}/{}",
                    size_suffix_u64(memory.used_bytes),
                    size_suffix_u64(memory.total_bytes)
                );
                self.ram_bar = bar(memory.usage_percent());
            }
            Err(ProviderError::Transient(_)) => {}
            Err(err) => {
                self.ram = format!("RAM {}", failure_text(err));
                self.ram_bar = 0;
            }
        }
    }

    fn apply_disk(&mut self, result: &SampleResult<DiskSample>) {
        match result {
            Ok(disk) => {
                self.disk = format!(
                    "{} {}/{}",
                    disk.volume_label,
                    size_suffix_u64(disk.used_bytes()),
                    size_suffix_u64(disk.total_bytes)
                );
                self.disk_info = format!("Format: {}\nType: {:?}", disk.format, disk.drive_type);
                self.disk_bar = bar(disk.usage_percent());
            }
            Err(ProviderError::Transient(_)) => {}
            Err(err) => {
                self.disk = failure_text(err).to_string();
                self.disk_info.clear();
                self.disk_bar = 0;
            }
        }
    }

    fn apply_battery(&mut self, result: &SampleResult<BatterySample>) {
        match result {
            Ok(battery) => {
                self.battery_bar = battery.percent;
                self.battery_info = Some(battery_text(battery));
            }
            Err(ProviderError::Transient(_)) => {}
            Err(_) => {
                self.battery_bar = 0.0;
                self.battery_info = None;
            }
        }
    }
}

fn battery_text(battery: &BatterySample) -> String {
    if battery.on_ac_power {
        return format!("Charging {}%", battery.percent);
    }
    match battery.remaining_minutes {
        Some(minutes) => format!("Time left {} ({}%)", format_minutes(minutes), battery.percent),
        None => format!("On battery ({}%)", battery.percent),
    }
}

type Renderer = Box<dyn Fn(&Labels) + Send + Sync>;

/// Sink that keeps the current label texts, optionally re-rendering them
/// after every change.
#[derive(Default)]
pub struct LabelBoard {
    labels: Mutex<Labels>,
    renderer: Option<Renderer>,
}

impl LabelBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_renderer<F>(renderer: F) -> Self
    where
        F: Fn(&Labels) + Send + Sync + 'static,
    {
        Self {
            labels: Mutex::new(Labels::default()),
            renderer: Some(Box::new(renderer)),
        }
    }

    pub fn labels(&self) -> Labels {
        self.labels.lock().clone()
    }

    fn render(&self, labels: &Labels) {
        if let Some(renderer) = &self.renderer {
            renderer(labels);
        }
    }
}

impl SnapshotSink for LabelBoard {
    fn publish(&self, snapshot: &MetricSnapshot) {
        let labels = {
            let mut labels = self.labels.lock();
            labels.apply(snapshot);
            labels.clone()
        };
        self.render(&labels);
    }

    fn reset(&self) {
        let labels = {
            let mut labels = self.labels.lock();
            labels.zero();
            labels.clone()
        };
        self.render(&labels);
    }
}
