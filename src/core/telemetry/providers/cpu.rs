use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use sysinfo::{CpuRefreshKind, RefreshKind, System};

use crate::core::telemetry::fan::{read_fan_rpm, FanChannel, FanStatusReader};
use crate::core::telemetry::metrics::{CpuSample, ProviderError, SampleResult};
use crate::core::telemetry::provider::{MetricProvider, RateCounter};
use crate::platform::windows::{cpu, thermal};

/// Wait between the two utilization reads. The first read of a rate
/// counter only primes it.
pub const CPU_SETTLE_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
struct Identity {
    name: String,
    max_clock_mhz: f64,
}

/// CPU clock, utilization, temperature and fan speed.
pub struct CpuProvider {
    system: Mutex<System>,
    identity: OnceCell<Identity>,
    fans: Arc<dyn FanStatusReader>,
}

impl CpuProvider {
    pub fn new(fans: Arc<dyn FanStatusReader>) -> Self {
        let refresh_kind = RefreshKind::nothing().with_cpu(CpuRefreshKind::everything());

        Self {
            system: Mutex::new(System::new_with_specifics(refresh_kind)),
            identity: OnceCell::new(),
            fans,
        }
    }

    /// Name and rated clock never change, so they are queried once.
    fn identity(&self, system: &System) -> &Identity {
        self.identity.get_or_init(|| match cpu::processor_identity() {
            Ok(identity) => Identity {
                name: identity.name,
                max_clock_mhz: identity.max_clock_mhz as f64,
            },
            Err(e) => {
                log::debug!("Win32_Processor unavailable, using OS CPU info: {}", e);
                let cpus = system.cpus();
                Identity {
                    name: cpus
                        .first()
                        .map(|c| c.brand().trim().to_string())
                        .unwrap_or_default(),
                    max_clock_mhz: cpus.iter().map(|c| c.frequency()).max().unwrap_or(0) as f64,
                }
            }
        })
    }
}

/// Current clock derived from the rated clock and `% Processor Performance`.
pub fn current_clock_mhz(max_clock_mhz: f64, performance_percent: f64) -> f64 {
    max_clock_mhz * performance_percent / 100.0
}

/// Primes the performance counter and the OS utilization counters, waits
/// `delay`, then takes the real reading of both. Returns the performance
/// percentage when the counter answered both times.
fn read_across_settle_delay(
    system: &mut System,
    counter: Option<&mut dyn RateCounter>,
    delay: Duration,
) -> Option<f64> {
    let counter = counter.and_then(|counter| match counter.next_value() {
        Ok(_) => Some(counter),
        Err(e) => {
            log::debug!("Failed to prime processor performance counter: {}", e);
            None
        }
    });
    system.refresh_cpu_usage();

    std::thread::sleep(delay);

    system.refresh_cpu_usage();
    counter.and_then(|counter| match counter.next_value() {
        Ok(percent) => Some(percent),
        Err(e) => {
            log::debug!("Processor performance counter read failed: {}", e);
            None
        }
    })
}

impl MetricProvider for CpuProvider {
    type Sample = CpuSample;

    fn name(&self) -> &'static str {
        "cpu"
    }

    fn sample(&self) -> SampleResult<CpuSample> {
        let mut performance_counter = match cpu::ProcessorPerformanceCounter::open() {
            Ok(counter) => Some(counter),
            Err(e) => {
                log::debug!("Processor performance counter unavailable: {}", e);
                None
            }
        };

        let mut system = self.system.lock();
        let performance_percent = read_across_settle_delay(
            &mut system,
            performance_counter
                .as_mut()
                .map(|counter| counter as &mut dyn RateCounter),
            CPU_SETTLE_DELAY.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL),
        );
        system.refresh_cpu_frequency();

        if system.cpus().is_empty() {
            return Err(ProviderError::unavailable("no processors reported"));
        }

        let utilization = (system.global_cpu_usage() as f64).clamp(0.0, 100.0);
        let os_clock = system.cpus().iter().map(|c| c.frequency()).sum::<u64>() as f64
            / system.cpus().len() as f64;
        let identity = self.identity(&system).clone();
        drop(system);

        let current_clock = match performance_percent {
            Some(percent) => current_clock_mhz(identity.max_clock_mhz, percent),
            None => os_clock,
        };

        let temperature = match thermal::read_cpu_temperature() {
            Ok(celsius) => Some(celsius),
            Err(e) => {
                log::debug!("CPU temperature unavailable: {}", e);
                None
            }
        };

        Ok(CpuSample {
            name: identity.name,
            max_clock_mhz: identity.max_clock_mhz,
            current_clock_mhz: current_clock,
            utilization_percent: utilization,
            temperature_celsius: temperature,
            fan_rpm: read_fan_rpm(&*self.fans, FanChannel::Cpu),
        })
    }
}
