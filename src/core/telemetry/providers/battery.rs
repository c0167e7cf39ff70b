use battery::units::time::minute;
use battery::{Manager, State};

use crate::core::telemetry::metrics::{BatterySample, ProviderError, SampleResult};
use crate::core::telemetry::provider::MetricProvider;

/// Charge level, AC state and remaining time of the first battery.
pub struct BatteryProvider;

impl BatteryProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BatteryProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Anything that is not actively draining is treated as "on AC".
pub fn is_on_ac(state: State) -> bool {
    !matches!(state, State::Discharging | State::Empty)
}

/// Builds a sample; remaining time is only meaningful while on battery.
pub fn battery_sample(charge_percent: f32, state: State, minutes_to_empty: Option<f32>) -> BatterySample {
    let on_ac_power = is_on_ac(state);
    let percent = ((charge_percent as f64).clamp(0.0, 100.0) * 10.0).round() / 10.0;

    BatterySample {
        percent,
        on_ac_power,
        remaining_minutes: if on_ac_power {
            None
        } else {
            minutes_to_empty
                .filter(|m| m.is_finite() && *m >= 0.0)
                .map(|m| (m as f64 * 10.0).round() / 10.0)
        },
    }
}

fn read_first_battery() -> SampleResult<BatterySample> {
    // Manager is not Send, so it is created on the sampling thread.
    let manager =
        Manager::new().map_err(|e| ProviderError::unavailable(format!("battery manager: {}", e)))?;

    let mut batteries = manager
        .batteries()
        .map_err(|e| ProviderError::transient(format!("battery enumeration: {}", e)))?;

    let battery = batteries
        .next()
        .ok_or_else(|| ProviderError::unavailable("no battery present"))?
        .map_err(|e| ProviderError::transient(format!("battery read: {}", e)))?;

    Ok(battery_sample(
        battery.state_of_charge().get::<battery::units::ratio::percent>(),
        battery.state(),
        battery.time_to_empty().map(|t| t.get::<minute>()),
    ))
}

/// Current AC line state, or `None` when it cannot be determined.
pub fn on_ac_power() -> Option<bool> {
    read_first_battery().ok().map(|b| b.on_ac_power)
}

impl MetricProvider for BatteryProvider {
    type Sample = BatterySample;

    fn name(&self) -> &'static str {
        "battery"
    }

    fn sample(&self) -> SampleResult<BatterySample> {
        read_first_battery()
    }
}
