use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;

use crate::core::telemetry::providers::on_ac_power;

/// How often the AC line state is polled while the monitor runs.
pub const POWER_SOURCE_POLL: Duration = Duration::from_secs(5);

/// The machine switched between mains and battery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PowerSourceEvent {
    pub on_ac_power: bool,
}

/// Where the AC line state comes from. `None` means "could not tell".
pub trait AcLineSource: Send + Sync {
    fn on_ac_power(&self) -> Option<bool>;
}

/// AC state as reported by the battery driver.
#[derive(Debug, Default)]
pub struct BatteryAcLine;

impl AcLineSource for BatteryAcLine {
    fn on_ac_power(&self) -> Option<bool> {
        on_ac_power()
    }
}

/// Turns a stream of readings into transition events. The first known
/// reading only sets the baseline.
#[derive(Debug, Default)]
pub struct TransitionTracker {
    last: Option<bool>,
}

impl TransitionTracker {
    pub fn observe(&mut self, reading: Option<bool>) -> Option<PowerSourceEvent> {
        let current = reading?;
        let previous = self.last.replace(current);
        match previous {
            Some(prev) if prev != current => Some(PowerSourceEvent { on_ac_power: current }),
            _ => None,
        }
    }
}

/// Polls `source` every `period` and sends an event on each transition,
/// until `shutdown` fires or the receiver goes away.
pub async fn watch_power_source(
    source: Arc<dyn AcLineSource>,
    period: Duration,
    events: mpsc::Sender<PowerSourceEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut tracker = TransitionTracker::default();
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                let source = source.clone();
                let reading = match tokio::task::spawn_blocking(move || source.on_ac_power()).await {
                    Ok(reading) => reading,
                    Err(e) => {
                        log::warn!("AC line query failed: {}", e);
                        None
                    }
                };

                if let Some(event) = tracker.observe(reading) {
                    log::info!(
                        "Power source changed: {}",
                        if event.on_ac_power { "AC" } else { "battery" }
                    );
                    if events.send(event).await.is_err() {
                        break;
                    }
                }
            }
        }
    }

    log::debug!("Power source watcher exited");
}
