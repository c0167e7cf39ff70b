//! Fixed-interval sampling orchestrator.
//!
//! One timer task per running orchestrator dispatches a tick every interval.
//! A tick fans the five providers out onto the blocking pool, waits for all
//! of them, and hands the assembled snapshot to a single publisher task that
//! owns every call into the sink.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, watch, Semaphore};
use tokio::time::{Instant, MissedTickBehavior};

use super::metrics::{MetricSnapshot, ProviderError, SampleResult};
use super::provider::{ProviderSet, SharedProvider};
use super::sink::SnapshotSink;
use crate::core::config::{PollingConfig, MAX_INTERVAL_SECONDS};
use crate::error::{MonError, Result};

/// Messages drained by the publisher, in the order they were sent.
enum Publication {
    Snapshot { run: u64, snapshot: MetricSnapshot },
    Reset { run: u64 },
    Flush(oneshot::Sender<()>),
}

/// One permit per provider: held for the whole blocking call.
struct Guards {
    cpu: Arc<Semaphore>,
    gpu: Arc<Semaphore>,
    memory: Arc<Semaphore>,
    disk: Arc<Semaphore>,
    battery: Arc<Semaphore>,
}

impl Guards {
    fn new() -> Self {
        Self {
            cpu: Arc::new(Semaphore::new(1)),
            gpu: Arc::new(Semaphore::new(1)),
            memory: Arc::new(Semaphore::new(1)),
            disk: Arc::new(Semaphore::new(1)),
            battery: Arc::new(Semaphore::new(1)),
        }
    }
}

/// State shared between the orchestrator handle, its timer and its ticks.
struct Inner {
    providers: ProviderSet,
    guards: Guards,
    sequence: AtomicU64,
    publications: mpsc::UnboundedSender<Publication>,
    runtime: Handle,
}

enum State {
    Stopped,
    Running {
        run: u64,
        period: Duration,
        cancel: watch::Sender<bool>,
    },
}

pub struct Orchestrator {
    inner: Arc<Inner>,
    state: Mutex<State>,
    next_run: AtomicU64,
}

impl Orchestrator {
    /// Creates a stopped orchestrator and spawns its publisher on the
    /// current tokio runtime.
    pub fn new(providers: ProviderSet, sink: Arc<dyn SnapshotSink>) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| MonError::runtime(format!("orchestrator needs a tokio runtime: {}", e)))?;

        let (publications, rx) = mpsc::unbounded_channel();
        runtime.spawn(publisher_task(rx, sink));

        Ok(Self {
            inner: Arc::new(Inner {
                providers,
                guards: Guards::new(),
                sequence: AtomicU64::new(0),
                publications,
                runtime,
            }),
            state: Mutex::new(State::Stopped),
            next_run: AtomicU64::new(1),
        })
    }

    pub fn is_running(&self) -> bool {
        matches!(*self.state.lock(), State::Running { .. })
    }

    /// Current tick period, if running.
    pub fn interval(&self) -> Option<Duration> {
        match *self.state.lock() {
            State::Running { period, .. } => Some(period),
            State::Stopped => None,
        }
    }

    /// Starts ticking every `config.interval_seconds`.
    ///
    /// The first tick fires one interval from now. Restarting with the same
    /// interval is a no-op; a different interval replaces the timer.
    pub fn start(&self, config: &PollingConfig) -> Result<()> {
        if !(1..=MAX_INTERVAL_SECONDS).contains(&config.interval_seconds) {
            return Err(MonError::config(format!(
                "polling interval must be between 1 and {} seconds, got {}",
                MAX_INTERVAL_SECONDS, config.interval_seconds
            )));
        }
        self.start_with_period(config.interval());
        Ok(())
    }

    fn start_with_period(&self, period: Duration) {
        let mut state = self.state.lock();

        let run = match &*state {
            State::Running { period: current, .. } if *current == period => return,
            State::Running { run, cancel, .. } => {
                let _ = cancel.send(true);
                log::info!("Sampling interval changed to {:?}", period);
                *run
            }
            State::Stopped => {
                let run = self.next_run.fetch_add(1, Ordering::SeqCst);
                log::info!("Monitoring started (run {}, every {:?})", run, period);
                run
            }
        };

        let (cancel, cancelled) = watch::channel(false);
        self.inner
            .runtime
            .spawn(timer_task(self.inner.clone(), run, period, cancelled));

        *state = State::Running { run, period, cancel };
    }

    /// Cancels the timer and sends the sink a reset. Ticks already in flight
    /// run to completion but their snapshots are discarded.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        let State::Running { run, cancel, .. } = std::mem::replace(&mut *state, State::Stopped)
        else {
            return;
        };

        let _ = cancel.send(true);
        let _ = self.inner.publications.send(Publication::Reset { run });
        log::info!("Monitoring stopped (run {})", run);
    }

    /// Starts or stops according to `config.monitoring_enabled`.
    pub fn apply(&self, config: &PollingConfig) -> Result<()> {
        if config.monitoring_enabled {
            self.start(config)
        } else {
            self.stop();
            Ok(())
        }
    }

    /// Waits until everything queued for the sink so far has been delivered.
    pub async fn flush(&self) {
        let (done, delivered) = oneshot::channel();
        if self.inner.publications.send(Publication::Flush(done)).is_ok() {
            let _ = delivered.await;
        }
    }

    /// One pass outside the timer, through the same overlap guards. The
    /// snapshot is returned instead of published.
    pub async fn sample_once(&self) -> MetricSnapshot {
        self.inner.sample_all().await
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        if let State::Running { cancel, .. } = &*self.state.lock() {
            let _ = cancel.send(true);
        }
    }
}

impl Inner {
    async fn sample_all(&self) -> MetricSnapshot {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let p = &self.providers;
        let g = &self.guards;

        let (cpu, gpu, memory, disk, battery) = tokio::join!(
            dispatch(&p.cpu, &g.cpu),
            dispatch(&p.gpu, &g.gpu),
            dispatch(&p.memory, &g.memory),
            dispatch(&p.disk, &g.disk),
            dispatch(&p.battery, &g.battery),
        );

        MetricSnapshot {
            sequence,
            taken_at: Local::now(),
            cpu,
            gpu,
            memory,
            disk,
            battery,
        }
    }
}

/// Runs one provider on the blocking pool unless it is still busy.
async fn dispatch<S: Send + 'static>(
    provider: &SharedProvider<S>,
    guard: &Arc<Semaphore>,
) -> SampleResult<S> {
    let name = provider.name();

    let permit = match guard.clone().try_acquire_owned() {
        Ok(permit) => permit,
        Err(_) => {
            log::debug!("{} provider still busy, skipping this tick", name);
            return Err(ProviderError::transient(format!("{} provider busy", name)));
        }
    };

    let provider = provider.clone();
    let handle = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        provider.sample()
    });

    match handle.await {
        Ok(result) => {
            if let Err(e) = &result {
                log::debug!("{} sample failed: {}", name, e);
            }
            result
        }
        Err(e) => {
            log::warn!("{} provider task failed: {}", name, e);
            Err(ProviderError::transient(format!("{} provider task failed", name)))
        }
    }
}

async fn timer_task(inner: Arc<Inner>, run: u64, period: Duration, mut cancelled: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            changed = cancelled.changed() => {
                if changed.is_err() || *cancelled.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                let inner = inner.clone();
                tokio::spawn(async move {
                    let snapshot = inner.sample_all().await;
                    log::trace!("Tick {} assembled", snapshot.sequence);
                    let _ = inner.publications.send(Publication::Snapshot { run, snapshot });
                });
            }
        }
    }

    log::debug!("Timer for run {} exited", run);
}

/// Single consumer of record. Snapshots from a run that has since been reset
/// are dropped so they can never overwrite the reset state.
async fn publisher_task(mut rx: mpsc::UnboundedReceiver<Publication>, sink: Arc<dyn SnapshotSink>) {
    let mut last_reset_run = 0u64;

    while let Some(publication) = rx.recv().await {
        match publication {
            Publication::Snapshot { run, snapshot } => {
                if run <= last_reset_run {
                    log::debug!(
                        "Discarding snapshot {} from stopped run {}",
                        snapshot.sequence,
                        run
                    );
                    continue;
                }
                sink.publish(&snapshot);
            }
            Publication::Reset { run } => {
                last_reset_run = last_reset_run.max(run);
                sink.reset();
            }
            Publication::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
}
