//! Tokio runtime that hosts the monitor.
//!
//! Owns the orchestrator and the background tasks that feed it: settings
//! changes, settings-file hot reload and the AC/DC watcher driving the power
//! plan manager.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::{mpsc, watch};

use super::config::{watch_settings, ConfigProvider, SettingsStore};
use super::power::{watch_power_source, AcLineSource, PowerPlanManager, POWER_SOURCE_POLL};
use super::telemetry::{MetricSnapshot, Orchestrator, ProviderSet, SnapshotSink};

/// How long shutdown waits for in-flight blocking samples.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(3);

pub struct MonitorRuntime {
    orchestrator: Arc<Orchestrator>,
    shutdown_tx: watch::Sender<bool>,
    runtime: tokio::runtime::Runtime,
}

impl MonitorRuntime {
    /// Builds the runtime and a stopped orchestrator publishing to `sink`.
    pub fn new(providers: ProviderSet, sink: Arc<dyn SnapshotSink>) -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .thread_name("g14mon-worker")
            .build()
            .context("Failed to build monitor runtime")?;

        let orchestrator = {
            let _guard = runtime.enter();
            Orchestrator::new(providers, sink)?
        };

        let (shutdown_tx, _) = watch::channel(false);

        Ok(Self {
            orchestrator: Arc::new(orchestrator),
            shutdown_tx,
            runtime,
        })
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }

    /// Applies the current settings and keeps following them, including
    /// edits made to the settings file while running.
    pub fn follow_settings(&self, settings: Arc<SettingsStore>) -> anyhow::Result<()> {
        let config = settings.polling_config();
        log::info!(
            "Fan profile: {} (stored preference, not sent to firmware)",
            config.fan_profile
        );
        self.orchestrator
            .apply(&config)
            .context("Failed to apply polling configuration")?;

        let mut changes = settings.subscribe();
        let orchestrator = self.orchestrator.clone();
        let mut shutdown = self.shutdown_tx.subscribe();
        self.runtime.spawn(async move {
            loop {
                tokio::select! {
                    changed = changes.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let config = *changes.borrow_and_update();
                        if let Err(e) = orchestrator.apply(&config) {
                            log::error!("Rejected polling configuration {:?}: {}", config, e);
                        }
                    }
                    _ = shutdown.changed() => break,
                }
            }
        });

        let shutdown = self.shutdown_tx.subscribe();
        self.runtime.spawn(async move {
            if let Err(e) = watch_settings(settings, shutdown).await {
                log::warn!("Settings hot reload disabled: {}", e);
            }
        });

        Ok(())
    }

    /// Switches to the Balanced plan whenever the machine goes on battery.
    pub fn manage_power_plans(&self, plans: Arc<PowerPlanManager>, source: Arc<dyn AcLineSource>) {
        let (events_tx, mut events_rx) = mpsc::channel(8);

        self.runtime.spawn(watch_power_source(
            source,
            POWER_SOURCE_POLL,
            events_tx,
            self.shutdown_tx.subscribe(),
        ));

        self.runtime.spawn(async move {
            while let Some(event) = events_rx.recv().await {
                let plans = plans.clone();
                match tokio::task::spawn_blocking(move || plans.on_power_source_changed(event)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => log::warn!("Power plan switch failed: {}", e),
                    Err(e) => log::warn!("Power plan task failed: {}", e),
                }
            }
        });
    }

    /// One out-of-band sampling pass.
    pub fn sample_once(&self) -> MetricSnapshot {
        self.runtime.block_on(self.orchestrator.sample_once())
    }

    /// Stops sampling, delivers the reset and winds the runtime down.
    pub fn shutdown(self) {
        log::info!("Shutting down monitor");
        self.orchestrator.stop();
        let _ = self.shutdown_tx.send(true);

        let orchestrator = self.orchestrator.clone();
        self.runtime.block_on(async move {
            if tokio::time::timeout(SHUTDOWN_TIMEOUT, orchestrator.flush()).await.is_err() {
                log::warn!("Timed out waiting for the final reset to be delivered");
            }
        });

        self.runtime.shutdown_timeout(SHUTDOWN_TIMEOUT);
    }
}
