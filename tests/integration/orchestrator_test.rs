use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tempfile::TempDir;

use g14mon::core::config::{PollingConfig, SettingKey, SettingsStore, SETTINGS_FILE};
use g14mon::core::runtime::MonitorRuntime;
use g14mon::core::telemetry::{
    BatterySample, CpuSample, DiskSample, GpuSample, MemorySample, MetricProvider,
    MetricSnapshot, Orchestrator, ProviderError, ProviderSet, SampleResult, SnapshotSink,
};
use g14mon::ui::labels::{LabelBoard, ENERGY_SAVING};

/// Returns the same sample every time and counts how often it was asked.
struct Fixed<S> {
    value: S,
    calls: Arc<AtomicUsize>,
}

impl<S: Clone + Send + Sync + 'static> MetricProvider for Fixed<S> {
    type Sample = S;

    fn name(&self) -> &'static str {
        "fixed"
    }

    fn sample(&self) -> SampleResult<S> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.value.clone())
    }
}

/// Invocation counts of the five providers built by `healthy_providers`.
#[derive(Default)]
struct CallCounts {
    cpu: Arc<AtomicUsize>,
    gpu: Arc<AtomicUsize>,
    memory: Arc<AtomicUsize>,
    disk: Arc<AtomicUsize>,
    battery: Arc<AtomicUsize>,
}

impl CallCounts {
    fn all(&self) -> [usize; 5] {
        [&self.cpu, &self.gpu, &self.memory, &self.disk, &self.battery]
            .map(|calls| calls.load(Ordering::SeqCst))
    }
}

fn fixed<S>(value: S, calls: &Arc<AtomicUsize>) -> Arc<Fixed<S>> {
    Arc::new(Fixed {
        value,
        calls: calls.clone(),
    })
}

struct AsleepGpu;

impl MetricProvider for AsleepGpu {
    type Sample = GpuSample;

    fn name(&self) -> &'static str {
        "gpu"
    }

    fn sample(&self) -> SampleResult<GpuSample> {
        Err(ProviderError::PowerSaving)
    }
}

/// Panics on every other call.
#[derive(Default)]
struct FlakyBattery {
    calls: AtomicU32,
}

impl MetricProvider for FlakyBattery {
    type Sample = BatterySample;

    fn name(&self) -> &'static str {
        "battery"
    }

    fn sample(&self) -> SampleResult<BatterySample> {
        if self.calls.fetch_add(1, Ordering::SeqCst) % 2 == 0 {
            panic!("battery driver went away");
        }
        Ok(BatterySample {
            percent: 80.0,
            on_ac_power: true,
            remaining_minutes: None,
        })
    }
}

#[derive(Default)]
struct Recorder {
    snapshots: Mutex<Vec<MetricSnapshot>>,
    resets: AtomicUsize,
}

impl Recorder {
    fn snapshots(&self) -> Vec<MetricSnapshot> {
        self.snapshots.lock().clone()
    }
}

impl SnapshotSink for Recorder {
    fn publish(&self, snapshot: &MetricSnapshot) {
        self.snapshots.lock().push(snapshot.clone());
    }

    fn reset(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}

fn healthy_providers() -> ProviderSet {
    counted_providers(&CallCounts::default())
}

fn counted_providers(calls: &CallCounts) -> ProviderSet {
    ProviderSet {
        cpu: fixed(
            CpuSample {
                name: "AMD Ryzen 9 4900HS".to_string(),
                max_clock_mhz: 3000.0,
                current_clock_mhz: 2950.0,
                utilization_percent: 12.5,
                temperature_celsius: Some(48.0),
                fan_rpm: 3100,
            },
            &calls.cpu,
        ),
        gpu: fixed(
            GpuSample {
                name: "NVIDIA GeForce RTX 2060 with Max-Q Design".to_string(),
                utilization_percent: 3,
                temperature_celsius: Some(45.0),
                total_memory_gb: 6.44,
                available_memory_gb: 6.1,
                core_clock_mhz: 300,
                memory_clock_mhz: 405,
                fan_rpm: 4200,
                ..Default::default()
            },
            &calls.gpu,
        ),
        memory: fixed(MemorySample::new(16 << 30, 6 << 30), &calls.memory),
        disk: fixed(
            DiskSample {
                volume_label: "C:".to_string(),
                total_bytes: 512 << 30,
                free_bytes: 200 << 30,
                format: "NTFS".to_string(),
                ..Default::default()
            },
            &calls.disk,
        ),
        battery: fixed(
            BatterySample {
                percent: 97.0,
                on_ac_power: false,
                remaining_minutes: Some(310.0),
            },
            &calls.battery,
        ),
    }
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn every_two_seconds() -> PollingConfig {
    PollingConfig {
        interval_seconds: 2,
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_two_second_interval_publishes_five_snapshots_in_ten_seconds() {
    init_logging();
    let sink = Arc::new(Recorder::default());
    let calls = CallCounts::default();
    let orchestrator = Orchestrator::new(counted_providers(&calls), sink.clone()).unwrap();

    orchestrator.start(&every_two_seconds()).unwrap();
    tokio::time::sleep(Duration::from_millis(10_500)).await;
    orchestrator.flush().await;

    // Each tick asks every provider exactly once
    assert_eq!(calls.all(), [5; 5]);
    let snapshots = sink.snapshots();
    assert_eq!(snapshots.len(), 5);
    for snapshot in &snapshots {
        assert_eq!(snapshot.cpu.as_ref().unwrap().fan_rpm, 3100);
        assert_eq!(snapshot.gpu.as_ref().unwrap().core_clock_mhz, 300);
        assert!(snapshot.memory.is_ok());
        assert_eq!(snapshot.disk.as_ref().unwrap().format, "NTFS");
        assert_eq!(snapshot.battery.as_ref().unwrap().percent, 97.0);
    }
    assert!(snapshots.windows(2).all(|w| w[0].sequence < w[1].sequence));

    orchestrator.stop();
    orchestrator.flush().await;
    assert_eq!(sink.resets.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_sleeping_gpu_shows_energy_saving_and_monitoring_continues() {
    init_logging();
    let rendered = Arc::new(Mutex::new(Vec::new()));
    let board = {
        let rendered = rendered.clone();
        Arc::new(LabelBoard::with_renderer(move |labels| {
            rendered.lock().push(labels.clone());
        }))
    };

    let providers = ProviderSet {
        gpu: Arc::new(AsleepGpu),
        ..healthy_providers()
    };
    let orchestrator = Orchestrator::new(providers, board.clone()).unwrap();

    orchestrator.start(&every_two_seconds()).unwrap();
    tokio::time::sleep(Duration::from_millis(6_500)).await;
    orchestrator.flush().await;

    let rendered = rendered.lock().clone();
    assert_eq!(rendered.len(), 3);
    for labels in &rendered {
        assert_eq!(labels.gpu_frequency, ENERGY_SAVING);
        assert_eq!(labels.gpu_memory, ENERGY_SAVING);
        assert_eq!(labels.gpu_temperature, "0°C");
        assert_eq!(labels.cpu_fan, "3100rpm");
    }
    assert!(orchestrator.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_panicking_provider_is_transient_and_timer_survives() {
    init_logging();
    let sink = Arc::new(Recorder::default());
    let providers = ProviderSet {
        battery: Arc::new(FlakyBattery::default()),
        ..healthy_providers()
    };
    let orchestrator = Orchestrator::new(providers, sink.clone()).unwrap();

    orchestrator.start(&every_two_seconds()).unwrap();
    tokio::time::sleep(Duration::from_millis(8_500)).await;
    orchestrator.flush().await;

    let snapshots = sink.snapshots();
    assert_eq!(snapshots.len(), 4);
    let transient = snapshots
        .iter()
        .filter(|s| matches!(s.battery, Err(ProviderError::Transient(_))))
        .count();
    assert_eq!(transient, 2);
    assert!(snapshots.iter().all(|s| s.cpu.is_ok()));
}

#[tokio::test(start_paused = true)]
async fn test_restart_after_stop_publishes_again() {
    init_logging();
    let sink = Arc::new(Recorder::default());
    let orchestrator = Orchestrator::new(healthy_providers(), sink.clone()).unwrap();

    orchestrator.start(&every_two_seconds()).unwrap();
    tokio::time::sleep(Duration::from_millis(2_500)).await;
    orchestrator.stop();
    orchestrator.flush().await;
    assert_eq!(sink.snapshots().len(), 1);

    // Nothing is published while stopped
    tokio::time::sleep(Duration::from_secs(10)).await;
    orchestrator.flush().await;
    assert_eq!(sink.snapshots().len(), 1);

    orchestrator.start(&every_two_seconds()).unwrap();
    tokio::time::sleep(Duration::from_millis(4_500)).await;
    orchestrator.flush().await;
    assert_eq!(sink.snapshots().len(), 3);
    assert_eq!(sink.resets.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_disabled_monitoring_never_samples() {
    init_logging();
    let sink = Arc::new(Recorder::default());
    let orchestrator = Orchestrator::new(healthy_providers(), sink.clone()).unwrap();

    orchestrator
        .apply(&PollingConfig {
            monitoring_enabled: false,
            ..every_two_seconds()
        })
        .unwrap();
    tokio::time::sleep(Duration::from_secs(10)).await;
    orchestrator.flush().await;

    assert!(!orchestrator.is_running());
    assert!(sink.snapshots().is_empty());
}

#[test]
fn test_monitor_runtime_follows_settings_and_resets_on_shutdown() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let store = Arc::new(SettingsStore::open(dir.path().join(SETTINGS_FILE)).unwrap());
    store.set(SettingKey::Interval, "1").unwrap();

    let board = Arc::new(LabelBoard::new());
    let runtime = MonitorRuntime::new(healthy_providers(), board.clone()).unwrap();
    runtime.follow_settings(store).unwrap();
    assert_eq!(runtime.orchestrator().interval(), Some(Duration::from_secs(1)));

    std::thread::sleep(Duration::from_millis(1_600));
    assert!(board.labels().sequence.is_some());

    runtime.shutdown();
    let labels = board.labels();
    assert_eq!(labels.sequence, None);
    assert_eq!(labels.cpu_fan, "0rpm");
    assert_eq!(labels.cpu_name, "AMD Ryzen 9 4900HS");
}

#[test]
fn test_runtime_sample_once_does_not_publish() {
    init_logging();
    let sink = Arc::new(Recorder::default());
    let runtime = MonitorRuntime::new(healthy_providers(), sink.clone()).unwrap();

    let snapshot = runtime.sample_once();
    assert_eq!(snapshot.battery.unwrap().remaining_minutes, Some(310.0));

    runtime.shutdown();
    assert!(sink.snapshots().is_empty());
    assert_eq!(sink.resets.load(Ordering::SeqCst), 0);
}
