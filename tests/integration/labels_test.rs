use std::sync::Arc;

use chrono::Local;
use parking_lot::Mutex;

use g14mon::core::telemetry::{
    BatterySample, CpuSample, DiskSample, GpuSample, MemorySample, MetricSnapshot,
    ProviderError, SnapshotSink,
};
use g14mon::ui::labels::{LabelBoard, Labels, NOT_SUPPORTED};

fn snapshot(sequence: u64) -> MetricSnapshot {
    MetricSnapshot {
        sequence,
        taken_at: Local::now(),
        cpu: Ok(CpuSample {
            name: "AMD Ryzen 7 4800HS".to_string(),
            max_clock_mhz: 2900.0,
            current_clock_mhz: 2900.0,
            utilization_percent: 50.0,
            temperature_celsius: Some(61.3),
            fan_rpm: 4500,
        }),
        gpu: Err(ProviderError::unavailable("no NVIDIA driver")),
        memory: Ok(MemorySample::new(16 << 30, 4 << 30)),
        disk: Ok(DiskSample {
            volume_label: "Data".to_string(),
            total_bytes: 1 << 40,
            free_bytes: 1 << 39,
            format: "NTFS".to_string(),
            ..Default::default()
        }),
        battery: Ok(BatterySample {
            percent: 100.0,
            on_ac_power: true,
            remaining_minutes: None,
        }),
    }
}

#[test]
fn test_board_renders_every_update() {
    let seen: Arc<Mutex<Vec<Labels>>> = Arc::new(Mutex::new(Vec::new()));
    let board = {
        let seen = seen.clone();
        LabelBoard::with_renderer(move |labels| seen.lock().push(labels.clone()))
    };

    board.publish(&snapshot(1));
    board.publish(&snapshot(2));
    board.reset();

    let seen = seen.lock();
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[0].sequence, Some(1));
    assert_eq!(seen[1].cpu_temperature, "61.3°C");
    assert_eq!(seen[1].gpu_frequency, NOT_SUPPORTED);
    assert_eq!(seen[1].disk, "Data 512.0GB/1.0TB");
    assert_eq!(seen[1].battery_info.as_deref(), Some("Charging 100%"));
    assert_eq!(seen[2].sequence, None);
}

#[test]
fn test_reset_zeroes_readings_but_keeps_names() {
    let board = LabelBoard::new();
    board.publish(&snapshot(3));
    board.reset();

    let labels = board.labels();
    assert_eq!(labels.cpu_name, "AMD Ryzen 7 4800HS");
    assert_eq!(labels.cpu_usage, "Total usage: 0%");
    assert_eq!(labels.cpu_frequency, "0Mhz");
    assert_eq!(labels.cpu_temperature, "0°C");
    assert_eq!(labels.cpu_fan, "0rpm");
    assert_eq!(labels.ram, "RAM 4.0GB/16.0GB");
    assert_eq!(labels.ram_bar, 0);
    assert_eq!(labels.battery_info, None);
}

#[test]
fn test_gpu_recovering_from_power_saving() {
    let board = LabelBoard::new();
    let mut asleep = snapshot(1);
    asleep.gpu = Err(ProviderError::PowerSaving);
    board.publish(&asleep);

    let mut awake = snapshot(2);
    awake.gpu = Ok(GpuSample {
        name: "NVIDIA GeForce GTX 1660 Ti with Max-Q design".to_string(),
        core_clock_mhz: 1140,
        memory_clock_mhz: 5000,
        ..Default::default()
    });
    board.publish(&awake);

    let labels = board.labels();
    assert_eq!(labels.gpu_frequency, "1140Mhz");
    assert_eq!(labels.gpu_memory, "5000Mhz");
    assert_eq!(labels.gpu_temperature, NOT_SUPPORTED);
}
