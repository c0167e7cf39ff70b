use std::fs;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::watch;

use g14mon::core::config::{
    watch_settings, ConfigProvider, FanProfile, PollingConfig, SettingKey, SettingsStore,
    SETTINGS_FILE,
};

#[test]
fn test_settings_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("g14mon").join(SETTINGS_FILE);

    {
        let store = SettingsStore::open(&path).unwrap();
        store.set(SettingKey::Monitoring, "FALSE").unwrap();
        store.set(SettingKey::Interval, "10").unwrap();
        store.set(SettingKey::FanProfile, "Automatic").unwrap();
        store.set(SettingKey::Drive, "D").unwrap();
    }

    let store = SettingsStore::open(&path).unwrap();
    let effective = store.effective();
    assert!(!effective.monitoring);
    assert_eq!(effective.interval_seconds, 10);
    assert_eq!(effective.fan_profile, FanProfile::Automatic);
    assert_eq!(effective.drive, "D");
    assert_eq!(
        store.polling_config(),
        PollingConfig {
            interval_seconds: 10,
            monitoring_enabled: false,
            fan_profile: FanProfile::Automatic,
        }
    );
}

#[test]
fn test_hand_edited_file_with_bad_interval_keeps_other_keys() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(SETTINGS_FILE);
    fs::write(&path, r#"{"interval": "fast", "monitoring": "False"}"#).unwrap();

    let store = SettingsStore::open(&path).unwrap();
    let config = store.polling_config();

    assert_eq!(config.interval_seconds, 2);
    assert!(!config.monitoring_enabled);
}

#[test]
fn test_reload_reports_only_polling_changes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(SETTINGS_FILE);
    fs::write(&path, r#"{"Interval": "2"}"#).unwrap();
    let store = SettingsStore::open(&path).unwrap();

    fs::write(&path, r#"{"Interval": "2", "Drive": "E"}"#).unwrap();
    assert!(!store.reload().unwrap());
    assert_eq!(store.effective().drive, "E");

    fs::write(&path, r#"{"Interval": "4", "Drive": "E"}"#).unwrap();
    assert!(store.reload().unwrap());
    assert_eq!(store.polling_config().interval_seconds, 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_external_edit_is_picked_up() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(SETTINGS_FILE);
    fs::write(&path, r#"{"Interval": "2"}"#).unwrap();

    let store = Arc::new(SettingsStore::open(&path).unwrap());
    let mut changes = store.subscribe();
    let (stop, stopped) = watch::channel(false);
    let watcher = tokio::spawn(watch_settings(store.clone(), stopped));

    // Let the watcher register before editing
    tokio::time::sleep(Duration::from_millis(200)).await;
    fs::write(&path, r#"{"Interval": "7"}"#).unwrap();

    tokio::time::timeout(Duration::from_secs(5), changes.changed())
        .await
        .expect("settings change not observed")
        .unwrap();
    assert_eq!(changes.borrow().interval_seconds, 7);

    stop.send(true).unwrap();
    watcher.await.unwrap().unwrap();
}
