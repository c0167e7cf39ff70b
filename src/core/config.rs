//! Settings file and the polling configuration derived from it.
//!
//! The file is a flat JSON object of string values stored at
//! `<config_dir>/g14mon/settings.json`. Missing keys and malformed values
//! resolve to their defaults; a malformed value is warned about once per key.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use notify::{event::EventKind, Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};

use crate::error::{MonError, Result};

pub const SETTINGS_DIR: &str = "g14mon";
pub const SETTINGS_FILE: &str = "settings.json";

/// Longest accepted polling interval (one day).
pub const MAX_INTERVAL_SECONDS: u64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SettingKey {
    Monitoring,
    Interval,
    FanProfile,
    StartUp,
    Drive,
}

impl SettingKey {
    pub const ALL: [SettingKey; 5] = [
        SettingKey::Monitoring,
        SettingKey::Interval,
        SettingKey::FanProfile,
        SettingKey::StartUp,
        SettingKey::Drive,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SettingKey::Monitoring => "Monitoring",
            SettingKey::Interval => "Interval",
            SettingKey::FanProfile => "FanProfile",
            SettingKey::StartUp => "StartUp",
            SettingKey::Drive => "Drive",
        }
    }

    pub fn default_value(self) -> &'static str {
        match self {
            SettingKey::Monitoring => "true",
            SettingKey::Interval => "2",
            SettingKey::FanProfile => "0",
            SettingKey::StartUp => "false",
            SettingKey::Drive => "C",
        }
    }

    /// Canonical stored form of `raw`, or why it is rejected.
    pub fn normalize(self, raw: &str) -> std::result::Result<String, String> {
        let raw = raw.trim();
        match self {
            SettingKey::Monitoring | SettingKey::StartUp => {
                parse_bool(raw).map(|b| b.to_string()).ok_or_else(|| {
                    format!("expected true or false, got '{}'", raw)
                })
            }
            SettingKey::Interval => match raw.parse::<u64>() {
                Ok(secs) if (1..=MAX_INTERVAL_SECONDS).contains(&secs) => Ok(secs.to_string()),
                _ => Err(format!(
                    "expected a whole number of seconds between 1 and {}, got '{}'",
                    MAX_INTERVAL_SECONDS, raw
                )),
            },
            SettingKey::FanProfile => raw
                .parse::<FanProfile>()
                .map(|p| p.index().to_string())
                .map_err(|e| e.to_string()),
            SettingKey::Drive => {
                if raw.is_empty() {
                    Err("drive must not be empty".to_string())
                } else {
                    Ok(raw.to_string())
                }
            }
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = MonError;

    fn from_str(s: &str) -> Result<Self> {
        SettingKey::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                MonError::config(format!(
                    "unknown setting '{}' (expected one of Monitoring, Interval, FanProfile, StartUp, Drive)",
                    s
                ))
            })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    if raw.eq_ignore_ascii_case("true") {
        Some(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Fan profile selection. Persisted only; the firmware call is not issued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FanProfile {
    #[default]
    Silent,
    Balanced,
    Automatic,
    Turbo,
}

impl FanProfile {
    pub const ALL: [FanProfile; 4] = [
        FanProfile::Silent,
        FanProfile::Balanced,
        FanProfile::Automatic,
        FanProfile::Turbo,
    ];

    pub fn index(self) -> u8 {
        match self {
            FanProfile::Silent => 0,
            FanProfile::Balanced => 1,
            FanProfile::Automatic => 2,
            FanProfile::Turbo => 3,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        FanProfile::ALL.get(index as usize).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            FanProfile::Silent => "Silent",
            FanProfile::Balanced => "Balanced",
            FanProfile::Automatic => "Automatic",
            FanProfile::Turbo => "Turbo",
        }
    }
}

impl fmt::Display for FanProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts the stored index (`"0"`..`"3"`) or the profile name.
impl FromStr for FanProfile {
    type Err = MonError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(index) = s.parse::<u8>() {
            return FanProfile::from_index(index)
                .ok_or_else(|| MonError::config(format!("fan profile index {} out of range 0-3", index)));
        }
        FanProfile::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| MonError::config(format!("unknown fan profile '{}'", s)))
    }
}

/// What the orchestrator needs to know about the settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingConfig {
    pub interval_seconds: u64,
    pub monitoring_enabled: bool,
    pub fan_profile: FanProfile,
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds.clamp(1, MAX_INTERVAL_SECONDS))
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 2,
            monitoring_enabled: true,
            fan_profile: FanProfile::Silent,
        }
    }
}

pub trait ConfigProvider: Send + Sync {
    fn polling_config(&self) -> PollingConfig;
}

/// Every setting resolved to a typed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveSettings {
    pub monitoring: bool,
    pub interval_seconds: u64,
    pub fan_profile: FanProfile,
    pub start_up: bool,
    pub drive: String,
}

impl EffectiveSettings {
    pub fn polling_config(&self) -> PollingConfig {
        PollingConfig {
            interval_seconds: self.interval_seconds,
            monitoring_enabled: self.monitoring,
            fan_profile: self.fan_profile,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidSetting {
    pub key: SettingKey,
    pub value: String,
    pub reason: String,
}

/// Raw `{key: value}` contents of the settings file. Unknown keys are kept
/// so that rewriting the file never loses them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Settings {
    values: BTreeMap<String, String>,
}

impl Settings {
    /// Parses the file body. Non-string JSON scalars are accepted and kept
    /// in their textual form.
    pub fn from_json(body: &str) -> Result<Self> {
        if body.trim().is_empty() {
            return Ok(Self::default());
        }

        let raw: BTreeMap<String, serde_json::Value> = serde_json::from_str(body)?;
        let values = raw
            .into_iter()
            .map(|(k, v)| {
                let text = match v {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                (k, text)
            })
            .collect();

        Ok(Self { values })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Stored value, if present. Key lookup is case-insensitive.
    pub fn raw(&self, key: SettingKey) -> Option<&str> {
        self.values
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key.as_str()))
            .map(|(_, v)| v.as_str())
    }

    /// Validates and stores `value` in canonical form.
    pub fn set(&mut self, key: SettingKey, value: &str) -> Result<()> {
        let normalized = key
            .normalize(value)
            .map_err(|reason| MonError::config(format!("{}: {}", key, reason)))?;

        self.values.retain(|k, _| !k.eq_ignore_ascii_case(key.as_str()));
        self.values.insert(key.as_str().to_string(), normalized);
        Ok(())
    }

    /// Resolves every key, collecting the values that had to fall back.
    pub fn resolve(&self) -> (EffectiveSettings, Vec<InvalidSetting>) {
        let mut invalid = Vec::new();
        let mut value = |key: SettingKey| -> String {
            let Some(raw) = self.raw(key) else {
                return key.default_value().to_string();
            };
            match key.normalize(raw) {
                Ok(v) => v,
                Err(reason) => {
                    invalid.push(InvalidSetting {
                        key,
                        value: raw.to_string(),
                        reason,
                    });
                    key.default_value().to_string()
                }
            }
        };

        let monitoring = value(SettingKey::Monitoring);
        let interval = value(SettingKey::Interval);
        let fan_profile = value(SettingKey::FanProfile);
        let start_up = value(SettingKey::StartUp);
        let drive = value(SettingKey::Drive);

        // normalized values always parse
        let effective = EffectiveSettings {
            monitoring: monitoring == "true",
            interval_seconds: interval.parse().unwrap_or(2),
            fan_profile: fan_profile.parse().unwrap_or_default(),
            start_up: start_up == "true",
            drive,
        };

        (effective, invalid)
    }
}

/// The settings file plus a `watch` channel carrying the current
/// [`PollingConfig`].
pub struct SettingsStore {
    path: PathBuf,
    settings: RwLock<Settings>,
    warned: Mutex<HashSet<SettingKey>>,
    polling: watch::Sender<PollingConfig>,
}

impl SettingsStore {
    /// Opens the store at the per-user config location.
    pub fn open_default() -> Result<Self> {
        Self::open(default_settings_path()?)
    }

    /// Opens the store at `path`. A missing file means all defaults; an
    /// unreadable one is logged and treated the same way.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let settings = read_settings(&path)?;

        let store = Self {
            path,
            settings: RwLock::new(settings),
            warned: Mutex::new(HashSet::new()),
            polling: watch::channel(PollingConfig::default()).0,
        };
        let initial = store.effective().polling_config();
        store.polling.send_replace(initial);
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> Settings {
        self.settings.read().clone()
    }

    /// Typed view of the current settings. Malformed values are logged the
    /// first time they are seen.
    pub fn effective(&self) -> EffectiveSettings {
        let (effective, invalid) = self.settings.read().resolve();

        if !invalid.is_empty() {
            let mut warned = self.warned.lock();
            for bad in invalid {
                if warned.insert(bad.key) {
                    log::warn!(
                        "Invalid {} value '{}' ({}), using default '{}'",
                        bad.key,
                        bad.value,
                        bad.reason,
                        bad.key.default_value()
                    );
                }
            }
        }

        effective
    }

    pub fn subscribe(&self) -> watch::Receiver<PollingConfig> {
        self.polling.subscribe()
    }

    /// Validates, stores and persists one setting.
    pub fn set(&self, key: SettingKey, value: &str) -> Result<()> {
        {
            let mut settings = self.settings.write();
            settings.set(key, value)?;
            write_settings(&self.path, &settings)?;
        }
        self.warned.lock().remove(&key);
        self.publish();
        Ok(())
    }

    /// Re-reads the file. Returns whether the polling configuration changed.
    pub fn reload(&self) -> Result<bool> {
        let fresh = read_settings(&self.path)?;
        *self.settings.write() = fresh;
        Ok(self.publish())
    }

    fn publish(&self) -> bool {
        let next = self.effective().polling_config();
        self.polling.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        })
    }
}

impl ConfigProvider for SettingsStore {
    fn polling_config(&self) -> PollingConfig {
        *self.polling.borrow()
    }
}

pub fn default_settings_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| MonError::config("Could not determine config directory"))?;
    Ok(config_dir.join(SETTINGS_DIR).join(SETTINGS_FILE))
}

fn read_settings(path: &Path) -> Result<Settings> {
    let body = match fs::read_to_string(path) {
        Ok(body) => body,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Settings::default()),
        Err(e) => return Err(e.into()),
    };

    match Settings::from_json(&body) {
        Ok(settings) => Ok(settings),
        Err(e) => {
            log::warn!("Settings file {:?} is malformed ({}), using defaults", path, e);
            Ok(Settings::default())
        }
    }
}

fn write_settings(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, settings.to_json()?)?;
    Ok(())
}

/// Follows edits to the settings file until `shutdown` fires, reloading the
/// store on every write to it.
pub async fn watch_settings(store: Arc<SettingsStore>, mut shutdown: watch::Receiver<bool>) -> Result<()> {
    let (tx, mut rx) = mpsc::channel(16);

    let mut watcher = RecommendedWatcher::new(
        move |res: std::result::Result<Event, notify::Error>| {
            if let Ok(event) = res {
                // Receiver gone means the watch loop has already exited
                let _ = tx.blocking_send(event);
            }
        },
        Config::default(),
    )
    .map_err(|e| MonError::config(format!("Failed to create settings watcher: {}", e)))?;

    let dir = store
        .path()
        .parent()
        .ok_or_else(|| MonError::config("settings path has no parent directory"))?
        .to_path_buf();
    fs::create_dir_all(&dir)?;
    watcher
        .watch(&dir, RecursiveMode::NonRecursive)
        .map_err(|e| MonError::config(format!("Failed to watch {:?}: {}", dir, e)))?;
    log::info!("Watching for changes to settings file: {:?}", store.path());

    loop {
        tokio::select! {
            biased;
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            event = rx.recv() => {
                let Some(event) = event else { break };
                if !touches(&event, store.path()) {
                    continue;
                }
                match store.reload() {
                    Ok(true) => log::info!("Settings reloaded: {:?}", store.polling_config()),
                    Ok(false) => log::debug!("Settings file changed, polling config unchanged"),
                    Err(e) => log::error!("Failed to reload settings: {}", e),
                }
            }
        }
    }

    Ok(())
}

fn touches(event: &Event, path: &Path) -> bool {
    matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
        && event.paths.iter().any(|p| p.file_name() == path.file_name())
}
