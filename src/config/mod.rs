//! Configuration file management
//!
//! Loads TOML configuration files and provides application settings.
//! Default config path: ~/.config/clutch/config.toml

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[cfg(target_os = "linux")]
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
#[cfg(target_os = "linux")]
use std::sync::mpsc;

use crate::constants::{
    APP_NAME, CONFIG_ENV, DEFAULT_IDLE_MS, DEFAULT_OUTPUT_NAME, DEFAULT_PEDAL_NAMES,
};

/// Application settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which input devices count as pedals
    pub devices: DeviceConfig,
    /// Virtual keyboard settings
    pub output: OutputConfig,
    /// Poll loop settings
    pub poll: PollConfig,
    /// Pedal press/release key mapping
    pub mapping: MappingConfig,
}

/// Pedal selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Device names accepted as pedals (exact match)
    pub names: Vec<String>,
}

/// Virtual keyboard settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Name of the uinput device
    pub name: String,
}

/// Poll loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Sleep between polling passes in milliseconds (default: 20)
    /// Lower values reduce latency, higher values reduce CPU wakeups
    pub idle_ms: u64,
}

/// Key mapping
///
/// Each entry is `"<down|up|tap> KEY_NAME"`, run in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    /// Actions when the pedal is pressed
    pub press: Vec<String>,
    /// Actions when the pedal is released
    pub release: Vec<String>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            names: DEFAULT_PEDAL_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_OUTPUT_NAME.to_string(),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            idle_ms: DEFAULT_IDLE_MS,
        }
    }
}

impl PollConfig {
    pub fn idle(&self) -> Duration {
        Duration::from_millis(self.idle_ms)
    }
}

impl Default for MappingConfig {
    fn default() -> Self {
        // Clutch on Caps Lock: pedal down releases it, pedal up presses it
        Self {
            press: vec!["up KEY_CAPSLOCK".to_string()],
            release: vec!["down KEY_CAPSLOCK".to_string()],
        }
    }
}

/// Commented template written by `--init-config`
const CONFIG_TEMPLATE: &str = r#"# clutch configuration
#
# Lookup order:
#   1. $CLUTCH_CONFIG
#   2. ~/.config/clutch/config.toml
#   3. /etc/clutch/config.toml

[devices]
# Input device names treated as pedals (exact match).
# Find yours with: cat /proc/bus/input/devices
names = ["RDing FootSwitchV1.1"]

[output]
# Name of the virtual keyboard created via uinput
name = "Emacs-Clutch Foot-Pedal"

[poll]
# Sleep between polling passes (ms). Bounds latency and CPU use.
idle_ms = 20

[mapping]
# Actions: "down KEY", "up KEY", "tap KEY" (down then up).
# Keys use linux/input-event-codes.h names, e.g. KEY_CAPSLOCK, KEY_ESC.
# Each action is followed by its own sync report.
# This section is reloaded when the file changes.
#
# Clutch: pressing the pedal releases Caps Lock, releasing it presses Caps Lock.
press = ["up KEY_CAPSLOCK"]
release = ["down KEY_CAPSLOCK"]

# Example: leave insert mode on press, re-enter on release
# press = ["tap KEY_ESC"]
# release = ["tap KEY_I"]
"#;

impl Config {
    /// System-wide config path
    const SYSTEM_CONFIG_PATH: &'static str = "/etc/clutch/config.toml";

    /// Get the path that would be used for loading config
    /// Returns None if using built-in defaults
    pub fn config_path() -> Option<PathBuf> {
        // 1. CLUTCH_CONFIG environment variable
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let p = Path::new(&path);
            if p.exists() {
                return Some(p.to_path_buf());
            }
            warn!("{} points to missing file: {}", CONFIG_ENV, path);
        }

        // 2. User config: ~/.config/clutch/config.toml
        if let Some(path) = default_config_path() {
            if path.exists() {
                return Some(path);
            }
        }

        // 3. System config: /etc/clutch/config.toml
        let system_config = Path::new(Self::SYSTEM_CONFIG_PATH);
        if system_config.exists() {
            return Some(system_config.to_path_buf());
        }

        None
    }

    /// Load configuration with priority:
    /// 1. CLUTCH_CONFIG environment variable
    /// 2. ~/.config/clutch/config.toml (user config)
    /// 3. /etc/clutch/config.toml (system config)
    /// 4. Built-in defaults
    ///
    /// Returns the config and the file it came from.
    pub fn load() -> (Self, Option<PathBuf>) {
        if let Some(path) = Self::config_path() {
            match Self::load_from_file(&path) {
                Ok(config) => {
                    info!("Loaded config: {}", path.display());
                    return (config, Some(path));
                }
                Err(e) => {
                    warn!("Failed to load config {}: {:#}", path.display(), e);
                }
            }
        }
        info!("Using built-in default config");
        (Self::default(), None)
    }

    /// Load settings from specified path
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Path `--init-config` writes to
    ///
    /// `system` selects /etc/clutch/config.toml instead of the user config.
    pub fn init_config_path(system: bool) -> Result<PathBuf> {
        if system {
            return Ok(PathBuf::from(Self::SYSTEM_CONFIG_PATH));
        }
        default_config_path().context("Cannot determine config directory")
    }

    /// Write the commented default template
    pub fn write_default_config(system: bool) -> Result<PathBuf> {
        let config_path = Self::init_config_path(system)?;
        if let Some(dir) = config_path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        std::fs::write(&config_path, CONFIG_TEMPLATE)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        info!("Config written: {}", config_path.display());
        Ok(config_path)
    }
}

/// Config file change watcher (Linux only)
#[cfg(target_os = "linux")]
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<()>,
}

#[cfg(target_os = "linux")]
impl ConfigWatcher {
    /// Start watching config file
    pub fn new(config_path: &Path) -> Result<Self> {
        let (tx, rx) = mpsc::channel();
        let file_name = config_path.file_name().map(|n| n.to_os_string());

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            if let Ok(event) = res {
                // Detect Modify and Create events
                // (editors often save by writing to temp file then rename)
                use notify::EventKind;
                let ours = event
                    .paths
                    .iter()
                    .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                match event.kind {
                    EventKind::Modify(_) | EventKind::Create(_) if ours => {
                        let _ = tx.send(());
                    }
                    _ => {}
                }
            }
        })?;

        // Watch the parent directory to catch rename operations
        let watch_path = config_path.parent().unwrap_or(config_path);
        watcher.watch(watch_path, RecursiveMode::NonRecursive)?;

        Ok(Self {
            _watcher: watcher,
            rx,
        })
    }

    /// Check if config file was modified (non-blocking)
    ///
    /// Drains queued notifications so one save triggers one reload.
    pub fn check_reload(&self) -> bool {
        let mut changed = false;
        while self.rx.try_recv().is_ok() {
            changed = true;
        }
        changed
    }
}

/// Get default config file path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME).join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_matches_defaults() {
        let parsed = Config::parse(CONFIG_TEMPLATE).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::parse(
            r#"
            [devices]
            names = ["PCsensor FootSwitch", "RDing FootSwitchV1.1"]
            "#,
        )
        .unwrap();
        assert_eq!(config.devices.names.len(), 2);
        assert_eq!(config.poll.idle_ms, DEFAULT_IDLE_MS);
        assert_eq!(config.output.name, DEFAULT_OUTPUT_NAME);
        assert_eq!(config.mapping, MappingConfig::default());
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn test_idle_duration() {
        let config = Config::parse("[poll]\nidle_ms = 0\n").unwrap();
        assert_eq!(config.poll.idle(), Duration::ZERO);
        assert_eq!(PollConfig::default().idle(), Duration::from_millis(20));
    }

    #[test]
    fn test_wrong_type_is_error() {
        assert!(Config::parse("[poll]\nidle_ms = \"fast\"\n").is_err());
    }

    #[test]
    fn test_load_from_file_reports_path() {
        let dir = std::env::temp_dir().join(format!("clutch-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "[mapping]\npress = [\"tap KEY_ESC\"]\n").unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.mapping.press, vec!["tap KEY_ESC".to_string()]);
        assert_eq!(config.mapping.release, MappingConfig::default().release);

        std::fs::write(&path, "[mapping\n").unwrap();
        let err = Config::load_from_file(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("config.toml"));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
