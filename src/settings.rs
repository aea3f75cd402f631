use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const SETTINGS_FILE_NAME: &str = "settings.json";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    /// When enabled the application initialises the logger at debug level.
    #[serde(default)]
    pub debug_logging: bool,
    /// Optional file that receives a copy of the log output.
    #[serde(default)]
    pub log_file: Option<String>,
    /// Maximum gap between the two taps of a toggle gesture.
    #[serde(default = "default_double_tap_threshold_ms")]
    pub double_tap_threshold_ms: u64,
    #[serde(default = "default_tooltip_duration_ms")]
    pub tooltip_duration_ms: u64,
    /// How long the "Keybind Updated" dialog stays open.
    #[serde(default = "default_confirmation_duration_ms")]
    pub confirmation_duration_ms: u64,
    /// Interval at which the UI thread drains pending popup requests.
    #[serde(default = "default_ui_poll_interval_ms")]
    pub ui_poll_interval_ms: u64,
    #[serde(default = "default_enable_sounds")]
    pub enable_sounds: bool,
}

fn default_double_tap_threshold_ms() -> u64 {
    300
}

fn default_tooltip_duration_ms() -> u64 {
    2000
}

fn default_confirmation_duration_ms() -> u64 {
    1500
}

fn default_ui_poll_interval_ms() -> u64 {
    50
}

fn default_enable_sounds() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug_logging: false,
            log_file: None,
            double_tap_threshold_ms: default_double_tap_threshold_ms(),
            tooltip_duration_ms: default_tooltip_duration_ms(),
            confirmation_duration_ms: default_confirmation_duration_ms(),
            ui_poll_interval_ms: default_ui_poll_interval_ms(),
            enable_sounds: default_enable_sounds(),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(&content)
            .with_context(|| format!("deserialize settings file {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("write settings file {}", path.display()))?;
        Ok(())
    }

    pub fn double_tap_threshold(&self) -> Duration {
        Duration::from_millis(self.double_tap_threshold_ms)
    }

    pub fn tooltip_duration(&self) -> Duration {
        Duration::from_millis(self.tooltip_duration_ms)
    }

    pub fn confirmation_duration(&self) -> Duration {
        Duration::from_millis(self.confirmation_duration_ms)
    }

    /// Never below 10ms so a zero in the file cannot spin the UI thread.
    pub fn ui_poll_interval(&self) -> Duration {
        Duration::from_millis(self.ui_poll_interval_ms.max(10))
    }
}

pub fn settings_path_from_exe_path(exe_path: &Path) -> anyhow::Result<PathBuf> {
    let parent = exe_path
        .parent()
        .ok_or_else(|| anyhow!("executable path has no parent: {}", exe_path.display()))?;
    Ok(parent.join(SETTINGS_FILE_NAME))
}

pub fn resolve_settings_path() -> anyhow::Result<PathBuf> {
    let exe_path = std::env::current_exe().context("resolve current executable")?;
    settings_path_from_exe_path(&exe_path)
}
