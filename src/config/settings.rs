//! Application configuration

use anyhow::Result;
use biosens_audio::AlertSoundConfig;
use biosens_core::{PermissionPolicy, DEFAULT_SAMPLING_PERIOD};
use biosens_sources::BackendConfig;
use biosens_types::SensorTypeTable;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application-wide configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version of the config format
    #[serde(default = "default_version")]
    pub version: u32,
    /// Play alert sounds (the operator's sound toggle at startup)
    #[serde(default)]
    pub sound_enabled: bool,
    /// Start the biometric sensors on launch
    #[serde(default = "default_true")]
    pub sensors_enabled: bool,
    /// Sampling period requested from the sensor platform
    #[serde(default = "default_sampling_period_ms")]
    pub sampling_period_ms: u64,
    /// What to do when the body-sensor permission is denied
    #[serde(default)]
    pub permission_policy: PermissionPolicy,
    /// Platform type codes, including the vendor-specific ones
    #[serde(default)]
    pub sensor_types: SensorTypeTable,
    /// Where readings come from
    #[serde(default)]
    pub backend: BackendConfig,
    /// Alert sound settings
    #[serde(default)]
    pub alert_sound: AlertSoundConfig,
}

fn default_version() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_sampling_period_ms() -> u64 {
    DEFAULT_SAMPLING_PERIOD.as_millis() as u64
}

impl AppConfig {
    /// Load configuration from disk
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        Self::load_from_path(&config_path)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to_path(&config_path)
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("org", "biosens", "biosens")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(dirs.config_dir().join("config.json"))
    }

    /// Load configuration from a specific file path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a specific file path
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn sampling_period(&self) -> Duration {
        Duration::from_millis(self.sampling_period_ms.max(1))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            sound_enabled: false,
            sensors_enabled: true,
            sampling_period_ms: default_sampling_period_ms(),
            permission_policy: PermissionPolicy::default(),
            sensor_types: SensorTypeTable::default(),
            backend: BackendConfig::default(),
            alert_sound: AlertSoundConfig::default(),
        }
    }
}
