//! Configuration for the Synheart progress tracker.

use crate::records::types::WeightUnit;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Owner of every record logged from this device
    pub user_id: String,

    /// IANA timezone used to decide which calendar day a record belongs to
    pub timezone: String,

    /// Daily targets
    pub goals: Goals,

    /// Unit weights are reported in
    pub weight_unit: WeightUnit,

    /// Path for storing records, state and transparency logs
    pub data_path: PathBuf,

    /// Path for exported progress snapshots
    pub export_path: PathBuf,

    /// Remote document store, when syncing to one
    pub remote: Option<RemoteSettings>,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("synheart-progress");

        Self {
            user_id: "local-user".to_string(),
            timezone: "UTC".to_string(),
            goals: Goals::default(),
            weight_unit: WeightUnit::Pounds,
            export_path: data_dir.join("exports"),
            data_path: data_dir,
            remote: None,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults if it is absent.
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content =
                std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            config.tz()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("synheart-progress")
            .join("config.json")
    }

    /// Parsed timezone.
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse()
            .map_err(|_| ConfigError::InvalidTimezone(self.timezone.clone()))
    }

    /// Copy of this configuration with secrets masked, for display.
    pub fn redacted(&self) -> Self {
        Self {
            remote: self.remote.as_ref().map(RemoteSettings::redacted),
            ..self.clone()
        }
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.export_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        std::fs::create_dir_all(&self.data_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }
}

/// Daily goals the progress summaries are measured against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Goals {
    pub daily_active_minutes: u32,
    pub daily_steps: u32,
    pub daily_ounces: f64,
    pub daily_protein_grams: f64,
}

impl Default for Goals {
    fn default() -> Self {
        Self {
            daily_active_minutes: 60,
            daily_steps: 10_000,
            daily_ounces: 64.0,
            daily_protein_grams: 100.0,
        }
    }
}

/// Connection settings for a remote document store.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteSettings {
    pub base_url: String,
    pub token: String,
}

const REDACTED: &str = "***";

impl RemoteSettings {
    /// Copy safe to print; the bearer token is masked.
    pub fn redacted(&self) -> Self {
        Self {
            base_url: self.base_url.clone(),
            token: REDACTED.to_string(),
        }
    }
}

impl std::fmt::Debug for RemoteSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteSettings")
            .field("base_url", &self.base_url)
            .field("token", &REDACTED)
            .finish()
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    InvalidTimezone(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::InvalidTimezone(tz) => write!(f, "Unknown timezone: {tz}"),
        }
    }
}

impl std::error::Error for ConfigError {}
