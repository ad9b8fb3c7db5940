//! Service configuration. The model bundle itself carries the feature contract; this only says where to find it.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Path to the model bundle manifest (JSON)
    pub model_path: PathBuf,
    /// Poll the manifest for changes every N seconds; 0 disables reload
    pub reload_interval_secs: u64,
    /// Input plausibility policy
    pub input: InputConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Upper limits above which a value is flagged as implausible
    pub limits: PlausibilityLimits,
    /// Reject implausible values instead of only logging them
    pub reject_implausible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlausibilityLimits {
    /// mg/dL
    pub tg: f64,
    /// mg/dL
    pub glucose: f64,
    /// mg/dL
    pub hdl: f64,
    /// kg/m²
    pub bmi: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
    /// Emit one ndjson audit record per request on stderr
    pub audit: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("model/manifest.json"),
            reload_interval_secs: 0,
            input: InputConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            limits: PlausibilityLimits::default(),
            reject_implausible: false,
        }
    }
}

impl Default for PlausibilityLimits {
    fn default() -> Self {
        Self {
            tg: 1000.0,
            glucose: 500.0,
            hdl: 200.0,
            bmi: 50.0,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
            audit: false,
        }
    }
}

impl ServiceConfig {
    /// Load from a JSON file. A missing file yields defaults; an unreadable or malformed one is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"reload_interval_secs": 30, "log": {"json": false}}"#).unwrap();

        let c = ServiceConfig::load(&path).unwrap();
        assert_eq!(c.reload_interval_secs, 30);
        assert!(!c.log.json);
        assert_eq!(c.log.level, "info");
        assert_eq!(c.input.limits, PlausibilityLimits::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(matches!(
            ServiceConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
