//! Invocation-time configuration.
//!
//! The only file-based setting is the region used for log retrieval, read from
//! a small JSON file (`conf.json` by default):
//!
//! ```json
//! { "region_name_for_logs": "eu-west-1" }
//! ```

use cs_error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Default configuration file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "conf.json";

/// Key holding the log retrieval region.
pub const REGION_KEY: &str = "region_name_for_logs";

/// Contents of the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Raw value of `region_name_for_logs`, kept untyped so a wrong type is a
    /// fallback rather than a parse failure
    #[serde(default)]
    pub region_name_for_logs: Option<serde_json::Value>,
}

impl ToolConfig {
    /// Read and parse a configuration file.
    ///
    /// An unreadable file yields [`ConfigError::Unreadable`]; content that is
    /// not a JSON object yields [`ConfigError::Malformed`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| ConfigError::Malformed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// The configured region, if present and a non-empty string.
    pub fn region_for_logs(&self) -> Result<&str, ConfigError> {
        match &self.region_name_for_logs {
            Some(serde_json::Value::String(region)) if !region.trim().is_empty() => Ok(region),
            Some(other) => Err(ConfigError::Key {
                key: REGION_KEY.to_string(),
                reason: format!("expected a non-empty string, found {other}"),
            }),
            None => Err(ConfigError::Key {
                key: REGION_KEY.to_string(),
                reason: "absent".to_string(),
            }),
        }
    }
}

/// Region used to build AWS clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegionSetting {
    /// Explicit region name
    Named(String),

    /// Sentinel: let the AWS default chain (environment, profile, cached
    /// credentials) resolve the region
    Unknown,
}

impl RegionSetting {
    /// Region name, if one was resolved.
    pub fn name(&self) -> Option<&str> {
        match self {
            RegionSetting::Named(name) => Some(name),
            RegionSetting::Unknown => None,
        }
    }
}

impl std::fmt::Display for RegionSetting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegionSetting::Named(name) => f.write_str(name),
            RegionSetting::Unknown => f.write_str("N/A"),
        }
    }
}

/// Resolve the log region from a configuration file.
///
/// Only malformed JSON is an error. A missing file or an unusable key falls
/// back to [`RegionSetting::Unknown`] with a warning.
pub fn resolve_region(path: impl AsRef<Path>) -> Result<RegionSetting, ConfigError> {
    let config = match ToolConfig::load(path) {
        Ok(config) => config,
        Err(e @ ConfigError::Malformed { .. }) => return Err(e),
        Err(e) => {
            warn!(error = %e, "Falling back to default region resolution");
            return Ok(RegionSetting::Unknown);
        }
    };

    match config.region_for_logs() {
        Ok(region) => Ok(RegionSetting::Named(region.to_string())),
        Err(e) => {
            warn!(error = %e, "Falling back to default region resolution");
            Ok(RegionSetting::Unknown)
        }
    }
}

/// Resource types a run can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Log groups and streams
    Logs,

    /// Table items
    Table,

    /// Queue messages
    Queue,
}

impl ResourceKind {
    /// Output directory name, relative to the run's base directory.
    pub fn output_dir(&self) -> &'static str {
        match self {
            ResourceKind::Logs => "cw_logs",
            ResourceKind::Table => "scan_results",
            ResourceKind::Queue => "sqs_messages",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Logs => write!(f, "logs"),
            ResourceKind::Table => write!(f, "table"),
            ResourceKind::Queue => write!(f, "queue"),
        }
    }
}
