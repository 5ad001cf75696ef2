//! Retrieval configuration
//!
//! Stored in `~/.config/shipkit/config.yaml`. Every field has a default, so
//! a missing file behaves like an empty one.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{RepoError, Result};

/// Primary metadata host
pub const DEFAULT_METADATA_HOST: &str = "https://replicated.app";

/// Host tried when the primary has no metadata for an application
pub const FALLBACK_METADATA_HOST: &str = "https://staging.replicated.app";

/// Default number of image probes in flight
pub const DEFAULT_PROBE_CONCURRENCY: usize = 8;

/// Default HTTP request timeout, in seconds
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Retrieval configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipkitConfig {
    /// API version
    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default)]
    pub metadata_hosts: MetadataHosts,

    /// Maximum number of concurrent image probes
    #[serde(default = "default_probe_concurrency")]
    pub probe_concurrency: usize,

    /// Per-request timeout for distribution and metadata calls
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// Deadline for a whole fetch, unbounded when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_deadline_secs: Option<u64>,
}

/// Metadata hosts, tried in order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataHosts {
    #[serde(default = "default_primary")]
    pub primary: String,

    #[serde(default = "default_fallback")]
    pub fallback: String,
}

fn default_api_version() -> String {
    "shipkit.io/v1".to_string()
}

fn default_primary() -> String {
    DEFAULT_METADATA_HOST.to_string()
}

fn default_fallback() -> String {
    FALLBACK_METADATA_HOST.to_string()
}

fn default_probe_concurrency() -> usize {
    DEFAULT_PROBE_CONCURRENCY
}

fn default_http_timeout() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

impl Default for MetadataHosts {
    fn default() -> Self {
        Self {
            primary: default_primary(),
            fallback: default_fallback(),
        }
    }
}

impl Default for ShipkitConfig {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            metadata_hosts: MetadataHosts::default(),
            probe_concurrency: default_probe_concurrency(),
            http_timeout_secs: default_http_timeout(),
            fetch_deadline_secs: None,
        }
    }
}

impl ShipkitConfig {
    /// Load configuration from default location
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get default configuration path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| RepoError::InvalidConfig {
            message: "Could not determine config directory".to_string(),
        })?;
        Ok(config_dir.join("shipkit").join("config.yaml"))
    }

    fn validate(&self) -> Result<()> {
        if self.probe_concurrency == 0 {
            return Err(RepoError::InvalidConfig {
                message: "probeConcurrency must be at least 1".to_string(),
            });
        }
        for host in [&self.metadata_hosts.primary, &self.metadata_hosts.fallback] {
            url::Url::parse(host).map_err(|e| RepoError::InvalidConfig {
                message: format!("invalid metadata host '{}': {}", host, e),
            })?;
        }
        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn fetch_deadline(&self) -> Option<Duration> {
        self.fetch_deadline_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_from_empty_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "{}\n").unwrap();

        let config = ShipkitConfig::load_from(&path).unwrap();
        assert_eq!(config, ShipkitConfig::default());
        assert_eq!(config.metadata_hosts.primary, DEFAULT_METADATA_HOST);
        assert_eq!(config.probe_concurrency, 8);
        assert!(config.fetch_deadline().is_none());
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.yaml");

        let config = ShipkitConfig {
            probe_concurrency: 2,
            fetch_deadline_secs: Some(120),
            ..Default::default()
        };
        config.save_to(&path).unwrap();

        let loaded = ShipkitConfig::load_from(&path).unwrap();
        assert_eq!(loaded.probe_concurrency, 2);
        assert_eq!(loaded.fetch_deadline(), Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_rejects_zero_concurrency() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "probeConcurrency: 0\n").unwrap();

        let err = ShipkitConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, RepoError::InvalidConfig { .. }));
    }
}
