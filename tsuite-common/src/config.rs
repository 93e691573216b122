use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::{Result, TsuiteError};

/// Dashboard and report configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub server: ServerConfig,
    pub data: DataConfig,
    pub display: DisplayConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    /// Timeout for fetching remote documents
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: String::from("127.0.0.1:8080"),
            request_timeout_secs: 30,
        }
    }
}

/// Where documents come from. Each entry is a file path or an http(s) URL.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub archive: Option<String>,
    pub sensors: Option<String>,
}

/// Presentation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub site_title: String,
    pub nav_title: String,
    /// Percent change at or beyond which a test counts as regressed/improved
    pub change_threshold: f64,
    pub sidebar_limit: usize,
    pub heat_base_color: String,
    pub treemap_min_color: String,
    pub treemap_mid_color: String,
    pub treemap_max_color: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            site_title: String::from("TSuite - Test Suite Result Browser"),
            nav_title: String::from("TSuite Browser"),
            change_threshold: 10.0,
            sidebar_limit: 25,
            heat_base_color: String::from("#FF0000"),
            treemap_min_color: String::from("#f00"),
            treemap_mid_color: String::from("#ddd"),
            treemap_max_color: String::from("#0d0"),
        }
    }
}

impl DashboardConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Override settings from `TSUITE_*` environment variables
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup("TSUITE_BIND") {
            self.server.bind_address = bind;
        }
        if let Some(archive) = lookup("TSUITE_ARCHIVE") {
            self.data.archive = Some(archive);
        }
        if let Some(sensors) = lookup("TSUITE_SENSORS") {
            self.data.sensors = Some(sensors);
        }
        if let Some(threshold) = lookup("TSUITE_CHANGE_THRESHOLD") {
            self.display.change_threshold = threshold.parse().map_err(|_| {
                TsuiteError::Config(format!("TSUITE_CHANGE_THRESHOLD is not a number: {}", threshold))
            })?;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.display.change_threshold.is_finite() && self.display.change_threshold >= 0.0) {
            return Err(TsuiteError::Config(format!(
                "change_threshold must be a non-negative number, got {}",
                self.display.change_threshold
            )));
        }
        if self.display.sidebar_limit == 0 {
            return Err(TsuiteError::Config("sidebar_limit must be at least 1".to_string()));
        }
        if self.server.bind_address.is_empty() {
            return Err(TsuiteError::Config("bind_address must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = DashboardConfig::default();
        assert_eq!(config.display.change_threshold, 10.0);
        assert!(config.data.archive.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: DashboardConfig = toml::from_str(
            r#"
            [display]
            change_threshold = 5.0
            "#,
        )
        .unwrap();
        assert_eq!(config.display.change_threshold, 5.0);
        assert_eq!(config.display.sidebar_limit, 25);
        assert_eq!(config.server.bind_address, "127.0.0.1:8080");
    }

    #[test]
    fn test_config_file_operations() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("conf").join("tsuite.toml");

        let mut config = DashboardConfig::default();
        config.data.archive = Some("tsets.json".to_string());
        config.to_file(&config_path).unwrap();

        let loaded = DashboardConfig::from_file(&config_path).unwrap();
        assert_eq!(loaded.data.archive.as_deref(), Some("tsets.json"));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("TSUITE_BIND", "0.0.0.0:9000"),
            ("TSUITE_SENSORS", "http://sense/data"),
            ("TSUITE_CHANGE_THRESHOLD", "2.5"),
        ]
        .into_iter()
        .collect();

        let mut config = DashboardConfig::default();
        config
            .apply_env_with(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.server.bind_address, "0.0.0.0:9000");
        assert_eq!(config.data.sensors.as_deref(), Some("http://sense/data"));
        assert_eq!(config.display.change_threshold, 2.5);
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let mut config = DashboardConfig::default();
        let result = config.apply_env_with(|key| {
            (key == "TSUITE_CHANGE_THRESHOLD").then(|| "lots".to_string())
        });
        assert!(matches!(result, Err(TsuiteError::Config(_))));
    }
}
