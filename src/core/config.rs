use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    /// Extra attempts for idempotent reads.
    pub retries: usize,
    pub retry_delay_ms: u64,
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig {
            base_url: "http://localhost:8000".to_string(),
            retries: 2,
            retry_delay_ms: 300,
            timeout_secs: 10,
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendConfig,
    /// How long an approved autonomous action takes to complete.
    pub action_delay_ms: u64,
    pub data_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            backend: BackendConfig::default(),
            action_delay_ms: 1500,
            data_path: None,
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location, or the defaults when no
    /// config file exists yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(path = %config_path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "expenseoracle", "expense-oracle")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("com", "expenseoracle", "expense-oracle")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn action_delay(&self) -> Duration {
        Duration::from_millis(self.action_delay_ms)
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!(base_url = %config.backend.base_url, "Successfully loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
backend:
  base_url: "http://oracle.internal:9000"
  retries: 0
action_delay_ms: 250
data_path: "/tmp/oracle"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.backend.base_url, "http://oracle.internal:9000");
        assert_eq!(config.backend.retries, 0);
        // Unspecified keys keep their defaults.
        assert_eq!(config.backend.retry_delay_ms, 300);
        assert_eq!(config.backend.timeout(), Duration::from_secs(10));
        assert_eq!(config.action_delay(), Duration::from_millis(250));
        assert_eq!(
            config.default_data_path().unwrap(),
            PathBuf::from("/tmp/oracle")
        );
    }

    #[test]
    fn test_empty_mapping_is_default() {
        let config: AppConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.backend.base_url, "http://localhost:8000");
        assert_eq!(config.action_delay_ms, 1500);
    }

    #[test]
    fn test_load_from_path_reports_bad_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "backend: [not, a, mapping]").unwrap();

        let err = AppConfig::load_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
