//! Configuration for the scraper worker.

use std::time::Duration;

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

/// Main configuration structure for the scraper worker.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub control_plane: ControlPlaneConfig,
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ControlPlaneConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer credential. The worker refuses to start without one.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for ControlPlaneConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
        }
    }
}

impl ControlPlaneConfig {
    /// The API key, if one is set and not blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScraperConfig {
    /// Logical scraper identity known to the control-plane (e.g. "page").
    pub custom_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    /// Idle time after a NOOP work item.
    #[serde(default = "default_noop_timeout")]
    pub noop_timeout_secs: u64,
    /// Period of work item progress reports.
    #[serde(default = "default_progress_interval")]
    pub progress_interval_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            noop_timeout_secs: default_noop_timeout(),
            progress_interval_secs: default_progress_interval(),
        }
    }
}

impl WorkerConfig {
    pub fn noop_timeout(&self) -> Duration {
        Duration::from_secs(self.noop_timeout_secs)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_secs(self.progress_interval_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_browser_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Pages larger than this are refused.
    #[serde(default = "default_max_page_bytes")]
    pub max_page_bytes: usize,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_browser_timeout(),
            user_agent: None,
            max_page_bytes: default_max_page_bytes(),
        }
    }
}

// Default values
fn default_base_url() -> String {
    "https://scraper-scraper-main.kube.agrp.dev/rest/v2/control/".to_string()
}
fn default_noop_timeout() -> u64 {
    5
}
fn default_progress_interval() -> u64 {
    60
}
fn default_browser_timeout() -> u64 {
    30
}
fn default_max_page_bytes() -> usize {
    10 * 1024 * 1024
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Configuration sources (in order of precedence):
    /// 1. `API_KEY` environment variable (for `control_plane.api_key` only)
    /// 2. Environment variables (SCRAPER__SECTION__KEY format)
    /// 3. config.toml file (if present)
    /// 4. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            .set_default("control_plane.base_url", default_base_url())?
            .set_default("worker.noop_timeout_secs", default_noop_timeout() as i64)?
            .set_default("worker.progress_interval_secs", default_progress_interval() as i64)?
            .set_default("browser.timeout_secs", default_browser_timeout() as i64)?
            .set_default("browser.max_page_bytes", default_max_page_bytes() as i64)?
            .add_source(File::with_name("config").required(false))
            .add_source(
                Environment::with_prefix("SCRAPER")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("control_plane.api_key", std::env::var("API_KEY").ok())?
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make the poll loop spin.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker.noop_timeout_secs == 0 {
            return Err(ConfigError::Message("worker.noop_timeout_secs must be at least 1".to_string()));
        }
        if self.worker.progress_interval_secs == 0 {
            return Err(ConfigError::Message("worker.progress_interval_secs must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_worker_config() {
        let worker = WorkerConfig::default();
        assert_eq!(worker.noop_timeout(), Duration::from_secs(5));
        assert_eq!(worker.progress_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_blank_api_key_is_missing() {
        let mut control_plane = ControlPlaneConfig::default();
        assert_eq!(control_plane.api_key(), None);

        control_plane.api_key = Some("   ".to_string());
        assert_eq!(control_plane.api_key(), None);

        control_plane.api_key = Some("secret".to_string());
        assert_eq!(control_plane.api_key(), Some("secret"));
    }

    #[test]
    fn test_deserialize_minimal_toml() {
        let config: Config = ConfigLoader::builder()
            .add_source(File::from_str(
                "[scraper]\ncustom_id = \"page\"\n[worker]\nnoop_timeout_secs = 2\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.scraper.custom_id, "page");
        assert_eq!(config.worker.noop_timeout_secs, 2);
        assert_eq!(config.worker.progress_interval_secs, 60);
        assert_eq!(config.browser.timeout_secs, 30);
        assert!(config.control_plane.base_url.ends_with("/control/"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_noop_timeout_is_rejected() {
        let config: Config = ConfigLoader::builder()
            .add_source(File::from_str(
                "[scraper]\ncustom_id = \"page\"\n[worker]\nnoop_timeout_secs = 0\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("noop_timeout_secs"), "{}", err);
    }
}
