//! Configuration loading and merging
//!
//! An optional TOML file supplies defaults; command-line values win.

use anyhow::{Context, Result};
use ezpass_report::{FetchConfig, OutputOrder};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub account: AccountConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountConfig {
    /// Base URL of the account API
    pub base_url: Option<String>,
    /// Per-request HTTP timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    60
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl AccountConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Values from the command line that override the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub output_order: Option<OutputOrder>,
}

impl AppConfig {
    /// Apply command-line overrides on top of the loaded configuration
    pub fn merge(mut self, overrides: Overrides) -> Self {
        if let Some(base_url) = overrides.base_url {
            self.account.base_url = Some(base_url);
        }
        if let Some(order) = overrides.output_order {
            self.fetch.output_order = order;
        }
        self
    }

    /// Base URL after merging, which must be present and non-empty
    pub fn base_url(&self) -> Result<&str> {
        match self.account.base_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Ok(url),
            _ => anyhow::bail!(
                "No account base URL configured (use --base-url, EZPASS_BASE_URL or [account] base_url)"
            ),
        }
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_deserialization() {
        let toml_content = r#"
            [account]
            base_url = "https://tolls.example.com"
            request_timeout_secs = 15

            [fetch]
            workers = 4
            timeout_ms = 60000
            output_order = "fixed"
        "#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.base_url().unwrap(), "https://tolls.example.com");
        assert_eq!(config.account.request_timeout(), Duration::from_secs(15));
        assert_eq!(config.fetch.workers, 4);
        assert_eq!(config.fetch.timeout(), Duration::from_secs(60));
        assert_eq!(config.fetch.output_order, OutputOrder::Fixed);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.account.request_timeout_secs, 60);
        assert_eq!(config.fetch, FetchConfig::default());
        assert!(config.base_url().is_err());
    }

    #[test]
    fn test_overrides_win() {
        let config: AppConfig = toml::from_str(
            r#"
            [account]
            base_url = "https://file.example.com"
            "#,
        )
        .unwrap();

        let merged = config.merge(Overrides {
            base_url: Some("https://cli.example.com".to_string()),
            output_order: Some(OutputOrder::Fixed),
        });
        assert_eq!(merged.base_url().unwrap(), "https://cli.example.com");
        assert_eq!(merged.fetch.output_order, OutputOrder::Fixed);
    }

    #[test]
    fn test_blank_base_url_is_rejected() {
        let config = AppConfig::default().merge(Overrides {
            base_url: Some("   ".to_string()),
            output_order: None,
        });
        assert!(config.base_url().is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[account]\nbase_url = \"https://tolls.example.com\"").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.base_url().unwrap(), "https://tolls.example.com");
    }

    #[test]
    fn test_load_config_reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[fetch]\nworkers = \"many\"").unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
