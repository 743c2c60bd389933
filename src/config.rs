//! Stack configuration loaded from `stack.toml`.

use anyhow::{Context, Result};
use provision::RetryConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "stack.toml";

/// Stack-level inputs: the root domain, the subdomain label every generated
/// name derives from, and operational knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackConfig {
    /// Root domain with an existing hosted zone (e.g. "example.com")
    pub domain: String,
    /// Subdomain label the stack lives under (e.g. "dev1")
    pub subdomain: String,
    /// Primary region for regional resources
    #[serde(default = "default_region")]
    pub region: String,
    /// Directory holding the pre-built frontend bundle
    #[serde(default = "default_asset_dir")]
    pub asset_dir: PathBuf,
    /// Where the local provider keeps its state document
    #[serde(default)]
    pub state_file: Option<PathBuf>,
    /// Capability the compute function is granted on the contacts table
    #[serde(default)]
    pub table_capability: TableCapability,
    /// Backoff policy overrides for transient provider failures
    #[serde(default)]
    pub retry: RetrySettings,
}

fn default_region() -> String {
    "ap-southeast-2".to_string()
}

fn default_asset_dir() -> PathBuf {
    PathBuf::from("frontend/build")
}

impl StackConfig {
    /// A fresh configuration for the given domain and subdomain label.
    pub fn new(domain: impl Into<String>, subdomain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            subdomain: subdomain.into(),
            region: default_region(),
            asset_dir: default_asset_dir(),
            state_file: None,
            table_capability: TableCapability::default(),
            retry: RetrySettings::default(),
        }
    }

    /// Load the configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("could not read {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("invalid config in {}", path.display()))
    }

    /// Save the configuration back to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = toml::to_string_pretty(self).context("could not serialize config")?;
        fs::write(path, raw).with_context(|| format!("could not write {}", path.display()))
    }

    /// The site's fully qualified domain: `<sub>.<domain>`.
    pub fn site_domain(&self) -> String {
        format!("{}.{}", self.subdomain, self.domain)
    }

    /// The gateway's fully qualified domain: `api.<sub>.<domain>`.
    pub fn api_domain(&self) -> String {
        format!("api.{}", self.site_domain())
    }

    /// The site's canonical HTTPS origin.
    pub fn site_url(&self) -> String {
        format!("https://{}", self.site_domain())
    }

    /// The API's canonical HTTPS origin.
    pub fn api_url(&self) -> String {
        format!("https://{}", self.api_domain())
    }

    /// Physical name of the contacts table.
    pub fn table_name(&self) -> String {
        format!("{}-contacts", self.subdomain)
    }

    /// Path of the local provider's state document.
    pub fn state_path(&self) -> PathBuf {
        self.state_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(".groundwork/state.json"))
    }
}

/// Capability the compute function is granted on the contacts table.
///
/// The original deployment granted broad read/write; kept configurable
/// rather than hard-coded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableCapability {
    /// Read-only access
    Read,
    /// Write-only access
    Write,
    /// Full access
    #[default]
    ReadWrite,
}

impl TableCapability {
    /// Stable string form, passed to the provider as an attribute.
    pub fn as_str(self) -> &'static str {
        match self {
            TableCapability::Read => "read",
            TableCapability::Write => "write",
            TableCapability::ReadWrite => "read_write",
        }
    }
}

/// Retry overrides, in config-friendly units.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Maximum attempts per provider call, including the first
    pub max_attempts: u32,
    /// Delay before the second attempt, in milliseconds
    pub base_delay_ms: u64,
    /// Multiplier applied per subsequent attempt
    pub backoff_factor: f64,
    /// Ceiling on the computed delay, in milliseconds
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay_ms: 500,
            backoff_factor: 2.0,
            max_delay_ms: 30_000,
        }
    }
}

impl RetrySettings {
    /// Convert into the engine's retry policy.
    pub fn to_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            backoff_factor: self.backoff_factor,
            max_delay: Duration::from_millis(self.max_delay_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let config: StackConfig = toml::from_str(
            r#"
            domain = "example.com"
            subdomain = "dev1"
            "#,
        )
        .unwrap();

        assert_eq!(config.region, "ap-southeast-2");
        assert_eq!(config.asset_dir, PathBuf::from("frontend/build"));
        assert_eq!(config.table_capability, TableCapability::ReadWrite);
        assert_eq!(config.retry.max_attempts, 4);
        assert_eq!(config.state_path(), PathBuf::from(".groundwork/state.json"));
    }

    #[test]
    fn derived_names_follow_the_subdomain() {
        let config: StackConfig = toml::from_str(
            r#"
            domain = "example.com"
            subdomain = "dev1"
            "#,
        )
        .unwrap();

        assert_eq!(config.site_domain(), "dev1.example.com");
        assert_eq!(config.api_domain(), "api.dev1.example.com");
        assert_eq!(config.site_url(), "https://dev1.example.com");
        assert_eq!(config.api_url(), "https://api.dev1.example.com");
        assert_eq!(config.table_name(), "dev1-contacts");
    }

    #[test]
    fn retry_overrides_are_honored() {
        let config: StackConfig = toml::from_str(
            r#"
            domain = "example.com"
            subdomain = "dev1"
            table_capability = "read"

            [retry]
            max_attempts = 2
            base_delay_ms = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.table_capability, TableCapability::Read);
        let retry = config.retry.to_config();
        assert_eq!(retry.max_attempts, 2);
        assert_eq!(retry.base_delay, Duration::from_millis(10));
        // Unspecified fields keep their defaults
        assert_eq!(retry.max_delay, Duration::from_millis(30_000));
    }
}
