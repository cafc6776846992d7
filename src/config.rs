use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::DEFAULT_REFRESH_INTERVAL;
use crate::pagerduty::{endpoint_for_domain, PagerDutyClient, ReqwestTransport, DEFAULT_TIMEOUT};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub pagerduty: PagerDutyConfig,
  #[serde(default)]
  pub refresh: RefreshConfig,
  #[serde(default)]
  pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PagerDutyConfig {
  /// Account subdomain, e.g. "acme" for acme.pagerduty.com
  pub domain: String,
  /// Full API base URL, overrides the one derived from `domain`
  pub endpoint: Option<String>,
  /// Per-request timeout
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshConfig {
  #[serde(default = "default_interval_secs")]
  pub interval_secs: u64,
}

impl Default for RefreshConfig {
  fn default() -> Self {
    Self {
      interval_secs: default_interval_secs(),
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
  /// Write logs to a daily-rolling file instead of stderr
  pub file: Option<PathBuf>,
  /// Filter directives used when RUST_LOG is unset (defaults to "info")
  pub filter: Option<String>,
}

fn default_timeout_secs() -> u64 {
  DEFAULT_TIMEOUT.as_secs()
}

fn default_interval_secs() -> u64 {
  DEFAULT_REFRESH_INTERVAL.as_secs()
}

impl PagerDutyConfig {
  pub fn endpoint(&self) -> String {
    self
      .endpoint
      .clone()
      .unwrap_or_else(|| endpoint_for_domain(&self.domain))
  }

  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs)
  }
}

impl RefreshConfig {
  pub fn interval(&self) -> Duration {
    Duration::from_secs(self.interval_secs)
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./pdcache.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/pdcache/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/pdcache/config.yaml"
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("pdcache.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("pdcache").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::from_yaml(&contents)
      .map_err(|e| eyre!("Invalid config file {}: {}", path.display(), e))
  }

  /// Parse and validate a YAML document.
  pub fn from_yaml(contents: &str) -> Result<Self> {
    let config: Config =
      serde_yaml::from_str(contents).map_err(|e| eyre!("Failed to parse config: {}", e))?;

    if config.pagerduty.domain.trim().is_empty() && config.pagerduty.endpoint.is_none() {
      return Err(eyre!("pagerduty.domain must not be empty"));
    }
    if config.refresh.interval_secs == 0 {
      return Err(eyre!("refresh.interval_secs must be at least 1"));
    }

    Ok(config)
  }

  /// Get the PagerDuty API token from environment variables.
  ///
  /// Checks PDCACHE_TOKEN first, then PAGERDUTY_TOKEN as fallback.
  pub fn get_api_token() -> Result<String> {
    std::env::var("PDCACHE_TOKEN")
      .or_else(|_| std::env::var("PAGERDUTY_TOKEN"))
      .map_err(|_| {
        eyre!("PagerDuty API token not found. Set PDCACHE_TOKEN or PAGERDUTY_TOKEN environment variable.")
      })
  }

  /// Build a reqwest-backed client from this configuration.
  pub fn client(&self, token: &str) -> Result<PagerDutyClient> {
    let transport = ReqwestTransport::new(self.pagerduty.timeout())
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(PagerDutyClient::with_transport(
      self.pagerduty.endpoint(),
      token,
      Arc::new(transport),
    ))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_minimal_config_defaults() {
    let config = Config::from_yaml("pagerduty:\n  domain: acme\n").unwrap();
    assert_eq!(config.pagerduty.endpoint(), "https://acme.pagerduty.com/api/v1");
    assert_eq!(config.pagerduty.timeout(), DEFAULT_TIMEOUT);
    assert_eq!(config.refresh.interval(), Duration::from_secs(60));
    assert!(config.logging.file.is_none());
    assert!(config.logging.filter.is_none());
  }

  #[test]
  fn test_full_config() {
    let yaml = r#"
pagerduty:
  domain: acme
  endpoint: http://localhost:8080/api/v1
  timeout_secs: 5
refresh:
  interval_secs: 15
logging:
  file: /var/log/pdcache/pdcache.log
  filter: pdcache=debug
"#;
    let config = Config::from_yaml(yaml).unwrap();
    assert_eq!(config.pagerduty.endpoint(), "http://localhost:8080/api/v1");
    assert_eq!(config.pagerduty.timeout(), Duration::from_secs(5));
    assert_eq!(config.refresh.interval(), Duration::from_secs(15));
    assert_eq!(
      config.logging.file,
      Some(PathBuf::from("/var/log/pdcache/pdcache.log"))
    );
    assert_eq!(config.logging.filter.as_deref(), Some("pdcache=debug"));
  }

  #[test]
  fn test_missing_domain_rejected() {
    assert!(Config::from_yaml("refresh:\n  interval_secs: 10\n").is_err());
    assert!(Config::from_yaml("pagerduty:\n  domain: '  '\n").is_err());
  }

  #[test]
  fn test_zero_interval_rejected() {
    let yaml = "pagerduty:\n  domain: acme\nrefresh:\n  interval_secs: 0\n";
    assert!(Config::from_yaml(yaml).is_err());
  }

  #[test]
  fn test_explicit_missing_path() {
    let err = Config::load(Some(Path::new("/nonexistent/pdcache.yaml"))).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
  }
}
