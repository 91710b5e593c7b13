use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub mod defaults;

use defaults::*;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Remote location of the course list; takes precedence over `path`
    pub url: Option<String>,
    #[serde(default = "default_source_path")]
    pub path: PathBuf,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    #[serde(default = "default_cache_directory")]
    pub directory: PathBuf,
    /// How long a stored entry stays valid
    #[serde(default = "default_cache_freshness_secs")]
    pub freshness_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// IANA zone used for naive dates and for the last-modified summary
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_color")]
    pub color: bool,
    /// Collation locale for text columns
    #[serde(default = "default_locale")]
    pub locale: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_export_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_export_prefix")]
    pub file_prefix: String,
}

fn default_source_path() -> PathBuf {
    PathBuf::from(DEFAULT_SOURCE_PATH)
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_cache_enabled() -> bool {
    DEFAULT_CACHE_ENABLED
}

fn default_cache_directory() -> PathBuf {
    PathBuf::from(DEFAULT_CACHE_DIRECTORY)
}

fn default_cache_freshness_secs() -> u64 {
    DEFAULT_CACHE_FRESHNESS_SECS
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

fn default_color() -> bool {
    DEFAULT_COLOR
}

fn default_locale() -> String {
    DEFAULT_COLLATION_LOCALE.to_string()
}

fn default_export_directory() -> PathBuf {
    PathBuf::from(DEFAULT_EXPORT_DIRECTORY)
}

fn default_export_prefix() -> String {
    DEFAULT_EXPORT_PREFIX.to_string()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: None,
            path: default_source_path(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            directory: default_cache_directory(),
            freshness_secs: default_cache_freshness_secs(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            color: default_color(),
            locale: default_locale(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            directory: default_export_directory(),
            file_prefix: default_export_prefix(),
        }
    }
}

impl CacheConfig {
    pub fn freshness(&self) -> Duration {
        Duration::from_secs(self.freshness_secs)
    }
}

impl DisplayConfig {
    /// Resolve the configured zone name
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("Invalid timezone '{}': {}", self.timezone, e))
    }
}

impl Config {
    /// Load from the given file, writing a default one when it does not exist yet
    pub fn load(config_file: &str) -> Result<Self> {
        if std::path::Path::new(config_file).exists() {
            let contents = std::fs::read_to_string(config_file)
                .with_context(|| format!("Failed to read {}", config_file))?;
            let config: Self = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse {}", config_file))?;
            config.display.tz()?;
            Ok(config)
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(config_file, contents)
                .with_context(|| format!("Failed to write default config to {}", config_file))?;
            Ok(default_config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [source]
            url = "https://example.com/data.json"

            [display]
            timezone = "Asia/Shanghai"
            "#,
        )
        .unwrap();

        assert_eq!(config.source.url.as_deref(), Some("https://example.com/data.json"));
        assert_eq!(config.source.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
        assert_eq!(config.cache.freshness(), Duration::from_secs(3600));
        assert_eq!(config.display.tz().unwrap(), chrono_tz::Asia::Shanghai);
        assert_eq!(config.export.file_prefix, DEFAULT_EXPORT_PREFIX);
        assert_eq!(config.display.locale, DEFAULT_COLLATION_LOCALE);
    }

    #[test]
    fn test_invalid_timezone_is_rejected() {
        let display = DisplayConfig {
            timezone: "Mars/Olympus".to_string(),
            color: false,
            locale: default_locale(),
        };
        assert!(display.tz().is_err());
    }

    #[test]
    fn test_load_writes_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let path_str = path.to_str().unwrap();

        let config = Config::load(path_str).unwrap();
        assert!(path.exists());
        assert!(config.cache.enabled);

        let reloaded = Config::load(path_str).unwrap();
        assert_eq!(reloaded.export.directory, config.export.directory);
    }
}
