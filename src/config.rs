// Configuration File Support
//
// This module provides configuration file parsing for the directory service.
// Supports TOML format with environment variable overrides.
// The default location is ./outreach.toml; a missing file means defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default daily contact view limit per identity
pub const DEFAULT_DAILY_LIMIT: u32 = 50;
/// Default contacts per page
pub const DEFAULT_CONTACTS_PAGE_SIZE: usize = 10;
/// Default agencies per page
pub const DEFAULT_AGENCIES_PAGE_SIZE: usize = 25;
/// Default quota cookie lifetime: two days, so a token issued late in the
/// day is still presented after the next rollover
pub const DEFAULT_COOKIE_MAX_AGE_SECS: u64 = 2 * 24 * 3600;

const MIN_COOKIE_MAX_AGE_SECS: u64 = 24 * 3600;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// HTTP listener configuration
    pub server: ServerConfig,

    /// Daily contact quota configuration
    pub quota: QuotaConfig,

    /// Dataset location and agency listing configuration
    pub directory: DirectoryConfig,

    /// Caller identity configuration
    pub auth: AuthConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind
    pub bind_address: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Daily contact quota configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QuotaConfig {
    /// Contact records each identity may view per UTC day
    pub daily_limit: u32,

    /// Contacts per page
    pub contacts_page_size: usize,

    /// Quota cookie name prefix; the identity is appended
    pub cookie_prefix: String,

    /// Quota cookie Max-Age in seconds
    pub cookie_max_age_secs: u64,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            daily_limit: DEFAULT_DAILY_LIMIT,
            contacts_page_size: DEFAULT_CONTACTS_PAGE_SIZE,
            cookie_prefix: "contact_views_".to_string(),
            cookie_max_age_secs: DEFAULT_COOKIE_MAX_AGE_SECS,
        }
    }
}

/// Dataset location and agency listing configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Directory holding the record files
    pub data_dir: PathBuf,

    /// Contacts file name inside `data_dir`
    pub contacts_file: String,

    /// Agencies file name inside `data_dir`
    pub agencies_file: String,

    /// Agencies per page
    pub agencies_page_size: usize,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            contacts_file: "contacts_contact_rows.csv".to_string(),
            agencies_file: "agencies_agency_rows.csv".to_string(),
            agencies_page_size: DEFAULT_AGENCIES_PAGE_SIZE,
        }
    }
}

/// Caller identity configuration
///
/// Authentication happens upstream; the authenticating proxy forwards the
/// verified user id in `identity_header`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AuthConfig {
    /// Header carrying the verified user id
    pub identity_header: String,

    /// Shared secret the proxy must send in `x-proxy-secret`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_secret: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            identity_header: "x-authenticated-user".to_string(),
            proxy_secret: None,
        }
    }
}

impl Config {
    /// Load configuration from the default path (`./outreach.toml`)
    pub fn load() -> Result<Self> {
        Self::load_from_path(Self::config_path())
    }

    /// Load configuration from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed, or
    /// if the resulting configuration is invalid. A missing file yields the
    /// defaults (with environment overrides applied).
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let config = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file from {:?}", path))?;

            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file from {:?}", path))?;
            tracing::info!("Loaded configuration from {:?}", path);
            config
        } else {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            Self::default()
        };

        let config = config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Default configuration file path
    pub fn config_path() -> PathBuf {
        std::env::var("OUTREACH_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("outreach.toml"))
    }

    /// Apply environment variable overrides to the configuration
    ///
    /// Environment variables take precedence over config file values:
    /// - OUTREACH_LOG_LEVEL
    /// - OUTREACH_LOG_FORMAT
    /// - OUTREACH_PORT
    /// - OUTREACH_DAILY_LIMIT
    /// - OUTREACH_DATA_DIR
    /// - OUTREACH_PROXY_SECRET
    fn apply_env_overrides(mut self) -> Self {
        if let Ok(level) = std::env::var("OUTREACH_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("OUTREACH_LOG_FORMAT") {
            self.logging.format = format;
        }

        if let Ok(port) = std::env::var("OUTREACH_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }

        if let Ok(limit) = std::env::var("OUTREACH_DAILY_LIMIT") {
            if let Ok(limit) = limit.parse::<u32>() {
                self.quota.daily_limit = limit;
            }
        }

        if let Ok(dir) = std::env::var("OUTREACH_DATA_DIR") {
            self.directory.data_dir = PathBuf::from(dir);
        }
        if let Ok(secret) = std::env::var("OUTREACH_PROXY_SECRET") {
            self.auth.proxy_secret = Some(secret).filter(|s| !s.is_empty());
        }

        self
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Invalid log level: {}. Must be one of: trace, debug, info, warn, error", self.logging.level),
        }

        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" | "compact" => {}
            _ => anyhow::bail!("Invalid log format: {}. Must be one of: json, pretty, compact", self.logging.format),
        }

        if self.quota.daily_limit == 0 {
            anyhow::bail!("Daily contact limit must be > 0");
        }
        if self.quota.contacts_page_size == 0 {
            anyhow::bail!("Contacts page size must be > 0");
        }
        if self.quota.cookie_prefix.is_empty()
            || !self
                .quota
                .cookie_prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            anyhow::bail!("Cookie prefix must be non-empty and contain only [A-Za-z0-9_-]");
        }
        if self.quota.cookie_max_age_secs < MIN_COOKIE_MAX_AGE_SECS {
            anyhow::bail!("Cookie max age must be at least {} seconds", MIN_COOKIE_MAX_AGE_SECS);
        }

        if self.directory.agencies_page_size == 0 {
            anyhow::bail!("Agencies page size must be > 0");
        }
        if self.directory.contacts_file.is_empty() || self.directory.agencies_file.is_empty() {
            anyhow::bail!("Dataset file names must not be empty");
        }

        if axum::http::HeaderName::from_bytes(self.auth.identity_header.as_bytes()).is_err() {
            anyhow::bail!("Invalid identity header name: {}", self.auth.identity_header);
        }

        Ok(())
    }

    /// Convert log level string to tracing::Level
    pub fn log_level(&self) -> Result<tracing::Level> {
        self.logging.level.to_lowercase().parse()
            .map_err(|e| anyhow::anyhow!("Failed to parse log level: {}", e))
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.quota.daily_limit, 50);
        assert_eq!(config.quota.contacts_page_size, 10);
        assert_eq!(config.quota.cookie_max_age_secs, 172_800);
        assert_eq!(config.directory.agencies_page_size, 25);
        assert_eq!(config.auth.identity_header, "x-authenticated-user");
        assert!(config.auth.proxy_secret.is_none());
    }

    #[test]
    fn test_config_validation_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_limits() {
        let mut config = Config::default();
        config.quota.daily_limit = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.quota.contacts_page_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.directory.agencies_page_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_short_cookie_lifetime() {
        let mut config = Config::default();
        config.quota.cookie_max_age_secs = 3600;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_cookie_prefix() {
        let mut config = Config::default();
        config.quota.cookie_prefix = "views;".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_identity_header() {
        let mut config = Config::default();
        config.auth.identity_header = "bad header".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[logging]
level = "debug"
format = "json"

[quota]
daily_limit = 20
contacts_page_size = 5

[directory]
data_dir = "/srv/outreach"
"#
        )
        .unwrap();

        let config = Config::load_from_path(file.path()).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.quota.contacts_page_size, 5);
        assert_eq!(config.directory.data_dir, PathBuf::from("/srv/outreach"));
        // Unspecified sections keep their defaults
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.directory.agencies_file, "agencies_agency_rows.csv");
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = Config::load_from_path("/nonexistent/outreach.toml").unwrap();
        assert_eq!(config.quota.contacts_page_size, DEFAULT_CONTACTS_PAGE_SIZE);
    }

    #[test]
    fn test_load_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[quota\ndaily_limit = ").unwrap();
        assert!(Config::load_from_path(file.path()).is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = Config::default();
        let text = config.to_toml().unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_log_level_conversion() {
        let config = Config::default();
        assert_eq!(config.log_level().unwrap(), tracing::Level::INFO);
    }
}
