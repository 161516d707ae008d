//! Configuration module for gator.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::{GatorError, Result};

/// Environment variable pointing at the TOML configuration file.
pub const CONFIG_PATH_ENV: &str = "GATOR_CONFIG";

/// Environment variable overriding the database URL.
pub const DATABASE_URL_ENV: &str = "GATOR_DATABASE_URL";

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite connection URL.
    #[serde(default = "default_db_url")]
    pub url: String,
}

fn default_db_url() -> String {
    "sqlite://data/gator.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_db_url(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to an optional log file. Empty disables file logging.
    #[serde(default)]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: String::new(),
        }
    }
}

/// Feed fetching configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RssConfig {
    /// Value of the User-Agent header sent with every fetch.
    #[serde(default = "default_rss_user_agent")]
    pub user_agent: String,
    /// Connection timeout in seconds.
    #[serde(default = "default_rss_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Read timeout in seconds.
    #[serde(default = "default_rss_read_timeout")]
    pub read_timeout_secs: u64,
    /// Total request timeout in seconds.
    #[serde(default = "default_rss_total_timeout")]
    pub total_timeout_secs: u64,
    /// Maximum number of redirects.
    #[serde(default = "default_rss_max_redirects")]
    pub max_redirects: usize,
    /// Maximum feed size in bytes.
    #[serde(default = "default_rss_max_feed_size")]
    pub max_feed_size_bytes: u64,
    /// Refuse feeds on loopback, private and reserved addresses.
    #[serde(default = "default_rss_block_private_hosts")]
    pub block_private_hosts: bool,
}

fn default_rss_user_agent() -> String {
    "gator".to_string()
}

fn default_rss_connect_timeout() -> u64 {
    10
}

fn default_rss_read_timeout() -> u64 {
    20
}

fn default_rss_total_timeout() -> u64 {
    30
}

fn default_rss_max_redirects() -> usize {
    5
}

fn default_rss_max_feed_size() -> u64 {
    5 * 1024 * 1024 // 5MB
}

fn default_rss_block_private_hosts() -> bool {
    true
}

impl Default for RssConfig {
    fn default() -> Self {
        Self {
            user_agent: default_rss_user_agent(),
            connect_timeout_secs: default_rss_connect_timeout(),
            read_timeout_secs: default_rss_read_timeout(),
            total_timeout_secs: default_rss_total_timeout(),
            max_redirects: default_rss_max_redirects(),
            max_feed_size_bytes: default_rss_max_feed_size(),
            block_private_hosts: default_rss_block_private_hosts(),
        }
    }
}

/// Session file configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Location of the session file. A leading `~/` is the home directory.
    #[serde(default = "default_session_path")]
    pub path: String,
}

fn default_session_path() -> String {
    "~/.gatorconfig.json".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: default_session_path(),
        }
    }
}

impl SessionConfig {
    /// Resolve the session path, expanding `~/` from `$HOME`.
    pub fn resolved_path(&self) -> PathBuf {
        match self.path.strip_prefix("~/") {
            Some(rest) => match std::env::var_os("HOME") {
                Some(home) => PathBuf::from(home).join(rest),
                None => PathBuf::from(rest),
            },
            None => PathBuf::from(&self.path),
        }
    }
}

/// Output configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    /// Timezone for displaying dates (e.g., "Europe/Berlin", "UTC").
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Feed fetching configuration.
    #[serde(default)]
    pub rss: RssConfig,
    /// Session file configuration.
    #[serde(default)]
    pub session: SessionConfig,
    /// Output configuration.
    #[serde(default)]
    pub display: DisplayConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(GatorError::Io)?;
        Self::parse(&content)
    }

    /// Path of the configuration file, honoring `GATOR_CONFIG`.
    pub fn default_path() -> PathBuf {
        std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| GatorError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `GATOR_DATABASE_URL`: Override the database URL
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(DATABASE_URL_ENV) {
            if !url.is_empty() {
                self.database.url = url;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.rss.connect_timeout_secs == 0
            || self.rss.read_timeout_secs == 0
            || self.rss.total_timeout_secs == 0
        {
            return Err(GatorError::Config(
                "rss timeouts must be greater than zero".to_string(),
            ));
        }
        if self.rss.max_feed_size_bytes == 0 {
            return Err(GatorError::Config(
                "rss.max_feed_size_bytes must be greater than zero".to_string(),
            ));
        }
        if self.display.timezone.parse::<chrono_tz::Tz>().is_err() {
            return Err(GatorError::Config(format!(
                "unknown display timezone: {}",
                self.display.timezone
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.database.url, "sqlite://data/gator.db");

        assert_eq!(config.logging.level, "info");
        assert!(config.logging.file.is_empty());

        assert_eq!(config.rss.user_agent, "gator");
        assert_eq!(config.rss.connect_timeout_secs, 10);
        assert_eq!(config.rss.read_timeout_secs, 20);
        assert_eq!(config.rss.total_timeout_secs, 30);
        assert_eq!(config.rss.max_redirects, 5);
        assert_eq!(config.rss.max_feed_size_bytes, 5 * 1024 * 1024);
        assert!(config.rss.block_private_hosts);

        assert_eq!(config.session.path, "~/.gatorconfig.json");
        assert_eq!(config.display.timezone, "UTC");
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[database]
url = "sqlite://custom/feeds.db"

[logging]
level = "debug"
file = "logs/gator.log"

[rss]
user_agent = "gator-test"
connect_timeout_secs = 15
read_timeout_secs = 25
total_timeout_secs = 45
max_redirects = 3
max_feed_size_bytes = 1048576
block_private_hosts = false

[session]
path = "/tmp/session.json"

[display]
timezone = "Europe/Berlin"
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.database.url, "sqlite://custom/feeds.db");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file, "logs/gator.log");
        assert_eq!(config.rss.user_agent, "gator-test");
        assert_eq!(config.rss.connect_timeout_secs, 15);
        assert_eq!(config.rss.read_timeout_secs, 25);
        assert_eq!(config.rss.total_timeout_secs, 45);
        assert_eq!(config.rss.max_redirects, 3);
        assert_eq!(config.rss.max_feed_size_bytes, 1048576);
        assert!(!config.rss.block_private_hosts);
        assert_eq!(config.session.path, "/tmp/session.json");
        assert_eq!(config.display.timezone, "Europe/Berlin");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[rss]
user_agent = "partial"
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.rss.user_agent, "partial");
        assert_eq!(config.rss.max_redirects, 5);
        assert_eq!(config.database.url, "sqlite://data/gator.db");
    }

    #[test]
    fn test_parse_empty_config() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_invalid_config() {
        let result = Config::parse("this is not valid toml [[[");

        assert!(result.is_err());
        if let Err(GatorError::Config(msg)) = result {
            assert!(msg.contains("config parse error"));
        } else {
            panic!("Expected Config error");
        }
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load("nonexistent.toml");
        assert!(matches!(result, Err(GatorError::Io(_))));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.rss.total_timeout_secs = 0;
        assert!(matches!(config.validate(), Err(GatorError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_unknown_timezone() {
        let mut config = Config::default();
        config.display.timezone = "Invalid/Zone".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Invalid/Zone"));
    }

    #[test]
    fn test_session_path_absolute() {
        let session = SessionConfig {
            path: "/var/lib/gator/session.json".to_string(),
        };
        assert_eq!(
            session.resolved_path(),
            PathBuf::from("/var/lib/gator/session.json")
        );
    }

    #[test]
    fn test_session_path_expands_home() {
        let session = SessionConfig::default();
        let resolved = session.resolved_path();
        assert!(resolved.ends_with(".gatorconfig.json"));
        assert!(!resolved.to_string_lossy().starts_with('~'));
    }
}
