//! Configuration file parsing for logit
//!
//! Supports multiple configuration file formats:
//! - TOML (.toml)
//! - YAML (.yaml, .yml)
//! - JSON (.json)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::*;
use crate::error::{Error, Result};
use crate::types::{parse_rotation_interval, AppInfo, Level};

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(ConfigFormat::Toml),
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            "json" => Some(ConfigFormat::Json),
            _ => None,
        }
    }

    /// Detect format from file path
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

fn default_true() -> bool {
    true
}

fn default_dir() -> PathBuf {
    default_log_dir()
}

fn default_max_size_mb() -> u64 {
    DEFAULT_MAX_SIZE_MB
}

fn default_max_backups() -> usize {
    DEFAULT_MAX_BACKUPS
}

fn default_max_age_days() -> u64 {
    DEFAULT_MAX_AGE_DAYS
}

fn default_rotation_time() -> String {
    DEFAULT_ROTATION_TIME.to_string()
}

fn default_time_format() -> String {
    DEFAULT_TIME_FORMAT.to_string()
}

/// Sink configuration for the logger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggerConfig {
    #[serde(default = "default_true")]
    pub enable_console: bool,
    #[serde(default)]
    pub console_level: Level,
    #[serde(default)]
    pub enable_file: bool,
    #[serde(default)]
    pub file_level: Level,
    /// Directory holding the active log file and its backups
    #[serde(default = "default_dir")]
    pub dir: PathBuf,
    /// Size in megabytes at which the active file is rotated
    #[serde(default = "default_max_size_mb")]
    pub max_size_mb: u64,
    /// Number of rotated files to keep (0 keeps all)
    #[serde(default = "default_max_backups")]
    pub max_backups: usize,
    /// Days to keep rotated files (0 disables age pruning)
    #[serde(default = "default_max_age_days")]
    pub max_age_days: u64,
    /// Gzip rotated files
    #[serde(default)]
    pub compress: bool,
    /// Forced rotation interval, e.g. "24h". "0" or a negative value disables it.
    #[serde(default = "default_rotation_time")]
    pub rotation_time: String,
    /// chrono strftime layout used for record timestamps
    #[serde(default = "default_time_format")]
    pub time_format: String,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            enable_console: true,
            console_level: Level::default(),
            enable_file: false,
            file_level: Level::default(),
            dir: default_dir(),
            max_size_mb: DEFAULT_MAX_SIZE_MB,
            max_backups: DEFAULT_MAX_BACKUPS,
            max_age_days: DEFAULT_MAX_AGE_DAYS,
            compress: false,
            rotation_time: default_rotation_time(),
            time_format: default_time_format(),
        }
    }
}

impl LoggerConfig {
    /// Parsed forced rotation interval (zero when disabled)
    pub fn rotation_interval(&self) -> Result<Duration> {
        parse_rotation_interval(&self.rotation_time)
    }

    pub fn validate(&self) -> Result<()> {
        self.rotation_interval()?;
        if self.time_format.trim().is_empty() {
            return Err(Error::config("time_format must not be empty"));
        }
        Ok(())
    }
}

/// Error tracker credentials
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SentryConfig {
    /// Public key of the project DSN
    pub key: String,
    /// Host and project path, e.g. "o1.ingest.sentry.io/42"
    pub host: String,
}

impl SentryConfig {
    /// Full DSN built from key and host
    pub fn dsn(&self) -> String {
        format!("https://{}@{}", self.key, self.host)
    }
}

/// Configuration file structure (logit.toml/yaml/json)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogitConfig {
    pub app: AppInfo,
    #[serde(default)]
    pub logger: LoggerConfig,
    #[serde(default)]
    pub sentry: Option<SentryConfig>,
}

impl LogitConfig {
    pub fn new(app: AppInfo) -> Self {
        Self {
            app,
            logger: LoggerConfig::default(),
            sentry: None,
        }
    }

    pub fn with_logger(mut self, logger: LoggerConfig) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_sentry(mut self, sentry: SentryConfig) -> Self {
        self.sentry = Some(sentry);
        self
    }

    /// Load config from file, automatically detecting format from extension
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }

        let format = ConfigFormat::from_path(path).ok_or_else(|| {
            Error::ConfigError(format!(
                "Unsupported config file extension: {}. Expected .toml, .yaml, .yml, or .json",
                path.display()
            ))
        })?;

        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, format)
    }

    /// Parse config content with specified format, then validate it
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self> {
        let config: LogitConfig = match format {
            ConfigFormat::Toml => toml::from_str(content)?,
            ConfigFormat::Yaml => serde_yaml::from_str(content)?,
            ConfigFormat::Json => serde_json::from_str(content)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Find and load a config file from a directory
    pub fn find_and_load(dir: &Path) -> Result<(Self, PathBuf)> {
        for name in CONFIG_FILES {
            let path = dir.join(name);
            if path.exists() {
                let config = Self::load(&path)?;
                return Ok((config, path));
            }
        }
        Err(Error::ConfigError(format!(
            "No config file found in {}. Expected one of: {:?}",
            dir.display(),
            CONFIG_FILES
        )))
    }

    pub fn validate(&self) -> Result<()> {
        self.app.validate()?;
        self.logger.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_config_format_detection() {
        assert_eq!(ConfigFormat::from_extension("toml"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("YML"), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_extension("json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("ini"), None);
    }

    #[test]
    fn test_logger_config_defaults() {
        let config = LoggerConfig::default();
        assert!(config.enable_console);
        assert!(!config.enable_file);
        assert_eq!(config.max_size_mb, 100);
        assert_eq!(config.max_backups, 7);
        assert_eq!(
            config.rotation_interval().unwrap(),
            Duration::from_secs(86400)
        );
    }

    #[test]
    fn test_config_parse_toml() {
        let content = r#"
[app]
name = "billing"
version = "1.2.0"

[logger]
enable_file = true
file_level = "warn"
dir = "/var/log/billing"
max_size_mb = 50
compress = true
rotation_time = "12h"

[sentry]
key = "abc123"
host = "o1.ingest.sentry.io/42"
"#;
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        file.write_all(content.as_bytes()).unwrap();

        let config = LogitConfig::load(file.path()).unwrap();
        assert_eq!(config.app.name, "billing");
        assert!(config.logger.enable_console);
        assert!(config.logger.enable_file);
        assert_eq!(config.logger.file_level, Level::Warn);
        assert_eq!(config.logger.dir, PathBuf::from("/var/log/billing"));
        assert_eq!(config.logger.max_size_mb, 50);
        assert_eq!(config.logger.max_backups, DEFAULT_MAX_BACKUPS);
        assert!(config.logger.compress);
        assert_eq!(
            config.logger.rotation_interval().unwrap(),
            Duration::from_secs(12 * 3600)
        );
        let sentry = config.sentry.unwrap();
        assert_eq!(sentry.dsn(), "https://abc123@o1.ingest.sentry.io/42");
    }

    #[test]
    fn test_config_parse_yaml() {
        let content = r#"
app:
  name: billing
  version: "2.0"
logger:
  enable_console: false
  console_level: debug
  rotation_time: "0"
"#;
        let config = LogitConfig::parse(content, ConfigFormat::Yaml).unwrap();
        assert!(!config.logger.enable_console);
        assert_eq!(config.logger.console_level, Level::Debug);
        assert_eq!(config.logger.rotation_interval().unwrap(), Duration::ZERO);
        assert!(config.sentry.is_none());
    }

    #[test]
    fn test_config_parse_json() {
        let content = r#"{
            "app": { "name": "billing", "version": "3.1.4" },
            "logger": { "enable_file": true, "max_backups": 2 }
        }"#;
        let config = LogitConfig::parse(content, ConfigFormat::Json).unwrap();
        assert!(config.logger.enable_file);
        assert_eq!(config.logger.max_backups, 2);
        assert_eq!(config.logger.time_format, DEFAULT_TIME_FORMAT);
    }

    #[test]
    fn test_config_rejects_bad_rotation_time() {
        let content = r#"
[app]
name = "billing"
version = "1"

[logger]
rotation_time = "every tuesday"
"#;
        let result = LogitConfig::parse(content, ConfigFormat::Toml);
        assert!(matches!(result, Err(Error::InvalidDuration { .. })));
    }

    #[test]
    fn test_config_rejects_bad_app_name() {
        let content = r#"{ "app": { "name": "../../etc", "version": "1" } }"#;
        let result = LogitConfig::parse(content, ConfigFormat::Json);
        assert!(matches!(result, Err(Error::InvalidAppName(_))));
    }

    #[test]
    fn test_config_not_found() {
        let result = LogitConfig::load(Path::new("/nonexistent/logit.toml"));
        assert!(matches!(result, Err(Error::ConfigNotFound(_))));
    }

    #[test]
    fn test_find_and_load() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("logit.yml"),
            "app:\n  name: svc\n  version: \"1\"\n",
        )
        .unwrap();

        let (config, path) = LogitConfig::find_and_load(dir.path()).unwrap();
        assert_eq!(config.app.name, "svc");
        assert!(path.ends_with("logit.yml"));
    }

    #[test]
    fn test_find_and_load_missing() {
        let dir = TempDir::new().unwrap();
        assert!(LogitConfig::find_and_load(dir.path()).is_err());
    }
}
