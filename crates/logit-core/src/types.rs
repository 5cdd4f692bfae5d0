//! Core types for logit

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use tracing::level_filters::LevelFilter;

use crate::constants::ENV_VAR;
use crate::error::{Error, Result};

/// App names end up in log file names, so keep them to a safe character set
static APP_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_.-]+$").expect("Invalid app name regex"));

/// Validate an app name (or version) for use as a file name component
pub fn validate_app_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && APP_NAME_REGEX.is_match(name)
}

/// Deployment environment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Env {
    #[default]
    Local,
    Dev,
    Stage,
    Prod,
}

impl Env {
    /// Read the environment from `APP_ENV`, loading `.env` first if present.
    /// Missing or unrecognised values fall back to `Local`.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        std::env::var(ENV_VAR)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Env::Local)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Env::Local => "local",
            Env::Dev => "dev",
            Env::Stage => "stage",
            Env::Prod => "prod",
        }
    }
}

impl FromStr for Env {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(Env::Local),
            "dev" | "development" => Ok(Env::Dev),
            "stage" | "staging" => Ok(Env::Stage),
            "prod" | "production" => Ok(Env::Prod),
            other => Err(Error::config(format!("Unknown environment: {}", other))),
        }
    }
}

impl std::fmt::Display for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Minimum severity accepted by a sink
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(Level::Trace),
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            other => Err(Error::InvalidLevel(other.to_string())),
        }
    }
}

impl From<Level> for LevelFilter {
    fn from(level: Level) -> Self {
        match level {
            Level::Trace => LevelFilter::TRACE,
            Level::Debug => LevelFilter::DEBUG,
            Level::Info => LevelFilter::INFO,
            Level::Warn => LevelFilter::WARN,
            Level::Error => LevelFilter::ERROR,
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identity of the application emitting logs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppInfo {
    pub name: String,
    pub version: String,
}

impl AppInfo {
    /// Create app info, validating both parts as file name components
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Result<Self> {
        let info = Self {
            name: name.into(),
            version: version.into(),
        };
        info.validate()?;
        Ok(info)
    }

    pub fn validate(&self) -> Result<()> {
        if !validate_app_name(&self.name) {
            return Err(Error::InvalidAppName(self.name.clone()));
        }
        if !validate_app_name(&self.version) {
            return Err(Error::InvalidAppName(format!(
                "{} (version '{}')",
                self.name, self.version
            )));
        }
        Ok(())
    }

    /// Release identifier reported to the error tracker
    pub fn release(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}

/// Parse a forced rotation interval such as `"24h"` or `"90m"`.
///
/// `"0"`, any zero duration, and negative durations (leading `-`) disable
/// time based rotation and yield `Duration::ZERO`.
pub fn parse_rotation_interval(value: &str) -> Result<Duration> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::duration(value, "empty duration"));
    }
    if let Some(rest) = value.strip_prefix('-') {
        // still has to be a well-formed duration
        humantime::parse_duration(rest.trim())
            .map_err(|e| Error::duration(value, e.to_string()))?;
        return Ok(Duration::ZERO);
    }
    if value == "0" {
        return Ok(Duration::ZERO);
    }
    humantime::parse_duration(value).map_err(|e| Error::duration(value, e.to_string()))
}
