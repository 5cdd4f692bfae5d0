//! Constants and default values for logit

use std::path::PathBuf;

/// Environment variable selecting the deployment environment
pub const ENV_VAR: &str = "APP_ENV";

/// Default log directory, relative to the working directory
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Default config file names to search for (in priority order)
pub const CONFIG_FILES: &[&str] = &[
    "logit.toml",
    "logit.yaml",
    "logit.yml",
    "logit.json",
];

/// Default maximum size of the active log file in megabytes
pub const DEFAULT_MAX_SIZE_MB: u64 = 100;

/// Default number of rotated files to keep
pub const DEFAULT_MAX_BACKUPS: usize = 7;

/// Default maximum age of rotated files in days
pub const DEFAULT_MAX_AGE_DAYS: u64 = 30;

/// Default forced rotation interval
pub const DEFAULT_ROTATION_TIME: &str = "24h";

/// Default timestamp layout for log records (chrono strftime)
pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%:z";

/// Operation name reported when a context carries none
pub const UNKNOWN_OP: &str = "unknown";

/// Capacity of the error-tracker submission queue
pub const TRACKER_QUEUE_CAPACITY: usize = 100;

/// Time allowed for queued tracker events to drain on fatal/shutdown
pub const TRACKER_FLUSH_TIMEOUT_MS: u64 = 2000;

/// Width of the rule printed around debug dumps
pub const DEBUG_RULE_WIDTH: usize = 80;

/// Get the default log directory
pub fn default_log_dir() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_DIR)
}
