//! logit rotate - rolling log files with forced time based rotation

mod rolling;
mod sink;
mod time_writer;

pub use rolling::{BackupFile, RollingFile, RollingFileConfig, DEFAULT_MAX_SIZE};
pub use sink::RotatingSink;
pub use time_writer::{SharedRotatingWriter, TimeRotatingWriter, WriteError};

use chrono::NaiveDate;

/// Name of the log file for an app: `<name>_<version>_<YYYY-MM-DD>.log`
pub fn log_file_name(app_name: &str, app_version: &str, date: NaiveDate) -> String {
    format!("{}_{}_{}.log", app_name, app_version, date.format("%Y-%m-%d"))
}
