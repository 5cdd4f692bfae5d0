//! logit - structured logging facade
//!
//! Console and file output through `tracing`, daily log files that are
//! rotated by size and on a fixed schedule, and error events forwarded to a
//! Sentry compatible tracker.
//!
//! ```no_run
//! use logit::{field, Env, LogContext, Logger, LogitConfig};
//!
//! # fn main() -> logit::Result<()> {
//! let (config, _) = LogitConfig::find_and_load(std::path::Path::new("."))?;
//! let logger = Logger::from_config(&config, Env::from_env())?;
//!
//! let ctx = LogContext::new("checkout", None);
//! logger.info(&ctx, "order placed", &[field("items", 3)]);
//! logger.shutdown()?;
//! # Ok(())
//! # }
//! ```

mod context;
mod dump;
mod error;
mod fields;
mod logger;
mod subscriber;

pub use context::{new_trace_id, LogContext};
pub use error::{LoggerError, Result};
pub use fields::{field, Field};
pub use logger::Logger;
pub use subscriber::FileWriter;

pub use logit_core::{AppInfo, Env, Level, LoggerConfig, LogitConfig, SentryConfig};
pub use logit_rotate::{RollingFile, RotatingSink, TimeRotatingWriter, WriteError};
pub use logit_tracker::{ErrorEvent, ErrorTracker, EventLevel, NoopTracker, TrackerClient};
