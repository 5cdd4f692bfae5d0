//! Error types for the logger

use logit_tracker::TrackerError;

/// Logger construction and shutdown errors
#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    #[error(transparent)]
    Config(#[from] logit_core::Error),

    #[error("Error tracker: {0}")]
    Tracker(#[from] TrackerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to install global logger: {0}")]
    Global(#[from] tracing::dispatcher::SetGlobalDefaultError),
}

/// Result type alias for logger operations
pub type Result<T> = std::result::Result<T, LoggerError>;
