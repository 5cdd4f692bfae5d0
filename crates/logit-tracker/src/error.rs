//! Error types for the error tracker

/// Error tracker error type
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Event rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Invalid DSN '{dsn}': {reason}")]
    InvalidDsn { dsn: String, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Tracker is shut down")]
    Closed,
}

/// Result type alias for tracker operations
pub type Result<T> = std::result::Result<T, TrackerError>;

impl TrackerError {
    pub fn dsn<D: Into<String>, R: Into<String>>(dsn: D, reason: R) -> Self {
        TrackerError::InvalidDsn {
            dsn: dsn.into(),
            reason: reason.into(),
        }
    }
}
