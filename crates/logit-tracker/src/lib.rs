//! logit error tracker
//!
//! Forwards error events to a Sentry compatible store endpoint without
//! blocking the caller. The tracker is an injected capability: the logger
//! receives an `Arc<dyn ErrorTracker>` instead of reaching for a global client.

mod client;
mod error;
mod event;
#[cfg(test)]
pub mod mock;
mod sentry;

pub use client::{TrackerClient, TrackerOptions};
pub use error::{Result, TrackerError};
pub use event::{ErrorEvent, EventLevel, ExceptionList, ExceptionValue};
pub use sentry::{Dsn, SentryTransport};

use async_trait::async_trait;
use std::time::Duration;

/// Delivers one event to the tracking service
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, event: &ErrorEvent) -> Result<()>;
}

/// Fire-and-forget submission of error events
pub trait ErrorTracker: Send + Sync {
    /// Queue an event for submission; never blocks on the network
    fn capture(&self, event: ErrorEvent);

    /// Wait until queued events are handled. Returns false on timeout.
    fn flush(&self, timeout: Duration) -> bool;
}

/// Tracker that discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracker;

impl ErrorTracker for NoopTracker {
    fn capture(&self, _event: ErrorEvent) {}

    fn flush(&self, _timeout: Duration) -> bool {
        true
    }
}
