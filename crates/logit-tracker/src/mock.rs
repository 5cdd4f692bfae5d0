//! Mock implementations for testing

use crate::error::{Result, TrackerError};
use crate::event::ErrorEvent;
use crate::Transport;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A mock transport that records every submitted event.
/// Clones share their recordings.
#[derive(Clone, Default)]
pub struct MockTransport {
    events: Arc<Mutex<Vec<ErrorEvent>>>,
    call_count: Arc<AtomicUsize>,
    should_fail: bool,
    delay: Option<Duration>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock transport that always fails
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Default::default()
        }
    }

    /// Create a mock transport that takes `delay` per send
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Default::default()
        }
    }

    /// Get the number of times send was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Get all successfully sent events
    pub fn events(&self) -> Vec<ErrorEvent> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, event: &ErrorEvent) -> Result<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.call_count.fetch_add(1, Ordering::SeqCst);

        if self.should_fail {
            return Err(TrackerError::Rejected {
                status: 503,
                body: "Mock failure".to_string(),
            });
        }

        self.events.lock().push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventLevel;

    #[tokio::test]
    async fn test_mock_transport_records_events() {
        let transport = MockTransport::new();
        transport
            .send(&ErrorEvent::new(EventLevel::Error, "first"))
            .await
            .unwrap();
        transport
            .send(&ErrorEvent::new(EventLevel::Fatal, "second"))
            .await
            .unwrap();

        assert_eq!(transport.call_count(), 2);
        let events = transport.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].level, EventLevel::Fatal);
    }

    #[tokio::test]
    async fn test_mock_transport_fails_when_configured() {
        let transport = MockTransport::failing();
        let result = transport
            .send(&ErrorEvent::new(EventLevel::Error, "nope"))
            .await;
        assert!(result.is_err());
        assert_eq!(transport.call_count(), 1);
    }
}
