//! Error events submitted to the tracker

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Severity of a tracked event
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    Error,
    Fatal,
}

/// Exception entry of an event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExceptionValue {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExceptionList {
    pub values: Vec<ExceptionValue>,
}

/// An error event in the store endpoint's JSON shape
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorEvent {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub level: EventLevel,
    pub platform: String,
    pub logger: String,
    pub message: String,
    pub exception: ExceptionList,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

impl ErrorEvent {
    pub fn new(level: EventLevel, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            event_id: uuid::Uuid::new_v4().simple().to_string(),
            timestamp: Utc::now(),
            level,
            platform: "other".to_string(),
            logger: "logit".to_string(),
            exception: ExceptionList {
                values: vec![ExceptionValue {
                    kind: "Error".to_string(),
                    value: message.clone(),
                }],
            },
            message,
            environment: None,
            release: None,
            tags: BTreeMap::new(),
        }
    }

    /// Build an event from an error, recording its source chain
    pub fn from_error(level: EventLevel, err: &(dyn std::error::Error + 'static)) -> Self {
        let mut event = Self::new(level, err.to_string());
        let mut source = err.source();
        while let Some(cause) = source {
            event.exception.values.push(ExceptionValue {
                kind: "Caused by".to_string(),
                value: cause.to_string(),
            });
            source = cause.source();
        }
        event
    }

    pub fn with_exception_type(mut self, kind: impl Into<String>) -> Self {
        if let Some(first) = self.exception.values.first_mut() {
            first.kind = kind.into();
        }
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn with_release(mut self, release: impl Into<String>) -> Self {
        self.release = Some(release.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("query failed")]
    struct QueryError {
        #[source]
        source: std::io::Error,
    }

    #[test]
    fn test_new_event() {
        let event = ErrorEvent::new(EventLevel::Error, "boom");
        assert_eq!(event.event_id.len(), 32);
        assert_eq!(event.message, "boom");
        assert_eq!(event.exception.values.len(), 1);
        assert_eq!(event.exception.values[0].value, "boom");
    }

    #[test]
    fn test_from_error_records_chain() {
        let err = QueryError {
            source: std::io::Error::new(std::io::ErrorKind::TimedOut, "socket timed out"),
        };
        let event = ErrorEvent::from_error(EventLevel::Fatal, &err);

        assert_eq!(event.message, "query failed");
        assert_eq!(event.level, EventLevel::Fatal);
        assert_eq!(event.exception.values.len(), 2);
        assert_eq!(event.exception.values[1].value, "socket timed out");
    }

    #[test]
    fn test_serialization() {
        let event = ErrorEvent::new(EventLevel::Error, "boom")
            .with_exception_type("DbError")
            .with_tag("op", "charge")
            .with_environment("prod");
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["level"], "error");
        assert_eq!(json["exception"]["values"][0]["type"], "DbError");
        assert_eq!(json["tags"]["op"], "charge");
        assert_eq!(json["environment"], "prod");
        assert!(json.get("release").is_none());
    }
}
