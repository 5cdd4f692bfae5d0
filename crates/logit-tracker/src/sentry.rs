//! Sentry compatible HTTP transport

use crate::error::{Result, TrackerError};
use crate::event::ErrorEvent;
use crate::Transport;
use async_trait::async_trait;
use tracing::debug;

const SENTRY_PROTOCOL_VERSION: u8 = 7;

/// Parsed project DSN, `https://<key>@<host>/<project>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dsn {
    scheme: String,
    public_key: String,
    host: String,
    project_id: String,
}

impl Dsn {
    pub fn parse(dsn: &str) -> Result<Self> {
        let (scheme, rest) = dsn
            .split_once("://")
            .ok_or_else(|| TrackerError::dsn(dsn, "missing scheme"))?;
        if scheme != "https" && scheme != "http" {
            return Err(TrackerError::dsn(dsn, "scheme must be http or https"));
        }

        let (public_key, location) = rest
            .split_once('@')
            .ok_or_else(|| TrackerError::dsn(dsn, "missing public key"))?;
        if public_key.is_empty() {
            return Err(TrackerError::dsn(dsn, "missing public key"));
        }

        let (host, project_id) = location
            .trim_end_matches('/')
            .rsplit_once('/')
            .ok_or_else(|| TrackerError::dsn(dsn, "missing project id"))?;
        if host.is_empty() {
            return Err(TrackerError::dsn(dsn, "missing host"));
        }
        if project_id.is_empty() || !project_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(TrackerError::dsn(dsn, "project id must be numeric"));
        }

        Ok(Self {
            scheme: scheme.to_string(),
            public_key: public_key.to_string(),
            host: host.to_string(),
            project_id: project_id.to_string(),
        })
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// URL of the event store endpoint
    pub fn store_url(&self) -> String {
        format!(
            "{}://{}/api/{}/store/",
            self.scheme, self.host, self.project_id
        )
    }

    /// Value of the `X-Sentry-Auth` header
    pub fn auth_header(&self) -> String {
        format!(
            "Sentry sentry_version={}, sentry_key={}, sentry_client=logit/{}",
            SENTRY_PROTOCOL_VERSION,
            self.public_key,
            env!("CARGO_PKG_VERSION")
        )
    }
}

/// Transport posting events to a Sentry store endpoint
pub struct SentryTransport {
    dsn: Dsn,
    client: reqwest::Client,
}

impl SentryTransport {
    pub fn new(dsn: Dsn) -> Self {
        Self {
            dsn,
            client: reqwest::Client::new(),
        }
    }

    /// Create with a custom HTTP client (useful for testing)
    pub fn with_client(dsn: Dsn, client: reqwest::Client) -> Self {
        Self { dsn, client }
    }

    pub fn dsn(&self) -> &Dsn {
        &self.dsn
    }
}

#[async_trait]
impl Transport for SentryTransport {
    async fn send(&self, event: &ErrorEvent) -> Result<()> {
        debug!("Submitting error event {}", event.event_id);

        let response = self
            .client
            .post(self.dsn.store_url())
            .header("X-Sentry-Auth", self.dsn.auth_header())
            .json(event)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(TrackerError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
