//! HTTP event notifier
//!
//! Posts every [`SyncEvent`] as JSON to `{url}{endpoint}`. Any 2xx response
//! counts as delivered; everything else becomes a [`NotifyError`].

use std::time::Duration;

use async_trait::async_trait;
use cloudmirror_core::config::NotifierConfig;
use cloudmirror_core::domain::SyncEvent;
use cloudmirror_core::ports::IEventNotifier;
use reqwest::{Client, Url};
use tracing::debug;

use crate::NotifyError;

/// Default bound on a single delivery attempt
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Notifier that POSTs events to an HTTP consumer
#[derive(Debug, Clone)]
pub struct HttpEventNotifier {
    client: Client,
    target: Url,
}

impl HttpEventNotifier {
    /// Creates a notifier posting to `base_url` + `endpoint` with the default timeout
    pub fn new(base_url: &str, endpoint: &str) -> Result<Self, NotifyError> {
        Self::with_timeout(base_url, endpoint, DEFAULT_TIMEOUT)
    }

    /// Creates a notifier with an explicit per-request timeout
    pub fn with_timeout(
        base_url: &str,
        endpoint: &str,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let joined = format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        );
        let target = Url::parse(&joined).map_err(|e| NotifyError::InvalidUrl(format!("{joined}: {e}")))?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, target })
    }

    pub(crate) fn from_config(base_url: &str, config: &NotifierConfig) -> Result<Self, NotifyError> {
        Self::with_timeout(
            base_url,
            &config.endpoint,
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Full URL events are posted to
    pub fn target(&self) -> &Url {
        &self.target
    }

    /// Sends one event and classifies the response
    pub async fn deliver(&self, event: &SyncEvent) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.target.clone())
            .json(event)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
            });
        }

        debug!(event_type = event.event_type(), %status, "event delivered");
        Ok(())
    }
}

#[async_trait]
impl IEventNotifier for HttpEventNotifier {
    async fn push(&self, event: &SyncEvent) -> anyhow::Result<()> {
        self.deliver(event).await?;
        Ok(())
    }
}
