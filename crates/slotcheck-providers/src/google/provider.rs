//! Google Calendar event source.
//!
//! Implements [`EventSource`] on top of the `events.list` client.

use std::time::Duration;

use slotcheck_core::TimeWindow;

use crate::error::{ProviderError, ProviderResult};
use crate::source::{BoxFuture, EventPage, EventSource};

use super::client::{CALENDAR_API_BASE, GoogleCalendarClient};

/// Google Calendar source configuration.
#[derive(Clone)]
pub struct GoogleConfig {
    /// OAuth bearer token with calendar read scope.
    pub access_token: String,
    /// Request timeout.
    pub timeout: Duration,
    /// API base URL.
    pub base_url: String,
}

impl GoogleConfig {
    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            base_url: CALENDAR_API_BASE.to_string(),
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Points the source at another API endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.access_token.trim().is_empty() {
            return Err("access token is empty".into());
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(format!("invalid base URL: {}", self.base_url));
        }
        Ok(())
    }
}

impl std::fmt::Debug for GoogleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleConfig")
            .field("access_token", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Fetches events from Google Calendar API v3.
#[derive(Debug)]
pub struct GoogleEventSource {
    client: GoogleCalendarClient,
}

impl GoogleEventSource {
    /// Creates a source from a validated configuration.
    pub fn new(config: GoogleConfig) -> ProviderResult<Self> {
        config.validate().map_err(ProviderError::configuration)?;
        let client =
            GoogleCalendarClient::new(config.access_token, config.timeout, config.base_url)?;
        Ok(Self { client })
    }
}

impl EventSource for GoogleEventSource {
    fn name(&self) -> &str {
        "google"
    }

    fn fetch_page<'a>(
        &'a self,
        calendar_id: &'a str,
        window: TimeWindow,
        page_token: Option<&'a str>,
    ) -> BoxFuture<'a, ProviderResult<EventPage>> {
        Box::pin(self.client.list_events_page(calendar_id, window, page_token))
    }
}
