//! EventSource trait definition.
//!
//! An [`EventSource`] serves one page of events for a calendar identity at a
//! time. Sources must return events ordered by start time with recurring
//! events already expanded into single occurrences; the aggregator relies on
//! both and does not re-derive them.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use slotcheck_core::TimeWindow;

use crate::error::{ProviderError, ProviderResult};
use crate::raw_event::RawEvent;

/// A boxed future for async trait methods.
///
/// Keeps [`EventSource`] object-safe so the aggregator can hold an
/// `Arc<dyn EventSource>`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One page of events.
#[derive(Debug, Clone, Default)]
pub struct EventPage {
    pub events: Vec<RawEvent>,
    /// Cursor for the next page; `None` on the last page.
    pub next_page_token: Option<String>,
}

impl EventPage {
    /// Creates a final page.
    pub fn last(events: Vec<RawEvent>) -> Self {
        Self {
            events,
            next_page_token: None,
        }
    }

    /// Creates a page followed by more pages.
    pub fn with_next(events: Vec<RawEvent>, token: impl Into<String>) -> Self {
        Self {
            events,
            next_page_token: Some(token.into()),
        }
    }
}

/// A paginated source of calendar events.
pub trait EventSource: Send + Sync {
    /// Returns the name of this source (e.g. "google").
    fn name(&self) -> &str;

    /// Fetches one page of events for `calendar_id` within `window`.
    ///
    /// `page_token` is `None` for the first page and the previous page's
    /// `next_page_token` afterwards.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` on network errors, authentication failures, etc.
    fn fetch_page<'a>(
        &'a self,
        calendar_id: &'a str,
        window: TimeWindow,
        page_token: Option<&'a str>,
    ) -> BoxFuture<'a, ProviderResult<EventPage>>;
}

/// A source that always fails.
///
/// Stands in for a source that failed to initialize.
#[derive(Debug)]
pub struct ErrorSource {
    name: String,
    error: ProviderError,
}

impl ErrorSource {
    pub fn new(name: impl Into<String>, error: ProviderError) -> Self {
        Self {
            name: name.into(),
            error,
        }
    }
}

impl EventSource for ErrorSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch_page<'a>(
        &'a self,
        calendar_id: &'a str,
        _window: TimeWindow,
        _page_token: Option<&'a str>,
    ) -> BoxFuture<'a, ProviderResult<EventPage>> {
        let error = ProviderError::new(self.error.code(), self.error.message())
            .with_provider(&self.name)
            .with_calendar(calendar_id);
        Box::pin(async move { Err(error) })
    }
}

/// An in-memory source serving prepared pages.
///
/// Page tokens are the stringified index of the next page. Calendars can be
/// marked as failing, either immediately or after a number of pages.
#[derive(Debug, Default)]
pub struct MemorySource {
    pages: HashMap<String, Vec<Vec<RawEvent>>>,
    failures: HashMap<String, usize>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a page of events for `calendar_id`.
    pub fn with_page(mut self, calendar_id: impl Into<String>, events: Vec<RawEvent>) -> Self {
        self.pages.entry(calendar_id.into()).or_default().push(events);
        self
    }

    /// Makes `calendar_id` fail once `after_pages` pages have been served.
    pub fn with_failure(mut self, calendar_id: impl Into<String>, after_pages: usize) -> Self {
        self.failures.insert(calendar_id.into(), after_pages);
        self
    }
}

impl EventSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    fn fetch_page<'a>(
        &'a self,
        calendar_id: &'a str,
        _window: TimeWindow,
        page_token: Option<&'a str>,
    ) -> BoxFuture<'a, ProviderResult<EventPage>> {
        Box::pin(async move {
            let index = match page_token {
                Some(token) => token.parse::<usize>().map_err(|_| {
                    ProviderError::invalid_response(format!("unknown page token {}", token))
                })?,
                None => 0,
            };

            if self.failures.get(calendar_id).is_some_and(|&after| index >= after) {
                return Err(ProviderError::network("connection refused")
                    .with_provider("memory")
                    .with_calendar(calendar_id));
            }

            let pages = self.pages.get(calendar_id).ok_or_else(|| {
                ProviderError::not_found("calendar not found").with_calendar(calendar_id)
            })?;
            let events = pages.get(index).cloned().unwrap_or_default();

            Ok(if index + 1 < pages.len() {
                EventPage::with_next(events, (index + 1).to_string())
            } else {
                EventPage::last(events)
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;
    use chrono::{TimeZone, Utc};

    fn window() -> TimeWindow {
        TimeWindow::next_days(Utc.with_ymd_and_hms(2021, 11, 16, 0, 0, 0).unwrap(), 7).unwrap()
    }

    #[tokio::test]
    async fn error_source_fails() {
        let source = ErrorSource::new("google", ProviderError::authentication("no token"));
        assert_eq!(source.name(), "google");

        let err = source.fetch_page("cto@example.com", window(), None).await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::AuthenticationFailed);
        assert_eq!(err.provider(), Some("google"));
        assert_eq!(err.calendar_id(), Some("cto@example.com"));
    }

    #[tokio::test]
    async fn memory_source_pages() {
        let source = MemorySource::new()
            .with_page("a", vec![RawEvent::new("1", "a"), RawEvent::new("2", "a")])
            .with_page("a", vec![RawEvent::new("3", "a")]);

        let first = source.fetch_page("a", window(), None).await.unwrap();
        assert_eq!(first.events.len(), 2);
        assert_eq!(first.next_page_token.as_deref(), Some("1"));

        let second = source.fetch_page("a", window(), Some("1")).await.unwrap();
        assert_eq!(second.events.len(), 1);
        assert!(second.next_page_token.is_none());
    }

    #[tokio::test]
    async fn memory_source_unknown_calendar() {
        let source = MemorySource::new();
        let err = source.fetch_page("nobody", window(), None).await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::NotFound);
    }

    #[tokio::test]
    async fn memory_source_failure_after_pages() {
        let source = MemorySource::new()
            .with_page("a", vec![RawEvent::new("1", "a")])
            .with_page("a", vec![RawEvent::new("2", "a")])
            .with_failure("a", 1);

        assert!(source.fetch_page("a", window(), None).await.is_ok());
        let err = source.fetch_page("a", window(), Some("1")).await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::NetworkError);
    }
}
