//! Multi-calendar aggregation.
//!
//! The [`Aggregator`] fetches every configured calendar identity from one
//! [`EventSource`], follows page tokens until the source reports no more
//! pages, and loads the normalized events into an [`IntervalTree`].
//!
//! Identities are fetched concurrently. Each one collects its pages into a
//! private batch. A single-writer finalize step then walks the batches in
//! configuration order: it writes report rows, normalizes, and inserts into
//! the tree. The tree is handed back by value only after finalize, so every
//! query sees a completely loaded index.
//!
//! A failing identity is logged and recorded in its [`IdentityOutcome`]; the
//! remaining identities are unaffected. Pages fetched before the failure are
//! kept.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use slotcheck_core::{CoreResult, IntervalTree, OverlapQuery, ReportWriter, TimeWindow};
use tracing::{debug, info, warn};

use crate::error::{ProviderError, ProviderResult};
use crate::normalize::normalize_event;
use crate::raw_event::RawEvent;
use crate::source::EventSource;

/// Default number of identities fetched at the same time.
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Default cap on pages followed for one identity.
pub const DEFAULT_MAX_PAGES: usize = 1000;

/// Aggregator configuration.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Calendar identities to fetch, in report order.
    pub calendar_ids: Vec<String>,
    /// Window passed to the source for every page.
    pub window: TimeWindow,
    /// Maximum identities fetched concurrently (at least 1).
    pub max_concurrency: usize,
    /// Maximum pages followed per identity.
    pub max_pages: usize,
    /// Time limit for fetching all pages of one identity.
    pub deadline: Option<Duration>,
}

impl AggregatorConfig {
    pub fn new(calendar_ids: Vec<String>, window: TimeWindow) -> Self {
        Self {
            calendar_ids,
            window,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            max_pages: DEFAULT_MAX_PAGES,
            deadline: None,
        }
    }

    /// Builder: set max concurrent identities.
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max.max(1);
        self
    }

    /// Builder: set the per-identity page cap.
    pub fn with_max_pages(mut self, max: usize) -> Self {
        self.max_pages = max.max(1);
        self
    }

    /// Builder: set the per-identity deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// What happened to one calendar identity.
#[derive(Debug)]
pub struct IdentityOutcome {
    pub calendar_id: String,
    /// Pages received.
    pub pages: usize,
    /// Raw records received.
    pub records: usize,
    /// Intervals inserted into the index.
    pub inserted: usize,
    /// Records that could not be normalized.
    pub skipped: usize,
    /// Set if fetching stopped on an error.
    pub error: Option<ProviderError>,
}

impl IdentityOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of an aggregation pass.
#[derive(Debug)]
pub struct Aggregation {
    /// The fully loaded index.
    pub index: IntervalTree,
    /// One outcome per configured identity, in configuration order.
    pub outcomes: Vec<IdentityOutcome>,
}

impl Aggregation {
    /// Conflict queries over the loaded index.
    pub fn query(&self) -> OverlapQuery<'_> {
        OverlapQuery::new(&self.index)
    }

    /// Identities whose fetch failed.
    pub fn failed(&self) -> impl Iterator<Item = &IdentityOutcome> {
        self.outcomes.iter().filter(|o| !o.is_ok())
    }

    /// Identities fetched without error.
    pub fn succeeded(&self) -> impl Iterator<Item = &IdentityOutcome> {
        self.outcomes.iter().filter(|o| o.is_ok())
    }
}

/// Pages collected for one identity before finalize.
#[derive(Debug)]
struct IdentityBatch {
    position: usize,
    calendar_id: String,
    records: Vec<RawEvent>,
    pages: usize,
    error: Option<ProviderError>,
}

/// Loads events from several calendar identities into one index.
pub struct Aggregator {
    source: Arc<dyn EventSource>,
    config: AggregatorConfig,
}

impl Aggregator {
    pub fn new(source: Arc<dyn EventSource>, config: AggregatorConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Fetches every identity and loads the index.
    ///
    /// Never fails: per-identity errors end up in [`Aggregation::outcomes`].
    pub async fn run(&self) -> Aggregation {
        let batches = self.fetch_all().await;
        finalize(batches, |_| {})
    }

    /// Like [`run`](Self::run), also writing one report row per raw record.
    ///
    /// # Errors
    ///
    /// Returns the first error hit while writing the report. The index is
    /// discarded in that case.
    pub async fn run_with_report<W: Write>(
        &self,
        report: &mut ReportWriter<W>,
    ) -> CoreResult<Aggregation> {
        let batches = self.fetch_all().await;
        let mut written: CoreResult<()> = Ok(());
        let aggregation = finalize(batches, |raw| {
            if written.is_ok() {
                written = report.write_row(&raw.to_report_row());
            }
        });
        written?;
        Ok(aggregation)
    }

    async fn fetch_all(&self) -> Vec<IdentityBatch> {
        let mut batches: Vec<IdentityBatch> = stream::iter(self.config.calendar_ids.iter().enumerate())
            .map(|(position, calendar_id)| self.fetch_identity(position, calendar_id))
            .buffer_unordered(self.config.max_concurrency.max(1))
            .collect()
            .await;
        batches.sort_by_key(|b| b.position);
        batches
    }

    async fn fetch_identity(&self, position: usize, calendar_id: &str) -> IdentityBatch {
        let mut batch = IdentityBatch {
            position,
            calendar_id: calendar_id.to_string(),
            records: Vec::new(),
            pages: 0,
            error: None,
        };

        let result = match self.config.deadline {
            Some(limit) => {
                match tokio::time::timeout(limit, self.fetch_pages(calendar_id, &mut batch)).await {
                    Ok(result) => result,
                    Err(_) => Err(ProviderError::network(format!(
                        "deadline of {:?} exceeded",
                        limit
                    ))),
                }
            }
            None => self.fetch_pages(calendar_id, &mut batch).await,
        };

        if let Err(e) = result {
            let e = e.with_provider(self.source.name()).with_calendar(calendar_id);
            warn!(
                calendar_id,
                pages = batch.pages,
                "failed to fetch events: {}",
                e
            );
            batch.error = Some(e);
        }
        batch
    }

    async fn fetch_pages(&self, calendar_id: &str, batch: &mut IdentityBatch) -> ProviderResult<()> {
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .source
                .fetch_page(calendar_id, self.config.window, page_token.as_deref())
                .await?;
            batch.pages += 1;
            debug!(
                calendar_id,
                page = batch.pages,
                events = page.events.len(),
                "fetched page"
            );
            batch.records.extend(page.events);

            match page.next_page_token {
                Some(token) if batch.pages < self.config.max_pages => page_token = Some(token),
                Some(_) => {
                    warn!(
                        calendar_id,
                        max_pages = self.config.max_pages,
                        "page limit reached, ignoring remaining pages"
                    );
                    break;
                }
                None => break,
            }
        }

        Ok(())
    }
}

/// Single-writer load of all batches into a fresh index.
fn finalize(batches: Vec<IdentityBatch>, mut on_record: impl FnMut(&RawEvent)) -> Aggregation {
    let mut index = IntervalTree::new();
    let mut outcomes = Vec::with_capacity(batches.len());

    for batch in batches {
        let mut inserted = 0;
        let mut skipped = 0;

        for raw in &batch.records {
            on_record(raw);
            if !raw.has_boundaries() {
                debug!(calendar_id = %batch.calendar_id, event_id = %raw.id, "event without boundaries");
                skipped += 1;
                continue;
            }
            match normalize_event(raw) {
                Ok(interval) => {
                    index.insert(interval);
                    inserted += 1;
                }
                Err(e) => {
                    warn!(calendar_id = %batch.calendar_id, "skipping event: {}", e);
                    skipped += 1;
                }
            }
        }

        info!(
            calendar_id = %batch.calendar_id,
            pages = batch.pages,
            inserted,
            skipped,
            "loaded calendar"
        );

        outcomes.push(IdentityOutcome {
            records: batch.records.len(),
            calendar_id: batch.calendar_id,
            pages: batch.pages,
            inserted,
            skipped,
            error: batch.error,
        });
    }

    Aggregation { index, outcomes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;
    use crate::raw_event::RawEventTime;
    use crate::source::{BoxFuture, ErrorSource, EventPage, MemorySource};
    use chrono::{DateTime, TimeZone, Utc};
    use slotcheck_core::Interval;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 11, 16, 9, 0, 0).unwrap()
    }

    fn window() -> TimeWindow {
        TimeWindow::next_days(base(), 7).unwrap()
    }

    /// An hour-long event starting `hour` hours after the base time.
    fn event(id: &str, calendar_id: &str, hour: i64) -> RawEvent {
        let start = base() + chrono::Duration::hours(hour);
        RawEvent::new(id, calendar_id).with_span(start, start + chrono::Duration::hours(1))
    }

    fn ids(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn failing_identity_is_isolated() {
        let source = MemorySource::new()
            .with_failure("a", 0)
            .with_page(
                "b",
                vec![event("1", "b", 0), event("2", "b", 2), event("3", "b", 4)],
            );
        let aggregator = Aggregator::new(
            Arc::new(source),
            AggregatorConfig::new(ids(&["a", "b"]), window()),
        );

        let aggregation = aggregator.run().await;

        assert_eq!(aggregation.index.len(), 3);
        assert_eq!(aggregation.outcomes.len(), 2);

        let failed: Vec<&str> = aggregation.failed().map(|o| o.calendar_id.as_str()).collect();
        assert_eq!(failed, vec!["a"]);
        let err = aggregation.outcomes[0].error.as_ref().unwrap();
        assert_eq!(err.code(), ProviderErrorCode::NetworkError);
        assert_eq!(err.calendar_id(), Some("a"));

        let b = &aggregation.outcomes[1];
        assert!(b.is_ok());
        assert_eq!(b.inserted, 3);
    }

    #[tokio::test]
    async fn follows_page_tokens() {
        let source = MemorySource::new()
            .with_page(
                "a",
                vec![event("1", "a", 0), event("2", "a", 1), event("3", "a", 2)],
            )
            .with_page("a", vec![event("4", "a", 3), event("5", "a", 4)]);
        let aggregator = Aggregator::new(
            Arc::new(source),
            AggregatorConfig::new(ids(&["a"]), window()),
        );

        let aggregation = aggregator.run().await;

        assert_eq!(aggregation.index.len(), 5);
        assert_eq!(aggregation.outcomes[0].pages, 2);
        assert_eq!(aggregation.outcomes[0].records, 5);
    }

    #[tokio::test]
    async fn partial_pages_kept_on_failure() {
        let source = MemorySource::new()
            .with_page("a", vec![event("1", "a", 0), event("2", "a", 1)])
            .with_page("a", vec![event("3", "a", 2)])
            .with_failure("a", 1);
        let aggregator = Aggregator::new(
            Arc::new(source),
            AggregatorConfig::new(ids(&["a"]), window()),
        );

        let aggregation = aggregator.run().await;

        assert_eq!(aggregation.index.len(), 2);
        let outcome = &aggregation.outcomes[0];
        assert_eq!(outcome.pages, 1);
        assert!(!outcome.is_ok());
    }

    #[tokio::test]
    async fn records_without_boundaries_are_skipped() {
        let half = RawEvent::new("half", "a").with_start(RawEventTime::DateTime(base()));
        let source = MemorySource::new().with_page(
            "a",
            vec![event("1", "a", 0), RawEvent::new("none", "a"), half],
        );
        let aggregator = Aggregator::new(
            Arc::new(source),
            AggregatorConfig::new(ids(&["a"]), window()),
        );

        let aggregation = aggregator.run().await;

        assert_eq!(aggregation.index.len(), 1);
        assert_eq!(aggregation.outcomes[0].records, 3);
        assert_eq!(aggregation.outcomes[0].skipped, 2);
    }

    #[tokio::test]
    async fn every_identity_failing_yields_empty_index() {
        let source = ErrorSource::new("google", ProviderError::authentication("expired"));
        let aggregator = Aggregator::new(
            Arc::new(source),
            AggregatorConfig::new(ids(&["a", "b", "c"]), window()),
        );

        let aggregation = aggregator.run().await;

        assert!(aggregation.index.is_empty());
        assert_eq!(aggregation.failed().count(), 3);
        assert_eq!(aggregation.succeeded().count(), 0);
        assert!(aggregation.query().conflicts(&window().to_interval()).is_empty());
    }

    #[tokio::test]
    async fn merges_identities_and_queries() {
        let source = MemorySource::new()
            .with_page("a", vec![event("1", "a", 0)])
            .with_page("b", vec![event("2", "b", 0), event("3", "b", 5)])
            .with_page("c", vec![event("4", "c", 0)]);
        let aggregator = Aggregator::new(
            Arc::new(source),
            AggregatorConfig::new(ids(&["a", "b", "c"]), window()).with_max_concurrency(2),
        );

        let aggregation = aggregator.run().await;
        assert_eq!(aggregation.index.len(), 4);

        let order: Vec<&str> = aggregation
            .outcomes
            .iter()
            .map(|o| o.calendar_id.as_str())
            .collect();
        assert_eq!(order, vec!["a", "b", "c"]);

        // Three identities share the 09:00 slot; duplicates are all reported.
        let nine = base().timestamp();
        let candidate = Interval::new(nine + 1800, nine + 5400).unwrap();
        assert_eq!(aggregation.query().count(&candidate), 3);

        // Back-to-back with the 09:00 events is free.
        let touching = Interval::new(nine + 3600, nine + 7200).unwrap();
        assert!(!aggregation.query().has_conflict(&touching));
    }

    #[tokio::test]
    async fn page_limit_stops_following() {
        let mut source = MemorySource::new();
        for hour in 0..5 {
            source = source.with_page("a", vec![event(&hour.to_string(), "a", hour)]);
        }
        let aggregator = Aggregator::new(
            Arc::new(source),
            AggregatorConfig::new(ids(&["a"]), window()).with_max_pages(3),
        );

        let aggregation = aggregator.run().await;

        assert_eq!(aggregation.outcomes[0].pages, 3);
        assert_eq!(aggregation.index.len(), 3);
        assert!(aggregation.outcomes[0].is_ok());
    }

    #[tokio::test]
    async fn report_rows_for_every_record() {
        let source = MemorySource::new()
            .with_failure("a", 0)
            .with_page(
                "b",
                vec![
                    event("1", "b", 0).with_summary("Hello, world"),
                    RawEvent::new("2", "b"),
                ],
            );
        let aggregator = Aggregator::new(
            Arc::new(source),
            AggregatorConfig::new(ids(&["a", "b"]), window()),
        );

        let mut report = ReportWriter::new(Vec::new());
        let aggregation = aggregator.run_with_report(&mut report).await.unwrap();

        assert_eq!(report.rows(), 2);
        assert_eq!(aggregation.index.len(), 1);
        let out = String::from_utf8(report.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].starts_with("1,,,\"Hello, world\","));
        assert!(lines[1].starts_with("2,"));
    }

    /// A source that never answers.
    struct StalledSource;

    impl EventSource for StalledSource {
        fn name(&self) -> &str {
            "stalled"
        }

        fn fetch_page<'a>(
            &'a self,
            _calendar_id: &'a str,
            _window: TimeWindow,
            _page_token: Option<&'a str>,
        ) -> BoxFuture<'a, ProviderResult<EventPage>> {
            Box::pin(std::future::pending())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_turns_stall_into_failure() {
        let aggregator = Aggregator::new(
            Arc::new(StalledSource),
            AggregatorConfig::new(ids(&["a"]), window()).with_deadline(Duration::from_secs(5)),
        );

        let aggregation = aggregator.run().await;

        let err = aggregation.outcomes[0].error.as_ref().unwrap();
        assert_eq!(err.code(), ProviderErrorCode::NetworkError);
        assert!(err.message().contains("deadline"));
        assert_eq!(err.provider(), Some("stalled"));
    }
}
