//! Calendar event sources and multi-calendar aggregation.
//!
//! - [`EventSource`] - paginated source of raw events for one calendar identity
//! - [`RawEvent`] - source-agnostic event record, also the report row source
//! - [`normalize_event`] - converts a raw record into a `CalendarInterval`
//! - [`Aggregator`] - fetches many identities and loads an `IntervalTree`
//! - [`ProviderError`] - per-identity fetch errors
//!
//! # Architecture
//!
//! ```text
//!  calendar ids ──► Aggregator ──► EventSource::fetch_page (per id, paged)
//!                       │
//!                       ▼  single-writer finalize
//!               RawEvent ──► ReportWriter
//!                   │
//!                   ▼ normalize_event()
//!            CalendarInterval ──► IntervalTree ──► OverlapQuery
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use slotcheck_providers::{Aggregator, AggregatorConfig};
//!
//! let aggregator = Aggregator::new(Arc::new(source), AggregatorConfig::new(ids, window));
//! let aggregation = aggregator.run().await;
//! let busy = aggregation.query().conflicts(&candidate);
//! ```

pub mod aggregate;
pub mod error;
#[cfg(feature = "google")]
pub mod google;
pub mod normalize;
pub mod raw_event;
pub mod source;

pub use aggregate::{
    Aggregation, Aggregator, AggregatorConfig, DEFAULT_MAX_CONCURRENCY, DEFAULT_MAX_PAGES,
    IdentityOutcome,
};
pub use error::{
    MissingBoundary, NormalizeError, ProviderError, ProviderErrorCode, ProviderResult,
};
pub use normalize::{normalize_event, normalize_events};
pub use raw_event::{RawAttendee, RawEvent, RawEventTime, RawOrganizer};
pub use source::{BoxFuture, ErrorSource, EventPage, EventSource, MemorySource};
