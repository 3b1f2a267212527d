//! Core types: intervals, calendar intervals, interval index, overlap queries, reports

pub mod error;
pub mod index;
pub mod interval;
pub mod query;
pub mod report;
pub mod time;
pub mod tracing;

pub use error::{CoreError, CoreResult};
pub use index::{IntervalTree, Iter};
pub use interval::{Attendee, CalendarInterval, EventType, Interval, Organizer, ONE_DAY_SECS};
pub use query::OverlapQuery;
pub use report::{REPORT_HEADER, ReportRow, ReportWriter, escape_field};
pub use time::TimeWindow;
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
