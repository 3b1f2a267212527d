//! Interval types for calendar events.
//!
//! This module provides:
//! - [`Interval`]: a half-open `[start, end)` range in epoch seconds
//! - [`CalendarInterval`]: an interval carrying the event metadata needed to
//!   explain a conflict (organizer, attendees, summary, event type)
//! - [`EventType`]: the kind of calendar event as reported by the source

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Length of one day in seconds.
pub const ONE_DAY_SECS: i64 = 86_400;

/// A half-open time range `[start, end)` in epoch seconds.
///
/// `start <= end` always holds for a constructed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "IntervalBounds")]
pub struct Interval {
    start: i64,
    end: i64,
}

/// Unchecked serialized form of [`Interval`].
#[derive(Deserialize)]
struct IntervalBounds {
    start: i64,
    end: i64,
}

impl TryFrom<IntervalBounds> for Interval {
    type Error = CoreError;

    fn try_from(bounds: IntervalBounds) -> CoreResult<Self> {
        Self::new(bounds.start, bounds.end)
    }
}

impl Interval {
    /// Creates a new interval.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvertedInterval`] if `start > end`.
    pub fn new(start: i64, end: i64) -> CoreResult<Self> {
        if start > end {
            return Err(CoreError::inverted(start, end));
        }
        Ok(Self { start, end })
    }

    /// Creates an interval from a start and a length in seconds.
    pub fn from_duration(start: i64, duration_secs: u32) -> Self {
        Self {
            start,
            end: start.saturating_add(i64::from(duration_secs)),
        }
    }

    /// Inclusive start, in epoch seconds.
    pub fn start(&self) -> i64 {
        self.start
    }

    /// Exclusive end, in epoch seconds.
    pub fn end(&self) -> i64 {
        self.end
    }

    /// Length of the interval in seconds.
    pub fn duration_secs(&self) -> i64 {
        self.end - self.start
    }

    /// Returns true if `start == end`.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns true if the instant `t` lies in `[start, end)`.
    pub fn contains(&self, t: i64) -> bool {
        self.start <= t && t < self.end
    }

    /// Strict half-open intersection test.
    ///
    /// Ranges that only touch at a boundary (`[10, 20)` and `[20, 30)`) do not
    /// overlap.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// The kind of a calendar event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    /// An ordinary busy event.
    #[default]
    Default,
    /// The organizer is unavailable.
    OutOfOffice,
    /// A focus time block.
    FocusTime,
    /// Any other type the source reports.
    Other(String),
}

impl EventType {
    /// Parses the source's event type string.
    pub fn parse(value: &str) -> Self {
        match value {
            "default" => Self::Default,
            "outOfOffice" => Self::OutOfOffice,
            "focusTime" => Self::FocusTime,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the source's string for this event type.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Default => "default",
            Self::OutOfOffice => "outOfOffice",
            Self::FocusTime => "focusTime",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for EventType {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<EventType> for String {
    fn from(value: EventType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The organizer of an event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organizer {
    /// Organizer email address (empty if unknown).
    pub email: String,
    /// Organizer display name (empty if unknown).
    pub display_name: String,
}

impl Organizer {
    /// Creates an organizer with the given email.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            display_name: String::new(),
        }
    }

    /// Builder method to set the display name.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }
}

/// An attendee of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    /// Attendee email address.
    pub email: String,
    /// Attendee display name, if known.
    pub display_name: Option<String>,
}

impl Attendee {
    /// Creates an attendee with the given email.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            display_name: None,
        }
    }
}

/// A calendar event modeled as a time interval.
///
/// `all_day` and `out_of_office` are derived once in [`CalendarInterval::new`]
/// and there are no setters, so a value never changes after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarInterval {
    interval: Interval,
    organizer: Organizer,
    attendees: Vec<Attendee>,
    summary: String,
    event_type: EventType,
    all_day: bool,
    out_of_office: bool,
}

impl CalendarInterval {
    /// Creates a calendar interval and derives its flags.
    ///
    /// `all_day` is true when the range lasts exactly one day. A timed
    /// meeting of exactly 24 hours is therefore also flagged as all-day.
    pub fn new(
        interval: Interval,
        organizer: Organizer,
        attendees: Vec<Attendee>,
        summary: impl Into<String>,
        event_type: EventType,
    ) -> Self {
        let all_day = interval.duration_secs() == ONE_DAY_SECS;
        let out_of_office = event_type == EventType::OutOfOffice;
        Self {
            interval,
            organizer,
            attendees,
            summary: summary.into(),
            event_type,
            all_day,
            out_of_office,
        }
    }

    /// Creates a calendar interval with default metadata.
    pub fn bare(interval: Interval) -> Self {
        Self::new(
            interval,
            Organizer::default(),
            Vec::new(),
            String::new(),
            EventType::Default,
        )
    }

    /// The underlying time range.
    pub fn interval(&self) -> &Interval {
        &self.interval
    }

    /// Start in epoch seconds.
    pub fn start(&self) -> i64 {
        self.interval.start
    }

    /// End in epoch seconds (exclusive).
    pub fn end(&self) -> i64 {
        self.interval.end
    }

    /// Organizer, empty if the source had none.
    pub fn organizer(&self) -> &Organizer {
        &self.organizer
    }

    /// Attendees in source order.
    pub fn attendees(&self) -> &[Attendee] {
        &self.attendees
    }

    /// Event title.
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Event kind as reported by the source.
    pub fn event_type(&self) -> &EventType {
        &self.event_type
    }

    /// Returns true if the event lasts exactly one day.
    pub fn is_all_day(&self) -> bool {
        self.all_day
    }

    /// Returns true for out-of-office events.
    pub fn is_out_of_office(&self) -> bool {
        self.out_of_office
    }
}

impl fmt::Display for CalendarInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} (organizer: {}",
            self.interval, self.summary, self.organizer.email
        )?;
        if !self.attendees.is_empty() {
            let emails: Vec<&str> = self.attendees.iter().map(|a| a.email.as_str()).collect();
            write!(f, ", attendees: {}", emails.join(", "))?;
        }
        if self.all_day {
            f.write_str(", all-day")?;
        }
        if self.out_of_office {
            f.write_str(", out of office")?;
        }
        f.write_str(")")
    }
}
