//! Raw event records as delivered by a calendar source.
//!
//! A [`RawEvent`] keeps every field the report needs, exactly as the source
//! returned it. Only the normalizer turns it into an interval.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use slotcheck_core::ReportRow;

/// One boundary of a raw event: a whole date or a precise instant, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum RawEventTime {
    /// A specific instant.
    DateTime(DateTime<Utc>),
    /// A date without a time of day.
    Date(NaiveDate),
}

impl RawEventTime {
    /// Creates a date-time boundary from epoch milliseconds.
    pub fn from_millis(millis: i64) -> Option<Self> {
        DateTime::from_timestamp_millis(millis).map(Self::DateTime)
    }

    /// Epoch milliseconds of this boundary.
    ///
    /// Dates resolve to midnight UTC, which is how the remote API reports
    /// date-only values.
    pub fn epoch_millis(&self) -> i64 {
        match self {
            Self::DateTime(dt) => dt.timestamp_millis(),
            Self::Date(date) => date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp_millis(),
        }
    }

    /// Epoch seconds of this boundary, floor-divided from milliseconds.
    pub fn epoch_seconds(&self) -> i64 {
        self.epoch_millis().div_euclid(1000)
    }

    /// Returns true for a date-only boundary.
    pub fn is_date(&self) -> bool {
        matches!(self, Self::Date(_))
    }
}

/// The organizer of a raw event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawOrganizer {
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// An attendee of a raw event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAttendee {
    pub email: String,
    pub display_name: Option<String>,
    /// Whether this attendee is the organizer.
    #[serde(default)]
    pub organizer: bool,
}

impl RawAttendee {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            display_name: None,
            organizer: false,
        }
    }
}

/// A raw calendar event from a source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Event identifier within the source.
    pub id: String,
    /// The calendar identity this event was fetched from.
    pub calendar_id: String,
    pub start: Option<RawEventTime>,
    pub end: Option<RawEventTime>,
    pub summary: Option<String>,
    pub description: Option<String>,
    /// e.g. "confirmed", "tentative", "cancelled".
    pub status: Option<String>,
    pub location: Option<String>,
    /// e.g. "default", "outOfOffice", "focusTime".
    pub event_type: Option<String>,
    pub organizer: Option<RawOrganizer>,
    #[serde(default)]
    pub attendees: Vec<RawAttendee>,
    /// Whether the source left attendees out of the response.
    #[serde(default)]
    pub attendees_omitted: bool,
    /// Conference details as compact JSON.
    pub conference_data: Option<String>,
    pub hangout_link: Option<String>,
    pub ical_uid: Option<String>,
    pub recurring_event_id: Option<String>,
}

impl RawEvent {
    /// Creates an event with no boundaries or metadata.
    pub fn new(id: impl Into<String>, calendar_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            calendar_id: calendar_id.into(),
            ..Default::default()
        }
    }

    /// Returns true when both start and end are present.
    pub fn has_boundaries(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    pub fn with_start(mut self, start: RawEventTime) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_end(mut self, end: RawEventTime) -> Self {
        self.end = Some(end);
        self
    }

    /// Builder method to set both boundaries as date-times.
    pub fn with_span(self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.with_start(RawEventTime::DateTime(start))
            .with_end(RawEventTime::DateTime(end))
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    pub fn with_organizer(mut self, email: impl Into<String>, display_name: Option<String>) -> Self {
        self.organizer = Some(RawOrganizer {
            email: Some(email.into()),
            display_name,
        });
        self
    }

    pub fn with_attendee(mut self, attendee: RawAttendee) -> Self {
        self.attendees.push(attendee);
        self
    }

    pub fn with_recurring(mut self, recurring_event_id: impl Into<String>) -> Self {
        self.recurring_event_id = Some(recurring_event_id.into());
        self
    }

    /// Builds the report line for this record.
    pub fn to_report_row(&self) -> ReportRow {
        let organizer = self.organizer.as_ref();
        ReportRow {
            id: self.id.clone(),
            organizer_name: organizer.and_then(|o| o.display_name.clone()),
            organizer_email: organizer.and_then(|o| o.email.clone()),
            summary: self.summary.clone(),
            description: self.description.clone(),
            status: self.status.clone(),
            start_millis: self.start.map(|t| t.epoch_millis()),
            end_millis: self.end.map(|t| t.epoch_millis()),
            attendees: self.attendees.iter().map(|a| a.email.clone()).collect(),
            attendees_omitted: self.attendees_omitted,
            conference_data: self.conference_data.clone(),
            hangout_link: self.hangout_link.clone(),
            ical_uid: self.ical_uid.clone(),
            location: self.location.clone(),
            recurring_event_id: self.recurring_event_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn datetime_seconds_floor() {
        let t = RawEventTime::from_millis(1_700_000_000_999).unwrap();
        assert_eq!(t.epoch_millis(), 1_700_000_000_999);
        assert_eq!(t.epoch_seconds(), 1_700_000_000);
        assert!(!t.is_date());
    }

    #[test]
    fn negative_millis_floor() {
        let t = RawEventTime::from_millis(-1).unwrap();
        assert_eq!(t.epoch_seconds(), -1);
    }

    #[test]
    fn date_is_midnight_utc() {
        let t = RawEventTime::Date(NaiveDate::from_ymd_opt(2021, 11, 16).unwrap());
        assert!(t.is_date());
        assert_eq!(t.epoch_seconds(), 1_637_020_800);
        assert_eq!(t.epoch_millis(), 1_637_020_800_000);
    }

    #[test]
    fn boundaries() {
        let start = Utc.with_ymd_and_hms(2021, 11, 16, 9, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2021, 11, 16, 10, 0, 0).unwrap();

        assert!(!RawEvent::new("e", "c").has_boundaries());
        assert!(
            !RawEvent::new("e", "c")
                .with_start(RawEventTime::DateTime(start))
                .has_boundaries()
        );
        assert!(RawEvent::new("e", "c").with_span(start, end).has_boundaries());
    }

    #[test]
    fn report_row_mapping() {
        let start = Utc.with_ymd_and_hms(2021, 11, 16, 9, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2021, 11, 16, 10, 0, 0).unwrap();
        let raw = RawEvent::new("evt-1", "jon@example.com")
            .with_span(start, end)
            .with_summary("Review")
            .with_description("Agenda:\n- numbers")
            .with_status("tentative")
            .with_organizer("jon@example.com", Some("Jon".into()))
            .with_attendee(RawAttendee::new("a@example.com"))
            .with_recurring("series-1");

        let row = raw.to_report_row();
        assert_eq!(row.id, "evt-1");
        assert_eq!(row.organizer_name.as_deref(), Some("Jon"));
        assert_eq!(row.organizer_email.as_deref(), Some("jon@example.com"));
        assert_eq!(row.start_millis, Some(1_637_053_200_000));
        assert_eq!(row.end_millis, Some(1_637_056_800_000));
        assert_eq!(row.attendees, vec!["a@example.com".to_string()]);
        assert_eq!(row.recurring_event_id.as_deref(), Some("series-1"));
        assert_eq!(row.description.as_deref(), Some("Agenda:\n- numbers"));
        assert_eq!(row.status.as_deref(), Some("tentative"));
        assert!(row.to_line().contains(",Agenda:\\n- numbers,tentative,"));
    }

    #[test]
    fn report_row_without_boundaries() {
        let row = RawEvent::new("evt-2", "c").to_report_row();
        assert!(row.start_millis.is_none());
        assert!(row.end_millis.is_none());
        assert!(row.organizer_email.is_none());
    }

    #[test]
    fn serde_roundtrip() {
        let raw = RawEvent::new("evt-1", "primary")
            .with_start(RawEventTime::Date(NaiveDate::from_ymd_opt(2021, 11, 16).unwrap()))
            .with_end(RawEventTime::Date(NaiveDate::from_ymd_opt(2021, 11, 17).unwrap()))
            .with_event_type("outOfOffice");
        let json = serde_json::to_string(&raw).unwrap();
        let parsed: RawEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(raw, parsed);
    }
}
