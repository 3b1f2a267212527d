//! RawEvent to CalendarInterval conversion.
//!
//! Boundaries resolve to epoch seconds through
//! [`RawEventTime::epoch_seconds`](crate::RawEventTime::epoch_seconds);
//! missing metadata falls back to empty values and the `default` event type.

use slotcheck_core::{Attendee, CalendarInterval, EventType, Interval, Organizer};
use tracing::warn;

use crate::error::{MissingBoundary, NormalizeError};
use crate::raw_event::RawEvent;

/// Converts a [`RawEvent`] to a [`CalendarInterval`].
///
/// # Errors
///
/// - [`NormalizeError::InvalidEventKind`] if a boundary is absent
/// - [`NormalizeError::InvertedRange`] if the end resolves before the start
pub fn normalize_event(raw: &RawEvent) -> Result<CalendarInterval, NormalizeError> {
    let (start, end) = match (raw.start, raw.end) {
        (Some(start), Some(end)) => (start.epoch_seconds(), end.epoch_seconds()),
        (start, end) => {
            let missing = match (start, end) {
                (None, None) => MissingBoundary::Both,
                (None, _) => MissingBoundary::Start,
                _ => MissingBoundary::End,
            };
            return Err(NormalizeError::InvalidEventKind {
                id: raw.id.clone(),
                missing,
            });
        }
    };

    let interval = Interval::new(start, end).map_err(|_| NormalizeError::InvertedRange {
        id: raw.id.clone(),
        start,
        end,
    })?;

    let organizer = raw
        .organizer
        .as_ref()
        .map(|o| Organizer {
            email: o.email.clone().unwrap_or_default(),
            display_name: o.display_name.clone().unwrap_or_default(),
        })
        .unwrap_or_default();

    let attendees = raw
        .attendees
        .iter()
        .map(|a| Attendee {
            email: a.email.clone(),
            display_name: a.display_name.clone(),
        })
        .collect();

    let event_type = raw
        .event_type
        .as_deref()
        .map(EventType::parse)
        .unwrap_or_default();

    Ok(CalendarInterval::new(
        interval,
        organizer,
        attendees,
        raw.summary.clone().unwrap_or_default(),
        event_type,
    ))
}

/// Normalizes a batch, skipping (and logging) records that are rejected.
pub fn normalize_events(raws: &[RawEvent]) -> Vec<CalendarInterval> {
    raws.iter()
        .filter_map(|raw| {
            normalize_event(raw)
                .map_err(|e| warn!(calendar_id = %raw.calendar_id, "skipping event: {}", e))
                .ok()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw_event::{RawAttendee, RawEventTime};
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> RawEventTime {
        RawEventTime::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn timed(start: DateTime<Utc>, end: DateTime<Utc>) -> RawEvent {
        RawEvent::new("evt", "jon@example.com").with_span(start, end)
    }

    #[test]
    fn timed_event() {
        let raw = timed(utc(2021, 11, 16, 9, 0), utc(2021, 11, 16, 10, 0))
            .with_summary("Planning")
            .with_organizer("cto@example.com", Some("CTO".into()))
            .with_attendee(RawAttendee::new("a@example.com"))
            .with_attendee(RawAttendee::new("b@example.com"));

        let ci = normalize_event(&raw).unwrap();
        assert_eq!(ci.start(), 1_637_053_200);
        assert_eq!(ci.end(), 1_637_056_800);
        assert_eq!(ci.summary(), "Planning");
        assert_eq!(ci.organizer().email, "cto@example.com");
        assert_eq!(ci.organizer().display_name, "CTO");
        let emails: Vec<&str> = ci.attendees().iter().map(|a| a.email.as_str()).collect();
        assert_eq!(emails, vec!["a@example.com", "b@example.com"]);
        assert!(!ci.is_all_day());
        assert!(!ci.is_out_of_office());
    }

    #[test]
    fn sub_second_millis_floor() {
        let raw = RawEvent::new("evt", "c")
            .with_start(RawEventTime::from_millis(1_700_000_000_750).unwrap())
            .with_end(RawEventTime::from_millis(1_700_003_600_250).unwrap());
        let ci = normalize_event(&raw).unwrap();
        assert_eq!(ci.start(), 1_700_000_000);
        assert_eq!(ci.end(), 1_700_003_600);
    }

    #[test]
    fn date_only_event_is_all_day() {
        let raw = RawEvent::new("evt", "c")
            .with_start(date(2021, 11, 16))
            .with_end(date(2021, 11, 17));
        let ci = normalize_event(&raw).unwrap();
        assert!(ci.is_all_day());
        assert_eq!(ci.end() - ci.start(), 86_400);
    }

    #[test]
    fn timed_24h_meeting_is_also_all_day() {
        // Duration heuristic: 09:00 to 09:00 the next day counts as all-day.
        let raw = timed(utc(2021, 11, 16, 9, 0), utc(2021, 11, 17, 9, 0));
        assert!(normalize_event(&raw).unwrap().is_all_day());
    }

    #[test]
    fn multi_day_dates_are_not_all_day() {
        let raw = RawEvent::new("evt", "c")
            .with_start(date(2021, 11, 16))
            .with_end(date(2021, 11, 18));
        assert!(!normalize_event(&raw).unwrap().is_all_day());
    }

    #[test]
    fn out_of_office_flag() {
        let base = timed(utc(2021, 11, 16, 9, 0), utc(2021, 11, 16, 10, 0));

        let ooo = base.clone().with_event_type("outOfOffice");
        assert!(normalize_event(&ooo).unwrap().is_out_of_office());

        for other in ["default", "focusTime"] {
            let raw = base.clone().with_event_type(other);
            assert!(!normalize_event(&raw).unwrap().is_out_of_office(), "{}", other);
        }
        assert!(!normalize_event(&base).unwrap().is_out_of_office());
    }

    #[test]
    fn missing_metadata_defaults() {
        let ci = normalize_event(&timed(utc(2021, 11, 16, 9, 0), utc(2021, 11, 16, 10, 0))).unwrap();
        assert_eq!(ci.organizer(), &Organizer::default());
        assert!(ci.attendees().is_empty());
        assert_eq!(ci.summary(), "");
        assert_eq!(ci.event_type(), &EventType::Default);
    }

    #[test]
    fn missing_boundaries_rejected() {
        let err = normalize_event(&RawEvent::new("evt-1", "c")).unwrap_err();
        assert_eq!(
            err,
            NormalizeError::InvalidEventKind {
                id: "evt-1".into(),
                missing: MissingBoundary::Both,
            }
        );

        let only_start = RawEvent::new("evt-2", "c").with_start(date(2021, 11, 16));
        assert!(matches!(
            normalize_event(&only_start),
            Err(NormalizeError::InvalidEventKind {
                missing: MissingBoundary::End,
                ..
            })
        ));

        let only_end = RawEvent::new("evt-3", "c").with_end(date(2021, 11, 16));
        assert!(matches!(
            normalize_event(&only_end),
            Err(NormalizeError::InvalidEventKind {
                missing: MissingBoundary::Start,
                ..
            })
        ));
    }

    #[test]
    fn inverted_range_rejected() {
        let raw = timed(utc(2021, 11, 16, 10, 0), utc(2021, 11, 16, 9, 0));
        assert!(matches!(
            normalize_event(&raw),
            Err(NormalizeError::InvertedRange { .. })
        ));
    }

    #[test]
    fn start_never_after_end() {
        let raws: Vec<RawEvent> = (0..48)
            .map(|h| {
                let start = utc(2021, 11, 16, 0, 0) + chrono::Duration::minutes(h * 37);
                let end = start + chrono::Duration::minutes((h % 5) * 15);
                timed(start, end)
            })
            .collect();

        let normalized = normalize_events(&raws);
        assert_eq!(normalized.len(), raws.len());
        assert!(normalized.iter().all(|ci| ci.start() <= ci.end()));
    }

    #[test]
    fn normalize_events_skips_rejected() {
        let raws = vec![
            timed(utc(2021, 11, 16, 9, 0), utc(2021, 11, 16, 10, 0)),
            RawEvent::new("broken", "c"),
            timed(utc(2021, 11, 16, 11, 0), utc(2021, 11, 16, 12, 0)),
        ];
        assert_eq!(normalize_events(&raws).len(), 2);
    }
}
