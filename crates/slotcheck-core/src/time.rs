//! Fetch windows.
//!
//! [`TimeWindow`] bounds the events requested from each calendar identity.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::interval::Interval;

/// A time window for querying calendar events.
///
/// Represents a half-open interval `[start, end)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WindowBounds")]
pub struct TimeWindow {
    /// Start of the window (inclusive).
    pub start: DateTime<Utc>,
    /// End of the window (exclusive).
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a new time window.
    ///
    /// # Panics
    ///
    /// Panics if `start` is after `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        assert!(start <= end, "TimeWindow start must be <= end");
        Self { start, end }
    }

    /// Creates a window from `now` covering the next `days` days.
    ///
    /// Returns `None` if the end falls outside the representable date range.
    pub fn next_days(now: DateTime<Utc>, days: u32) -> Option<Self> {
        let end = Duration::try_days(i64::from(days)).and_then(|d| now.checked_add_signed(d))?;
        Some(Self::new(now, end))
    }

    /// Returns the duration of this time window.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Start of the window in epoch milliseconds.
    pub fn start_millis(&self) -> i64 {
        self.start.timestamp_millis()
    }

    /// End of the window in epoch milliseconds.
    pub fn end_millis(&self) -> i64 {
        self.end.timestamp_millis()
    }

    /// Checks if a datetime falls within this window.
    pub fn contains(&self, dt: DateTime<Utc>) -> bool {
        self.start <= dt && dt < self.end
    }

    /// The window as an [`Interval`] in epoch seconds.
    pub fn to_interval(&self) -> Interval {
        Interval::from_duration(
            self.start.timestamp(),
            u32::try_from(self.duration().num_seconds()).unwrap_or(u32::MAX),
        )
    }
}

/// Unchecked serialized form of [`TimeWindow`].
#[derive(Deserialize)]
struct WindowBounds {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<WindowBounds> for TimeWindow {
    type Error = CoreError;

    fn try_from(bounds: WindowBounds) -> CoreResult<Self> {
        if bounds.start > bounds.end {
            return Err(CoreError::InvertedWindow {
                start: bounds.start,
                end: bounds.end,
            });
        }
        Ok(Self {
            start: bounds.start,
            end: bounds.end,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn creation() {
        let start = utc(2021, 11, 16, 9, 0, 0);
        let end = utc(2021, 11, 16, 17, 0, 0);
        let window = TimeWindow::new(start, end);
        assert_eq!(window.duration(), Duration::hours(8));
    }

    #[test]
    #[should_panic(expected = "start must be <= end")]
    fn invalid_window() {
        TimeWindow::new(utc(2021, 11, 16, 17, 0, 0), utc(2021, 11, 16, 9, 0, 0));
    }

    #[test]
    fn next_days() {
        let now = utc(2021, 11, 16, 9, 0, 0);
        let window = TimeWindow::next_days(now, 7).unwrap();
        assert_eq!(window.end, utc(2021, 11, 23, 9, 0, 0));
        assert_eq!(window.duration(), Duration::days(7));
    }

    #[test]
    fn next_days_out_of_range() {
        let now = utc(2021, 11, 16, 9, 0, 0);
        assert!(TimeWindow::next_days(now, u32::MAX).is_none());
        assert!(TimeWindow::next_days(now, 365 * 3000).is_some());
    }

    #[test]
    fn millis() {
        let window = TimeWindow::new(utc(2021, 11, 16, 9, 0, 0), utc(2021, 11, 16, 10, 0, 0));
        assert_eq!(window.start_millis(), 1_637_053_200_000);
        assert_eq!(window.end_millis(), 1_637_056_800_000);
    }

    #[test]
    fn contains_half_open() {
        let window = TimeWindow::new(utc(2021, 11, 16, 9, 0, 0), utc(2021, 11, 16, 10, 0, 0));
        assert!(window.contains(utc(2021, 11, 16, 9, 0, 0)));
        assert!(!window.contains(utc(2021, 11, 16, 10, 0, 0)));
    }

    #[test]
    fn to_interval() {
        let window = TimeWindow::new(utc(2021, 11, 16, 9, 0, 0), utc(2021, 11, 16, 10, 0, 0));
        let interval = window.to_interval();
        assert_eq!(interval.start(), 1_637_053_200);
        assert_eq!(interval.end(), 1_637_056_800);
    }

    #[test]
    fn serde_roundtrip() {
        let window = TimeWindow::new(utc(2021, 11, 16, 9, 0, 0), utc(2021, 11, 16, 17, 0, 0));
        let json = serde_json::to_string(&window).unwrap();
        let parsed: TimeWindow = serde_json::from_str(&json).unwrap();
        assert_eq!(window, parsed);
    }

    #[test]
    fn deserialize_rejects_inverted() {
        let json = r#"{"start":"2021-11-16T17:00:00Z","end":"2021-11-16T09:00:00Z"}"#;
        let err = serde_json::from_str::<TimeWindow>(json).unwrap_err();
        assert!(err.to_string().contains("inverted time window"));
    }
}
