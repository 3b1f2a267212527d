//! Google Calendar API client.
//!
//! Low-level access to `events.list`: request building, status mapping and
//! conversion of the JSON payload into [`RawEvent`] records.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use slotcheck_core::TimeWindow;
use tracing::{debug, warn};

use crate::error::{ProviderError, ProviderResult};
use crate::raw_event::{RawAttendee, RawEvent, RawEventTime, RawOrganizer};
use crate::source::EventPage;

/// Base URL for Google Calendar API v3.
pub(crate) const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Google Calendar API client.
#[derive(Debug)]
pub(crate) struct GoogleCalendarClient {
    http_client: reqwest::Client,
    access_token: String,
    base_url: String,
}

impl GoogleCalendarClient {
    pub(crate) fn new(
        access_token: impl Into<String>,
        timeout: Duration,
        base_url: impl Into<String>,
    ) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                ProviderError::configuration(format!("failed to create HTTP client: {}", e))
                    .with_source(e)
            })?;

        Ok(Self {
            http_client,
            access_token: access_token.into(),
            base_url: base_url.into(),
        })
    }

    /// Fetches one page of `events.list` with recurring events expanded.
    pub(crate) async fn list_events_page(
        &self,
        calendar_id: &str,
        window: TimeWindow,
        page_token: Option<&str>,
    ) -> ProviderResult<EventPage> {
        let url = format!(
            "{}/calendars/{}/events",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(calendar_id)
        );

        let mut request = self
            .http_client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[
                ("timeMin", window.start.to_rfc3339()),
                ("timeMax", window.end.to_rfc3339()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
            ]);

        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = request.send().await.map_err(|e| {
            let message = if e.is_timeout() {
                "request timeout".to_string()
            } else if e.is_connect() {
                format!("connection failed: {}", e)
            } else {
                format!("request failed: {}", e)
            };
            ProviderError::network(message).with_source(e)
        })?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());
            return Err(ProviderError::rate_limited(format!(
                "rate limit exceeded{}",
                retry_after
                    .map(|s| format!(", retry after {} seconds", s))
                    .unwrap_or_default()
            )));
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ProviderError::authentication("access token expired or invalid"));
        }

        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(ProviderError::authorization("access denied to calendar"));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::server(format!("API error ({}): {}", status, body)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("failed to read response: {}", e)))?;

        let page = parse_event_list(&body, calendar_id)?;
        debug!(
            calendar_id,
            events = page.events.len(),
            more = page.next_page_token.is_some(),
            "events.list page"
        );
        Ok(page)
    }
}

/// Parses an `events.list` response body.
pub(crate) fn parse_event_list(body: &str, calendar_id: &str) -> ProviderResult<EventPage> {
    let list: EventListResponse = serde_json::from_str(body).map_err(|e| {
        ProviderError::invalid_response(format!("failed to parse response: {}", e))
    })?;

    Ok(EventPage {
        events: list
            .items
            .into_iter()
            .map(|event| convert_event(event, calendar_id))
            .collect(),
        next_page_token: list.next_page_token,
    })
}

/// Converts an API event to a [`RawEvent`].
///
/// Every event is kept. An unparsable boundary is dropped with a warning so
/// the record still shows up in the report but never reaches the index.
fn convert_event(event: ApiEvent, calendar_id: &str) -> RawEvent {
    let id = event.id.unwrap_or_default();
    let start = event.start.and_then(|t| t.resolve(&id, "start"));
    let end = event.end.and_then(|t| t.resolve(&id, "end"));

    let attendees = event
        .attendees
        .unwrap_or_default()
        .into_iter()
        .filter_map(|a| {
            Some(RawAttendee {
                email: a.email?,
                display_name: a.display_name,
                organizer: a.organizer.unwrap_or(false),
            })
        })
        .collect();

    let conference_data = event
        .conference_data
        .and_then(|cd| serde_json::to_string(&cd).ok());

    RawEvent {
        id,
        calendar_id: calendar_id.to_string(),
        start,
        end,
        summary: event.summary,
        description: event.description,
        status: event.status,
        location: event.location,
        event_type: event.event_type,
        organizer: event.organizer.map(|o| RawOrganizer {
            email: o.email,
            display_name: o.display_name,
        }),
        attendees,
        attendees_omitted: event.attendees_omitted.unwrap_or(false),
        conference_data,
        hangout_link: event.hangout_link,
        ical_uid: event.ical_uid,
        recurring_event_id: event.recurring_event_id,
    }
}

/// Response from the events.list endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventListResponse {
    #[serde(default)]
    items: Vec<ApiEvent>,
    next_page_token: Option<String>,
}

/// A single event from the Google Calendar API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEvent {
    id: Option<String>,
    summary: Option<String>,
    description: Option<String>,
    location: Option<String>,
    status: Option<String>,
    event_type: Option<String>,
    start: Option<ApiEventTime>,
    end: Option<ApiEventTime>,
    organizer: Option<ApiOrganizer>,
    attendees: Option<Vec<ApiAttendee>>,
    attendees_omitted: Option<bool>,
    conference_data: Option<serde_json::Value>,
    hangout_link: Option<String>,
    #[serde(rename = "iCalUID")]
    ical_uid: Option<String>,
    recurring_event_id: Option<String>,
}

/// Event time from the API: `date` for all-day events, `dateTime` otherwise.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEventTime {
    date: Option<String>,
    date_time: Option<String>,
}

impl ApiEventTime {
    fn resolve(self, id: &str, which: &str) -> Option<RawEventTime> {
        match (self.date_time, self.date) {
            (Some(dt), _) => DateTime::parse_from_rfc3339(&dt)
                .map(|parsed| RawEventTime::DateTime(parsed.with_timezone(&Utc)))
                .map_err(|e| warn!(event_id = id, "failed to parse {} time: {}", which, e))
                .ok(),
            (None, Some(date)) => NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                .map(RawEventTime::Date)
                .map_err(|e| warn!(event_id = id, "failed to parse {} date: {}", which, e))
                .ok(),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiOrganizer {
    email: Option<String>,
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiAttendee {
    email: Option<String>,
    display_name: Option<String>,
    organizer: Option<bool>,
}
