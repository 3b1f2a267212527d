//! CSV-like event report.
//!
//! Each fetched event becomes one line under a fixed header. The escaping is
//! intentionally not RFC 4180: a field is quoted only when it contains a
//! comma, and newlines are written as the two characters `\n` so every
//! event stays on one line.

use std::io::Write;

use crate::error::CoreResult;

/// Header line of the report.
pub const REPORT_HEADER: &str = "ID,Organiser Name,Organiser Email,Summary,Description,Status,\
Start DateTime,End DateTime,Attendees,Attendees Omitted,Conference Data,Hangout Link,ICalUid,\
Location,Recurring EventId";

/// Escapes one report field.
///
/// - `\r` is dropped and `\n` becomes the literal `\n`
/// - if the value contains a comma it is wrapped in double quotes and any
///   embedded double quote is doubled
pub fn escape_field(value: &str) -> String {
    let flat = value.replace('\r', "").replace('\n', "\\n");
    if flat.contains(',') {
        format!("\"{}\"", flat.replace('"', "\"\""))
    } else {
        flat
    }
}

fn escape_opt(value: Option<&str>) -> String {
    value.map(escape_field).unwrap_or_default()
}

/// One report line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportRow {
    pub id: String,
    pub organizer_name: Option<String>,
    pub organizer_email: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    /// Resolved start boundary in epoch milliseconds.
    pub start_millis: Option<i64>,
    /// Resolved end boundary in epoch milliseconds.
    pub end_millis: Option<i64>,
    /// Attendee emails.
    pub attendees: Vec<String>,
    pub attendees_omitted: bool,
    /// Conference data as compact JSON.
    pub conference_data: Option<String>,
    pub hangout_link: Option<String>,
    pub ical_uid: Option<String>,
    pub location: Option<String>,
    pub recurring_event_id: Option<String>,
}

impl ReportRow {
    /// Renders the row without a trailing newline.
    pub fn to_line(&self) -> String {
        let millis = |v: Option<i64>| v.map(|m| m.to_string()).unwrap_or_default();
        let fields = [
            escape_field(&self.id),
            escape_opt(self.organizer_name.as_deref()),
            escape_opt(self.organizer_email.as_deref()),
            escape_opt(self.summary.as_deref()),
            escape_opt(self.description.as_deref()),
            escape_opt(self.status.as_deref()),
            millis(self.start_millis),
            millis(self.end_millis),
            escape_field(&self.attendees.join(";")),
            if self.attendees_omitted { "yes" } else { "no" }.to_string(),
            escape_opt(self.conference_data.as_deref()),
            escape_opt(self.hangout_link.as_deref()),
            escape_opt(self.ical_uid.as_deref()),
            escape_opt(self.location.as_deref()),
            escape_opt(self.recurring_event_id.as_deref()),
        ];
        fields.join(",")
    }
}

/// Writes report lines to any [`Write`] sink.
#[derive(Debug)]
pub struct ReportWriter<W: Write> {
    out: W,
    rows: usize,
}

impl<W: Write> ReportWriter<W> {
    /// Creates a writer. Nothing is written until [`write_header`](Self::write_header).
    pub fn new(out: W) -> Self {
        Self { out, rows: 0 }
    }

    pub fn write_header(&mut self) -> CoreResult<()> {
        writeln!(self.out, "{}", REPORT_HEADER)?;
        Ok(())
    }

    pub fn write_row(&mut self, row: &ReportRow) -> CoreResult<()> {
        writeln!(self.out, "{}", row.to_line())?;
        self.rows += 1;
        Ok(())
    }

    /// Number of rows written so far (header excluded).
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn flush(&mut self) -> CoreResult<()> {
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
