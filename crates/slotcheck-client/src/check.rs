//! The conflict check run.
//!
//! Fetches every configured calendar, optionally writes the event report,
//! then prints the stored events that overlap the proposed slot. Report and
//! conflicts are separated by a dashed line.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use slotcheck_core::{Interval, ReportWriter, TimeWindow};
use slotcheck_providers::{Aggregator, AggregatorConfig, EventSource};
use tracing::{info, warn};

use crate::cli::Cli;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Line between the report and the conflict listing.
pub const SEPARATOR: &str = "--------------";

/// Everything a check run needs, resolved from configuration and flags.
#[derive(Debug, Clone)]
pub struct CheckPlan {
    pub calendar_ids: Vec<String>,
    pub window: TimeWindow,
    /// The proposed slot.
    pub candidate: Interval,
    pub max_concurrency: usize,
    pub deadline: Option<Duration>,
    pub report: bool,
    pub json: bool,
}

impl CheckPlan {
    /// Merges `config` and `cli`; flags win.
    ///
    /// The fetch window starts at the proposed slot (or `now`) and spans the
    /// configured number of days.
    pub fn new(config: &ClientConfig, cli: &Cli, now: DateTime<Utc>) -> ClientResult<Self> {
        let calendar_ids = if cli.calendars.is_empty() {
            config.calendar_ids.clone()
        } else {
            cli.calendars.clone()
        };
        if calendar_ids.is_empty() {
            return Err(ClientError::Config("no calendars configured".into()));
        }

        let days = cli.days.unwrap_or(config.window_days);
        if days == 0 {
            return Err(ClientError::InvalidArgument("--days must be at least 1".into()));
        }
        if cli.minutes == 0 {
            return Err(ClientError::InvalidArgument(
                "--minutes must be at least 1".into(),
            ));
        }

        let start = cli.start.unwrap_or(now);
        let window = TimeWindow::next_days(start, days).ok_or_else(|| {
            ClientError::InvalidArgument(format!("a {} day window from {} is out of range", days, start))
        })?;
        let candidate = Interval::from_duration(start.timestamp(), cli.minutes.saturating_mul(60));

        Ok(Self {
            calendar_ids,
            window,
            candidate,
            max_concurrency: config.max_concurrency,
            deadline: config.deadline(),
            report: !cli.no_report,
            json: cli.json,
        })
    }

    fn aggregator_config(&self) -> AggregatorConfig {
        let config = AggregatorConfig::new(self.calendar_ids.clone(), self.window)
            .with_max_concurrency(self.max_concurrency);
        match self.deadline {
            Some(deadline) => config.with_deadline(deadline),
            None => config,
        }
    }
}

/// Summary of a check run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckSummary {
    /// Events in the index after loading.
    pub indexed: usize,
    /// Events overlapping the proposed slot.
    pub conflicts: usize,
    /// Calendars that could not be fetched completely.
    pub failed_calendars: Vec<String>,
}

/// Runs one check against `source`, writing everything to `out`.
pub async fn run_check<W: Write>(
    source: Arc<dyn EventSource>,
    plan: &CheckPlan,
    out: &mut W,
) -> ClientResult<CheckSummary> {
    let aggregator = Aggregator::new(source, plan.aggregator_config());

    let aggregation = if plan.report {
        let mut report = ReportWriter::new(&mut *out);
        report.write_header()?;
        let aggregation = aggregator.run_with_report(&mut report).await?;
        report.flush()?;
        aggregation
    } else {
        aggregator.run().await
    };

    let failed_calendars: Vec<String> = aggregation
        .failed()
        .map(|outcome| outcome.calendar_id.clone())
        .collect();
    for outcome in aggregation.failed() {
        if let Some(ref e) = outcome.error {
            warn!("calendar {} is incomplete: {}", outcome.calendar_id, e);
        }
    }

    let conflicts = aggregation.query().conflicts_sorted(&plan.candidate);
    info!(
        indexed = aggregation.index.len(),
        conflicts = conflicts.len(),
        candidate = %plan.candidate,
        "check complete"
    );

    writeln!(out, "{}", SEPARATOR)?;
    if plan.json {
        serde_json::to_writer_pretty(&mut *out, &conflicts)?;
        writeln!(out)?;
    } else if conflicts.is_empty() {
        writeln!(out, "No conflicts for {}", plan.candidate)?;
    } else {
        for conflict in &conflicts {
            writeln!(out, "{}", conflict)?;
        }
    }
    out.flush()?;

    Ok(CheckSummary {
        indexed: aggregation.index.len(),
        conflicts: conflicts.len(),
        failed_calendars,
    })
}
