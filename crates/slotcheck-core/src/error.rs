//! Core error types.

use std::io;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An interval was built with its end before its start.
    #[error("inverted interval: start {start} is after end {end}")]
    InvertedInterval { start: i64, end: i64 },

    /// A time window whose end is before its start.
    #[error("inverted time window: start {start} is after end {end}")]
    InvertedWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// IO error while writing a report.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl CoreError {
    /// Creates an inverted interval error.
    pub fn inverted(start: i64, end: i64) -> Self {
        Self::InvertedInterval { start, end }
    }
}
