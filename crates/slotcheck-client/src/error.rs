//! Client error types.

use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that stop the `slotcheck` binary.
///
/// Per-calendar fetch failures are not here: they are reported and the run
/// continues with the remaining calendars.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Missing or invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The calendar source could not be set up.
    #[error("provider error: {0}")]
    Provider(#[from] slotcheck_providers::ProviderError),

    /// Invalid command-line argument combination.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Report or output writing failed.
    #[error("output error: {0}")]
    Output(#[from] slotcheck_core::CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
