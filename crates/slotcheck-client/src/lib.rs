//! CLI, configuration, report and conflict output
//!
//! This crate provides the `slotcheck` command-line interface.

pub mod check;
pub mod cli;
pub mod config;
pub mod error;
pub mod secret;

pub use check::{CheckPlan, CheckSummary, run_check};
pub use cli::Cli;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
