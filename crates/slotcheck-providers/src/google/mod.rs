//! Google Calendar event source.
//!
//! [`GoogleEventSource`] reads `events.list` for each calendar identity with
//! recurring events expanded server-side and results ordered by start time.
//! It expects an already-issued OAuth bearer token; obtaining or refreshing
//! one is left to the caller.
//!
//! # Example
//!
//! ```ignore
//! use slotcheck_providers::google::{GoogleConfig, GoogleEventSource};
//!
//! let source = GoogleEventSource::new(GoogleConfig::new(token))?;
//! let page = source.fetch_page("primary", window, None).await?;
//! ```

mod client;
mod provider;

pub use provider::{GoogleConfig, GoogleEventSource};
