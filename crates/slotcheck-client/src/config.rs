//! Client configuration.
//!
//! Settings live in `~/.config/slotcheck/config.toml` by default:
//!
//! ```toml
//! calendar_ids = ["primary", "cto@example.com"]
//! window_days = 7
//! max_concurrency = 4
//! deadline_secs = 30
//! access_token = "env::SLOTCHECK_ACCESS_TOKEN"
//! ```
//!
//! `access_token` accepts `env::` and `pass::` references, see
//! [`secret::resolve`](crate::secret::resolve).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use slotcheck_providers::DEFAULT_MAX_CONCURRENCY;

use crate::error::{ClientError, ClientResult};

/// Configuration for the slotcheck client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Calendar identities to check.
    pub calendar_ids: Vec<String>,

    /// Days ahead of the start time to fetch.
    pub window_days: u32,

    /// Calendars fetched at the same time.
    pub max_concurrency: usize,

    /// Per-calendar time limit in seconds.
    pub deadline_secs: Option<u64>,

    /// Bearer token for the Google Calendar API.
    pub access_token: Option<String>,

    /// Debug logging.
    pub debug: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            calendar_ids: vec!["primary".to_string()],
            window_days: 7,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            deadline_secs: None,
            access_token: None,
            debug: false,
        }
    }
}

impl ClientConfig {
    /// Loads configuration from the default path, or defaults if it does not exist.
    pub fn load() -> ClientResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
            .map_err(|e| ClientError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parses and validates TOML content.
    pub fn parse(content: &str) -> Result<Self, String> {
        let config: Self =
            toml::from_str(content).map_err(|e| format!("failed to parse config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.window_days == 0 {
            return Err("window_days must be at least 1".into());
        }
        if self.max_concurrency == 0 {
            return Err("max_concurrency must be at least 1".into());
        }
        if self.deadline_secs == Some(0) {
            return Err("deadline_secs must be at least 1".into());
        }
        if let Some(id) = self.calendar_ids.iter().find(|id| id.trim().is_empty()) {
            return Err(format!("invalid calendar id {:?}", id));
        }
        Ok(())
    }

    /// The per-calendar deadline, if configured.
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }

    /// Resolves the access token, expanding secret references.
    pub fn resolve_access_token(&self) -> ClientResult<String> {
        let raw = self.access_token.as_deref().ok_or_else(|| {
            ClientError::Config(format!(
                "access_token is not set. Add to {}:\n  \
                 access_token = \"env::SLOTCHECK_ACCESS_TOKEN\"",
                Self::default_path().display()
            ))
        })?;
        crate::secret::resolve(raw)
            .map_err(|e| ClientError::Config(format!("failed to resolve access_token: {}", e)))
    }

    /// Copy safe to print: the token is masked unless it is a reference.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if let Some(token) = config.access_token.as_mut()
            && !token.starts_with("env::")
            && !token.starts_with("pass::")
        {
            *token = "<redacted>".to_string();
        }
        config
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("slotcheck")
            .join("config.toml")
    }
}
