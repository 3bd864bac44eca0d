//! Process configuration for batch synchronization.
//!
//! # Responsibility
//! - Resolve the process timezone, simple-date pattern and logging options.
//! - Read overrides from the environment.
//!
//! # Invariants
//! - The timezone is a fixed UTC offset shared read-only by all operations.
//! - An invalid pattern or timezone fails configuration, never formatting.

use crate::dates::normalizer::{DateNormalizer, DateTransformError, DEFAULT_DATE_PATTERN};
use crate::logging::default_log_level;
use chrono::{FixedOffset, Offset, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_TIMEZONE: &str = "BATCHSYNC_TIMEZONE";
pub const ENV_DATE_PATTERN: &str = "BATCHSYNC_DATE_PATTERN";
pub const ENV_LOG_LEVEL: &str = "BATCHSYNC_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "BATCHSYNC_LOG_DIR";

static OFFSET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:UTC|GMT)?([+-])(\d{2}):?(\d{2})$").expect("valid offset regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidTimezone(String),
    InvalidDatePattern(DateTransformError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTimezone(value) => write!(
                f,
                "unsupported timezone `{value}`; expected UTC, Z, +HH:MM, +HHMM or GMT+HH:MM"
            ),
            Self::InvalidDatePattern(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidTimezone(_) => None,
            Self::InvalidDatePattern(err) => Some(err),
        }
    }
}

/// Resolved process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub timezone: FixedOffset,
    /// strftime pattern for simple-date fields.
    pub date_pattern: String,
    pub log_level: String,
    /// File logging is enabled only when set.
    pub log_dir: Option<PathBuf>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            timezone: Utc.fix(),
            date_pattern: DEFAULT_DATE_PATTERN.to_string(),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl SyncConfig {
    /// Reads `BATCHSYNC_*` variables over the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(value) = read(ENV_TIMEZONE) {
            config.timezone = parse_timezone(&value)?;
        }
        if let Some(value) = read(ENV_DATE_PATTERN) {
            config.date_pattern = value;
        }
        if let Some(value) = read(ENV_LOG_LEVEL) {
            config.log_level = value.trim().to_string();
        }
        if let Some(value) = read(ENV_LOG_DIR) {
            config.log_dir = Some(PathBuf::from(value.trim()));
        }

        config.normalizer()?;
        Ok(config)
    }

    pub fn normalizer(&self) -> Result<DateNormalizer, ConfigError> {
        DateNormalizer::new(self.timezone, self.date_pattern.clone())
            .map_err(ConfigError::InvalidDatePattern)
    }
}

/// Parses `UTC`, `GMT`, `Z`, `+HH:MM`, `+HHMM` or `GMT+HH:MM`.
pub fn parse_timezone(value: &str) -> Result<FixedOffset, ConfigError> {
    let trimmed = value.trim();
    let invalid = || ConfigError::InvalidTimezone(trimmed.to_string());

    if matches!(trimmed.to_ascii_uppercase().as_str(), "UTC" | "GMT" | "Z") {
        return Ok(Utc.fix());
    }

    let captures = OFFSET_RE.captures(trimmed).ok_or_else(invalid)?;
    let hours: i32 = captures[2].parse().map_err(|_| invalid())?;
    let minutes: i32 = captures[3].parse().map_err(|_| invalid())?;
    if hours > 14 || minutes > 59 {
        return Err(invalid());
    }

    let seconds = (hours * 3600 + minutes * 60) * if &captures[1] == "-" { -1 } else { 1 };
    FixedOffset::east_opt(seconds).ok_or_else(invalid)
}
