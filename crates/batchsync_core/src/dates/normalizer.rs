//! Timezone-aware date rendering and the end-of-day rule.
//!
//! # Responsibility
//! - Format instants with the full date-time format or the configured
//!   simple-date pattern, always in the process timezone.
//! - Re-anchor end-of-day fields to 23:59:59.999 local time.
//!
//! # Invariants
//! - The simple-date pattern is validated at construction, so rendering
//!   never hits an invalid strftime directive.
//! - Null dates pass through as null; they are never formatted.
//! - Parse-back failures surface as `DateTransformError`; callers decide
//!   whether to abort or tolerate them.

use crate::model::fields;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, TimeZone, Utc};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Full date-time format shared by both stores (millisecond precision).
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S:%3f%z";

/// Simple-date pattern used when none is configured.
pub const DEFAULT_DATE_PATTERN: &str = "%Y-%m-%d";

/// Date formatting or parse-back failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateTransformError {
    /// Pattern is empty or contains unknown strftime directives.
    InvalidPattern(String),
    /// Rendered text could not be parsed back with the expected format.
    Parse {
        field: String,
        text: String,
        message: String,
    },
    /// The end-of-day instant does not exist for the parsed calendar day.
    EndOfDayUnavailable { field: String, day: NaiveDate },
}

impl Display for DateTransformError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPattern(pattern) => write!(f, "invalid date pattern `{pattern}`"),
            Self::Parse {
                field,
                text,
                message,
            } => write!(f, "cannot parse `{text}` for date field {field}: {message}"),
            Self::EndOfDayUnavailable { field, day } => {
                write!(f, "no end-of-day instant on {day} for date field {field}")
            }
        }
    }
}

impl Error for DateTransformError {}

/// Renders batch dates in one process timezone with one simple-date pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateNormalizer {
    offset: FixedOffset,
    pattern: String,
}

impl DateNormalizer {
    /// Creates a normalizer for `offset` and simple-date `pattern`.
    ///
    /// # Errors
    /// - `InvalidPattern` when `pattern` is blank or not valid strftime.
    pub fn new(offset: FixedOffset, pattern: impl Into<String>) -> Result<Self, DateTransformError> {
        let pattern = pattern.into();
        validate_pattern(&pattern)?;
        Ok(Self { offset, pattern })
    }

    /// UTC with the default `%Y-%m-%d` pattern.
    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
            pattern: DEFAULT_DATE_PATTERN.to_string(),
        }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Moves an instant into the process timezone without changing it.
    pub fn localize(&self, value: DateTime<Utc>) -> DateTime<FixedOffset> {
        value.with_timezone(&self.offset)
    }

    /// Renders with the full date-time format; `None` stays `None`.
    pub fn format_date_time(&self, value: Option<DateTime<Utc>>) -> Option<String> {
        value.map(|instant| {
            self.localize(instant)
                .format(DATE_TIME_FORMAT)
                .to_string()
        })
    }

    /// Renders with the simple-date pattern; `None` stays `None`.
    pub fn format_simple_date(&self, value: Option<DateTime<Utc>>) -> Option<String> {
        value.map(|instant| {
            self.localize(instant)
                .format(self.pattern.as_str())
                .to_string()
        })
    }

    /// Round-trips an instant through the full date-time text form.
    ///
    /// The result carries the process offset and millisecond precision,
    /// which is exactly what the column store can hold.
    pub fn normalize_instant(
        &self,
        field: &str,
        value: DateTime<Utc>,
    ) -> Result<DateTime<FixedOffset>, DateTransformError> {
        let text = self.localize(value).format(DATE_TIME_FORMAT).to_string();
        parse_date_time(field, &text)
    }

    /// Applies the end-of-day rule when `field` is on the policy list.
    ///
    /// The calendar day is taken from the simple-date rendering in the
    /// process timezone; fields off the list are returned unchanged.
    ///
    /// # Errors
    /// - `Parse` when the pattern rendering carries no calendar day.
    pub fn apply_end_of_day(
        &self,
        field: &str,
        value: DateTime<FixedOffset>,
    ) -> Result<DateTime<FixedOffset>, DateTransformError> {
        if !fields::is_end_of_day_field(field) {
            return Ok(value);
        }

        let day_text = value
            .with_timezone(&self.offset)
            .format(self.pattern.as_str())
            .to_string();
        let day = NaiveDate::parse_from_str(&day_text, &self.pattern).map_err(|err| {
            DateTransformError::Parse {
                field: field.to_string(),
                text: day_text.clone(),
                message: err.to_string(),
            }
        })?;

        day.and_hms_milli_opt(23, 59, 59, 999)
            .and_then(|local| self.offset.from_local_datetime(&local).single())
            .ok_or_else(|| DateTransformError::EndOfDayUnavailable {
                field: field.to_string(),
                day,
            })
    }
}

impl Default for DateNormalizer {
    fn default() -> Self {
        Self::utc()
    }
}

/// Parses full date-time text as written by either store.
pub fn parse_date_time(field: &str, text: &str) -> Result<DateTime<FixedOffset>, DateTransformError> {
    DateTime::parse_from_str(text, DATE_TIME_FORMAT).map_err(|err| DateTransformError::Parse {
        field: field.to_string(),
        text: text.to_string(),
        message: err.to_string(),
    })
}

fn validate_pattern(pattern: &str) -> Result<(), DateTransformError> {
    if pattern.trim().is_empty()
        || StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error))
    {
        return Err(DateTransformError::InvalidPattern(pattern.to_string()));
    }
    Ok(())
}
