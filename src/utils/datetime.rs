//! Centralized datetime handling utilities
//!
//! Course dates arrive as free-form display strings. This module turns them
//! into millisecond timestamps once, at normalization time, and formats the
//! few timestamps the summary panel shows.
//!
//! # Usage
//!
//! ```rust
//! use course_browser::utils::datetime::DateTimeParser;
//! use chrono_tz::Tz;
//!
//! let ts = DateTimeParser::safe_timestamp(Some("2024-03-01 09:00"), Tz::UTC);
//! assert!(ts > 0);
//! assert_eq!(DateTimeParser::safe_timestamp(Some("soon"), Tz::UTC), 0);
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Timelike, Datelike, Utc};
use chrono_tz::Tz;
use thiserror::Error;

/// Errors that can occur during datetime operations
#[derive(Error, Debug)]
pub enum DateTimeError {
    /// Invalid datetime format provided
    #[error("Invalid datetime format: '{input}'")]
    InvalidFormat { input: String },

    /// Local time does not exist in the zone (DST gap)
    #[error("Nonexistent local time: {input}")]
    NonexistentLocal { input: String },
}

/// Naive formats seen in course listings, tried in order
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Centralized datetime parsing and formatting utilities
pub struct DateTimeParser;

impl DateTimeParser {
    /// Parse a datetime from the formats used by course listings
    ///
    /// Supports:
    /// - RFC3339 with zone or offset: "2024-01-01T12:00:00Z"
    /// - naive datetimes with `-` or `/` separators, with or without seconds
    /// - bare dates, taken as local midnight
    ///
    /// Naive values are interpreted in `tz`.
    pub fn parse_flexible(datetime_str: &str, tz: Tz) -> Result<DateTime<Utc>, DateTimeError> {
        let trimmed = datetime_str.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(dt.with_timezone(&Utc));
        }

        for format in NAIVE_DATETIME_FORMATS {
            if let Ok(naive_dt) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Self::localize(naive_dt, tz, datetime_str);
            }
        }

        for format in NAIVE_DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
                if let Some(naive_dt) = date.and_hms_opt(0, 0, 0) {
                    return Self::localize(naive_dt, tz, datetime_str);
                }
            }
        }

        Err(DateTimeError::InvalidFormat {
            input: datetime_str.to_string(),
        })
    }

    fn localize(naive: NaiveDateTime, tz: Tz, input: &str) -> Result<DateTime<Utc>, DateTimeError> {
        // Ambiguous local times (DST overlap) resolve to the earlier instant
        tz.from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| DateTimeError::NonexistentLocal {
                input: input.to_string(),
            })
    }

    /// Millisecond timestamp for a display string, or 0 when absent/invalid
    ///
    /// Never fails: 0 doubles as "earliest possible" when sorting.
    pub fn safe_timestamp(datetime_str: Option<&str>, tz: Tz) -> i64 {
        match datetime_str {
            Some(s) if !s.trim().is_empty() => Self::parse_flexible(s, tz)
                .map(|dt| dt.timestamp_millis())
                .unwrap_or(0),
            _ => 0,
        }
    }

    /// Convert a millisecond timestamp back into a UTC datetime
    pub fn from_millis(millis: i64) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(millis)
    }

    /// Day-of-month plus hour, e.g. "19日 14时"
    pub fn format_day_hour(dt: &DateTime<Utc>, tz: Tz) -> String {
        let local = dt.with_timezone(&tz);
        format!("{}日 {:02}时", local.day(), local.hour())
    }

    /// ISO date for export file names
    pub fn format_date(dt: &DateTime<Utc>, tz: Tz) -> String {
        dt.with_timezone(&tz).format("%Y-%m-%d").to_string()
    }

    /// Get current UTC datetime
    pub fn now_utc() -> DateTime<Utc> {
        Utc::now()
    }
}
