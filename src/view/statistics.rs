use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::collections::HashSet;

use crate::models::Course;
use crate::utils::datetime::DateTimeParser;

/// Summary counters shown above the table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub total: usize,
    pub filtered: usize,
    /// Filtered courses whose deadline is still ahead
    pub open: usize,
    /// Distinct categories over the full set
    pub categories: usize,
    /// "day-of-month + hour" of the data's last modification
    pub last_modified: Option<String>,
}

impl Statistics {
    pub fn compute(
        all: &[Course],
        filtered: &[&Course],
        now: DateTime<Utc>,
        last_modified: Option<DateTime<Utc>>,
        tz: Tz,
    ) -> Self {
        let now_ms = now.timestamp_millis();

        Self {
            total: all.len(),
            filtered: filtered.len(),
            open: filtered.iter().filter(|c| c.deadline_ts > now_ms).count(),
            categories: distinct_categories(all).len(),
            last_modified: last_modified.map(|dt| DateTimeParser::format_day_hour(&dt, tz)),
        }
    }
}

/// Distinct non-empty categories in first-seen order
///
/// Feeds both the category selector and the category counter, so the two
/// always agree.
pub fn distinct_categories(all: &[Course]) -> Vec<String> {
    let mut seen = HashSet::new();
    all.iter()
        .filter_map(Course::category_key)
        .filter(|category| seen.insert(*category))
        .map(str::to_string)
        .collect()
}
