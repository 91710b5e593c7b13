//! Projection of a page of courses into display rows

use regex::Regex;
use std::sync::OnceLock;

use crate::field_registry::{CourseField, TABLE_COLUMNS};
use crate::models::Course;

/// Shown for absent or empty fields
pub const PLACEHOLDER: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayCell {
    pub field: CourseField,
    pub text: String,
    /// Greyed-out text
    pub muted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRow {
    pub cells: Vec<DisplayCell>,
    pub expired: bool,
    pub full: bool,
}

impl DisplayRow {
    /// Whole-row styling for courses that can no longer be joined
    pub fn deemphasized(&self) -> bool {
        self.expired || self.full
    }

    pub fn cell(&self, field: CourseField) -> Option<&DisplayCell> {
        self.cells.iter().find(|c| c.field == field)
    }
}

fn enrollment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)/(\d+)").expect("valid enrollment regex"))
}

/// Deadline set and already passed
pub fn is_expired(course: &Course, now_ms: i64) -> bool {
    course.deadline_ts != 0 && course.deadline_ts < now_ms
}

/// Status text holds `current/max` with current >= max
///
/// Only the first `a/b` occurrence counts; no pattern or unparsable numbers
/// mean "not full".
pub fn is_full(status: Option<&str>) -> bool {
    let Some(caps) = status.and_then(|s| enrollment_regex().captures(s)) else {
        return false;
    };
    let current = caps[1].parse::<u64>();
    let max = caps[2].parse::<u64>();
    matches!((current, max), (Ok(current), Ok(max)) if current >= max)
}

pub struct TableRenderer {
    now_ms: i64,
}

impl TableRenderer {
    pub fn new(now_ms: i64) -> Self {
        Self { now_ms }
    }

    pub fn render_row(&self, course: &Course) -> DisplayRow {
        let expired = is_expired(course, self.now_ms);
        let full = is_full(course.enrollment_status.as_deref());

        let cells = TABLE_COLUMNS
            .iter()
            .map(|&field| DisplayCell {
                field,
                text: course.display(field).unwrap_or(PLACEHOLDER).to_string(),
                muted: match field {
                    CourseField::EnrollmentDeadline => expired,
                    CourseField::EnrollmentStatus => expired || full,
                    _ => false,
                },
            })
            .collect();

        DisplayRow {
            cells,
            expired,
            full,
        }
    }
}
