//! Raw record → `Course`
//!
//! Normalization never fails. Every malformed field degrades to its default
//! (0 for numbers and timestamps, empty instructor) and the record is kept.

use chrono_tz::Tz;
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, trace};

use crate::field_registry::CourseField;
use crate::models::{Course, RawCourse};
use crate::utils::datetime::DateTimeParser;

pub struct Normalizer {
    tz: Tz,
}

impl Normalizer {
    /// `tz` is the zone naive dates in the payload are written in
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn normalize(&self, raw: &RawCourse) -> Course {
        let credit = raw.get(CourseField::Credit);
        let enrollment_deadline = raw.get(CourseField::EnrollmentDeadline);
        let start_time = raw.get(CourseField::StartTime);
        let end_time = raw.get(CourseField::EndTime);

        Course {
            category: raw.get(CourseField::Category),
            instructor: raw
                .get(CourseField::Instructor)
                .map(|s| s.trim().to_string())
                .unwrap_or_default(),
            name: raw.get(CourseField::Name),
            credit_value: parse_credit(credit.as_deref()),
            credit,
            deadline_ts: DateTimeParser::safe_timestamp(enrollment_deadline.as_deref(), self.tz),
            enrollment_deadline,
            enrollment_status: raw.get(CourseField::EnrollmentStatus),
            start_ts: DateTimeParser::safe_timestamp(start_time.as_deref(), self.tz),
            start_time,
            end_ts: DateTimeParser::safe_timestamp(end_time.as_deref(), self.tz),
            end_time,
            application_status: raw.get(CourseField::ApplicationStatus),
            assignment_upload: raw.get(CourseField::AssignmentUpload),
            credit_awarded: raw.get(CourseField::CreditAwarded),
        }
    }

    pub fn normalize_all(&self, raws: &[RawCourse]) -> Vec<Course> {
        let courses: Vec<Course> = raws.iter().map(|raw| self.normalize(raw)).collect();
        debug!("Normalized {} course records", courses.len());
        courses
    }
}

fn credit_prefix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("valid credit regex")
    })
}

/// Leading decimal number of the credit text ("2.5 学分" → 2.5), else 0
pub fn parse_credit(text: Option<&str>) -> f64 {
    let Some(text) = text else {
        return 0.0;
    };

    let value = credit_prefix_regex()
        .find(text.trim_start())
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0);

    if value == 0.0 && !text.trim().is_empty() {
        trace!("Credit '{}' normalized to 0", text);
    }
    value
}
