use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::field_registry::{CourseField, FieldRegistry};

pub mod view;

pub use view::*;

/// A course as delivered by the source: field name to JSON value
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct RawCourse(pub Map<String, Value>);

impl RawCourse {
    /// Display string for a field, trying the source key then the aliases
    ///
    /// Strings are returned verbatim, numbers and booleans in their JSON
    /// spelling; null and absent fields yield `None`.
    pub fn get(&self, field: CourseField) -> Option<String> {
        FieldRegistry::global()
            .lookup_keys(field)
            .find_map(|key| self.0.get(key))
            .and_then(|value| match value {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                Value::Bool(b) => Some(b.to_string()),
                other => Some(other.to_string()),
            })
    }

    /// Builder used by fixtures and tests
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.0.insert(key.to_string(), Value::String(value.to_string()));
        self
    }
}

/// Normalized course record
///
/// Display strings are kept verbatim for rendering and export; the numeric
/// and timestamp fields next to them are computed once by the normalizer and
/// never touched again.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Course {
    pub category: Option<String>,
    pub instructor: String, // trimmed, empty when absent
    pub name: Option<String>,
    pub credit: Option<String>,
    pub credit_value: f64, // 0.0 when unparsable
    pub enrollment_deadline: Option<String>,
    pub deadline_ts: i64, // ms since epoch, 0 when absent/invalid
    pub enrollment_status: Option<String>,
    pub start_time: Option<String>,
    pub start_ts: i64,
    pub end_time: Option<String>,
    pub end_ts: i64,
    pub application_status: Option<String>,
    pub assignment_upload: Option<String>,
    pub credit_awarded: Option<String>,
}

impl Course {
    /// Display string for a field; `None` when absent or empty
    pub fn display(&self, field: CourseField) -> Option<&str> {
        let value = match field {
            CourseField::Category => self.category.as_deref(),
            CourseField::Instructor => Some(self.instructor.as_str()),
            CourseField::Name => self.name.as_deref(),
            CourseField::Credit => self.credit.as_deref(),
            CourseField::EnrollmentDeadline => self.enrollment_deadline.as_deref(),
            CourseField::EnrollmentStatus => self.enrollment_status.as_deref(),
            CourseField::StartTime => self.start_time.as_deref(),
            CourseField::EndTime => self.end_time.as_deref(),
            CourseField::ApplicationStatus => self.application_status.as_deref(),
            CourseField::AssignmentUpload => self.assignment_upload.as_deref(),
            CourseField::CreditAwarded => self.credit_awarded.as_deref(),
        };
        value.filter(|s| !s.is_empty())
    }

    /// Category key used by both the filter selector and the statistics
    pub fn category_key(&self) -> Option<&str> {
        self.display(CourseField::Category)
    }

    /// Largest derived timestamp on the record (0 when it has none)
    pub fn latest_timestamp(&self) -> i64 {
        self.deadline_ts.max(self.start_ts).max(self.end_ts)
    }
}
