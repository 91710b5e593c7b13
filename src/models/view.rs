//! View state: what the user currently filters, sorts and pages by

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::field_registry::{CourseField, FieldRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => write!(f, "asc"),
            Self::Desc => write!(f, "desc"),
        }
    }
}

/// Plain text columns, compared case-insensitively
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextField {
    Category,
    Instructor,
    Name,
    EnrollmentStatus,
    ApplicationStatus,
}

impl TextField {
    pub fn course_field(self) -> CourseField {
        match self {
            Self::Category => CourseField::Category,
            Self::Instructor => CourseField::Instructor,
            Self::Name => CourseField::Name,
            Self::EnrollmentStatus => CourseField::EnrollmentStatus,
            Self::ApplicationStatus => CourseField::ApplicationStatus,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Credit,
    EnrollmentDeadline,
    StartTime,
    EndTime,
    Text(TextField),
}

impl SortField {
    /// Direction applied when the field is first selected
    pub fn default_direction(self) -> SortDirection {
        match self {
            Self::EnrollmentDeadline => SortDirection::Desc,
            _ => SortDirection::Asc,
        }
    }

    pub fn course_field(self) -> CourseField {
        match self {
            Self::Credit => CourseField::Credit,
            Self::EnrollmentDeadline => CourseField::EnrollmentDeadline,
            Self::StartTime => CourseField::StartTime,
            Self::EndTime => CourseField::EndTime,
            Self::Text(text) => text.course_field(),
        }
    }

    fn from_course_field(field: CourseField) -> Option<Self> {
        Some(match field {
            CourseField::Credit => Self::Credit,
            CourseField::EnrollmentDeadline => Self::EnrollmentDeadline,
            CourseField::StartTime => Self::StartTime,
            CourseField::EndTime => Self::EndTime,
            CourseField::Category => Self::Text(TextField::Category),
            CourseField::Instructor => Self::Text(TextField::Instructor),
            CourseField::Name => Self::Text(TextField::Name),
            CourseField::EnrollmentStatus => Self::Text(TextField::EnrollmentStatus),
            CourseField::ApplicationStatus => Self::Text(TextField::ApplicationStatus),
            CourseField::AssignmentUpload | CourseField::CreditAwarded => return None,
        })
    }
}

impl FromStr for SortField {
    type Err = String;

    /// Accepts any canonical name, alias or source key of a sortable column
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldRegistry::global()
            .resolve(&s.to_lowercase())
            .or_else(|| FieldRegistry::global().resolve(s))
            .and_then(Self::from_course_field)
            .ok_or_else(|| format!("Unknown sort field: '{}'", s))
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.course_field().name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub field: SortField,
    pub direction: SortDirection,
}

/// Filter predicates; all active ones must hold
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Exact, case-sensitive category
    pub category: Option<String>,
    /// Case-insensitive substring of the instructor
    pub instructor: Option<String>,
    /// Case-insensitive substring of the course name
    pub name: Option<String>,
}

impl FilterCriteria {
    pub fn category(category: &str) -> Self {
        Self {
            category: Some(category.to_string()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        [&self.category, &self.instructor, &self.name]
            .iter()
            .all(|v| v.as_deref().map_or(true, str::is_empty))
    }
}

/// The user's current view; one owner, mutated only through its methods
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub criteria: FilterCriteria,
    pub sort: Option<SortState>,
    /// 1-based
    pub page: u32,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            criteria: FilterCriteria::default(),
            sort: None,
            page: 1,
        }
    }
}

impl ViewState {
    /// Header click: same field flips direction, another field starts at its default
    ///
    /// Returns true when the sort field changed (which resets the page).
    pub fn select_sort(&mut self, field: SortField) -> bool {
        match self.sort.as_mut() {
            Some(state) if state.field == field => {
                state.direction = state.direction.toggled();
                false
            }
            _ => {
                self.sort = Some(SortState {
                    field,
                    direction: field.default_direction(),
                });
                self.page = 1;
                true
            }
        }
    }

    pub fn set_criteria(&mut self, criteria: FilterCriteria) {
        self.criteria = criteria;
        self.page = 1;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
