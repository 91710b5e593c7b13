/*!
 Field Registry

 Central definition of the course record fields:
  - Canonical field names used throughout the crate
  - The key each field has in the upstream data source
  - English aliases accepted on input
  - Column order for the table and for CSV export

 Raw payloads are keyed by the upstream (Chinese) names. Hand-written
 fixtures and other feeds may use the English aliases instead; both resolve
 to the same canonical field.
*/

use std::collections::HashMap;
use std::sync::OnceLock;

/// Every field a course record can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CourseField {
    Category,
    Instructor,
    Name,
    Credit,
    EnrollmentDeadline,
    EnrollmentStatus,
    StartTime,
    EndTime,
    ApplicationStatus,
    AssignmentUpload,
    CreditAwarded,
}

/// Descriptor for a single canonical field.
pub struct FieldDescriptor {
    pub field: CourseField,
    pub name: &'static str,
    pub display_name: &'static str,
    /// Key in the upstream JSON and the CSV header label
    pub source_key: &'static str,
    pub aliases: &'static [&'static str],
}

macro_rules! fd {
    (
        field: $field:expr,
        name: $name:expr,
        display: $display:expr,
        source_key: $key:expr,
        aliases: [$($alias:expr),* $(,)?]
    ) => {
        FieldDescriptor {
            field: $field,
            name: $name,
            display_name: $display,
            source_key: $key,
            aliases: &[$($alias),*],
        }
    };
}

/// NOTE: order here is the export column order.
static FIELD_DESCRIPTORS: &[FieldDescriptor] = &[
    fd! {
        field: CourseField::Category,
        name: "category",
        display: "Category",
        source_key: "类别",
        aliases: ["category"]
    },
    fd! {
        field: CourseField::Instructor,
        name: "instructor",
        display: "Instructor",
        source_key: "主讲教师",
        aliases: ["instructor", "teacher"]
    },
    fd! {
        field: CourseField::Name,
        name: "name",
        display: "Course",
        source_key: "名称",
        aliases: ["name", "course_name"]
    },
    fd! {
        field: CourseField::Credit,
        name: "credit",
        display: "Credit",
        source_key: "学分",
        aliases: ["credit", "credits"]
    },
    fd! {
        field: CourseField::EnrollmentDeadline,
        name: "enrollment_deadline",
        display: "Deadline",
        source_key: "报名截止时间",
        aliases: ["enrollment_deadline", "deadline"]
    },
    fd! {
        field: CourseField::EnrollmentStatus,
        name: "enrollment_status",
        display: "Enrollment",
        source_key: "招收情况",
        aliases: ["enrollment_status"]
    },
    fd! {
        field: CourseField::StartTime,
        name: "start_time",
        display: "Start",
        source_key: "开始时间",
        aliases: ["start_time", "start"]
    },
    fd! {
        field: CourseField::EndTime,
        name: "end_time",
        display: "End",
        source_key: "结束时间",
        aliases: ["end_time", "end"]
    },
    fd! {
        field: CourseField::ApplicationStatus,
        name: "application_status",
        display: "Application",
        source_key: "申请状态",
        aliases: ["application_status"]
    },
    fd! {
        field: CourseField::AssignmentUpload,
        name: "assignment_upload",
        display: "Assignment",
        source_key: "作业上传",
        aliases: ["assignment_upload"]
    },
    fd! {
        field: CourseField::CreditAwarded,
        name: "credit_awarded",
        display: "Credit Awarded",
        source_key: "赋予学分",
        aliases: ["credit_awarded"]
    },
];

/// Columns shown in the table, in order.
pub const TABLE_COLUMNS: &[CourseField] = &[
    CourseField::Category,
    CourseField::Instructor,
    CourseField::Name,
    CourseField::Credit,
    CourseField::EnrollmentDeadline,
    CourseField::EnrollmentStatus,
    CourseField::StartTime,
    CourseField::EndTime,
    CourseField::ApplicationStatus,
];

pub struct FieldRegistry {
    descriptors: &'static [FieldDescriptor],
    by_field: HashMap<CourseField, &'static FieldDescriptor>,
    by_name: HashMap<&'static str, CourseField>,
}

impl FieldRegistry {
    fn new() -> Self {
        let mut by_field = HashMap::new();
        let mut by_name = HashMap::new();

        for d in FIELD_DESCRIPTORS {
            by_field.insert(d.field, d);
            by_name.insert(d.name, d.field);
            by_name.insert(d.source_key, d.field);
            for alias in d.aliases {
                by_name.insert(*alias, d.field);
            }
        }

        Self {
            descriptors: FIELD_DESCRIPTORS,
            by_field,
            by_name,
        }
    }

    /// Global singleton accessor.
    pub fn global() -> &'static Self {
        static REGISTRY: OnceLock<FieldRegistry> = OnceLock::new();
        REGISTRY.get_or_init(FieldRegistry::new)
    }

    pub fn descriptor(&self, field: CourseField) -> &'static FieldDescriptor {
        // Every variant is registered in FIELD_DESCRIPTORS
        self.by_field[&field]
    }

    /// Resolve a canonical name, source key or alias.
    pub fn resolve(&self, candidate: &str) -> Option<CourseField> {
        self.by_name.get(candidate.trim()).copied()
    }

    /// Keys to try when reading a raw record, source key first.
    pub fn lookup_keys(&self, field: CourseField) -> impl Iterator<Item = &'static str> {
        let d = self.descriptor(field);
        std::iter::once(d.source_key).chain(d.aliases.iter().copied())
    }

    /// Every field in export order.
    pub fn export_fields(&self) -> impl Iterator<Item = CourseField> + '_ {
        self.descriptors.iter().map(|d| d.field)
    }

    /// CSV header labels in export order.
    pub fn export_headers(&self) -> Vec<&'static str> {
        self.descriptors.iter().map(|d| d.source_key).collect()
    }
}

impl CourseField {
    pub fn name(self) -> &'static str {
        FieldRegistry::global().descriptor(self).name
    }

    pub fn display_name(self) -> &'static str {
        FieldRegistry::global().descriptor(self).display_name
    }

    pub fn source_key(self) -> &'static str {
        FieldRegistry::global().descriptor(self).source_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_source_key_and_alias() {
        let reg = FieldRegistry::global();
        assert_eq!(reg.resolve("学分"), Some(CourseField::Credit));
        assert_eq!(reg.resolve("credits"), Some(CourseField::Credit));
        assert_eq!(reg.resolve("credit"), Some(CourseField::Credit));
        assert_eq!(reg.resolve("deadline"), Some(CourseField::EnrollmentDeadline));
        assert_eq!(reg.resolve("unknown"), None);
    }

    #[test]
    fn test_export_headers_fixed_order() {
        let headers = FieldRegistry::global().export_headers();
        assert_eq!(
            headers,
            vec![
                "类别",
                "主讲教师",
                "名称",
                "学分",
                "报名截止时间",
                "招收情况",
                "开始时间",
                "结束时间",
                "申请状态",
                "作业上传",
                "赋予学分"
            ]
        );
    }

    #[test]
    fn test_lookup_keys_source_first() {
        let keys: Vec<_> = FieldRegistry::global()
            .lookup_keys(CourseField::Instructor)
            .collect();
        assert_eq!(keys, vec!["主讲教师", "instructor", "teacher"]);
    }
}
