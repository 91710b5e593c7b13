use crate::models::{Course, FilterCriteria};

/// Derives the filtered view from the full record set
///
/// Needles are lower-cased once up front; records are never modified and
/// the output keeps their original relative order.
pub struct FilterEngine<'c> {
    category: Option<&'c str>,
    instructor: Option<String>,
    name: Option<String>,
}

impl<'c> FilterEngine<'c> {
    pub fn new(criteria: &'c FilterCriteria) -> Self {
        fn needle(value: &Option<String>) -> Option<String> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_lowercase)
        }

        Self {
            category: criteria.category.as_deref().filter(|c| !c.is_empty()),
            instructor: needle(&criteria.instructor),
            name: needle(&criteria.name),
        }
    }

    pub fn is_pass_through(&self) -> bool {
        self.category.is_none() && self.instructor.is_none() && self.name.is_none()
    }

    pub fn matches(&self, course: &Course) -> bool {
        if let Some(category) = self.category {
            if course.category.as_deref() != Some(category) {
                return false;
            }
        }

        if let Some(instructor) = &self.instructor {
            if !course.instructor.to_lowercase().contains(instructor.as_str()) {
                return false;
            }
        }

        if let Some(name) = &self.name {
            let course_name = course.name.as_deref().unwrap_or_default().to_lowercase();
            if !course_name.contains(name.as_str()) {
                return false;
            }
        }

        true
    }

    pub fn apply<'a>(&self, courses: &'a [Course]) -> Vec<&'a Course> {
        if self.is_pass_through() {
            return courses.iter().collect();
        }
        courses.iter().filter(|course| self.matches(course)).collect()
    }
}
