use icu_collator::options::{CollatorOptions, Strength};
use icu_collator::{Collator, CollatorBorrowed};
use icu_locale_core::Locale;
use std::cmp::Ordering;
use tracing::warn;

use crate::config::defaults::DEFAULT_COLLATION_LOCALE;
use crate::models::{Course, SortDirection, SortField, SortState};

/// Locale-aware text ordering that ignores case
///
/// Compares at secondary strength: accents count, case does not. An unknown
/// locale falls back to lowercase code point order.
pub struct TextCollator {
    collator: Option<CollatorBorrowed<'static>>,
}

impl TextCollator {
    pub fn new(locale: &str) -> Self {
        let collator = locale
            .parse::<Locale>()
            .map_err(|e| e.to_string())
            .and_then(|parsed| {
                let mut options = CollatorOptions::default();
                options.strength = Some(Strength::Secondary);
                Collator::try_new(parsed.into(), options).map_err(|e| e.to_string())
            });

        match collator {
            Ok(collator) => Self {
                collator: Some(collator),
            },
            Err(e) => {
                warn!(
                    "No collation for locale '{}' ({}), sorting text by code point",
                    locale, e
                );
                Self { collator: None }
            }
        }
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match &self.collator {
            Some(collator) => collator.compare(a, b),
            None => a.to_lowercase().cmp(&b.to_lowercase()),
        }
    }
}

impl Default for TextCollator {
    fn default() -> Self {
        Self::new(DEFAULT_COLLATION_LOCALE)
    }
}

/// Precomputed comparison key for one record
#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Number(f64),
    Time(i64),
    Text(String),
}

impl SortKey {
    fn of(course: &Course, field: SortField) -> Self {
        match field {
            SortField::Credit => Self::Number(course.credit_value),
            SortField::EnrollmentDeadline => Self::time(course.deadline_ts),
            SortField::StartTime => Self::time(course.start_ts),
            SortField::EndTime => Self::time(course.end_ts),
            SortField::Text(text) => Self::Text(
                course
                    .display(text.course_field())
                    .unwrap_or_default()
                    .to_string(),
            ),
        }
    }

    /// 0 marks an absent or invalid date and orders before every real one,
    /// pre-1970 dates included
    fn time(ts: i64) -> Self {
        Self::Time(if ts == 0 { i64::MIN } else { ts })
    }

    fn compare(&self, other: &Self, collator: &TextCollator) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Time(a), Self::Time(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => collator.compare(a, b),
            // Keys of one sort pass always share a variant
            _ => Ordering::Equal,
        }
    }
}

/// Orders a filtered view; returns a new sequence
///
/// The sort is stable: ties keep their relative order in both directions.
/// `None` returns the input order unchanged.
pub fn sort_courses<'a>(
    courses: &[&'a Course],
    sort: Option<SortState>,
    collator: &TextCollator,
) -> Vec<&'a Course> {
    let Some(SortState { field, direction }) = sort else {
        return courses.to_vec();
    };

    let mut keyed: Vec<(SortKey, &'a Course)> = courses
        .iter()
        .map(|course| (SortKey::of(course, field), *course))
        .collect();

    keyed.sort_by(|(a, _), (b, _)| match direction {
        SortDirection::Asc => a.compare(b, collator),
        SortDirection::Desc => b.compare(a, collator),
    });

    keyed.into_iter().map(|(_, course)| course).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestor::Normalizer;
    use crate::models::{RawCourse, TextField};
    use chrono_tz::Tz;

    fn course(name: &str, credit: &str, deadline: &str) -> Course {
        Normalizer::new(Tz::UTC).normalize(
            &RawCourse::default()
                .with("名称", name)
                .with("学分", credit)
                .with("报名截止时间", deadline),
        )
    }

    fn names(view: &[&Course]) -> Vec<String> {
        view.iter().map(|c| c.name.clone().unwrap_or_default()).collect()
    }

    fn by(field: SortField, direction: SortDirection) -> Option<SortState> {
        Some(SortState { field, direction })
    }

    fn sorted(courses: &[Course], sort: Option<SortState>) -> Vec<String> {
        let refs: Vec<&Course> = courses.iter().collect();
        names(&sort_courses(&refs, sort, &TextCollator::default()))
    }

    #[test]
    fn test_no_field_keeps_order() {
        let all = vec![course("b", "2", ""), course("a", "1", "")];
        assert_eq!(sorted(&all, None), vec!["b", "a"]);
    }

    #[test]
    fn test_credit_directions_are_reverses() {
        let all = vec![
            course("three", "3", ""),
            course("one", "1", ""),
            course("twohalf", "2.5", ""),
            course("ten", "10", ""),
        ];

        let asc = sorted(&all, by(SortField::Credit, SortDirection::Asc));
        let mut desc = sorted(&all, by(SortField::Credit, SortDirection::Desc));
        assert_eq!(asc, vec!["one", "twohalf", "three", "ten"]);
        desc.reverse();
        assert_eq!(asc, desc);
    }

    #[test]
    fn test_stable_ties_both_directions() {
        let all = vec![
            course("first", "2", ""),
            course("low", "1", ""),
            course("second", "2", ""),
            course("third", "2", ""),
        ];

        assert_eq!(
            sorted(&all, by(SortField::Credit, SortDirection::Asc)),
            vec!["low", "first", "second", "third"]
        );
        assert_eq!(
            sorted(&all, by(SortField::Credit, SortDirection::Desc)),
            vec!["first", "second", "third", "low"]
        );
    }

    #[test]
    fn test_invalid_dates_sort_earliest() {
        let all = vec![
            course("later", "", "2030-01-01"),
            course("broken", "", "someday"),
            course("earlier", "", "2020-01-01"),
            course("missing", "", ""),
        ];

        assert_eq!(
            sorted(&all, by(SortField::EnrollmentDeadline, SortDirection::Asc)),
            vec!["broken", "missing", "earlier", "later"]
        );
    }

    #[test]
    fn test_pre_epoch_dates_sort_after_missing() {
        let all = vec![
            course("modern", "", "2020-01-01"),
            course("historic", "", "1960-05-01"),
            course("missing", "", ""),
        ];
        assert!(all[1].deadline_ts < 0);

        assert_eq!(
            sorted(&all, by(SortField::EnrollmentDeadline, SortDirection::Asc)),
            vec!["missing", "historic", "modern"]
        );
        assert_eq!(
            sorted(&all, by(SortField::EnrollmentDeadline, SortDirection::Desc)),
            vec!["modern", "historic", "missing"]
        );
    }

    #[test]
    fn test_text_case_insensitive() {
        let all = vec![course("banana", "", ""), course("Apple", "", ""), course("cherry", "", "")];

        assert_eq!(
            sorted(&all, by(SortField::Text(TextField::Name), SortDirection::Asc)),
            vec!["Apple", "banana", "cherry"]
        );
    }

    #[test]
    fn test_text_uses_locale_collation() {
        let all = vec![
            course("Zoe", "", ""),
            course("Émile", "", ""),
            course("张三", "", ""),
            course("李四", "", ""),
        ];

        // Accented Latin sorts with its base letter; Han sorts by pinyin
        assert_eq!(
            sorted(&all, by(SortField::Text(TextField::Name), SortDirection::Asc)),
            vec!["Émile", "Zoe", "李四", "张三"]
        );
    }

    #[test]
    fn test_unknown_locale_falls_back_to_lowercase() {
        let collator = TextCollator::new("not a locale!");
        assert_eq!(collator.compare("apple", "Banana"), Ordering::Less);
        assert_eq!(collator.compare("B", "b"), Ordering::Equal);
    }

    #[test]
    fn test_input_untouched() {
        let all = vec![course("b", "2", ""), course("a", "1", "")];
        let refs: Vec<&Course> = all.iter().collect();
        let _ = sort_courses(
            &refs,
            by(SortField::Credit, SortDirection::Asc),
            &TextCollator::default(),
        );
        assert_eq!(names(&refs), vec!["b", "a"]);
    }
}
