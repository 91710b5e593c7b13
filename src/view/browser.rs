//! Application state for one browsing session
//!
//! [`CourseBrowser`] is the single owner of the loaded record set and the
//! user's view. Events mutate it through [`CourseBrowser::dispatch`], which
//! only marks a render as pending; [`CourseBrowser::flush`] then runs the
//! filter, sort and paginate pipeline once and draws the result, however many
//! events arrived in between.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::defaults::{DEFAULT_EXPORT_PREFIX, PAGE_SIZE};
use crate::errors::{AppResult, ExportError, ExportResult, LoadError, RenderError, RenderResult};
use crate::export::{export_file_name, CsvExporter, ExportTarget};
use crate::ingestor::LoadOutcome;
use crate::models::{Course, SortState, ViewState};
use crate::render::{RenderTarget, TableRenderer, LOAD_FAILURE_MESSAGE};

use super::events::UiEvent;
use super::filter_engine::FilterEngine;
use super::pagination::{total_pages, PageAction, Paginated};
use super::sort_engine::{sort_courses, TextCollator};
use super::statistics::{distinct_categories, Statistics};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Loading,
    Loaded,
    /// Holds the underlying error text; the user sees a fixed message
    Failed(String),
}

/// What an interactive command produced besides a possible re-render
#[derive(Debug)]
pub enum CommandOutcome {
    Applied,
    Exported(PathBuf),
    Stats(Statistics),
    Quit,
}

pub struct CourseBrowser {
    records: Arc<[Course]>,
    view: ViewState,
    last_modified: Option<DateTime<Utc>>,
    status: LoadStatus,
    tz: Tz,
    per_page: usize,
    export_prefix: String,
    collator: TextCollator,
    /// Page request made before any records arrived
    deferred_page: Option<PageAction>,
    render_pending: bool,
}

impl CourseBrowser {
    pub fn new(tz: Tz) -> Self {
        Self {
            records: Arc::from(Vec::new()),
            view: ViewState::default(),
            last_modified: None,
            status: LoadStatus::Loading,
            tz,
            per_page: PAGE_SIZE,
            export_prefix: DEFAULT_EXPORT_PREFIX.to_string(),
            collator: TextCollator::default(),
            deferred_page: None,
            render_pending: true,
        }
    }

    pub fn with_collation_locale(mut self, locale: &str) -> Self {
        self.collator = TextCollator::new(locale);
        self
    }

    pub fn with_export_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.export_prefix = prefix.into();
        self
    }

    pub fn records(&self) -> &[Course] {
        &self.records
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }

    pub fn render_pending(&self) -> bool {
        self.render_pending
    }

    /// Takes the result of the one load this session performs
    ///
    /// A failure leaves the record set empty and switches the display to the
    /// failure message; there is no automatic retry.
    pub fn install(&mut self, result: Result<LoadOutcome, LoadError>) {
        match result {
            Ok(outcome) => {
                info!(
                    "Installed {} courses ({:?})",
                    outcome.records.len(),
                    outcome.origin
                );
                self.records = outcome.records;
                self.last_modified = Some(outcome.last_modified);
                self.status = LoadStatus::Loaded;
                if let Some(action) = self.deferred_page.take() {
                    let total = total_pages(self.filtered().len(), self.per_page);
                    self.view.page = action.resolve(self.view.page, total);
                    debug!("Applied deferred page request, now on page {}", self.view.page);
                }
            }
            Err(e) => {
                error!("Failed to load course data: {}", e);
                self.records = Arc::from(Vec::new());
                self.last_modified = None;
                self.status = LoadStatus::Failed(e.to_string());
                self.deferred_page = None;
            }
        }
        self.render_pending = true;
    }

    /// Applies one view event; returns whether a render is now pending
    ///
    /// Export, stats and quit don't touch the view and are left to the caller.
    pub fn dispatch(&mut self, event: &UiEvent) -> bool {
        debug!("Dispatching {:?}", event);
        if !event.affects_view() {
            return self.render_pending;
        }

        match event {
            UiEvent::CategoryChanged(category) => {
                let mut criteria = self.view.criteria.clone();
                criteria.category = category.clone();
                self.view.set_criteria(criteria);
            }
            UiEvent::InstructorQuery(text) => {
                let mut criteria = self.view.criteria.clone();
                criteria.instructor = non_empty(text);
                self.view.set_criteria(criteria);
            }
            UiEvent::NameQuery(text) => {
                let mut criteria = self.view.criteria.clone();
                criteria.name = non_empty(text);
                self.view.set_criteria(criteria);
            }
            UiEvent::HeaderClicked(field) => {
                self.view.select_sort(*field);
            }
            UiEvent::Page(action) if self.status == LoadStatus::Loading => {
                self.deferred_page = Some(*action);
            }
            UiEvent::Page(action) => {
                let total = total_pages(self.filtered().len(), self.per_page);
                self.view.page = action.resolve(self.view.page, total);
            }
            UiEvent::Reset => {
                self.view.reset();
                self.deferred_page = None;
            }
            UiEvent::Export | UiEvent::Stats | UiEvent::Quit => {}
        }

        self.render_pending = true;
        true
    }

    /// Parses and applies one interactive command line
    ///
    /// View events only mark a render as pending. An export that fails or
    /// finds nothing to write is returned as an error; the session goes on.
    pub fn execute(
        &mut self,
        line: &str,
        now: DateTime<Utc>,
        exports: &dyn ExportTarget,
    ) -> AppResult<CommandOutcome> {
        let outcome = match line.parse::<UiEvent>()? {
            UiEvent::Quit => CommandOutcome::Quit,
            UiEvent::Export => CommandOutcome::Exported(self.export(now, exports)?),
            UiEvent::Stats => CommandOutcome::Stats(self.statistics(now)),
            event => {
                self.dispatch(&event);
                CommandOutcome::Applied
            }
        };
        Ok(outcome)
    }

    /// Courses passing the current filters, in original order
    pub fn filtered(&self) -> Vec<&Course> {
        FilterEngine::new(&self.view.criteria).apply(&self.records)
    }

    pub fn statistics(&self, now: DateTime<Utc>) -> Statistics {
        Statistics::compute(
            &self.records,
            &self.filtered(),
            now,
            self.last_modified,
            self.tz,
        )
    }

    /// Feeds the category selector; part of the startup phase after a load
    pub fn populate_filters(&self, target: &mut dyn RenderTarget) {
        let categories = distinct_categories(&self.records);
        debug!("Populating {} category options", categories.len());
        degrade("category options", target.add_category_options(&categories));
    }

    /// Renders if anything changed since the last flush; returns whether it did
    pub fn flush(&mut self, target: &mut dyn RenderTarget, now: DateTime<Utc>) -> bool {
        if !self.render_pending {
            return false;
        }
        self.render_pending = false;

        match self.status {
            LoadStatus::Loading => {
                degrade("loading indicator", target.show_loading());
                let stats = self.statistics(now);
                degrade("summary", target.set_summary(&stats));
            }
            LoadStatus::Failed(_) => {
                degrade(
                    "loading indicator",
                    target.show_load_failure(LOAD_FAILURE_MESSAGE),
                );
            }
            LoadStatus::Loaded => {
                degrade("loading indicator", target.hide_loading());
                self.render_view(target, now);
            }
        }

        degrade("present", target.present());
        true
    }

    fn render_view(&mut self, target: &mut dyn RenderTarget, now: DateTime<Utc>) {
        let records = Arc::clone(&self.records);
        let filtered = FilterEngine::new(&self.view.criteria).apply(&records);
        let ordered = sort_courses(&filtered, self.view.sort, &self.collator);
        let page = Paginated::new(&ordered, self.view.page, self.per_page);
        self.view.page = page.page;

        let renderer = TableRenderer::new(now.timestamp_millis());
        degrade(
            "table",
            render_table(target, &renderer, page.items, self.view.sort),
        );

        degrade("pagination", target.set_pagination(page.controls().as_ref()));

        let stats = Statistics::compute(
            &records,
            &filtered,
            now,
            self.last_modified,
            self.tz,
        );
        degrade("summary", target.set_summary(&stats));
    }

    /// Writes the filtered set (unsorted, unpaginated) as CSV
    ///
    /// An empty filtered set is skipped. Failures are logged here and
    /// returned; none of them affect the session.
    pub fn export(&self, now: DateTime<Utc>, target: &dyn ExportTarget) -> ExportResult<PathBuf> {
        let filtered = self.filtered();
        if filtered.is_empty() {
            info!("No courses match the current filters, skipping export");
            return Err(ExportError::Empty);
        }

        let result = CsvExporter::export(&filtered).and_then(|contents| {
            target.deliver(&export_file_name(&self.export_prefix, now, self.tz), &contents)
        });

        match &result {
            Ok(path) => info!("Exported {} courses to {}", filtered.len(), path.display()),
            Err(e) => warn!("Export failed: {}", e),
        }
        result
    }
}

fn render_table(
    target: &mut dyn RenderTarget,
    renderer: &TableRenderer,
    items: &[&Course],
    sort: Option<SortState>,
) -> RenderResult<()> {
    target.clear_table()?;
    target.set_sort_indicator(sort)?;
    if items.is_empty() {
        return target.show_no_results();
    }
    for course in items {
        target.append_row(&renderer.render_row(course))?;
    }
    Ok(())
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Rendering never stops the session: a missing element or a failed write
/// is logged and the pass continues with the next element
fn degrade(what: &str, result: RenderResult<()>) {
    match result {
        Ok(()) => {}
        Err(RenderError::TargetMissing { element }) => {
            warn!("Render target missing ({}), skipping {}", element, what);
        }
        Err(e) => error!("Rendering {} failed: {}", what, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use crate::field_registry::CourseField;
    use crate::ingestor::{LoadOrigin, Normalizer};
    use crate::models::{RawCourse, SortDirection, SortField};
    use crate::render::{Element, HeadlessRenderTarget};
    use crate::view::pagination::PageAction;
    use chrono::TimeZone;
    use std::cell::RefCell;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn outcome(count: usize) -> LoadOutcome {
        let normalizer = Normalizer::new(Tz::UTC);
        let records: Vec<Course> = (0..count)
            .map(|i| {
                normalizer.normalize(
                    &RawCourse::default()
                        .with("类别", if i % 2 == 0 { "A" } else { "B" })
                        .with("名称", &format!("course {i:02}"))
                        .with("学分", &(i % 5).to_string()),
                )
            })
            .collect();
        LoadOutcome {
            records: records.into(),
            last_modified: now(),
            origin: LoadOrigin::Source,
        }
    }

    fn loaded(count: usize) -> CourseBrowser {
        let mut browser = CourseBrowser::new(Tz::UTC);
        browser.install(Ok(outcome(count)));
        browser
    }

    fn names(target: &HeadlessRenderTarget) -> Vec<String> {
        target
            .rows
            .iter()
            .map(|row| row.cell(CourseField::Name).unwrap().text.clone())
            .collect()
    }

    #[test]
    fn test_loading_frame_before_install() {
        let mut browser = CourseBrowser::new(Tz::UTC);
        let mut target = HeadlessRenderTarget::new();
        assert!(browser.flush(&mut target, now()));
        assert!(target.loading);
        assert_eq!(target.summary.as_ref().unwrap().total, 0);
        assert!(target.rows.is_empty());
    }

    #[test]
    fn test_events_coalesce_into_one_render() {
        let mut browser = loaded(45);
        let mut target = HeadlessRenderTarget::new();
        browser.flush(&mut target, now());
        assert_eq!(target.frames, 1);
        assert!(!browser.dispatch(&UiEvent::Stats));

        browser.dispatch(&UiEvent::CategoryChanged(Some("A".to_string())));
        browser.dispatch(&UiEvent::HeaderClicked(SortField::Credit));
        browser.dispatch(&UiEvent::Page(PageAction::Next));
        assert!(browser.render_pending());
        assert!(browser.flush(&mut target, now()));
        assert!(!browser.render_pending());
        assert!(!browser.flush(&mut target, now()));
        assert_eq!(target.frames, 2);
    }

    #[test]
    fn test_first_page_and_controls() {
        let mut browser = loaded(45);
        let mut target = HeadlessRenderTarget::new();
        browser.flush(&mut target, now());

        assert_eq!(target.rows.len(), PAGE_SIZE);
        assert_eq!(names(&target)[0], "course 00");
        let controls = target.controls.clone().unwrap();
        assert_eq!(controls.total_pages, 3);
        assert_eq!(controls.window, vec![1, 2, 3]);
        let summary = target.summary.clone().unwrap();
        assert_eq!((summary.total, summary.filtered, summary.categories), (45, 45, 2));
    }

    #[test]
    fn test_page_actions_clamp() {
        let mut browser = loaded(45);
        browser.dispatch(&UiEvent::Page(PageAction::Goto(9)));
        assert_eq!(browser.view().page, 3);
        browser.dispatch(&UiEvent::Page(PageAction::Next));
        assert_eq!(browser.view().page, 3);

        let mut target = HeadlessRenderTarget::new();
        browser.flush(&mut target, now());
        assert_eq!(target.rows.len(), 5);
        assert_eq!(names(&target)[0], "course 40");
    }

    #[test]
    fn test_filter_change_resets_page_and_clamps_on_shrink() {
        let mut browser = loaded(45);
        browser.dispatch(&UiEvent::Page(PageAction::Last));
        assert_eq!(browser.view().page, 3);

        browser.dispatch(&UiEvent::NameQuery("course 1".to_string()));
        assert_eq!(browser.view().page, 1);

        let mut target = HeadlessRenderTarget::new();
        browser.flush(&mut target, now());
        assert_eq!(target.rows.len(), 10);
        assert!(target.controls.is_none());
    }

    #[test]
    fn test_sort_toggle_and_indicator() {
        let mut browser = loaded(10);
        browser.dispatch(&UiEvent::HeaderClicked(SortField::Credit));
        browser.dispatch(&UiEvent::HeaderClicked(SortField::Credit));

        let mut target = HeadlessRenderTarget::new();
        browser.flush(&mut target, now());
        assert_eq!(
            target.sort,
            Some(SortState {
                field: SortField::Credit,
                direction: SortDirection::Desc
            })
        );
        let credits: Vec<String> = target
            .rows
            .iter()
            .map(|row| row.cell(CourseField::Credit).unwrap().text.clone())
            .collect();
        assert_eq!(credits, vec!["4", "4", "3", "3", "2", "2", "1", "1", "0", "0"]);
    }

    #[test]
    fn test_no_results_notice() {
        let mut browser = loaded(5);
        browser.dispatch(&UiEvent::CategoryChanged(Some("Z".to_string())));
        let mut target = HeadlessRenderTarget::new();
        browser.flush(&mut target, now());
        assert!(target.no_results);
        assert!(target.rows.is_empty());
        assert!(target.controls.is_none());
        assert_eq!(target.summary.unwrap().filtered, 0);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut browser = loaded(45);
        browser.dispatch(&UiEvent::CategoryChanged(Some("B".to_string())));
        browser.dispatch(&UiEvent::HeaderClicked(SortField::EnrollmentDeadline));
        browser.dispatch(&UiEvent::Reset);
        assert_eq!(browser.view(), &ViewState::default());
    }

    #[test]
    fn test_load_failure_shows_fixed_message() {
        let mut browser = CourseBrowser::new(Tz::UTC);
        browser.install(Err(LoadError::network("http://x", "refused")));
        assert!(matches!(browser.status(), LoadStatus::Failed(_)));
        assert!(browser.records().is_empty());

        let mut target = HeadlessRenderTarget::new();
        browser.flush(&mut target, now());
        assert_eq!(target.failure.as_deref(), Some(LOAD_FAILURE_MESSAGE));
        assert!(!target.loading);
        assert_eq!(browser.statistics(now()), Statistics::default());
    }

    #[test]
    fn test_missing_elements_do_not_stop_render() {
        let mut browser = loaded(30);
        let mut target = HeadlessRenderTarget::new()
            .without(Element::Pagination)
            .without(Element::CategorySelect);

        browser.populate_filters(&mut target);
        assert!(browser.flush(&mut target, now()));
        assert_eq!(target.rows.len(), PAGE_SIZE);
        assert!(target.summary.is_some());
        assert_eq!(target.frames, 1);
    }

    #[test]
    fn test_populate_filters_first_seen_order() {
        let browser = loaded(4);
        let mut target = HeadlessRenderTarget::new();
        browser.populate_filters(&mut target);
        assert_eq!(target.category_options, vec!["A", "B"]);
    }

    struct CapturingTarget {
        delivered: RefCell<Vec<(String, Vec<u8>)>>,
    }

    impl ExportTarget for CapturingTarget {
        fn deliver(&self, file_name: &str, contents: &[u8]) -> ExportResult<PathBuf> {
            self.delivered
                .borrow_mut()
                .push((file_name.to_string(), contents.to_vec()));
            Ok(PathBuf::from(file_name))
        }
    }

    #[test]
    fn test_export_covers_all_filtered_rows() {
        let mut browser = loaded(45).with_export_prefix("picks");
        browser.dispatch(&UiEvent::CategoryChanged(Some("A".to_string())));
        browser.dispatch(&UiEvent::HeaderClicked(SortField::Credit));

        let target = CapturingTarget {
            delivered: RefCell::new(Vec::new()),
        };
        let path = browser.export(now(), &target).unwrap();
        assert_eq!(path, PathBuf::from("picks_2024-06-01.csv"));

        let delivered = target.delivered.borrow();
        let mut reader = csv::Reader::from_reader(delivered[0].1.as_slice());
        let names: Vec<String> = reader
            .records()
            .map(|r| r.unwrap()[2].to_string())
            .collect();
        assert_eq!(names.len(), 23);
        assert_eq!(names[0], "course 00");
        assert_eq!(names[1], "course 02");
    }

    #[test]
    fn test_empty_export_is_skipped() {
        let mut browser = loaded(3);
        browser.dispatch(&UiEvent::CategoryChanged(Some("none".to_string())));
        let target = CapturingTarget {
            delivered: RefCell::new(Vec::new()),
        };
        assert!(matches!(browser.export(now(), &target), Err(ExportError::Empty)));
        assert!(target.delivered.borrow().is_empty());
    }

    #[test]
    fn test_page_request_before_load_applies_after_install() {
        let mut browser = CourseBrowser::new(Tz::UTC);
        browser.dispatch(&UiEvent::CategoryChanged(Some("A".to_string())));
        browser.dispatch(&UiEvent::Page(PageAction::Goto(2)));
        assert_eq!(browser.view().page, 1);

        browser.install(Ok(outcome(45)));
        assert_eq!(browser.view().page, 2);

        let mut target = HeadlessRenderTarget::new();
        browser.flush(&mut target, now());
        assert_eq!(names(&target)[0], "course 40");
        assert_eq!(target.controls.unwrap().current, 2);
    }

    #[test]
    fn test_page_request_is_clamped_once_records_arrive() {
        let mut browser = CourseBrowser::new(Tz::UTC);
        browser.dispatch(&UiEvent::Page(PageAction::Goto(9)));
        browser.install(Ok(outcome(45)));
        assert_eq!(browser.view().page, 3);

        let mut failed = CourseBrowser::new(Tz::UTC);
        failed.dispatch(&UiEvent::Page(PageAction::Goto(3)));
        failed.install(Err(LoadError::network("http://x", "refused")));
        assert_eq!(failed.view().page, 1);
    }

    #[test]
    fn test_execute_commands() {
        let mut browser = loaded(45);
        let target = CapturingTarget {
            delivered: RefCell::new(Vec::new()),
        };

        assert!(matches!(
            browser.execute("category B", now(), &target).unwrap(),
            CommandOutcome::Applied
        ));
        assert!(browser.render_pending());
        match browser.execute("stats", now(), &target).unwrap() {
            CommandOutcome::Stats(stats) => assert_eq!((stats.total, stats.filtered), (45, 22)),
            other => panic!("unexpected outcome {:?}", other),
        }
        match browser.execute("export", now(), &target).unwrap() {
            CommandOutcome::Exported(path) => {
                assert_eq!(path, PathBuf::from("courses_2024-06-01.csv"))
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(matches!(
            browser.execute("quit", now(), &target).unwrap(),
            CommandOutcome::Quit
        ));
    }

    #[test]
    fn test_execute_reports_errors_without_ending_session() {
        let mut browser = loaded(3);
        let target = CapturingTarget {
            delivered: RefCell::new(Vec::new()),
        };

        let err = browser.execute("dance", now(), &target).unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));

        browser.execute("category none", now(), &target).unwrap();
        let err = browser.execute("export", now(), &target).unwrap_err();
        assert!(matches!(err, AppError::Export(ExportError::Empty)));
        assert!(target.delivered.borrow().is_empty());
    }
}
