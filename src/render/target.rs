//! Display surface abstraction
//!
//! A [`RenderTarget`] is the mutable surface the browser draws into: a table
//! body, a pagination bar, an append-only category selector and the summary
//! counters. Every operation may fail with [`RenderError::TargetMissing`]
//! when the surface lacks that element; callers log it and carry on.

use std::collections::HashSet;
use std::fmt;

use crate::errors::{RenderError, RenderResult};
use crate::models::SortState;
use crate::view::pagination::PageControls;
use crate::view::statistics::Statistics;

use super::table::DisplayRow;

/// Shown in place of the loading indicator when the data cannot be loaded
pub const LOAD_FAILURE_MESSAGE: &str = "加载数据失败，请刷新页面重试";

/// Addressable parts of a display surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Element {
    Table,
    Pagination,
    CategorySelect,
    Summary,
    LoadingIndicator,
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Table => "table",
            Self::Pagination => "pagination",
            Self::CategorySelect => "category select",
            Self::Summary => "summary",
            Self::LoadingIndicator => "loading indicator",
        };
        f.write_str(name)
    }
}

pub trait RenderTarget {
    fn clear_table(&mut self) -> RenderResult<()>;

    fn append_row(&mut self, row: &DisplayRow) -> RenderResult<()>;

    /// Replaces the table body with a "no results" notice
    fn show_no_results(&mut self) -> RenderResult<()>;

    /// Header indicator for the active sort column
    fn set_sort_indicator(&mut self, sort: Option<SortState>) -> RenderResult<()>;

    /// `None` hides the pagination bar
    fn set_pagination(&mut self, controls: Option<&PageControls>) -> RenderResult<()>;

    /// Appends options to the category selector, skipping ones already present
    fn add_category_options(&mut self, categories: &[String]) -> RenderResult<()>;

    fn set_summary(&mut self, stats: &Statistics) -> RenderResult<()>;

    fn show_loading(&mut self) -> RenderResult<()>;

    fn hide_loading(&mut self) -> RenderResult<()>;

    fn show_load_failure(&mut self, message: &str) -> RenderResult<()>;

    /// Called once at the end of a render pass
    fn present(&mut self) -> RenderResult<()> {
        Ok(())
    }
}

/// Keeps the last rendered frame in memory
///
/// Useful when embedding the browser without a terminal, and for asserting on
/// what a render pass produced. Elements can be removed to exercise the
/// missing-target path.
#[derive(Debug, Default)]
pub struct HeadlessRenderTarget {
    pub rows: Vec<DisplayRow>,
    pub no_results: bool,
    pub sort: Option<SortState>,
    pub controls: Option<PageControls>,
    pub category_options: Vec<String>,
    pub summary: Option<Statistics>,
    pub loading: bool,
    pub failure: Option<String>,
    /// Completed render passes
    pub frames: usize,
    missing: HashSet<Element>,
}

impl HeadlessRenderTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without(mut self, element: Element) -> Self {
        self.missing.insert(element);
        self
    }

    fn require(&self, element: Element) -> RenderResult<()> {
        if self.missing.contains(&element) {
            return Err(RenderError::target_missing(element.to_string()));
        }
        Ok(())
    }
}

impl RenderTarget for HeadlessRenderTarget {
    fn clear_table(&mut self) -> RenderResult<()> {
        self.require(Element::Table)?;
        self.rows.clear();
        self.no_results = false;
        Ok(())
    }

    fn append_row(&mut self, row: &DisplayRow) -> RenderResult<()> {
        self.require(Element::Table)?;
        self.rows.push(row.clone());
        Ok(())
    }

    fn show_no_results(&mut self) -> RenderResult<()> {
        self.require(Element::Table)?;
        self.rows.clear();
        self.no_results = true;
        Ok(())
    }

    fn set_sort_indicator(&mut self, sort: Option<SortState>) -> RenderResult<()> {
        self.require(Element::Table)?;
        self.sort = sort;
        Ok(())
    }

    fn set_pagination(&mut self, controls: Option<&PageControls>) -> RenderResult<()> {
        self.require(Element::Pagination)?;
        self.controls = controls.cloned();
        Ok(())
    }

    fn add_category_options(&mut self, categories: &[String]) -> RenderResult<()> {
        self.require(Element::CategorySelect)?;
        for category in categories {
            if !self.category_options.contains(category) {
                self.category_options.push(category.clone());
            }
        }
        Ok(())
    }

    fn set_summary(&mut self, stats: &Statistics) -> RenderResult<()> {
        self.require(Element::Summary)?;
        self.summary = Some(stats.clone());
        Ok(())
    }

    fn show_loading(&mut self) -> RenderResult<()> {
        self.require(Element::LoadingIndicator)?;
        self.loading = true;
        Ok(())
    }

    fn hide_loading(&mut self) -> RenderResult<()> {
        self.require(Element::LoadingIndicator)?;
        self.loading = false;
        Ok(())
    }

    fn show_load_failure(&mut self, message: &str) -> RenderResult<()> {
        self.require(Element::LoadingIndicator)?;
        self.loading = false;
        self.failure = Some(message.to_string());
        Ok(())
    }

    fn present(&mut self) -> RenderResult<()> {
        self.frames += 1;
        Ok(())
    }
}
