//! Terminal rendition of the course table
//!
//! Operations only update the pending frame; [`RenderTarget::present`]
//! writes it out in one go so a render pass never interleaves with logs.

use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use std::io::Write;

use crate::errors::RenderResult;
use crate::field_registry::TABLE_COLUMNS;
use crate::models::{SortDirection, SortState};
use crate::view::pagination::PageControls;
use crate::view::statistics::Statistics;

use super::table::DisplayRow;
use super::target::RenderTarget;

pub struct TerminalRenderTarget<W: Write> {
    out: W,
    color: bool,
    rows: Vec<DisplayRow>,
    no_results: bool,
    sort: Option<SortState>,
    controls: Option<PageControls>,
    summary: Option<Statistics>,
    categories: Vec<String>,
    categories_announced: bool,
    loading: bool,
    failure: Option<String>,
}

impl<W: Write> TerminalRenderTarget<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self {
            out,
            color,
            rows: Vec::new(),
            no_results: false,
            sort: None,
            controls: None,
            summary: None,
            categories: Vec::new(),
            categories_announced: false,
            loading: false,
            failure: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn header_label(&self, index: usize) -> String {
        let field = TABLE_COLUMNS[index];
        let label = field.display_name();
        match self.sort {
            Some(state) if state.field.course_field() == field => match state.direction {
                SortDirection::Asc => format!("{label} ▲"),
                SortDirection::Desc => format!("{label} ▼"),
            },
            _ => label.to_string(),
        }
    }

    fn build_table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header((0..TABLE_COLUMNS.len()).map(|i| self.header_label(i)));

        if self.color {
            table.enforce_styling();
        } else {
            table.force_no_tty();
        }

        for row in &self.rows {
            let dim_row = row.deemphasized();
            table.add_row(row.cells.iter().map(|cell| {
                let mut out = Cell::new(&cell.text);
                if cell.muted {
                    out = out.fg(Color::DarkGrey).add_attribute(Attribute::Italic);
                } else if dim_row {
                    out = out.add_attribute(Attribute::Dim);
                }
                out
            }));
        }
        table
    }

    fn summary_line(&self, stats: &Statistics) -> String {
        let mut parts = vec![
            format!("Total {}", stats.total),
            format!("Shown {}", stats.filtered),
            format!("Open {}", stats.open),
            format!("Categories {}", stats.categories),
        ];
        if let Some(updated) = &stats.last_modified {
            parts.push(format!("Updated {updated}"));
        }
        let line = parts.join("  ·  ");
        if self.color {
            line.bold().to_string()
        } else {
            line
        }
    }

    fn pagination_line(&self, controls: &PageControls) -> String {
        let mut parts = Vec::with_capacity(controls.window.len() + 3);
        if controls.has_previous {
            parts.push("‹ prev".to_string());
        }
        for &page in &controls.window {
            if page == controls.current {
                let current = format!("[{page}]");
                parts.push(if self.color {
                    current.cyan().bold().to_string()
                } else {
                    current
                });
            } else {
                parts.push(page.to_string());
            }
        }
        if controls.has_next {
            parts.push("next ›".to_string());
        }
        parts.push(format!("(page {}/{})", controls.current, controls.total_pages));
        parts.join(" ")
    }
}

impl<W: Write> RenderTarget for TerminalRenderTarget<W> {
    fn clear_table(&mut self) -> RenderResult<()> {
        self.rows.clear();
        self.no_results = false;
        Ok(())
    }

    fn append_row(&mut self, row: &DisplayRow) -> RenderResult<()> {
        self.rows.push(row.clone());
        Ok(())
    }

    fn show_no_results(&mut self) -> RenderResult<()> {
        self.rows.clear();
        self.no_results = true;
        Ok(())
    }

    fn set_sort_indicator(&mut self, sort: Option<SortState>) -> RenderResult<()> {
        self.sort = sort;
        Ok(())
    }

    fn set_pagination(&mut self, controls: Option<&PageControls>) -> RenderResult<()> {
        self.controls = controls.cloned();
        Ok(())
    }

    fn add_category_options(&mut self, categories: &[String]) -> RenderResult<()> {
        for category in categories {
            if !self.categories.contains(category) {
                self.categories.push(category.clone());
                self.categories_announced = false;
            }
        }
        Ok(())
    }

    fn set_summary(&mut self, stats: &Statistics) -> RenderResult<()> {
        self.summary = Some(stats.clone());
        Ok(())
    }

    fn show_loading(&mut self) -> RenderResult<()> {
        self.loading = true;
        Ok(())
    }

    fn hide_loading(&mut self) -> RenderResult<()> {
        self.loading = false;
        Ok(())
    }

    fn show_load_failure(&mut self, message: &str) -> RenderResult<()> {
        self.loading = false;
        self.failure = Some(message.to_string());
        Ok(())
    }

    fn present(&mut self) -> RenderResult<()> {
        if let Some(message) = &self.failure {
            let line = if self.color {
                message.red().bold().to_string()
            } else {
                message.clone()
            };
            writeln!(self.out, "{line}")?;
            return Ok(self.out.flush()?);
        }

        if self.loading {
            writeln!(self.out, "Loading courses…")?;
        }

        if !self.categories_announced && !self.categories.is_empty() {
            writeln!(self.out, "Categories: {}", self.categories.join(" | "))?;
            self.categories_announced = true;
        }

        if let Some(stats) = &self.summary {
            writeln!(self.out, "{}", self.summary_line(stats))?;
        }

        if self.no_results {
            writeln!(self.out, "No matching courses.")?;
        } else if !self.rows.is_empty() {
            writeln!(self.out, "{}", self.build_table())?;
        }

        if let Some(controls) = &self.controls {
            writeln!(self.out, "{}", self.pagination_line(controls))?;
        }

        self.out.flush()?;
        Ok(())
    }
}
