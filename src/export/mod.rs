//! CSV export of the filtered view
//!
//! The export always covers the whole filtered set (never just the visible
//! page) and carries the display strings verbatim. Every value is quoted;
//! embedded quotes are doubled by the csv writer.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use csv::{QuoteStyle, WriterBuilder};
use std::path::PathBuf;
use tracing::debug;

use crate::errors::{ExportError, ExportResult};
use crate::field_registry::FieldRegistry;
use crate::models::Course;
use crate::utils::datetime::DateTimeParser;

pub struct CsvExporter;

impl CsvExporter {
    /// Header row followed by one row per course, in input order
    pub fn export(courses: &[&Course]) -> ExportResult<Vec<u8>> {
        let registry = FieldRegistry::global();

        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        writer.write_record(registry.export_headers())?;

        for course in courses {
            writer.write_record(
                registry
                    .export_fields()
                    .map(|field| course.display(field).unwrap_or("")),
            )?;
        }

        writer.flush().map_err(csv::Error::from)?;
        let output = writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))?;

        Ok(output)
    }
}

/// `<prefix>_<YYYY-MM-DD>.csv`, dated in the display time zone
pub fn export_file_name(prefix: &str, now: DateTime<Utc>, tz: Tz) -> String {
    format!("{}_{}.csv", prefix, DateTimeParser::format_date(&now, tz))
}

/// Where a finished export document goes
pub trait ExportTarget {
    /// Hand over the document; returns where it ended up
    fn deliver(&self, file_name: &str, contents: &[u8]) -> ExportResult<PathBuf>;
}

/// Writes exports as files into one directory, creating it on demand
pub struct DirectoryExportTarget {
    directory: PathBuf,
}

impl DirectoryExportTarget {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

impl ExportTarget for DirectoryExportTarget {
    fn deliver(&self, file_name: &str, contents: &[u8]) -> ExportResult<PathBuf> {
        std::fs::create_dir_all(&self.directory).map_err(|e| {
            ExportError::delivery(self.directory.display().to_string(), e.to_string())
        })?;

        let path = self.directory.join(file_name);
        std::fs::write(&path, contents)
            .map_err(|e| ExportError::delivery(path.display().to_string(), e.to_string()))?;

        debug!("Wrote {} bytes to {}", contents.len(), path.display());
        Ok(path)
    }
}
