//! Error type definitions for the course browser
//!
//! The hierarchy mirrors the pipeline: loading, caching, rendering and
//! exporting each get their own enum. `AppError` covers what an interactive
//! command can report back to the user: bad input or a failed export.

use thiserror::Error;

/// Errors returned from an interactive command
#[derive(Error, Debug)]
pub enum AppError {
    /// Export errors
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Validation errors (bad user input such as an unknown command)
    #[error("Validation error: {message}")]
    Validation { message: String },
}

/// Load failure: the data set stays empty and the user sees a fixed message
#[derive(Error, Debug)]
pub enum LoadError {
    /// Network level failure talking to the source
    #[error("Request failed: {url} - {message}")]
    Network { url: String, message: String },

    /// The source answered with a non-success status
    #[error("HTTP error: {status} - {url}")]
    Http { status: u16, url: String },

    /// Local source file could not be read
    #[error("Failed to read {path}: {message}")]
    Io { path: String, message: String },

    /// The payload was not a JSON array of objects
    #[error("Malformed payload from {origin}: {message}")]
    MalformedPayload { origin: String, message: String },

    /// The background load task died before producing a result
    #[error("Load interrupted: {message}")]
    Interrupted { message: String },
}

/// Persistent cache errors
#[derive(Error, Debug)]
pub enum CacheError {
    /// Storage refused the write (quota exceeded, read-only, ...)
    #[error("Write failed for key '{key}': {message}")]
    WriteFailed { key: String, message: String },

    /// Storage could not be read
    #[error("Read failed for key '{key}': {message}")]
    ReadFailed { key: String, message: String },

    /// Stored entry could not be decoded
    #[error("Corrupt entry for key '{key}': {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Entry could not be encoded
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Display target errors
#[derive(Error, Debug)]
pub enum RenderError {
    /// The expected display element is not available
    #[error("Render target missing: {element}")]
    TargetMissing { element: String },

    /// Writing to the display surface failed
    #[error("Render output failed: {0}")]
    Output(#[from] std::io::Error),
}

/// Export errors
#[derive(Error, Debug)]
pub enum ExportError {
    /// Nothing to export
    #[error("Nothing to export: filtered set is empty")]
    Empty,

    /// CSV writer failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Delivering the document failed
    #[error("Failed to write {path}: {message}")]
    Delivery { path: String, message: String },
}

/// Convenience methods for creating common error types
impl AppError {
    /// Create a validation error with a custom message
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

impl LoadError {
    /// Create a network error
    pub fn network<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self::Network {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create an io error for a local source
    pub fn io<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::Io {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a malformed payload error
    pub fn malformed<O: Into<String>, M: Into<String>>(origin: O, message: M) -> Self {
        Self::MalformedPayload {
            origin: origin.into(),
            message: message.into(),
        }
    }

    /// Create an interrupted-load error
    pub fn interrupted<M: Into<String>>(message: M) -> Self {
        Self::Interrupted {
            message: message.into(),
        }
    }
}

impl CacheError {
    /// Create a write failure
    pub fn write_failed<K: Into<String>, M: Into<String>>(key: K, message: M) -> Self {
        Self::WriteFailed {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a read failure
    pub fn read_failed<K: Into<String>, M: Into<String>>(key: K, message: M) -> Self {
        Self::ReadFailed {
            key: key.into(),
            message: message.into(),
        }
    }
}

impl RenderError {
    /// Create a missing target error
    pub fn target_missing<E: Into<String>>(element: E) -> Self {
        Self::TargetMissing {
            element: element.into(),
        }
    }
}

impl ExportError {
    /// Create a delivery error
    pub fn delivery<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::Delivery {
            path: path.into(),
            message: message.into(),
        }
    }
}
