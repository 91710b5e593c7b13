//! Centralized error handling for the course browser
//!
//! This module unifies the error types used across the data pipeline and
//! gives every layer a consistent way to report failures.
//!
//! # Error Categories
//!
//! - **Load Errors**: retrieval or payload failures, surfaced to the user
//! - **Cache Errors**: persistent cache reads/writes, always non-fatal
//! - **Render Errors**: a display target is missing or cannot be written
//! - **Export Errors**: CSV serialization or file delivery failures
//!
//! Malformed individual fields are never errors: the normalizer degrades
//! them to defaults instead.
//!
//! # Usage
//!
//! ```rust
//! use course_browser::errors::{AppError, AppResult};
//!
//! fn example_function() -> AppResult<String> {
//!     Ok("success".to_string())
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for loader Results
pub type LoadResult<T> = Result<T, LoadError>;

/// Convenience type alias for cache Results
pub type CacheResult<T> = Result<T, CacheError>;

/// Convenience type alias for render Results
pub type RenderResult<T> = Result<T, RenderError>;

/// Convenience type alias for export Results
pub type ExportResult<T> = Result<T, ExportError>;
