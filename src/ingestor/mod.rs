//! Loading: source retrieval, normalization and the cache-or-fetch loader

pub mod loader;
pub mod normalizer;
pub mod source;

pub use loader::{DataLoader, LoadOrigin, LoadOutcome};
pub use normalizer::Normalizer;
pub use source::{source_for_location, CourseSource, FileCourseSource, HttpCourseSource, SourcePayload};
