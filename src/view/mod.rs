//! The derived view: filter, sort, paginate and summarize the loaded courses

pub mod browser;
pub mod events;
pub mod filter_engine;
pub mod pagination;
pub mod sort_engine;
pub mod statistics;

pub use browser::{CommandOutcome, CourseBrowser, LoadStatus};
pub use events::{UiEvent, COMMAND_HELP};
pub use filter_engine::FilterEngine;
pub use pagination::{PageAction, PageControls, Paginated};
pub use sort_engine::{sort_courses, TextCollator};
pub use statistics::{distinct_categories, Statistics};
