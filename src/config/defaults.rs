/// Configuration default values
///
/// All defaults live here so they can be changed in one place.
// Source defaults
pub const DEFAULT_SOURCE_PATH: &str = "./data.json";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = "Course-Browser/1.0";

// Cache defaults
pub const DEFAULT_CACHE_ENABLED: bool = true;
pub const DEFAULT_CACHE_DIRECTORY: &str = "./data/cache";
pub const DEFAULT_CACHE_FRESHNESS_SECS: u64 = 60 * 60;

// Display defaults
pub const DEFAULT_TIMEZONE: &str = "UTC";
pub const DEFAULT_COLOR: bool = true;
pub const DEFAULT_COLLATION_LOCALE: &str = "zh";

// Export defaults
pub const DEFAULT_EXPORT_DIRECTORY: &str = "./exports";
pub const DEFAULT_EXPORT_PREFIX: &str = "courses";

// Pagination is fixed, not configurable
pub const PAGE_SIZE: usize = 20;
