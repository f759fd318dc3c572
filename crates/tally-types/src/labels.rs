//! Fixed labels shared by the store and its callers.
//!
//! Null attributes are stored as `NULL`. Reports substitute these labels
//! when grouping so a missing value still shows up as its own bucket.

/// Bucket label for events without a referrer.
pub const DIRECT_REFERRER: &str = "(direct)";

/// Bucket label for events without a path.
pub const NO_PATH: &str = "(no path)";

/// Bucket label for events without a country.
pub const UNKNOWN_COUNTRY: &str = "(unknown)";

/// `requestType` value of static website requests.
///
/// Events with no request type are counted as website requests too.
pub const REQUEST_TYPE_STATIC: &str = "static";

/// `requestType` value of server API requests.
pub const REQUEST_TYPE_API: &str = "api";

/// Number of referrers listed in a summary report.
pub const TOP_REFERRER_LIMIT: u32 = 10;

/// Number of events returned by a latest-events lookup.
pub const LATEST_EVENTS_LIMIT: u32 = 100;

/// Default number of events fetched per cursor batch.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Widest daily series a report will build, in days (about ten years).
///
/// The series has one row per day, so wider ranges are rejected instead
/// of materialized.
pub const MAX_DAILY_SPAN_DAYS: i64 = 3_660;
