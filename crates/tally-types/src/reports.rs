//! Report shapes produced by the aggregation queries.
//!
//! Field names are `snake_case` on the wire; these structs are serialized
//! as-is by the HTTP layer.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Totals for one site over a time range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SummaryReport {
    /// Number of matching events.
    #[ts(type = "number")]
    pub total_requests: i64,
    /// Number of distinct non-null IP addresses.
    #[ts(type = "number")]
    pub unique_visitors: i64,
    /// Events whose request type is `"static"` or absent.
    #[ts(type = "number")]
    pub total_website_requests: i64,
    /// Events whose request type is `"api"`.
    #[ts(type = "number")]
    pub total_server_requests: i64,
    /// Most frequent referrers, highest count first.
    pub top_referrers: Vec<ReferrerCount>,
}

/// One entry of [`SummaryReport::top_referrers`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ReferrerCount {
    /// Referrer URL, or `"(direct)"` for events without one.
    pub referrer: String,
    /// Number of events with this referrer.
    #[ts(type = "number")]
    pub count: i64,
}

/// Event count for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DailyCount {
    /// UTC calendar day formatted as `YYYY-MM-DD`.
    pub date: String,
    /// Number of events ingested on that day.
    #[ts(type = "number")]
    pub count: i64,
}

/// One bucket of a referrer, path, or country breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BreakdownRow {
    /// Attribute value, or its placeholder label when absent.
    pub key: String,
    /// Number of events in this bucket.
    #[ts(type = "number")]
    pub count: i64,
    /// Share of all matching events, rounded to two decimals.
    pub percentage: f64,
}
