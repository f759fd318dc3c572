//! Core entity structs: the stored [`TrafficEvent`], the ingest payload
//! [`TrafficEventInput`], and the inclusive [`TimeRange`] reports are
//! computed over.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::SiteId;

// ---------------------------------------------------------------------------
// TrafficEvent
// ---------------------------------------------------------------------------

/// One observed request (page view or API call), as stored.
///
/// Events are immutable once written. The `id` is assigned by the store and
/// increases strictly with insertion order; it is never reused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct TrafficEvent {
    /// Store-assigned sequence number.
    #[ts(type = "number")]
    pub id: i64,
    /// The site this event belongs to.
    pub site_id: SiteId,
    /// Requested path.
    pub path: Option<String>,
    /// Client user agent.
    pub user_agent: Option<String>,
    /// Client IP address, used for unique-visitor counting.
    pub ip_address: Option<String>,
    /// Client country.
    pub country: Option<String>,
    /// Client city.
    pub city: Option<String>,
    /// Referring URL.
    pub referrer: Option<String>,
    /// Request class: `"static"`, `"api"`, or absent.
    pub request_type: Option<String>,
    /// Event time in milliseconds since the Unix epoch.
    #[ts(type = "number")]
    pub timestamp: i64,
    /// Ingestion time in seconds since the Unix epoch.
    #[ts(type = "number")]
    pub created_at: i64,
}

// ---------------------------------------------------------------------------
// TrafficEventInput
// ---------------------------------------------------------------------------

/// Ingest payload for a single event.
///
/// Every attribute except `site_id` is optional. A missing `timestamp`
/// defaults to the ingestion time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct TrafficEventInput {
    /// The site this event belongs to. Must not be blank.
    pub site_id: SiteId,
    /// Requested path.
    #[serde(default)]
    pub path: Option<String>,
    /// Client user agent.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Client IP address.
    #[serde(default)]
    pub ip_address: Option<String>,
    /// Client country.
    #[serde(default)]
    pub country: Option<String>,
    /// Client city.
    #[serde(default)]
    pub city: Option<String>,
    /// Referring URL.
    #[serde(default)]
    pub referrer: Option<String>,
    /// Request class: `"static"`, `"api"`, or absent.
    #[serde(default)]
    pub request_type: Option<String>,
    /// Event time in milliseconds since the Unix epoch.
    #[serde(default)]
    #[ts(type = "number | null")]
    pub timestamp: Option<i64>,
}

impl TrafficEventInput {
    /// Create an input for `site_id` with every optional attribute absent.
    pub fn new(site_id: impl Into<SiteId>) -> Self {
        Self {
            site_id: site_id.into(),
            ..Self::default()
        }
    }

    /// Replace empty or whitespace-only attributes with `None`.
    ///
    /// Reports group `NULL` values under fixed labels, so an empty string
    /// must never reach the store in place of an absent value.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            site_id: self.site_id,
            path: non_blank(self.path),
            user_agent: non_blank(self.user_agent),
            ip_address: non_blank(self.ip_address),
            country: non_blank(self.country),
            city: non_blank(self.city),
            referrer: non_blank(self.referrer),
            request_type: non_blank(self.request_type),
            timestamp: self.timestamp,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ---------------------------------------------------------------------------
// TimeRange
// ---------------------------------------------------------------------------

/// Inclusive range of event times, in milliseconds since the Unix epoch.
///
/// Construction guarantees `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeRange {
    start: i64,
    end: i64,
}

impl TimeRange {
    /// Build a range, returning `None` when `start > end`.
    pub const fn new(start: i64, end: i64) -> Option<Self> {
        if start > end {
            None
        } else {
            Some(Self { start, end })
        }
    }

    /// Inclusive lower bound in milliseconds.
    pub const fn start(self) -> i64 {
        self.start
    }

    /// Inclusive upper bound in milliseconds.
    pub const fn end(self) -> i64 {
        self.end
    }

    /// Whether `timestamp` falls within the range.
    pub const fn contains(self, timestamp: i64) -> bool {
        self.start <= timestamp && timestamp <= self.end
    }

    /// UTC calendar date of the lower bound.
    ///
    /// `None` when the bound lies outside the representable date range.
    pub fn start_date(self) -> Option<NaiveDate> {
        DateTime::from_timestamp_millis(self.start).map(|dt| dt.date_naive())
    }

    /// UTC calendar date of the upper bound.
    pub fn end_date(self) -> Option<NaiveDate> {
        DateTime::from_timestamp_millis(self.end).map(|dt| dt.date_naive())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn inverted_range_is_rejected() {
        assert!(TimeRange::new(10, 5).is_none());
        assert!(TimeRange::new(5, 5).is_some());
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let range = TimeRange::new(100, 200).unwrap();
        assert!(range.contains(100));
        assert!(range.contains(200));
        assert!(!range.contains(99));
        assert!(!range.contains(201));
    }

    #[test]
    fn range_dates_use_utc_days() {
        // 2024-03-01T23:59:59.999Z .. 2024-03-02T00:00:00.000Z
        let range = TimeRange::new(1_709_337_599_999, 1_709_337_600_000).unwrap();
        assert_eq!(range.start_date(), NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(range.end_date(), NaiveDate::from_ymd_opt(2024, 3, 2));
    }

    #[test]
    fn normalized_drops_blank_attributes() {
        let input = TrafficEventInput {
            path: Some(String::from("/pricing")),
            referrer: Some(String::new()),
            country: Some(String::from("  ")),
            ..TrafficEventInput::new("example.com")
        }
        .normalized();

        assert_eq!(input.path.as_deref(), Some("/pricing"));
        assert_eq!(input.referrer, None);
        assert_eq!(input.country, None);
    }

    #[test]
    fn input_deserializes_with_missing_fields() {
        let input: TrafficEventInput =
            serde_json::from_str(r#"{"siteId":"example.com","requestType":"api"}"#)
                .unwrap();
        assert_eq!(input.site_id.as_str(), "example.com");
        assert_eq!(input.request_type.as_deref(), Some("api"));
        assert_eq!(input.timestamp, None);
        assert_eq!(input.path, None);
    }

    #[test]
    fn event_serializes_in_camel_case() {
        let event = TrafficEvent {
            id: 7,
            site_id: SiteId::new("example.com"),
            path: None,
            user_agent: None,
            ip_address: Some(String::from("10.0.0.1")),
            country: None,
            city: None,
            referrer: None,
            request_type: None,
            timestamp: 1_000,
            created_at: 1,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["siteId"], "example.com");
        assert_eq!(json["ipAddress"], "10.0.0.1");
        assert_eq!(json["createdAt"], 1);
        assert!(json["referrer"].is_null());
    }
}
