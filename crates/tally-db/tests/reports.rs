//! Integration tests for the aggregation reports.
//!
//! Each test seeds a fresh `SQLite` file and checks one report shape,
//! including its behavior on an empty range.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    clippy::float_cmp,
    clippy::missing_panics_doc
)]

use chrono::{DateTime, TimeZone, Utc};
use tally_db::{DbError, StoreConfig, TrafficDb};
use tally_types::{BreakdownRow, SiteId, SummaryReport, TimeRange, TrafficEventInput};
use tempfile::TempDir;

const SITE: &str = "example.com";

// =============================================================================
// Helpers
// =============================================================================

async fn open_store() -> (TempDir, TrafficDb) {
    let dir = TempDir::new().expect("temp dir");
    let db = TrafficDb::open(StoreConfig::new(dir.path().join("tally.db")))
        .await
        .expect("store should open");
    (dir, db)
}

fn site() -> SiteId {
    SiteId::new(SITE)
}

fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

/// Range covering 2024-01-01T00:00Z through 2024-01-07T23:59:59.999Z.
fn first_week() -> TimeRange {
    TimeRange::new(
        utc(2024, 1, 1, 0).timestamp_millis(),
        utc(2024, 1, 8, 0).timestamp_millis() - 1,
    )
    .unwrap()
}

fn at_noon(day: u32) -> i64 {
    utc(2024, 1, day, 12).timestamp_millis()
}

fn page_view(path: Option<&str>, referrer: Option<&str>, country: Option<&str>) -> TrafficEventInput {
    TrafficEventInput {
        path: path.map(String::from),
        referrer: referrer.map(String::from),
        country: country.map(String::from),
        timestamp: Some(at_noon(2)),
        ..TrafficEventInput::new(SITE)
    }
}

fn assert_breakdown_totals(rows: &[BreakdownRow], total: i64) {
    let count: i64 = rows.iter().map(|r| r.count).sum();
    assert_eq!(count, total);
    let percentage: f64 = rows.iter().map(|r| r.percentage).sum();
    assert!(
        (percentage - 100.0).abs() < 0.05,
        "percentages summed to {percentage}"
    );
}

// =============================================================================
// Summary stats
// =============================================================================

#[tokio::test]
async fn summary_of_empty_store_is_all_zero() {
    let (_dir, db) = open_store().await;
    let report = db.summary_stats(&site(), first_week()).await.unwrap();
    assert_eq!(report, SummaryReport::default());
    assert!(report.top_referrers.is_empty());
}

#[tokio::test]
async fn summary_classifies_website_and_server_requests() {
    let (_dir, db) = open_store().await;

    let untyped = TrafficEventInput {
        timestamp: Some(at_noon(2)),
        ..TrafficEventInput::new(SITE)
    };
    let api = TrafficEventInput {
        request_type: Some(String::from("api")),
        ..untyped.clone()
    };
    let static_page = TrafficEventInput {
        request_type: Some(String::from("static")),
        ..untyped.clone()
    };
    let other = TrafficEventInput {
        request_type: Some(String::from("websocket")),
        ..untyped.clone()
    };
    for input in [&untyped, &api, &static_page, &other] {
        db.append(input).await.unwrap();
    }

    let report = db.summary_stats(&site(), first_week()).await.unwrap();
    assert_eq!(report.total_requests, 4);
    assert_eq!(report.total_website_requests, 2);
    assert_eq!(report.total_server_requests, 1);
}

#[tokio::test]
async fn summary_counts_distinct_non_null_visitors() {
    let (_dir, db) = open_store().await;
    for ip in [Some("10.0.0.1"), Some("10.0.0.1"), Some("10.0.0.2"), None] {
        let input = TrafficEventInput {
            ip_address: ip.map(String::from),
            timestamp: Some(at_noon(3)),
            ..TrafficEventInput::new(SITE)
        };
        db.append(&input).await.unwrap();
    }

    let report = db.summary_stats(&site(), first_week()).await.unwrap();
    assert_eq!(report.total_requests, 4);
    assert_eq!(report.unique_visitors, 2);
}

#[tokio::test]
async fn summary_lists_top_ten_referrers_with_direct_label() {
    let (_dir, db) = open_store().await;

    // 12 distinct referrers; ref-0 gets the most hits.
    for n in 0..12_u32 {
        let hits = if n == 0 { 5 } else { 1 };
        for _ in 0..hits {
            let referrer = format!("https://ref-{n:02}.example");
            db.append(&page_view(None, Some(referrer.as_str()), None)).await.unwrap();
        }
    }
    for _ in 0..3 {
        db.append(&page_view(None, None, None)).await.unwrap();
    }

    let report = db.summary_stats(&site(), first_week()).await.unwrap();
    assert_eq!(report.top_referrers.len(), 10);
    assert_eq!(report.top_referrers[0].referrer, "https://ref-00.example");
    assert_eq!(report.top_referrers[0].count, 5);
    assert_eq!(report.top_referrers[1].referrer, "(direct)");
    assert_eq!(report.top_referrers[1].count, 3);
    assert!(report
        .top_referrers
        .windows(2)
        .all(|pair| pair[0].count >= pair[1].count));
}

#[tokio::test]
async fn summary_ignores_other_sites_and_out_of_range_events() {
    let (_dir, db) = open_store().await;
    db.append(&page_view(None, None, None)).await.unwrap();

    let other_site = TrafficEventInput {
        timestamp: Some(at_noon(2)),
        ..TrafficEventInput::new("other.example")
    };
    db.append(&other_site).await.unwrap();

    let too_late = TrafficEventInput {
        timestamp: Some(utc(2024, 1, 9, 0).timestamp_millis()),
        ..TrafficEventInput::new(SITE)
    };
    db.append(&too_late).await.unwrap();

    let report = db.summary_stats(&site(), first_week()).await.unwrap();
    assert_eq!(report.total_requests, 1);
}

// =============================================================================
// Daily views
// =============================================================================

#[tokio::test]
async fn daily_views_zero_fill_every_day_of_the_range() {
    let (_dir, db) = open_store().await;
    db.append_at(&page_view(Some("/"), None, None), utc(2024, 1, 2, 9))
        .await
        .unwrap();
    db.append_at(&page_view(Some("/"), None, None), utc(2024, 1, 2, 18))
        .await
        .unwrap();
    db.append_at(&page_view(Some("/"), None, None), utc(2024, 1, 5, 23))
        .await
        .unwrap();

    let days = db.daily_views(&site(), first_week()).await.unwrap();

    let pairs: Vec<(&str, i64)> = days.iter().map(|d| (d.date.as_str(), d.count)).collect();
    assert_eq!(
        pairs,
        vec![
            ("2024-01-01", 0),
            ("2024-01-02", 2),
            ("2024-01-03", 0),
            ("2024-01-04", 0),
            ("2024-01-05", 1),
            ("2024-01-06", 0),
            ("2024-01-07", 0),
        ]
    );
}

#[tokio::test]
async fn daily_views_of_empty_store_still_has_one_row_per_day() {
    let (_dir, db) = open_store().await;
    let days = db.daily_views(&site(), first_week()).await.unwrap();
    assert_eq!(days.len(), 7);
    assert!(days.iter().all(|d| d.count == 0));
}

#[tokio::test]
async fn daily_views_bucket_by_ingestion_day_not_event_time() {
    let (_dir, db) = open_store().await;
    // Event time on Jan 2, ingested on Jan 4.
    db.append_at(&page_view(None, None, None), utc(2024, 1, 4, 10))
        .await
        .unwrap();

    let days = db.daily_views(&site(), first_week()).await.unwrap();
    assert_eq!(days[1].date, "2024-01-02");
    assert_eq!(days[1].count, 0);
    assert_eq!(days[3].date, "2024-01-04");
    assert_eq!(days[3].count, 1);
}

#[tokio::test]
async fn daily_views_by_path_filters_to_one_path() {
    let (_dir, db) = open_store().await;
    db.append_at(&page_view(Some("/pricing"), None, None), utc(2024, 1, 3, 8))
        .await
        .unwrap();
    db.append_at(&page_view(Some("/docs"), None, None), utc(2024, 1, 3, 9))
        .await
        .unwrap();
    db.append_at(&page_view(Some("/pricing"), None, None), utc(2024, 1, 6, 9))
        .await
        .unwrap();

    let days = db
        .daily_views_by_path(&site(), first_week(), "/pricing")
        .await
        .unwrap();

    assert_eq!(days.len(), 7);
    let total: i64 = days.iter().map(|d| d.count).sum();
    assert_eq!(total, 2);
    assert_eq!(days[2].count, 1);
    assert_eq!(days[5].count, 1);
}

#[tokio::test]
async fn single_instant_range_yields_one_day() {
    let (_dir, db) = open_store().await;
    let instant = TimeRange::new(at_noon(3), at_noon(3)).unwrap();
    let days = db.daily_views(&site(), instant).await.unwrap();
    assert_eq!(days.len(), 1);
    assert_eq!(days[0].date, "2024-01-03");
}

#[tokio::test]
async fn daily_views_reject_ranges_wider_than_the_limit() {
    let (_dir, db) = open_store().await;
    let years_1_to_9999 = TimeRange::new(-62_135_596_800_000, 253_402_300_799_999).unwrap();

    let result = db.daily_views(&site(), years_1_to_9999).await;
    assert!(matches!(result, Err(DbError::InvalidQuery(_))));

    let result = db
        .daily_views_by_path(&site(), years_1_to_9999, "/")
        .await;
    assert!(matches!(result, Err(DbError::InvalidQuery(_))));

    // Summary reports are not bounded by the day limit.
    assert!(db.summary_stats(&site(), years_1_to_9999).await.is_ok());
}

// =============================================================================
// Breakdowns
// =============================================================================

#[tokio::test]
async fn breakdowns_are_empty_when_nothing_matches() {
    let (_dir, db) = open_store().await;
    assert!(db.referrer_breakdown(&site(), first_week()).await.unwrap().is_empty());
    assert!(db.path_breakdown(&site(), first_week()).await.unwrap().is_empty());
    assert!(db.country_breakdown(&site(), first_week()).await.unwrap().is_empty());
}

#[tokio::test]
async fn referrer_breakdown_coalesces_missing_referrer() {
    let (_dir, db) = open_store().await;
    db.append(&page_view(None, Some("https://news.example"), None)).await.unwrap();
    db.append(&page_view(None, Some("https://news.example"), None)).await.unwrap();
    db.append(&page_view(None, None, None)).await.unwrap();

    let rows = db.referrer_breakdown(&site(), first_week()).await.unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].key, "https://news.example");
    assert_eq!(rows[0].count, 2);
    assert_eq!(rows[0].percentage, 66.67);
    assert_eq!(rows[1].key, "(direct)");
    assert_eq!(rows[1].percentage, 33.33);
    assert_breakdown_totals(&rows, 3);
}

#[tokio::test]
async fn path_breakdown_coalesces_missing_path() {
    let (_dir, db) = open_store().await;
    for path in [Some("/"), Some("/"), Some("/docs"), None] {
        db.append(&page_view(path, None, None)).await.unwrap();
    }

    let rows = db.path_breakdown(&site(), first_week()).await.unwrap();

    let keys: Vec<&str> = rows.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, vec!["/", "(no path)", "/docs"]);
    assert_eq!(rows[0].percentage, 50.0);
    assert_breakdown_totals(&rows, 4);
}

#[tokio::test]
async fn country_breakdown_coalesces_missing_country() {
    let (_dir, db) = open_store().await;
    for country in [Some("DE"), Some("US"), Some("US"), None, Some("FR"), Some("US"), None] {
        db.append(&page_view(None, None, country)).await.unwrap();
    }

    let rows = db.country_breakdown(&site(), first_week()).await.unwrap();

    assert_eq!(rows[0].key, "US");
    assert_eq!(rows[0].count, 3);
    assert_eq!(rows[1].key, "(unknown)");
    assert_eq!(rows[1].count, 2);
    assert!(rows.windows(2).all(|pair| pair[0].count >= pair[1].count));
    assert_breakdown_totals(&rows, 7);
}
