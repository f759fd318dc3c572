//! Date spines for zero-filled daily series.
//!
//! A spine is every calendar day between two dates, built without looking
//! at the data. Counts are then joined onto it, so a day with no events
//! still produces a row with a count of zero.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tally_types::DailyCount;

/// Format used for day keys, both in SQL (`date()`) and in reports.
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Every day from `start` to `end` inclusive, ascending.
///
/// Empty when `start > end`.
pub fn date_spine(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start.iter_days().take_while(|day| *day <= end).collect()
}

/// Left-join `counts` (keyed by `YYYY-MM-DD`) onto `spine`.
///
/// Days absent from `counts` get zero; keys outside the spine are ignored.
pub fn zero_fill(spine: &[NaiveDate], counts: &BTreeMap<String, i64>) -> Vec<DailyCount> {
    spine
        .iter()
        .map(|day| {
            let date = day.format(DAY_FORMAT).to_string();
            let count = counts.get(&date).copied().unwrap_or(0);
            DailyCount { date, count }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn spine_is_inclusive_on_both_ends() {
        let spine = date_spine(day(2024, 1, 30), day(2024, 2, 2));
        assert_eq!(
            spine,
            vec![day(2024, 1, 30), day(2024, 1, 31), day(2024, 2, 1), day(2024, 2, 2)]
        );
    }

    #[test]
    fn spine_of_single_day() {
        assert_eq!(date_spine(day(2024, 5, 5), day(2024, 5, 5)).len(), 1);
    }

    #[test]
    fn inverted_spine_is_empty() {
        assert!(date_spine(day(2024, 5, 6), day(2024, 5, 5)).is_empty());
    }

    #[test]
    fn spine_crosses_leap_day() {
        let spine = date_spine(day(2024, 2, 28), day(2024, 3, 1));
        assert_eq!(spine.len(), 3);
        assert_eq!(spine[1], day(2024, 2, 29));
    }

    #[test]
    fn zero_fill_keeps_gaps() {
        let spine = date_spine(day(2024, 1, 1), day(2024, 1, 3));
        let mut counts = BTreeMap::new();
        counts.insert(String::from("2024-01-01"), 4);
        counts.insert(String::from("2024-01-03"), 1);
        counts.insert(String::from("2023-12-31"), 9);

        let filled = zero_fill(&spine, &counts);

        let pairs: Vec<(&str, i64)> = filled.iter().map(|d| (d.date.as_str(), d.count)).collect();
        assert_eq!(
            pairs,
            vec![("2024-01-01", 4), ("2024-01-02", 0), ("2024-01-03", 1)]
        );
    }
}
