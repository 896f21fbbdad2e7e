// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of gridchart.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Trailing-window and bounded-range selection over a [`TimeSeriesTable`].
//!
//! Two day-counting conventions exist and are kept apart:
//!
//! - [`WindowMode::Inclusive`]: `cutoff = max - (days - 1)`, rows `>= cutoff`.
//!   Counting the day of the last timestamp as day one.
//! - [`WindowMode::Sliding`]: `cutoff = max - days`, rows `> cutoff`. Exactly
//!   `days * 24h` of data ending at the last timestamp.
//!
//! Selection never fails: day counts are clamped to `1..=span` and an empty
//! result is reported through [`TableWindow::empty_warning`].

use std::ops::Range;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::bucket::BucketFeature;
use crate::dataset::TimeSeriesTable;
use crate::error::EmptyRangeWarning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowMode {
    Inclusive,
    Sliding,
}

/// Requested trailing day count, as received from the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowRequest {
    pub day_count: i64,
}

impl WindowRequest {
    #[must_use]
    pub fn new(day_count: i64) -> Self {
        Self { day_count }
    }

    /// Day count after clamping to `1..=span_days`.
    ///
    /// An empty table (span 0) still yields 1.
    #[must_use]
    pub fn clamped(self, span_days: i64) -> i64 {
        self.day_count.clamp(1, span_days.max(1))
    }
}

/// Contiguous row range of a table
#[derive(Debug, Clone)]
pub struct TableWindow<'a> {
    table: &'a TimeSeriesTable,
    rows: Range<usize>,
    day_count: Option<i64>,
}

impl<'a> TableWindow<'a> {
    #[must_use]
    pub fn full(table: &'a TimeSeriesTable) -> Self {
        Self::with_rows(table, 0..table.len(), None)
    }

    fn with_rows(table: &'a TimeSeriesTable, rows: Range<usize>, day_count: Option<i64>) -> Self {
        let window = Self {
            table,
            rows,
            day_count,
        };
        if window.is_empty() {
            warn!(?day_count, "Window selection produced no rows");
        }
        window
    }

    #[must_use]
    pub fn table(&self) -> &'a TimeSeriesTable {
        self.table
    }

    #[must_use]
    pub fn rows(&self) -> Range<usize> {
        self.rows.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Effective (clamped) day count for trailing windows
    #[must_use]
    pub fn day_count(&self) -> Option<i64> {
        self.day_count
    }

    #[must_use]
    pub fn empty_warning(&self) -> Option<EmptyRangeWarning> {
        self.is_empty().then_some(EmptyRangeWarning)
    }

    #[must_use]
    pub fn timestamps(&self) -> &'a [NaiveDateTime] {
        &self.table.timestamps()[self.rows.clone()]
    }

    #[must_use]
    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.timestamps().first().copied()
    }

    #[must_use]
    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.timestamps().last().copied()
    }

    /// Cells of one column restricted to the window
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&'a [Option<f64>]> {
        self.table
            .column(name)
            .map(|cells| &cells[self.rows.clone()])
    }

    #[must_use]
    pub fn bucket_keys(&self, feature: BucketFeature) -> &'a [u8] {
        &self.table.bucket_keys(feature)[self.rows.clone()]
    }
}

/// Select the trailing `request.day_count` days ending at the table's last
/// timestamp.
#[must_use]
pub fn select_trailing_window(
    table: &TimeSeriesTable,
    request: WindowRequest,
    mode: WindowMode,
) -> TableWindow<'_> {
    let Some(max) = table.max_timestamp() else {
        return TableWindow::with_rows(table, 0..0, None);
    };

    let span = table.span_days();
    let days = request.clamped(span);
    if days != request.day_count {
        debug!(
            requested = request.day_count,
            clamped = days,
            span,
            "Day count clamped"
        );
    }

    // A request covering the whole span returns the whole table
    if days >= span {
        return TableWindow::with_rows(table, 0..table.len(), Some(days));
    }

    let timestamps = table.timestamps();
    let start = match mode {
        WindowMode::Inclusive => {
            let cutoff = max - Duration::days(days - 1);
            timestamps.partition_point(|ts| *ts < cutoff)
        }
        WindowMode::Sliding => {
            let cutoff = max - Duration::days(days);
            timestamps.partition_point(|ts| *ts <= cutoff)
        }
    };

    debug!(?mode, days, rows = table.len() - start, "Trailing window selected");
    TableWindow::with_rows(table, start..table.len(), Some(days))
}

/// Rows with `start <= timestamp < end`
#[must_use]
pub fn select_range(
    table: &TimeSeriesTable,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> TableWindow<'_> {
    TableWindow::with_rows(table, table.row_range(start, end), None)
}

/// All rows falling on one calendar day
#[must_use]
pub fn select_day(table: &TimeSeriesTable, date: NaiveDate) -> TableWindow<'_> {
    let start = date.and_time(chrono::NaiveTime::MIN);
    let end = start
        .checked_add_signed(Duration::days(1))
        .unwrap_or(NaiveDateTime::MAX);
    select_range(table, start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hourly_table(days: i64) -> TimeSeriesTable {
        let origin = NaiveDate::from_ymd_opt(2015, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let rows = (0..days * 24)
            .map(|h| (origin + Duration::hours(h), vec![Some(1.0)]))
            .collect();
        TimeSeriesTable::from_rows(vec!["a".to_owned()], rows).unwrap()
    }

    #[test]
    fn test_clamp_day_count() {
        assert_eq!(WindowRequest::new(0).clamped(30), 1);
        assert_eq!(WindowRequest::new(-5).clamped(30), 1);
        assert_eq!(WindowRequest::new(7).clamped(30), 7);
        assert_eq!(WindowRequest::new(100_000).clamped(30), 30);
        assert_eq!(WindowRequest::new(3).clamped(0), 1);
    }

    #[test]
    fn test_inclusive_cutoff() {
        let table = hourly_table(5);
        let window = select_trailing_window(&table, WindowRequest::new(2), WindowMode::Inclusive);
        let max = table.max_timestamp().unwrap();

        // max - 1 day, inclusive of the cutoff row
        assert_eq!(window.first_timestamp(), Some(max - Duration::days(1)));
        assert_eq!(window.last_timestamp(), Some(max));
        assert_eq!(window.len(), 25);
        assert_eq!(window.day_count(), Some(2));
    }

    #[test]
    fn test_sliding_cutoff_excludes_boundary() {
        let table = hourly_table(5);
        let window = select_trailing_window(&table, WindowRequest::new(3), WindowMode::Sliding);
        let max = table.max_timestamp().unwrap();

        assert_eq!(window.len(), 72);
        assert_eq!(
            window.first_timestamp(),
            Some(max - Duration::days(3) + Duration::hours(1))
        );
        assert_eq!(window.last_timestamp(), Some(max));
    }

    #[test]
    fn test_modes_differ_for_same_count() {
        let table = hourly_table(5);
        let inclusive =
            select_trailing_window(&table, WindowRequest::new(3), WindowMode::Inclusive);
        let sliding = select_trailing_window(&table, WindowRequest::new(3), WindowMode::Sliding);
        assert_eq!(inclusive.len(), 49);
        assert_eq!(sliding.len(), 72);
    }

    #[test]
    fn test_oversized_request_returns_full_table() {
        let table = hourly_table(30);
        for mode in [WindowMode::Inclusive, WindowMode::Sliding] {
            let window = select_trailing_window(&table, WindowRequest::new(100_000), mode);
            assert_eq!(window.len(), table.len());
            assert_eq!(window.day_count(), Some(30));
        }
    }

    #[test]
    fn test_zero_days_clamps_to_one() {
        let table = hourly_table(5);
        let window = select_trailing_window(&table, WindowRequest::new(0), WindowMode::Inclusive);
        assert_eq!(window.day_count(), Some(1));
        // cutoff == max, only the last row
        assert_eq!(window.len(), 1);

        let sliding = select_trailing_window(&table, WindowRequest::new(0), WindowMode::Sliding);
        assert_eq!(sliding.len(), 24);
    }

    #[test]
    fn test_empty_table_reports_warning() {
        let table = TimeSeriesTable::from_rows(vec!["a".to_owned()], vec![]).unwrap();
        let window = select_trailing_window(&table, WindowRequest::new(3), WindowMode::Sliding);
        assert!(window.is_empty());
        assert_eq!(window.empty_warning(), Some(EmptyRangeWarning));
    }

    #[test]
    fn test_non_empty_window_has_no_warning() {
        let table = hourly_table(2);
        let window = select_trailing_window(&table, WindowRequest::new(1), WindowMode::Sliding);
        assert_eq!(window.empty_warning(), None);
    }

    #[test]
    fn test_select_day_at_calendar_limit() {
        let table = hourly_table(2);
        let last = NaiveDate::parse_from_str(
            &NaiveDate::MAX.format("%Y-%m-%d").to_string(),
            "%Y-%m-%d",
        )
        .unwrap();

        let day = select_day(&table, last);
        assert!(day.is_empty());
    }

    #[test]
    fn test_select_day() {
        let table = hourly_table(3);
        let day = select_day(&table, NaiveDate::from_ymd_opt(2015, 1, 2).unwrap());
        assert_eq!(day.len(), 24);
        assert_eq!(
            day.first_timestamp(),
            NaiveDate::from_ymd_opt(2015, 1, 2).unwrap().and_hms_opt(0, 0, 0)
        );

        let outside = select_day(&table, NaiveDate::from_ymd_opt(2016, 1, 1).unwrap());
        assert!(outside.empty_warning().is_some());
    }

    #[test]
    fn test_window_slices_columns_and_buckets() {
        let table = hourly_table(2);
        let window = select_trailing_window(&table, WindowRequest::new(1), WindowMode::Sliding);
        assert_eq!(window.column("a").unwrap().len(), 24);
        assert!(window.column("b").is_none());
        let hours = window.bucket_keys(BucketFeature::HourOfDay);
        assert_eq!(hours.first(), Some(&0));
        assert_eq!(hours.last(), Some(&23));
    }
}
