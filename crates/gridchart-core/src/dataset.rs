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

//! In-memory timestamp-indexed table.
//!
//! The table is column oriented: one sorted timestamp vector plus one value
//! vector per named column. Normalization (sort, duplicate check, bucket
//! feature derivation) happens once in [`TimeSeriesTable::from_rows`]; nothing
//! mutates the table afterwards.

use std::collections::{HashMap, HashSet};
use std::ops::Range;

use chrono::NaiveDateTime;
use tracing::debug;

use crate::bucket::{BucketColumns, BucketFeature};
use crate::error::{LoadError, LoadResult};

/// One source row before normalization: timestamp plus one cell per column.
pub type RawRow = (NaiveDateTime, Vec<Option<f64>>);

#[derive(Debug, Clone)]
pub struct TimeSeriesTable {
    timestamps: Vec<NaiveDateTime>,
    column_names: Vec<String>,
    column_index: HashMap<String, usize>,
    values: Vec<Vec<Option<f64>>>,
    buckets: BucketColumns,
}

impl TimeSeriesTable {
    /// Build a table from unordered rows.
    ///
    /// Rows are sorted ascending by timestamp; duplicate timestamps and
    /// duplicate column names are rejected.
    pub fn from_rows(column_names: Vec<String>, mut rows: Vec<RawRow>) -> LoadResult<Self> {
        if column_names.is_empty() {
            return Err(LoadError::NoDataColumns);
        }

        let mut seen = HashSet::with_capacity(column_names.len());
        for name in &column_names {
            if !seen.insert(name.as_str()) {
                return Err(LoadError::DuplicateColumn(name.clone()));
            }
        }

        if let Some((_, cells)) = rows.iter().find(|(_, cells)| cells.len() != column_names.len())
        {
            return Err(LoadError::RowWidth {
                expected: column_names.len(),
                found: cells.len(),
            });
        }

        rows.sort_by_key(|(ts, _)| *ts);
        if let Some(pair) = rows.windows(2).find(|pair| pair[0].0 == pair[1].0) {
            return Err(LoadError::DuplicateTimestamp(pair[0].0));
        }

        let mut values = vec![Vec::with_capacity(rows.len()); column_names.len()];
        let mut timestamps = Vec::with_capacity(rows.len());
        for (ts, cells) in rows {
            timestamps.push(ts);
            for (column, cell) in values.iter_mut().zip(cells) {
                // NaN and infinities are missing readings
                column.push(cell.filter(|v| v.is_finite()));
            }
        }

        let buckets = BucketColumns::compute(&timestamps);
        let column_index = column_names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();

        debug!(
            rows = timestamps.len(),
            columns = column_names.len(),
            "Time series table built"
        );

        Ok(Self {
            timestamps,
            column_names,
            column_index,
            values,
            buckets,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    #[must_use]
    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    #[must_use]
    pub fn min_timestamp(&self) -> Option<NaiveDateTime> {
        self.timestamps.first().copied()
    }

    #[must_use]
    pub fn max_timestamp(&self) -> Option<NaiveDateTime> {
        self.timestamps.last().copied()
    }

    /// Data column names in source order (bucket features not included)
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.column_names
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index.contains_key(name)
    }

    /// Raw cells of one column, aligned with [`Self::timestamps`]
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.column_index
            .get(name)
            .map(|&i| self.values[i].as_slice())
    }

    /// Ordered `(timestamp, value)` pairs of one column
    pub fn column_values(
        &self,
        name: &str,
    ) -> Option<impl Iterator<Item = (NaiveDateTime, Option<f64>)> + '_> {
        let cells = self.column(name)?;
        Some(self.timestamps.iter().copied().zip(cells.iter().copied()))
    }

    /// Cached bucket keys for every row
    #[must_use]
    pub fn bucket_keys(&self, feature: BucketFeature) -> &[u8] {
        self.buckets.keys(feature)
    }

    /// Whole days between the first and last timestamp, plus one.
    ///
    /// Zero for an empty table.
    #[must_use]
    pub fn span_days(&self) -> i64 {
        match (self.min_timestamp(), self.max_timestamp()) {
            (Some(min), Some(max)) => (max - min).num_days() + 1,
            _ => 0,
        }
    }

    /// Index range of rows with `start <= timestamp < end`
    #[must_use]
    pub fn row_range(&self, start: NaiveDateTime, end: NaiveDateTime) -> Range<usize> {
        let lo = self.timestamps.partition_point(|ts| *ts < start);
        let hi = self.timestamps.partition_point(|ts| *ts < end).max(lo);
        lo..hi
    }
}
