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

//! CSV data source for [`TimeSeriesTable`].
//!
//! Layout: the first column holds the timestamp, every other column is a
//! numeric series. Offset-aware timestamps lose their offset and keep the
//! wall-clock time.

use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::{info, warn};

use crate::dataset::{RawRow, TimeSeriesTable};
use crate::error::{LoadError, LoadResult};

const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%S%z",
];

const NAIVE_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const MISSING_MARKERS: [&str; 5] = ["nan", "null", "none", "na", "n/a"];

/// Parsed timestamp plus whether the source carried an offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedTimestamp {
    pub naive: NaiveDateTime,
    pub had_offset: bool,
}

/// Parse one timestamp cell.
///
/// Offset-aware values are converted to their local wall-clock time with the
/// offset dropped.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<ParsedTimestamp> {
    let s = raw.trim();

    let aware = DateTime::parse_from_rfc3339(s).ok().or_else(|| {
        OFFSET_FORMATS
            .iter()
            .find_map(|fmt| DateTime::parse_from_str(s, fmt).ok())
    });
    if let Some(dt) = aware {
        return Some(ParsedTimestamp {
            naive: dt.naive_local(),
            had_offset: true,
        });
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|naive| ParsedTimestamp {
            naive,
            had_offset: false,
        })
}

/// Outcome of parsing one numeric cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell {
    Value(f64),
    /// Empty or an explicit missing marker such as `NaN`
    Missing,
    /// Text that is not a finite number
    Invalid,
}

#[must_use]
pub fn parse_cell(raw: &str) -> Cell {
    let s = raw.trim();
    if s.is_empty() || MISSING_MARKERS.iter().any(|m| s.eq_ignore_ascii_case(m)) {
        return Cell::Missing;
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Cell::Value(v),
        Ok(_) | Err(_) => Cell::Invalid,
    }
}

/// Load a table from a CSV file on disk.
pub fn load_csv_path(path: impl AsRef<Path>) -> LoadResult<TimeSeriesTable> {
    let path = path.as_ref();
    info!(path = %path.display(), "Loading dataset");
    let file = std::fs::File::open(path)?;
    load_csv_reader(file)
}

/// Load a table from any CSV reader.
pub fn load_csv_reader<R: Read>(reader: R) -> LoadResult<TimeSeriesTable> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let column_names: Vec<String> = headers.iter().skip(1).map(ToOwned::to_owned).collect();
    if column_names.is_empty() {
        return Err(LoadError::NoDataColumns);
    }

    let mut rows: Vec<RawRow> = Vec::new();
    let mut numeric = vec![0_usize; column_names.len()];
    let mut invalid = vec![0_usize; column_names.len()];
    let mut offset_aware = 0_usize;

    for result in csv_reader.records() {
        let record = result?;
        let line = record.position().map_or(0, csv::Position::line);

        let raw_ts = record.get(0).unwrap_or_default();
        let parsed = parse_timestamp(raw_ts).ok_or_else(|| LoadError::InvalidTimestamp {
            line,
            value: raw_ts.to_owned(),
        })?;
        if parsed.had_offset {
            offset_aware += 1;
        }

        let cells = record
            .iter()
            .skip(1)
            .enumerate()
            .map(|(i, raw)| match parse_cell(raw) {
                Cell::Value(v) => {
                    numeric[i] += 1;
                    Some(v)
                }
                Cell::Missing => None,
                Cell::Invalid => {
                    invalid[i] += 1;
                    None
                }
            })
            .collect();

        rows.push((parsed.naive, cells));
    }

    for (i, name) in column_names.iter().enumerate() {
        if invalid[i] == 0 {
            continue;
        }
        if numeric[i] == 0 {
            return Err(LoadError::NonNumericColumn(name.clone()));
        }
        warn!(
            column = %name,
            invalid = invalid[i],
            "Non-numeric cells treated as missing"
        );
    }

    if offset_aware > 0 {
        info!(
            count = offset_aware,
            "Timezone offsets dropped, timestamps kept as local wall-clock time"
        );
    }

    let table = TimeSeriesTable::from_rows(column_names, rows)?;
    info!(
        rows = table.len(),
        columns = table.columns().len(),
        span_days = table.span_days(),
        "Dataset loaded"
    );
    Ok(table)
}
