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

//! Error and outcome types for the core crate

use chrono::NaiveDateTime;
use thiserror::Error;

/// Dataset could not be turned into a valid time-series table.
///
/// Fatal at startup: the server must not begin serving requests.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("dataset has no data columns besides the timestamp")]
    NoDataColumns,

    #[error("duplicate column name: {0}")]
    DuplicateColumn(String),

    #[error("row has {found} values, expected {expected}")]
    RowWidth { expected: usize, found: usize },

    #[error("invalid timestamp {value:?} on line {line}")]
    InvalidTimestamp { line: u64, value: String },

    #[error("duplicate timestamp: {0}")]
    DuplicateTimestamp(NaiveDateTime),

    #[error("column {0} contains no numeric values")]
    NonNumericColumn(String),
}

pub type LoadResult<T> = Result<T, LoadError>;

/// A window selection produced no rows.
///
/// Only an empty table (or an empty bounded range) can produce this; callers
/// receive it alongside the empty window instead of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("selected range contains no rows")]
pub struct EmptyRangeWarning;

/// Whitelist filtering removed every requested column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no valid columns selected")]
pub struct NoValidColumns;
