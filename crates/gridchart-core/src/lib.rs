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

//! Time-window selection and aggregation for gridchart
//!
//! This crate holds everything between the raw generation dataset and the
//! chart renderer:
//!
//! - **Dataset Store**: timezone-naive, strictly ascending table with cached
//!   hour-of-day, day-of-week and month bucket keys
//! - **Window Selector**: trailing N-day windows in inclusive or sliding mode
//! - **Whitelist Filter**: restricts requested columns to an approved subset
//! - **Aggregator**: per-bucket means of arbitrary columns
//! - **Series Assembler**: renderer-agnostic series with palette coloring
//!
//! # Example
//!
//! ```ignore
//! use gridchart_core::{
//!     BucketFeature, TableWindow, WindowMode, WindowRequest, average_by_bucket,
//!     load_csv_path, select_trailing_window,
//! };
//!
//! let table = load_csv_path("data/generation.csv")?;
//! let window = select_trailing_window(&table, WindowRequest::new(7), WindowMode::Sliding);
//! let averages = average_by_bucket(&window, &["generation_solar"], BucketFeature::HourOfDay);
//! ```

pub mod aggregate;
pub mod bucket;
pub mod dataset;
pub mod error;
pub mod export;
pub mod series;
pub mod snapshot;
pub mod source;
pub mod whitelist;
pub mod window;

// Re-exports for convenience
pub use aggregate::{BucketAverages, BucketSeries, average_by_bucket};
pub use bucket::{BucketFeature, UnknownBucketFeature};
pub use dataset::TimeSeriesTable;
pub use error::{EmptyRangeWarning, LoadError, LoadResult, NoValidColumns};
pub use export::write_window_csv;
pub use series::{
    ChartSeries, ChartSeriesDescriptor, Palette, XValue, average_series, build_series,
    composition_series, line_series,
};
pub use snapshot::{DatasetSnapshot, SnapshotHandle};
pub use source::{load_csv_path, load_csv_reader};
pub use whitelist::{ColumnSelection, ColumnWhitelist, CompositionRules, filter_to_whitelist};
pub use window::{
    TableWindow, WindowMode, WindowRequest, select_day, select_range, select_trailing_window,
};
