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

//! Renderer-agnostic chart series.
//!
//! A [`ChartSeriesDescriptor`] is what a renderer needs and nothing more:
//! per-series label, palette slot and x/y values, plus whether series stack.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};

use crate::aggregate::BucketAverages;
use crate::whitelist::ColumnSelection;
use crate::window::TableWindow;

/// Plotly's qualitative palette
pub const PLOTLY_COLORS: [&str; 10] = [
    "#636EFA", "#EF553B", "#00CC96", "#AB63FA", "#FFA15A", "#19D3F3", "#FF6692", "#B6E880",
    "#FF97FF", "#FECB52",
];

/// Non-empty list of series colors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<String>,
}

impl Palette {
    /// Returns `None` for an empty color list
    #[must_use]
    pub fn new(colors: Vec<String>) -> Option<Self> {
        (!colors.is_empty()).then_some(Self { colors })
    }

    #[must_use]
    pub fn plotly() -> Self {
        Self {
            colors: PLOTLY_COLORS.iter().map(|c| (*c).to_owned()).collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Color for a palette slot, wrapping around
    #[must_use]
    pub fn color(&self, index: usize) -> &str {
        &self.colors[index % self.colors.len()]
    }

    /// Endless `0, 1, .., len-1, 0, ..` slot sequence
    #[must_use]
    pub fn slots(&self) -> std::iter::Cycle<std::ops::Range<usize>> {
        (0..self.colors.len()).cycle()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::plotly()
    }
}

/// One x coordinate: a timestamp or a bucket key
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum XValue {
    Time(NaiveDateTime),
    Bucket(u8),
}

impl Serialize for XValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Time(ts) => serializer.collect_str(&ts.format("%Y-%m-%dT%H:%M:%S")),
            Self::Bucket(key) => serializer.serialize_u8(*key),
        }
    }
}

/// Series input before labels and colors are attached
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSeries {
    pub column: String,
    pub x: Vec<XValue>,
    pub y: Vec<Option<f64>>,
}

/// How missing cells of a windowed column become y values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingValues {
    /// Keep the gap (`null` for the renderer)
    Gap,
    /// Treat as contributing nothing
    Zero,
}

impl SourceSeries {
    /// Raw values of `column` over `window`, `None` when the column is unknown
    #[must_use]
    pub fn from_window(
        window: &TableWindow<'_>,
        column: &str,
        missing: MissingValues,
    ) -> Option<Self> {
        let cells = window.column(column)?;
        let y = match missing {
            MissingValues::Gap => cells.to_vec(),
            MissingValues::Zero => cells.iter().map(|c| Some(c.unwrap_or(0.0))).collect(),
        };
        Some(Self {
            column: column.to_owned(),
            x: window.timestamps().iter().copied().map(XValue::Time).collect(),
            y,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub column: String,
    pub label: String,
    pub color_index: usize,
    pub x: Vec<XValue>,
    pub y: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeriesDescriptor {
    pub stacked: bool,
    pub series: Vec<ChartSeries>,
}

impl ChartSeriesDescriptor {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|s| s.x.is_empty())
    }
}

/// Attach labels and palette slots to `sources`, in input order.
///
/// Series `i` gets palette slot `i mod palette.len()`.
#[must_use]
pub fn build_series(
    sources: Vec<SourceSeries>,
    labels: &HashMap<String, String>,
    palette: &Palette,
    stacked: bool,
) -> ChartSeriesDescriptor {
    let series = sources
        .into_iter()
        .zip(palette.slots())
        .map(|(source, color_index)| ChartSeries {
            label: labels
                .get(&source.column)
                .cloned()
                .unwrap_or_else(|| source.column.clone()),
            column: source.column,
            color_index,
            x: source.x,
            y: source.y,
        })
        .collect();

    ChartSeriesDescriptor { stacked, series }
}

/// Raw windowed values; missing cells stay gaps.
#[must_use]
pub fn line_series(
    window: &TableWindow<'_>,
    selection: &ColumnSelection,
    palette: &Palette,
    stacked: bool,
) -> ChartSeriesDescriptor {
    let sources = selection
        .columns
        .iter()
        .filter_map(|column| SourceSeries::from_window(window, column, MissingValues::Gap))
        .collect();
    build_series(sources, &selection.labels, palette, stacked)
}

/// Bucket averages, bucket keys on x.
#[must_use]
pub fn average_series(
    averages: &BucketAverages,
    selection: &ColumnSelection,
    palette: &Palette,
) -> ChartSeriesDescriptor {
    let sources = averages
        .series
        .iter()
        .map(|s| SourceSeries {
            column: s.column.clone(),
            x: s.points.iter().map(|(key, _)| XValue::Bucket(*key)).collect(),
            y: s.points.iter().map(|(_, mean)| Some(*mean)).collect(),
        })
        .collect();
    build_series(sources, &selection.labels, palette, false)
}

/// Stacked composition; missing cells count as zero.
#[must_use]
pub fn composition_series<S: AsRef<str>>(
    window: &TableWindow<'_>,
    columns: &[S],
    palette: &Palette,
) -> ChartSeriesDescriptor {
    let sources = columns
        .iter()
        .filter_map(|column| {
            SourceSeries::from_window(window, column.as_ref(), MissingValues::Zero)
        })
        .collect();
    build_series(sources, &HashMap::new(), palette, true)
}
