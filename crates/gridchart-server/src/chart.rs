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

//! Chart pipelines and Chart.js rendering glue.
//!
//! Each pipeline runs Window -> Whitelist -> (Aggregator) -> Series Assembler
//! against one snapshot and returns a [`ChartView`]. The HTML pages turn a
//! view into a Chart.js configuration; the JSON API returns it as is.

use std::collections::BTreeSet;

use gridchart_core::{
    ChartSeriesDescriptor, DatasetSnapshot, NoValidColumns, Palette, TableWindow, WindowMode,
    WindowRequest, XValue, average_by_bucket, average_series, composition_series,
    filter_to_whitelist, line_series, select_day, select_trailing_window,
};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::request::{AveragePlotRequest, CompositionPlotRequest, LinePlotRequest};

pub const COMPOSITION_TITLE: &str = "Generation Composition";
const TIME_AXIS_TITLE: &str = "Time";
const LINE_Y_TITLE: &str = "MW";
const COMPOSITION_Y_TITLE: &str = "Power (MW)";

/// Everything a renderer needs for one chart
#[derive(Debug, Clone, Serialize)]
pub struct ChartView {
    pub title: String,
    pub x_title: String,
    pub y_title: String,
    /// Clamped trailing day count, when the chart covers a trailing window
    pub day_count: Option<i64>,
    /// Table rows that went into the chart
    pub rows: usize,
    #[serde(flatten)]
    pub descriptor: ChartSeriesDescriptor,
}

impl ChartView {
    /// True when the selected range contained no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.descriptor.is_empty()
    }
}

/// Line and average charts are titled with the plotted columns
fn joined_title(columns: &[String]) -> String {
    columns.join(", ")
}

/// Raw values over a sliding window, or over a single day when `date` is set
pub fn line_chart(
    snapshot: &DatasetSnapshot,
    request: &LinePlotRequest,
    palette: &Palette,
) -> Result<ChartView, NoValidColumns> {
    let selection = request.selection.restrict_to(&snapshot.plottable)?;
    let window = match request.date {
        Some(date) => select_day(&snapshot.table, date),
        None => select_trailing_window(
            &snapshot.table,
            WindowRequest::new(request.days),
            WindowMode::Sliding,
        ),
    };

    let descriptor = line_series(&window, &selection, palette, request.stacked);
    info!(
        columns = ?selection.columns,
        days = ?window.day_count(),
        rows = window.len(),
        stacked = request.stacked,
        "Line chart built"
    );

    Ok(ChartView {
        title: joined_title(&selection.columns),
        x_title: TIME_AXIS_TITLE.to_owned(),
        y_title: LINE_Y_TITLE.to_owned(),
        day_count: window.day_count(),
        rows: window.len(),
        descriptor,
    })
}

/// Per-bucket means, over the whole table unless a day count is given
pub fn average_chart(
    snapshot: &DatasetSnapshot,
    request: &AveragePlotRequest,
    palette: &Palette,
) -> Result<ChartView, NoValidColumns> {
    let selection = request.selection.restrict_to(&snapshot.plottable)?;
    let window = match request.days {
        Some(days) => select_trailing_window(
            &snapshot.table,
            WindowRequest::new(days),
            WindowMode::Sliding,
        ),
        None => TableWindow::full(&snapshot.table),
    };

    let averages = average_by_bucket(&window, &selection.columns, request.feature);
    let descriptor = average_series(&averages, &selection, palette);
    info!(
        columns = ?selection.columns,
        feature = %request.feature,
        rows = window.len(),
        "Average chart built"
    );

    Ok(ChartView {
        title: joined_title(&selection.columns),
        x_title: request.feature.title().to_owned(),
        y_title: LINE_Y_TITLE.to_owned(),
        day_count: window.day_count(),
        rows: window.len(),
        descriptor,
    })
}

/// Stacked composition of whitelisted generation columns
pub fn composition_chart(
    snapshot: &DatasetSnapshot,
    request: &CompositionPlotRequest,
    palette: &Palette,
) -> Result<ChartView, NoValidColumns> {
    let columns = filter_to_whitelist(&request.columns, &snapshot.composition)?;
    let window = select_trailing_window(
        &snapshot.table,
        WindowRequest::new(request.days),
        WindowMode::Inclusive,
    );

    let descriptor = composition_series(&window, &columns, palette);
    info!(
        columns = ?columns,
        days = ?window.day_count(),
        rows = window.len(),
        "Composition chart built"
    );

    Ok(ChartView {
        title: COMPOSITION_TITLE.to_owned(),
        x_title: TIME_AXIS_TITLE.to_owned(),
        y_title: COMPOSITION_Y_TITLE.to_owned(),
        day_count: window.day_count(),
        rows: window.len(),
        descriptor,
    })
}

fn x_label(x: &XValue) -> String {
    match x {
        XValue::Time(ts) => ts.format("%Y-%m-%d %H:%M").to_string(),
        XValue::Bucket(key) => key.to_string(),
    }
}

/// Chart.js configuration for a view.
///
/// Category labels are the sorted union of all x values, so series with
/// different bucket sets still line up. Stacked views become filled areas
/// on a stacked y axis; otherwise every series is an independent line.
#[must_use]
pub fn chartjs_config(view: &ChartView, palette: &Palette) -> Value {
    let stacked = view.descriptor.stacked;
    let labels: Vec<String> = view
        .descriptor
        .series
        .iter()
        .flat_map(|s| s.x.iter().copied())
        .collect::<BTreeSet<XValue>>()
        .iter()
        .map(x_label)
        .collect();

    let datasets: Vec<Value> = view
        .descriptor
        .series
        .iter()
        .enumerate()
        .map(|(i, series)| {
            let color = palette.color(series.color_index);
            let data: Vec<Value> = series
                .x
                .iter()
                .zip(&series.y)
                .map(|(x, y)| json!({ "x": x_label(x), "y": y }))
                .collect();
            let border_width = if stacked { 0.5 } else { 2.0 };
            let point_radius = if matches!(series.x.first(), Some(XValue::Bucket(_))) {
                3
            } else {
                0
            };
            let fill = match (stacked, i) {
                (false, _) => json!(false),
                (true, 0) => json!("origin"),
                (true, _) => json!("-1"),
            };
            json!({
                "label": series.label,
                "data": data,
                "borderColor": color,
                "backgroundColor": color,
                "borderWidth": border_width,
                "pointRadius": point_radius,
                "fill": fill,
                "spanGaps": false,
            })
        })
        .collect();

    debug!(
        series = datasets.len(),
        labels = labels.len(),
        stacked,
        "Chart.js config built"
    );

    json!({
        "type": "line",
        "data": { "labels": labels, "datasets": datasets },
        "options": {
            "responsive": true,
            "maintainAspectRatio": false,
            "interaction": { "mode": "index", "intersect": false },
            "plugins": {
                "title": { "display": true, "text": view.title },
                "legend": { "position": "top" },
            },
            "scales": {
                "x": { "title": { "display": true, "text": view.x_title } },
                "y": {
                    "stacked": stacked,
                    "title": { "display": true, "text": view.y_title },
                },
            },
        },
    })
}

/// Serialize a config for embedding inside a `<script>` element
#[must_use]
pub fn script_json(config: &Value) -> String {
    config.to_string().replace("</", "<\\/")
}
