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

//! JSON API and CSV export.

use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::Json;
use gridchart_core::{
    BucketFeature, NoValidColumns, WindowMode, WindowRequest, filter_to_whitelist,
    select_trailing_window, write_window_csv,
};
use serde::Serialize;
use tracing::{debug, error, info};

use crate::AppState;
use crate::chart::{self, ChartView};
use crate::request::{
    AveragePlotBody, BoundaryError, CompositionPlotBody, ExportRequest, FormFields, LinePlotBody,
};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Error body for every non-2xx API response
#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: String,
}

#[derive(Debug)]
pub enum ApiError {
    /// Malformed request, caught before the core runs
    Rejected(BoundaryError),
    /// Whitelist filtering left nothing to plot
    NoValidColumns,
    Internal(String),
}

impl From<BoundaryError> for ApiError {
    fn from(err: BoundaryError) -> Self {
        Self::Rejected(err)
    }
}

impl From<NoValidColumns> for ApiError {
    fn from(_: NoValidColumns) -> Self {
        Self::NoValidColumns
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Rejected(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Self::NoValidColumns => (
                StatusCode::UNPROCESSABLE_ENTITY,
                crate::pages::NO_VALID_COLUMNS.to_owned(),
            ),
            Self::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        debug!(%status, error = %message, "API request failed");
        (status, Json(ApiErrorBody { error: message })).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct FeatureInfo {
    pub name: &'static str,
    pub title: &'static str,
    pub domain: [u8; 2],
}

/// Response for GET /api/columns
#[derive(Debug, Serialize)]
pub struct ColumnsResponse {
    pub columns: Vec<String>,
    pub composition_columns: Vec<String>,
    pub time_features: Vec<FeatureInfo>,
    pub rows: usize,
    pub span_days: i64,
    pub first_timestamp: Option<String>,
    pub last_timestamp: Option<String>,
}

/// GET /api/columns - dataset shape and whitelists
#[expect(clippy::unused_async, reason = "axum handler must be async")]
pub async fn columns_handler(State(state): State<AppState>) -> Json<ColumnsResponse> {
    let snapshot = state.snapshot();
    let table = &snapshot.table;
    let fmt = |ts: Option<chrono::NaiveDateTime>| ts.map(|t| t.format(TIMESTAMP_FORMAT).to_string());

    Json(ColumnsResponse {
        columns: snapshot.plottable.columns().to_vec(),
        composition_columns: snapshot.composition.columns().to_vec(),
        time_features: BucketFeature::ALL
            .into_iter()
            .map(|f| FeatureInfo {
                name: f.name(),
                title: f.title(),
                domain: [*f.domain().start(), *f.domain().end()],
            })
            .collect(),
        rows: table.len(),
        span_days: table.span_days(),
        first_timestamp: fmt(table.min_timestamp()),
        last_timestamp: fmt(table.max_timestamp()),
    })
}

/// POST /api/plot - line chart descriptor
#[expect(clippy::unused_async, reason = "axum handler must be async")]
pub async fn plot_handler(
    State(state): State<AppState>,
    Json(body): Json<LinePlotBody>,
) -> Result<Json<ChartView>, ApiError> {
    let request = body.into_request(state.config.charts.default_days)?;
    let view = chart::line_chart(&state.snapshot(), &request, &state.palette)?;
    Ok(Json(view))
}

/// POST /api/avg_plot - bucket average descriptor
#[expect(clippy::unused_async, reason = "axum handler must be async")]
pub async fn avg_plot_handler(
    State(state): State<AppState>,
    Json(body): Json<AveragePlotBody>,
) -> Result<Json<ChartView>, ApiError> {
    let request = body.into_request()?;
    let view = chart::average_chart(&state.snapshot(), &request, &state.palette)?;
    Ok(Json(view))
}

/// POST /api/composition_plot - stacked composition descriptor
#[expect(clippy::unused_async, reason = "axum handler must be async")]
pub async fn composition_plot_handler(
    State(state): State<AppState>,
    Json(body): Json<CompositionPlotBody>,
) -> Result<Json<ChartView>, ApiError> {
    let request = body.into_request(state.config.charts.default_days)?;
    let view = chart::composition_chart(&state.snapshot(), &request, &state.palette)?;
    Ok(Json(view))
}

/// GET /api/export - sliding window as a CSV download
#[expect(clippy::unused_async, reason = "axum handler must be async")]
pub async fn export_handler(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    let request =
        ExportRequest::from_query(&FormFields::from(pairs), state.config.charts.default_days)?;
    let snapshot = state.snapshot();
    let columns = filter_to_whitelist(&request.columns, &snapshot.plottable)?;
    let window = select_trailing_window(
        &snapshot.table,
        WindowRequest::new(request.days),
        WindowMode::Sliding,
    );

    let mut body = Vec::new();
    let rows = write_window_csv(&window, &columns, &mut body).map_err(|e| {
        error!(error = %e, "Failed to write CSV export");
        ApiError::Internal("Failed to write CSV export".to_owned())
    })?;

    let stamp = window
        .last_timestamp()
        .map_or_else(|| "empty".to_owned(), |ts| ts.format("%Y%m%d_%H%M%S").to_string());
    let filename = format!("gridchart_export_{stamp}.csv");
    info!(columns = ?columns, rows, filename = %filename, "CSV export");

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/csv; charset=utf-8"),
    );
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    headers.insert(header::CONTENT_DISPOSITION, disposition);

    Ok((headers, body).into_response())
}
