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

//! HTML forms and chart pages.

use askama::Template;
use axum::Form;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use gridchart_core::{BucketFeature, NoValidColumns};
use tracing::{debug, error, warn};

use crate::AppState;
use crate::chart::{self, ChartView};
use crate::request::{
    AveragePlotRequest, BoundaryError, CompositionPlotRequest, FormFields, LinePlotRequest,
};

const DAYS_FORM: &str = "/days_form";
const AVG_FORM: &str = "/avg_form";
const COMPOSITION_FORM: &str = "/composition_form";

pub const NO_VALID_COLUMNS: &str = "No valid columns selected.";
pub const NO_VALID_GENERATION_COLUMNS: &str = "No valid generation columns selected.";
pub const NO_DATA: &str = "No data in the selected range.";

#[derive(Debug, Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub rows: usize,
    pub columns: usize,
    pub span_days: i64,
    pub first: String,
    pub last: String,
}

#[derive(Debug, Template)]
#[template(path = "days_form.html")]
pub struct DaysFormTemplate {
    pub columns: Vec<String>,
    pub max_days: i64,
    pub default_days: i64,
}

#[derive(Debug)]
pub struct FeatureOption {
    pub name: &'static str,
    pub title: &'static str,
}

#[derive(Debug, Template)]
#[template(path = "avg_form.html")]
pub struct AvgFormTemplate {
    pub columns: Vec<String>,
    pub features: Vec<FeatureOption>,
}

#[derive(Debug, Template)]
#[template(path = "composition_form.html")]
pub struct CompositionFormTemplate {
    pub columns: Vec<String>,
    pub max_days: i64,
    pub default_days: i64,
}

#[derive(Debug, Template)]
#[template(path = "chart.html")]
pub struct ChartTemplate {
    pub title: String,
    pub back_href: &'static str,
    pub rows: usize,
    pub day_count: Option<i64>,
    /// Chart.js config, already escaped for a script element
    pub config_json: String,
}

#[derive(Debug, Template)]
#[template(path = "message.html")]
pub struct MessageTemplate {
    pub title: String,
    pub message: String,
    pub back_href: &'static str,
}

fn render_page<T: Template>(template: &T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!(error = %e, "Template render error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(format!(
                    "<html><body><h1>Error</h1><p>Failed to render template: {e}</p></body></html>"
                )),
            )
                .into_response()
        }
    }
}

fn message_page(status: StatusCode, title: &str, message: &str, back_href: &'static str) -> Response {
    let mut response = render_page(&MessageTemplate {
        title: title.to_owned(),
        message: message.to_owned(),
        back_href,
    });
    if response.status().is_success() {
        *response.status_mut() = status;
    }
    response
}

fn rejected(err: &BoundaryError, back_href: &'static str) -> Response {
    debug!(error = %err, "Form rejected");
    message_page(StatusCode::BAD_REQUEST, "Invalid request", &err.to_string(), back_href)
}

fn chart_page(view: &ChartView, state: &AppState, back_href: &'static str) -> Response {
    if view.is_empty() {
        warn!(title = %view.title, "Chart has no rows to show");
        return message_page(StatusCode::OK, &view.title, NO_DATA, back_href);
    }
    let config = chart::chartjs_config(view, &state.palette);
    render_page(&ChartTemplate {
        title: view.title.clone(),
        back_href,
        rows: view.rows,
        day_count: view.day_count,
        config_json: chart::script_json(&config),
    })
}

/// Largest day count the forms offer
fn max_days(state: &AppState) -> i64 {
    state.snapshot().table.span_days().max(1)
}

#[expect(clippy::unused_async, reason = "axum handler must be async")]
pub async fn index_handler(State(state): State<AppState>) -> Response {
    let snapshot = state.snapshot();
    let table = &snapshot.table;
    let fmt = |ts: Option<chrono::NaiveDateTime>| {
        ts.map_or_else(|| "-".to_owned(), |t| t.format("%Y-%m-%d %H:%M").to_string())
    };
    render_page(&IndexTemplate {
        rows: table.len(),
        columns: table.columns().len(),
        span_days: table.span_days(),
        first: fmt(table.min_timestamp()),
        last: fmt(table.max_timestamp()),
    })
}

#[expect(clippy::unused_async, reason = "axum handler must be async")]
pub async fn days_form_handler(State(state): State<AppState>) -> Response {
    let max_days = max_days(&state);
    render_page(&DaysFormTemplate {
        columns: state.snapshot().plottable.columns().to_vec(),
        max_days,
        default_days: max_days,
    })
}

#[expect(clippy::unused_async, reason = "axum handler must be async")]
pub async fn avg_form_handler(State(state): State<AppState>) -> Response {
    render_page(&AvgFormTemplate {
        columns: state.snapshot().plottable.columns().to_vec(),
        features: BucketFeature::ALL
            .into_iter()
            .map(|f| FeatureOption {
                name: f.name(),
                title: f.title(),
            })
            .collect(),
    })
}

#[expect(clippy::unused_async, reason = "axum handler must be async")]
pub async fn composition_form_handler(State(state): State<AppState>) -> Response {
    let max_days = max_days(&state);
    render_page(&CompositionFormTemplate {
        columns: state.snapshot().composition.columns().to_vec(),
        max_days,
        default_days: state.config.charts.composition_form_days.min(max_days),
    })
}

#[expect(clippy::unused_async, reason = "axum handler must be async")]
pub async fn plot_handler(
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let form = FormFields::from(pairs);
    let request = match LinePlotRequest::from_form(&form, state.config.charts.default_days) {
        Ok(request) => request,
        Err(e) => return rejected(&e, DAYS_FORM),
    };

    match chart::line_chart(&state.snapshot(), &request, &state.palette) {
        Ok(view) => chart_page(&view, &state, DAYS_FORM),
        Err(NoValidColumns) => message_page(StatusCode::OK, "Plot by Days", NO_VALID_COLUMNS, DAYS_FORM),
    }
}

#[expect(clippy::unused_async, reason = "axum handler must be async")]
pub async fn avg_plot_handler(
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let form = FormFields::from(pairs);
    let request = match AveragePlotRequest::from_form(&form) {
        Ok(request) => request,
        Err(e) => return rejected(&e, AVG_FORM),
    };

    match chart::average_chart(&state.snapshot(), &request, &state.palette) {
        Ok(view) => chart_page(&view, &state, AVG_FORM),
        Err(NoValidColumns) => message_page(
            StatusCode::OK,
            "Average by Time Feature",
            NO_VALID_COLUMNS,
            AVG_FORM,
        ),
    }
}

#[expect(clippy::unused_async, reason = "axum handler must be async")]
pub async fn composition_plot_handler(
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let form = FormFields::from(pairs);
    let request = match CompositionPlotRequest::from_form(&form, state.config.charts.default_days)
    {
        Ok(request) => request,
        Err(e) => return rejected(&e, COMPOSITION_FORM),
    };

    match chart::composition_chart(&state.snapshot(), &request, &state.palette) {
        Ok(view) => chart_page(&view, &state, COMPOSITION_FORM),
        Err(NoValidColumns) => message_page(
            StatusCode::OK,
            chart::COMPOSITION_TITLE,
            NO_VALID_GENERATION_COLUMNS,
            COMPOSITION_FORM,
        ),
    }
}
