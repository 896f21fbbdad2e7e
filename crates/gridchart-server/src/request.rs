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

//! Request validation at the HTTP boundary.
//!
//! Form posts and JSON bodies are both turned into the same validated plot
//! requests before the core is called. Whitelisting happens later, inside
//! the chart pipeline.

use std::collections::HashMap;

use chrono::NaiveDate;
use gridchart_core::{BucketFeature, ColumnSelection};
use serde::Deserialize;
use thiserror::Error;

/// Rejected before reaching the core; rendered as HTTP 400
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoundaryError {
    #[error("Select at least one column ({field}).")]
    NoColumns { field: &'static str },

    #[error("Invalid day count: {0:?}")]
    InvalidDays(String),

    #[error("Unknown time feature: {0:?}")]
    UnknownFeature(String),

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Invalid date {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),
}

/// Decoded `application/x-www-form-urlencoded` pairs, repeated keys kept
#[derive(Debug, Clone, Default)]
pub struct FormFields(Vec<(String, String)>);

impl From<Vec<(String, String)>> for FormFields {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self(pairs)
    }
}

impl FormFields {
    /// Every non-empty value of a repeated field, in submission order
    #[must_use]
    pub fn all(&self, name: &str) -> Vec<String> {
        self.0
            .iter()
            .filter(|(key, value)| key == name && !value.trim().is_empty())
            .map(|(_, value)| value.trim().to_owned())
            .collect()
    }

    /// First non-empty value of a field
    #[must_use]
    pub fn first(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.trim())
            .find(|value| !value.is_empty())
    }

    /// Checkbox semantics: present with a non-empty value other than `off`/`false`
    #[must_use]
    pub fn flag(&self, name: &str) -> bool {
        self.0.iter().any(|(key, value)| {
            key == name
                && !matches!(
                    value.trim().to_ascii_lowercase().as_str(),
                    "" | "off" | "false" | "0"
                )
        })
    }

    fn days(&self, name: &str) -> Result<Option<i64>, BoundaryError> {
        self.first(name).map(parse_days).transpose()
    }
}

fn parse_days(raw: &str) -> Result<i64, BoundaryError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| BoundaryError::InvalidDays(raw.to_owned()))
}

fn parse_date(raw: &str) -> Result<NaiveDate, BoundaryError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| BoundaryError::InvalidDate(raw.to_owned()))
}

fn parse_feature(raw: &str) -> Result<BucketFeature, BoundaryError> {
    raw.parse()
        .map_err(|_| BoundaryError::UnknownFeature(raw.to_owned()))
}

fn require_columns(
    columns: Vec<String>,
    labels: HashMap<String, String>,
    field: &'static str,
) -> Result<ColumnSelection, BoundaryError> {
    if columns.is_empty() {
        return Err(BoundaryError::NoColumns { field });
    }
    Ok(ColumnSelection { columns, labels })
}

/// Line chart of a trailing window, or of one calendar day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinePlotRequest {
    pub selection: ColumnSelection,
    pub days: i64,
    pub stacked: bool,
    pub date: Option<NaiveDate>,
}

impl LinePlotRequest {
    pub fn from_form(form: &FormFields, default_days: i64) -> Result<Self, BoundaryError> {
        let selection = require_columns(form.all("columns"), HashMap::new(), "columns")?;
        Ok(Self {
            selection,
            days: form.days("days")?.unwrap_or(default_days),
            stacked: form.flag("stacked"),
            date: form.first("date").map(parse_date).transpose()?,
        })
    }
}

/// Per-bucket averages, over the full table unless `days` is given
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AveragePlotRequest {
    pub selection: ColumnSelection,
    pub feature: BucketFeature,
    pub days: Option<i64>,
}

impl AveragePlotRequest {
    pub fn from_form(form: &FormFields) -> Result<Self, BoundaryError> {
        let selection = require_columns(form.all("columns_avg"), HashMap::new(), "columns_avg")?;
        let feature = form
            .first("time_feature")
            .ok_or(BoundaryError::MissingField("time_feature"))
            .and_then(parse_feature)?;
        Ok(Self {
            selection,
            feature,
            days: form.days("days")?,
        })
    }
}

/// Stacked generation composition of a trailing window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositionPlotRequest {
    pub columns: Vec<String>,
    pub days: i64,
}

impl CompositionPlotRequest {
    pub fn from_form(form: &FormFields, default_days: i64) -> Result<Self, BoundaryError> {
        let columns = form.all("columns_comp");
        if columns.is_empty() {
            return Err(BoundaryError::NoColumns {
                field: "columns_comp",
            });
        }
        Ok(Self {
            columns,
            days: form.days("days")?.unwrap_or(default_days),
        })
    }
}

/// Export of a sliding window as CSV
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub columns: Vec<String>,
    pub days: i64,
}

impl ExportRequest {
    pub fn from_query(query: &FormFields, default_days: i64) -> Result<Self, BoundaryError> {
        let columns = query.all("columns");
        if columns.is_empty() {
            return Err(BoundaryError::NoColumns { field: "columns" });
        }
        Ok(Self {
            columns,
            days: query.days("days")?.unwrap_or(default_days),
        })
    }
}

/// JSON body of `POST /api/plot`
#[derive(Debug, Clone, Deserialize)]
pub struct LinePlotBody {
    pub columns: Vec<String>,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    pub days: Option<i64>,
    #[serde(default)]
    pub stacked: bool,
    pub date: Option<NaiveDate>,
}

impl LinePlotBody {
    pub fn into_request(self, default_days: i64) -> Result<LinePlotRequest, BoundaryError> {
        Ok(LinePlotRequest {
            selection: require_columns(self.columns, self.labels, "columns")?,
            days: self.days.unwrap_or(default_days),
            stacked: self.stacked,
            date: self.date,
        })
    }
}

/// JSON body of `POST /api/avg_plot`
#[derive(Debug, Clone, Deserialize)]
pub struct AveragePlotBody {
    pub columns: Vec<String>,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    pub time_feature: String,
    pub days: Option<i64>,
}

impl AveragePlotBody {
    pub fn into_request(self) -> Result<AveragePlotRequest, BoundaryError> {
        Ok(AveragePlotRequest {
            selection: require_columns(self.columns, self.labels, "columns")?,
            feature: parse_feature(&self.time_feature)?,
            days: self.days,
        })
    }
}

/// JSON body of `POST /api/composition_plot`
#[derive(Debug, Clone, Deserialize)]
pub struct CompositionPlotBody {
    pub columns: Vec<String>,
    pub days: Option<i64>,
}

impl CompositionPlotBody {
    pub fn into_request(self, default_days: i64) -> Result<CompositionPlotRequest, BoundaryError> {
        if self.columns.is_empty() {
            return Err(BoundaryError::NoColumns { field: "columns" });
        }
        Ok(CompositionPlotRequest {
            columns: self.columns,
            days: self.days.unwrap_or(default_days),
        })
    }
}
