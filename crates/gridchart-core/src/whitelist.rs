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

//! Column whitelists and caller column selections.
//!
//! Every column list that comes from a request is intersected with a
//! whitelist before it reaches aggregation or series assembly. Unknown
//! columns are dropped, never reported as errors.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::NoValidColumns;

pub const DEFAULT_GENERATION_PREFIX: &str = "generation_";

/// Prefix and exclusions used to derive the composition whitelist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionRules {
    pub prefix: String,
    pub exclude: Vec<String>,
}

impl Default for CompositionRules {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_GENERATION_PREFIX.to_owned(),
            exclude: vec![
                "generation_load_difference".to_owned(),
                "total_generation".to_owned(),
            ],
        }
    }
}

/// Named, immutable set of approved columns
#[derive(Debug, Clone)]
pub struct ColumnWhitelist {
    name: &'static str,
    columns: Vec<String>,
    lookup: HashSet<String>,
}

impl ColumnWhitelist {
    /// Every column of the table
    #[must_use]
    pub fn all(name: &'static str, columns: &[String]) -> Self {
        Self::collect_from(name, columns.iter().cloned())
    }

    /// Columns starting with `rules.prefix`, minus `rules.exclude`
    #[must_use]
    pub fn by_prefix(name: &'static str, columns: &[String], rules: &CompositionRules) -> Self {
        Self::collect_from(
            name,
            columns
                .iter()
                .filter(|c| c.starts_with(&rules.prefix) && !rules.exclude.contains(c))
                .cloned(),
        )
    }

    fn collect_from(name: &'static str, columns: impl Iterator<Item = String>) -> Self {
        let columns: Vec<String> = columns.collect();
        let lookup = columns.iter().cloned().collect();
        debug!(whitelist = name, columns = columns.len(), "Whitelist built");
        Self {
            name,
            columns,
            lookup,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Approved columns in table order
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.lookup.contains(column)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Keep only whitelisted columns, in request order, without duplicates.
///
/// Returns [`NoValidColumns`] when nothing survives.
pub fn filter_to_whitelist<S: AsRef<str>>(
    requested: &[S],
    whitelist: &ColumnWhitelist,
) -> Result<Vec<String>, NoValidColumns> {
    let mut seen = HashSet::new();
    let mut approved = Vec::with_capacity(requested.len());

    for column in requested.iter().map(AsRef::as_ref) {
        if !whitelist.contains(column) {
            debug!(whitelist = whitelist.name(), column, "Dropping column not on whitelist");
            continue;
        }
        if seen.insert(column) {
            approved.push(column.to_owned());
        }
    }

    if approved.is_empty() {
        Err(NoValidColumns)
    } else {
        Ok(approved)
    }
}

/// Ordered column ids plus optional display labels
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSelection {
    pub columns: Vec<String>,
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

impl ColumnSelection {
    #[must_use]
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            labels: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_label(mut self, column: impl Into<String>, label: impl Into<String>) -> Self {
        self.labels.insert(column.into(), label.into());
        self
    }

    /// Display label, falling back to the column id
    #[must_use]
    pub fn label<'s>(&'s self, column: &'s str) -> &'s str {
        self.labels.get(column).map_or(column, String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Intersect with `whitelist`, keeping labels of surviving columns.
    pub fn restrict_to(&self, whitelist: &ColumnWhitelist) -> Result<Self, NoValidColumns> {
        let columns = filter_to_whitelist(&self.columns, whitelist)?;
        let labels = self
            .labels
            .iter()
            .filter(|(column, _)| columns.contains(column))
            .map(|(column, label)| (column.clone(), label.clone()))
            .collect();
        Ok(Self { columns, labels })
    }
}
