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

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::dataset::TimeSeriesTable;
use crate::error::LoadResult;
use crate::source::load_csv_path;
use crate::whitelist::{ColumnWhitelist, CompositionRules};

/// Immutable dataset plus the whitelists derived from it.
///
/// Built completely before it is shared; never modified afterwards.
#[derive(Debug)]
pub struct DatasetSnapshot {
    pub table: TimeSeriesTable,
    /// Columns allowed in composition charts
    pub composition: ColumnWhitelist,
    /// Every data column, for line and average charts
    pub plottable: ColumnWhitelist,
}

impl DatasetSnapshot {
    #[must_use]
    pub fn build(table: TimeSeriesTable, rules: &CompositionRules) -> Self {
        let composition = ColumnWhitelist::by_prefix("composition", table.columns(), rules);
        let plottable = ColumnWhitelist::all("plottable", table.columns());
        info!(
            composition = ?composition.columns(),
            plottable = plottable.columns().len(),
            "Dataset snapshot built"
        );
        Self {
            table,
            composition,
            plottable,
        }
    }

    pub fn load(path: impl AsRef<Path>, rules: &CompositionRules) -> LoadResult<Self> {
        Ok(Self::build(load_csv_path(path)?, rules))
    }
}

/// Shared handle to the current snapshot.
///
/// Readers take a cheap `Arc` clone and never hold the lock while working;
/// a reload publishes a new snapshot in one swap.
#[derive(Debug)]
pub struct SnapshotHandle {
    current: RwLock<Arc<DatasetSnapshot>>,
}

impl SnapshotHandle {
    #[must_use]
    pub fn new(snapshot: DatasetSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    #[must_use]
    pub fn current(&self) -> Arc<DatasetSnapshot> {
        Arc::clone(&self.current.read())
    }

    /// Publish `snapshot`, returning the one it replaced
    pub fn replace(&self, snapshot: DatasetSnapshot) -> Arc<DatasetSnapshot> {
        let next = Arc::new(snapshot);
        std::mem::replace(&mut *self.current.write(), next)
    }
}
