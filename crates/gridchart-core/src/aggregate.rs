// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of gridchart.

//! Per-bucket averages.
//!
//! Rows are grouped by a [`BucketFeature`] key and each column is reduced to
//! the arithmetic mean of its present values. Missing cells do not count as
//! observations, and buckets without observations are left out entirely.

use serde::Serialize;
use tracing::debug;

use crate::bucket::BucketFeature;
use crate::window::TableWindow;

/// Mean of one column for every observed bucket, in domain order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketSeries {
    pub column: String,
    pub points: Vec<(u8, f64)>,
}

impl BucketSeries {
    #[must_use]
    pub fn keys(&self) -> Vec<u8> {
        self.points.iter().map(|(key, _)| *key).collect()
    }

    #[must_use]
    pub fn mean_at(&self, key: u8) -> Option<f64> {
        self.points
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, mean)| *mean)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketAverages {
    pub feature: BucketFeature,
    pub series: Vec<BucketSeries>,
}

impl BucketAverages {
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&BucketSeries> {
        self.series.iter().find(|s| s.column == column)
    }
}

/// Average `columns` over `window`, grouped by `feature`.
///
/// Columns unknown to the table are skipped.
#[must_use]
pub fn average_by_bucket<S: AsRef<str>>(
    window: &TableWindow<'_>,
    columns: &[S],
    feature: BucketFeature,
) -> BucketAverages {
    let keys = window.bucket_keys(feature);
    let domain_start = *feature.domain().start();

    let series = columns
        .iter()
        .map(AsRef::as_ref)
        .filter_map(|column| {
            let Some(cells) = window.column(column) else {
                debug!(column, "Skipping unknown column in aggregation");
                return None;
            };

            let mut sums = vec![0.0_f64; feature.domain_len()];
            let mut counts = vec![0_u32; feature.domain_len()];
            for (key, cell) in keys.iter().zip(cells) {
                if let (Some(slot), Some(value)) = (feature.slot(*key), cell) {
                    sums[slot] += value;
                    counts[slot] += 1;
                }
            }

            let points = sums
                .iter()
                .zip(&counts)
                .enumerate()
                .filter(|(_, (_, count))| **count > 0)
                .map(|(slot, (sum, count))| {
                    (bucket_key(domain_start, slot), sum / f64::from(*count))
                })
                .collect();

            Some(BucketSeries {
                column: column.to_owned(),
                points,
            })
        })
        .collect();

    BucketAverages { feature, series }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "slot index is bounded by a bucket domain of at most 24 keys"
)]
fn bucket_key(domain_start: u8, slot: usize) -> u8 {
    domain_start + slot as u8
}
