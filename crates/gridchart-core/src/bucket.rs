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

//! Cyclic time-bucket features derived from a timestamp.
//!
//! Each feature maps a timestamp to a small integer key inside a fixed
//! domain:
//!
//! - `hour_of_day`: 0..=23
//! - `day_of_week`: 0..=6, Monday = 0
//! - `month`: 1..=12

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketFeature {
    HourOfDay,
    DayOfWeek,
    Month,
}

impl BucketFeature {
    pub const ALL: [Self; 3] = [Self::HourOfDay, Self::DayOfWeek, Self::Month];

    /// Column-style identifier, e.g. `hour_of_day`
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::HourOfDay => "hour_of_day",
            Self::DayOfWeek => "day_of_week",
            Self::Month => "month",
        }
    }

    /// Human readable axis title, e.g. `Hour Of Day`
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::HourOfDay => "Hour Of Day",
            Self::DayOfWeek => "Day Of Week",
            Self::Month => "Month",
        }
    }

    /// Every key the feature can produce, in natural order.
    #[must_use]
    pub fn domain(self) -> RangeInclusive<u8> {
        match self {
            Self::HourOfDay => 0..=23,
            Self::DayOfWeek => 0..=6,
            Self::Month => 1..=12,
        }
    }

    #[must_use]
    pub fn domain_len(self) -> usize {
        self.domain().len()
    }

    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "hour, weekday and month all fit in u8"
    )]
    pub fn key(self, ts: NaiveDateTime) -> u8 {
        match self {
            Self::HourOfDay => ts.hour() as u8,
            Self::DayOfWeek => ts.weekday().num_days_from_monday() as u8,
            Self::Month => ts.month() as u8,
        }
    }

    /// Position of `key` inside the domain, or `None` when out of range.
    #[must_use]
    pub fn slot(self, key: u8) -> Option<usize> {
        let domain = self.domain();
        domain
            .contains(&key)
            .then(|| usize::from(key - *domain.start()))
    }
}

impl fmt::Display for BucketFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown time feature: {0}")]
pub struct UnknownBucketFeature(pub String);

impl FromStr for BucketFeature {
    type Err = UnknownBucketFeature;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|feature| feature.name() == s.trim())
            .ok_or_else(|| UnknownBucketFeature(s.to_owned()))
    }
}

/// Bucket keys computed once per table row, for every feature.
#[derive(Debug, Clone, Default)]
pub struct BucketColumns {
    hour_of_day: Vec<u8>,
    day_of_week: Vec<u8>,
    month: Vec<u8>,
}

impl BucketColumns {
    #[must_use]
    pub fn compute(timestamps: &[NaiveDateTime]) -> Self {
        let derive = |feature: BucketFeature| -> Vec<u8> {
            timestamps.iter().map(|ts| feature.key(*ts)).collect()
        };

        Self {
            hour_of_day: derive(BucketFeature::HourOfDay),
            day_of_week: derive(BucketFeature::DayOfWeek),
            month: derive(BucketFeature::Month),
        }
    }

    #[must_use]
    pub fn keys(&self, feature: BucketFeature) -> &[u8] {
        match feature {
            BucketFeature::HourOfDay => &self.hour_of_day,
            BucketFeature::DayOfWeek => &self.day_of_week,
            BucketFeature::Month => &self.month,
        }
    }
}
