//! Per-location and global aggregates used to reconstruct the features a caller
//! does not supply.
//!
//! Tables are built once from the historical dataset (see [`crate::stats::builder`])
//! and are read-only afterwards; every lookup takes `&self`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Mean, sample standard deviation and median of one numeric column.
///
/// A field is `None` when the group had no observation of the column (or, for the
/// standard deviation, fewer than two).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub median: Option<f64>,
}

/// Aggregates over a set of rows: numeric summaries and categorical modes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureStats {
    pub numeric: HashMap<String, NumericSummary>,
    pub categorical: HashMap<String, String>,
}

impl FeatureStats {
    pub fn mean(&self, feature: &str) -> Option<f64> {
        self.numeric.get(feature).and_then(|summary| summary.mean)
    }

    pub fn mode(&self, feature: &str) -> Option<&str> {
        self.categorical.get(feature).map(String::as_str)
    }
}

/// Statistics for a single location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationStats {
    /// Aggregates over every historical row of the location.
    pub overall: FeatureStats,
    /// Per-calendar-month (1-12) means. Only months with at least one row are present.
    pub seasonal: BTreeMap<u32, HashMap<String, f64>>,
}

impl LocationStats {
    /// Month-restricted mean of `feature`, if that month and feature were observed.
    pub fn seasonal_mean(&self, month: u32, feature: &str) -> Option<f64> {
        self.seasonal
            .get(&month)
            .and_then(|means| means.get(feature))
            .copied()
    }

    pub fn has_month(&self, month: u32) -> bool {
        self.seasonal.contains_key(&month)
    }
}

/// The location table plus the dataset-wide fallback.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticsTable {
    pub locations: HashMap<String, LocationStats>,
    pub global: FeatureStats,
}

impl StatisticsTable {
    /// Location names are matched exactly (case-sensitive).
    pub fn location(&self, name: &str) -> Option<&LocationStats> {
        self.locations.get(name)
    }

    /// Known location names, sorted.
    pub fn location_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.locations.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}
