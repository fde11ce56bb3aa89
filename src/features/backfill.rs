//! Reconstruction of a complete feature vector from only a date and a location.
//!
//! Numeric features resolve through three tiers, in this order:
//!
//! 1. the location's mean for the date's calendar month,
//! 2. the location's overall mean,
//! 3. the global mean (`0.0` if the feature has no global mean either).
//!
//! Categorical features take the location's mode; an unknown location, or a mode
//! outside the encoder's vocabulary, yields the reserved unknown code `0`.
//! None of these cases is an error.

use crate::features::config::FeatureConfig;
use crate::features::encoder::CategoryEncoder;
use crate::features::temporal::{TemporalFeatures, TEMPORAL_FEATURE_NAMES};
use crate::stats::location_stats::{LocationStats, StatisticsTable};
use chrono::NaiveDate;
use log::debug;
use std::collections::HashMap;

/// Where a back-filled numeric value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FallbackTier {
    /// Per-location, per-month mean.
    Seasonal,
    /// Per-location mean over all rows.
    Location,
    /// Dataset-wide mean.
    Global,
    /// The feature had no statistics at all.
    Default,
}

/// The full, ordered list of feature names for `config`: temporal features, then the
/// encoded categorical columns (location first), then the numeric features.
pub fn feature_columns(config: &FeatureConfig) -> Vec<String> {
    TEMPORAL_FEATURE_NAMES
        .iter()
        .map(|name| name.to_string())
        .chain(config.encoded_columns().into_iter().map(str::to_string))
        .chain(config.numeric.iter().cloned())
        .collect()
}

/// An assembled feature vector together with the tier used for every numeric feature.
#[derive(Debug, Clone, PartialEq)]
pub struct BackfilledFeatures {
    pub values: Vec<f64>,
    pub tiers: HashMap<String, FallbackTier>,
    /// Whether the location was found in the statistics table.
    pub known_location: bool,
}

/// Read-only view over everything back-fill needs. Cheap to construct per request.
#[derive(Debug, Clone, Copy)]
pub struct Backfill<'a> {
    pub config: &'a FeatureConfig,
    pub stats: &'a StatisticsTable,
    pub encoders: &'a HashMap<String, CategoryEncoder>,
    pub reference_date: Option<NaiveDate>,
}

impl<'a> Backfill<'a> {
    /// Resolves one numeric feature through the seasonal → location → global tiers.
    pub fn numeric_value(
        &self,
        location: Option<&LocationStats>,
        month: u32,
        feature: &str,
    ) -> (f64, FallbackTier) {
        if let Some(location) = location {
            if self.config.seasonal_refinement {
                if let Some(value) = location.seasonal_mean(month, feature) {
                    return (value, FallbackTier::Seasonal);
                }
            }
            if let Some(value) = location.overall.mean(feature) {
                return (value, FallbackTier::Location);
            }
        }
        match self.stats.global.mean(feature) {
            Some(value) => (value, FallbackTier::Global),
            None => (0.0, FallbackTier::Default),
        }
    }

    /// Encoded categorical value for `feature`.
    pub fn categorical_code(&self, location: Option<&LocationStats>, feature: &str) -> u32 {
        let Some(encoder) = self.encoders.get(feature) else {
            return 0;
        };
        let mode = location.and_then(|location| location.overall.mode(feature));
        match mode {
            Some(value) => encoder.encode(Some(value)),
            None => encoder.unknown_code(),
        }
    }

    fn location_code(&self, location: &str) -> u32 {
        self.encoders
            .get(&self.config.location_column)
            .map(|encoder| encoder.encode(Some(location)))
            .unwrap_or(0)
    }

    /// Builds the vector for `(date, location)` in the order given by `feature_columns`.
    ///
    /// Names that are neither temporal, categorical nor numeric in the configuration
    /// are filled with `0.0`.
    pub fn assemble(
        &self,
        date: NaiveDate,
        location: &str,
        feature_columns: &[String],
    ) -> BackfilledFeatures {
        let temporal = TemporalFeatures::extract(date, self.reference_date);
        let location_stats = self.stats.location(location);
        let month = temporal.month;

        let mut tiers = HashMap::with_capacity(self.config.numeric.len());
        let values = feature_columns
            .iter()
            .map(|name| {
                if let Some(value) = temporal.get(name) {
                    value
                } else if *name == self.config.location_column {
                    f64::from(self.location_code(location))
                } else if self.config.categorical.contains(name) {
                    f64::from(self.categorical_code(location_stats, name))
                } else if self.config.numeric.contains(name) {
                    let (value, tier) = self.numeric_value(location_stats, month, name);
                    tiers.insert(name.clone(), tier);
                    value
                } else {
                    0.0
                }
            })
            .collect();

        if location_stats.is_none() {
            debug!("Location '{}' unknown, using global statistics", location);
        }

        BackfilledFeatures {
            values,
            tiers,
            known_location: location_stats.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::location_stats::{FeatureStats, NumericSummary};
    use std::collections::BTreeMap;

    fn summary(mean: f64) -> NumericSummary {
        NumericSummary {
            mean: Some(mean),
            std: None,
            median: Some(mean),
        }
    }

    fn config() -> FeatureConfig {
        FeatureConfig {
            numeric: vec!["MaxTemp".into(), "Sunshine".into(), "Cloud3pm".into()],
            categorical: vec!["WindGustDir".into(), "RainToday".into()],
            ..FeatureConfig::default()
        }
    }

    fn table() -> StatisticsTable {
        let mut sydney = LocationStats::default();
        sydney.overall.numeric = HashMap::from([
            ("MaxTemp".to_string(), summary(22.0)),
            ("Sunshine".to_string(), summary(7.5)),
        ]);
        sydney.overall.categorical = HashMap::from([
            ("WindGustDir".to_string(), "NE".to_string()),
            ("RainToday".to_string(), "Sleet".to_string()),
        ]);
        sydney.seasonal = BTreeMap::from([(
            12,
            HashMap::from([("MaxTemp".to_string(), 27.3)]),
        )]);

        let global = FeatureStats {
            numeric: HashMap::from([
                ("MaxTemp".to_string(), summary(23.0)),
                ("Sunshine".to_string(), summary(6.0)),
            ]),
            categorical: HashMap::from([("WindGustDir".to_string(), "W".to_string())]),
        };
        StatisticsTable {
            locations: HashMap::from([("Sydney".to_string(), sydney)]),
            global,
        }
    }

    fn encoders() -> HashMap<String, CategoryEncoder> {
        HashMap::from([
            (
                "Location".to_string(),
                CategoryEncoder::fit([Some("Perth"), Some("Sydney")]),
            ),
            (
                "WindGustDir".to_string(),
                CategoryEncoder::fit([Some("NE"), Some("W")]),
            ),
            (
                "RainToday".to_string(),
                CategoryEncoder::fit([Some("No"), Some("Yes")]),
            ),
        ])
    }

    fn value(features: &BackfilledFeatures, columns: &[String], name: &str) -> f64 {
        let idx = columns.iter().position(|c| c == name).unwrap();
        features.values[idx]
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn seasonal_mean_wins_over_location_mean() {
        let (config, stats, encoders) = (config(), table(), encoders());
        let backfill = Backfill {
            config: &config,
            stats: &stats,
            encoders: &encoders,
            reference_date: Some(date(2020, 1, 1)),
        };
        let columns = feature_columns(&config);
        let features = backfill.assemble(date(2025, 12, 25), "Sydney", &columns);

        assert_eq!(features.values.len(), columns.len());
        assert!(features.known_location);
        assert_eq!(value(&features, &columns, "MaxTemp"), 27.3);
        assert_eq!(features.tiers["MaxTemp"], FallbackTier::Seasonal);
        // December has no Sunshine mean: location-wide mean.
        assert_eq!(value(&features, &columns, "Sunshine"), 7.5);
        assert_eq!(features.tiers["Sunshine"], FallbackTier::Location);
        // Nobody has Cloud3pm.
        assert_eq!(value(&features, &columns, "Cloud3pm"), 0.0);
        assert_eq!(features.tiers["Cloud3pm"], FallbackTier::Default);
        assert_eq!(value(&features, &columns, "month"), 12.0);
        assert_eq!(value(&features, &columns, "Location"), 2.0);
        assert_eq!(value(&features, &columns, "WindGustDir"), 1.0);
        // Stored mode outside the vocabulary degrades to unknown.
        assert_eq!(value(&features, &columns, "RainToday"), 0.0);
    }

    #[test]
    fn other_months_use_location_mean() {
        let (config, stats, encoders) = (config(), table(), encoders());
        let backfill = Backfill {
            config: &config,
            stats: &stats,
            encoders: &encoders,
            reference_date: None,
        };
        let columns = feature_columns(&config);
        let features = backfill.assemble(date(2025, 7, 1), "Sydney", &columns);
        assert_eq!(value(&features, &columns, "MaxTemp"), 22.0);
        assert_eq!(features.tiers["MaxTemp"], FallbackTier::Location);
    }

    #[test]
    fn seasonal_tier_can_be_disabled() {
        let config = FeatureConfig {
            seasonal_refinement: false,
            ..config()
        };
        let (stats, encoders) = (table(), encoders());
        let backfill = Backfill {
            config: &config,
            stats: &stats,
            encoders: &encoders,
            reference_date: None,
        };
        let (value, tier) = backfill.numeric_value(stats.location("Sydney"), 12, "MaxTemp");
        assert_eq!((value, tier), (22.0, FallbackTier::Location));
    }

    #[test]
    fn unknown_location_matches_global_only_statistics() {
        let (config, stats, encoders) = (config(), table(), encoders());
        let backfill = Backfill {
            config: &config,
            stats: &stats,
            encoders: &encoders,
            reference_date: None,
        };
        let columns = feature_columns(&config);
        let features = backfill.assemble(date(2025, 12, 25), "Atlantis", &columns);
        assert!(!features.known_location);

        let global_only = StatisticsTable {
            locations: HashMap::new(),
            global: stats.global.clone(),
        };
        let reference = Backfill {
            stats: &global_only,
            ..backfill
        }
        .assemble(date(2025, 12, 25), "Atlantis", &columns);

        for name in &config.numeric {
            assert_eq!(
                value(&features, &columns, name),
                value(&reference, &columns, name)
            );
        }
        assert_eq!(value(&features, &columns, "MaxTemp"), 23.0);
        assert_eq!(features.tiers["MaxTemp"], FallbackTier::Global);
        assert_eq!(value(&features, &columns, "Location"), 0.0);
        assert_eq!(value(&features, &columns, "WindGustDir"), 0.0);
    }

    #[test]
    fn column_order_is_temporal_categorical_numeric() {
        let columns = feature_columns(&config());
        assert_eq!(columns[0], "day_of_year_sin");
        assert_eq!(columns[7], "days_from_reference");
        assert_eq!(columns[8], "Location");
        assert_eq!(columns[9], "WindGustDir");
        assert_eq!(columns.last().map(String::as_str), Some("Cloud3pm"));
        assert_eq!(feature_columns(&FeatureConfig::default()).len(), 29);
    }
}
