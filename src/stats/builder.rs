//! Closed-form aggregation of the historical dataset into a [`StatisticsTable`].
//!
//! Numeric summaries are computed with polars group-bys (location, and location ×
//! month); categorical modes are counted directly so that ties resolve
//! deterministically to the lexicographically smallest value.

use crate::features::config::FeatureConfig;
use crate::features::encoder::UNKNOWN_CATEGORY;
use crate::stats::location_stats::{FeatureStats, LocationStats, NumericSummary, StatisticsTable};
use crate::training::data_loader::{float_values, string_values, TrainingFrame, MONTH_COLUMN};
use crate::training::error::TrainingError;
use log::info;
use polars::prelude::*;
use std::collections::{BTreeMap, HashMap};

const MEAN_SUFFIX: &str = "__mean";
const STD_SUFFIX: &str = "__std";
const MEDIAN_SUFFIX: &str = "__median";

fn summary_exprs(numeric: &[String]) -> Vec<Expr> {
    numeric
        .iter()
        .flat_map(|name| {
            [
                col(name.as_str()).mean().alias(format!("{name}{MEAN_SUFFIX}")),
                col(name.as_str()).std(1).alias(format!("{name}{STD_SUFFIX}")),
                col(name.as_str())
                    .median()
                    .alias(format!("{name}{MEDIAN_SUFFIX}")),
            ]
        })
        .collect()
}

fn mean_exprs(numeric: &[String]) -> Vec<Expr> {
    numeric
        .iter()
        .map(|name| col(name.as_str()).mean().alias(format!("{name}{MEAN_SUFFIX}")))
        .collect()
}

fn float_at(df: &DataFrame, name: &str, row: usize) -> Result<Option<f64>, TrainingError> {
    let value = df
        .column(name)?
        .f64()
        .map_err(|source| TrainingError::ColumnConversion {
            column: name.to_string(),
            source,
        })?
        .get(row);
    // NaN never reaches a feature vector; it counts as "no value" like a null.
    Ok(value.filter(|v| v.is_finite()))
}

fn summary_at(
    df: &DataFrame,
    feature: &str,
    row: usize,
) -> Result<NumericSummary, TrainingError> {
    Ok(NumericSummary {
        mean: float_at(df, &format!("{feature}{MEAN_SUFFIX}"), row)?,
        std: float_at(df, &format!("{feature}{STD_SUFFIX}"), row)?,
        median: float_at(df, &format!("{feature}{MEDIAN_SUFFIX}"), row)?,
    })
}

/// Most frequent value; ties go to the smallest value, no values at all give `Unknown`.
fn mode_of(counts: &HashMap<String, usize>) -> String {
    counts
        .iter()
        .max_by(|(a_value, a_count), (b_value, b_count)| {
            a_count.cmp(b_count).then_with(|| b_value.cmp(a_value))
        })
        .map(|(value, _)| value.clone())
        .unwrap_or_else(|| UNKNOWN_CATEGORY.to_string())
}

/// Counts categorical values globally and per location.
fn categorical_modes(
    data: &TrainingFrame,
    config: &FeatureConfig,
    locations: &[Option<String>],
) -> Result<(HashMap<String, String>, HashMap<String, HashMap<String, String>>), TrainingError>
{
    let mut global_modes = HashMap::new();
    let mut location_modes: HashMap<String, HashMap<String, String>> = HashMap::new();

    for feature in &config.categorical {
        let values = data.string_values(feature)?;
        let mut global_counts: HashMap<String, usize> = HashMap::new();
        let mut per_location: HashMap<&str, HashMap<String, usize>> = HashMap::new();

        for (location, value) in locations.iter().zip(&values) {
            let Some(location) = location.as_deref() else {
                continue;
            };
            let counts = per_location.entry(location).or_default();
            if let Some(value) = value {
                *counts.entry(value.clone()).or_default() += 1;
                *global_counts.entry(value.clone()).or_default() += 1;
            }
        }

        global_modes.insert(feature.clone(), mode_of(&global_counts));
        for (location, counts) in per_location {
            location_modes
                .entry(location.to_string())
                .or_default()
                .insert(feature.clone(), mode_of(&counts));
        }
    }
    Ok((global_modes, location_modes))
}

/// Builds the location and global statistics for `data`.
///
/// Rows with a missing location contribute to the global statistics only.
pub fn build_statistics(
    data: &TrainingFrame,
    config: &FeatureConfig,
) -> Result<StatisticsTable, TrainingError> {
    let location_col = config.location_column.as_str();
    let numeric = &config.numeric;

    // Global
    let global_frame = data
        .frame
        .clone()
        .lazy()
        .select(summary_exprs(numeric))
        .collect()?;
    let mut global = FeatureStats::default();
    for feature in numeric {
        global
            .numeric
            .insert(feature.clone(), summary_at(&global_frame, feature, 0)?);
    }

    // Per location
    let by_location = data
        .frame
        .clone()
        .lazy()
        .filter(col(location_col).is_not_null())
        .group_by([col(location_col)])
        .agg(summary_exprs(numeric))
        .collect()?;
    let location_keys = string_values(&by_location, location_col)?;

    let mut locations: HashMap<String, LocationStats> = HashMap::new();
    for (row, key) in location_keys.iter().enumerate() {
        let Some(key) = key else { continue };
        let entry = locations.entry(key.clone()).or_default();
        for feature in numeric {
            entry
                .overall
                .numeric
                .insert(feature.clone(), summary_at(&by_location, feature, row)?);
        }
    }

    // Per location and calendar month
    let by_month = data
        .frame
        .clone()
        .lazy()
        .filter(col(location_col).is_not_null())
        .group_by([col(location_col), col(MONTH_COLUMN)])
        .agg(mean_exprs(numeric))
        .collect()?;
    let month_locations = string_values(&by_month, location_col)?;
    let months = float_values(&by_month, MONTH_COLUMN)?;

    for (row, (key, month)) in month_locations.iter().zip(&months).enumerate() {
        let (Some(key), Some(month)) = (key, month) else {
            continue;
        };
        let month = *month as u32;
        let mut means = HashMap::new();
        for feature in numeric {
            if let Some(mean) = float_at(&by_month, &format!("{feature}{MEAN_SUFFIX}"), row)? {
                means.insert(feature.clone(), mean);
            }
        }
        locations
            .entry(key.clone())
            .or_default()
            .seasonal
            .insert(month, means);
    }

    // Modes
    let row_locations = data.string_values(location_col)?;
    let (global_modes, location_modes) = categorical_modes(data, config, &row_locations)?;
    global.categorical = global_modes;
    for (location, modes) in location_modes {
        locations.entry(location).or_default().overall.categorical = modes;
    }

    info!("Statistics computed for {} locations", locations.len());

    Ok(StatisticsTable { locations, global })
}

/// Months present for each location, mostly useful for diagnostics.
pub fn seasonal_coverage(table: &StatisticsTable) -> BTreeMap<String, Vec<u32>> {
    table
        .locations
        .iter()
        .map(|(name, stats)| (name.clone(), stats.seasonal.keys().copied().collect()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::data_loader::load_csv_bytes;

    const CSV: &str = "\
Date,Location,MaxTemp,Humidity3pm,WindGustDir,RainToday,RainTomorrow
2020-12-01,Sydney,26.0,60,NE,No,No
2020-12-15,Sydney,28.6,70,NE,Yes,Yes
2021-06-01,Sydney,17.0,NA,W,No,No
2021-06-02,Sydney,19.0,55,SW,No,No
2021-06-03,Perth,30.0,20,E,No,No
2021-06-04,Perth,NA,NA,NA,No,No
";

    fn config() -> FeatureConfig {
        FeatureConfig {
            numeric: vec!["MaxTemp".into(), "Humidity3pm".into()],
            categorical: vec!["WindGustDir".into(), "RainToday".into()],
            ..FeatureConfig::default()
        }
    }

    async fn table() -> StatisticsTable {
        let df = load_csv_bytes(CSV.as_bytes().to_vec()).await.unwrap();
        let data = TrainingFrame::prepare(&df, &config()).unwrap();
        build_statistics(&data, &config()).unwrap()
    }

    fn close(a: Option<f64>, b: f64) -> bool {
        a.is_some_and(|a| (a - b).abs() < 1e-9)
    }

    #[tokio::test]
    async fn location_and_global_summaries() {
        let table = table().await;
        assert_eq!(table.location_names(), vec!["Perth", "Sydney"]);

        let sydney = table.location("Sydney").unwrap();
        let max_temp = sydney.overall.numeric["MaxTemp"];
        assert!(close(max_temp.mean, 22.65));
        assert!(close(max_temp.median, 22.5));
        assert!(max_temp.std.is_some());

        // Perth has a single MaxTemp observation: no sample deviation.
        let perth = table.location("Perth").unwrap();
        assert!(close(perth.overall.mean("MaxTemp"), 30.0));
        assert_eq!(perth.overall.numeric["MaxTemp"].std, None);

        assert!(close(table.global.mean("MaxTemp"), 24.12));
        assert!(close(table.global.mean("Humidity3pm"), 51.25));
        assert!(table.location("sydney").is_none());
    }

    #[tokio::test]
    async fn seasonal_means_only_for_observed_months() {
        let table = table().await;
        let sydney = table.location("Sydney").unwrap();
        assert!(close(sydney.seasonal_mean(12, "MaxTemp"), 27.3));
        assert!(close(sydney.seasonal_mean(6, "MaxTemp"), 18.0));
        assert!(close(sydney.seasonal_mean(6, "Humidity3pm"), 55.0));
        assert!(!sydney.has_month(1));
        assert_eq!(sydney.seasonal_mean(1, "MaxTemp"), None);

        let coverage = seasonal_coverage(&table);
        assert_eq!(coverage["Sydney"], vec![6, 12]);
        assert_eq!(coverage["Perth"], vec![6]);
    }

    #[tokio::test]
    async fn modes_break_ties_by_value() {
        let table = table().await;
        let sydney = table.location("Sydney").unwrap();
        assert_eq!(sydney.overall.mode("WindGustDir"), Some("NE"));
        assert_eq!(sydney.overall.mode("RainToday"), Some("No"));
        let perth = table.location("Perth").unwrap();
        assert_eq!(perth.overall.mode("WindGustDir"), Some("E"));
        // Global: NE twice, the rest once.
        assert_eq!(table.global.mode("WindGustDir"), Some("NE"));
    }

    #[test]
    fn empty_counts_yield_unknown() {
        assert_eq!(mode_of(&HashMap::new()), UNKNOWN_CATEGORY);
        let counts = HashMap::from([("W".to_string(), 2), ("E".to_string(), 2)]);
        assert_eq!(mode_of(&counts), "E");
    }
}
