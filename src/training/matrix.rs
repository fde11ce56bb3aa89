//! Conversion of a [`TrainingFrame`] into the dense matrix the classifier is fitted on.

use crate::features::backfill::feature_columns;
use crate::features::config::FeatureConfig;
use crate::features::encoder::{CategoryEncoder, UNKNOWN_CATEGORY};
use crate::features::temporal::{extract_all, TEMPORAL_FEATURE_NAMES};
use crate::training::data_loader::TrainingFrame;
use crate::training::error::TrainingError;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashMap;

/// Row-major feature matrix with its labels and fitted category encoders.
#[derive(Debug, Clone)]
pub struct TrainingMatrix {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
    pub labels: Vec<bool>,
    pub encoders: HashMap<String, CategoryEncoder>,
}

impl TrainingMatrix {
    /// Builds the matrix in [`feature_columns`] order.
    ///
    /// Missing numeric values are filled with the column mean over the retained
    /// rows (`0.0` if the column has no values at all). Missing categorical values
    /// become [`UNKNOWN_CATEGORY`] before encoding.
    pub fn build(data: &TrainingFrame, config: &FeatureConfig) -> Result<Self, TrainingError> {
        let columns = feature_columns(config);
        let height = data.height();
        let mut by_column: HashMap<&str, Vec<f64>> = HashMap::with_capacity(columns.len());

        let temporal: Vec<[f64; 8]> = extract_all(&data.dates, data.reference_date)
            .iter()
            .map(|t| t.values())
            .collect();
        for (idx, name) in TEMPORAL_FEATURE_NAMES.iter().enumerate() {
            by_column.insert(*name, temporal.iter().map(|values| values[idx]).collect());
        }

        let mut encoders = HashMap::new();
        for name in config.encoded_columns() {
            let values: Vec<String> = data
                .string_values(name)?
                .into_iter()
                .map(|value| value.unwrap_or_else(|| UNKNOWN_CATEGORY.to_string()))
                .collect();
            let encoder = CategoryEncoder::fit(values.iter().map(|v| Some(v.as_str())));
            let codes = values
                .iter()
                .map(|v| f64::from(encoder.encode(Some(v))))
                .collect();
            by_column.insert(name, codes);
            encoders.insert(name.to_string(), encoder);
        }

        for name in &config.numeric {
            let values = data.float_values(name)?;
            by_column.insert(name.as_str(), fill_with_mean(&values));
        }

        let ordered: Vec<Option<&Vec<f64>>> = columns
            .iter()
            .map(|name| by_column.get(name.as_str()))
            .collect();
        let rows = (0..height)
            .map(|row| {
                ordered
                    .iter()
                    .map(|values| values.map_or(0.0, |values| values[row]))
                    .collect()
            })
            .collect();

        Ok(Self {
            columns,
            rows,
            labels: data.labels.clone(),
            encoders,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows and labels at `indices`.
    pub fn select(&self, indices: &[usize]) -> (Vec<Vec<f64>>, Vec<bool>) {
        indices
            .iter()
            .map(|&i| (self.rows[i].clone(), self.labels[i]))
            .unzip()
    }
}

fn fill_with_mean(values: &[Option<f64>]) -> Vec<f64> {
    let observed: Vec<f64> = values
        .iter()
        .flatten()
        .copied()
        .filter(|v| v.is_finite())
        .collect();
    let mean = if observed.is_empty() {
        0.0
    } else {
        observed.iter().sum::<f64>() / observed.len() as f64
    };
    values
        .iter()
        .map(|value| value.filter(|v| v.is_finite()).unwrap_or(mean))
        .collect()
}

/// Deterministically shuffles `0..n` and splits it into `(train, validation)`.
///
/// The validation part holds `round(n * fraction)` indices but never all of them.
pub fn train_validation_split(
    n: usize,
    fraction: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>), TrainingError> {
    if !(0.0..1.0).contains(&fraction) {
        return Err(TrainingError::InvalidSplit(fraction));
    }
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_validation = ((n as f64 * fraction).round() as usize).min(n.saturating_sub(1));
    let validation = indices.split_off(n - n_validation);
    Ok((indices, validation))
}
