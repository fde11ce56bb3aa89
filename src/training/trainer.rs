use crate::features::config::FeatureConfig;
use crate::model::random_forest::{ForestParams, RainClassifier, RandomForest};
use crate::model::scaler::StandardScaler;
use crate::model::trained::TrainedModel;
use crate::stats::builder::build_statistics;
use crate::training::data_loader::TrainingFrame;
use crate::training::error::TrainingError;
use crate::training::matrix::{train_validation_split, TrainingMatrix};
use bon::Builder;
use chrono::NaiveDate;
use log::info;
use serde::{Deserialize, Serialize};

/// How a model is fitted.
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct TrainOptions {
    /// Fraction of rows held out to measure accuracy.
    #[builder(default = 0.2)]
    pub validation_split: f64,
    #[builder(default = 42)]
    pub split_seed: u64,
    #[builder(default)]
    pub forest: ForestParams,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Outcome counts on the validation rows; "positive" means rain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionCounts {
    pub true_positive: usize,
    pub false_positive: usize,
    pub true_negative: usize,
    pub false_negative: usize,
}

impl ConfusionCounts {
    pub fn record(&mut self, predicted: bool, actual: bool) {
        match (predicted, actual) {
            (true, true) => self.true_positive += 1,
            (true, false) => self.false_positive += 1,
            (false, false) => self.true_negative += 1,
            (false, true) => self.false_negative += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }

    /// `None` when nothing was recorded.
    pub fn accuracy(&self) -> Option<f64> {
        let total = self.total();
        (total > 0).then(|| (self.true_positive + self.true_negative) as f64 / total as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub samples: usize,
    pub training_samples: usize,
    pub validation_samples: usize,
    pub locations: usize,
    pub features: usize,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    /// Validation accuracy; `None` if no rows were held out.
    pub accuracy: Option<f64>,
    pub confusion: ConfusionCounts,
}

/// Aggregates statistics, builds the matrix, fits scaler and forest, and scores
/// the held-out rows.
pub fn fit_model(
    data: &TrainingFrame,
    config: &FeatureConfig,
    options: &TrainOptions,
) -> Result<(TrainedModel<RandomForest>, TrainingReport), TrainingError> {
    let statistics = build_statistics(data, config)?;
    let matrix = TrainingMatrix::build(data, config)?;
    let (train_idx, validation_idx) =
        train_validation_split(matrix.len(), options.validation_split, options.split_seed)?;

    let (train_rows, train_labels) = matrix.select(&train_idx);
    let scaler = StandardScaler::fit(&train_rows)?;
    let scaled = scaler.transform_all(&train_rows)?;
    info!(
        "Fitting {} trees on {} rows x {} features",
        options.forest.n_estimators,
        scaled.len(),
        matrix.columns.len()
    );
    let classifier = RandomForest::fit(&scaled, &train_labels, &options.forest)?;

    let (validation_rows, validation_labels) = matrix.select(&validation_idx);
    let mut confusion = ConfusionCounts::default();
    for (row, actual) in validation_rows.iter().zip(validation_labels) {
        let predicted = classifier.predict(&scaler.transform(row)?)?;
        confusion.record(predicted, actual);
    }

    let report = TrainingReport {
        samples: matrix.len(),
        training_samples: train_idx.len(),
        validation_samples: validation_idx.len(),
        locations: statistics.len(),
        features: matrix.columns.len(),
        date_range: data.date_range(),
        accuracy: confusion.accuracy(),
        confusion,
    };
    match report.accuracy {
        Some(accuracy) => info!(
            "Validation accuracy {:.3} on {} rows",
            accuracy, report.validation_samples
        ),
        None => info!("No validation rows held out"),
    }

    let model = TrainedModel {
        config: config.clone(),
        feature_columns: matrix.columns,
        encoders: matrix.encoders,
        scaler,
        classifier,
        statistics,
        reference_date: data.reference_date,
    };
    Ok((model, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confusion_counts() {
        let mut counts = ConfusionCounts::default();
        assert_eq!(counts.accuracy(), None);
        counts.record(true, true);
        counts.record(false, false);
        counts.record(true, false);
        counts.record(false, true);
        counts.record(false, false);
        assert_eq!(counts.total(), 5);
        assert_eq!(counts.accuracy(), Some(0.6));
        assert_eq!(counts.false_negative, 1);
    }

    #[test]
    fn option_defaults() {
        let options = TrainOptions::default();
        assert_eq!(options.validation_split, 0.2);
        assert_eq!(options.split_seed, 42);
        assert_eq!(options.forest, ForestParams::default());
    }
}
