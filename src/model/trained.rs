use crate::features::backfill::{Backfill, BackfilledFeatures};
use crate::features::config::FeatureConfig;
use crate::features::encoder::CategoryEncoder;
use crate::model::error::ModelError;
use crate::model::random_forest::RainClassifier;
use crate::model::scaler::StandardScaler;
use crate::stats::location_stats::StatisticsTable;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Everything produced by training, persisted and loaded as one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel<C> {
    pub config: FeatureConfig,
    /// Feature names in the order the classifier was fitted on.
    pub feature_columns: Vec<String>,
    /// One encoder per entry of [`FeatureConfig::encoded_columns`].
    pub encoders: HashMap<String, CategoryEncoder>,
    pub scaler: StandardScaler,
    pub classifier: C,
    pub statistics: StatisticsTable,
    /// Earliest date of the training data; origin of `days_from_reference`.
    pub reference_date: Option<NaiveDate>,
}

impl<C: RainClassifier> TrainedModel<C> {
    pub fn backfill(&self) -> Backfill<'_> {
        Backfill {
            config: &self.config,
            stats: &self.statistics,
            encoders: &self.encoders,
            reference_date: self.reference_date,
        }
    }

    /// Unscaled feature vector for `(date, location)`.
    pub fn features_for(&self, date: NaiveDate, location: &str) -> BackfilledFeatures {
        self.backfill()
            .assemble(date, location, &self.feature_columns)
    }

    pub fn predict_proba(&self, date: NaiveDate, location: &str) -> Result<f64, ModelError> {
        let features = self.features_for(date, location);
        let scaled = self.scaler.transform(&features.values)?;
        self.classifier.predict_proba(&scaled)
    }
}
