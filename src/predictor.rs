//! The date-and-location rain predictor.

use crate::error::RaincastError;
use crate::features::backfill::BackfilledFeatures;
use crate::features::config::FeatureConfig;
use crate::model::artifact::{default_model_path, load_artifact, save_artifact};
use crate::model::error::ModelError;
use crate::model::random_forest::{RainClassifier, RandomForest};
use crate::model::trained::TrainedModel;
use crate::training::data_loader::{load_csv, TrainingFrame};
use crate::training::error::TrainingError;
use crate::training::trainer::{fit_model, TrainOptions, TrainingReport};
use crate::types::prediction::{ModelSummary, RainPrediction};
use crate::types::request::{BatchPredictRequest, PredictQuery, PredictRequest};
use chrono::NaiveDate;
use log::{debug, info};
use polars::prelude::DataFrame;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Predicts whether it rains tomorrow from only a date and a location name.
///
/// A predictor is either unfitted or wraps an immutable [`TrainedModel`]. Clones
/// share the model, so one instance can serve many concurrent callers without
/// locking.
///
/// # Examples
///
/// ```no_run
/// use chrono::NaiveDate;
/// use raincast::{FeatureConfig, RainPredictor, RaincastError, TrainOptions};
/// use std::path::Path;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), RaincastError> {
/// let (predictor, report) = RainPredictor::from_csv(
///     Path::new("weatherAUS.csv"),
///     FeatureConfig::default(),
///     TrainOptions::default(),
/// )
/// .await?;
/// println!("validation accuracy: {:?}", report.accuracy);
///
/// let christmas = NaiveDate::from_ymd_opt(2025, 12, 25).unwrap();
/// let prediction = predictor.predict(christmas, "Sydney")?;
/// println!("{} ({})", prediction.prediction, prediction.interpretation());
/// # Ok(())
/// # }
/// ```
pub struct RainPredictor<C = RandomForest> {
    model: Option<Arc<TrainedModel<C>>>,
}

impl<C> Clone for RainPredictor<C> {
    fn clone(&self) -> Self {
        Self {
            model: self.model.clone(),
        }
    }
}

impl<C> Default for RainPredictor<C> {
    fn default() -> Self {
        Self { model: None }
    }
}

impl<C> std::fmt::Debug for RainPredictor<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RainPredictor")
            .field("is_fitted", &self.model.is_some())
            .finish()
    }
}

impl RainPredictor<RandomForest> {
    /// Cleans `df`, aggregates the location statistics and fits the forest in a
    /// blocking task.
    pub async fn train(
        df: DataFrame,
        config: FeatureConfig,
        options: TrainOptions,
    ) -> Result<(Self, TrainingReport), RaincastError> {
        let (model, report) = tokio::task::spawn_blocking(move || {
            let data = TrainingFrame::prepare(&df, &config)?;
            info!(
                "Training on {} rows with {} numeric and {} categorical features",
                data.height(),
                config.numeric.len(),
                config.categorical.len()
            );
            fit_model(&data, &config, &options)
        })
        .await
        .map_err(TrainingError::from)??;
        Ok((Self::from_model(model), report))
    }

    /// Reads the CSV at `path` and trains on it.
    pub async fn from_csv(
        path: &Path,
        config: FeatureConfig,
        options: TrainOptions,
    ) -> Result<(Self, TrainingReport), RaincastError> {
        let df = load_csv(path).await?;
        Self::train(df, config, options).await
    }
}

impl<C> RainPredictor<C> {
    /// A predictor with no model; every prediction fails with [`ModelError::NotFitted`].
    pub fn unfitted() -> Self {
        Self::default()
    }

    pub fn from_model(model: TrainedModel<C>) -> Self {
        Self {
            model: Some(Arc::new(model)),
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.model.is_some()
    }

    pub fn model(&self) -> Result<&TrainedModel<C>, ModelError> {
        self.model.as_deref().ok_or(ModelError::NotFitted)
    }

    /// Known location names, sorted. Empty when unfitted.
    pub fn locations(&self) -> Vec<String> {
        self.model
            .as_ref()
            .map(|model| {
                model
                    .statistics
                    .location_names()
                    .into_iter()
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn summary(&self) -> ModelSummary {
        match self.model.as_deref() {
            Some(model) => ModelSummary {
                is_fitted: true,
                locations: model.statistics.len(),
                reference_date: model.reference_date,
                features: model.feature_columns.len(),
            },
            None => ModelSummary {
                is_fitted: false,
                locations: 0,
                reference_date: None,
                features: 0,
            },
        }
    }
}

impl<C: RainClassifier> RainPredictor<C> {
    /// The back-filled, unscaled feature vector the classifier sees for this input.
    pub fn features_for(
        &self,
        date: NaiveDate,
        location: &str,
    ) -> Result<BackfilledFeatures, ModelError> {
        Ok(self.model()?.features_for(date, location))
    }

    /// Rain forecast for the day after `date`. Unknown locations fall back to the
    /// dataset-wide statistics rather than failing.
    pub fn predict(&self, date: NaiveDate, location: &str) -> Result<RainPrediction, ModelError> {
        let probability = self.model()?.predict_proba(date, location)?;
        debug!(
            "{} on {}: rain probability {:.3}",
            location, date, probability
        );
        Ok(RainPrediction::new(date, location, probability))
    }

    pub fn predict_query(&self, query: &PredictQuery) -> Result<RainPrediction, ModelError> {
        self.predict(query.date, &query.location)
    }

    /// Predicts every query in order; the first failure aborts the batch.
    pub fn predict_batch(&self, queries: &[PredictQuery]) -> Result<Vec<RainPrediction>, ModelError> {
        queries.iter().map(|q| self.predict_query(q)).collect()
    }

    /// Validates a raw request, then predicts. Invalid input never reaches the model.
    pub fn predict_request(&self, request: &PredictRequest) -> Result<RainPrediction, RaincastError> {
        let query = request.validate()?;
        Ok(self.predict_query(&query)?)
    }

    pub fn predict_batch_request(
        &self,
        request: &BatchPredictRequest,
    ) -> Result<Vec<RainPrediction>, RaincastError> {
        let queries = request.validate()?;
        Ok(self.predict_batch(&queries)?)
    }
}

impl<C> RainPredictor<C>
where
    C: RainClassifier + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Writes the whole trained model to `path`.
    pub async fn save(&self, path: &Path) -> Result<(), ModelError> {
        let model = self.model.clone().ok_or(ModelError::NotFitted)?;
        save_artifact(model, path).await
    }

    pub async fn load(path: &Path) -> Result<Self, ModelError> {
        let model: TrainedModel<C> = load_artifact(path).await?;
        Ok(Self::from_model(model))
    }

    /// Saves to `<user cache dir>/raincast/weather_model.bin`.
    pub async fn save_default(&self) -> Result<(), ModelError> {
        self.save(&default_model_path()?).await
    }

    pub async fn load_default() -> Result<Self, ModelError> {
        Self::load(&default_model_path()?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::random_forest::ForestParams;
    use crate::training::synthetic::synthetic_weather_frame;

    fn options() -> TrainOptions {
        TrainOptions::builder()
            .forest(ForestParams::builder().n_estimators(15).max_depth(8).build())
            .build()
    }

    async fn trained() -> (RainPredictor, TrainingReport) {
        let df = synthetic_weather_frame(400, 3).unwrap();
        RainPredictor::train(df, FeatureConfig::default(), options())
            .await
            .unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn training_report_and_summary() {
        let (predictor, report) = trained().await;
        assert_eq!(report.samples, 400);
        assert_eq!(report.training_samples, 320);
        assert_eq!(report.validation_samples, 80);
        assert_eq!(report.features, 29);
        assert_eq!(report.locations, 8);
        assert_eq!(report.confusion.total(), 80);
        assert!(report.accuracy.is_some());

        let summary = predictor.summary();
        assert!(summary.is_fitted);
        assert_eq!(summary.locations, 8);
        assert_eq!(summary.features, 29);
        assert_eq!(summary.reference_date, report.date_range.map(|(first, _)| first));
        assert_eq!(predictor.locations().first().map(String::as_str), Some("Adelaide"));
    }

    #[tokio::test]
    async fn predictions_for_known_and_unknown_locations() {
        let (predictor, _) = trained().await;
        let known = predictor.predict(date(2025, 12, 25), "Sydney").unwrap();
        assert!((0.0..=1.0).contains(&known.probability));
        assert_eq!(known.location, "Sydney");

        let unknown = predictor.predict(date(2025, 12, 25), "Atlantis").unwrap();
        assert!((0.0..=1.0).contains(&unknown.probability));

        let features = predictor.features_for(date(2025, 12, 25), "Atlantis").unwrap();
        assert!(!features.known_location);
        assert_eq!(features.values.len(), 29);

        for location in predictor.locations() {
            let features = predictor.features_for(date(2024, 3, 1), &location).unwrap();
            assert_eq!(features.values.len(), 29);
            assert!(features.known_location);
        }
    }

    #[tokio::test]
    async fn batch_matches_single_predictions() {
        let (predictor, _) = trained().await;
        let queries = vec![
            PredictQuery {
                date: date(2025, 12, 25),
                location: "Sydney".into(),
            },
            PredictQuery {
                date: date(2025, 12, 26),
                location: "Melbourne".into(),
            },
        ];
        let batch = predictor.predict_batch(&queries).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[1], predictor.predict(date(2025, 12, 26), "Melbourne").unwrap());
    }

    #[tokio::test]
    async fn raw_requests_are_validated_first() {
        let (predictor, _) = trained().await;
        let ok = predictor
            .predict_request(&PredictRequest::new("2025-12-25", "Sydney"))
            .unwrap();
        assert_eq!(ok.date, date(2025, 12, 25));

        let err = predictor
            .predict_request(&PredictRequest::new("tomorrow", "Sydney"))
            .unwrap_err();
        assert!(err.is_client_error());

        // Input is checked before fitting state.
        let unfitted: RainPredictor = RainPredictor::unfitted();
        let err = unfitted
            .predict_batch_request(&BatchPredictRequest::default())
            .unwrap_err();
        assert!(err.is_client_error());
        let err = unfitted
            .predict_request(&PredictRequest::new("2025-12-25", "Sydney"))
            .unwrap_err();
        assert!(matches!(err, RaincastError::Model(ModelError::NotFitted)));
    }

    #[tokio::test]
    async fn unfitted_predictor_refuses_to_predict() {
        let predictor: RainPredictor = RainPredictor::unfitted();
        assert!(matches!(
            predictor.predict(date(2025, 1, 1), "Sydney"),
            Err(ModelError::NotFitted)
        ));
        assert!(predictor.locations().is_empty());
        assert!(!predictor.summary().is_fitted);
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            predictor.save(&dir.path().join("m.bin")).await,
            Err(ModelError::NotFitted)
        ));
    }

    #[tokio::test]
    async fn reloaded_model_predicts_identically() {
        let (predictor, _) = trained().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weather_model.bin");
        predictor.save(&path).await.unwrap();

        let reloaded: RainPredictor = RainPredictor::load(&path).await.unwrap();
        for (d, location) in [
            (date(2025, 12, 25), "Sydney"),
            (date(2026, 6, 1), "Darwin"),
            (date(2025, 7, 4), "Atlantis"),
        ] {
            assert_eq!(
                predictor.predict(d, location).unwrap(),
                reloaded.predict(d, location).unwrap()
            );
        }
        assert_eq!(predictor.model().unwrap(), reloaded.model().unwrap());
    }

    #[tokio::test]
    async fn training_without_target_column_fails() {
        let df = synthetic_weather_frame(10, 1)
            .unwrap()
            .drop("RainTomorrow")
            .unwrap();
        let err = RainPredictor::train(df, FeatureConfig::default(), options())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RaincastError::Training(TrainingError::MissingColumn(_))
        ));
    }
}
