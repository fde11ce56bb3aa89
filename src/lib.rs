//! Next-day rain prediction from nothing but a date and a place name, and rainfall
//! estimates from satellite precipitation grids.
//!
//! The two pipelines are independent:
//!
//! * [`RainPredictor`] reconstructs a full weather feature vector from per-location
//!   historical statistics (month-specific, then location-wide, then global) and
//!   feeds it to a random forest.
//! * [`RainfallEstimator`] samples every grid file in a directory at a coordinate,
//!   falling back to neighbourhood averages around masked cells.

mod error;
mod features;
mod grid;
mod model;
mod predictor;
mod stats;
mod training;
mod types;
mod utils;

pub use error::RaincastError;
pub use predictor::RainPredictor;

pub use features::backfill::{feature_columns, Backfill, BackfilledFeatures, FallbackTier};
pub use features::config::{FeatureConfig, DEFAULT_CATEGORICAL_FEATURES, DEFAULT_NUMERIC_FEATURES};
pub use features::encoder::{CategoryEncoder, UNKNOWN_CATEGORY};
pub use features::temporal::{extract_all, TemporalFeatures, TEMPORAL_FEATURE_NAMES};

pub use stats::builder::{build_statistics, seasonal_coverage};
pub use stats::location_stats::{FeatureStats, LocationStats, NumericSummary, StatisticsTable};

pub use training::data_loader::{load_csv, load_csv_bytes, TrainingFrame};
pub use training::matrix::{train_validation_split, TrainingMatrix};
pub use training::synthetic::{synthetic_weather_frame, SYNTHETIC_LOCATIONS};
pub use training::trainer::{fit_model, ConfusionCounts, TrainOptions, TrainingReport};

pub use model::artifact::{default_model_path, ARTIFACT_VERSION};
pub use model::decision_tree::{DecisionTree, TreeLimits, TreeNode};
pub use model::random_forest::{ForestParams, RainClassifier, RandomForest};
pub use model::scaler::StandardScaler;
pub use model::trained::TrainedModel;

pub use grid::estimate::{FileSample, RainfallEstimate, RainfallEstimator};
pub use grid::intensity::RainIntensity;
#[cfg(feature = "hdf5")]
pub use grid::reader::Hdf5GridReader;
pub use grid::reader::GridReader;
pub use grid::precip_grid::{
    is_valid, nearest_index, normalize_longitude, GridSample, PrecipGrid, DEFAULT_MAX_RADIUS,
    MISSING_VALUE,
};

pub use types::prediction::{ConfidenceBand, ModelSummary, RainLabel, RainPrediction};
pub use types::request::{
    BatchPredictRequest, CoordinateInput, GridQuery, GridRequest, PredictQuery, PredictRequest,
};

pub use grid::error::GridError;
pub use model::error::ModelError;
pub use training::error::TrainingError;
pub use types::error::InputError;
