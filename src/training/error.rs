use crate::model::error::ModelError;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("Failed to read training data '{0}'")]
    CsvReadIo(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse training data '{0}'")]
    CsvReadPolars(PathBuf, #[source] PolarsError),

    #[error("Failed to buffer in-memory training data")]
    TempFile(#[source] std::io::Error),

    #[error("Missing required column '{0}'")]
    MissingColumn(String),

    #[error("Column '{column}' could not be converted: {source}")]
    ColumnConversion {
        column: String,
        #[source]
        source: PolarsError,
    },

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),

    #[error("No rows with a valid date and a '{target}' value of Yes or No")]
    NoUsableRows { target: String },

    #[error("Validation split {0} must lie in [0, 1)")]
    InvalidSplit(f64),

    #[error("Model fitting failed")]
    Fit(#[from] ModelError),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
