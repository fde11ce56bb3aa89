use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model must be trained or loaded before predicting")]
    NotFitted,

    #[error("Expected {expected} features, got {found}")]
    FeatureCountMismatch { expected: usize, found: usize },

    #[error("Cannot fit on an empty training set")]
    EmptyTrainingSet,

    #[error("Training labels ({labels}) do not match sample count ({samples})")]
    LabelCountMismatch { samples: usize, labels: usize },

    #[error("Failed to determine model directory")]
    ModelDirResolution,

    #[error("Failed to create model directory '{0}'")]
    ModelDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to read model file '{0}'")]
    ArtifactRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to write model file '{0}'")]
    ArtifactWrite(PathBuf, #[source] std::io::Error),

    #[error("Failed to decode model data from '{0}'")]
    ArtifactDecode(PathBuf, #[source] Box<bincode::error::DecodeError>),

    #[error("Failed to encode model data")]
    ArtifactEncode(#[source] Box<bincode::error::EncodeError>),

    #[error("Model file '{path}' has format version {found}, expected {expected}")]
    UnsupportedVersion {
        path: PathBuf,
        found: u32,
        expected: u32,
    },

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
