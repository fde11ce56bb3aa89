use crate::grid::error::GridError;
use crate::model::error::ModelError;
use crate::training::error::TrainingError;
use crate::types::error::InputError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RaincastError {
    #[error(transparent)]
    Training(#[from] TrainingError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    Input(#[from] InputError),
}

impl RaincastError {
    /// Whether the caller sent bad input, as opposed to an internal failure.
    pub fn is_client_error(&self) -> bool {
        matches!(self, RaincastError::Input(_))
    }
}
