use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GridError {
    #[error("Failed to read grid directory '{0}'")]
    DirectoryRead(PathBuf, #[source] std::io::Error),

    #[cfg(feature = "hdf5")]
    #[error("Failed to read HDF5 grid '{0}'")]
    Hdf5(PathBuf, #[source] hdf5::Error),

    #[error("Grid has an empty latitude or longitude axis")]
    EmptyCoordinates,

    #[error("Precipitation shape {shape:?} does not match {lat} latitudes x {lon} longitudes")]
    ShapeMismatch {
        shape: Vec<usize>,
        lat: usize,
        lon: usize,
    },

    #[error("Shape {shape:?} implies {expected} values, got {found}")]
    ValueCountMismatch {
        shape: Vec<usize>,
        expected: usize,
        found: usize,
    },

    #[error("No valid precipitation data found near ({latitude}, {longitude})")]
    NoData { latitude: f64, longitude: f64 },

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
