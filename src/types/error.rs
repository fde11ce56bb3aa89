use thiserror::Error;

/// Malformed caller input, rejected before any statistics are consulted.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Missing \"{0}\" field")]
    MissingField(&'static str),

    #[error("Invalid date '{value}', expected YYYY-MM-DD")]
    InvalidDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Field \"{field}\" is not a number: '{value}'")]
    NonNumericCoordinate { field: &'static str, value: String },

    #[error("Field \"{field}\" must be finite, got {value}")]
    NonFiniteCoordinate { field: &'static str, value: f64 },

    #[error("Latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("Invalid entry {index} in batch")]
    InBatch {
        index: usize,
        #[source]
        source: Box<InputError>,
    },
}
