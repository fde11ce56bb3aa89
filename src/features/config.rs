//! Column layout shared by training and inference.

use serde::{Deserialize, Serialize};

/// Numeric weather columns of the weatherAUS dataset, in feature order.
pub const DEFAULT_NUMERIC_FEATURES: [&str; 16] = [
    "MinTemp",
    "MaxTemp",
    "Rainfall",
    "Evaporation",
    "Sunshine",
    "WindGustSpeed",
    "WindSpeed9am",
    "WindSpeed3pm",
    "Humidity9am",
    "Humidity3pm",
    "Pressure9am",
    "Pressure3pm",
    "Cloud9am",
    "Cloud3pm",
    "Temp9am",
    "Temp3pm",
];

/// Categorical weather columns of the weatherAUS dataset, in feature order.
pub const DEFAULT_CATEGORICAL_FEATURES: [&str; 4] =
    ["WindGustDir", "WindDir9am", "WindDir3pm", "RainToday"];

/// Describes which columns of the historical dataset feed the model and how
/// missing inputs are reconstructed at inference time.
///
/// The same configuration is stored inside the trained model so inference
/// always assembles vectors with the layout the classifier was fitted on.
///
/// # Examples
///
/// ```
/// use raincast::FeatureConfig;
///
/// let config = FeatureConfig::default();
/// assert_eq!(config.location_column, "Location");
/// assert_eq!(config.numeric.len(), 16);
/// assert!(config.seasonal_refinement);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Column holding the observation date (`YYYY-MM-DD`).
    pub date_column: String,
    /// Column holding the place name. Also encoded as a categorical feature.
    pub location_column: String,
    /// Column holding the `Yes`/`No` label.
    pub target_column: String,
    /// Numeric features, back-filled from means.
    pub numeric: Vec<String>,
    /// Categorical features, back-filled from modes.
    pub categorical: Vec<String>,
    /// Consult the per-location, per-month means before the location-wide mean.
    pub seasonal_refinement: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            date_column: "Date".to_string(),
            location_column: "Location".to_string(),
            target_column: "RainTomorrow".to_string(),
            numeric: DEFAULT_NUMERIC_FEATURES.iter().map(|s| s.to_string()).collect(),
            categorical: DEFAULT_CATEGORICAL_FEATURES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            seasonal_refinement: true,
        }
    }
}

impl FeatureConfig {
    /// Location column followed by the categorical features; every one of
    /// these gets its own [`crate::CategoryEncoder`].
    pub fn encoded_columns(&self) -> Vec<&str> {
        std::iter::once(self.location_column.as_str())
            .chain(self.categorical.iter().map(String::as_str))
            .collect()
    }
}
