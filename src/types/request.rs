//! Raw request payloads as an HTTP layer would deserialize them, and their
//! validation into typed queries.

use crate::types::error::InputError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// `{"date": "2025-12-25", "location": "Sydney"}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictRequest {
    pub date: Option<String>,
    pub location: Option<String>,
}

/// A validated prediction request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictQuery {
    pub date: NaiveDate,
    pub location: String,
}

impl PredictRequest {
    pub fn new(date: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            date: Some(date.into()),
            location: Some(location.into()),
        }
    }

    pub fn validate(&self) -> Result<PredictQuery, InputError> {
        let raw_date = self
            .date
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .ok_or(InputError::MissingField("date"))?;
        let location = self
            .location
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .ok_or(InputError::MissingField("location"))?;
        let date = NaiveDate::parse_from_str(raw_date, DATE_FORMAT).map_err(|source| {
            InputError::InvalidDate {
                value: raw_date.to_string(),
                source,
            }
        })?;
        // Location names are matched exactly, so they are passed through untouched.
        Ok(PredictQuery {
            date,
            location: location.to_string(),
        })
    }
}

/// `{"predictions": [{"date": ..., "location": ...}, ...]}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchPredictRequest {
    pub predictions: Option<Vec<PredictRequest>>,
}

impl BatchPredictRequest {
    /// Validates every entry; the first invalid one fails the whole batch.
    pub fn validate(&self) -> Result<Vec<PredictQuery>, InputError> {
        let entries = self
            .predictions
            .as_ref()
            .ok_or(InputError::MissingField("predictions"))?;
        entries
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                entry.validate().map_err(|e| InputError::InBatch {
                    index,
                    source: Box::new(e),
                })
            })
            .collect()
    }
}

/// A coordinate as sent by clients: a JSON number or a numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CoordinateInput {
    Number(f64),
    Text(String),
}

impl CoordinateInput {
    fn parse(&self, field: &'static str) -> Result<f64, InputError> {
        let value = match self {
            CoordinateInput::Number(value) => *value,
            CoordinateInput::Text(text) => {
                text.trim()
                    .parse::<f64>()
                    .map_err(|_| InputError::NonNumericCoordinate {
                        field,
                        value: text.clone(),
                    })?
            }
        };
        if !value.is_finite() {
            return Err(InputError::NonFiniteCoordinate { field, value });
        }
        Ok(value)
    }
}

/// `{"lat": -33.87, "lon": "151.21"}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GridRequest {
    pub lat: Option<CoordinateInput>,
    pub lon: Option<CoordinateInput>,
}

/// A validated grid lookup target. Longitude may still lie outside `[-180, 180]`;
/// the grid lookup normalizes it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridQuery {
    pub latitude: f64,
    pub longitude: f64,
}

impl GridRequest {
    pub fn validate(&self) -> Result<GridQuery, InputError> {
        let latitude = self
            .lat
            .as_ref()
            .ok_or(InputError::MissingField("lat"))?
            .parse("lat")?;
        let longitude = self
            .lon
            .as_ref()
            .ok_or(InputError::MissingField("lon"))?
            .parse("lon")?;
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(InputError::LatitudeOutOfRange(latitude));
        }
        Ok(GridQuery {
            latitude,
            longitude,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_prediction_request() {
        let query = PredictRequest::new(" 2025-12-25 ", "Sydney").validate().unwrap();
        assert_eq!(query.date, NaiveDate::from_ymd_opt(2025, 12, 25).unwrap());
        assert_eq!(query.location, "Sydney");
    }

    #[test]
    fn prediction_request_errors() {
        let missing_date = PredictRequest {
            date: None,
            location: Some("Sydney".into()),
        };
        assert!(matches!(
            missing_date.validate(),
            Err(InputError::MissingField("date"))
        ));
        let blank_location = PredictRequest::new("2025-12-25", "  ");
        assert!(matches!(
            blank_location.validate(),
            Err(InputError::MissingField("location"))
        ));
        assert!(matches!(
            PredictRequest::new("25/12/2025", "Sydney").validate(),
            Err(InputError::InvalidDate { .. })
        ));
        assert!(matches!(
            PredictRequest::new("2025-02-30", "Sydney").validate(),
            Err(InputError::InvalidDate { .. })
        ));
    }

    #[test]
    fn batch_reports_failing_index() {
        let batch: BatchPredictRequest = serde_json::from_str(
            r#"{"predictions": [
                {"date": "2025-12-25", "location": "Sydney"},
                {"date": "2025-12-26"}
            ]}"#,
        )
        .unwrap();
        match batch.validate() {
            Err(InputError::InBatch { index, source }) => {
                assert_eq!(index, 1);
                assert!(matches!(*source, InputError::MissingField("location")));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            BatchPredictRequest::default().validate(),
            Err(InputError::MissingField("predictions"))
        ));
    }

    #[test]
    fn grid_request_accepts_numbers_and_strings() {
        let request: GridRequest =
            serde_json::from_str(r#"{"lat": -33.87, "lon": " 151.21"}"#).unwrap();
        let query = request.validate().unwrap();
        assert_eq!(query.latitude, -33.87);
        assert_eq!(query.longitude, 151.21);
    }

    #[test]
    fn grid_request_errors() {
        let request: GridRequest = serde_json::from_str(r#"{"lat": "north", "lon": 1}"#).unwrap();
        assert!(matches!(
            request.validate(),
            Err(InputError::NonNumericCoordinate { field: "lat", .. })
        ));
        let request: GridRequest = serde_json::from_str(r#"{"lat": 1}"#).unwrap();
        assert!(matches!(
            request.validate(),
            Err(InputError::MissingField("lon"))
        ));
        let request: GridRequest = serde_json::from_str(r#"{"lat": 91, "lon": 0}"#).unwrap();
        assert!(matches!(
            request.validate(),
            Err(InputError::LatitudeOutOfRange(_))
        ));
        let request = GridRequest {
            lat: Some(CoordinateInput::Text("NaN".into())),
            lon: Some(CoordinateInput::Number(0.0)),
        };
        assert!(matches!(
            request.validate(),
            Err(InputError::NonFiniteCoordinate { field: "lat", .. })
        ));
    }
}
