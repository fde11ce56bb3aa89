use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RainLabel {
    Yes,
    No,
}

impl From<bool> for RainLabel {
    fn from(rain: bool) -> Self {
        if rain {
            RainLabel::Yes
        } else {
            RainLabel::No
        }
    }
}

impl fmt::Display for RainLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RainLabel::Yes => write!(f, "Yes"),
            RainLabel::No => write!(f, "No"),
        }
    }
}

/// Coarse reading of a rain probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfidenceBand {
    /// Probability above 0.7.
    High,
    /// Probability above 0.4, up to 0.7.
    Moderate,
    Low,
}

impl ConfidenceBand {
    pub fn from_probability(probability: f64) -> Self {
        if probability > 0.7 {
            ConfidenceBand::High
        } else if probability > 0.4 {
            ConfidenceBand::Moderate
        } else {
            ConfidenceBand::Low
        }
    }
}

impl fmt::Display for ConfidenceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConfidenceBand::High => "High",
            ConfidenceBand::Moderate => "Moderate",
            ConfidenceBand::Low => "Low",
        };
        f.write_str(name)
    }
}

/// Rain forecast for the day after `date` at `location`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RainPrediction {
    pub date: NaiveDate,
    pub location: String,
    pub prediction: RainLabel,
    /// Probability of rain in `[0, 1]`.
    pub probability: f64,
    /// Probability as a percentage with one decimal, e.g. `"73.5%"`.
    pub confidence: String,
    pub band: ConfidenceBand,
}

impl RainPrediction {
    pub fn new(date: NaiveDate, location: impl Into<String>, probability: f64) -> Self {
        Self {
            date,
            location: location.into(),
            prediction: RainLabel::from(probability > 0.5),
            probability,
            confidence: format!("{:.1}%", probability * 100.0),
            band: ConfidenceBand::from_probability(probability),
        }
    }

    /// E.g. `"Moderate chance of rain tomorrow"`.
    pub fn interpretation(&self) -> String {
        format!("{} chance of rain tomorrow", self.band)
    }
}

/// Health/status view of a predictor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub is_fitted: bool,
    pub locations: usize,
    pub reference_date: Option<NaiveDate>,
    pub features: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 12, 25).unwrap()
    }

    #[test]
    fn bands_follow_thresholds() {
        assert_eq!(ConfidenceBand::from_probability(0.71), ConfidenceBand::High);
        assert_eq!(ConfidenceBand::from_probability(0.7), ConfidenceBand::Moderate);
        assert_eq!(ConfidenceBand::from_probability(0.41), ConfidenceBand::Moderate);
        assert_eq!(ConfidenceBand::from_probability(0.4), ConfidenceBand::Low);
        assert_eq!(ConfidenceBand::from_probability(0.0), ConfidenceBand::Low);
    }

    #[test]
    fn prediction_fields() {
        let p = RainPrediction::new(date(), "Sydney", 0.7351);
        assert_eq!(p.prediction, RainLabel::Yes);
        assert_eq!(p.confidence, "73.5%");
        assert_eq!(p.interpretation(), "High chance of rain tomorrow");

        let p = RainPrediction::new(date(), "Sydney", 0.5);
        assert_eq!(p.prediction, RainLabel::No);
        assert_eq!(p.confidence, "50.0%");
        assert_eq!(p.interpretation(), "Moderate chance of rain tomorrow");
    }

    #[test]
    fn serializes_for_http_layers() {
        let p = RainPrediction::new(date(), "Perth", 0.1);
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["date"], "2025-12-25");
        assert_eq!(json["prediction"], "No");
        assert_eq!(json["band"], "Low");
        assert_eq!(json["confidence"], "10.0%");
    }
}
