use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordinal label for a mean precipitation rate in mm/hr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RainIntensity {
    #[serde(rename = "no rain")]
    None,
    #[serde(rename = "light rain")]
    Light,
    #[serde(rename = "moderate rain")]
    Moderate,
    #[serde(rename = "heavy rain")]
    Heavy,
}

impl RainIntensity {
    /// `< 0.1` none, `[0.1, 1)` light, `[1, 4)` moderate, `>= 4` heavy.
    pub fn from_rate(mm_per_hr: f64) -> Self {
        if mm_per_hr < 0.1 {
            RainIntensity::None
        } else if mm_per_hr < 1.0 {
            RainIntensity::Light
        } else if mm_per_hr < 4.0 {
            RainIntensity::Moderate
        } else {
            RainIntensity::Heavy
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RainIntensity::None => "no rain",
            RainIntensity::Light => "light rain",
            RainIntensity::Moderate => "moderate rain",
            RainIntensity::Heavy => "heavy rain",
        }
    }
}

impl fmt::Display for RainIntensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
