//! Calendar features derived from a single date.
//!
//! Cyclical quantities are encoded as `sin(2πx/period)` / `cos(2πx/period)` pairs so
//! that neighbouring values across the wrap-around (31 December and 1 January,
//! Sunday and Monday) stay numerically close.

use chrono::{Datelike, NaiveDate};
use std::f64::consts::PI;

const DAY_OF_YEAR_PERIOD: f64 = 365.25;
const MONTH_PERIOD: f64 = 12.0;
const DAY_OF_WEEK_PERIOD: f64 = 7.0;

/// Names of the temporal features, in the order [`TemporalFeatures::values`] yields them.
pub const TEMPORAL_FEATURE_NAMES: [&str; 8] = [
    "day_of_year_sin",
    "day_of_year_cos",
    "month",
    "month_sin",
    "month_cos",
    "day_of_week_sin",
    "day_of_week_cos",
    "days_from_reference",
];

/// The derived calendar fields for one date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemporalFeatures {
    pub day_of_year_sin: f64,
    pub day_of_year_cos: f64,
    pub month: u32,
    pub month_sin: f64,
    pub month_cos: f64,
    pub day_of_week_sin: f64,
    pub day_of_week_cos: f64,
    /// Signed day count since the reference date (0 when no reference is stored).
    pub days_from_reference: i64,
}

fn cyclical(value: f64, period: f64) -> (f64, f64) {
    let angle = 2.0 * PI * value / period;
    (angle.sin(), angle.cos())
}

impl TemporalFeatures {
    /// Derives the calendar fields for `date`.
    ///
    /// Day of year is 1-based; day of week counts Monday as 0.
    pub fn extract(date: NaiveDate, reference: Option<NaiveDate>) -> Self {
        let (day_of_year_sin, day_of_year_cos) =
            cyclical(f64::from(date.ordinal()), DAY_OF_YEAR_PERIOD);
        let month = date.month();
        let (month_sin, month_cos) = cyclical(f64::from(month), MONTH_PERIOD);
        let (day_of_week_sin, day_of_week_cos) = cyclical(
            f64::from(date.weekday().num_days_from_monday()),
            DAY_OF_WEEK_PERIOD,
        );
        let days_from_reference = reference
            .map(|reference| date.signed_duration_since(reference).num_days())
            .unwrap_or(0);

        Self {
            day_of_year_sin,
            day_of_year_cos,
            month,
            month_sin,
            month_cos,
            day_of_week_sin,
            day_of_week_cos,
            days_from_reference,
        }
    }

    /// The fields as feature values, ordered like [`TEMPORAL_FEATURE_NAMES`].
    pub fn values(&self) -> [f64; 8] {
        [
            self.day_of_year_sin,
            self.day_of_year_cos,
            f64::from(self.month),
            self.month_sin,
            self.month_cos,
            self.day_of_week_sin,
            self.day_of_week_cos,
            self.days_from_reference as f64,
        ]
    }

    /// Value of a single named temporal feature.
    pub fn get(&self, name: &str) -> Option<f64> {
        TEMPORAL_FEATURE_NAMES
            .iter()
            .position(|candidate| *candidate == name)
            .map(|idx| self.values()[idx])
    }
}

/// Extracts features for many dates against the same reference.
pub fn extract_all(dates: &[NaiveDate], reference: Option<NaiveDate>) -> Vec<TemporalFeatures> {
    dates
        .iter()
        .map(|date| TemporalFeatures::extract(*date, reference))
        .collect()
}
