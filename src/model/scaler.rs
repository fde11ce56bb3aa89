use crate::model::error::ModelError;
use serde::{Deserialize, Serialize};

/// Zero-mean, unit-variance standardization with parameters frozen at fit time.
///
/// Columns with zero variance keep a scale of `1.0`, so they are only centred.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self, ModelError> {
        let Some(first) = rows.first() else {
            return Err(ModelError::EmptyTrainingSet);
        };
        let width = first.len();
        if let Some(bad) = rows.iter().find(|row| row.len() != width) {
            return Err(ModelError::FeatureCountMismatch {
                expected: width,
                found: bad.len(),
            });
        }

        let n = rows.len() as f64;
        let mut mean = vec![0.0; width];
        for row in rows {
            for (acc, value) in mean.iter_mut().zip(row) {
                *acc += value;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        let mut variance = vec![0.0; width];
        for row in rows {
            for ((acc, value), m) in variance.iter_mut().zip(row).zip(&mean) {
                *acc += (value - m).powi(2);
            }
        }
        let scale = variance
            .into_iter()
            .map(|v| {
                let std = (v / n).sqrt();
                if std > f64::EPSILON {
                    std
                } else {
                    1.0
                }
            })
            .collect();

        Ok(Self { mean, scale })
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>, ModelError> {
        if row.len() != self.mean.len() {
            return Err(ModelError::FeatureCountMismatch {
                expected: self.mean.len(),
                found: row.len(),
            });
        }
        Ok(row
            .iter()
            .zip(&self.mean)
            .zip(&self.scale)
            .map(|((value, mean), scale)| (value - mean) / scale)
            .collect())
    }

    pub fn transform_all(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ModelError> {
        rows.iter().map(|row| self.transform(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standardizes_columns() {
        let rows = vec![vec![1.0, 5.0], vec![3.0, 5.0]];
        let scaler = StandardScaler::fit(&rows).unwrap();
        assert_eq!(scaler.transform(&[1.0, 5.0]).unwrap(), vec![-1.0, 0.0]);
        assert_eq!(scaler.transform(&[3.0, 7.0]).unwrap(), vec![1.0, 2.0]);
        assert_eq!(scaler.n_features(), 2);
    }

    #[test]
    fn rejects_wrong_width() {
        let scaler = StandardScaler::fit(&[vec![1.0, 2.0]]).unwrap();
        assert!(matches!(
            scaler.transform(&[1.0]),
            Err(ModelError::FeatureCountMismatch {
                expected: 2,
                found: 1
            })
        ));
        assert!(matches!(
            StandardScaler::fit(&[]),
            Err(ModelError::EmptyTrainingSet)
        ));
    }
}
