//! Random forest of CART trees.
//!
//! Every tree is grown on a bootstrap sample of the training rows and looks at a
//! random subset of the features at each split. The forest's rain probability is
//! the mean of the trees' leaf probabilities.

use crate::model::decision_tree::{DecisionTree, TreeLimits};
use crate::model::error::ModelError;
use bon::Builder;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Anything that turns a scaled feature vector into a rain probability.
pub trait RainClassifier {
    /// Number of features the classifier was trained on.
    fn n_features(&self) -> usize;

    /// Probability of rain in `[0, 1]`.
    fn predict_proba(&self, features: &[f64]) -> Result<f64, ModelError>;

    /// Binary decision: rain iff the probability exceeds one half.
    fn predict(&self, features: &[f64]) -> Result<bool, ModelError> {
        Ok(self.predict_proba(features)? > 0.5)
    }
}

/// Hyper-parameters of [`RandomForest::fit`].
///
/// ```
/// use raincast::ForestParams;
///
/// let params = ForestParams::builder().n_estimators(50).build();
/// assert_eq!(params.max_depth, 25);
/// assert_eq!(params.seed, 42);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
pub struct ForestParams {
    #[builder(default = 200)]
    pub n_estimators: usize,
    #[builder(default = 25)]
    pub max_depth: usize,
    #[builder(default = 5)]
    pub min_samples_split: usize,
    #[builder(default = 2)]
    pub min_samples_leaf: usize,
    /// Features considered per split; `None` means the square root of the feature count.
    pub max_features: Option<usize>,
    #[builder(default = 42)]
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ForestParams {
    fn limits(&self, n_features: usize) -> TreeLimits {
        let max_features = self
            .max_features
            .unwrap_or_else(|| (n_features as f64).sqrt().round() as usize)
            .clamp(1, n_features.max(1));
        TreeLimits {
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split.max(2),
            min_samples_leaf: self.min_samples_leaf.max(1),
            max_features,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_features: usize,
}

impl RandomForest {
    /// Trains a forest on `rows` (all of equal width) and their labels.
    ///
    /// # Errors
    ///
    /// * [`ModelError::EmptyTrainingSet`] if there are no rows.
    /// * [`ModelError::LabelCountMismatch`] if `labels` has a different length.
    /// * [`ModelError::FeatureCountMismatch`] if the rows are ragged.
    pub fn fit(
        rows: &[Vec<f64>],
        labels: &[bool],
        params: &ForestParams,
    ) -> Result<Self, ModelError> {
        let Some(first) = rows.first() else {
            return Err(ModelError::EmptyTrainingSet);
        };
        if rows.len() != labels.len() {
            return Err(ModelError::LabelCountMismatch {
                samples: rows.len(),
                labels: labels.len(),
            });
        }
        let n_features = first.len();
        if let Some(bad) = rows.iter().find(|row| row.len() != n_features) {
            return Err(ModelError::FeatureCountMismatch {
                expected: n_features,
                found: bad.len(),
            });
        }

        let limits = params.limits(n_features);
        let mut rng = StdRng::seed_from_u64(params.seed);
        let n = rows.len();
        let trees: Vec<DecisionTree> = (0..params.n_estimators.max(1))
            .map(|_| {
                let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                DecisionTree::fit(rows, labels, bootstrap, limits, &mut rng)
            })
            .collect();

        debug!(
            "Grew {} trees on {} rows x {} features (max depth reached {})",
            trees.len(),
            n,
            n_features,
            trees.iter().map(DecisionTree::depth).max().unwrap_or(0)
        );

        Ok(Self { trees, n_features })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }
}

impl RainClassifier for RandomForest {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, features: &[f64]) -> Result<f64, ModelError> {
        if features.len() != self.n_features {
            return Err(ModelError::FeatureCountMismatch {
                expected: self.n_features,
                found: features.len(),
            });
        }
        if self.trees.is_empty() {
            return Err(ModelError::NotFitted);
        }
        let sum: f64 = self.trees.iter().map(|t| t.predict_proba(features)).sum();
        Ok(sum / self.trees.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Rain iff humidity (feature 1) is high; feature 0 is noise.
    fn dataset() -> (Vec<Vec<f64>>, Vec<bool>) {
        let rows: Vec<Vec<f64>> = (0..60)
            .map(|i| vec![(i * 7 % 11) as f64, i as f64])
            .collect();
        let labels = (0..60).map(|i| i >= 30).collect();
        (rows, labels)
    }

    fn small_params() -> ForestParams {
        ForestParams::builder()
            .n_estimators(25)
            .max_depth(6)
            .max_features(2)
            .build()
    }

    #[test]
    fn separable_data_is_learned() {
        let (rows, labels) = dataset();
        let forest = RandomForest::fit(&rows, &labels, &small_params()).unwrap();
        assert_eq!(forest.n_trees(), 25);
        assert_eq!(forest.n_features(), 2);

        assert!(forest.predict_proba(&[3.0, 2.0]).unwrap() < 0.2);
        assert!(forest.predict_proba(&[3.0, 58.0]).unwrap() > 0.8);
        assert!(!forest.predict(&[3.0, 5.0]).unwrap());
        assert!(forest.predict(&[3.0, 55.0]).unwrap());
    }

    #[test]
    fn same_seed_same_forest() {
        let (rows, labels) = dataset();
        let a = RandomForest::fit(&rows, &labels, &small_params()).unwrap();
        let b = RandomForest::fit(&rows, &labels, &small_params()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn probabilities_stay_in_unit_interval() {
        let (rows, labels) = dataset();
        let forest = RandomForest::fit(&rows, &labels, &small_params()).unwrap();
        for row in &rows {
            let p = forest.predict_proba(row).unwrap();
            assert!((0.0..=1.0).contains(&p));
        }
    }

    #[test]
    fn input_validation() {
        let (rows, labels) = dataset();
        assert!(matches!(
            RandomForest::fit(&[], &[], &small_params()),
            Err(ModelError::EmptyTrainingSet)
        ));
        assert!(matches!(
            RandomForest::fit(&rows, &labels[..10], &small_params()),
            Err(ModelError::LabelCountMismatch {
                samples: 60,
                labels: 10
            })
        ));
        let forest = RandomForest::fit(&rows, &labels, &small_params()).unwrap();
        assert!(matches!(
            forest.predict_proba(&[1.0]),
            Err(ModelError::FeatureCountMismatch {
                expected: 2,
                found: 1
            })
        ));
    }

    #[test]
    fn default_params() {
        let params = ForestParams::default();
        assert_eq!(params.n_estimators, 200);
        assert_eq!(params.min_samples_split, 5);
        assert_eq!(params.min_samples_leaf, 2);
        assert_eq!(params.max_features, None);
        assert_eq!(params.limits(29).max_features, 5);
    }
}
