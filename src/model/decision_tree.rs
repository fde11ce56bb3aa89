//! Binary CART classification tree.
//!
//! Nodes live in a flat array; the root is index 0. Samples with
//! `feature <= threshold` go left. Leaves store the fraction of positive
//! training samples that reached them, which is the tree's rain probability.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A node of a [`DecisionTree`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        /// Fraction of positive samples in this leaf.
        probability: f64,
        samples: usize,
    },
}

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeLimits {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features examined per split.
    pub max_features: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
    n_features: usize,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

fn gini(positives: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let p = positives as f64 / total as f64;
    2.0 * p * (1.0 - p)
}

impl DecisionTree {
    /// Grows a tree on the rows selected by `sample` (indices may repeat).
    pub fn fit<R: Rng>(
        rows: &[Vec<f64>],
        labels: &[bool],
        sample: Vec<usize>,
        limits: TreeLimits,
        rng: &mut R,
    ) -> Self {
        let n_features = rows.first().map(Vec::len).unwrap_or(0);
        let mut tree = Self {
            nodes: Vec::new(),
            n_features,
        };
        tree.grow(rows, labels, sample, 0, &limits, rng);
        tree
    }

    fn push_leaf(&mut self, labels: &[bool], sample: &[usize]) -> usize {
        let positives = sample.iter().filter(|&&i| labels[i]).count();
        let probability = if sample.is_empty() {
            0.0
        } else {
            positives as f64 / sample.len() as f64
        };
        self.nodes.push(TreeNode::Leaf {
            probability,
            samples: sample.len(),
        });
        self.nodes.len() - 1
    }

    fn grow<R: Rng>(
        &mut self,
        rows: &[Vec<f64>],
        labels: &[bool],
        sample: Vec<usize>,
        depth: usize,
        limits: &TreeLimits,
        rng: &mut R,
    ) -> usize {
        let positives = sample.iter().filter(|&&i| labels[i]).count();
        let pure = positives == 0 || positives == sample.len();
        if pure || depth >= limits.max_depth || sample.len() < limits.min_samples_split {
            return self.push_leaf(labels, &sample);
        }

        let Some(split) = self.best_split(rows, labels, &sample, positives, limits, rng) else {
            return self.push_leaf(labels, &sample);
        };

        let (left, right): (Vec<usize>, Vec<usize>) = sample
            .into_iter()
            .partition(|&i| rows[i][split.feature] <= split.threshold);

        // Reserve the split slot so children get higher indices.
        let idx = self.nodes.len();
        self.nodes.push(TreeNode::Leaf {
            probability: 0.0,
            samples: 0,
        });
        let left_idx = self.grow(rows, labels, left, depth + 1, limits, rng);
        let right_idx = self.grow(rows, labels, right, depth + 1, limits, rng);
        self.nodes[idx] = TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: left_idx,
            right: right_idx,
        };
        idx
    }

    fn best_split<R: Rng>(
        &self,
        rows: &[Vec<f64>],
        labels: &[bool],
        sample: &[usize],
        positives: usize,
        limits: &TreeLimits,
        rng: &mut R,
    ) -> Option<SplitCandidate> {
        let total = sample.len();
        let parent = gini(positives, total);
        let mut features: Vec<usize> = (0..self.n_features).collect();
        features.shuffle(rng);
        features.truncate(limits.max_features.clamp(1, self.n_features.max(1)));

        let mut best: Option<SplitCandidate> = None;
        let mut ordered: Vec<(f64, bool)> = Vec::with_capacity(total);

        for feature in features {
            ordered.clear();
            ordered.extend(sample.iter().map(|&i| (rows[i][feature], labels[i])));
            ordered.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_pos = 0usize;
            for split_at in 1..total {
                if ordered[split_at - 1].1 {
                    left_pos += 1;
                }
                let (prev, next) = (ordered[split_at - 1].0, ordered[split_at].0);
                if prev == next {
                    continue;
                }
                let (left_n, right_n) = (split_at, total - split_at);
                if left_n < limits.min_samples_leaf || right_n < limits.min_samples_leaf {
                    continue;
                }
                let impurity = (left_n as f64 * gini(left_pos, left_n)
                    + right_n as f64 * gini(positives - left_pos, right_n))
                    / total as f64;
                if impurity >= parent {
                    continue;
                }
                if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: prev + (next - prev) / 2.0,
                        impurity,
                    });
                }
            }
        }
        best
    }

    /// Probability that the sample belongs to the positive class.
    ///
    /// Missing trailing features read as `0.0`.
    pub fn predict_proba(&self, features: &[f64]) -> f64 {
        let mut idx = 0usize;
        loop {
            match self.nodes.get(idx) {
                Some(TreeNode::Leaf { probability, .. }) => return *probability,
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = features.get(*feature).copied().unwrap_or(0.0);
                    idx = if value <= *threshold { *left } else { *right };
                }
                None => return 0.0,
            }
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, TreeNode::Leaf { .. }))
            .count()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }
        self.node_depth(0)
    }

    fn node_depth(&self, idx: usize) -> usize {
        match &self.nodes[idx] {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Split { left, right, .. } => {
                1 + self.node_depth(*left).max(self.node_depth(*right))
            }
        }
    }
}
