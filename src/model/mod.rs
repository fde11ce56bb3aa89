pub mod artifact;
pub mod decision_tree;
pub mod error;
pub mod random_forest;
pub mod scaler;
pub mod trained;
