//! Model training module
//!
//! Random-forest classification and model selection:
//! - Decision trees and Random Forests
//! - Hold-out splitting and stratified cross-validation
//! - Exhaustive grid search scored by accuracy

pub mod cross_validation;
pub mod decision_tree;
pub mod grid_search;
pub mod metrics;
pub mod random_forest;
pub mod split;

pub use cross_validation::{CVResults, CVSplit, StratifiedKFold};
pub use decision_tree::{DecisionTree, TreeNode};
pub use grid_search::{CandidateResult, GridSearchCV, GridSearchResult, ParamGrid, RandomForestParams};
pub use metrics::accuracy_score;
pub use random_forest::{sqrt_features, RandomForest};
pub use split::{train_test_split, TrainTestSplit};
