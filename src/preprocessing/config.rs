//! Preprocessing configuration

use serde::{Deserialize, Serialize};

use super::{CATEGORICAL_COLUMNS, IRRELEVANT_FEATURES, TARGET_COLUMN};

/// Product of two existing columns added as a new feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionFeature {
    pub name: String,
    pub left: String,
    pub right: String,
}

impl InteractionFeature {
    pub fn new(name: impl Into<String>, left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            left: left.into(),
            right: right.into(),
        }
    }
}

/// Configuration for the preprocessing steps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessingConfig {
    /// Columns label-encoded when present
    pub categorical_columns: Vec<String>,
    /// Columns removed before training
    pub drop_columns: Vec<String>,
    /// Hand-picked interaction feature
    pub interaction: InteractionFeature,
    /// Label column
    pub target_column: String,
    /// Replacement for the literal "YES"
    pub yes_value: i64,
    /// Replacement for the literal "NO"
    pub no_value: i64,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            categorical_columns: CATEGORICAL_COLUMNS.iter().map(|s| s.to_string()).collect(),
            drop_columns: IRRELEVANT_FEATURES.iter().map(|s| s.to_string()).collect(),
            interaction: InteractionFeature::new("ANXYELFIN", "ANXIETY", "YELLOW_FINGERS"),
            target_column: TARGET_COLUMN.to_string(),
            yes_value: 2,
            no_value: 1,
        }
    }
}
