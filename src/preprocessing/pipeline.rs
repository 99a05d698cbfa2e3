//! Preprocessing pipeline

use crate::error::Result;
use polars::prelude::*;
use tracing::info;

use super::cleaning::{drop_duplicates, replace_yes_no};
use super::config::PreprocessingConfig;
use super::encoder::encode_categoricals;
use super::features::{engineer_features, split_features_target, FeatureSet};

/// Runs the cleaning and feature steps in their fixed order
#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    config: PreprocessingConfig,
}

impl Preprocessor {
    /// Create a preprocessor with the survey defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a preprocessor with a custom configuration
    pub fn with_config(config: PreprocessingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PreprocessingConfig {
        &self.config
    }

    /// Dedupe, encode, recode YES/NO, drop irrelevant columns and add the
    /// interaction feature. The label column is still part of the result.
    pub fn transform_frame(&self, df: &DataFrame) -> Result<DataFrame> {
        let n_input = df.height();
        let deduped = drop_duplicates(df)?;
        info!(
            rows = deduped.height(),
            removed = n_input - deduped.height(),
            "dropped duplicate rows"
        );

        let encoded = encode_categoricals(deduped, &self.config.categorical_columns)?;
        let recoded = replace_yes_no(encoded, self.config.yes_value, self.config.no_value)?;
        let engineered = engineer_features(&recoded, &self.config.drop_columns, &self.config.interaction)?;

        info!(
            columns = engineered.width(),
            interaction = %self.config.interaction.name,
            "engineered features"
        );
        Ok(engineered)
    }

    /// Full preprocessing down to a numeric feature matrix
    pub fn run(&self, df: &DataFrame) -> Result<FeatureSet> {
        let frame = self.transform_frame(df)?;
        split_features_target(&frame, &self.config.target_column)
    }
}
