//! Exhaustive hyperparameter search with cross-validation

use crate::error::{PipelineError, Result};
use super::cross_validation::{CVResults, CVSplit, StratifiedKFold};
use super::metrics::accuracy_score;
use super::random_forest::RandomForest;
use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;
use tracing::{debug, info};

/// One random-forest hyperparameter combination
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RandomForestParams {
    pub bootstrap: bool,
    pub max_depth: Option<usize>,
    pub min_samples_leaf: usize,
    pub min_samples_split: usize,
    pub n_estimators: usize,
}

impl Default for RandomForestParams {
    fn default() -> Self {
        Self {
            bootstrap: true,
            max_depth: None,
            min_samples_leaf: 1,
            min_samples_split: 2,
            n_estimators: 100,
        }
    }
}

impl RandomForestParams {
    /// Parameters as name → string pairs, keys sorted.
    ///
    /// Values use the tracker's conventional spelling: `True`/`False` for
    /// booleans and `None` for an unlimited depth.
    pub fn to_param_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        let bootstrap = if self.bootstrap { "True" } else { "False" };
        map.insert("bootstrap".to_string(), bootstrap.to_string());
        map.insert(
            "max_depth".to_string(),
            self.max_depth.map_or_else(|| "None".to_string(), |d| d.to_string()),
        );
        map.insert("min_samples_leaf".to_string(), self.min_samples_leaf.to_string());
        map.insert("min_samples_split".to_string(), self.min_samples_split.to_string());
        map.insert("n_estimators".to_string(), self.n_estimators.to_string());
        map
    }
}

impl fmt::Display for RandomForestParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .to_param_map()
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Candidate values for each hyperparameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamGrid {
    pub bootstrap: Vec<bool>,
    pub max_depth: Vec<Option<usize>>,
    pub min_samples_leaf: Vec<usize>,
    pub min_samples_split: Vec<usize>,
    pub n_estimators: Vec<usize>,
}

impl ParamGrid {
    /// The 48-point grid used for the lung cancer model
    pub fn lung_cancer_default() -> Self {
        Self {
            bootstrap: vec![true, false],
            max_depth: vec![Some(5), Some(10), None],
            min_samples_leaf: vec![1, 2],
            min_samples_split: vec![2, 5],
            n_estimators: vec![100, 150],
        }
    }

    /// Number of combinations
    pub fn len(&self) -> usize {
        self.bootstrap.len()
            * self.max_depth.len()
            * self.min_samples_leaf.len()
            * self.min_samples_split.len()
            * self.n_estimators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn validate(&self) -> Result<()> {
        let check = |name: &str, ok: bool, value: String, reason: &str| -> Result<()> {
            if ok {
                Ok(())
            } else {
                Err(PipelineError::InvalidParameter {
                    name: name.to_string(),
                    value,
                    reason: reason.to_string(),
                })
            }
        };

        check("param_grid", !self.is_empty(), "[]".to_string(), "every parameter needs at least one value")?;
        for &n in &self.n_estimators {
            check("n_estimators", n >= 1, n.to_string(), "must be at least 1")?;
        }
        for &n in &self.min_samples_split {
            check("min_samples_split", n >= 2, n.to_string(), "must be at least 2")?;
        }
        for &n in &self.min_samples_leaf {
            check("min_samples_leaf", n >= 1, n.to_string(), "must be at least 1")?;
        }
        for depth in self.max_depth.iter().flatten() {
            check("max_depth", *depth >= 1, depth.to_string(), "must be at least 1")?;
        }
        Ok(())
    }

    /// Every combination, keys in alphabetical order with the last key
    /// varying fastest.
    pub fn candidates(&self) -> Vec<RandomForestParams> {
        let mut out = Vec::with_capacity(self.len());
        for &bootstrap in &self.bootstrap {
            for &max_depth in &self.max_depth {
                for &min_samples_leaf in &self.min_samples_leaf {
                    for &min_samples_split in &self.min_samples_split {
                        for &n_estimators in &self.n_estimators {
                            out.push(RandomForestParams {
                                bootstrap,
                                max_depth,
                                min_samples_leaf,
                                min_samples_split,
                                n_estimators,
                            });
                        }
                    }
                }
            }
        }
        out
    }
}

/// Cross-validated score of one combination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateResult {
    pub params: RandomForestParams,
    pub cv: CVResults,
    /// 1 = best; equal means share a rank
    pub rank: usize,
}

/// Outcome of [`GridSearchCV::fit`]
#[derive(Debug, Clone)]
pub struct GridSearchResult {
    pub candidates: Vec<CandidateResult>,
    pub best_index: usize,
    pub best_params: RandomForestParams,
    pub best_score: f64,
    /// Best combination refitted on the whole input
    pub best_estimator: RandomForest,
}

/// Grid search over [`ParamGrid`] scored by accuracy
#[derive(Debug, Clone)]
pub struct GridSearchCV {
    grid: ParamGrid,
    cv_folds: usize,
    random_state: Option<u64>,
    n_jobs: Option<usize>,
}

impl GridSearchCV {
    pub fn new(grid: ParamGrid) -> Self {
        Self {
            grid,
            cv_folds: 5,
            random_state: None,
            n_jobs: None,
        }
    }

    /// Set the number of stratified folds
    pub fn with_cv(mut self, folds: usize) -> Self {
        self.cv_folds = folds;
        self
    }

    /// Seed passed to every forest
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Size of a dedicated worker pool (global rayon pool when unset)
    pub fn with_n_jobs(mut self, n_jobs: usize) -> Self {
        self.n_jobs = Some(n_jobs);
        self
    }

    pub fn grid(&self) -> &ParamGrid {
        &self.grid
    }

    /// Run the search and refit the best combination
    pub fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<GridSearchResult> {
        self.grid.validate()?;

        match self.n_jobs {
            Some(0) => Err(PipelineError::InvalidParameter {
                name: "n_jobs".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            }),
            Some(n) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| PipelineError::ThreadPoolError(e.to_string()))?;
                pool.install(|| self.fit_inner(x, y))
            }
            None => self.fit_inner(x, y),
        }
    }

    fn fit_inner(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<GridSearchResult> {
        let start = Instant::now();
        let candidates = self.grid.candidates();

        if x.nrows() != y.len() {
            return Err(PipelineError::ShapeError {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }
        let splits = StratifiedKFold::new(self.cv_folds).split(y)?;

        info!(
            candidates = candidates.len(),
            folds = splits.len(),
            fits = candidates.len() * splits.len(),
            "Starting grid search"
        );

        let tasks: Vec<(usize, usize)> = (0..candidates.len())
            .flat_map(|c| (0..splits.len()).map(move |f| (c, f)))
            .collect();

        let scores = tasks
            .par_iter()
            .map(|&(c, f)| self.score_fold(&candidates[c], &splits[f], x, y))
            .collect::<Result<Vec<f64>>>()?;

        let cv_results: Vec<CVResults> = scores
            .chunks(splits.len())
            .map(|fold_scores| CVResults::from_scores(fold_scores.to_vec()))
            .collect();

        // First strictly greater mean wins, so ties keep the earliest candidate.
        let mut best_index = 0;
        for (i, cv) in cv_results.iter().enumerate() {
            if cv.mean_score > cv_results[best_index].mean_score {
                best_index = i;
            }
        }

        let results: Vec<CandidateResult> = candidates
            .iter()
            .zip(cv_results)
            .map(|(params, cv)| CandidateResult {
                params: params.clone(),
                cv,
                rank: 0,
            })
            .collect();
        let results = assign_ranks(results);

        for candidate in &results {
            debug!(
                params = %candidate.params,
                mean = candidate.cv.mean_score,
                std = candidate.cv.std_score,
                rank = candidate.rank,
                "Candidate scored"
            );
        }

        let best_params = results[best_index].params.clone();
        let best_score = results[best_index].cv.mean_score;

        let mut best_estimator = RandomForest::from_params(&best_params, self.random_state);
        best_estimator.fit(x, y)?;

        info!(
            best_params = %best_params,
            best_score,
            elapsed_secs = start.elapsed().as_secs_f64(),
            "Grid search complete"
        );

        Ok(GridSearchResult {
            candidates: results,
            best_index,
            best_params,
            best_score,
            best_estimator,
        })
    }

    fn score_fold(
        &self,
        params: &RandomForestParams,
        split: &CVSplit,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<f64> {
        let x_train = x.select(Axis(0), &split.train_indices);
        let y_train = y.select(Axis(0), &split.train_indices);
        let x_test = x.select(Axis(0), &split.test_indices);
        let y_test = y.select(Axis(0), &split.test_indices);

        let mut model = RandomForest::from_params(params, self.random_state);
        model.fit(&x_train, &y_train)?;
        let predictions = model.predict(&x_test)?;
        accuracy_score(&y_test, &predictions)
    }
}

/// Competition ranking on mean score: equal means share the lowest rank.
fn assign_ranks(mut results: Vec<CandidateResult>) -> Vec<CandidateResult> {
    let means: Vec<f64> = results.iter().map(|r| r.cv.mean_score).collect();
    for result in &mut results {
        let better = means.iter().filter(|&&m| m > result.cv.mean_score).count();
        result.rank = better + 1;
    }
    results
}
