//! Random forest of CART trees: bootstrap-sampled, Gini-split, with a random feature subset
//! considered at every split. Class probabilities are the mean of the leaf distributions reached in
//! each tree.

use std::fmt::{Display, Formatter};

use anyhow::bail;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use strum::EnumCount;
use tinyrand::{Rand, Seeded, StdRand};
use tracing::trace;

use crate::classifier::{check_fittable, Estimator, OutcomeProbs, ProbabilisticModel, TrainError};
use crate::matrix::Matrix;
use crate::record::Outcome;

pub mod tree;

use tree::{GrowParams, Tree};

/// One point on the hyperparameter grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelConfig {
    pub n_estimators: usize,
    /// Unlimited when absent.
    pub max_depth: Option<usize>,
}
impl ModelConfig {
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.n_estimators == 0 {
            bail!("a forest needs at least one tree");
        }
        if self.max_depth == Some(0) {
            bail!("maximum depth must be at least 1");
        }
        Ok(())
    }
}

impl Display for ModelConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.max_depth {
            Some(max_depth) => write!(f, "n_estimators={}, max_depth={max_depth}", self.n_estimators),
            None => write!(f, "n_estimators={}, max_depth=None", self.n_estimators),
        }
    }
}

/// Number of features considered at each split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaxFeatures {
    Sqrt,
    Log2,
    All,
    Fixed(usize),
}
impl MaxFeatures {
    pub fn resolve(&self, width: usize) -> usize {
        let features = match self {
            MaxFeatures::Sqrt => (width as f64).sqrt() as usize,
            MaxFeatures::Log2 => (width as f64).log2() as usize,
            MaxFeatures::All => width,
            MaxFeatures::Fixed(features) => *features,
        };
        features.clamp(1, width.max(1))
    }
}

/// Settings shared by every forest fitted during a training run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestOptions {
    pub seed: u64,
    pub min_samples_split: usize,
    pub max_features: MaxFeatures,
}

impl Default for ForestOptions {
    fn default() -> Self {
        Self {
            seed: 1,
            min_samples_split: 2,
            max_features: MaxFeatures::Sqrt,
        }
    }
}

impl ForestOptions {
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.min_samples_split < 2 {
            bail!("minimum samples per split must be at least 2");
        }
        if self.max_features == MaxFeatures::Fixed(0) {
            bail!("at least one feature must be considered per split");
        }
        Ok(())
    }
}

/// Seed of the `index`-th tree, so that trees are reproducible regardless of the order in which
/// they are grown.
pub fn tree_seed(seed: u64, index: usize) -> u64 {
    let mut z = seed ^ (index as u64).wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn bootstrap(rows: usize, rand: &mut impl Rand) -> Vec<usize> {
    (0..rows)
        .map(|_| (rand.next_u64() % rows as u64) as usize)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomForest {
    pub config: ModelConfig,
    pub options: ForestOptions,
}

impl Estimator for RandomForest {
    type Model = Forest;

    fn fit(&self, data: &Matrix, labels: &[Outcome]) -> Result<Forest, TrainError> {
        self.config
            .validate()
            .and_then(|_| self.options.validate())
            .map_err(|err| TrainError::Config(err.to_string()))?;
        check_fittable(data, labels)?;

        let params = GrowParams {
            max_depth: self.config.max_depth,
            min_samples_split: self.options.min_samples_split,
            max_features: self.options.max_features.resolve(data.cols()),
        };
        let trees: Vec<_> = (0..self.config.n_estimators)
            .into_par_iter()
            .map(|index| {
                let mut rand = StdRand::seed(tree_seed(self.options.seed, index));
                let samples = bootstrap(data.rows(), &mut rand);
                Tree::grow(data, labels, &samples, &params, &mut rand)
            })
            .collect();
        trace!(
            "fitted {} trees ({}) to {}x{} features",
            trees.len(),
            self.config,
            data.rows(),
            data.cols()
        );
        Ok(Forest {
            width: data.cols(),
            trees,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forest {
    width: usize,
    trees: Vec<Tree>,
}
impl Forest {
    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    /// A forest is usable if it has trees and every split stays within its declared width.
    pub fn is_well_formed(&self) -> bool {
        !self.trees.is_empty() && self.trees.iter().all(|tree| tree.is_well_formed(self.width))
    }
}

impl ProbabilisticModel for Forest {
    fn width(&self) -> usize {
        self.width
    }

    fn predict_proba(&self, features: &[f64]) -> OutcomeProbs {
        assert_eq!(
            self.width,
            features.len(),
            "expected {} features, got {}",
            self.width,
            features.len()
        );
        let mut sums = [0.0; Outcome::COUNT];
        for tree in &self.trees {
            for (sum, prob) in sums.iter_mut().zip(tree.leaf(features)) {
                *sum += prob;
            }
        }
        let trees = self.trees.len().max(1) as f64;
        OutcomeProbs::from_array(sums.map(|sum| sum / trees))
    }
}
