//! Grid search over forest hyperparameters, scored by stratified k-fold cross-validation on the
//! training partition alone.

use anyhow::bail;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use strum::EnumCount;
use tracing::{debug, info};

use crate::classifier::{check_trainable, DataInsufficiency, Estimator, TrainError};
use crate::evaluate::accuracy;
use crate::forest::ModelConfig;
use crate::matrix::Matrix;
use crate::record::Outcome;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub n_estimators: Vec<usize>,
    pub max_depth: Vec<Option<usize>>,
    pub folds: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            n_estimators: vec![50, 100, 200],
            max_depth: vec![Some(5), Some(10), Some(15), Some(20)],
            folds: 5,
        }
    }
}

impl GridConfig {
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.n_estimators.is_empty() || self.max_depth.is_empty() {
            bail!("the hyperparameter grid cannot be empty");
        }
        if self.folds < 2 {
            bail!("cross-validation requires at least 2 folds");
        }
        for config in self.configs() {
            config.validate()?;
        }
        Ok(())
    }

    /// Grid points ordered by depth limit, then by ensemble size. Earlier points win ties.
    pub fn configs(&self) -> Vec<ModelConfig> {
        self.max_depth
            .iter()
            .flat_map(|&max_depth| {
                self.n_estimators.iter().map(move |&n_estimators| ModelConfig {
                    n_estimators,
                    max_depth,
                })
            })
            .collect()
    }
}

/// Test indices of each of `k` folds. Samples of each class, in their original order, are dealt
/// into contiguous chunks, one per fold, so that every fold mirrors the overall class balance and
/// fold sizes differ by at most one.
pub fn stratified_folds(labels: &[Outcome], k: usize) -> Result<Vec<Vec<usize>>, DataInsufficiency> {
    if k < 2 || k > labels.len() {
        return Err(DataInsufficiency::TooFewSamples {
            samples: labels.len(),
            folds: k,
        });
    }

    let mut by_class: Vec<usize> = labels.iter().map(|label| label.ordinal()).collect();
    by_class.sort_unstable();
    let mut allocation = vec![[0usize; Outcome::COUNT]; k];
    for (position, &class) in by_class.iter().enumerate() {
        allocation[position % k][class] += 1;
    }

    let mut folds = vec![vec![]; k];
    let mut cursors = [0usize; Outcome::COUNT];
    for (sample, label) in labels.iter().enumerate() {
        let class = label.ordinal();
        while allocation[cursors[class]][class] == 0 {
            cursors[class] += 1;
        }
        allocation[cursors[class]][class] -= 1;
        folds[cursors[class]].push(sample);
    }
    Ok(folds)
}

struct Fold {
    train: Matrix,
    train_labels: Vec<Outcome>,
    test: Matrix,
    test_labels: Vec<Outcome>,
}
impl Fold {
    fn split(data: &Matrix, labels: &[Outcome], test: &[usize]) -> Self {
        let mut in_test = vec![false; labels.len()];
        for &sample in test {
            in_test[sample] = true;
        }
        let train: Vec<_> = (0..labels.len()).filter(|&sample| !in_test[sample]).collect();
        Self {
            train: data.select_rows(&train),
            train_labels: train.iter().map(|&sample| labels[sample]).collect(),
            test: data.select_rows(test),
            test_labels: test.iter().map(|&sample| labels[sample]).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridScore {
    pub config: ModelConfig,
    pub fold_scores: Vec<f64>,
    pub mean: f64,
}

#[derive(Debug, Clone)]
pub struct Selection<M> {
    pub best: ModelConfig,
    /// Scores of every grid point, in grid order.
    pub scores: Vec<GridScore>,
    /// The winning configuration, refitted on the entire training set.
    pub model: M,
}

/// Cross-validates every grid point, picks the one with the highest mean accuracy and refits it on
/// all of `data`. `estimator` creates an estimator for a grid point. Every (configuration, fold)
/// pair is fitted independently.
pub fn select<E>(
    data: &Matrix,
    labels: &[Outcome],
    grid: &GridConfig,
    estimator: impl Fn(ModelConfig) -> E + Sync,
) -> Result<Selection<E::Model>, TrainError>
where
    E: Estimator,
{
    grid.validate()
        .map_err(|err| TrainError::Config(err.to_string()))?;
    check_trainable(data, labels)?;

    let folds: Vec<_> = stratified_folds(labels, grid.folds)?
        .iter()
        .map(|test| Fold::split(data, labels, test))
        .collect();
    let configs = grid.configs();
    let tasks: Vec<_> = (0..configs.len())
        .flat_map(|config| (0..folds.len()).map(move |fold| (config, fold)))
        .collect();
    let fold_scores = tasks
        .par_iter()
        .map(|&(config, fold)| {
            let fold = &folds[fold];
            let model = estimator(configs[config]).fit(&fold.train, &fold.train_labels)?;
            Ok(accuracy(&model, &fold.test, &fold.test_labels))
        })
        .collect::<Result<Vec<_>, TrainError>>()?;

    let scores: Vec<_> = configs
        .iter()
        .zip(fold_scores.chunks(folds.len()))
        .map(|(&config, fold_scores)| {
            let mean = fold_scores.iter().sum::<f64>() / fold_scores.len() as f64;
            info!("{config}: mean CV accuracy {mean:.4}");
            debug!("{config}: fold accuracies {fold_scores:.4?}");
            GridScore {
                config,
                fold_scores: fold_scores.to_vec(),
                mean,
            }
        })
        .collect();

    let mut best = &scores[0];
    for score in &scores[1..] {
        if score.mean > best.mean {
            best = score;
        }
    }
    let best = best.config;
    info!("selected {best}");
    let model = estimator(best).fit(data, labels)?;
    Ok(Selection {
        best,
        scores,
        model,
    })
}

#[cfg(test)]
mod tests;
