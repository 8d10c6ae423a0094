//! The contract between model selection and concrete outcome classifiers.

use std::ops::Index;

use serde::{Deserialize, Serialize};
use strum::{EnumCount, IntoEnumIterator};
use thiserror::Error;

use crate::matrix::Matrix;
use crate::record::Outcome;

/// Class probabilities of a single fixture.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OutcomeProbs {
    pub home_win: f64,
    pub away_win: f64,
    pub draw: f64,
}
impl OutcomeProbs {
    /// From probabilities in [Outcome] ordinal order.
    pub fn from_array(probs: [f64; Outcome::COUNT]) -> Self {
        let [home_win, away_win, draw] = probs;
        Self {
            home_win,
            away_win,
            draw,
        }
    }

    pub fn to_array(&self) -> [f64; Outcome::COUNT] {
        [self.home_win, self.away_win, self.draw]
    }

    pub fn sum(&self) -> f64 {
        self.home_win + self.away_win + self.draw
    }

    /// The most probable outcome; ties go to the outcome declared first.
    pub fn most_likely(&self) -> Outcome {
        let mut best = Outcome::HomeWin;
        for outcome in Outcome::iter().skip(1) {
            if self[outcome] > self[best] {
                best = outcome;
            }
        }
        best
    }
}

impl Index<Outcome> for OutcomeProbs {
    type Output = f64;

    fn index(&self, outcome: Outcome) -> &Self::Output {
        match outcome {
            Outcome::HomeWin => &self.home_win,
            Outcome::AwayWin => &self.away_win,
            Outcome::Draw => &self.draw,
        }
    }
}

/// The training data cannot support a model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataInsufficiency {
    #[error("the {0} partition is empty")]
    EmptyPartition(&'static str),

    #[error("every training sample is labelled {0}")]
    SingleClass(Outcome),

    #[error("{samples} samples cannot be split into {folds} folds")]
    TooFewSamples { samples: usize, folds: usize },
}

#[derive(Debug, Error)]
pub enum TrainError {
    #[error("insufficient data: {0}")]
    Insufficient(#[from] DataInsufficiency),

    #[error("{rows} feature rows do not match {labels} labels")]
    Shape { rows: usize, labels: usize },

    #[error("invalid model configuration: {0}")]
    Config(String),
}

/// A probabilistic multi-class model over fixed-width feature vectors.
pub trait ProbabilisticModel {
    /// Number of features expected by [predict_proba](Self::predict_proba).
    fn width(&self) -> usize;

    fn predict_proba(&self, features: &[f64]) -> OutcomeProbs;

    fn predict(&self, features: &[f64]) -> Outcome {
        self.predict_proba(features).most_likely()
    }
}

/// Fits a [ProbabilisticModel] to labelled, schema-ordered features. Single-class data must be
/// accepted, since cross-validation folds may hold only one class.
pub trait Estimator {
    type Model: ProbabilisticModel;

    fn fit(&self, data: &Matrix, labels: &[Outcome]) -> Result<Self::Model, TrainError>;
}

/// Checks that `labels` are non-empty and aligned with `data`. Any number of classes may be
/// present; estimators fitting cross-validation folds rely on this, as a fold of a multi-class
/// partition may hold a single class.
pub fn check_fittable(data: &Matrix, labels: &[Outcome]) -> Result<(), TrainError> {
    if data.rows() != labels.len() {
        return Err(TrainError::Shape {
            rows: data.rows(),
            labels: labels.len(),
        });
    }
    if labels.is_empty() {
        return Err(DataInsufficiency::EmptyPartition("training").into());
    }
    Ok(())
}

/// Checks that `labels` describe a non-empty, multi-class training set aligned with `data`.
pub fn check_trainable(data: &Matrix, labels: &[Outcome]) -> Result<(), TrainError> {
    check_fittable(data, labels)?;
    let first = labels[0];
    if labels.iter().all(|&label| label == first) {
        return Err(DataInsufficiency::SingleClass(first).into());
    }
    Ok(())
}

/// Relative frequency of each outcome in `labels`, in ordinal order.
pub fn class_distribution<'a>(labels: impl IntoIterator<Item = &'a Outcome>) -> [f64; Outcome::COUNT] {
    let mut counts = [0usize; Outcome::COUNT];
    for label in labels {
        counts[label.ordinal()] += 1;
    }
    let total = counts.iter().sum::<usize>();
    if total == 0 {
        return [0.0; Outcome::COUNT];
    }
    counts.map(|count| count as f64 / total as f64)
}
