//! Scoring of fitted models against labelled data.

use std::ops::Index;

use serde::{Deserialize, Serialize};
use strum::EnumCount;

use crate::classifier::ProbabilisticModel;
use crate::matrix::Matrix;
use crate::record::Outcome;

/// Fraction of rows whose most likely outcome matches the label. Zero for an empty set.
pub fn accuracy(model: &impl ProbabilisticModel, data: &Matrix, labels: &[Outcome]) -> f64 {
    ConfusionMatrix::tally(model, data, labels).accuracy()
}

/// Counts of (actual, predicted) outcome pairs; rows are actual outcomes, columns predicted ones,
/// both in [Outcome] ordinal order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    counts: [[usize; Outcome::COUNT]; Outcome::COUNT],
}
impl ConfusionMatrix {
    pub fn tally(model: &impl ProbabilisticModel, data: &Matrix, labels: &[Outcome]) -> Self {
        let mut matrix = Self::default();
        for (features, &actual) in data.iter_rows().zip(labels) {
            matrix.record(actual, model.predict(features));
        }
        matrix
    }

    pub fn record(&mut self, actual: Outcome, predicted: Outcome) {
        self.counts[actual.ordinal()][predicted.ordinal()] += 1;
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn correct(&self) -> usize {
        (0..Outcome::COUNT).map(|class| self.counts[class][class]).sum()
    }

    pub fn accuracy(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.correct() as f64 / total as f64,
        }
    }
}

impl Index<(Outcome, Outcome)> for ConfusionMatrix {
    type Output = usize;

    fn index(&self, (actual, predicted): (Outcome, Outcome)) -> &Self::Output {
        &self.counts[actual.ordinal()][predicted.ordinal()]
    }
}

/// Out-of-sample performance of the selected model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub accuracy: f64,
    pub confusion: ConfusionMatrix,
}
impl Evaluation {
    pub fn new(model: &impl ProbabilisticModel, data: &Matrix, labels: &[Outcome]) -> Self {
        let confusion = ConfusionMatrix::tally(model, data, labels);
        Self {
            accuracy: confusion.accuracy(),
            confusion,
        }
    }
}
