//! CART classification trees stored as index-linked node arenas.

use serde::{Deserialize, Serialize};
use strum::EnumCount;
use tinyrand::Rand;

use crate::matrix::Matrix;
use crate::record::Outcome;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Leaf {
        /// Relative class frequencies in [Outcome] ordinal order.
        distribution: [f64; Outcome::COUNT],
    },
    Split {
        feature: usize,
        /// Samples with `x[feature] <= threshold` go left.
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct GrowParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub max_features: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    nodes: Vec<Node>,
}

struct Pending {
    node: usize,
    samples: Vec<usize>,
    depth: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Split {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

impl Tree {
    /// Grows a tree over `samples` (row indices into `data`, repeats allowed). The root is node 0.
    pub fn grow(
        data: &Matrix,
        labels: &[Outcome],
        samples: &[usize],
        params: &GrowParams,
        rand: &mut impl Rand,
    ) -> Self {
        let mut nodes = vec![placeholder()];
        let mut pending = vec![Pending {
            node: 0,
            samples: samples.to_vec(),
            depth: 0,
        }];
        let mut features: Vec<usize> = (0..data.cols()).collect();

        while let Some(Pending {
            node,
            samples,
            depth,
        }) = pending.pop()
        {
            let counts = class_counts(labels, &samples);
            let splittable = samples.len() >= params.min_samples_split
                && params.max_depth.map_or(true, |max_depth| depth < max_depth)
                && gini(&counts) > 0.0;
            let split = if splittable {
                shuffle(&mut features, rand);
                best_split(data, labels, &samples, &features, params.max_features)
            } else {
                None
            };

            match split {
                None => nodes[node] = Node::Leaf {
                    distribution: distribution(&counts),
                },
                Some(split) => {
                    let (left_samples, right_samples): (Vec<_>, Vec<_>) = samples
                        .into_iter()
                        .partition(|&sample| data[(sample, split.feature)] <= split.threshold);
                    let left = nodes.len();
                    let right = left + 1;
                    nodes.push(placeholder());
                    nodes.push(placeholder());
                    nodes[node] = Node::Split {
                        feature: split.feature,
                        threshold: split.threshold,
                        left,
                        right,
                    };
                    pending.push(Pending {
                        node: right,
                        samples: right_samples,
                        depth: depth + 1,
                    });
                    pending.push(Pending {
                        node: left,
                        samples: left_samples,
                        depth: depth + 1,
                    });
                }
            }
        }
        Self { nodes }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Class distribution of the leaf that `features` falls into.
    pub fn leaf(&self, features: &[f64]) -> &[f64; Outcome::COUNT] {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { distribution } => return distribution,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Number of edges on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut pending = vec![(0, 0)];
        while let Some((index, depth)) = pending.pop() {
            deepest = deepest.max(depth);
            if let Node::Split { left, right, .. } = &self.nodes[index] {
                pending.push((*left, depth + 1));
                pending.push((*right, depth + 1));
            }
        }
        deepest
    }

    /// Checks that every split refers to a feature below `width` and to child nodes that exist.
    pub fn is_well_formed(&self, width: usize) -> bool {
        !self.nodes.is_empty()
            && self.nodes.iter().enumerate().all(|(index, node)| match node {
                Node::Leaf { .. } => true,
                Node::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    *feature < width
                        && *left > index
                        && *right > index
                        && *left < self.nodes.len()
                        && *right < self.nodes.len()
                }
            })
    }
}

fn placeholder() -> Node {
    Node::Leaf {
        distribution: [0.0; Outcome::COUNT],
    }
}

fn class_counts(labels: &[Outcome], samples: &[usize]) -> [usize; Outcome::COUNT] {
    let mut counts = [0; Outcome::COUNT];
    for &sample in samples {
        counts[labels[sample].ordinal()] += 1;
    }
    counts
}

fn distribution(counts: &[usize; Outcome::COUNT]) -> [f64; Outcome::COUNT] {
    let total = counts.iter().sum::<usize>();
    if total == 0 {
        return [1.0 / Outcome::COUNT as f64; Outcome::COUNT];
    }
    counts.map(|count| count as f64 / total as f64)
}

/// Gini impurity of a class count vector.
pub(crate) fn gini(counts: &[usize; Outcome::COUNT]) -> f64 {
    let total = counts.iter().sum::<usize>();
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&count| {
            let p = count as f64 / total;
            p * p
        })
        .sum::<f64>()
}

/// In-place Fisher-Yates shuffle.
fn shuffle(items: &mut [usize], rand: &mut impl Rand) {
    for i in (1..items.len()).rev() {
        let j = (rand.next_u64() % (i as u64 + 1)) as usize;
        items.swap(i, j);
    }
}

/// Lowest weighted-Gini split over the first `max_features` non-constant features in `features`.
/// Constant features are skipped without counting towards the limit.
fn best_split(
    data: &Matrix,
    labels: &[Outcome],
    samples: &[usize],
    features: &[usize],
    max_features: usize,
) -> Option<Split> {
    let total = samples.len();
    let mut column: Vec<(f64, usize)> = Vec::with_capacity(total);
    let mut best: Option<Split> = None;
    let mut visited = 0;

    for &feature in features {
        if visited == max_features {
            break;
        }
        column.clear();
        column.extend(
            samples
                .iter()
                .map(|&sample| (data[(sample, feature)], labels[sample].ordinal())),
        );
        column.sort_by(|a, b| a.0.total_cmp(&b.0));
        let (Some(first), Some(last)) = (column.first(), column.last()) else {
            continue;
        };
        if first.0 == last.0 {
            continue;
        }
        visited += 1;

        let mut right = [0; Outcome::COUNT];
        for &(_, class) in &column {
            right[class] += 1;
        }
        let mut left = [0; Outcome::COUNT];
        for position in 1..total {
            let (previous, class) = column[position - 1];
            left[class] += 1;
            right[class] -= 1;
            let current = column[position].0;
            if current == previous {
                continue;
            }
            let impurity = (position as f64 * gini(&left) + (total - position) as f64 * gini(&right))
                / total as f64;
            if best.map_or(true, |best| impurity < best.impurity) {
                let mut threshold = previous + (current - previous) / 2.0;
                if threshold >= current {
                    threshold = previous;
                }
                best = Some(Split {
                    feature,
                    threshold,
                    impurity,
                });
            }
        }
    }
    best
}
