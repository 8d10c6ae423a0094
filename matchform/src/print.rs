//! Console tables for training and prediction reports.

use std::collections::BTreeMap;

use stanza::style::{HAlign, Header, MinWidth, Separator, Styles};
use stanza::table::{Col, Row, Table};
use strum::IntoEnumIterator;

use crate::evaluate::ConfusionMatrix;
use crate::forest::ModelConfig;
use crate::predict::Prediction;
use crate::record::Outcome;
use crate::select::GridScore;

fn right_aligned(min_width: usize) -> Col {
    Col::new(Styles::default().with(MinWidth(min_width)).with(HAlign::Right))
}

pub fn tabulate_scores(scores: &[GridScore], best: &ModelConfig) -> Table {
    let folds = scores.first().map_or(0, |score| score.fold_scores.len());
    let mut table = Table::default()
        .with_cols({
            let mut cols = vec![right_aligned(12), right_aligned(9)];
            for _ in 0..folds {
                cols.push(right_aligned(7));
            }
            cols.push(Col::new(
                Styles::default()
                    .with(Separator(true))
                    .with(MinWidth(8))
                    .with(HAlign::Right),
            ));
            cols.push(Col::new(Styles::default().with(MinWidth(4))));
            cols
        })
        .with_row({
            let mut header_cells = vec!["Estimators".into(), "Depth".into()];
            for fold in 0..folds {
                header_cells.push(format!("Fold {}", fold + 1).into());
            }
            header_cells.push("Mean".into());
            header_cells.push("".into());
            Row::new(
                Styles::default().with(Header(true)).with(Separator(true)),
                header_cells,
            )
        });
    for score in scores {
        let mut cells = vec![
            score.config.n_estimators.to_string().into(),
            score
                .config
                .max_depth
                .map_or_else(|| "None".to_string(), |depth| depth.to_string())
                .into(),
        ];
        for fold_score in &score.fold_scores {
            cells.push(format!("{fold_score:.4}").into());
        }
        cells.push(format!("{:.4}", score.mean).into());
        cells.push((if score.config == *best { "*" } else { "" }).into());
        table.push_row(Row::new(Styles::default(), cells));
    }
    table
}

pub fn tabulate_confusion(confusion: &ConfusionMatrix) -> Table {
    let mut table = Table::default()
        .with_cols({
            let mut cols = vec![Col::new(Styles::default().with(MinWidth(10)))];
            for _ in Outcome::iter() {
                cols.push(right_aligned(9));
            }
            cols.push(Col::new(
                Styles::default()
                    .with(Separator(true))
                    .with(MinWidth(7))
                    .with(HAlign::Right),
            ));
            cols
        })
        .with_row({
            let mut header_cells = vec!["Actual".into()];
            for predicted in Outcome::iter() {
                header_cells.push(predicted.to_string().into());
            }
            header_cells.push("Total".into());
            Row::new(
                Styles::default().with(Header(true)).with(Separator(true)),
                header_cells,
            )
        });
    for actual in Outcome::iter() {
        let mut cells = vec![actual.to_string().into()];
        let mut total = 0;
        for predicted in Outcome::iter() {
            let count = confusion[(actual, predicted)];
            total += count;
            cells.push(count.to_string().into());
        }
        cells.push(total.to_string().into());
        table.push_row(Row::new(Styles::default(), cells));
    }
    table
}

pub fn tabulate_prediction(prediction: &Prediction) -> Table {
    let mut table = Table::default()
        .with_cols(vec![
            Col::new(Styles::default().with(MinWidth(10))),
            right_aligned(11),
            Col::new(Styles::default().with(MinWidth(4))),
        ])
        .with_row(Row::new(
            Styles::default().with(Header(true)),
            vec!["Outcome".into(), "Probability".into(), "".into()],
        ));
    for outcome in Outcome::iter() {
        table.push_row(Row::new(
            Styles::default(),
            vec![
                outcome.to_string().into(),
                format!("{:.6}", prediction.probabilities[outcome]).into(),
                (if outcome == prediction.predicted_outcome { "*" } else { "" }).into(),
            ],
        ));
    }
    table
}

pub fn tabulate_rejections(counts: &BTreeMap<&'static str, usize>) -> Table {
    let mut table = Table::default()
        .with_cols(vec![
            Col::new(Styles::default().with(MinWidth(14))),
            right_aligned(7),
        ])
        .with_row(Row::new(
            Styles::default().with(Header(true)),
            vec!["Rejection".into(), "Rows".into()],
        ));
    for (kind, count) in counts {
        table.push_row(Row::new(
            Styles::default(),
            vec![kind.to_string().into(), count.to_string().into()],
        ));
    }
    table
}

#[cfg(test)]
mod tests {
    use stanza::renderer::console::Console;
    use stanza::renderer::Renderer;

    use super::*;
    use crate::classifier::OutcomeProbs;

    #[test]
    fn scores_table() {
        let best = ModelConfig {
            n_estimators: 100,
            max_depth: Some(10),
        };
        let scores = vec![
            GridScore {
                config: ModelConfig {
                    n_estimators: 50,
                    max_depth: None,
                },
                fold_scores: vec![0.5, 0.6],
                mean: 0.55,
            },
            GridScore {
                config: best,
                fold_scores: vec![0.6, 0.7],
                mean: 0.65,
            },
        ];
        let table = tabulate_scores(&scores, &best);
        assert_eq!(3, table.num_rows());
        assert_eq!(6, table.num_cols());
        let rendered = Console::default().render(&table).to_string();
        assert!(rendered.contains("0.6500"), "{rendered}");
        assert!(rendered.contains("None"), "{rendered}");
    }

    #[test]
    fn confusion_table() {
        let mut confusion = ConfusionMatrix::default();
        confusion.record(Outcome::HomeWin, Outcome::HomeWin);
        confusion.record(Outcome::Draw, Outcome::AwayWin);
        let table = tabulate_confusion(&confusion);
        assert_eq!(4, table.num_rows());
        assert_eq!(5, table.num_cols());
    }

    #[test]
    fn prediction_table() {
        let prediction = Prediction {
            predicted_outcome: Outcome::AwayWin,
            probabilities: OutcomeProbs::from_array([0.2, 0.5, 0.3]),
        };
        let table = tabulate_prediction(&prediction);
        assert_eq!(4, table.num_rows());
        let rendered = Console::default().render(&table).to_string();
        assert!(rendered.contains("0.500000"), "{rendered}");
    }
}
