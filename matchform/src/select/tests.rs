use super::*;
use crate::classifier::{check_fittable, OutcomeProbs, ProbabilisticModel};
use crate::dataset::{assemble, FeatureMatrix};
use crate::forest::{ForestOptions, RandomForest};
use crate::form::FormConfig;
use crate::synthetic::League;

use crate::record::Outcome::{AwayWin as A, Draw as D, HomeWin as H};

/// Always predicts the same outcome.
#[derive(Debug)]
struct Fixed(Outcome);

impl ProbabilisticModel for Fixed {
    fn width(&self) -> usize {
        1
    }

    fn predict_proba(&self, _: &[f64]) -> OutcomeProbs {
        let mut probs = [0.0; Outcome::COUNT];
        probs[self.0.ordinal()] = 1.0;
        OutcomeProbs::from_array(probs)
    }
}

/// Predicts home wins for one favoured grid point and draws for every other.
struct Favouring {
    config: ModelConfig,
    favoured: ModelConfig,
}

impl Estimator for Favouring {
    type Model = Fixed;

    fn fit(&self, data: &Matrix, labels: &[Outcome]) -> Result<Fixed, TrainError> {
        check_fittable(data, labels)?;
        Ok(Fixed(if self.config == self.favoured { H } else { D }))
    }
}

fn column(labels: &[Outcome]) -> Matrix {
    let mut data = Matrix::allocate(labels.len(), 1);
    for row in 0..labels.len() {
        data[(row, 0)] = row as f64;
    }
    data
}

fn small_grid(folds: usize) -> GridConfig {
    GridConfig {
        n_estimators: vec![5, 10],
        max_depth: vec![Some(3), None],
        folds,
    }
}

#[test]
fn grid_order() {
    let configs = GridConfig::default().configs();
    assert_eq!(12, configs.len());
    assert_eq!(ModelConfig { n_estimators: 50, max_depth: Some(5) }, configs[0]);
    assert_eq!(ModelConfig { n_estimators: 100, max_depth: Some(5) }, configs[1]);
    assert_eq!(ModelConfig { n_estimators: 200, max_depth: Some(5) }, configs[2]);
    assert_eq!(ModelConfig { n_estimators: 50, max_depth: Some(10) }, configs[3]);
    assert_eq!(ModelConfig { n_estimators: 200, max_depth: Some(20) }, configs[11]);
}

#[test]
fn grid_validation() {
    assert!(GridConfig::default().validate().is_ok());
    assert!(GridConfig { folds: 1, ..GridConfig::default() }.validate().is_err());
    assert!(GridConfig { n_estimators: vec![], ..GridConfig::default() }.validate().is_err());
    assert!(GridConfig { n_estimators: vec![0], ..GridConfig::default() }.validate().is_err());
    assert!(GridConfig { max_depth: vec![Some(0)], ..GridConfig::default() }.validate().is_err());
}

#[test]
fn grid_from_json() {
    let grid: GridConfig = serde_json::from_str(r#"{"max_depth": [3, null], "folds": 3}"#).unwrap();
    assert_eq!(vec![50, 100, 200], grid.n_estimators);
    assert_eq!(vec![Some(3), None], grid.max_depth);
    assert_eq!(3, grid.folds);
}

#[test]
fn folds_one_sample_each() {
    let folds = stratified_folds(&[H, H, H, A, A], 5).unwrap();
    assert_eq!(vec![vec![0], vec![1], vec![2], vec![3], vec![4]], folds);
}

#[test]
fn folds_are_stratified_and_contiguous_per_class() {
    let labels = [H, A, H, D, H, A, H, D, H, A, H, D];
    let folds = stratified_folds(&labels, 3).unwrap();
    assert_eq!(
        vec![vec![0, 1, 2, 3], vec![4, 5, 6, 7], vec![8, 9, 10, 11]],
        folds
    );
}

#[test]
fn folds_partition_samples() {
    let labels: Vec<_> = (0..23).map(|i| [H, H, A, D, A][i % 5]).collect();
    let folds = stratified_folds(&labels, 4).unwrap();
    let mut covered: Vec<_> = folds.iter().flatten().copied().collect();
    covered.sort_unstable();
    assert_eq!((0..23).collect::<Vec<_>>(), covered);
    for fold in &folds {
        assert!((5..=6).contains(&fold.len()), "fold {fold:?}");
        assert!(fold.windows(2).all(|pair| pair[0] < pair[1]));
    }
}

#[test]
fn too_few_samples_for_folds() {
    assert_eq!(
        Err(DataInsufficiency::TooFewSamples { samples: 5, folds: 1 }),
        stratified_folds(&[H, H, H, A, A], 1)
    );
    assert_eq!(
        Err(DataInsufficiency::TooFewSamples { samples: 5, folds: 6 }),
        stratified_folds(&[H, H, H, A, A], 6)
    );

    let labels = [H, A, H];
    let err = select(&column(&labels), &labels, &small_grid(5), |config| Favouring {
        config,
        favoured: config,
    })
    .unwrap_err();
    assert!(matches!(
        err,
        TrainError::Insufficient(DataInsufficiency::TooFewSamples { samples: 3, folds: 5 })
    ));
}

#[test]
fn ties_go_to_earliest_grid_point() {
    let labels = [H, H, H, A, H, H, H, D, H, H];
    let favoured = ModelConfig { n_estimators: 999, max_depth: None };
    let selection = select(&column(&labels), &labels, &small_grid(2), |config| Favouring {
        config,
        favoured,
    })
    .unwrap();
    assert_eq!(4, selection.scores.len());
    assert!(selection.scores.iter().all(|score| score.mean == selection.scores[0].mean));
    assert_eq!(small_grid(2).configs()[0], selection.best);
}

#[test]
fn best_mean_wins() {
    let labels = [H, H, H, A, H, H, H, D, H, H];
    let favoured = ModelConfig { n_estimators: 10, max_depth: None };
    let selection = select(&column(&labels), &labels, &small_grid(2), |config| Favouring {
        config,
        favoured,
    })
    .unwrap();
    assert_eq!(favoured, selection.best);
    assert_eq!(Outcome::HomeWin, selection.model.0);

    let best = selection.scores.iter().find(|score| score.config == favoured).unwrap();
    assert_eq!(2, best.fold_scores.len());
    assert_eq!(0.8, best.mean);
}

#[test]
fn insufficient_training_partitions() {
    let labels = [D; 6];
    let err = select(&column(&labels), &labels, &small_grid(2), |config| Favouring {
        config,
        favoured: config,
    })
    .unwrap_err();
    assert!(matches!(err, TrainError::Insufficient(DataInsufficiency::SingleClass(D))));

    let err = select(&Matrix::allocate(0, 1), &[], &small_grid(2), |config| Favouring {
        config,
        favoured: config,
    })
    .unwrap_err();
    assert!(matches!(err, TrainError::Insufficient(DataInsufficiency::EmptyPartition(_))));
}

#[test]
fn rare_class_leaves_a_single_class_fold() {
    let mut labels = vec![H; 9];
    labels.push(D);
    let folds = stratified_folds(&labels, 5).unwrap();
    assert_eq!(vec![8, 9], folds[4]);

    let options = ForestOptions::default();
    let selection = select(&column(&labels), &labels, &small_grid(5), |config| RandomForest {
        config,
        options,
    })
    .unwrap();
    assert_eq!(4, selection.scores.len());
    for score in &selection.scores {
        assert_eq!(5, score.fold_scores.len());
        assert_eq!(0.5, score.fold_scores[4]);
    }
    assert_eq!(1, selection.model.width());
}

#[test]
fn forest_selection_is_reproducible() {
    let records = League::default().generate();
    let dataset = assemble(&records, &FormConfig::default()).unwrap();
    let matrix = FeatureMatrix::tabulate(&dataset.schema, &dataset.rows);
    let options = ForestOptions::default();
    let run = || {
        select(&matrix.data, &matrix.labels, &small_grid(3), |config| RandomForest {
            config,
            options,
        })
        .unwrap()
    };
    let first = run();
    let second = run();
    assert_eq!(first.best, second.best);
    assert_eq!(first.scores, second.scores);
    assert_eq!(first.model, second.model);
    for score in &first.scores {
        assert_eq!(3, score.fold_scores.len());
        assert!((0.0..=1.0).contains(&score.mean));
    }
}
