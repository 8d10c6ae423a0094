//! Scoring of hypothetical fixtures against a trained model and its frozen schema.

use anyhow::{anyhow, bail, Context};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::artifact::{ArtifactError, ModelArtifact};
use crate::classifier::{OutcomeProbs, ProbabilisticModel};
use crate::forest::Forest;
use crate::record::Outcome;
use crate::schema::{FeatureSchema, SparseFeatures};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub predicted_outcome: Outcome,
    pub probabilities: OutcomeProbs,
}

#[derive(Debug, Clone)]
pub struct Predictor<M> {
    schema: FeatureSchema,
    model: M,
}
impl<M: ProbabilisticModel> Predictor<M> {
    pub fn new(schema: FeatureSchema, model: M) -> Result<Self, ArtifactError> {
        if model.width() != schema.width() {
            return Err(ArtifactError::Width {
                forest: model.width(),
                schema: schema.width(),
            });
        }
        Ok(Self { schema, model })
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Reindexes `features` against the schema and scores them. Columns the schema does not know
    /// are ignored; columns the request omits are zero.
    pub fn predict(&self, features: &SparseFeatures) -> Prediction {
        let reindexed = self.schema.reindex(features);
        if !reindexed.unknown.is_empty() {
            debug!(
                "ignoring {} features absent from the schema: {:?}",
                reindexed.unknown.len(),
                reindexed.unknown
            );
        }
        let probabilities = self.model.predict_proba(&reindexed.values);
        Prediction {
            predicted_outcome: probabilities.most_likely(),
            probabilities,
        }
    }
}

impl TryFrom<ModelArtifact> for Predictor<Forest> {
    type Error = ArtifactError;

    fn try_from(artifact: ModelArtifact) -> Result<Self, Self::Error> {
        artifact.validate()?;
        Self::new(artifact.schema, artifact.forest)
    }
}

/// Parses a JSON object of `"column": value` pairs. Booleans are taken as 1 and 0.
pub fn parse_features(json: &str) -> Result<SparseFeatures, anyhow::Error> {
    let value: Value = serde_json::from_str(json).context("parsing feature request")?;
    let Value::Object(map) = value else {
        bail!("feature request must be a JSON object");
    };
    map.into_iter()
        .map(|(column, value)| {
            let value = match value {
                Value::Number(number) => number
                    .as_f64()
                    .ok_or_else(|| anyhow!("feature {column} is out of range"))?,
                Value::Bool(flag) => f64::from(u8::from(flag)),
                other => bail!("feature {column} has a non-numeric value {other}"),
            };
            Ok((column, value))
        })
        .collect()
}

/// Parses a `column=value` assignment; the value may be a number, `true` or `false`.
pub fn parse_assignment(assignment: &str) -> Result<(String, f64), anyhow::Error> {
    let (column, value) = assignment
        .rsplit_once('=')
        .ok_or_else(|| anyhow!("expected column=value, got '{assignment}'"))?;
    let value = match value.trim() {
        "true" => 1.0,
        "false" => 0.0,
        number => number
            .parse()
            .with_context(|| format!("invalid value for {column}"))?,
    };
    Ok((column.to_string(), value))
}

#[cfg(test)]
mod tests {
    use assert_float_eq::*;
    use matchform_testing::assert_distribution;

    use super::*;
    use crate::artifact::tests::artifact;
    use crate::classifier::Estimator;
    use crate::dataset::{assemble, FeatureMatrix};
    use crate::forest::{ForestOptions, ModelConfig, RandomForest};
    use crate::form::FormConfig;
    use crate::schema::{Dimension, FixtureQuery, Numeric};
    use crate::synthetic::League;

    #[test]
    fn omitted_venue_is_zero_filled() {
        let mut records = League::default().generate();
        for record in &mut records {
            if record.home_team == League::team_name(0) {
                record.venue = "OldTrafford".into();
            }
        }
        let dataset = assemble(&records, &FormConfig::default()).unwrap();
        assert!(dataset.schema.index_of("Venue_OldTrafford").is_some());
        let matrix = FeatureMatrix::tabulate(&dataset.schema, &dataset.rows);
        let forest = RandomForest {
            config: ModelConfig {
                n_estimators: 20,
                max_depth: Some(6),
            },
            options: ForestOptions::default(),
        }
        .fit(&matrix.data, &matrix.labels)
        .unwrap();
        let predictor = Predictor::new(dataset.schema, forest).unwrap();

        let features = FixtureQuery::default()
            .numeric(Numeric::Week, 12.0)
            .numeric(Numeric::HomeRollingGoals, 1.8)
            .numeric(Numeric::AwayRollingGoals, 0.9)
            .numeric(Numeric::HomeRollingXg, 1.6)
            .numeric(Numeric::AwayRollingXg, 1.1)
            .category(Dimension::HomeTeam, &League::team_name(0))
            .category(Dimension::AwayTeam, &League::team_name(3))
            .build();
        let prediction = predictor.predict(&features);
        assert_float_absolute_eq!(1.0, prediction.probabilities.sum(), 1e-6);
        assert_distribution(&prediction.probabilities.to_array(), 1e-6);
        assert_eq!(prediction.probabilities.most_likely(), prediction.predicted_outcome);
    }

    #[test]
    fn unknown_columns_are_ignored() {
        let artifact = artifact();
        let predictor = Predictor::<Forest>::try_from(artifact).unwrap();
        let known = FixtureQuery::default()
            .numeric(Numeric::HomeRollingGoals, 2.0)
            .category(Dimension::HomeTeam, &League::team_name(1))
            .build();
        let mut with_unknown = known.clone();
        with_unknown.insert("Venue_Nowhere".into(), 1.0);
        with_unknown.insert("attendance".into(), 52000.0);
        assert_eq!(predictor.predict(&known), predictor.predict(&with_unknown));
    }

    #[test]
    fn prediction_is_deterministic() {
        let predictor = Predictor::<Forest>::try_from(artifact()).unwrap();
        let features = SparseFeatures::new();
        let first = predictor.predict(&features);
        assert_eq!(first, predictor.predict(&features));
        assert_distribution(&first.probabilities.to_array(), 1e-9);
    }

    #[test]
    fn width_mismatch_rejected() {
        let artifact = artifact();
        let schema = crate::schema::SchemaBuilder::default().freeze().unwrap();
        assert!(matches!(
            Predictor::new(schema, artifact.forest),
            Err(ArtifactError::Width { .. })
        ));
    }

    #[test]
    fn response_format() {
        let prediction = Prediction {
            predicted_outcome: Outcome::HomeWin,
            probabilities: OutcomeProbs::from_array([0.5, 0.25, 0.25]),
        };
        assert_eq!(
            r#"{"predicted_outcome":"HomeWin","probabilities":{"HomeWin":0.5,"AwayWin":0.25,"Draw":0.25}}"#,
            serde_json::to_string(&prediction).unwrap()
        );
    }

    #[test]
    fn parse_json_request() {
        let features =
            parse_features(r#"{"Wk": 25, "home_rolling_avg_goals": 1.8, "Venue_Old Trafford": true, "Day_Sunday": false}"#)
                .unwrap();
        assert_eq!(Some(&25.0), features.get("Wk"));
        assert_eq!(Some(&1.8), features.get("home_rolling_avg_goals"));
        assert_eq!(Some(&1.0), features.get("Venue_Old Trafford"));
        assert_eq!(Some(&0.0), features.get("Day_Sunday"));

        assert!(parse_features("[1, 2]").is_err());
        let err = parse_features(r#"{"Wk": "25"}"#).unwrap_err();
        assert!(err.to_string().contains("Wk"), "{err}");
    }

    #[test]
    fn parse_assignments() {
        assert_eq!(("Wk".to_string(), 25.0), parse_assignment("Wk=25").unwrap());
        assert_eq!(
            ("Home_Manchester United".to_string(), 1.0),
            parse_assignment("Home_Manchester United=true").unwrap()
        );
        assert!(parse_assignment("Wk").is_err());
        assert!(parse_assignment("Wk=lots").is_err());
    }
}
