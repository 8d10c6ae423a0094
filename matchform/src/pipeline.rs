//! End-to-end training: raw rows to a persisted, evaluated model.

use std::path::Path;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::artifact::{ModelArtifact, ARTIFACT_VERSION};
use crate::classifier::DataInsufficiency;
use crate::config::IngestConfig;
use crate::csv::CsvReader;
use crate::dataset::{assemble, Dataset, FeatureMatrix};
use crate::evaluate::Evaluation;
use crate::forest::{ForestOptions, RandomForest};
use crate::form::FormConfig;
use crate::record::{MatchRecord, Normalised, Normaliser, RawRow};
use crate::season::{DatasetSplit, SeasonPolicy, SplitConfig};
use crate::select::{select, GridConfig};
use crate::timed::Timed;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ingest: IngestConfig,
    pub season: SeasonPolicy,
    pub form: FormConfig,
    pub split: SplitConfig,
    pub grid: GridConfig,
    pub forest: ForestOptions,
}
impl Config {
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.ingest.validate().context("ingest")?;
        self.season.validate().context("season")?;
        self.form.validate().context("form")?;
        self.split.validate().context("split")?;
        self.grid.validate().context("grid")?;
        self.forest.validate().context("forest")?;
        Ok(())
    }
}

/// Result of a training run.
#[derive(Debug, Clone)]
pub struct Trained {
    pub artifact: ModelArtifact,
    pub train_rows: usize,
    pub test_rows: usize,
    pub cold_starts: usize,
}

#[derive(Debug)]
pub struct Pipeline {
    config: Config,
}

impl TryFrom<Config> for Pipeline {
    type Error = anyhow::Error;

    fn try_from(config: Config) -> Result<Self, Self::Error> {
        config.validate()?;
        Ok(Self { config })
    }
}

impl Pipeline {
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn normalise(&self, rows: impl IntoIterator<Item = RawRow>) -> Normalised {
        Normaliser::new(&self.config.ingest, &self.config.season).normalise(rows)
    }

    /// Reads and normalises a headed CSV file. Fails if any required column is missing from the
    /// header; the week column is optional.
    pub fn read_csv(&self, path: impl AsRef<Path>) -> Result<Normalised, anyhow::Error> {
        let path = path.as_ref();
        let reader = CsvReader::open(path).with_context(|| format!("opening {}", path.display()))?;
        let columns = &self.config.ingest.columns;
        for column in [
            &columns.date,
            &columns.home_team,
            &columns.away_team,
            &columns.score,
            &columns.home_xg,
            &columns.away_xg,
            &columns.referee,
            &columns.venue,
        ] {
            if !reader.headers().contains(column) {
                bail!("{} has no '{column}' column", path.display());
            }
        }
        if !reader.headers().contains(&columns.week) {
            warn!("{} has no '{}' column; week features will be 0", path.display(), columns.week);
        }
        let rows = reader
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("reading {}", path.display()))?;
        Ok(self.normalise(rows))
    }

    pub fn features(&self, records: &[MatchRecord]) -> Result<Dataset, anyhow::Error> {
        let dataset = Timed::result(|| assemble(records, &self.config.form))?;
        info!("assembled features in {:.3}s", dataset.secs());
        Ok(dataset.value)
    }

    /// Assembles features, partitions them by season, selects and fits a forest on the training
    /// seasons and evaluates it on the season that follows.
    pub fn train(&self, records: &[MatchRecord]) -> Result<Trained, anyhow::Error> {
        let dataset = self.features(records)?;
        let cutoff = self
            .config
            .split
            .resolve(&dataset.rows)
            .ok_or(DataInsufficiency::EmptyPartition("training"))?;
        let split = DatasetSplit::by_season(dataset.rows, cutoff);
        let test_season = split.test_season();
        let train_seasons = split.train_seasons();
        let train = FeatureMatrix::tabulate(&dataset.schema, &split.train);
        let test = FeatureMatrix::tabulate(&dataset.schema, &split.test);

        let options = self.config.forest;
        let selection = Timed::result(|| {
            select(&train.data, &train.labels, &self.config.grid, |config| RandomForest {
                config,
                options,
            })
        })?;
        info!(
            "selected {} from {} grid points in {:.3}s",
            selection.value.best,
            selection.value.scores.len(),
            selection.secs()
        );
        let selection = selection.value;

        let evaluation = match test_season {
            Some(test_season) if !test.is_empty() => {
                let evaluation =
                    Timed::value(|| Evaluation::new(&selection.model, &test.data, &test.labels));
                info!(
                    "test accuracy on season {test_season}: {:.4} over {} rows in {:.3}s",
                    evaluation.value.accuracy,
                    test.len(),
                    evaluation.secs()
                );
                Some(evaluation.value)
            }
            _ => {
                warn!("no rows follow season {cutoff}; skipping evaluation");
                None
            }
        };

        let artifact = ModelArtifact {
            version: ARTIFACT_VERSION,
            schema: dataset.schema,
            form: self.config.form,
            config: selection.best,
            options,
            scores: selection.scores,
            cutoff,
            train_seasons,
            evaluation,
            forest: selection.model,
        };
        Ok(Trained {
            artifact,
            train_rows: train.len(),
            test_rows: test.len(),
            cold_starts: dataset.cold_starts,
        })
    }
}
