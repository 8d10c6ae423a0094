//! The persisted outcome of a training run: everything the predictor needs, and nothing it
//! doesn't.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::classifier::ProbabilisticModel;
use crate::evaluate::Evaluation;
use crate::file::{ReadJsonFile, WriteJsonFile};
use crate::forest::{Forest, ForestOptions, ModelConfig};
use crate::form::FormConfig;
use crate::schema::FeatureSchema;
use crate::season::SeasonId;
use crate::select::GridScore;

pub const ARTIFACT_VERSION: u32 = 1;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArtifactError {
    #[error("unsupported artifact version {0}, expected {}", ARTIFACT_VERSION)]
    Version(u32),

    #[error("forest expects {forest} features but the schema has {schema}")]
    Width { forest: usize, schema: usize },

    #[error("forest has no trees or references features beyond its width")]
    Malformed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub version: u32,
    pub schema: FeatureSchema,
    /// Form settings the numeric features were computed with.
    pub form: FormConfig,
    pub config: ModelConfig,
    pub options: ForestOptions,
    pub scores: Vec<GridScore>,
    pub cutoff: SeasonId,
    pub train_seasons: Option<(SeasonId, SeasonId)>,
    /// Absent when the season after the cutoff has no rows.
    pub evaluation: Option<Evaluation>,
    pub forest: Forest,
}
impl ModelArtifact {
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.version != ARTIFACT_VERSION {
            return Err(ArtifactError::Version(self.version));
        }
        if self.forest.width() != self.schema.width() {
            return Err(ArtifactError::Width {
                forest: self.forest.width(),
                schema: self.schema.width(),
            });
        }
        if !self.forest.is_well_formed() {
            return Err(ArtifactError::Malformed);
        }
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let artifact: Self = Self::read_json_file(path)?;
        artifact.validate()?;
        debug!(
            "loaded {} ({} trees, {} columns) from {}",
            artifact.config,
            artifact.forest.trees().len(),
            artifact.schema.width(),
            path.display()
        );
        Ok(artifact)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), anyhow::Error> {
        self.validate()?;
        self.write_json_file(path)
    }
}
