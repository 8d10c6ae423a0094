//! Joins rolling form onto records and lays the result out against a frozen schema.

use strum::EnumCount;
use tracing::info;

use crate::form::{FormConfig, FormTable, RollingForm};
use crate::matrix::Matrix;
use crate::record::{MatchRecord, Outcome};
use crate::schema::{FeatureSchema, Numeric, SchemaBuilder, SchemaError};
use crate::season::SeasonId;
use crate::timeline::Timelines;

/// A record whose teams both have form going into it.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    /// Position of the record in the normalised record set.
    pub fixture: usize,
    pub record: MatchRecord,
    pub home_form: RollingForm,
    pub away_form: RollingForm,
}
impl FeatureRow {
    pub fn season(&self) -> SeasonId {
        self.record.season
    }

    pub fn outcome(&self) -> Outcome {
        self.record.outcome()
    }

    /// Numeric features in [Numeric] declaration order.
    pub fn numeric(&self) -> [f64; Numeric::COUNT] {
        [
            self.record.week as f64,
            self.home_form.goals,
            self.away_form.goals,
            self.home_form.xg,
            self.away_form.xg,
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub schema: FeatureSchema,
    /// Rows in ascending date order; same-date rows keep record order.
    pub rows: Vec<FeatureRow>,
    /// Records dropped because at least one team lacked form.
    pub cold_starts: usize,
}

/// Builds feature rows from normalised records. Categories are observed across every record, so
/// the schema also covers fixtures whose rows are dropped as cold starts.
pub fn assemble(records: &[MatchRecord], config: &FormConfig) -> Result<Dataset, SchemaError> {
    let timelines = Timelines::build(records);
    let form = FormTable::compute(records, &timelines, config);
    let schema = SchemaBuilder::from_iter(records).freeze()?;

    let mut rows: Vec<_> = records
        .iter()
        .zip(form.iter())
        .enumerate()
        .filter_map(|(fixture, (record, cell))| {
            let (home_form, away_form) = cell.complete()?;
            Some(FeatureRow {
                fixture,
                record: record.clone(),
                home_form,
                away_form,
            })
        })
        .collect();
    rows.sort_by_key(|row| row.record.date);
    let cold_starts = records.len() - rows.len();

    info!(
        "assembled {} feature rows from {} records across {} teams; dropped {cold_starts} cold starts; {} feature columns",
        rows.len(),
        records.len(),
        timelines.len(),
        schema.width()
    );
    Ok(Dataset {
        schema,
        rows,
        cold_starts,
    })
}

/// Dense, schema-ordered features with their outcome labels.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub data: Matrix,
    pub labels: Vec<Outcome>,
}
impl FeatureMatrix {
    pub fn tabulate(schema: &FeatureSchema, rows: &[FeatureRow]) -> Self {
        let mut data = Matrix::allocate(rows.len(), schema.width());
        for (index, row) in rows.iter().enumerate() {
            schema.encode_into(&row.record, &row.numeric(), data.row_slice_mut(index));
        }
        Self {
            data,
            labels: rows.iter().map(FeatureRow::outcome).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
