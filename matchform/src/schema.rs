//! The frozen column layout of the feature matrix.
//!
//! Categorical columns are only known once the data has been scanned, so the layout is captured
//! once by a [SchemaBuilder] and frozen into a versioned [FeatureSchema]. Every downstream
//! consumer (the assembler, the trainer, the predictor) encodes against that same object; nothing
//! re-derives columns at prediction time.
//!
//! Columns are laid out as the [Numeric] features in declaration order, followed by one indicator
//! column per observed category of each [Dimension], in declaration order of the dimensions and
//! ascending order of the categories within each.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Weekday;
use ordinalizer::Ordinal;
use serde::{Deserialize, Serialize};
use strum::{EnumCount, IntoEnumIterator};
use strum_macros::{Display, EnumCount, EnumIter};
use thiserror::Error;

use crate::hash_lookup::{DuplicateItem, HashLookup};
use crate::record::MatchRecord;

pub const SCHEMA_VERSION: u32 = 1;

/// Pass-through numeric features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ordinal, EnumCount, EnumIter, Display)]
pub enum Numeric {
    Week,
    HomeRollingGoals,
    AwayRollingGoals,
    HomeRollingXg,
    AwayRollingXg,
}
impl Numeric {
    pub fn column(&self) -> &'static str {
        match self {
            Numeric::Week => "Wk",
            Numeric::HomeRollingGoals => "home_rolling_avg_goals",
            Numeric::AwayRollingGoals => "away_rolling_avg_goals",
            Numeric::HomeRollingXg => "home_rolling_avg_xG",
            Numeric::AwayRollingXg => "away_rolling_avg_xG",
        }
    }
}

/// One-hot encoded categorical dimensions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Ordinal, EnumCount, EnumIter, Display,
)]
pub enum Dimension {
    Weekday,
    HomeTeam,
    AwayTeam,
    Referee,
    Venue,
}
impl Dimension {
    pub fn prefix(&self) -> &'static str {
        match self {
            Dimension::Weekday => "Day",
            Dimension::HomeTeam => "Home",
            Dimension::AwayTeam => "Away",
            Dimension::Referee => "Referee",
            Dimension::Venue => "Venue",
        }
    }

    pub fn category<'r>(&self, record: &'r MatchRecord) -> &'r str {
        match self {
            Dimension::Weekday => weekday_name(record.weekday()),
            Dimension::HomeTeam => &record.home_team,
            Dimension::AwayTeam => &record.away_team,
            Dimension::Referee => &record.referee,
            Dimension::Venue => &record.venue,
        }
    }

    /// The indicator column for `category`, e.g. `Venue_Old Trafford`.
    pub fn column(&self, category: &str) -> String {
        format!("{}_{category}", self.prefix())
    }
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Accumulates the categories observed in each dimension.
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    categories: [BTreeSet<String>; Dimension::COUNT],
}
impl SchemaBuilder {
    pub fn observe(&mut self, record: &MatchRecord) {
        for dimension in Dimension::iter() {
            let categories = &mut self.categories[dimension.ordinal()];
            let category = dimension.category(record);
            if !categories.contains(category) {
                categories.insert(category.to_string());
            }
        }
    }

    pub fn freeze(self) -> Result<FeatureSchema, SchemaError> {
        FeatureSchema::from_categories(self.categories.map(|set| set.into_iter().collect()))
    }
}

impl<'r> FromIterator<&'r MatchRecord> for SchemaBuilder {
    fn from_iter<T: IntoIterator<Item = &'r MatchRecord>>(iter: T) -> Self {
        let mut builder = Self::default();
        for record in iter {
            builder.observe(record);
        }
        builder
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("unsupported schema version {0}, expected {}", SCHEMA_VERSION)]
    Version(u32),

    #[error("numeric columns {0:?} differ from the expected set")]
    Numeric(Vec<String>),

    #[error("categories of {0} are not in strictly ascending order")]
    Unordered(Dimension),

    #[error(transparent)]
    Duplicate(#[from] DuplicateItem),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SchemaRepr", into = "SchemaRepr")]
pub struct FeatureSchema {
    columns: HashLookup<String>,
    categories: [Vec<String>; Dimension::COUNT],
    offsets: [usize; Dimension::COUNT],
}
impl FeatureSchema {
    fn from_categories(categories: [Vec<String>; Dimension::COUNT]) -> Result<Self, SchemaError> {
        let width = Numeric::COUNT + categories.iter().map(Vec::len).sum::<usize>();
        let mut names = Vec::with_capacity(width);
        names.extend(Numeric::iter().map(|numeric| numeric.column().to_string()));
        let mut offsets = [0; Dimension::COUNT];
        for dimension in Dimension::iter() {
            offsets[dimension.ordinal()] = names.len();
            names.extend(
                categories[dimension.ordinal()]
                    .iter()
                    .map(|category| dimension.column(category)),
            );
        }
        Ok(Self {
            columns: HashLookup::try_from_vec(names)?,
            categories,
            offsets,
        })
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[String] {
        self.columns.items()
    }

    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.columns.index_of(column)
    }

    pub fn categories(&self, dimension: Dimension) -> &[String] {
        &self.categories[dimension.ordinal()]
    }

    /// Column index of the indicator for `category`, if it was observed when the schema was frozen.
    pub fn indicator(&self, dimension: Dimension, category: &str) -> Option<usize> {
        self.categories[dimension.ordinal()]
            .binary_search_by(|existing| existing.as_str().cmp(category))
            .ok()
            .map(|position| self.offsets[dimension.ordinal()] + position)
    }

    /// Writes the encoding of one fixture into `out`, which must be exactly [width](Self::width)
    /// long. Categories absent from the schema leave their dimension all-zero.
    pub fn encode_into(&self, record: &MatchRecord, numeric: &[f64; Numeric::COUNT], out: &mut [f64]) {
        assert_eq!(
            self.width(),
            out.len(),
            "output width {} differs from schema width {}",
            out.len(),
            self.width()
        );
        out.fill(0.0);
        out[..Numeric::COUNT].copy_from_slice(numeric);
        for dimension in Dimension::iter() {
            if let Some(column) = self.indicator(dimension, dimension.category(record)) {
                out[column] = 1.0;
            }
        }
    }

    pub fn encode(&self, record: &MatchRecord, numeric: &[f64; Numeric::COUNT]) -> Vec<f64> {
        let mut out = vec![0.0; self.width()];
        self.encode_into(record, numeric, &mut out);
        out
    }

    /// Re-expresses a sparse feature map against this schema. Columns the schema lacks are set
    /// aside in [Reindexed::unknown]; columns the map lacks are zero.
    pub fn reindex(&self, features: &SparseFeatures) -> Reindexed {
        let mut values = vec![0.0; self.width()];
        let mut unknown = vec![];
        for (column, &value) in features {
            match self.columns.index_of(column.as_str()) {
                Some(index) => values[index] = value,
                None => unknown.push(column.clone()),
            }
        }
        Reindexed { values, unknown }
    }
}

#[derive(Serialize, Deserialize)]
struct SchemaRepr {
    version: u32,
    numeric: Vec<String>,
    categories: BTreeMap<Dimension, Vec<String>>,
}

impl From<FeatureSchema> for SchemaRepr {
    fn from(schema: FeatureSchema) -> Self {
        let numeric = schema.columns()[..Numeric::COUNT].to_vec();
        let categories = Dimension::iter()
            .zip(schema.categories)
            .collect();
        Self {
            version: SCHEMA_VERSION,
            numeric,
            categories,
        }
    }
}

impl TryFrom<SchemaRepr> for FeatureSchema {
    type Error = SchemaError;

    fn try_from(repr: SchemaRepr) -> Result<Self, Self::Error> {
        if repr.version != SCHEMA_VERSION {
            return Err(SchemaError::Version(repr.version));
        }
        if !repr.numeric.iter().map(String::as_str).eq(Numeric::iter().map(|numeric| numeric.column())) {
            return Err(SchemaError::Numeric(repr.numeric));
        }
        let mut categories: [Vec<String>; Dimension::COUNT] = Default::default();
        for (dimension, values) in repr.categories {
            if values.windows(2).any(|pair| pair[0] >= pair[1]) {
                return Err(SchemaError::Unordered(dimension));
            }
            categories[dimension.ordinal()] = values;
        }
        Self::from_categories(categories)
    }
}

/// A named-feature map describing a single fixture, as supplied to the predictor.
pub type SparseFeatures = BTreeMap<String, f64>;

#[derive(Debug, Clone, PartialEq)]
pub struct Reindexed {
    pub values: Vec<f64>,
    pub unknown: Vec<String>,
}

/// Convenience for describing a hypothetical fixture by its parts rather than its column names.
#[derive(Debug, Clone, Default)]
pub struct FixtureQuery {
    features: SparseFeatures,
}
impl FixtureQuery {
    pub fn numeric(mut self, numeric: Numeric, value: f64) -> Self {
        self.features.insert(numeric.column().to_string(), value);
        self
    }

    pub fn category(mut self, dimension: Dimension, category: &str) -> Self {
        self.features.insert(dimension.column(category), 1.0);
        self
    }

    pub fn build(self) -> SparseFeatures {
        self.features
    }
}
