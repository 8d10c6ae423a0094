//! Ingestion settings: which columns hold which fields and how their values are spelled.

use anyhow::bail;
use serde::{Deserialize, Serialize};

/// Header names of the raw columns consumed by the normaliser. Defaults follow the layout of the
/// public schedule-and-results tables, where the away expected-goals column arrives as `xG.1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Columns {
    pub date: String,
    pub week: String,
    pub home_team: String,
    pub away_team: String,
    pub score: String,
    pub home_xg: String,
    pub away_xg: String,
    pub referee: String,
    pub venue: String,
}

impl Default for Columns {
    fn default() -> Self {
        Self {
            date: "Date".into(),
            week: "Wk".into(),
            home_team: "Home".into(),
            away_team: "Away".into(),
            score: "Score".into(),
            home_xg: "xG".into(),
            away_xg: "xG.1".into(),
            referee: "Referee".into(),
            venue: "Venue".into(),
        }
    }
}

impl Columns {
    fn names(&self) -> [&str; 9] {
        [
            self.date.as_str(),
            self.week.as_str(),
            self.home_team.as_str(),
            self.away_team.as_str(),
            self.score.as_str(),
            self.home_xg.as_str(),
            self.away_xg.as_str(),
            self.referee.as_str(),
            self.venue.as_str(),
        ]
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        let names = self.names();
        for (index, name) in names.iter().enumerate() {
            if name.trim().is_empty() {
                bail!("column names cannot be blank");
            }
            if names[..index].contains(name) {
                bail!("column {name} is mapped to more than one field");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub columns: Columns,

    /// Separator between the home and away goals in the score column.
    pub score_separator: String,

    /// Also accept a plain hyphen where the separator is expected.
    pub lenient_separator: bool,

    /// `chrono` formats tried in order when parsing the date column.
    pub date_formats: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            columns: Columns::default(),
            score_separator: "–".into(),
            lenient_separator: false,
            date_formats: vec!["%Y-%m-%d".into()],
        }
    }
}

impl IngestConfig {
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.columns.validate()?;
        if self.score_separator.is_empty() {
            bail!("score separator cannot be empty");
        }
        if self.score_separator.chars().any(|c| c.is_ascii_digit()) {
            bail!("score separator cannot contain digits");
        }
        if self.date_formats.is_empty() {
            bail!("at least one date format must be specified");
        }
        Ok(())
    }
}
