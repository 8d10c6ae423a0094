//! Canonical match records and the normaliser that derives them from raw tabular rows.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};
use ordinalizer::Ordinal;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumCount, EnumIter, IntoStaticStr};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::IngestConfig;
use crate::season::{SeasonId, SeasonPolicy};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Ordinal, EnumCount, EnumIter, Display,
)]
pub enum Outcome {
    HomeWin,
    AwayWin,
    Draw,
}
impl Outcome {
    pub fn from_score(home_goals: u8, away_goals: u8) -> Self {
        match home_goals.cmp(&away_goals) {
            std::cmp::Ordering::Greater => Outcome::HomeWin,
            std::cmp::Ordering::Less => Outcome::AwayWin,
            std::cmp::Ordering::Equal => Outcome::Draw,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display)]
pub enum Side {
    Home,
    Away,
}

/// A single result, immutable once normalised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub date: NaiveDate,
    pub season: SeasonId,
    pub week: u16,
    pub home_team: String,
    pub away_team: String,
    pub home_goals: u8,
    pub away_goals: u8,
    pub home_xg: f64,
    pub away_xg: f64,
    pub referee: String,
    pub venue: String,
}
impl MatchRecord {
    pub fn weekday(&self) -> Weekday {
        self.date.weekday()
    }

    pub fn outcome(&self) -> Outcome {
        Outcome::from_score(self.home_goals, self.away_goals)
    }

    pub fn team(&self, side: Side) -> &str {
        match side {
            Side::Home => &self.home_team,
            Side::Away => &self.away_team,
        }
    }

    pub fn goals(&self, side: Side) -> u8 {
        match side {
            Side::Home => self.home_goals,
            Side::Away => self.away_goals,
        }
    }

    pub fn xg(&self, side: Side) -> f64 {
        match side {
            Side::Home => self.home_xg,
            Side::Away => self.away_xg,
        }
    }

    /// The side `team` played on, if it took part.
    pub fn side_of(&self, team: &str) -> Option<Side> {
        if self.home_team == team {
            Some(Side::Home)
        } else if self.away_team == team {
            Some(Side::Away)
        } else {
            None
        }
    }
}

/// An untyped row keyed by column name, as supplied by a file reader or any other tabular source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    fields: FxHashMap<String, String>,
}
impl RawRow {
    pub fn contains(&self, column: &str) -> bool {
        self.fields.contains_key(column)
    }

    /// The trimmed value of `column`, treating blank and `NaN` cells as absent.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .get(column)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty() && !value.eq_ignore_ascii_case("nan"))
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(column.into(), value.into());
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRow {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(column, value)| (column.into(), value.into()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Field {
    Date,
    Week,
    HomeTeam,
    AwayTeam,
    Score,
    HomeXg,
    AwayXg,
    Referee,
    Venue,
}

/// Why a raw row was rejected. Rejections are local to the row; normalisation carries on.
#[derive(Debug, Clone, PartialEq, Error, IntoStaticStr)]
pub enum ParseError {
    #[error("missing {0}")]
    MissingField(Field),

    #[error("unparseable date '{0}'")]
    Date(String),

    #[error("unparseable score '{0}'")]
    Score(String),

    #[error("unparseable week '{0}'")]
    Week(String),

    #[error("unparseable expected goals '{0}'")]
    ExpectedGoals(String),

    #[error("{0} cannot play itself")]
    SameTeams(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub row: usize,
    pub error: ParseError,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Normalised {
    pub records: Vec<MatchRecord>,
    pub rejections: Vec<Rejection>,
}
impl Normalised {
    /// Number of rejected rows by error kind.
    pub fn rejection_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for rejection in &self.rejections {
            let kind: &'static str = (&rejection.error).into();
            *counts.entry(kind).or_insert(0) += 1;
        }
        counts
    }
}

pub struct Normaliser<'a> {
    config: &'a IngestConfig,
    seasons: &'a SeasonPolicy,
}
impl<'a> Normaliser<'a> {
    pub fn new(config: &'a IngestConfig, seasons: &'a SeasonPolicy) -> Self {
        Self { config, seasons }
    }

    pub fn normalise(&self, rows: impl IntoIterator<Item = RawRow>) -> Normalised {
        let mut normalised = Normalised::default();
        for (row, raw) in rows.into_iter().enumerate() {
            match self.parse(&raw) {
                Ok(record) => normalised.records.push(record),
                Err(error) => {
                    debug!("dropping row {row}: {error}");
                    normalised.rejections.push(Rejection { row, error });
                }
            }
        }
        info!(
            "normalised {} records, dropped {} rows {:?}",
            normalised.records.len(),
            normalised.rejections.len(),
            normalised.rejection_counts()
        );
        normalised
    }

    pub fn parse(&self, raw: &RawRow) -> Result<MatchRecord, ParseError> {
        let columns = &self.config.columns;
        let date = self.parse_date(required(raw, &columns.date, Field::Date)?)?;
        let (home_goals, away_goals) = self.parse_score(required(raw, &columns.score, Field::Score)?)?;
        let referee = required(raw, &columns.referee, Field::Referee)?.to_string();
        let venue = required(raw, &columns.venue, Field::Venue)?.to_string();
        let home_xg = parse_xg(required(raw, &columns.home_xg, Field::HomeXg)?)?;
        let away_xg = parse_xg(required(raw, &columns.away_xg, Field::AwayXg)?)?;
        let home_team = required(raw, &columns.home_team, Field::HomeTeam)?.to_string();
        let away_team = required(raw, &columns.away_team, Field::AwayTeam)?.to_string();
        if home_team == away_team {
            return Err(ParseError::SameTeams(home_team));
        }
        let week = if raw.contains(&columns.week) {
            parse_week(required(raw, &columns.week, Field::Week)?)?
        } else {
            0
        };

        Ok(MatchRecord {
            date,
            season: self.seasons.season_of(date),
            week,
            home_team,
            away_team,
            home_goals,
            away_goals,
            home_xg,
            away_xg,
            referee,
            venue,
        })
    }

    fn parse_date(&self, value: &str) -> Result<NaiveDate, ParseError> {
        self.config
            .date_formats
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
            .ok_or_else(|| ParseError::Date(value.to_string()))
    }

    fn parse_score(&self, value: &str) -> Result<(u8, u8), ParseError> {
        let split = value.split_once(self.config.score_separator.as_str()).or_else(|| {
            if self.config.lenient_separator {
                value.split_once('-')
            } else {
                None
            }
        });
        let (home, away) = split.ok_or_else(|| ParseError::Score(value.to_string()))?;
        match (home.trim().parse(), away.trim().parse()) {
            (Ok(home), Ok(away)) => Ok((home, away)),
            _ => Err(ParseError::Score(value.to_string())),
        }
    }
}

fn required<'r>(raw: &'r RawRow, column: &str, field: Field) -> Result<&'r str, ParseError> {
    raw.get(column).ok_or(ParseError::MissingField(field))
}

fn parse_xg(value: &str) -> Result<f64, ParseError> {
    match value.parse::<f64>() {
        Ok(xg) if xg.is_finite() && xg >= 0.0 => Ok(xg),
        _ => Err(ParseError::ExpectedGoals(value.to_string())),
    }
}

/// Week numbers occasionally arrive float-formatted (`"12.0"`); only whole, non-negative values
/// are accepted.
fn parse_week(value: &str) -> Result<u16, ParseError> {
    if let Ok(week) = value.parse::<u16>() {
        return Ok(week);
    }
    match value.parse::<f64>() {
        Ok(week) if week.fract() == 0.0 && (0.0..=u16::MAX as f64).contains(&week) => Ok(week as u16),
        _ => Err(ParseError::Week(value.to_string())),
    }
}
