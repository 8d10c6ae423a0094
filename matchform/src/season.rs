//! Season boundaries and the season-aware train/test partition.

use std::collections::BTreeSet;

use anyhow::bail;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dataset::FeatureRow;

/// Calendar year in which a season starts.
pub type SeasonId = i32;

/// Maps dates to seasons. A season starts on the first day of `start_month` and runs until the day
/// before the same date a year later, so with the default August start, 2024-05-19 belongs to the
/// 2023 season and 2024-08-16 to the 2024 season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonPolicy {
    pub start_month: u32,
}

impl Default for SeasonPolicy {
    fn default() -> Self {
        Self { start_month: 8 }
    }
}

impl SeasonPolicy {
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !(1..=12).contains(&self.start_month) {
            bail!("season start month must be in the range 1..=12");
        }
        Ok(())
    }

    pub fn season_of(&self, date: NaiveDate) -> SeasonId {
        if date.month() < self.start_month {
            date.year() - 1
        } else {
            date.year()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Last training season. When absent, the second-latest season in the data is used, leaving
    /// the latest season for evaluation.
    pub cutoff: Option<SeasonId>,
}

impl SplitConfig {
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.cutoff == Some(SeasonId::MAX) {
            bail!("no season follows the cutoff {}", SeasonId::MAX);
        }
        Ok(())
    }

    pub fn resolve(&self, rows: &[FeatureRow]) -> Option<SeasonId> {
        self.cutoff.or_else(|| default_cutoff(rows))
    }
}

/// The second-latest season present, or the only season if there is just one.
pub fn default_cutoff(rows: &[FeatureRow]) -> Option<SeasonId> {
    let seasons: BTreeSet<_> = rows.iter().map(FeatureRow::season).collect();
    let mut latest_first = seasons.into_iter().rev();
    let latest = latest_first.next()?;
    Some(latest_first.next().unwrap_or(latest))
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSplit {
    pub cutoff: SeasonId,
    pub train: Vec<FeatureRow>,
    pub test: Vec<FeatureRow>,
}
impl DatasetSplit {
    /// Partitions `rows` into seasons up to and including `cutoff` (training) and the season
    /// immediately after it (evaluation). Rows from later seasons belong to neither partition. The
    /// relative order of rows is preserved in both.
    pub fn by_season(rows: Vec<FeatureRow>, cutoff: SeasonId) -> Self {
        let total = rows.len();
        let test_season = cutoff.checked_add(1);
        let (mut train, mut test) = (Vec::new(), Vec::new());
        for row in rows {
            let season = row.season();
            if season <= cutoff {
                train.push(row);
            } else if Some(season) == test_season {
                test.push(row);
            }
        }
        info!(
            "split at season {cutoff}: {} training rows, {} test rows, {} later rows held out",
            train.len(),
            test.len(),
            total - train.len() - test.len()
        );
        Self {
            cutoff,
            train,
            test,
        }
    }

    /// The evaluation season, absent when the cutoff is the last representable season.
    pub fn test_season(&self) -> Option<SeasonId> {
        self.cutoff.checked_add(1)
    }

    pub fn train_seasons(&self) -> Option<(SeasonId, SeasonId)> {
        let first = self.train.iter().map(FeatureRow::season).min()?;
        let last = self.train.iter().map(FeatureRow::season).max()?;
        Some((first, last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::feature_row;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn season_boundaries() {
        let policy = SeasonPolicy::default();
        assert_eq!(2019, policy.season_of(date("2020-01-01")));
        assert_eq!(2019, policy.season_of(date("2020-07-31")));
        assert_eq!(2020, policy.season_of(date("2020-08-01")));
        assert_eq!(2020, policy.season_of(date("2020-12-31")));
    }

    #[test]
    fn calendar_year_competition() {
        let policy = SeasonPolicy { start_month: 1 };
        assert_eq!(2020, policy.season_of(date("2020-01-01")));
        assert_eq!(2020, policy.season_of(date("2020-12-31")));
    }

    #[test]
    fn invalid_start_month() {
        assert!(SeasonPolicy { start_month: 0 }.validate().is_err());
        assert!(SeasonPolicy { start_month: 13 }.validate().is_err());
    }

    #[test]
    fn three_season_split_is_leakage_free() {
        let rows = vec![
            feature_row("2018-09-01", 2018),
            feature_row("2019-03-01", 2018),
            feature_row("2019-09-01", 2019),
            feature_row("2020-02-01", 2019),
            feature_row("2020-09-01", 2020),
            feature_row("2021-01-01", 2020),
        ];
        let split = DatasetSplit::by_season(rows, 2019);
        assert_eq!(4, split.train.len());
        assert_eq!(2, split.test.len());
        assert!(split.test.iter().all(|row| row.season() > 2019));
        assert!(split.train.iter().all(|row| row.season() <= 2019));
        let latest_train = split.train.iter().map(|row| row.record.date).max().unwrap();
        let earliest_test = split.test.iter().map(|row| row.record.date).min().unwrap();
        assert!(latest_train < earliest_test);
        assert_eq!(Some((2018, 2019)), split.train_seasons());
    }

    #[test]
    fn later_seasons_held_out() {
        let rows = vec![
            feature_row("2018-09-01", 2018),
            feature_row("2019-09-01", 2019),
            feature_row("2020-09-01", 2020),
        ];
        let split = DatasetSplit::by_season(rows, 2018);
        assert_eq!(1, split.train.len());
        assert_eq!(1, split.test.len());
        assert_eq!(2019, split.test[0].season());
    }

    #[test]
    fn last_representable_cutoff() {
        let rows = vec![feature_row("2020-09-01", 2020)];
        let split = DatasetSplit::by_season(rows, SeasonId::MAX);
        assert_eq!(1, split.train.len());
        assert!(split.test.is_empty());
        assert_eq!(None, split.test_season());
        assert_eq!(Some(2021), DatasetSplit::by_season(vec![], 2020).test_season());

        assert!(SplitConfig { cutoff: Some(SeasonId::MAX) }.validate().is_err());
        assert!(SplitConfig { cutoff: Some(2020) }.validate().is_ok());
        assert!(SplitConfig::default().validate().is_ok());
    }

    #[test]
    fn default_cutoff_leaves_latest_for_test() {
        let rows = vec![
            feature_row("2020-09-01", 2020),
            feature_row("2018-09-01", 2018),
            feature_row("2019-09-01", 2019),
        ];
        assert_eq!(Some(2019), default_cutoff(&rows));
        assert_eq!(Some(2018), SplitConfig { cutoff: Some(2018) }.resolve(&rows));
        assert_eq!(Some(2020), default_cutoff(&rows[..1]));
        assert_eq!(None, default_cutoff(&[]));
    }
}
