//! Trailing-window form of each team entering each of its fixtures.
//!
//! A team's form at timeline position _k_ is the mean of its goals (and, separately, its expected
//! goals) over positions `max(0, k - window)..k`. The window is closed on the left and open on the
//! right, so the fixture being described never contributes to its own features, nor does anything
//! played after it. The value taken from each prior fixture depends on the side the team played on
//! in _that_ fixture; the result is filed under the side the team plays on in the _target_
//! fixture.
//!
//! Timelines are processed independently of one another and only then merged into a
//! [FormTable], which holds exactly one cell per (fixture, side) pair.

use anyhow::bail;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::record::{MatchRecord, Side};
use crate::timeline::{Appearance, TeamTimeline, Timelines};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    /// Maximum number of prior fixtures averaged.
    pub window: usize,

    /// Minimum number of prior fixtures for form to be defined. Setting this to `window` requires
    /// a full window.
    pub min_history: usize,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            window: 5,
            min_history: 1,
        }
    }
}

impl FormConfig {
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.window == 0 {
            bail!("form window must be at least 1");
        }
        if !(1..=self.window).contains(&self.min_history) {
            bail!("minimum history must be in the range 1..={}", self.window);
        }
        Ok(())
    }
}

/// Rolling means for one team entering one fixture.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RollingForm {
    pub goals: f64,
    pub xg: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FixtureForm {
    pub home: Option<RollingForm>,
    pub away: Option<RollingForm>,
}
impl FixtureForm {
    pub fn side(&self, side: Side) -> Option<RollingForm> {
        match side {
            Side::Home => self.home,
            Side::Away => self.away,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut Option<RollingForm> {
        match side {
            Side::Home => &mut self.home,
            Side::Away => &mut self.away,
        }
    }

    /// Home and away form, if both teams have enough history.
    pub fn complete(&self) -> Option<(RollingForm, RollingForm)> {
        Some((self.home?, self.away?))
    }
}

/// Mean of `values[max(0, position - window)..position]`, or `None` if fewer than `min_history`
/// values precede `position`.
pub fn trailing_mean(values: &[f64], position: usize, config: &FormConfig) -> Option<f64> {
    if position < config.min_history || position > values.len() {
        return None;
    }
    let window = &values[position.saturating_sub(config.window)..position];
    if window.is_empty() {
        None
    } else {
        Some(window.iter().sum::<f64>() / window.len() as f64)
    }
}

/// Form of a single team entering each of its fixtures, in timeline order.
pub fn team_form(
    timeline: &TeamTimeline,
    records: &[MatchRecord],
    config: &FormConfig,
) -> Vec<(Appearance, Option<RollingForm>)> {
    let appearances = timeline.appearances();
    let goals: Vec<f64> = appearances
        .iter()
        .map(|appearance| records[appearance.fixture].goals(appearance.side) as f64)
        .collect();
    let xg: Vec<f64> = appearances
        .iter()
        .map(|appearance| records[appearance.fixture].xg(appearance.side))
        .collect();
    appearances
        .iter()
        .enumerate()
        .map(|(position, &appearance)| {
            let form = match (
                trailing_mean(&goals, position, config),
                trailing_mean(&xg, position, config),
            ) {
                (Some(goals), Some(xg)) => Some(RollingForm { goals, xg }),
                _ => None,
            };
            (appearance, form)
        })
        .collect()
}

/// Home and away form for every fixture, indexed by the fixture's position in the record set.
#[derive(Debug, Clone, PartialEq)]
pub struct FormTable {
    cells: Vec<FixtureForm>,
}
impl FormTable {
    pub fn compute(records: &[MatchRecord], timelines: &Timelines, config: &FormConfig) -> Self {
        let timelines: Vec<&TeamTimeline> = timelines.iter().collect();
        let per_team: Vec<_> = timelines
            .par_iter()
            .map(|timeline| team_form(timeline, records, config))
            .collect();

        let mut cells = vec![FixtureForm::default(); records.len()];
        for (appearance, form) in per_team.into_iter().flatten() {
            *cells[appearance.fixture].side_mut(appearance.side) = form;
        }
        let table = Self { cells };
        debug!(
            "computed form for {} fixtures across {} teams, {} cold starts",
            table.len(),
            timelines.len(),
            table.cold_starts()
        );
        table
    }

    pub fn get(&self, fixture: usize) -> Option<&FixtureForm> {
        self.cells.get(fixture)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Fixtures in which at least one team lacks enough history.
    pub fn cold_starts(&self) -> usize {
        self.cells
            .iter()
            .filter(|cell| cell.complete().is_none())
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FixtureForm> {
        self.cells.iter()
    }
}

#[cfg(test)]
mod tests;
