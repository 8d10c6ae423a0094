//! Per-team chronological views over the record set.

use std::collections::BTreeMap;

use tracing::debug;

use crate::record::{MatchRecord, Side};

/// One team's participation in a fixture, identified by the fixture's index in the record set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Appearance {
    pub fixture: usize,
    pub side: Side,
}

/// Every fixture a team took part in, home and away combined, in ascending date order. Fixtures
/// on the same date keep the order in which they appear in the record set.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamTimeline {
    team: String,
    appearances: Vec<Appearance>,
}
impl TeamTimeline {
    pub fn team(&self) -> &str {
        &self.team
    }

    pub fn appearances(&self) -> &[Appearance] {
        &self.appearances
    }

    pub fn len(&self) -> usize {
        self.appearances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.appearances.is_empty()
    }

    /// Zero-based position of `fixture` within this timeline.
    pub fn position_of(&self, fixture: usize) -> Option<usize> {
        self.appearances
            .iter()
            .position(|appearance| appearance.fixture == fixture)
    }

    /// Appearances strictly before `position`.
    pub fn preceding(&self, position: usize) -> &[Appearance] {
        &self.appearances[..position.min(self.appearances.len())]
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Timelines {
    by_team: BTreeMap<String, TeamTimeline>,
}
impl Timelines {
    pub fn build(records: &[MatchRecord]) -> Self {
        let mut by_team: BTreeMap<String, TeamTimeline> = BTreeMap::new();
        for (fixture, record) in records.iter().enumerate() {
            for side in [Side::Home, Side::Away] {
                let team = record.team(side);
                by_team
                    .entry(team.to_string())
                    .or_insert_with(|| TeamTimeline {
                        team: team.to_string(),
                        appearances: vec![],
                    })
                    .appearances
                    .push(Appearance { fixture, side });
            }
        }
        for timeline in by_team.values_mut() {
            timeline
                .appearances
                .sort_by_key(|appearance| records[appearance.fixture].date);
        }
        debug!("built {} team timelines from {} records", by_team.len(), records.len());
        Self { by_team }
    }

    pub fn get(&self, team: &str) -> Option<&TeamTimeline> {
        self.by_team.get(team)
    }

    pub fn len(&self) -> usize {
        self.by_team.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_team.is_empty()
    }

    /// Timelines in ascending order of team name.
    pub fn iter(&self) -> impl Iterator<Item = &TeamTimeline> {
        self.by_team.values()
    }
}
