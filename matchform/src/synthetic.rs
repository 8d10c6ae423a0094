//! Deterministic synthetic fixtures, used for testing and benchmarking.

use chrono::{Days, NaiveDate};
use tinyrand::{Rand, Seeded, StdRand};

use crate::record::MatchRecord;
use crate::season::{SeasonId, SeasonPolicy};

const REFEREES: [&str; 5] = [
    "Anthony Taylor",
    "Michael Oliver",
    "Simon Hooper",
    "Paul Tierney",
    "Chris Kavanagh",
];

/// A single record with expected goals equal to the goals scored. Dates are `%Y-%m-%d`.
pub fn record(date: &str, home: &str, home_goals: u8, away_goals: u8, away: &str) -> MatchRecord {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .unwrap_or_else(|err| panic!("invalid date '{date}': {err}"));
    MatchRecord {
        date,
        season: SeasonPolicy::default().season_of(date),
        week: 1,
        home_team: home.into(),
        away_team: away.into(),
        home_goals,
        away_goals,
        home_xg: home_goals as f64,
        away_xg: away_goals as f64,
        referee: REFEREES[0].into(),
        venue: venue_of(home),
    }
}

pub fn venue_of(team: &str) -> String {
    format!("{team} Ground")
}

/// A round-robin league in which every team hosts every other team once per season. Teams differ
/// in strength, so results are learnable from form.
#[derive(Debug, Clone)]
pub struct League {
    pub teams: usize,
    pub seasons: usize,
    pub first_season: SeasonId,
    pub seed: u64,
}

impl Default for League {
    fn default() -> Self {
        Self {
            teams: 8,
            seasons: 3,
            first_season: 2020,
            seed: 42,
        }
    }
}

impl League {
    pub fn team_name(index: usize) -> String {
        format!("Team {}", (b'A' + (index % 26) as u8) as char)
    }

    /// Generates records in chronological order, one matchday per week from mid-August.
    pub fn generate(&self) -> Vec<MatchRecord> {
        let mut rand = StdRand::seed(self.seed);
        let strengths: Vec<f64> = (0..self.teams)
            .map(|team| 0.6 + 1.4 * team as f64 / self.teams.max(2).saturating_sub(1) as f64)
            .collect();
        let pairings: Vec<(usize, usize)> = (0..self.teams)
            .flat_map(|home| (0..self.teams).map(move |away| (home, away)))
            .filter(|(home, away)| home != away)
            .collect();
        let per_week = (self.teams / 2).max(1);

        let mut records = Vec::with_capacity(self.seasons * pairings.len());
        for season in 0..self.seasons {
            let season_id = self.first_season + season as SeasonId;
            let Some(kickoff) = NaiveDate::from_ymd_opt(season_id, 8, 12) else {
                continue;
            };
            for (index, &(home, away)) in pairings.iter().enumerate() {
                let week = index / per_week;
                let Some(date) = kickoff.checked_add_days(Days::new(week as u64 * 7)) else {
                    continue;
                };
                let home_rate = 1.15 * strengths[home] / strengths[away].sqrt();
                let away_rate = strengths[away] / strengths[home].sqrt();
                let home_goals = poisson(home_rate, &mut rand);
                let away_goals = poisson(away_rate, &mut rand);
                records.push(MatchRecord {
                    date,
                    season: season_id,
                    week: (week + 1) as u16,
                    home_team: Self::team_name(home),
                    away_team: Self::team_name(away),
                    home_goals,
                    away_goals,
                    home_xg: noisy(home_rate, &mut rand),
                    away_xg: noisy(away_rate, &mut rand),
                    referee: REFEREES[(rand.next_u64() % REFEREES.len() as u64) as usize].into(),
                    venue: venue_of(&Self::team_name(home)),
                });
            }
        }
        records
    }
}

#[inline]
fn random_f64(rand: &mut impl Rand) -> f64 {
    rand.next_u64() as f64 / u64::MAX as f64
}

fn poisson(rate: f64, rand: &mut impl Rand) -> u8 {
    let limit = (-rate).exp();
    let mut product = random_f64(rand);
    let mut count = 0;
    while product > limit && count < u8::MAX {
        product *= random_f64(rand);
        count += 1;
    }
    count
}

fn noisy(rate: f64, rand: &mut impl Rand) -> f64 {
    (rate + (random_f64(rand) - 0.5) * 0.6).max(0.0)
}
