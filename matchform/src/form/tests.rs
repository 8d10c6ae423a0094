use assert_float_eq::*;

use super::*;
use crate::synthetic::record;

fn compute(records: &[MatchRecord], config: &FormConfig) -> FormTable {
    FormTable::compute(records, &Timelines::build(records), config)
}

#[test]
fn trailing_mean_windows() {
    let config = FormConfig::default();
    let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
    assert_eq!(None, trailing_mean(&values, 0, &config));
    assert_eq!(Some(1.0), trailing_mean(&values, 1, &config));
    assert_eq!(Some(1.5), trailing_mean(&values, 2, &config));
    assert_eq!(Some(3.0), trailing_mean(&values, 5, &config));
    assert_eq!(Some(4.0), trailing_mean(&values, 6, &config));
    assert_eq!(Some(5.0), trailing_mean(&values, 7, &config));
    assert_eq!(None, trailing_mean(&values, 8, &config));
}

#[test]
fn full_window_required() {
    let config = FormConfig {
        window: 3,
        min_history: 3,
    };
    let values = [1.0, 2.0, 3.0, 4.0];
    assert_eq!(None, trailing_mean(&values, 2, &config));
    assert_eq!(Some(2.0), trailing_mean(&values, 3, &config));
    assert_eq!(Some(3.0), trailing_mean(&values, 4, &config));
}

#[test]
fn validate_config() {
    assert!(FormConfig::default().validate().is_ok());
    assert!(FormConfig { window: 0, min_history: 0 }.validate().is_err());
    assert!(FormConfig { window: 5, min_history: 0 }.validate().is_err());
    assert!(FormConfig { window: 5, min_history: 6 }.validate().is_err());
}

#[test]
fn role_dependent_values() {
    // A: home vs B (2-1), away at C (3-0 to A), then home vs B.
    let records = vec![
        record("2020-01-01", "A", 2, 1, "B"),
        record("2020-01-08", "C", 0, 3, "A"),
        record("2020-01-15", "A", 1, 1, "B"),
    ];
    let table = compute(&records, &FormConfig::default());

    let first = table.get(0).unwrap();
    assert_eq!(None, first.home);
    assert_eq!(None, first.away);
    assert_eq!(None, first.complete());

    // C has no history; A's away form draws on its home goals in the first fixture.
    let second = table.get(1).unwrap();
    assert_eq!(None, second.home);
    assert_eq!(Some(RollingForm { goals: 2.0, xg: 2.0 }), second.away);

    let third = table.get(2).unwrap();
    let (home, away) = third.complete().unwrap();
    assert_float_absolute_eq!(2.5, home.goals);
    assert_float_absolute_eq!(2.5, home.xg);
    assert_float_absolute_eq!(1.0, away.goals);
    assert_eq!(2, table.cold_starts());
}

#[test]
fn three_team_scenario() {
    let records = vec![
        record("2020-01-01", "A", 2, 1, "B"),
        record("2020-01-08", "C", 0, 3, "A"),
        record("2020-01-15", "B", 1, 1, "C"),
        record("2020-01-22", "A", 2, 2, "C"),
    ];
    let table = compute(&records, &FormConfig::default());
    assert_eq!(None, table.get(0).unwrap().complete());

    let (home, away) = table.get(3).unwrap().complete().unwrap();
    assert_float_absolute_eq!(2.5, home.goals);
    assert_float_absolute_eq!(0.5, away.goals);

    let (home, away) = table.get(2).unwrap().complete().unwrap();
    assert_float_absolute_eq!(1.0, home.goals);
    assert_float_absolute_eq!(0.0, away.goals);
}

#[test]
fn window_slides() {
    let records: Vec<_> = (0..7)
        .map(|week| {
            let date = format!("2020-0{}-01", week + 1);
            if week % 2 == 0 {
                record(&date, "A", week as u8, 0, "B")
            } else {
                record(&date, "B", 0, week as u8, "A")
            }
        })
        .collect();
    let table = compute(&records, &FormConfig::default());
    // A scored 0..=5 over its first six fixtures; the seventh sees 1..=5.
    let (home, _) = table.get(6).unwrap().complete().unwrap();
    assert_float_absolute_eq!(3.0, home.goals);
    let (_, away) = table.get(5).unwrap().complete().unwrap();
    assert_float_absolute_eq!(2.0, away.goals);
}

#[test]
fn future_results_do_not_leak() {
    let mut records = vec![
        record("2020-01-01", "A", 2, 1, "B"),
        record("2020-01-08", "B", 0, 0, "A"),
        record("2020-01-15", "A", 1, 3, "B"),
        record("2020-01-22", "B", 1, 2, "A"),
    ];
    let config = FormConfig::default();
    let before = compute(&records, &config);

    records[3].home_goals = 9;
    records[3].away_xg = 7.5;
    let after = compute(&records, &config);
    for fixture in 0..3 {
        assert_eq!(before.get(fixture), after.get(fixture));
    }

    // Changing the target fixture itself leaves its own features untouched too.
    assert_eq!(before.get(3), after.get(3));
}

#[test]
fn same_date_fixtures_follow_input_order() {
    let records = vec![
        record("2020-01-01", "A", 4, 0, "B"),
        record("2020-01-01", "A", 0, 0, "C"),
    ];
    let table = compute(&records, &FormConfig::default());
    assert_eq!(None, table.get(0).unwrap().home);
    assert_eq!(Some(4.0), table.get(1).unwrap().home.map(|form| form.goals));
}

#[test]
fn empty_records() {
    let table = compute(&[], &FormConfig::default());
    assert!(table.is_empty());
    assert_eq!(0, table.cold_starts());
}
