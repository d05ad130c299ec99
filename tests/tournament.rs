use std::str::FromStr;

use sideout::{
    bracket,
    clock::ClockTime,
    court::Court,
    matches::Slot,
    phase::Phase,
    pool::Pool,
    resolve::{self, MatchState},
    schedule::Schedule,
    score::{RawScore, ResultStore, record_result},
    settings::Settings,
    solver,
    store::{Skeleton, Store},
    team::Team,
};

fn teams(prefix: &str, count: usize) -> Vec<Team> {
    (1..=count)
        .map(|i| Team::new(&format!("{prefix}{i}")))
        .collect()
}

fn two_pools_of_four() -> Vec<Pool> {
    vec![
        Pool::new("A", teams("A", 4), 2).unwrap(),
        Pool::new("B", teams("B", 4), 2).unwrap(),
    ]
}

fn two_courts() -> Vec<Court> {
    vec![
        Court::new(
            "Court 1",
            ClockTime::from_hm(8, 0),
            ClockTime::from_hm(20, 0),
        )
        .unwrap(),
        Court::new(
            "Court 2",
            ClockTime::from_hm(8, 0),
            ClockTime::from_hm(20, 0),
        )
        .unwrap(),
    ]
}

/// Eight teams in two pools of four, two courts, 25-minute matches
/// with 5-minute breaks: all twelve pool matches fit, and the four
/// advancing teams produce exactly two semifinals and a final.
#[test]
fn eight_teams_two_pools_two_courts() {
    let pools = two_pools_of_four();
    let courts = two_courts();
    let settings = Settings {
        match_minutes: 25,
        break_minutes: 5,
        ..Default::default()
    };

    let structure = bracket::generate(&pools, None, &settings).unwrap();
    assert_eq!(structure.pool_matches.len(), 12);

    let bracket_matches: Vec<_> = structure.gold.all_matches().collect();
    assert_eq!(bracket_matches.len(), 3);
    assert_eq!(
        bracket_matches
            .iter()
            .filter(|m| m.phase == Phase::Winners && m.round == 1)
            .count(),
        2
    );
    assert!(structure.gold.losers.is_empty());
    assert!(structure.gold.grand_final.is_none());

    let all_teams: Vec<Team> = pools.iter().flat_map(|pool| pool.teams.clone()).collect();
    let matches = structure.schedulable_matches();
    let (schedule, unplaced) = solver::schedule(&matches, &courts, &all_teams, &settings).unwrap();

    assert!(unplaced.is_empty());
    assert_eq!(schedule.bookings.len(), 15);
    schedule.validate(&matches, &courts, &settings).unwrap();
}

/// Plays a whole tournament through: pools, then the bracket down to a
/// champion, checking the resolved view at each step.
#[test]
fn pool_play_through_champion() {
    let pools = two_pools_of_four();
    let settings = Settings::default();
    let structure = bracket::generate(&pools, None, &settings).unwrap();

    let mut results = ResultStore::default();
    let schedule = Schedule::default();

    // Before any result everything bracket-side is pending.
    let view = resolve::resolve(&structure, &schedule, &results);
    assert!(
        view.gold
            .iter()
            .flat_map(|round| round.matches.iter())
            .all(|m| m.state == MatchState::Pending)
    );

    // Lower-numbered teams win their pools.
    for m in &structure.pool_matches {
        let [Slot::Team(a), Slot::Team(b)] = &m.slots else {
            panic!("pool match without concrete teams");
        };
        let score = if a < b { "21-12" } else { "12-21" };
        results.submit(record_result(&m.code, &RawScore::from_str(score).unwrap(), settings.scoring).unwrap());
    }

    let view = resolve::resolve(&structure, &schedule, &results);

    // A1 and B1 topped their pools; the semifinals pair them against
    // the runners-up from the other pool's half.
    let semifinals = &view.gold[0];
    assert_eq!(semifinals.name, "Semifinal");
    for m in &semifinals.matches {
        assert_eq!(m.state, MatchState::Ready);
        assert!(m.sides.iter().all(Option::is_some));
    }

    // Seed 1 (pool A winner) and seed 2 (pool B winner) are in
    // different semifinals.
    let sides_of = |index: usize| -> Vec<String> {
        semifinals.matches[index]
            .sides
            .iter()
            .map(|side| side.clone().unwrap())
            .collect()
    };
    let first = sides_of(0);
    let second = sides_of(1);
    assert_ne!(
        first.contains(&"A1".to_string()),
        second.contains(&"A1".to_string())
    );
    assert_ne!(
        first.contains(&"B1".to_string()),
        second.contains(&"B1".to_string())
    );

    // Play the semifinals: side A wins both.
    for m in &structure.gold.winners[0].matches {
        results.submit(
            record_result(&m.code, &RawScore::from_str("21-15").unwrap(), settings.scoring)
                .unwrap(),
        );
    }

    let view = resolve::resolve(&structure, &schedule, &results);
    let final_match = &view.gold[1].matches[0];
    assert_eq!(final_match.state, MatchState::Ready);

    // Play the final.
    let final_code = &structure.gold.winners[1].matches[0].code;
    results.submit(
        record_result(final_code, &RawScore::from_str("21-19").unwrap(), settings.scoring)
            .unwrap(),
    );

    let view = resolve::resolve(&structure, &schedule, &results);
    let final_match = &view.gold[1].matches[0];
    assert_eq!(final_match.state, MatchState::Complete);
    assert!(final_match.winner.is_some());
}

/// Regenerating a tournament drops every stored result: stale scores
/// must not reattach to reassigned codes.
#[test]
fn regeneration_clears_recorded_results() {
    let root = std::env::temp_dir().join("sideout-integration-regen");
    let _ = std::fs::remove_dir_all(&root);
    let store = Store::at(&root);

    let pools = two_pools_of_four();
    let settings = Settings::default();
    let structure = bracket::generate(&pools, None, &settings).unwrap();

    let skeleton = Skeleton {
        structure: structure.clone(),
        schedule: Schedule::default(),
        settings: settings.clone(),
    };
    store.regenerate("cup", &skeleton).unwrap();

    let code = structure.pool_matches[0].code.clone();
    let result = record_result(
        &code,
        &RawScore::from_str("21-15").unwrap(),
        settings.scoring,
    )
    .unwrap();
    store.submit_result("cup", result).unwrap();

    let results = store.load_results("cup").unwrap();
    assert!(results.get(&code).is_some());

    // Structural change: regenerate. The result store must come back
    // empty and the match read as pending.
    store.regenerate("cup", &skeleton).unwrap();
    let results = store.load_results("cup").unwrap();
    assert!(results.get(&code).is_none());

    let loaded = store.load_skeleton("cup").unwrap().unwrap();
    let view = resolve::resolve(&loaded.structure, &loaded.schedule, &results);
    let pool_match = view
        .pools
        .iter()
        .flat_map(|pool| pool.matches.iter())
        .find(|m| m.code == code)
        .unwrap();
    assert_eq!(pool_match.state, MatchState::Ready);
}

/// A team constrained to play after 10:00 never starts earlier, even
/// though the schedule would be shorter without the restriction.
#[test]
fn play_window_beats_the_objective() {
    let mut pool_teams = teams("T", 4);
    pool_teams[0].window = Some(sideout::team::PlayWindow {
        play_after: Some(ClockTime::from_hm(10, 0)),
        play_before: None,
    });

    let pools = vec![Pool::new("A", pool_teams.clone(), 0).unwrap()];
    let settings = Settings::default();
    let structure = bracket::generate(&pools, None, &settings).unwrap();

    let courts = vec![
        Court::new(
            "Center",
            ClockTime::from_hm(8, 0),
            ClockTime::from_hm(20, 0),
        )
        .unwrap(),
    ];

    let matches = structure.schedulable_matches();
    let (schedule, unplaced) =
        solver::schedule(&matches, &courts, &pool_teams, &settings).unwrap();
    assert!(unplaced.is_empty());

    for m in &matches {
        if m.slots.iter().any(|slot| *slot == Slot::Team("T1".to_string())) {
            let booking = schedule.booking(&m.code).unwrap();
            assert!(booking.start >= ClockTime::from_hm(10, 0));
        }
    }
}
