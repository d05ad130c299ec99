#[cfg(feature = "bench")]
use std::time::Duration;

#[cfg(feature = "bench")]
use criterion::{Criterion, criterion_group, criterion_main};

#[cfg(feature = "bench")]
fn schedule_four_pools(c: &mut Criterion) {
    use sideout::{
        bracket, clock::ClockTime, court::Court, pool::Pool, settings::Settings, solver,
        team::Team,
    };

    let pools: Vec<Pool> = ["A", "B", "C", "D"]
        .iter()
        .map(|name| {
            let teams = (1..=5)
                .map(|i| Team::new(&format!("{name}{i}")))
                .collect();
            Pool::new(name, teams, 2).unwrap()
        })
        .collect();

    let courts: Vec<Court> = (1..=4)
        .map(|i| {
            Court::new(
                &format!("Court {i}"),
                ClockTime::from_hm(8, 0),
                ClockTime::from_hm(22, 0),
            )
            .unwrap()
        })
        .collect();

    let settings = Settings::default();
    let structure = bracket::generate(&pools, None, &settings).unwrap();
    let matches = structure.schedulable_matches();
    let teams: Vec<Team> = pools.iter().flat_map(|pool| pool.teams.clone()).collect();

    c.bench_function("schedule_four_pools", move |b| {
        b.iter(|| solver::schedule(&matches, &courts, &teams, &settings).unwrap());
    });
}

#[cfg(feature = "bench")]
criterion_group! {
    name = benches;
    config = Criterion::default().measurement_time(Duration::from_secs(10));
    targets = schedule_four_pools
}

#[cfg(feature = "bench")]
criterion_main!(benches);

#[cfg(not(feature = "bench"))]
fn main() {
    eprintln!("You must enable pass `--features=bench`");
}
