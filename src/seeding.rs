use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::{pool::Pool, standings::StandingsRow};

/// Where a seed's team comes from: a finished standing, or a pool place
/// still being played for.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum SeedSource {
    Known(String),
    Placeholder { pool: String, place: usize },
}

impl fmt::Display for SeedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(name) => write!(f, "{name}"),
            Self::Placeholder { pool, place } => write!(f, "Pool {pool} #{place}"),
        }
    }
}

/// Collects the advancing teams into seed order: all first-place
/// finishers (pools ordered by name), then all second-place finishers,
/// and so on. Without standings the seeds stay placeholders.
#[must_use]
pub fn advancing_seeds(
    pools: &[Pool],
    standings: Option<&BTreeMap<String, Vec<StandingsRow>>>,
) -> Vec<SeedSource> {
    seeds_by_place(pools, standings, |pool, place| {
        (place <= pool.advance_count).then_some(place)
    })
}

/// The non-advancing remainder in the same cross-pool order, for the
/// silver bracket.
#[must_use]
pub fn remaining_seeds(
    pools: &[Pool],
    standings: Option<&BTreeMap<String, Vec<StandingsRow>>>,
) -> Vec<SeedSource> {
    seeds_by_place(pools, standings, |pool, relative| {
        let place = pool.advance_count + relative;
        (place <= pool.teams.len()).then_some(place)
    })
}

fn seeds_by_place(
    pools: &[Pool],
    standings: Option<&BTreeMap<String, Vec<StandingsRow>>>,
    place_for: impl Fn(&Pool, usize) -> Option<usize>,
) -> Vec<SeedSource> {
    let mut ordered: Vec<&Pool> = pools.iter().collect();
    ordered.sort_by(|a, b| a.name.cmp(&b.name));

    let mut seeds = Vec::new();

    for position in 1.. {
        let mut any = false;

        for pool in &ordered {
            let Some(place) = place_for(pool, position) else {
                continue;
            };
            any = true;

            let known = standings
                .and_then(|map| map.get(&pool.name))
                .and_then(|rows| rows.get(place - 1))
                .map(|row| row.team.clone());

            seeds.push(match known {
                Some(team) => SeedSource::Known(team),
                None => SeedSource::Placeholder {
                    pool: pool.name.clone(),
                    place,
                },
            });
        }

        if !any {
            break;
        }
    }

    seeds
}

/// Seed numbers in bracket-slot order for a power-of-two bracket, built
/// by the recursive opposite-half doubling: seed 1 and seed 2 land in
/// opposite halves, seeds 1-4 in distinct quarters, and so on.
#[must_use]
pub fn bracket_order(size: usize) -> Vec<usize> {
    if size == 0 {
        return Vec::new();
    }

    let mut order = vec![1];

    while order.len() < size {
        let doubled = order.len() * 2;
        let mut next = Vec::with_capacity(doubled);

        for &seed in &order {
            next.push(seed);
            next.push(doubled + 1 - seed);
        }

        order = next;
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::team::Team;

    fn pool(name: &str, teams: &[&str], advance: usize) -> Pool {
        let teams = teams.iter().map(|name| Team::new(name)).collect();
        Pool::new(name, teams, advance).unwrap()
    }

    #[test]
    fn order_separates_top_seeds() {
        for size in [2_usize, 4, 8, 16, 32, 64] {
            let order = bracket_order(size);
            assert_eq!(order.len(), size);

            let position = |seed: usize| order.iter().position(|s| *s == seed).unwrap();

            // Seeds 1 and 2 in opposite halves.
            assert_ne!(position(1) < size / 2, position(2) < size / 2);

            // Seeds 1 through 4 in four distinct quarters.
            if size >= 4 {
                let mut quarters: Vec<usize> =
                    (1..=4).map(|seed| position(seed) / (size / 4)).collect();
                quarters.sort_unstable();
                quarters.dedup();
                assert_eq!(quarters.len(), 4, "bracket of {size}");
            }
        }
    }

    #[test]
    fn groups_by_place_across_pools() {
        let pools = [
            pool("B", &["B1", "B2", "B3"], 2),
            pool("A", &["A1", "A2", "A3"], 2),
        ];

        let seeds = advancing_seeds(&pools, None);
        let labels: Vec<String> = seeds.iter().map(ToString::to_string).collect();
        assert_eq!(
            labels,
            ["Pool A #1", "Pool B #1", "Pool A #2", "Pool B #2"]
        );

        let rest = remaining_seeds(&pools, None);
        let labels: Vec<String> = rest.iter().map(ToString::to_string).collect();
        assert_eq!(labels, ["Pool A #3", "Pool B #3"]);
    }

    #[test]
    fn zero_advancing_is_empty() {
        let pools = [pool("A", &["A1", "A2"], 0)];
        assert!(advancing_seeds(&pools, None).is_empty());
    }

    #[test]
    fn known_standings_fill_names() {
        let pools = [pool("A", &["A1", "A2", "A3"], 1)];

        let mut standings = BTreeMap::new();
        standings.insert(
            "A".to_string(),
            vec![
                StandingsRow {
                    team: "A2".to_string(),
                    ..Default::default()
                },
                StandingsRow {
                    team: "A1".to_string(),
                    ..Default::default()
                },
            ],
        );

        let seeds = advancing_seeds(&pools, Some(&standings));
        assert_eq!(seeds, [SeedSource::Known("A2".to_string())]);
    }
}
