use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    matches::{Match, Slot},
    phase::Phase,
    pool::Pool,
    score::ResultStore,
};

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct StandingsRow {
    pub team: String,
    pub played: u32,
    pub wins: u32,
    pub set_diff: i64,
    pub point_diff: i64,
}

impl fmt::Display for StandingsRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}-{} sets {:+} points {:+}",
            self.team,
            self.wins,
            self.played - self.wins,
            self.set_diff,
            self.point_diff
        )
    }
}

/// Ranks a pool from its recorded results: wins, then set differential,
/// then point differential, then name for a reproducible order.
///
/// Pure function of its inputs; unplayed matches simply don't count.
#[must_use]
pub fn pool_standings(pool: &Pool, matches: &[Match], results: &ResultStore) -> Vec<StandingsRow> {
    let mut rows: Vec<StandingsRow> = pool
        .teams
        .iter()
        .map(|team| StandingsRow {
            team: team.name.clone(),
            ..Default::default()
        })
        .collect();

    for m in matches {
        if m.phase != Phase::Pool || m.pool.as_deref() != Some(pool.name.as_str()) {
            continue;
        }

        let [Slot::Team(a), Slot::Team(b)] = &m.slots else {
            continue;
        };

        let Some(result) = results.get(&m.code) else {
            continue;
        };

        let mut a_sets = 0_i64;
        let mut b_sets = 0_i64;
        let mut a_points = 0_i64;
        let mut b_points = 0_i64;

        for set in &result.sets {
            if set.a > set.b {
                a_sets += 1;
            } else {
                b_sets += 1;
            }
            a_points += i64::from(set.a);
            b_points += i64::from(set.b);
        }

        for row in &mut rows {
            if row.team == *a {
                row.played += 1;
                row.set_diff += a_sets - b_sets;
                row.point_diff += a_points - b_points;
                if a_sets > b_sets {
                    row.wins += 1;
                }
            } else if row.team == *b {
                row.played += 1;
                row.set_diff += b_sets - a_sets;
                row.point_diff += b_points - a_points;
                if b_sets > a_sets {
                    row.wins += 1;
                }
            }
        }
    }

    rows.sort_by(|x, y| {
        y.wins
            .cmp(&x.wins)
            .then(y.set_diff.cmp(&x.set_diff))
            .then(y.point_diff.cmp(&x.point_diff))
            .then(x.team.cmp(&y.team))
    });

    rows
}
