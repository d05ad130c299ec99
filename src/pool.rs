use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{settings::InvalidSettings, team::Team};

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Pool {
    pub name: String,
    pub teams: Vec<Team>,
    pub advance_count: usize,
}

impl Pool {
    /// # Errors
    ///
    /// If more teams advance than the pool holds, or a team name repeats.
    pub fn new(name: &str, teams: Vec<Team>, advance_count: usize) -> Result<Self, InvalidSettings> {
        if advance_count > teams.len() {
            return Err(InvalidSettings::AdvanceCount {
                pool: name.to_string(),
                advance: advance_count,
                teams: teams.len(),
            });
        }

        for (i, team) in teams.iter().enumerate() {
            if teams[..i].iter().any(|other| other.name == team.name) {
                return Err(InvalidSettings::DuplicateTeam {
                    pool: name.to_string(),
                    team: team.name.clone(),
                });
            }
        }

        Ok(Self {
            name: name.to_string(),
            teams,
            advance_count,
        })
    }

    /// Round-robin rounds by the circle method, so that every team rests
    /// between its matches.
    #[must_use]
    pub fn rounds(&self) -> Vec<Vec<[usize; 2]>> {
        let count = self.teams.len();
        if count < 2 {
            return Vec::new();
        }

        let mut circle: Vec<Option<usize>> = (0..count).map(Some).collect();
        if count % 2 == 1 {
            circle.push(None);
        }

        let size = circle.len();
        let mut rounds = Vec::new();

        for _ in 0..size - 1 {
            let mut round = Vec::new();

            for i in 0..size / 2 {
                if let (Some(a), Some(b)) = (circle[i], circle[size - 1 - i]) {
                    round.push([a, b]);
                }
            }

            rounds.push(round);
            circle[1..].rotate_right(1);
        }

        rounds
    }

    /// The rounds flattened into play order.
    #[must_use]
    pub fn pairings(&self) -> Vec<[usize; 2]> {
        self.rounds().into_iter().flatten().collect()
    }
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.teams.iter().map(|team| team.name.as_str()).collect();

        write!(
            f,
            "{}: {} (top {} advance)",
            self.name,
            names.join(", "),
            self.advance_count
        )
    }
}
