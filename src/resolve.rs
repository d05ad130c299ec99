// This file is part of sideout.
//
// sideout is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// sideout is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Joins the stored skeleton, the schedule, and the result store into
//! a display-ready view.
//!
//! Lookup is a direct `results[match_code]` — nothing here rebuilds a
//! bracket or translates between naming schemes. Advancing a winner
//! into a downstream slot is a pure projection; the skeleton is never
//! touched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    bracket::{Bracket, BracketStructure},
    matches::{Match, MatchCode, Slot},
    schedule::{Booking, Schedule},
    score::ResultStore,
    seeding::SeedSource,
    standings::{StandingsRow, pool_standings},
};

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum MatchState {
    /// At least one side is still unknown.
    #[default]
    Pending,
    /// Both sides are concrete teams and no result has come in.
    Ready,
    /// A result exists, or the match was a bye and decided itself.
    Complete,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ResolvedMatch {
    pub code: MatchCode,
    /// Concrete team per side, where resolvable.
    pub sides: [Option<String>; 2],
    /// Display label per side: the team, or what the slot is waiting
    /// for ("Winner of W1-2", "Pool A #1").
    pub labels: [String; 2],
    pub state: MatchState,
    pub winner: Option<String>,
    pub booking: Option<Booking>,
    /// False only for a bracket reset that the grand final result has
    /// not (or not yet) made necessary.
    pub playable: bool,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ResolvedRound {
    pub name: String,
    pub matches: Vec<ResolvedMatch>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PoolView {
    pub name: String,
    pub standings: Vec<StandingsRow>,
    pub matches: Vec<ResolvedMatch>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ResolvedView {
    pub pools: Vec<PoolView>,
    pub gold: Vec<ResolvedRound>,
    pub silver: Vec<ResolvedRound>,
}

/// Projects the three stores into one view. Read-only and idempotent:
/// calling it twice with the same inputs gives the same answer, and
/// nothing it returns aliases the skeleton.
#[must_use]
pub fn resolve(
    structure: &BracketStructure,
    schedule: &Schedule,
    results: &ResultStore,
) -> ResolvedView {
    let resolver = Resolver::new(structure, results);

    let mut pools = Vec::new();
    let mut ordered: Vec<_> = structure.pools.iter().collect();
    ordered.sort_by(|a, b| a.name.cmp(&b.name));

    for pool in ordered {
        let matches = structure
            .pool_matches
            .iter()
            .filter(|m| m.pool.as_deref() == Some(pool.name.as_str()))
            .map(|m| resolver.resolved(m, &structure.seeds, schedule))
            .collect();

        pools.push(PoolView {
            name: pool.name.clone(),
            standings: pool_standings(pool, &structure.pool_matches, results),
            matches,
        });
    }

    ResolvedView {
        pools,
        gold: resolver.bracket_rounds(&structure.gold, &structure.seeds, schedule),
        silver: structure
            .silver
            .as_ref()
            .map(|bracket| resolver.bracket_rounds(bracket, &structure.silver_seeds, schedule))
            .unwrap_or_default(),
    }
}

struct Resolver<'a> {
    structure: &'a BracketStructure,
    results: &'a ResultStore,
    /// Standings per pool, only for pools whose matches all have
    /// results; an unfinished pool cannot hand out its places yet.
    final_standings: BTreeMap<String, Vec<StandingsRow>>,
}

impl<'a> Resolver<'a> {
    fn new(structure: &'a BracketStructure, results: &'a ResultStore) -> Self {
        let mut final_standings = BTreeMap::new();

        for pool in &structure.pools {
            let complete = structure
                .pool_matches
                .iter()
                .filter(|m| m.pool.as_deref() == Some(pool.name.as_str()))
                .all(|m| results.get(&m.code).is_some());

            if complete {
                final_standings.insert(
                    pool.name.clone(),
                    pool_standings(pool, &structure.pool_matches, results),
                );
            }
        }

        Self {
            structure,
            results,
            final_standings,
        }
    }

    fn bracket_rounds(
        &self,
        bracket: &Bracket,
        seeds: &[SeedSource],
        schedule: &Schedule,
    ) -> Vec<ResolvedRound> {
        let mut rounds = Vec::new();

        for round in bracket.winners.iter().chain(bracket.losers.iter()) {
            rounds.push(ResolvedRound {
                name: round.name.clone(),
                matches: round
                    .matches
                    .iter()
                    .map(|m| self.resolved(m, seeds, schedule))
                    .collect(),
            });
        }

        if let Some(grand_final) = &bracket.grand_final {
            rounds.push(ResolvedRound {
                name: "Grand Final".to_string(),
                matches: vec![self.resolved(grand_final, seeds, schedule)],
            });
        }

        if let Some(reset) = &bracket.bracket_reset {
            let mut resolved = self.resolved(reset, seeds, schedule);
            resolved.playable = self.reset_required(bracket);

            rounds.push(ResolvedRound {
                name: "Bracket Reset".to_string(),
                matches: vec![resolved],
            });
        }

        rounds
    }

    /// The reset is real exactly when the losers-bracket champion won
    /// the grand final, leaving both finalists on one loss.
    fn reset_required(&self, bracket: &Bracket) -> bool {
        let Some(grand_final) = &bracket.grand_final else {
            return false;
        };

        let Some(result) = self.results.get(&grand_final.code) else {
            return false;
        };

        result.winner.index() == 1
    }

    fn resolved(&self, m: &Match, seeds: &[SeedSource], schedule: &Schedule) -> ResolvedMatch {
        let sides = [
            self.occupant(&m.slots[0], seeds),
            self.occupant(&m.slots[1], seeds),
        ];

        let labels = [
            self.label(&m.slots[0], &sides[0], seeds),
            self.label(&m.slots[1], &sides[1], seeds),
        ];

        let (state, winner) = if m.is_bye() {
            (MatchState::Complete, self.winner_of(&m.code, seeds))
        } else if self.results.get(&m.code).is_some() {
            (MatchState::Complete, self.winner_of(&m.code, seeds))
        } else if sides.iter().all(Option::is_some) {
            (MatchState::Ready, None)
        } else {
            (MatchState::Pending, None)
        };

        ResolvedMatch {
            code: m.code.clone(),
            sides,
            labels,
            state,
            winner,
            booking: schedule.booking(&m.code).cloned(),
            playable: true,
        }
    }

    fn label(&self, slot: &Slot, side: &Option<String>, seeds: &[SeedSource]) -> String {
        if let Some(name) = side {
            return name.clone();
        }

        match slot {
            Slot::Seed(seed) => seeds
                .get(seed - 1)
                .map_or_else(|| format!("Seed {seed}"), ToString::to_string),
            other => other.to_string(),
        }
    }

    fn occupant(&self, slot: &Slot, seeds: &[SeedSource]) -> Option<String> {
        match slot {
            Slot::Team(name) => Some(name.clone()),
            Slot::Seed(seed) => self.seed_team(seeds.get(seed - 1)?),
            Slot::WinnerOf(code) => self.winner_of(code, seeds),
            Slot::LoserOf(code) => self.loser_of(code, seeds),
            Slot::Bye => None,
        }
    }

    fn seed_team(&self, source: &SeedSource) -> Option<String> {
        match source {
            SeedSource::Known(name) => Some(name.clone()),
            SeedSource::Placeholder { pool, place } => self
                .final_standings
                .get(pool)
                .and_then(|rows| rows.get(place - 1))
                .map(|row| row.team.clone()),
        }
    }

    fn winner_of(&self, code: &MatchCode, seeds: &[SeedSource]) -> Option<String> {
        let m = self.structure.find(code)?;

        if m.is_bye() {
            return self.occupant(m.bye_occupant()?, seeds);
        }

        let result = self.results.get(code)?;
        self.occupant(&m.slots[result.winner.index()], seeds)
    }

    fn loser_of(&self, code: &MatchCode, seeds: &[SeedSource]) -> Option<String> {
        let m = self.structure.find(code)?;

        if m.is_bye() {
            return None;
        }

        let result = self.results.get(code)?;
        self.occupant(&m.slots[1 - result.winner.index()], seeds)
    }
}
