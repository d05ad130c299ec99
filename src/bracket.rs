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

//! Builds the complete bracket skeleton and mints every match code.
//!
//! This is the only place a [`MatchCode`] comes into existence. The
//! schedule, the live display, and the result store all read one
//! generated [`BracketStructure`] instead of re-deriving their own,
//! so there is never a second opinion on which match sits at position
//! one of round two.

use std::collections::BTreeMap;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::{
    matches::{Match, MatchCode, Slot},
    phase::Phase,
    pool::Pool,
    seeding::{self, SeedSource},
    settings::{Elimination, InvalidSettings, Settings},
    standings::StandingsRow,
};

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Round {
    pub name: String,
    pub matches: Vec<Match>,
}

/// One elimination bracket: winners rounds, losers rounds (double
/// elimination only), and the finals pair.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Bracket {
    pub winners: Vec<Round>,
    pub losers: Vec<Round>,
    pub grand_final: Option<Match>,
    /// Always generated for double elimination; whether it must be
    /// played is decided against the grand final result at resolution
    /// time, never by leaving it out of the structure.
    pub bracket_reset: Option<Match>,
}

impl Bracket {
    /// Matches in canonical order: winners rounds, losers rounds, grand
    /// final, bracket reset.
    pub fn all_matches(&self) -> impl Iterator<Item = &Match> {
        self.winners
            .iter()
            .chain(self.losers.iter())
            .flat_map(|round| round.matches.iter())
            .chain(self.grand_final.iter())
            .chain(self.bracket_reset.iter())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.winners.is_empty()
    }
}

/// The generated skeleton for a whole tournament: pool matches, the
/// gold bracket over the advancing teams, and optionally a silver
/// bracket over everyone else.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct BracketStructure {
    pub pools: Vec<Pool>,
    pub pool_matches: Vec<Match>,
    /// Seed number `n` in a gold-bracket slot means `seeds[n - 1]`.
    pub seeds: Vec<SeedSource>,
    pub gold: Bracket,
    pub silver_seeds: Vec<SeedSource>,
    pub silver: Option<Bracket>,
}

impl BracketStructure {
    /// Every match in canonical order: pools, gold, silver.
    pub fn all_matches(&self) -> impl Iterator<Item = &Match> {
        self.pool_matches
            .iter()
            .chain(self.gold.all_matches())
            .chain(self.silver.iter().flat_map(Bracket::all_matches))
    }

    #[must_use]
    pub fn find(&self, code: &MatchCode) -> Option<&Match> {
        self.all_matches().find(|m| m.code == *code)
    }

    /// The matches that need court time: byes resolve themselves.
    #[must_use]
    pub fn schedulable_matches(&self) -> Vec<Match> {
        self.all_matches()
            .filter(|m| m.is_schedulable())
            .cloned()
            .collect()
    }

    /// Every slot reference must name a match in this structure, and no
    /// code may be minted twice.
    ///
    /// # Errors
    ///
    /// If a reference dangles or a code repeats; either means a
    /// generator bug, not bad user input.
    pub fn check_references(&self) -> anyhow::Result<()> {
        let mut codes = FxHashSet::default();

        for m in self.all_matches() {
            if !codes.insert(&m.code) {
                return Err(anyhow::Error::msg(format!(
                    "match code {} minted twice",
                    m.code
                )));
            }
        }

        for m in self.all_matches() {
            let references = m
                .slots
                .iter()
                .filter_map(Slot::reference)
                .chain(m.losers_feed_to.iter());

            for code in references {
                if !codes.contains(code) {
                    return Err(anyhow::Error::msg(format!(
                        "match {} references {code}, which does not exist",
                        m.code
                    )));
                }
            }
        }

        Ok(())
    }
}

/// The display name of an elimination round with `teams_remaining`
/// entrants still alive. A lookup, so the round before the final is a
/// semifinal no matter how deep the bracket goes.
#[must_use]
pub fn round_label(teams_remaining: usize) -> String {
    match teams_remaining {
        2 => "Final".to_string(),
        4 => "Semifinal".to_string(),
        8 => "Quarterfinal".to_string(),
        _ => format!("Round of {teams_remaining}"),
    }
}

/// Builds the full skeleton from pools and settings.
///
/// Deterministic: identical pools, standings, and settings always
/// produce an identical structure, codes included. Pass `standings`
/// once pools have finished to seed with concrete names; without them
/// the seeds stay placeholders the resolution layer fills in later.
///
/// # Errors
///
/// If the settings are malformed or a pool name repeats.
///
/// # Panics
///
/// If the generated structure fails its own reference check, which
/// would be a generator bug.
pub fn generate(
    pools: &[Pool],
    standings: Option<&BTreeMap<String, Vec<StandingsRow>>>,
    settings: &Settings,
) -> Result<BracketStructure, InvalidSettings> {
    settings.validate()?;

    for (i, pool) in pools.iter().enumerate() {
        if pools[..i].iter().any(|other| other.name == pool.name) {
            return Err(InvalidSettings::DuplicatePool {
                pool: pool.name.clone(),
            });
        }
    }

    let seeds = seeding::advancing_seeds(pools, standings);
    let gold = build_bracket(seeds.len(), settings.elimination);

    let (silver_seeds, silver) = if settings.silver_bracket {
        let silver_seeds = seeding::remaining_seeds(pools, standings);
        let silver = into_silver(build_bracket(silver_seeds.len(), settings.elimination));
        (silver_seeds, Some(silver))
    } else {
        (Vec::new(), None)
    };

    let structure = BracketStructure {
        pools: pools.to_vec(),
        pool_matches: generate_pool_matches(pools),
        seeds,
        gold,
        silver_seeds,
        silver,
    };

    if let Err(error) = structure.check_references() {
        unreachable!("bracket generator invariant broken: {error}");
    }

    Ok(structure)
}

/// Mints the pool-play matches, pools ordered by name.
#[must_use]
pub fn generate_pool_matches(pools: &[Pool]) -> Vec<Match> {
    let mut ordered: Vec<&Pool> = pools.iter().collect();
    ordered.sort_by(|a, b| a.name.cmp(&b.name));

    let mut out = Vec::new();

    for pool in ordered {
        let mut number = 0;

        for (round_index, round) in pool.rounds().iter().enumerate() {
            for [a, b] in round {
                number += 1;
                out.push(Match {
                    code: MatchCode::pool(&pool.name, number),
                    phase: Phase::Pool,
                    round: round_index + 1,
                    slots: [
                        Slot::Team(pool.teams[*a].name.clone()),
                        Slot::Team(pool.teams[*b].name.clone()),
                    ],
                    pool: Some(pool.name.clone()),
                    losers_feed_to: None,
                });
            }
        }
    }

    out
}

fn seed_slot(seed: usize, seed_count: usize) -> Slot {
    if seed <= seed_count {
        Slot::Seed(seed)
    } else {
        Slot::Bye
    }
}

fn build_bracket(seed_count: usize, elimination: Elimination) -> Bracket {
    if seed_count < 2 {
        // Zero or one advancing teams is a signal, not an error: there
        // is nothing to play.
        return Bracket::default();
    }

    let size = seed_count.next_power_of_two();
    let double = elimination == Elimination::Double;

    let mut winners = winners_rounds(seed_count, size, double);
    let winners_count = winners.len();

    let mut bracket = if double {
        let losers = if winners_count >= 2 {
            losers_rounds(size, winners_count)
        } else {
            Vec::new()
        };

        assign_losers_feeds(&mut winners, winners_count);

        let losers_champion = if winners_count >= 2 {
            Slot::WinnerOf(MatchCode::losers(2 * (winners_count - 1), 1))
        } else {
            // Two-team double elimination: the first loser goes
            // straight to the grand final.
            Slot::LoserOf(MatchCode::winners(1, 1))
        };

        let grand_final = Match {
            code: MatchCode::grand_final(),
            phase: Phase::GrandFinal,
            round: 1,
            slots: [
                Slot::WinnerOf(MatchCode::winners(winners_count, 1)),
                losers_champion,
            ],
            pool: None,
            losers_feed_to: None,
        };

        let bracket_reset = Match {
            code: MatchCode::bracket_reset(),
            phase: Phase::BracketReset,
            round: 1,
            slots: [
                Slot::WinnerOf(MatchCode::grand_final()),
                Slot::LoserOf(MatchCode::grand_final()),
            ],
            pool: None,
            losers_feed_to: None,
        };

        Bracket {
            winners,
            losers,
            grand_final: Some(grand_final),
            bracket_reset: Some(bracket_reset),
        }
    } else {
        Bracket {
            winners,
            losers: Vec::new(),
            grand_final: None,
            bracket_reset: None,
        }
    };

    propagate_byes(&mut bracket);

    bracket
}

fn winners_rounds(seed_count: usize, size: usize, double: bool) -> Vec<Round> {
    let rounds_count = size.ilog2() as usize;
    let order = seeding::bracket_order(size);
    let mut rounds = Vec::with_capacity(rounds_count);

    for r in 1..=rounds_count {
        let match_count = size >> r;
        let remaining = size >> (r - 1);

        let label = round_label(remaining);
        let name = if double {
            format!("Winners {label}")
        } else {
            label
        };

        let mut matches = Vec::with_capacity(match_count);
        for p in 1..=match_count {
            let slots = if r == 1 {
                [
                    seed_slot(order[2 * p - 2], seed_count),
                    seed_slot(order[2 * p - 1], seed_count),
                ]
            } else {
                [
                    Slot::WinnerOf(MatchCode::winners(r - 1, 2 * p - 1)),
                    Slot::WinnerOf(MatchCode::winners(r - 1, 2 * p)),
                ]
            };

            matches.push(Match {
                code: MatchCode::winners(r, p),
                phase: Phase::Winners,
                round: r,
                slots,
                pool: None,
                losers_feed_to: None,
            });
        }

        rounds.push(Round { name, matches });
    }

    rounds
}

/// Losers rounds alternate: round 1 pairs the first winners-round
/// dropouts, even (major) rounds inject the next winners-round dropout
/// against a survivor, odd (minor) rounds pair survivors. Major rounds
/// cross the survivor order on alternating depths to push rematches
/// back.
fn losers_rounds(size: usize, winners_count: usize) -> Vec<Round> {
    let total = 2 * (winners_count - 1);
    let mut rounds = Vec::with_capacity(total);

    for index in 1..=total {
        let matches: Vec<Match> = if index == 1 {
            let count = size >> 2;
            (1..=count)
                .map(|p| {
                    losers_match(
                        index,
                        p,
                        [
                            Slot::LoserOf(MatchCode::winners(1, 2 * p - 1)),
                            Slot::LoserOf(MatchCode::winners(1, 2 * p)),
                        ],
                    )
                })
                .collect()
        } else if index % 2 == 0 {
            let j = index / 2;
            let count = size >> (j + 1);
            (1..=count)
                .map(|p| {
                    let q = if j % 2 == 1 { count + 1 - p } else { p };
                    losers_match(
                        index,
                        p,
                        [
                            Slot::LoserOf(MatchCode::winners(j + 1, p)),
                            Slot::WinnerOf(MatchCode::losers(index - 1, q)),
                        ],
                    )
                })
                .collect()
        } else {
            let j = (index - 1) / 2;
            let count = size >> (j + 2);
            (1..=count)
                .map(|p| {
                    losers_match(
                        index,
                        p,
                        [
                            Slot::WinnerOf(MatchCode::losers(index - 1, 2 * p - 1)),
                            Slot::WinnerOf(MatchCode::losers(index - 1, 2 * p)),
                        ],
                    )
                })
                .collect()
        };

        rounds.push(Round {
            name: format!("Losers Round {index}"),
            matches,
        });
    }

    rounds
}

fn losers_match(round: usize, position: usize, slots: [Slot; 2]) -> Match {
    Match {
        code: MatchCode::losers(round, position),
        phase: Phase::Losers,
        round,
        slots,
        pool: None,
        losers_feed_to: None,
    }
}

/// Records on every winners match which losers match its loser drops
/// into.
fn assign_losers_feeds(winners: &mut [Round], winners_count: usize) {
    for (round_index, round) in winners.iter_mut().enumerate() {
        let r = round_index + 1;

        for (match_index, m) in round.matches.iter_mut().enumerate() {
            let p = match_index + 1;

            m.losers_feed_to = Some(if winners_count == 1 {
                MatchCode::grand_final()
            } else if r == 1 {
                MatchCode::losers(1, p.div_ceil(2))
            } else {
                MatchCode::losers(2 * (r - 1), p)
            });
        }
    }
}

/// Collapses slots whose feeder can never produce an occupant: the
/// loser of a bye does not exist, and nobody comes out of a void match.
/// Rounds are generated in dependency order, so one forward pass
/// settles everything.
fn propagate_byes(bracket: &mut Bracket) {
    let mut status: FxHashMap<MatchCode, (bool, bool)> = FxHashMap::default();

    let mut mark = |m: &mut Match| {
        for slot in &mut m.slots {
            let collapse = match slot {
                Slot::WinnerOf(code) => status.get(code).is_some_and(|(_, void)| *void),
                Slot::LoserOf(code) => status.get(code).is_some_and(|(bye, _)| *bye),
                Slot::Team(_) | Slot::Seed(_) | Slot::Bye => false,
            };

            if collapse {
                *slot = Slot::Bye;
            }
        }

        status.insert(m.code.clone(), (m.is_bye(), m.is_void()));
    };

    for round in &mut bracket.winners {
        round.matches.iter_mut().for_each(&mut mark);
    }
    for round in &mut bracket.losers {
        round.matches.iter_mut().for_each(&mut mark);
    }
    if let Some(m) = bracket.grand_final.as_mut() {
        mark(m);
    }
    if let Some(m) = bracket.bracket_reset.as_mut() {
        mark(m);
    }
}

/// Rewrites a bracket into the silver namespace: disjoint codes,
/// prefixed round names.
fn into_silver(bracket: Bracket) -> Bracket {
    let map_slot = |slot: Slot| match slot {
        Slot::WinnerOf(code) => Slot::WinnerOf(code.silver()),
        Slot::LoserOf(code) => Slot::LoserOf(code.silver()),
        other => other,
    };

    let map_match = |m: Match| Match {
        code: m.code.silver(),
        phase: m.phase,
        round: m.round,
        slots: m.slots.map(map_slot),
        pool: m.pool,
        losers_feed_to: m.losers_feed_to.map(|code| code.silver()),
    };

    let map_round = |round: Round| Round {
        name: format!("Silver {}", round.name),
        matches: round.matches.into_iter().map(map_match).collect(),
    };

    Bracket {
        winners: bracket.winners.into_iter().map(map_round).collect(),
        losers: bracket.losers.into_iter().map(map_round).collect(),
        grand_final: bracket.grand_final.map(map_match),
        bracket_reset: bracket.bracket_reset.map(map_match),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::team::Team;

    fn pool_of(name: &str, count: usize, advance: usize) -> Pool {
        let teams = (1..=count)
            .map(|i| Team::new(&format!("{name}{i}")))
            .collect();
        Pool::new(name, teams, advance).unwrap()
    }

    fn single(pools: &[Pool]) -> BracketStructure {
        generate(pools, None, &Settings::default()).unwrap()
    }

    fn double(pools: &[Pool]) -> BracketStructure {
        let settings = Settings {
            elimination: Elimination::Double,
            ..Default::default()
        };
        generate(pools, None, &settings).unwrap()
    }

    #[test]
    fn four_advancing_single_elimination() {
        let pools = [pool_of("A", 4, 2), pool_of("B", 4, 2)];
        let structure = single(&pools);

        assert_eq!(structure.pool_matches.len(), 12);
        assert_eq!(structure.gold.winners.len(), 2);
        assert_eq!(structure.gold.winners[0].name, "Semifinal");
        assert_eq!(structure.gold.winners[1].name, "Final");
        assert!(structure.gold.losers.is_empty());
        assert!(structure.gold.grand_final.is_none());

        let bracket_matches: Vec<&Match> = structure.gold.all_matches().collect();
        assert_eq!(bracket_matches.len(), 3);
    }

    #[test]
    fn byes_go_to_top_seeds() {
        // Five advancing teams: bracket of eight, byes for seeds 1-3.
        let pools = [pool_of("A", 5, 5)];
        let structure = single(&pools);

        let round_one = &structure.gold.winners[0];
        assert_eq!(round_one.matches.len(), 4);

        let byes: Vec<&Match> = round_one.matches.iter().filter(|m| m.is_bye()).collect();
        assert_eq!(byes.len(), 3);

        for m in byes {
            let Some(Slot::Seed(seed)) = m.bye_occupant() else {
                panic!("a first-round bye holds a seed");
            };
            assert!(*seed <= 3, "seed {seed} should not get a bye");
        }

        // The byes never reach the schedule.
        let schedulable = structure.schedulable_matches();
        assert!(schedulable.iter().all(|m| !m.is_bye()));
    }

    #[test]
    fn double_elimination_eight() {
        let pools = [pool_of("A", 8, 8)];
        let structure = double(&pools);
        let bracket = &structure.gold;

        assert_eq!(bracket.winners.len(), 3);
        assert_eq!(bracket.losers.len(), 4);

        let counts: Vec<usize> = bracket
            .losers
            .iter()
            .map(|round| round.matches.len())
            .collect();
        assert_eq!(counts, [2, 2, 1, 1]);

        // Every winners match knows where its loser drops.
        for round in &bracket.winners {
            for m in &round.matches {
                let feed = m.losers_feed_to.as_ref().unwrap();
                assert!(structure.find(feed).is_some());
            }
        }

        let grand_final = bracket.grand_final.as_ref().unwrap();
        assert_eq!(
            grand_final.slots[0],
            Slot::WinnerOf(MatchCode::winners(3, 1))
        );
        assert_eq!(grand_final.slots[1], Slot::WinnerOf(MatchCode::losers(4, 1)));

        let reset = bracket.bracket_reset.as_ref().unwrap();
        assert_eq!(reset.slots[0], Slot::WinnerOf(MatchCode::grand_final()));
        assert_eq!(reset.slots[1], Slot::LoserOf(MatchCode::grand_final()));
    }

    #[test]
    fn double_elimination_two() {
        let pools = [pool_of("A", 2, 2)];
        let structure = double(&pools);
        let bracket = &structure.gold;

        assert_eq!(bracket.winners.len(), 1);
        assert!(bracket.losers.is_empty());

        let grand_final = bracket.grand_final.as_ref().unwrap();
        assert_eq!(grand_final.slots[1], Slot::LoserOf(MatchCode::winners(1, 1)));
        assert!(bracket.bracket_reset.is_some());
    }

    #[test]
    fn no_dangling_references() {
        for count in [2_usize, 3, 4, 5, 6, 7, 8, 11, 16, 23, 32, 64] {
            let pools = [pool_of("A", count, count)];

            for structure in [single(&pools), double(&pools)] {
                structure.check_references().unwrap();
            }
        }
    }

    #[test]
    fn deterministic() {
        let pools = [pool_of("A", 5, 3), pool_of("B", 4, 2)];
        let settings = Settings {
            elimination: Elimination::Double,
            silver_bracket: true,
            ..Default::default()
        };

        let first = generate(&pools, None, &settings).unwrap();
        let second = generate(&pools, None, &settings).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn silver_bracket_namespace_is_disjoint() {
        let pools = [pool_of("A", 6, 2), pool_of("B", 6, 2)];
        let settings = Settings {
            silver_bracket: true,
            ..Default::default()
        };
        let structure = generate(&pools, None, &settings).unwrap();

        // Four advance, eight do not.
        assert_eq!(structure.seeds.len(), 4);
        assert_eq!(structure.silver_seeds.len(), 8);

        let silver = structure.silver.as_ref().unwrap();
        assert!(!silver.is_empty());

        for m in silver.all_matches() {
            assert!(m.code.as_str().starts_with("S-"));
        }

        structure.check_references().unwrap();
    }

    #[test]
    fn empty_bracket_is_a_signal() {
        let pools = [pool_of("A", 4, 0)];
        let structure = single(&pools);

        assert!(structure.gold.is_empty());
        assert!(structure.seeds.is_empty());
        assert_eq!(structure.pool_matches.len(), 6);
    }

    #[test]
    fn duplicate_pool_rejected() {
        let pools = [pool_of("A", 4, 2), pool_of("A", 4, 2)];
        assert!(generate(&pools, None, &Settings::default()).is_err());
    }
}
