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

//! Assigns matches to courts and time slots.
//!
//! The decision variables are (court, day, start) per match on a
//! five-minute grid. Hard constraints: court window containment, the
//! day-end cutoff, no overlap per court, no overlap and a minimum
//! break per team, per-team play windows, feeder matches finishing
//! before their dependents start, the pool-to-bracket delay, and
//! optionally keeping a pool on one court. The objective is the
//! latest end time, driven down by greedy earliest-finish placement
//! under randomized restarts run in parallel; the best feasible
//! assignment found inside the wall-clock budget wins.
//!
//! Infeasibility is an answer, not an error: whatever could not be
//! placed comes back in the unplaced list.

use std::time::{Duration, Instant};

use log::debug;
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use rustc_hash::FxHashMap;

use crate::{
    clock::ClockTime,
    court::Court,
    matches::{Match, MatchCode, Slot},
    phase::Phase,
    schedule::{Booking, Schedule},
    settings::{InvalidSettings, Settings},
    team::Team,
};

/// Start times snap to this many minutes.
pub const GRID_MINUTES: u32 = 5;

const RESTARTS: u64 = 32;

/// Solves the allocation problem for a flat list of matches.
///
/// Bye matches are skipped (nothing to play); everything else is
/// either booked in the returned [`Schedule`] or handed back in the
/// unplaced list. Callable with pool matches, bracket matches, or
/// both at once — bracket matches may still hold placeholder slots.
///
/// # Errors
///
/// If the settings or courts are malformed. Infeasible inputs are not
/// an error.
pub fn schedule(
    matches: &[Match],
    courts: &[Court],
    teams: &[Team],
    settings: &Settings,
) -> Result<(Schedule, Vec<Match>), InvalidSettings> {
    settings.validate()?;

    for (i, court) in courts.iter().enumerate() {
        if court.closes_at <= court.opens_at {
            return Err(InvalidSettings::CourtWindow {
                court: court.name.clone(),
            });
        }

        if courts[..i].iter().any(|other| other.name == court.name) {
            return Err(InvalidSettings::DuplicateCourt {
                court: court.name.clone(),
            });
        }
    }

    let problem = Problem::new(matches, courts, teams, settings);
    let deadline = Instant::now() + Duration::from_millis(settings.solver_millis);

    // The first attempt always runs so a tight budget still yields an
    // answer; the rest race the deadline in parallel.
    let first = problem.attempt(0);

    let rest: Vec<(u64, Attempt)> = (1..RESTARTS)
        .into_par_iter()
        .filter_map(|seed| {
            if Instant::now() >= deadline {
                return None;
            }

            Some((seed, problem.attempt(seed)))
        })
        .collect();

    let mut best = (0, first);
    for (seed, attempt) in rest {
        let better = (attempt.unplaced.len(), attempt.makespan, seed)
            < (best.1.unplaced.len(), best.1.makespan, best.0);
        if better {
            best = (seed, attempt);
        }
    }

    let (seed, attempt) = best;
    debug!(
        "solver: seed {seed} placed {} of {} matches",
        attempt.schedule.bookings.len(),
        attempt.schedule.bookings.len() + attempt.unplaced.len()
    );

    Ok((attempt.schedule, attempt.unplaced))
}

struct Attempt {
    schedule: Schedule,
    unplaced: Vec<Match>,
    makespan: (u32, u32),
}

struct Problem<'a> {
    matches: Vec<&'a Match>,
    courts: &'a [Court],
    teams: &'a [Team],
    settings: &'a Settings,
}

impl<'a> Problem<'a> {
    fn new(
        matches: &'a [Match],
        courts: &'a [Court],
        teams: &'a [Team],
        settings: &'a Settings,
    ) -> Self {
        let mut schedulable: Vec<&Match> = matches.iter().filter(|m| m.is_schedulable()).collect();
        schedulable.sort_by_key(|m| Self::depth(m));

        Self {
            matches: schedulable,
            courts,
            teams,
            settings,
        }
    }

    /// A topological rank: every match sorts after the matches its
    /// slots reference.
    fn depth(m: &Match) -> usize {
        match m.phase {
            Phase::Pool => m.round,
            Phase::Winners => 100 + 2 * m.round - 1,
            Phase::Losers => 100 + m.round + 2,
            Phase::GrandFinal => 1_000,
            Phase::BracketReset => 1_001,
        }
    }

    fn attempt(&self, seed: u64) -> Attempt {
        let mut rng = StdRng::seed_from_u64(seed);

        let mut order = self.matches.clone();
        if seed > 0 {
            order.shuffle(&mut rng);
            // The sort is stable, so the shuffle only reorders matches
            // of equal depth.
            order.sort_by_key(|m| Self::depth(m));
        }

        let mut state = State::default();

        for m in &order {
            match self.place(m, &state) {
                Some((court_index, booking)) => state.book(m, court_index, booking, self.settings),
                None => state.unplaced.push((*m).clone()),
            }
        }

        let makespan = state
            .schedule
            .makespan()
            .map_or((0, 0), |(day, end)| (day, end.minutes));

        Attempt {
            schedule: state.schedule,
            unplaced: state.unplaced,
            makespan,
        }
    }

    /// The earliest feasible booking for one match, or `None` when
    /// every slot on every court and day is blocked.
    fn place(&self, m: &Match, state: &State) -> Option<(usize, Booking)> {
        let duration = self.settings.match_minutes;
        let break_minutes = self.settings.break_minutes;

        // Feeder matches must be finished, with a break, before this
        // one starts. A feeder that failed to place drags its
        // dependents into the unplaced list rather than guessing.
        let mut earliest: (u32, u32) = (0, 0);
        for code in m.slots.iter().filter_map(Slot::reference) {
            if let Some(&(day, end)) = state.match_end.get(code) {
                earliest = earliest.max((day, end + break_minutes));
            } else if self.is_schedulable_code(code) {
                return None;
            }
        }

        if m.phase.is_bracket() {
            if let Some((day, end)) = state.latest_pool_end {
                earliest = earliest.max((day, end + self.settings.bracket_delay_minutes));
            }
        }

        let (window_after, window_before) = self.team_window(m);

        let court_indices: Vec<usize> = match m
            .pool
            .as_ref()
            .filter(|_| self.settings.pool_on_one_court)
            .and_then(|pool| state.pool_court.get(pool))
        {
            Some(&index) => vec![index],
            None => (0..self.courts.len()).collect(),
        };

        for day in 0..self.settings.days {
            let day_floor = if day == earliest.0 {
                earliest.1
            } else if day > earliest.0 {
                0
            } else {
                continue;
            };

            let floor = day_floor.max(window_after.unwrap_or(0));

            let open_from = |index: usize| self.courts[index].opens_at.minutes.max(floor);
            let close_by = |index: usize| {
                let mut close = self.courts[index].closes_at.minutes;
                if let Some(day_end) = self.settings.day_end {
                    close = close.min(day_end.minutes);
                }
                if let Some(before) = window_before {
                    close = close.min(before);
                }
                close
            };

            let Some(first) = court_indices.iter().map(|&index| open_from(index)).min() else {
                continue;
            };
            let Some(last) = court_indices.iter().map(|&index| close_by(index)).max() else {
                continue;
            };

            // Sweep the grid before the courts so a later court still
            // gets the earlier slot.
            let mut start = first.next_multiple_of(GRID_MINUTES);
            while start + duration <= last {
                let end = start + duration;

                for &index in &court_indices {
                    if start < open_from(index) || end > close_by(index) {
                        continue;
                    }

                    if state.court_is_free(index, day, start, end)
                        && self.teams_are_free(m, state, day, start, end)
                    {
                        return Some((
                            index,
                            Booking {
                                court: self.courts[index].name.clone(),
                                day,
                                start: ClockTime { minutes: start },
                                end: ClockTime { minutes: end },
                            },
                        ));
                    }
                }

                start += GRID_MINUTES;
            }
        }

        None
    }

    fn is_schedulable_code(&self, code: &MatchCode) -> bool {
        self.matches.iter().any(|m| m.code == *code)
    }

    /// The intersection of the play windows of the concrete teams in
    /// this match.
    fn team_window(&self, m: &Match) -> (Option<u32>, Option<u32>) {
        let mut after = None;
        let mut before = None;

        for slot in &m.slots {
            let Slot::Team(name) = slot else {
                continue;
            };

            let window = self
                .teams
                .iter()
                .find(|team| team.name == *name)
                .and_then(|team| team.window);

            let Some(window) = window else {
                continue;
            };

            if let Some(play_after) = window.play_after {
                after = Some(after.map_or(play_after.minutes, |a: u32| a.max(play_after.minutes)));
            }
            if let Some(play_before) = window.play_before {
                before =
                    Some(before.map_or(play_before.minutes, |b: u32| b.min(play_before.minutes)));
            }
        }

        (after, before)
    }

    fn teams_are_free(&self, m: &Match, state: &State, day: u32, start: u32, end: u32) -> bool {
        let break_minutes = self.settings.break_minutes;

        for slot in &m.slots {
            let Slot::Team(name) = slot else {
                continue;
            };

            let Some(busy) = state.team_busy.get(name.as_str()) else {
                continue;
            };

            for &(busy_day, busy_start, busy_end) in busy {
                if busy_day != day {
                    continue;
                }

                // Too close counts as a conflict: consecutive matches
                // need the full break between them.
                if start < busy_end + break_minutes && busy_start < end + break_minutes {
                    return false;
                }
            }
        }

        true
    }
}

#[derive(Default)]
struct State {
    schedule: Schedule,
    unplaced: Vec<Match>,
    /// (court index, day) -> busy intervals in minutes.
    court_busy: FxHashMap<(usize, u32), Vec<(u32, u32)>>,
    /// team name -> (day, start, end) in minutes.
    team_busy: FxHashMap<String, Vec<(u32, u32, u32)>>,
    /// match code -> (day, end) for feeder precedence.
    match_end: FxHashMap<MatchCode, (u32, u32)>,
    /// pool name -> court index, once the first pool match lands.
    pool_court: FxHashMap<String, usize>,
    latest_pool_end: Option<(u32, u32)>,
}

impl State {
    fn court_is_free(&self, court: usize, day: u32, start: u32, end: u32) -> bool {
        let Some(busy) = self.court_busy.get(&(court, day)) else {
            return true;
        };

        busy.iter()
            .all(|&(busy_start, busy_end)| end <= busy_start || start >= busy_end)
    }

    fn book(&mut self, m: &Match, court_index: usize, booking: Booking, settings: &Settings) {
        let day = booking.day;
        let start = booking.start.minutes;
        let end = booking.end.minutes;

        self.court_busy
            .entry((court_index, day))
            .or_default()
            .push((start, end));

        for slot in &m.slots {
            if let Slot::Team(name) = slot {
                self.team_busy
                    .entry(name.clone())
                    .or_default()
                    .push((day, start, end));
            }
        }

        self.match_end.insert(m.code.clone(), (day, end));

        if m.phase == Phase::Pool {
            self.latest_pool_end = self.latest_pool_end.max(Some((day, end)));

            if settings.pool_on_one_court {
                if let Some(pool) = &m.pool {
                    self.pool_court.entry(pool.clone()).or_insert(court_index);
                }
            }
        }

        self.schedule.bookings.insert(m.code.clone(), booking);
    }
}
