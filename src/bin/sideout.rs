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

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::Context;
use clap::{CommandFactory, Parser};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use sideout::{
    COPYRIGHT, LONG_VERSION, bracket,
    court::Court,
    pool::Pool,
    resolve::{self, MatchState},
    score::{self, RawScore},
    settings::Settings,
    solver,
    store::{Skeleton, Store},
    team::Team,
    utils,
};

/// Sideout tournament scheduler
///
/// Generates brackets and court schedules from a tournament
/// description, records scores, and prints the live state.
#[derive(Parser, Debug)]
#[command(long_version = LONG_VERSION, about = "Sideout tournament scheduler")]
struct Args {
    /// The tournament to operate on
    #[arg(default_value = "default", long)]
    tournament: String,

    /// Generate the bracket and schedule from this description file,
    /// replacing the stored tournament and clearing its results
    #[arg(long)]
    generate: Option<PathBuf>,

    /// Record a score for this match code (requires --score)
    #[arg(long)]
    record: Option<String>,

    /// The score, sets separated by spaces, e.g. "21-15 18-21 15-9"
    #[arg(long)]
    score: Option<String>,

    /// Print the pools, schedule, and bracket
    #[arg(long)]
    show: bool,

    /// Store tournaments under this folder instead of the platform
    /// data folder
    #[arg(long)]
    data_folder: Option<PathBuf>,

    /// Log for systemd
    #[arg(long)]
    systemd: bool,

    /// Build the manpage
    #[arg(long)]
    man: bool,
}

/// What an organizer writes down: pools, courts, and the constraint
/// set.
#[derive(Debug, Deserialize, Serialize)]
struct TournamentFile {
    pools: Vec<Pool>,
    courts: Vec<Court>,
    #[serde(default)]
    settings: Settings,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    utils::init_logger(args.systemd);

    if args.man {
        let mut buffer: Vec<u8> = Vec::default();
        let cmd = Args::command().name("sideout").long_version(None);
        let man = clap_mangen::Man::new(cmd).date("2026-01-12");

        man.render(&mut buffer)?;
        write!(buffer, "{COPYRIGHT}")?;

        fs::write("sideout.1", buffer)?;
        return Ok(());
    }

    let store = match &args.data_folder {
        Some(folder) => Store::at(folder),
        None => Store::new()?,
    };

    if let Some(file) = &args.generate {
        generate(&store, &args.tournament, file)?;
    }

    if let Some(code) = &args.record {
        let score = args
            .score
            .as_ref()
            .context("--record needs --score")?;
        record(&store, &args.tournament, code, score)?;
    }

    if args.show {
        show(&store, &args.tournament)?;
    }

    Ok(())
}

fn generate(store: &Store, tournament: &str, file: &Path) -> anyhow::Result<()> {
    let string = fs::read_to_string(file)
        .with_context(|| format!("unable to read {}", file.display()))?;
    let description: TournamentFile = ron::from_str(&string)?;

    // The file bypassed the constructors, so run their checks now.
    let mut pools = Vec::new();
    for pool in description.pools {
        pools.push(Pool::new(&pool.name, pool.teams, pool.advance_count)?);
    }

    let mut courts = Vec::new();
    for court in description.courts {
        courts.push(Court::new(&court.name, court.opens_at, court.closes_at)?);
    }

    let settings = description.settings;
    let structure = bracket::generate(&pools, None, &settings)?;

    let teams: Vec<Team> = pools.iter().flat_map(|pool| pool.teams.clone()).collect();
    let matches = structure.schedulable_matches();
    let (schedule, unplaced) = solver::schedule(&matches, &courts, &teams, &settings)?;

    for m in &unplaced {
        warn!("no court time found for {m}");
    }

    let skeleton = Skeleton {
        structure,
        schedule,
        settings,
    };
    store.regenerate(tournament, &skeleton)?;

    info!(
        "'{tournament}': {} matches scheduled, {} unplaced",
        skeleton.schedule.bookings.len(),
        unplaced.len()
    );

    Ok(())
}

fn record(store: &Store, tournament: &str, code: &str, score: &str) -> anyhow::Result<()> {
    let skeleton = store
        .load_skeleton(tournament)?
        .with_context(|| format!("'{tournament}' has not been generated yet"))?;

    let m = skeleton
        .structure
        .all_matches()
        .find(|m| m.code.as_str() == code)
        .with_context(|| format!("'{code}' is not a match of '{tournament}'"))?;

    let raw = RawScore::from_str(score)?;
    let result = score::record_result(&m.code, &raw, skeleton.settings.scoring)?;

    info!("{result}");
    store.submit_result(tournament, result)?;

    Ok(())
}

fn show(store: &Store, tournament: &str) -> anyhow::Result<()> {
    let skeleton = store
        .load_skeleton(tournament)?
        .with_context(|| format!("'{tournament}' has not been generated yet"))?;
    let results = store.load_results(tournament)?;

    let view = resolve::resolve(&skeleton.structure, &skeleton.schedule, &results);

    for pool in &view.pools {
        println!("Pool {}", pool.name);
        for row in &pool.standings {
            println!("  {row}");
        }
    }

    println!();
    for ((court, day), list) in skeleton.schedule.by_court_and_day() {
        println!("{court}, day {}", day + 1);
        for (code, booking) in list {
            println!("  {}-{} {code}", booking.start, booking.end);
        }
    }

    for (title, rounds) in [("Bracket", &view.gold), ("Silver bracket", &view.silver)] {
        if rounds.is_empty() {
            continue;
        }

        println!("\n{title}");
        for round in rounds {
            println!("  {}", round.name);
            for m in &round.matches {
                let status = match m.state {
                    MatchState::Complete => m
                        .winner
                        .as_ref()
                        .map_or("decided".to_string(), |winner| format!("won by {winner}")),
                    MatchState::Ready => "ready".to_string(),
                    MatchState::Pending => "pending".to_string(),
                };

                if m.playable {
                    println!("    {}: {} vs {} ({status})", m.code, m.labels[0], m.labels[1]);
                } else {
                    println!("    {}: only if the losers champion takes the grand final", m.code);
                }
            }
        }
    }

    Ok(())
}
