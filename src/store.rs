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

//! Persists the skeleton (bracket structure plus schedule) and the
//! result map per tournament, and owns the regeneration contract.
//!
//! The two files are independent on purpose: a score submission
//! rewrites `results.ron` only, so reading the skeleton never waits on
//! a writer. Regeneration is the one operation that must not
//! interleave with itself — a half-written skeleton with orphaned
//! match codes cannot be repaired — so it is serialized per
//! tournament and rejected, not queued, when already running.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, OnceLock},
};

use log::{info, warn};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::{
    bracket::BracketStructure,
    schedule::Schedule,
    score::{MatchResult, ResultStore},
    settings::Settings,
    utils,
};

const SKELETON_FILE: &str = "skeleton.ron";
const RESULTS_FILE: &str = "results.ron";

/// The structural half of the persisted state. Regenerated as a whole,
/// never edited in place.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Skeleton {
    pub structure: BracketStructure,
    pub schedule: Schedule,
    pub settings: Settings,
}

pub struct Store {
    root: PathBuf,
}

fn regenerating() -> &'static Mutex<FxHashSet<String>> {
    static REGENERATING: OnceLock<Mutex<FxHashSet<String>>> = OnceLock::new();
    REGENERATING.get_or_init(|| Mutex::new(FxHashSet::default()))
}

/// Releases the per-tournament regeneration slot even when a write
/// fails halfway.
struct RegenerationGuard {
    tournament: String,
}

impl Drop for RegenerationGuard {
    fn drop(&mut self) {
        if let Ok(mut set) = regenerating().lock() {
            set.remove(&self.tournament);
        }
    }
}

impl Store {
    /// Opens the store in the platform data folder.
    ///
    /// # Errors
    ///
    /// If the platform has no data directory.
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            root: utils::data_folder()?,
        })
    }

    /// Opens the store under an explicit root instead.
    #[must_use]
    pub fn at(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    fn tournament_folder(&self, tournament: &str) -> anyhow::Result<PathBuf> {
        if tournament.is_empty()
            || tournament.contains(['/', '\\'])
            || tournament.starts_with('.')
        {
            return Err(anyhow::Error::msg(format!(
                "'{tournament}' is not a usable tournament name"
            )));
        }

        Ok(self.root.join(tournament))
    }

    /// # Errors
    ///
    /// If the skeleton file exists but cannot be read or parsed.
    pub fn load_skeleton(&self, tournament: &str) -> anyhow::Result<Option<Skeleton>> {
        let file = self.tournament_folder(tournament)?.join(SKELETON_FILE);

        if !fs::exists(&file)? {
            return Ok(None);
        }

        let string = fs::read_to_string(&file)?;
        Ok(Some(ron::from_str(&string)?))
    }

    /// # Errors
    ///
    /// If the results file exists but cannot be read or parsed.
    pub fn load_results(&self, tournament: &str) -> anyhow::Result<ResultStore> {
        let file = self.tournament_folder(tournament)?.join(RESULTS_FILE);

        if !fs::exists(&file)? {
            return Ok(ResultStore::default());
        }

        let string = fs::read_to_string(&file)?;
        Ok(ron::from_str(&string)?)
    }

    /// Records one result, replacing any earlier submission for the
    /// same code. Safe to run while others read the skeleton: only the
    /// results file is touched.
    ///
    /// # Errors
    ///
    /// If the results file cannot be read or written.
    pub fn submit_result(&self, tournament: &str, result: MatchResult) -> anyhow::Result<()> {
        let folder = self.tournament_folder(tournament)?;
        fs::create_dir_all(&folder)?;

        let mut results = self.load_results(tournament)?;
        results.submit(result);

        fs::write(
            folder.join(RESULTS_FILE),
            ron::ser::to_string(&results)?,
        )?;

        Ok(())
    }

    /// Replaces the whole skeleton and clears every stored result.
    ///
    /// Destructive by contract: old match codes may now mean different
    /// matches, so stale scores must not survive. Rejected when a
    /// regeneration of the same tournament is already running.
    ///
    /// # Errors
    ///
    /// If another regeneration is in flight, or the files cannot be
    /// written.
    pub fn regenerate(&self, tournament: &str, skeleton: &Skeleton) -> anyhow::Result<()> {
        let folder = self.tournament_folder(tournament)?;

        {
            let mut set = regenerating()
                .lock()
                .map_err(|_| anyhow::Error::msg("the regeneration lock is poisoned"))?;

            if !set.insert(tournament.to_string()) {
                return Err(anyhow::Error::msg(format!(
                    "a regeneration of '{tournament}' is already running"
                )));
            }
        }

        let _guard = RegenerationGuard {
            tournament: tournament.to_string(),
        };

        fs::create_dir_all(&folder)?;
        fs::write(
            folder.join(SKELETON_FILE),
            ron::ser::to_string(skeleton)?,
        )?;

        let results_file = folder.join(RESULTS_FILE);
        if fs::exists(&results_file)? {
            fs::remove_file(&results_file)?;
            warn!("regeneration of '{tournament}' cleared its recorded results");
        }

        info!(
            "regenerated '{tournament}': {} matches",
            skeleton.structure.all_matches().count()
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::{
        bracket,
        pool::Pool,
        score::{RawScore, record_result},
        settings::{Scoring, Settings},
        team::Team,
    };

    fn temp_store(name: &str) -> Store {
        let root = std::env::temp_dir().join("sideout-store-tests").join(name);
        let _ = fs::remove_dir_all(&root);
        Store::at(&root)
    }

    fn skeleton() -> Skeleton {
        let teams = (1..=4).map(|i| Team::new(&format!("T{i}"))).collect();
        let pools = [Pool::new("A", teams, 2).unwrap()];
        let structure = bracket::generate(&pools, None, &Settings::default()).unwrap();

        Skeleton {
            structure,
            schedule: Schedule::default(),
            settings: Settings::default(),
        }
    }

    #[test]
    fn round_trips_skeleton_and_results() -> anyhow::Result<()> {
        let store = temp_store("round-trip");
        let skeleton = skeleton();

        assert!(store.load_skeleton("spring")?.is_none());

        store.regenerate("spring", &skeleton)?;
        assert_eq!(store.load_skeleton("spring")?, Some(skeleton.clone()));

        let code = skeleton.structure.pool_matches[0].code.clone();
        let result = record_result(&code, &RawScore::from_str("21-15")?, Scoring::SingleSet)?;
        store.submit_result("spring", result.clone())?;

        let results = store.load_results("spring")?;
        assert_eq!(results.get(&code), Some(&result));

        Ok(())
    }

    #[test]
    fn regeneration_clears_results() -> anyhow::Result<()> {
        let store = temp_store("regen-clears");
        let skeleton = skeleton();
        store.regenerate("autumn", &skeleton)?;

        let code = skeleton.structure.pool_matches[0].code.clone();
        let result = record_result(&code, &RawScore::from_str("21-15")?, Scoring::SingleSet)?;
        store.submit_result("autumn", result)?;
        assert!(!store.load_results("autumn")?.is_empty());

        store.regenerate("autumn", &skeleton)?;

        // The next read comes back pending, not with a stale score.
        assert!(store.load_results("autumn")?.is_empty());

        Ok(())
    }

    #[test]
    fn rejects_path_like_names() {
        let store = temp_store("bad-names");
        assert!(store.load_skeleton("../escape").is_err());
        assert!(store.load_skeleton("a/b").is_err());
        assert!(store.load_skeleton("").is_err());
    }
}
