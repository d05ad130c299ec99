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

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::phase::Phase;

/// The canonical identifier of a single match.
///
/// Codes are round-and-position encoded (`P-A-3`, `W2-1`, `L3-2`, `GF`,
/// `GFR`, silver-bracket codes prefixed `S-`) and minted only by the
/// bracket generator. Every other component treats them as opaque keys.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct MatchCode(String);

impl MatchCode {
    pub(crate) fn pool(pool: &str, number: usize) -> Self {
        Self(format!("P-{pool}-{number}"))
    }

    pub(crate) fn winners(round: usize, position: usize) -> Self {
        Self(format!("W{round}-{position}"))
    }

    pub(crate) fn losers(round: usize, position: usize) -> Self {
        Self(format!("L{round}-{position}"))
    }

    pub(crate) fn grand_final() -> Self {
        Self("GF".to_string())
    }

    pub(crate) fn bracket_reset() -> Self {
        Self("GFR".to_string())
    }

    /// The same code moved into the silver bracket's namespace.
    pub(crate) fn silver(&self) -> Self {
        Self(format!("S-{}", self.0))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One side of a match: a concrete team or a reference the resolution
/// layer fills in later.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Slot {
    Team(String),
    /// 1-based entry into the owning bracket's seed list.
    Seed(usize),
    WinnerOf(MatchCode),
    LoserOf(MatchCode),
    Bye,
}

impl Slot {
    #[must_use]
    pub fn reference(&self) -> Option<&MatchCode> {
        match self {
            Self::WinnerOf(code) | Self::LoserOf(code) => Some(code),
            Self::Team(_) | Self::Seed(_) | Self::Bye => None,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Team(name) => write!(f, "{name}"),
            Self::Seed(seed) => write!(f, "Seed {seed}"),
            Self::WinnerOf(code) => write!(f, "Winner of {code}"),
            Self::LoserOf(code) => write!(f, "Loser of {code}"),
            Self::Bye => write!(f, "bye"),
        }
    }
}

/// A skeleton match. Court and time live in the [`crate::schedule::Schedule`],
/// results in the [`crate::score::ResultStore`]; both key off `code`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Match {
    pub code: MatchCode,
    pub phase: Phase,
    /// 1-based round within the phase.
    pub round: usize,
    pub slots: [Slot; 2],
    /// Set on pool matches only.
    #[serde(default)]
    pub pool: Option<String>,
    /// For winners-bracket matches in double elimination: where the loser
    /// drops to.
    #[serde(default)]
    pub losers_feed_to: Option<MatchCode>,
}

impl Match {
    /// A bye has a known single occupant and is excluded from scheduling.
    #[must_use]
    pub fn is_bye(&self) -> bool {
        self.slots.iter().any(|slot| *slot == Slot::Bye)
    }

    /// Both occupants fell out through byes; nobody ever plays this match.
    #[must_use]
    pub fn is_void(&self) -> bool {
        self.slots.iter().all(|slot| *slot == Slot::Bye)
    }

    #[must_use]
    pub fn is_schedulable(&self) -> bool {
        !self.is_bye()
    }

    /// The sole occupant of a bye match.
    #[must_use]
    pub fn bye_occupant(&self) -> Option<&Slot> {
        if self.is_void() || !self.is_bye() {
            return None;
        }

        self.slots.iter().find(|slot| **slot != Slot::Bye)
    }
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} vs {}", self.code, self.slots[0], self.slots[1])
    }
}
