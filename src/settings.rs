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

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock::ClockTime;

/// Tournament-wide scheduling and bracket constraints.
///
/// Every duration is in minutes. Malformed values are rejected by
/// [`Settings::validate`], never clamped.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Settings {
    pub match_minutes: u32,
    pub break_minutes: u32,
    pub days: u32,
    /// Matches must end by this time each day, in addition to court hours.
    pub day_end: Option<ClockTime>,
    /// Minimum gap between the last pool match and the first bracket match.
    pub bracket_delay_minutes: u32,
    /// Keep all matches of a pool on a single court.
    pub pool_on_one_court: bool,
    pub elimination: Elimination,
    pub scoring: Scoring,
    pub silver_bracket: bool,
    /// Wall-clock budget for the allocation search, in milliseconds.
    pub solver_millis: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            match_minutes: 25,
            break_minutes: 5,
            days: 1,
            day_end: None,
            bracket_delay_minutes: 30,
            pool_on_one_court: false,
            elimination: Elimination::Single,
            scoring: Scoring::SingleSet,
            silver_bracket: false,
            solver_millis: 2_000,
        }
    }
}

impl Settings {
    /// # Errors
    ///
    /// If a duration or the day count is zero.
    pub fn validate(&self) -> Result<(), InvalidSettings> {
        if self.match_minutes == 0 {
            return Err(InvalidSettings::MatchDuration);
        }

        if self.days == 0 {
            return Err(InvalidSettings::Days);
        }

        Ok(())
    }
}

#[derive(Error, Debug, Eq, PartialEq)]
pub enum InvalidSettings {
    #[error("settings: the match duration has to be positive")]
    MatchDuration,
    #[error("settings: the tournament needs at least one day")]
    Days,
    #[error("court '{court}': closes at or before it opens")]
    CourtWindow { court: String },
    #[error("court '{court}' appears more than once")]
    DuplicateCourt { court: String },
    #[error("pool '{pool}': advance count {advance} exceeds {teams} teams")]
    AdvanceCount {
        pool: String,
        advance: usize,
        teams: usize,
    },
    #[error("pool '{pool}': team '{team}' appears more than once")]
    DuplicateTeam { pool: String, team: String },
    #[error("pool '{pool}' appears more than once")]
    DuplicatePool { pool: String },
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum Elimination {
    #[default]
    Single,
    Double,
}

impl fmt::Display for Elimination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => write!(f, "single"),
            Self::Double => write!(f, "double"),
        }
    }
}

impl FromStr for Elimination {
    type Err = anyhow::Error;

    fn from_str(string: &str) -> anyhow::Result<Self> {
        match string {
            "single" => Ok(Self::Single),
            "double" => Ok(Self::Double),
            _ => Err(anyhow::Error::msg(format!(
                "Error trying to convert '{string}' to an Elimination!"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum Scoring {
    #[default]
    SingleSet,
    BestOfThree,
}

impl fmt::Display for Scoring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SingleSet => write!(f, "single-set"),
            Self::BestOfThree => write!(f, "best-of-3"),
        }
    }
}

impl FromStr for Scoring {
    type Err = anyhow::Error;

    fn from_str(string: &str) -> anyhow::Result<Self> {
        match string {
            "single-set" => Ok(Self::SingleSet),
            "best-of-3" => Ok(Self::BestOfThree),
            _ => Err(anyhow::Error::msg(format!(
                "Error trying to convert '{string}' to a Scoring!"
            ))),
        }
    }
}
