use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub enum Phase {
    #[default]
    Pool,
    Winners,
    Losers,
    GrandFinal,
    BracketReset,
}

impl Phase {
    /// Whether matches of this phase belong to an elimination bracket.
    #[must_use]
    pub fn is_bracket(self) -> bool {
        self != Self::Pool
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pool => write!(f, "pool"),
            Self::Winners => write!(f, "winners"),
            Self::Losers => write!(f, "losers"),
            Self::GrandFinal => write!(f, "grand_final"),
            Self::BracketReset => write!(f, "bracket_reset"),
        }
    }
}

impl FromStr for Phase {
    type Err = anyhow::Error;

    fn from_str(string: &str) -> anyhow::Result<Self> {
        match string {
            "pool" => Ok(Self::Pool),
            "winners" => Ok(Self::Winners),
            "losers" => Ok(Self::Losers),
            "grand_final" => Ok(Self::GrandFinal),
            "bracket_reset" => Ok(Self::BracketReset),
            _ => Err(anyhow::Error::msg(format!(
                "Error trying to convert '{string}' to a Phase!"
            ))),
        }
    }
}
