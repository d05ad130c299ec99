use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// A clock reading in minutes on an extended timeline.
///
/// A value past `MINUTES_PER_DAY` represents a time after midnight of the
/// same operating day, so a court open `20:00..26:00` closes at two in the
/// morning without ever comparing two wrapped clock readings.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct ClockTime {
    pub minutes: u32,
}

impl ClockTime {
    #[must_use]
    pub const fn from_hm(hours: u32, minutes: u32) -> Self {
        Self {
            minutes: hours * 60 + minutes,
        }
    }

    #[must_use]
    pub const fn plus_minutes(self, minutes: u32) -> Self {
        Self {
            minutes: self.minutes + minutes,
        }
    }

    /// The same reading pushed past midnight onto the extended timeline.
    #[must_use]
    pub const fn next_day(self) -> Self {
        Self {
            minutes: self.minutes + MINUTES_PER_DAY,
        }
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hours = (self.minutes / 60) % 24;
        let minutes = self.minutes % 60;

        write!(f, "{hours:02}:{minutes:02}")
    }
}

impl FromStr for ClockTime {
    type Err = anyhow::Error;

    fn from_str(string: &str) -> anyhow::Result<Self> {
        let time = NaiveTime::parse_from_str(string, "%H:%M")?;

        Ok(Self {
            minutes: time.hour() * 60 + time.minute(),
        })
    }
}
