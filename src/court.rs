use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{clock::ClockTime, settings::InvalidSettings};

/// A court with its daily operating window.
///
/// `closes_at` lives on the extended timeline, so an overnight court stores
/// `20:00..26:00` rather than a pair of wrapped clock readings.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Court {
    pub name: String,
    pub opens_at: ClockTime,
    pub closes_at: ClockTime,
}

impl Court {
    /// # Errors
    ///
    /// If the court closes at or before it opens.
    pub fn new(
        name: &str,
        opens_at: ClockTime,
        closes_at: ClockTime,
    ) -> Result<Self, InvalidSettings> {
        if closes_at <= opens_at {
            return Err(InvalidSettings::CourtWindow {
                court: name.to_string(),
            });
        }

        Ok(Self {
            name: name.to_string(),
            opens_at,
            closes_at,
        })
    }

    /// Parses `"Center 08:00-20:00"`; an end at or before the start is
    /// taken as wrapping past midnight.
    ///
    /// # Errors
    ///
    /// If the string is not a name followed by a `HH:MM-HH:MM` window.
    pub fn parse(string: &str) -> anyhow::Result<Self> {
        let Some((name, window)) = string.rsplit_once(' ') else {
            return Err(anyhow::Error::msg(format!(
                "court: expected 'NAME HH:MM-HH:MM', got '{string}'"
            )));
        };

        let Some((opens, closes)) = window.split_once('-') else {
            return Err(anyhow::Error::msg(format!(
                "court: expected a 'HH:MM-HH:MM' window, got '{window}'"
            )));
        };

        let opens_at = ClockTime::from_str(opens)?;
        let mut closes_at = ClockTime::from_str(closes)?;
        if closes_at <= opens_at {
            closes_at = closes_at.next_day();
        }

        Ok(Court::new(name, opens_at, closes_at)?)
    }
}

impl fmt::Display for Court {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}-{}", self.name, self.opens_at, self.closes_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_window() {
        let eight = ClockTime::from_hm(8, 0);
        assert!(Court::new("Center", eight, eight).is_err());
        assert!(Court::new("Center", eight, ClockTime::from_hm(20, 0)).is_ok());
    }

    #[test]
    fn parses_overnight_window() -> anyhow::Result<()> {
        let court = Court::parse("North 20:00-02:00")?;
        assert_eq!(court.opens_at, ClockTime::from_hm(20, 0));
        assert_eq!(court.closes_at, ClockTime::from_hm(26, 0));

        let court = Court::parse("Court 1 08:00-20:00")?;
        assert_eq!(court.name, "Court 1");

        assert!(Court::parse("nonsense").is_err());

        Ok(())
    }
}
