use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    clock::ClockTime,
    court::Court,
    matches::{Match, MatchCode, Slot},
    settings::Settings,
};

/// Where and when one match takes place. `day` is a 0-based tournament
/// day index.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Booking {
    pub court: String,
    pub day: u32,
    pub start: ClockTime,
    pub end: ClockTime,
}

impl fmt::Display for Booking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "day {} {} {}-{}",
            self.day + 1,
            self.court,
            self.start,
            self.end
        )
    }
}

/// Court and time assignments, keyed by match code. The skeleton and
/// the result store never move into this type; all three stay joined
/// only through the codes.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Schedule {
    pub bookings: BTreeMap<MatchCode, Booking>,
}

impl Schedule {
    #[must_use]
    pub fn booking(&self, code: &MatchCode) -> Option<&Booking> {
        self.bookings.get(code)
    }

    /// Bookings grouped per court and day, ordered by start time.
    #[must_use]
    pub fn by_court_and_day(&self) -> BTreeMap<(String, u32), Vec<(&MatchCode, &Booking)>> {
        let mut grouped: BTreeMap<(String, u32), Vec<(&MatchCode, &Booking)>> = BTreeMap::new();

        for (code, booking) in &self.bookings {
            grouped
                .entry((booking.court.clone(), booking.day))
                .or_default()
                .push((code, booking));
        }

        for list in grouped.values_mut() {
            list.sort_by_key(|(_, booking)| booking.start);
        }

        grouped
    }

    /// The latest (day, end) over all bookings.
    #[must_use]
    pub fn makespan(&self) -> Option<(u32, ClockTime)> {
        self.bookings
            .values()
            .map(|booking| (booking.day, booking.end))
            .max()
    }

    /// Checks every hard scheduling invariant against the skeleton:
    /// no court overlap, no team overlap, minimum team break, court
    /// window containment, day range.
    ///
    /// # Errors
    ///
    /// Describing the first violated invariant.
    pub fn validate(
        &self,
        matches: &[Match],
        courts: &[Court],
        settings: &Settings,
    ) -> anyhow::Result<()> {
        let by_code: BTreeMap<&MatchCode, &Match> =
            matches.iter().map(|m| (&m.code, m)).collect();

        for (code, booking) in &self.bookings {
            if !by_code.contains_key(code) {
                return Err(anyhow::Error::msg(format!(
                    "schedule: booking for unknown match {code}"
                )));
            }

            if booking.day >= settings.days {
                return Err(anyhow::Error::msg(format!(
                    "schedule: {code} on day {} of a {}-day tournament",
                    booking.day + 1,
                    settings.days
                )));
            }

            if booking.end.minutes != booking.start.minutes + settings.match_minutes {
                return Err(anyhow::Error::msg(format!(
                    "schedule: {code} does not span the match duration"
                )));
            }

            let Some(court) = courts.iter().find(|court| court.name == booking.court) else {
                return Err(anyhow::Error::msg(format!(
                    "schedule: {code} on unknown court {}",
                    booking.court
                )));
            };

            if booking.start < court.opens_at || booking.end > court.closes_at {
                return Err(anyhow::Error::msg(format!(
                    "schedule: {code} is outside {court}"
                )));
            }

            if let Some(day_end) = settings.day_end {
                if booking.end > day_end {
                    return Err(anyhow::Error::msg(format!(
                        "schedule: {code} runs past the {day_end} cutoff"
                    )));
                }
            }
        }

        for ((court, day), list) in self.by_court_and_day() {
            for pair in list.windows(2) {
                let (first_code, first) = pair[0];
                let (second_code, second) = pair[1];

                if second.start < first.end {
                    return Err(anyhow::Error::msg(format!(
                        "schedule: {first_code} and {second_code} overlap on {court} day {}",
                        day + 1
                    )));
                }
            }
        }

        let mut team_bookings: BTreeMap<&str, Vec<&Booking>> = BTreeMap::new();
        for (code, booking) in &self.bookings {
            let Some(m) = by_code.get(code) else {
                continue;
            };

            for slot in &m.slots {
                if let Slot::Team(name) = slot {
                    team_bookings.entry(name).or_default().push(booking);
                }
            }
        }

        for (team, mut bookings) in team_bookings {
            bookings.sort_by_key(|booking| (booking.day, booking.start));

            for pair in bookings.windows(2) {
                if pair[0].day != pair[1].day {
                    continue;
                }

                if pair[1].start < pair[0].end {
                    return Err(anyhow::Error::msg(format!(
                        "schedule: {team} is double-booked on day {}",
                        pair[0].day + 1
                    )));
                }

                if pair[1].start.minutes < pair[0].end.minutes + settings.break_minutes {
                    return Err(anyhow::Error::msg(format!(
                        "schedule: {team} gets less than {} minutes of break",
                        settings.break_minutes
                    )));
                }
            }
        }

        Ok(())
    }
}
