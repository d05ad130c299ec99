use std::{collections::BTreeMap, fmt, str::FromStr};

use log::info;
use serde::{Deserialize, Serialize};

use crate::{matches::MatchCode, settings::Scoring};

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SetScore {
    pub a: u32,
    pub b: u32,
}

impl fmt::Display for SetScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.a, self.b)
    }
}

/// A score as submitted, before validation. A missing side stays `None`
/// so a partial submission can be rejected rather than guessed at.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RawScore(pub Vec<[Option<u32>; 2]>);

impl FromStr for RawScore {
    type Err = anyhow::Error;

    fn from_str(string: &str) -> anyhow::Result<Self> {
        let mut sets = Vec::new();

        for part in string.split_whitespace() {
            let Some((a, b)) = part.split_once('-') else {
                return Err(anyhow::Error::msg(format!(
                    "score: expected 'A-B', got '{part}'"
                )));
            };

            let a = if a.is_empty() { None } else { Some(a.parse()?) };
            let b = if b.is_empty() { None } else { Some(b.parse()?) };
            sets.push([a, b]);
        }

        Ok(Self(sets))
    }
}

/// The recorded outcome of one match. Superseded wholesale by any later
/// submission for the same code.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct MatchResult {
    pub code: MatchCode,
    pub sets: Vec<SetScore>,
    pub winner: Side,
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sets: Vec<String> = self.sets.iter().map(ToString::to_string).collect();

        write!(f, "{}: {}", self.code, sets.join(" "))
    }
}

/// Validates a submitted score and computes the winner.
///
/// Knows nothing about brackets or schedules.
///
/// # Errors
///
/// If the score is empty, a set is missing a side, a set is drawn, or the
/// set count is inconsistent with the scoring format.
pub fn record_result(
    code: &MatchCode,
    raw: &RawScore,
    scoring: Scoring,
) -> anyhow::Result<MatchResult> {
    if raw.0.is_empty() {
        return Err(anyhow::Error::msg("score: at least one set is required"));
    }

    let mut sets = Vec::with_capacity(raw.0.len());
    for set in &raw.0 {
        let [Some(a), Some(b)] = *set else {
            return Err(anyhow::Error::msg(
                "score: both sides of every set are required",
            ));
        };

        if a == b {
            return Err(anyhow::Error::msg("score: a set cannot be drawn"));
        }

        sets.push(SetScore { a, b });
    }

    match scoring {
        Scoring::SingleSet => {
            if sets.len() != 1 {
                return Err(anyhow::Error::msg(format!(
                    "score: single-set format takes exactly one set, got {}",
                    sets.len()
                )));
            }
        }
        Scoring::BestOfThree => {
            if sets.len() < 2 || sets.len() > 3 {
                return Err(anyhow::Error::msg(format!(
                    "score: best-of-3 takes two or three sets, got {}",
                    sets.len()
                )));
            }

            let first_two_a = sets[..2].iter().filter(|set| set.a > set.b).count();
            if sets.len() == 2 && first_two_a == 1 {
                return Err(anyhow::Error::msg(
                    "score: best-of-3 is tied after two sets, a third is required",
                ));
            }
            if sets.len() == 3 && first_two_a != 1 {
                return Err(anyhow::Error::msg(
                    "score: best-of-3 was decided in two sets, a third cannot exist",
                ));
            }
        }
    }

    let a_sets = sets.iter().filter(|set| set.a > set.b).count();
    let b_sets = sets.len() - a_sets;
    let winner = if a_sets > b_sets { Side::A } else { Side::B };

    Ok(MatchResult {
        code: code.clone(),
        sets,
        winner,
    })
}

/// All recorded results, keyed by match code. Independent of the skeleton
/// store so submissions never block reads of the bracket.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ResultStore(pub BTreeMap<MatchCode, MatchResult>);

impl ResultStore {
    /// Last write wins; an earlier result for the same code is replaced
    /// without complaint.
    pub fn submit(&mut self, result: MatchResult) {
        if let Some(old) = self.0.insert(result.code.clone(), result) {
            info!("superseded result for {}", old.code);
        }
    }

    #[must_use]
    pub fn get(&self, code: &MatchCode) -> Option<&MatchResult> {
        self.0.get(code)
    }

    /// Drops every result. Run as part of structural regeneration, since
    /// old codes may now name logically different matches.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code() -> MatchCode {
        MatchCode::grand_final()
    }

    #[test]
    fn single_set() -> anyhow::Result<()> {
        let raw = RawScore::from_str("21-15")?;
        let result = record_result(&code(), &raw, Scoring::SingleSet)?;
        assert_eq!(result.winner, Side::A);

        let raw = RawScore::from_str("15-21")?;
        let result = record_result(&code(), &raw, Scoring::SingleSet)?;
        assert_eq!(result.winner, Side::B);

        Ok(())
    }

    #[test]
    fn empty_score_rejected() {
        let result = record_result(&code(), &RawScore::default(), Scoring::SingleSet);
        assert!(result.is_err());
    }

    #[test]
    fn partial_score_rejected() -> anyhow::Result<()> {
        let raw = RawScore::from_str("21-")?;
        assert_eq!(raw.0[0], [Some(21), None]);

        let result = record_result(&code(), &raw, Scoring::SingleSet);
        assert!(result.is_err());

        Ok(())
    }

    #[test]
    fn drawn_set_rejected() -> anyhow::Result<()> {
        let raw = RawScore::from_str("20-20")?;
        assert!(record_result(&code(), &raw, Scoring::SingleSet).is_err());

        Ok(())
    }

    #[test]
    fn best_of_three_set_counts() -> anyhow::Result<()> {
        let two_zero = RawScore::from_str("21-15 21-18")?;
        let result = record_result(&code(), &two_zero, Scoring::BestOfThree)?;
        assert_eq!(result.winner, Side::A);

        let two_one = RawScore::from_str("21-15 18-21 10-15")?;
        let result = record_result(&code(), &two_one, Scoring::BestOfThree)?;
        assert_eq!(result.winner, Side::B);

        // Tied after two sets, a third is required.
        let tied = RawScore::from_str("21-15 18-21")?;
        assert!(record_result(&code(), &tied, Scoring::BestOfThree).is_err());

        // Decided in two, a third set cannot exist.
        let over = RawScore::from_str("21-15 21-18 15-10")?;
        assert!(record_result(&code(), &over, Scoring::BestOfThree).is_err());

        // One set is not enough.
        let short = RawScore::from_str("21-15")?;
        assert!(record_result(&code(), &short, Scoring::BestOfThree).is_err());

        Ok(())
    }

    #[test]
    fn last_submission_wins() -> anyhow::Result<()> {
        let mut store = ResultStore::default();

        let first = record_result(&code(), &RawScore::from_str("21-15")?, Scoring::SingleSet)?;
        let second = record_result(&code(), &RawScore::from_str("15-21")?, Scoring::SingleSet)?;

        store.submit(first);
        store.submit(second.clone());

        assert_eq!(store.get(&code()), Some(&second));

        Ok(())
    }
}
