use std::fmt;

use serde::{Deserialize, Serialize};

use crate::clock::ClockTime;

/// A team may only be scheduled inside its window, when one is set.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct PlayWindow {
    #[serde(default)]
    pub play_after: Option<ClockTime>,
    #[serde(default)]
    pub play_before: Option<ClockTime>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Team {
    pub name: String,
    #[serde(default)]
    pub window: Option<PlayWindow>,
}

impl Team {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            window: None,
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;

        if let Some(window) = &self.window {
            if let Some(after) = window.play_after {
                write!(f, " after {after}")?;
            }
            if let Some(before) = window.play_before {
                write!(f, " before {before}")?;
            }
        }

        Ok(())
    }
}
