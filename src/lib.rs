//! A scheduling and bracket engine for court tournaments.
//!
//! The crate computes everything a tournament organizer cannot do on a
//! napkin: it ranks pools from recorded results, seeds the advancing
//! teams into a single- or double-elimination bracket, builds the full
//! round skeleton with a stable code for every match, assigns matches
//! to courts and time slots under hard constraints, and projects the
//! skeleton, the schedule, and the result store into a live view.
//!
//! The one rule everything else hangs off: a match code is minted
//! exactly once, in [`bracket::generate`], and every other component
//! is a pure reader of that structure.

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

#![deny(clippy::panic)]

pub mod bracket;
pub mod clock;
pub mod court;
pub mod matches;
pub mod phase;
pub mod pool;
pub mod resolve;
pub mod schedule;
pub mod score;
pub mod seeding;
pub mod settings;
pub mod solver;
pub mod standings;
pub mod store;
pub mod team;
pub mod utils;

pub const HOME: &str = "sideout";

pub const COPYRIGHT: &str = r".SH COPYRIGHT
Copyright (C) 2025-2026 Developers of the sideout project

This program is free software: you can redistribute it and/or modify
it under the terms of the GNU Affero General Public License as published by
the Free Software Foundation, either version 3 of the License, or
(at your option) any later version.

This program is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
GNU Affero General Public License for more details.

You should have received a copy of the GNU Affero General Public License
along with this program.  If not, see <https://www.gnu.org/licenses/>.
";

pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "
Copyright (c) 2025 Developers of the sideout project
Licensed under the AGPLv3"
);
