#![deny(warnings)]

//! Core domain models and invariants for the league scheduler.
//!
//! This crate defines the serializable types shared by the schedule
//! generator, the league runtime and persistence: teams and their registry,
//! unplaced manifest entries, placed games and the two published schedule
//! views, together with validation helpers for the registry shape the
//! generator depends on.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

mod registry;
mod schedule;

pub use registry::{default_registry, TeamRegistry};
pub use schedule::{
    kickoff_iso, LeagueGameView, Record, Schedule, TeamGameView, BYE_CODE, SCHEMA_VERSION,
};

/// Unique franchise code, e.g. "BUF".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamCode(pub String);

impl TeamCode {
    pub fn new(code: &str) -> Self {
        TeamCode(code.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TeamCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One of the two conferences.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Conference {
    A,
    B,
}

impl Conference {
    pub const ALL: [Conference; 2] = [Conference::A, Conference::B];
}

/// One of the four divisions inside a conference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Division {
    East,
    North,
    South,
    West,
}

impl Division {
    pub const ALL: [Division; 4] = [
        Division::East,
        Division::North,
        Division::South,
        Division::West,
    ];

    /// Zero-based position, 0..=3.
    pub fn index(self) -> usize {
        match self {
            Division::East => 0,
            Division::North => 1,
            Division::South => 2,
            Division::West => 3,
        }
    }

    /// Division at a zero-based position, wrapping modulo 4.
    pub fn from_index(i: usize) -> Division {
        Division::ALL[i % 4]
    }
}

/// A franchise participating in the league.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// Unique short code.
    pub code: TeamCode,
    /// Home city for display.
    pub city: String,
    /// Nickname for display.
    pub name: String,
    pub conference: Conference,
    pub division: Division,
}

/// Kind of matchup, which also names the manifest tier that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameType {
    /// Division rivals, played home and away.
    Division,
    /// Same-conference rotation against a whole division.
    Conference,
    /// Cross-conference rotation and the cross-conference 17th game.
    Nonconference,
    /// Same-conference rank-for-rank games.
    Extra,
    /// Placeholder row for a team's week off.
    Bye,
}

/// Unplaced matchup produced by the manifest builder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub id: u16,
    pub home: TeamCode,
    pub away: TeamCode,
    pub game_type: GameType,
}

impl ManifestEntry {
    /// True when `code` is either participant.
    pub fn involves(&self, code: &TeamCode) -> bool {
        &self.home == code || &self.away == code
    }
}

/// Symbolic broadcast window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSlot {
    ThursdayNight,
    International,
    SundayEarly,
    SundayLate,
    SundayNight,
    MondayNight,
    HolidayEarly,
    HolidayLate,
    HolidayNight,
}

impl TimeSlot {
    /// Days after the week's Thursday anchor.
    pub fn day_offset(self) -> i64 {
        match self {
            TimeSlot::ThursdayNight
            | TimeSlot::HolidayEarly
            | TimeSlot::HolidayLate
            | TimeSlot::HolidayNight => 0,
            TimeSlot::International
            | TimeSlot::SundayEarly
            | TimeSlot::SundayLate
            | TimeSlot::SundayNight => 3,
            TimeSlot::MondayNight => 4,
        }
    }

    /// Local (reference zone) kickoff as `(hour, minute)`.
    pub fn local_time(self) -> (u32, u32) {
        match self {
            TimeSlot::ThursdayNight => (20, 15),
            TimeSlot::International => (9, 30),
            TimeSlot::SundayEarly => (13, 0),
            TimeSlot::SundayLate => (16, 25),
            TimeSlot::SundayNight => (20, 20),
            TimeSlot::MondayNight => (20, 15),
            TimeSlot::HolidayEarly => (12, 30),
            TimeSlot::HolidayLate => (16, 30),
            TimeSlot::HolidayNight => (20, 20),
        }
    }

    /// Weekday-night windows tracked for marquee rotation.
    pub fn is_marquee(self) -> bool {
        matches!(
            self,
            TimeSlot::ThursdayNight | TimeSlot::SundayNight | TimeSlot::MondayNight
        )
    }
}

/// Lifecycle of a placed game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Scheduled,
    Final,
}

/// Manifest entry placed into a week with its broadcast slot and kickoff.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlacedGame {
    pub entry: ManifestEntry,
    /// Season week, 1-based.
    pub week: u8,
    pub slot: Option<TimeSlot>,
    pub kickoff: Option<DateTime<FixedOffset>>,
    pub status: GameStatus,
    pub home_score: Option<u16>,
    pub away_score: Option<u16>,
}

impl PlacedGame {
    /// A game placed in `week` that has not been slotted or played yet.
    pub fn unplayed(entry: ManifestEntry, week: u8) -> Self {
        Self {
            entry,
            week,
            slot: None,
            kickoff: None,
            status: GameStatus::Scheduled,
            home_score: None,
            away_score: None,
        }
    }
}

/// Validation errors for registry and schedule data.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Year outside supported range [1970, 2100].
    #[error("year {0} is out of supported range [1970, 2100]")]
    YearOutOfRange(i32),
    /// Two teams share the same code.
    #[error("duplicate team code: {0}")]
    DuplicateTeam(String),
    /// Team code is empty or collides with the bye marker.
    #[error("invalid team code: {0:?}")]
    InvalidTeamCode(String),
    /// A (conference, division) group does not hold exactly four teams.
    #[error("division {conference:?}-{division:?} has {size} teams, expected 4")]
    DivisionSize {
        conference: Conference,
        division: Division,
        size: usize,
    },
    /// Team code not present in the registry.
    #[error("unknown team: {0}")]
    UnknownTeam(String),
    /// Game id not present in the schedule.
    #[error("unknown game id: {0}")]
    UnknownGame(u16),
}

/// Validate a season year.
pub fn validate_season_year(year: i32) -> Result<(), ValidationError> {
    if !(1970..=2100).contains(&year) {
        return Err(ValidationError::YearOutOfRange(year));
    }
    Ok(())
}

/// Validate a single team record.
pub fn validate_team(team: &Team) -> Result<(), ValidationError> {
    let code = team.code.as_str();
    if code.trim().is_empty() || code == BYE_CODE {
        return Err(ValidationError::InvalidTeamCode(code.to_string()));
    }
    Ok(())
}

/// Validate the registry: unique codes and four teams per division.
pub fn validate_registry(registry: &TeamRegistry) -> Result<(), ValidationError> {
    let mut codes: BTreeSet<&TeamCode> = BTreeSet::new();
    for team in registry.teams() {
        validate_team(team)?;
        if !codes.insert(&team.code) {
            return Err(ValidationError::DuplicateTeam(team.code.0.clone()));
        }
    }
    for conference in Conference::ALL {
        for division in Division::ALL {
            let size = registry.division_members(conference, division).len();
            if size != 4 {
                return Err(ValidationError::DivisionSize {
                    conference,
                    division,
                    size,
                });
            }
        }
    }
    Ok(())
}
