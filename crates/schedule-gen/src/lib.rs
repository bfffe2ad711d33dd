#![deny(warnings)]

//! Season schedule generation.
//!
//! Builds a 272-game season for the 32-team league:
//! - A matchup manifest from rotation formulas keyed by season year
//! - A bye week per team inside the bye window
//! - A simulated-annealing week assignment with holiday games locked
//! - Broadcast slots and kickoff timestamps
//! - A read-only validation pass over the published views
//!
//! All randomness comes from the caller's RNG, so a seeded `ChaCha8Rng`
//! reproduces a season exactly.

use league_core::{default_registry, Schedule, TeamRegistry, ValidationError};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

pub mod byes;
pub mod calendar;
pub mod config;
pub mod job;
pub mod manifest;
pub mod slots;
pub mod solver;
pub mod validate;

pub use config::{AnnealingConfig, SchedulerConfig};
pub use job::GenerationJob;
pub use solver::SolveStatus;
pub use validate::{validate_schedule, ScheduleIssue, ValidationReport};

/// Errors returned for caller mistakes. Schedule quality problems are
/// logged instead.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error(transparent)]
    Core(#[from] ValidationError),
    #[error("invalid scheduler config: {0}")]
    InvalidConfig(String),
    /// Bye distribution does not cover every team exactly once.
    #[error("bye distribution covers {actual} teams, expected {expected}")]
    ByeDistribution { expected: usize, actual: usize },
    #[error("unknown team: {0}")]
    UnknownTeam(String),
    #[error("config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("config yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Generate a season with an explicit registry, config and RNG.
pub fn generate_schedule<R: Rng + ?Sized>(
    season_year: i32,
    registry: &TeamRegistry,
    config: &SchedulerConfig,
    rng: &mut R,
) -> Result<Schedule, ScheduleError> {
    let job = GenerationJob::new(season_year, registry, config, rng)?;
    Ok(job.finish(rng))
}

/// Generate a season for the default league from a seed.
pub fn generate_schedule_seeded(season_year: i32, seed: u64) -> Result<Schedule, ScheduleError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    generate_schedule(
        season_year,
        &default_registry(),
        &SchedulerConfig::default(),
        &mut rng,
    )
}

/// Derive a per-season seed from a league seed (splitmix64 finalizer).
pub fn season_seed(base: u64, season_year: i32) -> u64 {
    let mut z = base ^ (season_year as i64 as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
