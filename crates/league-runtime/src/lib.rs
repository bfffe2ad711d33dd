#![deny(warnings)]

//! League session state and the schedule operations a host calls.
//!
//! The schedule for a season is generated lazily from the league seed and
//! cached on the state until the season year or the schema version
//! changes.

use anyhow::{Context, Result};
use league_core::{default_registry, Schedule, TeamCode, TeamGameView, TeamRegistry, SCHEMA_VERSION};
use persistence::{load_json, save_json, KvStore};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use schedule_gen::{generate_schedule, season_seed, ScheduleError, SchedulerConfig};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Everything a league session persists.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueState {
    pub season_year: i32,
    /// League seed; each season derives its own stream from it.
    pub rng_seed: u64,
    pub config: SchedulerConfig,
    pub registry: TeamRegistry,
    pub schedule: Option<Schedule>,
}

impl LeagueState {
    /// Default league and scheduler settings, no schedule yet.
    pub fn new(season_year: i32, rng_seed: u64) -> Self {
        Self::with_config(season_year, rng_seed, SchedulerConfig::default())
    }

    pub fn with_config(season_year: i32, rng_seed: u64, config: SchedulerConfig) -> Self {
        Self {
            season_year,
            rng_seed,
            config,
            registry: default_registry(),
            schedule: None,
        }
    }
}

fn is_current(schedule: &Schedule, season_year: i32) -> bool {
    schedule.season_year == season_year && schedule.schema_version == SCHEMA_VERSION
}

/// Return the stored schedule for `season_year`, generating it first when
/// none is stored or the stored one is for another year or schema.
pub fn ensure_schedule(state: &mut LeagueState, season_year: i32) -> Result<&Schedule, ScheduleError> {
    if matches!(&state.schedule, Some(current) if is_current(current, season_year)) {
        return Ok(state.schedule.as_ref().expect("checked above"));
    }
    let slot = &mut state.schedule;
    let previous = slot.as_ref().map(|s| (s.season_year, s.schema_version));
    info!(season_year, ?previous, "generating season schedule");
    let mut rng = ChaCha8Rng::seed_from_u64(season_seed(state.rng_seed, season_year));
    let schedule = generate_schedule(season_year, &state.registry, &state.config, &mut rng)?;
    state.season_year = season_year;
    Ok(slot.insert(schedule))
}

/// One team's week-ordered rows, bye included.
pub fn get_team_schedule<'a>(
    state: &'a mut LeagueState,
    team_code: &str,
    season_year: i32,
) -> Result<&'a [TeamGameView], ScheduleError> {
    let code = TeamCode::new(team_code);
    if !state.registry.contains(&code) {
        return Err(ScheduleError::UnknownTeam(team_code.to_string()));
    }
    ensure_schedule(state, season_year)?
        .team_games(&code)
        .ok_or_else(|| ScheduleError::UnknownTeam(team_code.to_string()))
}

/// Season record as `"W-L"` (`"W-L-T"` once a tie exists); `"0-0"` before
/// any schedule is stored.
pub fn recompute_record(state: &LeagueState, team_code: &str) -> Result<String, ScheduleError> {
    let code = TeamCode::new(team_code);
    if !state.registry.contains(&code) {
        return Err(ScheduleError::UnknownTeam(team_code.to_string()));
    }
    let record = state
        .schedule
        .as_ref()
        .and_then(|s| s.record(&code))
        .unwrap_or_default();
    Ok(record.to_string())
}

/// Mark a game final in the stored schedule.
pub fn record_game_result(
    state: &mut LeagueState,
    game_id: u16,
    home_score: u16,
    away_score: u16,
) -> Result<(), ScheduleError> {
    let schedule = state
        .schedule
        .as_mut()
        .ok_or(league_core::ValidationError::UnknownGame(game_id))?;
    schedule.record_final(game_id, home_score, away_score)?;
    Ok(())
}

/// Persist the whole league under `key`.
pub fn save_league<S: KvStore + ?Sized>(store: &mut S, key: &str, state: &LeagueState) -> Result<()> {
    save_json(store, key, state).with_context(|| format!("saving league {key}"))?;
    debug!(key, season_year = state.season_year, "league saved");
    Ok(())
}

/// Load a saved league. A schedule of an older schema is kept as loaded
/// and replaced on the next [`ensure_schedule`].
pub fn load_league<S: KvStore + ?Sized>(store: &S, key: &str) -> Result<Option<LeagueState>> {
    let state: Option<LeagueState> =
        load_json(store, key).with_context(|| format!("loading league {key}"))?;
    if let Some(s) = &state {
        debug!(key, season_year = s.season_year, has_schedule = s.schedule.is_some(), "league loaded");
    }
    Ok(state)
}
