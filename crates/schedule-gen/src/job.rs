//! Generation pipeline as a resumable job.

use crate::byes::{allocate_byes, bye_map};
use crate::calendar;
use crate::config::SchedulerConfig;
use crate::manifest::build_manifest;
use crate::slots::assign_slots;
use crate::solver::{choose_anchor_games, SolveStatus, WeekSolver};
use crate::validate::{validate_schedule, ValidationReport};
use crate::ScheduleError;
use chrono::NaiveDate;
use league_core::{
    validate_registry, validate_season_year, GameType, ManifestEntry, PlacedGame, Schedule,
    TeamCode, TeamRegistry, ValidationError,
};
use rand::Rng;
use tracing::{info, warn};

/// One season's generation, split so the week assignment can be advanced
/// in batches between other work.
///
/// Setup (manifest, byes, anchor locks) happens in [`new`](Self::new), the
/// annealing in [`step`](Self::step), and slotting and view building in
/// [`finish`](Self::finish). Feeding the same random stream gives the same
/// schedule however the batches are sized.
pub struct GenerationJob {
    season_year: i32,
    registry: TeamRegistry,
    config: SchedulerConfig,
    season_start: NaiveDate,
    holiday_week: Option<u8>,
    manifest: Vec<ManifestEntry>,
    byes: Vec<u8>,
    solver: WeekSolver,
}

impl GenerationJob {
    pub fn new<R: Rng + ?Sized>(
        season_year: i32,
        registry: &TeamRegistry,
        config: &SchedulerConfig,
        rng: &mut R,
    ) -> Result<Self, ScheduleError> {
        validate_season_year(season_year)?;
        let malformed = match validate_registry(registry) {
            Ok(()) => false,
            Err(ValidationError::DivisionSize {
                conference,
                division,
                size,
            }) => {
                warn!(?conference, ?division, size, "generating for a malformed registry");
                true
            }
            Err(e) => return Err(e.into()),
        };
        let mut config = config.clone();
        match config.validate_for(registry.len()) {
            Ok(()) => {}
            Err(ScheduleError::ByeDistribution { expected, actual }) if malformed => {
                warn!(expected, actual, "fitting bye distribution to the registry");
                config.bye_distribution = config.bye_distribution_for(registry.len());
            }
            Err(e) => return Err(e),
        }
        let season_start = calendar::season_start(season_year)
            .ok_or_else(|| ScheduleError::InvalidConfig(format!("no calendar for {season_year}")))?;

        let manifest = build_manifest(registry, season_year, config.games_per_team);
        let holiday_week = calendar::holiday_week(season_year, config.weeks);
        if holiday_week.is_none() {
            warn!(season_year, "season does not reach the holiday week");
        }
        let byes = allocate_byes(registry, &config, holiday_week, rng)?;

        let mut games = Vec::with_capacity(manifest.len());
        for entry in &manifest {
            let index = |code: &TeamCode| {
                registry
                    .index_of(code)
                    .ok_or_else(|| ScheduleError::UnknownTeam(code.to_string()))
            };
            games.push([index(&entry.home)?, index(&entry.away)?]);
        }
        let mut solver = WeekSolver::new(
            registry.len(),
            config.weeks,
            games,
            &byes,
            config.annealing.clone(),
        );
        if let Some(week) = holiday_week {
            let anchors =
                choose_anchor_games(&manifest, registry, &config.holiday_anchors, &byes, week, rng)?;
            for (_, game) in anchors {
                solver.lock(game, week);
            }
        }

        info!(season_year, games = manifest.len(), ?holiday_week, "schedule generation started");
        Ok(Self {
            season_year,
            registry: registry.clone(),
            config,
            season_start,
            holiday_week,
            manifest,
            byes,
            solver,
        })
    }

    pub fn season_year(&self) -> i32 {
        self.season_year
    }

    /// Run up to `batch` annealing attempts.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R, batch: u64) -> SolveStatus {
        self.solver.advance(rng, batch)
    }

    pub fn status(&self) -> SolveStatus {
        self.solver.status()
    }

    /// Attempts spent so far and the current conflict count.
    pub fn progress(&self) -> (u64, u32) {
        (self.solver.iterations(), self.solver.cost())
    }

    /// Complete any remaining annealing, then slot, build and validate the
    /// schedule. Residual conflicts are logged and the best assignment is
    /// published as is.
    pub fn finish<R: Rng + ?Sized>(self, rng: &mut R) -> Schedule {
        self.finish_with_report(rng).0
    }

    /// [`finish`](Self::finish), also returning the validator's findings.
    pub fn finish_with_report<R: Rng + ?Sized>(mut self, rng: &mut R) -> (Schedule, ValidationReport) {
        self.solver.solve(rng);
        for conflict in self.solver.conflicts() {
            let team = &self.registry.teams()[conflict.team].code;
            let games: Vec<u16> = conflict.games.iter().map(|&g| self.manifest[g].id).collect();
            warn!(
                %team,
                week = conflict.week,
                on_bye = conflict.on_bye,
                ?games,
                "unresolved week conflict"
            );
        }

        if self.config.late_division_clustering {
            let is_division: Vec<bool> = self
                .manifest
                .iter()
                .map(|e| e.game_type == GameType::Division)
                .collect();
            self.solver
                .cluster_late_division_games(&is_division, self.config.late_cluster_weeks);
        }

        let weeks = self.solver.assignment();
        let mut placed: Vec<PlacedGame> = self
            .manifest
            .into_iter()
            .zip(weeks)
            .map(|(entry, week)| PlacedGame::unplayed(entry, week))
            .collect();
        assign_slots(
            &mut placed,
            &self.config,
            self.season_start,
            self.holiday_week,
            rng,
        );

        let byes = bye_map(&self.registry, &self.byes);
        let schedule = Schedule::from_placed(
            self.season_year,
            self.config.weeks,
            &self.registry,
            &placed,
            &byes,
        );
        let report = validate_schedule(&schedule, &self.registry, &self.config);
        report.log(self.season_year);
        info!(
            season_year = self.season_year,
            games = schedule.game_count(),
            iterations = self.solver.iterations(),
            "schedule generation finished"
        );
        (schedule, report)
    }
}
