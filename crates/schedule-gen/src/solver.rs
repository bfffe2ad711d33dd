//! Week assignment engine.
//!
//! Games are placed into weeks by simulated annealing over a team-week load
//! matrix. A team is expected to play once per week, or not at all in its
//! bye week; the cost is the total excess over that expectation. Moves
//! exchange games between two weeks along an alternating chain so that a
//! single relocation never strands the teams it displaces. A chain that
//! would land any game in a bye week is rejected outright.
//!
//! The session is driven in budgets through [`WeekSolver::advance`]; the
//! random stream is consumed identically however the budget is split.

use crate::config::AnnealingConfig;
use crate::ScheduleError;
use league_core::{ManifestEntry, TeamCode, TeamRegistry};
use rand::seq::SliceRandom;
use rand::Rng;
use std::cmp::Reverse;
use tracing::{debug, info, warn};

/// Progress of a solver session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolveStatus {
    Running,
    /// Every team-week matches its expected load.
    Solved,
    /// Budget and restarts spent; the best assignment seen is kept.
    Exhausted,
}

/// A team-week carrying more games than expected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conflict {
    pub team: usize,
    /// Season week, 1-based.
    pub week: u8,
    /// Indices of the games booked for the team that week.
    pub games: Vec<usize>,
    /// The week is the team's bye.
    pub on_bye: bool,
}

/// One pending relocation: `(game, from_week, to_week)`.
type Move = (usize, usize, usize);

/// Annealing session over one season. Weeks are 0-based internally.
#[derive(Clone, Debug)]
pub struct WeekSolver {
    config: AnnealingConfig,
    teams: usize,
    weeks: usize,
    /// `[home, away]` registry indices per game.
    games: Vec<[usize; 2]>,
    byes: Vec<Option<usize>>,
    locked: Vec<Option<usize>>,
    week_of: Vec<usize>,
    /// Games per team-week cell, `team * weeks + week`.
    cells: Vec<Vec<usize>>,
    /// Cells with positive excess, plus each cell's slot in that list.
    excess: Vec<usize>,
    excess_pos: Vec<Option<usize>>,
    cost: u32,
    temperature: f64,
    iteration: u64,
    total_iterations: u64,
    restarts: u32,
    seeded: bool,
    best: Option<(u32, Vec<usize>)>,
    status: SolveStatus,
}

impl WeekSolver {
    /// `byes` holds each team's 1-based bye week (0 for none).
    pub fn new(
        teams: usize,
        weeks: u8,
        games: Vec<[usize; 2]>,
        byes: &[u8],
        config: AnnealingConfig,
    ) -> Self {
        let weeks = weeks as usize;
        let game_count = games.len();
        let byes = (0..teams)
            .map(|t| {
                byes.get(t)
                    .and_then(|w| (*w as usize).checked_sub(1))
                    .filter(|w| *w < weeks)
            })
            .collect();
        Self {
            temperature: config.initial_temperature,
            config,
            teams,
            weeks,
            games,
            byes,
            locked: vec![None; game_count],
            week_of: vec![0; game_count],
            cells: vec![Vec::new(); teams * weeks],
            excess: Vec::new(),
            excess_pos: vec![None; teams * weeks],
            cost: 0,
            iteration: 0,
            total_iterations: 0,
            restarts: 0,
            seeded: false,
            best: None,
            status: SolveStatus::Running,
        }
    }

    /// Pin a game to a 1-based week for the whole session. Must be called
    /// before the first [`advance`](Self::advance).
    pub fn lock(&mut self, game: usize, week: u8) {
        if let Some(w) = (week as usize).checked_sub(1).filter(|w| *w < self.weeks) {
            self.locked[game] = Some(w);
        }
    }

    pub fn status(&self) -> SolveStatus {
        self.status
    }

    /// Current total excess.
    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub fn iterations(&self) -> u64 {
        self.total_iterations
    }

    pub fn restarts(&self) -> u32 {
        self.restarts
    }

    /// 1-based week per game.
    pub fn assignment(&self) -> Vec<u8> {
        self.week_of.iter().map(|&w| w as u8 + 1).collect()
    }

    /// Run to completion.
    pub fn solve<R: Rng + ?Sized>(&mut self, rng: &mut R) -> SolveStatus {
        self.advance(rng, u64::MAX)
    }

    /// Run at most `budget` move attempts.
    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R, budget: u64) -> SolveStatus {
        let mut spent = 0;
        while self.status == SolveStatus::Running && spent < budget {
            if !self.seeded {
                self.seed_initial(rng);
            }
            if self.cost == 0 {
                self.status = SolveStatus::Solved;
                info!(
                    iterations = self.total_iterations,
                    restarts = self.restarts,
                    "week assignment solved"
                );
                break;
            }
            if self.iteration >= self.config.max_iterations {
                self.end_attempt();
                continue;
            }

            self.step(rng);
            self.iteration += 1;
            self.total_iterations += 1;
            spent += 1;
            self.temperature =
                (self.temperature * self.config.cooling_rate).max(self.config.min_temperature);

            if self.iteration % self.config.check_interval == 0 {
                let actual = self.total_cost();
                if actual != self.cost {
                    warn!(tracked = self.cost, actual, "solver cost drifted");
                    self.cost = actual;
                }
                debug!(
                    restart = self.restarts,
                    iteration = self.iteration,
                    cost = self.cost,
                    temperature = self.temperature,
                    "annealing progress"
                );
            }
        }
        self.status
    }

    /// Team-weeks still over their expected load.
    pub fn conflicts(&self) -> Vec<Conflict> {
        let mut out = Vec::new();
        for team in 0..self.teams {
            for week in 0..self.weeks {
                let cell = self.cell(team, week);
                if self.excess_of(cell) > 0 {
                    out.push(Conflict {
                        team,
                        week: week as u8 + 1,
                        games: self.cells[cell].clone(),
                        on_bye: self.byes[team] == Some(week),
                    });
                }
            }
        }
        out
    }

    fn cell(&self, team: usize, week: usize) -> usize {
        team * self.weeks + week
    }

    fn expected(&self, cell: usize) -> usize {
        let (team, week) = (cell / self.weeks, cell % self.weeks);
        if self.byes[team] == Some(week) {
            0
        } else {
            1
        }
    }

    fn excess_of(&self, cell: usize) -> u32 {
        self.cells[cell].len().saturating_sub(self.expected(cell)) as u32
    }

    fn total_cost(&self) -> u32 {
        (0..self.cells.len()).map(|c| self.excess_of(c)).sum()
    }

    /// Keep the excess list in step with one cell's load.
    fn refresh(&mut self, cell: usize) {
        let over = self.excess_of(cell) > 0;
        match (over, self.excess_pos[cell]) {
            (true, None) => {
                self.excess_pos[cell] = Some(self.excess.len());
                self.excess.push(cell);
            }
            (false, Some(i)) => {
                self.excess.swap_remove(i);
                if let Some(&moved) = self.excess.get(i) {
                    self.excess_pos[moved] = Some(i);
                }
                self.excess_pos[cell] = None;
            }
            _ => {}
        }
    }

    fn place(&mut self, game: usize, week: usize) {
        self.week_of[game] = week;
        for team in self.games[game] {
            let cell = self.cell(team, week);
            self.cells[cell].push(game);
            self.refresh(cell);
        }
    }

    fn unplace(&mut self, game: usize) {
        let week = self.week_of[game];
        for team in self.games[game] {
            let cell = self.cell(team, week);
            if let Some(i) = self.cells[cell].iter().position(|&g| g == game) {
                self.cells[cell].swap_remove(i);
            }
            self.refresh(cell);
        }
    }

    fn relocate(&mut self, game: usize, week: usize) {
        self.unplace(game);
        self.place(game, week);
    }

    fn clear(&mut self) {
        self.cells.iter_mut().for_each(Vec::clear);
        self.excess.clear();
        self.excess_pos.iter_mut().for_each(|p| *p = None);
    }

    /// Rebuild the load matrix from `week_of`.
    fn rebuild(&mut self) {
        self.clear();
        for game in 0..self.games.len() {
            let week = self.week_of[game];
            self.place(game, week);
        }
        self.cost = self.total_cost();
    }

    /// Greedy packing: locked games first, then the rest in random order
    /// into the least-loaded week with room that is not a bye for either
    /// side. Conflicts are allowed.
    fn seed_initial<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.clear();
        let mut capacity: Vec<usize> = (0..self.weeks)
            .map(|w| {
                let resting = self.byes.iter().filter(|b| **b == Some(w)).count();
                self.teams.saturating_sub(resting) / 2
            })
            .collect();

        let mut free = Vec::new();
        for game in 0..self.games.len() {
            match self.locked[game] {
                Some(week) => {
                    self.place(game, week);
                    capacity[week] = capacity[week].saturating_sub(1);
                }
                None => free.push(game),
            }
        }
        free.shuffle(rng);

        for game in free {
            let [home, away] = self.games[game];
            let open = |w: usize| self.byes[home] != Some(w) && self.byes[away] != Some(w);
            let mut candidates: Vec<usize> =
                (0..self.weeks).filter(|&w| capacity[w] > 0 && open(w)).collect();
            if candidates.is_empty() {
                candidates = (0..self.weeks).filter(|&w| capacity[w] > 0).collect();
            }
            if candidates.is_empty() {
                candidates = (0..self.weeks).collect();
            }
            let load = |w: usize| {
                self.cells[self.cell(home, w)].len() + self.cells[self.cell(away, w)].len()
            };
            let lightest = candidates.iter().map(|&w| load(w)).min().unwrap_or(0);
            candidates.retain(|&w| load(w) == lightest);
            let week = candidates.choose(rng).copied().unwrap_or(0);
            self.place(game, week);
            capacity[week] = capacity[week].saturating_sub(1);
        }

        self.cost = self.total_cost();
        self.temperature = self.config.initial_temperature;
        self.iteration = 0;
        self.seeded = true;
        debug!(restart = self.restarts, cost = self.cost, "seeded initial assignment");
    }

    fn pick_target<R: Rng + ?Sized>(&self, team: usize, from: usize, rng: &mut R) -> Option<usize> {
        if rng.gen_bool(self.config.hole_bias) {
            let holes: Vec<usize> = (0..self.weeks)
                .filter(|&w| {
                    let cell = self.cell(team, w);
                    w != from && self.cells[cell].len() < self.expected(cell)
                })
                .collect();
            if let Some(&week) = holes.choose(rng) {
                return Some(week);
            }
        }
        let options: Vec<usize> = (0..self.weeks)
            .filter(|&w| w != from && self.byes[team] != Some(w))
            .collect();
        options.choose(rng).copied()
    }

    /// Moving `seed` from `from` to `to` displaces every game its teams
    /// already play in `to`; those go back to `from`, and so on until the
    /// chain closes. `None` when the chain reaches a locked game or would
    /// put a game into a bye week of either side.
    fn chain(&self, seed: usize, from: usize, to: usize) -> Option<Vec<Move>> {
        let mut chain = vec![(seed, from, to)];
        let mut i = 0;
        while i < chain.len() {
            let (game, src, tgt) = chain[i];
            if self.games[game].iter().any(|&t| self.byes[t] == Some(tgt)) {
                return None;
            }
            for team in self.games[game] {
                for &other in &self.cells[self.cell(team, tgt)] {
                    if chain.iter().any(|&(g, _, _)| g == other) {
                        continue;
                    }
                    if self.locked[other].is_some() {
                        return None;
                    }
                    chain.push((other, tgt, src));
                }
            }
            i += 1;
        }
        Some(chain)
    }

    fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.excess.is_empty() {
            return;
        }
        let cell = self.excess[rng.gen_range(0..self.excess.len())];
        let (team, from) = (cell / self.weeks, cell % self.weeks);
        let movable: Vec<usize> = self.cells[cell]
            .iter()
            .copied()
            .filter(|&g| self.locked[g].is_none())
            .collect();
        if movable.is_empty() {
            return;
        }
        let Some(to) = self.pick_target(team, from, rng) else {
            return;
        };
        let seed = movable[rng.gen_range(0..movable.len())];
        let Some(chain) = self.chain(seed, from, to) else {
            return;
        };

        let mut touched: Vec<usize> = chain
            .iter()
            .flat_map(|&(g, src, tgt)| {
                self.games[g]
                    .into_iter()
                    .flat_map(move |t| [(t, src), (t, tgt)])
            })
            .map(|(t, w)| self.cell(t, w))
            .collect();
        touched.sort_unstable();
        touched.dedup();

        let before: u32 = touched.iter().map(|&c| self.excess_of(c)).sum();
        for &(game, _, tgt) in &chain {
            self.relocate(game, tgt);
        }
        let after: u32 = touched.iter().map(|&c| self.excess_of(c)).sum();
        let delta = i64::from(after) - i64::from(before);

        let accept = delta <= 0 || {
            let energy = delta as f64 * self.config.conflict_penalty;
            rng.gen::<f64>() < (-energy / self.temperature).exp()
        };
        if accept {
            self.cost = (i64::from(self.cost) + delta).max(0) as u32;
        } else {
            for &(game, src, _) in &chain {
                self.relocate(game, src);
            }
        }
    }

    fn end_attempt(&mut self) {
        let better = self.best.as_ref().map_or(true, |(c, _)| self.cost < *c);
        if better {
            self.best = Some((self.cost, self.week_of.clone()));
        }
        if self.restarts >= self.config.max_restarts {
            if let Some((cost, weeks)) = self.best.take() {
                if cost < self.cost {
                    self.week_of = weeks;
                    self.rebuild();
                }
            }
            self.status = SolveStatus::Exhausted;
            warn!(
                cost = self.cost,
                iterations = self.total_iterations,
                "week assignment exhausted its budget"
            );
        } else {
            self.restarts += 1;
            self.seeded = false;
            debug!(restart = self.restarts, cost = self.cost, "restarting annealing");
        }
    }

    /// Move division games towards the end of the season.
    ///
    /// Only weeks without byes or locked games in which every team plays
    /// exactly once take part. They are first reordered so the weeks with
    /// the most division games come last, then for each early/late pair the
    /// alternating cycles of their two matchings are exchanged whenever that
    /// carries more division games late. Returns the number of games moved.
    pub fn cluster_late_division_games(&mut self, is_division: &[bool], late_weeks: u8) -> usize {
        let full: Vec<usize> = (0..self.weeks)
            .filter(|&w| {
                self.byes.iter().all(|b| *b != Some(w))
                    && self.locked.iter().all(|l| *l != Some(w))
                    && (0..self.teams).all(|t| self.cells[self.cell(t, w)].len() == 1)
            })
            .collect();
        let late = (late_weeks as usize).min(full.len());
        if late == 0 || late == full.len() {
            return 0;
        }
        let split = full.len() - late;

        let mut division_games = vec![0usize; self.weeks];
        for (game, &week) in self.week_of.iter().enumerate() {
            if is_division.get(game).copied().unwrap_or(false) {
                division_games[week] += 1;
            }
        }
        let mut ranked = full.clone();
        ranked.sort_by_key(|&w| (Reverse(division_games[w]), w));
        let mut late_src = ranked[..late].to_vec();
        let mut early_src = ranked[late..].to_vec();
        late_src.sort_unstable();
        early_src.sort_unstable();

        let mut remap: Vec<usize> = (0..self.weeks).collect();
        for (&src, &dst) in early_src.iter().zip(&full[..split]) {
            remap[src] = dst;
        }
        for (&src, &dst) in late_src.iter().zip(&full[split..]) {
            remap[src] = dst;
        }
        let mut moved = self.week_of.iter().filter(|&&w| remap[w] != w).count();
        for week in &mut self.week_of {
            *week = remap[*week];
        }
        self.rebuild();

        for &early_week in &full[..split] {
            for &late_week in &full[split..] {
                moved += self.exchange_cycles(early_week, late_week, is_division);
            }
        }
        debug!(moved, "clustered division games late");
        moved
    }

    fn sole_game(&self, team: usize, week: usize) -> Option<usize> {
        self.cells[self.cell(team, week)].first().copied()
    }

    fn exchange_cycles(&mut self, early: usize, late: usize, is_division: &[bool]) -> usize {
        let division = |g: usize| is_division.get(g).copied().unwrap_or(false);
        let mut seen = vec![false; self.teams];
        let mut moved = 0;
        for start in 0..self.teams {
            if seen[start] {
                continue;
            }
            let (mut in_early, mut in_late) = (Vec::new(), Vec::new());
            let mut team = start;
            let closed = loop {
                seen[team] = true;
                let Some(a) = self.sole_game(team, early) else { break false };
                let [h, w] = self.games[a];
                let mate = if h == team { w } else { h };
                seen[mate] = true;
                in_early.push(a);
                let Some(b) = self.sole_game(mate, late) else { break false };
                let [h, w] = self.games[b];
                team = if h == mate { w } else { h };
                in_late.push(b);
                if team == start {
                    break true;
                }
                if seen[team] {
                    break false;
                }
            };
            if !closed {
                continue;
            }
            let gain = in_early.iter().filter(|&&g| division(g)).count();
            let loss = in_late.iter().filter(|&&g| division(g)).count();
            if gain > loss {
                for &g in &in_early {
                    self.relocate(g, late);
                }
                for &g in &in_late {
                    self.relocate(g, early);
                }
                moved += in_early.len() + in_late.len();
            }
        }
        moved
    }
}

/// Pick the holiday-week home game of each anchor franchise, returned as
/// `(anchor, manifest index)` in anchor order.
///
/// The opponent must play that week and must not be another anchor or an
/// opponent already chosen. An anchor without a candidate is logged and
/// left unlocked.
pub fn choose_anchor_games<R: Rng + ?Sized>(
    manifest: &[ManifestEntry],
    registry: &TeamRegistry,
    anchors: &[TeamCode],
    byes: &[u8],
    holiday_week: u8,
    rng: &mut R,
) -> Result<Vec<(TeamCode, usize)>, ScheduleError> {
    let mut chosen: Vec<(TeamCode, usize)> = Vec::new();
    for anchor in anchors {
        if !registry.contains(anchor) {
            return Err(ScheduleError::UnknownTeam(anchor.to_string()));
        }
        let candidates: Vec<usize> = manifest
            .iter()
            .enumerate()
            .filter(|(_, e)| &e.home == anchor && !anchors.contains(&e.away))
            .filter(|(_, e)| {
                registry
                    .index_of(&e.away)
                    .map_or(false, |i| byes.get(i) != Some(&holiday_week))
            })
            .filter(|(_, e)| chosen.iter().all(|(_, g)| manifest[*g].away != e.away))
            .map(|(i, _)| i)
            .collect();
        match candidates.choose(rng) {
            Some(&game) => {
                debug!(%anchor, opponent = %manifest[game].away, week = holiday_week, "locked holiday game");
                chosen.push((anchor.clone(), game));
            }
            None => warn!(%anchor, "no eligible holiday opponent"),
        }
    }
    Ok(chosen)
}
