use crate::ScheduleError;
use league_core::TeamCode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Simulated-annealing tuning constants for the week assignment engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnealingConfig {
    /// Move attempts per restart.
    pub max_iterations: u64,
    pub initial_temperature: f64,
    /// Geometric decay applied after every attempt.
    pub cooling_rate: f64,
    pub min_temperature: f64,
    /// Energy per unit of team-week excess.
    pub conflict_penalty: f64,
    /// Probability of aiming a move at one of the team's open weeks.
    pub hole_bias: f64,
    /// Iterations between full cost recomputations.
    pub check_interval: u64,
    /// Fresh initial assignments tried after an exhausted run.
    pub max_restarts: u32,
}

impl Default for AnnealingConfig {
    fn default() -> Self {
        Self {
            max_iterations: 300_000,
            initial_temperature: 5.0,
            cooling_rate: 0.9995,
            min_temperature: 0.25,
            conflict_penalty: 10.0,
            hole_bias: 0.8,
            check_interval: 2_000,
            max_restarts: 4,
        }
    }
}

/// Scheduler configuration. Every field has a default so partial YAML
/// files only need to name what they change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub weeks: u8,
    pub games_per_team: u8,
    /// First week a bye may fall in.
    pub bye_window_start: u8,
    /// Byes per window week, starting at `bye_window_start`.
    pub bye_distribution: Vec<u8>,
    /// Franchises hosting the holiday games, early slot first.
    pub holiday_anchors: Vec<TeamCode>,
    /// Hosts pushed towards the late Sunday window.
    pub late_hosts: Vec<TeamCode>,
    pub late_window_probability: f64,
    pub international_weeks: (u8, u8),
    pub international_probability: f64,
    pub max_international_games: u8,
    pub late_division_clustering: bool,
    pub late_cluster_weeks: u8,
    pub annealing: AnnealingConfig,
}

fn codes(list: &[&str]) -> Vec<TeamCode> {
    list.iter().map(|c| TeamCode::new(c)).collect()
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            weeks: 18,
            games_per_team: 17,
            bye_window_start: 5,
            bye_distribution: vec![2, 4, 4, 4, 4, 4, 4, 2, 2, 2],
            holiday_anchors: codes(&["DET", "DAL"]),
            late_hosts: codes(&["ARI", "DEN", "LAC", "LAR", "LV", "SEA", "SF"]),
            late_window_probability: 0.7,
            international_weeks: (4, 10),
            international_probability: 0.3,
            max_international_games: 5,
            late_division_clustering: true,
            late_cluster_weeks: 4,
            annealing: AnnealingConfig::default(),
        }
    }
}

impl SchedulerConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ScheduleError> {
        let config: SchedulerConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ScheduleError> {
        let text = fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Last week a bye may fall in.
    pub fn bye_window_end(&self) -> u8 {
        let len = self.bye_distribution.len() as u8;
        self.bye_window_start.saturating_add(len.saturating_sub(1))
    }

    /// True when `week` lies inside the bye window.
    pub fn in_bye_window(&self, week: u8) -> bool {
        (self.bye_window_start..=self.bye_window_end()).contains(&week)
    }

    pub fn is_late_host(&self, code: &TeamCode) -> bool {
        self.late_hosts.contains(code)
    }

    /// Check the shape constraints generation relies on. `teams` is the
    /// registry size the distribution must cover.
    pub fn validate_for(&self, teams: usize) -> Result<(), ScheduleError> {
        let invalid = |msg: String| Err(ScheduleError::InvalidConfig(msg));
        if self.weeks == 0 || self.games_per_team == 0 || self.games_per_team >= self.weeks {
            return invalid(format!(
                "{} games cannot fit {} weeks with a bye",
                self.games_per_team, self.weeks
            ));
        }
        if self.bye_distribution.is_empty()
            || self.bye_window_start == 0
            || self.bye_window_end() > self.weeks
        {
            return invalid("bye window must lie inside the season".to_string());
        }
        if self.bye_distribution.iter().any(|n| n % 2 != 0) {
            return invalid("bye counts must be even so every week pairs up".to_string());
        }
        for p in [
            self.late_window_probability,
            self.international_probability,
            self.annealing.hole_bias,
        ] {
            if !(0.0..=1.0).contains(&p) {
                return invalid(format!("probability {p} outside [0, 1]"));
            }
        }
        let a = &self.annealing;
        if !(a.cooling_rate > 0.0 && a.cooling_rate <= 1.0)
            || a.initial_temperature <= 0.0
            || a.min_temperature <= 0.0
            || a.conflict_penalty <= 0.0
        {
            return invalid("annealing constants must be positive".to_string());
        }
        if a.max_iterations == 0 || a.check_interval == 0 {
            return invalid("annealing budget must be positive".to_string());
        }
        let total: usize = self.bye_distribution.iter().map(|&n| n as usize).sum();
        if total != teams {
            return Err(ScheduleError::ByeDistribution {
                expected: teams,
                actual: total,
            });
        }
        Ok(())
    }

    /// Bye counts per window week adjusted to cover exactly `teams`: the
    /// fullest weeks give up byes first, the emptiest take extras first.
    pub fn bye_distribution_for(&self, teams: usize) -> Vec<u8> {
        let mut counts = self.bye_distribution.clone();
        if counts.is_empty() {
            return counts;
        }
        let mut total: usize = counts.iter().map(|&n| n as usize).sum();
        while total > teams {
            let Some(fullest) = (0..counts.len()).max_by_key(|&i| counts[i]) else {
                break;
            };
            counts[fullest] -= 1;
            total -= 1;
        }
        while total < teams {
            let Some(emptiest) = (0..counts.len()).min_by_key(|&i| counts[i]) else {
                break;
            };
            counts[emptiest] = counts[emptiest].saturating_add(1);
            total += 1;
        }
        counts
    }

    /// Validate against the standard 32-team league.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        self.validate_for(32)
    }
}
