//! Read-only schedule checks. Findings are reported and logged, never
//! fixed or turned into errors.

use crate::config::SchedulerConfig;
use league_core::{LeagueGameView, Schedule, TeamCode, TeamRegistry};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{info, warn};

/// One anomaly found in a generated schedule.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ScheduleIssue {
    #[error("{0} has no schedule")]
    MissingTeam(TeamCode),
    #[error("{team} plays {games} games, expected {expected}")]
    GameCount {
        team: TeamCode,
        games: usize,
        expected: usize,
    },
    #[error("{team} has {byes} byes")]
    ByeCount { team: TeamCode, byes: usize },
    #[error("{team} rests in week {week}, outside the bye window")]
    ByeOutsideWindow { team: TeamCode, week: u8 },
    #[error("{team} plays in its bye week {week}")]
    PlaysOnBye { team: TeamCode, week: u8 },
    #[error("{team} plays {games} games in week {week}")]
    DoubleBooked { team: TeamCode, week: u8, games: usize },
    #[error("league has {games} games, expected {expected}")]
    TotalGames { games: usize, expected: usize },
    #[error("{home} hosts {away} {count} times")]
    DuplicatePairing {
        home: TeamCode,
        away: TeamCode,
        count: usize,
    },
    #[error("week {week}: {home} vs {away} missing from {team}'s list")]
    MissingTeamRow {
        team: TeamCode,
        week: u8,
        home: TeamCode,
        away: TeamCode,
    },
    #[error("week {week}: {team}'s game against {opponent} missing from the league week")]
    MissingLeagueRow {
        team: TeamCode,
        week: u8,
        opponent: TeamCode,
    },
    #[error("game {id} in week {week} has no kickoff")]
    MissingKickoff { id: u16, week: u8 },
}

/// Everything the validator found.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub issues: Vec<ScheduleIssue>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Emit each issue as a warning.
    pub fn log(&self, season_year: i32) {
        if self.is_clean() {
            info!(season_year, "schedule validated");
            return;
        }
        for issue in &self.issues {
            warn!(season_year, %issue, "schedule issue");
        }
        warn!(season_year, issues = self.issues.len(), "schedule has issues");
    }
}

fn league_has(games: &[LeagueGameView], home: &TeamCode, away: &TeamCode) -> bool {
    games.iter().any(|g| &g.home_code == home && &g.away_code == away)
}

/// Check a schedule against the league shape in `config`.
pub fn validate_schedule(
    schedule: &Schedule,
    registry: &TeamRegistry,
    config: &SchedulerConfig,
) -> ValidationReport {
    let mut issues = Vec::new();
    let expected_games = config.games_per_team as usize;

    for team in registry.teams() {
        let code = &team.code;
        let Some(rows) = schedule.team_games(code) else {
            issues.push(ScheduleIssue::MissingTeam(code.clone()));
            continue;
        };
        let games = rows.iter().filter(|r| !r.is_bye()).count();
        if games != expected_games {
            issues.push(ScheduleIssue::GameCount {
                team: code.clone(),
                games,
                expected: expected_games,
            });
        }

        let byes: Vec<u8> = rows.iter().filter(|r| r.is_bye()).map(|r| r.season_week).collect();
        if byes.len() != 1 {
            issues.push(ScheduleIssue::ByeCount {
                team: code.clone(),
                byes: byes.len(),
            });
        }
        for &week in &byes {
            if !config.in_bye_window(week) {
                issues.push(ScheduleIssue::ByeOutsideWindow {
                    team: code.clone(),
                    week,
                });
            }
        }

        let mut per_week: BTreeMap<u8, usize> = BTreeMap::new();
        for row in rows.iter().filter(|r| !r.is_bye()) {
            *per_week.entry(row.season_week).or_default() += 1;
        }
        for (&week, &n) in &per_week {
            if n > 1 {
                issues.push(ScheduleIssue::DoubleBooked {
                    team: code.clone(),
                    week,
                    games: n,
                });
            }
            if byes.contains(&week) {
                issues.push(ScheduleIssue::PlaysOnBye {
                    team: code.clone(),
                    week,
                });
            }
        }

        for row in rows.iter().filter(|r| !r.is_bye()) {
            let (home, away) = if row.is_home {
                (code, &row.opponent_code)
            } else {
                (&row.opponent_code, code)
            };
            if !league_has(schedule.week_games(row.season_week), home, away) {
                issues.push(ScheduleIssue::MissingLeagueRow {
                    team: code.clone(),
                    week: row.season_week,
                    opponent: row.opponent_code.clone(),
                });
            }
        }
    }

    let expected_total = registry.len() * expected_games / 2;
    let total = schedule.game_count();
    if total != expected_total {
        issues.push(ScheduleIssue::TotalGames {
            games: total,
            expected: expected_total,
        });
    }

    let mut pairings: BTreeMap<(&TeamCode, &TeamCode), usize> = BTreeMap::new();
    for game in schedule.games() {
        *pairings.entry((&game.home_code, &game.away_code)).or_default() += 1;

        for (team, opponent, is_home) in [
            (&game.home_code, &game.away_code, true),
            (&game.away_code, &game.home_code, false),
        ] {
            let listed = schedule.team_games(team).map_or(false, |rows| {
                rows.iter().any(|r| {
                    r.season_week == game.week && &r.opponent_code == opponent && r.is_home == is_home
                })
            });
            if !listed {
                issues.push(ScheduleIssue::MissingTeamRow {
                    team: team.clone(),
                    week: game.week,
                    home: game.home_code.clone(),
                    away: game.away_code.clone(),
                });
            }
        }

        if game.kickoff_iso.is_none() {
            issues.push(ScheduleIssue::MissingKickoff {
                id: game.id,
                week: game.week,
            });
        }
    }
    for ((home, away), count) in pairings {
        if count > 1 {
            issues.push(ScheduleIssue::DuplicatePairing {
                home: home.clone(),
                away: away.clone(),
                count,
            });
        }
    }

    ValidationReport { issues }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate_schedule_seeded;
    use league_core::{default_registry, GameType};

    fn fixture() -> (Schedule, TeamRegistry, SchedulerConfig) {
        let schedule = generate_schedule_seeded(2024, 21).unwrap();
        (schedule, default_registry(), SchedulerConfig::default())
    }

    #[test]
    fn generated_schedule_is_clean() {
        let (s, registry, config) = fixture();
        let report = validate_schedule(&s, &registry, &config);
        assert!(report.is_clean(), "{:?}", report.issues);
    }

    #[test]
    fn dropped_team_row_is_reported_both_ways() {
        let (mut s, registry, config) = fixture();
        let buf = TeamCode::new("BUF");
        let rows = s.by_team.get_mut(&buf).unwrap();
        let at = rows.iter().position(|r| !r.is_bye()).unwrap();
        let removed = rows.remove(at);

        let issues = validate_schedule(&s, &registry, &config).issues;
        assert!(issues.contains(&ScheduleIssue::GameCount {
            team: buf.clone(),
            games: 16,
            expected: 17
        }));
        assert!(issues.iter().any(|i| matches!(
            i,
            ScheduleIssue::MissingTeamRow { team, week, .. }
                if team == &buf && *week == removed.season_week
        )));
    }

    #[test]
    fn bye_week_game_and_duplicates_are_reported() {
        let (mut s, registry, config) = fixture();
        let buf = TeamCode::new("BUF");
        let bye = s.bye_week(&buf).unwrap();
        let mut extra = s
            .games()
            .find(|g| g.home_code == buf)
            .cloned()
            .unwrap();
        extra.week = bye;
        extra.id = 999;
        s.by_week.get_mut(&bye).unwrap().push(extra.clone());
        let mut row = s
            .team_games(&buf)
            .unwrap()
            .iter()
            .find(|r| r.opponent_code == extra.away_code && r.is_home)
            .cloned()
            .unwrap();
        row.season_week = bye;
        s.by_team.get_mut(&buf).unwrap().push(row);

        let issues = validate_schedule(&s, &registry, &config).issues;
        assert!(issues.contains(&ScheduleIssue::PlaysOnBye {
            team: buf.clone(),
            week: bye
        }));
        assert!(issues.contains(&ScheduleIssue::TotalGames {
            games: 273,
            expected: 272
        }));
        assert!(issues.iter().any(|i| matches!(
            i,
            ScheduleIssue::DuplicatePairing { home, count: 2, .. } if home == &buf
        )));
    }

    #[test]
    fn bye_outside_window_and_missing_kickoff() {
        let (mut s, registry, config) = fixture();
        let mia = TeamCode::new("MIA");
        for row in s.by_team.get_mut(&mia).unwrap() {
            if row.game_type == GameType::Bye {
                row.season_week = 2;
            }
        }
        let game = s.by_week.get_mut(&1).unwrap().first_mut().unwrap();
        game.kickoff_iso = None;
        let id = game.id;

        let issues = validate_schedule(&s, &registry, &config).issues;
        assert!(issues.contains(&ScheduleIssue::ByeOutsideWindow { team: mia, week: 2 }));
        assert!(issues.contains(&ScheduleIssue::MissingKickoff { id, week: 1 }));
    }

    #[test]
    fn issues_render_readably() {
        let issue = ScheduleIssue::DoubleBooked {
            team: TeamCode::new("KC"),
            week: 3,
            games: 2,
        };
        assert_eq!(issue.to_string(), "KC plays 2 games in week 3");
    }
}
