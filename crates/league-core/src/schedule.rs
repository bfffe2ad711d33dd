use crate::{
    GameStatus, GameType, PlacedGame, TeamCode, TeamRegistry, TimeSlot, ValidationError,
};
use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Version of the persisted schedule shape. Stored schedules with another
/// version are discarded and regenerated.
pub const SCHEMA_VERSION: u32 = 3;

/// Opponent code used on bye rows.
pub const BYE_CODE: &str = "BYE";

/// One row of a team's season, seen from that team.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamGameView {
    /// Position in the team's week-ordered list, bye row included.
    pub index: usize,
    pub season_week: u8,
    pub team_code: TeamCode,
    pub opponent_code: TeamCode,
    pub is_home: bool,
    #[serde(rename = "type")]
    pub game_type: GameType,
    pub kickoff_iso: Option<String>,
    pub status: GameStatus,
    pub team_score: Option<u16>,
    pub opponent_score: Option<u16>,
}

impl TeamGameView {
    pub fn is_bye(&self) -> bool {
        self.game_type == GameType::Bye
    }
}

/// One game of a league week.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueGameView {
    pub id: u16,
    pub week: u8,
    pub home_code: TeamCode,
    pub away_code: TeamCode,
    #[serde(rename = "type")]
    pub game_type: GameType,
    pub slot: Option<TimeSlot>,
    pub kickoff_iso: Option<String>,
    pub status: GameStatus,
    pub home_score: Option<u16>,
    pub away_score: Option<u16>,
}

/// Published season schedule: two projections of the same placed games.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub season_year: i32,
    pub schema_version: u32,
    pub by_team: BTreeMap<TeamCode, Vec<TeamGameView>>,
    pub by_week: BTreeMap<u8, Vec<LeagueGameView>>,
}

/// Serialize a kickoff as an absolute UTC timestamp, e.g. `2024-09-13T00:15:00.000Z`.
pub fn kickoff_iso(kickoff: &DateTime<FixedOffset>) -> String {
    kickoff
        .with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl Schedule {
    /// Build both views from placed games and the bye map.
    ///
    /// Every week `1..=weeks` gets a `by_week` key even when empty, and
    /// every registry team gets a `by_team` list ordered by week.
    pub fn from_placed(
        season_year: i32,
        weeks: u8,
        registry: &TeamRegistry,
        games: &[PlacedGame],
        byes: &BTreeMap<TeamCode, u8>,
    ) -> Self {
        let mut by_week: BTreeMap<u8, Vec<LeagueGameView>> =
            (1..=weeks).map(|w| (w, Vec::new())).collect();
        let mut by_team: BTreeMap<TeamCode, Vec<TeamGameView>> = registry
            .teams()
            .iter()
            .map(|t| (t.code.clone(), Vec::new()))
            .collect();

        let mut ordered: Vec<&PlacedGame> = games.iter().collect();
        ordered.sort_by_key(|g| (g.week, g.kickoff, g.entry.id));

        for g in ordered {
            let iso = g.kickoff.as_ref().map(kickoff_iso);
            by_week.entry(g.week).or_default().push(LeagueGameView {
                id: g.entry.id,
                week: g.week,
                home_code: g.entry.home.clone(),
                away_code: g.entry.away.clone(),
                game_type: g.entry.game_type,
                slot: g.slot,
                kickoff_iso: iso.clone(),
                status: g.status,
                home_score: g.home_score,
                away_score: g.away_score,
            });
            for (team, opponent, is_home, score, opp_score) in [
                (&g.entry.home, &g.entry.away, true, g.home_score, g.away_score),
                (&g.entry.away, &g.entry.home, false, g.away_score, g.home_score),
            ] {
                by_team.entry(team.clone()).or_default().push(TeamGameView {
                    index: 0,
                    season_week: g.week,
                    team_code: team.clone(),
                    opponent_code: opponent.clone(),
                    is_home,
                    game_type: g.entry.game_type,
                    kickoff_iso: iso.clone(),
                    status: g.status,
                    team_score: score,
                    opponent_score: opp_score,
                });
            }
        }

        for (team, week) in byes {
            by_team.entry(team.clone()).or_default().push(TeamGameView {
                index: 0,
                season_week: *week,
                team_code: team.clone(),
                opponent_code: TeamCode::new(BYE_CODE),
                is_home: false,
                game_type: GameType::Bye,
                kickoff_iso: None,
                status: GameStatus::Scheduled,
                team_score: None,
                opponent_score: None,
            });
        }

        for rows in by_team.values_mut() {
            // Stable: a double-booked week keeps kickoff order.
            rows.sort_by_key(|r| r.season_week);
            for (i, row) in rows.iter_mut().enumerate() {
                row.index = i;
            }
        }

        Self {
            season_year,
            schema_version: SCHEMA_VERSION,
            by_team,
            by_week,
        }
    }

    pub fn team_games(&self, code: &TeamCode) -> Option<&[TeamGameView]> {
        self.by_team.get(code).map(Vec::as_slice)
    }

    pub fn week_games(&self, week: u8) -> &[LeagueGameView] {
        self.by_week.get(&week).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every league game across all weeks.
    pub fn games(&self) -> impl Iterator<Item = &LeagueGameView> {
        self.by_week.values().flatten()
    }

    pub fn game_count(&self) -> usize {
        self.by_week.values().map(Vec::len).sum()
    }

    pub fn bye_week(&self, code: &TeamCode) -> Option<u8> {
        self.by_team
            .get(code)?
            .iter()
            .find(|r| r.is_bye())
            .map(|r| r.season_week)
    }

    /// Mark a game final in both views. Nothing changes unless the league
    /// row and both team rows are found.
    pub fn record_final(
        &mut self,
        game_id: u16,
        home_score: u16,
        away_score: u16,
    ) -> Result<(), ValidationError> {
        let (week, at) = self
            .by_week
            .iter()
            .find_map(|(&week, games)| games.iter().position(|g| g.id == game_id).map(|i| (week, i)))
            .ok_or(ValidationError::UnknownGame(game_id))?;
        let (home, away) = {
            let game = &self.by_week[&week][at];
            (game.home_code.clone(), game.away_code.clone())
        };

        let row_of = |team: &TeamCode, opponent: &TeamCode| {
            self.by_team
                .get(team)
                .and_then(|rows| {
                    rows.iter()
                        .position(|r| r.season_week == week && &r.opponent_code == opponent)
                })
                .ok_or_else(|| ValidationError::UnknownTeam(team.0.clone()))
        };
        let home_row = row_of(&home, &away)?;
        let away_row = row_of(&away, &home)?;

        if let Some(game) = self.by_week.get_mut(&week).and_then(|g| g.get_mut(at)) {
            game.status = GameStatus::Final;
            game.home_score = Some(home_score);
            game.away_score = Some(away_score);
        }
        for (team, row, score, opp_score) in [
            (&home, home_row, home_score, away_score),
            (&away, away_row, away_score, home_score),
        ] {
            if let Some(row) = self.by_team.get_mut(team).and_then(|rows| rows.get_mut(row)) {
                row.status = GameStatus::Final;
                row.team_score = Some(score);
                row.opponent_score = Some(opp_score);
            }
        }
        debug!(game_id, week, %home, %away, "recorded final score");
        Ok(())
    }

    /// Win/loss/tie record from final games, `None` for an unknown team.
    pub fn record(&self, code: &TeamCode) -> Option<Record> {
        let rows = self.by_team.get(code)?;
        let mut record = Record::default();
        for row in rows.iter().filter(|r| r.status == GameStatus::Final) {
            match (row.team_score, row.opponent_score) {
                (Some(us), Some(them)) if us > them => record.wins += 1,
                (Some(us), Some(them)) if us < them => record.losses += 1,
                (Some(_), Some(_)) => record.ties += 1,
                _ => {}
            }
        }
        Some(record)
    }
}

/// Season record of one team.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub wins: u16,
    pub losses: u16,
    pub ties: u16,
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ties > 0 {
            write!(f, "{}-{}-{}", self.wins, self.losses, self.ties)
        } else {
            write!(f, "{}-{}", self.wins, self.losses)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{default_registry, ManifestEntry};
    use chrono::TimeZone;

    fn entry(id: u16, home: &str, away: &str, game_type: GameType) -> ManifestEntry {
        ManifestEntry {
            id,
            home: TeamCode::new(home),
            away: TeamCode::new(away),
            game_type,
        }
    }

    fn small_schedule() -> Schedule {
        let eastern = FixedOffset::west_opt(4 * 3600).unwrap();
        let mut opener = PlacedGame::unplayed(entry(1, "BUF", "MIA", GameType::Division), 1);
        opener.slot = Some(TimeSlot::ThursdayNight);
        opener.kickoff = Some(eastern.with_ymd_and_hms(2024, 9, 12, 20, 15, 0).unwrap());
        let rematch = PlacedGame::unplayed(entry(2, "MIA", "BUF", GameType::Division), 3);
        let mut byes = BTreeMap::new();
        byes.insert(TeamCode::new("BUF"), 2);
        Schedule::from_placed(2024, 3, &default_registry(), &[opener, rematch], &byes)
    }

    #[test]
    fn views_project_the_same_games() {
        let s = small_schedule();
        assert_eq!(s.by_week.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(s.week_games(2).is_empty());
        assert_eq!(s.game_count(), 2);

        let buf = s.team_games(&TeamCode::new("BUF")).unwrap();
        assert_eq!(buf.len(), 3);
        assert_eq!(
            buf.iter().map(|r| (r.index, r.season_week)).collect::<Vec<_>>(),
            vec![(0, 1), (1, 2), (2, 3)]
        );
        assert!(buf[0].is_home);
        assert!(buf[1].is_bye());
        assert_eq!(buf[1].opponent_code.as_str(), BYE_CODE);
        assert!(!buf[2].is_home);
        assert_eq!(s.bye_week(&TeamCode::new("BUF")), Some(2));
        assert_eq!(s.bye_week(&TeamCode::new("MIA")), None);
        // Teams without games still get an (empty) list.
        assert!(s.team_games(&TeamCode::new("SEA")).unwrap().is_empty());
    }

    #[test]
    fn kickoff_is_serialized_in_utc() {
        let s = small_schedule();
        assert_eq!(
            s.week_games(1)[0].kickoff_iso.as_deref(),
            Some("2024-09-13T00:15:00.000Z")
        );
        assert_eq!(s.week_games(3)[0].kickoff_iso, None);
    }

    #[test]
    fn persisted_shape_uses_camel_case() {
        let s = small_schedule();
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v["seasonYear"], 2024);
        assert_eq!(v["schemaVersion"], SCHEMA_VERSION);
        let row = &v["byTeam"]["BUF"][0];
        assert_eq!(row["seasonWeek"], 1);
        assert_eq!(row["opponentCode"], "MIA");
        assert_eq!(row["isHome"], true);
        assert_eq!(row["type"], "division");
        assert_eq!(row["status"], "scheduled");
        assert!(row["teamScore"].is_null());
        let bye = &v["byTeam"]["BUF"][1];
        assert_eq!(bye["type"], "bye");
        assert_eq!(bye["opponentCode"], "BYE");
        assert_eq!(v["byWeek"]["1"][0]["homeCode"], "BUF");

        let back: Schedule = serde_json::from_value(v).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn final_scores_update_both_views() {
        let mut s = small_schedule();
        s.record_final(1, 27, 20).unwrap();
        s.record_final(2, 17, 17).unwrap();
        let buf = TeamCode::new("BUF");
        let mia = TeamCode::new("MIA");

        let league_row = &s.week_games(1)[0];
        assert_eq!(league_row.status, GameStatus::Final);
        assert_eq!(league_row.home_score, Some(27));
        let buf_row = &s.team_games(&buf).unwrap()[0];
        assert_eq!((buf_row.team_score, buf_row.opponent_score), (Some(27), Some(20)));
        let mia_row = &s.team_games(&mia).unwrap()[0];
        assert_eq!((mia_row.team_score, mia_row.opponent_score), (Some(20), Some(27)));

        assert_eq!(s.record(&buf).unwrap().to_string(), "1-0-1");
        assert_eq!(s.record(&mia).unwrap().to_string(), "0-1-1");
        assert_eq!(s.record(&TeamCode::new("SEA")).unwrap().to_string(), "0-0");
        assert_eq!(s.record(&TeamCode::new("XXX")), None);
        assert_eq!(s.record_final(99, 1, 0), Err(ValidationError::UnknownGame(99)));
    }

    #[test]
    fn missing_team_row_leaves_game_untouched() {
        let mut s = small_schedule();
        let mia = TeamCode::new("MIA");
        s.by_team.get_mut(&mia).unwrap().retain(|r| r.season_week != 1);

        assert_eq!(
            s.record_final(1, 27, 20),
            Err(ValidationError::UnknownTeam("MIA".to_string()))
        );
        let league_row = &s.week_games(1)[0];
        assert_eq!(league_row.status, GameStatus::Scheduled);
        assert_eq!(league_row.home_score, None);
        let buf_row = &s.team_games(&TeamCode::new("BUF")).unwrap()[0];
        assert_eq!(buf_row.status, GameStatus::Scheduled);
        assert_eq!(buf_row.team_score, None);
    }
}
