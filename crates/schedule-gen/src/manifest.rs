//! Matchup manifest: the season's 272 unplaced games, derived from the
//! registry and a handful of rotation formulas keyed by season year.

use league_core::{Conference, Division, GameType, ManifestEntry, TeamRegistry};
use tracing::{debug, warn};

/// Same-conference division pairings, on a 3-year cycle.
pub fn intra_conference_pairs(year: i32) -> [(Division, Division); 2] {
    use Division::*;
    match year.rem_euclid(3) {
        0 => [(East, North), (South, West)],
        1 => [(East, South), (North, West)],
        _ => [(East, West), (North, South)],
    }
}

/// Conference-A division `d` meets conference-B division `(d + offset) % 4`.
pub fn cross_conference_offset(year: i32) -> usize {
    year.rem_euclid(3) as usize
}

/// Offset for the rank-for-rank cross-conference game; never equal to the
/// full-division rotation offset.
pub fn seventeenth_game_offset(year: i32) -> usize {
    (cross_conference_offset(year) + 2) % 4
}

/// Conference hosting the cross-conference 17th game.
pub fn host_conference(year: i32) -> Conference {
    if year.rem_euclid(2) == 0 {
        Conference::A
    } else {
        Conference::B
    }
}

struct ManifestBuilder<'a> {
    registry: &'a TeamRegistry,
    entries: Vec<ManifestEntry>,
}

impl<'a> ManifestBuilder<'a> {
    fn push(&mut self, home: usize, away: usize, game_type: GameType) {
        let teams = self.registry.teams();
        let id = self.entries.len() as u16 + 1;
        self.entries.push(ManifestEntry {
            id,
            home: teams[home].code.clone(),
            away: teams[away].code.clone(),
            game_type,
        });
    }

    fn members(&self, conference: Conference, division: Division) -> Vec<usize> {
        self.registry.division_members(conference, division)
    }

    /// Every team of `xs` against every team of `ys`, home alternating on
    /// the parity of `row + col`.
    fn full_cross(&mut self, xs: &[usize], ys: &[usize], game_type: GameType) {
        for (i, &x) in xs.iter().enumerate() {
            for (j, &y) in ys.iter().enumerate() {
                if (i + j) % 2 == 0 {
                    self.push(x, y, game_type);
                } else {
                    self.push(y, x, game_type);
                }
            }
        }
    }

    /// Same-rank teams only; `xs` hosts.
    fn rank_for_rank(&mut self, xs: &[usize], ys: &[usize], game_type: GameType) {
        for (&x, &y) in xs.iter().zip(ys) {
            self.push(x, y, game_type);
        }
    }

    fn division_games(&mut self) {
        for conference in Conference::ALL {
            for division in Division::ALL {
                let teams = self.members(conference, division);
                for (i, &a) in teams.iter().enumerate() {
                    for &b in &teams[i + 1..] {
                        self.push(a, b, GameType::Division);
                        self.push(b, a, GameType::Division);
                    }
                }
            }
        }
    }

    fn conference_rotation(&mut self, year: i32) {
        for conference in Conference::ALL {
            for (x, y) in intra_conference_pairs(year) {
                let xs = self.members(conference, x);
                let ys = self.members(conference, y);
                self.full_cross(&xs, &ys, GameType::Conference);
            }
        }
    }

    fn cross_conference_rotation(&mut self, year: i32) {
        let offset = cross_conference_offset(year);
        for division in Division::ALL {
            let xs = self.members(Conference::A, division);
            let ys = self.members(Conference::B, Division::from_index(division.index() + offset));
            self.full_cross(&xs, &ys, GameType::Nonconference);
        }
    }

    /// The two divisions outside each rotation pair meet rank-for-rank.
    /// Edges run as a directed 4-cycle p→s→q→t→p so each team hosts once.
    fn extra_games(&mut self, year: i32) {
        let [(p, q), (s, t)] = intra_conference_pairs(year);
        let mut legs = [(p, s), (s, q), (q, t), (t, p)];
        if year.rem_euclid(2) == 1 {
            for leg in &mut legs {
                *leg = (leg.1, leg.0);
            }
        }
        for conference in Conference::ALL {
            for (home, away) in legs {
                let xs = self.members(conference, home);
                let ys = self.members(conference, away);
                self.rank_for_rank(&xs, &ys, GameType::Extra);
            }
        }
    }

    fn seventeenth_game(&mut self, year: i32) {
        let offset = seventeenth_game_offset(year);
        let host = host_conference(year);
        for division in Division::ALL {
            let a = self.members(Conference::A, division);
            let b = self.members(Conference::B, Division::from_index(division.index() + offset));
            if host == Conference::A {
                self.rank_for_rank(&a, &b, GameType::Nonconference);
            } else {
                self.rank_for_rank(&b, &a, GameType::Nonconference);
            }
        }
    }
}

/// Build the season manifest.
///
/// Composition is a pure function of `(registry, year)`. A registry whose
/// divisions do not hold four teams still yields a best-effort manifest;
/// the shortfall is logged, not returned as an error.
pub fn build_manifest(registry: &TeamRegistry, year: i32, games_per_team: u8) -> Vec<ManifestEntry> {
    for conference in Conference::ALL {
        for division in Division::ALL {
            let size = registry.division_members(conference, division).len();
            if size != 4 {
                warn!(?conference, ?division, size, "division does not hold four teams");
            }
        }
    }

    let mut builder = ManifestBuilder {
        registry,
        entries: Vec::with_capacity(272),
    };
    builder.division_games();
    builder.conference_rotation(year);
    builder.cross_conference_rotation(year);
    builder.extra_games(year);
    builder.seventeenth_game(year);
    let entries = builder.entries;

    let expected = registry.len() * games_per_team as usize / 2;
    if entries.len() != expected {
        warn!(
            year,
            built = entries.len(),
            expected,
            "manifest size does not match league shape"
        );
    }
    for team in registry.teams() {
        let games = entries.iter().filter(|e| e.involves(&team.code)).count();
        if games != games_per_team as usize {
            warn!(team = %team.code, games, "team has an unexpected number of games");
        }
    }
    debug!(year, games = entries.len(), "built matchup manifest");
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use league_core::{default_registry, TeamCode};
    use std::collections::{BTreeMap, BTreeSet};

    fn unordered(e: &ManifestEntry) -> (TeamCode, TeamCode) {
        if e.home < e.away {
            (e.home.clone(), e.away.clone())
        } else {
            (e.away.clone(), e.home.clone())
        }
    }

    #[test]
    fn manifest_has_272_typed_games() {
        let registry = default_registry();
        let m = build_manifest(&registry, 2024, 17);
        assert_eq!(m.len(), 272);

        let mut by_type: BTreeMap<GameType, usize> = BTreeMap::new();
        for e in &m {
            *by_type.entry(e.game_type).or_default() += 1;
        }
        assert_eq!(by_type[&GameType::Division], 96);
        assert_eq!(by_type[&GameType::Conference], 64);
        assert_eq!(by_type[&GameType::Nonconference], 80);
        assert_eq!(by_type[&GameType::Extra], 32);

        let ids: BTreeSet<u16> = m.iter().map(|e| e.id).collect();
        assert_eq!(ids.len(), 272);
    }

    #[test]
    fn every_team_plays_17_with_balanced_home_games() {
        let registry = default_registry();
        for year in 2020..2026 {
            let m = build_manifest(&registry, year, 17);
            for team in registry.teams() {
                let games = m.iter().filter(|e| e.involves(&team.code)).count();
                let home = m.iter().filter(|e| e.home == team.code).count();
                assert_eq!(games, 17, "{year} {}", team.code);
                assert!(home == 8 || home == 9, "{year} {} hosts {home}", team.code);
                let division = m
                    .iter()
                    .filter(|e| e.involves(&team.code) && e.game_type == GameType::Division)
                    .count();
                assert_eq!(division, 6);
            }
        }
    }

    #[test]
    fn only_division_rivals_meet_twice() {
        let registry = default_registry();
        for year in 2020..2026 {
            let m = build_manifest(&registry, year, 17);
            let mut pairs: BTreeMap<(TeamCode, TeamCode), Vec<&ManifestEntry>> = BTreeMap::new();
            for e in &m {
                pairs.entry(unordered(e)).or_default().push(e);
            }
            for games in pairs.values() {
                match games.len() {
                    1 => assert_ne!(games[0].game_type, GameType::Division),
                    2 => {
                        assert!(games.iter().all(|g| g.game_type == GameType::Division));
                        assert_eq!(games[0].home, games[1].away);
                    }
                    n => panic!("pair appears {n} times"),
                }
            }
            let ordered: BTreeSet<(TeamCode, TeamCode)> =
                m.iter().map(|e| (e.home.clone(), e.away.clone())).collect();
            assert_eq!(ordered.len(), 272);
        }
    }

    #[test]
    fn rotation_is_stable_per_year_and_changes_across_years() {
        let registry = default_registry();
        assert_eq!(build_manifest(&registry, 2024, 17), build_manifest(&registry, 2024, 17));

        let opponents = |year| -> BTreeSet<TeamCode> {
            let buf = TeamCode::new("BUF");
            build_manifest(&registry, year, 17)
                .into_iter()
                .filter(|e| e.involves(&buf) && e.game_type == GameType::Conference)
                .map(|e| if e.home == buf { e.away } else { e.home })
                .collect()
        };
        assert_ne!(opponents(2024), opponents(2025));
        assert_eq!(opponents(2024), opponents(2027));
    }

    #[test]
    fn seventeenth_game_avoids_rotation_partner() {
        for year in 1990..2030 {
            assert_ne!(cross_conference_offset(year), seventeenth_game_offset(year));
        }
        assert_eq!(host_conference(2024), Conference::A);
        assert_eq!(host_conference(2025), Conference::B);
    }

    #[test]
    fn short_division_degrades_without_panicking() {
        let mut teams = default_registry().teams().to_vec();
        teams.retain(|t| t.code.as_str() != "SEA");
        let registry = TeamRegistry::new(teams);
        let m = build_manifest(&registry, 2024, 17);
        assert!(m.len() < 272);
        assert!(m.iter().all(|e| e.home != e.away));
    }
}
