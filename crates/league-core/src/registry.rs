use crate::{Conference, Division, Team, TeamCode};
use serde::{Deserialize, Serialize};

/// Ordered team table. Registry order is also each team's rank inside its
/// division, which the rank-for-rank manifest tiers rely on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRegistry {
    teams: Vec<Team>,
}

impl TeamRegistry {
    pub fn new(teams: Vec<Team>) -> Self {
        Self { teams }
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    pub fn index_of(&self, code: &TeamCode) -> Option<usize> {
        self.teams.iter().position(|t| &t.code == code)
    }

    pub fn contains(&self, code: &TeamCode) -> bool {
        self.index_of(code).is_some()
    }

    /// Registry indices of a division's teams, in rank order.
    pub fn division_members(&self, conference: Conference, division: Division) -> Vec<usize> {
        self.teams
            .iter()
            .enumerate()
            .filter(|(_, t)| t.conference == conference && t.division == division)
            .map(|(i, _)| i)
            .collect()
    }
}

impl Default for TeamRegistry {
    fn default() -> Self {
        default_registry()
    }
}

const TEAMS: [(&str, &str, &str, Conference, Division); 32] = [
    ("BUF", "Buffalo", "Bills", Conference::A, Division::East),
    ("MIA", "Miami", "Dolphins", Conference::A, Division::East),
    ("NE", "New England", "Patriots", Conference::A, Division::East),
    ("NYJ", "New York", "Jets", Conference::A, Division::East),
    ("BAL", "Baltimore", "Ravens", Conference::A, Division::North),
    ("CIN", "Cincinnati", "Bengals", Conference::A, Division::North),
    ("CLE", "Cleveland", "Browns", Conference::A, Division::North),
    ("PIT", "Pittsburgh", "Steelers", Conference::A, Division::North),
    ("HOU", "Houston", "Texans", Conference::A, Division::South),
    ("IND", "Indianapolis", "Colts", Conference::A, Division::South),
    ("JAX", "Jacksonville", "Jaguars", Conference::A, Division::South),
    ("TEN", "Tennessee", "Titans", Conference::A, Division::South),
    ("DEN", "Denver", "Broncos", Conference::A, Division::West),
    ("KC", "Kansas City", "Chiefs", Conference::A, Division::West),
    ("LV", "Las Vegas", "Raiders", Conference::A, Division::West),
    ("LAC", "Los Angeles", "Chargers", Conference::A, Division::West),
    ("DAL", "Dallas", "Cowboys", Conference::B, Division::East),
    ("NYG", "New York", "Giants", Conference::B, Division::East),
    ("PHI", "Philadelphia", "Eagles", Conference::B, Division::East),
    ("WAS", "Washington", "Commanders", Conference::B, Division::East),
    ("CHI", "Chicago", "Bears", Conference::B, Division::North),
    ("DET", "Detroit", "Lions", Conference::B, Division::North),
    ("GB", "Green Bay", "Packers", Conference::B, Division::North),
    ("MIN", "Minnesota", "Vikings", Conference::B, Division::North),
    ("ATL", "Atlanta", "Falcons", Conference::B, Division::South),
    ("CAR", "Carolina", "Panthers", Conference::B, Division::South),
    ("NO", "New Orleans", "Saints", Conference::B, Division::South),
    ("TB", "Tampa Bay", "Buccaneers", Conference::B, Division::South),
    ("ARI", "Arizona", "Cardinals", Conference::B, Division::West),
    ("LAR", "Los Angeles", "Rams", Conference::B, Division::West),
    ("SF", "San Francisco", "49ers", Conference::B, Division::West),
    ("SEA", "Seattle", "Seahawks", Conference::B, Division::West),
];

/// The standard 32-team league: two conferences of four four-team divisions.
pub fn default_registry() -> TeamRegistry {
    TeamRegistry::new(
        TEAMS
            .iter()
            .map(|&(code, city, name, conference, division)| Team {
                code: TeamCode::new(code),
                city: city.to_string(),
                name: name.to_string(),
                conference,
                division,
            })
            .collect(),
    )
}
