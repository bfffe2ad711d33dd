//! Broadcast slot and kickoff assignment for placed games.

use crate::calendar;
use crate::config::SchedulerConfig;
use chrono::NaiveDate;
use league_core::{PlacedGame, TeamCode, TimeSlot};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Teams already shown in each marquee window this season.
#[derive(Default)]
struct MarqueeHistory {
    seen: BTreeMap<TimeSlot, BTreeSet<TeamCode>>,
}

impl MarqueeHistory {
    fn fresh_teams(&self, slot: TimeSlot, game: &PlacedGame) -> usize {
        let seen = self.seen.get(&slot);
        [&game.entry.home, &game.entry.away]
            .into_iter()
            .filter(|t| seen.map_or(true, |s| !s.contains(*t)))
            .count()
    }

    fn record(&mut self, slot: TimeSlot, game: &PlacedGame) {
        let seen = self.seen.entry(slot).or_default();
        seen.insert(game.entry.home.clone());
        seen.insert(game.entry.away.clone());
    }
}

/// Take one game out of `pool` for a marquee window: first among games
/// whose teams have not yet played in it, then games with one such team,
/// then anything left.
fn pick_marquee<R: Rng + ?Sized>(
    games: &[PlacedGame],
    pool: &mut Vec<usize>,
    slot: TimeSlot,
    history: &mut MarqueeHistory,
    rng: &mut R,
) -> Option<usize> {
    let freshest = pool
        .iter()
        .map(|&g| history.fresh_teams(slot, &games[g]))
        .max()?;
    let tier: Vec<usize> = pool
        .iter()
        .copied()
        .filter(|&g| history.fresh_teams(slot, &games[g]) == freshest)
        .collect();
    let pick = *tier.choose(rng)?;
    pool.retain(|&g| g != pick);
    history.record(slot, &games[pick]);
    Some(pick)
}

fn take_hosted_by(games: &[PlacedGame], pool: &mut Vec<usize>, host: &TeamCode) -> Option<usize> {
    let at = pool.iter().position(|&g| &games[g].entry.home == host)?;
    Some(pool.remove(at))
}

/// Give every game a slot and kickoff, week by week.
pub fn assign_slots<R: Rng + ?Sized>(
    games: &mut [PlacedGame],
    config: &SchedulerConfig,
    season_start: NaiveDate,
    holiday_week: Option<u8>,
    rng: &mut R,
) {
    let mut history = MarqueeHistory::default();
    let mut international = 0u8;
    let (intl_first, intl_last) = config.international_weeks;

    for week in 1..=config.weeks {
        let mut pool: Vec<usize> = (0..games.len()).filter(|&g| games[g].week == week).collect();
        pool.sort_by_key(|&g| games[g].entry.id);
        let mut slotted: Vec<(usize, TimeSlot)> = Vec::new();

        if Some(week) == holiday_week {
            let windows = [TimeSlot::HolidayEarly, TimeSlot::HolidayLate];
            for (anchor, slot) in config.holiday_anchors.iter().zip(windows) {
                match take_hosted_by(games, &mut pool, anchor) {
                    Some(g) => slotted.push((g, slot)),
                    None => warn!(%anchor, week, "holiday anchor has no home game"),
                }
            }
            if let Some(&g) = pool.choose(rng) {
                pool.retain(|&x| x != g);
                slotted.push((g, TimeSlot::HolidayNight));
            }
        } else {
            let in_window = (intl_first..=intl_last).contains(&week);
            if in_window
                && international < config.max_international_games
                && rng.gen_bool(config.international_probability)
            {
                let hosts: Vec<usize> = pool
                    .iter()
                    .copied()
                    .filter(|&g| !config.is_late_host(&games[g].entry.home))
                    .collect();
                if let Some(&g) = hosts.choose(rng) {
                    pool.retain(|&x| x != g);
                    slotted.push((g, TimeSlot::International));
                    international += 1;
                }
            }
            if let Some(g) = pick_marquee(games, &mut pool, TimeSlot::ThursdayNight, &mut history, rng)
            {
                slotted.push((g, TimeSlot::ThursdayNight));
            }
        }

        for slot in [TimeSlot::SundayNight, TimeSlot::MondayNight] {
            if let Some(g) = pick_marquee(games, &mut pool, slot, &mut history, rng) {
                slotted.push((g, slot));
            }
        }

        for g in pool {
            let late = config.is_late_host(&games[g].entry.home)
                && rng.gen_bool(config.late_window_probability);
            let slot = if late {
                TimeSlot::SundayLate
            } else {
                TimeSlot::SundayEarly
            };
            slotted.push((g, slot));
        }

        for (g, slot) in slotted {
            let game = &mut games[g];
            game.slot = Some(slot);
            game.kickoff = calendar::kickoff(season_start, week, slot);
            if game.kickoff.is_none() {
                warn!(game = game.entry.id, week, ?slot, "kickoff date unavailable");
            }
        }
    }
    debug!(international, "assigned broadcast slots");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::build_manifest;
    use league_core::default_registry;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// Round-robin weeks with DET and DAL hosting in week 12. Slotting does
    /// not care whether the weeks are a valid schedule.
    fn placed() -> Vec<PlacedGame> {
        let manifest = build_manifest(&default_registry(), 2024, 17);
        let det = TeamCode::new("DET");
        let dal = TeamCode::new("DAL");
        let mut games: Vec<PlacedGame> = manifest
            .into_iter()
            .enumerate()
            .map(|(i, e)| PlacedGame::unplayed(e, (i % 18) as u8 + 1))
            .collect();
        for anchor in [&det, &dal] {
            if let Some(g) = games.iter_mut().find(|g| &g.entry.home == anchor) {
                g.week = 12;
            }
        }
        games
    }

    fn slotted(seed: u64) -> Vec<PlacedGame> {
        let mut games = placed();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let config = SchedulerConfig::default();
        let start = calendar::season_start(2024).unwrap();
        assign_slots(&mut games, &config, start, Some(12), &mut rng);
        games
    }

    fn count(games: &[PlacedGame], week: u8, slot: TimeSlot) -> usize {
        games
            .iter()
            .filter(|g| g.week == week && g.slot == Some(slot))
            .count()
    }

    #[test]
    fn every_game_gets_slot_and_kickoff() {
        let games = slotted(1);
        assert!(games.iter().all(|g| g.slot.is_some() && g.kickoff.is_some()));
        for week in 1..=18 {
            assert_eq!(count(&games, week, TimeSlot::SundayNight), 1);
            assert_eq!(count(&games, week, TimeSlot::MondayNight), 1);
            let thursday = usize::from(week != 12);
            assert_eq!(count(&games, week, TimeSlot::ThursdayNight), thursday);
        }
    }

    #[test]
    fn holiday_week_gets_the_triple_header() {
        let games = slotted(2);
        let host = |slot| {
            games
                .iter()
                .find(|g| g.slot == Some(slot))
                .map(|g| g.entry.home.clone())
        };
        assert_eq!(host(TimeSlot::HolidayEarly), Some(TeamCode::new("DET")));
        assert_eq!(host(TimeSlot::HolidayLate), Some(TeamCode::new("DAL")));
        assert_eq!(count(&games, 12, TimeSlot::HolidayNight), 1);
        let early = games
            .iter()
            .find(|g| g.slot == Some(TimeSlot::HolidayEarly))
            .and_then(|g| g.kickoff)
            .map(|k| league_core::kickoff_iso(&k));
        assert_eq!(early.as_deref(), Some("2024-11-28T17:30:00.000Z"));
    }

    #[test]
    fn international_games_respect_window_cap_and_hosts() {
        let config = SchedulerConfig::default();
        for seed in 0..20 {
            let games = slotted(seed);
            let intl: Vec<&PlacedGame> = games
                .iter()
                .filter(|g| g.slot == Some(TimeSlot::International))
                .collect();
            assert!(intl.len() <= 5);
            for g in intl {
                assert!((4..=10).contains(&g.week));
                assert!(!config.is_late_host(&g.entry.home));
            }
        }
    }

    #[test]
    fn marquee_windows_rotate_teams() {
        let games = slotted(3);
        let mut teams: BTreeSet<&TeamCode> = BTreeSet::new();
        for g in games.iter().filter(|g| g.slot == Some(TimeSlot::ThursdayNight)) {
            teams.insert(&g.entry.home);
            teams.insert(&g.entry.away);
        }
        assert!(teams.len() >= 24, "only {} teams on Thursday", teams.len());
    }

    #[test]
    fn late_hosts_lean_towards_the_late_window() {
        let config = SchedulerConfig::default();
        let (mut late, mut early) = (0, 0);
        for seed in 0..10 {
            for g in slotted(seed)
                .iter()
                .filter(|g| config.is_late_host(&g.entry.home))
            {
                match g.slot {
                    Some(TimeSlot::SundayLate) => late += 1,
                    Some(TimeSlot::SundayEarly) => early += 1,
                    _ => {}
                }
            }
        }
        assert!(late > early, "late {late} early {early}");
    }
}
