//! Bye allocation: one week off per team inside the bye window.

use crate::config::SchedulerConfig;
use crate::ScheduleError;
use league_core::{TeamCode, TeamRegistry};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Assign a bye week to every registry team, returned in registry order.
///
/// Weeks are handed out by shuffling the teams and an expanded slot list
/// (`bye_distribution[i]` copies of window week `i`) and zipping them. A
/// holiday anchor drawn into the holiday week then trades byes with a
/// random non-anchor team whose bye is elsewhere, which keeps the per-week
/// counts intact.
pub fn allocate_byes<R: Rng + ?Sized>(
    registry: &TeamRegistry,
    config: &SchedulerConfig,
    holiday_week: Option<u8>,
    rng: &mut R,
) -> Result<Vec<u8>, ScheduleError> {
    let mut slots: Vec<u8> = Vec::with_capacity(registry.len());
    for (offset, &count) in config.bye_distribution.iter().enumerate() {
        let week = config.bye_window_start + offset as u8;
        slots.extend(std::iter::repeat(week).take(count as usize));
    }
    if slots.len() != registry.len() {
        return Err(ScheduleError::ByeDistribution {
            expected: registry.len(),
            actual: slots.len(),
        });
    }

    let mut order: Vec<usize> = (0..registry.len()).collect();
    order.shuffle(rng);
    slots.shuffle(rng);
    let mut byes = vec![0u8; registry.len()];
    for (&team, &week) in order.iter().zip(&slots) {
        byes[team] = week;
    }

    if let Some(holiday) = holiday_week {
        let anchors: Vec<usize> = config
            .holiday_anchors
            .iter()
            .filter_map(|code| registry.index_of(code))
            .collect();
        for &anchor in &anchors {
            if byes[anchor] != holiday {
                continue;
            }
            let partners: Vec<usize> = (0..registry.len())
                .filter(|t| !anchors.contains(t) && byes[*t] != holiday)
                .collect();
            match partners.choose(rng) {
                Some(&partner) => {
                    byes.swap(anchor, partner);
                    debug!(
                        anchor = %registry.teams()[anchor].code,
                        partner = %registry.teams()[partner].code,
                        week = holiday,
                        "moved holiday anchor bye"
                    );
                }
                None => warn!(
                    anchor = %registry.teams()[anchor].code,
                    "no partner to move holiday anchor bye"
                ),
            }
        }
    }
    Ok(byes)
}

/// Key a registry-ordered bye list by team code.
pub fn bye_map(registry: &TeamRegistry, byes: &[u8]) -> BTreeMap<TeamCode, u8> {
    registry
        .teams()
        .iter()
        .zip(byes)
        .map(|(team, &week)| (team.code.clone(), week))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use league_core::default_registry;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn byes_follow_the_distribution() {
        let registry = default_registry();
        let config = SchedulerConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let byes = allocate_byes(&registry, &config, Some(12), &mut rng).unwrap();

        let mut counts = BTreeMap::new();
        for &w in &byes {
            assert!(config.in_bye_window(w), "bye in week {w}");
            *counts.entry(w).or_insert(0u8) += 1;
        }
        for (offset, &expected) in config.bye_distribution.iter().enumerate() {
            let week = config.bye_window_start + offset as u8;
            assert_eq!(counts.get(&week).copied().unwrap_or(0), expected, "week {week}");
        }
    }

    #[test]
    fn anchors_never_rest_in_the_holiday_week() {
        let registry = default_registry();
        let config = SchedulerConfig::default();
        for seed in 0..200 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let byes = bye_map(
                &registry,
                &allocate_byes(&registry, &config, Some(12), &mut rng).unwrap(),
            );
            for anchor in &config.holiday_anchors {
                assert_ne!(byes[anchor], 12, "seed {seed}: {anchor}");
            }
            assert_eq!(byes.values().filter(|&&w| w == 12).count(), 2);
        }
    }

    #[test]
    fn same_seed_same_byes() {
        let registry = default_registry();
        let config = SchedulerConfig::default();
        let run = |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            allocate_byes(&registry, &config, Some(12), &mut rng).unwrap()
        };
        assert_eq!(run(11), run(11));
    }

    #[test]
    fn short_distribution_is_refused() {
        let registry = default_registry();
        let config = SchedulerConfig {
            bye_distribution: vec![2, 2],
            ..SchedulerConfig::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(matches!(
            allocate_byes(&registry, &config, None, &mut rng),
            Err(ScheduleError::ByeDistribution {
                expected: 32,
                actual: 4
            })
        ));
    }
}
