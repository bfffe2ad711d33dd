#![deny(warnings)]

//! Headless CLI: generate a season schedule, validate it, print it and
//! optionally save the league.

use anyhow::{Context, Result};
use league_core::{LeagueGameView, Schedule, TeamGameView};
use league_runtime::{ensure_schedule, get_team_schedule, recompute_record, save_league, LeagueState};
use persistence::FileStore;
use schedule_gen::{validate_schedule, SchedulerConfig};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Args {
    season: Option<i32>,
    seed: Option<u64>,
    config: Option<PathBuf>,
    team: Option<String>,
    save: Option<PathBuf>,
    json: bool,
    version: bool,
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: Option<String>) -> Result<T> {
    let value = value.with_context(|| format!("{flag} needs a value"))?;
    value
        .parse()
        .map_err(|_| anyhow::anyhow!("{flag}: cannot parse {value:?}"))
}

fn parse_args<I: Iterator<Item = String>>(mut it: I) -> Result<Args> {
    let mut args = Args::default();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--season" => args.season = Some(parse_value("--season", it.next())?),
            "--seed" => args.seed = Some(parse_value("--seed", it.next())?),
            "--config" => args.config = it.next().map(PathBuf::from),
            "--team" => args.team = it.next().map(|s| s.to_uppercase()),
            "--save" => args.save = it.next().map(PathBuf::from),
            "--json" => args.json = true,
            "--version" => args.version = true,
            other => warn!(arg = other, "ignoring unknown argument"),
        }
    }
    Ok(args)
}

fn slot_label(game: &LeagueGameView) -> String {
    game.slot
        .map(|s| format!("{s:?}"))
        .unwrap_or_else(|| "-".to_string())
}

fn print_weeks(schedule: &Schedule) {
    for (week, games) in &schedule.by_week {
        println!("Week {week:>2} | games: {}", games.len());
        for g in games {
            println!(
                "  {:>3} @ {:<3} | {:<13} | {}",
                g.away_code,
                g.home_code,
                slot_label(g),
                g.kickoff_iso.as_deref().unwrap_or("Date TBA")
            );
        }
    }
}

fn print_team(code: &str, rows: &[TeamGameView], record: &str) {
    println!("{code} | record: {record}");
    for r in rows {
        if r.is_bye() {
            println!("  Week {:>2} | BYE", r.season_week);
            continue;
        }
        let at = if r.is_home { "vs" } else { "at" };
        println!(
            "  Week {:>2} | {at} {:<3} | {:?} | {}",
            r.season_week,
            r.opponent_code,
            r.game_type,
            r.kickoff_iso.as_deref().unwrap_or("Date TBA")
        );
    }
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    if args.version {
        println!("cli {} ({})", env!("CARGO_PKG_VERSION"), env!("GIT_SHA"));
        return Ok(());
    }
    info!(?args, "starting CLI");

    let season = args.season.unwrap_or(2024);
    let seed = args.seed.unwrap_or(42);
    let config = match &args.config {
        Some(path) => SchedulerConfig::from_path(path)
            .with_context(|| format!("loading scheduler config {}", path.display()))?,
        None => SchedulerConfig::default(),
    };

    let mut state = LeagueState::with_config(season, seed, config);
    let schedule = ensure_schedule(&mut state, season)?.clone();
    let report = validate_schedule(&schedule, &state.registry, &state.config);

    match &args.team {
        Some(team) => {
            let rows = get_team_schedule(&mut state, team, season)?.to_vec();
            let record = recompute_record(&state, team)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                print_team(team, &rows, &record);
            }
        }
        None if args.json => println!("{}", serde_json::to_string_pretty(&schedule)?),
        None => print_weeks(&schedule),
    }

    if let Some(dir) = &args.save {
        let mut store = FileStore::open(dir)?;
        let key = format!("league-{season}");
        save_league(&mut store, &key, &state)?;
        info!(dir = %dir.display(), %key, "league saved");
    }

    if !args.json {
        println!(
            "Schedule OK | season: {} | seed: {} | games: {} | issues: {}",
            schedule.season_year,
            seed,
            schedule.game_count(),
            report.issues.len()
        );
    }
    Ok(())
}
