//! Headless races on a simulated clock.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use parking_lot::Mutex;
use roulette_core::stage::{StageDef, map_infos};
use roulette_core::{DrawList, EngineConfig, MapInfo, RapierPhysics, Roulette, RouletteEvent};

/// Simulated display frame, 60 fps.
const FRAME_MS: f64 = 1000.0 / 60.0;
/// Races still unresolved after this much simulated time are abandoned.
const RACE_TIMEOUT_MS: f64 = 10.0 * 60.0 * 1000.0;

#[derive(Debug, Clone)]
pub struct RaceOptions {
    pub map: usize,
    pub rank: usize,
    pub speed: f32,
    pub theme: String,
    pub entries: String,
    pub seed: Option<u64>,
    pub config: EngineConfig,
}

pub fn list_maps() -> Result<Vec<MapInfo>> {
    let stages = StageDef::builtin().context("load built-in stages")?;
    Ok(map_infos(&stages))
}

fn create_roulette(options: &RaceOptions, race: u64) -> Roulette {
    match options.seed {
        Some(seed) => {
            let seed = seed.wrapping_add(race);
            Roulette::with_seed(Box::new(RapierPhysics::with_seed(seed)), options.config.clone(), seed)
        }
        None => Roulette::with_rapier(options.config.clone()),
    }
}

/// Runs one race to its goal. `Ok(None)` means it timed out.
pub fn run_race(options: &RaceOptions, race: u64) -> Result<Option<String>> {
    let mut roulette = create_roulette(options, race);

    let goal = Arc::new(Mutex::new(None));
    {
        let goal = Arc::clone(&goal);
        roulette.subscribe(move |event| match event {
            RouletteEvent::Goal { winner } => *goal.lock() = Some(winner.clone()),
            RouletteEvent::Error { detail } => tracing::error!("[race] {}", detail),
            RouletteEvent::Message { detail } => tracing::info!("[race] {}", detail),
            RouletteEvent::Ready => tracing::debug!("[race] ready"),
        });
    }

    let config = &options.config;
    roulette
        .initialize(config.canvas_width, config.canvas_height)
        .context("initialize roulette")?;

    let maps = roulette.maps();
    let Some(map) = maps.get(options.map) else {
        bail!("map {} out of range, {} maps available", options.map, maps.len());
    };
    roulette.set_map(map.index)?;
    roulette.set_theme(&options.theme)?;
    roulette.set_speed(options.speed)?;
    roulette.set_winning_rank(options.rank);

    let count = roulette.set_marbles_text(&options.entries)?;
    if !roulette.start()? {
        bail!("no valid entries in {:?}", options.entries);
    }
    tracing::info!("[race {}] {} marbles on {}", race + 1, count, map.title);

    let mut canvas = DrawList::new();
    let mut clock = 0.0;
    while goal.lock().is_none() && clock < RACE_TIMEOUT_MS {
        canvas.clear();
        roulette.frame(clock, &mut canvas);
        clock += FRAME_MS;
    }

    let winner = goal.lock().take();
    if winner.is_none() {
        tracing::warn!("[race {}] no winner after {:.0}s", race + 1, clock / 1000.0);
    }
    Ok(winner)
}

pub fn run(options: &RaceOptions, races: usize) -> Result<()> {
    let mut tally: BTreeMap<String, usize> = BTreeMap::new();

    for race in 0..races as u64 {
        match run_race(options, race)? {
            Some(winner) => {
                println!("race {}: {}", race + 1, winner);
                *tally.entry(winner).or_default() += 1;
            }
            None => println!("race {}: no winner", race + 1),
        }
    }

    if races > 1 {
        println!();
        let mut counts: Vec<_> = tally.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        for (name, wins) in counts {
            println!("{name}\t{wins}");
        }
    }
    Ok(())
}
