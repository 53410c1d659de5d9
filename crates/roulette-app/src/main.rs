//! Marble Roulette runner
//!
//! Runs races headless on a simulated clock and prints the winners, or
//! (with the `windowed` feature) opens a Bevy window hosting the engine.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use roulette_core::EngineConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod headless;
#[cfg(feature = "windowed")]
mod windowed;

#[derive(Parser, Debug)]
#[command(author, version, about = "Marble race roulette", long_about = None)]
struct Args {
    /// Contestants as `name[/weight][*count]`; commas also separate entries.
    #[arg(required = true)]
    entries: Vec<String>,
    /// Stage index (see `--list-maps`).
    #[arg(long, default_value_t = 0)]
    map: usize,
    /// Zero-based finishing rank that wins.
    #[arg(long, default_value_t = 0)]
    rank: usize,
    #[arg(long, default_value_t = 1.0)]
    speed: f32,
    #[arg(long, default_value = "dark")]
    theme: String,
    #[arg(long)]
    no_skills: bool,
    /// Seed for physics and lane shuffles; random when omitted.
    #[arg(long)]
    seed: Option<u64>,
    /// JSON file overriding engine tuning.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Run without a window and print the results.
    #[arg(long)]
    headless: bool,
    /// Number of headless races.
    #[arg(long, default_value_t = 1)]
    races: usize,
    /// Print the built-in stages and exit.
    #[arg(long)]
    list_maps: bool,
}

impl Args {
    fn race_options(&self) -> Result<headless::RaceOptions> {
        let mut config = match &self.config {
            Some(path) => {
                let json = std::fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
                EngineConfig::from_json(&json).with_context(|| format!("parse config {}", path.display()))?
            }
            None => EngineConfig::default(),
        };
        if self.no_skills {
            config.use_skills = false;
        }

        Ok(headless::RaceOptions {
            map: self.map,
            rank: self.rank,
            speed: self.speed,
            theme: self.theme.clone(),
            entries: self.entries.join(","),
            seed: self.seed,
            config,
        })
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    if args.list_maps {
        for map in headless::list_maps()? {
            println!("{}\t{}", map.index, map.title);
        }
        return Ok(());
    }

    let options = args.race_options()?;

    #[cfg(feature = "windowed")]
    if !args.headless {
        return windowed::run(&options);
    }
    #[cfg(not(feature = "windowed"))]
    if !args.headless {
        tracing::warn!("built without the `windowed` feature, running headless");
    }

    headless::run(&options, args.races)
}
