use std::path::PathBuf;

use anyhow::{Context, Result};

use euro24_terminal::config::{parse_path_arg, parse_value_arg};
use euro24_terminal::demo_feed::{self, DEMO_SEED};

const DEFAULT_PLAYERS: usize = 10;
const DEFAULT_MATCHDAYS: u32 = 3;

fn main() -> Result<()> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let out_dir = parse_path_arg(&args, "--out").unwrap_or_else(|| PathBuf::from("data"));
    let seed = parse_number_arg(&args, "--seed")?.unwrap_or(DEMO_SEED);
    let players = parse_number_arg(&args, "--players")?.unwrap_or(DEFAULT_PLAYERS);
    let matchdays = parse_number_arg(&args, "--matchdays")?.unwrap_or(DEFAULT_MATCHDAYS);

    let season = demo_feed::demo_season(seed, players, matchdays);
    demo_feed::write_season(&out_dir, &season)?;

    println!("Demo season written");
    println!("Dir: {}", out_dir.display());
    println!("Seed: {seed}");
    println!("Players: {players}");
    println!("Matchdays: {matchdays}");
    println!("Prediction rows: {}", season.trend.len());
    Ok(())
}

fn parse_number_arg<T: std::str::FromStr>(args: &[String], name: &str) -> Result<Option<T>>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    parse_value_arg(args, name)
        .map(|raw| {
            raw.parse::<T>()
                .with_context(|| format!("invalid value for {name}: {raw}"))
        })
        .transpose()
}
