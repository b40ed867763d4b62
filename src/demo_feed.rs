use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Duration as ChronoDuration, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::tables::{MatchCode, MatchResult, PointsByName, StandingsRow, Table, Tables, TrendPoint};

/// Seed used when the dashboard runs on a demo season.
pub const DEMO_SEED: u64 = 2024;

const DEMO_PLAYERS: &[&str] = &[
    "Corfe",
    "Ed",
    "Jay",
    "Jonny",
    "Larry",
    "Luke",
    "Marc",
    "Peter Popular",
    "Rando Randal",
    "Tom",
];

const DEMO_TEAMS: &[&str] = &[
    "Germany", "Scotland", "Hungary", "Switzerland", "Spain", "Croatia", "Italy", "Albania",
    "Slovenia", "Denmark", "Serbia", "England", "Poland", "Netherlands", "Austria", "France",
    "Belgium", "Slovakia", "Romania", "Ukraine", "Turkey", "Georgia", "Portugal", "Czech Republic",
];

const FIXTURES_PER_MATCHDAY: usize = 4;
const KICKOFF_HOURS: [u32; 4] = [12, 15, 18, 21];

/// A synthetic season whose four tables agree with each other.
#[derive(Debug, Clone)]
pub struct DemoSeason {
    pub results: Vec<MatchResult>,
    pub standings: Vec<StandingsRow>,
    pub points: Vec<PointsByName>,
    pub trend: Vec<TrendPoint>,
}

impl DemoSeason {
    pub fn into_tables(self) -> Tables {
        Tables {
            results: Ok(self.results),
            standings: Ok(self.standings),
            points: Ok(self.points),
            trend: Ok(self.trend),
        }
    }
}

/// Builds `matchdays` played rounds plus one unplayed round of fixtures.
pub fn demo_season(seed: u64, players: usize, matchdays: u32) -> DemoSeason {
    let mut rng = StdRng::seed_from_u64(seed);
    let names = player_names(players);

    let mut results = Vec::new();
    let mut trend = Vec::new();
    let mut standings = Vec::new();
    let mut cumulative: HashMap<String, f64> =
        names.iter().map(|n| (n.clone(), 0.0)).collect();
    let mut previous_position: HashMap<String, u32> = HashMap::new();
    let mut next_code = 1u32;

    for matchday in 1..=matchdays + 1 {
        let played = matchday <= matchdays;
        let mut teams = DEMO_TEAMS.to_vec();
        teams.shuffle(&mut rng);
        let mut round_points: HashMap<&str, f64> = HashMap::new();

        for (slot, pair) in teams.chunks(2).take(FIXTURES_PER_MATCHDAY).enumerate() {
            let (home, away) = (pair[0], pair[1]);
            if !played {
                results.push(MatchResult {
                    matchday,
                    home: home.to_string(),
                    away: away.to_string(),
                    actual_score: None,
                });
                continue;
            }

            let actual = (rng.gen_range(0..=3u8), rng.gen_range(0..=3u8));
            let actual_score = format!("{}-{}", actual.0, actual.1);
            results.push(MatchResult {
                matchday,
                home: home.to_string(),
                away: away.to_string(),
                actual_score: Some(actual_score.clone()),
            });

            let code = MatchCode::new(next_code);
            next_code += 1;
            let timestamp = kickoff_timestamp(matchday, slot);
            for name in &names {
                let predicted = (rng.gen_range(0..=3u8), rng.gen_range(0..=3u8));
                let points = score_prediction(predicted, actual);
                *round_points.entry(name.as_str()).or_insert(0.0) += points;
                trend.push(TrendPoint {
                    timestamp: timestamp.clone(),
                    name: name.clone(),
                    match_code: code.clone(),
                    home: home.to_string(),
                    away: away.to_string(),
                    predicted_score: format!("{}-{}", predicted.0, predicted.1),
                    actual_score: actual_score.clone(),
                    total_points: points,
                    cumulative_total_points: 0.0,
                });
            }
        }

        if !played {
            continue;
        }

        for name in &names {
            let earned = round_points.get(name.as_str()).copied().unwrap_or(0.0);
            *cumulative.entry(name.clone()).or_insert(0.0) += earned;
        }

        let mut order = names.clone();
        order.sort_by(|a, b| {
            let pa = cumulative.get(a).copied().unwrap_or(0.0);
            let pb = cumulative.get(b).copied().unwrap_or(0.0);
            pb.total_cmp(&pa).then_with(|| a.cmp(b))
        });
        for (idx, name) in order.iter().enumerate() {
            let position = idx as u32 + 1;
            let rank_change = previous_position
                .get(name)
                .map(|prev| *prev as i32 - position as i32)
                .unwrap_or(0);
            standings.push(StandingsRow {
                matchday,
                name: name.clone(),
                position,
                rank_change,
                cumulative_total_points: cumulative.get(name).copied().unwrap_or(0.0),
                points_change: round_points.get(name.as_str()).copied().unwrap_or(0.0),
            });
            previous_position.insert(name.clone(), position);
        }
    }

    let points = names
        .iter()
        .map(|name| PointsByName {
            name: name.clone(),
            total_points: cumulative.get(name).copied().unwrap_or(0.0),
        })
        .collect();

    DemoSeason {
        results,
        standings,
        points,
        trend,
    }
}

/// Exact score 3, right outcome 1, wrong outcome -1.
pub fn score_prediction(predicted: (u8, u8), actual: (u8, u8)) -> f64 {
    if predicted == actual {
        return 3.0;
    }
    let outcome = |(h, a): (u8, u8)| h.cmp(&a);
    if outcome(predicted) == outcome(actual) {
        1.0
    } else {
        -1.0
    }
}

pub fn write_season(dir: &Path, season: &DemoSeason) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    write_table(dir, &season.results)?;
    write_table(dir, &season.standings)?;
    write_table(dir, &season.points)?;
    write_table(dir, &season.trend)?;
    Ok(())
}

fn write_table<T: Table + Serialize>(dir: &Path, rows: &[T]) -> Result<()> {
    let path = dir.join(T::FILE);
    let mut writer =
        csv::Writer::from_path(&path).with_context(|| format!("open {}", path.display()))?;
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("write row to {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("flush {}", path.display()))?;
    Ok(())
}

fn player_names(count: usize) -> Vec<String> {
    (0..count.max(1))
        .map(|idx| match DEMO_PLAYERS.get(idx) {
            Some(name) => name.to_string(),
            None => format!("Player {}", idx + 1),
        })
        .collect()
}

fn kickoff_timestamp(matchday: u32, slot: usize) -> String {
    let hour = KICKOFF_HOURS[slot % KICKOFF_HOURS.len()];
    NaiveDate::from_ymd_opt(2024, 6, 14)
        .map(|start| start + ChronoDuration::days(i64::from(matchday) - 1))
        .and_then(|day| day.and_hms_opt(hour, 0, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}
