//! Leaderboard reductions over the pre-computed prediction tables.
//!
//! Everything here is a pure function over borrowed rows; the dashboard
//! calls each one separately so a failure only blanks its own section.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use crate::error::DashboardError;
use crate::tables::{MatchCode, MatchResult, PointsByName, StandingsRow, TrendPoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Gain,
    Loss,
}

/// Reaction bucket for a rank change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RankTrend {
    Surge,
    Up,
    Flat,
    Down,
    Plunge,
}

impl RankTrend {
    pub fn label(self) -> &'static str {
        match self {
            RankTrend::Surge => "surge",
            RankTrend::Up => "up",
            RankTrend::Flat => "flat",
            RankTrend::Down => "down",
            RankTrend::Plunge => "plunge",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            RankTrend::Surge => "🔥",
            RankTrend::Up => "👍",
            RankTrend::Flat => "🥱",
            RankTrend::Down => "😵",
            RankTrend::Plunge => "💀",
        }
    }
}

impl fmt::Display for RankTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSeries {
    pub name: String,
    pub points: Vec<TrendPoint>,
}

impl PlayerSeries {
    pub fn total(&self) -> f64 {
        self.points.iter().map(|p| p.total_points).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeanDeviation {
    pub name: String,
    pub stage_detail: MatchCode,
    pub difference: f64,
}

/// Distance from the field mean after a whole matchday.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchdayDeviation {
    pub name: String,
    pub matchday: u32,
    pub difference: f64,
}

/// A player whose trend rows do not add up to their season total, or who
/// appears more than once in the totals table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointsMismatch {
    pub name: String,
    pub series_total: Option<f64>,
    pub table_total: Option<f64>,
    pub table_rows: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LatestResults {
    pub matchday: u32,
    pub fixtures: Vec<MatchResult>,
}

const POINTS_EPSILON: f64 = 1e-6;

pub fn rank_change_symbol(change: i32) -> RankTrend {
    match change {
        c if c >= 2 => RankTrend::Surge,
        1 => RankTrend::Up,
        -1 => RankTrend::Down,
        c if c <= -2 => RankTrend::Plunge,
        _ => RankTrend::Flat,
    }
}

pub fn current_matchday(rows: &[StandingsRow]) -> Option<u32> {
    rows.iter().map(|r| r.matchday).max()
}

pub fn current_rows(rows: &[StandingsRow]) -> Vec<&StandingsRow> {
    let Some(matchday) = current_matchday(rows) else {
        return Vec::new();
    };
    rows.iter().filter(|r| r.matchday == matchday).collect()
}

/// Name at position 1. Rows are expected to cover a single matchday.
pub fn leader<'a, I>(rows: I) -> Result<&'a str, DashboardError>
where
    I: IntoIterator<Item = &'a StandingsRow>,
{
    let mut seen = 0usize;
    let mut leaders = Vec::new();
    for row in rows {
        seen += 1;
        if row.position == 1 {
            leaders.push(row.name.as_str());
        }
    }
    if seen == 0 {
        return Err(DashboardError::EmptyInput("standings"));
    }
    match leaders.as_slice() {
        [only] => Ok(*only),
        _ => Err(DashboardError::AmbiguousLeader {
            count: leaders.len(),
        }),
    }
}

/// Player with the most extreme rank change across every matchday in `rows`.
///
/// Ties on the rank change go to the best (gain) or worst (loss) cumulative
/// points taken from each tied player's latest tied row.
pub fn biggest_mover(rows: &[StandingsRow], direction: Direction) -> Result<String, DashboardError> {
    let changes = rows.iter().map(|r| r.rank_change);
    let extreme = match direction {
        Direction::Gain => changes.max(),
        Direction::Loss => changes.min(),
    }
    .ok_or(DashboardError::EmptyInput("standings"))?;

    // name -> (matchday, cumulative points) of the latest tied row
    let mut tied: BTreeMap<&str, (u32, f64)> = BTreeMap::new();
    for row in rows.iter().filter(|r| r.rank_change == extreme) {
        let entry = tied
            .entry(row.name.as_str())
            .or_insert((row.matchday, row.cumulative_total_points));
        if row.matchday >= entry.0 {
            *entry = (row.matchday, row.cumulative_total_points);
        }
    }

    if tied.len() == 1 {
        if let Some(name) = tied.keys().next() {
            return Ok((*name).to_string());
        }
    }

    // BTreeMap iterates by name, so an exact tie keeps the alphabetically first.
    let mut best: Option<(&str, f64)> = None;
    for (name, (_, points)) in &tied {
        let better = match best {
            None => true,
            Some((_, current)) => match direction {
                Direction::Gain => points.total_cmp(&current).is_gt(),
                Direction::Loss => points.total_cmp(&current).is_lt(),
            },
        };
        if better {
            best = Some((*name, *points));
        }
    }
    best.map(|(name, _)| name.to_string())
        .ok_or(DashboardError::EmptyInput("standings"))
}

/// Running points total per player, starting from a zero `M00` origin.
///
/// Players come back in name order and each series is sorted by match
/// ordinal, so the result does not depend on input row order.
pub fn cumulative_series(points: &[TrendPoint]) -> Vec<PlayerSeries> {
    let mut grouped: BTreeMap<&str, Vec<&TrendPoint>> = BTreeMap::new();
    for point in points {
        grouped.entry(point.name.as_str()).or_default().push(point);
    }

    grouped
        .into_iter()
        .map(|(name, mut rows)| {
            // Full key so duplicate codes still order deterministically.
            rows.sort_by(|a, b| {
                a.match_code
                    .cmp(&b.match_code)
                    .then_with(|| a.timestamp.cmp(&b.timestamp))
                    .then_with(|| a.total_points.total_cmp(&b.total_points))
                    .then_with(|| a.home.cmp(&b.home))
                    .then_with(|| a.away.cmp(&b.away))
                    .then_with(|| a.predicted_score.cmp(&b.predicted_score))
            });

            let mut series = Vec::with_capacity(rows.len() + 1);
            series.push(TrendPoint::origin(name));
            let mut running = 0.0;
            for row in rows {
                running += row.total_points;
                let mut point = row.clone();
                point.cumulative_total_points = running;
                series.push(point);
            }
            PlayerSeries {
                name: name.to_string(),
                points: series,
            }
        })
        .collect()
}

/// Each player's distance from the field average after every match.
pub fn deviation_from_mean(series: &[PlayerSeries]) -> Vec<MeanDeviation> {
    let mut stages: BTreeMap<u32, (f64, usize)> = BTreeMap::new();
    for player in series {
        for point in &player.points {
            let stage = stages.entry(point.match_code.ordinal()).or_insert((0.0, 0));
            stage.0 += point.cumulative_total_points;
            stage.1 += 1;
        }
    }

    let mut out = Vec::new();
    for player in series {
        for point in &player.points {
            let Some((sum, count)) = stages.get(&point.match_code.ordinal()) else {
                continue;
            };
            let mean = sum / *count as f64;
            out.push(MeanDeviation {
                name: player.name.clone(),
                stage_detail: point.match_code.clone(),
                difference: point.cumulative_total_points - mean,
            });
        }
    }
    out
}

/// Each player's cumulative points minus the field mean, per matchday of the
/// standings table. Rows come back ordered by player, then matchday.
pub fn matchday_deviation(rows: &[StandingsRow]) -> Vec<MatchdayDeviation> {
    let mut stages: BTreeMap<u32, (f64, usize)> = BTreeMap::new();
    let mut players: BTreeMap<&str, BTreeMap<u32, f64>> = BTreeMap::new();
    for row in rows {
        let stage = stages.entry(row.matchday).or_insert((0.0, 0));
        stage.0 += row.cumulative_total_points;
        stage.1 += 1;
        players
            .entry(row.name.as_str())
            .or_default()
            .insert(row.matchday, row.cumulative_total_points);
    }

    let mut out = Vec::new();
    for (name, by_matchday) in players {
        for (matchday, points) in by_matchday {
            let Some((sum, count)) = stages.get(&matchday) else {
                continue;
            };
            out.push(MatchdayDeviation {
                name: name.to_string(),
                matchday,
                difference: points - sum / *count as f64,
            });
        }
    }
    out
}

pub fn reconcile_points(series: &[PlayerSeries], totals: &[PointsByName]) -> Vec<PointsMismatch> {
    let series_totals: BTreeMap<&str, f64> =
        series.iter().map(|s| (s.name.as_str(), s.total())).collect();
    // name -> (summed total, row count)
    let mut table_totals: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for row in totals {
        let entry = table_totals.entry(row.name.as_str()).or_insert((0.0, 0));
        entry.0 += row.total_points;
        entry.1 += 1;
    }

    let names: BTreeSet<&str> = series_totals
        .keys()
        .chain(table_totals.keys())
        .copied()
        .collect();

    names
        .into_iter()
        .filter_map(|name| {
            let series_total = series_totals.get(name).copied();
            let (table_total, table_rows) = match table_totals.get(name) {
                Some((total, rows)) => (Some(*total), *rows),
                None => (None, 0),
            };
            let agrees = match (series_total, table_total) {
                (Some(a), Some(b)) => table_rows == 1 && (a - b).abs() <= POINTS_EPSILON,
                _ => false,
            };
            (!agrees).then(|| PointsMismatch {
                name: name.to_string(),
                series_total,
                table_total,
                table_rows,
            })
        })
        .collect()
}

/// Played fixtures of the most recent matchday that has a result.
pub fn latest_results(results: &[MatchResult]) -> Result<LatestResults, DashboardError> {
    let played = |r: &&MatchResult| {
        r.actual_score
            .as_deref()
            .is_some_and(|score| !score.trim().is_empty())
    };
    let matchday = results
        .iter()
        .filter(played)
        .map(|r| r.matchday)
        .max()
        .ok_or(DashboardError::EmptyInput("played matches"))?;
    let fixtures = results
        .iter()
        .filter(played)
        .filter(|r| r.matchday == matchday)
        .cloned()
        .collect();
    Ok(LatestResults { matchday, fixtures })
}
