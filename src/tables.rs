use std::cmp::Ordering;
use std::fmt;
use std::io;
use std::path::Path;
use std::str::FromStr;

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};

use crate::error::DashboardError;

/// A CSV table the dashboard knows how to read.
pub trait Table: DeserializeOwned {
    const NAME: &'static str;
    const FILE: &'static str;
    const REQUIRED: &'static [&'static str];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    #[serde(deserialize_with = "de_int")]
    pub matchday: u32,
    pub home: String,
    pub away: String,
    #[serde(default)]
    pub actual_score: Option<String>,
}

impl Table for MatchResult {
    const NAME: &'static str = "results";
    const FILE: &'static str = "results.csv";
    const REQUIRED: &'static [&'static str] = &["matchday", "home", "away"];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingsRow {
    #[serde(deserialize_with = "de_int")]
    pub matchday: u32,
    pub name: String,
    #[serde(deserialize_with = "de_int")]
    pub position: u32,
    #[serde(deserialize_with = "de_int")]
    pub rank_change: i32,
    #[serde(deserialize_with = "de_float")]
    pub cumulative_total_points: f64,
    #[serde(deserialize_with = "de_float")]
    pub points_change: f64,
}

impl Table for StandingsRow {
    const NAME: &'static str = "overall_standings";
    const FILE: &'static str = "overall_standings.csv";
    const REQUIRED: &'static [&'static str] = &[
        "matchday",
        "name",
        "position",
        "rank_change",
        "cumulative_total_points",
        "points_change",
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointsByName {
    pub name: String,
    pub total_points: f64,
}

impl Table for PointsByName {
    const NAME: &'static str = "points_by_name";
    const FILE: &'static str = "points_by_name.csv";
    const REQUIRED: &'static [&'static str] = &["name", "total_points"];
}

/// One prediction row: a player's pick for one match and the points it earned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    #[serde(default)]
    pub timestamp: String,
    pub name: String,
    pub match_code: MatchCode,
    #[serde(default)]
    pub home: String,
    #[serde(default)]
    pub away: String,
    #[serde(default)]
    pub predicted_score: String,
    #[serde(default)]
    pub actual_score: String,
    pub total_points: f64,
    // Filled in by the aggregator; the source table does not carry it.
    #[serde(default)]
    pub cumulative_total_points: f64,
}

impl TrendPoint {
    /// Zero-point series origin for `name`.
    pub fn origin(name: &str) -> Self {
        Self {
            timestamp: String::new(),
            name: name.to_string(),
            match_code: MatchCode::origin(),
            home: String::new(),
            away: String::new(),
            predicted_score: String::new(),
            actual_score: String::new(),
            total_points: 0.0,
            cumulative_total_points: 0.0,
        }
    }
}

impl Table for TrendPoint {
    const NAME: &'static str = "df_merged";
    const FILE: &'static str = "df_merged.csv";
    const REQUIRED: &'static [&'static str] = &["name", "match_code", "total_points"];
}

/// Ordinal match token such as `M07`. Orders by the number, not the text;
/// `M7` and `M07` parse to the same code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MatchCode {
    ordinal: u32,
    token: String,
}

impl MatchCode {
    pub fn new(ordinal: u32) -> Self {
        Self {
            ordinal,
            token: format!("M{ordinal:02}"),
        }
    }

    pub fn origin() -> Self {
        Self::new(0)
    }

    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    pub fn as_str(&self) -> &str {
        &self.token
    }
}

impl FromStr for MatchCode {
    type Err = DashboardError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let token = raw.trim();
        let digits = token
            .strip_prefix('M')
            .or_else(|| token.strip_prefix('m'))
            .ok_or_else(|| DashboardError::InvalidMatchCode(raw.to_string()))?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DashboardError::InvalidMatchCode(raw.to_string()));
        }
        let ordinal = digits
            .parse::<u32>()
            .map_err(|_| DashboardError::InvalidMatchCode(raw.to_string()))?;
        Ok(Self::new(ordinal))
    }
}

impl TryFrom<String> for MatchCode {
    type Error = DashboardError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<MatchCode> for String {
    fn from(code: MatchCode) -> Self {
        code.token
    }
}

impl fmt::Display for MatchCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token)
    }
}

impl Ord for MatchCode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ordinal.cmp(&other.ordinal)
    }
}

impl PartialOrd for MatchCode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Every input table, each loaded on its own so one bad file only takes out
/// the sections that depend on it.
#[derive(Debug, Clone)]
pub struct Tables {
    pub results: Result<Vec<MatchResult>, DashboardError>,
    pub standings: Result<Vec<StandingsRow>, DashboardError>,
    pub points: Result<Vec<PointsByName>, DashboardError>,
    pub trend: Result<Vec<TrendPoint>, DashboardError>,
}

impl Tables {
    pub fn load(dir: &Path) -> Self {
        Self {
            results: load_table(dir),
            standings: load_table(dir),
            points: load_table(dir),
            trend: load_table(dir),
        }
    }

    pub fn failures(&self) -> Vec<&DashboardError> {
        [
            self.results.as_ref().err(),
            self.standings.as_ref().err(),
            self.points.as_ref().err(),
            self.trend.as_ref().err(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

pub fn load_table<T: Table>(dir: &Path) -> Result<Vec<T>, DashboardError> {
    let path = dir.join(T::FILE);
    let file = std::fs::File::open(&path).map_err(|err| DashboardError::Read {
        path: path.display().to_string(),
        message: err.to_string(),
    })?;
    read_table(file)
}

pub fn parse_table<T: Table>(raw: &str) -> Result<Vec<T>, DashboardError> {
    read_table(raw.as_bytes())
}

fn read_table<T: Table, R: io::Read>(source: R) -> Result<Vec<T>, DashboardError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader.headers().map_err(|err| DashboardError::Parse {
        table: T::NAME,
        line: 1,
        message: err.to_string(),
    })?;
    for column in T::REQUIRED {
        if !headers.iter().any(|h| h == *column) {
            return Err(DashboardError::MissingColumn {
                table: T::NAME,
                column: *column,
            });
        }
    }

    let mut rows = Vec::new();
    for record in reader.deserialize::<T>() {
        let row = record.map_err(|err| DashboardError::Parse {
            table: T::NAME,
            line: err.position().map(|p| p.line()).unwrap_or(0),
            message: csv_error_message(&err),
        })?;
        rows.push(row);
    }
    Ok(rows)
}

fn csv_error_message(err: &csv::Error) -> String {
    match err.kind() {
        csv::ErrorKind::Deserialize { err, .. } => err.to_string(),
        _ => err.to_string(),
    }
}

/// Integer column that tolerates pandas output: `"2.0"` and empty cells (as 0).
fn de_int<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
{
    let raw = String::deserialize(deserializer)?;
    let trimmed = raw.trim();
    let value = if trimmed.is_empty() {
        0
    } else if let Ok(v) = trimmed.parse::<i64>() {
        v
    } else {
        let f = trimmed
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("not an integer: {trimmed}")))?;
        if !f.is_finite() || f.fract() != 0.0 {
            return Err(de::Error::custom(format!("not an integer: {trimmed}")));
        }
        f as i64
    };
    T::try_from(value).map_err(|_| de::Error::custom(format!("integer out of range: {value}")))
}

/// Float column where an empty cell means 0.
fn de_float<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    trimmed
        .parse::<f64>()
        .map_err(|_| de::Error::custom(format!("not a number: {trimmed}")))
}
