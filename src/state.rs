use std::collections::VecDeque;
use std::path::PathBuf;

use chrono::NaiveDateTime;

use crate::demo_feed;
use crate::error::DashboardError;
use crate::flags;
use crate::standings::{
    self, Direction, MatchdayDeviation, MeanDeviation, PlayerSeries, PointsMismatch, RankTrend,
};
use crate::tables::{PointsByName, StandingsRow, Tables};

pub type Section<T> = Result<T, DashboardError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Overview,
    Standings,
    Trends,
    Deviation,
}

impl Screen {
    pub fn next(self) -> Self {
        match self {
            Screen::Overview => Screen::Standings,
            Screen::Standings => Screen::Trends,
            Screen::Trends => Screen::Deviation,
            Screen::Deviation => Screen::Overview,
        }
    }
}

/// Where the tables come from, so a reload reads the same source again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Dir(PathBuf),
    Demo { seed: u64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultCard {
    pub label: String,
    pub home: String,
    pub away: String,
    pub score: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchdayCards {
    pub matchday: u32,
    pub cards: Vec<ResultCard>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StandingsLine {
    pub name: String,
    pub position: u32,
    pub rank_change: i32,
    pub trend: RankTrend,
    pub total_points: f64,
    pub latest_points: f64,
    /// Difference from the mean after each match, oldest first.
    pub deviation_trend: Vec<f64>,
}

/// One player's difference from the mean, keyed by matchday.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviationSeries {
    pub name: String,
    pub points: Vec<(u32, f64)>,
}

/// Every derived section of the leaderboard, each computed on its own.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub matchday: Section<MatchdayCards>,
    pub leader: Section<String>,
    pub gainer: Section<String>,
    pub loser: Section<String>,
    pub points: Section<Vec<PointsByName>>,
    pub standings: Section<Vec<StandingsLine>>,
    pub cumulative: Section<Vec<PlayerSeries>>,
    pub deviation: Section<Vec<DeviationSeries>>,
    pub mismatches: Vec<PointsMismatch>,
    pub last_updated: Option<NaiveDateTime>,
}

impl Dashboard {
    pub fn from_tables(tables: &Tables) -> Self {
        let matchday = tables.results.clone().and_then(|rows| {
            let latest = standings::latest_results(&rows)?;
            let cards = latest
                .fixtures
                .iter()
                .map(|r| ResultCard {
                    label: flags::fixture_label(&r.home, &r.away),
                    home: r.home.clone(),
                    away: r.away.clone(),
                    score: r.actual_score.clone().unwrap_or_default(),
                })
                .collect();
            Ok(MatchdayCards {
                matchday: latest.matchday,
                cards,
            })
        });

        let rows = tables.standings.as_ref();
        let leader = rows
            .map_err(|e| e.clone())
            .and_then(|rows| standings::leader(standings::current_rows(rows)).map(str::to_string));
        let gainer = rows
            .map_err(|e| e.clone())
            .and_then(|rows| standings::biggest_mover(rows, Direction::Gain));
        let loser = rows
            .map_err(|e| e.clone())
            .and_then(|rows| standings::biggest_mover(rows, Direction::Loss));

        let points = tables.points.clone().and_then(|mut rows| {
            if rows.is_empty() {
                return Err(DashboardError::EmptyInput("points"));
            }
            rows.sort_by(|a, b| {
                b.total_points
                    .total_cmp(&a.total_points)
                    .then_with(|| a.name.cmp(&b.name))
            });
            Ok(rows)
        });

        let cumulative = tables.trend.clone().and_then(|rows| {
            if rows.is_empty() {
                return Err(DashboardError::EmptyInput("trend rows"));
            }
            Ok(standings::cumulative_series(&rows))
        });

        let deviation = rows.map_err(|e| e.clone()).and_then(|rows| {
            let by_matchday = standings::matchday_deviation(rows);
            if by_matchday.is_empty() {
                return Err(DashboardError::EmptyInput("standings"));
            }
            Ok(group_deviation(by_matchday))
        });

        let per_match = cumulative
            .as_ref()
            .ok()
            .map(|series| standings::deviation_from_mean(series));
        let table = rows
            .map_err(|e| e.clone())
            .and_then(|rows| standings_lines(rows, per_match.as_deref()));

        let mismatches = match (&cumulative, &tables.points) {
            (Ok(series), Ok(totals)) => standings::reconcile_points(series, totals),
            _ => Vec::new(),
        };

        let last_updated = tables.trend.as_ref().ok().and_then(|rows| {
            rows.iter()
                .filter_map(|r| parse_timestamp(&r.timestamp))
                .max()
        });

        Self {
            matchday,
            leader,
            gainer,
            loser,
            points,
            standings: table,
            cumulative,
            deviation,
            mismatches,
            last_updated,
        }
    }

    /// Errors of every failed section, labelled for the console.
    pub fn section_errors(&self) -> Vec<(&'static str, &DashboardError)> {
        [
            ("matchday", self.matchday.as_ref().err()),
            ("leader", self.leader.as_ref().err()),
            ("gainer", self.gainer.as_ref().err()),
            ("loser", self.loser.as_ref().err()),
            ("points", self.points.as_ref().err()),
            ("standings", self.standings.as_ref().err()),
            ("trends", self.cumulative.as_ref().err()),
            ("deviation", self.deviation.as_ref().err()),
        ]
        .into_iter()
        .filter_map(|(label, err)| err.map(|e| (label, e)))
        .collect()
    }
}

fn standings_lines(
    rows: &[StandingsRow],
    per_match: Option<&[MeanDeviation]>,
) -> Section<Vec<StandingsLine>> {
    let mut current = standings::current_rows(rows);
    if current.is_empty() {
        return Err(DashboardError::EmptyInput("standings"));
    }
    current.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.name.cmp(&b.name)));

    Ok(current
        .into_iter()
        .map(|row| {
            // per_match is ordered by player then match, so filtering keeps order.
            let deviation_trend = per_match
                .map(|all| {
                    all.iter()
                        .filter(|d| d.name == row.name)
                        .map(|d| d.difference)
                        .collect()
                })
                .unwrap_or_default();
            StandingsLine {
                name: row.name.clone(),
                position: row.position,
                rank_change: row.rank_change,
                trend: standings::rank_change_symbol(row.rank_change),
                total_points: row.cumulative_total_points,
                latest_points: row.points_change,
                deviation_trend,
            }
        })
        .collect())
}

// Input arrives ordered by player then matchday.
fn group_deviation(rows: Vec<MatchdayDeviation>) -> Vec<DeviationSeries> {
    let mut out: Vec<DeviationSeries> = Vec::new();
    for row in rows {
        match out.last_mut() {
            Some(series) if series.name == row.name => {
                series.points.push((row.matchday, row.difference));
            }
            _ => out.push(DeviationSeries {
                name: row.name,
                points: vec![(row.matchday, row.difference)],
            }),
        }
    }
    out
}

pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%d/%m/%Y %H:%M:%S",
    ];
    let cleaned = raw.trim();
    if cleaned.is_empty() {
        return None;
    }
    // pandas sometimes keeps fractional seconds
    let cleaned = cleaned.split('.').next().unwrap_or(cleaned);
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(cleaned, fmt).ok())
}

#[derive(Debug, Clone, Default)]
pub struct ExportStatus {
    pub path: Option<String>,
    pub message: String,
    pub failed: bool,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub screen: Screen,
    pub source: DataSource,
    pub dashboard: Dashboard,
    pub selected: usize,
    pub help_overlay: bool,
    pub export: ExportStatus,
    pub logs: VecDeque<String>,
}

impl AppState {
    pub fn new(source: DataSource) -> Self {
        let tables = load_tables(&source);
        let mut state = Self {
            screen: Screen::Overview,
            dashboard: Dashboard::from_tables(&tables),
            source,
            selected: 0,
            help_overlay: false,
            export: ExportStatus::default(),
            logs: VecDeque::with_capacity(200),
        };
        state.log_load(&tables);
        state
    }

    pub fn reload(&mut self) {
        let tables = load_tables(&self.source);
        self.dashboard = Dashboard::from_tables(&tables);
        self.push_log("[INFO] Tables reloaded");
        self.log_load(&tables);
        self.clamp_selection();
    }

    fn log_load(&mut self, tables: &Tables) {
        match &self.source {
            DataSource::Dir(dir) => {
                let msg = format!("[INFO] Data directory: {}", dir.display());
                self.push_log(msg);
            }
            DataSource::Demo { seed } => {
                let msg = format!("[INFO] Demo season (seed {seed})");
                self.push_log(msg);
            }
        }
        let loaded = 4 - tables.failures().len();
        self.push_log(format!("[INFO] Loaded {loaded}/4 tables"));
        let section_msgs = self
            .dashboard
            .section_errors()
            .into_iter()
            .map(|(label, err)| format!("[WARN] {label}: {err}"))
            .collect::<Vec<_>>();
        for msg in section_msgs {
            self.push_log(msg);
        }
        let mismatch_msgs = self
            .dashboard
            .mismatches
            .iter()
            .map(mismatch_warning)
            .collect::<Vec<_>>();
        for msg in mismatch_msgs {
            self.push_log(msg);
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn next_screen(&mut self) {
        self.screen = self.screen.next();
    }

    fn row_count(&self) -> usize {
        self.dashboard
            .standings
            .as_ref()
            .map(|rows| rows.len())
            .unwrap_or(0)
    }

    pub fn select_next(&mut self) {
        let total = self.row_count();
        if total == 0 {
            self.selected = 0;
            return;
        }
        self.selected = (self.selected + 1).min(total - 1);
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn clamp_selection(&mut self) {
        let total = self.row_count();
        if total == 0 {
            self.selected = 0;
        } else if self.selected >= total {
            self.selected = total - 1;
        }
    }

    pub fn selected_player(&self) -> Option<&StandingsLine> {
        self.dashboard
            .standings
            .as_ref()
            .ok()
            .and_then(|rows| rows.get(self.selected))
    }
}

pub fn load_tables(source: &DataSource) -> Tables {
    match source {
        DataSource::Dir(dir) => Tables::load(dir),
        DataSource::Demo { seed } => demo_feed::demo_season(*seed, 10, 3).into_tables(),
    }
}

pub fn mismatch_warning(m: &PointsMismatch) -> String {
    if m.table_rows > 1 {
        return format!(
            "[WARN] Points mismatch for {}: {} rows in points_by_name",
            m.name, m.table_rows
        );
    }
    format!(
        "[WARN] Points mismatch for {}: trend {} vs table {}",
        m.name,
        fmt_opt_points(m.series_total),
        fmt_opt_points(m.table_total)
    )
}

pub fn fmt_opt_points(value: Option<f64>) -> String {
    value
        .map(fmt_points)
        .unwrap_or_else(|| "-".to_string())
}

/// Points without a trailing `.0` when they are whole.
pub fn fmt_points(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}
