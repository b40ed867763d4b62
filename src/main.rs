use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{
    Axis, Bar, BarChart, BarGroup, Block, Borders, Cell, Chart, Clear, Dataset, GraphType,
    Paragraph, Row, Sparkline, Table, TableState,
};

use euro24_terminal::config::AppConfig;
use euro24_terminal::demo_feed::DEMO_SEED;
use euro24_terminal::error::DashboardError;
use euro24_terminal::export;
use euro24_terminal::state::{AppState, DataSource, Screen, fmt_points};

const CARDS_PER_ROW: usize = 5;

const PLAYER_COLORS: [Color; 10] = [
    Color::Rgb(0xFF, 0xA5, 0x00),
    Color::Rgb(0xE4, 0x01, 0x0B),
    Color::Rgb(0x00, 0x4E, 0xA0),
    Color::Rgb(0x00, 0xA8, 0x5D),
    Color::Rgb(0xFF, 0xD6, 0x00),
    Color::Rgb(0x66, 0xC0, 0xF4),
    Color::Gray,
    Color::Rgb(0x69, 0xFF, 0xB4),
    Color::Rgb(0xFF, 0x69, 0xB4),
    Color::Rgb(0x8A, 0x2B, 0xE2),
];
const GOLD: Color = Color::Rgb(0xFF, 0xD7, 0x00);
const SILVER: Color = Color::Rgb(0xC0, 0xC0, 0xC0);
const BRONZE: Color = Color::Rgb(0xB8, 0x73, 0x33);
const FIELD: Color = Color::Rgb(0xF6, 0x42, 0x71);

struct App {
    state: AppState,
    should_quit: bool,
    export_path: PathBuf,
}

impl App {
    fn new(config: &AppConfig) -> Self {
        let source = if config.demo {
            DataSource::Demo { seed: DEMO_SEED }
        } else {
            DataSource::Dir(config.data_dir.clone())
        };
        Self {
            state: AppState::new(source),
            should_quit: false,
            export_path: config.export_path.clone(),
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('1') => self.state.screen = Screen::Overview,
            KeyCode::Char('2') => self.state.screen = Screen::Standings,
            KeyCode::Char('3') => self.state.screen = Screen::Trends,
            KeyCode::Char('4') => self.state.screen = Screen::Deviation,
            KeyCode::Tab => self.state.next_screen(),
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char('r') | KeyCode::Char('R') => self.state.reload(),
            KeyCode::Char('e') | KeyCode::Char('E') => self.export(),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Esc => self.state.help_overlay = false,
            _ => {}
        }
    }

    fn export(&mut self) {
        let path = self.export_path.display().to_string();
        match export::export_dashboard(&self.export_path, &self.state.dashboard) {
            Ok(report) => {
                self.state.export.path = Some(path.clone());
                self.state.export.failed = false;
                self.state.export.message = format!(
                    "{} standings, {} trend, {} deviation rows",
                    report.standings, report.cumulative, report.deviation
                );
                self.state.push_log(format!("[INFO] Exported leaderboard to {path}"));
                for err in report.errors {
                    self.state.push_log(format!("[WARN] Export skipped section: {err}"));
                }
            }
            Err(err) => {
                self.state.export.path = Some(path);
                self.state.export.failed = true;
                self.state.export.message = format!("{err:#}");
                self.state.push_log(format!("[WARN] Export failed: {err:#}"));
            }
        }
    }
}

fn main() -> io::Result<()> {
    let config = AppConfig::load();
    let mut app = App::new(&config);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.state.screen {
        Screen::Overview => render_overview(frame, chunks[1], &app.state),
        Screen::Standings => render_standings(frame, chunks[1], &app.state),
        Screen::Trends => render_trends(frame, chunks[1], &app.state),
        Screen::Deviation => render_deviation(frame, chunks[1], &app.state),
    }

    let console = Paragraph::new(console_text(&app.state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text()).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let matchday = match &state.dashboard.matchday {
        Ok(cards) => format!("Matchday {}", cards.matchday),
        Err(_) => "Matchday -".to_string(),
    };
    let updated = state
        .dashboard
        .last_updated
        .map(|dt| format!("Updated {}", dt.format("%Y-%m-%d %H:%M")))
        .unwrap_or_else(|| "Updated -".to_string());
    let source = match &state.source {
        DataSource::Dir(dir) => dir.display().to_string(),
        DataSource::Demo { .. } => "demo season".to_string(),
    };
    format!(
        " ⚽ EURO 2024 PREDICTION GAME | {} | {}\n    {} | {}",
        screen_label(state.screen),
        matchday,
        updated,
        source
    )
}

fn footer_text() -> &'static str {
    "1 Overview | 2 Standings | 3 Trends | 4 Deviation | Tab Next | j/k/↑/↓ Move | r Reload | e Export | ? Help | q Quit"
}

fn screen_label(screen: Screen) -> &'static str {
    match screen {
        Screen::Overview => "OVERVIEW",
        Screen::Standings => "STANDINGS",
        Screen::Trends => "TRENDS",
        Screen::Deviation => "DEVIATION",
    }
}

fn render_overview(frame: &mut Frame, area: Rect, state: &AppState) {
    let card_rows = match &state.dashboard.matchday {
        Ok(cards) => cards.cards.len().div_ceil(CARDS_PER_ROW).max(1),
        Err(_) => 1,
    };
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(card_rows as u16 * 3 + 2),
            Constraint::Length(4),
            Constraint::Min(6),
        ])
        .split(area);

    render_results(frame, sections[0], state);
    render_highlights(frame, sections[1], state);
    render_points(frame, sections[2], state);
}

fn render_results(frame: &mut Frame, area: Rect, state: &AppState) {
    let title = match &state.dashboard.matchday {
        Ok(cards) => format!("Matchday {}", cards.matchday),
        Err(_) => "Matchday".to_string(),
    };
    let block = Block::default().title(title).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let cards = match &state.dashboard.matchday {
        Ok(cards) => &cards.cards,
        Err(err) => {
            render_unavailable(frame, inner, err);
            return;
        }
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(3); cards.len().div_ceil(CARDS_PER_ROW)])
        .split(inner);
    for (row_idx, chunk) in cards.chunks(CARDS_PER_ROW).enumerate() {
        let Some(row_area) = rows.get(row_idx) else {
            break;
        };
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, CARDS_PER_ROW as u32); CARDS_PER_ROW])
            .split(*row_area);
        for (card, col) in chunk.iter().zip(cols.iter()) {
            let text = format!("{}\n{} v {}", card.score, card.home, card.away);
            let widget = Paragraph::new(text)
                .style(Style::default().add_modifier(Modifier::BOLD))
                .block(Block::default().title(card.label.clone()).borders(Borders::LEFT));
            frame.render_widget(widget, *col);
        }
    }
}

fn render_highlights(frame: &mut Frame, area: Rect, state: &AppState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);

    let cards = [
        ("🏆 Leader", &state.dashboard.leader),
        ("🔥 Biggest Gainer", &state.dashboard.gainer),
        ("💀 Biggest Loser", &state.dashboard.loser),
    ];
    for ((title, value), col) in cards.into_iter().zip(cols.iter()) {
        let block = Block::default().title(title).borders(Borders::ALL);
        let widget = match value {
            Ok(name) => Paragraph::new(name.clone())
                .style(Style::default().add_modifier(Modifier::BOLD)),
            Err(err) => Paragraph::new(err.to_string()).style(Style::default().fg(Color::DarkGray)),
        };
        frame.render_widget(widget.block(block), *col);
    }
}

fn render_points(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default()
        .title("Euro 2024 Total Points by Name")
        .borders(Borders::ALL);
    let rows = match &state.dashboard.points {
        Ok(rows) => rows,
        Err(err) => {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            render_unavailable(frame, inner, err);
            return;
        }
    };

    let bars = rows
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let color = match idx {
                0 => GOLD,
                1 => SILVER,
                2 => BRONZE,
                _ => FIELD,
            };
            Bar::default()
                .value(row.total_points.max(0.0).round() as u64)
                .text_value(fmt_points(row.total_points))
                .label(Line::from(row.name.clone()))
                .style(Style::default().fg(color))
                .value_style(Style::default().fg(Color::Black).bg(color))
        })
        .collect::<Vec<_>>();

    let inner_width = area.width.saturating_sub(2) as usize;
    let slots = bars.len().max(1);
    let bar_width = ((inner_width / slots).saturating_sub(1)).clamp(3, 12) as u16;

    let chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width)
        .bar_gap(1);
    frame.render_widget(chart, area);
}

fn render_standings(frame: &mut Frame, area: Rect, state: &AppState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(6)])
        .split(area);

    let block = Block::default().title("Overall Standings").borders(Borders::ALL);
    let lines = match &state.dashboard.standings {
        Ok(lines) => lines,
        Err(err) => {
            let inner = block.inner(sections[0]);
            frame.render_widget(block, sections[0]);
            render_unavailable(frame, inner, err);
            return;
        }
    };

    let (lo, hi) = deviation_bounds(lines.iter().flat_map(|l| l.deviation_trend.iter().copied()));
    let header = Row::new(vec![
        "Name",
        "Rank",
        "Rank Change",
        "Reaction",
        "Total Points",
        "Latest Matchday Points",
        "Trend (Δ vs Mean)",
    ])
    .style(Style::default().add_modifier(Modifier::BOLD));

    let rows = lines.iter().map(|line| {
        let change_style = match line.rank_change {
            c if c > 0 => Style::default().fg(Color::Green),
            c if c < 0 => Style::default().fg(Color::Red),
            _ => Style::default(),
        };
        Row::new(vec![
            Cell::from(line.name.clone()),
            Cell::from(line.position.to_string()),
            Cell::from(format!("{:+}", line.rank_change)).style(change_style),
            Cell::from(line.trend.emoji()),
            Cell::from(fmt_points(line.total_points)),
            Cell::from(fmt_points(line.latest_points)),
            Cell::from(sparkline_text(&line.deviation_trend, lo, hi)),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Min(14),
            Constraint::Length(5),
            Constraint::Length(12),
            Constraint::Length(9),
            Constraint::Length(13),
            Constraint::Length(23),
            Constraint::Min(18),
        ],
    )
    .header(header)
    .block(block)
    .highlight_style(Style::default().fg(Color::White).bg(Color::DarkGray))
    .highlight_symbol("> ");

    let mut table_state = TableState::default();
    table_state.select(Some(state.selected.min(lines.len().saturating_sub(1))));
    frame.render_stateful_widget(table, sections[0], &mut table_state);

    render_selected_trend(frame, sections[1], state);
}

fn render_selected_trend(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(line) = state.selected_player() else {
        let empty = Paragraph::new("No player selected")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().title("Trend").borders(Borders::ALL));
        frame.render_widget(empty, area);
        return;
    };

    let (lo, _) = deviation_bounds(line.deviation_trend.iter().copied());
    let data = line
        .deviation_trend
        .iter()
        .map(|v| ((v - lo) * 10.0).round().max(0.0) as u64)
        .collect::<Vec<_>>();
    let title = format!(
        "{} {} | Δ vs mean now {}",
        line.trend.emoji(),
        line.name,
        line.deviation_trend
            .last()
            .map(|v| format!("{v:+.1}"))
            .unwrap_or_else(|| "-".to_string())
    );
    let sparkline = Sparkline::default()
        .block(Block::default().title(title).borders(Borders::ALL))
        .data(&data)
        .style(Style::default().fg(Color::Cyan));
    frame.render_widget(sparkline, area);
}

fn render_trends(frame: &mut Frame, area: Rect, state: &AppState) {
    let series = match &state.dashboard.cumulative {
        Ok(series) => series
            .iter()
            .map(|s| {
                let points = s
                    .points
                    .iter()
                    .map(|p| (f64::from(p.match_code.ordinal()), p.cumulative_total_points))
                    .collect::<Vec<_>>();
                (s.name.clone(), points)
            })
            .collect::<Vec<_>>(),
        Err(err) => {
            render_unavailable_block(frame, area, "Cumulative Points Over Time", err);
            return;
        }
    };
    render_line_chart(
        frame,
        area,
        "Cumulative Points Over Time",
        "Match",
        match_label,
        "Cumulative Total Points",
        &series,
    );
}

fn render_deviation(frame: &mut Frame, area: Rect, state: &AppState) {
    let series = match &state.dashboard.deviation {
        Ok(series) => series
            .iter()
            .map(|s| {
                let points = s
                    .points
                    .iter()
                    .map(|(matchday, diff)| (f64::from(*matchday), *diff))
                    .collect::<Vec<_>>();
                (s.name.clone(), points)
            })
            .collect::<Vec<_>>(),
        Err(err) => {
            render_unavailable_block(
                frame,
                area,
                "Difference from Mean Total Points by Matchday",
                err,
            );
            return;
        }
    };
    render_line_chart(
        frame,
        area,
        "Difference from Mean Total Points by Matchday",
        "Matchday",
        matchday_label,
        "Difference from Mean",
        &series,
    );
}

fn match_label(x: f64) -> String {
    format!("M{:02}", x.round() as u32)
}

fn matchday_label(x: f64) -> String {
    (x.round() as u32).to_string()
}

fn render_line_chart(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    x_title: &str,
    x_label: fn(f64) -> String,
    y_title: &str,
    series: &[(String, Vec<(f64, f64)>)],
) {
    let mut x_bounds: Option<(f64, f64)> = None;
    let (mut y_min, mut y_max) = (0.0_f64, 0.0_f64);
    for (x, y) in series.iter().flat_map(|(_, pts)| pts.iter()) {
        x_bounds = Some(match x_bounds {
            None => (*x, *x),
            Some((lo, hi)) => (lo.min(*x), hi.max(*x)),
        });
        y_min = y_min.min(*y);
        y_max = y_max.max(*y);
    }
    let (x_min, mut x_max) = x_bounds.unwrap_or((0.0, 1.0));
    if x_max - x_min < 1.0 {
        x_max = x_min + 1.0;
    }
    if (y_max - y_min).abs() < f64::EPSILON {
        y_max = y_min + 1.0;
    }

    let datasets = series
        .iter()
        .enumerate()
        .map(|(idx, (name, points))| {
            Dataset::default()
                .name(name.clone())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(PLAYER_COLORS[idx % PLAYER_COLORS.len()]))
                .data(points)
        })
        .collect::<Vec<_>>();

    let x_labels = vec![
        Span::raw(x_label(x_min)),
        Span::raw(x_label((x_min + x_max) / 2.0)),
        Span::raw(x_label(x_max)),
    ];
    let y_labels = vec![
        Span::raw(format!("{y_min:.0}")),
        Span::raw(format!("{:.0}", (y_min + y_max) / 2.0)),
        Span::raw(format!("{y_max:.0}")),
    ];

    let chart = Chart::new(datasets)
        .block(Block::default().title(title.to_string()).borders(Borders::ALL))
        .x_axis(
            Axis::default()
                .title(x_title.to_string())
                .style(Style::default().fg(Color::DarkGray))
                .bounds([x_min, x_max])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .title(y_title.to_string())
                .style(Style::default().fg(Color::DarkGray))
                .bounds([y_min, y_max])
                .labels(y_labels),
        );
    frame.render_widget(chart, area);
}

fn render_unavailable(frame: &mut Frame, area: Rect, err: &DashboardError) {
    let empty = Paragraph::new(format!("Unavailable: {err}"))
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(empty, area);
}

fn render_unavailable_block(frame: &mut Frame, area: Rect, title: &str, err: &DashboardError) {
    let block = Block::default().title(title.to_string()).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    render_unavailable(frame, inner, err);
}

fn deviation_bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut bounds: Option<(f64, f64)> = None;
    for v in values {
        bounds = Some(match bounds {
            None => (v, v),
            Some((lo, hi)) => (lo.min(v), hi.max(v)),
        });
    }
    bounds.unwrap_or((0.0, 0.0))
}

fn sparkline_text(values: &[f64], lo: f64, hi: f64) -> String {
    const TICKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
    let span = hi - lo;
    values
        .iter()
        .map(|v| {
            if span <= f64::EPSILON {
                return TICKS[TICKS.len() / 2];
            }
            let idx = (((v - lo) / span) * (TICKS.len() - 1) as f64).round() as usize;
            TICKS[idx.min(TICKS.len() - 1)]
        })
        .collect()
}

fn console_text(state: &AppState) -> String {
    let mut lines = Vec::new();
    if let Some(path) = &state.export.path {
        let status = if state.export.failed { "failed" } else { "ok" };
        lines.push(format!("Export {status}: {path} ({})", state.export.message));
    }
    if state.logs.is_empty() && lines.is_empty() {
        return "No alerts yet".to_string();
    }
    let keep = 3usize.saturating_sub(lines.len());
    let start = state.logs.len().saturating_sub(keep);
    lines.extend(state.logs.iter().skip(start).cloned());
    lines.join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Euro 2024 Prediction Game - Help",
        "",
        "Screens:",
        "  1            Overview (results, highlights, points)",
        "  2            Standings table",
        "  3            Cumulative points",
        "  4            Difference from mean",
        "  Tab          Next screen",
        "",
        "Actions:",
        "  j/k or ↑/↓   Move selection",
        "  r            Reload tables",
        "  e            Export to xlsx",
        "  ? / Esc      Toggle help",
        "  q            Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
