use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;

use euro24_terminal::demo_feed::{DEMO_SEED, demo_season, score_prediction, write_season};
use euro24_terminal::error::DashboardError;
use euro24_terminal::export::export_dashboard;
use euro24_terminal::flags::{UNKNOWN_FLAG, country_flag, fixture_label};
use euro24_terminal::standings::{
    RankTrend, cumulative_series, current_matchday, latest_results, reconcile_points,
};
use euro24_terminal::state::{
    AppState, Dashboard, DataSource, Screen, fmt_opt_points, fmt_points, load_tables,
    mismatch_warning, parse_timestamp,
};
use euro24_terminal::tables::{PointsByName, Tables};

fn fixture_dir(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("euro24_terminal_{}_{name}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("scratch dir should be creatable");
    dir
}

fn season_dashboard() -> Dashboard {
    Dashboard::from_tables(&Tables::load(&fixture_dir("season")))
}

#[test]
fn season_highlights() {
    let dashboard = season_dashboard();
    assert!(dashboard.section_errors().is_empty());
    assert_eq!(dashboard.leader.as_deref(), Ok("Tom"));
    assert_eq!(dashboard.gainer.as_deref(), Ok("Tom"));
    // Ed and Jay both dropped one place; Jay has fewer points.
    assert_eq!(dashboard.loser.as_deref(), Ok("Jay"));
    assert!(dashboard.mismatches.is_empty());
}

#[test]
fn season_result_cards_use_latest_played_matchday() {
    let dashboard = season_dashboard();
    let cards = dashboard.matchday.expect("matchday section");
    assert_eq!(cards.matchday, 2);
    assert_eq!(cards.cards.len(), 2);
    assert_eq!(cards.cards[0].home, "Germany");
    assert_eq!(cards.cards[0].score, "2-0");
    assert_eq!(cards.cards[0].label, fixture_label("Germany", "Hungary"));
    assert_eq!(cards.cards[1].score, "1-1");
}

#[test]
fn season_points_are_sorted_descending() {
    let dashboard = season_dashboard();
    let points = dashboard.points.expect("points section");
    let order = points.iter().map(|p| p.name.as_str()).collect::<Vec<_>>();
    assert_eq!(order, vec!["Tom", "Ed", "Jay"]);
}

#[test]
fn season_standings_lines_carry_trend_and_deviation() {
    let dashboard = season_dashboard();
    let lines = dashboard.standings.expect("standings section");
    let names = lines.iter().map(|l| l.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["Tom", "Ed", "Jay"]);

    assert_eq!(lines[0].trend, RankTrend::Surge);
    assert_eq!(lines[1].trend, RankTrend::Down);
    assert_eq!(lines[0].total_points, 6.0);
    assert_eq!(lines[2].latest_points, -1.0);

    assert_eq!(lines[0].deviation_trend, vec![0.0, -2.0, -2.0, 0.0, 2.0]);
    assert_eq!(lines[1].deviation_trend, vec![0.0, 2.0, 2.0, 2.0, 1.0]);
    assert_eq!(lines[2].deviation_trend, vec![0.0, 0.0, 0.0, -2.0, -3.0]);
}

#[test]
fn season_cumulative_series_ignore_shuffled_rows() {
    let dashboard = season_dashboard();
    let series = dashboard.cumulative.expect("trend section");
    let tom = series.iter().find(|s| s.name == "Tom").expect("Tom series");
    let running = tom
        .points
        .iter()
        .map(|p| p.cumulative_total_points)
        .collect::<Vec<_>>();
    assert_eq!(running, vec![0.0, -1.0, 0.0, 3.0, 6.0]);

}

#[test]
fn season_deviation_chart_is_per_matchday() {
    let dashboard = season_dashboard();
    let deviation = dashboard.deviation.expect("deviation section");
    let got = deviation
        .iter()
        .map(|s| (s.name.as_str(), s.points.clone()))
        .collect::<Vec<_>>();
    // Matchday means are 2 and 4.
    assert_eq!(
        got,
        vec![
            ("Ed", vec![(1, 2.0), (2, 1.0)]),
            ("Jay", vec![(1, 0.0), (2, -3.0)]),
            ("Tom", vec![(1, -2.0), (2, 2.0)]),
        ]
    );
}

#[test]
fn season_last_updated_is_latest_timestamp() {
    let dashboard = season_dashboard();
    let expected = NaiveDate::from_ymd_opt(2024, 6, 16)
        .and_then(|d| d.and_hms_opt(18, 0, 0))
        .expect("valid date");
    assert_eq!(dashboard.last_updated, Some(expected));
}

#[test]
fn broken_tables_only_blank_their_sections() {
    let dashboard = Dashboard::from_tables(&Tables::load(&fixture_dir("broken")));

    let points = dashboard.points.as_ref().expect("points should survive");
    assert_eq!(points[0].name, "Tom");

    assert!(matches!(dashboard.matchday, Err(DashboardError::Read { .. })));
    assert!(matches!(dashboard.cumulative, Err(DashboardError::Read { .. })));
    assert!(matches!(
        dashboard.deviation,
        Err(DashboardError::MissingColumn { .. })
    ));
    assert_eq!(
        dashboard.leader,
        Err(DashboardError::MissingColumn {
            table: "overall_standings",
            column: "position",
        })
    );
    assert!(dashboard.gainer.is_err());
    assert!(dashboard.standings.is_err());
    assert!(dashboard.mismatches.is_empty());
    assert_eq!(dashboard.last_updated, None);

    let labels = dashboard
        .section_errors()
        .into_iter()
        .map(|(label, _)| label)
        .collect::<Vec<_>>();
    assert_eq!(
        labels,
        vec!["matchday", "leader", "gainer", "loser", "standings", "trends", "deviation"]
    );
}

#[test]
fn mismatched_totals_are_flagged_not_fatal() {
    let mut tables = Tables::load(&fixture_dir("season"));
    if let Ok(points) = tables.points.as_mut() {
        points[0].total_points += 1.0;
    }
    let dashboard = Dashboard::from_tables(&tables);
    assert_eq!(dashboard.mismatches.len(), 1);
    assert_eq!(dashboard.mismatches[0].name, "Ed");
    assert_eq!(dashboard.leader.as_deref(), Ok("Tom"));
}

#[test]
fn duplicated_totals_row_is_warned_about() {
    let mut tables = Tables::load(&fixture_dir("season"));
    if let Ok(points) = tables.points.as_mut() {
        points.push(PointsByName {
            name: "Jay".to_string(),
            total_points: 0.0,
        });
    }
    let dashboard = Dashboard::from_tables(&tables);
    assert_eq!(dashboard.mismatches.len(), 1);
    assert_eq!(dashboard.mismatches[0].table_rows, 2);

    assert_eq!(
        mismatch_warning(&dashboard.mismatches[0]),
        "[WARN] Points mismatch for Jay: 2 rows in points_by_name"
    );
}

#[test]
fn demo_source_uses_shared_seed() {
    let from_source = load_tables(&DataSource::Demo { seed: DEMO_SEED });
    let direct = demo_season(DEMO_SEED, 10, 3);
    assert_eq!(from_source.trend.as_ref().ok(), Some(&direct.trend));
    assert_eq!(from_source.standings.as_ref().ok(), Some(&direct.standings));
}

#[test]
fn export_writes_every_sheet() {
    let dir = scratch_dir("export");
    let path = dir.join("leaderboard.xlsx");
    let report = export_dashboard(&path, &season_dashboard()).expect("export should succeed");
    assert!(path.exists());
    assert_eq!(report.standings, 3);
    assert_eq!(report.points, 3);
    assert_eq!(report.cumulative, 15);
    assert_eq!(report.deviation, 6);
    assert!(report.errors.is_empty());
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn export_keeps_going_when_sections_fail() {
    let dir = scratch_dir("export_broken");
    let path = dir.join("leaderboard.xlsx");
    let dashboard = Dashboard::from_tables(&Tables::load(&fixture_dir("broken")));
    let report = export_dashboard(&path, &dashboard).expect("export should succeed");
    assert!(path.exists());
    assert_eq!(report.points, 3);
    assert_eq!(report.standings, 0);
    assert_eq!(report.errors.len(), 3);
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn app_state_logs_load_and_clamps_selection() {
    let mut state = AppState::new(DataSource::Dir(fixture_dir("season")));
    assert!(state.logs.iter().any(|l| l == "[INFO] Loaded 4/4 tables"));
    assert!(!state.logs.iter().any(|l| l.starts_with("[WARN]")));

    for _ in 0..10 {
        state.select_next();
    }
    assert_eq!(state.selected, 2);
    assert_eq!(state.selected_player().map(|p| p.name.as_str()), Some("Jay"));
    state.select_prev();
    assert_eq!(state.selected_player().map(|p| p.name.as_str()), Some("Ed"));

    state.reload();
    assert_eq!(state.selected, 1);
    assert!(state.logs.iter().any(|l| l == "[INFO] Tables reloaded"));
}

#[test]
fn app_state_warns_about_broken_sections() {
    let mut state = AppState::new(DataSource::Dir(fixture_dir("broken")));
    assert!(state.logs.iter().any(|l| l == "[INFO] Loaded 1/4 tables"));
    assert!(
        state
            .logs
            .iter()
            .any(|l| l.starts_with("[WARN] leader:") && l.contains("position"))
    );
    state.select_next();
    assert_eq!(state.selected, 0);
    assert!(state.selected_player().is_none());
}

#[test]
fn app_state_log_is_bounded() {
    let mut state = AppState::new(DataSource::Demo { seed: 1 });
    for idx in 0..500 {
        state.push_log(format!("[INFO] line {idx}"));
    }
    assert_eq!(state.logs.len(), 200);
    assert_eq!(state.logs.back().map(String::as_str), Some("[INFO] line 499"));
}

#[test]
fn screens_cycle_in_order() {
    let mut state = AppState::new(DataSource::Demo { seed: 3 });
    assert_eq!(state.screen, Screen::Overview);
    let mut seen = Vec::new();
    for _ in 0..4 {
        state.next_screen();
        seen.push(state.screen);
    }
    assert_eq!(
        seen,
        vec![Screen::Standings, Screen::Trends, Screen::Deviation, Screen::Overview]
    );
}

#[test]
fn demo_season_tables_agree() {
    let season = demo_season(2024, 10, 3);
    assert_eq!(current_matchday(&season.standings), Some(3));
    assert_eq!(season.standings.len(), 30);
    assert_eq!(season.trend.len(), 10 * 3 * 4);

    let latest = latest_results(&season.results).expect("played matches");
    assert_eq!(latest.matchday, 3);
    assert_eq!(latest.fixtures.len(), 4);
    assert!(season.results.iter().any(|r| r.matchday == 4 && r.actual_score.is_none()));

    let series = cumulative_series(&season.trend);
    assert!(reconcile_points(&series, &season.points).is_empty());

    let dashboard = Dashboard::from_tables(&season.into_tables());
    assert!(dashboard.section_errors().is_empty());
}

#[test]
fn demo_season_is_reproducible_per_seed() {
    let a = demo_season(99, 6, 2);
    let b = demo_season(99, 6, 2);
    assert_eq!(a.trend, b.trend);
    assert_eq!(a.standings, b.standings);
    assert_eq!(a.points.len(), 6);
}

#[test]
fn demo_season_written_to_disk_loads_back() {
    let dir = scratch_dir("demo");
    let season = demo_season(5, 4, 2);
    write_season(&dir, &season).expect("demo tables should be written");

    let tables = Tables::load(&dir);
    assert!(tables.failures().is_empty());
    assert_eq!(tables.trend.as_ref().map(Vec::len), Ok(season.trend.len()));
    assert_eq!(tables.standings.as_ref().ok(), Some(&season.standings));

    let from_disk = Dashboard::from_tables(&tables);
    let in_memory = Dashboard::from_tables(&season.into_tables());
    assert_eq!(from_disk.leader, in_memory.leader);
    assert_eq!(from_disk.mismatches, in_memory.mismatches);
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn prediction_scoring() {
    assert_eq!(score_prediction((2, 1), (2, 1)), 3.0);
    assert_eq!(score_prediction((3, 0), (1, 0)), 1.0);
    assert_eq!(score_prediction((1, 1), (0, 0)), 1.0);
    assert_eq!(score_prediction((0, 2), (1, 0)), -1.0);
}

#[test]
fn flags_and_labels() {
    assert_eq!(country_flag("Germany"), "🇩🇪");
    assert_eq!(country_flag(" spain "), "🇪🇸");
    assert_eq!(country_flag("Atlantis"), UNKNOWN_FLAG);
    assert_eq!(fixture_label("France", "Atlantis"), format!("🇫🇷 v {UNKNOWN_FLAG}"));
}

#[test]
fn points_formatting() {
    assert_eq!(fmt_points(6.0), "6");
    assert_eq!(fmt_points(-1.0), "-1");
    assert_eq!(fmt_points(2.5), "2.5");
    assert_eq!(fmt_opt_points(None), "-");
}

#[test]
fn timestamps_in_common_layouts() {
    let expected = NaiveDate::from_ymd_opt(2024, 6, 14).and_then(|d| d.and_hms_opt(21, 0, 0));
    assert_eq!(parse_timestamp("2024-06-14 21:00:00"), expected);
    assert_eq!(parse_timestamp("2024-06-14T21:00:00"), expected);
    assert_eq!(parse_timestamp("2024-06-14 21:00:00.000"), expected);
    assert_eq!(parse_timestamp("14/06/2024 21:00:00"), expected);
    assert_eq!(parse_timestamp(""), None);
    assert_eq!(parse_timestamp("kick-off"), None);
}
