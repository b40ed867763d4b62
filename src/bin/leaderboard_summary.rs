use anyhow::{Context, Result, anyhow};
use serde::Serialize;

use euro24_terminal::config::{AppConfig, has_flag};
use euro24_terminal::demo_feed::DEMO_SEED;
use euro24_terminal::export::export_dashboard;
use euro24_terminal::standings::PointsMismatch;
use euro24_terminal::state::{Dashboard, DataSource, fmt_opt_points, fmt_points, load_tables};

#[derive(Debug, Serialize)]
struct SummaryRow {
    name: String,
    position: u32,
    rank_change: i32,
    reaction: &'static str,
    total_points: f64,
    latest_points: f64,
}

#[derive(Debug, Serialize)]
struct Summary {
    matchday: Option<u32>,
    leader: Option<String>,
    biggest_gainer: Option<String>,
    biggest_loser: Option<String>,
    standings: Vec<SummaryRow>,
    mismatches: Vec<PointsMismatch>,
    errors: Vec<String>,
}

fn main() -> Result<()> {
    let config = AppConfig::load();
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let source = if config.demo {
        DataSource::Demo { seed: DEMO_SEED }
    } else {
        DataSource::Dir(config.data_dir.clone())
    };

    let tables = load_tables(&source);
    let failures = tables.failures();
    if failures.len() == 4 {
        let reasons = failures
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(anyhow!("no tables could be loaded: {reasons}"));
    }

    let dashboard = Dashboard::from_tables(&tables);
    let summary = build_summary(&dashboard);

    if has_flag(&args, "--json") {
        let json = serde_json::to_string_pretty(&summary).context("serialize summary")?;
        println!("{json}");
    } else {
        print_summary(&summary);
    }

    if has_flag(&args, "--export") || args.iter().any(|a| a.starts_with("--export=")) {
        let report = export_dashboard(&config.export_path, &dashboard)?;
        eprintln!(
            "[INFO] Exported {} standings rows to {}",
            report.standings,
            config.export_path.display()
        );
    }

    Ok(())
}

fn build_summary(dashboard: &Dashboard) -> Summary {
    let standings = dashboard
        .standings
        .as_ref()
        .map(|lines| {
            lines
                .iter()
                .map(|l| SummaryRow {
                    name: l.name.clone(),
                    position: l.position,
                    rank_change: l.rank_change,
                    reaction: l.trend.emoji(),
                    total_points: l.total_points,
                    latest_points: l.latest_points,
                })
                .collect()
        })
        .unwrap_or_default();

    Summary {
        matchday: dashboard.matchday.as_ref().ok().map(|m| m.matchday),
        leader: dashboard.leader.clone().ok(),
        biggest_gainer: dashboard.gainer.clone().ok(),
        biggest_loser: dashboard.loser.clone().ok(),
        standings,
        mismatches: dashboard.mismatches.clone(),
        errors: dashboard
            .section_errors()
            .into_iter()
            .map(|(label, err)| format!("{label}: {err}"))
            .collect(),
    }
}

fn print_summary(summary: &Summary) {
    println!(
        "Euro 2024 Prediction Game - Matchday {}",
        summary
            .matchday
            .map(|m| m.to_string())
            .unwrap_or_else(|| "n/a".to_string())
    );
    println!("Leader:         {}", summary.leader.as_deref().unwrap_or("n/a"));
    println!(
        "Biggest gainer: {}",
        summary.biggest_gainer.as_deref().unwrap_or("n/a")
    );
    println!(
        "Biggest loser:  {}",
        summary.biggest_loser.as_deref().unwrap_or("n/a")
    );
    println!();
    for row in &summary.standings {
        println!(
            "{:>3}. {:<16} {:>4} {} {:>6} ({:+})",
            row.position,
            row.name,
            format!("{:+}", row.rank_change),
            row.reaction,
            fmt_points(row.total_points),
            row.latest_points
        );
    }
    if !summary.mismatches.is_empty() {
        println!();
        println!("Points mismatches: {}", summary.mismatches.len());
        for m in summary.mismatches.iter().take(6) {
            if m.table_rows > 1 {
                println!("  - {}: {} rows in points_by_name", m.name, m.table_rows);
                continue;
            }
            println!(
                "  - {}: trend {} vs table {}",
                m.name,
                fmt_opt_points(m.series_total),
                fmt_opt_points(m.table_total)
            );
        }
    }
    if !summary.errors.is_empty() {
        println!();
        println!("errors: {}", summary.errors.len());
        for err in &summary.errors {
            println!("   - {err}");
        }
    }
}
