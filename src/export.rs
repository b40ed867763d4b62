use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::state::{Dashboard, Section, fmt_points};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub standings: usize,
    pub points: usize,
    pub cumulative: usize,
    pub deviation: usize,
    pub errors: Vec<String>,
}

pub fn export_dashboard(path: &Path, dashboard: &Dashboard) -> Result<ExportReport> {
    let mut report = ExportReport::default();

    let standings_rows = section_rows(
        &dashboard.standings,
        &[
            "Name",
            "Rank",
            "Rank Change",
            "Reaction",
            "Total Points",
            "Latest Matchday Points",
        ],
        |rows| {
            rows.iter()
                .map(|r| {
                    vec![
                        r.name.clone(),
                        r.position.to_string(),
                        format!("{:+}", r.rank_change),
                        r.trend.emoji().to_string(),
                        fmt_points(r.total_points),
                        fmt_points(r.latest_points),
                    ]
                })
                .collect()
        },
        &mut report.errors,
    );

    let points_rows = section_rows(
        &dashboard.points,
        &["Name", "Total Points"],
        |rows| {
            rows.iter()
                .map(|r| vec![r.name.clone(), fmt_points(r.total_points)])
                .collect()
        },
        &mut report.errors,
    );

    let cumulative_rows = section_rows(
        &dashboard.cumulative,
        &[
            "Name",
            "Match",
            "Home",
            "Away",
            "Predicted Score",
            "Actual Score",
            "Matchday Points",
            "Cumulative Points",
        ],
        |series| {
            series
                .iter()
                .flat_map(|s| s.points.iter())
                .map(|p| {
                    vec![
                        p.name.clone(),
                        p.match_code.to_string(),
                        p.home.clone(),
                        p.away.clone(),
                        p.predicted_score.clone(),
                        p.actual_score.clone(),
                        fmt_points(p.total_points),
                        fmt_points(p.cumulative_total_points),
                    ]
                })
                .collect()
        },
        &mut report.errors,
    );

    let deviation_rows = section_rows(
        &dashboard.deviation,
        &["Name", "Matchday", "Difference from Mean"],
        |series| {
            series
                .iter()
                .flat_map(|s| {
                    s.points
                        .iter()
                        .map(move |(matchday, diff)| vec![s.name.clone(), matchday.to_string(), format!("{diff:.2}")])
                })
                .collect()
        },
        &mut report.errors,
    );

    report.standings = dashboard.standings.as_ref().map(Vec::len).unwrap_or(0);
    report.points = dashboard.points.as_ref().map(Vec::len).unwrap_or(0);
    report.cumulative = dashboard
        .cumulative
        .as_ref()
        .map(|series| series.iter().map(|s| s.points.len()).sum())
        .unwrap_or(0);
    report.deviation = dashboard
        .deviation
        .as_ref()
        .map(|series| series.iter().map(|s| s.points.len()).sum())
        .unwrap_or(0);

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Standings")?;
        write_rows(sheet, &standings_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Points")?;
        write_rows(sheet, &points_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Cumulative")?;
        write_rows(sheet, &cumulative_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Deviation")?;
        write_rows(sheet, &deviation_rows)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(report)
}

/// Header plus data rows, or header plus one error row when the section failed.
fn section_rows<T>(
    section: &Section<T>,
    header: &[&str],
    rows: impl FnOnce(&T) -> Vec<Vec<String>>,
    errors: &mut Vec<String>,
) -> Vec<Vec<String>> {
    let mut out = vec![header.iter().map(|h| h.to_string()).collect::<Vec<_>>()];
    match section {
        Ok(value) => out.extend(rows(value)),
        Err(err) => {
            errors.push(err.to_string());
            out.push(vec![format!("unavailable: {err}")]);
        }
    }
    out
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
