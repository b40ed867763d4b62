use std::path::PathBuf;

use euro24_terminal::error::DashboardError;
use euro24_terminal::tables::{
    MatchCode, MatchResult, PointsByName, StandingsRow, Tables, TrendPoint, load_table,
    parse_table,
};

fn fixture_dir(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

#[test]
fn season_fixture_loads_every_table() {
    let tables = Tables::load(&fixture_dir("season"));
    assert!(tables.failures().is_empty());

    let results = tables.results.expect("results should load");
    assert_eq!(results.len(), 6);
    assert_eq!(results[0].actual_score.as_deref(), Some("5-1"));
    assert_eq!(results[5].actual_score, None);

    let standings = tables.standings.expect("standings should load");
    assert_eq!(standings.len(), 6);
    assert_eq!(standings[3].name, "Tom");
    assert_eq!(standings[3].rank_change, 2);

    let points = tables.points.expect("points should load");
    assert_eq!(points.len(), 3);

    let trend = tables.trend.expect("trend should load");
    assert_eq!(trend.len(), 12);
}

#[test]
fn empty_rank_change_reads_as_zero() {
    let rows: Vec<StandingsRow> =
        load_table(&fixture_dir("season")).expect("standings should load");
    assert!(rows.iter().filter(|r| r.matchday == 1).all(|r| r.rank_change == 0));
}

#[test]
fn pandas_float_integers_are_accepted() {
    let raw = "matchday,name,position,rank_change,cumulative_total_points,points_change\n\
               2.0,Ed,3.0,-2.0,7.5,1.5\n";
    let rows = parse_table::<StandingsRow>(raw).expect("float ints should parse");
    assert_eq!(rows[0].matchday, 2);
    assert_eq!(rows[0].position, 3);
    assert_eq!(rows[0].rank_change, -2);
    assert_eq!(rows[0].cumulative_total_points, 7.5);
}

#[test]
fn blank_points_cells_read_as_zero() {
    let raw = "matchday,name,position,rank_change,cumulative_total_points,points_change\n\
               1,Ed,1,,4.0,\n\
               1,Jay,2,,,\n";
    let rows = parse_table::<StandingsRow>(raw).expect("blank cells should parse");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].cumulative_total_points, 4.0);
    assert_eq!(rows[0].points_change, 0.0);
    assert_eq!(rows[1].cumulative_total_points, 0.0);
}

#[test]
fn non_numeric_points_cell_is_a_parse_error() {
    let raw = "matchday,name,position,rank_change,cumulative_total_points,points_change\n\
               1,Ed,1,0,lots,1\n";
    let err = parse_table::<StandingsRow>(raw).unwrap_err();
    assert!(matches!(err, DashboardError::Parse { table: "overall_standings", .. }));
    assert!(err.to_string().contains("lots"), "{err}");
}

#[test]
fn fractional_integer_column_is_a_parse_error() {
    let raw = "matchday,name,position,rank_change,cumulative_total_points,points_change\n\
               1,Ed,1.5,0,1,1\n";
    let err = parse_table::<StandingsRow>(raw).unwrap_err();
    match err {
        DashboardError::Parse { table, line, .. } => {
            assert_eq!(table, "overall_standings");
            assert_eq!(line, 2);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn missing_column_is_reported_before_rows() {
    let rows: Result<Vec<StandingsRow>, _> = load_table(&fixture_dir("broken"));
    assert_eq!(
        rows,
        Err(DashboardError::MissingColumn {
            table: "overall_standings",
            column: "position",
        })
    );
}

#[test]
fn broken_fixture_fails_tables_independently() {
    let tables = Tables::load(&fixture_dir("broken"));
    assert!(matches!(tables.results, Err(DashboardError::Read { .. })));
    assert!(matches!(tables.trend, Err(DashboardError::Read { .. })));
    assert!(matches!(
        tables.standings,
        Err(DashboardError::MissingColumn { .. })
    ));
    assert_eq!(tables.points.as_ref().map(|p| p.len()), Ok(3));
    assert_eq!(tables.failures().len(), 3);
}

#[test]
fn extra_columns_and_optional_fields_are_tolerated() {
    let raw = "name,match_code,total_points,notes\nEd,M01,3,lucky\n";
    let rows = parse_table::<TrendPoint>(raw).expect("minimal trend should parse");
    assert_eq!(rows[0].match_code, MatchCode::new(1));
    assert_eq!(rows[0].home, "");
    assert_eq!(rows[0].cumulative_total_points, 0.0);

    let raw = "name,total_points\n  Ed , 4 \n";
    let rows = parse_table::<PointsByName>(raw).expect("padded cells should parse");
    assert_eq!(rows[0].name, "Ed");
    assert_eq!(rows[0].total_points, 4.0);

    let raw = "matchday,home,away\n1,Germany,Scotland\n";
    let rows = parse_table::<MatchResult>(raw).expect("results without scores should parse");
    assert_eq!(rows[0].actual_score, None);
}

#[test]
fn invalid_match_code_fails_the_table() {
    let raw = "name,match_code,total_points\nEd,Final,3\n";
    let err = parse_table::<TrendPoint>(raw).unwrap_err();
    assert!(matches!(err, DashboardError::Parse { table: "df_merged", .. }));
    assert!(err.to_string().contains("Final"), "{err}");
}

#[test]
fn match_codes_order_by_ordinal() {
    let mut codes = ["M10", "M2", "M01", "m03", "M00"]
        .iter()
        .map(|raw| raw.parse::<MatchCode>().expect("valid code"))
        .collect::<Vec<_>>();
    codes.sort();
    let ordinals = codes.iter().map(MatchCode::ordinal).collect::<Vec<_>>();
    assert_eq!(ordinals, vec![0, 1, 2, 3, 10]);
    assert!(MatchCode::new(9) < MatchCode::new(10));
    assert_eq!("m03".parse::<MatchCode>(), Ok(MatchCode::new(3)));
    assert_eq!(MatchCode::new(7).as_str(), "M07");
    assert_eq!(MatchCode::origin().to_string(), "M00");
}

#[test]
fn padded_and_unpadded_codes_are_the_same_match() {
    let short = "M1".parse::<MatchCode>().expect("valid code");
    let padded = "M01".parse::<MatchCode>().expect("valid code");
    assert_eq!(short, padded);
    assert_eq!(short.as_str(), "M01");
    assert_eq!(short.cmp(&padded), std::cmp::Ordering::Equal);
}

#[test]
fn malformed_match_codes_are_rejected() {
    for raw in ["", "M", "X01", "M1a", "M-1"] {
        assert_eq!(
            raw.parse::<MatchCode>(),
            Err(DashboardError::InvalidMatchCode(raw.to_string())),
            "{raw:?}"
        );
    }
}
