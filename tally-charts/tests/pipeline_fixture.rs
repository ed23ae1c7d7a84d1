use std::fs;
use std::path::PathBuf;
use tally_charts::{Pipeline, PipelineConfig};
use tally_core::{Aggregate, ReportId, find_report};

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("fixtures")
        .join("household.csv")
}

fn pipeline(out_dir: PathBuf) -> Pipeline {
    Pipeline::new(PipelineConfig {
        out_dir,
        ..PipelineConfig::default()
    })
}

fn aggregate_of(pipeline: &Pipeline, id: ReportId) -> Aggregate {
    let table = pipeline.load(&fixture_path()).unwrap();
    pipeline
        .aggregates(&table)
        .into_iter()
        .find(|(def, _)| def.id == id)
        .map(|(_, agg)| agg)
        .unwrap()
}

fn labels_and_values(agg: &Aggregate) -> Vec<(String, f64)> {
    agg.as_series()
        .unwrap()
        .iter()
        .map(|p| (p.label.clone(), p.value))
        .collect()
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn test_fixture_renders_all_eight_reports() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("static");
    let run = pipeline(out.clone()).run(&fixture_path()).unwrap();

    assert_eq!(run.kept, 16);
    assert_eq!(run.dropped, 1);
    assert_eq!(run.outcomes.len(), 8);
    assert!(run.all_ok(), "failures: {:?}", run.failures().collect::<Vec<_>>());

    for outcome in &run.outcomes {
        let path = out.join(outcome.def.file_name);
        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"\x89PNG\r\n\x1a\n"), "{} is not a png", path.display());
    }
}

#[test]
fn test_fixture_category_breakdown_is_descending() {
    let tmp = tempfile::tempdir().unwrap();
    let agg = aggregate_of(&pipeline(tmp.path().to_path_buf()), ReportId::CategoryBreakdown);
    let got = labels_and_values(&agg);
    let labels: Vec<&str> = got.iter().map(|(l, _)| l.as_str()).collect();
    assert_eq!(
        labels,
        ["Household", "Food", "Gift", "Transportation", "subscription"]
    );
    assert_close(got[0].1, 5450.5);
    // the unparseable amount counts as zero but the row stays
    assert_close(got[1].1, 3360.0);
}

#[test]
fn test_fixture_payment_modes_include_every_direction() {
    let tmp = tempfile::tempdir().unwrap();
    let agg = aggregate_of(&pipeline(tmp.path().to_path_buf()), ReportId::PaymentModes);
    let got = labels_and_values(&agg);
    let labels: Vec<&str> = got.iter().map(|(l, _)| l.as_str()).collect();
    assert_eq!(labels, ["Cash", "Saving Bank account 1", "Credit Card"]);
    assert_close(got[0].1, 3010.0);
    assert_close(got[1].1, 111_699.0);
    assert_close(got[2].1, 8079.5);
}

#[test]
fn test_fixture_time_buckets_are_chronological() {
    let tmp = tempfile::tempdir().unwrap();
    let p = pipeline(tmp.path().to_path_buf());

    let yearly = labels_and_values(&aggregate_of(&p, ReportId::YearlySpending));
    assert_eq!(yearly.len(), 3);
    assert_eq!(yearly[0].0, "2018");
    assert_close(yearly[0].1, 3939.5);
    assert_close(yearly[1].1, 8720.0);
    assert_close(yearly[2].1, 129.0);

    let quarterly = labels_and_values(&aggregate_of(&p, ReportId::QuarterlySpending));
    let labels: Vec<&str> = quarterly.iter().map(|(l, _)| l.as_str()).collect();
    assert_eq!(
        labels,
        ["2018Q3", "2018Q4", "2019Q1", "2019Q2", "2019Q3", "2019Q4", "2020Q1"]
    );

    let monthly = labels_and_values(&aggregate_of(&p, ReportId::MonthlyTrends));
    assert_eq!(monthly.first().map(|(l, _)| l.as_str()), Some("2018-09"));
    assert_close(monthly[0].1, 289.0);
    assert_eq!(monthly.len(), 9);
}

#[test]
fn test_fixture_grids_are_dense() {
    let tmp = tempfile::tempdir().unwrap();
    let p = pipeline(tmp.path().to_path_buf());

    let heat = aggregate_of(&p, ReportId::SpendingHeatmap);
    let grid = heat.as_grid().unwrap();
    assert_eq!(grid.rows, ["2018", "2019", "2020"]);
    assert_eq!(grid.columns.len(), 12);
    assert_close(grid.get(0, 8), 289.0);
    assert_close(grid.get(2, 0), 0.0);

    let stacked = aggregate_of(&p, ReportId::CategoryOverTime);
    let grid = stacked.as_grid().unwrap();
    // months without expenses (e.g. 2019-02) are not materialized
    assert_eq!(
        grid.rows,
        [
            "2018-09", "2018-10", "2018-11", "2018-12", "2019-01", "2019-04", "2019-07",
            "2019-10", "2020-02"
        ]
    );
    assert_eq!(grid.columns.len(), 5);
    assert!(grid.cells.iter().all(|row| row.len() == 5));
    assert_close(stacked.total(), heat.total());
}

#[test]
fn test_two_runs_give_identical_aggregates() {
    let tmp = tempfile::tempdir().unwrap();
    let p = pipeline(tmp.path().to_path_buf());
    let table = p.load(&fixture_path()).unwrap();
    let first = serde_json::to_string(&p.aggregates(&table).into_iter().map(|(_, a)| a).collect::<Vec<_>>()).unwrap();
    let table = p.load(&fixture_path()).unwrap();
    let second = serde_json::to_string(&p.aggregates(&table).into_iter().map(|(_, a)| a).collect::<Vec<_>>()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_empty_ledger_still_renders() {
    let tmp = tempfile::tempdir().unwrap();
    let csv = tmp.path().join("empty.csv");
    fs::write(&csv, "").unwrap();

    let run = pipeline(tmp.path().join("out")).run(&csv).unwrap();
    assert_eq!(run.kept, 0);
    assert!(run.all_ok());
    let def = find_report(ReportId::CategoryPie);
    assert!(tmp.path().join("out").join(def.file_name).is_file());
}

#[test]
fn test_render_failure_is_reported_per_report() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("out");
    let p = pipeline(out.clone());
    let table = p.load(&fixture_path()).unwrap();

    // a directory squatting on one output file makes only that write fail
    fs::create_dir_all(out.join(find_report(ReportId::YearlySpending).file_name)).unwrap();
    let outcomes = p.render_all(&table).unwrap();
    let failed: Vec<_> = outcomes.iter().filter(|o| !o.is_ok()).map(|o| o.def.id).collect();
    assert_eq!(failed, [ReportId::YearlySpending]);

    // the error keeps its chain down to the io failure
    let err = outcomes
        .iter()
        .find_map(|o| o.result.as_ref().err())
        .unwrap();
    assert!(err.to_string().starts_with("writing "));
    assert!(err.root_cause().downcast_ref::<std::io::Error>().is_some());
}

#[test]
fn test_missing_ledger_fails_the_run() {
    let tmp = tempfile::tempdir().unwrap();
    let err = pipeline(tmp.path().to_path_buf())
        .run(&tmp.path().join("missing.csv"))
        .unwrap_err();
    assert!(format!("{err:#}").contains("missing.csv"));
}
