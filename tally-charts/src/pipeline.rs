//! Load -> normalize -> aggregate -> render, end to end.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tally_core::{
    Aggregate, DateParser, NormalizedTable, ReportDef, ReportSettings, aggregate,
    standard_reports,
};
use tally_ingest::{CsvOptions, load_ledger};
use tracing::{error, info};

use crate::output::{ensure_output_dir, write_report_image};
use crate::render::{RenderPolicy, render_png};

/// Everything a pipeline run needs besides the ledger path
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub csv: CsvOptions,
    pub dates: DateParser,
    pub reports: ReportSettings,
    pub render: RenderPolicy,
    pub out_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            csv: CsvOptions::default(),
            dates: DateParser::new().day_first(true),
            reports: ReportSettings::default(),
            render: RenderPolicy::default(),
            out_dir: PathBuf::from("static"),
        }
    }
}

/// Result of rendering one report
#[derive(Debug, Clone)]
pub struct ReportOutcome {
    pub def: ReportDef,
    /// Written path, or why this report failed
    pub result: Result<PathBuf, Arc<anyhow::Error>>,
}

impl ReportOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Summary of one full run
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub kept: usize,
    pub dropped: usize,
    pub outcomes: Vec<ReportOutcome>,
}

impl PipelineRun {
    pub fn failures(&self) -> impl Iterator<Item = &ReportOutcome> {
        self.outcomes.iter().filter(|o| !o.is_ok())
    }

    pub fn all_ok(&self) -> bool {
        self.outcomes.iter().all(ReportOutcome::is_ok)
    }
}

/// Aggregate, render and write a single report.
pub fn render_report(
    table: &NormalizedTable,
    def: &ReportDef,
    out_dir: &Path,
    policy: &RenderPolicy,
) -> Result<PathBuf> {
    let agg = aggregate(table, def);
    let png = render_png(&agg, def, policy)?;
    write_report_image(out_dir, def, &png)
}

pub struct Pipeline {
    config: PipelineConfig,
    reports: Vec<ReportDef>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let reports = standard_reports(&config.reports);
        Self { config, reports }
    }

    pub fn out_dir(&self) -> &Path {
        &self.config.out_dir
    }

    /// Report definitions with the configured ordering applied
    pub fn reports(&self) -> &[ReportDef] {
        &self.reports
    }

    pub fn load(&self, csv_path: &Path) -> Result<NormalizedTable> {
        load_ledger(csv_path, &self.config.csv, &self.config.dates)
    }

    /// Every report's aggregate, in report order.
    pub fn aggregates(&self, table: &NormalizedTable) -> Vec<(ReportDef, Aggregate)> {
        self.reports
            .iter()
            .map(|def| (*def, aggregate(table, def)))
            .collect()
    }

    /// Render all reports from an already loaded table. A failing report
    /// does not stop the others.
    pub fn render_all(&self, table: &NormalizedTable) -> Result<Vec<ReportOutcome>> {
        ensure_output_dir(&self.config.out_dir)?;

        let outcomes = self
            .reports
            .iter()
            .map(|def| {
                let result = render_report(table, def, &self.config.out_dir, &self.config.render)
                    .map_err(|e| {
                        error!(report = %def.id, error = %format!("{e:#}"), "render failed");
                        Arc::new(e)
                    });
                ReportOutcome { def: *def, result }
            })
            .collect();

        Ok(outcomes)
    }

    pub fn run(&self, csv_path: &Path) -> Result<PipelineRun> {
        ensure_output_dir(&self.config.out_dir)?;
        let table = self.load(csv_path)?;
        let outcomes = self.render_all(&table)?;

        let run = PipelineRun {
            kept: table.len(),
            dropped: table.dropped(),
            outcomes,
        };
        info!(
            kept = run.kept,
            dropped = run.dropped,
            rendered = run.outcomes.iter().filter(|o| o.is_ok()).count(),
            out_dir = %self.config.out_dir.display(),
            "pipeline finished"
        );
        Ok(run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::{RawTransaction, ReportId, normalize};

    fn table() -> NormalizedTable {
        let raw = vec![
            RawTransaction::new("2024-01-05", "Expense", "Food", "Cash", "100"),
            RawTransaction::new("2024-01-20", "Expense", "Food", "Card", "50"),
            RawTransaction::new("2024-02-01", "Income", "Salary", "Bank", "5000"),
        ];
        normalize(raw, &DateParser::new())
    }

    #[test]
    fn test_render_all_writes_every_report() {
        let tmp = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(PipelineConfig {
            out_dir: tmp.path().join("static"),
            ..PipelineConfig::default()
        });
        let outcomes = pipeline.render_all(&table()).unwrap();
        assert_eq!(outcomes.len(), 8);
        for outcome in &outcomes {
            let path = outcome.result.as_ref().unwrap();
            assert!(path.ends_with(outcome.def.file_name));
            assert!(path.is_file());
        }
    }

    #[test]
    fn test_aggregates_follow_report_order() {
        let pipeline = Pipeline::new(PipelineConfig::default());
        let aggs = pipeline.aggregates(&table());
        let ids: Vec<_> = aggs.iter().map(|(def, _)| def.id).collect();
        assert_eq!(ids[0], ReportId::MonthlyTrends);
        assert_eq!(ids.len(), 8);

        let (_, modes) = aggs
            .iter()
            .find(|(def, _)| def.id == ReportId::PaymentModes)
            .unwrap();
        assert_eq!(modes.value_of("Bank"), Some(5000.0));
    }

    #[test]
    fn test_run_fails_on_missing_ledger() {
        let tmp = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(PipelineConfig {
            out_dir: tmp.path().to_path_buf(),
            ..PipelineConfig::default()
        });
        let err = pipeline.run(&tmp.path().join("nope.csv")).unwrap_err();
        assert!(format!("{err:#}").contains("ledger file not found"));
    }
}
