//! tally-charts: chart rendering, report output, and the load-to-PNG pipeline

pub mod fonts;
pub mod output;
pub mod palette;
pub mod pipeline;
pub mod render;

pub use output::{ensure_output_dir, report_path, write_report_image};
pub use pipeline::{Pipeline, PipelineConfig, PipelineRun, ReportOutcome, render_report};
pub use render::{RenderPolicy, Slice, pie_slices, render_png};
