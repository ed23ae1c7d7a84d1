use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tally_charts::Pipeline;
use tally_core::ReportId;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod state;
mod web;

use config::Config;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("TALLY_BUILD_SHA"), ")");

#[derive(Parser, Debug)]
#[command(name = "tally", version = VERSION, about = "Household ledger charts")]
struct Cli {
    /// Config file (default: $TALLY_HOME/config.toml, else ~/.tally/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the dashboard; every page load re-reads the ledger
    Serve {
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Directory the images are written to
        #[arg(long)]
        out: Option<PathBuf>,

        /// Listen address (default: 127.0.0.1:5000)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Render all charts once and print where they went
    Render {
        #[arg(long)]
        csv: Option<PathBuf>,

        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Print report aggregates as JSON
    Summary {
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Only this report (e.g. category_breakdown)
        #[arg(long)]
        report: Option<ReportId>,
    },

    /// Write a default config file if there is none
    InitConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = match cli.config {
        Some(p) => p,
        None => state::default_config_path()?,
    };

    match cli.command {
        Command::InitConfig => {
            if config::init_config(&config_path)? {
                println!("Wrote {}", config_path.display());
            } else {
                println!("Config already exists: {}", config_path.display());
            }
        }

        Command::Serve { csv, out, bind } => {
            let mut cfg = config::load_config(&config_path)?;
            apply_overrides(&mut cfg, csv, out);
            if let Some(bind) = bind {
                cfg.server.bind = bind;
            }
            serve(&cfg).await?;
        }

        Command::Render { csv, out } => {
            let mut cfg = config::load_config(&config_path)?;
            apply_overrides(&mut cfg, csv, out);
            render(&cfg)?;
        }

        Command::Summary { csv, report } => {
            let mut cfg = config::load_config(&config_path)?;
            apply_overrides(&mut cfg, csv, None);
            summary(&cfg, report)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn apply_overrides(cfg: &mut Config, csv: Option<PathBuf>, out: Option<PathBuf>) {
    if let Some(csv) = csv {
        cfg.data.csv_path = csv;
    }
    if let Some(out) = out {
        cfg.output.dir = out;
    }
}

async fn serve(cfg: &Config) -> Result<()> {
    let url_prefix = cfg.url_prefix()?;
    let state = web::AppState {
        pipeline: Arc::new(Pipeline::new(cfg.pipeline_config()?)),
        csv_path: Arc::new(cfg.data.csv_path.clone()),
        url_prefix: Arc::from(url_prefix.as_str()),
    };
    let app = web::app(&url_prefix).with_state(state);

    let listener = tokio::net::TcpListener::bind(&cfg.server.bind)
        .await
        .with_context(|| format!("binding {}", cfg.server.bind))?;
    info!(
        addr = %cfg.server.bind,
        csv = %cfg.data.csv_path.display(),
        "listening"
    );
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

fn render(cfg: &Config) -> Result<()> {
    let pipeline = Pipeline::new(cfg.pipeline_config()?);
    let run = pipeline.run(&cfg.data.csv_path)?;

    println!(
        "Loaded {} transactions from {} ({} skipped)",
        run.kept,
        cfg.data.csv_path.display(),
        run.dropped
    );
    for outcome in &run.outcomes {
        match &outcome.result {
            Ok(path) => println!("  {:<20} {}", outcome.def.id, path.display()),
            Err(e) => println!("  {:<20} FAILED: {e:#}", outcome.def.id),
        }
    }

    let failed = run.failures().count();
    if failed > 0 {
        bail!("{failed} of {} reports failed to render", run.outcomes.len());
    }
    Ok(())
}

fn summary(cfg: &Config, only: Option<ReportId>) -> Result<()> {
    let pipeline = Pipeline::new(cfg.pipeline_config()?);
    let table = pipeline.load(&cfg.data.csv_path)?;

    let reports: serde_json::Map<String, serde_json::Value> = pipeline
        .aggregates(&table)
        .into_iter()
        .filter(|(def, _)| only.is_none_or(|id| id == def.id))
        .map(|(def, agg)| -> Result<(String, serde_json::Value)> {
            Ok((def.id.to_string(), serde_json::to_value(agg)?))
        })
        .collect::<Result<_>>()?;

    let doc = json!({
        "kept": table.len(),
        "dropped": table.dropped(),
        "reports": reports,
    });
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}
