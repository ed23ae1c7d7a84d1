use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tally_charts::{PipelineConfig, RenderPolicy};
use tally_core::{DateParser, ReportSettings, SeriesOrder, parse_timezone};
use tally_ingest::CsvOptions;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data: DataSection,
    pub output: OutputSection,
    pub server: ServerSection,
    pub render: RenderSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSection {
    pub csv_path: PathBuf,
    /// Single ASCII character
    pub delimiter: String,
    /// Read ambiguous `a/b/yyyy` dates as day/month
    pub day_first: bool,
    /// IANA zone that offset timestamps are converted into
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub dir: PathBuf,
    /// Path the rendered images are served under
    pub url_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSection {
    pub pie_label_min_pct: f64,
    pub unordered_breakdown: SeriesOrder,
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from("Daily Household Transactions.csv"),
            delimiter: ",".to_string(),
            // household exports write dd/mm/yyyy
            day_first: true,
            timezone: None,
        }
    }
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("static"),
            url_prefix: "/static".to_string(),
        }
    }
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
        }
    }
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            pie_label_min_pct: RenderPolicy::default().pie_label_min_pct,
            unordered_breakdown: ReportSettings::default().unordered_breakdown,
        }
    }
}

impl Config {
    /// Validate the file-level settings and turn them into pipeline settings.
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        let delimiter = match self.data.delimiter.as_bytes() {
            [b] if b.is_ascii() => *b,
            _ => bail!(
                "data.delimiter must be a single ASCII character, got {:?}",
                self.data.delimiter
            ),
        };

        let mut dates = DateParser::new().day_first(self.data.day_first);
        if let Some(name) = &self.data.timezone {
            dates = dates.with_timezone(parse_timezone(name).context("data.timezone")?);
        }

        if !(0.0..=100.0).contains(&self.render.pie_label_min_pct) {
            bail!(
                "render.pie_label_min_pct must be within 0..=100, got {}",
                self.render.pie_label_min_pct
            );
        }

        Ok(PipelineConfig {
            csv: CsvOptions { delimiter },
            dates,
            reports: ReportSettings {
                unordered_breakdown: self.render.unordered_breakdown,
            },
            render: RenderPolicy {
                pie_label_min_pct: self.render.pie_label_min_pct,
            },
            out_dir: self.output.dir.clone(),
        })
    }

    /// `url_prefix` without a trailing slash, always rooted.
    pub fn url_prefix(&self) -> Result<String> {
        let prefix = self.output.url_prefix.trim_end_matches('/');
        if !prefix.starts_with('/') {
            bail!(
                "output.url_prefix must start with '/', got {:?}",
                self.output.url_prefix
            );
        }
        Ok(prefix.to_string())
    }
}

/// Read `path`, falling back to defaults when it does not exist.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", path.display()))
}

pub fn save_config(path: &Path, cfg: &Config) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Write a default config at `path` unless one is already there.
/// Returns whether a file was written.
pub fn init_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    save_config(path, &Config::default())?;
    Ok(true)
}
