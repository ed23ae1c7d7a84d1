use anyhow::{Context, Result};
use std::path::PathBuf;

/// `$TALLY_HOME`, or `~/.tally` when unset.
pub fn tally_home() -> Result<PathBuf> {
    resolve_home(std::env::var("TALLY_HOME").ok(), std::env::var("HOME").ok())
}

fn resolve_home(tally_home: Option<String>, home: Option<String>) -> Result<PathBuf> {
    if let Some(dir) = tally_home.filter(|d| !d.trim().is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = home.context("HOME is not set (or set TALLY_HOME)")?;
    Ok(PathBuf::from(home).join(".tally"))
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(tally_home()?.join("config.toml"))
}
