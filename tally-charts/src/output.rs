//! Output directory handling for rendered reports.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tally_core::ReportDef;

/// Create the output directory if it does not exist yet.
pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("creating output directory {}", dir.display()))
}

/// Where `def` lands inside `dir`.
pub fn report_path(dir: &Path, def: &ReportDef) -> PathBuf {
    dir.join(def.file_name)
}

/// Write the encoded image for `def`, replacing any previous file.
pub fn write_report_image(dir: &Path, def: &ReportDef, png: &[u8]) -> Result<PathBuf> {
    let path = report_path(dir, def);
    fs::write(&path, png).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::{ReportId, find_report};

    #[test]
    fn test_ensure_output_dir_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("static").join("charts");
        ensure_output_dir(&dir).unwrap();
        ensure_output_dir(&dir).unwrap();
        assert!(dir.is_dir());
    }

    #[test]
    fn test_write_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        let def = find_report(ReportId::YearlySpending);
        let first = write_report_image(tmp.path(), def, b"first").unwrap();
        let second = write_report_image(tmp.path(), def, b"second").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.file_name().unwrap(), "yearly_spending.png");
        assert_eq!(fs::read(&second).unwrap(), b"second");
    }

    #[test]
    fn test_write_into_missing_dir_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let def = find_report(ReportId::YearlySpending);
        let err = write_report_image(&tmp.path().join("absent"), def, b"x").unwrap_err();
        assert!(err.to_string().contains("writing"));
    }
}
