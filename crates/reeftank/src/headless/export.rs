//! RON import and export of fish records and run summaries

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use reeftank_fish::FishRecord;
use ron::ser::PrettyConfig;
use serde::Serialize;

use super::runner::RunSummary;

fn write_ron<T: Serialize + ?Sized>(path: &Path, value: &T, what: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let text = ron::ser::to_string_pretty(value, PrettyConfig::default())
        .with_context(|| format!("Failed to serialize {}", what))?;
    fs::write(path, text).with_context(|| format!("Failed to write {} to {}", what, path.display()))?;
    log::info!("Wrote {} to {}", what, path.display());
    Ok(())
}

/// Write fish records as a RON list
pub fn write_records(path: &Path, records: &[FishRecord]) -> Result<()> {
    write_ron(path, records, "fish records")
}

/// Read a RON list of fish records
pub fn read_records(path: &Path) -> Result<Vec<FishRecord>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read fish records from {}", path.display()))?;
    ron::from_str(&text).with_context(|| format!("Failed to parse fish records in {}", path.display()))
}

pub fn write_summary(path: &Path, summary: &RunSummary) -> Result<()> {
    write_ron(path, summary, "run summary")
}
