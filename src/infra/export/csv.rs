use std::path::Path;

use anyhow::{Context, Result};

use crate::domain::entities::table::Table;

/// Writes `table` as CSV with a header row, creating parent directories.
pub fn write_csv_table(table: &Table, csv_path: &Path) -> Result<()> {
    if let Some(parent) = csv_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create parent dir: {}", parent.display()))?;
    }

    let mut writer = csv::Writer::from_path(csv_path)
        .with_context(|| format!("failed to create csv: {}", csv_path.display()))?;
    writer
        .write_record(table.columns())
        .context("failed to write csv header")?;
    for (row_idx, row) in table.rows().iter().enumerate() {
        writer
            .write_record(row.iter().map(|cell| cell.to_string()))
            .with_context(|| format!("failed to write csv row {row_idx}"))?;
    }
    writer.flush().context("failed to flush csv writer")?;
    Ok(())
}
