use std::path::Path;

use anyhow::{Context, Result};

use crate::domain::entities::table::{CellValue, Table};

/// Reads a CSV file with a header row. Empty fields become missing cells and short
/// records are padded with missing cells.
pub fn read_csv_table(csv_path: &Path) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(csv_path)
        .with_context(|| format!("failed to open csv: {}", csv_path.display()))?;
    let headers = reader
        .headers()
        .with_context(|| format!("failed to read headers from csv: {}", csv_path.display()))?
        .clone();

    if headers.is_empty() {
        anyhow::bail!("csv header is required")
    }

    let columns: Vec<String> = headers.iter().map(str::to_string).collect();
    let header_len = columns.len();

    let mut rows = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("failed to parse csv record {row_idx}"))?;
        if record.len() > header_len {
            anyhow::bail!(
                "csv record {row_idx} has {} fields, header has {header_len}",
                record.len()
            );
        }
        let row = (0..header_len)
            .map(|col_idx| match record.get(col_idx).unwrap_or("") {
                "" => CellValue::Missing,
                value => CellValue::text(value),
            })
            .collect();
        rows.push(row);
    }

    Table::new(columns, rows).context("csv rows do not match header")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_test_dir(prefix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after epoch")
            .as_nanos();
        std::env::temp_dir().join(format!("table-editor-{prefix}-{nanos}"))
    }

    #[test]
    fn reads_headers_and_rows() {
        let temp_dir = unique_test_dir("csv-read");
        fs::create_dir_all(&temp_dir).expect("should create temp dir");
        let csv_path = temp_dir.join("people.csv");
        fs::write(&csv_path, "name,since\nAlice,2023-01-05\nBob,\n").expect("should write csv");

        let table = read_csv_table(&csv_path).expect("csv should load");

        assert_eq!(table.columns(), &["name".to_string(), "since".to_string()]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows()[0][1], CellValue::text("2023-01-05"));
        assert_eq!(table.rows()[1][1], CellValue::Missing);

        fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
    }

    #[test]
    fn overlong_record_is_rejected() {
        let temp_dir = unique_test_dir("csv-overlong");
        fs::create_dir_all(&temp_dir).expect("should create temp dir");
        let csv_path = temp_dir.join("bad.csv");
        fs::write(&csv_path, "a\n1,2\n").expect("should write csv");

        assert!(read_csv_table(&csv_path).is_err());

        fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
    }
}
