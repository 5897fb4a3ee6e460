use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow_array::{ArrayRef, Float64Array, RecordBatch, StringArray, TimestampMicrosecondArray};
use arrow_schema::{DataType, Field, Schema, TimeUnit};
use parquet::arrow::ArrowWriter;

use crate::domain::entities::table::{CellValue, Table};

/// Arrow type picked for one table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Number,
    Instant,
    Text,
}

impl ColumnKind {
    /// Numbers and instants keep their type only when the whole column agrees;
    /// mixed or all-missing columns are written as text.
    fn of(table: &Table, col_idx: usize) -> Self {
        let mut kind = None;
        for row in table.rows() {
            let cell_kind = match &row[col_idx] {
                cell if cell.is_missing() => continue,
                CellValue::Number(_) => ColumnKind::Number,
                CellValue::DateTime(_) => ColumnKind::Instant,
                _ => return ColumnKind::Text,
            };
            match kind {
                None => kind = Some(cell_kind),
                Some(seen) if seen != cell_kind => return ColumnKind::Text,
                Some(_) => {}
            }
        }
        kind.unwrap_or(ColumnKind::Text)
    }

    fn data_type(self) -> DataType {
        match self {
            ColumnKind::Number => DataType::Float64,
            ColumnKind::Instant => DataType::Timestamp(TimeUnit::Microsecond, None),
            ColumnKind::Text => DataType::Utf8,
        }
    }
}

fn build_column(table: &Table, col_idx: usize, kind: ColumnKind) -> ArrayRef {
    let cells = table.rows().iter().map(|row| &row[col_idx]);
    match kind {
        ColumnKind::Number => Arc::new(Float64Array::from(
            cells
                .map(|cell| match cell {
                    CellValue::Number(v) if !v.is_nan() => Some(*v),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        )),
        ColumnKind::Instant => Arc::new(TimestampMicrosecondArray::from(
            cells
                .map(|cell| match cell {
                    CellValue::DateTime(v) => Some(v.and_utc().timestamp_micros()),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        )),
        ColumnKind::Text => Arc::new(StringArray::from(
            cells
                .map(|cell| (!cell.is_missing()).then(|| cell.to_string()))
                .collect::<Vec<_>>(),
        )),
    }
}

fn table_to_batch(table: &Table) -> Result<RecordBatch> {
    if table.column_count() == 0 {
        anyhow::bail!("cannot write a parquet file without columns");
    }

    let kinds = (0..table.column_count())
        .map(|col_idx| ColumnKind::of(table, col_idx))
        .collect::<Vec<_>>();
    let fields = table
        .columns()
        .iter()
        .zip(&kinds)
        .map(|(name, kind)| Field::new(name.as_str(), kind.data_type(), true))
        .collect::<Vec<_>>();
    let arrays = kinds
        .iter()
        .enumerate()
        .map(|(col_idx, kind)| build_column(table, col_idx, *kind))
        .collect::<Vec<_>>();

    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)
        .context("failed to build parquet record batch")
}

/// Writes `table` as a single-row-group parquet file, creating parent directories.
pub fn write_parquet_table(table: &Table, parquet_path: &Path) -> Result<()> {
    if let Some(parent) = parquet_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create parent dir: {}", parent.display()))?;
    }

    let batch = table_to_batch(table)?;
    let file = File::create(parquet_path)
        .with_context(|| format!("failed to create parquet: {}", parquet_path.display()))?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)
        .with_context(|| format!("failed to open parquet writer: {}", parquet_path.display()))?;
    writer
        .write(&batch)
        .context("failed to write parquet record batch")?;
    writer.close().context("failed to close parquet writer")?;
    Ok(())
}
