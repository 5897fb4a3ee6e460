use std::path::Path;

use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, DataType, Reader};

use crate::domain::entities::table::{CellValue, Table};

pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(v) => v.to_string(),
        Data::Float(v) => v.to_string(),
        Data::Int(v) => v.to_string(),
        Data::Bool(v) => v.to_string(),
        Data::DateTime(v) => v.to_string(),
        Data::DateTimeIso(v) => v.to_string(),
        Data::DurationIso(v) => v.to_string(),
        Data::Error(v) => format!("{v:?}"),
        Data::Empty => String::new(),
    }
}

/// Workbook cell to table cell. Dates keep their native instant so the date
/// normalizer can format them; numbers stay numeric.
pub fn cell_to_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Missing,
        Data::String(v) if v.is_empty() => CellValue::Missing,
        Data::String(v) => CellValue::text(v.as_str()),
        Data::Float(v) => CellValue::Number(*v),
        Data::Int(v) => CellValue::Number(*v as f64),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_datetime()
            .map(CellValue::DateTime)
            .unwrap_or_else(|| CellValue::Text(cell_to_string(cell))),
        _ => CellValue::Text(cell_to_string(cell)),
    }
}

/// Reads one worksheet (the first when `sheet` is `None`); its first row is the header.
pub fn read_xlsx_table(xlsx_path: &Path, sheet: Option<&str>) -> Result<Table> {
    let mut workbook = open_workbook_auto(xlsx_path)
        .with_context(|| format!("failed to open xlsx: {}", xlsx_path.display()))?;

    let sheet_name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .with_context(|| format!("workbook has no sheets: {}", xlsx_path.display()))?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("failed to read sheet: {sheet_name}"))?;

    let mut rows_iter = range.rows();
    let columns: Vec<String> = rows_iter
        .next()
        .map(|header| header.iter().map(cell_to_string).collect())
        .unwrap_or_default();

    let rows: Vec<Vec<CellValue>> = rows_iter
        .map(|row| row.iter().map(cell_to_value).collect())
        .collect();

    Table::new(columns, rows).with_context(|| format!("sheet {sheet_name} is not rectangular"))
}
