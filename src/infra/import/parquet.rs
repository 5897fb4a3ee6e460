use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use arrow_array::{
    Array, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array, LargeStringArray,
    StringArray, TimestampMicrosecondArray, TimestampMillisecondArray, TimestampNanosecondArray,
    TimestampSecondArray,
};
use arrow_schema::{DataType, TimeUnit};
use chrono::{DateTime, Utc};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::domain::entities::table::{CellValue, Table};

const NANOS_PER_SECOND: i64 = 1_000_000_000;

fn downcast<'a, T: 'static>(array: &'a dyn Array, name: &str) -> Result<&'a T> {
    array.as_any().downcast_ref::<T>().with_context(|| {
        format!(
            "column {name} does not match its declared type {}",
            array.data_type()
        )
    })
}

fn instant_cell(
    value: Option<i64>,
    to_instant: fn(i64) -> Option<DateTime<Utc>>,
    name: &str,
) -> Result<CellValue> {
    let Some(value) = value else {
        return Ok(CellValue::Missing);
    };
    let instant = to_instant(value)
        .with_context(|| format!("timestamp {value} in column {name} is out of range"))?;
    Ok(CellValue::DateTime(instant.naive_utc()))
}

fn from_nanos(value: i64) -> Option<DateTime<Utc>> {
    let nanos = value.rem_euclid(NANOS_PER_SECOND) as u32;
    DateTime::<Utc>::from_timestamp(value.div_euclid(NANOS_PER_SECOND), nanos)
}

fn from_seconds(value: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(value, 0)
}

/// Cells of one arrow column, nulls as [`CellValue::Missing`].
fn column_cells(array: &dyn Array, name: &str) -> Result<Vec<CellValue>> {
    let number = |v: Option<f64>| v.map_or(CellValue::Missing, CellValue::Number);
    let text = |v: Option<&str>| v.map_or(CellValue::Missing, CellValue::text);

    let cells: Vec<CellValue> = match array.data_type() {
        DataType::Float64 => downcast::<Float64Array>(array, name)?
            .iter()
            .map(number)
            .collect(),
        DataType::Float32 => downcast::<Float32Array>(array, name)?
            .iter()
            .map(|v| number(v.map(f64::from)))
            .collect(),
        DataType::Int64 => downcast::<Int64Array>(array, name)?
            .iter()
            .map(|v| number(v.map(|v| v as f64)))
            .collect(),
        DataType::Int32 => downcast::<Int32Array>(array, name)?
            .iter()
            .map(|v| number(v.map(f64::from)))
            .collect(),
        DataType::Boolean => downcast::<BooleanArray>(array, name)?
            .iter()
            .map(|v| v.map_or(CellValue::Missing, |v| CellValue::text(v.to_string())))
            .collect(),
        DataType::Utf8 => downcast::<StringArray>(array, name)?
            .iter()
            .map(text)
            .collect(),
        DataType::LargeUtf8 => downcast::<LargeStringArray>(array, name)?
            .iter()
            .map(text)
            .collect(),
        DataType::Timestamp(TimeUnit::Second, _) => {
            downcast::<TimestampSecondArray>(array, name)?
                .iter()
                .map(|v| instant_cell(v, from_seconds, name))
                .collect::<Result<_>>()?
        }
        DataType::Timestamp(TimeUnit::Millisecond, _) => {
            downcast::<TimestampMillisecondArray>(array, name)?
                .iter()
                .map(|v| instant_cell(v, DateTime::<Utc>::from_timestamp_millis, name))
                .collect::<Result<_>>()?
        }
        DataType::Timestamp(TimeUnit::Microsecond, _) => {
            downcast::<TimestampMicrosecondArray>(array, name)?
                .iter()
                .map(|v| instant_cell(v, DateTime::<Utc>::from_timestamp_micros, name))
                .collect::<Result<_>>()?
        }
        DataType::Timestamp(TimeUnit::Nanosecond, _) => {
            downcast::<TimestampNanosecondArray>(array, name)?
                .iter()
                .map(|v| instant_cell(v, from_nanos, name))
                .collect::<Result<_>>()?
        }
        other => anyhow::bail!("column {name} has unsupported parquet type {other}"),
    };
    Ok(cells)
}

/// Reads every row group of a parquet file into one table.
pub fn read_parquet_table(parquet_path: &Path) -> Result<Table> {
    let file = File::open(parquet_path)
        .with_context(|| format!("failed to open parquet: {}", parquet_path.display()))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .with_context(|| format!("failed to read parquet metadata: {}", parquet_path.display()))?;
    let columns = builder
        .schema()
        .fields()
        .iter()
        .map(|field| field.name().to_string())
        .collect::<Vec<_>>();
    let reader = builder.build().context("failed to build parquet reader")?;

    let mut rows = Vec::new();
    for (batch_idx, batch) in reader.enumerate() {
        let batch = batch.with_context(|| format!("failed to read parquet batch {batch_idx}"))?;
        let mut batch_columns = batch
            .columns()
            .iter()
            .zip(&columns)
            .map(|(array, name)| column_cells(array.as_ref(), name).map(Vec::into_iter))
            .collect::<Result<Vec<_>>>()?;
        for _ in 0..batch.num_rows() {
            rows.push(
                batch_columns
                    .iter_mut()
                    .map(|cells| cells.next().unwrap_or(CellValue::Missing))
                    .collect::<Vec<_>>(),
            );
        }
    }

    let table = Table::new(columns, rows).context("parquet batches are not rectangular")?;
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn nanosecond_timestamps_before_epoch_are_floored() {
        let instant = from_nanos(-1).expect("in range");
        let expected = NaiveDate::from_ymd_opt(1969, 12, 31)
            .and_then(|d| d.and_hms_nano_opt(23, 59, 59, 999_999_999))
            .expect("valid instant");
        assert_eq!(instant.naive_utc(), expected);
    }

    #[test]
    fn nulls_become_missing() {
        let array = Int64Array::from(vec![Some(7), None]);
        let cells = column_cells(&array, "n").expect("supported type");
        assert_eq!(cells, vec![CellValue::Number(7.0), CellValue::Missing]);
    }

    #[test]
    fn unsupported_types_are_rejected() {
        let array = arrow_array::Date32Array::from(vec![Some(0)]);
        assert!(column_cells(&array, "d").is_err());
    }
}
