use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rusqlite::{params, OptionalExtension, Transaction};

use crate::domain::entities::table::{CellValue, Table};
use crate::infra::sqlite::schema::{init_db, open_connection};
use crate::usecase::ports::storage::{Locator, StorageError, TableStorage};

const DATETIME_STORAGE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

const KIND_MISSING: &str = "missing";
const KIND_TEXT: &str = "text";
const KIND_NUMBER: &str = "number";
const KIND_DATETIME: &str = "datetime";

/// Object store kept in a single SQLite file; each locator holds one table.
pub struct SqliteStorage {
    pub db_path: PathBuf,
}

impl SqliteStorage {
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        init_db(&db_path)?;
        Ok(Self { db_path })
    }
}

impl TableStorage for SqliteStorage {
    fn read(&self, locator: &Locator) -> Result<Table, StorageError> {
        read_object(&self.db_path, locator)
            .map_err(StorageError::message)?
            .ok_or_else(|| StorageError::NotFound(locator.to_string()))
    }

    fn write(&self, locator: &Locator, table: &Table) -> Result<(), StorageError> {
        write_object(&self.db_path, locator, table).map_err(StorageError::message)
    }

    fn copy(&self, source: &Locator, dest: &Locator) -> Result<(), StorageError> {
        let copied = copy_object(&self.db_path, source, dest).map_err(StorageError::message)?;
        if copied {
            Ok(())
        } else {
            Err(StorageError::NotFound(source.to_string()))
        }
    }
}

fn encode_cell(cell: &CellValue) -> (&'static str, Option<String>) {
    match cell {
        CellValue::Missing => (KIND_MISSING, None),
        CellValue::Text(v) => (KIND_TEXT, Some(v.clone())),
        CellValue::Number(v) => (KIND_NUMBER, Some(v.to_string())),
        CellValue::DateTime(v) => (
            KIND_DATETIME,
            Some(v.format(DATETIME_STORAGE_FORMAT).to_string()),
        ),
    }
}

fn decode_cell(kind: &str, value: Option<String>) -> Result<CellValue> {
    let cell = match (kind, value) {
        (KIND_MISSING, _) => CellValue::Missing,
        (KIND_TEXT, Some(v)) => CellValue::Text(v),
        (KIND_NUMBER, Some(v)) => CellValue::Number(
            v.parse::<f64>()
                .with_context(|| format!("invalid stored number: {v}"))?,
        ),
        (KIND_DATETIME, Some(v)) => CellValue::DateTime(
            NaiveDateTime::parse_from_str(&v, DATETIME_STORAGE_FORMAT)
                .with_context(|| format!("invalid stored datetime: {v}"))?,
        ),
        (kind, value) => anyhow::bail!("invalid stored cell: kind={kind} value={value:?}"),
    };
    Ok(cell)
}

pub fn read_object(db_path: &Path, locator: &Locator) -> Result<Option<Table>> {
    let conn = open_connection(db_path)?;

    let shape = conn
        .query_row(
            "SELECT column_count, row_count FROM object WHERE bucket = ?1 AND key = ?2",
            params![locator.bucket, locator.key],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
        )
        .optional()
        .with_context(|| format!("failed to query object: {locator}"))?;
    let Some((column_count, row_count)) = shape else {
        return Ok(None);
    };

    let mut columns_stmt = conn
        .prepare(
            "SELECT name
             FROM object_column
             WHERE bucket = ?1 AND key = ?2
             ORDER BY col_idx ASC",
        )
        .context("failed to prepare columns query")?;
    let columns = columns_stmt
        .query_map(params![locator.bucket, locator.key], |row| {
            row.get::<_, String>(0)
        })
        .context("failed to query columns")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to collect columns")?;
    drop(columns_stmt);

    if columns.len() as i64 != column_count {
        anyhow::bail!(
            "object {locator} lists {column_count} columns but stores {}",
            columns.len()
        );
    }

    let mut rows = vec![vec![CellValue::Missing; columns.len()]; row_count.max(0) as usize];

    let mut cell_stmt = conn
        .prepare(
            "SELECT row_idx, col_idx, kind, value
             FROM object_cell
             WHERE bucket = ?1 AND key = ?2
             ORDER BY row_idx ASC, col_idx ASC",
        )
        .context("failed to prepare cell query")?;
    let mut cell_rows = cell_stmt
        .query(params![locator.bucket, locator.key])
        .context("failed to run cell query")?;

    while let Some(row) = cell_rows.next().context("failed to read cell row")? {
        let row_idx: i64 = row.get(0).context("failed to read row_idx")?;
        let col_idx: i64 = row.get(1).context("failed to read col_idx")?;
        let kind: String = row.get(2).context("failed to read kind")?;
        let value: Option<String> = row.get(3).context("failed to read value")?;

        let dest = rows
            .get_mut(row_idx as usize)
            .and_then(|dest_row| dest_row.get_mut(col_idx as usize))
            .with_context(|| format!("cell ({row_idx}, {col_idx}) outside object {locator}"))?;
        *dest = decode_cell(&kind, value)?;
    }

    let table = Table::new(columns, rows).context("stored object is not rectangular")?;
    Ok(Some(table))
}

fn delete_object(tx: &Transaction<'_>, locator: &Locator) -> Result<()> {
    tx.execute(
        "DELETE FROM object_cell WHERE bucket = ?1 AND key = ?2",
        params![locator.bucket, locator.key],
    )
    .with_context(|| format!("failed to delete cells for {locator}"))?;
    tx.execute(
        "DELETE FROM object_column WHERE bucket = ?1 AND key = ?2",
        params![locator.bucket, locator.key],
    )
    .with_context(|| format!("failed to delete columns for {locator}"))?;
    tx.execute(
        "DELETE FROM object WHERE bucket = ?1 AND key = ?2",
        params![locator.bucket, locator.key],
    )
    .with_context(|| format!("failed to delete object {locator}"))?;
    Ok(())
}

/// Replaces the object at `locator` in one transaction.
pub fn write_object(db_path: &Path, locator: &Locator, table: &Table) -> Result<()> {
    let mut conn = open_connection(db_path)?;
    let tx = conn
        .transaction()
        .context("failed to start object write transaction")?;

    delete_object(&tx, locator)?;

    tx.execute(
        "INSERT INTO object(bucket, key, column_count, row_count) VALUES (?1, ?2, ?3, ?4)",
        params![
            locator.bucket,
            locator.key,
            table.column_count() as i64,
            table.row_count() as i64
        ],
    )
    .context("failed to insert object")?;

    let mut insert_column = tx
        .prepare("INSERT INTO object_column(bucket, key, col_idx, name) VALUES (?1, ?2, ?3, ?4)")
        .context("failed to prepare column insert")?;
    for (col_idx, name) in table.columns().iter().enumerate() {
        insert_column
            .execute(params![locator.bucket, locator.key, col_idx as i64, name])
            .context("failed to insert column")?;
    }
    drop(insert_column);

    let mut insert_cell = tx
        .prepare(
            "INSERT INTO object_cell(bucket, key, row_idx, col_idx, kind, value)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .context("failed to prepare cell insert")?;
    for (row_idx, row) in table.rows().iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            let (kind, value) = encode_cell(cell);
            insert_cell
                .execute(params![
                    locator.bucket,
                    locator.key,
                    row_idx as i64,
                    col_idx as i64,
                    kind,
                    value
                ])
                .context("failed to insert cell")?;
        }
    }
    drop(insert_cell);

    tx.commit().context("failed to commit object write")?;
    Ok(())
}

/// Copies `source` over `dest`. Returns `false` when `source` does not exist.
pub fn copy_object(db_path: &Path, source: &Locator, dest: &Locator) -> Result<bool> {
    let mut conn = open_connection(db_path)?;
    let tx = conn
        .transaction()
        .context("failed to start object copy transaction")?;

    let exists = tx
        .query_row(
            "SELECT 1 FROM object WHERE bucket = ?1 AND key = ?2",
            params![source.bucket, source.key],
            |_| Ok(()),
        )
        .optional()
        .with_context(|| format!("failed to query object: {source}"))?
        .is_some();
    if !exists {
        return Ok(false);
    }

    delete_object(&tx, dest)?;

    tx.execute(
        "INSERT INTO object(bucket, key, column_count, row_count)
         SELECT ?3, ?4, column_count, row_count
         FROM object WHERE bucket = ?1 AND key = ?2",
        params![source.bucket, source.key, dest.bucket, dest.key],
    )
    .context("failed to copy object row")?;
    tx.execute(
        "INSERT INTO object_column(bucket, key, col_idx, name)
         SELECT ?3, ?4, col_idx, name
         FROM object_column WHERE bucket = ?1 AND key = ?2",
        params![source.bucket, source.key, dest.bucket, dest.key],
    )
    .context("failed to copy object columns")?;
    tx.execute(
        "INSERT INTO object_cell(bucket, key, row_idx, col_idx, kind, value)
         SELECT ?3, ?4, row_idx, col_idx, kind, value
         FROM object_cell WHERE bucket = ?1 AND key = ?2",
        params![source.bucket, source.key, dest.bucket, dest.key],
    )
    .context("failed to copy object cells")?;

    tx.commit().context("failed to commit object copy")?;
    Ok(true)
}

/// Locators stored under `bucket` whose key starts with `prefix`, newest key last.
pub fn list_objects(db_path: &Path, bucket: &str, prefix: &str) -> Result<Vec<Locator>> {
    let conn = open_connection(db_path)?;
    let mut stmt = conn
        .prepare(
            "SELECT key
             FROM object
             WHERE bucket = ?1 AND substr(key, 1, length(?2)) = ?2
             ORDER BY key ASC",
        )
        .context("failed to prepare object listing")?;
    let keys = stmt
        .query_map(params![bucket, prefix], |row| row.get::<_, String>(0))
        .context("failed to list objects")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to collect object keys")?;
    Ok(keys
        .into_iter()
        .map(|key| Locator::new(bucket, key))
        .collect())
}
