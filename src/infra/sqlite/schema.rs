use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn open_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)
        .with_context(|| format!("failed to open db: {}", db_path.display()))?;
    conn.execute("PRAGMA foreign_keys = ON", [])
        .context("failed to enable foreign key enforcement")?;
    Ok(conn)
}

pub fn init_db(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create parent dir: {}", parent.display()))?;
    }

    let conn = open_connection(db_path)?;

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS object (
            bucket       TEXT NOT NULL,
            key          TEXT NOT NULL,
            column_count INTEGER NOT NULL,
            row_count    INTEGER NOT NULL,
            written_at   TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (bucket, key)
        );

        CREATE TABLE IF NOT EXISTS object_column (
            bucket      TEXT NOT NULL,
            key         TEXT NOT NULL,
            col_idx     INTEGER NOT NULL,
            name        TEXT NOT NULL,
            PRIMARY KEY (bucket, key, col_idx),
            FOREIGN KEY (bucket, key) REFERENCES object(bucket, key) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS object_cell (
            bucket      TEXT NOT NULL,
            key         TEXT NOT NULL,
            row_idx     INTEGER NOT NULL,
            col_idx     INTEGER NOT NULL,
            kind        TEXT NOT NULL,
            value       TEXT,
            PRIMARY KEY (bucket, key, row_idx, col_idx),
            FOREIGN KEY (bucket, key) REFERENCES object(bucket, key) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_object_cell_row
            ON object_cell(bucket, key, row_idx);
        ",
    )
    .context("failed to initialize schema")?;

    Ok(())
}
