use std::path::Path;

use crate::domain::entities::table::Table;
use crate::error::EditorError;
use crate::infra::export::csv::write_csv_table;
use crate::infra::export::parquet::write_parquet_table;
use crate::infra::import::csv::read_csv_table;
use crate::infra::import::parquet::read_parquet_table;
use crate::infra::import::xlsx::read_xlsx_table;
use crate::usecase::services::snapshot_service::prepare_for_editing;

/// Local files as an alternative to the stored snapshot, and local saves.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImportService;

impl ImportService {
    pub fn new() -> Self {
        Self
    }

    pub fn import_csv(&self, path: &Path) -> Result<Table, EditorError> {
        let table = read_csv_table(path).map_err(EditorError::Import)?;
        tracing::info!(path = %path.display(), rows = table.row_count(), "csv imported");
        prepare_for_editing(table)
    }

    pub fn import_xlsx(&self, path: &Path, sheet: Option<&str>) -> Result<Table, EditorError> {
        let table = read_xlsx_table(path, sheet).map_err(EditorError::Import)?;
        tracing::info!(path = %path.display(), rows = table.row_count(), "workbook imported");
        prepare_for_editing(table)
    }

    pub fn import_parquet(&self, path: &Path) -> Result<Table, EditorError> {
        let table = read_parquet_table(path).map_err(EditorError::Import)?;
        tracing::info!(path = %path.display(), rows = table.row_count(), "parquet imported");
        prepare_for_editing(table)
    }

    /// Saves the accepted table next to the operator instead of to storage.
    pub fn export_csv(&self, table: &Table, path: &Path) -> Result<(), EditorError> {
        write_csv_table(table, path).map_err(EditorError::Export)?;
        tracing::info!(path = %path.display(), rows = table.row_count(), "csv exported");
        Ok(())
    }

    /// Same as [`ImportService::export_csv`], keeping number and instant columns typed.
    pub fn export_parquet(&self, table: &Table, path: &Path) -> Result<(), EditorError> {
        write_parquet_table(table, path).map_err(EditorError::Export)?;
        tracing::info!(path = %path.display(), rows = table.row_count(), "parquet exported");
        Ok(())
    }
}
