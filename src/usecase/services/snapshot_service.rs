use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::domain::entities::table::Table;
use crate::domain::rules::columns::normalize_columns;
use crate::error::EditorError;
use crate::usecase::ports::storage::{Locator, SnapshotCache, StorageError, TableStorage};

/// Memoized reads of the persisted snapshot.
pub struct SnapshotService {
    storage: Arc<dyn TableStorage>,
    cache: Mutex<HashMap<Locator, Table>>,
}

impl SnapshotService {
    pub fn new(storage: Arc<dyn TableStorage>) -> Self {
        Self {
            storage,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Raw table at `locator`, served from the cache after the first read.
    pub fn read(&self, locator: &Locator) -> Result<Table, EditorError> {
        if let Some(table) = self.lock().get(locator) {
            tracing::debug!(%locator, "snapshot cache hit");
            return Ok(table.clone());
        }

        tracing::debug!(%locator, "snapshot cache miss");
        let table = self
            .storage
            .read(locator)
            .map_err(|source| EditorError::StorageReadFailure {
                locator: locator.clone(),
                source,
            })?;
        self.lock().insert(locator.clone(), table.clone());
        Ok(table)
    }

    /// Snapshot with placeholder column labels replaced, ready to be edited.
    pub fn load_for_editing(&self, locator: &Locator) -> Result<Table, EditorError> {
        let table = self.read(locator)?;
        prepare_for_editing(table)
    }

    pub fn is_cached(&self, locator: &Locator) -> bool {
        self.lock().contains_key(locator)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Locator, Table>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SnapshotCache for SnapshotService {
    fn invalidate(&self, locator: &Locator) -> Result<(), StorageError> {
        if self.lock().remove(locator).is_some() {
            tracing::debug!(%locator, "snapshot cache invalidated");
        }
        Ok(())
    }
}

/// Applies the column normalizer to a freshly loaded table.
pub fn prepare_for_editing(table: Table) -> Result<Table, EditorError> {
    let labels = normalize_columns(table.columns());
    table.with_columns(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::memory::store::MemoryStorage;

    fn seeded() -> (Arc<MemoryStorage>, Locator) {
        let storage = Arc::new(MemoryStorage::new());
        let locator = Locator::new("bucket", "table.parquet");
        let table = Table::from_text_rows(&["Unnamed: 0", "name"], &[vec!["1", "a"]])
            .expect("valid table");
        storage.insert(locator.clone(), table);
        (storage, locator)
    }

    #[test]
    fn second_read_is_served_from_cache() {
        let (storage, locator) = seeded();
        let service = SnapshotService::new(storage.clone());

        service.read(&locator).expect("first read should succeed");
        service.read(&locator).expect("second read should succeed");

        assert_eq!(storage.read_count(&locator), 1);
        assert!(service.is_cached(&locator));
    }

    #[test]
    fn invalidate_forces_fresh_read() {
        let (storage, locator) = seeded();
        let service = SnapshotService::new(storage.clone());

        service.read(&locator).expect("first read should succeed");
        service.invalidate(&locator).expect("invalidate should succeed");
        service.read(&locator).expect("second read should succeed");

        assert_eq!(storage.read_count(&locator), 2);
    }

    #[test]
    fn load_for_editing_normalizes_columns() {
        let (storage, locator) = seeded();
        let service = SnapshotService::new(storage);

        let table = service.load_for_editing(&locator).expect("load should succeed");

        assert_eq!(table.columns(), &["0".to_string(), "name".to_string()]);
    }

    #[test]
    fn missing_object_is_a_read_failure() {
        let storage = Arc::new(MemoryStorage::new());
        let service = SnapshotService::new(storage);
        let locator = Locator::new("bucket", "absent.parquet");

        let err = service.read(&locator).expect_err("read should fail");

        assert!(matches!(err, EditorError::StorageReadFailure { .. }));
        assert!(!service.is_cached(&locator));
    }
}
