use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::entities::table::Table;
use crate::usecase::ports::storage::{Locator, StorageError, TableStorage};

/// A completed storage call, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageOp {
    Read(Locator),
    Write(Locator),
    Copy { source: Locator, dest: Locator },
}

/// Storage calls that can be forced to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FailPoint {
    Read,
    Write,
    Copy,
}

/// In-process object store with a journal of completed operations.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    objects: Mutex<BTreeMap<Locator, Table>>,
    journal: Mutex<Vec<StorageOp>>,
    failing: Mutex<BTreeSet<FailPoint>>,
}

fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an object without touching the journal.
    pub fn insert(&self, locator: Locator, table: Table) {
        guard(&self.objects).insert(locator, table);
    }

    pub fn get(&self, locator: &Locator) -> Option<Table> {
        guard(&self.objects).get(locator).cloned()
    }

    pub fn locators(&self) -> Vec<Locator> {
        guard(&self.objects).keys().cloned().collect()
    }

    pub fn journal(&self) -> Vec<StorageOp> {
        guard(&self.journal).clone()
    }

    pub fn read_count(&self, locator: &Locator) -> usize {
        guard(&self.journal)
            .iter()
            .filter(|op| matches!(op, StorageOp::Read(l) if l == locator))
            .count()
    }

    pub fn write_count(&self, locator: &Locator) -> usize {
        guard(&self.journal)
            .iter()
            .filter(|op| matches!(op, StorageOp::Write(l) if l == locator))
            .count()
    }

    pub fn fail_on(&self, point: FailPoint) {
        guard(&self.failing).insert(point);
    }

    pub fn clear_failures(&self) {
        guard(&self.failing).clear();
    }

    fn check(&self, point: FailPoint) -> Result<(), StorageError> {
        if guard(&self.failing).contains(&point) {
            return Err(StorageError::Message(format!("injected {point:?} failure")));
        }
        Ok(())
    }

    fn record(&self, op: StorageOp) {
        guard(&self.journal).push(op);
    }
}

impl TableStorage for MemoryStorage {
    fn read(&self, locator: &Locator) -> Result<Table, StorageError> {
        self.check(FailPoint::Read)?;
        let table = self
            .get(locator)
            .ok_or_else(|| StorageError::NotFound(locator.to_string()))?;
        self.record(StorageOp::Read(locator.clone()));
        Ok(table)
    }

    fn write(&self, locator: &Locator, table: &Table) -> Result<(), StorageError> {
        self.check(FailPoint::Write)?;
        self.insert(locator.clone(), table.clone());
        self.record(StorageOp::Write(locator.clone()));
        Ok(())
    }

    fn copy(&self, source: &Locator, dest: &Locator) -> Result<(), StorageError> {
        self.check(FailPoint::Copy)?;
        let table = self
            .get(source)
            .ok_or_else(|| StorageError::NotFound(source.to_string()))?;
        self.insert(dest.clone(), table);
        self.record(StorageOp::Copy {
            source: source.clone(),
            dest: dest.clone(),
        });
        Ok(())
    }
}
