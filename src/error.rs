use thiserror::Error;

use crate::usecase::ports::storage::{Locator, StorageError};

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("failed to read {locator}: {source}")]
    StorageReadFailure {
        locator: Locator,
        #[source]
        source: StorageError,
    },
    #[error("failed to write {locator}: {source}")]
    StorageWriteFailure {
        locator: Locator,
        #[source]
        source: StorageError,
    },
    #[error("failed to back up {source_locator} to {backup}: {source}")]
    StorageCopyFailure {
        source_locator: Locator,
        backup: Locator,
        #[source]
        source: StorageError,
    },
    #[error("table shape mismatch: expected {expected}, found {found}")]
    ShapeMismatch { expected: String, found: String },
    #[error("principal is not authenticated")]
    Unauthenticated,
    #[error("import failed: {0:#}")]
    Import(anyhow::Error),
    #[error("export failed: {0:#}")]
    Export(anyhow::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl EditorError {
    pub fn shape(expected: impl Into<String>, found: impl Into<String>) -> Self {
        EditorError::ShapeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// True for failures raised by the storage collaborator.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            EditorError::StorageReadFailure { .. }
                | EditorError::StorageWriteFailure { .. }
                | EditorError::StorageCopyFailure { .. }
        )
    }
}
