use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::config::{BackupClock, EditorConfig};
use crate::domain::entities::session::EditSession;
use crate::domain::entities::table::Table;
use crate::error::EditorError;
use crate::usecase::ports::storage::{Locator, SnapshotCache, TableStorage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReport {
    pub target: Locator,
    pub backup: Locator,
}

/// Backup, overwrite, invalidate. Never writes the target without a backup first.
pub struct CommitPipeline {
    storage: Arc<dyn TableStorage>,
    cache: Arc<dyn SnapshotCache>,
    backup_prefix: String,
    clock: BackupClock,
}

impl CommitPipeline {
    pub fn new(
        storage: Arc<dyn TableStorage>,
        cache: Arc<dyn SnapshotCache>,
        backup_prefix: impl Into<String>,
        clock: BackupClock,
    ) -> Self {
        Self {
            storage,
            cache,
            backup_prefix: backup_prefix.into(),
            clock,
        }
    }

    pub fn from_config(
        config: &EditorConfig,
        storage: Arc<dyn TableStorage>,
        cache: Arc<dyn SnapshotCache>,
    ) -> Self {
        Self::new(storage, cache, config.backup_prefix.clone(), config.backup_clock)
    }

    pub fn commit(
        &self,
        session: &EditSession,
        accepted: &Table,
        target: &Locator,
    ) -> Result<CommitReport, EditorError> {
        self.commit_at(session, accepted, target, self.clock.now())
    }

    /// Same as [`CommitPipeline::commit`] with an explicit backup timestamp.
    ///
    /// A failed backup aborts before the write. A failed write leaves the backup in
    /// place. A failed invalidation is logged and otherwise ignored.
    pub fn commit_at(
        &self,
        session: &EditSession,
        accepted: &Table,
        target: &Locator,
        at: NaiveDateTime,
    ) -> Result<CommitReport, EditorError> {
        let backup = target.backup_locator(&self.backup_prefix, at);

        self.storage
            .copy(target, &backup)
            .map_err(|source| EditorError::StorageCopyFailure {
                source_locator: target.clone(),
                backup: backup.clone(),
                source,
            })?;
        tracing::info!(%target, %backup, "backup created");

        self.storage
            .write(target, accepted)
            .map_err(|source| EditorError::StorageWriteFailure {
                locator: target.clone(),
                source,
            })?;
        tracing::info!(
            %target,
            rows = accepted.row_count(),
            principal = %session.principal().name,
            "snapshot written"
        );

        if let Err(err) = self.cache.invalidate(target) {
            tracing::warn!(%target, error = %err, "failed to invalidate snapshot cache");
        }

        Ok(CommitReport {
            target: target.clone(),
            backup,
        })
    }
}
