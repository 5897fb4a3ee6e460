//! Guarded editing of a tabular snapshot kept in object storage.
//!
//! The flow is: read the current snapshot, normalize its column labels, let the
//! operator edit it elsewhere, reconcile the edit against the pre-edit table (row
//! removals need a confirmation code), normalize dates, and commit with a backup.

pub mod config;
pub mod error;

pub mod domain {
    pub mod entities {
        pub mod challenge;
        pub mod session;
        pub mod table;
    }

    pub mod rules {
        pub mod columns;
        pub mod dates;
        pub mod row_diff;
    }
}

pub mod usecase {
    pub mod ports {
        pub mod identity;
        pub mod storage;
    }

    pub mod services {
        pub mod commit_service;
        pub mod import_service;
        pub mod reconcile_service;
        pub mod snapshot_service;
    }
}

pub mod infra {
    pub mod export {
        pub mod csv;
        pub mod parquet;
    }

    pub mod import {
        pub mod csv;
        pub mod parquet;
        pub mod xlsx;
    }

    pub mod memory {
        pub mod store;
    }

    pub mod sqlite {
        pub mod schema;
        pub mod store;
    }
}


pub use config::{BackupClock, EditorConfig};
pub use domain::entities::challenge::{AttemptOutcome, GateState, VerificationChallenge};
pub use domain::entities::session::EditSession;
pub use domain::entities::table::{CellValue, RowIdentity, Table};
pub use error::EditorError;
pub use usecase::ports::identity::{IdentityProvider, Principal};
pub use usecase::ports::storage::{Locator, SnapshotCache, StorageError, TableStorage};
pub use usecase::services::commit_service::{CommitPipeline, CommitReport};
pub use usecase::services::reconcile_service::{Reconciliation, ReconcileService};
pub use usecase::services::snapshot_service::SnapshotService;

/// Canonical marker written in place of missing cells.
pub const MISSING_MARKER: &str = "--";

/// Canonical output format of every recognized date cell.
pub const DATE_OUTPUT_FORMAT: &str = "%d/%m/%Y";

/// Default length of the removal confirmation code.
pub const DEFAULT_CODE_LENGTH: usize = 3;

/// Default key prefix under which pre-write backups are stored.
pub const DEFAULT_BACKUP_PREFIX: &str = "backups";
