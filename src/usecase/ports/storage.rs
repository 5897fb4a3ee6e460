use std::fmt;

use chrono::NaiveDateTime;

use crate::domain::entities::table::Table;

/// Bucket plus object key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Locator {
    pub bucket: String,
    pub key: String,
}

impl Locator {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Last path segment of the key.
    pub fn file_name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }

    /// `(stem, extension)` of the file name; a leading dot is part of the stem.
    pub fn split_extension(&self) -> (&str, Option<&str>) {
        let name = self.file_name();
        match name.rfind('.') {
            Some(idx) if idx > 0 => (&name[..idx], Some(&name[idx + 1..])),
            _ => (name, None),
        }
    }

    /// `<prefix>/<stem>_<YYYYMMDD_HHMMSS>.<ext>` in the same bucket.
    pub fn backup_locator(&self, prefix: &str, at: NaiveDateTime) -> Locator {
        let (stem, extension) = self.split_extension();
        let stamp = at.format("%Y%m%d_%H%M%S");
        let prefix = prefix.trim_end_matches('/');
        let file = match extension {
            Some(ext) => format!("{stem}_{stamp}.{ext}"),
            None => format!("{stem}_{stamp}"),
        };
        let key = if prefix.is_empty() {
            file
        } else {
            format!("{prefix}/{file}")
        };
        Locator::new(self.bucket.clone(), key)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    NotFound(String),
    Message(String),
}

impl StorageError {
    pub fn message(err: impl fmt::Display) -> Self {
        StorageError::Message(format!("{err:#}"))
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::NotFound(locator) => write!(f, "object not found: {locator}"),
            StorageError::Message(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for StorageError {}

/// Object store holding whole tables. Every call either completes or fails; no retries.
pub trait TableStorage: Send + Sync {
    fn read(&self, locator: &Locator) -> Result<Table, StorageError>;
    /// Fully replaces whatever is stored at `locator`.
    fn write(&self, locator: &Locator, table: &Table) -> Result<(), StorageError>;
    fn copy(&self, source: &Locator, dest: &Locator) -> Result<(), StorageError>;
}

/// Memoized reads of the current snapshot.
pub trait SnapshotCache: Send + Sync {
    fn invalidate(&self, locator: &Locator) -> Result<(), StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|d| d.and_hms_opt(7, 5, 1))
            .expect("valid timestamp")
    }

    #[test]
    fn backup_keeps_stem_and_extension() {
        let target = Locator::new("bucket", "Controle_de_Processos.parquet");
        let backup = target.backup_locator("backups", at());
        assert_eq!(backup.bucket, "bucket");
        assert_eq!(backup.key, "backups/Controle_de_Processos_20240309_070501.parquet");
    }

    #[test]
    fn backup_uses_file_name_of_nested_key() {
        let target = Locator::new("b", "data/2024/table.v2.parquet");
        let backup = target.backup_locator("backups/", at());
        assert_eq!(backup.key, "backups/table.v2_20240309_070501.parquet");
    }

    #[test]
    fn backup_without_extension_has_no_trailing_dot() {
        let target = Locator::new("b", "snapshot");
        let backup = target.backup_locator("backups", at());
        assert_eq!(backup.key, "backups/snapshot_20240309_070501");
    }
}
