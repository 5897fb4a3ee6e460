use std::path::PathBuf;

use chrono::{Local, NaiveDateTime, Utc};
use directories::ProjectDirs;

use crate::error::EditorError;
use crate::usecase::ports::storage::Locator;
use crate::{DEFAULT_BACKUP_PREFIX, DEFAULT_CODE_LENGTH};

const ENV_BUCKET: &str = "TABLE_EDITOR_BUCKET";
const ENV_KEY: &str = "TABLE_EDITOR_KEY";
const ENV_DB_PATH: &str = "TABLE_EDITOR_DB_PATH";
const ENV_BACKUP_PREFIX: &str = "TABLE_EDITOR_BACKUP_PREFIX";
const ENV_CODE_LENGTH: &str = "TABLE_EDITOR_CODE_LENGTH";
const ENV_BACKUP_CLOCK: &str = "TABLE_EDITOR_BACKUP_CLOCK";

/// Time zone used for backup timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackupClock {
    #[default]
    Local,
    Utc,
}

impl BackupClock {
    pub fn now(self) -> NaiveDateTime {
        match self {
            BackupClock::Local => Local::now().naive_local(),
            BackupClock::Utc => Utc::now().naive_utc(),
        }
    }

    fn parse(value: &str) -> Result<Self, EditorError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(BackupClock::Local),
            "utc" => Ok(BackupClock::Utc),
            other => Err(EditorError::Config(format!(
                "{ENV_BACKUP_CLOCK} must be `local` or `utc`, got `{other}`"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorConfig {
    pub bucket: String,
    pub key: String,
    pub database_path: PathBuf,
    pub backup_prefix: String,
    pub code_length: usize,
    pub backup_clock: BackupClock,
}

impl EditorConfig {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>, database_path: PathBuf) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            database_path,
            backup_prefix: DEFAULT_BACKUP_PREFIX.to_string(),
            code_length: DEFAULT_CODE_LENGTH,
            backup_clock: BackupClock::default(),
        }
    }

    pub fn from_env() -> Result<Self, EditorError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any name→value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, EditorError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| EditorError::Config(format!("{name} is required")))
        };
        let bucket = required(ENV_BUCKET)?;
        let key = required(ENV_KEY)?;

        let database_path = match lookup(ENV_DB_PATH) {
            Some(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => default_db_path()?,
        };

        let mut config = Self::new(bucket, key, database_path);

        if let Some(prefix) = lookup(ENV_BACKUP_PREFIX) {
            config.backup_prefix = prefix.trim().trim_end_matches('/').to_string();
        }
        if let Some(length) = lookup(ENV_CODE_LENGTH) {
            config.code_length = length
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    EditorError::Config(format!(
                        "{ENV_CODE_LENGTH} must be a positive integer, got `{length}`"
                    ))
                })?;
        }
        if let Some(clock) = lookup(ENV_BACKUP_CLOCK) {
            config.backup_clock = BackupClock::parse(&clock)?;
        }

        Ok(config)
    }

    pub fn target_locator(&self) -> Locator {
        Locator::new(self.bucket.clone(), self.key.clone())
    }
}

pub fn default_db_path() -> Result<PathBuf, EditorError> {
    let project_dirs = ProjectDirs::from("com", "hellhbbd", "table-editor")
        .ok_or_else(|| EditorError::Config("unable to resolve data directory".into()))?;
    Ok(project_dirs.data_local_dir().join("objects.sqlite"))
}
