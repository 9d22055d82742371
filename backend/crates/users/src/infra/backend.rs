//! Backend Selection
//!
//! The configured repository, chosen once at startup.

use platform::kv::{FileKeyValueStore, MemoryKeyValueStore};

use crate::application::config::{StorageBackendKind, UserStoreConfig};
use crate::domain::entity::user_record::{NewUserRecord, UserRecord};
use crate::domain::repository::UserRecordRepository;
use crate::error::StorageResult;
use crate::infra::key_value::KvUserRepository;
use crate::infra::sqlite::SqliteUserRepository;

/// Either backing store behind one repository type
pub enum UserRecordBackend {
    Sqlite(SqliteUserRepository),
    KeyValue(KvUserRepository<FileKeyValueStore>),
    MemoryKeyValue(KvUserRepository<MemoryKeyValueStore>),
}

impl UserRecordBackend {
    /// Build the backend named by `config.backend`. No I/O happens until `initialize`.
    pub fn from_config(config: &UserStoreConfig) -> StorageResult<Self> {
        let backend = match config.backend {
            StorageBackendKind::Sqlite => {
                Self::Sqlite(SqliteUserRepository::connect_lazy(&config.database_url)?)
            }
            StorageBackendKind::KeyValue => Self::KeyValue(KvUserRepository::new(
                FileKeyValueStore::new(config.kv_dir.clone()),
            )),
            StorageBackendKind::KeyValueMemory => {
                Self::MemoryKeyValue(KvUserRepository::new(MemoryKeyValueStore::new()))
            }
        };

        tracing::debug!(backend = %backend.kind(), "User record backend selected");
        Ok(backend)
    }

    pub fn kind(&self) -> StorageBackendKind {
        match self {
            Self::Sqlite(_) => StorageBackendKind::Sqlite,
            Self::KeyValue(_) => StorageBackendKind::KeyValue,
            Self::MemoryKeyValue(_) => StorageBackendKind::KeyValueMemory,
        }
    }
}

impl UserRecordRepository for UserRecordBackend {
    async fn initialize(&self) -> StorageResult<()> {
        match self {
            Self::Sqlite(repo) => repo.initialize().await,
            Self::KeyValue(repo) => repo.initialize().await,
            Self::MemoryKeyValue(repo) => repo.initialize().await,
        }
    }

    async fn list_all(&self) -> StorageResult<Vec<UserRecord>> {
        match self {
            Self::Sqlite(repo) => repo.list_all().await,
            Self::KeyValue(repo) => repo.list_all().await,
            Self::MemoryKeyValue(repo) => repo.list_all().await,
        }
    }

    async fn insert(&self, record: NewUserRecord) -> StorageResult<UserRecord> {
        match self {
            Self::Sqlite(repo) => repo.insert(record).await,
            Self::KeyValue(repo) => repo.insert(record).await,
            Self::MemoryKeyValue(repo) => repo.insert(record).await,
        }
    }
}
