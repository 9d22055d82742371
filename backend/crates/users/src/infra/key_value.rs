//! Key-Value Repository Implementation
//!
//! The whole collection lives under a single key as a JSON array, newest
//! first. Every insert rewrites the array.

use chrono::{DateTime, Utc};
use platform::kv::KeyValueStore;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::domain::entity::user_record::{NewUserRecord, UserRecord};
use crate::domain::repository::UserRecordRepository;
use crate::domain::value_object::{user_id::UserId, user_name::UserName};
use crate::error::{StorageError, StorageResult};

/// Key holding the serialized collection
pub const USERS_KEY: &str = "users";

/// Serialized form of one record
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredUser {
    id: i64,
    name: String,
    created_at: DateTime<Utc>,
}

impl From<&UserRecord> for StoredUser {
    fn from(record: &UserRecord) -> Self {
        Self {
            id: record.id.as_i64(),
            name: record.name.as_str().to_string(),
            created_at: record.created_at,
        }
    }
}

impl StoredUser {
    fn into_record(self) -> StorageResult<UserRecord> {
        let name = UserName::new(self.name)
            .map_err(|e| StorageError::Corrupt(format!("user {}: {}", self.id, e)))?;

        Ok(UserRecord::new(
            UserId::from_i64(self.id),
            name,
            Some(self.created_at),
        ))
    }
}

/// User record repository over a key-value namespace
pub struct KvUserRepository<K> {
    kv: K,
    key: String,
    /// Serializes read-modify-write cycles
    write_lock: Mutex<()>,
}

impl<K> KvUserRepository<K>
where
    K: KeyValueStore + Send + Sync,
{
    pub fn new(kv: K) -> Self {
        Self::with_key(kv, USERS_KEY)
    }

    pub fn with_key(kv: K, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// The underlying namespace
    pub fn namespace(&self) -> &K {
        &self.kv
    }

    /// Stored order, newest first. Missing or blank values are an empty collection.
    async fn load(&self) -> StorageResult<Vec<UserRecord>> {
        let Some(raw) = self.kv.get(&self.key).await? else {
            return Ok(Vec::new());
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        let stored: Vec<StoredUser> = serde_json::from_str(&raw)?;
        stored.into_iter().map(StoredUser::into_record).collect()
    }

    async fn save(&self, records: &[UserRecord]) -> StorageResult<()> {
        let stored: Vec<StoredUser> = records.iter().map(StoredUser::from).collect();
        let raw = serde_json::to_string(&stored)?;
        self.kv.set(&self.key, &raw).await?;
        Ok(())
    }
}

/// Epoch milliseconds of `created_at`, bumped past the current maximum on collision
fn next_id(records: &[UserRecord], created_at: DateTime<Utc>) -> StorageResult<i64> {
    let candidate = created_at.timestamp_millis();
    match records.iter().map(|r| r.id.as_i64()).max() {
        Some(last) if last >= candidate => last.checked_add(1).ok_or_else(|| {
            StorageError::Corrupt(format!("user id {last} leaves no room for a new id"))
        }),
        _ => Ok(candidate),
    }
}

impl<K> UserRecordRepository for KvUserRepository<K>
where
    K: KeyValueStore + Send + Sync,
{
    async fn initialize(&self) -> StorageResult<()> {
        self.kv.ensure_ready().await?;
        let count = self.load().await?.len();

        tracing::info!(key = %self.key, count, "Key-value user collection ready");
        Ok(())
    }

    async fn list_all(&self) -> StorageResult<Vec<UserRecord>> {
        let mut records = self.load().await?;
        records.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(records)
    }

    async fn insert(&self, record: NewUserRecord) -> StorageResult<UserRecord> {
        let _guard = self.write_lock.lock().await;

        let mut records = self.load().await?;
        let id = next_id(&records, record.created_at)?;
        let created = record.into_record(UserId::from_i64(id));

        records.insert(0, created.clone());
        self.save(&records).await?;

        Ok(created)
    }
}
