//! Repository Traits
//!
//! Interfaces for data persistence. Implementations are in the infrastructure layer.

use crate::domain::entity::user_record::{NewUserRecord, UserRecord};
use crate::error::StorageResult;

/// User record repository trait
#[trait_variant::make(UserRecordRepository: Send)]
pub trait LocalUserRecordRepository {
    /// Prepare the backing store (open handles, create schema). Must be idempotent.
    async fn initialize(&self) -> StorageResult<()>;

    /// All records, newest first
    async fn list_all(&self) -> StorageResult<Vec<UserRecord>>;

    /// Persist a record and return it with its assigned id
    async fn insert(&self, record: NewUserRecord) -> StorageResult<UserRecord>;
}
