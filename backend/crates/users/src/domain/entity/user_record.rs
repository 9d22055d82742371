//! User Record Entity
//!
//! A persisted user: store-assigned id, display name, creation time.
//! Records are immutable once created.

use chrono::{DateTime, Utc};

use crate::domain::value_object::{user_id::UserId, user_name::UserName};

/// A validated record waiting for the store to assign its id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUserRecord {
    pub name: UserName,
    pub created_at: DateTime<Utc>,
}

impl NewUserRecord {
    /// Stamp a validated name with the current time
    pub fn new(name: UserName) -> Self {
        Self {
            name,
            created_at: Utc::now(),
        }
    }

    /// Attach the id assigned by the backing store
    pub fn into_record(self, id: UserId) -> UserRecord {
        UserRecord {
            id,
            name: self.name,
            created_at: self.created_at,
        }
    }
}

/// User record entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Unique, stable for the record's lifetime
    pub id: UserId,
    pub name: UserName,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// Rebuild a record; a missing timestamp defaults to now
    pub fn new(id: UserId, name: UserName, created_at: Option<DateTime<Utc>>) -> Self {
        Self {
            id,
            name,
            created_at: created_at.unwrap_or_else(Utc::now),
        }
    }
}
