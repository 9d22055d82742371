//! Infrastructure Layer
//!
//! Repository implementations for each backing store.

pub mod backend;
pub mod key_value;
pub mod sqlite;

pub use backend::UserRecordBackend;
pub use key_value::KvUserRepository;
pub use sqlite::SqliteUserRepository;
