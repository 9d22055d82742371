//! Users Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository trait
//! - `application/` - User store service and configuration
//! - `infra/` - SQLite and key-value repository implementations
//! - `presentation/` - HTTP handlers, DTOs, router
//!
//! ## Features
//! - Durable user records behind one interface, on SQLite or a key-value namespace
//! - Name validation before any write
//! - Listeners notified after every successful write
//!
//! ## Usage
//! Build one [`UserStore`] per backing resource, call `initialize`, then
//! share it behind an `Arc`.

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::{NamePolicy, StorageBackendKind, UserStoreConfig};
pub use application::user_store::UserStore;
pub use error::{StorageError, StorageResult, UserError, UserResult};
pub use infra::backend::UserRecordBackend;
pub use presentation::router::users_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod store {
    pub use crate::infra::key_value::KvUserRepository;
    pub use crate::infra::sqlite::SqliteUserRepository;
}

pub mod router {
    pub use crate::presentation::router::*;
}

#[cfg(test)]
mod tests;
