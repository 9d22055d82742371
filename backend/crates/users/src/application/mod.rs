//! Application Layer
//!
//! Store service and configuration.

pub mod config;
pub mod user_store;

// Re-exports
pub use config::{ConfigError, StorageBackendKind, UserStoreConfig};
pub use user_store::UserStore;
