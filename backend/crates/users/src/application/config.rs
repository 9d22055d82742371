//! Application Configuration
//!
//! Configuration for the user store: which backend to open and how names are stored.

use derive_more::Display;
use std::path::PathBuf;
use thiserror::Error;

pub use crate::domain::value_object::user_name::NamePolicy;

/// Backing store selected at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum StorageBackendKind {
    /// Embedded SQLite database
    #[default]
    #[display("sqlite")]
    Sqlite,
    /// File-backed key-value namespace, one JSON array per collection
    #[display("key_value")]
    KeyValue,
    /// In-memory key-value namespace, lost on exit
    #[display("key_value_memory")]
    KeyValueMemory,
}

impl StorageBackendKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Some(Self::Sqlite),
            "key_value" | "kv" => Some(Self::KeyValue),
            "key_value_memory" | "memory" => Some(Self::KeyValueMemory),
            _ => None,
        }
    }
}

/// Invalid configuration value
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid value for {var}: {value:?}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
}

/// User store configuration
#[derive(Debug, Clone)]
pub struct UserStoreConfig {
    /// Backend to open
    pub backend: StorageBackendKind,
    /// SQLite connection URL
    pub database_url: String,
    /// Directory of the key-value namespace
    pub kv_dir: PathBuf,
    /// Whether names are stored raw or trimmed
    pub name_policy: NamePolicy,
}

impl Default for UserStoreConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackendKind::Sqlite,
            database_url: "sqlite://data/users.db".to_string(),
            kv_dir: PathBuf::from("./data/kv"),
            name_policy: NamePolicy::Raw,
        }
    }
}

impl UserStoreConfig {
    /// Environment variable names
    pub const BACKEND_VAR: &'static str = "USER_STORE_BACKEND";
    pub const DATABASE_URL_VAR: &'static str = "DATABASE_URL";
    pub const KV_DIR_VAR: &'static str = "KV_DATA_DIR";
    pub const NAME_POLICY_VAR: &'static str = "USER_NAME_POLICY";

    /// Config backed by an in-memory SQLite database (tests, throwaway runs)
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            ..Default::default()
        }
    }

    /// Load from process environment, falling back to defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load using a custom variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(Self::BACKEND_VAR) {
            config.backend = StorageBackendKind::parse(&value).ok_or(ConfigError {
                var: Self::BACKEND_VAR,
                value,
            })?;
        }
        if let Some(value) = lookup(Self::DATABASE_URL_VAR) {
            config.database_url = value;
        }
        if let Some(value) = lookup(Self::KV_DIR_VAR) {
            config.kv_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup(Self::NAME_POLICY_VAR) {
            config.name_policy = NamePolicy::parse(&value).ok_or(ConfigError {
                var: Self::NAME_POLICY_VAR,
                value,
            })?;
        }

        Ok(config)
    }
}
