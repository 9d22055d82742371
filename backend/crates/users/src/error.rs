//! User Store Error Types
//!
//! This module provides user-store error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::kv::KvError;
use thiserror::Error;

use crate::domain::value_object::user_name::UserNameError;

/// User-store result type alias
pub type UserResult<T> = Result<T, UserError>;

/// Backend result type alias
pub type StorageResult<T> = Result<T, StorageError>;

/// Failures raised by a backing store
#[derive(Debug, Error)]
pub enum StorageError {
    /// SQLite error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Key-value namespace error
    #[error("Key-value error: {0}")]
    KeyValue(#[from] KvError),

    /// Filesystem error outside the key-value namespace
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored collection could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored data violates a record invariant
    #[error("Corrupt record data: {0}")]
    Corrupt(String),
}

impl StorageError {
    fn into_app_error(self) -> AppError {
        match self {
            StorageError::Database(e) => AppError::from(e),
            StorageError::KeyValue(KvError::Io(e)) | StorageError::Io(e) => AppError::from(e),
            StorageError::Serialization(e) => AppError::from(e),
            other => AppError::internal("Could not load or save users").with_source(other),
        }
    }
}

/// User-store error variants
#[derive(Debug, Error)]
pub enum UserError {
    /// Caller-supplied name violates an invariant
    #[error("{0}")]
    Validation(#[from] UserNameError),

    /// Backend failed during a read or write
    #[error("Storage error: {0}")]
    Storage(#[source] StorageError),

    /// Backend could not be prepared
    #[error("Initialization failed: {0}")]
    Initialization(#[source] StorageError),

    /// An operation ran before a successful `initialize`
    #[error("User store is not initialized")]
    NotInitialized,
}

impl From<StorageError> for UserError {
    fn from(err: StorageError) -> Self {
        UserError::Storage(err)
    }
}

impl UserError {
    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            UserError::Validation(_) => ErrorKind::BadRequest,
            UserError::Storage(_) => ErrorKind::InternalServerError,
            UserError::Initialization(_) | UserError::NotInitialized => {
                ErrorKind::ServiceUnavailable
            }
        }
    }

    /// True for failures that leave the store unusable until re-initialized
    pub fn is_initialization(&self) -> bool {
        matches!(
            self,
            UserError::Initialization(_) | UserError::NotInitialized
        )
    }

    /// Convert to AppError
    pub fn into_app_error(self) -> AppError {
        match self {
            UserError::Validation(e) => AppError::bad_request(e.to_string())
                .with_action("Enter a name between 1 and 50 characters")
                .with_source(e),
            UserError::Storage(e) => e.into_app_error(),
            UserError::Initialization(e) => AppError::service_unavailable("User store is not ready")
                .with_action("Try again later")
                .with_source(e),
            UserError::NotInitialized => AppError::service_unavailable("User store is not ready")
                .with_action("Try again later"),
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            UserError::Storage(e) => {
                tracing::error!(error = %e, "User store storage error");
            }
            UserError::Initialization(e) => {
                tracing::error!(error = %e, "User store initialization error");
            }
            UserError::NotInitialized => {
                tracing::warn!("User store used before initialization");
            }
            UserError::Validation(e) => {
                tracing::debug!(error = %e, "User name rejected");
            }
        }
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        self.log();
        self.into_app_error().into_response()
    }
}
