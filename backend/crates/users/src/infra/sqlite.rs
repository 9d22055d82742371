//! SQLite Repository Implementation

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::PathBuf;
use std::str::FromStr;

use crate::domain::entity::user_record::{NewUserRecord, UserRecord};
use crate::domain::repository::UserRecordRepository;
use crate::domain::value_object::{user_id::UserId, user_name::UserName};
use crate::error::{StorageError, StorageResult};

const CREATE_USERS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
"#;

/// SQLite-backed user record repository
#[derive(Clone)]
pub struct SqliteUserRepository {
    pool: SqlitePool,
    /// Parent directory of the database file, created on `initialize`
    data_dir: Option<PathBuf>,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            data_dir: None,
        }
    }

    /// Build a lazily connected pool. Nothing is opened until `initialize`.
    pub fn connect_lazy(database_url: &str) -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");
        let pool = if in_memory {
            // One long-lived connection keeps the in-memory database alive.
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_lazy_with(options)
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_lazy_with(options)
        };

        let data_dir = if in_memory {
            None
        } else {
            SqliteConnectOptions::from_str(database_url)?
                .get_filename()
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .map(|dir| dir.to_path_buf())
        };

        Ok(Self { pool, data_dir })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl UserRecordRepository for SqliteUserRepository {
    async fn initialize(&self) -> StorageResult<()> {
        if let Some(dir) = &self.data_dir {
            tokio::fs::create_dir_all(dir).await?;
        }

        sqlx::query(CREATE_USERS_TABLE).execute(&self.pool).await?;

        tracing::info!("SQLite users table ready");
        Ok(())
    }

    async fn list_all(&self) -> StorageResult<Vec<UserRecord>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                id,
                name,
                created_at
            FROM users
            ORDER BY id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(UserRow::into_record).collect()
    }

    async fn insert(&self, record: NewUserRecord) -> StorageResult<UserRecord> {
        let result = sqlx::query("INSERT INTO users (name, created_at) VALUES (?, ?)")
            .bind(record.name.as_str())
            .bind(record.created_at)
            .execute(&self.pool)
            .await?;

        Ok(record.into_record(UserId::from_i64(result.last_insert_rowid())))
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: String,
    created_at: DateTime<Utc>,
}

impl UserRow {
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
