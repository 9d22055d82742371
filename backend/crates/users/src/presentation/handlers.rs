//! HTTP Handlers

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use std::sync::Arc;

use crate::application::user_store::UserStore;
use crate::domain::repository::UserRecordRepository;
use crate::error::UserResult;
use crate::presentation::dto::{CreateUserRequest, HealthResponse, UserRecordResponse};

/// Shared state for user handlers
pub struct UsersAppState<R>
where
    R: UserRecordRepository + Send + Sync + 'static,
{
    pub store: Arc<UserStore<R>>,
}

// Manual impl: the repository itself need not be Clone
impl<R> Clone for UsersAppState<R>
where
    R: UserRecordRepository + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

// ============================================================================
// Users
// ============================================================================

/// GET /api/users
pub async fn list_users<R>(
    State(state): State<UsersAppState<R>>,
) -> UserResult<Json<Vec<UserRecordResponse>>>
where
    R: UserRecordRepository + Send + Sync + 'static,
{
    let records = state.store.list_all().await?;
    Ok(Json(records.into_iter().map(UserRecordResponse::from).collect()))
}

/// POST /api/users
pub async fn create_user<R>(
    State(state): State<UsersAppState<R>>,
    Json(req): Json<CreateUserRequest>,
) -> UserResult<(StatusCode, Json<UserRecordResponse>)>
where
    R: UserRecordRepository + Send + Sync + 'static,
{
    let record = state.store.add(req.name).await?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

// ============================================================================
// Health
// ============================================================================

/// GET /api/health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
