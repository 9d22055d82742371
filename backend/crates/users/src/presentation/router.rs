//! Users Router

use axum::{Router, routing::get};
use std::sync::Arc;

use crate::application::user_store::UserStore;
use crate::domain::repository::UserRecordRepository;
use crate::infra::backend::UserRecordBackend;
use crate::presentation::handlers::{self, UsersAppState};

/// Create the users router over the configured backend
pub fn users_router(store: Arc<UserStore<UserRecordBackend>>) -> Router {
    users_router_generic(store)
}

/// Create a generic users router for any repository implementation
pub fn users_router_generic<R>(store: Arc<UserStore<R>>) -> Router
where
    R: UserRecordRepository + Send + Sync + 'static,
{
    let state = UsersAppState { store };

    Router::new()
        .route(
            "/users",
            get(handlers::list_users::<R>).post(handlers::create_user::<R>),
        )
        .route("/health", get(handlers::health))
        .with_state(state)
}
