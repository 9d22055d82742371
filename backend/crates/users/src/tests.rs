//! Crate-level tests for the user store
//! Each store behavior runs against both backends.

#[cfg(test)]
mod store_tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use platform::kv::MemoryKeyValueStore;

    use crate::application::config::NamePolicy;
    use crate::application::user_store::UserStore;
    use crate::domain::repository::UserRecordRepository;
    use crate::domain::value_object::user_name::{USER_NAME_MAX_LENGTH, UserNameError};
    use crate::error::UserError;
    use crate::infra::key_value::KvUserRepository;
    use crate::infra::sqlite::SqliteUserRepository;

    fn kv_store() -> UserStore<KvUserRepository<MemoryKeyValueStore>> {
        UserStore::with_policy(
            KvUserRepository::new(MemoryKeyValueStore::new()),
            NamePolicy::Raw,
        )
    }

    fn sqlite_store() -> UserStore<SqliteUserRepository> {
        UserStore::with_policy(
            SqliteUserRepository::connect_lazy("sqlite::memory:").unwrap(),
            NamePolicy::Raw,
        )
    }

    async fn ready<R>(store: UserStore<R>) -> UserStore<R>
    where
        R: UserRecordRepository + Send + Sync,
    {
        store.initialize().await.unwrap();
        store
    }

    // ------------------------------------------------------------------------
    // Checks shared by both backends
    // ------------------------------------------------------------------------

    async fn check_blank_names_rejected<R>(store: UserStore<R>)
    where
        R: UserRecordRepository + Send + Sync,
    {
        let store = ready(store).await;

        for name in ["", " ", "   ", "\t", "\n  \t"] {
            let result = store.add(name).await;
            assert!(
                matches!(result, Err(UserError::Validation(UserNameError::Required))),
                "expected validation error for {name:?}"
            );
        }

        assert!(store.list_all().await.unwrap().is_empty());
    }

    async fn check_length_limit<R>(store: UserStore<R>)
    where
        R: UserRecordRepository + Send + Sync,
    {
        let store = ready(store).await;

        let too_long = "a".repeat(USER_NAME_MAX_LENGTH + 1);
        let result = store.add(too_long).await;
        assert!(matches!(
            result,
            Err(UserError::Validation(UserNameError::TooLong { .. }))
        ));
        assert!(store.list_all().await.unwrap().is_empty());

        let longest = "a".repeat(USER_NAME_MAX_LENGTH);
        let record = store.add(longest.clone()).await.unwrap();
        assert_eq!(record.name.as_str(), longest);
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    async fn check_add_returns_raw_name_and_unique_ids<R>(store: UserStore<R>)
    where
        R: UserRecordRepository + Send + Sync,
    {
        let store = ready(store).await;

        let mut ids = Vec::new();
        for name in ["Alex", "  padded  ", "Alex", "名前"] {
            let record = store.add(name).await.unwrap();
            assert_eq!(record.name.as_str(), name);
            assert!(!ids.contains(&record.id));
            ids.push(record.id);
        }
    }

    async fn check_list_newest_first<R>(store: UserStore<R>)
    where
        R: UserRecordRepository + Send + Sync,
    {
        let store = ready(store).await;

        let names = ["first", "second", "third", "fourth"];
        for name in names {
            store.add(name).await.unwrap();
        }
        store.add("").await.unwrap_err();

        let listed: Vec<String> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name.into_inner())
            .collect();
        assert_eq!(listed, vec!["fourth", "third", "second", "first"]);
    }

    async fn check_initialize_twice_keeps_records<R>(store: UserStore<R>)
    where
        R: UserRecordRepository + Send + Sync,
    {
        let store = ready(store).await;
        store.add("Alex").await.unwrap();

        store.initialize().await.unwrap();

        let listed = store.list_all().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name.as_str(), "Alex");
    }

    async fn check_add_then_list<R>(store: UserStore<R>)
    where
        R: UserRecordRepository + Send + Sync,
    {
        let store = ready(store).await;

        let created = store.add("Alex").await.unwrap();
        assert_eq!(created.name.as_str(), "Alex");

        let listed = store.list_all().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, created.id);
        assert_eq!(listed[0].name, created.name);
        assert_eq!(
            listed[0].created_at.timestamp_millis(),
            created.created_at.timestamp_millis()
        );
    }

    async fn check_not_initialized<R>(store: UserStore<R>)
    where
        R: UserRecordRepository + Send + Sync,
    {
        assert!(!store.is_initialized());
        assert!(matches!(
            store.list_all().await,
            Err(UserError::NotInitialized)
        ));
        assert!(matches!(
            store.add("Alex").await,
            Err(UserError::NotInitialized)
        ));

        // Validation still runs first
        assert!(matches!(
            store.add("").await,
            Err(UserError::Validation(_))
        ));

        store.initialize().await.unwrap();
        assert!(store.is_initialized());
        assert!(store.list_all().await.unwrap().is_empty());
    }

    async fn check_failing_listeners_are_isolated<R>(store: UserStore<R>)
    where
        R: UserRecordRepository + Send + Sync,
    {
        let store = ready(store).await;
        let calls = Arc::new(AtomicUsize::new(0));

        store.subscribe(|| Err("listener failed".into()));
        store.subscribe(|| panic!("listener panicked"));
        let counter = Arc::clone(&calls);
        store.subscribe(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let record = store.add("Alex").await.unwrap();
        assert_eq!(record.name.as_str(), "Alex");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    async fn check_listeners_skip_failed_adds<R>(store: UserStore<R>)
    where
        R: UserRecordRepository + Send + Sync,
    {
        let store = ready(store).await;
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&calls);
        let id = store.subscribe(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        store.add("").await.unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        store.add("Alex").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.add("Sam").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    /// Listeners observe `list_all` from inside the callback. Run on a worker thread.
    async fn check_listeners_see_persisted_record<R>(store: UserStore<R>)
    where
        R: UserRecordRepository + Send + Sync + 'static,
    {
        let store = Arc::new(ready(store).await);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let handle = tokio::runtime::Handle::current();

        for label in ["first", "second"] {
            let store_ref = Arc::clone(&store);
            let seen = Arc::clone(&seen);
            let handle = handle.clone();
            store.subscribe(move || {
                let visible = tokio::task::block_in_place(|| handle.block_on(store_ref.list_all()))?;
                seen.lock().unwrap().push((label, visible.len()));
                Ok(())
            });
        }

        store.add("Alex").await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![("first", 1), ("second", 1)]);
    }

    // ------------------------------------------------------------------------
    // Key-value backend
    // ------------------------------------------------------------------------

    mod key_value {
        use super::*;

        #[tokio::test]
        async fn test_blank_names_rejected() {
            check_blank_names_rejected(kv_store()).await;
        }

        #[tokio::test]
        async fn test_length_limit() {
            check_length_limit(kv_store()).await;
        }

        #[tokio::test]
        async fn test_add_returns_raw_name_and_unique_ids() {
            check_add_returns_raw_name_and_unique_ids(kv_store()).await;
        }

        #[tokio::test]
        async fn test_list_newest_first() {
            check_list_newest_first(kv_store()).await;
        }

        #[tokio::test]
        async fn test_initialize_twice_keeps_records() {
            check_initialize_twice_keeps_records(kv_store()).await;
        }

        #[tokio::test]
        async fn test_add_then_list() {
            check_add_then_list(kv_store()).await;
        }

        #[tokio::test]
        async fn test_not_initialized() {
            check_not_initialized(kv_store()).await;
        }

        #[tokio::test]
        async fn test_failing_listeners_are_isolated() {
            check_failing_listeners_are_isolated(kv_store()).await;
        }

        #[tokio::test]
        async fn test_listeners_skip_failed_adds() {
            check_listeners_skip_failed_adds(kv_store()).await;
        }

        #[tokio::test(flavor = "multi_thread")]
        async fn test_listeners_see_persisted_record() {
            tokio::spawn(check_listeners_see_persisted_record(kv_store()))
                .await
                .unwrap();
        }
    }

    // ------------------------------------------------------------------------
    // SQLite backend
    // ------------------------------------------------------------------------

    mod sqlite {
        use super::*;

        #[tokio::test]
        async fn test_blank_names_rejected() {
            check_blank_names_rejected(sqlite_store()).await;
        }

        #[tokio::test]
        async fn test_length_limit() {
            check_length_limit(sqlite_store()).await;
        }

        #[tokio::test]
        async fn test_add_returns_raw_name_and_unique_ids() {
            check_add_returns_raw_name_and_unique_ids(sqlite_store()).await;
        }

        #[tokio::test]
        async fn test_list_newest_first() {
            check_list_newest_first(sqlite_store()).await;
        }

        #[tokio::test]
        async fn test_initialize_twice_keeps_records() {
            check_initialize_twice_keeps_records(sqlite_store()).await;
        }

        #[tokio::test]
        async fn test_add_then_list() {
            check_add_then_list(sqlite_store()).await;
        }

        #[tokio::test]
        async fn test_not_initialized() {
            check_not_initialized(sqlite_store()).await;
        }

        #[tokio::test]
        async fn test_failing_listeners_are_isolated() {
            check_failing_listeners_are_isolated(sqlite_store()).await;
        }

        #[tokio::test]
        async fn test_listeners_skip_failed_adds() {
            check_listeners_skip_failed_adds(sqlite_store()).await;
        }

        #[tokio::test(flavor = "multi_thread")]
        async fn test_listeners_see_persisted_record() {
            tokio::spawn(check_listeners_see_persisted_record(sqlite_store()))
                .await
                .unwrap();
        }
    }

    // ------------------------------------------------------------------------
    // Name policy
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_trimmed_policy_stores_trimmed_name() {
        let store = UserStore::with_policy(
            KvUserRepository::new(MemoryKeyValueStore::new()),
            NamePolicy::Trimmed,
        );
        store.initialize().await.unwrap();

        let record = store.add("  Alex  ").await.unwrap();
        assert_eq!(record.name.as_str(), "Alex");
        assert_eq!(store.list_all().await.unwrap()[0].name.as_str(), "Alex");
    }
}

#[cfg(test)]
mod logging_tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use platform::kv::MemoryKeyValueStore;
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    use crate::application::config::NamePolicy;
    use crate::application::user_store::UserStore;
    use crate::infra::key_value::KvUserRepository;

    /// Counts WARN events seen on the current thread
    struct WarnCounter(Arc<AtomicUsize>);

    impl<S: Subscriber> Layer<S> for WarnCounter {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == Level::WARN {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[tokio::test]
    async fn test_failed_listener_warns_once() {
        let warnings = Arc::new(AtomicUsize::new(0));
        let subscriber =
            tracing_subscriber::registry().with(WarnCounter(Arc::clone(&warnings)));
        let _guard = tracing::subscriber::set_default(subscriber);

        let store = UserStore::with_policy(
            KvUserRepository::new(MemoryKeyValueStore::new()),
            NamePolicy::Raw,
        );
        store.initialize().await.unwrap();
        store.subscribe(|| Err("listener failed".into()));

        store.add("Alex").await.unwrap();

        assert_eq!(warnings.load(Ordering::SeqCst), 1);
    }
}

#[cfg(test)]
mod backend_tests {
    use platform::kv::FileKeyValueStore;

    use crate::application::config::{StorageBackendKind, UserStoreConfig};
    use crate::application::user_store::UserStore;
    use crate::error::{StorageError, UserError};
    use crate::infra::backend::UserRecordBackend;
    use crate::infra::key_value::KvUserRepository;

    fn kv_config(dir: &std::path::Path) -> UserStoreConfig {
        UserStoreConfig {
            backend: StorageBackendKind::KeyValue,
            kv_dir: dir.to_path_buf(),
            ..Default::default()
        }
    }

    fn sqlite_config(path: &std::path::Path) -> UserStoreConfig {
        UserStoreConfig {
            backend: StorageBackendKind::Sqlite,
            database_url: format!("sqlite://{}", path.display()),
            ..Default::default()
        }
    }

    async fn open(config: &UserStoreConfig) -> UserStore<UserRecordBackend> {
        let store = UserStore::new(UserRecordBackend::from_config(config).unwrap(), config);
        store.initialize().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_from_config_picks_backend() {
        let tmp = tempfile::tempdir().unwrap();

        let kv = UserRecordBackend::from_config(&kv_config(tmp.path())).unwrap();
        assert_eq!(kv.kind(), StorageBackendKind::KeyValue);

        let sqlite =
            UserRecordBackend::from_config(&sqlite_config(&tmp.path().join("users.db"))).unwrap();
        assert_eq!(sqlite.kind(), StorageBackendKind::Sqlite);

        let memory = UserRecordBackend::from_config(&UserStoreConfig::in_memory()).unwrap();
        assert_eq!(memory.kind(), StorageBackendKind::Sqlite);
    }

    #[tokio::test]
    async fn test_memory_key_value_backend() {
        let config = UserStoreConfig {
            backend: StorageBackendKind::KeyValueMemory,
            ..Default::default()
        };
        let store = open(&config).await;
        assert_eq!(
            UserRecordBackend::from_config(&config).unwrap().kind(),
            StorageBackendKind::KeyValueMemory
        );

        store.add("Alex").await.unwrap();
        assert_eq!(store.list_all().await.unwrap().len(), 1);

        // A fresh backend starts empty
        let fresh = open(&config).await;
        assert!(fresh.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_key_value_records_survive_restart() {
        let tmp = tempfile::tempdir().unwrap();
        let config = kv_config(&tmp.path().join("kv"));

        {
            let store = open(&config).await;
            store.add("Alex").await.unwrap();
            store.add("Sam").await.unwrap();
        }

        let store = open(&config).await;
        let names: Vec<String> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name.into_inner())
            .collect();
        assert_eq!(names, vec!["Sam", "Alex"]);
    }

    #[tokio::test]
    async fn test_sqlite_records_survive_restart() {
        let tmp = tempfile::tempdir().unwrap();
        let config = sqlite_config(&tmp.path().join("data").join("users.db"));

        let first_id = {
            let store = open(&config).await;
            store.add("Alex").await.unwrap().id
        };

        let store = open(&config).await;
        let listed = store.list_all().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, first_id);

        let second = store.add("Sam").await.unwrap();
        assert!(second.id > first_id);
    }

    #[tokio::test]
    async fn test_initialize_failure_leaves_store_unusable() {
        let tmp = tempfile::tempdir().unwrap();
        // A regular file where the namespace directory should be
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let store = UserStore::with_policy(
            KvUserRepository::new(FileKeyValueStore::new(blocker.join("kv"))),
            Default::default(),
        );

        let err = store.initialize().await.unwrap_err();
        assert!(matches!(
            err,
            UserError::Initialization(StorageError::KeyValue(_))
        ));
        assert!(err.is_initialization());
        assert!(!store.is_initialized());
        assert!(matches!(
            store.add("Alex").await,
            Err(UserError::NotInitialized)
        ));
    }

    #[tokio::test]
    async fn test_corrupt_collection_fails_initialize() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("kv");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("users"), "[{\"id\": 1}").unwrap();

        let store = UserStore::new(
            UserRecordBackend::from_config(&kv_config(&dir)).unwrap(),
            &kv_config(&dir),
        );
        assert!(matches!(
            store.initialize().await,
            Err(UserError::Initialization(StorageError::Serialization(_)))
        ));
        assert!(matches!(
            store.list_all().await,
            Err(UserError::NotInitialized)
        ));
    }
}

#[cfg(test)]
mod router_tests {
    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    use platform::kv::MemoryKeyValueStore;

    use crate::application::config::NamePolicy;
    use crate::application::user_store::UserStore;
    use crate::infra::key_value::KvUserRepository;
    use crate::presentation::router::users_router_generic;

    type MemoryStore = UserStore<KvUserRepository<MemoryKeyValueStore>>;

    fn memory_store() -> Arc<MemoryStore> {
        Arc::new(UserStore::with_policy(
            KvUserRepository::new(MemoryKeyValueStore::new()),
            NamePolicy::Raw,
        ))
    }

    async fn ready_app() -> (Router, Arc<MemoryStore>) {
        let store = memory_store();
        store.initialize().await.unwrap();
        (users_router_generic(Arc::clone(&store)), store)
    }

    fn post_user(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/users")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = ready_app().await;

        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_create_user() {
        let (app, store) = ready_app().await;

        let response = app.oneshot(post_user(r#"{"name":"Alex"}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = json_body(response).await;
        assert_eq!(body["name"], "Alex");
        assert!(body["id"].is_i64());
        assert!(body["createdAt"].is_string());

        let listed = store.list_all().await.unwrap();
        assert_eq!(listed[0].id.as_i64(), body["id"].as_i64().unwrap());
    }

    #[tokio::test]
    async fn test_create_user_validation_error() {
        let (app, store) = ready_app().await;

        let response = app.oneshot(post_user(r#"{"name":"   "}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(response).await;
        assert_eq!(body["status"], 400);
        assert_eq!(body["code"], "BAD_REQUEST");
        assert_eq!(body["detail"], "name required");

        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_user_too_long() {
        let (app, _) = ready_app().await;
        let body = format!(r#"{{"name":"{}"}}"#, "x".repeat(51));

        let response = app.oneshot(post_user(&body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["detail"], "name too long");
    }

    #[tokio::test]
    async fn test_list_users_newest_first() {
        let (app, store) = ready_app().await;
        store.add("first").await.unwrap();
        store.add("second").await.unwrap();

        let response = app.oneshot(get("/users")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|u| u["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn test_uninitialized_store_is_unavailable() {
        let app = users_router_generic(memory_store());

        let response = app.oneshot(get("/users")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json_body(response).await["code"], "SERVICE_UNAVAILABLE");
    }
}
