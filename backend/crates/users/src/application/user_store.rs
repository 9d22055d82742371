//! User Store
//!
//! Validates names, writes through the configured repository, and notifies
//! listeners after each successful write.

use std::sync::atomic::{AtomicBool, Ordering};

use platform::observer::{ListenerError, Observers, SubscriptionId};

use crate::application::config::{NamePolicy, UserStoreConfig};
use crate::domain::entity::user_record::{NewUserRecord, UserRecord};
use crate::domain::repository::UserRecordRepository;
use crate::domain::value_object::user_name::UserName;
use crate::error::{UserError, UserResult};

/// User store service
///
/// Owns its repository exclusively. Build one per backing resource and
/// share it behind an `Arc`.
pub struct UserStore<R>
where
    R: UserRecordRepository,
{
    repo: R,
    name_policy: NamePolicy,
    observers: Observers,
    initialized: AtomicBool,
}

impl<R> UserStore<R>
where
    R: UserRecordRepository + Send + Sync,
{
    pub fn new(repo: R, config: &UserStoreConfig) -> Self {
        Self::with_policy(repo, config.name_policy)
    }

    pub fn with_policy(repo: R, name_policy: NamePolicy) -> Self {
        Self {
            repo,
            name_policy,
            observers: Observers::new(),
            initialized: AtomicBool::new(false),
        }
    }

    /// Prepare the backing store. Safe to call again; existing records are kept.
    ///
    /// On failure the store stays unusable until a later call succeeds.
    pub async fn initialize(&self) -> UserResult<()> {
        match self.repo.initialize().await {
            Ok(()) => {
                self.initialized.store(true, Ordering::Release);
                tracing::info!("User store initialized");
                Ok(())
            }
            Err(e) => {
                self.initialized.store(false, Ordering::Release);
                Err(UserError::Initialization(e))
            }
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// All records, newest first
    pub async fn list_all(&self) -> UserResult<Vec<UserRecord>> {
        self.ensure_initialized()?;
        let records = self.repo.list_all().await?;
        tracing::debug!(count = records.len(), "Listed user records");
        Ok(records)
    }

    /// Validate and persist a new record, then notify listeners
    pub async fn add(&self, name: impl Into<String>) -> UserResult<UserRecord> {
        let name = UserName::with_policy(name, self.name_policy)?;
        self.ensure_initialized()?;

        let record = self.repo.insert(NewUserRecord::new(name)).await?;
        tracing::info!(
            user_id = %record.id,
            user_name = %record.name,
            "User record created"
        );

        // Each failure is already warned about by the registry.
        let report = self.observers.notify();
        if report.failed > 0 {
            tracing::debug!(
                delivered = report.delivered,
                failed = report.failed,
                "Some user listeners failed"
            );
        }

        Ok(record)
    }

    /// Register a listener called after every successful `add`
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn() -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        self.observers.subscribe(listener)
    }

    /// Remove a listener; unknown ids are ignored
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    fn ensure_initialized(&self) -> UserResult<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(UserError::NotInitialized)
        }
    }
}
