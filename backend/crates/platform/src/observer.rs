//! Observer Registry
//!
//! Ordered list of zero-argument callbacks. `notify` calls every listener in
//! registration order. A listener that fails or panics is logged and skipped.

use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Error a listener may return
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

type Listener = Arc<dyn Fn() -> Result<(), ListenerError> + Send + Sync>;

/// Handle returned by [`Observers::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Outcome of one notification round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotifyReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Registry of change listeners
pub struct Observers {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
}

impl Default for Observers {
    fn default() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            listeners: Mutex::new(Vec::new()),
        }
    }
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. It runs after every subsequent [`notify`](Self::notify).
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn() -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, Arc::new(listener)));
        tracing::debug!(subscription = %id, "Listener subscribed");
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.lock();
        let before = listeners.len();
        listeners.retain(|(sub, _)| *sub != id);
        let removed = listeners.len() != before;
        if removed {
            tracing::debug!(subscription = %id, "Listener unsubscribed");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Call every listener in registration order
    ///
    /// Runs on a snapshot, so listeners may subscribe or unsubscribe while
    /// being notified. Errors and panics never reach the caller.
    pub fn notify(&self) -> NotifyReport {
        let snapshot: Vec<(SubscriptionId, Listener)> = self
            .lock()
            .iter()
            .map(|(id, listener)| (*id, Arc::clone(listener)))
            .collect();

        let mut report = NotifyReport::default();
        for (id, listener) in snapshot {
            match catch_unwind(AssertUnwindSafe(|| listener())) {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(e)) => {
                    report.failed += 1;
                    tracing::warn!(subscription = %id, error = %e, "Listener failed, continuing");
                }
                Err(payload) => {
                    report.failed += 1;
                    tracing::warn!(
                        subscription = %id,
                        panic = panic_message(payload.as_ref()),
                        "Listener panicked, continuing"
                    );
                }
            }
        }
        report
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(SubscriptionId, Listener)>> {
        // Listeners never run under the lock, so a poisoned guard still holds a valid list.
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("listeners", &self.len())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
