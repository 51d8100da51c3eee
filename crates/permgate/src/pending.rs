//! Registry of capabilities with an outstanding prompt.
//!
//! Each entry holds a one-shot completion signal. Subscribers attached before
//! the host reports a result all observe the same [`Permission`]; the entry is
//! removed as soon as the result is delivered. Dropping an entry without a
//! result terminates its subscribers without a value.
//!
//! The registry is a cheap handle: clones share the same storage, so the
//! host can keep it alive across coordinator instances.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, RwLockWriteGuard, watch};
use tracing::{debug, warn};

use permgate_core::Permission;

type Signal = watch::Sender<Option<Permission>>;

/// Subscription to a pending capability's completion signal.
#[derive(Debug)]
pub struct PendingResult {
    rx: watch::Receiver<Option<Permission>>,
}

impl PendingResult {
    /// Wait for the host's result.
    ///
    /// Returns `None` if the entry was dropped without a result.
    pub async fn wait(mut self) -> Option<Permission> {
        self.rx
            .wait_for(Option::is_some)
            .await
            .ok()
            .and_then(|value| (*value).clone())
    }
}

/// Pending completion signals keyed by capability name.
#[derive(Debug, Clone, Default)]
pub struct PendingRegistry {
    entries: Arc<RwLock<HashMap<String, Signal>>>,
}

impl PendingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a prompt for `name` is outstanding.
    pub async fn contains(&self, name: &str) -> bool {
        self.entries.read().await.contains_key(name)
    }

    /// Check if any of `names` has an outstanding prompt.
    pub async fn contains_any<S: AsRef<str>>(&self, names: &[S]) -> bool {
        let entries = self.entries.read().await;
        names.iter().any(|n| entries.contains_key(n.as_ref()))
    }

    /// Deliver `permission` to the signal registered under its name and
    /// retire the entry.
    ///
    /// Returns `false` if no entry exists.
    pub async fn resolve(&self, permission: Permission) -> bool {
        let signal = self.entries.write().await.remove(permission.name());
        let Some(signal) = signal else {
            warn!(capability = %permission.name(), "Result for capability with no pending request");
            return false;
        };

        debug!(
            capability = %permission.name(),
            granted = permission.granted(),
            subscribers = signal.receiver_count(),
            "Resolved pending permission"
        );
        signal.send_replace(Some(permission));
        true
    }

    /// Number of live subscriptions to the signal for `name`.
    pub async fn subscriber_count(&self, name: &str) -> usize {
        self.entries
            .read()
            .await
            .get(name)
            .map_or(0, watch::Sender::receiver_count)
    }

    /// Drop every entry without a result, e.g. when the host goes away for
    /// good. Subscribers complete without a value.
    pub async fn complete_all(&self) -> Vec<String> {
        let dropped: Vec<String> = self
            .entries
            .write()
            .await
            .drain()
            .map(|(name, _)| name)
            .collect();
        if !dropped.is_empty() {
            warn!(count = dropped.len(), "Completed pending permissions without a result");
        }
        dropped
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Take exclusive access for a check-then-insert sequence.
    pub(crate) async fn lock(&self) -> PendingGuard<'_> {
        PendingGuard {
            entries: self.entries.write().await,
        }
    }
}

/// Exclusive view of the registry. Lookups and insertions made through one
/// guard are atomic with respect to every other request.
pub(crate) struct PendingGuard<'a> {
    entries: RwLockWriteGuard<'a, HashMap<String, Signal>>,
}

impl PendingGuard<'_> {
    pub(crate) fn subscribe(&self, name: &str) -> Option<PendingResult> {
        self.entries
            .get(name)
            .map(|signal| PendingResult { rx: signal.subscribe() })
    }

    /// Subscribe to the signal for `name`, creating it if none exists.
    /// A live entry is never replaced, so its subscribers keep waiting on
    /// the prompt that was already dispatched.
    pub(crate) fn insert(&mut self, name: &str) -> PendingResult {
        let signal = self
            .entries
            .entry(name.to_string())
            .or_insert_with(|| watch::channel(None).0);
        PendingResult {
            rx: signal.subscribe(),
        }
    }
}
