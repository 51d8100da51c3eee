//! In-memory [`PermissionHost`] for tests.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;

use crate::host::PermissionHost;

/// Host that answers platform queries from in-memory sets and records every
/// prompt it is asked to show.
pub struct RecordingHost {
    granted: Mutex<HashSet<String>>,
    revoked: Mutex<HashSet<String>>,
    rationale: Mutex<HashSet<String>>,
    dispatched: Mutex<Vec<Vec<String>>>,
    dispatch_tx: mpsc::UnboundedSender<Vec<String>>,
}

impl RecordingHost {
    /// Create a host and a receiver that sees each dispatched prompt.
    pub fn with_receiver() -> (Arc<Self>, mpsc::UnboundedReceiver<Vec<String>>) {
        let (dispatch_tx, dispatch_rx) = mpsc::unbounded_channel();
        let host = Arc::new(Self {
            granted: Mutex::default(),
            revoked: Mutex::default(),
            rationale: Mutex::default(),
            dispatched: Mutex::default(),
            dispatch_tx,
        });
        (host, dispatch_rx)
    }

    pub fn grant(&self, name: &str) {
        insert(&self.granted, name);
    }

    pub fn revoke(&self, name: &str) {
        insert(&self.revoked, name);
    }

    pub fn show_rationale(&self, name: &str) {
        insert(&self.rationale, name);
    }

    /// Every prompt dispatched so far, in order.
    pub fn dispatched(&self) -> Vec<Vec<String>> {
        self.dispatched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of dispatched prompts that included `name`.
    pub fn prompts_for(&self, name: &str) -> usize {
        self.dispatched()
            .iter()
            .filter(|names| names.iter().any(|n| n == name))
            .count()
    }
}

fn insert(set: &Mutex<HashSet<String>>, name: &str) {
    set.lock()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(name.to_string());
}

fn contains(set: &Mutex<HashSet<String>>, name: &str) -> bool {
    set.lock()
        .unwrap_or_else(PoisonError::into_inner)
        .contains(name)
}

impl PermissionHost for RecordingHost {
    fn is_granted(&self, name: &str) -> bool {
        contains(&self.granted, name)
    }

    fn is_revoked(&self, name: &str) -> bool {
        contains(&self.revoked, name)
    }

    fn should_show_rationale(&self, name: &str) -> bool {
        contains(&self.rationale, name)
    }

    fn dispatch_prompt(&self, names: Vec<String>) {
        self.dispatched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(names.clone());
        // The receiver may already be gone in tests that never inspect prompts.
        let _ = self.dispatch_tx.send(names);
    }
}
