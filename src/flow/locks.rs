//! Per-workflow mutual exclusion

use crate::page::WorkflowRef;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Serializes flows that touch the same workflow.
///
/// Cloning shares the lock table, so every orchestrator built from one
/// `DocumentLocks` sees the same locks. Azure resource ids are
/// case-insensitive, and so are the lock keys.
#[derive(Clone, Default)]
pub struct DocumentLocks {
    locks: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

fn lock_key(workflow: &WorkflowRef) -> String {
    workflow.resource_path().to_lowercase()
}

impl DocumentLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other flow holds `workflow`, then hold it until the guard drops
    pub async fn acquire(&self, workflow: &WorkflowRef) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks.entry(lock_key(workflow)).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Whether a flow currently holds `workflow`
    pub fn is_locked(&self, workflow: &WorkflowRef) -> bool {
        let locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .get(&lock_key(workflow))
            .map(|lock| lock.try_lock().is_err())
            .unwrap_or(false)
    }
}
