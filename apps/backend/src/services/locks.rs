//! Per-entity async locks
//!
//! Serializes read-modify-write cycles on one user or match inside this
//! process. Cross-process races are caught by the version columns.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct EntityLocks {
    slots: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl EntityLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `id`. Access ends when the guard drops.
    pub async fn lock(&self, id: Uuid) -> OwnedMutexGuard<()> {
        let slot = {
            let mut slots = self.slots.lock().await;
            // Drop slots nobody holds or waits on.
            slots.retain(|key, slot| *key == id || Arc::strong_count(slot) > 1);
            slots.entry(id).or_default().clone()
        };
        slot.lock_owned().await
    }

    /// Number of tracked entities
    pub async fn tracked(&self) -> usize {
        self.slots.lock().await.len()
    }
}
