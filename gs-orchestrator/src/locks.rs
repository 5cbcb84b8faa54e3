use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::slug::Identity;

/// One async lock per workspace identity.
///
/// Entries nobody holds or waits on are pruned on the next acquisition, so
/// the map only grows with the number of identities in flight.
#[derive(Debug, Clone, Default)]
pub struct IdentityLocks {
    inner: Arc<Mutex<HashMap<Identity, Arc<Mutex<()>>>>>,
}

impl IdentityLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, identity: &Identity) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.retain(|_, lock| Arc::strong_count(lock) > 1);
            map.entry(identity.clone()).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Identities currently locked or awaited.
    pub async fn in_flight(&self) -> usize {
        self.inner
            .lock()
            .await
            .values()
            .filter(|lock| Arc::strong_count(lock) > 1)
            .count()
    }
}
