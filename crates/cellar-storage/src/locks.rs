use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

/// One reader/writer lock per table name.
#[derive(Debug, Default)]
pub struct TableLocks {
    locks: Mutex<HashMap<String, Arc<RwLock<()>>>>,
}

impl TableLocks {
    pub fn new() -> Self {
        Self::default()
    }

    async fn handle(&self, name: &str) -> Arc<RwLock<()>> {
        self.locks
            .lock()
            .await
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(())))
            .clone()
    }

    pub async fn read(&self, name: &str) -> OwnedRwLockReadGuard<()> {
        self.handle(name).await.read_owned().await
    }

    pub async fn write(&self, name: &str) -> OwnedRwLockWriteGuard<()> {
        self.handle(name).await.write_owned().await
    }

    /// Removes the entry for `name` unless some task still holds or waits
    /// on its lock.
    pub async fn forget(&self, name: &str) {
        let mut locks = self.locks.lock().await;
        if locks.get(name).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(name);
        }
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }
}
