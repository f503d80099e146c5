//! Per-session turn serialization.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::foundation::SessionId;

/// One async mutex per session id. Holding the guard means owning the turn.
#[derive(Debug, Default)]
pub struct SessionLocks {
    locks: Mutex<HashMap<SessionId, Arc<AsyncMutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, HashMap<SessionId, Arc<AsyncMutex<()>>>> {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Waits until no other turn of this session is running.
    pub async fn acquire(&self, id: SessionId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut table = self.table();
            // Entries nobody holds or waits on can go.
            table.retain(|key, lock| *key == id || Arc::strong_count(lock) > 1);
            table.entry(id).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Drops the entry of a session that no longer exists.
    pub fn forget(&self, id: SessionId) {
        self.table().remove(&id);
    }

    pub fn len(&self) -> usize {
        self.table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_session_waits_for_guard() {
        let locks = Arc::new(SessionLocks::new());
        let id = SessionId::new();
        let guard = locks.acquire(id).await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(id).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn different_sessions_do_not_block() {
        let locks = SessionLocks::new();
        let _first = locks.acquire(SessionId::new()).await;
        let second = tokio::time::timeout(Duration::from_millis(100), locks.acquire(SessionId::new())).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn idle_entries_are_pruned() {
        let locks = SessionLocks::new();
        for _ in 0..5 {
            let _guard = locks.acquire(SessionId::new()).await;
        }
        let last = SessionId::new();
        let _guard = locks.acquire(last).await;
        assert_eq!(locks.len(), 1);

        locks.forget(last);
        assert!(locks.is_empty());
    }
}
