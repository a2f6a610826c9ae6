//! Per-group mutual exclusion for rating read-compute-append sequences.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;
use uuid::Uuid;

use crate::error::{Result, StorageError};

pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// One async mutex per group. Groups never contend with each other.
#[derive(Clone)]
pub struct GroupLocks {
    locks: Arc<StdMutex<HashMap<Uuid, Arc<Mutex<()>>>>>,
    timeout: Duration,
}

/// Proof that the caller holds a group's lock. Released on drop.
pub struct GroupGuard {
    group_id: Uuid,
    _guard: OwnedMutexGuard<()>,
}

impl GroupGuard {
    pub fn group_id(&self) -> Uuid {
        self.group_id
    }
}

impl Default for GroupLocks {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_TIMEOUT)
    }
}

impl GroupLocks {
    pub fn new(timeout: Duration) -> Self {
        Self {
            locks: Arc::new(StdMutex::new(HashMap::new())),
            timeout,
        }
    }

    fn lock_for(&self, group_id: Uuid) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(group_id).or_default().clone()
    }

    /// Waits up to the configured timeout, then gives up with `Concurrency`.
    pub async fn acquire(&self, group_id: Uuid) -> Result<GroupGuard> {
        let lock = self.lock_for(group_id);

        match tokio::time::timeout(self.timeout, lock.lock_owned()).await {
            Ok(guard) => {
                debug!(%group_id, "group lock acquired");
                Ok(GroupGuard {
                    group_id,
                    _guard: guard,
                })
            }
            Err(_) => Err(StorageError::Concurrency(format!(
                "timed out after {:?} waiting for group {group_id}",
                self.timeout
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_second_acquire_times_out() {
        let locks = GroupLocks::new(Duration::from_millis(20));
        let group = Uuid::new_v4();

        let _held = locks.acquire(group).await.unwrap();
        let second = locks.acquire(group).await;
        assert!(matches!(second, Err(StorageError::Concurrency(_))));
    }

    #[tokio::test]
    async fn test_groups_do_not_block_each_other() {
        let locks = GroupLocks::new(Duration::from_millis(20));

        let a = locks.acquire(Uuid::new_v4()).await.unwrap();
        let b = locks.acquire(Uuid::new_v4()).await.unwrap();
        assert_ne!(a.group_id(), b.group_id());
    }

    #[tokio::test]
    async fn test_released_on_drop() {
        let locks = GroupLocks::new(Duration::from_millis(20));
        let group = Uuid::new_v4();

        drop(locks.acquire(group).await.unwrap());
        assert!(locks.acquire(group).await.is_ok());
    }
}
