use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// One async mutex per provider; booking commits for a provider run one at a time.
#[derive(Default)]
pub struct ProviderLocks {
    locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl ProviderLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, provider_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // Only the map holds an idle lock; guards and waiters keep their own clone.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(provider_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Providers with a lock currently tracked.
    pub async fn tracked(&self) -> usize {
        self.locks.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_provider_is_serialized() {
        let locks = Arc::new(ProviderLocks::new());
        let provider = Uuid::new_v4();

        let guard = locks.acquire(provider).await;
        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move { locks.acquire(provider).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        assert!(tokio::time::timeout(Duration::from_secs(1), contender).await.is_ok());
    }

    #[tokio::test]
    async fn test_released_locks_are_pruned() {
        let locks = ProviderLocks::new();
        let first = Uuid::new_v4();

        drop(locks.acquire(first).await);
        drop(locks.acquire(Uuid::new_v4()).await);
        assert_eq!(locks.tracked().await, 1);

        let held = locks.acquire(first).await;
        let _other = locks.acquire(Uuid::new_v4()).await;
        assert_eq!(locks.tracked().await, 2);

        drop(held);
        drop(locks.acquire(first).await);
        assert_eq!(locks.tracked().await, 2);
    }

    #[tokio::test]
    async fn test_other_providers_are_independent() {
        let locks = ProviderLocks::new();
        let _held = locks.acquire(Uuid::new_v4()).await;

        let other = tokio::time::timeout(Duration::from_millis(100), locks.acquire(Uuid::new_v4())).await;
        assert!(other.is_ok());
    }
}
