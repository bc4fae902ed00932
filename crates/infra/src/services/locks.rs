use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use pvz_core::PickupPointId;

/// Idle entries are dropped once the registry grows past this many pickup points.
const PRUNE_THRESHOLD: usize = 1024;

/// Per-pickup-point async mutex registry.
///
/// Cloning shares the registry. Calls holding guards for different pickup points never
/// contend with each other.
#[derive(Debug, Clone, Default)]
pub struct PvzLocks {
    inner: Arc<Mutex<HashMap<PickupPointId, Arc<AsyncMutex<()>>>>>,
}

impl PvzLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `pickup_point_id`. Released when the guard drops.
    pub async fn acquire(&self, pickup_point_id: PickupPointId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            if map.len() >= PRUNE_THRESHOLD {
                // Only the map holds a reference: nobody is waiting on or holding it.
                map.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            Arc::clone(map.entry(pickup_point_id).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of pickup points currently tracked.
    pub fn tracked(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_pickup_point_is_exclusive() {
        let locks = PvzLocks::new();
        let id = PickupPointId::new();

        let guard = locks.acquire(id).await;
        let second = tokio::time::timeout(Duration::from_millis(50), locks.acquire(id)).await;
        assert!(second.is_err(), "second acquire must wait for the first guard");

        drop(guard);
        let third = tokio::time::timeout(Duration::from_millis(50), locks.acquire(id)).await;
        assert!(third.is_ok());
    }

    #[tokio::test]
    async fn different_pickup_points_do_not_contend() {
        let locks = PvzLocks::new();
        let _a = locks.acquire(PickupPointId::new()).await;
        let b = tokio::time::timeout(
            Duration::from_millis(50),
            locks.acquire(PickupPointId::new()),
        )
        .await;
        assert!(b.is_ok());
        assert_eq!(locks.tracked(), 2);
    }

    #[tokio::test]
    async fn idle_entries_are_pruned() {
        let locks = PvzLocks::new();
        for _ in 0..PRUNE_THRESHOLD {
            drop(locks.acquire(PickupPointId::new()).await);
        }
        assert_eq!(locks.tracked(), PRUNE_THRESHOLD);

        let _held = locks.acquire(PickupPointId::new()).await;
        assert_eq!(locks.tracked(), 1);
    }
}
