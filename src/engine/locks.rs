use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// In-process keyed mutex over order identificators
///
/// A match step holds the locks of both orders for its whole duration.
/// Keys are acquired in sorted order so two runs locking the same pair of
/// orders from opposite sides cannot deadlock. Idle entries are removed when
/// the last guard is dropped.
#[derive(Debug, Clone, Default)]
pub struct OrderLocks {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

/// Held locks of one match step, released on drop
#[derive(Debug)]
pub struct OrderLockGuard {
    guards: Vec<OwnedMutexGuard<()>>,
    keys: Vec<String>,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl OrderLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to both orders
    pub async fn acquire(&self, first: &str, second: &str) -> OrderLockGuard {
        let mut keys = vec![first.to_string(), second.to_string()];
        keys.sort();
        keys.dedup();

        let mut guards = Vec::with_capacity(keys.len());
        for key in &keys {
            let mutex = self
                .locks
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone();
            guards.push(mutex.lock_owned().await);
        }

        OrderLockGuard {
            guards,
            keys,
            locks: Arc::clone(&self.locks),
        }
    }

    /// Number of identificators currently tracked
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl Drop for OrderLockGuard {
    fn drop(&mut self) {
        self.guards.clear();
        for key in &self.keys {
            self.locks
                .remove_if(key, |_, mutex| Arc::strong_count(mutex) == 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_guard_releases_and_cleans_up() {
        let locks = OrderLocks::new();
        {
            let _guard = locks.acquire("ord-2", "ord-1").await;
            assert_eq!(locks.len(), 2);
        }
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_same_key_twice_does_not_deadlock() {
        let locks = OrderLocks::new();
        let guard = locks.acquire("ord-1", "ord-1").await;
        assert_eq!(locks.len(), 1);
        drop(guard);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_overlapping_steps_are_serialized() {
        let locks = OrderLocks::new();
        let guard = locks.acquire("ord-1", "ord-2").await;

        let contender = locks.clone();
        let waiting = tokio::spawn(async move {
            let _guard = contender.acquire("ord-3", "ord-2").await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiting.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiting)
            .await
            .unwrap()
            .unwrap();
        assert!(locks.is_empty());
    }
}
